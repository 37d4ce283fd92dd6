use serde::{Deserialize, Serialize};

/// Single `key=value` override passed to a task.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Arg {
    key: String,
    value: String,
}

impl Arg {
    pub fn new(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
        }
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn value(&self) -> &str {
        &self.value
    }
}

impl From<(&str, &str)> for Arg {
    fn from((key, value): (&str, &str)) -> Self {
        Self::new(key, value)
    }
}

/// Free-form keyword overrides for a task invocation (`cores=4`, `wall_time=1:00:00`, ...).
///
/// Stored in insertion order; when a key repeats, the last entry wins.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Args(Vec<Arg>);

impl Args {
    /// Create an empty set of overrides.
    pub fn new() -> Self {
        Self(Vec::new())
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Append an override. Later entries shadow earlier ones with the same key.
    pub fn push(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.0.push(Arg::new(key, value));
    }

    /// Builder-style [`Args::push`].
    pub fn with(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.push(key, value);
        self
    }

    /// Value of the last entry for `key`, if any.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.0
            .iter()
            .rev()
            .find(|a| a.key() == key)
            .map(|a| a.value())
    }

    /// Iterate over the effective overrides, one per key, in first-seen key order.
    pub fn effective(&self) -> impl Iterator<Item = (&str, &str)> {
        let mut seen: Vec<&str> = Vec::new();
        self.0.iter().filter_map(move |a| {
            if seen.contains(&a.key()) {
                return None;
            }
            seen.push(a.key());
            self.get(a.key()).map(|v| (a.key(), v))
        })
    }
}

impl<'a> FromIterator<(&'a str, &'a str)> for Args {
    fn from_iter<I: IntoIterator<Item = (&'a str, &'a str)>>(iter: I) -> Self {
        Self(iter.into_iter().map(Arg::from).collect())
    }
}
