//! Reduction of per-case scores into the reported result.
//!
//! The validation runner hands every collected score to an [`Aggregator`].
//! [`Identity`] passes them through untouched; the other reductions are
//! drop-in replacements for callers that want a single number or a verdict.
use std::fmt;

use serde::{Deserialize, Serialize};

/// One or more per-case scores, in case order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Scores(Vec<f64>);

impl Scores {
    pub fn new() -> Self {
        Self(Vec::new())
    }

    pub fn push(&mut self, score: f64) {
        self.0.push(score);
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn as_slice(&self) -> &[f64] {
        &self.0
    }

    pub fn iter(&self) -> impl Iterator<Item = f64> + '_ {
        self.0.iter().copied()
    }

    /// The score of a single-case run.
    pub fn single(&self) -> Option<f64> {
        match self.0.as_slice() {
            [only] => Some(*only),
            _ => None,
        }
    }

    pub fn into_inner(self) -> Vec<f64> {
        self.0
    }
}

impl From<f64> for Scores {
    fn from(score: f64) -> Self {
        Self(vec![score])
    }
}

impl From<Vec<f64>> for Scores {
    fn from(scores: Vec<f64>) -> Self {
        Self(scores)
    }
}

impl FromIterator<f64> for Scores {
    fn from_iter<I: IntoIterator<Item = f64>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl fmt::Display for Scores {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(only) = self.single() {
            return write!(f, "{only}");
        }
        f.write_str("[")?;
        for (i, s) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{s}")?;
        }
        f.write_str("]")
    }
}

/// Reduction applied to the collected scores of a validation run.
pub trait Aggregator {
    type Output;

    fn aggregate(&self, scores: Scores) -> Self::Output;
}

impl<F, O> Aggregator for F
where
    F: Fn(Scores) -> O,
{
    type Output = O;

    fn aggregate(&self, scores: Scores) -> O {
        self(scores)
    }
}

/// Returns the scores unchanged.
#[derive(Debug, Clone, Copy, Default)]
pub struct Identity;

impl Aggregator for Identity {
    type Output = Scores;

    fn aggregate(&self, scores: Scores) -> Scores {
        scores
    }
}

/// Arithmetic mean; `None` for no scores.
#[derive(Debug, Clone, Copy, Default)]
pub struct Mean;

impl Aggregator for Mean {
    type Output = Option<f64>;

    fn aggregate(&self, scores: Scores) -> Option<f64> {
        if scores.is_empty() {
            return None;
        }
        Some(scores.iter().sum::<f64>() / scores.len() as f64)
    }
}

/// Largest score; `None` for no scores.
#[derive(Debug, Clone, Copy, Default)]
pub struct MaxDeviation;

impl Aggregator for MaxDeviation {
    type Output = Option<f64>;

    fn aggregate(&self, scores: Scores) -> Option<f64> {
        scores.iter().reduce(f64::max)
    }
}

/// Pass/fail verdict: `true` iff there is at least one score and every score is within `tolerance`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Threshold {
    pub tolerance: f64,
}

impl Aggregator for Threshold {
    type Output = bool;

    fn aggregate(&self, scores: Scores) -> bool {
        !scores.is_empty() && scores.iter().all(|s| s <= self.tolerance)
    }
}
