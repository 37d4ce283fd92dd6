use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize, Serializer};

use crate::ModelError;

/// Tag that tells apart jobs built from the same configuration.
///
/// The label is prefixed to the job's result directory, so two jobs of one
/// validation run land in `sif_<name>` and `test_subject_<name>`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum JobLabel {
    /// Reference run (stable intermediate form).
    Sif,
    /// Run under test.
    TestSubject,
    /// Any other tag, e.g. the sweep entry of an ensemble member.
    Custom(String),
}

impl JobLabel {
    pub fn as_str(&self) -> &str {
        match self {
            JobLabel::Sif => "sif",
            JobLabel::TestSubject => "test_subject",
            JobLabel::Custom(s) => s,
        }
    }

    /// Prefix `name` with this label: `<label>_<name>`.
    pub fn prefix(&self, name: &str) -> String {
        format!("{}_{}", self.as_str(), name)
    }
}

impl FromStr for JobLabel {
    type Err = ModelError;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        match s {
            "sif" => Ok(Self::Sif),
            "test_subject" => Ok(Self::TestSubject),
            "" => Err(ModelError::InvalidLabel(s.to_string())),
            other if other.contains(['/', '\\']) => {
                Err(ModelError::InvalidLabel(other.to_string()))
            }
            other => Ok(Self::Custom(other.to_string())),
        }
    }
}

impl fmt::Display for JobLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for JobLabel {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for JobLabel {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        Self::from_str(&s).map_err(serde::de::Error::custom)
    }
}
