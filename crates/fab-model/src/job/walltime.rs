use std::{fmt, str::FromStr, time::Duration};

use serde::{Deserialize, Serialize};

use crate::ModelError;

/// Wall-clock limit used by every job unless overridden.
pub const DEFAULT_WALL_TIME: &str = "0:15:0";

/// Wall-clock limit of a job, written `H:M:S` (e.g. `0:15:0`).
///
/// Minutes and seconds must be below 60; hours are unbounded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String")]
#[serde(into = "String")]
pub struct WallTime {
    secs: u64,
}

impl WallTime {
    pub const fn from_secs(secs: u64) -> Self {
        Self { secs }
    }

    pub const fn as_secs(&self) -> u64 {
        self.secs
    }

    pub const fn as_duration(&self) -> Duration {
        Duration::from_secs(self.secs)
    }
}

impl Default for WallTime {
    fn default() -> Self {
        Self::from_secs(15 * 60)
    }
}

impl FromStr for WallTime {
    type Err = ModelError;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || ModelError::InvalidWallTime(s.to_string());

        let parts: Vec<&str> = s.trim().split(':').collect();
        let [h, m, sec] = parts.as_slice() else {
            return Err(invalid());
        };
        let h: u64 = h.trim().parse().map_err(|_| invalid())?;
        let m: u64 = m.trim().parse().map_err(|_| invalid())?;
        let sec: u64 = sec.trim().parse().map_err(|_| invalid())?;
        if m >= 60 || sec >= 60 {
            return Err(invalid());
        }
        h.checked_mul(3600)
            .and_then(|hs| hs.checked_add(m * 60 + sec))
            .map(Self::from_secs)
            .ok_or_else(invalid)
    }
}

impl TryFrom<String> for WallTime {
    type Error = ModelError;
    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

impl From<WallTime> for String {
    fn from(w: WallTime) -> Self {
        w.to_string()
    }
}

impl fmt::Display for WallTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let h = self.secs / 3600;
        let m = (self.secs % 3600) / 60;
        let s = self.secs % 60;
        write!(f, "{h}:{m:02}:{s:02}")
    }
}
