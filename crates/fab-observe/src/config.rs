use std::io::IsTerminal;

use serde::{Deserialize, Serialize};

use crate::object::{LoggerFormat, LoggerLevel, LoggerTimeZone};

/// Logger configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggerConfig {
    /// Output format.
    pub format: LoggerFormat,
    /// `EnvFilter` expression, e.g. `"info"` or `"fab_exec=debug,info"`.
    pub level: LoggerLevel,
    /// Timezone of timestamps.
    pub tz: LoggerTimeZone,
    /// Include event targets (module paths).
    pub with_targets: bool,
    /// Colored text output; only honored when stdout is a terminal.
    pub use_color: bool,
}

impl Default for LoggerConfig {
    fn default() -> Self {
        Self {
            format: LoggerFormat::default(),
            level: LoggerLevel::default(),
            tz: LoggerTimeZone::default(),
            with_targets: true,
            use_color: true,
        }
    }
}

impl LoggerConfig {
    /// Replace the level with the filter in environment variable `var`, if set and valid.
    ///
    /// An invalid value is returned as an error rather than silently ignored.
    pub fn with_env_level(mut self, var: &str) -> Result<Self, crate::LoggerError> {
        if let Some(level) = LoggerLevel::from_env(var)? {
            self.level = level;
        }
        Ok(self)
    }

    /// Whether ANSI colors should be emitted right now.
    pub fn should_use_color(&self) -> bool {
        self.use_color && std::io::stdout().is_terminal()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let cfg = LoggerConfig::default();

        assert_eq!(cfg.format, LoggerFormat::Text);
        assert_eq!(cfg.tz, LoggerTimeZone::Utc);
        assert_eq!(cfg.level.as_str(), "info");
        assert!(cfg.with_targets);
        assert!(cfg.use_color);
    }

    #[test]
    fn missing_fields_fall_back_to_defaults() {
        let cfg: LoggerConfig = serde_json::from_str(r#"{"level": "fab_core=debug,warn"}"#).unwrap();

        assert_eq!(cfg.level.as_str(), "fab_core=debug,warn");
        assert_eq!(cfg.format, LoggerFormat::Text);
        assert!(cfg.use_color);
    }

    #[test]
    fn full_document() {
        let cfg: LoggerConfig = serde_json::from_str(
            r#"{"format": "json", "level": "trace", "tz": "local", "with_targets": false, "use_color": false}"#,
        )
        .unwrap();

        assert_eq!(cfg.format, LoggerFormat::Json);
        assert_eq!(cfg.tz, LoggerTimeZone::Local);
        assert!(!cfg.with_targets);
        assert!(!cfg.should_use_color());
    }

    #[test]
    fn bad_level_is_rejected_at_parse_time() {
        let res = serde_json::from_str::<LoggerConfig>(r#"{"level": "fab_core=loud"}"#);
        assert!(res.is_err());
    }

    #[test]
    fn unset_env_keeps_level() {
        let cfg = LoggerConfig::default()
            .with_env_level("FAB_OBSERVE_TEST_UNSET_VARIABLE")
            .unwrap();
        assert_eq!(cfg.level.as_str(), "info");
    }
}
