use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::ExecError;

/// When a submitted job runs relative to `submit`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SubmitMode {
    /// `submit` returns once the job has finished.
    #[default]
    Inline,
    /// `submit` returns right after spawning; `wait_complete` collects the job.
    Detached,
}

/// How job stdout/stderr lines are forwarded to the log.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputLogConfig {
    /// Max line length before truncation.
    pub max_line_length: usize,
    /// Log stdout at INFO level (false = DEBUG).
    pub stdout_info: bool,
    /// Log stderr at WARN level (false = DEBUG).
    pub stderr_warn: bool,
}

impl Default for OutputLogConfig {
    fn default() -> Self {
        Self {
            max_line_length: 4096,
            stdout_info: true,
            stderr_warn: true,
        }
    }
}

/// Settings of a [`super::LocalScheduler`].
///
/// The config sources and the local results root come from the
/// `ExecContext` of each call; this struct only describes the scheduler's
/// own side.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LocalSchedulerConfig {
    /// Directory holding one shell script per job script name.
    pub scripts_root: PathBuf,
    /// Root that staged configs are copied into (`<work_root>/config_files/<config>`).
    pub work_root: PathBuf,
    /// Root of the per-job result directories.
    pub remote_results: PathBuf,
    pub mode: SubmitMode,
    /// Interpreter the job scripts are run with.
    pub shell: String,
    /// Set `RLIMIT_CORE` to zero for every job.
    pub disable_core_dumps: bool,
    pub output: OutputLogConfig,
}

impl Default for LocalSchedulerConfig {
    fn default() -> Self {
        Self {
            scripts_root: PathBuf::from("scripts"),
            work_root: PathBuf::from("work"),
            remote_results: PathBuf::from("work/results"),
            mode: SubmitMode::default(),
            shell: "sh".to_string(),
            disable_core_dumps: false,
            output: OutputLogConfig::default(),
        }
    }
}

impl LocalSchedulerConfig {
    /// Directory a staged copy of `config` lives in.
    pub fn staged_config_dir(&self, config: &str) -> PathBuf {
        self.work_root.join("config_files").join(config)
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), ExecError> {
        if self.shell.trim().is_empty() {
            return Err(ExecError::InvalidSchedulerConfig("shell cannot be empty".into()));
        }
        if self.output.max_line_length == 0 {
            return Err(ExecError::InvalidSchedulerConfig(
                "output.max_line_length cannot be zero".into(),
            ));
        }
        Ok(())
    }
}
