use serde::{Deserialize, Serialize};

use crate::{
    ARG_WALL_TIME, Args, JobLabel, ModelError, ModelResult, RESERVED_ARGS, Vars, WallTime,
};

/// Description of one job handed to a scheduler.
///
/// A `JobSpec` names *what* runs (`script`), *how long* it may run
/// (`wall_time`) and which extra resources it asks for (`resources`:
/// memory, cores, input file names, ...). The optional `label` keeps two jobs
/// of the same configuration apart and becomes the prefix of the job's
/// result directory.
///
/// A `JobSpec` is not changed after submission; schedulers only read it.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JobSpec {
    /// Script identifier, resolved by the scheduler against its script root.
    pub script: String,
    /// Wall-clock limit for the job.
    pub wall_time: WallTime,
    /// Optional tag prefixed to the result directory name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<JobLabel>,
    /// Extra scheduler parameters.
    #[serde(default, skip_serializing_if = "Vars::is_empty")]
    pub resources: Vars,
}

impl JobSpec {
    /// Create an unlabeled spec without extra resources.
    pub fn new(script: impl Into<String>, wall_time: WallTime) -> Self {
        Self {
            script: script.into(),
            wall_time,
            label: None,
            resources: Vars::new(),
        }
    }

    /// Attach a label.
    pub fn with_label(mut self, label: JobLabel) -> Self {
        self.label = Some(label);
        self
    }

    /// Add or replace a resource entry.
    pub fn with_resource(mut self, key: impl Into<String>, val: impl Into<String>) -> Self {
        self.resources.insert(key, val);
        self
    }

    /// Merge caller overrides into the spec.
    ///
    /// `wall_time` replaces the default limit; every other key is stored as a
    /// resource, replacing any default with the same name. `script` and
    /// `label` identify the job and are rejected.
    ///
    /// ```rust
    /// # use fab_model::{Args, JobSpec, WallTime};
    /// let spec = JobSpec::new("lammps", WallTime::default())
    ///     .with_resource("memory", "2G")
    ///     .with_overrides(&Args::new().with("memory", "8G").with("wall_time", "1:0:0"))
    ///     .unwrap();
    /// assert_eq!(spec.resource("memory"), Some("8G"));
    /// assert_eq!(spec.wall_time.as_secs(), 3600);
    /// ```
    pub fn with_overrides(mut self, args: &Args) -> ModelResult<Self> {
        for (key, value) in args.effective() {
            if RESERVED_ARGS.contains(&key) {
                return Err(ModelError::ReservedKey(key.to_string()));
            }
            if key == ARG_WALL_TIME {
                self.wall_time = value.parse()?;
            } else {
                self.resources.insert(key, value);
            }
        }
        Ok(self)
    }

    /// Resource value for `key`, if set.
    pub fn resource(&self, key: &str) -> Option<&str> {
        self.resources.get(key)
    }

    /// Directory name of this job's results given the rendered job name.
    ///
    /// Labeled jobs get `<label>_<name>`; unlabeled jobs use the name as is.
    pub fn result_dir_name(&self, job_name: &str) -> String {
        match &self.label {
            Some(label) => label.prefix(job_name),
            None => job_name.to_string(),
        }
    }
}
