use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::{sync::Mutex, task::JoinHandle};
use tracing::{debug, info, trace, warn};

use fab_core::{ExecContext, JobHandle, Scheduler, SchedulerError, make_job_id};
use fab_model::JobSpec;

use crate::{
    ExecError, RlimitConfig, SCHEDULER_TYPE_LOCAL,
    local::{
        config::{LocalSchedulerConfig, SubmitMode},
        fsops::{replace_dir, reset_dir},
        job::LocalJob,
    },
    parse_memory,
};

/// Resource key mapped to the address-space rlimit.
const MEMORY_RESOURCE: &str = "memory";

struct Outstanding {
    name: String,
    handle: JoinHandle<Result<(), SchedulerError>>,
}

/// Scheduler running job scripts on this machine.
///
/// Each job runs `<shell> <scripts_root>/<script>` inside its own directory
/// `<remote_results>/<result dir>`, which is recreated on every submit as a
/// copy of the staged config. Fetching replaces each local result directory
/// wholesale. The job spec is exported to the script as environment:
///
/// | variable          | value                                 |
/// |-------------------|---------------------------------------|
/// | `FAB_SCRIPT`      | script name                           |
/// | `FAB_LABEL`       | job label, empty when unlabeled       |
/// | `FAB_CONFIG`      | bound configuration, empty when none  |
/// | `FAB_JOB_NAME`    | rendered job name                     |
/// | `FAB_WALL_TIME`   | wall time as `H:MM:SS`                |
/// | `FAB_<RESOURCE>`  | every resource, key upper-cased       |
pub struct LocalScheduler {
    config: LocalSchedulerConfig,
    outstanding: Mutex<Vec<Outstanding>>,
}

impl LocalScheduler {
    /// Create a scheduler after validating `config`.
    pub fn new(config: LocalSchedulerConfig) -> Result<Self, ExecError> {
        config.validate()?;
        Ok(Self {
            config,
            outstanding: Mutex::new(Vec::new()),
        })
    }

    pub fn config(&self) -> &LocalSchedulerConfig {
        &self.config
    }

    /// Number of detached jobs not yet collected by [`Scheduler::wait_complete`].
    pub async fn outstanding(&self) -> usize {
        self.outstanding.lock().await.len()
    }

    async fn build_job(
        &self,
        ctx: &ExecContext,
        spec: &JobSpec,
        name: &str,
        job_name: &str,
        job_dir: PathBuf,
    ) -> Result<LocalJob, SchedulerError> {
        let submit_err = |reason: String| SchedulerError::Submit {
            job: name.to_string(),
            reason,
        };

        let script = self.config.scripts_root.join(&spec.script);
        if !script.is_file() {
            return Err(submit_err(format!("script not found: {}", script.display())));
        }
        let script = tokio::fs::canonicalize(&script)
            .await
            .map_err(|e| submit_err(format!("cannot resolve {}: {e}", script.display())))?;

        let mut rlimits = RlimitConfig {
            max_address_space_bytes: None,
            disable_core_dumps: self.config.disable_core_dumps,
        };
        if let Some(memory) = spec.resource(MEMORY_RESOURCE) {
            rlimits.max_address_space_bytes =
                Some(parse_memory(memory).map_err(|e| submit_err(e.to_string()))?);
        }

        Ok(LocalJob {
            name: name.to_string(),
            shell: self.config.shell.clone(),
            script,
            cwd: job_dir,
            env: job_env(ctx, spec, job_name),
            wall_time: spec.wall_time,
            rlimits,
            output: self.config.output,
        })
    }
}

#[async_trait]
impl Scheduler for LocalScheduler {
    fn name(&self) -> &'static str {
        SCHEDULER_TYPE_LOCAL
    }

    async fn put_configs(&self, ctx: &ExecContext, config: &str) -> Result<(), SchedulerError> {
        let src = ctx.config_dir(config);
        let staging_err = |reason: String| SchedulerError::Staging {
            config: config.to_string(),
            reason,
        };
        if !src.is_dir() {
            return Err(staging_err(format!(
                "config directory not found: {}",
                src.display()
            )));
        }

        let dst = self.config.staged_config_dir(config);
        replace_dir(src.clone(), dst.clone())
            .await
            .map_err(|e| staging_err(e.to_string()))?;
        info!(config, from = %src.display(), to = %dst.display(), "config staged");
        Ok(())
    }

    async fn submit(&self, ctx: &ExecContext, spec: &JobSpec) -> Result<JobHandle, SchedulerError> {
        let job_name = ctx.job_name()?;
        let result_dir = spec.result_dir_name(&job_name);
        let name = make_job_id(self.name(), &result_dir);
        let job_dir = self.config.remote_results.join(&result_dir);

        // Outputs of an earlier run must not carry over.
        let staged = ctx
            .config()
            .map(|config| self.config.staged_config_dir(config))
            .filter(|staged| staged.is_dir());
        match staged {
            Some(staged) => replace_dir(staged, job_dir.clone()).await?,
            None => {
                trace!(job = %name, "no staged config; job directory starts empty");
                reset_dir(job_dir.clone()).await?;
            }
        }

        let job = self.build_job(ctx, spec, &name, &job_name, job_dir).await?;
        debug!(job = %name, mode = ?self.config.mode, "submitting job");

        let metrics = ctx.metrics().clone();
        match self.config.mode {
            SubmitMode::Inline => job.run(self.name(), metrics).await?,
            SubmitMode::Detached => {
                let handle = tokio::spawn(job.run(SCHEDULER_TYPE_LOCAL, metrics));
                self.outstanding.lock().await.push(Outstanding {
                    name: name.clone(),
                    handle,
                });
            }
        }

        Ok(JobHandle { name, result_dir })
    }

    async fn wait_complete(&self, _ctx: &ExecContext, filter: &str) -> Result<(), SchedulerError> {
        let matching: Vec<Outstanding> = {
            let mut guard = self.outstanding.lock().await;
            let (matching, rest): (Vec<_>, Vec<_>) =
                guard.drain(..).partition(|o| o.name.contains(filter));
            *guard = rest;
            matching
        };
        debug!(filter, jobs = matching.len(), "waiting for jobs");

        let mut first_err = None;
        for job in matching {
            let result = match job.handle.await {
                Ok(result) => result,
                Err(e) => Err(SchedulerError::JobFailed {
                    job: job.name.clone(),
                    reason: format!("job task aborted: {e}"),
                }),
            };
            if let Err(e) = result {
                warn!(job = %job.name, error = %e, "job did not complete successfully");
                first_err.get_or_insert(e);
            }
        }
        first_err.map_or(Ok(()), Err)
    }

    async fn fetch_results(&self, ctx: &ExecContext) -> Result<(), SchedulerError> {
        // Detached jobs still running would be copied half-written.
        self.wait_complete(ctx, "").await?;

        let remote = &self.config.remote_results;
        let local = ctx.local_results();
        if !remote.is_dir() {
            debug!(remote = %remote.display(), "no remote results to fetch");
            return Ok(());
        }
        if same_dir(remote, local).await {
            trace!(dir = %local.display(), "remote and local results coincide");
            return Ok(());
        }

        let fetch_err = |e: std::io::Error| SchedulerError::Fetch(e.to_string());
        let mut entries = tokio::fs::read_dir(remote).await.map_err(fetch_err)?;
        let mut fetched = 0usize;
        while let Some(entry) = entries.next_entry().await.map_err(fetch_err)? {
            if !entry.file_type().await.map_err(fetch_err)?.is_dir() {
                continue;
            }
            replace_dir(entry.path(), local.join(entry.file_name()))
                .await
                .map_err(fetch_err)?;
            fetched += 1;
        }
        info!(from = %remote.display(), to = %local.display(), dirs = fetched, "results fetched");
        Ok(())
    }
}

/// Environment exported to a job script.
fn job_env(ctx: &ExecContext, spec: &JobSpec, job_name: &str) -> Vec<(String, String)> {
    let label = spec.label.as_ref().map(|l| l.to_string()).unwrap_or_default();
    let mut env = vec![
        ("FAB_SCRIPT".to_string(), spec.script.clone()),
        ("FAB_LABEL".to_string(), label),
        ("FAB_CONFIG".to_string(), ctx.config().unwrap_or_default().to_string()),
        ("FAB_JOB_NAME".to_string(), job_name.to_string()),
        ("FAB_WALL_TIME".to_string(), spec.wall_time.to_string()),
    ];
    env.extend(
        spec.resources
            .iter()
            .map(|(k, v)| (env_key(k), v.to_string())),
    );
    env
}

/// `FAB_` followed by `key` upper-cased, non-alphanumerics replaced by `_`.
fn env_key(key: &str) -> String {
    let mut out = String::with_capacity(key.len() + 4);
    out.push_str("FAB_");
    out.extend(key.chars().map(|c| {
        if c.is_ascii_alphanumeric() {
            c.to_ascii_uppercase()
        } else {
            '_'
        }
    }));
    out
}

async fn same_dir(a: &Path, b: &Path) -> bool {
    match (tokio::fs::canonicalize(a).await, tokio::fs::canonicalize(b).await) {
        (Ok(a), Ok(b)) => a == b,
        _ => false,
    }
}
