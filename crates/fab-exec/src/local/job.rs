use std::{fmt, path::PathBuf, process::Stdio, time::Instant};

use tokio::{
    io::{AsyncBufReadExt, AsyncRead, BufReader},
    process::{Child, Command},
    task::JoinHandle,
    time::timeout,
};
use tracing::{debug, info, trace, warn};

use fab_core::{JobOutcome, MetricsHandle, SchedulerError};
use fab_model::WallTime;

use crate::{RlimitConfig, attach_rlimits, local::OutputLogConfig, scheduler_error_to_outcome};

/// Everything needed to run one job script.
#[derive(Debug, Clone)]
pub(crate) struct LocalJob {
    /// Scheduler-unique job name.
    pub(crate) name: String,
    pub(crate) shell: String,
    pub(crate) script: PathBuf,
    /// Job directory; the script runs with it as working directory.
    pub(crate) cwd: PathBuf,
    pub(crate) env: Vec<(String, String)>,
    pub(crate) wall_time: WallTime,
    pub(crate) rlimits: RlimitConfig,
    pub(crate) output: OutputLogConfig,
}

impl LocalJob {
    /// Run the job to completion and report the outcome to `metrics`.
    pub(crate) async fn run(
        self,
        scheduler: &'static str,
        metrics: MetricsHandle,
    ) -> Result<(), SchedulerError> {
        let started = Instant::now();
        let result = self.execute().await;
        let outcome = match &result {
            Ok(()) => JobOutcome::Success,
            Err(e) => scheduler_error_to_outcome(e),
        };
        let duration_ms = started.elapsed().as_millis() as u64;
        metrics.record_job_completed(scheduler, outcome, duration_ms);
        debug!(job = %self.name, outcome = outcome.as_label(), duration_ms, "job finished");
        result
    }

    fn command(&self) -> Command {
        let mut cmd = Command::new(&self.shell);
        cmd.arg(&self.script)
            .current_dir(&self.cwd)
            .envs(self.env.iter().map(|(k, v)| (k, v)))
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        #[cfg(unix)]
        {
            cmd.process_group(0);
        }
        attach_rlimits(&mut cmd, &self.rlimits);
        cmd
    }

    async fn execute(&self) -> Result<(), SchedulerError> {
        trace!(job = %self.name, config = %self, "spawning job");
        let mut child = self.command().spawn().map_err(|e| SchedulerError::Submit {
            job: self.name.clone(),
            reason: format!("spawn failed: {e}"),
        })?;
        let forwarders = self.forward_output(&mut child);

        let status = match timeout(self.wall_time.as_duration(), child.wait()).await {
            Ok(status) => status.map_err(|e| SchedulerError::JobFailed {
                job: self.name.clone(),
                reason: format!("wait failed: {e}"),
            })?,
            Err(_) => {
                warn!(job = %self.name, wall_time = %self.wall_time, "wall time exceeded; killing job");
                kill(&mut child).await;
                for handle in forwarders {
                    handle.abort();
                }
                return Err(SchedulerError::Timeout {
                    job: self.name.clone(),
                    wall_time: self.wall_time,
                });
            }
        };

        for handle in forwarders {
            let _ = handle.await;
        }

        if status.success() {
            return Ok(());
        }
        let reason = match status.code() {
            Some(code) => format!("process exited with non-zero code: {code}"),
            None => "process terminated by signal".to_string(),
        };
        Err(SchedulerError::JobFailed {
            job: self.name.clone(),
            reason,
        })
    }

    fn forward_output(&self, child: &mut Child) -> Vec<JoinHandle<()>> {
        let mut handles = Vec::with_capacity(2);
        if let Some(stdout) = child.stdout.take() {
            handles.push(tokio::spawn(forward_lines(
                stdout,
                self.name.clone(),
                Stream::Stdout,
                self.output,
            )));
        }
        if let Some(stderr) = child.stderr.take() {
            handles.push(tokio::spawn(forward_lines(
                stderr,
                self.name.clone(),
                Stream::Stderr,
                self.output,
            )));
        }
        handles
    }
}

impl fmt::Display for LocalJob {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "LocalJob(shell='{}', script={:?}, cwd={:?}, env={}, wall_time={})",
            self.shell,
            self.script,
            self.cwd,
            self.env.len(),
            self.wall_time,
        )
    }
}

/// Kill the whole process group of `child`, so scripts' own children die too.
async fn kill(child: &mut Child) {
    #[cfg(unix)]
    {
        if let Some(pid) = child.id() {
            unsafe {
                libc::kill(-(pid as libc::pid_t), libc::SIGKILL);
            }
        }
    }
    if let Err(e) = child.kill().await {
        debug!("failed to kill job process: {e}");
    }
}

#[derive(Debug, Clone, Copy)]
enum Stream {
    Stdout,
    Stderr,
}

async fn forward_lines<R>(reader: R, job: String, stream: Stream, cfg: OutputLogConfig)
where
    R: AsyncRead + Unpin,
{
    let mut lines = BufReader::new(reader).lines();
    loop {
        match lines.next_line().await {
            Ok(Some(line)) => {
                let line = truncate(&line, cfg.max_line_length);
                match stream {
                    Stream::Stdout if cfg.stdout_info => info!(job = %job, "{line}"),
                    Stream::Stderr if cfg.stderr_warn => warn!(job = %job, "{line}"),
                    _ => debug!(job = %job, ?stream, "{line}"),
                }
            }
            Ok(None) => break,
            Err(e) => {
                debug!(job = %job, ?stream, "output stream closed: {e}");
                break;
            }
        }
    }
}

/// Cut `line` to at most `max` bytes on a char boundary.
fn truncate(line: &str, max: usize) -> &str {
    if line.len() <= max {
        return line;
    }
    let mut end = max;
    while !line.is_char_boundary(end) {
        end -= 1;
    }
    &line[..end]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn truncate_respects_char_boundaries() {
        assert_eq!(truncate("short", 10), "short");
        assert_eq!(truncate("abcdef", 3), "abc");
        assert_eq!(truncate("aé", 2), "a");
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn timeout_kills_the_job() {
        let dir = tempfile::tempdir().unwrap();
        let script = dir.path().join("slow");
        std::fs::write(&script, "sleep 30\n").unwrap();
        let job = LocalJob {
            name: "slow-job".into(),
            shell: "sh".into(),
            script,
            cwd: dir.path().to_path_buf(),
            env: Vec::new(),
            wall_time: WallTime::from_secs(1),
            rlimits: RlimitConfig::default(),
            output: OutputLogConfig::default(),
        };

        let started = Instant::now();
        let err = job.run("local", fab_core::noop_metrics()).await.unwrap_err();

        assert!(matches!(err, SchedulerError::Timeout { .. }));
        assert!(started.elapsed().as_secs() < 10);
    }
}
