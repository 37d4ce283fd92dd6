//! Test doubles shared by the unit tests of this crate.
use std::{collections::BTreeMap, fs, sync::Mutex};

use async_trait::async_trait;
use fab_model::{JobSpec, OUTPUT_FILE};

use crate::{
    ExecContext,
    scheduler::{JobHandle, Scheduler, SchedulerError, make_job_id},
};

#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    PutConfigs(String),
    Submit(JobSpec),
    Wait(String),
    Fetch,
}

/// Scheduler that records every call and "runs" a job by writing a canned
/// `out.txt` (keyed by script) straight into the local results root.
pub struct RecordingScheduler {
    name: &'static str,
    outputs: BTreeMap<String, String>,
    calls: Mutex<Vec<Call>>,
}

impl RecordingScheduler {
    pub fn new() -> Self {
        Self::named("recording")
    }

    pub fn named(name: &'static str) -> Self {
        Self {
            name,
            outputs: BTreeMap::new(),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn with_output(mut self, script: &str, content: &str) -> Self {
        self.outputs.insert(script.to_string(), content.to_string());
        self
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    pub fn submitted(&self) -> Vec<JobSpec> {
        self.calls()
            .into_iter()
            .filter_map(|c| match c {
                Call::Submit(spec) => Some(spec),
                _ => None,
            })
            .collect()
    }

    fn record(&self, call: Call) {
        self.calls.lock().unwrap().push(call);
    }
}

#[async_trait]
impl Scheduler for RecordingScheduler {
    fn name(&self) -> &'static str {
        self.name
    }

    async fn put_configs(&self, _ctx: &ExecContext, config: &str) -> Result<(), SchedulerError> {
        self.record(Call::PutConfigs(config.to_string()));
        Ok(())
    }

    async fn submit(&self, ctx: &ExecContext, spec: &JobSpec) -> Result<JobHandle, SchedulerError> {
        self.record(Call::Submit(spec.clone()));

        let result_dir = spec.result_dir_name(&ctx.job_name()?);
        if let Some(content) = self.outputs.get(&spec.script) {
            let dir = ctx.local_results().join(&result_dir);
            fs::create_dir_all(&dir)?;
            fs::write(dir.join(OUTPUT_FILE), content)?;
        }
        Ok(JobHandle {
            name: make_job_id(self.name, &result_dir),
            result_dir,
        })
    }

    async fn wait_complete(&self, _ctx: &ExecContext, filter: &str) -> Result<(), SchedulerError> {
        self.record(Call::Wait(filter.to_string()));
        Ok(())
    }

    async fn fetch_results(&self, _ctx: &ExecContext) -> Result<(), SchedulerError> {
        self.record(Call::Fetch);
        Ok(())
    }
}
