//! Paired validation workflow.
//!
//! Submits a reference (`sif`) run and a test-subject run built from the
//! same configuration, waits for both on remote hosts, fetches their output
//! and scores the subject against the reference.
use std::{fmt, path::{Path, PathBuf}};

use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument};

use fab_model::{
    Args, ConfigName, DEFAULT_TESTING_TEMPLATE, JobLabel, JobSpec, ModelResult, SIF_SCRIPT,
    VALIDATION_CONFIG, WallTime,
};

use crate::{
    ExecContext,
    aggregate::{Aggregator, Identity},
    compare::{CompareError, CompareFn, Comparator},
    error::CoreError,
    scheduler::Scheduler,
    validation::sif_vvp,
};

/// Parameters of one validation run.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ValidationRequest {
    /// Configuration both jobs are built from.
    pub config: ConfigName,
    /// Script that plays the test subject.
    pub testing_template: String,
    /// Score results of an earlier run instead of submitting new jobs.
    pub skip_runs: bool,
    /// Do not wait for remote jobs before fetching.
    pub no_wait: bool,
    /// Log source paths and parsed values of each comparison.
    pub verbose: bool,
    /// Overrides merged into both job specs and into the context variables.
    pub args: Args,
}

impl Default for ValidationRequest {
    fn default() -> Self {
        Self {
            config: "dummy_test".to_string(),
            testing_template: DEFAULT_TESTING_TEMPLATE.to_string(),
            skip_runs: false,
            no_wait: false,
            verbose: true,
            args: Args::new(),
        }
    }
}

impl ValidationRequest {
    pub fn new(config: impl Into<ConfigName>) -> Self {
        Self {
            config: config.into(),
            ..Default::default()
        }
    }

    pub fn with_testing_template(mut self, template: impl Into<String>) -> Self {
        self.testing_template = template.into();
        self
    }

    pub fn with_skip_runs(mut self, skip: bool) -> Self {
        self.skip_runs = skip;
        self
    }

    pub fn with_no_wait(mut self, no_wait: bool) -> Self {
        self.no_wait = no_wait;
        self
    }

    pub fn with_verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    pub fn with_args(mut self, args: Args) -> Self {
        self.args = args;
        self
    }

    /// Job specs of the pair, reference first.
    pub fn job_specs(&self) -> ModelResult<[JobSpec; 2]> {
        let reference = JobSpec::new(SIF_SCRIPT, WallTime::default())
            .with_label(JobLabel::Sif)
            .with_overrides(&self.args)?;
        let subject = JobSpec::new(&self.testing_template, WallTime::default())
            .with_label(JobLabel::TestSubject)
            .with_overrides(&self.args)?;
        Ok([reference, subject])
    }
}

/// Result of a validation run.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidationReport<O> {
    /// Rendered job name both result directories derive from.
    pub job_name: String,
    pub subject_dir: PathBuf,
    pub reference_dir: PathBuf,
    /// Aggregated scores.
    pub scores: O,
}

/// Coordinates the paired runs and their comparison.
///
/// `C` scores each case (default [`Comparator`]), `A` reduces the scores
/// (default [`Identity`]).
pub struct ValidationWorkflow<'s, C = Comparator, A = Identity> {
    scheduler: &'s dyn Scheduler,
    compare: C,
    aggregate: A,
}

impl<'s> ValidationWorkflow<'s> {
    /// Workflow with the stock comparator and the identity aggregator.
    ///
    /// The comparator logs parsed values whenever the request is verbose.
    pub fn new(scheduler: &'s dyn Scheduler) -> Self {
        Self {
            scheduler,
            compare: Comparator::default(),
            aggregate: Identity,
        }
    }
}

impl<'s, C, A> ValidationWorkflow<'s, C, A>
where
    C: CompareFn,
    A: Aggregator,
{
    /// Replace the per-case comparison.
    pub fn with_compare<C2: CompareFn>(self, compare: C2) -> ValidationWorkflow<'s, C2, A> {
        ValidationWorkflow {
            scheduler: self.scheduler,
            compare,
            aggregate: self.aggregate,
        }
    }

    /// Replace the score reduction.
    pub fn with_aggregator<A2: Aggregator>(self, aggregate: A2) -> ValidationWorkflow<'s, C, A2> {
        ValidationWorkflow {
            scheduler: self.scheduler,
            compare: self.compare,
            aggregate,
        }
    }

    /// Run the workflow.
    ///
    /// Steps:
    /// 1. Bind `req.config` (and `req.args`) into the context.
    /// 2. Unless `skip_runs`: stage the config, submit the reference then the
    ///    subject job, and on a remote host wait for both unless `no_wait`.
    /// 3. With `skip_runs`: rebind the context to the `validation` config and submit nothing.
    /// 4. Fetch results, resolve `sif_<name>` / `test_subject_<name>`, compare and aggregate.
    ///
    /// Errors from any step are returned unchanged.
    #[instrument(level = "debug", skip_all, fields(config = %req.config, template = %req.testing_template, skip_runs = req.skip_runs))]
    pub async fn run(
        &self,
        ctx: &ExecContext,
        req: &ValidationRequest,
    ) -> Result<ValidationReport<A::Output>, CoreError>
    where
        A::Output: fmt::Debug,
    {
        let mut ctx = ctx.clone().with_config(&req.config).with_args(&req.args);

        if req.skip_runs {
            info!(config = VALIDATION_CONFIG, "skipping runs; scoring existing results");
            ctx = ctx.with_config(VALIDATION_CONFIG);
        } else {
            self.submit_pair(&ctx, req).await?;
        }

        self.scheduler.fetch_results(&ctx).await?;

        let job_name = ctx.job_name()?;
        let subject_dir = ctx.local_results().join(JobLabel::TestSubject.prefix(&job_name));
        let reference_dir = ctx.local_results().join(JobLabel::Sif.prefix(&job_name));
        debug!(
            subject = %subject_dir.display(),
            reference = %reference_dir.display(),
            "result directories resolved",
        );

        let recording = RecordScores {
            inner: &self.compare,
            ctx: &ctx,
            config: ctx.config().unwrap_or_default(),
            verbose: req.verbose,
        };
        let scores = sif_vvp(&subject_dir, &reference_dir, &recording, &self.aggregate)?;
        info!(job = %job_name, scores = ?scores, "validation scores");

        Ok(ValidationReport {
            job_name,
            subject_dir,
            reference_dir,
            scores,
        })
    }

    async fn submit_pair(&self, ctx: &ExecContext, req: &ValidationRequest) -> Result<(), CoreError> {
        let specs = req.job_specs()?;

        self.scheduler.put_configs(ctx, &req.config).await?;
        for spec in &specs {
            let handle = self.scheduler.submit(ctx, spec).await?;
            let label = spec.label.as_ref().map(JobLabel::as_str).unwrap_or("none");
            ctx.metrics().record_job_submitted(self.scheduler.name(), label);
            debug!(job = %handle.name, label, script = %spec.script, "job submitted");
        }

        if !ctx.is_local() && !req.no_wait {
            debug!(host = ctx.host(), "waiting for remote jobs");
            self.scheduler.wait_complete(ctx, "").await?;
        }
        Ok(())
    }
}

/// Forwards to the configured comparison and reports each score to metrics.
struct RecordScores<'a, C> {
    inner: &'a C,
    ctx: &'a ExecContext,
    config: &'a str,
    verbose: bool,
}

impl<C: CompareFn> CompareFn for RecordScores<'_, C> {
    fn score(&self, subject_dir: &Path, reference_dir: &Path) -> Result<f64, CompareError> {
        let score = self
            .inner
            .score_verbose(subject_dir, reference_dir, self.verbose)?;
        if self.verbose {
            info!(
                subject = %subject_dir.display(),
                reference = %reference_dir.display(),
                score,
                "case scored",
            );
        }
        self.ctx.metrics().record_score(self.config, score);
        Ok(score)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use super::*;
    use crate::{
        aggregate::{Scores, Threshold},
        metrics::{JobOutcome, MetricsBackend},
        testing::{Call, RecordingScheduler},
    };

    #[derive(Default)]
    struct ScoreSink(Mutex<Vec<(String, f64)>>);

    impl MetricsBackend for ScoreSink {
        fn record_job_submitted(&self, _: &str, _: &str) {}
        fn record_job_completed(&self, _: &str, _: JobOutcome, _: u64) {}
        fn record_score(&self, config: &str, score: f64) {
            self.0.lock().unwrap().push((config.to_string(), score));
        }
    }

    fn scheduler() -> RecordingScheduler {
        RecordingScheduler::new()
            .with_output("dummy_sif", "1.000000\n")
            .with_output("dummy_to_be_tested", "1.000010\n")
    }

    #[test]
    fn job_specs_are_reference_first() {
        let req = ValidationRequest::new("dummy_test")
            .with_args(Args::new().with("cores", "4").with("wall_time", "0:30:0"));
        let [reference, subject] = req.job_specs().unwrap();

        assert_eq!(reference.script, "dummy_sif");
        assert_eq!(reference.label, Some(JobLabel::Sif));
        assert_eq!(subject.script, "dummy_to_be_tested");
        assert_eq!(subject.label, Some(JobLabel::TestSubject));
        for spec in [&reference, &subject] {
            assert_eq!(spec.wall_time.as_secs(), 1800);
            assert_eq!(spec.resource("cores"), Some("4"));
        }
    }

    #[tokio::test]
    async fn local_run_submits_pair_and_scores() {
        let results = tempfile::tempdir().unwrap();
        let ctx = ExecContext::default().with_local_results(results.path());
        let sched = scheduler();

        let report = ValidationWorkflow::new(&sched)
            .run(&ctx, &ValidationRequest::new("dummy_test"))
            .await
            .unwrap();

        assert_eq!(report.job_name, "dummy_test_localhost_1");
        assert_eq!(
            report.subject_dir,
            results.path().join("test_subject_dummy_test_localhost_1")
        );
        assert_eq!(
            report.reference_dir,
            results.path().join("sif_dummy_test_localhost_1")
        );
        let score = report.scores.single().unwrap();
        assert!((score - 0.00001).abs() < 1e-9, "score = {score}");

        let calls = sched.calls();
        assert_eq!(calls[0], Call::PutConfigs("dummy_test".into()));
        assert!(matches!(&calls[1], Call::Submit(s) if s.label == Some(JobLabel::Sif)));
        assert!(matches!(&calls[2], Call::Submit(s) if s.label == Some(JobLabel::TestSubject)));
        assert_eq!(calls[3], Call::Fetch);
        assert_eq!(calls.len(), 4, "local runs are never waited on: {calls:?}");
    }

    #[tokio::test]
    async fn remote_run_waits_before_fetching() {
        let results = tempfile::tempdir().unwrap();
        let ctx = ExecContext::default()
            .with_host("archer2")
            .with_local_results(results.path());
        let sched = scheduler();

        ValidationWorkflow::new(&sched)
            .run(&ctx, &ValidationRequest::new("dummy_test"))
            .await
            .unwrap();

        let calls = sched.calls();
        assert_eq!(calls[3], Call::Wait(String::new()));
        assert_eq!(calls[4], Call::Fetch);
    }

    #[tokio::test]
    async fn no_wait_skips_the_blocking_step() {
        let results = tempfile::tempdir().unwrap();
        let ctx = ExecContext::default()
            .with_host("archer2")
            .with_local_results(results.path());
        let sched = scheduler();

        ValidationWorkflow::new(&sched)
            .run(&ctx, &ValidationRequest::new("dummy_test").with_no_wait(true))
            .await
            .unwrap();

        assert!(!sched.calls().iter().any(|c| matches!(c, Call::Wait(_))));
    }

    #[tokio::test]
    async fn skip_runs_scores_validation_directories() {
        let results = tempfile::tempdir().unwrap();
        for (dir, value) in [
            ("sif_validation_localhost_1", "2.0"),
            ("test_subject_validation_localhost_1", "3.0"),
        ] {
            let d = results.path().join(dir);
            std::fs::create_dir_all(&d).unwrap();
            std::fs::write(d.join("out.txt"), value).unwrap();
        }
        let ctx = ExecContext::default().with_local_results(results.path());
        let sched = scheduler();

        let report = ValidationWorkflow::new(&sched)
            .run(&ctx, &ValidationRequest::new("dummy_test").with_skip_runs(true))
            .await
            .unwrap();

        assert!(sched.submitted().is_empty());
        assert_eq!(sched.calls(), vec![Call::Fetch]);
        assert_eq!(report.job_name, "validation_localhost_1");
        assert_eq!(report.scores, Scores::from(0.5));
    }

    #[tokio::test]
    async fn skip_runs_reads_exact_validation_names() {
        let results = tempfile::tempdir().unwrap();
        for (dir, value) in [("sif_validation", "4.0"), ("test_subject_validation", "5.0")] {
            let d = results.path().join(dir);
            std::fs::create_dir_all(&d).unwrap();
            std::fs::write(d.join("out.txt"), value).unwrap();
        }
        let ctx = ExecContext::default()
            .with_local_results(results.path())
            .with_job_name_template("${config}");
        let sched = scheduler();

        let report = ValidationWorkflow::new(&sched)
            .run(&ctx, &ValidationRequest::new("dummy_test").with_skip_runs(true))
            .await
            .unwrap();

        assert_eq!(report.job_name, "validation");
        assert_eq!(report.reference_dir, results.path().join("sif_validation"));
        assert_eq!(report.subject_dir, results.path().join("test_subject_validation"));
        assert_eq!(report.scores, Scores::from(0.25));
        assert_eq!(sched.calls(), vec![Call::Fetch]);
    }

    /// Remembers the verbosity each case was scored with.
    struct VerbosityLog<'a>(&'a Mutex<Vec<bool>>);

    impl CompareFn for VerbosityLog<'_> {
        fn score(&self, _: &Path, _: &Path) -> Result<f64, CompareError> {
            Ok(0.0)
        }

        fn score_verbose(&self, s: &Path, r: &Path, verbose: bool) -> Result<f64, CompareError> {
            self.0.lock().unwrap().push(verbose);
            self.score(s, r)
        }
    }

    #[tokio::test]
    async fn request_verbosity_reaches_the_comparison() {
        let results = tempfile::tempdir().unwrap();
        let ctx = ExecContext::default().with_local_results(results.path());
        let sched = scheduler();
        let seen = Mutex::new(Vec::new());

        for verbose in [true, false] {
            ValidationWorkflow::new(&sched)
                .with_compare(VerbosityLog(&seen))
                .run(&ctx, &ValidationRequest::new("dummy_test").with_verbose(verbose))
                .await
                .unwrap();
        }

        assert!(ValidationRequest::default().verbose);
        assert_eq!(*seen.lock().unwrap(), vec![true, false]);
    }

    #[tokio::test]
    async fn custom_template_and_aggregator() {
        let results = tempfile::tempdir().unwrap();
        let ctx = ExecContext::default()
            .with_local_results(results.path())
            .with_job_name_template("${config}");
        let sched = RecordingScheduler::new()
            .with_output("dummy_sif", "10")
            .with_output("candidate", "10.5");

        let report = ValidationWorkflow::new(&sched)
            .with_aggregator(Threshold { tolerance: 0.01 })
            .run(
                &ctx,
                &ValidationRequest::new("dummy_test").with_testing_template("candidate"),
            )
            .await
            .unwrap();

        assert!(!report.scores, "0.05 relative error must fail a 1% threshold");
        assert_eq!(sched.submitted()[1].script, "candidate");
    }

    #[tokio::test]
    async fn scores_are_reported_to_metrics() {
        let results = tempfile::tempdir().unwrap();
        let sink = Arc::new(ScoreSink::default());
        let ctx = ExecContext::default()
            .with_local_results(results.path())
            .with_metrics(sink.clone());
        let sched = scheduler();

        ValidationWorkflow::new(&sched)
            .run(&ctx, &ValidationRequest::new("dummy_test"))
            .await
            .unwrap();

        let recorded = sink.0.lock().unwrap().clone();
        assert_eq!(recorded.len(), 1);
        assert_eq!(recorded[0].0, "dummy_test");
    }

    #[tokio::test]
    async fn missing_output_propagates() {
        let results = tempfile::tempdir().unwrap();
        let ctx = ExecContext::default().with_local_results(results.path());
        let sched = RecordingScheduler::new().with_output("dummy_sif", "1.0");

        let err = ValidationWorkflow::new(&sched)
            .run(&ctx, &ValidationRequest::new("dummy_test"))
            .await
            .unwrap_err();

        assert!(matches!(err, CoreError::Compare(CompareError::Io { .. })));
    }

    #[tokio::test]
    async fn reserved_override_fails_before_submitting() {
        let ctx = ExecContext::default();
        let sched = scheduler();

        let err = ValidationWorkflow::new(&sched)
            .run(
                &ctx,
                &ValidationRequest::new("dummy_test").with_args(Args::new().with("script", "x")),
            )
            .await
            .unwrap_err();

        assert!(matches!(err, CoreError::Model(_)));
        assert!(sched.calls().is_empty());
    }
}
