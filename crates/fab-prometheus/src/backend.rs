use std::sync::Arc;

use prometheus::{
    CounterVec, GaugeVec, HistogramOpts, HistogramVec, Opts, Registry, TextEncoder,
    proto::MetricFamily,
};

use fab_core::{JobOutcome, MetricsBackend};

const NAMESPACE: &str = "fab";

/// Label value used for every job label other than the two validation labels.
const CUSTOM_LABEL: &str = "custom";

/// Prometheus metrics backend.
///
/// Label cardinality stays bounded: `scheduler` is a static scheduler name,
/// `label` is `sif`, `test_subject`, `none` or `custom` (ensemble member
/// labels are folded into `custom`), `outcome` is one of the
/// [`JobOutcome`] labels. `config` grows with the number of validated
/// configurations.
#[derive(Clone)]
pub struct PrometheusMetrics {
    jobs_submitted: CounterVec,
    jobs_completed: CounterVec,
    job_duration: HistogramVec,
    validation_score: GaugeVec,
    validation_cases: CounterVec,
    registry: Arc<Registry>,
}

impl PrometheusMetrics {
    /// Create the backend, registering its metrics in `registry`.
    pub fn new_with_registry(registry: Arc<Registry>) -> Result<Self, prometheus::Error> {
        let jobs_submitted = CounterVec::new(
            Opts::new("jobs_submitted_total", "Jobs handed to a scheduler").namespace(NAMESPACE),
            &["scheduler", "label"],
        )?;
        registry.register(Box::new(jobs_submitted.clone()))?;

        let jobs_completed = CounterVec::new(
            Opts::new("jobs_completed_total", "Jobs that reached a terminal state")
                .namespace(NAMESPACE),
            &["scheduler", "outcome"],
        )?;
        registry.register(Box::new(jobs_completed.clone()))?;

        let job_duration = HistogramVec::new(
            HistogramOpts::new("job_duration_seconds", "Job run time in seconds")
                .namespace(NAMESPACE)
                .buckets(vec![0.1, 1.0, 10.0, 60.0, 300.0, 900.0, 3600.0, 4.0 * 3600.0]),
            &["scheduler"],
        )?;
        registry.register(Box::new(job_duration.clone()))?;

        let validation_score = GaugeVec::new(
            Opts::new("validation_score", "Last relative difference between subject and reference")
                .namespace(NAMESPACE),
            &["config"],
        )?;
        registry.register(Box::new(validation_score.clone()))?;

        let validation_cases = CounterVec::new(
            Opts::new("validation_cases_total", "Compared (subject, reference) pairs")
                .namespace(NAMESPACE),
            &["config"],
        )?;
        registry.register(Box::new(validation_cases.clone()))?;

        Ok(Self {
            jobs_submitted,
            jobs_completed,
            job_duration,
            validation_score,
            validation_cases,
            registry,
        })
    }

    /// Create the backend with its own registry.
    pub fn new() -> Result<Self, prometheus::Error> {
        Self::new_with_registry(Arc::new(Registry::new()))
    }

    /// Gather all metrics for exposition.
    pub fn gather(&self) -> Vec<MetricFamily> {
        self.registry.gather()
    }

    /// Render all metrics in the Prometheus text format.
    pub fn encode_text(&self) -> Result<String, prometheus::Error> {
        TextEncoder::new().encode_to_string(&self.gather())
    }

    pub fn registry(&self) -> &Arc<Registry> {
        &self.registry
    }
}

fn label_value(label: &str) -> &str {
    match label {
        "sif" | "test_subject" | "none" => label,
        _ => CUSTOM_LABEL,
    }
}

impl MetricsBackend for PrometheusMetrics {
    fn record_job_submitted(&self, scheduler: &str, label: &str) {
        self.jobs_submitted
            .with_label_values(&[scheduler, label_value(label)])
            .inc();
    }

    fn record_job_completed(&self, scheduler: &str, outcome: JobOutcome, duration_ms: u64) {
        self.jobs_completed
            .with_label_values(&[scheduler, outcome.as_label()])
            .inc();
        self.job_duration
            .with_label_values(&[scheduler])
            .observe(duration_ms as f64 / 1000.0);
    }

    fn record_score(&self, config: &str, score: f64) {
        self.validation_score.with_label_values(&[config]).set(score);
        self.validation_cases.with_label_values(&[config]).inc();
    }
}
