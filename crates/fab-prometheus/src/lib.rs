//! Prometheus implementation of [`fab_core::MetricsBackend`].
//!
//! ```rust
//! use std::sync::Arc;
//! use fab_core::ExecContext;
//! use fab_prometheus::PrometheusMetrics;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let metrics = PrometheusMetrics::new()?;
//! let ctx = ExecContext::default().with_metrics(Arc::new(metrics.clone()));
//! # let _ = ctx;
//!
//! // after running tasks:
//! let text = metrics.encode_text()?;
//! assert!(text.is_empty() || text.contains("fab_"));
//! # Ok(())
//! # }
//! ```
//!
//! ## Metrics
//! - `fab_jobs_submitted_total{scheduler, label}` - Counter
//! - `fab_jobs_completed_total{scheduler, outcome}` - Counter
//! - `fab_job_duration_seconds{scheduler}` - Histogram
//! - `fab_validation_score{config}` - Gauge, last score
//! - `fab_validation_cases_total{config}` - Counter
//!
//! No HTTP endpoint is provided; embed [`PrometheusMetrics::gather`] in the
//! application's own server or dump [`PrometheusMetrics::encode_text`].

mod backend;
pub use backend::PrometheusMetrics;

pub use prometheus::{Encoder, Registry, TextEncoder};
