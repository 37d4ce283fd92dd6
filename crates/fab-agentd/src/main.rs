use std::{env, path::PathBuf, sync::Arc};

use anyhow::Context;
use tracing::{debug, info};

use fab_core::{
    ContextConfig, ExecContext, SchedulerRouter,
    tasks::{dummy_ensemble, dummy_sif},
    workflow::ValidationRequest,
};
use fab_exec::local::{LocalSchedulerConfig, register_local_scheduler};
use fab_model::Args;
use fab_observe::{LoggerConfig, init_logger};
use fab_prometheus::PrometheusMetrics;

/// Plugin directory holding `config_files/` and `scripts/`.
const ROOT_VAR: &str = "FABLOGO_ROOT";
/// Scratch directory standing in for the remote machine.
const WORK_VAR: &str = "FABLOGO_WORK";
/// Log filter override.
const LOG_VAR: &str = "FAB_LOG";

#[tokio::main(flavor = "multi_thread")]
async fn main() -> anyhow::Result<()> {
    // 1) logger
    let cfg = LoggerConfig::default().with_env_level(LOG_VAR)?;
    init_logger(&cfg)?;

    let root = env::var_os(ROOT_VAR)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("plugin"));
    let work = env::var_os(WORK_VAR)
        .map(PathBuf::from)
        .unwrap_or_else(|| env::temp_dir().join("fablogo"));
    info!(root = %root.display(), work = %work.display(), "logger initialized");

    // 2) metrics + context
    let metrics = PrometheusMetrics::new()?;
    let ctx = ExecContext::from_config(ContextConfig {
        local_results: work.join("local_results"),
        config_root: root.join("config_files"),
        ..Default::default()
    })
    .with_metrics(Arc::new(metrics.clone()));

    // 3) router + schedulers
    let mut router = SchedulerRouter::new();
    register_local_scheduler(
        &mut router,
        LocalSchedulerConfig {
            scripts_root: root.join("scripts"),
            work_root: work.clone(),
            remote_results: work.join("results"),
            ..Default::default()
        },
    )?;
    let scheduler = router.for_context(&ctx)?;

    // 4) paired validation
    let report = dummy_sif(scheduler.as_ref(), &ctx, &ValidationRequest::new("dummy_test"))
        .await
        .context("dummy_sif failed")?;
    info!(job = %report.job_name, scores = %report.scores, "validation finished");

    // 5) ensemble
    let handles = dummy_ensemble(scheduler.as_ref(), &ctx, "dummy_test", &Args::new())
        .await
        .context("dummy_ensemble failed")?;
    info!(jobs = handles.len(), "ensemble finished");

    debug!(metrics = %metrics.encode_text()?, "metrics snapshot");
    Ok(())
}
