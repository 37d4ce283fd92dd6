//! Task entry points.
//!
//! Each task takes the scheduler chosen for the context's host, the context
//! itself, a configuration name and free-form overrides. Overrides are merged
//! into the job spec (see [`JobSpec::with_overrides`]) and into the context's
//! template variables.
use std::{
    fs,
    path::{Path, PathBuf},
};

use tracing::{debug, info, instrument, warn};

use fab_model::{Args, JobLabel, JobSpec, WallTime};

use crate::{
    ExecContext,
    aggregate::Scores,
    error::CoreError,
    scheduler::{JobHandle, Scheduler},
    workflow::{ValidationReport, ValidationRequest, ValidationWorkflow},
};

/// Script running a NetLogo model.
pub const NETLOGO_SCRIPT: &str = "run_netlogo";
/// Script running LAMMPS.
pub const LAMMPS_SCRIPT: &str = "lammps";
/// Script run by each ensemble member.
pub const ENSEMBLE_SCRIPT: &str = "dummy";
/// Directory of a configuration holding one entry per ensemble member.
pub const SWEEP_DIR: &str = "SWEEP";
/// Input file name every ensemble member reads inside its config copy.
pub const ENSEMBLE_INPUT_NAME: &str = "dummy.txt";
/// Default LAMMPS input deck.
pub const LAMMPS_INPUT: &str = "in.CG.lammps";

/// Submit a NetLogo run of `config`.
///
/// Defaults: 15 minutes wall time, 2G memory.
#[instrument(level = "debug", skip(scheduler, ctx, args), fields(scheduler = scheduler.name()))]
pub async fn run_netlogo(
    scheduler: &dyn Scheduler,
    ctx: &ExecContext,
    config: &str,
    args: &Args,
) -> Result<JobHandle, CoreError> {
    let ctx = ctx.clone().with_args(args).with_config(config);
    let spec = JobSpec::new(NETLOGO_SCRIPT, WallTime::default())
        .with_resource("memory", "2G")
        .with_overrides(args)?;

    scheduler.put_configs(&ctx, config).await?;
    submit(scheduler, &ctx, &spec).await
}

/// Submit a LAMMPS run of `config` using the `in.CG.lammps` input deck.
#[instrument(level = "debug", skip(scheduler, ctx, args), fields(scheduler = scheduler.name()))]
pub async fn lammps_dummy(
    scheduler: &dyn Scheduler,
    ctx: &ExecContext,
    config: &str,
    args: &Args,
) -> Result<JobHandle, CoreError> {
    let ctx = ctx.clone().with_config(config).with_args(args);
    let spec = JobSpec::new(LAMMPS_SCRIPT, WallTime::default())
        .with_resource("lammps_input", LAMMPS_INPUT)
        .with_overrides(args)?;

    scheduler.put_configs(&ctx, config).await?;
    submit(scheduler, &ctx, &spec).await
}

/// Submit one `dummy` job per entry of `<config_root>/<config>/SWEEP`.
///
/// Entries are submitted in name order; each job is labeled with its entry
/// name and receives the entry path as the `sweep_input` resource. An empty
/// sweep directory submits nothing.
#[instrument(level = "debug", skip(scheduler, ctx, args), fields(scheduler = scheduler.name()))]
pub async fn dummy_ensemble(
    scheduler: &dyn Scheduler,
    ctx: &ExecContext,
    config: &str,
    args: &Args,
) -> Result<Vec<JobHandle>, CoreError> {
    let ctx = ctx.clone().with_config(config).with_args(args);
    let sweep_dir = ctx.config_dir(config).join(SWEEP_DIR);
    info!(path = %sweep_dir.display(), "sweep directory");

    let entries = sweep_entries(&sweep_dir)?;
    if entries.is_empty() {
        warn!(path = %sweep_dir.display(), "sweep directory is empty, nothing to submit");
        return Ok(Vec::new());
    }

    scheduler.put_configs(&ctx, config).await?;

    let mut handles = Vec::with_capacity(entries.len());
    for (name, path) in entries {
        let spec = JobSpec::new(ENSEMBLE_SCRIPT, WallTime::default())
            .with_label(name.parse::<JobLabel>()?)
            .with_resource("input_name_in_config", ENSEMBLE_INPUT_NAME)
            .with_resource("sweep_input", path.to_string_lossy())
            .with_overrides(args)?;
        handles.push(submit(scheduler, &ctx, &spec).await?);
    }
    Ok(handles)
}

/// Run the paired validation of `req.config`.
///
/// Uses the stock [`Comparator`](crate::compare::Comparator) and returns
/// the raw per-case scores.
pub async fn dummy_sif(
    scheduler: &dyn Scheduler,
    ctx: &ExecContext,
    req: &ValidationRequest,
) -> Result<ValidationReport<Scores>, CoreError> {
    ValidationWorkflow::new(scheduler).run(ctx, req).await
}

async fn submit(
    scheduler: &dyn Scheduler,
    ctx: &ExecContext,
    spec: &JobSpec,
) -> Result<JobHandle, CoreError> {
    let handle = scheduler.submit(ctx, spec).await?;
    let label = spec.label.as_ref().map(JobLabel::as_str).unwrap_or("none");
    ctx.metrics().record_job_submitted(scheduler.name(), label);
    debug!(job = %handle.name, script = %spec.script, label, "job submitted");
    Ok(handle)
}

fn sweep_entries(sweep_dir: &Path) -> Result<Vec<(String, PathBuf)>, CoreError> {
    let sweep_err = |source: std::io::Error| CoreError::Sweep {
        path: sweep_dir.to_path_buf(),
        source,
    };

    let mut entries = Vec::new();
    for entry in fs::read_dir(sweep_dir).map_err(sweep_err)? {
        let entry = entry.map_err(sweep_err)?;
        let name = entry.file_name().to_string_lossy().into_owned();
        if name.starts_with('.') {
            continue;
        }
        entries.push((name, entry.path()));
    }
    entries.sort();
    Ok(entries)
}
