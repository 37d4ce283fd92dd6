//! Stable-intermediate-form validation: score a subject result set against a reference one.
//!
//! A result root holds either a single run (its `out.txt` at the root) or an
//! ensemble laid out as `RUNS/<case>/out.txt`. Cases present under both
//! roots are compared pairwise and the scores are handed to an aggregator.
use std::{
    fs,
    path::{Path, PathBuf},
};

use tracing::{debug, instrument, warn};

use crate::{
    aggregate::{Aggregator, Scores},
    compare::{CompareError, CompareFn},
};

/// Sub-directory holding ensemble members.
pub const RUNS_DIR: &str = "RUNS";

/// One (subject, reference) pair to score.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationCase {
    /// Case name; the ensemble member name, or empty for a single run.
    pub name: String,
    pub subject: PathBuf,
    pub reference: PathBuf,
}

/// List the cases to compare between two result roots.
///
/// When both roots have a `RUNS/` directory, every member present in both is
/// a case (sorted by name); members only on one side are skipped with a
/// warning. Otherwise the two roots form the only case.
pub fn discover_cases(
    subject_root: &Path,
    reference_root: &Path,
) -> Result<Vec<ValidationCase>, CompareError> {
    let subject_runs = subject_root.join(RUNS_DIR);
    let reference_runs = reference_root.join(RUNS_DIR);

    if !(subject_runs.is_dir() && reference_runs.is_dir()) {
        return Ok(vec![ValidationCase {
            name: String::new(),
            subject: subject_root.to_path_buf(),
            reference: reference_root.to_path_buf(),
        }]);
    }

    let mut names = Vec::new();
    let entries = fs::read_dir(&subject_runs).map_err(|source| CompareError::Io {
        path: subject_runs.clone(),
        source,
    })?;
    for entry in entries {
        let entry = entry.map_err(|source| CompareError::Io {
            path: subject_runs.clone(),
            source,
        })?;
        if !entry.path().is_dir() {
            continue;
        }
        let name = entry.file_name().to_string_lossy().into_owned();
        if reference_runs.join(&name).is_dir() {
            names.push(name);
        } else {
            warn!(case = %name, "no reference run for ensemble member; skipping");
        }
    }
    names.sort();

    Ok(names
        .into_iter()
        .map(|name| ValidationCase {
            subject: subject_runs.join(&name),
            reference: reference_runs.join(&name),
            name,
        })
        .collect())
}

/// Score every case with `compare`, in order. The first failure aborts.
pub fn collect_scores<C>(cases: &[ValidationCase], compare: &C) -> Result<Scores, CompareError>
where
    C: CompareFn + ?Sized,
{
    cases
        .iter()
        .map(|case| {
            let score = compare.score(&case.subject, &case.reference)?;
            debug!(case = %case.name, score, "case scored");
            Ok(score)
        })
        .collect::<Result<Vec<_>, _>>()
        .map(Scores::from)
}

/// Compare `subject_root` against `reference_root` and reduce the scores.
#[instrument(level = "debug", skip_all, fields(subject = %subject_root.display(), reference = %reference_root.display()))]
pub fn sif_vvp<C, A>(
    subject_root: &Path,
    reference_root: &Path,
    compare: &C,
    aggregate: &A,
) -> Result<A::Output, CompareError>
where
    C: CompareFn + ?Sized,
    A: Aggregator + ?Sized,
{
    let cases = discover_cases(subject_root, reference_root)?;
    let scores = collect_scores(&cases, compare)?;
    Ok(aggregate.aggregate(scores))
}
