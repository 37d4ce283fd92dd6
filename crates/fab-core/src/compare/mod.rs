//! Relative-error comparison of two result directories.
//!
//! Each result directory holds an `out.txt` whose last non-blank line is the
//! job's scalar result. The score of a (subject, reference) pair is
//! `|subject - reference| / |reference|`.
mod error;
pub use error::CompareError;

use std::{
    fs,
    path::{Path, PathBuf},
};

use serde::{Deserialize, Serialize};
use tracing::{info, trace};

use fab_model::OUTPUT_FILE;

/// Reference value used when the reference `out.txt` holds no value.
pub const REFERENCE_FLOOR: f64 = 0.000001;

/// Subject value used when the subject `out.txt` holds no value.
pub const SUBJECT_DEFAULT: f64 = 0.0;

/// How a zero reference value is handled.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ZeroPolicy {
    /// Only an empty reference file falls back to [`REFERENCE_FLOOR`];
    /// an explicit `0` fails with [`CompareError::ZeroReference`].
    #[default]
    Strict,
    /// Any non-positive or non-finite reference is replaced by [`REFERENCE_FLOOR`].
    Floor,
}

/// Value of the last numeric line.
///
/// Lines are scanned in order and each later value replaces the earlier one,
/// so `"1.0\n2.0\n3.5"` yields `3.5`. Whitespace-only lines are skipped; any
/// other line that is not a float is an error, even if a later line parses.
/// Yields [`CompareError::NoValue`] when there is no non-blank line at all.
pub fn extract_last_numeric_line<I, S>(lines: I) -> Result<f64, CompareError>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut value = None;
    for (idx, line) in lines.into_iter().enumerate() {
        let line = line.as_ref().trim();
        if line.is_empty() {
            continue;
        }
        let parsed = line.parse::<f64>().map_err(|_| CompareError::Parse {
            line: idx + 1,
            content: line.to_string(),
        })?;
        value = Some(parsed);
    }
    value.ok_or(CompareError::NoValue)
}

/// Read the scalar result stored in `<dir>/out.txt`.
///
/// A file without any value yields `fallback`; a missing file is an error.
pub fn read_output_value(dir: &Path, fallback: f64) -> Result<f64, CompareError> {
    let path = dir.join(OUTPUT_FILE);
    let content = fs::read_to_string(&path).map_err(|source| CompareError::Io {
        path: path.clone(),
        source,
    })?;

    match extract_last_numeric_line(content.lines()) {
        Err(CompareError::NoValue) => {
            trace!(path = %path.display(), fallback, "no value in output, using fallback");
            Ok(fallback)
        }
        other => other,
    }
}

/// `|subject - reference| / |reference|`, with zero handling per `policy`.
pub fn relative_difference(
    subject: f64,
    reference: f64,
    policy: ZeroPolicy,
) -> Result<f64, CompareError> {
    let reference = match policy {
        ZeroPolicy::Strict if reference == 0.0 => return Err(CompareError::ZeroReference),
        ZeroPolicy::Strict => reference,
        ZeroPolicy::Floor if reference.is_finite() && reference > 0.0 => reference,
        ZeroPolicy::Floor => REFERENCE_FLOOR,
    };
    Ok((subject - reference).abs() / reference.abs())
}

/// Per-case scoring function used by the validation runner.
///
/// [`Comparator`] is the stock implementation; any
/// `Fn(&Path, &Path) -> Result<f64, CompareError>` works as well.
pub trait CompareFn {
    /// Score the result in `subject_dir` against the one in `reference_dir`.
    fn score(&self, subject_dir: &Path, reference_dir: &Path) -> Result<f64, CompareError>;

    /// Like [`CompareFn::score`], with the caller's verbosity.
    ///
    /// Implementations that log nothing can keep the default.
    fn score_verbose(
        &self,
        subject_dir: &Path,
        reference_dir: &Path,
        verbose: bool,
    ) -> Result<f64, CompareError> {
        let _ = verbose;
        self.score(subject_dir, reference_dir)
    }
}

impl<F> CompareFn for F
where
    F: Fn(&Path, &Path) -> Result<f64, CompareError>,
{
    fn score(&self, subject_dir: &Path, reference_dir: &Path) -> Result<f64, CompareError> {
        self(subject_dir, reference_dir)
    }
}

/// Outcome of one comparison.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Comparison {
    pub subject_source: PathBuf,
    pub reference_source: PathBuf,
    pub subject: f64,
    pub reference: f64,
    pub score: f64,
}

/// Compares the `out.txt` values of two result directories.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Comparator {
    /// Log source paths and parsed values at `info` level.
    pub verbose: bool,
    /// Zero-reference handling.
    pub zero_policy: ZeroPolicy,
}

impl Comparator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    pub fn with_zero_policy(mut self, policy: ZeroPolicy) -> Self {
        self.zero_policy = policy;
        self
    }

    /// Read both values and compute their relative difference.
    pub fn compare(&self, subject_dir: &Path, reference_dir: &Path) -> Result<Comparison, CompareError> {
        let subject_source = subject_dir.join(OUTPUT_FILE);
        let reference_source = reference_dir.join(OUTPUT_FILE);
        if self.verbose {
            info!(
                subject = %subject_source.display(),
                reference = %reference_source.display(),
                "comparing results",
            );
        }

        let subject = read_output_value(subject_dir, SUBJECT_DEFAULT)?;
        let reference = read_output_value(reference_dir, REFERENCE_FLOOR)?;
        if self.verbose {
            info!(subject, reference, "parsed result values");
        }

        let score = relative_difference(subject, reference, self.zero_policy)?;
        trace!(subject, reference, score, "comparison done");
        Ok(Comparison {
            subject_source,
            reference_source,
            subject,
            reference,
            score,
        })
    }
}

impl CompareFn for Comparator {
    fn score(&self, subject_dir: &Path, reference_dir: &Path) -> Result<f64, CompareError> {
        self.compare(subject_dir, reference_dir).map(|c| c.score)
    }

    fn score_verbose(
        &self,
        subject_dir: &Path,
        reference_dir: &Path,
        verbose: bool,
    ) -> Result<f64, CompareError> {
        self.with_verbose(self.verbose || verbose)
            .score(subject_dir, reference_dir)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn result_dir(content: &str) -> TempDir {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join(OUTPUT_FILE), content).unwrap();
        dir
    }

    fn approx(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-12
    }

    #[test]
    fn last_line_wins() {
        assert_eq!(extract_last_numeric_line("1.0\n2.0\n3.5".lines()).unwrap(), 3.5);
        assert_eq!(extract_last_numeric_line(["7"]).unwrap(), 7.0);
    }

    #[test]
    fn blank_lines_and_padding_are_ignored() {
        let lines = ["  1.5 ", "", "2.5\r", "   "];
        assert_eq!(extract_last_numeric_line(lines).unwrap(), 2.5);
    }

    #[test]
    fn unparsable_line_fails_even_before_a_valid_one() {
        let err = extract_last_numeric_line("1.0\nabc\n2.0".lines()).unwrap_err();
        match err {
            CompareError::Parse { line, content } => {
                assert_eq!(line, 2);
                assert_eq!(content, "abc");
            }
            other => panic!("expected Parse, got {other:?}"),
        }
    }

    #[test]
    fn no_lines_is_no_value() {
        let empty: [&str; 0] = [];
        assert!(matches!(
            extract_last_numeric_line(empty),
            Err(CompareError::NoValue)
        ));
        assert!(matches!(
            extract_last_numeric_line(["", " "]),
            Err(CompareError::NoValue)
        ));
    }

    #[test]
    fn relative_difference_examples() {
        assert_eq!(relative_difference(2.0, 1.0, ZeroPolicy::Strict).unwrap(), 1.0);
        assert_eq!(relative_difference(1.0, 2.0, ZeroPolicy::Strict).unwrap(), 0.5);
        assert_eq!(
            relative_difference(0.0, REFERENCE_FLOOR, ZeroPolicy::Strict).unwrap(),
            1.0
        );
    }

    #[test]
    fn score_is_never_negative() {
        for (s, r) in [(1.0, 3.0), (3.0, 1.0), (-2.0, 4.0), (5.0, -1.0), (-1.0, -2.0)] {
            let score = relative_difference(s, r, ZeroPolicy::Strict).unwrap();
            assert!(score >= 0.0, "negative score for ({s}, {r}): {score}");
            assert!(approx(score, (s - r).abs() / r.abs()));
        }
    }

    #[test]
    fn explicit_zero_reference_is_rejected_by_default() {
        assert!(matches!(
            relative_difference(1.0, 0.0, ZeroPolicy::Strict),
            Err(CompareError::ZeroReference)
        ));
        assert!(matches!(
            relative_difference(1.0, -0.0, ZeroPolicy::Strict),
            Err(CompareError::ZeroReference)
        ));
    }

    #[test]
    fn floor_policy_replaces_non_positive_reference() {
        let score = relative_difference(0.0, 0.0, ZeroPolicy::Floor).unwrap();
        assert!(approx(score, 1.0));

        let score = relative_difference(REFERENCE_FLOOR, -3.0, ZeroPolicy::Floor).unwrap();
        assert_eq!(score, 0.0);

        let score = relative_difference(2.0, 4.0, ZeroPolicy::Floor).unwrap();
        assert_eq!(score, 0.5);
    }

    #[test]
    fn comparator_reads_both_outputs() {
        let subject = result_dir("0.5\n1.000010\n");
        let reference = result_dir("1.000000\n");

        let cmp = Comparator::new()
            .with_verbose(true)
            .compare(subject.path(), reference.path())
            .unwrap();

        assert_eq!(cmp.subject, 1.00001);
        assert_eq!(cmp.reference, 1.0);
        assert!((cmp.score - 0.00001).abs() < 1e-9);
        assert_eq!(cmp.subject_source, subject.path().join(OUTPUT_FILE));
    }

    #[test]
    fn empty_reference_uses_floor() {
        let subject = result_dir("0.0\n");
        let reference = result_dir("");

        let cmp = Comparator::new()
            .compare(subject.path(), reference.path())
            .unwrap();
        assert_eq!(cmp.reference, REFERENCE_FLOOR);
        assert_eq!(cmp.score, 1.0);
    }

    #[test]
    fn verbose_scoring_matches_plain_scoring() {
        let subject = result_dir("3.0\n");
        let reference = result_dir("2.0\n");
        let cmp = Comparator::new();

        let plain = cmp.score(subject.path(), reference.path()).unwrap();
        let verbose = cmp
            .score_verbose(subject.path(), reference.path(), true)
            .unwrap();

        assert_eq!(plain, 0.5);
        assert_eq!(verbose, plain);
        assert!(!cmp.verbose);
    }

    #[test]
    fn empty_subject_defaults_to_zero() {
        let subject = result_dir("");
        let reference = result_dir("2.0");

        let cmp = Comparator::new()
            .compare(subject.path(), reference.path())
            .unwrap();
        assert_eq!(cmp.subject, SUBJECT_DEFAULT);
        assert_eq!(cmp.score, 1.0);
    }

    #[test]
    fn literal_zero_reference_file_fails() {
        let subject = result_dir("1.0");
        let reference = result_dir("0\n");

        let err = Comparator::new()
            .compare(subject.path(), reference.path())
            .unwrap_err();
        assert!(matches!(err, CompareError::ZeroReference));
    }

    #[test]
    fn missing_output_is_an_io_error() {
        let subject = result_dir("1.0");
        let reference = tempfile::tempdir().unwrap();

        let err = Comparator::new()
            .compare(subject.path(), reference.path())
            .unwrap_err();
        match err {
            CompareError::Io { path, source } => {
                assert_eq!(path, reference.path().join(OUTPUT_FILE));
                assert_eq!(source.kind(), std::io::ErrorKind::NotFound);
            }
            other => panic!("expected Io, got {other:?}"),
        }
    }

    #[test]
    fn closures_implement_compare_fn() {
        let fixed = |_: &Path, _: &Path| -> Result<f64, CompareError> { Ok(0.25) };
        assert_eq!(fixed.score(Path::new("a"), Path::new("b")).unwrap(), 0.25);
    }

    #[test]
    fn zero_policy_serde_names() {
        let p: ZeroPolicy = serde_json::from_str(r#""floor""#).unwrap();
        assert_eq!(p, ZeroPolicy::Floor);
        assert_eq!(serde_json::to_string(&ZeroPolicy::Strict).unwrap(), r#""strict""#);
    }
}
