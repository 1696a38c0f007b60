use crate::{CheckError, Report, Runner, RunnerResult};

/// Runs the given check with the default error handling: every error is reported with its own
/// state, which is UNKNOWN for all of them.
pub fn safe_run<F>(check: F) -> RunnerResult
where
    F: FnOnce() -> Result<Report, CheckError>,
{
    Runner::new().safe_run(check)
}
