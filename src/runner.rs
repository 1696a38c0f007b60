use std::panic::{self, AssertUnwindSafe};

use log::error;

use crate::{CheckError, Report, ServiceState};

const PANIC_MESSAGE: &str = "unexpected error occurred";

pub struct Runner {
    on_error: Option<Box<dyn FnOnce(&CheckError) -> ServiceState>>,
}

impl Runner {
    pub fn new() -> Self {
        Self { on_error: None }
    }

    /// Overrides the state reported for an error, which defaults to [CheckError::state].
    pub fn on_error(mut self, f: impl FnOnce(&CheckError) -> ServiceState + 'static) -> Self {
        self.on_error = Some(Box::new(f));
        self
    }

    /// Runs the check and turns whatever it ends with, including a panic, into a
    /// [RunnerResult]. The panic itself is reported on stderr by the panic hook.
    pub fn safe_run(self, f: impl FnOnce() -> Result<Report, CheckError>) -> RunnerResult {
        match panic::catch_unwind(AssertUnwindSafe(f)) {
            Ok(Ok(report)) => RunnerResult::Ok(report),
            Ok(Err(err)) => {
                error!("check failed: {:?}", err);
                let state = self
                    .on_error
                    .map(|f| f(&err))
                    .unwrap_or_else(|| err.state());

                RunnerResult::Err(state, err)
            }
            Err(_) => RunnerResult::Panicked,
        }
    }
}

impl Default for Runner {
    fn default() -> Self {
        Self::new()
    }
}

pub enum RunnerResult {
    Ok(Report),
    Err(ServiceState, CheckError),
    Panicked,
}

impl RunnerResult {
    pub fn state(&self) -> ServiceState {
        match self {
            RunnerResult::Ok(report) => report.state(),
            RunnerResult::Err(state, _) => *state,
            RunnerResult::Panicked => ServiceState::Unknown,
        }
    }

    pub fn exit_code(&self) -> i32 {
        self.state().exit_code()
    }

    /// The lines to print on stdout. The last one is always the status line.
    pub fn lines(&self) -> Vec<String> {
        match self {
            RunnerResult::Ok(report) => report.lines(),
            RunnerResult::Err(state, err) => vec![format!("{}: {}", state, err)],
            RunnerResult::Panicked => vec![format!("{}: {}", ServiceState::Unknown, PANIC_MESSAGE)],
        }
    }

    pub fn print_and_exit(self) -> ! {
        for line in self.lines() {
            println!("{}", line);
        }
        std::process::exit(self.exit_code());
    }
}
