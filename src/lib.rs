//! The service_checks crate bundles a small set of Nagios/Sensu compatible check plugins
//! (RabbitMQ overview and per-queue rates, RabbitMQ AMQP liveness, Kibana health) together with
//! the pieces they share: threshold evaluation, metric extraction, metric line reporting and the
//! runner which turns a check run into exactly one status line and exit code.

use std::cmp::Ordering;
use std::fmt;

#[macro_use]
mod macros;

pub mod checks;
pub mod cli;
pub mod config_generator;
pub mod error;
pub mod filter;
pub mod http;
pub mod metrics;
pub mod report;
pub mod threshold;

mod helper;
mod runner;

pub use crate::error::CheckError;
pub use crate::helper::safe_run;
pub use crate::metrics::MetricRecord;
pub use crate::report::{MetricLine, Report};
pub use crate::runner::{Runner, RunnerResult};
pub use crate::threshold::{evaluate, Bound, ThresholdSet, Violation};

/// Represents a service state as understood by nagios compatible agents.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ServiceState {
    Ok,
    Warning,
    Critical,
    Unknown,
}

impl ServiceState {
    /// Returns the corresponding exit code to signal the service state of self.
    pub fn exit_code(&self) -> i32 {
        match self {
            ServiceState::Ok => 0,
            ServiceState::Warning => 1,
            ServiceState::Critical => 2,
            ServiceState::Unknown => 3,
        }
    }

    fn urgency(&self) -> u8 {
        match self {
            ServiceState::Unknown => 0,
            ServiceState::Ok => 1,
            ServiceState::Warning => 2,
            ServiceState::Critical => 3,
        }
    }
}

impl fmt::Display for ServiceState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ServiceState::Ok => "OK",
            ServiceState::Warning => "WARNING",
            ServiceState::Critical => "CRITICAL",
            ServiceState::Unknown => "UNKNOWN",
        };
        f.write_str(s)
    }
}

impl PartialOrd for ServiceState {
    fn partial_cmp(&self, other: &ServiceState) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for ServiceState {
    fn cmp(&self, other: &ServiceState) -> Ordering {
        self.urgency().cmp(&other.urgency())
    }
}

/// The single outcome of a check invocation.
///
/// ```rust
/// # use service_checks::{CheckResult, ServiceState};
/// let result = CheckResult::new(ServiceState::Warning, "metric messages = 15");
/// assert_eq!(result.to_string(), "WARNING: metric messages = 15");
/// assert_eq!(result.exit_code(), 1);
/// ```
#[derive(Clone, Debug, PartialEq)]
pub struct CheckResult {
    state: ServiceState,
    message: String,
}

impl CheckResult {
    pub fn new(state: ServiceState, message: impl Into<String>) -> Self {
        CheckResult {
            state,
            message: message.into(),
        }
    }

    pub fn ok(message: impl Into<String>) -> Self {
        Self::new(ServiceState::Ok, message)
    }

    pub fn state(&self) -> ServiceState {
        self.state
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    /// Will return the exit code of the state of this result.
    pub fn exit_code(&self) -> i32 {
        self.state.exit_code()
    }

    /// Joins several OK results into one, the messages separated by `separator`.
    ///
    /// Empty messages are skipped.
    pub fn join_ok<'a, I>(results: I, separator: &str) -> CheckResult
    where
        I: IntoIterator<Item = &'a CheckResult>,
    {
        let message = results
            .into_iter()
            .map(CheckResult::message)
            .filter(|m| !m.is_empty())
            .collect::<Vec<_>>()
            .join(separator);
        CheckResult::ok(message)
    }
}

impl fmt::Display for CheckResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.state, self.message)
    }
}

/// Sets up `env_logger` on stderr. Stdout belongs to the monitoring agent.
///
/// The default level is `warn`, `RUST_LOG` overrides it.
pub fn init_logging() {
    let env = env_logger::Env::default().default_filter_or("warn");
    let _ = env_logger::Builder::from_env(env)
        .target(env_logger::Target::Stderr)
        .try_init();
}

#[cfg(test)]
mod tests {
    use crate::{CheckResult, ServiceState};

    #[test]
    fn test_state() {
        assert_eq!(ServiceState::Ok.exit_code(), 0);
        assert_eq!(ServiceState::Warning.exit_code(), 1);
        assert_eq!(ServiceState::Critical.exit_code(), 2);
        assert_eq!(ServiceState::Unknown.exit_code(), 3);

        assert_eq!(&ServiceState::Ok.to_string(), "OK");
        assert_eq!(&ServiceState::Warning.to_string(), "WARNING");
        assert_eq!(&ServiceState::Critical.to_string(), "CRITICAL");
        assert_eq!(&ServiceState::Unknown.to_string(), "UNKNOWN");
    }

    #[test]
    fn test_state_ordering() {
        assert!(ServiceState::Critical > ServiceState::Warning);
        assert!(ServiceState::Warning > ServiceState::Ok);
        assert!(ServiceState::Ok > ServiceState::Unknown);
        assert_eq!(
            [ServiceState::Ok, ServiceState::Critical, ServiceState::Warning]
                .iter()
                .max(),
            Some(&ServiceState::Critical)
        );
    }

    #[test]
    fn test_check_result() {
        let result = CheckResult::new(ServiceState::Critical, "queue is full");
        assert_eq!(result.state(), ServiceState::Critical);
        assert_eq!(result.message(), "queue is full");
        assert_eq!(result.exit_code(), 2);
        assert_eq!(&result.to_string(), "CRITICAL: queue is full");
    }

    #[test]
    fn test_join_ok() {
        let server = CheckResult::ok("server is green");
        let empty = CheckResult::ok("");
        let modules = CheckResult::ok("modules are green");

        let joined = CheckResult::join_ok([&server, &empty, &modules], ";");
        assert_eq!(joined.state(), ServiceState::Ok);
        assert_eq!(joined.message(), "server is green;modules are green");
    }
}
