use crate::config_generator::ToIcingaCommandError;
use crate::ServiceState;

/// Everything that can stop a check before it reaches a verdict.
///
/// Threshold violations are not errors: a check which finds one still succeeds and returns a
/// WARNING or CRITICAL [Report](crate::Report).
#[derive(Debug, thiserror::Error)]
pub enum CheckError {
    #[error("invalid command line arguments: {0}")]
    Usage(String),
    #[error("HTTP error occurred, msg={0}")]
    Transport(#[from] reqwest::Error),
    #[error("HTTP error occurred, status_code: {status}, url={url}")]
    HttpStatus {
        status: reqwest::StatusCode,
        url: String,
    },
    #[error("malformed response: {0}")]
    Malformed(#[from] serde_json::Error),
    #[error("no value for metric {0}")]
    MissingMetric(String),
    #[error("no metrics to check")]
    NoEntities,
    #[cfg(feature = "amqp")]
    #[error("AMQP connection error occurred, {0}")]
    Amqp(#[from] amiquip::Error),
    #[error("unable to open connection/channel (no error returned)")]
    ChannelClosed,
    #[error("error generating command definition: {0}")]
    CommandConfig(#[from] ToIcingaCommandError),
}

impl CheckError {
    /// The state reported for this error unless the runner overrides it.
    pub fn state(&self) -> ServiceState {
        ServiceState::Unknown
    }
}
