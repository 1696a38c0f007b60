//! What a finished check prints: optional metric lines for a time series collector and the
//! final status line.

use std::fmt;
use std::time::{SystemTime, UNIX_EPOCH};

use crate::{CheckResult, MetricRecord, ServiceState};

/// One `<path> <value> <timestamp>` line as understood by graphite style collectors.
#[derive(Clone, Debug, PartialEq)]
pub struct MetricLine {
    pub path: String,
    pub value: f64,
    pub timestamp: u64,
}

impl MetricLine {
    /// Builds one line per set metric of `record`, named `<scheme>[.<entity>].<metric>`.
    pub fn from_record(
        scheme: &str,
        entity: Option<&str>,
        record: &MetricRecord,
        timestamp: u64,
    ) -> Vec<MetricLine> {
        let prefix = match entity {
            Some(entity) => format!("{}.{}", scheme, entity),
            None => scheme.to_owned(),
        };
        record
            .iter()
            .map(|(name, value)| MetricLine {
                path: format!("{}.{}", prefix, name),
                value,
                timestamp,
            })
            .collect()
    }
}

impl fmt::Display for MetricLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} {}", self.path, self.value, self.timestamp)
    }
}

/// The outcome of a check run which reached a verdict.
#[derive(Clone, Debug, PartialEq)]
pub struct Report {
    result: CheckResult,
    metric_lines: Vec<MetricLine>,
}

impl Report {
    pub fn new(result: CheckResult) -> Self {
        Report {
            result,
            metric_lines: Vec::new(),
        }
    }

    /// Attaches metric lines. They are only printed for an OK result.
    pub fn with_metric_lines(mut self, lines: Vec<MetricLine>) -> Self {
        self.metric_lines = lines;
        self
    }

    pub fn result(&self) -> &CheckResult {
        &self.result
    }

    pub fn state(&self) -> ServiceState {
        self.result.state()
    }

    pub fn metric_lines(&self) -> &[MetricLine] {
        &self.metric_lines
    }

    /// All lines to print, metric lines first and the status line last.
    pub fn lines(&self) -> Vec<String> {
        let mut lines = Vec::with_capacity(self.metric_lines.len() + 1);
        if self.result.state() == ServiceState::Ok {
            lines.extend(self.metric_lines.iter().map(MetricLine::to_string));
        }
        lines.push(self.result.to_string());
        lines
    }
}

impl From<CheckResult> for Report {
    fn from(result: CheckResult) -> Self {
        Report::new(result)
    }
}

/// Seconds since the unix epoch, used to stamp metric lines.
pub fn unix_timestamp() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or_default()
}

/// The scheme used when none is given: `<hostname>.<service>`.
pub fn default_scheme(service: &str) -> String {
    let host = sysinfo::System::host_name().unwrap_or_else(|| "localhost".to_owned());
    format!("{}.{}", host, service)
}
