//! `check-rabbitmq-rate`: message totals and rates from the RabbitMQ management overview.

use clap::Parser;
use log::debug;
use serde_json::Value;

use crate::cli::{self, parse_host, AuthArgs, ThresholdTable};
use crate::http::{Credentials, JsonSource};
use crate::metrics::{number_at, MetricDef};
use crate::report::{default_scheme, unix_timestamp};
use crate::{evaluate, CheckError, CheckResult, MetricLine, MetricRecord, Report, ServiceState};

pub const NAME: &str = "check-rabbitmq-rate";

const API_PATH: &str = "api/overview";

/// The overview metrics in evaluation order. Their location in the response follows from the
/// name, see [pointer].
pub const METRICS: &[MetricDef] = &[
    MetricDef::new(
        "queue_totals.messages.count",
        "queue-msg-count",
        "queue_totals.messages.count",
    ),
    MetricDef::new(
        "queue_totals.messages.rate",
        "queue-msg-rate",
        "queue_totals.messages.rate",
    ),
    MetricDef::new(
        "queue_totals.messages_unacknowledged.count",
        "queue-msg-unack-count",
        "queue_totals.messages_unacknowledged.count",
    ),
    MetricDef::new(
        "queue_totals.messages_unacknowledged.rate",
        "queue-msg-unack-rate",
        "queue_totals.messages_unacknowledged.rate",
    ),
    MetricDef::new(
        "queue_totals.messages_ready.count",
        "queue-msg-ready-count",
        "queue_totals.messages_ready.count",
    ),
    MetricDef::new(
        "queue_totals.messages_ready.rate",
        "queue-msg-ready-rate",
        "queue_totals.messages_ready.rate",
    ),
    MetricDef::new(
        "message_stats.publish.count",
        "msg-publish-count",
        "message_stats.publish.count",
    ),
    MetricDef::new(
        "message_stats.publish.rate",
        "msg-publish-rate",
        "message_stats.publish.rate",
    ),
    MetricDef::new(
        "message_stats.deliver_no_ack.count",
        "msg-deliver-noack-count",
        "message_stats.deliver_no_ack.count",
    ),
    MetricDef::new(
        "message_stats.deliver_no_ack.rate",
        "msg-deliver-noack-rate",
        "message_stats.deliver_no_ack.rate",
    ),
    MetricDef::new(
        "message_stats.deliver_get.count",
        "msg-deliver-get-count",
        "message_stats.deliver_get.count",
    ),
    MetricDef::new(
        "message_stats.deliver_get.rate",
        "msg-deliver-get-rate",
        "message_stats.deliver_get.rate",
    ),
];

/// Check RabbitMQ message totals and rates
#[derive(Parser, Debug)]
#[command(name = NAME, version)]
pub struct Args {
    /// RabbitMQ management host
    #[arg(long, default_value = "localhost", value_parser = parse_host)]
    pub host: String,
    /// RabbitMQ management port
    #[arg(long, default_value_t = 15672)]
    pub port: u16,
    #[command(flatten)]
    pub auth: AuthArgs,
    /// Metric naming scheme, text to prepend to $metric (default: $hostname.rabbitmq)
    #[arg(long)]
    pub scheme: Option<String>,
}

pub struct Config {
    pub host: String,
    pub port: u16,
    pub credentials: Credentials,
    pub scheme: String,
    pub thresholds: ThresholdTable,
}

impl Config {
    pub fn load() -> Result<Self, CheckError> {
        let (args, thresholds) = cli::load::<Args>(NAME, METRICS)?;
        Ok(Self::new(args, thresholds))
    }

    pub fn new(args: Args, thresholds: ThresholdTable) -> Self {
        Config {
            host: args.host,
            port: args.port,
            credentials: args.auth.credentials(),
            scheme: args.scheme.unwrap_or_else(|| default_scheme("rabbitmq")),
            thresholds,
        }
    }
}

/// JSON pointer of an overview metric: `<group>.<field>.count` lives at `/<group>/<field>`,
/// `<group>.<field>.rate` at `/<group>/<field>_details/rate`.
pub fn pointer(metric: &str) -> Option<String> {
    let mut parts = metric.split('.');
    match (parts.next(), parts.next(), parts.next(), parts.next()) {
        (Some(group), Some(field), Some("count"), None) => Some(format!("/{}/{}", group, field)),
        (Some(group), Some(field), Some("rate"), None) => {
            Some(format!("/{}/{}_details/rate", group, field))
        }
        _ => None,
    }
}

/// Reads every overview metric. Whatever the response lacks stays unset.
pub fn extract(document: &Value) -> MetricRecord {
    let mut record = MetricRecord::new();
    for def in METRICS {
        let value = pointer(def.name).and_then(|p| number_at(document, &p));
        record.insert(def.name, value);
    }
    record
}

pub fn run(config: &Config, source: &impl JsonSource) -> Result<Report, CheckError> {
    let document = source.get_json(API_PATH)?;
    let metrics = extract(&document);
    debug!("overview metrics: {:?}", metrics);

    let mut passed = Vec::new();
    for (def, thresholds) in config.thresholds.configured() {
        let value = metrics
            .get(def.name)
            .ok_or_else(|| CheckError::MissingMetric(def.name.to_owned()))?;

        if let Some(result) = evaluate(def.name, value, thresholds, None) {
            if result.state() != ServiceState::Ok {
                return Ok(Report::new(result));
            }
            passed.push(result);
        }
    }

    let result = if passed.is_empty() {
        CheckResult::ok("RabbitMQ overview collected, no thresholds configured")
    } else {
        CheckResult::join_ok(&passed, "; ")
    };
    let lines = MetricLine::from_record(&config.scheme, None, &metrics, unix_timestamp());
    Ok(Report::new(result).with_metric_lines(lines))
}
