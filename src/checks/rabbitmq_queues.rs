//! `check-rabbitmq-per-queue-rate`: message counts, consumers and drain times of every queue.
//!
//! Thresholds are applied to each queue on its own, in the order the management API lists
//! them, and the first queue crossing a bound decides the outcome. When every queue passes the
//! result reports the average of each checked metric over all (filtered) queues.

use clap::Parser;
use log::debug;
use regex::Regex;
use serde::Deserialize;
use serde_json::Value;

use crate::cli::{self, parse_host, parse_pattern, AuthArgs, ThresholdTable};
use crate::filter::{Entity, EntityFilter};
use crate::http::{Credentials, JsonSource};
use crate::metrics::{number_at, MetricDef};
use crate::report::{default_scheme, unix_timestamp};
use crate::{CheckError, CheckResult, MetricLine, MetricRecord, Report};

pub const NAME: &str = "check-rabbitmq-per-queue-rate";

const API_PATH: &str = "api/queues";

pub const MESSAGES: &str = "messages";
pub const CONSUMERS: &str = "consumers";
pub const AVG_EGRESS_RATE: &str = "avg_egress_rate";
pub const DRAIN_TIME: &str = "drain_time";

/// The per-queue metrics in evaluation order.
pub const METRICS: &[MetricDef] = &[
    MetricDef::new(MESSAGES, "messages", "message count"),
    MetricDef::new(CONSUMERS, "consumers", "consumer count"),
    MetricDef::new(AVG_EGRESS_RATE, "avg-egress-rate", "average egress rate"),
    MetricDef::new(
        DRAIN_TIME,
        "drain-time",
        "drain time, which is the time a queue will take to reach 0 based on the egress rate",
    ),
];

/// Check RabbitMQ queues one by one
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
    /// Metric naming scheme, text to prepend to $queue_name.$metric (default: $hostname.rabbitmq)
    #[arg(long)]
    pub scheme: Option<String>,
    /// Regular expression for filtering the RabbitMQ vhost
    #[arg(long, value_parser = parse_pattern)]
    pub vhost_pattern: Option<Regex>,
    /// Regular expression for filtering queues
    #[arg(long, value_parser = parse_pattern)]
    pub queue_pattern: Option<Regex>,
}

pub struct Config {
    pub host: String,
    pub port: u16,
    pub credentials: Credentials,
    pub scheme: String,
    pub filter: EntityFilter,
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
            filter: EntityFilter::new(args.vhost_pattern, args.queue_pattern),
            thresholds,
        }
    }
}

/// One entry of `api/queues`. The numeric fields stay raw JSON so a bad value can be reported
/// against the metric it feeds.
#[derive(Deserialize)]
struct QueueInfo {
    vhost: String,
    name: String,
    #[serde(default)]
    messages: Value,
    #[serde(default)]
    consumers: Value,
    #[serde(default)]
    backing_queue_status: Value,
}

/// The metrics of one queue.
#[derive(Clone, Debug, PartialEq)]
pub struct QueueMetrics {
    pub vhost: String,
    pub queue_name: String,
    pub metrics: MetricRecord,
}

impl QueueMetrics {
    fn context(&self) -> String {
        format!("(vhost: {} queue: {})", self.vhost, self.queue_name)
    }
}

impl Entity for QueueMetrics {
    fn vhost(&self) -> &str {
        &self.vhost
    }

    fn name(&self) -> &str {
        &self.queue_name
    }
}

/// Seconds until a queue is empty at its current egress rate, truncated. A queue which is not
/// draining at all reports 0.
pub fn drain_time(messages: f64, avg_egress_rate: f64) -> f64 {
    if avg_egress_rate == 0.0 {
        return 0.0;
    }
    (messages / avg_egress_rate).trunc()
}

impl TryFrom<QueueInfo> for QueueMetrics {
    type Error = CheckError;

    fn try_from(queue: QueueInfo) -> Result<Self, Self::Error> {
        let context = format!("(vhost: {} queue: {})", queue.vhost, queue.name);
        let missing = |metric: &str| CheckError::MissingMetric(format!("{} {}", metric, context));

        // absent or null counts as an empty queue
        let messages = match &queue.messages {
            Value::Null => 0.0,
            value => number_at(value, "").ok_or_else(|| missing(MESSAGES))?,
        };
        let consumers = number_at(&queue.consumers, "").ok_or_else(|| missing(CONSUMERS))?;
        let rate = number_at(&queue.backing_queue_status, "/avg_egress_rate")
            .ok_or_else(|| missing(AVG_EGRESS_RATE))?;

        let metrics = MetricRecord::new()
            .with(DRAIN_TIME, Some(drain_time(messages, rate)))
            .with(MESSAGES, Some(messages))
            .with(CONSUMERS, Some(consumers))
            .with(AVG_EGRESS_RATE, Some(rate));

        Ok(QueueMetrics {
            vhost: queue.vhost,
            queue_name: queue.name,
            metrics,
        })
    }
}

/// One record per queue, in response order.
pub fn extract(document: Value) -> Result<Vec<QueueMetrics>, CheckError> {
    let queues: Vec<QueueInfo> = serde_json::from_value(document)?;
    queues.into_iter().map(QueueMetrics::try_from).collect()
}

pub fn run(config: &Config, source: &impl JsonSource) -> Result<Report, CheckError> {
    let document = source.get_json(API_PATH)?;
    let queues = extract(document)?;
    let queues = config.filter.apply(queues)?;
    debug!("checking {} queues", queues.len());

    let mut passed = Vec::new();
    for (def, thresholds) in config.thresholds.configured() {
        let mut values = Vec::with_capacity(queues.len());
        for queue in &queues {
            let value = queue
                .metrics
                .get(def.name)
                .ok_or_else(|| CheckError::MissingMetric(def.name.to_owned()))?;

            if let Some(violation) = thresholds.check(value) {
                let result = violation.to_result(def.name, Some(&queue.context()));
                return Ok(Report::new(result));
            }
            values.push(value);
        }

        let average = values.iter().sum::<f64>() / values.len() as f64;
        passed.push(CheckResult::ok(format!(
            "metric {} = {} (average value of all queues/vhosts)",
            def.name, average
        )));
    }

    let result = if passed.is_empty() {
        CheckResult::ok(format!(
            "{} queues collected, no thresholds configured",
            queues.len()
        ))
    } else {
        CheckResult::join_ok(&passed, "; ")
    };

    let timestamp = unix_timestamp();
    let lines = queues
        .iter()
        .flat_map(|q| {
            MetricLine::from_record(&config.scheme, Some(&q.queue_name), &q.metrics, timestamp)
        })
        .collect();
    Ok(Report::new(result).with_metric_lines(lines))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::checks::testing::StubSource;
    use crate::filter::compile_pattern;
    use crate::ServiceState;
    use serde_json::json;

    fn config(thresholds: ThresholdTable) -> Config {
        Config {
            host: "localhost".to_owned(),
            port: 15672,
            credentials: Credentials {
                user: "guest".to_owned(),
                password: "guest".to_owned(),
            },
            scheme: "host.rabbitmq".to_owned(),
            filter: EntityFilter::default(),
            thresholds,
        }
    }

    fn queue(vhost: &str, name: &str, messages: Value, consumers: u32, rate: f64) -> Value {
        json!({
            "vhost": vhost,
            "name": name,
            "messages": messages,
            "consumers": consumers,
            "backing_queue_status": { "avg_egress_rate": rate },
        })
    }

    fn queues() -> Value {
        json!([
            queue("/", "jobs", json!(5), 2, 0.5),
            queue("/", "reports", json!(15), 1, 2.0),
        ])
    }

    #[test]
    fn test_drain_time() {
        assert_eq!(drain_time(15.0, 2.0), 7.0);
        assert_eq!(drain_time(5.0, 0.5), 10.0);
        assert_eq!(drain_time(100.0, 0.0), 0.0);
        assert_eq!(drain_time(0.0, 0.0), 0.0);
    }

    #[test]
    fn test_extract() {
        let doc = json!([
            queue("/", "jobs", json!(5), 2, 0.5),
            queue("billing", "idle", Value::Null, 0, 0.0),
            {
                "vhost": "/",
                "name": "fresh",
                "consumers": 1,
                "backing_queue_status": { "avg_egress_rate": 0.0 },
            },
        ]);

        let queues = extract(doc).unwrap();
        assert_eq!(queues.len(), 3);

        assert_eq!(queues[0].queue_name, "jobs");
        assert_eq!(queues[0].metrics.get(DRAIN_TIME), Some(10.0));
        assert_eq!(queues[0].metrics.get(CONSUMERS), Some(2.0));

        assert_eq!(queues[1].vhost, "billing");
        assert_eq!(queues[1].metrics.get(MESSAGES), Some(0.0));
        assert_eq!(queues[1].metrics.get(DRAIN_TIME), Some(0.0));

        assert_eq!(queues[2].metrics.get(MESSAGES), Some(0.0));

        let names: Vec<_> = queues[0].metrics.iter().map(|(n, _)| n).collect();
        assert_eq!(names, vec![DRAIN_TIME, MESSAGES, CONSUMERS, AVG_EGRESS_RATE]);
    }

    #[test]
    fn test_extract_malformed() {
        let err = extract(json!([{ "name": "jobs", "consumers": 1 }])).unwrap_err();
        assert!(matches!(err, CheckError::Malformed(_)));

        let err = extract(json!({ "error": "Object Not Found" })).unwrap_err();
        assert_eq!(err.state(), ServiceState::Unknown);
    }

    #[test]
    fn test_extract_non_numeric_names_metric() {
        let mut bad = queue("/", "jobs", json!(5), 2, 0.5);
        bad["consumers"] = json!("two");
        let err = extract(json!([bad])).unwrap_err();
        assert_eq!(err.state(), ServiceState::Unknown);
        assert_eq!(
            err.to_string(),
            "no value for metric consumers (vhost: / queue: jobs)"
        );

        let mut bad = queue("billing", "invoices", json!(5), 2, 0.5);
        bad["backing_queue_status"]["avg_egress_rate"] = Value::Null;
        let err = extract(json!([bad])).unwrap_err();
        assert_eq!(
            err.to_string(),
            "no value for metric avg_egress_rate (vhost: billing queue: invoices)"
        );

        let err = extract(json!([{ "vhost": "/", "name": "jobs", "consumers": 1 }])).unwrap_err();
        assert!(matches!(err, CheckError::MissingMetric(_)));

        let err = extract(json!([queue("/", "jobs", json!("many"), 2, 0.5)])).unwrap_err();
        assert!(err.to_string().starts_with("no value for metric messages"));
    }

    #[test]
    fn test_first_queue_over_threshold() {
        let thresholds = ThresholdTable::new(METRICS).with(MESSAGES, thresholds![max_warning = 10]);

        let report = run(&config(thresholds), &StubSource::new(queues())).unwrap();
        assert_eq!(report.state(), ServiceState::Warning);
        assert_eq!(
            report.lines(),
            vec![
                "WARNING: metric messages = 15 is higher or equal than 10 (vhost: / queue: reports)"
            ]
        );
    }

    #[test]
    fn test_order_of_metrics() {
        // consumers is evaluated before drain_time even though both are violated
        let thresholds = ThresholdTable::new(METRICS)
            .with(DRAIN_TIME, thresholds![max_critical = 5])
            .with(CONSUMERS, thresholds![min_warning = 1]);

        let report = run(&config(thresholds), &StubSource::new(queues())).unwrap();
        assert_eq!(report.state(), ServiceState::Warning);
        assert!(report
            .result()
            .message()
            .starts_with("metric consumers = 1 is lower or equal than 1"));
    }

    #[test]
    fn test_average_on_success() {
        let thresholds = ThresholdTable::new(METRICS)
            .with(MESSAGES, thresholds![max_critical = 100])
            .with(DRAIN_TIME, thresholds![max_warning = 60]);

        let report = run(&config(thresholds), &StubSource::new(queues())).unwrap();
        assert_eq!(report.state(), ServiceState::Ok);
        assert_eq!(
            report.result().message(),
            "metric messages = 10 (average value of all queues/vhosts); \
             metric drain_time = 8.5 (average value of all queues/vhosts)"
        );

        let lines = report.lines();
        assert_eq!(lines.len(), 9);
        assert!(lines[0].starts_with("host.rabbitmq.jobs.drain_time 10 "));
        assert!(lines[5].starts_with("host.rabbitmq.reports.messages 15 "));
    }

    #[test]
    fn test_filter() {
        let thresholds = ThresholdTable::new(METRICS).with(MESSAGES, thresholds![max_warning = 10]);
        let mut config = config(thresholds);
        config.filter = EntityFilter::new(None, Some(compile_pattern("JOB").unwrap()));

        let report = run(&config, &StubSource::new(queues())).unwrap();
        assert_eq!(report.state(), ServiceState::Ok);
        assert_eq!(
            report.result().message(),
            "metric messages = 5 (average value of all queues/vhosts)"
        );
        assert_eq!(report.metric_lines().len(), 4);
    }

    #[test]
    fn test_empty_filter_result() {
        let mut config = config(ThresholdTable::new(METRICS));
        config.filter = EntityFilter::new(Some(compile_pattern("billing").unwrap()), None);

        let err = run(&config, &StubSource::new(queues())).unwrap_err();
        assert!(matches!(err, CheckError::NoEntities));
    }

    #[test]
    fn test_no_queues() {
        let config = config(ThresholdTable::new(METRICS));
        let err = run(&config, &StubSource::new(json!([]))).unwrap_err();
        assert!(matches!(err, CheckError::NoEntities));
    }

    #[test]
    fn test_args() {
        let (args, thresholds) = cli::parse_from::<Args, _, _>(
            METRICS,
            [
                "check-rabbitmq-per-queue-rate",
                "--host",
                "mq.local/",
                "--queue-pattern",
                "jobs",
                "--drain-time-max-w",
                "60",
            ],
        )
        .unwrap();
        let config = Config::new(args, thresholds);

        assert_eq!(config.host, "mq.local");
        assert_eq!(config.thresholds.get(DRAIN_TIME), thresholds![max_warning = 60]);
        assert_eq!(config.thresholds.get(MESSAGES), crate::ThresholdSet::default());
    }
}
