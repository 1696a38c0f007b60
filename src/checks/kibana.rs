//! `check-kibana`: overall and per-module health from the Kibana status API.

use clap::Parser;
use log::debug;
use serde::Deserialize;

use crate::cli::{self, parse_host};
use crate::http::JsonSource;
use crate::{CheckError, CheckResult, Report, ServiceState};

pub const NAME: &str = "check-kibana";

const API_PATH: &str = "api/status";

/// Check Kibana server and module health
#[derive(Parser, Debug)]
#[command(name = NAME, version)]
pub struct Args {
    /// Kibana host
    #[arg(long, default_value = "localhost", value_parser = parse_host)]
    pub host: String,
    /// Kibana port
    #[arg(long, default_value_t = 5601)]
    pub port: u16,
    /// No checking kibana health status
    #[arg(long, conflicts_with = "no_modules")]
    pub no_server: bool,
    /// No checking kibana modules health status
    #[arg(long)]
    pub no_modules: bool,
}

pub struct Config {
    pub host: String,
    pub port: u16,
    pub check_server: bool,
    pub check_modules: bool,
}

impl Config {
    pub fn load() -> Result<Self, CheckError> {
        let (args, _) = cli::load::<Args>(NAME, &[])?;
        Ok(Self::new(args))
    }

    pub fn new(args: Args) -> Self {
        Config {
            host: args.host,
            port: args.port,
            check_server: !args.no_server,
            check_modules: !args.no_modules,
        }
    }
}

/// The traffic light Kibana reports for itself and each of its plugins.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Health {
    Green,
    Yellow,
    Red,
    Other(String),
}

impl Health {
    pub fn parse(state: &str) -> Self {
        match state {
            "green" => Health::Green,
            "yellow" => Health::Yellow,
            "red" => Health::Red,
            other => Health::Other(other.to_owned()),
        }
    }

    pub fn service_state(&self) -> ServiceState {
        match self {
            Health::Green => ServiceState::Ok,
            Health::Yellow => ServiceState::Warning,
            Health::Red => ServiceState::Critical,
            Health::Other(_) => ServiceState::Unknown,
        }
    }
}

#[derive(Deserialize)]
struct StatusResponse {
    status: Status,
}

#[derive(Deserialize)]
struct Status {
    overall: Option<OverallStatus>,
    statuses: Option<Vec<ModuleStatus>>,
}

#[derive(Deserialize)]
struct OverallStatus {
    state: String,
    #[serde(default)]
    title: String,
    #[serde(default)]
    nickname: String,
}

#[derive(Deserialize)]
struct ModuleStatus {
    name: String,
    state: String,
    #[serde(default)]
    message: String,
}

fn check_server(overall: &OverallStatus) -> CheckResult {
    let health = Health::parse(&overall.state);
    CheckResult::new(
        health.service_state(),
        format!(
            "Kibana health status state={}, title={}, msg={}",
            overall.state, overall.title, overall.nickname
        ),
    )
}

fn check_modules(modules: &[ModuleStatus]) -> CheckResult {
    for module in modules {
        let health = Health::parse(&module.state);
        if health != Health::Green {
            return CheckResult::new(
                health.service_state(),
                format!(
                    "Kibana module \"{}\" health status state={}, msg={}",
                    module.name, module.state, module.message
                ),
            );
        }
    }
    CheckResult::ok("Kibana modules health status state is green")
}

pub fn run(config: &Config, source: &impl JsonSource) -> Result<Report, CheckError> {
    let response: StatusResponse = serde_json::from_value(source.get_json(API_PATH)?)?;
    let status = response.status;

    let mut passed = Vec::new();
    if config.check_server {
        let overall = status
            .overall
            .as_ref()
            .ok_or_else(|| CheckError::MissingMetric("status.overall".to_owned()))?;
        let result = check_server(overall);
        debug!("server: {}", result);
        if result.state() != ServiceState::Ok {
            return Ok(result.into());
        }
        passed.push(result);
    }

    if config.check_modules {
        let modules = status
            .statuses
            .as_deref()
            .ok_or_else(|| CheckError::MissingMetric("status.statuses".to_owned()))?;
        let result = check_modules(modules);
        debug!("modules: {}", result);
        if result.state() != ServiceState::Ok {
            return Ok(result.into());
        }
        passed.push(result);
    }

    Ok(CheckResult::join_ok(&passed, ";").into())
}
