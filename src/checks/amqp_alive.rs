//! `check-rabbitmq-amqp-alive`: opens an AMQP connection and a channel.

use amiquip::Connection;
use clap::Parser;
use log::{debug, warn};
use reqwest::Url;

use crate::cli::{self, parse_host};
use crate::{CheckError, CheckResult, Report, ServiceState};

pub const NAME: &str = "check-rabbitmq-amqp-alive";

/// Check that RabbitMQ accepts AMQP connections
#[derive(Parser, Debug)]
#[command(name = NAME, version)]
pub struct Args {
    /// RabbitMQ host
    #[arg(long, default_value = "localhost", value_parser = parse_host)]
    pub host: String,
    /// RabbitMQ AMQP port
    #[arg(long, default_value_t = 5672)]
    pub port: u16,
    /// AMQP user
    #[arg(long, default_value = "guest")]
    pub user: String,
    /// AMQP password
    #[arg(long, default_value = "guest")]
    pub password: String,
    /// VHOST (use / instead of %2F)
    #[arg(long, default_value = "/")]
    pub vhost: String,
}

pub struct Config {
    pub host: String,
    pub port: u16,
    pub user: String,
    pub password: String,
    pub vhost: String,
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
            user: args.user,
            password: args.password,
            vhost: args.vhost,
        }
    }

    /// The `amqp://` URL to connect to. User, password and vhost are percent-encoded, so the
    /// default vhost `/` becomes `%2F`.
    pub fn url(&self) -> Result<Url, CheckError> {
        let invalid = |what: &str| CheckError::Usage(format!("invalid AMQP {}", what));

        let mut url = Url::parse(&format!("amqp://{}:{}", self.host, self.port))
            .map_err(|e| CheckError::Usage(format!("invalid AMQP address: {}", e)))?;
        url.set_username(&self.user).map_err(|_| invalid("user"))?;
        url.set_password(Some(&self.password))
            .map_err(|_| invalid("password"))?;
        url.path_segments_mut()
            .map_err(|_| invalid("vhost"))?
            .clear()
            .push(&self.vhost);
        Ok(url)
    }
}

/// A connection failure is what this check exists to report, so it is CRITICAL. Everything
/// else keeps its usual state.
pub fn error_state(err: &CheckError) -> ServiceState {
    match err {
        CheckError::Amqp(_) => ServiceState::Critical,
        other => other.state(),
    }
}

pub fn run(config: &Config) -> Result<Report, CheckError> {
    let url = config.url()?;
    debug!(
        "connecting to {}:{} vhost {}",
        config.host, config.port, config.vhost
    );

    let mut connection = Connection::insecure_open(url.as_str())?;
    let channel = match connection.open_channel(None) {
        Ok(channel) => channel,
        Err(e) => {
            warn!("opening a channel failed: {}", e);
            return Err(CheckError::ChannelClosed);
        }
    };

    if let Err(e) = channel.close() {
        debug!("closing channel: {}", e);
    }
    if let Err(e) = connection.close() {
        debug!("closing connection: {}", e);
    }

    Ok(CheckResult::ok("AMQP connection is OK").into())
}
