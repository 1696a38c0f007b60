//! Command line handling shared by all checks.
//!
//! The fixed options of a check are a clap derive struct. The four threshold flags of every
//! metric are generated from the check's metric table and registered on top of it, so a new
//! metric only needs a new table row.

use clap::{Arg, ArgMatches, Command, Parser};
use log::{debug, error};
use regex::Regex;

use crate::config_generator::print_icinga_command_config_if_env_and_exit;
use crate::filter::compile_pattern;
use crate::http::Credentials;
use crate::metrics::MetricDef;
use crate::threshold::{Bound, ThresholdSet};
use crate::CheckError;

/// Order in which the threshold flags of a metric appear in `--help`.
const FLAG_ORDER: [Bound; 4] = [
    Bound::MinWarning,
    Bound::MinCritical,
    Bound::MaxWarning,
    Bound::MaxCritical,
];

/// HTTP basic auth options of the RabbitMQ management API.
#[derive(clap::Args, Clone, Debug)]
pub struct AuthArgs {
    /// User for the management API
    #[arg(long, default_value = "guest")]
    pub user: String,
    /// Password for the management API
    #[arg(long, default_value = "guest")]
    pub password: String,
}

impl AuthArgs {
    pub fn credentials(&self) -> Credentials {
        Credentials {
            user: self.user.clone(),
            password: self.password.clone(),
        }
    }
}

/// Value parser for `--host`; a trailing `/` is dropped.
pub fn parse_host(s: &str) -> Result<String, String> {
    let host = s.trim_end_matches('/');
    if host.is_empty() {
        return Err("host must not be empty".to_owned());
    }
    Ok(host.to_owned())
}

/// Value parser for filter patterns.
pub fn parse_pattern(s: &str) -> Result<Regex, String> {
    compile_pattern(s).map_err(|e| format!("incorrect regular expression: {}", e))
}

fn flag_name(def: &MetricDef, bound: Bound) -> String {
    format!("{}-{}", def.flag, bound.flag_suffix())
}

/// The configured thresholds of every metric a check knows, in the check's evaluation order.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ThresholdTable {
    entries: Vec<(MetricDef, ThresholdSet)>,
}

impl ThresholdTable {
    /// A table for `defs` with nothing configured.
    pub fn new(defs: &[MetricDef]) -> Self {
        ThresholdTable {
            entries: defs.iter().map(|d| (*d, ThresholdSet::default())).collect(),
        }
    }

    /// Adds `--<flag>-min-w`, `-min-c`, `-max-w` and `-max-c` for every metric of `defs`.
    pub fn register(mut cmd: Command, defs: &[MetricDef]) -> Command {
        for def in defs {
            for bound in FLAG_ORDER {
                let name = flag_name(def, bound);
                cmd = cmd.arg(
                    Arg::new(name.clone())
                        .long(name)
                        .value_name("FLOAT")
                        .value_parser(clap::value_parser!(f64))
                        .help(format!("{} for metric {}", bound.description(), def.help)),
                );
            }
        }
        cmd
    }

    pub fn from_matches(defs: &[MetricDef], matches: &ArgMatches) -> Self {
        let mut table = Self::new(defs);
        for (def, thresholds) in table.entries.iter_mut() {
            for bound in FLAG_ORDER {
                let limit = matches.get_one::<f64>(&flag_name(def, bound)).copied();
                thresholds.set(bound, limit);
            }
        }
        table
    }

    /// Replaces the thresholds of metric `name`. Unknown names are ignored.
    pub fn with(mut self, name: &str, thresholds: ThresholdSet) -> Self {
        if let Some((_, t)) = self.entries.iter_mut().find(|(d, _)| d.name == name) {
            *t = thresholds;
        }
        self
    }

    pub fn get(&self, name: &str) -> ThresholdSet {
        self.entries
            .iter()
            .find(|(d, _)| d.name == name)
            .map(|(_, t)| *t)
            .unwrap_or_default()
    }

    /// The metrics which have at least one bound set, in evaluation order.
    pub fn configured(&self) -> impl Iterator<Item = (&MetricDef, &ThresholdSet)> {
        self.entries
            .iter()
            .filter(|(_, t)| !t.is_empty())
            .map(|(d, t)| (d, t))
    }
}

/// Parses `args` into the check's options and its threshold table.
pub fn parse_from<P, I, T>(defs: &[MetricDef], args: I) -> Result<(P, ThresholdTable), clap::Error>
where
    P: Parser,
    I: IntoIterator<Item = T>,
    T: Into<std::ffi::OsString> + Clone,
{
    let cmd = ThresholdTable::register(P::command(), defs);
    let matches = cmd.try_get_matches_from(args)?;
    let options = P::from_arg_matches(&matches)?;
    let thresholds = ThresholdTable::from_matches(defs, &matches);
    Ok((options, thresholds))
}

/// Loads the configuration of check `name` from the process arguments.
///
/// `--help` and `--version` print and exit 0. Any other argument error is returned as
/// [CheckError::Usage] so it ends up as UNKNOWN rather than clap's exit code 2.
pub fn load<P: Parser>(name: &str, defs: &[MetricDef]) -> Result<(P, ThresholdTable), CheckError> {
    let cmd = ThresholdTable::register(P::command(), defs);
    print_icinga_command_config_if_env_and_exit(name, &cmd)?;

    match parse_from::<P, _, _>(defs, std::env::args_os()) {
        Ok((options, thresholds)) => {
            for (def, t) in thresholds.configured() {
                debug!("thresholds for {}: {:?}", def.name, t);
            }
            Ok((options, thresholds))
        }
        Err(e) if !e.use_stderr() => e.exit(),
        Err(e) => Err(usage_error(&e)),
    }
}

fn usage_error(e: &clap::Error) -> CheckError {
    let rendered = e.to_string();
    error!("{}", rendered.trim_end());

    let summary = rendered
        .lines()
        .next()
        .unwrap_or_default()
        .trim_start_matches("error: ")
        .to_owned();
    CheckError::Usage(summary)
}
