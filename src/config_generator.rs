//! Icinga2 `CheckCommand` definitions generated from a check's own command line.
//!
//! Every check binary honors the `GENERATE_ICINGA_COMMAND` environment variable: when it is set
//! the binary prints the definition for its flags, including all generated threshold flags, and
//! exits instead of running the check.

use clap::ArgAction;

pub const GENERATE_ENV_VAR: &str = "GENERATE_ICINGA_COMMAND";

pub struct CommandDescription {
    arguments: Vec<ArgumentDescription>,
}

pub struct ArgumentDescription {
    name: String,
    var: String,
    description: Option<String>,
    is_switch: bool,
    default_value: Option<String>,
}

#[derive(Debug, thiserror::Error)]
pub enum ToIcingaCommandError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid executable path")]
    InvalidExecutablePath,
    #[error("error converting to command description: {0}")]
    CommandDescriptionFromError(#[from] CommandDescriptionFromError),
}

impl CommandDescription {
    /// Renders the definition. Custom variables are namespaced by the command name, so
    /// `check-kibana --host` reads `$check_kibana_host$`.
    pub fn to_icinga_command(&self, name: &str, executable: &str) -> String {
        let var_prefix = name.replace('-', "_");
        let mut out = format!("object CheckCommand \"{name}\" {{\n");

        out.push_str(&format!("  command = [ \"{}\" ]\n", escape_string(executable)));
        out.push_str("  arguments = {\n");
        for arg in &self.arguments {
            let var = format!("{}_{}", var_prefix, arg.var);
            out.push_str(&format!("    \"--{}\" = {{\n", arg.name));

            if arg.is_switch {
                out.push_str(&format!("      set_if = \"${var}$\"\n"));
            } else {
                out.push_str(&format!("      value = \"${var}$\"\n"));
            }

            if let Some(description) = &arg.description {
                out.push_str(&format!(
                    "      description = \"{}\"\n",
                    escape_string(description)
                ));
            }

            out.push_str("    }\n");
        }
        out.push_str("  }\n");

        let defaults: Vec<_> = self
            .arguments
            .iter()
            .filter_map(|arg| arg.default_value.as_ref().map(|d| (&arg.var, d)))
            .collect();
        if !defaults.is_empty() {
            out.push('\n');
        }
        for (var, default_value) in defaults {
            out.push_str(&format!(
                "  vars.{}_{} = \"{}\"\n",
                var_prefix,
                var,
                escape_string(default_value)
            ));
        }

        out.push_str("}\n");
        out
    }
}

fn escape_string(s: &str) -> String {
    ["\"", "$"]
        .iter()
        .fold(s.to_string(), |acc, c| acc.replace(c, &format!("\\{}", c)))
}

#[derive(Debug, thiserror::Error)]
pub enum CommandDescriptionFromError {
    #[error("argument {0} has no long flag")]
    MissingLongArgument(String),
}

impl TryFrom<&clap::Command> for CommandDescription {
    type Error = CommandDescriptionFromError;

    fn try_from(cmd: &clap::Command) -> Result<Self, Self::Error> {
        let mut arguments = Vec::new();

        for arg in cmd.get_arguments() {
            if matches!(arg.get_action(), ArgAction::Help | ArgAction::Version) {
                continue;
            }

            let name = arg
                .get_long()
                .ok_or_else(|| {
                    let id = arg.get_id().as_str().to_owned();
                    CommandDescriptionFromError::MissingLongArgument(id)
                })?
                .to_owned();

            let var = name.replace('-', "_");
            let description = arg.get_help().map(|s| s.to_string());
            let is_switch = matches!(arg.get_action(), ArgAction::SetTrue | ArgAction::SetFalse);

            let default_value = if is_switch {
                None
            } else {
                arg.get_default_values()
                    .first()
                    .and_then(|v| v.to_str())
                    .map(|s| s.to_string())
            };

            arguments.push(ArgumentDescription {
                name,
                var,
                description,
                is_switch,
                default_value,
            });
        }

        Ok(CommandDescription { arguments })
    }
}

/// Prints the Icinga command configuration and exits if [GENERATE_ENV_VAR] is set.
pub fn print_icinga_command_config_if_env_and_exit(
    name: &str,
    cmd: &clap::Command,
) -> Result<(), ToIcingaCommandError> {
    if std::env::var_os(GENERATE_ENV_VAR).is_none() {
        return Ok(());
    }

    let description = CommandDescription::try_from(cmd)?;
    let executable = std::env::current_exe()?
        .to_str()
        .ok_or(ToIcingaCommandError::InvalidExecutablePath)?
        .to_owned();
    let out = description.to_icinga_command(name, &executable);

    println!("{}", out.trim());
    std::process::exit(0);
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::{Arg, Command};

    fn command() -> Command {
        Command::new("check-kibana")
            .arg(
                Arg::new("host")
                    .long("host")
                    .help("Kibana host")
                    .default_value("localhost"),
            )
            .arg(
                Arg::new("no_server")
                    .long("no-server")
                    .help("Skip the \"server\" part")
                    .action(ArgAction::SetTrue),
            )
            .arg(
                Arg::new("messages-max-c")
                    .long("messages-max-c")
                    .value_parser(clap::value_parser!(f64)),
            )
    }

    #[test]
    fn test_to_icinga_command() {
        let description = CommandDescription::try_from(&command()).unwrap();
        let out = description.to_icinga_command("check-kibana", "/usr/lib/nagios/check-kibana");

        let expected = r#"object CheckCommand "check-kibana" {
  command = [ "/usr/lib/nagios/check-kibana" ]
  arguments = {
    "--host" = {
      value = "$check_kibana_host$"
      description = "Kibana host"
    }
    "--no-server" = {
      set_if = "$check_kibana_no_server$"
      description = "Skip the \"server\" part"
    }
    "--messages-max-c" = {
      value = "$check_kibana_messages_max_c$"
    }
  }

  vars.check_kibana_host = "localhost"
}
"#;
        assert_eq!(out, expected);
    }

    #[test]
    fn test_missing_long_flag() {
        let cmd = Command::new("test").arg(Arg::new("positional"));
        let err = CommandDescription::try_from(&cmd).err().unwrap();
        assert_eq!(err.to_string(), "argument positional has no long flag");
    }

    #[test]
    fn test_escape_string() {
        assert_eq!(escape_string("a \"b\" $c$"), "a \\\"b\\\" \\$c\\$");
    }
}
