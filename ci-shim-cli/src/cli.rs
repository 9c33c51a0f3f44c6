//! CLI argument parsing using clap derive API
//!
//! Purely declarative, no side effects or I/O.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

/// ci-shim -- CI build shim.
///
/// Installs the test runner, runs a test session, collects the result log
/// and ships logs for continuous builds. Runs a build when no command is given.
#[derive(Parser, Debug)]
#[command(name = "ci-shim", version, about, long_about = None)]
pub struct Cli {
    /// Path to a ci-shim.toml configuration file.
    ///
    /// Defaults to ./ci-shim.toml when present, otherwise built-in defaults.
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Override log level (trace, debug, info, warn, error).
    #[arg(long, global = true)]
    pub log_level: Option<String>,

    /// Override log format (json, pretty).
    #[arg(long, global = true)]
    pub log_format: Option<String>,

    /// Output format.
    #[arg(long, global = true, default_value = "text")]
    pub output: OutputFormat,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Supported output formats.
#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable text output.
    Text,
    /// Machine-readable JSON.
    Json,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run the build: install, test, collect, ship.
    Run(SessionArgs),

    /// Show the commands a build would run, without running them.
    Plan(SessionArgs),

    /// Manage configuration.
    Config(ConfigArgs),
}

/// Session selection shared by `run` and `plan`.
#[derive(Args, Debug, Default)]
pub struct SessionArgs {
    /// Run only this session (overrides NOX_SESSION).
    #[arg(short, long)]
    pub session: Option<String>,
}

/// Manage ci-shim configuration.
#[derive(Args, Debug)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub action: ConfigAction,
}

#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Validate the configuration and report errors.
    Validate,
    /// Show the effective configuration (file + env overrides + defaults).
    Show,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_verify_structure() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_cli_no_subcommand_defaults_to_none() {
        let cli = Cli::try_parse_from(["ci-shim"]).expect("bare invocation should parse");
        assert!(cli.command.is_none(), "no subcommand means run");
        assert!(cli.config.is_none());
        assert!(matches!(cli.output, OutputFormat::Text));
    }

    #[test]
    fn test_cli_parse_run_with_session() {
        let cli = Cli::try_parse_from(["ci-shim", "run", "--session", "lint"])
            .expect("should parse run --session");
        match cli.command {
            Some(Commands::Run(args)) => assert_eq!(args.session.as_deref(), Some("lint")),
            other => panic!("expected Run command, got {other:?}"),
        }
    }

    #[test]
    fn test_cli_parse_plan_short_session() {
        let cli = Cli::try_parse_from(["ci-shim", "plan", "-s", "unit"])
            .expect("should parse plan -s");
        match cli.command {
            Some(Commands::Plan(args)) => assert_eq!(args.session.as_deref(), Some("unit")),
            other => panic!("expected Plan command, got {other:?}"),
        }
    }

    #[test]
    fn test_cli_parse_config_show_with_global_flags() {
        let cli = Cli::try_parse_from([
            "ci-shim",
            "config",
            "show",
            "--config",
            "/etc/ci-shim.toml",
            "--output",
            "json",
        ])
        .expect("should parse config show");
        assert_eq!(cli.config, Some(PathBuf::from("/etc/ci-shim.toml")));
        assert!(matches!(cli.output, OutputFormat::Json));
        assert!(matches!(
            cli.command,
            Some(Commands::Config(ConfigArgs {
                action: ConfigAction::Show
            }))
        ));
    }

    #[test]
    fn test_cli_log_overrides() {
        let cli = Cli::try_parse_from([
            "ci-shim",
            "--log-level",
            "debug",
            "--log-format",
            "pretty",
            "run",
        ])
        .expect("should parse log overrides");
        assert_eq!(cli.log_level.as_deref(), Some("debug"));
        assert_eq!(cli.log_format.as_deref(), Some("pretty"));
    }

    #[test]
    fn test_cli_rejects_unknown_output_format() {
        let result = Cli::try_parse_from(["ci-shim", "--output", "yaml", "run"]);
        assert!(result.is_err(), "yaml is not a supported output format");
    }
}
