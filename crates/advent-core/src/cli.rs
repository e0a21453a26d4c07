use std::io::IsTerminal;
use std::path::PathBuf;

use anyhow::anyhow;
use clap::{ArgAction, Parser, Subcommand};
use tracing::debug;
use tracing_subscriber::EnvFilter;

use crate::config::ConfigOverrides;
use crate::time::TimeMode;

#[derive(Parser, Debug, Clone)]
#[command(
    name = "advent",
    version,
    about = "Advent calendar: map daily tasks onto a date range",
    disable_help_subcommand = true
)]
pub struct GlobalCli {
    #[arg(short = 'v', long = "verbose", action = ArgAction::Count, global = true)]
    pub verbose: u8,

    #[arg(short = 'q', long = "quiet", action = ArgAction::Count, global = true)]
    pub quiet: u8,

    /// Calendar configuration file (.json or .toml).
    #[arg(long = "config", global = true)]
    pub config: Option<PathBuf>,

    /// Task content file; replaces any tasks embedded in the config.
    #[arg(long = "tasks", global = true)]
    pub tasks: Option<PathBuf>,

    /// Day boundary: local or utc.
    #[arg(long = "mode", global = true)]
    pub mode: Option<TimeMode>,

    /// Freeze the current moment (YYYY-MM-DD or RFC 3339).
    #[arg(long = "test-date", global = true)]
    pub test_date: Option<String>,

    /// IANA timezone used in local mode.
    #[arg(long = "timezone", global = true)]
    pub timezone: Option<String>,

    #[arg(long = "no-color", global = true)]
    pub no_color: bool,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// List every day with its task and status.
    Days {
        #[arg(long)]
        json: bool,
    },
    /// Print the weekday-aligned grid.
    Grid,
    /// Validate configuration and content.
    Check,
    /// Keep running and report day rollovers.
    Watch {
        /// Poll interval in seconds.
        #[arg(long, default_value_t = 30)]
        interval: u64,
    },
}

impl Default for Command {
    fn default() -> Self {
        Command::Days { json: false }
    }
}

impl GlobalCli {
    pub fn overrides(&self) -> ConfigOverrides {
        ConfigOverrides {
            time_mode: self.mode,
            test_date: self.test_date.clone(),
            timezone: self.timezone.clone(),
        }
    }
}

pub fn init_tracing(verbose: u8, quiet: u8) -> anyhow::Result<()> {
    let default_level = if quiet >= 2 {
        "error"
    } else if quiet == 1 {
        "warn"
    } else if verbose >= 3 {
        "trace"
    } else if verbose == 2 {
        "debug"
    } else if verbose == 1 {
        "info"
    } else {
        "warn"
    };

    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(default_level))
        .map_err(|e| anyhow!("invalid RUST_LOG / log filter: {e}"))?;

    let init_result = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .with_target(true)
        .with_level(true)
        .with_ansi(std::io::stderr().is_terminal())
        .try_init();

    if let Err(err) = init_result {
        debug!(error = %err, "tracing subscriber already set, continuing");
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use clap::Parser;

    use super::*;

    #[test]
    fn parses_global_flags_after_subcommand() {
        let cli = GlobalCli::parse_from([
            "advent",
            "grid",
            "--mode",
            "utc",
            "--test-date",
            "2025-12-05",
            "-vv",
        ]);
        assert_eq!(cli.command, Some(Command::Grid));
        assert_eq!(cli.mode, Some(TimeMode::Utc));
        assert_eq!(cli.verbose, 2);
        assert_eq!(cli.overrides().test_date.as_deref(), Some("2025-12-05"));
    }

    #[test]
    fn defaults_to_day_list() {
        let cli = GlobalCli::parse_from(["advent"]);
        assert_eq!(cli.command.unwrap_or_default(), Command::Days { json: false });

        let cli = GlobalCli::parse_from(["advent", "watch"]);
        assert_eq!(cli.command, Some(Command::Watch { interval: 30 }));
    }

    #[test]
    fn rejects_unknown_mode() {
        assert!(GlobalCli::try_parse_from(["advent", "--mode", "gmt"]).is_err());
    }
}
