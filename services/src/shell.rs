// Axon sidechain client implementing checker & collator roles
// Written in 2021 by
//     Axon Client developers
//
// To the extent possible under law, the author(s) have dedicated all
// copyright and related and neighboring rights to this software to
// the public domain worldwide. This software is distributed without
// any warranty.
//
// You should have received a copy of the MIT License
// along with this software.
// If not, see <https://opensource.org/licenses/MIT>.

use clap::{ArgAction, Parser, Subcommand};
use log::LevelFilter;
use std::path::PathBuf;
use std::str::FromStr;

use crate::config::RoleKind;

#[derive(Copy, Clone, PartialEq, Eq, Debug, Display)]
pub enum LogLevel {
    /// Report only errors to `stderr`. Corresponds to zero verbosity flags.
    #[display("error")]
    Error = 0,

    /// Report warning messages and errors. Corresponds to a single `-v`
    /// verbosity flag.
    #[display("warn")]
    Warn,

    /// Report cycle outcomes and submitted transactions. Corresponds to a
    /// double `-vv` verbosity flag.
    #[display("info")]
    Info,

    /// Report operation choices and skipped ticks.
    /// Corresponds to triple `-vvv` verbosity flag.
    #[display("debug")]
    Debug,

    /// Print all possible messages including tracing information.
    /// Corresponds to quadruple `-vvvv` verbosity flag.
    #[display("trace")]
    Trace,
}

#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Debug, Display, Error)]
#[display("unknown log level `{0}`")]
pub struct LogLevelParseError(String);

impl FromStr for LogLevel {
    type Err = LogLevelParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s {
            "error" | "errors" => LogLevel::Error,
            "warn" | "warning" | "warnings" => LogLevel::Warn,
            "info" => LogLevel::Info,
            "debug" => LogLevel::Debug,
            "trace" | "tracing" => LogLevel::Trace,
            other => Err(LogLevelParseError(other.to_owned()))?,
        })
    }
}

impl From<u8> for LogLevel {
    fn from(val: u8) -> Self {
        Self::from_verbosity_flag_count(val)
    }
}

impl LogLevel {
    /// Constructs enum value from a given number of verbosity flags
    pub fn from_verbosity_flag_count(level: u8) -> Self {
        match level {
            0 => LogLevel::Error,
            1 => LogLevel::Warn,
            2 => LogLevel::Info,
            3 => LogLevel::Debug,
            _ => LogLevel::Trace,
        }
    }

    pub fn level_filter(&self) -> LevelFilter {
        match self {
            LogLevel::Error => LevelFilter::Error,
            LogLevel::Warn => LevelFilter::Warn,
            LogLevel::Info => LevelFilter::Info,
            LogLevel::Debug => LevelFilter::Debug,
            LogLevel::Trace => LevelFilter::Trace,
        }
    }

    /// Applies log level to the system. `RUST_LOG` environment variable,
    /// when present, takes precedence.
    pub fn apply(&self) {
        env_logger::Builder::new()
            .filter_level(self.level_filter())
            .parse_env("RUST_LOG")
            .init();
    }
}

/// Axon sidechain client daemon
#[derive(Parser, Clone, PartialEq, Eq, Debug)]
#[command(name = "axond", version, about)]
pub struct Opts {
    /// Path to the configuration file
    #[arg(short, long, env = "AXON_CONFIG", default_value = "axon.toml")]
    pub config: PathBuf,

    /// Role to run, overriding the configured one
    #[arg(short, long)]
    pub role: Option<RoleKind>,

    /// Set verbosity level; can be used multiple times
    #[arg(short, long, action = ArgAction::Count)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand, Clone, PartialEq, Eq, Debug, Display)]
#[display(doc_comments)]
pub enum Command {
    /// Runs role cycles periodically (default)
    Run,

    /// Writes configuration file with default values
    Init,

    /// Checker withdraws fees earned for the checked data
    TakeBeneficiary,

    /// Checker joins the configured sidechain with its bond
    JoinSidechain,

    /// Checker leaves the configured sidechain
    QuitSidechain,

    /// Checker returns the bond not staked to any sidechain
    WithdrawBond,

    /// Collator re-publishes tasks whose refresh interval has expired
    RefreshTasks,

    /// Collator returns its bond
    UnlockBond,
}

impl Opts {
    pub fn log_level(&self) -> LogLevel {
        LogLevel::from(self.verbose)
    }

    pub fn command(&self) -> Command {
        self.command.clone().unwrap_or(Command::Run)
    }
}
