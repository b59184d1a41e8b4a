//! Command line interface definition using clap.
//!
//! This module defines the [`Cli`] structure and its subcommands. The
//! core never reads these directly; [`crate::runner`] translates them
//! into settings.

use camino::Utf8PathBuf;
use clap::{Parser, Subcommand, ValueEnum};

use crate::settings::TargetOs;

fn parse_jobs(s: &str) -> Result<usize, String> {
    let value: usize = s.parse().map_err(|_| format!("{s} is not a number"))?;
    if value == 0 {
        Err("jobs must be at least 1".to_owned())
    } else {
        Ok(value)
    }
}

fn parse_build_arg(s: &str) -> Result<(String, String), String> {
    s.split_once('=')
        .map(|(key, value)| (key.to_owned(), value.to_owned()))
        .ok_or_else(|| format!("\"{s}\" is not of the form key=value"))
}

/// A meta-build generator: declarative build descriptions in, ninja
/// files out.
#[derive(Debug, Parser)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Use this directory as the source root instead of the current one.
    #[arg(long, value_name = "DIR")]
    pub root: Option<Utf8PathBuf>,

    /// Set a build argument. May be given multiple times.
    #[arg(long = "args", value_name = "KEY=VALUE", value_parser = parse_build_arg)]
    pub build_args: Vec<(String, String)>,

    /// Enable verbose logging.
    #[arg(short, long)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

/// Available top-level commands.
#[derive(Debug, Subcommand, PartialEq, Eq, Clone)]
pub enum Commands {
    /// Run the full pipeline and write ninja files into the build dir.
    Gen {
        /// Build directory, relative to the source root (e.g. out/Debug).
        build_dir: String,

        /// OS to generate build rules for.
        #[arg(long, value_enum, default_value_t = OsArg::host())]
        os: OsArg,

        /// Number of parallel loader jobs. Defaults to the host's
        /// available parallelism.
        #[arg(short, long, value_name = "N", value_parser = parse_jobs)]
        jobs: Option<usize>,
    },
}

/// CLI spelling of the target OS.
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum OsArg {
    Linux,
    Mac,
    Win,
}

impl OsArg {
    /// The OS this binary is running on.
    #[must_use]
    pub fn host() -> Self {
        if cfg!(target_os = "macos") {
            Self::Mac
        } else if cfg!(target_os = "windows") {
            Self::Win
        } else {
            Self::Linux
        }
    }
}

impl From<OsArg> for TargetOs {
    fn from(value: OsArg) -> Self {
        match value {
            OsArg::Linux => Self::Linux,
            OsArg::Mac => Self::Mac,
            OsArg::Win => Self::Windows,
        }
    }
}
