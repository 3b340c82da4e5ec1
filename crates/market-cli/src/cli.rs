//! CLI argument definitions for mktwatch.
//!
//! | Option | Default | Description |
//! |--------|---------|-------------|
//! | `--log`, `-l` | `info` | Log level or filter directive |
//! | `--interval` | `10` | Seconds between refreshes |
//! | `--once` | `false` | Fetch a single snapshot and exit |
//! | `--json` | `false` | Print snapshots as JSON |

use clap::{Parser, Subcommand};
use market::Vendor;

/// Terminal market banner for global and CN-market indicators.
#[derive(Debug, Parser)]
#[command(name = "mktwatch", author, version, about)]
pub(crate) struct Cli {
    /// Log level to set [trace|debug|info|warn|error]
    #[arg(short = 'l', long = "log", global = true, default_value = "info")]
    pub(crate) log: String,

    /// Seconds between refreshes.
    #[arg(
        long,
        global = true,
        default_value_t = 10,
        value_parser = clap::value_parser!(u64).range(1..)
    )]
    pub(crate) interval: u64,

    /// Fetch a single snapshot and exit.
    #[arg(long, global = true)]
    pub(crate) once: bool,

    /// Print snapshots as JSON instead of the text banner.
    #[arg(long, global = true)]
    pub(crate) json: bool,

    #[command(subcommand)]
    pub(crate) command: Command,
}

/// Top-level commands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Subcommand)]
pub(crate) enum Command {
    /// Global indicators from Yahoo Finance.
    Yahoo,
    /// Global indicators with CN indices from Tencent.
    Qq,
    /// Global indicators with CN indices, Sina vendor.
    Sina,
    /// Global indicators with the SSE and SZSE indices only.
    Netease,
    /// Global indicators with CN indices, East Money vendor.
    Eastmoney,
    /// Same banner as `eastmoney`.
    EastmoneyLimitup,
    /// Same banner as `eastmoney`.
    EastmoneyLhb,
    /// Print version information.
    Version,
}

impl Command {
    /// The vendor a display command selects.
    pub(crate) const fn vendor(self) -> Option<Vendor> {
        match self {
            Self::Yahoo => Some(Vendor::Yahoo),
            Self::Qq => Some(Vendor::Qq),
            Self::Sina => Some(Vendor::Sina),
            Self::Netease => Some(Vendor::Netease),
            Self::Eastmoney => Some(Vendor::Eastmoney),
            Self::EastmoneyLimitup => Some(Vendor::EastmoneyLimitup),
            Self::EastmoneyLhb => Some(Vendor::EastmoneyLhb),
            Self::Version => None,
        }
    }
}
