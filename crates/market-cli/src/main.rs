//! `mktwatch`: terminal market banner for global and CN-market indicators.

mod cli;
mod error;
mod render;

use std::io::Write;
use std::process::ExitCode;
use std::time::Duration;

use clap::Parser;
use market::{MarketRegistry, Snapshot, Vendor};
use tokio::time::MissedTickBehavior;
use tracing::{debug, info};
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

use crate::cli::Cli;
use crate::error::CliError;
use crate::render::{CLEAR_SCREEN, render_json, render_text};

/// Exit code of a `--once` run whose fetch cycle failed.
const FAILED_CYCLE: u8 = 3;

#[tokio::main]
async fn main() -> ExitCode {
    match run().await {
        Ok(code) => code,
        Err(error) => {
            eprintln!("error: {error}");
            ExitCode::from(error.exit_code())
        }
    }
}

async fn run() -> Result<ExitCode, CliError> {
    let cli = Cli::parse();
    init_tracing(&cli.log)?;

    let Some(vendor) = cli.command.vendor() else {
        println!("mktwatch {}", env!("CARGO_PKG_VERSION"));
        return Ok(ExitCode::SUCCESS);
    };

    let registry = build_registry(vendor)?;
    debug!(?registry, %vendor, "Registry ready");

    if cli.once {
        let snapshot = registry.fetch(vendor).await;
        emit(&snapshot, cli.json, false)?;
        return Ok(if snapshot.ok().0 {
            ExitCode::SUCCESS
        } else {
            ExitCode::from(FAILED_CYCLE)
        });
    }

    watch(&registry, vendor, &cli).await?;
    Ok(ExitCode::SUCCESS)
}

/// Seeds the filter from `--log`; `RUST_LOG` wins when set. Logs go to stderr.
fn init_tracing(level: &str) -> Result<(), CliError> {
    let filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => EnvFilter::try_new(level).map_err(|e| CliError::LogFilter {
            filter: level.to_string(),
            reason: e.to_string(),
        })?,
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(std::io::stderr).with_target(true))
        .init();
    Ok(())
}

fn build_registry(vendor: Vendor) -> Result<MarketRegistry, CliError> {
    let registry = MarketRegistry::new().with_yahoo();
    if market::overlay_for(vendor).is_some() {
        return Ok(registry.with_qq()?);
    }
    Ok(registry)
}

/// Redraws the banner every interval until interrupted.
async fn watch(registry: &MarketRegistry, vendor: Vendor, cli: &Cli) -> Result<(), CliError> {
    let mut ticker = tokio::time::interval(Duration::from_secs(cli.interval));
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    let shutdown = tokio::signal::ctrl_c();
    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                let snapshot = registry.fetch(vendor).await;
                emit(&snapshot, cli.json, true)?;
            }
            result = &mut shutdown => {
                result?;
                info!("Interrupted, exiting");
                return Ok(());
            }
        }
    }
}

fn emit(snapshot: &Snapshot, json: bool, redraw: bool) -> Result<(), CliError> {
    let mut stdout = std::io::stdout().lock();
    if json {
        writeln!(stdout, "{}", render_json(snapshot)?)?;
    } else {
        if redraw {
            write!(stdout, "{CLEAR_SCREEN}")?;
        }
        write!(stdout, "{}", render_text(snapshot))?;
    }
    stdout.flush()?;
    Ok(())
}
