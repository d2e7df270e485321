use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use clap::Parser;
use dropper_core::DropperError;
use eyre::WrapErr;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

mod cli;
mod error_fmt;
mod predict;
mod rt;
mod run;
mod simulate;

use cli::{Cli, Commands, FILE_GUARD, JSON_MODE};

fn main() {
    let cli = Cli::parse();
    let _ = JSON_MODE.set(cli.json);
    if let Err(e) = color_eyre::install() {
        eprintln!("warning: color-eyre not installed: {e}");
    }

    if let Err(err) = real_main(cli) {
        let json = JSON_MODE.get().copied().unwrap_or(false);
        if json {
            eprintln!("{}", error_fmt::format_error_json(&err));
        } else {
            eprintln!("{}", error_fmt::humanize(&err));
        }
        tracing::error!(error = %format!("{err:#}"), "exiting");
        std::process::exit(error_fmt::exit_code_for_error(&err));
    }
}

fn real_main(cli: Cli) -> eyre::Result<()> {
    match cli.cmd {
        Commands::Predict {
            period_us,
            elapsed_us,
        } => {
            init_tracing(cli.json, cli.log_level.as_deref(), None)?;
            predict::print_prediction(period_us, elapsed_us, cli.json);
            Ok(())
        }
        Commands::Simulate {
            duration_ms,
            trigger_at_ms,
            trigger_hold_ms,
            initial_period_us,
            disturb_at_ms,
            disturb_factor,
        } => {
            let cfg = load_config(&cli.config)?;
            init_tracing(cli.json, cli.log_level.as_deref(), Some(&cfg.logging))?;

            let mut params = simulate::SimParams::from_config(&cfg.simulation);
            if let Some(ms) = duration_ms {
                params.duration_us = ms.saturating_mul(1_000);
            }
            if let Some(ms) = trigger_at_ms {
                params.trigger_at_us = ms.saturating_mul(1_000);
            }
            if let Some(ms) = trigger_hold_ms {
                params.trigger_hold_us = ms.saturating_mul(1_000);
            }
            if let Some(us) = initial_period_us {
                params.initial_period_us = us;
            }
            if let (Some(at_ms), Some(factor)) = (disturb_at_ms, disturb_factor) {
                params.disturbance = Some(dropper_hardware::Disturbance {
                    at_us: at_ms.saturating_mul(1_000),
                    factor,
                });
            }
            params.check()?;

            let summary = simulate::run_simulation((&cfg.monitor).into(), &params)?;
            simulate::print_summary(&summary, cli.json);
            Ok(())
        }
        Commands::Run {
            max_run_ms,
            rt,
            rt_prio,
            rt_lock,
            rt_cpu,
            stats,
        } => {
            let cfg = load_config(&cli.config)?;
            init_tracing(cli.json, cli.log_level.as_deref(), Some(&cfg.logging))?;

            let shutdown = Arc::new(AtomicBool::new(false));
            {
                let flag = Arc::clone(&shutdown);
                ctrlc::set_handler(move || flag.store(true, Ordering::Relaxed))
                    .wrap_err("failed to install Ctrl-C handler")?;
            }

            if rt {
                rt::setup_rt_once(&rt::RtRequest {
                    prio: rt_prio,
                    lock: rt_lock.unwrap_or(cli::RtLock::os_default()),
                    cpu: rt_cpu,
                });
            }

            let opts = run::RunOpts { max_run_ms, stats };
            let report = run::run_turntable(&cfg, &opts, shutdown)?;
            if cli.json {
                println!("{}", report.to_json());
            } else {
                println!(
                    "stopped after {} ms: {} release(s), {} polls",
                    report.runtime_ms, report.releases, report.polls
                );
            }
            Ok(())
        }
    }
}

/// Read, parse and validate the config; failures are configuration errors.
fn load_config(path: &Path) -> eyre::Result<dropper_config::Config> {
    dropper_config::load_file(path).map_err(|e| eyre::Report::new(DropperError::Config(format!("{e}"))))
}

/// Console layer (text or JSON lines on stderr) plus an optional file layer.
///
/// Precedence for the level: `RUST_LOG`, then `--log-level`, then
/// `[logging].level`, then `info`.
fn init_tracing(
    json: bool,
    cli_level: Option<&str>,
    logging: Option<&dropper_config::Logging>,
) -> eyre::Result<()> {
    let level = cli_level
        .or_else(|| logging.and_then(|l| l.level.as_deref()))
        .unwrap_or("info");
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(level))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    let (json_layer, text_layer) = if json {
        let layer = tracing_subscriber::fmt::layer()
            .json()
            .with_writer(std::io::stderr);
        (Some(layer), None)
    } else {
        let layer = tracing_subscriber::fmt::layer()
            .with_target(false)
            .with_writer(std::io::stderr);
        (None, Some(layer))
    };

    let file_layer = match logging.and_then(|l| l.file.as_deref()) {
        Some(file) => {
            let path = Path::new(file);
            let dir = path
                .parent()
                .filter(|d| !d.as_os_str().is_empty())
                .unwrap_or_else(|| Path::new("."));
            let name = path
                .file_name()
                .ok_or_else(|| eyre::eyre!("logging.file has no file name: {file}"))?;
            let appender = match logging.and_then(|l| l.rotation.as_deref()) {
                Some("daily") => tracing_appender::rolling::daily(dir, name),
                Some("hourly") => tracing_appender::rolling::hourly(dir, name),
                _ => tracing_appender::rolling::never(dir, name),
            };
            let (writer, guard) = tracing_appender::non_blocking(appender);
            let _ = FILE_GUARD.set(guard);
            Some(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_ansi(false)
                    .with_writer(writer),
            )
        }
        None => None,
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(json_layer)
        .with(text_layer)
        .with(file_layer)
        .try_init()
        .wrap_err("failed to install tracing subscriber")
}
