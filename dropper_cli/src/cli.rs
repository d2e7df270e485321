//! CLI argument definitions and shared statics.

use clap::{ArgAction, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;
use std::sync::OnceLock;

pub static FILE_GUARD: OnceLock<tracing_appender::non_blocking::WorkerGuard> = OnceLock::new();
/// Whether the user asked for JSON output (controls structured error output).
pub static JSON_MODE: OnceLock<bool> = OnceLock::new();

#[derive(Parser, Debug)]
#[command(name = "dropper", version, about = "Turntable drop timing")]
pub struct Cli {
    /// Path to config TOML (typed)
    #[arg(long, value_name = "FILE", default_value = "etc/dropper.toml")]
    pub config: PathBuf,

    /// Print reports and logs as JSON lines instead of text
    #[arg(long, action = ArgAction::SetTrue)]
    pub json: bool,

    /// Console log level (error|warn|info|debug|trace); overrides [logging].level
    #[arg(long = "log-level", value_name = "LEVEL")]
    pub log_level: Option<String>,

    /// Command to execute
    #[command(subcommand)]
    pub cmd: Commands,
}

/// Memory locking mode for real-time operation.
#[derive(Copy, Clone, Debug, Eq, PartialEq, ValueEnum)]
pub enum RtLock {
    /// Do not lock memory
    None,
    /// Lock currently resident pages
    Current,
    /// Lock current and future pages
    All,
}

impl RtLock {
    #[inline]
    pub fn os_default() -> Self {
        if cfg!(target_os = "linux") {
            RtLock::Current
        } else {
            RtLock::None
        }
    }
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Compute the release wait for a measured round (no config needed)
    Predict {
        /// Duration of the last full round in microseconds
        #[arg(long, value_name = "US")]
        period_us: u64,
        /// Time since the hole last passed the release point, in microseconds
        #[arg(long, value_name = "US", default_value_t = 0)]
        elapsed_us: u64,
    },
    /// Replay a release cycle against a simulated turntable
    Simulate {
        /// Simulated duration (overrides simulation.duration_ms)
        #[arg(long, value_name = "MS")]
        duration_ms: Option<u64>,
        /// When the trigger is pressed (overrides simulation.trigger_at_ms)
        #[arg(long, value_name = "MS")]
        trigger_at_ms: Option<u64>,
        /// How long the trigger is held (overrides simulation.trigger_hold_ms)
        #[arg(long, value_name = "MS")]
        trigger_hold_ms: Option<u64>,
        /// First round period (overrides simulation.initial_period_us)
        #[arg(long, value_name = "US")]
        initial_period_us: Option<u64>,
        /// Inject a speed change at this time (needs --disturb-factor)
        #[arg(long, value_name = "MS", requires = "disturb_factor")]
        disturb_at_ms: Option<u64>,
        /// Round period multiplier of the injected speed change
        #[arg(long, value_name = "FACTOR", requires = "disturb_at_ms")]
        disturb_factor: Option<f64>,
    },
    /// Drive the real turntable (needs the `hardware` feature)
    Run {
        /// Stop after this many milliseconds (default: until Ctrl-C)
        #[arg(long, value_name = "MS")]
        max_run_ms: Option<u64>,
        /// Enable real-time mode (SCHED_FIFO, affinity, mlockall)
        #[arg(
            long,
            action = ArgAction::SetTrue,
            long_help = "Enable real-time mode on supported OSes.\n\nLinux: Attempts SCHED_FIFO priority, pins to one CPU, and calls mlockall to lock the process address space into RAM. Release timing jitter is bounded by the poll loop, so this reduces missed drops but may require elevated privileges or ulimits (e.g., memlock).\n\nOther OSes: only mlockall is attempted."
        )]
        rt: bool,
        /// Real-time priority for SCHED_FIFO on Linux (1..=max)
        #[arg(long, value_name = "PRIO")]
        rt_prio: Option<i32>,
        /// Select memory locking mode for --rt: none, current, or all
        #[arg(long, value_enum, value_name = "MODE")]
        rt_lock: Option<RtLock>,
        /// CPU index to pin the process to with --rt (Linux only, default 0)
        #[arg(long, value_name = "CPU")]
        rt_cpu: Option<usize>,
        /// Print poll loop latency stats on exit
        #[arg(long, action = ArgAction::SetTrue)]
        stats: bool,
    },
}
