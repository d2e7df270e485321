//! `run`: poll the real sensors and drive the servo until stopped.

use std::sync::Arc;
use std::sync::atomic::AtomicBool;

use dropper_core::{Stage, TickStatus};
use serde_json::json;

#[derive(Debug, Clone, Copy)]
pub struct RunOpts {
    pub max_run_ms: Option<u64>,
    pub stats: bool,
}

#[derive(Debug, Clone, Default)]
pub struct RunReport {
    pub runtime_ms: u64,
    pub polls: u64,
    pub releases: u64,
    pub aborted: u64,
    pub skipped: u64,
    /// Polls whose actuator command failed; the stage is retried next poll.
    pub errors: u64,
}

impl RunReport {
    pub fn to_json(&self) -> String {
        json!({
            "runtime_ms": self.runtime_ms,
            "polls": self.polls,
            "releases": self.releases,
            "aborted": self.aborted,
            "skipped": self.skipped,
            "errors": self.errors,
        })
        .to_string()
    }

    /// Count one poll outcome. Failures are logged, never fatal.
    pub fn record(&mut self, outcome: eyre::Result<TickStatus>) {
        self.polls += 1;
        match outcome {
            Ok(TickStatus::Advanced(Stage::Releasing)) => self.releases += 1,
            Ok(TickStatus::Aborted) => self.aborted += 1,
            Ok(TickStatus::Skipped(_)) => self.skipped += 1,
            Ok(_) => {}
            Err(e) => {
                self.errors += 1;
                tracing::warn!(error = %format!("{e:#}"), "poll failed, retrying");
            }
        }
    }
}

#[cfg(all(feature = "hardware", target_os = "linux"))]
pub fn run_turntable(
    cfg: &dropper_config::Config,
    opts: &RunOpts,
    shutdown: Arc<AtomicBool>,
) -> eyre::Result<RunReport> {
    use std::sync::atomic::Ordering;
    use std::time::{Duration, Instant};

    use dropper_core::{DropperError, build_controller};
    use dropper_hardware::{GpioInput, ServoActuator, ServoAngles, ServoPwm};

    let hw = |e: dropper_hardware::error::HwError| eyre::Report::new(DropperError::HardwareFault(e.to_string()));
    let mut light = GpioInput::new(cfg.pins.light_sensor, false).map_err(hw)?;
    let mut hall = GpioInput::new(cfg.pins.hall_sensor, false).map_err(hw)?;
    let mut trigger = GpioInput::new(cfg.pins.trigger, cfg.pins.trigger_active_low).map_err(hw)?;
    let servo = ServoActuator::new(
        cfg.pins.servo,
        ServoAngles {
            closed: cfg.servo.closed_deg,
            pre_armed: cfg.servo.pre_armed_deg,
            released: cfg.servo.released_deg,
        },
        ServoPwm {
            period: Duration::from_micros(cfg.servo.period_us),
            min_pulse: Duration::from_micros(cfg.servo.min_pulse_us),
            max_pulse: Duration::from_micros(cfg.servo.max_pulse_us),
        },
    )
    .map_err(hw)?;

    let mut controller = build_controller(servo, (&cfg.monitor).into(), None)?;
    let poll_interval = Duration::from_micros(cfg.runner.poll_interval_us);
    let started = Instant::now();
    let deadline = opts.max_run_ms.map(Duration::from_millis);
    let mut report = RunReport::default();
    let mut latencies: Vec<u64> = Vec::new();

    tracing::info!(
        light = cfg.pins.light_sensor,
        hall = cfg.pins.hall_sensor,
        servo = cfg.pins.servo,
        trigger = cfg.pins.trigger,
        "turntable run start"
    );
    loop {
        if shutdown.load(Ordering::Relaxed) {
            tracing::info!("shutdown requested");
            break;
        }
        if deadline.is_some_and(|d| started.elapsed() >= d) {
            break;
        }

        let t0 = Instant::now();
        let outcome = controller.poll_inputs(&mut light, &mut hall, &mut trigger);
        if opts.stats {
            latencies.push(t0.elapsed().as_micros() as u64);
        }
        report.record(outcome);
        if !poll_interval.is_zero() {
            std::thread::sleep(poll_interval);
        }
    }

    report.runtime_ms = started.elapsed().as_millis() as u64;
    if opts.stats {
        print_stats(&latencies);
    }
    Ok(report)
}

#[cfg(not(all(feature = "hardware", target_os = "linux")))]
pub fn run_turntable(
    _cfg: &dropper_config::Config,
    _opts: &RunOpts,
    _shutdown: Arc<AtomicBool>,
) -> eyre::Result<RunReport> {
    Err(eyre::Report::new(dropper_core::DropperError::Hardware(
        "this build has no GPIO backend; rebuild with `--features hardware` on Linux or use `simulate`"
            .to_string(),
    )))
}

/// Print poll latency stats to stderr.
#[cfg_attr(not(all(feature = "hardware", target_os = "linux")), allow(dead_code))]
fn print_stats(latencies: &[u64]) {
    if latencies.is_empty() {
        return;
    }
    let min = *latencies.iter().min().unwrap_or(&0);
    let max = *latencies.iter().max().unwrap_or(&0);
    let avg = latencies.iter().sum::<u64>() as f64 / latencies.len() as f64;
    let stdev = if latencies.len() > 1 {
        let var = latencies
            .iter()
            .map(|&x| (x as f64 - avg).powi(2))
            .sum::<f64>()
            / (latencies.len() as f64 - 1.0);
        var.sqrt()
    } else {
        0.0
    };
    eprintln!("\n--- Dropper Stats ---");
    eprintln!("Polls: {}", latencies.len());
    eprintln!("Poll latency min/avg/max/stdev (us): {min} / {avg:.1} / {max} / {stdev:.1}");
    eprintln!("---------------------\n");
}
