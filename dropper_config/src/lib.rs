#![cfg_attr(all(not(debug_assertions), not(test)), deny(warnings))]
#![cfg_attr(
    all(not(debug_assertions), not(test)),
    deny(clippy::all, clippy::pedantic, clippy::nursery)
)]
#![allow(clippy::module_name_repetitions, clippy::missing_errors_doc)]
//! Config schema for the dropper.
//!
//! `Config` and sub-structs are deserialized from TOML and validated. The
//! release timing constants are fixed in `dropper_core::timing` and are not
//! configurable here; this file describes the deployment (pins, sensor
//! layout, servo, logging) and the simulation scenario.
use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub struct Pins {
    /// Light barrier on the turntable rim (several cycles per round).
    pub light_sensor: u8,
    /// Hall sensor marking the hole position (one cycle per round).
    pub hall_sensor: u8,
    pub servo: u8,
    pub trigger: u8,
    /// Trigger reads low when pressed.
    #[serde(default)]
    pub trigger_active_low: bool,
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct MonitorCfg {
    /// Multiplier from one measured light cycle (or half cycle) to a round.
    pub light_factor: u32,
    pub light_half_cycles: bool,
    pub hall_factor: u32,
    pub hall_half_cycles: bool,
}

impl Default for MonitorCfg {
    fn default() -> Self {
        Self {
            light_factor: 12,
            light_half_cycles: true,
            hall_factor: 1,
            hall_half_cycles: false,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct ServoCfg {
    pub closed_deg: u16,
    pub pre_armed_deg: u16,
    pub released_deg: u16,
    pub period_us: u64,
    pub min_pulse_us: u64,
    pub max_pulse_us: u64,
}

impl Default for ServoCfg {
    fn default() -> Self {
        Self {
            closed_deg: 0,
            pre_armed_deg: 17,
            released_deg: 30,
            period_us: 20_000,
            min_pulse_us: 544,
            max_pulse_us: 2_400,
        }
    }
}

#[derive(Debug, Deserialize, Default)]
#[serde(default)]
pub struct RunnerCfg {
    /// Sleep between polls in microseconds; 0 busy-polls for the lowest jitter.
    pub poll_interval_us: u64,
}

#[derive(Debug, Deserialize, Default)]
#[serde(default)]
pub struct Logging {
    pub file: Option<String>,  // path to .log (JSON lines)
    pub level: Option<String>, // "info","debug"
    /// Log rotation policy: "never" | "daily" | "hourly" (default: never)
    pub rotation: Option<String>,
}

#[derive(Debug, Deserialize, Clone, Copy)]
pub struct DisturbanceCfg {
    /// Simulation time at which the speed changes.
    pub at_ms: u64,
    /// Multiplier applied to the round period (> 1 brakes).
    pub factor: f64,
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct SimulationCfg {
    pub initial_period_us: u64,
    pub duration_ms: u64,
    pub trigger_at_ms: u64,
    pub trigger_hold_ms: u64,
    /// Simulated host loop interval.
    pub tick_us: u64,
    pub disturbance: Option<DisturbanceCfg>,
}

impl Default for SimulationCfg {
    fn default() -> Self {
        Self {
            initial_period_us: 600_000,
            duration_ms: 10_000,
            trigger_at_ms: 3_000,
            trigger_hold_ms: 50,
            tick_us: 100,
            disturbance: None,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct Config {
    pub pins: Pins,
    #[serde(default)]
    pub monitor: MonitorCfg,
    #[serde(default)]
    pub servo: ServoCfg,
    #[serde(default)]
    pub runner: RunnerCfg,
    #[serde(default)]
    pub logging: Logging,
    #[serde(default)]
    pub simulation: SimulationCfg,
}

pub fn load_toml(s: &str) -> Result<Config, toml::de::Error> {
    toml::from_str::<Config>(s)
}

/// Read, parse and validate a config file.
pub fn load_file(path: &std::path::Path) -> eyre::Result<Config> {
    let text = std::fs::read_to_string(path)
        .map_err(|e| eyre::eyre!("failed to read config {}: {e}", path.display()))?;
    let cfg = load_toml(&text).map_err(|e| eyre::eyre!("invalid configuration: {e}"))?;
    cfg.validate()?;
    Ok(cfg)
}

/// Longest rotation period the release calculation accepts (8 s).
const MAX_PERIOD_US: u64 = 8_000_000;

impl Config {
    pub fn validate(&self) -> eyre::Result<()> {
        // Pins
        let pins = [
            self.pins.light_sensor,
            self.pins.hall_sensor,
            self.pins.servo,
            self.pins.trigger,
        ];
        for (i, a) in pins.iter().enumerate() {
            if pins[i + 1..].contains(a) {
                eyre::bail!("pins must be distinct (pin {a} used twice)");
            }
        }

        // Monitor
        if self.monitor.light_factor == 0 {
            eyre::bail!("monitor.light_factor must be > 0");
        }
        if self.monitor.hall_factor == 0 {
            eyre::bail!("monitor.hall_factor must be > 0");
        }

        // Servo
        let s = &self.servo;
        if s.closed_deg > 180 || s.pre_armed_deg > 180 || s.released_deg > 180 {
            eyre::bail!("servo angles must be in 0..=180");
        }
        if !(s.closed_deg < s.pre_armed_deg && s.pre_armed_deg < s.released_deg) {
            eyre::bail!("servo angles must satisfy closed_deg < pre_armed_deg < released_deg");
        }
        if s.min_pulse_us >= s.max_pulse_us {
            eyre::bail!("servo.min_pulse_us must be < servo.max_pulse_us");
        }
        if s.period_us <= s.max_pulse_us {
            eyre::bail!("servo.period_us must exceed servo.max_pulse_us");
        }

        // Runner
        if self.runner.poll_interval_us > 10_000 {
            eyre::bail!("runner.poll_interval_us is unreasonably large (>10ms)");
        }

        // Logging
        if let Some(rot) = self.logging.rotation.as_deref()
            && !matches!(rot, "never" | "daily" | "hourly")
        {
            eyre::bail!("logging.rotation must be one of never|daily|hourly");
        }
        if let Some(level) = self.logging.level.as_deref()
            && !matches!(
                level.to_ascii_lowercase().as_str(),
                "error" | "warn" | "info" | "debug" | "trace"
            )
        {
            eyre::bail!("logging.level must be one of error|warn|info|debug|trace");
        }

        // Simulation
        let sim = &self.simulation;
        if sim.initial_period_us == 0 || sim.initial_period_us > MAX_PERIOD_US {
            eyre::bail!("simulation.initial_period_us must be in (0, 8000000]");
        }
        if sim.tick_us == 0 || sim.tick_us > 10_000 {
            eyre::bail!("simulation.tick_us must be in [1, 10000]");
        }
        if sim.duration_ms == 0 {
            eyre::bail!("simulation.duration_ms must be > 0");
        }
        if sim.trigger_hold_ms == 0 {
            eyre::bail!("simulation.trigger_hold_ms must be > 0");
        }
        if let Some(d) = sim.disturbance
            && !(d.factor.is_finite() && d.factor > 0.0)
        {
            eyre::bail!("simulation.disturbance.factor must be finite and > 0");
        }
        Ok(())
    }
}
