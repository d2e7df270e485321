use dropper_config::{load_file, load_toml};
use rstest::rstest;

const BASE: &str = r#"
[pins]
light_sensor = 2
hall_sensor = 3
servo = 9
trigger = 4
"#;

fn with(extra: &str) -> String {
    format!("{BASE}\n{extra}")
}

#[test]
fn minimal_config_uses_defaults() {
    let cfg = load_toml(BASE).expect("parse TOML");
    cfg.validate().expect("defaults should be valid");
    assert_eq!(cfg.monitor.light_factor, 12);
    assert!(cfg.monitor.light_half_cycles);
    assert_eq!(cfg.servo.pre_armed_deg, 17);
    assert_eq!(cfg.runner.poll_interval_us, 0);
    assert!(cfg.simulation.disturbance.is_none());
}

#[test]
fn missing_pins_is_a_parse_error() {
    assert!(load_toml("[monitor]\nlight_factor = 12\n").is_err());
}

#[rstest]
#[case("[monitor]\nlight_factor = 0", "light_factor must be > 0")]
#[case("[monitor]\nhall_factor = 0", "hall_factor must be > 0")]
#[case("[servo]\nreleased_deg = 200", "0..=180")]
#[case("[servo]\npre_armed_deg = 40", "closed_deg < pre_armed_deg < released_deg")]
#[case("[servo]\nmin_pulse_us = 3000", "min_pulse_us must be <")]
#[case("[servo]\nperiod_us = 2000", "period_us must exceed")]
#[case("[runner]\npoll_interval_us = 50000", "unreasonably large")]
#[case("[logging]\nrotation = \"weekly\"", "never|daily|hourly")]
#[case("[logging]\nlevel = \"loud\"", "error|warn|info|debug|trace")]
#[case("[simulation]\ninitial_period_us = 9000000", "initial_period_us")]
#[case("[simulation]\ntick_us = 0", "tick_us")]
#[case("[simulation]\nduration_ms = 0", "duration_ms")]
#[case("[simulation]\ntrigger_hold_ms = 0", "trigger_hold_ms")]
#[case("[simulation.disturbance]\nat_ms = 100\nfactor = -1.0", "disturbance.factor")]
fn rejects_invalid_values(#[case] extra: &str, #[case] needle: &str) {
    let cfg = load_toml(&with(extra)).expect("parse TOML");
    let err = cfg.validate().expect_err("should be rejected");
    assert!(
        format!("{err}").contains(needle),
        "error `{err}` does not mention `{needle}`"
    );
}

#[test]
fn duplicate_pins_are_rejected() {
    let toml = r#"
[pins]
light_sensor = 2
hall_sensor = 2
servo = 9
trigger = 4
"#;
    let err = load_toml(toml).unwrap().validate().unwrap_err();
    assert!(err.to_string().contains("distinct"));
}

#[test]
fn disturbance_table_parses() {
    let cfg = load_toml(&with("[simulation.disturbance]\nat_ms = 4000\nfactor = 1.1"))
        .expect("parse TOML");
    cfg.validate().expect("valid");
    let d = cfg.simulation.disturbance.expect("disturbance present");
    assert_eq!(d.at_ms, 4_000);
    assert!((d.factor - 1.1).abs() < 1e-12);
}

#[test]
fn load_file_reads_and_validates() {
    let dir = tempfile::tempdir().unwrap();
    let good = dir.path().join("good.toml");
    std::fs::write(&good, BASE).unwrap();
    assert!(load_file(&good).is_ok());

    let bad = dir.path().join("bad.toml");
    std::fs::write(&bad, with("[monitor]\nhall_factor = 0")).unwrap();
    assert!(load_file(&bad).is_err());

    let missing = dir.path().join("missing.toml");
    let err = load_file(&missing).unwrap_err();
    assert!(err.to_string().contains("failed to read config"));
}
