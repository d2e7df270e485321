//! Human-readable error descriptions, exit codes and structured JSON errors.

use dropper_core::error::{BuildError, DropperError};

/// Map an eyre::Report to a human-readable explanation with likely causes and fix hints.
pub fn humanize(err: &eyre::Report) -> String {
    // Typed matches first
    if let Some(be) = err.downcast_ref::<BuildError>() {
        return match be {
            BuildError::MissingActuator => {
                "What happened: No actuator was provided to the drop controller.\nLikely causes: The servo failed to initialize or was not wired into the builder.\nHow to fix: Ensure the servo is created successfully and passed via with_actuator(...).".to_string()
            }
            BuildError::InvalidConfig(msg) => format!(
                "What happened: Invalid configuration ({msg}).\nLikely causes: Missing or out-of-range values in the TOML.\nHow to fix: Edit the config file, then rerun."
            ),
        };
    }

    if let Some(de) = err.downcast_ref::<DropperError>() {
        return match de {
            DropperError::Config(msg) => format!(
                "What happened: Configuration is invalid or unreadable ({msg}).\nLikely causes: Wrong --config path, a missing [pins] table, or out-of-range values.\nHow to fix: Edit the TOML config (see etc/dropper.toml) and try again."
            ),
            DropperError::HardwareFault(msg) => format!(
                "What happened: Hardware fault ({msg}).\nLikely causes: Wrong pin numbers, PWM not available on the servo pin, or missing GPIO permissions.\nHow to fix: Check [pins] in the config and that the process may access /dev/gpiomem."
            ),
            DropperError::Hardware(msg) => format!(
                "What happened: Hardware error ({msg}).\nLikely causes: Servo or sensor not connected, or no GPIO backend in this build.\nHow to fix: Check wiring, or use `dropper simulate` without hardware."
            ),
            DropperError::State(msg) => format!(
                "What happened: {msg}.\nLikely causes: See logs.\nHow to fix: Re-run with --log-level=debug or set RUST_LOG for more detail."
            ),
        };
    }

    // Generic fallback
    let msg = err.to_string();
    let mut cause = String::new();
    if let Some(src) = err.source() {
        cause = format!(" Cause: {src}");
    }
    format!(
        "Something went wrong.{cause}\nHow to fix: Re-run with --log-level=debug for details. Original: {msg}"
    )
}

/// Stable exit codes: configuration 2, hardware 3, anything else 1.
pub fn exit_code_for_error(err: &eyre::Report) -> i32 {
    if matches!(err.downcast_ref::<BuildError>(), Some(BuildError::InvalidConfig(_))) {
        return 2;
    }
    match err.downcast_ref::<DropperError>() {
        Some(DropperError::Config(_)) => 2,
        Some(DropperError::Hardware(_) | DropperError::HardwareFault(_)) => 3,
        _ => 1,
    }
}

fn reason_name(err: &eyre::Report) -> &'static str {
    if let Some(be) = err.downcast_ref::<BuildError>() {
        return match be {
            BuildError::MissingActuator => "MissingActuator",
            BuildError::InvalidConfig(_) => "Config",
        };
    }
    match err.downcast_ref::<DropperError>() {
        Some(DropperError::Config(_)) => "Config",
        Some(DropperError::Hardware(_)) => "Hardware",
        Some(DropperError::HardwareFault(_)) => "HardwareFault",
        Some(DropperError::State(_)) => "State",
        None => "Error",
    }
}

/// Structured JSON for errors when --json is enabled.
pub fn format_error_json(err: &eyre::Report) -> String {
    serde_json::json!({
        "reason": reason_name(err),
        "exit_code": exit_code_for_error(err),
        "message": humanize(err),
    })
    .to_string()
}
