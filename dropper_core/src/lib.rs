#![cfg_attr(all(not(debug_assertions), not(test)), deny(warnings))]
#![cfg_attr(
    all(not(debug_assertions), not(test)),
    deny(clippy::all, clippy::pedantic, clippy::nursery)
)]
#![allow(
    clippy::module_name_repetitions,
    clippy::missing_errors_doc,
    clippy::cast_possible_truncation,
    clippy::cast_possible_wrap,
    clippy::cast_precision_loss,
    clippy::cast_sign_loss
)]
#![cfg_attr(not(test), deny(clippy::unwrap_used, clippy::expect_used))]
//! Release timing core (hardware-agnostic).
//!
//! Drops an object through a hole in a coasting turntable. All hardware
//! interactions go through the `dropper_traits::Actuator`,
//! `dropper_traits::DigitalInput` and `dropper_traits::Clock` traits.
//!
//! ## Architecture
//!
//! - **Edges**: rising-edge detection on sampled signals (`edge`)
//! - **Measurement**: sensor transition timing to round periods (`monitor`)
//! - **Prediction**: regression-based next-period extrapolation (`extrapolator`)
//! - **Timing**: wait-before-release calculation (`release_time`)
//! - **Gating**: speed-change cool-down (`stability`)
//! - **Sequencing**: actuator state machine (`sequencer`)
//! - **Wiring**: one-call host loop iteration (`controller`, `builder`)
//!
//! All times are microseconds; the sequencer measures them from its own
//! monotonic epoch.

pub mod builder;
pub mod config;
pub mod controller;
pub mod conversions;
pub mod edge;
pub mod error;
pub mod extrapolator;
pub mod hw_error;
pub mod mocks;
pub mod monitor;
pub mod release_time;
pub mod sequencer;
pub mod stability;
pub mod timing;

pub use builder::{DropControllerBuilder, DynDropController, build_controller};
pub use config::MonitorCfg;
pub use controller::DropController;
pub use edge::EdgeTrigger;
pub use error::{BuildError, DropperError, NotComputable};
pub use extrapolator::{RotationPeriodExtrapolator, next_period};
pub use monitor::{PeriodMonitor, PeriodSource, RoundSnapshot};
pub use release_time::{ReleaseTimeCalculator, ReleaseWait};
pub use sequencer::{ReleaseSequencer, Stage, TickStatus};
pub use stability::{InhibitionSource, StabilityGate};
