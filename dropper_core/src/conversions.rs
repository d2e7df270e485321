//! `From` implementations bridging `dropper_config` types to `dropper_core` types.

use crate::config::MonitorCfg;

impl From<&dropper_config::MonitorCfg> for MonitorCfg {
    fn from(c: &dropper_config::MonitorCfg) -> Self {
        Self {
            light_factor: c.light_factor,
            light_half_cycles: c.light_half_cycles,
            hall_factor: c.hall_factor,
            hall_half_cycles: c.hall_half_cycles,
        }
    }
}
