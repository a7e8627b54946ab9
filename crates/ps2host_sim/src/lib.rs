//! Simulation harness for the PS/2 host core: a keyboard-class device
//! model, a shared-bus testbench and a line trace recorder.

mod bench;
mod device;
pub mod trace;

pub use bench::{RxEvent, Testbench};
pub use device::{DeviceBehavior, DeviceConfig, Ps2Keyboard};
pub use trace::{BusTrace, Transition};

use ps2host_core::HostConfig;

/// System clock used for simulation runs. Slow enough to keep frame
/// lengths in the hundreds of ticks while leaving every window non-empty.
pub const SIM_SYS_CLK_HZ: u64 = 1_000_000;

/// Default host configuration at [`SIM_SYS_CLK_HZ`].
pub fn sim_host_config() -> HostConfig {
    HostConfig::builder().sys_clk_hz(SIM_SYS_CLK_HZ).build()
}
