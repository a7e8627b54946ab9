//! Cycle-level model of a PS/2 host controller.
//!
//! The host is split into the same small clocked blocks as the gateware it
//! models: an edge detector with the request-to-send controller, a clock
//! watchdog, a receiver, a transmitter and the open-drain bus arbiter. Each
//! block owns its registers and is advanced once per system clock tick by
//! [`Ps2Host::step`].

pub mod config;
pub mod host;

pub use config::{HostConfig, HostTiming};
pub use host::{FrameFault, HostInputs, HostStatus, Ps2Host};
