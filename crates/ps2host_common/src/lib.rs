//! Shared building blocks for the PS/2 host workspace: the open-drain line
//! model, bit-order helpers and the wire-level frame description.

pub mod bits;
pub mod frame;
pub mod line;

pub use bits::{odd_parity, reverse_bits8};
pub use frame::{WireFrame, WIRE_FRAME_BITS};
pub use line::{LineDrive, LineLevels, PinDrivers};
