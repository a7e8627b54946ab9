mod arbiter;
mod clock_ctrl;
mod frame;
mod ps2_host;
mod receiver;
mod transmitter;
mod watchdog;

pub use arbiter::{arbitrate, LineIntents};
pub use clock_ctrl::{ClockControl, ClockEdges};
pub use frame::{decode_rx_frame, encode_tx_frame, FrameFault, RX_SENTINEL};
pub use ps2_host::{HostInputs, HostStatus, Ps2Host};
pub use receiver::Receiver;
pub use transmitter::Transmitter;
pub use watchdog::Watchdog;
