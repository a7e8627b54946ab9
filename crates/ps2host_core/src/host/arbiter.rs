use ps2host_common::{LineDrive, PinDrivers};

/// Per-tick line intents of the host's internal blocks, as logical levels
/// (`false` = wants the line low).
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct LineIntents {
    pub ctrl_clk: bool,
    pub ctrl_data: bool,
    pub tx_data: bool,
}

/// Combine the intents into the host's open-drain pin drivers.
///
/// Data is pulled low if either the request-to-send controller or the
/// transmitter wants it low; the clock belongs to the controller alone.
pub fn arbitrate(intents: LineIntents) -> PinDrivers {
    PinDrivers {
        clk: LineDrive::from_level(intents.ctrl_clk),
        data: LineDrive::from_level(intents.ctrl_data && intents.tx_data),
    }
}
