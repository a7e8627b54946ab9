use anyhow::Result;
use bitflags::bitflags;
use ps2host_common::PinDrivers;

use super::arbiter::{arbitrate, LineIntents};
use super::clock_ctrl::{ClockControl, ClockEdges};
use super::frame::FrameFault;
use super::receiver::Receiver;
use super::transmitter::Transmitter;
use super::watchdog::Watchdog;
use crate::config::{HostConfig, HostTiming};

bitflags! {
    /// Aggregate status outputs of the host.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct HostStatus: u8 {
        const BUSY  = 1 << 0;
        const READY = 1 << 1;
        const ERROR = 1 << 2;
    }
}

/// Everything the host samples during one tick.
///
/// `ps2_clk` and `ps2_data` are the resolved physical line levels, i.e. the
/// wired-AND of the host's own drivers and every other party on the bus.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct HostInputs {
    pub ps2_clk: bool,
    pub ps2_data: bool,
    pub sys_rst: bool,
    pub send_req: bool,
    pub tx_data: u8,
}

impl Default for HostInputs {
    fn default() -> Self {
        Self {
            ps2_clk: true,
            ps2_data: true,
            sys_rst: false,
            send_req: false,
            tx_data: 0,
        }
    }
}

/// PS/2 host controller core.
///
/// All blocks are registered: outputs read during a tick come from the
/// register values left by the previous `step`, and `step` updates every
/// block at once from those same values, so the order in which the blocks
/// are stepped does not matter.
pub struct Ps2Host {
    timing: HostTiming,
    clock_ctrl: ClockControl,
    watchdog: Watchdog,
    rx: Receiver,
    tx: Transmitter,
    watchdog_resets: u64,
}

impl Ps2Host {
    pub fn new(config: &HostConfig) -> Result<Self> {
        let timing = config.timing()?;
        log::debug!(
            "ps2 host at {} Hz: inhibit {} ticks, request-to-send {} ticks, watchdog {} ticks",
            config.sys_clk_hz,
            timing.inhibit_ticks,
            timing.request_to_send_ticks,
            timing.watchdog_ticks
        );
        Ok(Self::with_timing(timing))
    }

    pub fn with_timing(timing: HostTiming) -> Self {
        Self {
            timing,
            clock_ctrl: ClockControl::new(&timing),
            watchdog: Watchdog::new(timing.watchdog_ticks),
            rx: Receiver::new(),
            tx: Transmitter::new(),
            watchdog_resets: 0,
        }
    }

    /// Return to the power-on state.
    pub fn reset(&mut self) {
        *self = Self::with_timing(self.timing);
    }

    pub fn timing(&self) -> &HostTiming {
        &self.timing
    }

    /// Open-drain drivers for both lines this tick.
    pub fn drivers(&self) -> PinDrivers {
        arbitrate(LineIntents {
            ctrl_clk: self.clock_ctrl.clock_out(),
            ctrl_data: self.clock_ctrl.data_out(),
            tx_data: self.tx.data_out(),
        })
    }

    pub fn edges(&self) -> ClockEdges {
        self.clock_ctrl.edges()
    }

    /// One-tick watchdog reset pulse.
    pub fn watchdog_reset(&self) -> bool {
        self.watchdog.fired()
    }

    /// Number of watchdog pulses seen since construction or reset.
    pub fn watchdog_resets(&self) -> u64 {
        self.watchdog_resets
    }

    pub fn busy(&self) -> bool {
        self.tx.busy()
    }

    pub fn ready(&self) -> bool {
        self.rx.ready()
    }

    pub fn rx_data(&self) -> u8 {
        self.rx.data()
    }

    pub fn error(&self) -> bool {
        self.rx.error()
    }

    pub fn rx_fault(&self) -> FrameFault {
        self.rx.fault()
    }

    pub fn status(&self) -> HostStatus {
        let mut status = HostStatus::empty();
        status.set(HostStatus::BUSY, self.busy());
        status.set(HostStatus::READY, self.ready());
        status.set(HostStatus::ERROR, self.error());
        status
    }

    pub fn clock_ctrl(&self) -> &ClockControl {
        &self.clock_ctrl
    }

    pub fn watchdog(&self) -> &Watchdog {
        &self.watchdog
    }

    pub fn receiver(&self) -> &Receiver {
        &self.rx
    }

    pub fn transmitter(&self) -> &Transmitter {
        &self.tx
    }

    /// Advance the whole core by one system clock tick.
    pub fn step(&mut self, inputs: &HostInputs) {
        let edges = self.clock_ctrl.edges();
        let watchdog_rst = self.watchdog.fired();
        let sys_rst = inputs.sys_rst;

        if watchdog_rst && !sys_rst {
            self.watchdog_resets += 1;
            log::debug!(
                "watchdog expired after {} idle ticks, dropping rx frame {:03X} / tx frame {:03X}",
                self.watchdog.timeout_ticks(),
                self.rx.frame(),
                self.tx.frame()
            );
        }

        let rx_abort = watchdog_rst || self.tx.claims_bus(inputs.send_req);
        let tx_rst = sys_rst || watchdog_rst;
        // Edges are reported a tick late, so a device edge sampled on the
        // load tick would otherwise shift the fresh frame. Only edges seen
        // while the host has the clock released count.
        let tx_shift = edges.rising && self.clock_ctrl.clock_out();

        self.clock_ctrl.step(sys_rst, inputs.ps2_clk, inputs.send_req);
        self.watchdog.step(sys_rst, edges.any());
        self.rx.step(sys_rst, rx_abort, edges.falling, inputs.ps2_data);
        self.tx
            .step(tx_rst, tx_shift, inputs.send_req, inputs.tx_data);

        if sys_rst {
            self.watchdog_resets = 0;
        }
    }
}
