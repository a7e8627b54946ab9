use anyhow::{bail, ensure, Result};
use ps2host_common::LineLevels;
use ps2host_core::{FrameFault, HostConfig, HostInputs, Ps2Host};

use crate::device::{DeviceConfig, Ps2Keyboard};
use crate::trace::BusTrace;

/// A byte the host reported through its `ready` pulse.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct RxEvent {
    pub byte: u8,
    pub error: bool,
    pub fault: FrameFault,
    pub tick: u64,
}

/// Host and device sharing one simulated bus.
///
/// Each tick resolves the open-drain lines from both parties' drivers and
/// then steps both with the same resolved levels. It also plays the part
/// of the register interface: one-tick `send_req` pulses in, `ready`
/// pulses latched into a log.
pub struct Testbench {
    pub host: Ps2Host,
    pub device: Ps2Keyboard,
    tick: u64,
    levels: LineLevels,
    pending_send: Option<u8>,
    pending_reset: bool,
    rx_events: Vec<RxEvent>,
    ready_while_busy: u64,
    trace: Option<BusTrace>,
}

impl Testbench {
    pub fn new(host_config: &HostConfig, device_config: DeviceConfig) -> Result<Self> {
        Ok(Self {
            host: Ps2Host::new(host_config)?,
            device: Ps2Keyboard::new(device_config),
            tick: 0,
            levels: LineLevels::IDLE,
            pending_send: None,
            pending_reset: false,
            rx_events: Vec::new(),
            ready_while_busy: 0,
            trace: None,
        })
    }

    /// Record every line change from now on.
    pub fn with_trace(mut self) -> Self {
        self.trace = Some(BusTrace::new());
        self
    }

    pub fn tick(&self) -> u64 {
        self.tick
    }

    /// Line levels resolved on the last tick.
    pub fn levels(&self) -> LineLevels {
        self.levels
    }

    pub fn trace(&self) -> Option<&BusTrace> {
        self.trace.as_ref()
    }

    pub fn rx_events(&self) -> &[RxEvent] {
        &self.rx_events
    }

    pub fn watchdog_resets(&self) -> u64 {
        self.host.watchdog_resets()
    }

    /// `ready` pulses observed while the host was busy sending.
    pub fn ready_while_busy(&self) -> u64 {
        self.ready_while_busy
    }

    /// Raise `send_req` with `byte` for the next tick.
    pub fn send(&mut self, byte: u8) -> Result<()> {
        ensure!(
            !self.host.busy() && self.pending_send.is_none(),
            "host is still sending; request for {:#04x} refused",
            byte
        );
        self.pending_send = Some(byte);
        Ok(())
    }

    /// Raise `sys_rst` for the next tick and power-cycle the device.
    pub fn reset(&mut self) {
        self.pending_reset = true;
        self.pending_send = None;
        self.device.reset();
    }

    pub fn step(&mut self) {
        let levels = LineLevels::resolve(&[self.host.drivers(), self.device.drivers()]);
        self.levels = levels;
        if let Some(trace) = self.trace.as_mut() {
            trace.record(self.tick, levels);
        }

        let send = self.pending_send.take();
        let sys_rst = std::mem::take(&mut self.pending_reset);
        self.host.step(&HostInputs {
            ps2_clk: levels.clk,
            ps2_data: levels.data,
            sys_rst,
            send_req: send.is_some(),
            tx_data: send.unwrap_or(0),
        });
        self.device.step(levels);
        self.tick += 1;

        if self.host.ready() {
            let event = RxEvent {
                byte: self.host.rx_data(),
                error: self.host.error(),
                fault: self.host.rx_fault(),
                tick: self.tick,
            };
            log::trace!("bench: {:?}", event);
            if self.host.busy() {
                self.ready_while_busy += 1;
            }
            self.rx_events.push(event);
        }
    }

    pub fn run(&mut self, ticks: u64) {
        for _ in 0..ticks {
            self.step();
        }
    }

    /// Step until `done` holds, giving up after `max_ticks`. Returns the
    /// number of ticks taken.
    pub fn run_until(&mut self, max_ticks: u64, mut done: impl FnMut(&Self) -> bool) -> Result<u64> {
        for taken in 0..max_ticks {
            if done(self) {
                return Ok(taken);
            }
            self.step();
        }
        if done(self) {
            return Ok(max_ticks);
        }
        bail!("condition not reached within {} ticks (at tick {})", max_ticks, self.tick)
    }

    /// Send `byte` and wait until the host has shifted it out.
    pub fn transmit(&mut self, byte: u8, max_ticks: u64) -> Result<u64> {
        let resets = self.watchdog_resets();
        self.send(byte)?;
        self.step();
        ensure!(self.host.busy(), "send request for {:#04x} was not taken", byte);
        let taken = self.run_until(max_ticks, |bench| !bench.host.busy())?;
        ensure!(
            self.watchdog_resets() == resets,
            "transmission of {:#04x} was abandoned by the watchdog",
            byte
        );
        Ok(taken + 1)
    }

    /// Wait for the next `ready` pulse and return it.
    pub fn receive(&mut self, max_ticks: u64) -> Result<RxEvent> {
        let seen = self.rx_events.len();
        self.run_until(max_ticks, |bench| bench.rx_events.len() > seen)?;
        Ok(self.rx_events[seen])
    }
}
