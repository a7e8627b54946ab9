use std::collections::VecDeque;

use ps2host_common::{LineLevels, PinDrivers, WireFrame, WIRE_FRAME_BITS};
use typed_builder::TypedBuilder;

/// What the device does with frames the host sends it.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq)]
pub enum DeviceBehavior {
    /// Record received frames only.
    #[default]
    Quiet,
    /// Send every valid byte straight back to the host.
    Echo,
}

/// Device-side timing, in host system clock ticks.
#[derive(TypedBuilder, Debug, Clone, PartialEq, Eq)]
pub struct DeviceConfig {
    /// Half period of the clock the device generates.
    #[builder(default = 40)]
    pub half_period_ticks: u32,
    /// Ticks both lines must read high before the device starts a frame.
    #[builder(default = 50)]
    pub idle_ticks: u32,
    /// Pause between receiving a frame and queueing the answer.
    #[builder(default = 100)]
    pub response_delay_ticks: u32,
    #[builder(default)]
    pub behavior: DeviceBehavior,
}

impl Default for DeviceConfig {
    fn default() -> Self {
        DeviceConfig::builder().build()
    }
}

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
enum Phase {
    High,
    Low,
}

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
enum State {
    Idle,
    /// Host holds the clock low. `rts` latches a low data line seen while
    /// inhibited, i.e. the host wants to send.
    Inhibited { rts: bool },
    Sending {
        frame: WireFrame,
        bit: usize,
        phase: Phase,
        ticks: u32,
    },
    Receiving {
        bits: [bool; WIRE_FRAME_BITS],
        bit: usize,
        phase: Phase,
        ticks: u32,
        ack: bool,
    },
}

/// Keyboard-class PS/2 device model.
///
/// Generates the bus clock for both directions: it shifts queued frames
/// out (data changes while the clock is high, the host samples on the
/// falling edge), and clocks host frames in after the host's
/// inhibit/request-to-send sequence, sampling the data line as it pulls
/// the clock low. Stepped once per host tick with the resolved line levels.
pub struct Ps2Keyboard {
    config: DeviceConfig,
    state: State,
    outgoing: VecDeque<WireFrame>,
    received: Vec<WireFrame>,
    idle_count: u32,
    hold_off: u32,
    aborted: u64,
}

impl Ps2Keyboard {
    pub fn new(config: DeviceConfig) -> Self {
        Self {
            config,
            state: State::Idle,
            outgoing: VecDeque::new(),
            received: Vec::new(),
            idle_count: 0,
            hold_off: 0,
            aborted: 0,
        }
    }

    /// Queue a well-formed frame carrying `byte`.
    pub fn queue_byte(&mut self, byte: u8) {
        self.queue_frame(WireFrame::new(byte));
    }

    /// Queue an arbitrary, possibly malformed or truncated frame.
    pub fn queue_frame(&mut self, frame: WireFrame) {
        self.outgoing.push_back(frame);
    }

    pub fn pending(&self) -> usize {
        self.outgoing.len()
    }

    /// Frames clocked in from the host, in arrival order.
    pub fn received(&self) -> &[WireFrame] {
        &self.received
    }

    pub fn take_received(&mut self) -> Vec<WireFrame> {
        std::mem::take(&mut self.received)
    }

    /// Frames the device gave up because the host inhibited the bus.
    pub fn aborted(&self) -> u64 {
        self.aborted
    }

    pub fn is_idle(&self) -> bool {
        self.state == State::Idle
    }

    pub fn is_sending(&self) -> bool {
        matches!(self.state, State::Sending { .. })
    }

    pub fn is_receiving(&self) -> bool {
        matches!(self.state, State::Receiving { .. })
    }

    /// Back to power-on: idle, nothing queued. Frames already received stay.
    pub fn reset(&mut self) {
        self.state = State::Idle;
        self.outgoing.clear();
        self.idle_count = 0;
        self.hold_off = 0;
    }

    pub fn drivers(&self) -> PinDrivers {
        match self.state {
            State::Idle | State::Inhibited { .. } => PinDrivers::RELEASED,
            State::Sending { frame, bit, phase, .. } => {
                PinDrivers::from_levels(phase == Phase::High, frame.bit(bit))
            }
            State::Receiving { phase, ack, .. } => {
                PinDrivers::from_levels(phase == Phase::High, !ack)
            }
        }
    }

    pub fn step(&mut self, lines: LineLevels) {
        self.idle_count = if lines.is_idle() {
            self.idle_count.saturating_add(1)
        } else {
            0
        };
        self.hold_off = self.hold_off.saturating_sub(1);

        self.state = match self.state {
            State::Idle => self.step_idle(lines),
            State::Inhibited { rts } => self.step_inhibited(rts, lines),
            State::Sending {
                frame,
                bit,
                phase,
                ticks,
            } => self.step_sending(frame, bit, phase, ticks, lines),
            State::Receiving {
                bits,
                bit,
                phase,
                ticks,
                ack,
            } => self.step_receiving(bits, bit, phase, ticks, ack, lines),
        };
    }

    fn step_idle(&mut self, lines: LineLevels) -> State {
        if !lines.clk {
            log::debug!("device: host inhibit");
            return State::Inhibited { rts: !lines.data };
        }
        if self.hold_off == 0 && self.idle_count >= self.config.idle_ticks {
            if let Some(frame) = self.outgoing.pop_front() {
                log::debug!("device: sending {:#04x} ({} bits)", frame.byte(), frame.len());
                if frame.is_empty() {
                    return State::Idle;
                }
                return State::Sending {
                    frame,
                    bit: 0,
                    phase: Phase::High,
                    ticks: 0,
                };
            }
        }
        State::Idle
    }

    fn step_inhibited(&mut self, rts: bool, lines: LineLevels) -> State {
        if !lines.clk {
            return State::Inhibited {
                rts: rts || !lines.data,
            };
        }
        if rts {
            log::debug!("device: request-to-send, clocking host frame in");
            State::Receiving {
                bits: [true; WIRE_FRAME_BITS],
                bit: 0,
                phase: Phase::High,
                ticks: 0,
                ack: false,
            }
        } else {
            State::Idle
        }
    }

    fn step_sending(
        &mut self,
        frame: WireFrame,
        bit: usize,
        phase: Phase,
        ticks: u32,
        lines: LineLevels,
    ) -> State {
        let half = self.config.half_period_ticks;
        match phase {
            Phase::High => {
                if !lines.clk {
                    // The host pulled the clock low under us; it wins.
                    log::debug!("device: inhibited at bit {}, requeueing {:#04x}", bit, frame.byte());
                    self.aborted += 1;
                    self.outgoing.push_front(frame);
                    // Our own data drive is still on the line this tick.
                    return State::Inhibited { rts: false };
                }
                if ticks + 1 >= half {
                    State::Sending {
                        frame,
                        bit,
                        phase: Phase::Low,
                        ticks: 0,
                    }
                } else {
                    State::Sending {
                        frame,
                        bit,
                        phase,
                        ticks: ticks + 1,
                    }
                }
            }
            Phase::Low => {
                if ticks + 1 < half {
                    return State::Sending {
                        frame,
                        bit,
                        phase,
                        ticks: ticks + 1,
                    };
                }
                log::trace!("device: sent bit {} = {}", bit, frame.bit(bit) as u8);
                if bit + 1 >= frame.len() {
                    if !frame.is_complete() {
                        log::debug!("device: stalled after {} bits", frame.len());
                    }
                    State::Idle
                } else {
                    State::Sending {
                        frame,
                        bit: bit + 1,
                        phase: Phase::High,
                        ticks: 0,
                    }
                }
            }
        }
    }

    fn step_receiving(
        &mut self,
        mut bits: [bool; WIRE_FRAME_BITS],
        bit: usize,
        phase: Phase,
        ticks: u32,
        mut ack: bool,
        lines: LineLevels,
    ) -> State {
        let half = self.config.half_period_ticks;
        match phase {
            Phase::High => {
                let phase = if ticks + 1 >= half { Phase::Low } else { Phase::High };
                let ticks = if phase == Phase::Low { 0 } else { ticks + 1 };
                State::Receiving {
                    bits,
                    bit,
                    phase,
                    ticks,
                    ack,
                }
            }
            Phase::Low => {
                if ticks == 0 {
                    bits[bit] = lines.data;
                    log::trace!("device: received bit {} = {}", bit, lines.data as u8);
                    // Acknowledge during the stop bit's clock pulse.
                    ack = bit + 1 == WIRE_FRAME_BITS;
                }
                if ticks + 1 < half {
                    return State::Receiving {
                        bits,
                        bit,
                        phase,
                        ticks: ticks + 1,
                        ack,
                    };
                }
                if bit + 1 < WIRE_FRAME_BITS {
                    return State::Receiving {
                        bits,
                        bit: bit + 1,
                        phase: Phase::High,
                        ticks: 0,
                        ack,
                    };
                }
                self.finish_receive(WireFrame::from_bits(bits));
                State::Idle
            }
        }
    }

    fn finish_receive(&mut self, frame: WireFrame) {
        if frame.is_valid() {
            log::debug!("device: received {:#04x}", frame.byte());
        } else {
            log::warn!("device: received malformed frame {:?}", frame);
        }
        self.received.push(frame);

        if self.config.behavior == DeviceBehavior::Echo && frame.is_valid() {
            self.hold_off = self.config.response_delay_ticks;
            self.outgoing.push_back(WireFrame::new(frame.byte()));
        }
    }
}
