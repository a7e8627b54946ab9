use super::frame::{decode_rx_frame, FrameFault, FRAME_MASK, RX_COMPLETE, RX_SENTINEL};

/// Bit-serial receiver.
///
/// Shifts one data-line sample into the frame per falling clock edge. When
/// the sentinel reaches bit 11 the frame is decoded, `ready` is raised for
/// the following tick and the frame is cleared back to the sentinel.
pub struct Receiver {
    frame: u16,
    ready: bool,
    data: u8,
    fault: FrameFault,
}

impl Default for Receiver {
    fn default() -> Self {
        Self::new()
    }
}

impl Receiver {
    pub fn new() -> Self {
        Self {
            frame: RX_SENTINEL,
            ready: false,
            data: 0,
            fault: FrameFault::empty(),
        }
    }

    #[inline]
    pub fn frame(&self) -> u16 {
        self.frame
    }

    #[inline]
    pub fn ready(&self) -> bool {
        self.ready
    }

    /// Last decoded byte.
    #[inline]
    pub fn data(&self) -> u8 {
        self.data
    }

    /// Framing/parity failure of the last decoded frame.
    #[inline]
    pub fn error(&self) -> bool {
        !self.fault.is_empty()
    }

    #[inline]
    pub fn fault(&self) -> FrameFault {
        self.fault
    }

    /// Advance one tick.
    ///
    /// `reset` is the global reset and also clears the decoded outputs.
    /// `abort` drops the frame in progress (watchdog expiry, or the host
    /// owning the bus for a transmission) but keeps the last decoded byte.
    pub fn step(&mut self, reset: bool, abort: bool, falling: bool, data: bool) {
        let complete = self.frame & RX_COMPLETE != 0;
        let accept = complete && !reset && !abort;

        if reset {
            self.data = 0;
            self.fault = FrameFault::empty();
        } else if accept {
            let (byte, fault) = decode_rx_frame(self.frame);
            if fault.is_empty() {
                log::debug!("rx frame {:03X}: byte {:#04x}", self.frame, byte);
            } else {
                log::debug!(
                    "rx frame {:03X}: byte {:#04x} rejected ({:?})",
                    self.frame,
                    byte,
                    fault
                );
            }
            self.data = byte;
            self.fault = fault;
        }
        self.ready = accept;

        self.frame = if reset || abort || complete {
            RX_SENTINEL
        } else if falling {
            log::trace!("rx shift {}", data as u8);
            ((self.frame << 1) | data as u16) & FRAME_MASK
        } else {
            self.frame
        };
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ps2host_common::WireFrame;

    /// Clock a wire frame in, one falling edge per bit with idle ticks in
    /// between, and return the tick-by-tick ready pulses.
    fn clock_in(rx: &mut Receiver, frame: WireFrame) -> usize {
        let mut pulses = 0;
        for i in 0..frame.len() {
            rx.step(false, false, true, frame.bit(i));
            pulses += rx.ready() as usize;
            for _ in 0..3 {
                rx.step(false, false, false, true);
                pulses += rx.ready() as usize;
            }
        }
        pulses
    }

    #[test]
    fn receives_byte_with_single_ready_pulse() {
        let mut rx = Receiver::new();
        let pulses = clock_in(&mut rx, WireFrame::new(0x41));
        assert_eq!(pulses, 1);
        assert_eq!(rx.data(), 0x41);
        assert!(!rx.error());
        assert_eq!(rx.frame(), RX_SENTINEL);
    }

    #[test]
    fn ready_follows_completion_by_one_tick() {
        let mut rx = Receiver::new();
        let frame = WireFrame::new(0xA5);
        for i in 0..frame.len() {
            rx.step(false, false, true, frame.bit(i));
        }
        assert_ne!(rx.frame() & RX_COMPLETE, 0);
        assert!(!rx.ready());
        rx.step(false, false, false, true);
        assert!(rx.ready());
        assert_eq!(rx.data(), 0xA5);
        assert_eq!(rx.frame(), RX_SENTINEL);
        rx.step(false, false, false, true);
        assert!(!rx.ready());
    }

    #[test]
    fn outputs_hold_between_frames() {
        let mut rx = Receiver::new();
        clock_in(&mut rx, WireFrame::new(0x5A).with_parity_flipped());
        assert_eq!(rx.data(), 0x5A);
        assert!(rx.error());
        assert_eq!(rx.fault(), FrameFault::BAD_PARITY);

        for _ in 0..20 {
            rx.step(false, false, false, true);
        }
        assert_eq!(rx.data(), 0x5A);
        assert!(rx.error());

        // An abort drops the partial frame but keeps the decoded outputs.
        clock_in(&mut rx, WireFrame::new(0x11).truncated(4));
        rx.step(false, true, false, true);
        assert_eq!(rx.frame(), RX_SENTINEL);
        assert_eq!(rx.data(), 0x5A);

        rx.step(true, false, false, true);
        assert_eq!(rx.data(), 0);
        assert!(!rx.error());
    }

    #[test]
    fn abort_on_completion_tick_drops_frame() {
        let mut rx = Receiver::new();
        let frame = WireFrame::new(0x33);
        for i in 0..frame.len() {
            rx.step(false, false, true, frame.bit(i));
        }
        rx.step(false, true, false, true);
        assert!(!rx.ready());
        assert_eq!(rx.data(), 0);
        assert_eq!(rx.frame(), RX_SENTINEL);
    }
}
