use crate::config::HostTiming;

/// Sample history value after reset: both samples high, as on an idle bus.
const IDLE_SAMPLES: u8 = 0b11;

/// Clock transitions observed during the current tick.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq)]
pub struct ClockEdges {
    pub rising: bool,
    pub falling: bool,
}

impl ClockEdges {
    #[inline]
    pub fn any(&self) -> bool {
        self.rising || self.falling
    }
}

/// Edge detector and request-to-send controller.
///
/// Oversamples the PS/2 clock line into a two-entry history to report
/// rising/falling transitions, and runs the inhibit timer that claims the
/// bus before the host sends: the clock line is held low for the whole
/// inhibit window and the data line is pulled low during the last
/// `request_to_send_ticks` of it.
pub struct ClockControl {
    /// Bit 0 is the latest clock sample, bit 1 the one before.
    samples: u8,
    /// Counts down from `inhibit_ticks`; zero means the bus is not claimed.
    inhibit_timer: u32,
    inhibit_ticks: u32,
    request_to_send_ticks: u32,
}

impl ClockControl {
    pub fn new(timing: &HostTiming) -> Self {
        Self {
            samples: IDLE_SAMPLES,
            inhibit_timer: 0,
            inhibit_ticks: timing.inhibit_ticks,
            request_to_send_ticks: timing.request_to_send_ticks,
        }
    }

    pub fn edges(&self) -> ClockEdges {
        let previous = self.samples & 0b10 != 0;
        let current = self.samples & 0b01 != 0;
        ClockEdges {
            rising: !previous && current,
            falling: previous && !current,
        }
    }

    #[inline]
    pub fn inhibit_timer(&self) -> u32 {
        self.inhibit_timer
    }

    /// Level the controller wants on the data line. Low only inside the
    /// request-to-send tail of the inhibit window.
    pub fn data_out(&self) -> bool {
        !(self.inhibit_timer > 0 && self.inhibit_timer < self.request_to_send_ticks)
    }

    /// Level the controller wants on the clock line. Low for as long as the
    /// inhibit timer runs.
    pub fn clock_out(&self) -> bool {
        self.inhibit_timer == 0
    }

    pub fn step(&mut self, reset: bool, clk: bool, send_req: bool) {
        self.samples = if reset {
            IDLE_SAMPLES
        } else {
            ((self.samples << 1) | clk as u8) & 0b11
        };

        let idle = self.inhibit_timer == 0;
        self.inhibit_timer = if reset || (idle && !send_req) {
            0
        } else if idle {
            log::trace!("inhibit window started ({} ticks)", self.inhibit_ticks);
            self.inhibit_ticks
        } else {
            self.inhibit_timer - 1
        };
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn timing() -> HostTiming {
        HostTiming {
            inhibit_ticks: 10,
            request_to_send_ticks: 3,
            watchdog_ticks: 50,
        }
    }

    #[test]
    fn steady_levels_never_produce_edges() {
        let mut ctrl = ClockControl::new(&timing());
        let mut falling = 0;
        for level in [true, true, true, false, false, false] {
            ctrl.step(false, level, false);
            let edges = ctrl.edges();
            assert!(!edges.rising);
            if edges.falling {
                falling += 1;
            }
        }
        assert_eq!(falling, 1);
        ctrl.step(false, false, false);
        assert_eq!(ctrl.edges(), ClockEdges::default());
    }

    #[test]
    fn single_rising_pulse_per_transition() {
        let mut ctrl = ClockControl::new(&timing());
        ctrl.step(false, false, false);
        assert!(ctrl.edges().falling);
        ctrl.step(false, false, false);
        assert!(!ctrl.edges().any());

        let mut rising = 0;
        for _ in 0..5 {
            ctrl.step(false, true, false);
            if ctrl.edges().rising {
                rising += 1;
            }
            assert!(!ctrl.edges().falling);
        }
        assert_eq!(rising, 1);
    }

    #[test]
    fn reset_forces_idle_history() {
        let mut ctrl = ClockControl::new(&timing());
        ctrl.step(false, false, false);
        ctrl.step(false, false, false);
        ctrl.step(true, false, false);
        assert!(!ctrl.edges().any());
        // A low sample right after reset reads as a falling edge, never a
        // spurious rising one.
        ctrl.step(false, false, false);
        assert!(ctrl.edges().falling);
    }

    #[test]
    fn inhibit_window_then_release() {
        let t = timing();
        let mut ctrl = ClockControl::new(&t);
        assert!(ctrl.clock_out());
        assert!(ctrl.data_out());

        ctrl.step(false, true, true);
        assert_eq!(ctrl.inhibit_timer(), t.inhibit_ticks);

        let mut clock_low_ticks = 0;
        let mut data_low_ticks = 0;
        while ctrl.inhibit_timer() != 0 {
            assert!(!ctrl.clock_out());
            clock_low_ticks += 1;
            if !ctrl.data_out() {
                data_low_ticks += 1;
            }
            ctrl.step(false, true, false);
        }
        assert_eq!(clock_low_ticks, t.inhibit_ticks);
        // Timer values 1 and 2.
        assert_eq!(data_low_ticks, t.request_to_send_ticks - 1);
        assert!(ctrl.clock_out());
        assert!(ctrl.data_out());

        // Without a request the timer stays parked at zero.
        ctrl.step(false, true, false);
        assert_eq!(ctrl.inhibit_timer(), 0);
    }

    #[test]
    fn held_request_reloads_timer() {
        let t = timing();
        let mut ctrl = ClockControl::new(&t);
        for _ in 0..=t.inhibit_ticks {
            ctrl.step(false, true, true);
        }
        assert_eq!(ctrl.inhibit_timer(), 0);
        ctrl.step(false, true, true);
        assert_eq!(ctrl.inhibit_timer(), t.inhibit_ticks);
    }

    #[test]
    fn reset_cancels_inhibit() {
        let mut ctrl = ClockControl::new(&timing());
        ctrl.step(false, true, true);
        ctrl.step(false, true, false);
        assert!(!ctrl.clock_out());
        ctrl.step(true, true, false);
        assert!(ctrl.clock_out());
        assert_eq!(ctrl.inhibit_timer(), 0);
    }
}
