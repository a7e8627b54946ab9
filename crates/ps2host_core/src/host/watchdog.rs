/// Clock activity watchdog.
///
/// Armed by the first clock edge, reloaded by every later one. When the
/// countdown reaches zero it raises `fired()` for exactly one tick and
/// disarms until the next edge; the host feeds that pulse back as a reset
/// into the receiver and transmitter.
pub struct Watchdog {
    active: bool,
    timer: u32,
    reload: u32,
}

impl Watchdog {
    pub fn new(timeout_ticks: u32) -> Self {
        Self {
            active: false,
            timer: timeout_ticks,
            reload: timeout_ticks,
        }
    }

    #[inline]
    pub fn is_active(&self) -> bool {
        self.active
    }

    #[inline]
    pub fn timer(&self) -> u32 {
        self.timer
    }

    #[inline]
    pub fn timeout_ticks(&self) -> u32 {
        self.reload
    }

    /// One-tick reset pulse.
    #[inline]
    pub fn fired(&self) -> bool {
        self.timer == 0
    }

    pub fn step(&mut self, reset: bool, edge: bool) {
        let clear = reset || self.fired();
        let reload = clear || !self.active || edge;
        self.active = !clear && (self.active || edge);
        // `fired()` implies `clear`, so the decrement never underflows.
        self.timer = if reload { self.reload } else { self.timer - 1 };
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn idle_watchdog_never_fires() {
        let mut wd = Watchdog::new(5);
        for _ in 0..100 {
            wd.step(false, false);
            assert!(!wd.fired());
            assert!(!wd.is_active());
        }
    }

    #[test]
    fn fires_once_after_timeout() {
        let mut wd = Watchdog::new(5);
        wd.step(false, true);
        assert!(wd.is_active());
        assert_eq!(wd.timer(), 5);

        let mut pulses = Vec::new();
        for tick in 0..50 {
            if wd.fired() {
                pulses.push(tick);
            }
            wd.step(false, false);
        }
        assert_eq!(pulses, vec![5]);
        assert!(!wd.is_active());
        assert_eq!(wd.timer(), 5);
    }

    #[test]
    fn edges_keep_it_alive() {
        let mut wd = Watchdog::new(5);
        for tick in 0..100 {
            wd.step(false, tick % 4 == 0);
            assert!(!wd.fired());
        }
    }

    #[test]
    fn reset_disarms() {
        let mut wd = Watchdog::new(3);
        wd.step(false, true);
        wd.step(false, false);
        wd.step(true, false);
        assert!(!wd.is_active());
        assert_eq!(wd.timer(), 3);
        for _ in 0..10 {
            wd.step(false, false);
            assert!(!wd.fired());
        }
    }

    #[test]
    fn edge_on_expiry_tick_is_dropped() {
        let mut wd = Watchdog::new(2);
        wd.step(false, true);
        wd.step(false, false);
        wd.step(false, false);
        assert!(wd.fired());
        wd.step(false, true);
        assert!(!wd.is_active());
        assert!(!wd.fired());
    }
}
