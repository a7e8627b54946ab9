use std::time::Duration;

use anyhow::{ensure, Context, Result};
use typed_builder::TypedBuilder;

/// System clock of the reference SoC integration.
pub const DEFAULT_SYS_CLK_HZ: u64 = 100_000_000;
/// How long the host holds the clock line low before sending.
pub const DEFAULT_INHIBIT: Duration = Duration::from_micros(125);
/// Tail of the inhibit window during which the data line is pulled low.
pub const DEFAULT_REQUEST_TO_SEND: Duration = Duration::from_micros(20);
/// Clock inactivity after which an in-flight transfer is abandoned.
pub const DEFAULT_WATCHDOG: Duration = Duration::from_micros(400);

/// Host controller configuration, expressed in wall-clock units.
///
/// Converted once into tick counts by [`HostConfig::timing`]; nothing in
/// the per-tick path deals with durations.
#[derive(TypedBuilder, Debug, Clone, PartialEq, Eq)]
pub struct HostConfig {
    #[builder(default = DEFAULT_SYS_CLK_HZ)]
    pub sys_clk_hz: u64,
    #[builder(default = DEFAULT_INHIBIT)]
    pub inhibit: Duration,
    #[builder(default = DEFAULT_REQUEST_TO_SEND)]
    pub request_to_send: Duration,
    #[builder(default = DEFAULT_WATCHDOG)]
    pub watchdog: Duration,
}

impl Default for HostConfig {
    fn default() -> Self {
        HostConfig::builder().build()
    }
}

/// Tick counts derived from a [`HostConfig`].
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct HostTiming {
    pub inhibit_ticks: u32,
    pub request_to_send_ticks: u32,
    pub watchdog_ticks: u32,
}

impl HostConfig {
    /// Convert the configured durations into system clock ticks.
    ///
    /// Counts are truncated, matching how the counter widths are sized on
    /// hardware. Fails if a window rounds to zero ticks or does not fit a
    /// 32-bit counter, if the request-to-send window does not fit inside
    /// the inhibit window, or if the watchdog would expire during it.
    pub fn timing(&self) -> Result<HostTiming> {
        ensure!(self.sys_clk_hz > 0, "system clock frequency must be non-zero");

        let inhibit_ticks =
            duration_to_ticks(self.inhibit, self.sys_clk_hz).context("inhibit window")?;
        let request_to_send_ticks = duration_to_ticks(self.request_to_send, self.sys_clk_hz)
            .context("request-to-send window")?;
        let watchdog_ticks =
            duration_to_ticks(self.watchdog, self.sys_clk_hz).context("watchdog timeout")?;

        ensure!(
            inhibit_ticks > 0,
            "inhibit window {:?} is shorter than one tick at {} Hz",
            self.inhibit,
            self.sys_clk_hz
        );
        ensure!(
            watchdog_ticks > 0,
            "watchdog timeout {:?} is shorter than one tick at {} Hz",
            self.watchdog,
            self.sys_clk_hz
        );
        ensure!(
            request_to_send_ticks > 0 && request_to_send_ticks < inhibit_ticks,
            "request-to-send window ({} ticks) must be non-empty and shorter than the inhibit window ({} ticks)",
            request_to_send_ticks,
            inhibit_ticks
        );
        // The host's own inhibit edge arms the watchdog and the next edge
        // is the clock release, so the timeout has to outlast the window.
        ensure!(
            watchdog_ticks > inhibit_ticks,
            "watchdog timeout ({} ticks) must be longer than the inhibit window ({} ticks)",
            watchdog_ticks,
            inhibit_ticks
        );

        Ok(HostTiming {
            inhibit_ticks,
            request_to_send_ticks,
            watchdog_ticks,
        })
    }
}

/// `floor(duration * hz)`, computed in integer nanoseconds.
pub fn duration_to_ticks(duration: Duration, hz: u64) -> Result<u32> {
    let ticks = duration.as_nanos() * u128::from(hz) / 1_000_000_000;
    u32::try_from(ticks).with_context(|| format!("{} ticks do not fit a 32-bit counter", ticks))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_timing_at_100mhz() {
        let timing = HostConfig::default().timing().unwrap();
        assert_eq!(timing.inhibit_ticks, 12_500);
        assert_eq!(timing.request_to_send_ticks, 2_000);
        assert_eq!(timing.watchdog_ticks, 40_000);
    }

    #[test]
    fn builder_overrides_single_field() {
        let config = HostConfig::builder()
            .sys_clk_hz(1_000_000)
            .watchdog(Duration::from_micros(200))
            .build();
        let timing = config.timing().unwrap();
        assert_eq!(timing.inhibit_ticks, 125);
        assert_eq!(timing.request_to_send_ticks, 20);
        assert_eq!(timing.watchdog_ticks, 200);
    }

    #[test]
    fn ticks_are_truncated() {
        assert_eq!(duration_to_ticks(Duration::from_nanos(1_999), 1_000_000).unwrap(), 1);
        assert_eq!(duration_to_ticks(Duration::from_nanos(999), 1_000_000).unwrap(), 0);
    }

    #[test]
    fn rejects_degenerate_windows() {
        let too_slow = HostConfig::builder().sys_clk_hz(1_000).build();
        assert!(too_slow.timing().is_err());

        let rts_too_long = HostConfig::builder()
            .sys_clk_hz(1_000_000)
            .request_to_send(Duration::from_micros(125))
            .build();
        assert!(rts_too_long.timing().is_err());

        let watchdog_inside_inhibit = HostConfig::builder()
            .sys_clk_hz(1_000_000)
            .watchdog(Duration::from_micros(100))
            .build();
        assert!(watchdog_inside_inhibit.timing().is_err());

        let watchdog_equal_to_inhibit = HostConfig::builder()
            .sys_clk_hz(1_000_000)
            .watchdog(DEFAULT_INHIBIT)
            .build();
        assert!(watchdog_equal_to_inhibit.timing().is_err());

        let no_clock = HostConfig::builder().sys_clk_hz(0).build();
        assert!(no_clock.timing().is_err());

        let huge = HostConfig::builder()
            .watchdog(Duration::from_secs(3_600))
            .build();
        assert!(huge.timing().is_err());
    }
}
