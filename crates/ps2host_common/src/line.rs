/// One party's intent on an open-drain line.
///
/// `value` is what the driver would put on the wire and `enabled` is the
/// output enable. An open-drain driver only ever drives a 0, so the two
/// meaningful states are `LOW` (value 0, enabled) and `RELEASED`
/// (value 1, not enabled). A released line floats high through the pull-up.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub struct LineDrive {
    pub value: bool,
    pub enabled: bool,
}

impl LineDrive {
    pub const LOW: LineDrive = LineDrive::new(false, true);
    pub const RELEASED: LineDrive = LineDrive::new(true, false);

    #[inline]
    pub const fn new(value: bool, enabled: bool) -> LineDrive {
        LineDrive { value, enabled }
    }

    /// Map a logical output level to an open-drain drive: 0 pulls the line
    /// low, 1 lets it float.
    #[inline]
    pub const fn from_level(level: bool) -> LineDrive {
        if level {
            LineDrive::RELEASED
        } else {
            LineDrive::LOW
        }
    }

    #[inline]
    pub const fn pulls_low(&self) -> bool {
        self.enabled && !self.value
    }
}

impl Default for LineDrive {
    fn default() -> Self {
        LineDrive::RELEASED
    }
}

/// Drivers for both PS/2 lines owned by a single party.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug, Default)]
pub struct PinDrivers {
    pub clk: LineDrive,
    pub data: LineDrive,
}

impl PinDrivers {
    pub const RELEASED: PinDrivers = PinDrivers {
        clk: LineDrive::RELEASED,
        data: LineDrive::RELEASED,
    };

    #[inline]
    pub const fn from_levels(clk: bool, data: bool) -> PinDrivers {
        PinDrivers {
            clk: LineDrive::from_level(clk),
            data: LineDrive::from_level(data),
        }
    }
}

/// Levels observed on the physical lines after all drivers are combined.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub struct LineLevels {
    pub clk: bool,
    pub data: bool,
}

impl LineLevels {
    /// Both lines released.
    pub const IDLE: LineLevels = LineLevels {
        clk: true,
        data: true,
    };

    /// Wired-AND of every driver on the bus: any party pulling a line low
    /// wins, otherwise the pull-up holds it at 1.
    pub fn resolve(drivers: &[PinDrivers]) -> LineLevels {
        LineLevels {
            clk: !drivers.iter().any(|d| d.clk.pulls_low()),
            data: !drivers.iter().any(|d| d.data.pulls_low()),
        }
    }

    #[inline]
    pub const fn is_idle(&self) -> bool {
        self.clk && self.data
    }
}

impl Default for LineLevels {
    fn default() -> Self {
        LineLevels::IDLE
    }
}
