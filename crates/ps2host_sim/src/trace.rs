//! Run-length recording of the bus lines.

use std::fmt;

use ps2host_common::LineLevels;

/// Line levels that start at `tick` and hold until the next transition.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct Transition {
    pub tick: u64,
    pub levels: LineLevels,
}

impl fmt::Display for Transition {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "@{} clk={} data={}",
            self.tick, self.levels.clk as u8, self.levels.data as u8
        )
    }
}

/// Only changes are stored, so long idle stretches cost nothing.
#[derive(Clone, Debug, Default)]
pub struct BusTrace {
    transitions: Vec<Transition>,
}

impl BusTrace {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, tick: u64, levels: LineLevels) {
        if self.transitions.last().map(|t| t.levels) != Some(levels) {
            self.transitions.push(Transition { tick, levels });
        }
    }

    pub fn transitions(&self) -> &[Transition] {
        &self.transitions
    }

    pub fn clear(&mut self) {
        self.transitions.clear();
    }

    /// Levels in effect at `tick`; idle before the first recorded tick.
    pub fn levels_at(&self, tick: u64) -> LineLevels {
        let idx = self.transitions.partition_point(|t| t.tick <= tick);
        if idx == 0 {
            LineLevels::IDLE
        } else {
            self.transitions[idx - 1].levels
        }
    }

    /// Data line level at every falling clock edge, in order. This is what
    /// a receiver sampling on the falling edge sees.
    pub fn data_at_falling_clk(&self) -> Vec<bool> {
        let mut prev_clk = true;
        let mut bits = Vec::new();
        for t in &self.transitions {
            if prev_clk && !t.levels.clk {
                bits.push(t.levels.data);
            }
            prev_clk = t.levels.clk;
        }
        bits
    }

    /// Ticks at which the clock line went from high to low.
    pub fn falling_clk_ticks(&self) -> Vec<u64> {
        let mut prev_clk = true;
        let mut ticks = Vec::new();
        for t in &self.transitions {
            if prev_clk && !t.levels.clk {
                ticks.push(t.tick);
            }
            prev_clk = t.levels.clk;
        }
        ticks
    }
}
