use super::frame::{encode_tx_frame, FRAME_MASK, TX_ACTIVE_BIT, TX_LOAD_MARKER};

/// Bit-serial transmitter.
///
/// Loads a whole frame in one tick when a send is requested while idle,
/// then shifts it one position per rising clock edge until it is empty.
pub struct Transmitter {
    frame: u16,
}

impl Default for Transmitter {
    fn default() -> Self {
        Self::new()
    }
}

impl Transmitter {
    pub fn new() -> Self {
        Self { frame: 0 }
    }

    #[inline]
    pub fn frame(&self) -> u16 {
        self.frame
    }

    #[inline]
    pub fn busy(&self) -> bool {
        self.frame != 0
    }

    /// Whether the transmitter owns the bus this tick: already sending, or
    /// about to load a frame from `send_req`.
    #[inline]
    pub fn claims_bus(&self, send_req: bool) -> bool {
        self.busy() || send_req
    }

    /// Level the transmitter wants on the data line.
    ///
    /// Released while idle, while the load marker shows nothing has been
    /// shifted yet, and once only the padding bit is left; otherwise the
    /// active bit.
    pub fn data_out(&self) -> bool {
        let remaining = self.frame & !TX_ACTIVE_BIT;
        if remaining == 0 || self.frame & TX_LOAD_MARKER != 0 {
            true
        } else {
            self.frame & TX_ACTIVE_BIT != 0
        }
    }

    pub fn step(&mut self, reset: bool, rising: bool, send_req: bool, tx_data: u8) {
        let idle = self.frame == 0;
        self.frame = if reset || (idle && !send_req) {
            0
        } else if idle {
            let frame = encode_tx_frame(tx_data);
            log::debug!("tx load {:#04x} as frame {:03X}", tx_data, frame);
            frame
        } else if rising {
            let frame = (self.frame << 1) & FRAME_MASK;
            log::trace!("tx shift, frame {:03X}", frame);
            if frame == 0 {
                log::debug!("tx frame done");
            }
            frame
        } else {
            self.frame
        };
    }
}
