use crate::bits::odd_parity;

/// Number of bits in a PS/2 frame on the wire: start, 8 data, parity, stop.
pub const WIRE_FRAME_BITS: usize = 11;

/// A frame as it appears on the data line, in transmission order.
///
/// Index 0 is the start bit, 1..=8 the data bits LSB first, 9 the parity
/// bit and 10 the stop bit. `len` is how many of those bits are actually
/// clocked out; anything shorter than [`WIRE_FRAME_BITS`] models a sender
/// that stalls mid-frame.
#[derive(Copy, Clone, Eq, PartialEq, Debug)]
pub struct WireFrame {
    bits: [bool; WIRE_FRAME_BITS],
    len: usize,
}

impl WireFrame {
    pub const START: usize = 0;
    pub const PARITY: usize = 9;
    pub const STOP: usize = 10;

    /// Well-formed frame for `byte` with odd parity.
    pub fn new(byte: u8) -> Self {
        let mut bits = [false; WIRE_FRAME_BITS];
        bits[Self::START] = false;
        for (i, bit) in bits[1..=8].iter_mut().enumerate() {
            *bit = (byte >> i) & 1 != 0;
        }
        bits[Self::PARITY] = odd_parity(byte);
        bits[Self::STOP] = true;
        Self {
            bits,
            len: WIRE_FRAME_BITS,
        }
    }

    /// Frame from raw bits in wire order.
    pub fn from_bits(bits: [bool; WIRE_FRAME_BITS]) -> Self {
        Self {
            bits,
            len: WIRE_FRAME_BITS,
        }
    }

    pub fn with_parity_flipped(mut self) -> Self {
        self.bits[Self::PARITY] = !self.bits[Self::PARITY];
        self
    }

    /// Flip data bit `index` (0 = LSB).
    ///
    /// # Panics
    ///
    /// Panics if `index` is not a data bit, i.e. 8 or more.
    pub fn with_data_bit_flipped(mut self, index: usize) -> Self {
        assert!(index < 8, "data bit index out of range: {}", index);
        self.bits[1 + index] = !self.bits[1 + index];
        self
    }

    pub fn with_start(mut self, level: bool) -> Self {
        self.bits[Self::START] = level;
        self
    }

    pub fn with_stop(mut self, level: bool) -> Self {
        self.bits[Self::STOP] = level;
        self
    }

    /// Keep only the first `len` bits.
    pub fn truncated(mut self, len: usize) -> Self {
        self.len = len.min(WIRE_FRAME_BITS);
        self
    }

    #[inline]
    pub fn bit(&self, index: usize) -> bool {
        self.bits[index]
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    #[inline]
    pub fn is_complete(&self) -> bool {
        self.len == WIRE_FRAME_BITS
    }

    /// The data byte carried by the frame, regardless of framing checks.
    pub fn byte(&self) -> u8 {
        self.bits[1..=8]
            .iter()
            .enumerate()
            .fold(0u8, |acc, (i, &bit)| acc | ((bit as u8) << i))
    }

    pub fn start_ok(&self) -> bool {
        !self.bits[Self::START]
    }

    pub fn stop_ok(&self) -> bool {
        self.bits[Self::STOP]
    }

    pub fn parity_ok(&self) -> bool {
        self.bits[Self::PARITY] == odd_parity(self.byte())
    }

    /// A complete frame whose start, stop and parity bits all check out.
    pub fn is_valid(&self) -> bool {
        self.is_complete() && self.start_ok() && self.stop_ok() && self.parity_ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn frame_layout_for_0x41() {
        let frame = WireFrame::new(0x41);
        // 0x41 = 0100_0001, sent LSB first.
        let expected = [
            false, // start
            true, false, false, false, false, false, true, false, // data
            true,  // parity: two ones, so parity is 1
            true,  // stop
        ];
        for (i, &bit) in expected.iter().enumerate() {
            assert_eq!(frame.bit(i), bit, "bit {i}");
        }
        assert_eq!(frame.byte(), 0x41);
        assert!(frame.is_valid());
    }

    #[test]
    fn faults_are_detected() {
        let frame = WireFrame::new(0x5A);
        assert!(!frame.with_parity_flipped().is_valid());
        assert!(!frame.with_data_bit_flipped(3).is_valid());
        assert!(!frame.with_start(true).is_valid());
        assert!(!frame.with_stop(false).is_valid());
        assert!(!frame.truncated(4).is_valid());
        assert_eq!(frame.truncated(40).len(), WIRE_FRAME_BITS);
    }

    #[test]
    fn flipping_the_last_data_bit_leaves_parity_alone() {
        let frame = WireFrame::new(0x00).with_data_bit_flipped(7);
        assert_eq!(frame.byte(), 0x80);
        assert!(frame.bit(WireFrame::PARITY));
        assert!(frame.stop_ok());
    }

    #[test]
    #[should_panic(expected = "data bit index out of range")]
    fn flipping_past_the_data_bits_panics() {
        let _ = WireFrame::new(0x00).with_data_bit_flipped(8);
    }
}
