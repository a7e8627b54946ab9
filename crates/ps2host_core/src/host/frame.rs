//! Register-level layout of the 12-bit receive and transmit shift frames.
//!
//! Receive frame, once the sentinel has reached bit 11:
//!
//! ```text
//!  11        10     9..2             1       0
//!  sentinel  start  data (D0 at 9)   parity  stop
//! ```
//!
//! Transmit frame as loaded; it is shifted towards bit 11, which is the bit
//! presented on the data line:
//!
//! ```text
//!  11   10     9..2             1       0
//!  pad  start  data (D0 at 9)   parity  stop + load marker
//! ```

use bitflags::bitflags;
use ps2host_common::{odd_parity, reverse_bits8};

/// Width of both shift frames.
pub const FRAME_BITS: u32 = 12;
pub const FRAME_MASK: u16 = (1 << FRAME_BITS) - 1;

/// Initial receive frame: only the sentinel set.
pub const RX_SENTINEL: u16 = 0x001;
/// Sentinel position marking a complete receive frame.
pub const RX_COMPLETE: u16 = 1 << 11;

/// Bit presented on the data line by the transmitter.
pub const TX_ACTIVE_BIT: u16 = 1 << 11;
/// Bit 0 of a freshly loaded transmit frame; still set means nothing has
/// been shifted out yet.
pub const TX_LOAD_MARKER: u16 = 0x001;

bitflags! {
    /// Why a received frame was rejected.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct FrameFault: u8 {
        const BAD_START  = 1 << 0;
        const BAD_STOP   = 1 << 1;
        const BAD_PARITY = 1 << 2;
    }
}

/// Decode a complete receive frame into its byte and any framing faults.
pub fn decode_rx_frame(frame: u16) -> (u8, FrameFault) {
    let start = frame & (1 << 10) != 0;
    let parity = frame & (1 << 1) != 0;
    let stop = frame & 1 != 0;
    let byte = reverse_bits8((frame >> 2) as u8);

    let mut fault = FrameFault::empty();
    fault.set(FrameFault::BAD_START, start);
    fault.set(FrameFault::BAD_STOP, !stop);
    fault.set(FrameFault::BAD_PARITY, parity != odd_parity(byte));
    (byte, fault)
}

/// Build the transmit frame for `byte`.
///
/// Bits 10 and 11 stay clear: bit 10 becomes the start bit once the frame
/// has been shifted once, bit 11 only pads the frame to the receive width.
/// The stop bit doubles as the load marker.
pub fn encode_tx_frame(byte: u8) -> u16 {
    TX_LOAD_MARKER | (odd_parity(byte) as u16) << 1 | (reverse_bits8(byte) as u16) << 2
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Shift wire bits into a receive frame the way the receiver does.
    fn shift_in(bits: &[bool]) -> u16 {
        bits.iter()
            .fold(RX_SENTINEL, |frame, &bit| ((frame << 1) | bit as u16) & FRAME_MASK)
    }

    #[test]
    fn encode_layout() {
        // 0x41: parity 1, reversed data 0x82.
        assert_eq!(encode_tx_frame(0x41), 0b0010_0000_1011);
        assert_eq!(encode_tx_frame(0x41) & TX_ACTIVE_BIT, 0);
        assert_eq!(encode_tx_frame(0x00), 0b0000_0000_0011);
    }

    #[test]
    fn decode_well_formed_frame() {
        let wire = ps2host_common::WireFrame::new(0x41);
        let bits: Vec<bool> = (0..wire.len()).map(|i| wire.bit(i)).collect();
        let frame = shift_in(&bits);
        assert_ne!(frame & RX_COMPLETE, 0);
        assert_eq!(decode_rx_frame(frame), (0x41, FrameFault::empty()));
    }

    #[test]
    fn decode_reports_each_fault() {
        let wire = ps2host_common::WireFrame::new(0x41);
        let decode = |w: ps2host_common::WireFrame| {
            let bits: Vec<bool> = (0..w.len()).map(|i| w.bit(i)).collect();
            decode_rx_frame(shift_in(&bits)).1
        };
        assert_eq!(decode(wire.with_start(true)), FrameFault::BAD_START);
        assert_eq!(decode(wire.with_stop(false)), FrameFault::BAD_STOP);
        assert_eq!(decode(wire.with_parity_flipped()), FrameFault::BAD_PARITY);
        assert_eq!(decode(wire.with_data_bit_flipped(0)), FrameFault::BAD_PARITY);
        assert_eq!(
            decode(wire.with_start(true).with_stop(false)),
            FrameFault::BAD_START | FrameFault::BAD_STOP
        );
    }
}
