/// Reverse the bit order of a byte.
///
/// PS/2 puts the least significant bit on the wire first, while shift
/// registers fill from one end; this converts between the two orders.
#[inline]
pub const fn reverse_bits8(value: u8) -> u8 {
    value.reverse_bits()
}

/// Odd parity bit for `value`: set when the data has an even number of
/// ones, so that data plus parity always holds an odd count.
#[inline]
pub const fn odd_parity(value: u8) -> bool {
    value.count_ones() % 2 == 0
}
