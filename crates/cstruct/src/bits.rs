//! Low-level storage unit and bit-slot access on byte slices.
//!
//! Storage units are little-endian. Bit-fields are placed LSB-first: bit 0 of
//! a unit is the least significant bit of its first byte.

/// Mask covering the low `width` bits.
pub fn mask(width: u32) -> u64 {
    if width >= 64 { u64::MAX } else { (1u64 << width) - 1 }
}

/// Reads a little-endian unit of `size` bytes (1..=8) starting at `offset`.
pub fn read_unit(data: &[u8], offset: usize, size: usize) -> u64 {
    data[offset..offset + size]
        .iter()
        .rev()
        .fold(0u64, |acc, &b| (acc << 8) | b as u64)
}

/// Writes the low `size` bytes of `value` little-endian at `offset`.
pub fn write_unit(data: &mut [u8], offset: usize, size: usize, value: u64) {
    for (i, byte) in data[offset..offset + size].iter_mut().enumerate() {
        *byte = (value >> (i * 8)) as u8;
    }
}

/// Extracts `width` bits starting at bit `shift` of `unit`.
pub fn extract_bits(unit: u64, shift: u32, width: u32) -> u64 {
    (unit >> shift) & mask(width)
}

/// Replaces `width` bits starting at bit `shift` of `unit` with the low bits of `value`.
pub fn insert_bits(unit: u64, shift: u32, width: u32, value: u64) -> u64 {
    let m = mask(width) << shift;
    (unit & !m) | ((value << shift) & m)
}

/// Sign-extends the low `bits` of `value` to a full `i64`.
pub fn sign_extend(value: u64, bits: u32) -> i64 {
    let shift = 64 - bits;
    ((value << shift) as i64) >> shift
}
