//! ICMP checksum.

/// Computes the one's-complement checksum of `data`.
///
/// Words are summed little-endian and the result is byte-swapped at the end,
/// so the returned value is in host order and goes on the wire with
/// `to_be_bytes`. Summing a packet that already carries its checksum yields 0.
pub fn checksum(data: &[u8]) -> u16 {
    let mut sum: u32 = 0;

    let mut words = data.chunks_exact(2);
    for word in &mut words {
        sum = sum.wrapping_add(u16::from_le_bytes([word[0], word[1]]) as u32);
    }
    if let [last] = words.remainder() {
        sum = sum.wrapping_add(*last as u32);
    }

    while sum >> 16 != 0 {
        sum = (sum >> 16) + (sum & 0xffff);
    }

    (!(sum as u16)).swap_bytes()
}
