/// Internet checksum (RFC 1071) over an arbitrary byte buffer.
///
/// The buffer is summed as big-endian 16-bit words; an odd trailing byte is
/// padded as the high byte of a final word. The returned value is the one's
/// complement of the folded sum. Serializing it with `to_be_bytes` puts the
/// checksum field in network order on every host, so no platform-conditional
/// byte swapping is needed anywhere.
pub(crate) fn checksum(data: &[u8]) -> u16 {
    let mut sum: u32 = 0;
    let mut i = 0;
    while i + 1 < data.len() {
        sum = sum.wrapping_add(u32::from(u16::from_be_bytes([data[i], data[i + 1]])));
        i += 2;
    }
    if i < data.len() {
        sum = sum.wrapping_add(u32::from(data[i]) << 8);
    }
    // Fold carries back into the low 16 bits until none remain.
    while sum >> 16 != 0 {
        sum = (sum & 0xFFFF) + (sum >> 16);
    }
    !(sum as u16)
}
