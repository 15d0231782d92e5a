//! Byte-level helpers shared by the two codecs, plus the channel-name
//! utilities used by discovery-facing callers.

use byteorder::{BigEndian, ByteOrder};
use rand::Rng;

/// Encode a signed integer as the fewest big-endian two's-complement bytes
/// that still carry the sign. Returns the byte buffer and the number of
/// trailing bytes that are significant; the significant bytes occupy the
/// tail of the buffer.
pub(crate) fn int_to_min_bytes(value: i64) -> ([u8; 8], usize) {
    let mut buf = [0u8; 8];
    BigEndian::write_i64(&mut buf, value);
    let skip_byte = if value < 0 { 0xFF } else { 0x00 };
    let mut length = 0;
    for (ii, &byte) in buf.iter().enumerate() {
        if byte != skip_byte {
            length = 8 - ii;
            break;
        }
    }
    // The most significant kept byte must still carry the sign bit.
    if length > 0 {
        let msb = buf[8 - length];
        let sign_set = (msb & 0x80) != 0;
        if sign_set != (value < 0) {
            length += 1;
        }
    } else if value < 0 {
        length = 1;
    }
    (buf, length)
}

/// Decode `num_bytes` big-endian two's-complement bytes, sign-extending
/// from the top bit of the first byte.
pub(crate) fn int_from_bytes(bytes: &[u8], num_bytes: usize) -> i64 {
    let negative = (bytes[0] & 0x80) != 0;
    let mut buf = [if negative { 0xFFu8 } else { 0x00u8 }; 8];
    buf[8 - num_bytes..].copy_from_slice(&bytes[..num_bytes]);
    BigEndian::read_i64(&buf)
}

/// Encode a double as eight big-endian IEEE-754 bytes.
pub(crate) fn double_to_bytes(value: f64) -> [u8; 8] {
    let mut buf = [0u8; 8];
    BigEndian::write_f64(&mut buf, value);
    buf
}

/// Decode eight big-endian IEEE-754 bytes.
pub(crate) fn double_from_bytes(bytes: &[u8; 8]) -> f64 {
    BigEndian::read_f64(bytes)
}

/// Generate a random channel name under the given root. A missing root
/// falls back to `_`; a leading slash is added when the root lacks one.
pub fn random_channel_name<R: Rng + ?Sized>(root: Option<&str>, rng: &mut R) -> String {
    let root = root.unwrap_or("_");
    let suffix: u32 = rng.gen_range(0..0x1000_0000);
    if root.starts_with('/') {
        format!("{}{:x}", root, suffix)
    } else {
        format!("/{}{:x}", root, suffix)
    }
}

/// Generate a short random lowercase-hex string.
pub fn random_hex_string<R: Rng + ?Sized>(rng: &mut R) -> String {
    format!("{:x}", rng.gen_range(0..10000u32))
}
