//! Textual accumulator over chunked storage.

use std::fmt;

use crate::chunk::ChunkArray;
use crate::value::Value;

const SINGLE_QUOTE: u8 = b'\'';
const DOUBLE_QUOTE: u8 = b'"';
const ESCAPE_CHAR: u8 = b'\\';
const BLOB_SEPARATOR: u8 = b'%';

/// Canonical escape names for the control bytes 0x00..0x1F. Entries with
/// a `C-` prefix use control notation; single letters are the usual
/// C-style escapes (0x1B is `e` for escape).
pub(crate) const CANONICAL_CONTROL: [&str; 32] = [
    "C-@", // 00 NUL
    "C-A", // 01 SOH
    "C-B", // 02 STX
    "C-C", // 03 ETX
    "C-D", // 04 EOT
    "C-E", // 05 ENQ
    "C-F", // 06 ACK
    "a",   // 07 BEL
    "b",   // 08 BS
    "t",   // 09 HT
    "n",   // 0A LF
    "v",   // 0B VT
    "f",   // 0C FF
    "r",   // 0D CR
    "C-N", // 0E SO
    "C-O", // 0F SI
    "C-P", // 10 DLE
    "C-Q", // 11 DC1
    "C-R", // 12 DC2
    "C-S", // 13 DC3
    "C-T", // 14 DC4
    "C-U", // 15 NAK
    "C-V", // 16 SYN
    "C-W", // 17 ETB
    "C-X", // 18 CAN
    "C-Y", // 19 EM
    "C-Z", // 1A SUB
    "e",    // 1B ESC
    "C-\\", // 1C FS
    "C-]",  // 1D GS
    "C-^",  // 1E RS
    "C-_",  // 1F US
];

const HEX_DIGITS: [u8; 16] = *b"0123456789ABCDEF";

/// A growable text buffer with the conversions the textual codec needs.
///
/// The buffer is byte-oriented: string payloads may carry arbitrary
/// bytes, and the quoting machinery escapes anything outside the plain
/// printable range.
#[derive(Debug, Default)]
pub struct StringBuffer {
    buffer: ChunkArray,
}

impl StringBuffer {
    pub fn new() -> Self {
        StringBuffer { buffer: ChunkArray::new() }
    }

    /// Append a single byte.
    pub fn append_char(&mut self, ch: u8) -> &mut Self {
        self.buffer.append_bytes(&[ch]);
        self
    }

    /// Append a string without quoting or escaping.
    pub fn add_string(&mut self, s: &str) -> &mut Self {
        self.buffer.append_bytes(s.as_bytes());
        self
    }

    /// Append raw bytes without quoting or escaping.
    pub fn add_raw(&mut self, bytes: &[u8]) -> &mut Self {
        self.buffer.append_bytes(bytes);
        self
    }

    /// Append a quoted, escape-processed string. The delimiter is chosen
    /// to minimize escaping: double quotes unless the payload holds more
    /// of them than single quotes.
    pub fn add_quoted(&mut self, payload: &[u8]) -> &mut Self {
        let mut has_specials = false;
        let mut num_single = 0usize;
        let mut num_double = 0usize;
        let mut num_escapes = 0usize;
        for &byte in payload {
            if byte < 0x20 || (byte & 0x80) != 0 {
                has_specials = true;
            } else if byte == SINGLE_QUOTE {
                num_single += 1;
            } else if byte == DOUBLE_QUOTE {
                num_double += 1;
            } else if byte == ESCAPE_CHAR {
                num_escapes += 1;
            }
        }
        if !has_specials && num_single + num_double + num_escapes == 0 {
            self.append_char(DOUBLE_QUOTE);
            self.buffer.append_bytes(payload);
            self.append_char(DOUBLE_QUOTE);
            return self;
        }
        let delimiter = if num_double > num_single { SINGLE_QUOTE } else { DOUBLE_QUOTE };
        self.append_char(delimiter);
        for &byte in payload {
            if byte < 0x20 {
                self.append_char(ESCAPE_CHAR);
                self.add_string(CANONICAL_CONTROL[byte as usize]);
            } else if (byte & 0x80) != 0 {
                self.append_char(ESCAPE_CHAR);
                let low = byte & 0x7F;
                if low == b' ' {
                    // Meta-blank and meta-delete only have octal forms,
                    // as do meta-quotes that would collide with the
                    // delimiter.
                    self.add_string("240");
                } else if low == 0x7F {
                    self.add_string("377");
                } else if low == delimiter {
                    self.add_string(if delimiter == SINGLE_QUOTE { "247" } else { "242" });
                } else {
                    self.add_string("M-");
                    if low < 0x20 {
                        self.append_char(ESCAPE_CHAR);
                        self.add_string(CANONICAL_CONTROL[low as usize]);
                    } else {
                        self.append_char(low);
                    }
                }
            } else {
                if byte == delimiter || byte == ESCAPE_CHAR {
                    self.append_char(ESCAPE_CHAR);
                }
                self.append_char(byte);
            }
        }
        self.append_char(delimiter);
        self
    }

    /// Append a base-10 integer.
    pub fn add_long(&mut self, value: i64) -> &mut Self {
        self.add_string(&value.to_string())
    }

    /// Append a double. Finite whole numbers keep a trailing `.0` so the
    /// scanner reads them back as doubles.
    pub fn add_double(&mut self, value: f64) -> &mut Self {
        let text = value.to_string();
        self.add_string(&text);
        if value.is_finite() && !text.contains(['.', 'e', 'E']) {
            self.add_string(".0");
        }
        self
    }

    /// Append the canonical logical form.
    pub fn add_bool(&mut self, value: bool) -> &mut Self {
        self.add_string(if value { "true" } else { "false" })
    }

    /// Append a self-delimiting blob: `%<decimal length>%<hex bytes>%`.
    pub fn add_bytes(&mut self, bytes: &[u8]) -> &mut Self {
        self.append_char(BLOB_SEPARATOR);
        self.add_long(bytes.len() as i64);
        self.append_char(BLOB_SEPARATOR);
        for &byte in bytes {
            self.append_char(HEX_DIGITS[(byte >> 4) as usize]);
            self.append_char(HEX_DIGITS[(byte & 0x0F) as usize]);
        }
        self.append_char(BLOB_SEPARATOR);
        self
    }

    /// Random byte read; `None` once past the end.
    pub fn get_char(&self, index: usize) -> Option<u8> {
        self.buffer.get_byte(index)
    }

    /// Advance `position` past any whitespace, returning the first
    /// non-whitespace byte without consuming it, or `None` at the end.
    pub fn skip_over_white_space(&self, position: &mut usize) -> Option<u8> {
        loop {
            let ch = self.get_char(*position)?;
            if !ch.is_ascii_whitespace() {
                return Some(ch);
            }
            *position += 1;
        }
    }

    /// Parse the buffer's contents back into a value. When the buffer
    /// holds several top-level values they are wrapped in an array; an
    /// empty or unreadable buffer yields `None`.
    pub fn convert_to_value(&self) -> Option<Value> {
        let mut position = 0usize;
        let mut result = crate::scan::read_value(self, &mut position)?;
        let mut holder: Option<crate::array::Array> = None;
        loop {
            if self.skip_over_white_space(&mut position).is_none() {
                break;
            }
            let holder = holder.get_or_insert_with(crate::array::Array::new);
            holder.add_value(result);
            result = crate::scan::read_value(self, &mut position)?;
        }
        match holder {
            Some(mut arr) => {
                arr.add_value(result);
                Some(Value::Array(arr))
            }
            None => Some(result),
        }
    }

    pub fn len(&self) -> usize {
        self.buffer.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }

    pub fn reset(&mut self) {
        self.buffer.reset();
    }

    /// Materialize the buffered bytes.
    pub fn bytes(&self) -> Vec<u8> {
        self.buffer.bytes()
    }
}

impl fmt::Display for StringBuffer {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(&String::from_utf8_lossy(&self.bytes()))
    }
}
