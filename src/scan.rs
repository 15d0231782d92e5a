//! Textual reading.
//!
//! The generic reader peeks the first non-whitespace byte and hands off
//! to the variant whose initial-character set matches. Readers return
//! `None` on any failure - never a flaw - so the caller can try another
//! variant or report "no recognizable value". A reader that succeeds
//! advances the position past everything it consumed.

use std::net::Ipv4Addr;

use crate::array::Array;
use crate::date_time::DateTime;
use crate::map::Map;
use crate::set::Set;
use crate::string_buffer::StringBuffer;
use crate::value::Value;

const ESCAPE_CHAR: u8 = b'\\';

/// Standard single-letter escapes and the bytes they decode to. `s` is
/// accepted for space although the printer never emits it.
const STANDARD_ESCAPES: &[u8] = b"abtnvfrse";
const STANDARD_ESCAPES_ACTUAL: &[u8] = &[0x07, 0x08, 0x09, 0x0A, 0x0B, 0x0C, 0x0D, b' ', 0x1B];

/// Whether `ch` may legally follow a complete scalar: whitespace or any
/// container end or separator character.
fn is_legal_terminator(ch: u8) -> bool {
    ch.is_ascii_whitespace() || matches!(ch, b')' | b']' | b'}' | b',' | b'>')
}

/// Terminator check for the byte at `position`; end-of-buffer is legal.
fn terminated_at(buf: &StringBuffer, position: usize) -> bool {
    buf.get_char(position).map_or(true, is_legal_terminator)
}

/// Read one value starting at the first non-whitespace byte at or after
/// `*position`.
pub(crate) fn read_value(buf: &StringBuffer, position: &mut usize) -> Option<Value> {
    let ch = buf.skip_over_white_space(position)?;
    match ch {
        b'(' => read_array(buf, position),
        b'{' => read_map(buf, position),
        b'[' => read_set(buf, position),
        b'"' | b'\'' => read_string(buf, position),
        b'%' => read_blob(buf, position),
        b't' | b'T' | b'f' | b'F' => read_logical(buf, position),
        b'$' => read_date_time(buf, position),
        b'@' => read_address(buf, position),
        b'0'..=b'9' | b'+' | b'-' | b'.' => read_number(buf, position),
        _ => None,
    }
}

fn read_array(buf: &StringBuffer, position: &mut usize) -> Option<Value> {
    let mut local = *position + 1;
    let mut array = Array::new();
    loop {
        let ch = buf.skip_over_white_space(&mut local)?;
        if ch == b')' {
            local += 1;
            break;
        }
        array.add_value(read_value(buf, &mut local)?);
    }
    *position = local;
    Some(Value::Array(array))
}

fn read_set(buf: &StringBuffer, position: &mut usize) -> Option<Value> {
    let mut local = *position + 1;
    let mut set = Set::new();
    loop {
        let ch = buf.skip_over_white_space(&mut local)?;
        if ch == b']' {
            local += 1;
            break;
        }
        let element = read_value(buf, &mut local)?;
        if !element.is_enumerable() {
            return None;
        }
        if !set.is_empty() && element.kind() != set.key_kind() {
            return None;
        }
        // A duplicate element silently collapses.
        set.add_value(element);
    }
    *position = local;
    Some(Value::Set(set))
}

fn read_map(buf: &StringBuffer, position: &mut usize) -> Option<Value> {
    let mut local = *position + 1;
    let mut map = Map::new();
    loop {
        let mut ch = buf.skip_over_white_space(&mut local)?;
        if ch == b',' && !map.is_empty() {
            local += 1;
            ch = buf.skip_over_white_space(&mut local)?;
        }
        if ch == b'}' {
            local += 1;
            break;
        }
        let key = read_value(buf, &mut local)?;
        if !key.is_enumerable() {
            return None;
        }
        if !map.is_empty() && key.kind() != map.key_kind() {
            return None;
        }
        let ch = buf.skip_over_white_space(&mut local)?;
        if ch != b'>' {
            return None;
        }
        local += 1;
        let value = read_value(buf, &mut local)?;
        // A colliding key silently keeps the first entry.
        map.add_value(key, value);
    }
    *position = local;
    Some(Value::Map(map))
}

#[derive(Clone, Copy, PartialEq)]
enum ScanState {
    Normal,
    SawEscape,
    SawEscapeOctal1,
    SawEscapeOctal2,
    SawEscapeSmallC,
    SawEscapeBigC,
    SawEscapeBigCminus,
    SawEscapeBigM,
    SawEscapeBigMminus,
    SawEscapeBigMminusEscape,
    SawEscapeBigMminusEscapeBigC,
    SawEscapeBigMminusEscapeBigCminus,
}

fn control_byte(ch: u8) -> Option<u8> {
    let up = ch.to_ascii_uppercase();
    (b'@'..=b'_').contains(&up).then(|| up - b'@')
}

fn read_string(buf: &StringBuffer, position: &mut usize) -> Option<Value> {
    let mut local = *position;
    let delimiter = buf.get_char(local)?;
    local += 1;
    let mut holding: Vec<u8> = Vec::new();
    let mut state = ScanState::Normal;
    let mut octal_sum: u32 = 0;
    loop {
        // Running out of buffer before the closing delimiter fails the
        // scan.
        let ch = buf.get_char(local)?;
        local += 1;
        match state {
            ScanState::Normal => {
                if ch == delimiter {
                    if !terminated_at(buf, local) {
                        return None;
                    }
                    *position = local;
                    return Some(Value::String(holding));
                } else if ch == ESCAPE_CHAR {
                    state = ScanState::SawEscape;
                } else {
                    holding.push(ch);
                }
            }
            ScanState::SawEscape => {
                if ch == delimiter {
                    holding.push(ch);
                    state = ScanState::Normal;
                } else if let Some(slot) = STANDARD_ESCAPES.iter().position(|&e| e == ch) {
                    holding.push(STANDARD_ESCAPES_ACTUAL[slot]);
                    state = ScanState::Normal;
                } else {
                    match ch {
                        b'0'..=b'7' => {
                            octal_sum = (ch - b'0') as u32;
                            state = ScanState::SawEscapeOctal1;
                        }
                        b'c' => state = ScanState::SawEscapeSmallC,
                        b'C' => state = ScanState::SawEscapeBigC,
                        b'M' => state = ScanState::SawEscapeBigM,
                        _ => return None,
                    }
                }
            }
            ScanState::SawEscapeOctal1 => match ch {
                b'0'..=b'7' => {
                    octal_sum = octal_sum * 8 + (ch - b'0') as u32;
                    state = ScanState::SawEscapeOctal2;
                }
                _ => return None,
            },
            ScanState::SawEscapeOctal2 => match ch {
                b'0'..=b'7' => {
                    octal_sum = octal_sum * 8 + (ch - b'0') as u32;
                    holding.push(octal_sum as u8);
                    state = ScanState::Normal;
                }
                _ => return None,
            },
            ScanState::SawEscapeSmallC | ScanState::SawEscapeBigCminus => {
                holding.push(control_byte(ch)?);
                state = ScanState::Normal;
            }
            ScanState::SawEscapeBigC => {
                if ch != b'-' {
                    return None;
                }
                state = ScanState::SawEscapeBigCminus;
            }
            ScanState::SawEscapeBigM => {
                if ch != b'-' {
                    return None;
                }
                state = ScanState::SawEscapeBigMminus;
            }
            ScanState::SawEscapeBigMminus => {
                if ch == ESCAPE_CHAR {
                    state = ScanState::SawEscapeBigMminusEscape;
                } else {
                    holding.push(ch | 0x80);
                    state = ScanState::Normal;
                }
            }
            ScanState::SawEscapeBigMminusEscape => {
                if ch != b'C' {
                    return None;
                }
                state = ScanState::SawEscapeBigMminusEscapeBigC;
            }
            ScanState::SawEscapeBigMminusEscapeBigC => {
                if ch != b'-' {
                    return None;
                }
                state = ScanState::SawEscapeBigMminusEscapeBigCminus;
            }
            ScanState::SawEscapeBigMminusEscapeBigCminus => {
                holding.push(control_byte(ch)? | 0x80);
                state = ScanState::Normal;
            }
        }
    }
}

fn read_blob(buf: &StringBuffer, position: &mut usize) -> Option<Value> {
    let mut local = *position + 1;
    let mut length: usize = 0;
    let mut saw_digit = false;
    loop {
        let ch = buf.get_char(local)?;
        local += 1;
        match ch {
            b'0'..=b'9' => {
                saw_digit = true;
                length = length.checked_mul(10)?.checked_add((ch - b'0') as usize)?;
            }
            b'%' => break,
            _ => return None,
        }
    }
    if !saw_digit {
        return None;
    }
    let mut bytes = Vec::with_capacity(length);
    for _ in 0..length {
        let high = hex_digit(buf.get_char(local)?)?;
        let low = hex_digit(buf.get_char(local + 1)?)?;
        bytes.push(high << 4 | low);
        local += 2;
    }
    if buf.get_char(local)? != b'%' {
        return None;
    }
    local += 1;
    if !terminated_at(buf, local) {
        return None;
    }
    *position = local;
    Some(Value::Blob(bytes))
}

fn hex_digit(ch: u8) -> Option<u8> {
    match ch {
        b'0'..=b'9' => Some(ch - b'0'),
        b'A'..=b'F' => Some(ch - b'A' + 10),
        b'a'..=b'f' => Some(ch - b'a' + 10),
        _ => None,
    }
}

fn read_logical(buf: &StringBuffer, position: &mut usize) -> Option<Value> {
    let mut local = *position;
    let first = buf.get_char(local)?;
    local += 1;
    let (candidate, value): (&[u8], bool) = match first.to_ascii_lowercase() {
        b't' => (b"true", true),
        b'f' => (b"false", false),
        _ => return None,
    };
    // Any unambiguous prefix followed by a legal terminator is accepted.
    let mut matched = 1;
    loop {
        let ch = match buf.get_char(local) {
            None => break,
            Some(ch) if is_legal_terminator(ch) => break,
            Some(ch) => ch,
        };
        if matched == candidate.len() || ch.to_ascii_lowercase() != candidate[matched] {
            return None;
        }
        local += 1;
        matched += 1;
    }
    *position = local;
    Some(Value::Logical(value))
}

/// Collect a run of ASCII digits into `text`, returning how many were
/// consumed.
fn collect_digits(buf: &StringBuffer, local: &mut usize, text: &mut String) -> usize {
    let mut count = 0;
    while let Some(ch) = buf.get_char(*local) {
        if !ch.is_ascii_digit() {
            break;
        }
        text.push(ch as char);
        *local += 1;
        count += 1;
    }
    count
}

fn read_number(buf: &StringBuffer, position: &mut usize) -> Option<Value> {
    let mut local = *position;
    let mut text = String::new();
    let mut is_double = false;
    if let Some(ch @ (b'+' | b'-')) = buf.get_char(local) {
        text.push(ch as char);
        local += 1;
    }
    let mut digits = collect_digits(buf, &mut local, &mut text);
    if buf.get_char(local) == Some(b'.') {
        is_double = true;
        text.push('.');
        local += 1;
        digits += collect_digits(buf, &mut local, &mut text);
    }
    if digits == 0 {
        return None;
    }
    if let Some(ch @ (b'e' | b'E')) = buf.get_char(local) {
        let mut exponent = String::new();
        let mut exp_local = local + 1;
        if let Some(sign @ (b'+' | b'-')) = buf.get_char(exp_local) {
            exponent.push(sign as char);
            exp_local += 1;
        }
        if collect_digits(buf, &mut exp_local, &mut exponent) == 0 {
            return None;
        }
        is_double = true;
        text.push(ch as char);
        text.push_str(&exponent);
        local = exp_local;
    }
    if !terminated_at(buf, local) {
        return None;
    }
    let result = if is_double {
        Value::Double(text.parse::<f64>().ok()?)
    } else {
        Value::Integer(text.parse::<i64>().ok()?)
    };
    *position = local;
    Some(result)
}

fn read_address(buf: &StringBuffer, position: &mut usize) -> Option<Value> {
    let mut local = *position + 1;
    let mut octets = [0u8; 4];
    for (slot, octet) in octets.iter_mut().enumerate() {
        if slot > 0 {
            if buf.get_char(local)? != b'.' {
                return None;
            }
            local += 1;
        }
        let mut text = String::new();
        let digits = collect_digits(buf, &mut local, &mut text);
        if digits == 0 || digits > 3 {
            return None;
        }
        *octet = text.parse::<u8>().ok()?;
    }
    if !terminated_at(buf, local) {
        return None;
    }
    *position = local;
    Some(Value::Address(Ipv4Addr::new(octets[0], octets[1], octets[2], octets[3])))
}

fn read_fixed_field(
    buf: &StringBuffer,
    local: &mut usize,
    low: u32,
    high: u32,
) -> Option<u32> {
    let mut text = String::new();
    let digits = collect_digits(buf, local, &mut text);
    if digits == 0 || digits > 5 {
        return None;
    }
    let value = text.parse::<u32>().ok()?;
    (low..=high).contains(&value).then_some(value)
}

fn read_date_time(buf: &StringBuffer, position: &mut usize) -> Option<Value> {
    let mut local = *position + 1;
    let selector = buf.get_char(local)?;
    local += 1;
    let result = match selector.to_ascii_uppercase() {
        b'D' => {
            let year = read_fixed_field(buf, &mut local, 1, 10000)?;
            if buf.get_char(local)? != b'-' {
                return None;
            }
            local += 1;
            let month = read_fixed_field(buf, &mut local, 1, 12)?;
            if buf.get_char(local)? != b'-' {
                return None;
            }
            local += 1;
            let day = read_fixed_field(buf, &mut local, 1, 31)?;
            DateTime::date(year, month, day)
        }
        b'T' => {
            let hour = read_fixed_field(buf, &mut local, 0, 23)?;
            if buf.get_char(local)? != b':' {
                return None;
            }
            local += 1;
            let minute = read_fixed_field(buf, &mut local, 0, 59)?;
            if buf.get_char(local)? != b':' {
                return None;
            }
            local += 1;
            let second = read_fixed_field(buf, &mut local, 0, 59)?;
            let millisecond = if buf.get_char(local) == Some(b'.') {
                local += 1;
                let mut text = String::new();
                let digits = collect_digits(buf, &mut local, &mut text);
                if digits == 0 || digits > 3 {
                    return None;
                }
                // Fractional digits scale: .5 is 500 milliseconds.
                text.parse::<u32>().ok()? * 10u32.pow(3 - digits as u32)
            } else {
                0
            };
            DateTime::time(hour, minute, second, millisecond)
        }
        _ => return None,
    };
    if !terminated_at(buf, local) {
        return None;
    }
    *position = local;
    Some(Value::DateTime(result))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scan(text: &str) -> Option<Value> {
        let mut buf = StringBuffer::new();
        buf.add_string(text);
        let mut position = 0;
        read_value(&buf, &mut position)
    }

    #[test]
    fn logicals() {
        assert_eq!(scan("true"), Some(Value::from(true)));
        assert_eq!(scan("FALSE"), Some(Value::from(false)));
        assert_eq!(scan("tru"), Some(Value::from(true)));
        assert_eq!(scan("f"), Some(Value::from(false)));
        assert_eq!(scan("truex"), None);
        assert_eq!(scan("falsey"), None);
    }

    #[test]
    fn numbers() {
        assert_eq!(scan("42"), Some(Value::from(42)));
        assert_eq!(scan("-16"), Some(Value::from(-16)));
        assert_eq!(scan("+7"), Some(Value::from(7)));
        assert_eq!(scan("2.5"), Some(Value::from(2.5)));
        assert_eq!(scan(".5"), Some(Value::from(0.5)));
        assert_eq!(scan("1e3"), Some(Value::from(1000.0)));
        assert_eq!(scan("-1.5e-2"), Some(Value::from(-0.015)));
        assert_eq!(scan("12abc"), None);
        assert_eq!(scan("-"), None);
        assert_eq!(scan("."), None);
    }

    #[test]
    fn strings_plain_and_escaped() {
        assert_eq!(scan("\"abc\""), Some(Value::from("abc")));
        assert_eq!(scan("'abc'"), Some(Value::from("abc")));
        assert_eq!(scan("\"a\\nb\""), Some(Value::string(b"a\nb".to_vec())));
        assert_eq!(scan("\"\\t\\a\\e\""), Some(Value::string(vec![0x09, 0x07, 0x1B])));
        assert_eq!(scan("\"\\C-@\""), Some(Value::string(vec![0x00])));
        assert_eq!(scan("\"\\cm\""), Some(Value::string(vec![0x0D])));
        assert_eq!(scan("\"\\M-x\""), Some(Value::string(vec![b'x' | 0x80])));
        assert_eq!(scan("\"\\M-\\C-E\""), Some(Value::string(vec![0x85])));
        assert_eq!(scan("\"\\240\\377\\242\""), Some(Value::string(vec![0xA0, 0xFF, 0xA2])));
        assert_eq!(scan("\"say \\\"hi\\\"\""), Some(Value::from("say \"hi\"")));
        assert_eq!(scan("\"a\\\\b\""), Some(Value::string(b"a\\b".to_vec())));
    }

    #[test]
    fn string_failures() {
        assert_eq!(scan("\"unterminated"), None);
        assert_eq!(scan("\"bad \\q escape\""), None);
        assert_eq!(scan("\"\\C?\""), None);
        assert_eq!(scan("\"\\09\""), None);
        assert_eq!(scan("\"x\"y"), None);
    }

    #[test]
    fn blobs() {
        assert_eq!(scan("%2%DEAD%"), Some(Value::blob(vec![0xDE, 0xAD])));
        assert_eq!(scan("%0%%"), Some(Value::blob(vec![])));
        assert_eq!(scan("%2%dead%"), Some(Value::blob(vec![0xDE, 0xAD])));
        assert_eq!(scan("%2%DEADBEEF%"), None);
        assert_eq!(scan("%%AB%"), None);
        assert_eq!(scan("%1%GG%"), None);
    }

    #[test]
    fn addresses() {
        assert_eq!(scan("@10.0.0.1"), Some(Value::Address(Ipv4Addr::new(10, 0, 0, 1))));
        assert_eq!(scan("@255.255.255.255"), Some(Value::Address(Ipv4Addr::BROADCAST)));
        assert_eq!(scan("@256.0.0.1"), None);
        assert_eq!(scan("@1.2.3"), None);
    }

    #[test]
    fn date_times() {
        assert_eq!(scan("$D2016-03-22"), Some(Value::from(DateTime::date(2016, 3, 22))));
        assert_eq!(scan("$T09:05:00.042"), Some(Value::from(DateTime::time(9, 5, 0, 42))));
        assert_eq!(scan("$T23:59:59"), Some(Value::from(DateTime::time(23, 59, 59, 0))));
        assert_eq!(scan("$T12:00:00.5"), Some(Value::from(DateTime::time(12, 0, 0, 500))));
        assert_eq!(scan("$D2016-13-01"), None);
        assert_eq!(scan("$T24:00:00"), None);
        assert_eq!(scan("$X1"), None);
    }

    #[test]
    fn arrays() {
        let value = scan("( 1 2.5 \"x\" )").unwrap();
        let arr = value.as_array().unwrap();
        assert_eq!(arr.len(), 3);
        assert_eq!(arr.get(0), Some(&Value::from(1)));
        assert_eq!(arr.get(1), Some(&Value::from(2.5)));
        assert_eq!(arr.get(2), Some(&Value::from("x")));
        assert_eq!(scan("()").unwrap().as_array().unwrap().len(), 0);
        assert_eq!(scan("(1 2"), None);
    }

    #[test]
    fn nested_containers() {
        let value = scan("( ( true ) ( false true ) )").unwrap();
        let arr = value.as_array().unwrap();
        assert_eq!(arr.len(), 2);
        assert_eq!(arr.get(1).unwrap().as_array().unwrap().len(), 2);
    }

    #[test]
    fn sets_enforce_kind() {
        let value = scan("[ 3 1 2 ]").unwrap();
        let set = value.as_set().unwrap();
        assert_eq!(set.len(), 3);
        assert!(set.contains(&Value::from(2)));
        assert_eq!(scan("[ 1 true ]"), None);
        assert_eq!(scan("[ 1 1 ]").unwrap().as_set().unwrap().len(), 1);
    }

    #[test]
    fn maps() {
        let value = scan("{ 1 > \"a\" , 2 > \"b\" }").unwrap();
        let map = value.as_map().unwrap();
        assert_eq!(map.len(), 2);
        assert_eq!(map.get(&Value::from(1)), Some(&Value::from("a")));
        // Comma is optional after whitespace.
        let value = scan("{ 1 > 10 2 > 20 }").unwrap();
        assert_eq!(value.as_map().unwrap().len(), 2);
        // Squished form reads back too.
        let value = scan("{1>10, 2>20}").unwrap();
        assert_eq!(value.as_map().unwrap().len(), 2);
        assert_eq!(scan("{ 1 > 2, true > 3 }"), None);
        assert_eq!(scan("{ 1 2 }"), None);
        assert_eq!(scan("{ 1.5 > 2 }"), None);
    }

    #[test]
    fn terminators_bound_scalars() {
        let mut buf = StringBuffer::new();
        buf.add_string("42)");
        let mut position = 0;
        assert_eq!(read_value(&buf, &mut position), Some(Value::from(42)));
        assert_eq!(position, 2);
    }

    #[test]
    fn unrecognized_leading_character() {
        assert_eq!(scan("#nope"), None);
        assert_eq!(scan(""), None);
    }
}
