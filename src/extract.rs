//! Binary extraction: values out of a message's byte stream.
//!
//! Dispatch is a match over the lead byte's family and subtype fields.
//! Extractors follow a common contract: they advance the position past
//! the whole encoded value, return `None` when the buffer runs out
//! mid-value, return a [`Flaw`] for structural defects, and - when handed
//! a parent array - append their result to it (the double-run extractor
//! appends each double of the run as it goes). Container extractors check
//! every child for a flaw and propagate it, discarding the partial
//! container.

use std::net::Ipv4Addr;

use crate::array::Array;
use crate::chunk::ChunkArray;
use crate::date_time::DateTime;
use crate::map::Map;
use crate::set::Set;
use crate::tag;
use crate::utils::{double_from_bytes, int_from_bytes};
use crate::value::{Flaw, Value};

/// Read one encoded value whose lead byte is at `*position`.
pub(crate) fn value_from_message(
    buf: &ChunkArray,
    position: &mut usize,
    parent: Option<&mut Array>,
) -> Option<Value> {
    let lead = buf.get_byte(*position)?;
    let result = match lead & tag::FAMILY_MASK {
        tag::FAMILY_INTEGER => extract_integer_value(buf, position, lead),
        tag::FAMILY_DOUBLE => return extract_double_run(buf, position, lead, parent),
        tag::FAMILY_STRING_OR_BLOB => extract_string_or_blob(buf, position, lead),
        _ => match lead & tag::OTHER_TYPE_MASK {
            tag::OTHER_MISCELLANEOUS => extract_miscellaneous(buf, position, lead),
            tag::OTHER_CONTAINER_START => match lead & tag::CONTAINER_TYPE_MASK {
                tag::CONTAINER_ARRAY => extract_array(buf, position, lead),
                tag::CONTAINER_MAP => extract_map(buf, position, lead),
                tag::CONTAINER_SET => extract_set(buf, position, lead),
                _ => {
                    *position += 1;
                    Some(flaw("Reserved container type", *position))
                }
            },
            tag::OTHER_CONTAINER_END => {
                *position += 1;
                Some(flaw("Unexpected container end tag", *position))
            }
            _ => {
                *position += 1;
                Some(flaw("Message tag inside a value", *position))
            }
        },
    };
    if let (Some(parent), Some(value)) = (parent, result.as_ref()) {
        if !value.is_flaw() {
            parent.add_value(value.clone());
        }
    }
    result
}

fn flaw(description: &str, offset: usize) -> Value {
    Value::Flaw(Flaw::new(description, offset))
}

/// Read `count` raw bytes, advancing past them. Preallocation is capped
/// so a hostile length cannot force a giant allocation before the
/// underflow check catches it.
fn take_bytes(buf: &ChunkArray, position: &mut usize, count: usize) -> Option<Vec<u8>> {
    let mut bytes = Vec::with_capacity(count.min(crate::chunk::CHUNK_SIZE));
    for _ in 0..count {
        bytes.push(buf.get_byte(*position)?);
        *position += 1;
    }
    Some(bytes)
}

/// Decode an integer-family value whose lead byte has already been
/// inspected. Used both for integer values and for the trailing counts
/// of containers.
pub(crate) fn extract_integer(buf: &ChunkArray, position: &mut usize, lead: u8) -> Option<i64> {
    if lead & tag::FAMILY_MASK != tag::FAMILY_INTEGER {
        return None;
    }
    *position += 1;
    if lead & tag::INTEGER_SIZE_MASK == tag::INTEGER_SHORT {
        let mut value = (lead & tag::INTEGER_SHORT_VALUE_MASK) as i64;
        if lead & tag::INTEGER_SHORT_SIGN_BIT != 0 {
            value -= (tag::INTEGER_SHORT_VALUE_MASK as i64) + 1;
        }
        Some(value)
    } else {
        let size = (lead & tag::INTEGER_LONG_COUNT_MASK) as usize + 1;
        let bytes = take_bytes(buf, position, size)?;
        Some(int_from_bytes(&bytes, size))
    }
}

fn extract_integer_value(buf: &ChunkArray, position: &mut usize, lead: u8) -> Option<Value> {
    extract_integer(buf, position, lead).map(Value::Integer)
}

/// Read a run of doubles. A run longer than one is only meaningful while
/// filling an array, so a missing parent is a structural defect.
fn extract_double_run(
    buf: &ChunkArray,
    position: &mut usize,
    lead: u8,
    parent: Option<&mut Array>,
) -> Option<Value> {
    *position += 1;
    let how_many = if lead & tag::DOUBLE_COUNT_MASK == tag::DOUBLE_SHORT_COUNT {
        (lead & tag::DOUBLE_SHORT_COUNT_MASK) as i64 + 1
    } else {
        let size = (lead & tag::DOUBLE_LONG_COUNT_MASK) as usize + 1;
        let bytes = take_bytes(buf, position, size)?;
        int_from_bytes(&bytes, size)
    };
    if how_many <= 0 {
        return None;
    }
    if how_many > 1 && parent.is_none() {
        return Some(flaw("Bad count for Double", *position));
    }
    // Appending happens here rather than in the dispatch wrapper so each
    // double of the run lands in the parent, not just the last.
    let mut parent = parent;
    let mut result = None;
    for _ in 0..how_many {
        let bytes = take_bytes(buf, position, 8)?;
        let value = Value::Double(double_from_bytes(&bytes.try_into().unwrap()));
        if let Some(parent) = parent.as_deref_mut() {
            parent.add_value(value.clone());
        }
        result = Some(value);
    }
    result
}

fn extract_string_or_blob(buf: &ChunkArray, position: &mut usize, lead: u8) -> Option<Value> {
    *position += 1;
    let length = if lead & tag::STRING_OR_BLOB_LENGTH_MASK == tag::STRING_OR_BLOB_SHORT_LENGTH {
        (lead & tag::STRING_OR_BLOB_SHORT_LENGTH_MASK) as i64
    } else {
        let size = (lead & tag::STRING_OR_BLOB_LONG_LENGTH_MASK) as usize + 1;
        let bytes = take_bytes(buf, position, size)?;
        int_from_bytes(&bytes, size)
    };
    if length < 0 {
        return Some(flaw("Negative length for String or Blob", *position));
    }
    let payload = take_bytes(buf, position, length as usize)?;
    if lead & tag::STRING_OR_BLOB_TYPE_MASK == tag::STRING_OR_BLOB_STRING {
        Some(Value::String(payload))
    } else {
        Some(Value::Blob(payload))
    }
}

fn extract_miscellaneous(buf: &ChunkArray, position: &mut usize, lead: u8) -> Option<Value> {
    match lead & tag::MISC_TYPE_MASK {
        tag::MISC_LOGICAL => {
            *position += 1;
            Some(Value::Logical(lead & tag::LOGICAL_VALUE_MASK == tag::LOGICAL_TRUE))
        }
        tag::MISC_ADDRESS => {
            *position += 1;
            let octets = take_bytes(buf, position, 4)?;
            Some(Value::Address(Ipv4Addr::new(octets[0], octets[1], octets[2], octets[3])))
        }
        tag::MISC_DATE_TIME => {
            *position += 1;
            let bytes = take_bytes(buf, position, 4)?;
            let raw = u32::from_be_bytes(bytes.try_into().unwrap());
            let is_date = lead & tag::DATE_TIME_VALUE_MASK == tag::DATE_TIME_DATE;
            Some(Value::DateTime(DateTime::from_raw(raw, is_date)))
        }
        _ => {
            *position += 1;
            Some(flaw("Unsupported miscellaneous subtype", *position))
        }
    }
}

/// Read the biased element count that follows a non-empty container
/// start tag, returning the unbiased count.
fn extract_container_count(buf: &ChunkArray, position: &mut usize) -> Option<i64> {
    let lead = buf.get_byte(*position)?;
    let biased = extract_integer(buf, position, lead)?;
    Some(biased.saturating_sub(tag::CONTAINER_COUNT_BIAS))
}

/// Check for the expected end tag, consuming it on a match.
fn expect_end_tag(
    buf: &ChunkArray,
    position: &mut usize,
    container: u8,
    non_empty: bool,
) -> Option<bool> {
    let byte = buf.get_byte(*position)?;
    if byte == tag::container_end(container, non_empty) {
        *position += 1;
        Some(true)
    } else {
        Some(false)
    }
}

fn extract_array(buf: &ChunkArray, position: &mut usize, lead: u8) -> Option<Value> {
    let is_empty = lead & tag::CONTAINER_EMPTY_MASK == tag::CONTAINER_EMPTY;
    *position += 1;
    if is_empty {
        return match expect_end_tag(buf, position, tag::CONTAINER_ARRAY, false)? {
            true => Some(Value::Array(Array::new())),
            false => Some(flaw("Empty Array with incorrect end tag", *position)),
        };
    }
    let count = extract_container_count(buf, position)?;
    if count <= 0 {
        return Some(flaw("Array with zero or negative count", *position));
    }
    let mut array = Array::with_capacity((count as usize).min(crate::chunk::CHUNK_SIZE));
    while (array.len() as i64) < count {
        let element = value_from_message(buf, position, Some(&mut array))?;
        if element.is_flaw() {
            return Some(element);
        }
    }
    match expect_end_tag(buf, position, tag::CONTAINER_ARRAY, true)? {
        true => Some(Value::Array(array)),
        false => Some(flaw("Non-empty Array with incorrect end tag", *position)),
    }
}

fn extract_map(buf: &ChunkArray, position: &mut usize, lead: u8) -> Option<Value> {
    let is_empty = lead & tag::CONTAINER_EMPTY_MASK == tag::CONTAINER_EMPTY;
    *position += 1;
    if is_empty {
        return match expect_end_tag(buf, position, tag::CONTAINER_MAP, false)? {
            true => Some(Value::Map(Map::new())),
            false => Some(flaw("Empty Map with incorrect end tag", *position)),
        };
    }
    let count = extract_container_count(buf, position)?;
    if count <= 0 {
        return Some(flaw("Map with zero or negative count", *position));
    }
    let mut map = Map::new();
    while (map.len() as i64) < count {
        let key = value_from_message(buf, position, None)?;
        if key.is_flaw() {
            return Some(key);
        }
        let value = value_from_message(buf, position, None)?;
        if value.is_flaw() {
            return Some(value);
        }
        // A key whose kind disagrees with the map's is dropped silently;
        // the loop keeps reading entries until the count is satisfied.
        map.add_value(key, value);
    }
    match expect_end_tag(buf, position, tag::CONTAINER_MAP, true)? {
        true => Some(Value::Map(map)),
        false => Some(flaw("Non-empty Map with incorrect end tag", *position)),
    }
}

fn extract_set(buf: &ChunkArray, position: &mut usize, lead: u8) -> Option<Value> {
    let is_empty = lead & tag::CONTAINER_EMPTY_MASK == tag::CONTAINER_EMPTY;
    *position += 1;
    if is_empty {
        return match expect_end_tag(buf, position, tag::CONTAINER_SET, false)? {
            true => Some(Value::Set(Set::new())),
            false => Some(flaw("Empty Set with incorrect end tag", *position)),
        };
    }
    let count = extract_container_count(buf, position)?;
    if count <= 0 {
        return Some(flaw("Set with zero or negative count", *position));
    }
    let mut set = Set::new();
    while (set.len() as i64) < count {
        let element = value_from_message(buf, position, None)?;
        if element.is_flaw() {
            return Some(element);
        }
        set.add_value(element);
    }
    match expect_end_tag(buf, position, tag::CONTAINER_SET, true)? {
        true => Some(Value::Set(set)),
        false => Some(flaw("Non-empty Set with incorrect end tag", *position)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::encode::write_value;

    fn round_trip(value: &Value) -> Option<Value> {
        let mut out = ChunkArray::new();
        write_value(value, &mut out);
        let mut position = 0;
        let result = value_from_message(&out, &mut position, None);
        assert_eq!(position, out.len(), "extraction must consume every byte");
        result
    }

    fn extract(bytes: &[u8]) -> (Option<Value>, usize) {
        let mut buf = ChunkArray::new();
        buf.append_bytes(bytes);
        let mut position = 0;
        (value_from_message(&buf, &mut position, None), position)
    }

    #[test]
    fn scalar_round_trips() {
        for value in [
            Value::from(true),
            Value::from(false),
            Value::from(0),
            Value::from(15),
            Value::from(-16),
            Value::from(42),
            Value::from(-17),
            Value::from(i64::MAX),
            Value::from(i64::MIN),
            Value::from(2.5),
            Value::from(-0.0),
            Value::from("ab"),
            Value::from(""),
            Value::string((0u8..=255).collect::<Vec<u8>>()),
            Value::blob(vec![0xDE, 0xAD, 0xBE, 0xEF]),
            Value::from(Ipv4Addr::new(192, 168, 1, 1)),
            Value::from(DateTime::date(2016, 3, 22)),
            Value::from(DateTime::time(23, 59, 59, 999)),
        ] {
            assert_eq!(round_trip(&value), Some(value));
        }
    }

    #[test]
    fn integer_byte_boundaries() {
        for shift in 0..63 {
            let value = 1i64 << shift;
            for candidate in [value - 1, value, value.wrapping_neg()] {
                let v = Value::from(candidate);
                assert_eq!(round_trip(&v), Some(v));
            }
        }
    }

    #[test]
    fn container_round_trips_at_bias_boundaries() {
        for size in [1usize, 16, 17, 1000] {
            let arr: Array = (0..size as i64).map(Value::from).collect();
            let value = Value::Array(arr);
            assert_eq!(round_trip(&value), Some(value));
        }
    }

    #[test]
    fn empty_container_round_trips() {
        for value in [
            Value::Array(Array::new()),
            Value::Map(Map::new()),
            Value::Set(Set::new()),
        ] {
            assert_eq!(round_trip(&value), Some(value));
        }
    }

    #[test]
    fn nested_structure_round_trips() {
        let mut map = Map::new();
        map.add_value(Value::from(1), Value::from("one"));
        map.add_value(Value::from(2), Value::Array(Array::from(vec![
            Value::from(1.5),
            Value::from(2.5),
            Value::from(true),
        ])));
        let mut set = Set::new();
        set.add_value(Value::from("x"));
        set.add_value(Value::from("y"));
        let mut outer = Array::new();
        outer.add_value(Value::Map(map));
        outer.add_value(Value::Set(set));
        outer.add_value(Value::from(DateTime::time(1, 2, 3, 4)));
        let value = Value::Array(outer);
        assert_eq!(round_trip(&value), Some(value));
    }

    #[test]
    fn double_run_restores_individual_elements() {
        let arr: Array = vec![1.0f64, 2.0, 3.0, 4.0].into_iter().map(Value::from).collect();
        let value = Value::Array(arr);
        let result = round_trip(&value).unwrap();
        let restored = result.as_array().unwrap();
        assert_eq!(restored.len(), 4);
        assert_eq!(restored.get(3), Some(&Value::from(4.0)));
    }

    #[test]
    fn long_double_run_round_trips() {
        let arr: Array = (0..40).map(|i| Value::from(i as f64 * 0.5)).collect();
        let value = Value::Array(arr);
        assert_eq!(round_trip(&value), Some(value));
    }

    #[test]
    fn underflow_returns_none() {
        // Long integer promising two bytes, delivering one.
        assert_eq!(extract(&[0x21, 0x12]).0, None);
        // String promising five bytes, delivering three.
        assert_eq!(extract(&[0x85, b'a', b'b', b'c']).0, None);
        // Array that never ends.
        assert_eq!(extract(&[0xD1, 0x10, 0xC1]).0, None);
        // Empty buffer.
        assert_eq!(extract(&[]).0, None);
    }

    #[test]
    fn structural_defects_are_flaws() {
        // Zero count: biased count of -17 has no preimage.
        let (result, _) = extract(&[0xD1, 0x20, 0xEF, 0xE1]);
        assert!(result.unwrap().as_flaw().is_some());
        // Mismatched end tag variant.
        let (result, _) = extract(&[0xD1, 0x10, 0xC1, 0xE5]);
        let flaw = result.unwrap();
        let flaw = flaw.as_flaw().unwrap();
        assert!(flaw.description().contains("end tag"));
        assert!(flaw.offset() <= 4);
        // Empty-start paired with non-empty end.
        let (result, _) = extract(&[0xD0, 0xE1]);
        assert!(result.unwrap().is_flaw());
        // Reserved container type.
        let (result, _) = extract(&[0xDC]);
        assert!(result.unwrap().is_flaw());
        // Reserved miscellaneous subtype.
        let (result, _) = extract(&[0xCC]);
        assert!(result.unwrap().is_flaw());
        // Bare container end tag.
        let (result, _) = extract(&[0xE1]);
        assert!(result.unwrap().is_flaw());
        // Top-level double run longer than one.
        let (result, _) = extract(&[0x41, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0]);
        assert!(result.unwrap().is_flaw());
    }

    #[test]
    fn flaw_propagates_out_of_containers() {
        // Array of one element whose payload is a reserved subtype.
        let (result, _) = extract(&[0xD1, 0x10, 0xCC, 0xE1]);
        let result = result.unwrap();
        assert_eq!(result.as_flaw().unwrap().description(), "Unsupported miscellaneous subtype");
    }

    #[test]
    fn map_key_kind_mismatch_drops_entry() {
        // Count of two; first entry keyed by an integer, second by a
        // logical, third by an integer again. The mismatched entry is
        // dropped and the loop reads on.
        let bytes = [
            0xD5, 0x11, // map start, count 2
            0x01, 0xC1, // 1 > true
            0xC0, 0x00, // false > 0 (dropped: wrong key kind)
            0x02, 0xC0, // 2 > false
            0xE5, // map end
        ];
        let (result, _) = extract(&bytes);
        let result = result.unwrap();
        let map = result.as_map().unwrap();
        assert_eq!(map.len(), 2);
        assert_eq!(map.get(&Value::from(1)), Some(&Value::from(true)));
        assert_eq!(map.get(&Value::from(2)), Some(&Value::from(false)));
    }

    #[test]
    fn map_round_trips_with_various_key_kinds() {
        for key in [
            Value::from(true),
            Value::from(9),
            Value::from("k"),
            Value::from(Ipv4Addr::new(1, 2, 3, 4)),
            Value::from(DateTime::date(2020, 6, 1)),
        ] {
            let mut map = Map::new();
            assert!(map.add_value(key, Value::from(0)));
            let value = Value::Map(map);
            assert_eq!(round_trip(&value), Some(value));
        }
    }

    #[test]
    fn extraction_never_reads_past_the_buffer() {
        // Truncations of a valid encoding either extract cleanly, return
        // None, or return a flaw whose offset is inside the buffer.
        let mut out = ChunkArray::new();
        let mut map = Map::new();
        map.add_value(Value::from("key"), Value::from(1.25));
        write_value(
            &Value::Array(Array::from(vec![Value::from(42), Value::Map(map)])),
            &mut out,
        );
        let full = out.bytes();
        for cut in 0..full.len() {
            let (result, position) = extract(&full[..cut]);
            assert!(position <= cut);
            if let Some(value) = result {
                if let Some(flaw) = value.as_flaw() {
                    assert!(flaw.offset() <= cut);
                }
            }
        }
    }
}
