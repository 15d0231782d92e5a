//! Binary writing: values into a message's byte stream.
//!
//! Every value leads with a single tag byte (see [`tag`](crate::tag)).
//! Consecutive doubles inside an array collapse into one run per maximal
//! block, a wire-size optimization the extractor undoes by appending the
//! run's doubles individually.

use crate::array::Array;
use crate::chunk::ChunkArray;
use crate::map::Map;
use crate::set::Set;
use crate::tag;
use crate::utils::{double_to_bytes, int_to_min_bytes};
use crate::value::Value;

pub(crate) fn write_value(value: &Value, out: &mut ChunkArray) {
    match value {
        Value::Logical(v) => {
            let lead = tag::FAMILY_OTHER
                | tag::OTHER_MISCELLANEOUS
                | tag::MISC_LOGICAL
                | if *v { tag::LOGICAL_TRUE } else { tag::LOGICAL_FALSE };
            out.append_bytes(&[lead]);
        }
        Value::Integer(v) => write_integer(*v, out),
        Value::Double(v) => write_double_run(&[*v], out),
        Value::String(v) => write_bytes_value(v, tag::STRING_OR_BLOB_STRING, out),
        Value::Blob(v) => write_bytes_value(v, tag::STRING_OR_BLOB_BLOB, out),
        Value::Address(v) => {
            let lead = tag::FAMILY_OTHER | tag::OTHER_MISCELLANEOUS | tag::MISC_ADDRESS;
            out.append_bytes(&[lead]);
            out.append_bytes(&v.octets());
        }
        Value::DateTime(v) => {
            let lead = tag::FAMILY_OTHER
                | tag::OTHER_MISCELLANEOUS
                | tag::MISC_DATE_TIME
                | if v.is_date() { tag::DATE_TIME_DATE } else { tag::DATE_TIME_TIME };
            out.append_bytes(&[lead]);
            out.append_bytes(&v.raw().to_be_bytes());
        }
        Value::Array(v) => write_array(v, out),
        Value::Map(v) => write_map(v, out),
        Value::Set(v) => write_set(v, out),
        // Flaws have no wire form; Message::write_value rejects any tree
        // containing one before encoding starts, so this arm is never
        // reached through a message.
        Value::Flaw(_) => {}
    }
}

/// Write a signed integer: inline when it fits the 5-bit short form,
/// otherwise a long tag followed by the fewest sign-carrying bytes.
pub(crate) fn write_integer(value: i64, out: &mut ChunkArray) {
    if (tag::INTEGER_SHORT_MIN..=tag::INTEGER_SHORT_MAX).contains(&value) {
        let lead = tag::FAMILY_INTEGER
            | tag::INTEGER_SHORT
            | (value as u8 & tag::INTEGER_SHORT_VALUE_MASK);
        out.append_bytes(&[lead]);
    } else {
        let (buf, len) = int_to_min_bytes(value);
        let lead = tag::FAMILY_INTEGER
            | tag::INTEGER_LONG
            | (tag::INTEGER_LONG_COUNT_MASK & (len - 1) as u8);
        out.append_bytes(&[lead]);
        out.append_bytes(&buf[8 - len..]);
    }
}

/// Write a run of doubles under a single count-carrying lead byte.
fn write_double_run(values: &[f64], out: &mut ChunkArray) {
    if values.is_empty() {
        return;
    }
    if values.len() <= tag::DOUBLE_SHORT_COUNT_MAX {
        let lead = tag::FAMILY_DOUBLE
            | tag::DOUBLE_SHORT_COUNT
            | (tag::DOUBLE_SHORT_COUNT_MASK & (values.len() - 1) as u8);
        out.append_bytes(&[lead]);
    } else {
        let (buf, len) = int_to_min_bytes(values.len() as i64);
        let lead = tag::FAMILY_DOUBLE
            | tag::DOUBLE_LONG_COUNT
            | (tag::DOUBLE_LONG_COUNT_MASK & (len - 1) as u8);
        out.append_bytes(&[lead]);
        out.append_bytes(&buf[8 - len..]);
    }
    for &value in values {
        out.append_bytes(&double_to_bytes(value));
    }
}

fn write_bytes_value(payload: &[u8], type_bit: u8, out: &mut ChunkArray) {
    if payload.len() <= tag::STRING_OR_BLOB_SHORT_LENGTH_MAX {
        let lead = tag::FAMILY_STRING_OR_BLOB
            | type_bit
            | tag::STRING_OR_BLOB_SHORT_LENGTH
            | (tag::STRING_OR_BLOB_SHORT_LENGTH_MASK & payload.len() as u8);
        out.append_bytes(&[lead]);
    } else {
        let (buf, len) = int_to_min_bytes(payload.len() as i64);
        let lead = tag::FAMILY_STRING_OR_BLOB
            | type_bit
            | tag::STRING_OR_BLOB_LONG_LENGTH
            | (tag::STRING_OR_BLOB_LONG_LENGTH_MASK & (len - 1) as u8);
        out.append_bytes(&[lead]);
        out.append_bytes(&buf[8 - len..]);
    }
    out.append_bytes(payload);
}

/// The biased element count that follows every non-empty container start
/// tag: one maps to the minimum short integer, so zero and negative
/// counts cannot appear on the wire.
fn write_container_count(len: usize, out: &mut ChunkArray) {
    write_integer(len as i64 + tag::CONTAINER_COUNT_BIAS, out);
}

fn write_array(array: &Array, out: &mut ChunkArray) {
    if array.is_empty() {
        out.append_bytes(&[
            tag::container_start(tag::CONTAINER_ARRAY, false),
            tag::container_end(tag::CONTAINER_ARRAY, false),
        ]);
        return;
    }
    out.append_bytes(&[tag::container_start(tag::CONTAINER_ARRAY, true)]);
    write_container_count(array.len(), out);
    let mut run: Vec<f64> = Vec::new();
    for element in array.iter() {
        if let Value::Double(v) = element {
            run.push(*v);
        } else {
            write_double_run(&run, out);
            run.clear();
            write_value(element, out);
        }
    }
    write_double_run(&run, out);
    out.append_bytes(&[tag::container_end(tag::CONTAINER_ARRAY, true)]);
}

fn write_map(map: &Map, out: &mut ChunkArray) {
    if map.is_empty() {
        out.append_bytes(&[
            tag::container_start(tag::CONTAINER_MAP, false),
            tag::container_end(tag::CONTAINER_MAP, false),
        ]);
        return;
    }
    out.append_bytes(&[tag::container_start(tag::CONTAINER_MAP, true)]);
    write_container_count(map.len(), out);
    for (key, value) in map.iter() {
        write_value(key, out);
        write_value(value, out);
    }
    out.append_bytes(&[tag::container_end(tag::CONTAINER_MAP, true)]);
}

fn write_set(set: &Set, out: &mut ChunkArray) {
    if set.is_empty() {
        out.append_bytes(&[
            tag::container_start(tag::CONTAINER_SET, false),
            tag::container_end(tag::CONTAINER_SET, false),
        ]);
        return;
    }
    out.append_bytes(&[tag::container_start(tag::CONTAINER_SET, true)]);
    write_container_count(set.len(), out);
    for element in set.iter() {
        write_value(element, out);
    }
    out.append_bytes(&[tag::container_end(tag::CONTAINER_SET, true)]);
}
