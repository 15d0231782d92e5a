//! Serde serialization for [`Value`].
//!
//! Values map onto the serde data model on a best-effort basis: UTF-8
//! strings travel as strings and any other byte payload as bytes;
//! addresses and date/times, which have no serde analogue, travel as
//! their display strings. This is an interop surface, not a third wire
//! format - the textual and binary codecs are the round-trip-faithful
//! representations.

use serde::ser::{Serialize, SerializeMap, SerializeSeq, Serializer};

use crate::value::Value;

impl Serialize for Value {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Value::Logical(v) => serializer.serialize_bool(*v),
            Value::Integer(v) => serializer.serialize_i64(*v),
            Value::Double(v) => serializer.serialize_f64(*v),
            Value::String(v) => match std::str::from_utf8(v) {
                Ok(text) => serializer.serialize_str(text),
                Err(_) => serializer.serialize_bytes(v),
            },
            Value::Blob(v) => serde_bytes::Bytes::new(v).serialize(serializer),
            Value::Address(v) => serializer.serialize_str(&v.to_string()),
            Value::DateTime(v) => serializer.serialize_str(&v.to_string()),
            Value::Array(arr) => {
                let mut seq = serializer.serialize_seq(Some(arr.len()))?;
                for element in arr.iter() {
                    seq.serialize_element(element)?;
                }
                seq.end()
            }
            Value::Set(set) => {
                let mut seq = serializer.serialize_seq(Some(set.len()))?;
                for element in set.iter() {
                    seq.serialize_element(element)?;
                }
                seq.end()
            }
            Value::Map(map) => {
                let mut out = serializer.serialize_map(Some(map.len()))?;
                for (key, value) in map.iter() {
                    out.serialize_entry(key, value)?;
                }
                out.end()
            }
            Value::Flaw(flaw) => Err(serde::ser::Error::custom(format!(
                "flaw values cannot be serialized: {}",
                flaw
            ))),
        }
    }
}
