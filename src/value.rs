//! The value tree at the center of the wire formats.

use std::fmt;
use std::net::Ipv4Addr;

use crate::array::Array;
use crate::date_time::DateTime;
use crate::map::Map;
use crate::set::Set;
use crate::string_buffer::StringBuffer;
use crate::tag;

/// The enumeration kind of a value, used to keep map and set keys
/// homogeneous. Containers, doubles, blobs, and flaws are not enumerable;
/// an empty map or set has kind `Unknown` until its first insertion.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Kind {
    #[default]
    Unknown,
    Address,
    Logical,
    Integer,
    String,
    Date,
    Time,
    NotEnumerable,
}

/// A structural defect found during extraction, carried in-band as a
/// value so container extraction can propagate it without a second error
/// channel.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Flaw {
    description: String,
    offset: usize,
}

impl Flaw {
    pub fn new(description: impl Into<String>, offset: usize) -> Self {
        Flaw { description: description.into(), offset }
    }

    /// What went wrong.
    pub fn description(&self) -> &str {
        &self.description
    }

    /// Byte offset where the defect was detected.
    pub fn offset(&self) -> usize {
        self.offset
    }
}

impl fmt::Display for Flaw {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{} @{}", self.description, self.offset)
    }
}

/// A typed value. Scalars hold their state inline; containers own their
/// elements with value semantics, so clones and equality are deep.
#[derive(Clone, Debug, PartialEq)]
pub enum Value {
    Logical(bool),
    Integer(i64),
    Double(f64),
    /// Arbitrary bytes, usually but not necessarily UTF-8.
    String(Vec<u8>),
    /// Opaque bytes with no textual interpretation.
    Blob(Vec<u8>),
    Address(Ipv4Addr),
    DateTime(DateTime),
    Array(Array),
    Map(Map),
    Set(Set),
    Flaw(Flaw),
}

impl Value {
    /// Build a string value from anything byte-like.
    pub fn string(bytes: impl AsRef<[u8]>) -> Self {
        Value::String(bytes.as_ref().to_vec())
    }

    /// Build a blob value.
    pub fn blob(bytes: impl AsRef<[u8]>) -> Self {
        Value::Blob(bytes.as_ref().to_vec())
    }

    /// The enumeration kind of this value.
    pub fn kind(&self) -> Kind {
        match self {
            Value::Logical(_) => Kind::Logical,
            Value::Integer(_) => Kind::Integer,
            Value::String(_) => Kind::String,
            Value::Address(_) => Kind::Address,
            Value::DateTime(dt) => {
                if dt.is_date() {
                    Kind::Date
                } else {
                    Kind::Time
                }
            }
            _ => Kind::NotEnumerable,
        }
    }

    /// Whether this value may be used as a map or set key.
    pub fn is_enumerable(&self) -> bool {
        !matches!(self.kind(), Kind::Unknown | Kind::NotEnumerable)
    }

    /// The two-bit expected-type code carried in a message envelope.
    pub fn type_tag(&self) -> u8 {
        match self {
            Value::Integer(_) => tag::EXPECTED_INTEGER,
            Value::Double(_) => tag::EXPECTED_DOUBLE,
            Value::String(_) | Value::Blob(_) => tag::EXPECTED_STRING_OR_BLOB,
            _ => tag::EXPECTED_OTHER,
        }
    }

    pub fn as_logical(&self) -> Option<bool> {
        match self {
            Value::Logical(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_integer(&self) -> Option<i64> {
        match self {
            Value::Integer(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_double(&self) -> Option<f64> {
        match self {
            Value::Double(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_string(&self) -> Option<&[u8]> {
        match self {
            Value::String(v) => Some(v),
            _ => None,
        }
    }

    /// The string payload when it happens to be valid UTF-8.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(v) => std::str::from_utf8(v).ok(),
            _ => None,
        }
    }

    pub fn as_blob(&self) -> Option<&[u8]> {
        match self {
            Value::Blob(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_address(&self) -> Option<Ipv4Addr> {
        match self {
            Value::Address(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_date_time(&self) -> Option<DateTime> {
        match self {
            Value::DateTime(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_array(&self) -> Option<&Array> {
        match self {
            Value::Array(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_map(&self) -> Option<&Map> {
        match self {
            Value::Map(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_set(&self) -> Option<&Set> {
        match self {
            Value::Set(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_flaw(&self) -> Option<&Flaw> {
        match self {
            Value::Flaw(v) => Some(v),
            _ => None,
        }
    }

    pub fn is_flaw(&self) -> bool {
        matches!(self, Value::Flaw(_))
    }

    /// The first flaw anywhere in this tree, descending into containers.
    pub fn find_flaw(&self) -> Option<&Flaw> {
        match self {
            Value::Flaw(flaw) => Some(flaw),
            Value::Array(arr) => arr.iter().find_map(Value::find_flaw),
            Value::Set(set) => set.iter().find_map(Value::find_flaw),
            Value::Map(map) => map
                .iter()
                .find_map(|(key, value)| key.find_flaw().or_else(|| value.find_flaw())),
            _ => None,
        }
    }

    pub fn is_container(&self) -> bool {
        matches!(self, Value::Array(_) | Value::Map(_) | Value::Set(_))
    }

    /// Structural equality: same variant, same size, element-wise equal in
    /// iteration order. Same as `==`; named to distinguish it from the
    /// lifted `equal_to` comparison.
    pub fn deeply_equal_to(&self, other: &Value) -> bool {
        self == other
    }

    /// Three-valued `<`. `None` means the operands are incomparable.
    pub fn less_than(&self, other: &Value) -> Option<bool> {
        crate::compare::compare(self, other, crate::compare::Op::Less)
    }

    /// Three-valued `<=`.
    pub fn less_than_or_equal(&self, other: &Value) -> Option<bool> {
        crate::compare::compare(self, other, crate::compare::Op::LessOrEqual)
    }

    /// Three-valued `>`.
    pub fn greater_than(&self, other: &Value) -> Option<bool> {
        crate::compare::compare(self, other, crate::compare::Op::Greater)
    }

    /// Three-valued `>=`.
    pub fn greater_than_or_equal(&self, other: &Value) -> Option<bool> {
        crate::compare::compare(self, other, crate::compare::Op::GreaterOrEqual)
    }

    /// Print the canonical textual form. `squished` drops optional
    /// padding while keeping separators.
    pub fn print_to(&self, out: &mut StringBuffer, squished: bool) {
        crate::print::print_value(self, out, squished);
    }

    /// Print the JSON rendering. `as_key` forces scalars into quoted
    /// strings, since JSON keys must be strings.
    pub fn print_json_to(&self, out: &mut StringBuffer, as_key: bool, squished: bool) {
        crate::print::print_value_json(self, out, as_key, squished);
    }

    /// A short human-readable summary of the value's type and shape.
    pub fn describe(&self) -> String {
        match self {
            Value::Logical(v) => format!("logical ({})", v),
            Value::Integer(v) => format!("integer ({})", v),
            Value::Double(v) => format!("double ({})", v),
            Value::String(v) => format!("string of {} bytes", v.len()),
            Value::Blob(v) => format!("blob of {} bytes", v.len()),
            Value::Address(v) => format!("address ({})", v),
            Value::DateTime(v) if v.is_date() => format!("date ({})", v),
            Value::DateTime(v) => format!("time ({})", v),
            Value::Array(v) => format!("array of {} elements", v.len()),
            Value::Map(v) => format!("map of {} entries", v.len()),
            Value::Set(v) => format!("set of {} elements", v.len()),
            Value::Flaw(v) => format!("flaw ({})", v),
        }
    }
}

impl fmt::Display for Value {
    /// The canonical textual form, unsquished.
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let mut buf = StringBuffer::new();
        self.print_to(&mut buf, false);
        f.write_str(&String::from_utf8_lossy(&buf.bytes()))
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Value {
        Value::Logical(v)
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Value {
        Value::Integer(v)
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Value {
        Value::Integer(v as i64)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Value {
        Value::Double(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Value {
        Value::String(v.as_bytes().to_vec())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Value {
        Value::String(v.into_bytes())
    }
}

impl From<Ipv4Addr> for Value {
    fn from(v: Ipv4Addr) -> Value {
        Value::Address(v)
    }
}

impl From<DateTime> for Value {
    fn from(v: DateTime) -> Value {
        Value::DateTime(v)
    }
}

impl From<Array> for Value {
    fn from(v: Array) -> Value {
        Value::Array(v)
    }
}

impl From<Map> for Value {
    fn from(v: Map) -> Value {
        Value::Map(v)
    }
}

impl From<Set> for Value {
    fn from(v: Set) -> Value {
        Value::Set(v)
    }
}

impl From<Flaw> for Value {
    fn from(v: Flaw) -> Value {
        Value::Flaw(v)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kinds() {
        assert_eq!(Value::from(true).kind(), Kind::Logical);
        assert_eq!(Value::from(12).kind(), Kind::Integer);
        assert_eq!(Value::from(1.5).kind(), Kind::NotEnumerable);
        assert_eq!(Value::from("abc").kind(), Kind::String);
        assert_eq!(Value::blob(vec![1, 2]).kind(), Kind::NotEnumerable);
        assert_eq!(Value::from(Ipv4Addr::new(10, 0, 0, 1)).kind(), Kind::Address);
        assert_eq!(Value::from(DateTime::date(2020, 1, 1)).kind(), Kind::Date);
        assert_eq!(Value::from(DateTime::time(1, 2, 3, 4)).kind(), Kind::Time);
        assert_eq!(Value::Array(Array::new()).kind(), Kind::NotEnumerable);
        assert_eq!(Value::Flaw(Flaw::new("bad", 0)).kind(), Kind::NotEnumerable);
    }

    #[test]
    fn downcasts_are_exclusive() {
        let v = Value::from(42);
        assert_eq!(v.as_integer(), Some(42));
        assert!(v.as_logical().is_none());
        assert!(v.as_double().is_none());
        assert!(v.as_string().is_none());
        assert!(v.as_blob().is_none());
        assert!(v.as_address().is_none());
        assert!(v.as_date_time().is_none());
        assert!(v.as_array().is_none());
        assert!(v.as_map().is_none());
        assert!(v.as_set().is_none());
        assert!(v.as_flaw().is_none());
    }

    #[test]
    fn deep_equality_is_structural() {
        let mut a = Array::new();
        a.add_value(Value::from(1));
        a.add_value(Value::from("x"));
        let mut b = Array::new();
        b.add_value(Value::from(1));
        b.add_value(Value::from("x"));
        assert!(Value::Array(a.clone()).deeply_equal_to(&Value::Array(b.clone())));
        b.add_value(Value::from(2));
        assert!(!Value::Array(a).deeply_equal_to(&Value::Array(b)));
    }

    #[test]
    fn type_tags() {
        assert_eq!(Value::from(1).type_tag(), 0x00);
        assert_eq!(Value::from(1.0).type_tag(), 0x01);
        assert_eq!(Value::from("s").type_tag(), 0x02);
        assert_eq!(Value::blob(vec![]).type_tag(), 0x02);
        assert_eq!(Value::from(true).type_tag(), 0x03);
        assert_eq!(Value::Array(Array::new()).type_tag(), 0x03);
    }

    #[test]
    fn find_flaw_descends_into_containers() {
        assert!(Value::from(1).find_flaw().is_none());
        let flaw = Value::Flaw(Flaw::new("bad", 2));
        assert!(flaw.find_flaw().is_some());
        let mut inner = Array::new();
        inner.add_value(Value::from(1));
        inner.add_value(flaw);
        let mut map = Map::new();
        map.add_value(Value::from("k"), Value::Array(inner));
        let mut outer = Array::new();
        outer.add_value(Value::from(true));
        outer.add_value(Value::Map(map));
        assert_eq!(Value::Array(outer).find_flaw().map(Flaw::offset), Some(2));
        let mut clean = Array::new();
        clean.add_value(Value::from("x"));
        assert!(Value::Array(clean).find_flaw().is_none());
    }

    #[test]
    fn string_utf8_view() {
        assert_eq!(Value::from("héllo").as_str(), Some("héllo"));
        assert_eq!(Value::string(vec![0xFF, 0xFE]).as_str(), None);
    }
}
