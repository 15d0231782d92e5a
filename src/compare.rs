//! Three-valued ordering over values.
//!
//! Scalars of compatible kinds compare naturally, with integers and
//! doubles cross-comparing numerically. A container compares against a
//! value by lifting the predicate over its elements (keys, for a map) and
//! folding with AND; any incomparable element makes the whole comparison
//! incomparable. Dissimilar kinds are incomparable.

use std::cmp::Ordering;

use crate::value::{Kind, Value};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Op {
    Less,
    LessOrEqual,
    Greater,
    GreaterOrEqual,
}

impl Op {
    fn flip(self) -> Op {
        match self {
            Op::Less => Op::Greater,
            Op::LessOrEqual => Op::GreaterOrEqual,
            Op::Greater => Op::Less,
            Op::GreaterOrEqual => Op::LessOrEqual,
        }
    }

    fn of_ordering(self, ord: Ordering) -> bool {
        match self {
            Op::Less => ord == Ordering::Less,
            Op::LessOrEqual => ord != Ordering::Greater,
            Op::Greater => ord == Ordering::Greater,
            Op::GreaterOrEqual => ord != Ordering::Less,
        }
    }
}

pub(crate) fn compare(a: &Value, b: &Value, op: Op) -> Option<bool> {
    match a {
        Value::Array(arr) => fold(arr.iter(), b, op),
        Value::Set(set) => {
            if set.key_kind() == Kind::Unknown || b.kind() != set.key_kind() {
                return None;
            }
            fold(set.iter(), b, op)
        }
        Value::Map(map) => {
            if map.key_kind() == Kind::Unknown || b.kind() != map.key_kind() {
                return None;
            }
            fold(map.iter().map(|(k, _)| k), b, op)
        }
        _ => match b {
            // A scalar against a container defers to the container with
            // the predicate flipped.
            Value::Array(_) | Value::Set(_) | Value::Map(_) => compare(b, a, op.flip()),
            _ => scalar_compare(a, b, op),
        },
    }
}

/// Fold a lifted predicate over container elements. The fold is vacuously
/// true for an empty array; an incomparable element dominates any earlier
/// false.
fn fold<'a>(elements: impl Iterator<Item = &'a Value>, other: &Value, op: Op) -> Option<bool> {
    let mut result = true;
    for element in elements {
        result &= compare(element, other, op)?;
    }
    Some(result)
}

fn scalar_compare(a: &Value, b: &Value, op: Op) -> Option<bool> {
    match (a, b) {
        (Value::Logical(x), Value::Logical(y)) => Some(op.of_ordering(x.cmp(y))),
        (Value::Integer(x), Value::Integer(y)) => Some(op.of_ordering(x.cmp(y))),
        (Value::Integer(x), Value::Double(y)) => Some(numeric(*x as f64, *y, op)),
        (Value::Double(x), Value::Integer(y)) => Some(numeric(*x, *y as f64, op)),
        (Value::Double(x), Value::Double(y)) => Some(numeric(*x, *y, op)),
        (Value::String(x), Value::String(y)) => Some(op.of_ordering(x.cmp(y))),
        (Value::Blob(x), Value::Blob(y)) => Some(op.of_ordering(x.cmp(y))),
        (Value::Address(x), Value::Address(y)) => {
            Some(op.of_ordering(u32::from(*x).cmp(&u32::from(*y))))
        }
        (Value::DateTime(x), Value::DateTime(y)) if x.is_date() == y.is_date() => {
            Some(op.of_ordering(x.raw().cmp(&y.raw())))
        }
        _ => None,
    }
}

// IEEE comparison semantics: every predicate is false against a NaN, but
// the comparison itself is still considered valid.
fn numeric(x: f64, y: f64, op: Op) -> bool {
    match op {
        Op::Less => x < y,
        Op::LessOrEqual => x <= y,
        Op::Greater => x > y,
        Op::GreaterOrEqual => x >= y,
    }
}

/// The total order used for map and set keys: enumeration kind first,
/// then the value. Only enumerable scalars reach this; anything else
/// falls back to its kind rank alone.
pub(crate) fn key_order(a: &Value, b: &Value) -> Ordering {
    a.kind().cmp(&b.kind()).then_with(|| match (a, b) {
        (Value::Logical(x), Value::Logical(y)) => x.cmp(y),
        (Value::Integer(x), Value::Integer(y)) => x.cmp(y),
        (Value::String(x), Value::String(y)) => x.cmp(y),
        (Value::Address(x), Value::Address(y)) => u32::from(*x).cmp(&u32::from(*y)),
        (Value::DateTime(x), Value::DateTime(y)) => x.raw().cmp(&y.raw()),
        _ => Ordering::Equal,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::array::Array;
    use crate::set::Set;

    fn v(i: i64) -> Value {
        Value::from(i)
    }

    #[test]
    fn scalar_orderings() {
        assert_eq!(v(1).less_than(&v(2)), Some(true));
        assert_eq!(v(2).less_than(&v(2)), Some(false));
        assert_eq!(v(2).less_than_or_equal(&v(2)), Some(true));
        assert_eq!(v(3).greater_than(&v(2)), Some(true));
        assert_eq!(v(1).greater_than_or_equal(&v(2)), Some(false));
    }

    #[test]
    fn numeric_cross_comparison() {
        assert_eq!(v(1).less_than(&Value::from(1.5)), Some(true));
        assert_eq!(Value::from(2.5).greater_than(&v(2)), Some(true));
        assert_eq!(v(2).less_than_or_equal(&Value::from(2.0)), Some(true));
    }

    #[test]
    fn dissimilar_kinds_are_incomparable() {
        assert_eq!(v(1).less_than(&Value::from(true)), None);
        assert_eq!(Value::from("a").greater_than(&v(1)), None);
        assert_eq!(
            Value::from(crate::DateTime::date(2020, 1, 1))
                .less_than(&Value::from(crate::DateTime::time(1, 0, 0, 0))),
            None
        );
    }

    #[test]
    fn strings_compare_bytewise() {
        assert_eq!(Value::from("abc").less_than(&Value::from("abd")), Some(true));
        assert_eq!(Value::from("b").greater_than(&Value::from("ab")), Some(true));
    }

    #[test]
    fn container_lifts_over_elements() {
        let mut arr = Array::new();
        arr.add_value(v(1));
        arr.add_value(v(2));
        let arr = Value::Array(arr);
        assert_eq!(arr.less_than(&v(3)), Some(true));
        assert_eq!(arr.less_than(&v(2)), Some(false));
        // Scalar against container defers with the predicate flipped.
        assert_eq!(v(0).less_than(&arr), Some(true));
        assert_eq!(v(1).less_than(&arr), Some(false));
    }

    #[test]
    fn set_kind_gates_comparison() {
        let mut set = Set::new();
        set.add_value(v(4));
        set.add_value(v(9));
        let set = Value::Set(set);
        assert_eq!(set.greater_than(&v(3)), Some(true));
        assert_eq!(set.greater_than(&Value::from(true)), None);
        assert_eq!(Value::Set(Set::new()).greater_than(&v(1)), None);
    }

    #[test]
    fn incomparable_element_dominates() {
        let mut arr = Array::new();
        arr.add_value(v(9));
        arr.add_value(Value::from(true));
        assert_eq!(Value::Array(arr).less_than(&v(5)), None);
    }
}
