//! Ordered set with kind-homogeneous elements.

use rand::Rng;

use crate::compare::key_order;
use crate::value::{Kind, Value};

/// An ordered set of enumerable values sharing one kind.
///
/// Like [`Map`](crate::Map), the key kind is `Unknown` while empty and is
/// fixed by the first insertion; mismatched or duplicate insertions are
/// rejected with no state change. Iteration follows the total
/// (kind, value) order.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Set {
    values: Vec<Value>,
    key_kind: Kind,
}

impl Set {
    pub fn new() -> Self {
        Set { values: Vec::new(), key_kind: Kind::Unknown }
    }

    /// The kind every element must share; `Unknown` until the first
    /// insertion.
    pub fn key_kind(&self) -> Kind {
        self.key_kind
    }

    /// Insert a value. Returns `false`, leaving the set untouched, when
    /// the value is not enumerable, does not match the fixed kind, or is
    /// already present.
    pub fn add_value(&mut self, value: Value) -> bool {
        if !value.is_enumerable() {
            return false;
        }
        if self.key_kind == Kind::Unknown {
            self.key_kind = value.kind();
        }
        if value.kind() != self.key_kind {
            return false;
        }
        match self.values.binary_search_by(|v| key_order(v, &value)) {
            Ok(_) => false,
            Err(slot) => {
                self.values.insert(slot, value);
                true
            }
        }
    }

    /// Merge elements from another set, dropping mismatches individually.
    pub fn add_entries(&mut self, other: &Set) {
        if other.key_kind == self.key_kind || self.key_kind == Kind::Unknown {
            for v in other.iter() {
                self.add_value(v.clone());
            }
        }
    }

    pub fn contains(&self, value: &Value) -> bool {
        self.values.binary_search_by(|v| key_order(v, value)).is_ok()
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn clear(&mut self) {
        self.values.clear();
        self.key_kind = Kind::Unknown;
    }

    /// Elements in (kind, value) order.
    pub fn iter(&self) -> std::slice::Iter<'_, Value> {
        self.values.iter()
    }

    /// A uniformly random element, or `None` when empty.
    pub fn random<R: Rng + ?Sized>(&self, rng: &mut R) -> Option<&Value> {
        if self.values.is_empty() {
            None
        } else {
            self.values.get(rng.gen_range(0..self.values.len()))
        }
    }
}

impl<'a> IntoIterator for &'a Set {
    type Item = &'a Value;
    type IntoIter = std::slice::Iter<'a, Value>;

    fn into_iter(self) -> Self::IntoIter {
        self.values.iter()
    }
}
