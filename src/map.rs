//! Ordered mapping with kind-homogeneous keys.

use rand::Rng;

use crate::compare::key_order;
use crate::value::{Kind, Value};

/// An ordered mapping from enumerable values to arbitrary values.
///
/// The key kind is `Unknown` while the map is empty and is fixed by the
/// first insertion; later insertions whose key kind differs are rejected
/// with no state change. Iteration follows the total (kind, value) order
/// over keys. A duplicate key keeps the original entry.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Map {
    entries: Vec<(Value, Value)>,
    key_kind: Kind,
}

impl Map {
    pub fn new() -> Self {
        Map { entries: Vec::new(), key_kind: Kind::Unknown }
    }

    /// The kind every key must share; `Unknown` until the first insertion.
    pub fn key_kind(&self) -> Kind {
        self.key_kind
    }

    /// Insert an entry. Returns `false`, leaving the map untouched, when
    /// the key is not enumerable, does not match the fixed key kind, or
    /// collides with an existing key.
    pub fn add_value(&mut self, key: Value, value: Value) -> bool {
        if !key.is_enumerable() {
            return false;
        }
        if self.key_kind == Kind::Unknown {
            self.key_kind = key.kind();
        }
        if key.kind() != self.key_kind {
            return false;
        }
        match self.entries.binary_search_by(|(k, _)| key_order(k, &key)) {
            Ok(_) => false,
            Err(slot) => {
                self.entries.insert(slot, (key, value));
                true
            }
        }
    }

    /// Merge entries from another map. Entries are offered one at a time,
    /// so kind mismatches and key collisions drop individually.
    pub fn add_entries(&mut self, other: &Map) {
        if other.key_kind == self.key_kind || self.key_kind == Kind::Unknown {
            for (k, v) in other.iter() {
                self.add_value(k.clone(), v.clone());
            }
        }
    }

    /// Look up the value stored under `key`.
    pub fn get(&self, key: &Value) -> Option<&Value> {
        self.entries
            .binary_search_by(|(k, _)| key_order(k, key))
            .ok()
            .map(|slot| &self.entries[slot].1)
    }

    pub fn contains_key(&self, key: &Value) -> bool {
        self.get(key).is_some()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
        self.key_kind = Kind::Unknown;
    }

    /// Entries in key order.
    pub fn iter(&self) -> impl Iterator<Item = (&Value, &Value)> {
        self.entries.iter().map(|(k, v)| (k, v))
    }

    /// Keys in key order.
    pub fn keys(&self) -> impl Iterator<Item = &Value> {
        self.entries.iter().map(|(k, _)| k)
    }

    /// A uniformly random entry, or `None` when empty.
    pub fn random<R: Rng + ?Sized>(&self, rng: &mut R) -> Option<(&Value, &Value)> {
        if self.entries.is_empty() {
            None
        } else {
            self.entries.get(rng.gen_range(0..self.entries.len())).map(|(k, v)| (k, v))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn key_kind_fixes_at_first_insert() {
        let mut map = Map::new();
        assert_eq!(map.key_kind(), Kind::Unknown);
        assert!(map.add_value(Value::from(1), Value::from("a")));
        assert_eq!(map.key_kind(), Kind::Integer);
        assert!(map.add_value(Value::from(2), Value::from("b")));
        // Mismatched key kind: rejected, size unchanged.
        assert!(!map.add_value(Value::from("three"), Value::from("c")));
        assert_eq!(map.len(), 2);
        assert_eq!(map.key_kind(), Kind::Integer);
    }

    #[test]
    fn non_enumerable_keys_rejected() {
        let mut map = Map::new();
        assert!(!map.add_value(Value::from(1.5), Value::from(1)));
        assert!(!map.add_value(Value::blob(vec![1]), Value::from(1)));
        assert!(map.is_empty());
        assert_eq!(map.key_kind(), Kind::Unknown);
    }

    #[test]
    fn duplicate_key_keeps_first_entry() {
        let mut map = Map::new();
        assert!(map.add_value(Value::from(7), Value::from("first")));
        assert!(!map.add_value(Value::from(7), Value::from("second")));
        assert_eq!(map.len(), 1);
        assert_eq!(map.get(&Value::from(7)), Some(&Value::from("first")));
    }

    #[test]
    fn iteration_is_key_ordered() {
        let mut map = Map::new();
        map.add_value(Value::from(30), Value::from("c"));
        map.add_value(Value::from(10), Value::from("a"));
        map.add_value(Value::from(20), Value::from("b"));
        let keys: Vec<i64> = map.keys().map(|k| k.as_integer().unwrap()).collect();
        assert_eq!(keys, vec![10, 20, 30]);
    }

    #[test]
    fn clear_resets_key_kind() {
        let mut map = Map::new();
        map.add_value(Value::from("k"), Value::from(1));
        map.clear();
        assert_eq!(map.key_kind(), Kind::Unknown);
        assert!(map.add_value(Value::from(5), Value::from(6)));
    }

    #[test]
    fn merge_honors_key_kind() {
        let mut a = Map::new();
        a.add_value(Value::from(1), Value::from("one"));
        let mut b = Map::new();
        b.add_value(Value::from(2), Value::from("two"));
        a.add_entries(&b);
        assert_eq!(a.len(), 2);
        let mut c = Map::new();
        c.add_value(Value::from("x"), Value::from(0));
        a.add_entries(&c);
        assert_eq!(a.len(), 2);
    }
}
