//! Ordered sequence of values.

use rand::Rng;

use crate::value::Value;

/// An ordered, heterogeneous sequence. Arrays accept any element and
/// preserve insertion order; they carry no key-kind constraint.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Array {
    values: Vec<Value>,
}

impl Array {
    pub fn new() -> Self {
        Array { values: Vec::new() }
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Array { values: Vec::with_capacity(capacity) }
    }

    /// Append a value. Arrays accept every value, flaws included.
    pub fn add_value(&mut self, value: Value) {
        self.values.push(value);
    }

    pub fn get(&self, index: usize) -> Option<&Value> {
        self.values.get(index)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn clear(&mut self) {
        self.values.clear();
    }

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

impl From<Vec<Value>> for Array {
    fn from(values: Vec<Value>) -> Self {
        Array { values }
    }
}

impl FromIterator<Value> for Array {
    fn from_iter<T: IntoIterator<Item = Value>>(iter: T) -> Self {
        Array { values: iter.into_iter().collect() }
    }
}

impl<'a> IntoIterator for &'a Array {
    type Item = &'a Value;
    type IntoIter = std::slice::Iter<'a, Value>;

    fn into_iter(self) -> Self::IntoIter {
        self.values.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn preserves_insertion_order() {
        let mut arr = Array::new();
        arr.add_value(Value::from(3));
        arr.add_value(Value::from(1));
        arr.add_value(Value::from("mixed"));
        assert_eq!(arr.len(), 3);
        assert_eq!(arr.get(0), Some(&Value::from(3)));
        assert_eq!(arr.get(1), Some(&Value::from(1)));
        assert_eq!(arr.get(2), Some(&Value::from("mixed")));
        assert_eq!(arr.get(3), None);
    }

    #[test]
    fn clear_empties() {
        let mut arr = Array::from(vec![Value::from(1), Value::from(2)]);
        arr.clear();
        assert!(arr.is_empty());
    }

    #[test]
    fn random_element_is_a_member() {
        let arr = Array::from(vec![Value::from(1), Value::from(2), Value::from(3)]);
        let mut rng = rand::thread_rng();
        for _ in 0..20 {
            let picked = arr.random(&mut rng).unwrap();
            assert!(arr.iter().any(|v| v == picked));
        }
        assert!(Array::new().random(&mut rng).is_none());
    }
}
