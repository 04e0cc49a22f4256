use std::marker::PhantomData;
use std::ops::Index;
use std::ops::IndexMut;

/// Structure for storing elements of type `Value`, the structure can only be indexed by structures
/// of type `Key`.
///
/// The flow graph uses it as an arena: nodes and edges live in a [`KeyedVec`] and are addressed by
/// their typed handle, which keeps a [`NodeId`](crate::graph::NodeId) from accidentally indexing
/// the edge storage.
#[derive(Debug, Hash, PartialEq, Eq)]
pub struct KeyedVec<Key, Value> {
    /// [PhantomData] to ensure that the [KeyedVec] is bound to the structure
    key: PhantomData<Key>,
    /// Storage of the elements of type `Value`
    elements: Vec<Value>,
}

impl<Key, Value: Clone> Clone for KeyedVec<Key, Value> {
    fn clone(&self) -> Self {
        Self {
            key: PhantomData,
            elements: self.elements.clone(),
        }
    }
}

impl<Key, Value> Default for KeyedVec<Key, Value> {
    fn default() -> Self {
        Self {
            key: PhantomData,
            elements: Vec::default(),
        }
    }
}

impl<Key: StorageKey, Value> KeyedVec<Key, Value> {
    pub fn len(&self) -> usize {
        self.elements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    /// Add a new value to the vector.
    ///
    /// Returns the key for the inserted value.
    ///
    /// # Example
    /// ```
    /// # use flow_profile_core::containers::KeyedVec;
    /// let mut capacities: KeyedVec<usize, f64> = KeyedVec::default();
    ///
    /// let first = capacities.push(3.0);
    /// let second = capacities.push(2.0);
    ///
    /// assert_eq!(capacities[first], 3.0);
    /// assert_eq!(capacities[second], 2.0);
    /// ```
    pub fn push(&mut self, value: Value) -> Key {
        self.elements.push(value);

        Key::create_from_index(self.elements.len() - 1)
    }

    /// Returns the value stored for `key`, or [`None`] if the key was never handed out by this
    /// vector.
    pub fn get(&self, key: Key) -> Option<&Value> {
        self.elements.get(key.index())
    }

    pub fn get_mut(&mut self, key: Key) -> Option<&mut Value> {
        self.elements.get_mut(key.index())
    }

    /// Iterate over the values in the vector.
    pub fn iter(&self) -> impl Iterator<Item = &'_ Value> {
        self.elements.iter()
    }

    /// Iterate over the keys together with their values, in insertion order.
    pub fn iter_enumerated(&self) -> impl Iterator<Item = (Key, &'_ Value)> {
        self.elements
            .iter()
            .enumerate()
            .map(|(index, value)| (Key::create_from_index(index), value))
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &'_ mut Value> {
        self.elements.iter_mut()
    }
}

impl<Key: StorageKey, Value: Clone> KeyedVec<Key, Value> {
    /// Grows the vector such that `key` can be used to index it; new slots are filled with
    /// `default_value`. Never shrinks.
    pub fn accomodate(&mut self, key: Key, default_value: Value) {
        if key.index() >= self.elements.len() {
            self.elements.resize(key.index() + 1, default_value);
        }
    }
}

impl<Key: StorageKey, Value> Index<Key> for KeyedVec<Key, Value> {
    type Output = Value;

    fn index(&self, index: Key) -> &Self::Output {
        &self.elements[index.index()]
    }
}

impl<Key: StorageKey, Value> Index<&Key> for KeyedVec<Key, Value> {
    type Output = Value;

    fn index(&self, index: &Key) -> &Self::Output {
        &self.elements[index.index()]
    }
}

impl<Key: StorageKey, Value> IndexMut<Key> for KeyedVec<Key, Value> {
    fn index_mut(&mut self, index: Key) -> &mut Self::Output {
        &mut self.elements[index.index()]
    }
}

impl StorageKey for usize {
    fn index(&self) -> usize {
        *self
    }

    fn create_from_index(index: usize) -> Self {
        index
    }
}

impl StorageKey for u32 {
    fn index(&self) -> usize {
        *self as usize
    }

    fn create_from_index(index: usize) -> Self {
        index as u32
    }
}

/// A simple trait which requires that the structures implementing this trait can generate an index.
pub trait StorageKey: Clone {
    fn index(&self) -> usize;

    fn create_from_index(index: usize) -> Self;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accomodate_grows_but_never_shrinks() {
        let mut vec: KeyedVec<u32, i32> = KeyedVec::default();
        vec.accomodate(4, -1);
        assert_eq!(vec.len(), 5);

        vec[2] = 7;
        vec.accomodate(1, 0);
        assert_eq!(vec.len(), 5);
        assert_eq!(vec[2], 7);
    }

    #[test]
    fn enumeration_follows_insertion_order() {
        let mut vec: KeyedVec<usize, char> = KeyedVec::default();
        let _ = vec.push('a');
        let _ = vec.push('b');

        let collected = vec.iter_enumerated().collect::<Vec<_>>();
        assert_eq!(collected, vec![(0, &'a'), (1, &'b')]);
    }

    #[test]
    fn get_out_of_range_is_none() {
        let vec: KeyedVec<usize, char> = KeyedVec::default();
        assert!(vec.get(3).is_none());
    }
}
