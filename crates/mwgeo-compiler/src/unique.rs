//! Insertion-ordered, deduplicating lists.

use std::hash::Hash;

use rustc_hash::FxHashMap;

/// A list that stores each distinct value once.
///
/// [`add`](Self::add) returns the index of an equal value if one was added
/// before, otherwise appends. Indices are stable for the life of the list.
#[derive(Debug, Clone)]
pub struct UniqueList<T> {
    items: Vec<T>,
    lookup: FxHashMap<T, usize>,
}

impl<T> Default for UniqueList<T> {
    fn default() -> Self {
        Self {
            items: Vec::new(),
            lookup: FxHashMap::default(),
        }
    }
}

impl<T: Eq + Hash + Clone> UniqueList<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a value and return its index.
    pub fn add(&mut self, item: T) -> usize {
        if let Some(&index) = self.lookup.get(&item) {
            return index;
        }
        let index = self.items.len();
        self.lookup.insert(item.clone(), index);
        self.items.push(item);
        index
    }

    /// Index of a value equal to `item`.
    pub fn index_of(&self, item: &T) -> Option<usize> {
        self.lookup.get(item).copied()
    }

    pub fn get(&self, index: usize) -> Option<&T> {
        self.items.get(index)
    }

    /// Replace the value at `index`, returning the previous one.
    ///
    /// The lookup follows the new value. If an equal value already lives at
    /// another index, lookups keep resolving to that index.
    pub fn replace(&mut self, index: usize, item: T) -> Option<T> {
        let slot = self.items.get_mut(index)?;
        let previous = std::mem::replace(slot, item.clone());

        if self.lookup.get(&previous) == Some(&index) {
            self.lookup.remove(&previous);
            // Another slot may still hold the old value.
            if let Some(other) = self.items.iter().position(|i| *i == previous) {
                self.lookup.insert(previous.clone(), other);
            }
        }
        self.lookup.entry(item).or_insert(index);
        Some(previous)
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, T> {
        self.items.iter()
    }

    pub fn as_slice(&self) -> &[T] {
        &self.items
    }

    pub fn into_vec(self) -> Vec<T> {
        self.items
    }
}

impl<'a, T> IntoIterator for &'a UniqueList<T> {
    type Item = &'a T;
    type IntoIter = std::slice::Iter<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_add_deduplicates() {
        let mut list = UniqueList::new();
        assert_eq!(list.add("a".to_string()), 0);
        assert_eq!(list.add("b".to_string()), 1);
        assert_eq!(list.add("a".to_string()), 0);
        assert_eq!(list.len(), 2);
        assert_eq!(list.as_slice(), ["a", "b"]);
    }

    #[test]
    fn test_replace_keeps_lookup_consistent() {
        let mut list = UniqueList::new();
        list.add(10u32);
        list.add(20);

        assert_eq!(list.replace(0, 30), Some(10));
        assert_eq!(list.index_of(&10), None);
        assert_eq!(list.index_of(&30), Some(0));
        assert_eq!(list.add(10), 2);
        assert_eq!(list.add(30), 0);
    }

    #[test]
    fn test_replace_with_existing_value() {
        let mut list = UniqueList::new();
        list.add(1u32);
        list.add(2);

        list.replace(1, 1);
        assert_eq!(list.index_of(&1), Some(0));
        assert_eq!(list.index_of(&2), None);
        assert_eq!(list.as_slice(), [1, 1]);
    }

    #[test]
    fn test_replace_out_of_range() {
        let mut list: UniqueList<u32> = UniqueList::new();
        assert_eq!(list.replace(0, 1), None);
        assert!(list.is_empty());
    }
}
