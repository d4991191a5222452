//! An insertion-ordered dictionary that can hold multiple values per key.
//!
//! [`MultiValueDict`] backs query-string and form-body parameters, where a
//! key may appear several times. Keys keep the order of their first
//! appearance, which is the order the binder walks them in.

use std::hash::Hash;

use indexmap::map;
use indexmap::IndexMap;

/// A dictionary that maps keys to lists of values, preserving key order.
///
/// [`get`](MultiValueDict::get) returns the **last** value for a key,
/// while [`get_list`](MultiValueDict::get_list) returns all values.
///
/// # Examples
///
/// ```
/// use formmap_core::utils::MultiValueDict;
///
/// let mut d = MultiValueDict::new();
/// d.append("color".to_string(), "red");
/// d.append("size".to_string(), "large");
/// d.append("color".to_string(), "blue");
///
/// assert_eq!(d.get(&"color".to_string()), Some(&"blue"));
/// assert_eq!(d.get_list(&"color".to_string()), Some(&vec!["red", "blue"]));
/// let keys: Vec<_> = d.keys().cloned().collect();
/// assert_eq!(keys, vec!["color".to_string(), "size".to_string()]);
/// ```
#[derive(Debug, Clone)]
pub struct MultiValueDict<K: Eq + Hash, V> {
    inner: IndexMap<K, Vec<V>>,
}

impl<K: Eq + Hash, V> Default for MultiValueDict<K, V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K: Eq + Hash, V> MultiValueDict<K, V> {
    /// Creates an empty `MultiValueDict`.
    pub fn new() -> Self {
        Self {
            inner: IndexMap::new(),
        }
    }

    /// Returns a reference to the **last** value associated with the key.
    pub fn get(&self, key: &K) -> Option<&V> {
        self.inner.get(key).and_then(|v| v.last())
    }

    /// Returns a reference to all values associated with the key.
    pub fn get_list(&self, key: &K) -> Option<&Vec<V>> {
        self.inner.get(key)
    }

    /// Sets the value for a key, replacing any existing values.
    ///
    /// A key that was already present keeps its position.
    pub fn set(&mut self, key: K, value: V) {
        self.inner.insert(key, vec![value]);
    }

    /// Appends a value to the list for the given key.
    pub fn append(&mut self, key: K, value: V) {
        self.inner.entry(key).or_default().push(value);
    }

    /// Removes a key and returns its values.
    pub fn remove(&mut self, key: &K) -> Option<Vec<V>> {
        self.inner.shift_remove(key)
    }

    /// Returns an iterator over the keys, in insertion order.
    pub fn keys(&self) -> map::Keys<'_, K, Vec<V>> {
        self.inner.keys()
    }

    /// Returns the number of distinct keys.
    pub fn len(&self) -> usize {
        self.inner.len()
    }

    /// Returns `true` if the dictionary contains no keys.
    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    /// Returns `true` if the dictionary contains the specified key.
    pub fn contains_key(&self, key: &K) -> bool {
        self.inner.contains_key(key)
    }

    /// Returns an iterator over (key, value-list) pairs, in insertion order.
    pub fn iter(&self) -> map::Iter<'_, K, Vec<V>> {
        self.inner.iter()
    }
}

impl<K: Eq + Hash, V> IntoIterator for MultiValueDict<K, V> {
    type Item = (K, Vec<V>);
    type IntoIter = map::IntoIter<K, Vec<V>>;

    fn into_iter(self) -> Self::IntoIter {
        self.inner.into_iter()
    }
}

impl<'a, K: Eq + Hash, V> IntoIterator for &'a MultiValueDict<K, V> {
    type Item = (&'a K, &'a Vec<V>);
    type IntoIter = map::Iter<'a, K, Vec<V>>;

    fn into_iter(self) -> Self::IntoIter {
        self.inner.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_is_empty() {
        let d: MultiValueDict<String, String> = MultiValueDict::new();
        assert!(d.is_empty());
        assert_eq!(d.len(), 0);
    }

    #[test]
    fn test_append_and_get_returns_last() {
        let mut d = MultiValueDict::new();
        d.append("color", "red");
        d.append("color", "blue");
        d.append("color", "green");

        assert_eq!(d.get(&"color"), Some(&"green"));
        assert_eq!(d.get_list(&"color"), Some(&vec!["red", "blue", "green"]));
        assert_eq!(d.len(), 1);
    }

    #[test]
    fn test_set_replaces_existing_in_place() {
        let mut d = MultiValueDict::new();
        d.append("k", "a");
        d.append("j", "b");
        d.set("k", "c");
        assert_eq!(d.get_list(&"k"), Some(&vec!["c"]));
        assert_eq!(d.keys().copied().collect::<Vec<_>>(), vec!["k", "j"]);
    }

    #[test]
    fn test_keys_keep_insertion_order() {
        let mut d = MultiValueDict::new();
        for key in ["z", "a", "m", "b_x", "b_y"] {
            d.append(key, 1);
        }
        let keys: Vec<_> = d.keys().copied().collect();
        assert_eq!(keys, vec!["z", "a", "m", "b_x", "b_y"]);
    }

    #[test]
    fn test_remove_keeps_order_of_rest() {
        let mut d = MultiValueDict::new();
        d.set("a", 1);
        d.set("url", 2);
        d.set("b", 3);
        assert_eq!(d.remove(&"url"), Some(vec![2]));
        assert_eq!(d.keys().copied().collect::<Vec<_>>(), vec!["a", "b"]);
        assert_eq!(d.remove(&"missing"), None);
    }

    #[test]
    fn test_get_missing_key() {
        let d: MultiValueDict<&str, &str> = MultiValueDict::new();
        assert_eq!(d.get(&"missing"), None);
        assert_eq!(d.get_list(&"missing"), None);
        assert!(!d.contains_key(&"missing"));
    }
}
