//! Ordered attribute map.
//!
//! # Design Decisions
//! - Backed by a `Vec`; elements carry a handful of attributes, a linear scan
//!   beats hashing and keeps insertion order for free
//! - Re-setting a key overwrites the value in place, the key keeps its slot
//! - `None` value = boolean attribute, rendered as a bare name

/// Insertion-ordered, key-unique attribute map.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Attributes {
    entries: Vec<(String, Option<String>)>,
}

impl Attributes {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set `name` to `value`, overwriting any previous value.
    pub fn set(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.put(name.into(), Some(value.into()));
    }

    /// Set a boolean attribute (`disabled`, `checked`, ...).
    pub fn set_flag(&mut self, name: impl Into<String>) {
        self.put(name.into(), None);
    }

    fn put(&mut self, name: String, value: Option<String>) {
        match self.entries.iter_mut().find(|(k, _)| *k == name) {
            Some(slot) => slot.1 = value,
            None => self.entries.push((name, value)),
        }
    }

    /// Value for `name`. `Some(None)` means the attribute is a flag.
    pub fn get(&self, name: &str) -> Option<Option<&str>> {
        self.entries
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_deref())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.iter().any(|(k, _)| k == name)
    }

    /// Remove `name`, returning its previous value.
    pub fn remove(&mut self, name: &str) -> Option<Option<String>> {
        let index = self.entries.iter().position(|(k, _)| k == name)?;
        Some(self.entries.remove(index).1)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, Option<&str>)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_deref()))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for Attributes {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut attrs = Self::new();
        attrs.extend(iter);
        attrs
    }
}

impl<K: Into<String>, V: Into<String>> Extend<(K, V)> for Attributes {
    fn extend<I: IntoIterator<Item = (K, V)>>(&mut self, iter: I) {
        for (k, v) in iter {
            self.set(k, v);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_overwrite_keeps_position() {
        let mut attrs = Attributes::new();
        attrs.set("id", "a");
        attrs.set("class", "x");
        attrs.set("id", "b");

        let collected: Vec<_> = attrs.iter().collect();
        assert_eq!(collected, vec![("id", Some("b")), ("class", Some("x"))]);
        assert_eq!(attrs.len(), 2);
    }

    #[test]
    fn test_flag_and_value_overwrite_each_other() {
        let mut attrs = Attributes::new();
        attrs.set("checked", "yes");
        attrs.set_flag("checked");
        assert_eq!(attrs.get("checked"), Some(None));

        attrs.set("checked", "no");
        assert_eq!(attrs.get("checked"), Some(Some("no")));
        assert_eq!(attrs.len(), 1);
    }

    #[test]
    fn test_remove() {
        let mut attrs: Attributes = [("a", "1"), ("b", "2")].into_iter().collect();
        assert_eq!(attrs.remove("a"), Some(Some("1".to_string())));
        assert_eq!(attrs.remove("a"), None);
        assert!(!attrs.contains("a"));
        assert!(attrs.contains("b"));
    }

    #[test]
    fn test_from_iter_dedups() {
        let attrs: Attributes = [("k", "1"), ("k", "2")].into_iter().collect();
        assert_eq!(attrs.len(), 1);
        assert_eq!(attrs.get("k"), Some(Some("2")));
    }
}
