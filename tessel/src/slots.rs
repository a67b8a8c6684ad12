use std::sync::Arc;

use ahash::AHashMap;

use crate::Value;

#[derive(Debug, Clone)]
pub struct SlotInfo {
    pub name: Arc<str>,
    pub value: Value,
}

/// Name → value bindings of one object, kept in insertion order.
///
/// Redefining a name overwrites the value in place; the slot keeps its
/// original position.
#[derive(Debug, Clone, Default)]
pub struct SlotMap {
    slots: Vec<SlotInfo>,
    index: AHashMap<Arc<str>, usize>,
}

impl SlotMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    pub fn get(&self, name: &str) -> Option<Value> {
        self.index.get(name).map(|&i| self.slots[i].value)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    /// Returns the previous value if the name was already bound.
    pub fn insert(&mut self, name: Arc<str>, value: Value) -> Option<Value> {
        if let Some(&i) = self.index.get(&name) {
            let old = self.slots[i].value;
            self.slots[i].value = value;
            return Some(old);
        }
        self.index.insert(name.clone(), self.slots.len());
        self.slots.push(SlotInfo { name, value });
        None
    }

    pub fn iter(&self) -> impl Iterator<Item = &SlotInfo> {
        self.slots.iter()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.slots.iter().map(|s| &*s.name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keeps_insertion_order() {
        let mut map = SlotMap::new();
        map.insert("b".into(), Value(1));
        map.insert("a".into(), Value(2));
        map.insert("c".into(), Value(3));
        assert_eq!(map.names().collect::<Vec<_>>(), vec!["b", "a", "c"]);
    }

    #[test]
    fn last_write_wins_in_place() {
        let mut map = SlotMap::new();
        assert_eq!(map.insert("x".into(), Value(1)), None);
        map.insert("y".into(), Value(2));
        assert_eq!(map.insert("x".into(), Value(7)), Some(Value(1)));
        assert_eq!(map.get("x"), Some(Value(7)));
        assert_eq!(map.len(), 2);
        assert_eq!(map.names().next(), Some("x"));
    }

    #[test]
    fn missing_names() {
        let map = SlotMap::new();
        assert!(map.is_empty());
        assert!(!map.contains("x"));
        assert_eq!(map.get("x"), None);
    }
}
