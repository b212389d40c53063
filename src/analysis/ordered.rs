use std::collections::HashMap;

use serde::ser::{Serialize, SerializeMap, Serializer};

/// String-keyed map that iterates and serializes in first-insertion order.
#[derive(Debug, Clone, PartialEq)]
pub struct OrderedNodes<V> {
    entries: Vec<(String, V)>,
    index: HashMap<String, usize>,
}

impl<V> Default for OrderedNodes<V> {
    fn default() -> Self {
        Self {
            entries: Vec::new(),
            index: HashMap::new(),
        }
    }
}

impl<V> OrderedNodes<V> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the value for `key`, creating it with `init` on first encounter.
    pub fn entry_or_insert_with(&mut self, key: &str, init: impl FnOnce() -> V) -> &mut V {
        let position = match self.index.get(key) {
            Some(position) => *position,
            None => {
                let position = self.entries.len();
                self.entries.push((key.to_string(), init()));
                self.index.insert(key.to_string(), position);
                position
            }
        };

        &mut self.entries[position].1
    }

    pub fn get(&self, key: &str) -> Option<&V> {
        self.index.get(key).map(|position| &self.entries[*position].1)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(key, _)| key.as_str())
    }

    pub fn values(&self) -> impl Iterator<Item = &V> {
        self.entries.iter().map(|(_, value)| value)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &V)> {
        self.entries.iter().map(|(key, value)| (key.as_str(), value))
    }

    pub fn into_values(self) -> impl Iterator<Item = V> {
        self.entries.into_iter().map(|(_, value)| value)
    }
}

impl<V: Serialize> Serialize for OrderedNodes<V> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (key, value) in &self.entries {
            map.serialize_entry(key, value)?;
        }
        map.end()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn iteration_follows_first_insertion_not_key_order() {
        let mut nodes = OrderedNodes::new();
        for key in ["4.1", "1.4", "2.4", "1.4", "1.1"] {
            *nodes.entry_or_insert_with(key, || 0_u64) += 1;
        }

        let keys: Vec<&str> = nodes.keys().collect();
        assert_eq!(keys, vec!["4.1", "1.4", "2.4", "1.1"]);
        assert_eq!(nodes.get("1.4"), Some(&2));
        assert_eq!(nodes.len(), 4);
    }

    #[test]
    fn serializes_entries_in_insertion_order() {
        let mut nodes = OrderedNodes::new();
        *nodes.entry_or_insert_with("Robust", || 0_u64) = 3;
        *nodes.entry_or_insert_with("Perceivable", || 0_u64) = 5;

        let rendered = serde_json::to_string(&nodes).expect("ordered nodes should serialize");
        assert_eq!(rendered, r#"{"Robust":3,"Perceivable":5}"#);
    }
}
