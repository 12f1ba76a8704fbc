//! String to index maps for labels and features.

use hashbrown::HashMap;

use crate::errors::{Error, Result};

/// Growth status of a map.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Vocabulary {
    /// New keys are assigned the next free index.
    #[default]
    Open,
    /// Only existing keys resolve; adding a new key is an error.
    Frozen,
}

/// A bidirectional dictionary for mapping between strings and integer IDs
#[derive(Debug, Clone, Default)]
struct Dictionary {
    /// Map from string to ID
    str_to_id: HashMap<String, usize>,
    /// Map from ID to string
    id_to_str: Vec<String>,
}

impl Dictionary {
    fn len(&self) -> usize {
        self.id_to_str.len()
    }

    fn get(&self, s: &str) -> Option<usize> {
        self.str_to_id.get(s).copied()
    }

    /// Get or create an ID for a string; a new string receives `next`.
    /// Returns the ID and whether it was just created.
    fn get_or_insert(&mut self, s: &str, next: usize) -> (usize, bool) {
        if let Some(&id) = self.str_to_id.get(s) {
            (id, false)
        } else {
            self.str_to_id.insert(s.to_string(), next);
            self.id_to_str.push(s.to_string());
            (next, true)
        }
    }
}

/// Output labels of a classifier, indexed from 0 in first-seen order.
#[derive(Debug, Clone, Default)]
pub struct LabelMap {
    dict: Dictionary,
    status: Vocabulary,
}

impl LabelMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the index of `label`, registering it if needed.
    pub fn add(&mut self, label: &str) -> Result<usize> {
        if self.status == Vocabulary::Frozen {
            return self.dict.get(label).ok_or_else(|| Error::frozen("label", label));
        }
        let next = self.dict.len();
        Ok(self.dict.get_or_insert(label, next).0)
    }

    /// Index of `label`, or `None` if it has never been added.
    pub fn index(&self, label: &str) -> Option<usize> {
        self.dict.get(label)
    }

    pub fn label(&self, index: usize) -> Option<&str> {
        self.dict.id_to_str.get(index).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.dict.len()
    }

    pub fn is_empty(&self) -> bool {
        self.dict.len() == 0
    }

    pub fn labels(&self) -> impl Iterator<Item = &str> + '_ {
        self.dict.id_to_str.iter().map(String::as_str)
    }

    pub fn status(&self) -> Vocabulary {
        self.status
    }

    pub fn freeze(&mut self) {
        self.status = Vocabulary::Frozen;
    }
}

/// Feature strings, one namespace per feature template slot.
///
/// Indices are global across slots and start at 1; index 0 is reserved for
/// the bias, so `size()` is one more than the number of distinct keys.
#[derive(Debug, Clone, Default)]
pub struct FeatureMap {
    types: Vec<Dictionary>,
    size: usize,
    status: Vocabulary,
}

impl FeatureMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the index of `value` under template slot `ty`, registering it
    /// if needed.
    pub fn add(&mut self, ty: usize, value: &str) -> Result<usize> {
        if self.status == Vocabulary::Frozen {
            return self
                .index(ty, value)
                .ok_or_else(|| Error::frozen("feature", value));
        }
        if ty >= self.types.len() {
            self.types.resize_with(ty + 1, Dictionary::default);
        }
        let (id, created) = self.types[ty].get_or_insert(value, self.size + 1);
        if created {
            self.size += 1;
        }
        Ok(id)
    }

    /// Index of `value` under slot `ty`, or `None` if unseen.
    pub fn index(&self, ty: usize, value: &str) -> Option<usize> {
        self.types.get(ty)?.get(value)
    }

    /// Number of indices in use, including the bias.
    pub fn size(&self) -> usize {
        self.size + 1
    }

    pub fn status(&self) -> Vocabulary {
        self.status
    }

    pub fn freeze(&mut self) {
        self.status = Vocabulary::Frozen;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_label_map() {
        let mut labels = LabelMap::new();
        assert!(labels.is_empty());

        assert_eq!(labels.add("NN").unwrap(), 0);
        assert_eq!(labels.add("VB").unwrap(), 1);
        // Adding the same label again returns the same index
        assert_eq!(labels.add("NN").unwrap(), 0);
        assert_eq!(labels.len(), 2);

        assert_eq!(labels.index("VB"), Some(1));
        assert_eq!(labels.index("JJ"), None);
        assert_eq!(labels.label(1), Some("VB"));
        assert_eq!(labels.labels().collect::<Vec<_>>(), vec!["NN", "VB"]);
    }

    #[test]
    fn test_feature_map() {
        let mut features = FeatureMap::new();
        assert_eq!(features.size(), 1);

        assert_eq!(features.add(0, "dog").unwrap(), 1);
        assert_eq!(features.add(1, "dog").unwrap(), 2);
        assert_eq!(features.add(0, "cat").unwrap(), 3);
        assert_eq!(features.add(0, "dog").unwrap(), 1);
        assert_eq!(features.size(), 4);

        assert_eq!(features.index(1, "dog"), Some(2));
        assert_eq!(features.index(1, "cat"), None);
        assert_eq!(features.index(7, "cat"), None);
    }

    #[test]
    fn test_frozen() {
        let mut features = FeatureMap::new();
        features.add(0, "dog").unwrap();
        features.freeze();
        assert_eq!(features.status(), Vocabulary::Frozen);
        assert_eq!(features.add(0, "dog").unwrap(), 1);
        assert!(matches!(
            features.add(0, "cat"),
            Err(Error::FrozenVocabulary { kind: "feature", .. })
        ));
        assert_eq!(features.size(), 2);

        let mut labels = LabelMap::new();
        labels.add("NN").unwrap();
        labels.freeze();
        assert!(labels.add("VB").is_err());
        assert_eq!(labels.len(), 1);
    }
}
