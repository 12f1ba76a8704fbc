//! Feature vectors.

use std::fmt;

/// One active feature of a sparse vector.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SparseItem {
    pub index: usize,
    pub value: f32,
}

impl SparseItem {
    pub fn new(index: usize, value: f32) -> Self {
        Self { index, value }
    }
}

impl fmt::Display for SparseItem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.index, self.value)
    }
}

/// Feature index to value. Indices are unique, except between
/// [`SparseVector::push`] and [`SparseVector::merge`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SparseVector {
    items: Vec<SparseItem>,
}

impl SparseVector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds `value` to the feature at `index`. Scans the vector; when
    /// building a whole vector use [`push`](Self::push) and
    /// [`merge`](Self::merge) instead.
    pub fn add(&mut self, index: usize, value: f32) {
        match self.items.iter_mut().find(|item| item.index == index) {
            Some(item) => item.value += value,
            None => self.items.push(SparseItem::new(index, value)),
        }
    }

    /// Appends an item without looking for its index. The vector may hold
    /// duplicates until [`merge`](Self::merge) is called.
    pub fn push(&mut self, index: usize, value: f32) {
        self.items.push(SparseItem::new(index, value));
    }

    /// Sorts the items by index and sums the values of equal indices.
    pub fn merge(&mut self) {
        self.sort();
        let mut merged: Vec<SparseItem> = Vec::with_capacity(self.items.len());
        for item in self.items.drain(..) {
            match merged.last_mut() {
                Some(last) if last.index == item.index => last.value += item.value,
                _ => merged.push(item),
            }
        }
        self.items = merged;
    }

    /// Puts the bias feature (index 0) in front, unless it is already there
    /// or `bias` is zero.
    pub fn add_bias(&mut self, bias: f32) {
        if bias > 0.0 && !self.items.iter().any(|item| item.index == 0) {
            self.items.insert(0, SparseItem::new(0, bias));
        }
    }

    /// Sorts the items by index.
    pub fn sort(&mut self) {
        self.items.sort_by_key(|item| item.index);
    }

    /// Largest index, or `None` for an empty vector.
    pub fn max_index(&self) -> Option<usize> {
        self.items.iter().map(|item| item.index).max()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, SparseItem> {
        self.items.iter()
    }

    pub fn items(&self) -> &[SparseItem] {
        &self.items
    }
}

impl FromIterator<SparseItem> for SparseVector {
    fn from_iter<I: IntoIterator<Item = SparseItem>>(iter: I) -> Self {
        let mut vector = Self {
            items: iter.into_iter().collect(),
        };
        vector.merge();
        vector
    }
}

impl<'a> IntoIterator for &'a SparseVector {
    type Item = &'a SparseItem;
    type IntoIter = std::slice::Iter<'a, SparseItem>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.iter()
    }
}

impl fmt::Display for SparseVector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, item) in self.items.iter().enumerate() {
            if i > 0 {
                f.write_str(" ")?;
            }
            write!(f, "{}", item)?;
        }
        Ok(())
    }
}

/// A feature string before it is mapped to an index.
#[derive(Debug, Clone, PartialEq)]
pub struct StringItem {
    /// Template slot the string was produced by.
    pub ty: usize,
    pub value: String,
    pub weight: f32,
}

/// The feature strings of one decision point.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StringVector {
    items: Vec<StringItem>,
}

impl StringVector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add<S: Into<String>>(&mut self, ty: usize, value: S) {
        self.add_weighted(ty, value, 1.0);
    }

    pub fn add_weighted<S: Into<String>>(&mut self, ty: usize, value: S, weight: f32) {
        self.items.push(StringItem {
            ty,
            value: value.into(),
            weight,
        });
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, StringItem> {
        self.items.iter()
    }
}

impl<'a> IntoIterator for &'a StringVector {
    type Item = &'a StringItem;
    type IntoIter = std::slice::Iter<'a, StringItem>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.iter()
    }
}

/// Sparse features plus an optional dense part (concatenated embeddings,
/// or the activations of a hidden layer).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FeatureVector {
    pub sparse: SparseVector,
    pub dense: Option<Vec<f32>>,
}

impl FeatureVector {
    pub fn new(sparse: SparseVector, dense: Option<Vec<f32>>) -> Self {
        Self { sparse, dense }
    }

    /// Number of sparse indices the vector needs, `max_index + 1`.
    pub fn sparse_size(&self) -> usize {
        self.sparse.max_index().map_or(0, |i| i + 1)
    }

    pub fn dense_size(&self) -> usize {
        self.dense.as_ref().map_or(0, Vec::len)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sparse_add_merges() {
        let mut x = SparseVector::new();
        x.add(3, 1.0);
        x.add(1, 0.5);
        x.add(3, 1.0);
        assert_eq!(x.len(), 2);
        assert_eq!(x.to_string(), "3:2 1:0.5");
        assert_eq!(x.max_index(), Some(3));
    }

    #[test]
    fn test_push_then_merge() {
        let mut x = SparseVector::new();
        for index in [7, 2, 7, 5, 2, 7] {
            x.push(index, 1.0);
        }
        assert_eq!(x.len(), 6);
        x.merge();
        assert_eq!(x.to_string(), "2:2 5:1 7:3");

        let y: SparseVector = [(4, 0.5), (1, 1.0), (4, 0.5)]
            .into_iter()
            .map(|(index, value)| SparseItem::new(index, value))
            .collect();
        assert_eq!(y.to_string(), "1:1 4:1");
    }

    #[test]
    fn test_add_bias() {
        let mut x = SparseVector::new();
        x.add(4, 1.0);
        x.add_bias(0.0);
        assert_eq!(x.len(), 1);
        x.add_bias(1.0);
        x.add_bias(1.0);
        assert_eq!(x.to_string(), "0:1 4:1");
    }

    #[test]
    fn test_feature_vector_sizes() {
        let mut sparse = SparseVector::new();
        sparse.add(9, 1.0);
        let x = FeatureVector::new(sparse, Some(vec![0.0; 4]));
        assert_eq!(x.sparse_size(), 10);
        assert_eq!(x.dense_size(), 4);
        assert_eq!(FeatureVector::default().sparse_size(), 0);
    }
}
