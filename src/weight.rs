//! Weight storage.
//!
//! Weights are kept in flat, growable arrays. The sparse part is stored
//! column-major (all labels of one feature are adjacent), so that a new
//! feature only appends cells; the dense part is stored row-major.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::activation::Activation;
use crate::errors::{Error, Result};
use crate::vector::{FeatureVector, SparseVector};

/// Source of initial values for newly allocated weights.
#[derive(Debug, Clone)]
pub struct WeightGenerator {
    rng: StdRng,
    low: f32,
    high: f32,
}

impl WeightGenerator {
    /// Uniform values in `[low, high]`.
    pub fn uniform(low: f32, high: f32, seed: u64) -> Result<Self> {
        if low.is_nan() || high.is_nan() || low > high {
            return Err(Error::invalid_argument(
                "high",
                "weight generator bounds must satisfy low <= high",
            ));
        }
        Ok(Self {
            rng: StdRng::seed_from_u64(seed),
            low,
            high,
        })
    }

    pub fn next_weight(&mut self) -> f32 {
        self.rng.random_range(self.low..=self.high)
    }
}

/// Memory layout of a [`MajorVector`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Layout {
    /// `index = x + y * feature_size`
    RowMajor,
    /// `index = y + x * label_size`
    ColumnMajor,
}

/// A `label_size × feature_size` matrix in a flat vector.
#[derive(Debug, Clone)]
pub struct MajorVector {
    layout: Layout,
    weights: Vec<f32>,
    label_size: usize,
    feature_size: usize,
}

impl MajorVector {
    pub fn new(layout: Layout) -> Self {
        Self {
            layout,
            weights: Vec::new(),
            label_size: 0,
            feature_size: 0,
        }
    }

    pub fn layout(&self) -> Layout {
        self.layout
    }

    pub fn label_size(&self) -> usize {
        self.label_size
    }

    pub fn feature_size(&self) -> usize {
        self.feature_size
    }

    /// Number of cells, always `label_size * feature_size`.
    pub fn len(&self) -> usize {
        self.weights.len()
    }

    pub fn is_empty(&self) -> bool {
        self.weights.is_empty()
    }

    /// Flat index of `(label, feature)`.
    pub fn index(&self, label: usize, feature: usize) -> usize {
        match self.layout {
            Layout::RowMajor => feature + label * self.feature_size,
            Layout::ColumnMajor => label + feature * self.label_size,
        }
    }

    pub fn get(&self, label: usize, feature: usize) -> f32 {
        if label >= self.label_size || feature >= self.feature_size {
            return 0.0;
        }
        self.weights[self.index(label, feature)]
    }

    pub fn set(&mut self, label: usize, feature: usize, value: f32) {
        if label < self.label_size && feature < self.feature_size {
            let i = self.index(label, feature);
            self.weights[i] = value;
        }
    }

    pub fn add(&mut self, label: usize, feature: usize, value: f32) {
        if label < self.label_size && feature < self.feature_size {
            let i = self.index(label, feature);
            self.weights[i] += value;
        }
    }

    pub fn as_slice(&self) -> &[f32] {
        &self.weights
    }

    /// Grows the matrix to at least `label_size × feature_size`.
    ///
    /// Existing weights keep their `(label, feature)` position; new cells
    /// are zero or drawn from `generator`. Returns `true` if anything grew.
    pub fn expand(
        &mut self,
        label_size: usize,
        feature_size: usize,
        mut generator: Option<&mut WeightGenerator>,
    ) -> bool {
        let label_size = label_size.max(self.label_size);
        let feature_size = feature_size.max(self.feature_size);
        if label_size == self.label_size && feature_size == self.feature_size {
            return false;
        }

        let mut fill = || generator.as_mut().map_or(0.0, |g| g.next_weight());

        let appendable = match self.layout {
            Layout::ColumnMajor => label_size == self.label_size,
            Layout::RowMajor => feature_size == self.feature_size,
        };

        if appendable || self.weights.is_empty() {
            let total = label_size * feature_size;
            self.weights.reserve(total - self.weights.len());
            while self.weights.len() < total {
                self.weights.push(fill());
            }
        } else {
            let mut weights = Vec::with_capacity(label_size * feature_size);
            for outer in 0..outer_size(self.layout, label_size, feature_size) {
                for inner in 0..inner_size(self.layout, label_size, feature_size) {
                    let (y, x) = match self.layout {
                        Layout::RowMajor => (outer, inner),
                        Layout::ColumnMajor => (inner, outer),
                    };
                    if y < self.label_size && x < self.feature_size {
                        weights.push(self.weights[self.index(y, x)]);
                    } else {
                        weights.push(fill());
                    }
                }
            }
            self.weights = weights;
        }

        self.label_size = label_size;
        self.feature_size = feature_size;
        true
    }

    /// Adds `W · x` for the sparse input `x` to `scores`.
    /// Features beyond the matrix are ignored.
    pub fn add_sparse_scores(&self, x: &SparseVector, scores: &mut [f32]) {
        for item in x {
            if item.index >= self.feature_size {
                continue;
            }
            for (y, score) in scores.iter_mut().enumerate().take(self.label_size) {
                *score += self.weights[self.index(y, item.index)] * item.value;
            }
        }
    }

    /// Adds `W · x` for the dense input `x` to `scores`.
    pub fn add_dense_scores(&self, x: &[f32], scores: &mut [f32]) {
        let n = x.len().min(self.feature_size);
        for (y, score) in scores.iter_mut().enumerate().take(self.label_size) {
            *score += (0..n)
                .map(|i| self.weights[self.index(y, i)] * x[i])
                .sum::<f32>();
        }
    }
}

fn outer_size(layout: Layout, labels: usize, features: usize) -> usize {
    match layout {
        Layout::RowMajor => labels,
        Layout::ColumnMajor => features,
    }
}

fn inner_size(layout: Layout, labels: usize, features: usize) -> usize {
    match layout {
        Layout::RowMajor => features,
        Layout::ColumnMajor => labels,
    }
}

/// Weights of one linear layer: a column-major sparse part, a row-major
/// dense part and the activation applied to the scores.
#[derive(Debug, Clone)]
pub struct WeightVector {
    sparse: MajorVector,
    dense: MajorVector,
    activation: Activation,
}

impl WeightVector {
    pub fn new(activation: Activation) -> Self {
        Self {
            sparse: MajorVector::new(Layout::ColumnMajor),
            dense: MajorVector::new(Layout::RowMajor),
            activation,
        }
    }

    pub fn activation(&self) -> Activation {
        self.activation
    }

    pub fn label_size(&self) -> usize {
        self.sparse.label_size().max(self.dense.label_size())
    }

    pub fn sparse(&self) -> &MajorVector {
        &self.sparse
    }

    pub fn sparse_mut(&mut self) -> &mut MajorVector {
        &mut self.sparse
    }

    pub fn dense(&self) -> &MajorVector {
        &self.dense
    }

    pub fn dense_mut(&mut self) -> &mut MajorVector {
        &mut self.dense
    }

    /// The sparse or the dense part.
    pub fn part(&self, sparse: bool) -> &MajorVector {
        if sparse {
            &self.sparse
        } else {
            &self.dense
        }
    }

    pub fn part_mut(&mut self, sparse: bool) -> &mut MajorVector {
        if sparse {
            &mut self.sparse
        } else {
            &mut self.dense
        }
    }

    /// Grows both parts; the dense part is only allocated once it has
    /// features. Returns `true` if anything grew.
    pub fn expand(
        &mut self,
        sparse_features: usize,
        dense_features: usize,
        label_size: usize,
        mut generator: Option<&mut WeightGenerator>,
    ) -> bool {
        let mut grew = self
            .sparse
            .expand(label_size, sparse_features, generator.as_deref_mut());
        if dense_features > 0 || self.dense.feature_size() > 0 {
            grew |= self.dense.expand(label_size, dense_features, generator);
        }
        grew
    }

    /// Activated scores of every label for `x`.
    pub fn scores(&self, x: &FeatureVector) -> Vec<f32> {
        let mut scores = vec![0.0; self.label_size()];
        self.sparse.add_sparse_scores(&x.sparse, &mut scores);
        if let Some(dense) = &x.dense {
            self.dense.add_dense_scores(dense, &mut scores);
        }
        self.activation.apply(&mut scores);
        scores
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn filled(layout: Layout, labels: usize, features: usize) -> MajorVector {
        let mut m = MajorVector::new(layout);
        m.expand(labels, features, None);
        for y in 0..labels {
            for x in 0..features {
                m.set(y, x, (10 * y + x) as f32 + 1.0);
            }
        }
        m
    }

    #[test]
    fn test_expand_preserves_weights() {
        for layout in [Layout::RowMajor, Layout::ColumnMajor] {
            for (labels, features) in [(2, 3), (4, 3), (2, 7), (5, 6)] {
                let mut m = filled(layout, 2, 3);
                assert!(m.expand(labels, features, None));
                assert_eq!(m.len(), labels * features);
                for y in 0..labels {
                    for x in 0..features {
                        let expected = if y < 2 && x < 3 {
                            (10 * y + x) as f32 + 1.0
                        } else {
                            0.0
                        };
                        assert_eq!(m.get(y, x), expected, "{:?} ({}, {})", layout, y, x);
                    }
                }
            }
        }
    }

    #[test]
    fn test_expand_never_shrinks() {
        let mut m = filled(Layout::ColumnMajor, 3, 3);
        assert!(!m.expand(2, 2, None));
        assert_eq!(m.label_size(), 3);
        assert_eq!(m.get(2, 2), 23.0);
    }

    #[test]
    fn test_expand_with_generator() {
        let mut generator = WeightGenerator::uniform(-0.5, 0.5, 1).unwrap();
        let mut m = filled(Layout::ColumnMajor, 1, 1);
        m.expand(2, 2, Some(&mut generator));
        assert_eq!(m.get(0, 0), 1.0);
        for (y, x) in [(0, 1), (1, 0), (1, 1)] {
            assert!((-0.5..=0.5).contains(&m.get(y, x)));
        }
        assert!(WeightGenerator::uniform(1.0, 0.0, 1).is_err());
    }

    #[test]
    fn test_scores() {
        let mut w = WeightVector::new(Activation::Identity);
        w.expand(3, 2, 2, None);
        w.sparse_mut().set(0, 1, 1.0);
        w.sparse_mut().set(1, 2, 2.0);
        w.dense_mut().set(1, 0, 0.5);

        let mut sparse = SparseVector::new();
        sparse.add(1, 1.0);
        sparse.add(2, 1.0);
        sparse.add(99, 1.0);
        let x = FeatureVector::new(sparse, Some(vec![2.0, 3.0]));
        assert_eq!(w.scores(&x), vec![1.0, 3.0]);
    }
}
