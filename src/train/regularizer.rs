//! L1 regularization by regularized dual averaging (RDA).

use crate::activation::Activation;
use crate::errors::{Error, Result};
use crate::weight::WeightVector;

use super::optimizer::Gradient;

/// Keeps the running sum of every gradient a weight has received and
/// recomputes the weight from it, so that weights whose cumulative gradient
/// stays within `rate × steps` are exactly zero.
#[derive(Debug, Clone)]
pub struct RegularizedDualAveraging {
    rate: f32,
    cumulative: WeightVector,
}

impl RegularizedDualAveraging {
    pub fn new(rate: f32) -> Result<Self> {
        if rate.is_nan() || rate <= 0.0 {
            return Err(Error::invalid_argument("l1", "l1 must be positive"));
        }
        Ok(Self {
            rate,
            cumulative: WeightVector::new(Activation::Identity),
        })
    }

    pub fn rate(&self) -> f32 {
        self.rate
    }

    /// Grows the cumulative penalties along with the weights they shadow.
    pub fn expand(&mut self, sparse_features: usize, dense_features: usize, label_size: usize) {
        self.cumulative
            .expand(sparse_features, dense_features, label_size, None);
    }

    /// Cumulative gradient of one weight.
    pub fn cumulative(&self, sparse: bool, label: usize, feature: usize) -> f32 {
        self.cumulative.part(sparse).get(label, feature)
    }

    /// Adds `gradient` to the cumulative sum and overwrites the weight.
    pub fn update_weight(
        &mut self,
        weights: &mut WeightVector,
        gradient: &Gradient,
        learning_rate: f32,
        steps: usize,
    ) {
        let cumulative = self.cumulative.part_mut(gradient.sparse);
        cumulative.add(gradient.label, gradient.feature, gradient.value);
        let sum = cumulative.get(gradient.label, gradient.feature);

        let l1 = self.rate * steps as f32;
        let weight = if sum.abs() <= l1 {
            0.0
        } else {
            learning_rate * (sum - sum.signum() * l1)
        };
        weights
            .part_mut(gradient.sparse)
            .set(gradient.label, gradient.feature, weight);
    }
}
