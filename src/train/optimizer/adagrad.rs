use crate::activation::Activation;
use crate::instance::Instance;
use crate::train::regularizer::RegularizedDualAveraging;
use crate::weight::WeightVector;

use super::{
    classification_gradients, predict_hinge, predict_regression, regression_gradients, Gradient,
    OnlineOptimizer, OptimizerBase, EPSILON,
};

/// Per-weight sums of squared gradients.
#[derive(Debug, Clone)]
pub(super) struct Diagonals {
    sums: WeightVector,
}

impl Diagonals {
    pub(super) fn new() -> Self {
        Self {
            sums: WeightVector::new(Activation::Identity),
        }
    }

    pub(super) fn expand(&mut self, base: &OptimizerBase) {
        let weights = base.weights();
        self.sums.expand(
            weights.sparse().feature_size(),
            weights.dense().feature_size(),
            weights.label_size(),
            None,
        );
    }

    pub(super) fn get(&self, sparse: bool, label: usize, feature: usize) -> f32 {
        self.sums.part(sparse).get(label, feature)
    }

    pub(super) fn set(&mut self, sparse: bool, label: usize, feature: usize, value: f32) {
        self.sums.part_mut(sparse).set(label, feature, value);
    }

    /// `rate / (ε + √diagonal)`
    pub(super) fn learning_rate(&self, rate: f32, sparse: bool, label: usize, feature: usize) -> f32 {
        rate / (EPSILON + self.get(sparse, label, feature).sqrt())
    }

    /// Adds the squared gradient, then applies it with the adapted rate.
    fn apply(&mut self, base: &mut OptimizerBase, gradients: &[Gradient]) {
        let rate = base.learning_rate();
        let steps = base.steps();
        for g in gradients {
            let d = self.get(g.sparse, g.label, g.feature) + g.value * g.value;
            self.set(g.sparse, g.label, g.feature, d);
            let learning_rate = self.learning_rate(rate, g.sparse, g.label, g.feature);
            base.update_weight(g, learning_rate, steps);
        }
    }
}

/// AdaGrad with the hinge loss: predictions must beat the gold label by a
/// margin of 1 to count as correct.
#[derive(Debug, Clone)]
pub struct AdaGrad {
    base: OptimizerBase,
    diagonals: Diagonals,
}

impl AdaGrad {
    pub fn new(learning_rate: f32, bias: f32, l1: Option<RegularizedDualAveraging>) -> Self {
        Self {
            base: OptimizerBase::new(Activation::Identity, learning_rate, bias, l1),
            diagonals: Diagonals::new(),
        }
    }

    /// Effective learning rate of one weight.
    pub fn learning_rate(&self, sparse: bool, label: usize, feature: usize) -> f32 {
        self.diagonals
            .learning_rate(self.base.learning_rate(), sparse, label, feature)
    }
}

impl OnlineOptimizer for AdaGrad {
    fn name(&self) -> &'static str {
        "AdaGrad"
    }

    fn base(&self) -> &OptimizerBase {
        &self.base
    }

    fn base_mut(&mut self) -> &mut OptimizerBase {
        &mut self.base
    }

    fn expand(&mut self, sparse_features: usize, dense_features: usize) -> bool {
        let grew = self.base.expand(sparse_features, dense_features);
        if grew {
            self.diagonals.expand(&self.base);
        }
        grew
    }

    fn predict(&self, instance: &Instance) -> usize {
        predict_hinge(instance)
    }

    fn gradients(&self, instance: &Instance) -> Vec<Gradient> {
        classification_gradients(instance)
    }

    fn apply(&mut self, gradients: &[Gradient]) {
        self.diagonals.apply(&mut self.base, gradients);
    }
}

/// AdaGrad on the squared loss against the one-hot target, updating every
/// label on every mistake.
#[derive(Debug, Clone)]
pub struct AdaGradRegression {
    base: OptimizerBase,
    diagonals: Diagonals,
}

impl AdaGradRegression {
    pub fn new(learning_rate: f32, bias: f32, l1: Option<RegularizedDualAveraging>) -> Self {
        Self {
            base: OptimizerBase::new(Activation::Identity, learning_rate, bias, l1),
            diagonals: Diagonals::new(),
        }
    }
}

impl OnlineOptimizer for AdaGradRegression {
    fn name(&self) -> &'static str {
        "AdaGrad Regression"
    }

    fn base(&self) -> &OptimizerBase {
        &self.base
    }

    fn base_mut(&mut self) -> &mut OptimizerBase {
        &mut self.base
    }

    fn expand(&mut self, sparse_features: usize, dense_features: usize) -> bool {
        let grew = self.base.expand(sparse_features, dense_features);
        if grew {
            self.diagonals.expand(&self.base);
        }
        grew
    }

    fn predict(&self, instance: &Instance) -> usize {
        predict_regression(instance)
    }

    fn gradients(&self, instance: &Instance) -> Vec<Gradient> {
        regression_gradients(instance, self.base.labels().len())
    }

    fn apply(&mut self, gradients: &[Gradient]) {
        self.diagonals.apply(&mut self.base, gradients);
    }
}
