use std::fmt;

use hashbrown::HashMap;
use log::debug;

use crate::activation::Activation;
use crate::errors::{Error, Result};
use crate::instance::Instance;
use crate::train::regularizer::RegularizedDualAveraging;

use super::adagrad::Diagonals;
use super::{classification_gradients, predict_hinge, Gradient, OnlineOptimizer, OptimizerBase};

/// How a mini-batch folds its summed gradient into a squared-gradient
/// diagonal.
pub trait DiagonalUpdate: fmt::Debug + Clone + Send + Sync {
    const NAME: &'static str;

    fn diagonal(&self, previous: f32, gradient: f32) -> f32;
}

/// AdaGrad: `d + g²`.
#[derive(Debug, Clone, Copy, Default)]
pub struct SquaredSum;

impl DiagonalUpdate for SquaredSum {
    const NAME: &'static str = "AdaGrad Mini-batch";

    fn diagonal(&self, previous: f32, gradient: f32) -> f32 {
        previous + gradient * gradient
    }
}

/// AdaDelta: `ρ·d + (1 - ρ)·g²`.
#[derive(Debug, Clone, Copy)]
pub struct DecayingSquares {
    decaying_rate: f32,
}

impl DecayingSquares {
    pub fn new(decaying_rate: f32) -> Result<Self> {
        if !(0.0..1.0).contains(&decaying_rate) {
            return Err(Error::invalid_argument(
                "decaying_rate",
                "decaying_rate must be in [0, 1)",
            ));
        }
        Ok(Self { decaying_rate })
    }

    pub fn decaying_rate(&self) -> f32 {
        self.decaying_rate
    }
}

impl DiagonalUpdate for DecayingSquares {
    const NAME: &'static str = "AdaDelta Mini-batch";

    fn diagonal(&self, previous: f32, gradient: f32) -> f32 {
        self.decaying_rate * previous + (1.0 - self.decaying_rate) * gradient * gradient
    }
}

/// Adaptive gradient descent that sums gradients over a mini-batch and
/// updates each touched weight once per batch.
///
/// Weights never change between two calls to
/// [`OnlineOptimizer::update_mini_batch`], so the instances of a batch can be
/// scored in parallel.
#[derive(Debug, Clone)]
pub struct MiniBatch<D> {
    base: OptimizerBase,
    diagonals: Diagonals,
    pending: HashMap<(bool, usize, usize), f32>,
    batch_steps: usize,
    rule: D,
}

pub type AdaGradMiniBatch = MiniBatch<SquaredSum>;
pub type AdaDeltaMiniBatch = MiniBatch<DecayingSquares>;

impl<D: DiagonalUpdate> MiniBatch<D> {
    pub fn new(
        rule: D,
        learning_rate: f32,
        bias: f32,
        l1: Option<RegularizedDualAveraging>,
    ) -> Self {
        Self {
            base: OptimizerBase::new(Activation::Identity, learning_rate, bias, l1),
            diagonals: Diagonals::new(),
            pending: HashMap::new(),
            batch_steps: 1,
            rule,
        }
    }

    pub fn rule(&self) -> &D {
        &self.rule
    }

    /// Number of applied batches plus one.
    pub fn batch_steps(&self) -> usize {
        self.batch_steps
    }

    /// Number of weights with a buffered gradient.
    pub fn pending(&self) -> usize {
        self.pending.len()
    }

    /// Effective learning rate of one weight.
    pub fn learning_rate(&self, sparse: bool, label: usize, feature: usize) -> f32 {
        self.diagonals
            .learning_rate(self.base.learning_rate(), sparse, label, feature)
    }
}

impl<D: DiagonalUpdate> OnlineOptimizer for MiniBatch<D> {
    fn name(&self) -> &'static str {
        D::NAME
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
        for g in gradients {
            *self
                .pending
                .entry((g.sparse, g.label, g.feature))
                .or_insert(0.0) += g.value;
        }
    }

    fn is_mini_batch(&self) -> bool {
        true
    }

    fn update_mini_batch(&mut self) {
        let rate = self.base.learning_rate();
        let steps = self.batch_steps;
        let touched = self.pending.len();
        for ((sparse, label, feature), value) in self.pending.drain() {
            let d = self
                .rule
                .diagonal(self.diagonals.get(sparse, label, feature), value);
            self.diagonals.set(sparse, label, feature, d);
            let learning_rate = self.diagonals.learning_rate(rate, sparse, label, feature);
            let gradient = Gradient {
                layer: 0,
                sparse,
                label,
                feature,
                value,
            };
            self.base.update_weight(&gradient, learning_rate, steps);
        }
        debug!(
            "{}: batch {} updated {} weights",
            D::NAME,
            self.batch_steps,
            touched
        );
        self.batch_steps += 1;
    }
}
