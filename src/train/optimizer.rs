//! Online optimizers.
//!
//! An optimizer owns the weights of a classifier together with the map of
//! its output labels, and updates the weights from one [`Instance`] at a
//! time. Training an instance always runs the same steps:
//!
//! 1. register the gold labels and put the bias feature in front,
//! 2. grow the weights to the feature and label space of the instance,
//! 3. score and predict,
//! 4. if the prediction is not a gold label, compute the gradient terms and
//!    apply them.
//!
//! Optimizers differ in how they predict during training and in how they
//! turn gradient terms into weight changes.

use std::fmt;

use rayon::prelude::*;

use crate::activation::Activation;
use crate::dictionary::LabelMap;
use crate::errors::Result;
use crate::instance::Instance;
use crate::vector::FeatureVector;
use crate::weight::WeightVector;

use super::regularizer::RegularizedDualAveraging;

mod adagrad;
mod minibatch;
mod neural;
mod perceptron;
mod softmax;

pub use self::adagrad::{AdaGrad, AdaGradRegression};
pub use self::minibatch::{
    AdaDeltaMiniBatch, AdaGradMiniBatch, DecayingSquares, DiagonalUpdate, MiniBatch, SquaredSum,
};
pub use self::neural::FeedForwardSoftmax;
pub use self::perceptron::Perceptron;
pub use self::softmax::SoftmaxRegression;

/// Stabilizer of the adaptive learning rate.
pub const EPSILON: f32 = 1e-5;

/// One term of a weight update: `value` for the cell `(label, feature)` of
/// the sparse or dense part of layer `layer`. Linear models only have layer
/// 0.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Gradient {
    pub layer: usize,
    pub sparse: bool,
    pub label: usize,
    pub feature: usize,
    pub value: f32,
}

/// Weights, labels and counters shared by every optimizer.
#[derive(Debug, Clone)]
pub struct OptimizerBase {
    weights: WeightVector,
    labels: LabelMap,
    learning_rate: f32,
    bias: f32,
    l1: Option<RegularizedDualAveraging>,
    steps: usize,
}

impl OptimizerBase {
    pub fn new(
        activation: Activation,
        learning_rate: f32,
        bias: f32,
        l1: Option<RegularizedDualAveraging>,
    ) -> Self {
        Self {
            weights: WeightVector::new(activation),
            labels: LabelMap::new(),
            learning_rate,
            bias,
            l1,
            steps: 1,
        }
    }

    pub fn weights(&self) -> &WeightVector {
        &self.weights
    }

    pub fn weights_mut(&mut self) -> &mut WeightVector {
        &mut self.weights
    }

    pub fn labels(&self) -> &LabelMap {
        &self.labels
    }

    pub fn labels_mut(&mut self) -> &mut LabelMap {
        &mut self.labels
    }

    pub fn learning_rate(&self) -> f32 {
        self.learning_rate
    }

    pub fn bias(&self) -> f32 {
        self.bias
    }

    pub fn l1(&self) -> Option<&RegularizedDualAveraging> {
        self.l1.as_ref()
    }

    /// Number of trained instances plus one.
    pub fn steps(&self) -> usize {
        self.steps
    }

    pub(crate) fn advance(&mut self, n: usize) {
        self.steps += n;
    }

    /// Registers the gold labels of `instance` and adds the bias feature.
    pub(crate) fn augment(&mut self, instance: &mut Instance) -> Result<()> {
        let gold = instance
            .gold_labels()
            .iter()
            .map(|label| self.labels.add(label))
            .collect::<Result<Vec<_>>>()?;
        instance.set_gold(gold);
        instance.x_mut().sparse.add_bias(self.bias);
        Ok(())
    }

    /// Grows the weights, and the L1 penalties with them, to the given
    /// feature sizes and the current number of labels.
    pub fn expand(&mut self, sparse_features: usize, dense_features: usize) -> bool {
        let labels = self.labels.len();
        let grew = self
            .weights
            .expand(sparse_features, dense_features, labels, None);
        if grew {
            if let Some(l1) = &mut self.l1 {
                l1.expand(sparse_features, dense_features, labels);
            }
        }
        grew
    }

    /// `w += learning_rate × gradient`, or the dual-averaging update at
    /// `steps` when L1 is on.
    pub(crate) fn update_weight(&mut self, gradient: &Gradient, learning_rate: f32, steps: usize) {
        match &mut self.l1 {
            Some(l1) => l1.update_weight(&mut self.weights, gradient, learning_rate, steps),
            None => self.weights.part_mut(gradient.sparse).add(
                gradient.label,
                gradient.feature,
                learning_rate * gradient.value,
            ),
        }
    }
}

/// An online learning algorithm.
///
/// Implementors supply prediction and the update rule; training, batching
/// and scoring are provided.
pub trait OnlineOptimizer: fmt::Debug + Send + Sync {
    fn name(&self) -> &'static str;

    fn base(&self) -> &OptimizerBase;

    fn base_mut(&mut self) -> &mut OptimizerBase;

    /// Label compared with the gold labels during training. The scores of
    /// `instance` are set.
    fn predict(&self, instance: &Instance) -> usize;

    /// Gradient terms of an instance whose prediction is wrong, computed
    /// against the current weights.
    fn gradients(&self, instance: &Instance) -> Vec<Gradient>;

    /// Turns gradient terms into weight changes.
    fn apply(&mut self, gradients: &[Gradient]);

    /// Grows every weight structure to the given input sizes and the current
    /// number of labels. Returns `true` if anything grew.
    fn expand(&mut self, sparse_features: usize, dense_features: usize) -> bool {
        self.base_mut().expand(sparse_features, dense_features)
    }

    /// Scores of a vector that already carries its bias feature.
    fn raw_scores(&self, x: &FeatureVector) -> Vec<f32> {
        self.base().weights().scores(x)
    }

    /// Returns `true` if [`Self::apply`] only buffers gradients until
    /// [`Self::update_mini_batch`].
    fn is_mini_batch(&self) -> bool {
        false
    }

    /// Applies the buffered gradients of a mini-batch.
    fn update_mini_batch(&mut self) {}

    fn labels(&self) -> &LabelMap {
        self.base().labels()
    }

    fn steps(&self) -> usize {
        self.base().steps()
    }

    /// Adds the bias feature to `x` and scores it. Does not touch the
    /// weights or the labels.
    fn scores(&self, x: &mut FeatureVector) -> Vec<f32> {
        x.sparse.add_bias(self.base().bias());
        self.raw_scores(x)
    }

    /// Stops the label map from growing.
    fn freeze(&mut self) {
        self.base_mut().labels_mut().freeze();
    }

    /// Registers labels and grows the weights for `instance`.
    fn prepare(&mut self, instance: &mut Instance) -> Result<()> {
        self.base_mut().augment(instance)?;
        let sparse = instance.x().sparse_size();
        let dense = instance.x().dense_size();
        self.expand(sparse, dense);
        Ok(())
    }

    /// Trains on one instance and leaves its scores and prediction set.
    fn train(&mut self, instance: &mut Instance) -> Result<()> {
        self.prepare(instance)?;
        let scores = self.raw_scores(instance.x());
        instance.set_scores(scores);
        let yhat = self.predict(instance);
        instance.set_predicted(yhat);
        if !instance.is_gold(yhat) {
            let gradients = self.gradients(instance);
            self.apply(&gradients);
        }
        self.base_mut().advance(1);
        Ok(())
    }

    /// Trains on a batch of instances.
    ///
    /// Mini-batch optimizers grow their weights for the whole batch first,
    /// then score the instances and compute their gradients in parallel
    /// against the unchanged weights, and finally apply the merged update.
    /// Other optimizers train on the instances one after another.
    fn train_batch(&mut self, instances: &mut [Instance]) -> Result<()> {
        if !self.is_mini_batch() {
            for instance in instances.iter_mut() {
                self.train(instance)?;
            }
            return Ok(());
        }

        for instance in instances.iter_mut() {
            self.prepare(instance)?;
        }

        let this = &*self;
        let gradients: Vec<Vec<Gradient>> = instances
            .par_iter_mut()
            .map(|instance| {
                let scores = this.raw_scores(instance.x());
                instance.set_scores(scores);
                let yhat = this.predict(instance);
                instance.set_predicted(yhat);
                if instance.is_gold(yhat) {
                    Vec::new()
                } else {
                    this.gradients(instance)
                }
            })
            .collect();

        for g in &gradients {
            self.apply(g);
        }
        self.base_mut().advance(instances.len());
        self.update_mini_batch();
        Ok(())
    }
}

/// Index of the highest score, the lowest index on ties.
pub fn argmax(scores: &[f32]) -> usize {
    let mut best = 0;
    for (i, &s) in scores.iter().enumerate().skip(1) {
        if s > scores[best] {
            best = i;
        }
    }
    best
}

/// The two best labels, best first. The second one is `None` for fewer than
/// two scores.
pub fn argmax2(scores: &[f32]) -> (usize, Option<usize>) {
    let best = argmax(scores);
    let mut second: Option<usize> = None;
    for (i, &s) in scores.iter().enumerate() {
        if i != best && second.map_or(true, |j| s > scores[j]) {
            second = Some(i);
        }
    }
    (best, second)
}

/// Prediction with a margin of 1 in favour of every wrong label.
pub(crate) fn predict_hinge(instance: &Instance) -> usize {
    let mut scores = instance.scores().to_vec();
    for &y in instance.gold() {
        if let Some(s) = scores.get_mut(y) {
            *s -= 1.0;
        }
    }
    argmax(&scores)
}

/// The target label once its score reaches 1, the best label otherwise.
pub(crate) fn predict_regression(instance: &Instance) -> usize {
    match instance.target() {
        Some(y) if instance.scores().get(y).is_some_and(|&s| s >= 1.0) => y,
        _ => argmax(instance.scores()),
    }
}

/// Gradient terms of the perceptron rule: `+x` towards the target label and
/// `-x` away from the predicted one.
pub(crate) fn classification_gradients(instance: &Instance) -> Vec<Gradient> {
    let (Some(gold), Some(predicted)) = (instance.target(), instance.predicted()) else {
        return Vec::new();
    };
    let mut out = Vec::new();
    for (sparse, feature, x) in inputs(instance.x()) {
        for (label, value) in [(gold, x), (predicted, -x)] {
            out.push(Gradient {
                layer: 0,
                sparse,
                label,
                feature,
                value,
            });
        }
    }
    out
}

/// Per-label gradients of the squared or cross-entropy loss against the
/// one-hot target, `indicator(target) - score`.
pub(crate) fn label_gradients(instance: &Instance, label_size: usize) -> Vec<f32> {
    let mut gradients: Vec<f32> = (0..label_size)
        .map(|y| -instance.scores().get(y).copied().unwrap_or(0.0))
        .collect();
    if let Some(g) = instance.target().and_then(|y| gradients.get_mut(y)) {
        *g += 1.0;
    }
    gradients
}

/// Gradient terms of every label for every input.
pub(crate) fn regression_gradients(instance: &Instance, label_size: usize) -> Vec<Gradient> {
    let gradients = label_gradients(instance, label_size);
    let mut out = Vec::new();
    for (sparse, feature, x) in inputs(instance.x()) {
        for (label, g) in gradients.iter().enumerate() {
            out.push(Gradient {
                layer: 0,
                sparse,
                label,
                feature,
                value: g * x,
            });
        }
    }
    out
}

/// `(sparse, feature, value)` of every input, sparse part first.
pub(crate) fn inputs(x: &FeatureVector) -> impl Iterator<Item = (bool, usize, f32)> + '_ {
    let sparse = x.sparse.iter().map(|item| (true, item.index, item.value));
    let dense = x
        .dense
        .iter()
        .flatten()
        .enumerate()
        .map(|(i, &v)| (false, i, v));
    sparse.chain(dense)
}
