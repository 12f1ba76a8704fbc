use crate::activation::Activation;
use crate::errors::{Error, Result};
use crate::instance::Instance;
use crate::vector::{FeatureVector, SparseVector};
use crate::weight::{WeightGenerator, WeightVector};

use super::{inputs, label_gradients, predict_regression, Gradient, OnlineOptimizer, OptimizerBase};

/// Bound of the uniform distribution new weights are drawn from.
const INIT_BOUND: f32 = 0.2;

/// Feed-forward network with a softmax output layer.
///
/// Layer 0 maps the input features to the first hidden layer and lives in
/// the [`OptimizerBase`]; layer `i` for `0 < i < n` maps hidden layer `i - 1`
/// to hidden layer `i`; layer `n` maps the last hidden layer to the labels,
/// where `n` is the number of hidden layers. Every layer above the input
/// reads its hidden input as a dense vector and the bias as sparse feature 0.
#[derive(Debug, Clone)]
pub struct FeedForwardSoftmax {
    base: OptimizerBase,
    dimensions: Vec<usize>,
    hidden: Vec<WeightVector>,
    output: WeightVector,
    generator: WeightGenerator,
}

impl FeedForwardSoftmax {
    /// `activations[i]` is applied to hidden layer `i`. Only element-wise
    /// activations are allowed there.
    pub fn new(
        dimensions: Vec<usize>,
        activations: Vec<Activation>,
        learning_rate: f32,
        bias: f32,
        seed: u64,
    ) -> Result<Self> {
        if dimensions.is_empty() {
            return Err(Error::invalid_config(
                "a feed-forward network needs at least one hidden layer",
            ));
        }
        if dimensions.len() != activations.len() {
            return Err(Error::invalid_config(format!(
                "{} hidden layers but {} activation functions",
                dimensions.len(),
                activations.len()
            )));
        }
        if dimensions.contains(&0) {
            return Err(Error::invalid_config("hidden dimensions must be positive"));
        }
        if let Some(a) = activations.iter().find(|a| !a.is_elementwise()) {
            return Err(Error::invalid_config(format!(
                "{} cannot be used in a hidden layer",
                a
            )));
        }

        let mut generator = WeightGenerator::uniform(-INIT_BOUND, INIT_BOUND, seed)?;
        let mut hidden = Vec::with_capacity(dimensions.len() - 1);
        for i in 1..dimensions.len() {
            let mut layer = WeightVector::new(activations[i]);
            layer.expand(1, dimensions[i - 1], dimensions[i], Some(&mut generator));
            hidden.push(layer);
        }

        Ok(Self {
            base: OptimizerBase::new(activations[0], learning_rate, bias, None),
            dimensions,
            hidden,
            output: WeightVector::new(Activation::Softmax),
            generator,
        })
    }

    pub fn dimensions(&self) -> &[usize] {
        &self.dimensions
    }

    fn layer(&self, i: usize) -> &WeightVector {
        match i {
            0 => self.base.weights(),
            i if i <= self.hidden.len() => &self.hidden[i - 1],
            _ => &self.output,
        }
    }

    fn layer_mut(&mut self, i: usize) -> &mut WeightVector {
        match i {
            0 => self.base.weights_mut(),
            i if i <= self.hidden.len() => &mut self.hidden[i - 1],
            _ => &mut self.output,
        }
    }

    /// Input of the layer above a hidden layer.
    fn hidden_input(&self, h: &[f32]) -> FeatureVector {
        let mut sparse = SparseVector::new();
        sparse.add_bias(self.base.bias());
        FeatureVector::new(sparse, Some(h.to_vec()))
    }

    /// Activations of every hidden layer followed by the label
    /// probabilities.
    pub fn forward(&self, x: &FeatureVector) -> Vec<Vec<f32>> {
        let mut layers = Vec::with_capacity(self.dimensions.len() + 1);
        layers.push(self.base.weights().scores(x));
        for i in 1..=self.dimensions.len() {
            let input = self.hidden_input(&layers[i - 1]);
            layers.push(self.layer(i).scores(&input));
        }
        layers
    }
}

impl OnlineOptimizer for FeedForwardSoftmax {
    fn name(&self) -> &'static str {
        "FeedForward-Softmax"
    }

    fn base(&self) -> &OptimizerBase {
        &self.base
    }

    fn base_mut(&mut self) -> &mut OptimizerBase {
        &mut self.base
    }

    fn expand(&mut self, sparse_features: usize, dense_features: usize) -> bool {
        let first = self.dimensions[0];
        let last = self.dimensions[self.dimensions.len() - 1];
        let labels = self.base.labels().len();
        let generator = &mut self.generator;
        let mut grew = self.base.weights_mut().expand(
            sparse_features,
            dense_features,
            first,
            Some(&mut *generator),
        );
        grew |= self.output.expand(1, last, labels, Some(generator));
        grew
    }

    fn raw_scores(&self, x: &FeatureVector) -> Vec<f32> {
        self.forward(x).pop().unwrap_or_default()
    }

    fn predict(&self, instance: &Instance) -> usize {
        predict_regression(instance)
    }

    /// Back-propagation of the cross-entropy loss. Every term is computed
    /// against the weights before the update.
    fn gradients(&self, instance: &Instance) -> Vec<Gradient> {
        let layers = self.forward(instance.x());
        let n = self.dimensions.len();
        let mut out = Vec::new();

        let mut delta = label_gradients(instance, self.base.labels().len());
        for i in (1..=n).rev() {
            let input = self.hidden_input(&layers[i - 1]);
            push_terms(&mut out, i, &input, &delta);

            let weights = self.layer(i).dense();
            let below = self.layer(i - 1).activation();
            delta = layers[i - 1]
                .iter()
                .enumerate()
                .map(|(xi, &h)| {
                    let error: f32 = delta
                        .iter()
                        .enumerate()
                        .map(|(y, d)| d * weights.get(y, xi))
                        .sum();
                    error * below.derivative(h)
                })
                .collect();
        }
        push_terms(&mut out, 0, instance.x(), &delta);
        out
    }

    fn apply(&mut self, gradients: &[Gradient]) {
        let learning_rate = self.base.learning_rate();
        for g in gradients {
            self.layer_mut(g.layer).part_mut(g.sparse).add(
                g.label,
                g.feature,
                learning_rate * g.value,
            );
        }
    }
}

/// `delta[y] × x` for every output `y` of `layer` and every input `x`.
fn push_terms(out: &mut Vec<Gradient>, layer: usize, x: &FeatureVector, delta: &[f32]) {
    for (sparse, feature, value) in inputs(x) {
        for (label, d) in delta.iter().enumerate() {
            out.push(Gradient {
                layer,
                sparse,
                label,
                feature,
                value: d * value,
            });
        }
    }
}
