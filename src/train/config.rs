//! Training configuration.

use std::fmt;
use std::str::FromStr;

use log::info;

use crate::activation::Activation;
use crate::errors::{Error, Result};

use super::optimizer::{
    AdaDeltaMiniBatch, AdaGrad, AdaGradMiniBatch, AdaGradRegression, DecayingSquares,
    FeedForwardSoftmax, OnlineOptimizer, Perceptron, SoftmaxRegression, SquaredSum,
};
use super::regularizer::RegularizedDualAveraging;
use super::rollin::RollIn;

/// Learning algorithm.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Algorithm {
    #[default]
    Perceptron,
    AdaGrad,
    AdaGradMiniBatch,
    AdaDeltaMiniBatch,
    Softmax,
    AdaGradRegression,
    FeedForwardSoftmax,
}

impl FromStr for Algorithm {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "perceptron" => Ok(Self::Perceptron),
            "adagrad" => Ok(Self::AdaGrad),
            "adagrad-minibatch" => Ok(Self::AdaGradMiniBatch),
            "adadelta-minibatch" => Ok(Self::AdaDeltaMiniBatch),
            "softmax" => Ok(Self::Softmax),
            "adagrad-regression" => Ok(Self::AdaGradRegression),
            "ffnn-softmax" => Ok(Self::FeedForwardSoftmax),
            other => Err(Error::invalid_argument(
                "algorithm",
                format!("unknown algorithm: {}", other),
            )),
        }
    }
}

impl fmt::Display for Algorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Perceptron => "perceptron",
            Self::AdaGrad => "adagrad",
            Self::AdaGradMiniBatch => "adagrad-minibatch",
            Self::AdaDeltaMiniBatch => "adadelta-minibatch",
            Self::Softmax => "softmax",
            Self::AdaGradRegression => "adagrad-regression",
            Self::FeedForwardSoftmax => "ffnn-softmax",
        };
        f.write_str(name)
    }
}

/// Hyper-parameters of one component.
///
/// Values are checked when they are set; settings that only conflict with
/// each other are reported by [`HyperParameter::build_optimizer`].
#[derive(Debug, Clone)]
pub struct HyperParameter {
    algorithm: Algorithm,
    learning_rate: f32,
    bias: f32,
    batch_size: usize,
    max_epochs: usize,
    decaying_rate: f32,
    l1: f32,
    hidden_dimensions: Vec<usize>,
    activations: Vec<Activation>,
    rollin_fixed_stage: usize,
    rollin_decaying_rate: f64,
    seed: u64,
    max_depth: usize,
    max_height: usize,
}

impl Default for HyperParameter {
    fn default() -> Self {
        Self {
            algorithm: Algorithm::Perceptron,
            learning_rate: 0.02,
            bias: 0.0,
            batch_size: 0,
            max_epochs: 50,
            decaying_rate: 0.4,
            l1: 0.0,
            hidden_dimensions: Vec::new(),
            activations: Vec::new(),
            rollin_fixed_stage: 0,
            rollin_decaying_rate: 0.95,
            seed: 9,
            max_depth: 3,
            max_height: 3,
        }
    }
}

impl HyperParameter {
    pub fn new(algorithm: Algorithm) -> Self {
        Self {
            algorithm,
            ..Self::default()
        }
    }

    pub fn algorithm(&self) -> Algorithm {
        self.algorithm
    }

    pub fn set_algorithm(&mut self, algorithm: Algorithm) {
        self.algorithm = algorithm;
    }

    pub fn learning_rate(&self) -> f32 {
        self.learning_rate
    }

    pub fn set_learning_rate(&mut self, learning_rate: f32) -> Result<()> {
        if learning_rate.is_nan() || learning_rate <= 0.0 {
            return Err(Error::invalid_argument(
                "learning_rate",
                "learning_rate must be positive",
            ));
        }
        self.learning_rate = learning_rate;
        Ok(())
    }

    pub fn bias(&self) -> f32 {
        self.bias
    }

    pub fn set_bias(&mut self, bias: f32) -> Result<()> {
        if bias.is_nan() || bias < 0.0 {
            return Err(Error::invalid_argument("bias", "bias must be non-negative"));
        }
        self.bias = bias;
        Ok(())
    }

    /// Number of sentences per update; 0 updates after every instance.
    pub fn batch_size(&self) -> usize {
        self.batch_size
    }

    pub fn set_batch_size(&mut self, batch_size: usize) {
        self.batch_size = batch_size;
    }

    pub fn max_epochs(&self) -> usize {
        self.max_epochs
    }

    pub fn set_max_epochs(&mut self, max_epochs: usize) -> Result<()> {
        if max_epochs < 1 {
            return Err(Error::invalid_argument(
                "max_epochs",
                "max_epochs must be at least 1",
            ));
        }
        self.max_epochs = max_epochs;
        Ok(())
    }

    pub fn decaying_rate(&self) -> f32 {
        self.decaying_rate
    }

    pub fn set_decaying_rate(&mut self, decaying_rate: f32) -> Result<()> {
        if !(0.0..1.0).contains(&decaying_rate) {
            return Err(Error::invalid_argument(
                "decaying_rate",
                "decaying_rate must be in [0, 1)",
            ));
        }
        self.decaying_rate = decaying_rate;
        Ok(())
    }

    /// L1 rate; 0 turns regularization off.
    pub fn l1(&self) -> f32 {
        self.l1
    }

    pub fn set_l1(&mut self, l1: f32) -> Result<()> {
        if l1.is_nan() || l1 < 0.0 {
            return Err(Error::invalid_argument("l1", "l1 must be non-negative"));
        }
        self.l1 = l1;
        Ok(())
    }

    pub fn hidden_dimensions(&self) -> &[usize] {
        &self.hidden_dimensions
    }

    pub fn set_hidden_dimensions(&mut self, dimensions: Vec<usize>) -> Result<()> {
        if dimensions.contains(&0) {
            return Err(Error::invalid_argument(
                "hidden_dimensions",
                "hidden_dimensions must be positive",
            ));
        }
        self.hidden_dimensions = dimensions;
        Ok(())
    }

    pub fn activations(&self) -> &[Activation] {
        &self.activations
    }

    pub fn set_activations(&mut self, activations: Vec<Activation>) -> Result<()> {
        if activations.iter().any(|a| !a.is_elementwise()) {
            return Err(Error::invalid_argument(
                "activations",
                "activations must be identity or sigmoid",
            ));
        }
        self.activations = activations;
        Ok(())
    }

    pub fn rollin_fixed_stage(&self) -> usize {
        self.rollin_fixed_stage
    }

    pub fn set_rollin_fixed_stage(&mut self, fixed_stage: usize) {
        self.rollin_fixed_stage = fixed_stage;
    }

    pub fn rollin_decaying_rate(&self) -> f64 {
        self.rollin_decaying_rate
    }

    pub fn set_rollin_decaying_rate(&mut self, decaying_rate: f64) -> Result<()> {
        if !(0.0..=1.0).contains(&decaying_rate) {
            return Err(Error::invalid_argument(
                "rollin_decaying_rate",
                "rollin_decaying_rate must be in [0, 1]",
            ));
        }
        self.rollin_decaying_rate = decaying_rate;
        Ok(())
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    pub fn set_seed(&mut self, seed: u64) {
        self.seed = seed;
    }

    pub fn max_depth(&self) -> usize {
        self.max_depth
    }

    pub fn set_max_depth(&mut self, max_depth: usize) -> Result<()> {
        if max_depth < 1 {
            return Err(Error::invalid_argument(
                "max_depth",
                "max_depth must be at least 1",
            ));
        }
        self.max_depth = max_depth;
        Ok(())
    }

    pub fn max_height(&self) -> usize {
        self.max_height
    }

    pub fn set_max_height(&mut self, max_height: usize) -> Result<()> {
        if max_height < 1 {
            return Err(Error::invalid_argument(
                "max_height",
                "max_height must be at least 1",
            ));
        }
        self.max_height = max_height;
        Ok(())
    }

    /// Sets a parameter from its string form. Lists are comma-separated.
    pub fn set(&mut self, key: &str, value: &str) -> Result<()> {
        let value = value.trim();
        match key {
            "algorithm" => self.set_algorithm(value.parse()?),
            "learning_rate" => self.set_learning_rate(value.parse()?)?,
            "bias" => self.set_bias(value.parse()?)?,
            "batch_size" => self.set_batch_size(value.parse()?),
            "max_epochs" => self.set_max_epochs(value.parse()?)?,
            "decaying_rate" => self.set_decaying_rate(value.parse()?)?,
            "l1" => self.set_l1(value.parse()?)?,
            "hidden_dimensions" => self.set_hidden_dimensions(parse_list(value)?)?,
            "activations" => self.set_activations(parse_list(value)?)?,
            "rollin_fixed_stage" => self.set_rollin_fixed_stage(value.parse()?),
            "rollin_decaying_rate" => self.set_rollin_decaying_rate(value.parse()?)?,
            "seed" => self.set_seed(value.parse()?),
            "max_depth" => self.set_max_depth(value.parse()?)?,
            "max_height" => self.set_max_height(value.parse()?)?,
            _ => {
                return Err(Error::invalid_argument(
                    "key",
                    format!("unknown parameter: {}", key),
                ))
            }
        }
        Ok(())
    }

    pub fn with_algorithm(mut self, algorithm: Algorithm) -> Self {
        self.algorithm = algorithm;
        self
    }

    pub fn with_learning_rate(mut self, learning_rate: f32) -> Result<Self> {
        self.set_learning_rate(learning_rate)?;
        Ok(self)
    }

    pub fn with_bias(mut self, bias: f32) -> Result<Self> {
        self.set_bias(bias)?;
        Ok(self)
    }

    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size;
        self
    }

    pub fn with_max_epochs(mut self, max_epochs: usize) -> Result<Self> {
        self.set_max_epochs(max_epochs)?;
        Ok(self)
    }

    pub fn with_decaying_rate(mut self, decaying_rate: f32) -> Result<Self> {
        self.set_decaying_rate(decaying_rate)?;
        Ok(self)
    }

    pub fn with_l1(mut self, l1: f32) -> Result<Self> {
        self.set_l1(l1)?;
        Ok(self)
    }

    /// Hidden layer sizes with the activation of each layer.
    pub fn with_hidden_layers(
        mut self,
        dimensions: Vec<usize>,
        activations: Vec<Activation>,
    ) -> Result<Self> {
        self.set_hidden_dimensions(dimensions)?;
        self.set_activations(activations)?;
        Ok(self)
    }

    pub fn with_rollin(mut self, fixed_stage: usize, decaying_rate: f64) -> Result<Self> {
        self.set_rollin_fixed_stage(fixed_stage);
        self.set_rollin_decaying_rate(decaying_rate)?;
        Ok(self)
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    fn regularizer(&self) -> Result<Option<RegularizedDualAveraging>> {
        if self.l1 > 0.0 {
            RegularizedDualAveraging::new(self.l1).map(Some)
        } else {
            Ok(None)
        }
    }

    /// Creates the configured optimizer, failing on settings that do not fit
    /// together.
    pub fn build_optimizer(&self) -> Result<Box<dyn OnlineOptimizer>> {
        let rate = self.learning_rate;
        let bias = self.bias;
        let l1 = self.regularizer()?;

        if self.algorithm != Algorithm::FeedForwardSoftmax && !self.hidden_dimensions.is_empty() {
            return Err(Error::invalid_config(format!(
                "hidden layers are only used by {}",
                Algorithm::FeedForwardSoftmax
            )));
        }

        let optimizer: Box<dyn OnlineOptimizer> = match self.algorithm {
            Algorithm::Perceptron => Box::new(Perceptron::new(rate, bias, l1)),
            Algorithm::AdaGrad => Box::new(AdaGrad::new(rate, bias, l1)),
            Algorithm::AdaGradMiniBatch => {
                Box::new(AdaGradMiniBatch::new(SquaredSum, rate, bias, l1))
            }
            Algorithm::AdaDeltaMiniBatch => {
                let rule = DecayingSquares::new(self.decaying_rate)?;
                Box::new(AdaDeltaMiniBatch::new(rule, rate, bias, l1))
            }
            Algorithm::Softmax => Box::new(SoftmaxRegression::new(rate, bias, l1)),
            Algorithm::AdaGradRegression => Box::new(AdaGradRegression::new(rate, bias, l1)),
            Algorithm::FeedForwardSoftmax => {
                if l1.is_some() {
                    return Err(Error::invalid_config(format!(
                        "l1 is not supported by {}",
                        self.algorithm
                    )));
                }
                Box::new(FeedForwardSoftmax::new(
                    self.hidden_dimensions.clone(),
                    self.activations.clone(),
                    rate,
                    bias,
                    self.seed,
                )?)
            }
        };

        info!(
            "{}: learning_rate = {}, bias = {}, l1 = {}, batch_size = {}",
            optimizer.name(),
            rate,
            bias,
            self.l1,
            self.batch_size
        );
        Ok(optimizer)
    }

    /// Creates the roll-in schedule.
    pub fn build_roll_in(&self) -> Result<RollIn> {
        RollIn::new(
            self.rollin_fixed_stage,
            self.rollin_decaying_rate,
            self.seed,
        )
    }
}

fn parse_list<T>(value: &str) -> Result<Vec<T>>
where
    T: FromStr,
    Error: From<T::Err>,
{
    if value.is_empty() {
        return Ok(Vec::new());
    }
    value
        .split(',')
        .map(|v| v.trim().parse::<T>().map_err(Error::from))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let hp = HyperParameter::default();
        assert_eq!(hp.algorithm(), Algorithm::Perceptron);
        assert_eq!(hp.learning_rate(), 0.02);
        assert_eq!(hp.max_epochs(), 50);
        assert_eq!(hp.seed(), 9);
        assert_eq!(hp.rollin_decaying_rate(), 0.95);
    }

    #[test]
    fn test_set_lists() {
        let mut hp = HyperParameter::new(Algorithm::FeedForwardSoftmax);
        hp.set("hidden_dimensions", "8, 4").unwrap();
        hp.set("activations", "sigmoid,identity").unwrap();
        assert_eq!(hp.hidden_dimensions(), &[8, 4]);
        assert_eq!(hp.activations(), &[Activation::Sigmoid, Activation::Identity]);
        assert!(hp.set("activations", "softmax").is_err());
        assert!(hp.set("hidden_dimensions", "8,x").is_err());
        assert!(hp.build_optimizer().is_ok());
    }

    #[test]
    fn test_algorithm_names() {
        for name in [
            "perceptron",
            "adagrad",
            "adagrad-minibatch",
            "adadelta-minibatch",
            "softmax",
            "adagrad-regression",
            "ffnn-softmax",
        ] {
            let algorithm: Algorithm = name.parse().unwrap();
            assert_eq!(algorithm.to_string(), name);
        }
        assert!("sgd".parse::<Algorithm>().is_err());
    }
}
