//! Activation functions applied to score vectors.

use std::fmt;
use std::str::FromStr;

use crate::errors::{Error, Result};

/// Output transformation of a layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Activation {
    /// Raw scores.
    #[default]
    Identity,
    /// Element-wise logistic function.
    Sigmoid,
    /// Exponentiated and normalised to a probability distribution.
    Softmax,
    /// Divided by their sum.
    Normalize,
}

impl Activation {
    /// Transforms `scores` in place. A zero normalisation sum is treated as 1.
    pub fn apply(self, scores: &mut [f32]) {
        match self {
            Self::Identity => {}
            Self::Sigmoid => {
                for s in scores.iter_mut() {
                    *s = sigmoid(*s);
                }
            }
            Self::Softmax => {
                let max = scores.iter().copied().fold(f32::NEG_INFINITY, f32::max);
                if !max.is_finite() {
                    return;
                }
                for s in scores.iter_mut() {
                    *s = (*s - max).exp();
                }
                normalize(scores);
            }
            Self::Normalize => normalize(scores),
        }
    }

    /// Derivative expressed through the activation's output `y`.
    pub fn derivative(self, y: f32) -> f32 {
        match self {
            Self::Sigmoid => y * (1.0 - y),
            _ => 1.0,
        }
    }

    /// Returns `true` if the activation works element-wise and can be used
    /// inside a hidden layer.
    pub fn is_elementwise(self) -> bool {
        matches!(self, Self::Identity | Self::Sigmoid)
    }
}

fn sigmoid(x: f32) -> f32 {
    // exp overflows beyond this range; the result is already 0 or 1 in f32
    if x <= -30.0 {
        0.0
    } else if x >= 30.0 {
        1.0
    } else {
        1.0 / (1.0 + (-x).exp())
    }
}

fn normalize(scores: &mut [f32]) {
    let sum: f32 = scores.iter().sum();
    let sum = if sum == 0.0 || !sum.is_finite() { 1.0 } else { sum };
    for s in scores.iter_mut() {
        *s /= sum;
    }
}

impl FromStr for Activation {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "identity" | "linear" => Ok(Self::Identity),
            "sigmoid" => Ok(Self::Sigmoid),
            "softmax" => Ok(Self::Softmax),
            "normalize" | "normalization" => Ok(Self::Normalize),
            other => Err(Error::invalid_argument(
                "activation",
                format!("unknown activation function: {}", other),
            )),
        }
    }
}

impl fmt::Display for Activation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Identity => "identity",
            Self::Sigmoid => "sigmoid",
            Self::Softmax => "softmax",
            Self::Normalize => "normalize",
        };
        f.write_str(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_softmax_sums_to_one() {
        let mut scores = vec![1.0, 2.0, 3.0];
        Activation::Softmax.apply(&mut scores);
        let sum: f32 = scores.iter().sum();
        assert!((sum - 1.0).abs() < 1e-6);
        assert!(scores[2] > scores[1] && scores[1] > scores[0]);

        let mut large = vec![1000.0, 1000.0];
        Activation::Softmax.apply(&mut large);
        assert!((large[0] - 0.5).abs() < 1e-6);
    }

    #[test]
    fn test_normalize_zero_sum() {
        let mut scores = vec![0.0, 0.0];
        Activation::Normalize.apply(&mut scores);
        assert_eq!(scores, vec![0.0, 0.0]);

        let mut scores = vec![1.0, -1.0];
        Activation::Normalize.apply(&mut scores);
        assert!(scores.iter().all(|s| s.is_finite()));
    }

    #[test]
    fn test_sigmoid() {
        let mut scores = vec![0.0, 100.0, -100.0];
        Activation::Sigmoid.apply(&mut scores);
        assert_eq!(scores, vec![0.5, 1.0, 0.0]);
        assert_eq!(Activation::Sigmoid.derivative(0.5), 0.25);
    }

    #[test]
    fn test_parse() {
        assert_eq!("Sigmoid".parse::<Activation>().unwrap(), Activation::Sigmoid);
        assert!("relu".parse::<Activation>().is_err());
        assert!(!Activation::Softmax.is_elementwise());
    }
}
