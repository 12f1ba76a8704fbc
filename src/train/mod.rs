//! Online learning
//!
//! This module contains the online optimizers, L1 regularization, the
//! roll-in schedule used while training a transition system, and the
//! hyper-parameters that select and configure them.

mod config;
mod optimizer;
mod regularizer;
mod rollin;

// Re-export public types
pub use self::config::{Algorithm, HyperParameter};
pub use self::optimizer::{
    argmax, argmax2, AdaDeltaMiniBatch, AdaGrad, AdaGradMiniBatch, AdaGradRegression,
    DecayingSquares, DiagonalUpdate, FeedForwardSoftmax, Gradient, MiniBatch, OnlineOptimizer,
    OptimizerBase, Perceptron, SoftmaxRegression, SquaredSum, EPSILON,
};
pub use self::regularizer::RegularizedDualAveraging;
pub use self::rollin::RollIn;
