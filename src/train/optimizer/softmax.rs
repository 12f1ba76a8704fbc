use crate::activation::Activation;
use crate::instance::Instance;
use crate::train::regularizer::RegularizedDualAveraging;

use super::{predict_regression, regression_gradients, Gradient, OnlineOptimizer, OptimizerBase};

/// Multinomial logistic regression trained by stochastic gradient descent.
///
/// Scores are probabilities; a mistake moves every label by
/// `indicator(target) - probability`.
#[derive(Debug, Clone)]
pub struct SoftmaxRegression {
    base: OptimizerBase,
}

impl SoftmaxRegression {
    pub fn new(learning_rate: f32, bias: f32, l1: Option<RegularizedDualAveraging>) -> Self {
        Self {
            base: OptimizerBase::new(Activation::Softmax, learning_rate, bias, l1),
        }
    }
}

impl OnlineOptimizer for SoftmaxRegression {
    fn name(&self) -> &'static str {
        "Softmax Regression"
    }

    fn base(&self) -> &OptimizerBase {
        &self.base
    }

    fn base_mut(&mut self) -> &mut OptimizerBase {
        &mut self.base
    }

    fn predict(&self, instance: &Instance) -> usize {
        predict_regression(instance)
    }

    fn gradients(&self, instance: &Instance) -> Vec<Gradient> {
        regression_gradients(instance, self.base.labels().len())
    }

    fn apply(&mut self, gradients: &[Gradient]) {
        let learning_rate = self.base.learning_rate();
        let steps = self.base.steps();
        for g in gradients {
            self.base.update_weight(g, learning_rate, steps);
        }
    }
}
