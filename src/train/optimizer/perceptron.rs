use crate::activation::Activation;
use crate::instance::Instance;
use crate::train::regularizer::RegularizedDualAveraging;

use super::{argmax, classification_gradients, Gradient, OnlineOptimizer, OptimizerBase};

/// Multi-class perceptron with a constant learning rate.
#[derive(Debug, Clone)]
pub struct Perceptron {
    base: OptimizerBase,
}

impl Perceptron {
    pub fn new(learning_rate: f32, bias: f32, l1: Option<RegularizedDualAveraging>) -> Self {
        Self {
            base: OptimizerBase::new(Activation::Identity, learning_rate, bias, l1),
        }
    }
}

impl OnlineOptimizer for Perceptron {
    fn name(&self) -> &'static str {
        "Perceptron"
    }

    fn base(&self) -> &OptimizerBase {
        &self.base
    }

    fn base_mut(&mut self) -> &mut OptimizerBase {
        &mut self.base
    }

    fn predict(&self, instance: &Instance) -> usize {
        argmax(instance.scores())
    }

    fn gradients(&self, instance: &Instance) -> Vec<Gradient> {
        classification_gradients(instance)
    }

    fn apply(&mut self, gradients: &[Gradient]) {
        let learning_rate = self.base.learning_rate();
        let steps = self.base.steps();
        for g in gradients {
            self.base.update_weight(g, learning_rate, steps);
        }
    }
}
