//! Roll-in schedule (locally optimal learning to search).
//!
//! During training the state is advanced with the gold label with
//! probability `gold_probability` and with the model's prediction otherwise.
//! The probability stays at 1 for the first `fixed_stage` epochs and is then
//! multiplied by `decaying_rate` at the end of every epoch.

use log::debug;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::errors::{Error, Result};

#[derive(Debug, Clone)]
pub struct RollIn {
    fixed_stage: usize,
    decaying_rate: f64,
    gold_probability: f64,
    rng: StdRng,
}

impl RollIn {
    pub fn new(fixed_stage: usize, decaying_rate: f64, seed: u64) -> Result<Self> {
        if !(0.0..=1.0).contains(&decaying_rate) {
            return Err(Error::invalid_argument(
                "rollin_decaying_rate",
                "rollin_decaying_rate must be in [0, 1]",
            ));
        }
        Ok(Self {
            fixed_stage,
            decaying_rate,
            gold_probability: 1.0,
            rng: StdRng::seed_from_u64(seed),
        })
    }

    pub fn gold_probability(&self) -> f64 {
        self.gold_probability
    }

    /// Remaining epochs before the probability starts to decay.
    pub fn fixed_stage(&self) -> usize {
        self.fixed_stage
    }

    pub fn decaying_rate(&self) -> f64 {
        self.decaying_rate
    }

    /// Called at the end of every training epoch.
    pub fn update(&mut self) {
        if self.fixed_stage > 0 {
            self.fixed_stage -= 1;
        } else {
            self.gold_probability *= self.decaying_rate;
        }
        debug!("roll-in gold probability: {:.4}", self.gold_probability);
    }

    /// Returns `true` if the next transition should follow the gold label.
    pub fn choose_gold(&mut self) -> bool {
        self.gold_probability > 0.0
            && (self.gold_probability >= 1.0 || self.rng.random::<f64>() < self.gold_probability)
    }
}
