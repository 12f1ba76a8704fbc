//! Trainable components.
//!
//! An [`OnlineComponent`] ties a [`TaskPolicy`], a [`FeatureTemplate`] and an
//! [`OnlineOptimizer`] together and runs the decision loop of one task over
//! a sentence.

use std::fmt;

use log::{debug, info};

use crate::dictionary::{FeatureMap, LabelMap};
use crate::errors::Result;
use crate::feature::FeatureTemplate;
use crate::graph::Sentence;
use crate::instance::Instance;
use crate::lexicon::Lexicon;
use crate::state::{State, TaskPolicy};
use crate::train::{HyperParameter, OnlineOptimizer, RollIn};

/// What [`OnlineComponent::process`] does with a sentence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Mode {
    /// Save the gold annotation, learn from every decision and explore with
    /// the roll-in schedule.
    #[default]
    Train,
    /// Predict without gold annotation.
    Decode,
    /// Predict, then compare with the saved gold annotation.
    Evaluate,
}

/// One trainable task.
pub struct OnlineComponent<P: TaskPolicy> {
    policy: P,
    template: FeatureTemplate,
    features: FeatureMap,
    optimizer: Box<dyn OnlineOptimizer>,
    roll_in: RollIn,
    lexicon: Option<Lexicon>,
    batch_size: usize,
    /// Sentences trained since the last mini-batch update.
    pending: usize,
    epoch: usize,
    mode: Mode,
    eval: P::Eval,
}

impl<P: TaskPolicy> OnlineComponent<P> {
    /// Creates an untrained component in [`Mode::Train`].
    ///
    /// Fails if the hyper-parameters do not describe a valid optimizer.
    pub fn new(policy: P, template: FeatureTemplate, params: &HyperParameter) -> Result<Self> {
        let optimizer = params.build_optimizer()?;
        let roll_in = params.build_roll_in()?;
        info!(
            "component: {} feature slots, {} dense dimensions, {}",
            template.slots(),
            template.dense_size(),
            optimizer.name()
        );
        Ok(Self {
            policy,
            template,
            features: FeatureMap::new(),
            optimizer,
            roll_in,
            lexicon: None,
            batch_size: params.batch_size(),
            pending: 0,
            epoch: 0,
            mode: Mode::Train,
            eval: P::Eval::default(),
        })
    }

    /// Lexical resources applied to every sentence before it is processed.
    pub fn with_lexicon(mut self, lexicon: Lexicon) -> Self {
        self.lexicon = Some(lexicon);
        self
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    pub fn set_mode(&mut self, mode: Mode) {
        self.mode = mode;
    }

    pub fn policy(&self) -> &P {
        &self.policy
    }

    pub fn template(&self) -> &FeatureTemplate {
        &self.template
    }

    pub fn features(&self) -> &FeatureMap {
        &self.features
    }

    pub fn labels(&self) -> &LabelMap {
        self.optimizer.labels()
    }

    pub fn optimizer(&self) -> &dyn OnlineOptimizer {
        self.optimizer.as_ref()
    }

    pub fn roll_in(&self) -> &RollIn {
        &self.roll_in
    }

    /// Number of finished epochs.
    pub fn epoch(&self) -> usize {
        self.epoch
    }

    pub fn eval(&self) -> &P::Eval {
        &self.eval
    }

    pub fn eval_mut(&mut self) -> &mut P::Eval {
        &mut self.eval
    }

    /// Processes `sentence` according to the current [`Mode`].
    pub fn process(&mut self, sentence: &mut Sentence) -> Result<()> {
        match self.mode {
            Mode::Train => self.train(sentence),
            Mode::Decode => {
                self.decode(sentence);
                Ok(())
            }
            Mode::Evaluate => {
                self.evaluate(sentence);
                Ok(())
            }
        }
    }

    /// Trains on one sentence. Sentences without gold annotation are left
    /// untouched.
    ///
    /// Every decision point with a zero-cost label becomes one training
    /// instance. The state then moves on with the best zero-cost label or,
    /// when the roll-in schedule says so, with the model's own prediction.
    /// The gold annotation is put back afterwards, so the same sentence can
    /// be trained on again in the next epoch.
    pub fn train(&mut self, sentence: &mut Sentence) -> Result<()> {
        if let Some(lexicon) = &self.lexicon {
            lexicon.apply(sentence);
        }
        let mut state = State::new(&self.policy, sentence);
        if !state.save_gold() {
            return Ok(());
        }

        let result = train_decisions(
            &mut state,
            &self.template,
            &mut self.features,
            self.optimizer.as_mut(),
            &mut self.roll_in,
        );
        state.restore_gold();
        result?;

        self.pending += 1;
        if self.pending >= self.batch_size.max(1) {
            self.flush();
        }
        Ok(())
    }

    /// Trains on a batch of sentences.
    ///
    /// The decision paths of all sentences are collected first with the
    /// current weights, growing the feature and label maps as needed; the
    /// instances are then handed to [`OnlineOptimizer::train_batch`], which
    /// scores them in parallel for mini-batch optimizers. As with
    /// [`train`](Self::train), every sentence keeps its gold annotation.
    pub fn train_batch(&mut self, sentences: &mut [Sentence]) -> Result<()> {
        let mut instances = Vec::new();
        for sentence in sentences.iter_mut() {
            if let Some(lexicon) = &self.lexicon {
                lexicon.apply(sentence);
            }
            let mut state = State::new(&self.policy, sentence);
            if !state.save_gold() {
                continue;
            }
            let result = collect_decisions(
                &mut state,
                &self.template,
                &mut self.features,
                self.optimizer.as_ref(),
                &mut self.roll_in,
                &mut instances,
            );
            state.restore_gold();
            result?;
        }

        debug!(
            "batch of {} sentences: {} instances",
            sentences.len(),
            instances.len()
        );
        self.optimizer.train_batch(&mut instances)?;
        self.pending = 0;
        Ok(())
    }

    /// Predicts the annotation of `sentence`. Neither the weights nor the
    /// feature map are changed.
    pub fn decode(&self, sentence: &mut Sentence) {
        if let Some(lexicon) = &self.lexicon {
            lexicon.apply(sentence);
        }
        let mut state = State::new(&self.policy, sentence);
        run_decoder(&mut state, &self.template, &self.features, self.optimizer.as_ref());
    }

    /// Predicts the annotation of `sentence` and adds the comparison with its
    /// gold annotation to the evaluator. Sentences without gold annotation
    /// are skipped.
    pub fn evaluate(&mut self, sentence: &mut Sentence) {
        if let Some(lexicon) = &self.lexicon {
            lexicon.apply(sentence);
        }
        let mut state = State::new(&self.policy, sentence);
        if !state.save_gold() {
            return;
        }
        run_decoder(&mut state, &self.template, &self.features, self.optimizer.as_ref());
        state.evaluate(&mut self.eval);
    }

    /// Applies the pending mini-batch update, if any.
    pub fn flush(&mut self) {
        if self.pending > 0 && self.optimizer.is_mini_batch() {
            self.optimizer.update_mini_batch();
        }
        self.pending = 0;
    }

    /// Finishes a training epoch: applies pending updates and advances the
    /// roll-in schedule.
    pub fn end_epoch(&mut self) {
        self.flush();
        self.roll_in.update();
        self.epoch += 1;
        debug!(
            "epoch {}: {} features, {} labels",
            self.epoch,
            self.features.size(),
            self.optimizer.labels().len()
        );
    }

    /// Stops the feature and label maps from growing. Decoding afterwards
    /// only reads the component, so it can be shared between threads.
    pub fn freeze(&mut self) {
        self.flush();
        self.features.freeze();
        self.optimizer.freeze();
        info!(
            "frozen after {} epochs: {} features, {} labels",
            self.epoch,
            self.features.size(),
            self.optimizer.labels().len()
        );
    }
}

impl<P: TaskPolicy> fmt::Debug for OnlineComponent<P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OnlineComponent")
            .field("mode", &self.mode)
            .field("optimizer", &self.optimizer.name())
            .field("features", &self.features.size())
            .field("labels", &self.optimizer.labels().len())
            .field("epoch", &self.epoch)
            .field("eval", &self.eval)
            .finish()
    }
}

/// Walks one sentence, training on every decision point with a zero-cost
/// label.
fn train_decisions<P: TaskPolicy>(
    state: &mut State<'_, P>,
    template: &FeatureTemplate,
    features: &mut FeatureMap,
    optimizer: &mut dyn OnlineOptimizer,
    roll_in: &mut RollIn,
) -> Result<()> {
    while !state.is_terminate() {
        let zero_cost = state.zero_cost();
        let x = template.create_feature_vector(state, features, true)?;

        let label = if zero_cost.is_empty() {
            let mut x = x;
            let scores = optimizer.scores(&mut x);
            best_label(state, optimizer.labels(), &scores)
        } else {
            let mut instance = Instance::new(zero_cost, x);
            optimizer.train(&mut instance)?;
            let gold = instance.target().and_then(|y| optimizer.labels().label(y));
            match gold {
                Some(gold) if roll_in.choose_gold() => gold.to_string(),
                _ => best_label(state, optimizer.labels(), instance.scores()),
            }
        };
        state.next(&label);
    }
    Ok(())
}

/// Walks one sentence with the current weights and keeps the instances of
/// a batch update.
fn collect_decisions<P: TaskPolicy>(
    state: &mut State<'_, P>,
    template: &FeatureTemplate,
    features: &mut FeatureMap,
    optimizer: &dyn OnlineOptimizer,
    roll_in: &mut RollIn,
    instances: &mut Vec<Instance>,
) -> Result<()> {
    while !state.is_terminate() {
        let zero_cost = state.zero_cost();
        let x = template.create_feature_vector(state, features, true)?;
        let scores = optimizer.scores(&mut x.clone());
        let labels = optimizer.labels();
        let label = if !zero_cost.is_empty() && roll_in.choose_gold() {
            best_gold(&zero_cost, labels, &scores)
        } else {
            best_label(state, labels, &scores)
        };
        if !zero_cost.is_empty() {
            instances.push(Instance::new(zero_cost, x));
        }
        state.next(&label);
    }
    Ok(())
}

fn run_decoder<P: TaskPolicy>(
    state: &mut State<'_, P>,
    template: &FeatureTemplate,
    features: &FeatureMap,
    optimizer: &dyn OnlineOptimizer,
) {
    while !state.is_terminate() {
        let mut x = template.lookup_feature_vector(state, features);
        let scores = optimizer.scores(&mut x);
        let label = best_label(state, optimizer.labels(), &scores);
        state.next(&label);
    }
    state.post_process();
}

/// The highest-scoring label the state accepts. Falls back to the best label
/// overall, then to the empty label when nothing has been learned yet.
fn best_label<P: TaskPolicy>(state: &State<'_, P>, labels: &LabelMap, scores: &[f32]) -> String {
    let mut order: Vec<usize> = (0..scores.len().min(labels.len())).collect();
    order.sort_by(|&a, &b| scores[b].total_cmp(&scores[a]));
    let best = order
        .iter()
        .filter_map(|&y| labels.label(y))
        .find(|label| state.is_legal(label))
        .or_else(|| order.first().and_then(|&y| labels.label(y)));
    best.unwrap_or_default().to_string()
}

/// The zero-cost label with the highest score, the first one on ties.
/// Labels the model has not seen score 0.
fn best_gold(zero_cost: &[String], labels: &LabelMap, scores: &[f32]) -> String {
    let score = |label: &str| {
        labels
            .index(label)
            .and_then(|y| scores.get(y).copied())
            .unwrap_or(0.0)
    };
    let mut best = &zero_cost[0];
    for label in &zero_cost[1..] {
        if score(label) > score(best) {
            best = label;
        }
    }
    best.clone()
}
