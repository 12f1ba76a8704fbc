//! Incremental processing state.
//!
//! A [`State`] walks over one sentence and applies one label per decision
//! point until the task says it is done. What a label means, which labels
//! are correct, and where the cursor points are supplied by a
//! [`TaskPolicy`], so a single state type serves every task.

use std::fmt;

use crate::eval::Eval;
use crate::feature::Source;
use crate::graph::Sentence;

/// The task-specific part of a transition system.
pub trait TaskPolicy {
    /// Position of the decision process (an input index, a stack, ...).
    type Cursor: Clone + fmt::Debug;
    /// Gold annotation saved before decoding starts.
    type Oracle: fmt::Debug;
    /// Evaluator filled by [`TaskPolicy::evaluate`].
    type Eval: Eval + Default;

    /// Cursor at the first decision point.
    fn init(&self, sentence: &Sentence) -> Self::Cursor;

    /// Moves the gold annotation out of `sentence`. Returns `None` if the
    /// sentence carries no gold annotation for this task.
    fn save_gold(&self, sentence: &mut Sentence) -> Option<Self::Oracle>;

    /// Labels at the current decision point that keep the gold structure
    /// reachable.
    /// Puts the annotation taken by [`save_gold`](Self::save_gold) back
    /// into `sentence`, replacing whatever the transitions produced.
    fn restore_gold(&self, sentence: &mut Sentence, oracle: Self::Oracle);

    fn zero_cost(
        &self,
        cursor: &Self::Cursor,
        sentence: &Sentence,
        oracle: &Self::Oracle,
    ) -> Vec<String>;

    /// Applies `label` and advances the cursor. Labels the task cannot
    /// interpret are clamped to a harmless default.
    fn apply(&self, cursor: &mut Self::Cursor, sentence: &mut Sentence, label: &str);

    fn is_terminal(&self, cursor: &Self::Cursor, sentence: &Sentence) -> bool;

    /// Node `window` positions away from the node that `source` designates.
    fn locate(
        &self,
        cursor: &Self::Cursor,
        sentence: &Sentence,
        source: Source,
        window: i32,
    ) -> Option<usize>;

    /// Returns `false` for labels that cannot be applied in the current
    /// configuration.
    fn is_legal(&self, _cursor: &Self::Cursor, _sentence: &Sentence, _label: &str) -> bool {
        true
    }

    /// Repairs the finished annotation.
    fn post_process(&self, _sentence: &mut Sentence) {}

    /// Compares the annotation in `sentence` with the saved gold one.
    fn evaluate(&self, sentence: &Sentence, oracle: &Self::Oracle, eval: &mut Self::Eval);
}

/// Processing state of one sentence.
pub struct State<'a, P: TaskPolicy> {
    policy: &'a P,
    sentence: &'a mut Sentence,
    cursor: P::Cursor,
    oracle: Option<P::Oracle>,
}

impl<'a, P: TaskPolicy> State<'a, P> {
    pub fn new(policy: &'a P, sentence: &'a mut Sentence) -> Self {
        let cursor = policy.init(sentence);
        Self {
            policy,
            sentence,
            cursor,
            oracle: None,
        }
    }

    /// Saves the gold annotation and removes it from the sentence. Must be
    /// called before the first transition. Returns `false` if the sentence
    /// has no gold annotation.
    pub fn save_gold(&mut self) -> bool {
        self.oracle = self.policy.save_gold(self.sentence);
        self.cursor = self.policy.init(self.sentence);
        self.oracle.is_some()
    }

    /// Puts the saved gold annotation back into the sentence. The state has
    /// no gold annotation afterwards.
    pub fn restore_gold(&mut self) {
        if let Some(oracle) = self.oracle.take() {
            self.policy.restore_gold(self.sentence, oracle);
        }
    }

    pub fn has_gold(&self) -> bool {
        self.oracle.is_some()
    }

    pub fn oracle(&self) -> Option<&P::Oracle> {
        self.oracle.as_ref()
    }

    /// Zero-cost labels of the current decision point, empty without gold.
    pub fn zero_cost(&self) -> Vec<String> {
        match &self.oracle {
            Some(oracle) => self.policy.zero_cost(&self.cursor, self.sentence, oracle),
            None => Vec::new(),
        }
    }

    /// Applies `label` and moves to the next decision point.
    pub fn next(&mut self, label: &str) {
        if !self.is_terminate() {
            self.policy.apply(&mut self.cursor, self.sentence, label);
        }
    }

    pub fn is_terminate(&self) -> bool {
        self.policy.is_terminal(&self.cursor, self.sentence)
    }

    pub fn is_legal(&self, label: &str) -> bool {
        self.policy.is_legal(&self.cursor, self.sentence, label)
    }

    /// Node `window` positions away from `source`.
    pub fn node(&self, source: Source, window: i32) -> Option<usize> {
        self.policy.locate(&self.cursor, self.sentence, source, window)
    }

    pub fn sentence(&self) -> &Sentence {
        self.sentence
    }

    pub fn cursor(&self) -> &P::Cursor {
        &self.cursor
    }

    pub fn policy(&self) -> &P {
        self.policy
    }

    pub fn post_process(&mut self) {
        self.policy.post_process(self.sentence);
    }

    /// Adds this sentence's counts to `eval`. Does nothing without gold.
    pub fn evaluate(&self, eval: &mut P::Eval) {
        if let Some(oracle) = &self.oracle {
            self.policy.evaluate(self.sentence, oracle, eval);
        }
    }
}

impl<P: TaskPolicy> fmt::Debug for State<'_, P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("State")
            .field("cursor", &self.cursor)
            .field("oracle", &self.oracle)
            .finish()
    }
}
