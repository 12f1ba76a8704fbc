//! Left-to-right sequence tagging.

use std::marker::PhantomData;

use crate::eval::{AccuracyEval, Eval, F1Eval};
use crate::feature::Source;
use crate::graph::Sentence;
use crate::node::Node;
use crate::state::TaskPolicy;
use crate::task::bilou;

/// The node field a tagger assigns, and how the result is scored.
pub trait TagField {
    type Eval: Eval + Default;

    fn slot(node: &mut Node) -> &mut Option<String>;

    fn get(node: &Node) -> Option<&str>;

    /// `system` and `gold` are indexed by node id, root included.
    fn evaluate(system: &[Option<&str>], gold: &[Option<String>], eval: &mut Self::Eval);

    fn post_process(_sentence: &mut Sentence) {}
}

/// Part-of-speech tags, scored by accuracy.
#[derive(Debug, Clone, Copy, Default)]
pub struct PartOfSpeech;

impl TagField for PartOfSpeech {
    type Eval = AccuracyEval;

    fn slot(node: &mut Node) -> &mut Option<String> {
        &mut node.pos
    }

    fn get(node: &Node) -> Option<&str> {
        node.pos.as_deref()
    }

    fn evaluate(system: &[Option<&str>], gold: &[Option<String>], eval: &mut AccuracyEval) {
        let mut correct = 0;
        let mut total = 0;
        for (s, g) in system.iter().zip(gold).skip(1) {
            if let Some(g) = g {
                total += 1;
                if *s == Some(g.as_str()) {
                    correct += 1;
                }
            }
        }
        eval.add(correct, total);
    }
}

/// BILOU named-entity tags, scored by chunk F1.
#[derive(Debug, Clone, Copy, Default)]
pub struct NamedEntity;

impl TagField for NamedEntity {
    type Eval = F1Eval;

    fn slot(node: &mut Node) -> &mut Option<String> {
        &mut node.nament
    }

    fn get(node: &Node) -> Option<&str> {
        node.nament.as_deref()
    }

    fn evaluate(system: &[Option<&str>], gold: &[Option<String>], eval: &mut F1Eval) {
        let system = bilou::collect_chunks(system);
        let gold = bilou::collect_chunks(gold);
        let correct = system.iter().filter(|c| gold.contains(c)).count();
        eval.add(correct, system.len(), gold.len());
    }

    fn post_process(sentence: &mut Sentence) {
        let tags: Vec<Option<&str>> = sentence.nodes().iter().map(Self::get).collect();
        let repaired = bilou::repair(&tags);
        for (node, tag) in sentence.nodes_mut().zip(repaired).skip(1) {
            node.nament = tag;
        }
    }
}

/// Assigns one tag per token, left to right.
///
/// The cursor is the index of the token being tagged. The zero-cost set is
/// the gold tag of that token; tokens without a gold tag have none.
#[derive(Debug, Clone, Copy, Default)]
pub struct Tagging<F> {
    field: PhantomData<F>,
}

impl<F: TagField> Tagging<F> {
    pub fn new() -> Self {
        Self { field: PhantomData }
    }
}

pub type PosTagging = Tagging<PartOfSpeech>;
pub type NerTagging = Tagging<NamedEntity>;

impl<F: TagField> TaskPolicy for Tagging<F> {
    type Cursor = usize;
    type Oracle = Vec<Option<String>>;
    type Eval = F::Eval;

    fn init(&self, _sentence: &Sentence) -> usize {
        1
    }

    fn save_gold(&self, sentence: &mut Sentence) -> Option<Vec<Option<String>>> {
        let gold: Vec<Option<String>> = sentence.nodes_mut().map(|n| F::slot(n).take()).collect();
        gold.iter().skip(1).any(Option::is_some).then_some(gold)
    }

    fn restore_gold(&self, sentence: &mut Sentence, oracle: Self::Oracle) {
        for (node, gold) in sentence.nodes_mut().zip(oracle) {
            *F::slot(node) = gold;
        }
    }

    fn zero_cost(&self, input: &usize, _sentence: &Sentence, oracle: &Self::Oracle) -> Vec<String> {
        oracle.get(*input).cloned().flatten().into_iter().collect()
    }

    fn apply(&self, input: &mut usize, sentence: &mut Sentence, label: &str) {
        if let Some(node) = sentence.node_mut(*input) {
            *F::slot(node) = (!label.is_empty()).then(|| label.to_string());
        }
        *input += 1;
    }

    fn is_terminal(&self, input: &usize, sentence: &Sentence) -> bool {
        *input >= sentence.len()
    }

    fn locate(&self, input: &usize, sentence: &Sentence, source: Source, window: i32) -> Option<usize> {
        if source != Source::Input {
            return None;
        }
        let id = sentence.node_at(*input, window)?.id();
        (id > 0).then_some(id)
    }

    fn post_process(&self, sentence: &mut Sentence) {
        F::post_process(sentence);
    }

    fn evaluate(&self, sentence: &Sentence, oracle: &Self::Oracle, eval: &mut F::Eval) {
        let system: Vec<Option<&str>> = sentence.nodes().iter().map(F::get).collect();
        F::evaluate(&system, oracle, eval);
    }
}
