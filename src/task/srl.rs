//! Semantic role labeling over dependency trees.

use std::collections::{BTreeMap, BTreeSet};

use crate::eval::F1Eval;
use crate::feature::Source;
use crate::graph::Sentence;
use crate::state::TaskPolicy;
use crate::train::HyperParameter;

/// Label of a candidate that is not an argument of the predicate.
pub const NO_ARG: &str = "_";

/// Position in the predicate/candidate grid.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SrlCursor {
    pub predicates: Vec<usize>,
    pub predicate: usize,
    /// `(argument, lowest common ancestor)` pairs of the current predicate.
    pub candidates: Vec<(usize, usize)>,
    pub candidate: usize,
}

impl SrlCursor {
    fn current(&self) -> Option<(usize, usize)> {
        let predicate = *self.predicates.get(self.predicate)?;
        let (argument, _) = *self.candidates.get(self.candidate)?;
        Some((predicate, argument))
    }
}

/// Labels every argument candidate of every predicate, one predicate at a
/// time.
///
/// Predicates are the tokens carrying the feat `predicate_key` (a sense id
/// such as `run.01`). Candidates come from
/// [`Sentence::argument_candidates`]. The zero-cost set is the gold role of
/// the current pair, or [`NO_ARG`] when the candidate is not a gold argument.
#[derive(Debug, Clone)]
pub struct SrlLabeling {
    predicate_key: String,
    max_depth: usize,
    max_height: usize,
}

impl Default for SrlLabeling {
    fn default() -> Self {
        Self::with_params("pb", &HyperParameter::default())
    }
}

impl SrlLabeling {
    pub fn new<S: Into<String>>(predicate_key: S, max_depth: usize, max_height: usize) -> Self {
        Self {
            predicate_key: predicate_key.into(),
            max_depth,
            max_height,
        }
    }

    /// Takes the candidate limits from `max_depth` and `max_height`.
    pub fn with_params<S: Into<String>>(predicate_key: S, params: &HyperParameter) -> Self {
        Self::new(predicate_key, params.max_depth(), params.max_height())
    }

    pub fn max_depth(&self) -> usize {
        self.max_depth
    }

    pub fn max_height(&self) -> usize {
        self.max_height
    }

    /// Moves to the first predicate, starting at the current one, that has
    /// at least one candidate.
    fn load(&self, cursor: &mut SrlCursor, sentence: &Sentence) {
        while let Some(&predicate) = cursor.predicates.get(cursor.predicate) {
            let mut seen = BTreeSet::new();
            cursor.candidates = sentence
                .argument_candidates(predicate, self.max_depth, self.max_height)
                .into_iter()
                .filter(|&(arg, _)| arg != 0 && arg != predicate && seen.insert(arg))
                .collect();
            cursor.candidate = 0;
            if !cursor.candidates.is_empty() {
                return;
            }
            cursor.predicate += 1;
        }
    }
}

impl TaskPolicy for SrlLabeling {
    type Cursor = SrlCursor;
    /// Gold roles keyed by `(argument, predicate)`.
    type Oracle = BTreeMap<(usize, usize), String>;
    type Eval = F1Eval;

    fn init(&self, sentence: &Sentence) -> SrlCursor {
        let predicates = sentence
            .tokens()
            .iter()
            .filter(|n| n.feat(&self.predicate_key).is_some())
            .map(|n| n.id())
            .collect();
        let mut cursor = SrlCursor {
            predicates,
            predicate: 0,
            candidates: Vec::new(),
            candidate: 0,
        };
        self.load(&mut cursor, sentence);
        cursor
    }

    fn save_gold(&self, sentence: &mut Sentence) -> Option<Self::Oracle> {
        let has_predicate = sentence
            .tokens()
            .iter()
            .any(|n| n.feat(&self.predicate_key).is_some());
        if !has_predicate {
            return None;
        }
        let arcs = sentence.clear_semantic_heads();
        let mut oracle = BTreeMap::new();
        for (argument, heads) in arcs.into_iter().enumerate() {
            for arc in heads {
                oracle.insert((argument, arc.node), arc.label);
            }
        }
        Some(oracle)
    }

    fn restore_gold(&self, sentence: &mut Sentence, oracle: Self::Oracle) {
        sentence.clear_semantic_heads();
        for ((argument, predicate), label) in oracle {
            sentence.add_semantic_head(argument, predicate, label);
        }
    }

    fn zero_cost(&self, cursor: &SrlCursor, _sentence: &Sentence, oracle: &Self::Oracle) -> Vec<String> {
        match cursor.current() {
            Some((predicate, argument)) => {
                let label = oracle
                    .get(&(argument, predicate))
                    .map_or(NO_ARG, String::as_str);
                vec![label.to_string()]
            }
            None => Vec::new(),
        }
    }

    fn apply(&self, cursor: &mut SrlCursor, sentence: &mut Sentence, label: &str) {
        let Some((predicate, argument)) = cursor.current() else {
            return;
        };
        if !label.is_empty() && label != NO_ARG {
            sentence.add_semantic_head(argument, predicate, label);
        }
        cursor.candidate += 1;
        if cursor.candidate >= cursor.candidates.len() {
            cursor.predicate += 1;
            self.load(cursor, sentence);
        }
    }

    fn is_terminal(&self, cursor: &SrlCursor, _sentence: &Sentence) -> bool {
        cursor.current().is_none()
    }

    fn locate(&self, cursor: &SrlCursor, sentence: &Sentence, source: Source, window: i32) -> Option<usize> {
        let (predicate, argument) = cursor.current()?;
        let origin = match source {
            Source::Predicate => predicate,
            Source::Argument | Source::Input => argument,
            Source::Stack => cursor.candidates.get(cursor.candidate)?.1,
            Source::PeekStack | Source::List => return None,
        };
        let id = sentence.node_at(origin, window)?.id();
        (id > 0).then_some(id)
    }

    fn evaluate(&self, sentence: &Sentence, oracle: &Self::Oracle, eval: &mut F1Eval) {
        let mut system = 0;
        let mut correct = 0;
        for node in sentence.tokens() {
            for arc in node.semantic_heads() {
                system += 1;
                if oracle.get(&(node.id(), arc.node)) == Some(&arc.label) {
                    correct += 1;
                }
            }
        }
        eval.add(correct, system, oracle.len());
    }
}
