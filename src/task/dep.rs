//! List-based transition dependency parsing.
//!
//! The configuration has a stack, a list of nodes that were passed over,
//! and the input. Each label combines an arc decision between the stack top
//! `s` and the input `i` with a list operation:
//!
//! * arcs: `L` (`s` ← `i`), `R` (`s` → `i`), `N` (no arc);
//! * list operations: `S` shift (the passed nodes go back onto the stack,
//!   then `i` is pushed), `R` reduce (pop `s`), `P` pass (move `s` to the
//!   list).
//!
//! Labels are written `arc_list_deprel`, e.g. `L_R_nsubj` or `N_S_`.
//! Passing lets `i` reach nodes below `s`, which makes non-projective trees
//! reachable.

use std::fmt;

use crate::eval::AttachmentEval;
use crate::feature::Source;
use crate::graph::Sentence;
use crate::node::Arc;
use crate::state::TaskPolicy;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArcOp {
    Left,
    Right,
    No,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListOp {
    Shift,
    Reduce,
    Pass,
}

/// A parsed transition label.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DepLabel {
    pub arc: ArcOp,
    pub list: ListOp,
    pub deprel: String,
}

impl DepLabel {
    pub fn new<S: Into<String>>(arc: ArcOp, list: ListOp, deprel: S) -> Self {
        Self {
            arc,
            list,
            deprel: deprel.into(),
        }
    }

    /// Parses `arc_list_deprel`. Returns `None` for anything else.
    pub fn parse(label: &str) -> Option<Self> {
        let mut parts = label.splitn(3, '_');
        let arc = match parts.next()? {
            "L" => ArcOp::Left,
            "R" => ArcOp::Right,
            "N" => ArcOp::No,
            _ => return None,
        };
        let list = match parts.next()? {
            "S" => ListOp::Shift,
            "R" => ListOp::Reduce,
            "P" => ListOp::Pass,
            _ => return None,
        };
        let deprel = parts.next().unwrap_or("");
        Some(Self::new(arc, list, deprel))
    }
}

impl fmt::Display for DepLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let arc = match self.arc {
            ArcOp::Left => "L",
            ArcOp::Right => "R",
            ArcOp::No => "N",
        };
        let list = match self.list {
            ListOp::Shift => "S",
            ListOp::Reduce => "R",
            ListOp::Pass => "P",
        };
        write!(f, "{}_{}_{}", arc, list, self.deprel)
    }
}

/// Stack, passed list and input of the parser.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DepCursor {
    pub stack: Vec<usize>,
    pub list: Vec<usize>,
    pub input: usize,
}

impl DepCursor {
    fn top(&self) -> usize {
        self.stack.last().copied().unwrap_or(0)
    }
}

/// Dependency parsing policy.
///
/// Zero-cost set: the single transition chosen by a static oracle. An arc
/// is preferred over no arc; after a left arc the stack top is reduced when
/// it has no dependents left in the input, after a right arc the input is
/// shifted unless a node below the stack top still needs an arc with it.
/// Without an arc, shift is preferred, then reduce, then pass.
#[derive(Debug, Clone)]
pub struct DepParsing {
    root_label: String,
}

impl Default for DepParsing {
    fn default() -> Self {
        Self::new("root")
    }
}

impl DepParsing {
    /// `root_label` is given to tokens that end up without a head.
    pub fn new<S: Into<String>>(root_label: S) -> Self {
        Self {
            root_label: root_label.into(),
        }
    }

    fn gold_head(oracle: &[Option<Arc>], id: usize) -> Option<usize> {
        oracle.get(id)?.as_ref().map(|arc| arc.node)
    }

    fn is_oracle_shift(cursor: &DepCursor, oracle: &[Option<Arc>]) -> bool {
        let input = cursor.input;
        if Self::gold_head(oracle, input).is_some_and(|h| h < cursor.top()) {
            return false;
        }
        let below = &cursor.stack[..cursor.stack.len().saturating_sub(1)];
        !below
            .iter()
            .any(|&s| Self::gold_head(oracle, s) == Some(input))
    }

    fn is_oracle_reduce(
        cursor: &DepCursor,
        sentence: &Sentence,
        oracle: &[Option<Arc>],
        gets_head: bool,
    ) -> bool {
        let s = cursor.top();
        if s == 0 || (!gets_head && !sentence[s].has_head()) {
            return false;
        }
        !(cursor.input + 1..sentence.len()).any(|j| Self::gold_head(oracle, j) == Some(s))
    }

    fn oracle_label(cursor: &DepCursor, sentence: &Sentence, oracle: &[Option<Arc>]) -> DepLabel {
        let s = cursor.top();
        let i = cursor.input;
        let deprel = |id: usize| {
            oracle
                .get(id)
                .and_then(Option::as_ref)
                .map_or(String::new(), |arc| arc.label.clone())
        };

        if Self::gold_head(oracle, s) == Some(i) && !sentence.is_descendant_of(i, s) {
            let list = if Self::is_oracle_reduce(cursor, sentence, oracle, true) {
                ListOp::Reduce
            } else {
                ListOp::Pass
            };
            return DepLabel::new(ArcOp::Left, list, deprel(s));
        }

        if Self::gold_head(oracle, i) == Some(s) && !sentence.is_descendant_of(s, i) {
            let list = if Self::is_oracle_shift(cursor, oracle) {
                ListOp::Shift
            } else {
                ListOp::Pass
            };
            return DepLabel::new(ArcOp::Right, list, deprel(i));
        }

        let list = if Self::is_oracle_shift(cursor, oracle) {
            ListOp::Shift
        } else if Self::is_oracle_reduce(cursor, sentence, oracle, false) {
            ListOp::Reduce
        } else {
            ListOp::Pass
        };
        DepLabel::new(ArcOp::No, list, "")
    }

    fn shift(cursor: &mut DepCursor) {
        while let Some(n) = cursor.list.pop() {
            cursor.stack.push(n);
        }
        cursor.stack.push(cursor.input);
        cursor.input += 1;
    }
}

impl TaskPolicy for DepParsing {
    type Cursor = DepCursor;
    type Oracle = Vec<Option<Arc>>;
    type Eval = AttachmentEval;

    fn init(&self, _sentence: &Sentence) -> DepCursor {
        DepCursor {
            stack: vec![0],
            list: Vec::new(),
            input: 1,
        }
    }

    fn save_gold(&self, sentence: &mut Sentence) -> Option<Vec<Option<Arc>>> {
        let heads = sentence.clear_dependencies();
        if heads.iter().skip(1).all(Option::is_none) {
            return None;
        }
        Some(heads)
    }

    fn restore_gold(&self, sentence: &mut Sentence, oracle: Self::Oracle) {
        sentence.restore_dependencies(oracle);
    }

    fn zero_cost(&self, cursor: &DepCursor, sentence: &Sentence, oracle: &Self::Oracle) -> Vec<String> {
        vec![Self::oracle_label(cursor, sentence, oracle).to_string()]
    }

    fn apply(&self, cursor: &mut DepCursor, sentence: &mut Sentence, label: &str) {
        let label = DepLabel::parse(label).unwrap_or_else(|| DepLabel::new(ArcOp::No, ListOp::Shift, ""));
        let s = cursor.top();
        let i = cursor.input;

        let attached = match label.arc {
            ArcOp::Left => s != 0 && sentence.set_head(s, i, label.deprel.as_str()),
            ArcOp::Right => sentence.set_head(i, s, label.deprel.as_str()),
            ArcOp::No => true,
        };
        if !attached {
            log::debug!("refused arc {} between {} and {}", label, s, i);
        }

        match label.list {
            ListOp::Reduce if s != 0 => {
                cursor.stack.pop();
            }
            ListOp::Pass if s != 0 => {
                cursor.stack.pop();
                cursor.list.push(s);
            }
            _ => Self::shift(cursor),
        }
    }

    fn is_terminal(&self, cursor: &DepCursor, sentence: &Sentence) -> bool {
        cursor.input >= sentence.len()
    }

    fn locate(&self, cursor: &DepCursor, sentence: &Sentence, source: Source, window: i32) -> Option<usize> {
        let from_top = |v: &[usize], k: usize| v.len().checked_sub(k + 1).map(|i| v[i]);
        match source {
            Source::Stack => sentence.node_at(cursor.top(), window).map(|node| node.id()),
            Source::Input => sentence.node_at(cursor.input, window).map(|node| node.id()),
            Source::PeekStack if window <= 0 => from_top(&cursor.stack, window.unsigned_abs() as usize),
            Source::PeekStack => from_top(&cursor.list, window as usize - 1),
            Source::List if window >= 0 => from_top(&cursor.list, window as usize),
            _ => None,
        }
    }

    /// Masks labels that would break the tree: arcs that reattach a node,
    /// arcs that close a cycle, and reductions of a node without a head.
    fn is_legal(&self, cursor: &DepCursor, sentence: &Sentence, label: &str) -> bool {
        let Some(label) = DepLabel::parse(label) else {
            return false;
        };
        let s = cursor.top();
        let i = cursor.input;
        if i >= sentence.len() {
            return false;
        }

        if s == 0 {
            return label.list == ListOp::Shift && label.arc != ArcOp::Left;
        }
        if sentence.is_descendant_of(s, i) {
            return label.arc == ArcOp::No;
        }
        if sentence.is_descendant_of(i, s) {
            return label.arc == ArcOp::No
                && (sentence[s].has_head() || label.list == ListOp::Reduce);
        }
        if label.arc == ArcOp::Right && sentence[i].has_head() {
            return false;
        }
        if label.arc == ArcOp::Left && sentence[s].has_head() {
            return false;
        }
        if !sentence[s].has_head() {
            return !(label.list == ListOp::Reduce && label.arc != ArcOp::Left);
        }
        true
    }

    /// Attaches every token left without a head to the root.
    fn post_process(&self, sentence: &mut Sentence) {
        for id in 1..sentence.len() {
            if !sentence[id].has_head() {
                sentence.set_head(id, 0, self.root_label.as_str());
            }
        }
    }

    fn evaluate(&self, sentence: &Sentence, oracle: &Self::Oracle, eval: &mut AttachmentEval) {
        let (mut las, mut uas, mut total) = (0, 0, 0);
        for (node, gold) in sentence.nodes().iter().zip(oracle).skip(1) {
            let Some(gold) = gold else { continue };
            total += 1;
            if node.head() == Some(gold.node) {
                uas += 1;
                if node.deprel() == Some(gold.label.as_str()) {
                    las += 1;
                }
            }
        }
        eval.add(las, uas, total);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::node::Node;
    use crate::state::State;

    fn projective() -> Sentence {
        Sentence::new(vec![
            Node::new("He").with_head(2, "nsubj"),
            Node::new("sent").with_head(0, "root"),
            Node::new("her").with_head(2, "dative"),
            Node::new("red").with_head(5, "amod"),
            Node::new("flowers").with_head(2, "dobj"),
        ])
    }

    /// A hearing is scheduled on the issue today: "on" attaches to "hearing"
    /// across the verb, which needs a pass.
    fn non_projective() -> Sentence {
        Sentence::new(vec![
            Node::new("A").with_head(2, "det"),
            Node::new("hearing").with_head(4, "nsubj"),
            Node::new("is").with_head(4, "aux"),
            Node::new("scheduled").with_head(0, "root"),
            Node::new("on").with_head(2, "prep"),
            Node::new("the").with_head(7, "det"),
            Node::new("issue").with_head(5, "pobj"),
            Node::new("today").with_head(4, "tmod"),
        ])
    }

    fn follow_oracle(mut sentence: Sentence) -> (Vec<String>, Sentence, AttachmentEval) {
        let policy = DepParsing::default();
        let mut labels = Vec::new();
        let mut eval = AttachmentEval::default();
        {
            let mut state = State::new(&policy, &mut sentence);
            assert!(state.save_gold());
            while !state.is_terminate() {
                let gold = state.zero_cost();
                assert_eq!(gold.len(), 1);
                assert!(state.is_legal(&gold[0]), "oracle label {} is masked", gold[0]);
                labels.push(gold[0].clone());
                state.next(&gold[0]);
            }
            state.evaluate(&mut eval);
        }
        (labels, sentence, eval)
    }

    #[test]
    fn test_oracle_projective() {
        let (labels, sentence, eval) = follow_oracle(projective());
        assert_eq!(
            labels,
            vec!["N_S_", "L_R_nsubj", "R_S_root", "R_S_dative", "N_S_", "L_R_amod", "N_R_", "R_S_dobj"]
        );
        assert!(sentence.is_tree());
        assert_eq!(eval.las(), 100.0);
    }

    #[test]
    fn test_oracle_non_projective() {
        let (labels, sentence, eval) = follow_oracle(non_projective());
        assert!(labels.iter().any(|l| l.contains("_P_")));
        assert!(sentence.is_tree());
        assert_eq!(eval.las(), 100.0);
        assert_eq!(eval.uas(), 100.0);
    }

    #[test]
    fn test_malformed_label_shifts() {
        let policy = DepParsing::default();
        let mut sentence = projective();
        let mut state = State::new(&policy, &mut sentence);
        state.save_gold();
        state.next("garbage");
        assert_eq!(state.cursor().stack, vec![0, 1]);
        assert_eq!(state.cursor().input, 2);

        // Reducing the root is turned into a shift
        let mut state = State::new(&policy, &mut sentence);
        state.next("N_R_");
        assert_eq!(state.cursor().stack, vec![0, 1]);
    }

    #[test]
    fn test_headless_tokens_attach_to_root() {
        let policy = DepParsing::default();
        let mut sentence = Sentence::from_forms(&["a", "b", "c"]);
        let mut state = State::new(&policy, &mut sentence);
        while !state.is_terminate() {
            state.next("N_S_");
        }
        state.post_process();
        assert!(state.sentence().is_tree());
        assert_eq!(state.sentence()[2].deprel(), Some("root"));
    }

    #[test]
    fn test_locate_windows() {
        let policy = DepParsing::default();
        let mut sentence = projective();
        let mut state = State::new(&policy, &mut sentence);
        state.next("N_S_");
        state.next("N_S_");
        assert_eq!(state.cursor().stack, vec![0, 1, 2]);
        assert_eq!(state.cursor().input, 3);

        // Sentence positions around the stack top and the input
        assert_eq!(state.node(Source::Stack, 0), Some(2));
        assert_eq!(state.node(Source::Stack, 1), Some(3));
        assert_eq!(state.node(Source::Stack, -2), Some(0));
        assert_eq!(state.node(Source::Stack, -3), None);
        assert_eq!(state.node(Source::Input, -1), Some(2));
        assert_eq!(state.node(Source::Input, -3), Some(0));
        assert_eq!(state.node(Source::Input, 2), Some(5));
        assert_eq!(state.node(Source::Input, 3), None);

        // Stack depth and the passed list
        assert_eq!(state.node(Source::PeekStack, 0), Some(2));
        assert_eq!(state.node(Source::PeekStack, -2), Some(0));
        assert_eq!(state.node(Source::PeekStack, -3), None);
        assert_eq!(state.node(Source::PeekStack, 1), None);
        state.next("N_P_");
        assert_eq!(state.node(Source::PeekStack, 0), Some(1));
        assert_eq!(state.node(Source::PeekStack, 1), Some(2));
        assert_eq!(state.node(Source::List, 0), Some(2));
        assert_eq!(state.node(Source::Stack, 1), Some(2));
    }

    #[test]
    fn test_legal_labels() {
        let policy = DepParsing::default();
        let mut sentence = Sentence::from_forms(&["a", "b"]);
        let mut state = State::new(&policy, &mut sentence);
        assert!(state.is_legal("R_S_root"));
        assert!(!state.is_legal("L_R_x"));
        assert!(!state.is_legal("N_P_"));
        state.next("N_S_");
        assert!(!state.is_legal("N_R_"));
        assert!(state.is_legal("L_R_x"));
        assert!(!state.is_legal("bogus"));
    }
}
