//! Sentence arena.

use std::fmt;
use std::ops::Index;

use crate::node::{Arc, Node};

/// Direction used by valency lookups.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    Left,
    Right,
    All,
}

/// A sentence: node 0 is a synthetic root, nodes `1..len()` are the tokens.
///
/// All structural relations are indices into the node vector. Lookups for a
/// relation that does not exist return `None`; [`Sentence::set_head`]
/// refuses edges that would leave a cycle behind.
#[derive(Debug, Clone)]
pub struct Sentence {
    nodes: Vec<Node>,
}

impl Sentence {
    /// Builds a sentence from its tokens.
    ///
    /// Heads attached with [`Node::with_head`] are linked once every token
    /// is in place; heads that are out of range or would create a cycle are
    /// dropped.
    pub fn new<I>(tokens: I) -> Self
    where
        I: IntoIterator<Item = Node>,
    {
        let mut nodes = vec![Node::root()];
        nodes.extend(tokens);

        let mut heads = Vec::new();
        for (id, node) in nodes.iter_mut().enumerate() {
            node.id = id;
            node.dependents.clear();
            heads.push(node.head.take());
        }

        let mut sentence = Self { nodes };
        for (id, arc) in heads.into_iter().enumerate() {
            if let Some(arc) = arc {
                if !sentence.set_head(id, arc.node, arc.label) {
                    log::debug!("dropped invalid head {} of node {}", arc.node, id);
                }
            }
        }
        sentence
    }

    /// Builds an unannotated sentence from word forms.
    pub fn from_forms<S: AsRef<str>>(forms: &[S]) -> Self {
        Self::new(forms.iter().map(|f| Node::new(f.as_ref())))
    }

    /// Number of nodes including the root.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Returns `true` if the sentence has no tokens.
    pub fn is_empty(&self) -> bool {
        self.nodes.len() <= 1
    }

    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    /// Tokens without the root.
    pub fn tokens(&self) -> &[Node] {
        &self.nodes[1..]
    }

    pub fn node(&self, id: usize) -> Option<&Node> {
        self.nodes.get(id)
    }

    pub fn node_mut(&mut self, id: usize) -> Option<&mut Node> {
        self.nodes.get_mut(id)
    }

    /// Node at `id + offset`, if it exists.
    pub fn node_at(&self, id: usize, offset: i32) -> Option<&Node> {
        let target = id as i64 + offset as i64;
        if target < 0 {
            return None;
        }
        self.nodes.get(target as usize)
    }

    pub(crate) fn nodes_mut(&mut self) -> impl Iterator<Item = &mut Node> {
        self.nodes.iter_mut()
    }

    pub fn head(&self, id: usize) -> Option<usize> {
        self.nodes.get(id)?.head()
    }

    /// Makes `head` the syntactic head of `dep`.
    ///
    /// Returns `false` and leaves the tree untouched if either index is out
    /// of range, `dep` is the root, or the edge would close a cycle.
    pub fn set_head<S: Into<String>>(&mut self, dep: usize, head: usize, label: S) -> bool {
        if dep == 0 || dep >= self.len() || head >= self.len() || dep == head {
            return false;
        }
        if self.is_descendant_of(head, dep) {
            return false;
        }
        self.remove_head(dep);
        self.nodes[dep].head = Some(Arc::new(head, label));
        let dependents = &mut self.nodes[head].dependents;
        if let Err(pos) = dependents.binary_search(&dep) {
            dependents.insert(pos, dep);
        }
        true
    }

    /// Detaches `dep` from its head and returns the removed arc.
    pub fn remove_head(&mut self, dep: usize) -> Option<Arc> {
        let arc = self.nodes.get_mut(dep)?.head.take()?;
        let dependents = &mut self.nodes[arc.node].dependents;
        if let Ok(pos) = dependents.binary_search(&dep) {
            dependents.remove(pos);
        }
        Some(arc)
    }

    /// Removes every syntactic arc and returns the old head arc of each node.
    pub fn clear_dependencies(&mut self) -> Vec<Option<Arc>> {
        let heads = self.nodes.iter_mut().map(|n| n.head.take()).collect();
        for node in &mut self.nodes {
            node.dependents.clear();
        }
        heads
    }

    /// Replaces every syntactic arc with `heads`, as returned by
    /// [`clear_dependencies`](Self::clear_dependencies).
    pub fn restore_dependencies(&mut self, heads: Vec<Option<Arc>>) {
        self.clear_dependencies();
        for (id, arc) in heads.into_iter().enumerate().skip(1) {
            let Some(arc) = arc else { continue };
            if arc.node >= self.len() || id >= self.len() {
                continue;
            }
            self.nodes[arc.node].dependents.push(id);
            self.nodes[id].head = Some(arc);
        }
    }

    /// Returns `true` if `ancestor` lies on the head chain of `id`.
    pub fn is_descendant_of(&self, id: usize, ancestor: usize) -> bool {
        let mut current = self.head(id);
        let mut steps = 0;
        while let Some(h) = current {
            if h == ancestor {
                return true;
            }
            steps += 1;
            if steps > self.len() {
                break;
            }
            current = self.head(h);
        }
        false
    }

    pub fn grand_head(&self, id: usize) -> Option<usize> {
        self.head(self.head(id)?)
    }

    /// Leftmost dependent (`order` = 0), second leftmost (1), ... It must be
    /// on the left of `id`.
    pub fn left_most_dependent(&self, id: usize, order: usize) -> Option<usize> {
        let &dep = self.nodes.get(id)?.dependents.get(order)?;
        (dep < id).then_some(dep)
    }

    /// Rightmost dependent (`order` = 0), second rightmost (1), ... It must
    /// be on the right of `id`.
    pub fn right_most_dependent(&self, id: usize, order: usize) -> Option<usize> {
        let dependents = &self.nodes.get(id)?.dependents;
        let index = dependents.len().checked_sub(order + 1)?;
        let dep = dependents[index];
        (dep > id).then_some(dep)
    }

    /// Closest dependent on the left of `id`, skipping `order` of them.
    pub fn left_nearest_dependent(&self, id: usize, order: usize) -> Option<usize> {
        let dependents = &self.nodes.get(id)?.dependents;
        let index = insert_index(dependents, id).checked_sub(order + 1)?;
        dependents.get(index).copied()
    }

    /// Closest dependent on the right of `id`, skipping `order` of them.
    pub fn right_nearest_dependent(&self, id: usize, order: usize) -> Option<usize> {
        let dependents = &self.nodes.get(id)?.dependents;
        dependents.get(insert_index(dependents, id) + order).copied()
    }

    /// Closest sibling on the left of `id`, skipping `order` of them.
    pub fn left_nearest_sibling(&self, id: usize, order: usize) -> Option<usize> {
        let siblings = &self.nodes[self.head(id)?].dependents;
        let index = insert_index(siblings, id).checked_sub(order + 1)?;
        siblings.get(index).copied()
    }

    /// Closest sibling on the right of `id`, skipping `order` of them.
    pub fn right_nearest_sibling(&self, id: usize, order: usize) -> Option<usize> {
        let siblings = &self.nodes[self.head(id)?].dependents;
        let index = match siblings.binary_search(&id) {
            Ok(pos) => pos + 1,
            Err(pos) => pos,
        };
        siblings.get(index + order).copied()
    }

    /// `<` or `<<` for one or more left dependents, `>` or `>>` on the right.
    /// `None` when the node does not exist.
    pub fn valency(&self, id: usize, direction: Direction) -> Option<String> {
        self.nodes.get(id)?;
        let left = || {
            let mut s = String::new();
            if self.left_most_dependent(id, 0).is_some() {
                s.push('<');
                if self.left_most_dependent(id, 1).is_some() {
                    s.push('<');
                }
            }
            s
        };
        let right = || {
            let mut s = String::new();
            if self.right_most_dependent(id, 0).is_some() {
                s.push('>');
                if self.right_most_dependent(id, 1).is_some() {
                    s.push('>');
                }
            }
            s
        };
        Some(match direction {
            Direction::Left => left(),
            Direction::Right => right(),
            Direction::All => format!("{}-{}", left(), right()),
        })
    }

    /// Attaches a semantic arc from `predicate` to `argument`. Returns
    /// `false` if either index is out of range or the arc already exists.
    pub fn add_semantic_head<S: Into<String>>(
        &mut self,
        argument: usize,
        predicate: usize,
        label: S,
    ) -> bool {
        if argument >= self.len() || predicate >= self.len() || argument == 0 {
            return false;
        }
        let node = &mut self.nodes[argument];
        if node.semantic_heads.iter().any(|arc| arc.node == predicate) {
            return false;
        }
        node.semantic_heads.push(Arc::new(predicate, label));
        true
    }

    /// Removes every semantic arc and returns the old arcs of each node.
    pub fn clear_semantic_heads(&mut self) -> Vec<Vec<Arc>> {
        self.nodes
            .iter_mut()
            .map(|n| std::mem::take(&mut n.semantic_heads))
            .collect()
    }

    /// Argument candidates of `predicate`, each paired with the lowest
    /// common ancestor of the argument and the predicate.
    ///
    /// Candidates are the descendants of the predicate down to `max_depth`
    /// levels, then, for each of up to `max_height` ancestors below the root,
    /// the ancestor itself and its other dependents.
    pub fn argument_candidates(
        &self,
        predicate: usize,
        max_depth: usize,
        max_height: usize,
    ) -> Vec<(usize, usize)> {
        let mut list: Vec<(usize, usize)> = Vec::new();
        let Some(pred) = self.nodes.get(predicate) else {
            return list;
        };

        list.extend(pred.dependents.iter().map(|&d| (d, predicate)));
        let mut end = 0;
        for _ in 1..max_depth {
            if end == list.len() {
                break;
            }
            let begin = end;
            end = list.len();
            for j in begin..end {
                let node = list[j].0;
                list.extend(self.nodes[node].dependents.iter().map(|&d| (d, predicate)));
            }
        }

        let mut lca = predicate;
        for _ in 0..max_height {
            let prev = lca;
            match self.head(lca) {
                Some(h) if self.nodes[h].has_head() => lca = h,
                _ => break,
            }
            list.push((lca, lca));
            list.extend(
                self.nodes[lca]
                    .dependents
                    .iter()
                    .filter(|&&d| d != prev)
                    .map(|&d| (d, lca)),
            );
        }
        list
    }

    /// Returns `true` if every token has a head and reaches the root.
    pub fn is_tree(&self) -> bool {
        (1..self.len()).all(|id| self.head(id).is_some() && self.is_descendant_of(id, 0))
    }
}

fn insert_index(sorted: &[usize], id: usize) -> usize {
    match sorted.binary_search(&id) {
        Ok(pos) | Err(pos) => pos,
    }
}

impl Index<usize> for Sentence {
    type Output = Node;

    fn index(&self, id: usize) -> &Node {
        &self.nodes[id]
    }
}

impl fmt::Display for Sentence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for node in self.tokens() {
            let blank = |s: Option<&str>| s.unwrap_or("_").to_string();
            let head = node.head().map_or("_".to_string(), |h| h.to_string());
            writeln!(
                f,
                "{}\t{}\t{}\t{}\t{}\t{}\t{}",
                node.id(),
                node.form(),
                blank(node.lemma.as_deref()),
                blank(node.pos.as_deref()),
                blank(node.nament.as_deref()),
                head,
                blank(node.deprel()),
            )?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// He(1) <- sent(2) -> her(3), sent(2) -> flowers(5) -> red(4); root -> sent
    fn sample() -> Sentence {
        Sentence::new(vec![
            Node::new("He").with_head(2, "nsubj"),
            Node::new("sent").with_head(0, "root"),
            Node::new("her").with_head(2, "dative"),
            Node::new("red").with_head(5, "amod"),
            Node::new("flowers").with_head(2, "dobj"),
        ])
    }

    #[test]
    fn test_construction() {
        let s = sample();
        assert_eq!(s.len(), 6);
        assert!(s[0].is_root());
        assert_eq!(s[2].dependents(), &[1, 3, 5]);
        assert_eq!(s.head(4), Some(5));
        assert_eq!(s.head(0), None);
        assert!(s.is_tree());
    }

    #[test]
    fn test_set_head_refuses_cycle() {
        let mut s = sample();
        assert!(!s.set_head(2, 5, "x"));
        assert!(!s.set_head(0, 2, "x"));
        assert!(!s.set_head(3, 17, "x"));
        assert_eq!(s.head(2), Some(0));

        assert!(s.set_head(4, 2, "amod"));
        assert_eq!(s[5].dependents(), &[] as &[usize]);
        assert_eq!(s[2].dependents(), &[1, 3, 4, 5]);
    }

    #[test]
    fn test_relations() {
        let s = sample();
        assert_eq!(s.grand_head(4), Some(2));
        assert_eq!(s.grand_head(2), None);
        assert_eq!(s.left_most_dependent(2, 0), Some(1));
        assert_eq!(s.left_most_dependent(2, 1), None);
        assert_eq!(s.right_most_dependent(2, 0), Some(5));
        assert_eq!(s.right_most_dependent(2, 1), Some(3));
        assert_eq!(s.left_nearest_dependent(2, 0), Some(1));
        assert_eq!(s.right_nearest_dependent(2, 0), Some(3));
        assert_eq!(s.right_nearest_dependent(2, 1), Some(5));
        assert_eq!(s.left_nearest_sibling(3, 0), Some(1));
        assert_eq!(s.right_nearest_sibling(3, 0), Some(5));
        assert_eq!(s.right_nearest_sibling(5, 0), None);
        assert_eq!(s.left_nearest_sibling(0, 0), None);
        assert_eq!(s.left_most_dependent(42, 0), None);
    }

    #[test]
    fn test_valency() {
        let s = sample();
        assert_eq!(s.valency(2, Direction::Left).as_deref(), Some("<"));
        assert_eq!(s.valency(2, Direction::Right).as_deref(), Some(">>"));
        assert_eq!(s.valency(2, Direction::All).as_deref(), Some("<->>"));
        assert_eq!(s.valency(1, Direction::All).as_deref(), Some("-"));
    }

    #[test]
    fn test_argument_candidates() {
        let s = sample();
        let candidates: Vec<usize> = s.argument_candidates(5, 2, 2).iter().map(|p| p.0).collect();
        // red below the predicate, then sent and its other dependents
        assert_eq!(candidates, vec![4, 2, 1, 3]);

        let from_verb: Vec<usize> = s.argument_candidates(2, 2, 2).iter().map(|p| p.0).collect();
        assert_eq!(from_verb, vec![1, 3, 5, 4]);
    }
}
