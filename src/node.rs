//! Token nodes.

use std::collections::{BTreeMap, BTreeSet};

use crate::form;

/// Extra key/value features of a token (morphology, predicate sense, ...).
pub type FeatMap = BTreeMap<String, String>;

/// A labelled edge pointing at another node of the same sentence.
#[derive(Debug, Clone, PartialEq)]
pub struct Arc {
    /// Index of the node at the other end of the edge.
    pub node: usize,
    pub label: String,
    /// Optional score attached by the component that produced the arc.
    pub weight: f32,
    pub function_tag: Option<String>,
}

impl Arc {
    pub fn new<S: Into<String>>(node: usize, label: S) -> Self {
        Self {
            node,
            label: label.into(),
            weight: 0.0,
            function_tag: None,
        }
    }
}

/// One token of a sentence.
///
/// Relations between nodes are stored as indices into the owning
/// [`Sentence`](crate::Sentence); the head and the dependent list are kept
/// consistent by the sentence, so they are only readable from here.
#[derive(Debug, Clone, Default)]
pub struct Node {
    pub(crate) id: usize,
    form: String,
    form_lowercase: String,
    form_simplified: String,
    form_simplified_lowercase: String,
    form_undigitalized: String,
    pub lemma: Option<String>,
    pub pos: Option<String>,
    pub nament: Option<String>,
    pub feats: FeatMap,
    pub(crate) head: Option<Arc>,
    /// Sorted dependent ids.
    pub(crate) dependents: Vec<usize>,
    pub(crate) semantic_heads: Vec<Arc>,
    pub start_offset: usize,
    pub end_offset: usize,

    // Populated by `Lexicon::apply`.
    pub ambiguity_class: Option<String>,
    pub word_clusters: Vec<String>,
    pub word_embedding: Option<Vec<f32>>,
    pub gazetteers: BTreeSet<String>,
    pub stop_word: bool,
}

impl Node {
    /// Creates a token with its derived forms filled in.
    pub fn new<S: Into<String>>(form: S) -> Self {
        let mut node = Self::default();
        node.set_form(form);
        node
    }

    pub(crate) fn root() -> Self {
        let mut node = Self::new("@#r$%");
        node.lemma = node.form_lowercase.clone().into();
        node.pos = node.form.clone().into();
        node
    }

    pub fn with_lemma<S: Into<String>>(mut self, lemma: S) -> Self {
        self.lemma = Some(lemma.into());
        self
    }

    pub fn with_pos<S: Into<String>>(mut self, pos: S) -> Self {
        self.pos = Some(pos.into());
        self
    }

    pub fn with_nament<S: Into<String>>(mut self, tag: S) -> Self {
        self.nament = Some(tag.into());
        self
    }

    pub fn with_feat<K: Into<String>, V: Into<String>>(mut self, key: K, value: V) -> Self {
        self.feats.insert(key.into(), value.into());
        self
    }

    /// Gold or previously assigned head, applied when the node is added to
    /// a sentence.
    pub fn with_head<S: Into<String>>(mut self, head: usize, label: S) -> Self {
        self.head = Some(Arc::new(head, label));
        self
    }

    /// Gold or previously assigned semantic head.
    pub fn with_semantic_head<S: Into<String>>(mut self, head: usize, label: S) -> Self {
        self.semantic_heads.push(Arc::new(head, label));
        self
    }

    pub fn id(&self) -> usize {
        self.id
    }

    pub fn is_root(&self) -> bool {
        self.id == 0
    }

    pub fn form(&self) -> &str {
        &self.form
    }

    pub fn form_lowercase(&self) -> &str {
        &self.form_lowercase
    }

    pub fn form_simplified(&self) -> &str {
        &self.form_simplified
    }

    pub fn form_simplified_lowercase(&self) -> &str {
        &self.form_simplified_lowercase
    }

    pub fn form_undigitalized(&self) -> &str {
        &self.form_undigitalized
    }

    /// Replaces the surface form and recomputes the derived forms.
    pub fn set_form<S: Into<String>>(&mut self, form: S) {
        self.form = form.into();
        self.form_lowercase = self.form.to_lowercase();
        self.form_simplified = form::simplify(&self.form);
        self.form_simplified_lowercase = self.form_simplified.to_lowercase();
        self.form_undigitalized = form::undigitalize(&self.form);
    }

    pub fn feat(&self, key: &str) -> Option<&str> {
        self.feats.get(key).map(String::as_str)
    }

    pub fn head(&self) -> Option<usize> {
        self.head.as_ref().map(|arc| arc.node)
    }

    pub fn head_arc(&self) -> Option<&Arc> {
        self.head.as_ref()
    }

    pub fn deprel(&self) -> Option<&str> {
        self.head.as_ref().map(|arc| arc.label.as_str())
    }

    pub fn has_head(&self) -> bool {
        self.head.is_some()
    }

    pub fn dependents(&self) -> &[usize] {
        &self.dependents
    }

    pub fn semantic_heads(&self) -> &[Arc] {
        &self.semantic_heads
    }

    /// Label of the semantic arc from `predicate`, if any.
    pub fn semantic_label(&self, predicate: usize) -> Option<&str> {
        self.semantic_heads
            .iter()
            .find(|arc| arc.node == predicate)
            .map(|arc| arc.label.as_str())
    }
}
