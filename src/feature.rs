//! Feature templates.
//!
//! A [`FeatureTemplate`] is a list of [`FeatureItem`]s, each naming a node
//! relative to the current state and a field to read from it. Items are
//! registered in one of three ways:
//!
//! * [`FeatureTemplate::add`]: a conjunction of items that fires only when
//!   every item has a value,
//! * [`FeatureTemplate::add_set`]: one feature per value of a set-valued
//!   field,
//! * [`FeatureTemplate::add_set_weighted`]: the same, with each feature
//!   weighted by a count.
//!
//! Every registration is a slot of its own. Feature strings are mapped to
//! indices within their slot, so equal strings produced by different slots
//! never collide.

use std::collections::BTreeMap;

use crate::dictionary::FeatureMap;
use crate::errors::{Error, Result};
use crate::form::{self, Orthographic};
use crate::graph::{Direction, Sentence};
use crate::node::Node;
use crate::state::{State, TaskPolicy};
use crate::vector::{FeatureVector, SparseVector, StringVector};

/// Where a feature item starts looking for its node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Source {
    /// The current input token; windows move through the sentence.
    Input,
    /// Top of the stack of a transition system; windows move through the
    /// sentence, so `Stack` with window 1 is the token right after the top.
    Stack,
    /// Depth into the stack: 0 is the top, -1 the node below it. Positive
    /// windows read the passed list from its most recent node.
    PeekStack,
    /// The list of nodes set aside between the stack and the input.
    List,
    /// Predicate of a predicate-argument decision.
    Predicate,
    /// Argument candidate of a predicate-argument decision.
    Argument,
}

/// Structural relation followed from the located node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Relation {
    Head,
    GrandHead,
    LeftMostDependent,
    LeftMostDependent2,
    RightMostDependent,
    RightMostDependent2,
    LeftNearestDependent,
    LeftNearestDependent2,
    RightNearestDependent,
    RightNearestDependent2,
    LeftNearestSibling,
    LeftNearestSibling2,
    RightNearestSibling,
    RightNearestSibling2,
}

impl Relation {
    /// Node reached from `id`, if the relation exists.
    pub fn resolve(self, sentence: &Sentence, id: usize) -> Option<usize> {
        match self {
            Self::Head => sentence.head(id),
            Self::GrandHead => sentence.grand_head(id),
            Self::LeftMostDependent => sentence.left_most_dependent(id, 0),
            Self::LeftMostDependent2 => sentence.left_most_dependent(id, 1),
            Self::RightMostDependent => sentence.right_most_dependent(id, 0),
            Self::RightMostDependent2 => sentence.right_most_dependent(id, 1),
            Self::LeftNearestDependent => sentence.left_nearest_dependent(id, 0),
            Self::LeftNearestDependent2 => sentence.left_nearest_dependent(id, 1),
            Self::RightNearestDependent => sentence.right_nearest_dependent(id, 0),
            Self::RightNearestDependent2 => sentence.right_nearest_dependent(id, 1),
            Self::LeftNearestSibling => sentence.left_nearest_sibling(id, 0),
            Self::LeftNearestSibling2 => sentence.left_nearest_sibling(id, 1),
            Self::RightNearestSibling => sentence.right_nearest_sibling(id, 0),
            Self::RightNearestSibling2 => sentence.right_nearest_sibling(id, 1),
        }
    }
}

/// What to read from a node.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Field {
    WordForm,
    WordFormLowercase,
    WordFormSimplified,
    WordFormSimplifiedLowercase,
    WordFormUndigitalized,
    /// Shape of the simplified form with at most `n` repetitions per class.
    WordShape(usize),
    /// Shape of the simplified lowercase form.
    WordShapeLowercase(usize),
    /// First `n` characters of the simplified lowercase form.
    Prefix(usize),
    /// Last `n` characters of the simplified lowercase form.
    Suffix(usize),
    Lemma,
    Feat(String),
    PartOfSpeechTag,
    AmbiguityClass,
    NamedEntityTag,
    DependencyLabel,
    Valency(Direction),
    NamedEntityGazetteers,
    WordClusters,
    Orthographic,
    /// Orthographic flags that do not depend on letter case.
    OrthographicLowercase,
    /// `0` for the first token, `1` for the last one.
    Positional,
    /// Simplified lowercase forms of the sentence's tokens, skipping stop
    /// words and, unless `true`, punctuation.
    BagOfWords(bool),
    /// Like `BagOfWords`, weighted by the number of occurrences.
    BagOfWordsCount(bool),
    WordEmbedding,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FieldKind {
    Single,
    /// Single value when there is exactly one, a set otherwise.
    Either,
    Set,
    Weighted,
    Dense,
}

impl Field {
    fn kind(&self) -> FieldKind {
        match self {
            Self::NamedEntityGazetteers => FieldKind::Either,
            Self::WordClusters
            | Self::Orthographic
            | Self::OrthographicLowercase
            | Self::Positional
            | Self::BagOfWords(_) => FieldKind::Set,
            Self::BagOfWordsCount(_) => FieldKind::Weighted,
            Self::WordEmbedding => FieldKind::Dense,
            _ => FieldKind::Single,
        }
    }

    /// Single value of this field for `node`.
    pub fn value(&self, sentence: &Sentence, node: &Node) -> Option<String> {
        let value = match self {
            Self::WordForm => node.form().to_string(),
            Self::WordFormLowercase => node.form_lowercase().to_string(),
            Self::WordFormSimplified => node.form_simplified().to_string(),
            Self::WordFormSimplifiedLowercase => node.form_simplified_lowercase().to_string(),
            Self::WordFormUndigitalized => node.form_undigitalized().to_string(),
            Self::WordShape(n) => form::shape(node.form_simplified(), *n),
            Self::WordShapeLowercase(n) => form::shape(node.form_simplified_lowercase(), *n),
            Self::Prefix(n) => {
                let s = node.form_simplified_lowercase();
                if *n >= s.chars().count() {
                    return None;
                }
                s.chars().take(*n).collect()
            }
            Self::Suffix(n) => {
                let s = node.form_simplified_lowercase();
                let len = s.chars().count();
                if *n >= len {
                    return None;
                }
                s.chars().skip(len - n).collect()
            }
            Self::Lemma => node.lemma.clone()?,
            Self::Feat(key) => node.feat(key)?.to_string(),
            Self::PartOfSpeechTag => node.pos.clone()?,
            Self::AmbiguityClass => node.ambiguity_class.clone()?,
            Self::NamedEntityTag => node.nament.clone()?,
            Self::DependencyLabel => node.deprel()?.to_string(),
            Self::Valency(direction) => sentence.valency(node.id(), *direction)?,
            Self::NamedEntityGazetteers => {
                if node.gazetteers.len() != 1 {
                    return None;
                }
                node.gazetteers.iter().next()?.clone()
            }
            _ => return None,
        };
        Some(value)
    }

    /// Values of this field for `node`, each with its weight.
    pub fn weighted_values(&self, sentence: &Sentence, node: &Node) -> Vec<(String, f32)> {
        let ones = |values: Vec<String>| -> Vec<(String, f32)> {
            values.into_iter().map(|v| (v, 1.0)).collect()
        };
        match self {
            Self::NamedEntityGazetteers => ones(node.gazetteers.iter().cloned().collect()),
            Self::WordClusters => ones(node.word_clusters.clone()),
            Self::Orthographic | Self::OrthographicLowercase => {
                let mut flags = Orthographic::of(node.form(), node.id() == 1);
                if *self == Self::OrthographicLowercase {
                    flags.remove(Orthographic::CASED);
                }
                ones(flags.names().map(str::to_string).collect())
            }
            Self::Positional => {
                let mut values = Vec::new();
                if node.id() == 1 {
                    values.push("0".to_string());
                }
                if node.id() + 1 == sentence.len() && node.id() > 0 {
                    values.push("1".to_string());
                }
                ones(values)
            }
            Self::BagOfWords(punct) => ones(bag_of_words(sentence, *punct).into_keys().collect()),
            Self::BagOfWordsCount(punct) => bag_of_words(sentence, *punct)
                .into_iter()
                .map(|(k, c)| (k, c as f32))
                .collect(),
            _ => self
                .value(sentence, node)
                .map(|v| vec![(v, 1.0)])
                .unwrap_or_default(),
        }
    }
}

fn bag_of_words(sentence: &Sentence, include_punct: bool) -> BTreeMap<String, usize> {
    let mut bag = BTreeMap::new();
    for node in sentence.tokens() {
        let key = node.form_simplified_lowercase();
        if node.stop_word || (!include_punct && form::is_punct_only(key)) {
            continue;
        }
        *bag.entry(key.to_string()).or_insert(0) += 1;
    }
    bag
}

/// A node designation plus the field to read from it.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FeatureItem {
    pub source: Source,
    pub window: i32,
    pub relation: Option<Relation>,
    pub field: Field,
}

impl FeatureItem {
    pub fn new(source: Source, window: i32, field: Field) -> Self {
        Self {
            source,
            window,
            relation: None,
            field,
        }
    }

    /// Item relative to the current input token.
    pub fn input(window: i32, field: Field) -> Self {
        Self::new(Source::Input, window, field)
    }

    pub fn with_relation(mut self, relation: Relation) -> Self {
        self.relation = Some(relation);
        self
    }

    /// The node this item points at in `state`.
    pub fn resolve<'s, P: TaskPolicy>(&self, state: &'s State<'_, P>) -> Option<&'s Node> {
        let sentence = state.sentence();
        let mut id = state.node(self.source, self.window)?;
        if let Some(relation) = self.relation {
            id = relation.resolve(sentence, id)?;
        }
        sentence.node(id)
    }
}

/// Declarative feature extraction.
#[derive(Debug, Clone, Default)]
pub struct FeatureTemplate {
    feature_list: Vec<Vec<FeatureItem>>,
    feature_set: Vec<FeatureItem>,
    feature_set_weighted: Vec<FeatureItem>,
    dense: Vec<(FeatureItem, usize)>,
}

impl FeatureTemplate {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a conjunction of single-valued items.
    pub fn add(&mut self, items: Vec<FeatureItem>) -> Result<()> {
        if items.is_empty() {
            return Err(Error::invalid_config("a feature needs at least one item"));
        }
        if let Some(item) = items
            .iter()
            .find(|i| !matches!(i.field.kind(), FieldKind::Single | FieldKind::Either))
        {
            return Err(Error::invalid_config(format!(
                "{:?} has no single value; register it with add_set",
                item.field
            )));
        }
        self.feature_list.push(items);
        Ok(())
    }

    /// Adds an item contributing one feature per value.
    pub fn add_set(&mut self, item: FeatureItem) -> Result<()> {
        if matches!(item.field.kind(), FieldKind::Weighted | FieldKind::Dense) {
            return Err(Error::invalid_config(format!(
                "{:?} cannot be registered with add_set",
                item.field
            )));
        }
        self.feature_set.push(item);
        Ok(())
    }

    /// Adds an item contributing one weighted feature per value.
    pub fn add_set_weighted(&mut self, item: FeatureItem) -> Result<()> {
        if item.field.kind() == FieldKind::Dense {
            return Err(Error::invalid_config(format!(
                "{:?} cannot be registered with add_set_weighted",
                item.field
            )));
        }
        self.feature_set_weighted.push(item);
        Ok(())
    }

    /// Adds an embedding of dimension `dim` to the dense vector.
    pub fn add_dense(&mut self, item: FeatureItem, dim: usize) -> Result<()> {
        if item.field.kind() != FieldKind::Dense {
            return Err(Error::invalid_config(format!(
                "{:?} is not a dense field",
                item.field
            )));
        }
        if dim == 0 {
            return Err(Error::invalid_argument("dim", "dim must be at least 1"));
        }
        self.dense.push((item, dim));
        Ok(())
    }

    /// Number of sparse slots.
    pub fn slots(&self) -> usize {
        self.feature_list.len() + self.feature_set.len() + self.feature_set_weighted.len()
    }

    /// Length of the dense vector, 0 if there is none.
    pub fn dense_size(&self) -> usize {
        self.dense.iter().map(|(_, dim)| dim).sum()
    }

    /// Feature strings of the current decision point, tagged with their slot.
    pub fn extract<P: TaskPolicy>(&self, state: &State<'_, P>) -> StringVector {
        let sentence = state.sentence();
        let mut out = StringVector::new();
        let mut ty = 0;

        for items in &self.feature_list {
            let mut values = Vec::with_capacity(items.len());
            for item in items {
                match item.resolve(state).and_then(|n| item.field.value(sentence, n)) {
                    Some(v) => values.push(v),
                    None => break,
                }
            }
            if values.len() == items.len() {
                out.add(ty, values.join("_"));
            }
            ty += 1;
        }

        for item in &self.feature_set {
            if let Some(node) = item.resolve(state) {
                for (v, _) in item.field.weighted_values(sentence, node) {
                    out.add(ty, v);
                }
            }
            ty += 1;
        }

        for item in &self.feature_set_weighted {
            if let Some(node) = item.resolve(state) {
                for (v, w) in item.field.weighted_values(sentence, node) {
                    out.add_weighted(ty, v, w);
                }
            }
            ty += 1;
        }

        out
    }

    /// Sparse vector of the current decision point.
    ///
    /// With `train` set, unseen strings are added to `features`; otherwise
    /// they are dropped and `features` is left untouched.
    pub fn create_sparse_vector<P: TaskPolicy>(
        &self,
        state: &State<'_, P>,
        features: &mut FeatureMap,
        train: bool,
    ) -> Result<SparseVector> {
        if !train {
            return Ok(self.lookup_sparse_vector(state, features));
        }
        let mut x = SparseVector::new();
        for item in &self.extract(state) {
            let index = features.add(item.ty, &item.value)?;
            x.push(index, item.weight);
        }
        x.merge();
        Ok(x)
    }

    /// Sparse vector of the current decision point using only known features.
    pub fn lookup_sparse_vector<P: TaskPolicy>(
        &self,
        state: &State<'_, P>,
        features: &FeatureMap,
    ) -> SparseVector {
        let mut x = SparseVector::new();
        for item in &self.extract(state) {
            if let Some(index) = features.index(item.ty, &item.value) {
                x.push(index, item.weight);
            }
        }
        x.merge();
        x
    }

    /// Concatenated embeddings, zeros for nodes without one; `None` if the
    /// template has no dense items.
    pub fn create_dense_vector<P: TaskPolicy>(&self, state: &State<'_, P>) -> Option<Vec<f32>> {
        if self.dense.is_empty() {
            return None;
        }
        let mut out = Vec::with_capacity(self.dense_size());
        for (item, dim) in &self.dense {
            let embedding = item.resolve(state).and_then(|n| n.word_embedding.as_deref());
            match embedding {
                Some(e) => {
                    out.extend(e.iter().take(*dim));
                    out.extend(std::iter::repeat(0.0).take(dim.saturating_sub(e.len())));
                }
                None => out.extend(std::iter::repeat(0.0).take(*dim)),
            }
        }
        Some(out)
    }

    /// Sparse and dense vectors together; see [`Self::create_sparse_vector`].
    pub fn create_feature_vector<P: TaskPolicy>(
        &self,
        state: &State<'_, P>,
        features: &mut FeatureMap,
        train: bool,
    ) -> Result<FeatureVector> {
        let sparse = self.create_sparse_vector(state, features, train)?;
        Ok(FeatureVector::new(sparse, self.create_dense_vector(state)))
    }

    /// Read-only variant of [`Self::create_feature_vector`].
    pub fn lookup_feature_vector<P: TaskPolicy>(
        &self,
        state: &State<'_, P>,
        features: &FeatureMap,
    ) -> FeatureVector {
        let sparse = self.lookup_sparse_vector(state, features);
        FeatureVector::new(sparse, self.create_dense_vector(state))
    }
}
