//! Lexical resources attached to tokens before feature extraction.

use hashbrown::{HashMap, HashSet};

use crate::errors::{Error, Result};
use crate::graph::Sentence;
use crate::node::Node;

/// Which form of a token is used as the lookup key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FormKey {
    Form,
    Lowercase,
    Simplified,
    #[default]
    SimplifiedLowercase,
    Undigitalized,
}

impl FormKey {
    pub fn of(self, node: &Node) -> &str {
        match self {
            Self::Form => node.form(),
            Self::Lowercase => node.form_lowercase(),
            Self::Simplified => node.form_simplified(),
            Self::SimplifiedLowercase => node.form_simplified_lowercase(),
            Self::Undigitalized => node.form_undigitalized(),
        }
    }
}

/// An immutable bundle of lexical lookups.
///
/// Built once, then shared by every sentence a component processes.
/// [`Lexicon::apply`] copies the matching entries onto the tokens so that
/// feature extraction reads them from the nodes.
#[derive(Debug, Clone, Default)]
pub struct Lexicon {
    key: FormKey,
    ambiguity_classes: HashMap<String, String>,
    word_clusters: HashMap<String, Vec<String>>,
    word_embeddings: HashMap<String, Vec<f32>>,
    embedding_dim: usize,
    gazetteers: HashMap<Vec<String>, Vec<String>>,
    max_gazetteer_len: usize,
    stop_words: HashSet<String>,
}

impl Lexicon {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_key(mut self, key: FormKey) -> Self {
        self.key = key;
        self
    }

    pub fn key(&self) -> FormKey {
        self.key
    }

    /// Dimension of the word embeddings, 0 when there are none.
    pub fn embedding_dim(&self) -> usize {
        self.embedding_dim
    }

    pub fn add_ambiguity_class<K, V>(&mut self, word: K, class: V)
    where
        K: Into<String>,
        V: Into<String>,
    {
        self.ambiguity_classes.insert(word.into(), class.into());
    }

    pub fn add_word_clusters<K, I, V>(&mut self, word: K, clusters: I)
    where
        K: Into<String>,
        I: IntoIterator<Item = V>,
        V: Into<String>,
    {
        let entry = self.word_clusters.entry(word.into()).or_default();
        entry.extend(clusters.into_iter().map(Into::into));
    }

    /// Adds a word embedding. Every embedding must have the same dimension.
    pub fn add_word_embedding<K: Into<String>>(&mut self, word: K, vector: Vec<f32>) -> Result<()> {
        if vector.is_empty() {
            return Err(Error::invalid_argument(
                "vector",
                "word embedding must not be empty",
            ));
        }
        if self.embedding_dim != 0 && self.embedding_dim != vector.len() {
            return Err(Error::invalid_config(format!(
                "word embedding of dimension {} does not match {}",
                vector.len(),
                self.embedding_dim
            )));
        }
        self.embedding_dim = vector.len();
        self.word_embeddings.insert(word.into(), vector);
        Ok(())
    }

    /// Adds a gazetteer entry. `phrase` is matched token by token.
    pub fn add_gazetteer<S, T>(&mut self, phrase: &[S], entity_type: T)
    where
        S: AsRef<str>,
        T: Into<String>,
    {
        if phrase.is_empty() {
            return;
        }
        let key: Vec<String> = phrase.iter().map(|s| s.as_ref().to_string()).collect();
        self.max_gazetteer_len = self.max_gazetteer_len.max(key.len());
        let types = self.gazetteers.entry(key).or_default();
        let entity_type = entity_type.into();
        if !types.contains(&entity_type) {
            types.push(entity_type);
        }
    }

    pub fn add_stop_word<S: Into<String>>(&mut self, word: S) {
        self.stop_words.insert(word.into());
    }

    pub fn word_embedding(&self, word: &str) -> Option<&[f32]> {
        self.word_embeddings.get(word).map(Vec::as_slice)
    }

    /// Copies every matching entry onto the tokens of `sentence`.
    ///
    /// Previous lexical annotations are overwritten. Gazetteer matches are
    /// marked with BILOU prefixes: `U-` for single tokens, otherwise `B-`,
    /// `I-` and `L-`.
    pub fn apply(&self, sentence: &mut Sentence) {
        let keys: Vec<String> = sentence
            .nodes()
            .iter()
            .map(|n| self.key.of(n).to_string())
            .collect();

        let mut gazetteers = vec![Vec::new(); keys.len()];
        if self.max_gazetteer_len > 0 {
            for begin in 1..keys.len() {
                let longest = self.max_gazetteer_len.min(keys.len() - begin);
                for n in 1..=longest {
                    let Some(types) = self.gazetteers.get(&keys[begin..begin + n]) else {
                        continue;
                    };
                    for t in types {
                        if n == 1 {
                            gazetteers[begin].push(format!("U-{}", t));
                            continue;
                        }
                        gazetteers[begin].push(format!("B-{}", t));
                        for g in &mut gazetteers[begin + 1..begin + n - 1] {
                            g.push(format!("I-{}", t));
                        }
                        gazetteers[begin + n - 1].push(format!("L-{}", t));
                    }
                }
            }
        }

        for ((node, key), found) in sentence.nodes_mut().zip(&keys).zip(gazetteers).skip(1) {
            node.ambiguity_class = self.ambiguity_classes.get(key).cloned();
            node.word_clusters = self.word_clusters.get(key).cloned().unwrap_or_default();
            node.word_embedding = self.word_embeddings.get(key).cloned();
            node.gazetteers = found.into_iter().collect();
            node.stop_word = self.stop_words.contains(key);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_apply() {
        let mut lexicon = Lexicon::new();
        lexicon.add_ambiguity_class("dog", "NN_VB");
        lexicon.add_word_clusters("dog", ["0101", "0110"]);
        lexicon.add_word_embedding("dog", vec![0.5, -0.5]).unwrap();
        lexicon.add_gazetteer(&["new", "york", "city"], "LOC");
        lexicon.add_gazetteer(&["york"], "PER");
        lexicon.add_stop_word("the");

        let mut sentence = Sentence::from_forms(&["The", "dog", "saw", "New", "York", "City"]);
        lexicon.apply(&mut sentence);

        assert!(sentence[1].stop_word);
        assert_eq!(sentence[2].ambiguity_class.as_deref(), Some("NN_VB"));
        assert_eq!(sentence[2].word_clusters, vec!["0101", "0110"]);
        assert_eq!(sentence[2].word_embedding.as_deref(), Some(&[0.5, -0.5][..]));
        assert!(sentence[3].gazetteers.is_empty());
        assert!(sentence[4].gazetteers.contains("B-LOC"));
        assert!(sentence[5].gazetteers.contains("I-LOC"));
        assert!(sentence[5].gazetteers.contains("U-PER"));
        assert!(sentence[6].gazetteers.contains("L-LOC"));
    }

    #[test]
    fn test_embedding_dimension_mismatch() {
        let mut lexicon = Lexicon::new();
        lexicon.add_word_embedding("a", vec![1.0, 2.0]).unwrap();
        assert!(lexicon.add_word_embedding("b", vec![1.0]).is_err());
        assert_eq!(lexicon.embedding_dim(), 2);
    }
}
