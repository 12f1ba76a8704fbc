//! Incremental NLP components trained online
//!
//! This library provides the core of a transition-based NLP pipeline: a
//! sentence arena, a generic decision state driven by task policies
//! (part-of-speech tagging, named-entity recognition, dependency parsing and
//! semantic role labeling), feature templates, and online learners.
//!
//! # Examples
//!
//! ## Training and decoding a tagger
//!
//! ```no_run
//! use onlp::feature::{FeatureItem, FeatureTemplate, Field};
//! use onlp::task::PosTagging;
//! use onlp::train::{Algorithm, HyperParameter};
//! use onlp::{Mode, Node, OnlineComponent, Sentence};
//!
//! let mut template = FeatureTemplate::new();
//! template.add(vec![FeatureItem::input(0, Field::WordFormLowercase)])?;
//! template.add(vec![FeatureItem::input(-1, Field::WordFormLowercase)])?;
//!
//! let params = HyperParameter::new(Algorithm::AdaGrad).with_learning_rate(0.05)?;
//! let mut tagger = OnlineComponent::new(PosTagging::new(), template, &params)?;
//!
//! let mut sentence = Sentence::new(vec![
//!     Node::new("The").with_pos("DT"),
//!     Node::new("dog").with_pos("NN"),
//!     Node::new("barks").with_pos("VBZ"),
//! ]);
//! for _ in 0..params.max_epochs() {
//!     tagger.train(&mut sentence.clone())?;
//!     tagger.end_epoch();
//! }
//! tagger.freeze();
//!
//! tagger.set_mode(Mode::Decode);
//! let mut input = Sentence::from_forms(&["The", "dog", "barks"]);
//! tagger.decode(&mut input);
//! assert_eq!(input[2].pos.as_deref(), Some("NN"));
//! # Ok::<(), onlp::Error>(())
//! ```

mod activation;
mod component;
mod dictionary;
mod errors;
mod eval;
mod graph;
mod instance;
mod lexicon;
mod node;
mod state;
mod vector;
mod weight;

/// Feature templates and the fields and relations they read
pub mod feature;
/// Word-form normalisation, word shapes and orthographic flags
pub mod form;
/// Task policies for tagging, dependency parsing and semantic role labeling
pub mod task;
/// Online optimizers, regularization, roll-in and hyper-parameters
pub mod train;

// Re-export main types
pub use self::activation::Activation;
pub use self::component::{Mode, OnlineComponent};
pub use self::dictionary::{FeatureMap, LabelMap, Vocabulary};
pub use self::errors::{Error, Result};
pub use self::eval::{AccuracyEval, AttachmentEval, Eval, F1Eval};
pub use self::graph::{Direction, Sentence};
pub use self::instance::Instance;
pub use self::lexicon::{FormKey, Lexicon};
pub use self::node::{Arc, FeatMap, Node};
pub use self::state::{State, TaskPolicy};
pub use self::vector::{FeatureVector, SparseItem, SparseVector, StringItem, StringVector};
pub use self::weight::{Layout, MajorVector, WeightGenerator, WeightVector};

// Re-export training types for convenience
pub use self::train::{Algorithm, HyperParameter, OnlineOptimizer};
