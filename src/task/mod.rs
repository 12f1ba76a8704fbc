//! Task policies: what a label means for each kind of annotation.

pub mod bilou;
mod dep;
mod srl;
mod tagging;

pub use self::dep::{ArcOp, DepCursor, DepLabel, DepParsing, ListOp};
pub use self::srl::{SrlCursor, SrlLabeling, NO_ARG};
pub use self::tagging::{NamedEntity, NerTagging, PartOfSpeech, PosTagging, TagField, Tagging};
