//! Definition of errors.

/// A specialized Result type for this crate.
pub type Result<T, E = Error> = std::result::Result<T, E>;

/// The error type for this crate.
///
/// Vocabulary misses and malformed predicted structures are recovered where
/// they happen and never show up here. What remains are configuration errors,
/// which are reported before any instance is processed, and attempts to grow
/// a vocabulary that has been frozen.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A parameter value was rejected.
    #[error("{msg}")]
    InvalidArgument {
        /// Name of the argument.
        arg: &'static str,
        /// Error message.
        msg: String,
    },

    /// Settings that are individually valid but do not fit together.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// A new key was offered to a frozen map.
    #[error("cannot add {key:?} to the frozen {kind} map")]
    FrozenVocabulary {
        /// Which map refused the key.
        kind: &'static str,
        /// The rejected key.
        key: String,
    },

    /// The error variant for [`ParseFloatError`](std::num::ParseFloatError).
    #[error(transparent)]
    ParseFloat(#[from] std::num::ParseFloatError),

    /// The error variant for [`ParseIntError`](std::num::ParseIntError).
    #[error(transparent)]
    ParseInt(#[from] std::num::ParseIntError),
}

impl Error {
    pub(crate) fn invalid_argument<S>(arg: &'static str, msg: S) -> Self
    where
        S: Into<String>,
    {
        Self::InvalidArgument {
            arg,
            msg: msg.into(),
        }
    }

    pub(crate) fn invalid_config<S>(msg: S) -> Self
    where
        S: Into<String>,
    {
        Self::InvalidConfig(msg.into())
    }

    pub(crate) fn frozen<S>(kind: &'static str, key: S) -> Self
    where
        S: Into<String>,
    {
        Self::FrozenVocabulary {
            kind,
            key: key.into(),
        }
    }
}
