//! The error taxonomy. Hand-rolled plain `Result`-returning error enum rather than reaching for
//! `thiserror`/`anyhow`, neither of which are part of this crate's dependency stack.

use std::fmt;

/// Errors produced while expanding a word's expression, building its disjuncts, or preparing a
/// sentence.
#[derive(Debug, Clone, PartialEq)]
pub enum CoreError {
    /// An unknown node tag or a structurally invalid tree (e.g. a CONNECTOR tag carrying
    /// children). Fatal for the affected word only; other words may still be processed.
    MalformedExpression { word: usize, detail: String },
    /// A violated dictionary invariant, such as a category index outside `(0, 65536)`. Fatal for
    /// the whole sentence, since disjunct reach is a global property computed over every word.
    CorruptDictionary { detail: String },
    /// A pool could not grow to satisfy an allocation. Fatal for the sentence.
    OutOfMemory,
    /// A per-sentence deadline or resource budget was exceeded. The sentence yields a partial or
    /// empty result rather than panicking or propagating further.
    OverBudget,
}

impl fmt::Display for CoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CoreError::MalformedExpression { word, detail } => {
                write!(f, "malformed expression at word {word}: {detail}")
            }
            CoreError::CorruptDictionary { detail } => {
                write!(f, "corrupt dictionary: {detail}")
            }
            CoreError::OutOfMemory => write!(f, "pool allocator ran out of memory"),
            CoreError::OverBudget => write!(f, "sentence exceeded its parsing budget"),
        }
    }
}

impl std::error::Error for CoreError {}

pub type CoreResult<T> = Result<T, CoreError>;
