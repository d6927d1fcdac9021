//! Error types for kasi operations.

use thiserror::Error;

/// Errors that can occur while loading inputs or writing output.
///
/// The rewrite engine itself has no error conditions: it either matches and
/// rewrites or returns the buffer unchanged. Failures here come from the
/// edges of a conversion run (reading the source, parsing the lexicon,
/// writing the result).
#[derive(Error, Debug)]
pub enum Error {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid lexicon (line {line}): {message}")]
    InvalidLexicon { line: usize, message: String },
}

pub type Result<T> = std::result::Result<T, Error>;
