//! Error types for shadow document decoding.

use thiserror::Error;

/// Errors that can occur while decoding a shadow document.
///
/// A fetched document that does not match the expected shape is fatal
/// to the control loop; these errors carry enough detail for the
/// diagnostic printed on exit.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum DecodeError {
    /// The document section was neither an object nor null.
    #[error("expected an object, got {0}")]
    NotAnObject(String),

    /// A field held a value of the wrong JSON type.
    #[error("field {field} has invalid type: {found}")]
    InvalidType {
        /// Wire name of the offending field.
        field: &'static str,
        /// Rendering of the value that was found.
        found: String,
    },

    /// A flag field held a negative or fractional number.
    #[error("field {field} must be a non-negative integer, got {value}")]
    InvalidFlag {
        /// Wire name of the offending field.
        field: &'static str,
        /// The number that was found.
        value: f64,
    },
}
