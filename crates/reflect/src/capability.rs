//! Custom JSON conversion capabilities a type can carry.
//!
//! A type built with [`TypeBuilder::marshaler`](crate::TypeBuilder::marshaler)
//! or [`TypeBuilder::unmarshaler`](crate::TypeBuilder::unmarshaler) takes
//! over its own JSON form; the codec engine calls these hooks instead of
//! walking the type's structure.

use crate::value::Value;

/// The error type returned by conversion hooks.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Produces the JSON text of a value.
pub trait Marshaler: Send + Sync + 'static {
    /// Returns the complete JSON text for `value`.
    ///
    /// # Errors
    ///
    /// Any error is surfaced on the output sink, annotated with the type.
    fn marshal_json(&self, value: &Value) -> Result<Vec<u8>, BoxError>;
}

/// Populates a value from JSON text.
pub trait Unmarshaler: Send + Sync + 'static {
    /// Decodes the raw JSON text `data` into `value`.
    ///
    /// # Errors
    ///
    /// Any error is surfaced on the input source, annotated with the type.
    fn unmarshal_json(
        &self,
        data: &[u8],
        value: &mut Value,
    ) -> Result<(), BoxError>;
}
