//! Error types for schema resolution, buffer sufficiency and field lookup.

use thiserror::Error;

/// Errors in the shape of a schema or type descriptor, independent of buffer contents.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SchemaError {
    /// A field requests a sub-byte width. Only whole-byte fields can be composed.
    #[error("field `{field}` is a {bits}-bit bitfield; bitfields are not supported")]
    BitfieldUnsupported { field: String, bits: u32 },
    /// Primitive width is not one of 1, 2, 4 or 8 bytes.
    #[error("invalid primitive width {0}; expected 1, 2, 4 or 8 bytes")]
    InvalidPrimitiveWidth(usize),
    /// Pack alignment is zero or not a power of two.
    #[error("invalid pack alignment {0}; expected a power of two")]
    InvalidPackAlignment(usize),
    /// A resolver could not map the decoded prefix to a type (e.g. unknown version tag).
    #[error("cannot resolve field `{field}`: {reason}")]
    Unresolvable { field: String, reason: String },
    /// The field's size or end offset does not fit in `usize`.
    #[error("field `{field}` is too large to lay out")]
    SizeOverflow { field: String },
}

/// Errors raised when the buffer cannot hold what the schema asks for.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BufferError {
    /// A resolved field (or array element) needs more bytes than remain.
    #[error("not enough buffer to process `{field}`: need {needed} bytes, have {available}")]
    BufferSizeInsufficient {
        field: String,
        needed: usize,
        available: usize,
    },
}

/// Errors produced when reading fields or elements out of decoded data.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LookupError {
    /// No own or promoted field carries this name.
    #[error("field `{name}` not found")]
    FieldNotFound { name: String },
    /// Array index outside `[0, produced_count)`.
    #[error("index {index} is out of bounds for array of {produced_count} elements")]
    IndexOutOfBounds { index: usize, produced_count: usize },
    /// The field exists but does not hold the requested kind of value.
    #[error("field `{name}` is not {expected}")]
    TypeMismatch { name: String, expected: &'static str },
}

/// Any error produced while building a layout or decoding a buffer.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DecodeError {
    #[error(transparent)]
    Schema(#[from] SchemaError),
    #[error(transparent)]
    Buffer(#[from] BufferError),
    #[error(transparent)]
    Lookup(#[from] LookupError),
}
