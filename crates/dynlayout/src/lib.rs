//! # dynlayout
//!
//! A library for decoding self-describing binary structures: records where the type or
//! length of a later field depends on the value of an earlier one.
//!
//! Describe a record as an ordered list of [FieldSpec]s. Fixed fields carry their type;
//! resolved fields carry a function that looks at the prefix decoded so far (and the bytes
//! that remain) to pick their type. The schema is resolved against a buffer into a
//! [Layout] of offsets, then filled into a [DecodedStruct] that reads values by name.
//! Arrays of such records are decoded with [decode_array].
//!
//! ## Example
//!
//! ```
//! use dynlayout::{FieldSpec, Primitive, TypeDescriptor, Value, decode_struct};
//!
//! let fields = vec![
//!     FieldSpec::fixed("len", Primitive::U8),
//!     FieldSpec::resolved("data", |prefix, _rest| {
//!         let n = prefix.get_u64("len")? as usize;
//!         Ok(TypeDescriptor::array(Primitive::U8, n))
//!     }),
//!     FieldSpec::fixed("crc", Primitive::U8),
//! ];
//!
//! let record = decode_struct(&fields, &[2, 0xaa, 0xbb, 0x42], 1, &[]).unwrap();
//! assert_eq!(record.get_u64("len").unwrap(), 2);
//! assert_eq!(
//!     record.field("data").unwrap(),
//!     Value::Array(vec![Value::U64(0xaa), Value::U64(0xbb)])
//! );
//! assert_eq!(record.get_u64("crc").unwrap(), 0x42);
//! ```
//!
//! Bitfields are not supported; only whole-byte fields can be composed.

pub mod array;
pub mod bytes;
pub mod decoded;
pub mod descriptor;
pub mod errors;
pub mod field;
pub mod layout;
pub mod schema;
#[cfg(feature = "serde")]
pub mod serde;

pub use array::{ArrayLayout, ElementSpec, Selection, Selector, decode_array};
pub use decoded::{DecodedStruct, Value};
pub use descriptor::{ByteOrder, Primitive, TypeDescriptor};
pub use errors::{BufferError, DecodeError, LookupError, SchemaError};
pub use field::{FieldKind, FieldSpec, Resolver};
pub use layout::{FieldLocation, Layout, LayoutField};
pub use schema::Schema;

/// Resolves `schema` against `buffer` into a [Layout].
///
/// `anonymous` names composite fields whose inner names become reachable from the
/// enclosing struct.
pub fn build_layout(
    schema: &[FieldSpec],
    buffer: &[u8],
    pack: usize,
    anonymous: &[&str],
) -> Result<Layout, DecodeError> {
    schema::resolve(schema, buffer, pack, anonymous)
}

/// [build_layout] followed by [DecodedStruct::fill].
pub fn decode_struct(
    schema: &[FieldSpec],
    buffer: &[u8],
    pack: usize,
    anonymous: &[&str],
) -> Result<DecodedStruct, DecodeError> {
    let layout = build_layout(schema, buffer, pack, anonymous)?;
    Ok(DecodedStruct::fill(layout, buffer))
}
