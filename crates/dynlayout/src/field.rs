//! Schema entries used to build a [crate::schema::Schema].

use std::{fmt, sync::Arc};

use crate::{decoded::DecodedStruct, descriptor::TypeDescriptor, errors::DecodeError};

/// Computes a field's type from the prefix decoded so far and the bytes that remain.
///
/// Resolvers must be pure: identical inputs must give identical outputs.
pub type Resolver =
    Arc<dyn Fn(&DecodedStruct, &[u8]) -> Result<TypeDescriptor, DecodeError> + Send + Sync>;

/// A single named entry in a schema.
#[derive(Debug, Clone)]
pub struct FieldSpec {
    /// Name used for lookups. Duplicates are allowed; the first declared wins.
    pub name: String,
    /// How the field's type is obtained.
    pub kind: FieldKind,
}

/// Where a field's type comes from.
#[derive(Clone)]
pub enum FieldKind {
    /// Type known up front; no buffer inspection needed.
    Fixed(TypeDescriptor),
    /// Type computed from the decoded prefix and remaining buffer.
    Resolved(Resolver),
    /// Sub-byte field. Always rejected when the schema is resolved.
    Bitfield { descriptor: TypeDescriptor, bits: u32 },
}

impl fmt::Debug for FieldKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldKind::Fixed(ty) => f.debug_tuple("Fixed").field(ty).finish(),
            FieldKind::Resolved(_) => f.write_str("Resolved(..)"),
            FieldKind::Bitfield { descriptor, bits } => f
                .debug_struct("Bitfield")
                .field("descriptor", descriptor)
                .field("bits", bits)
                .finish(),
        }
    }
}

impl FieldSpec {
    pub fn fixed(name: impl Into<String>, ty: impl Into<TypeDescriptor>) -> Self {
        FieldSpec {
            name: name.into(),
            kind: FieldKind::Fixed(ty.into()),
        }
    }

    pub fn resolved<F>(name: impl Into<String>, resolver: F) -> Self
    where
        F: Fn(&DecodedStruct, &[u8]) -> Result<TypeDescriptor, DecodeError>
            + Send
            + Sync
            + 'static,
    {
        FieldSpec {
            name: name.into(),
            kind: FieldKind::Resolved(Arc::new(resolver)),
        }
    }

    pub fn bitfield(name: impl Into<String>, ty: impl Into<TypeDescriptor>, bits: u32) -> Self {
        FieldSpec {
            name: name.into(),
            kind: FieldKind::Bitfield {
                descriptor: ty.into(),
                bits,
            },
        }
    }
}
