//! Immutable descriptions of a field's shape: primitive, composite or repeated.

use std::sync::Arc;

use crate::{errors::SchemaError, layout::Layout};

/// Byte order of a multi-byte primitive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ByteOrder {
    #[default]
    Little,
    Big,
}

/// A whole-byte integer primitive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Primitive {
    width: usize,
    order: ByteOrder,
    signed: bool,
}

impl Primitive {
    pub const U8: Primitive = Primitive::unchecked(1, ByteOrder::Little, false);
    pub const I8: Primitive = Primitive::unchecked(1, ByteOrder::Little, true);
    pub const U16_LE: Primitive = Primitive::unchecked(2, ByteOrder::Little, false);
    pub const U16_BE: Primitive = Primitive::unchecked(2, ByteOrder::Big, false);
    pub const I16_LE: Primitive = Primitive::unchecked(2, ByteOrder::Little, true);
    pub const U32_LE: Primitive = Primitive::unchecked(4, ByteOrder::Little, false);
    pub const U32_BE: Primitive = Primitive::unchecked(4, ByteOrder::Big, false);
    pub const I32_LE: Primitive = Primitive::unchecked(4, ByteOrder::Little, true);
    pub const U64_LE: Primitive = Primitive::unchecked(8, ByteOrder::Little, false);
    pub const U64_BE: Primitive = Primitive::unchecked(8, ByteOrder::Big, false);
    pub const I64_LE: Primitive = Primitive::unchecked(8, ByteOrder::Little, true);

    const fn unchecked(width: usize, order: ByteOrder, signed: bool) -> Self {
        Primitive {
            width,
            order,
            signed,
        }
    }

    /// Creates a primitive of `width` bytes. Fails unless `width` is 1, 2, 4 or 8.
    pub fn new(width: usize, order: ByteOrder, signed: bool) -> Result<Self, SchemaError> {
        match width {
            1 | 2 | 4 | 8 => Ok(Self::unchecked(width, order, signed)),
            _ => Err(SchemaError::InvalidPrimitiveWidth(width)),
        }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn order(&self) -> ByteOrder {
        self.order
    }

    pub fn signed(&self) -> bool {
        self.signed
    }
}

/// Shape of a field. Cheap to clone: composites share their [Layout].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TypeDescriptor {
    /// Single integer value.
    Primitive(Primitive),
    /// Fixed-size record with its own fields, pack alignment and anonymous set.
    Composite(Arc<Layout>),
    /// `count` back-to-back copies of `element`.
    Repeated {
        element: Box<TypeDescriptor>,
        count: usize,
    },
}

impl TypeDescriptor {
    /// Wraps a built layout as a composite field type.
    pub fn composite(layout: Layout) -> Self {
        TypeDescriptor::Composite(Arc::new(layout))
    }

    /// `count` elements of `element`. A count of zero is valid and occupies no bytes.
    pub fn array(element: impl Into<TypeDescriptor>, count: usize) -> Self {
        TypeDescriptor::Repeated {
            element: Box::new(element.into()),
            count,
        }
    }

    /// Number of bytes the type occupies, including trailing padding of composites.
    /// Saturates at `usize::MAX`; see [TypeDescriptor::checked_size].
    pub fn size(&self) -> usize {
        self.checked_size().unwrap_or(usize::MAX)
    }

    /// Size in bytes, or `None` when a repeat count makes it overflow `usize`.
    pub fn checked_size(&self) -> Option<usize> {
        match self {
            TypeDescriptor::Primitive(p) => Some(p.width),
            TypeDescriptor::Composite(layout) => Some(layout.size()),
            TypeDescriptor::Repeated { element, count } => {
                element.checked_size()?.checked_mul(*count)
            }
        }
    }

    /// Natural alignment before any pack limit is applied.
    pub fn alignment(&self) -> usize {
        match self {
            TypeDescriptor::Primitive(p) => p.width,
            TypeDescriptor::Composite(layout) => layout.alignment(),
            TypeDescriptor::Repeated { element, .. } => element.alignment(),
        }
    }

    /// The inner layout when this is a composite.
    pub fn as_layout(&self) -> Option<&Arc<Layout>> {
        match self {
            TypeDescriptor::Composite(layout) => Some(layout),
            _ => None,
        }
    }
}

impl From<Primitive> for TypeDescriptor {
    fn from(value: Primitive) -> Self {
        TypeDescriptor::Primitive(value)
    }
}

impl From<Layout> for TypeDescriptor {
    fn from(value: Layout) -> Self {
        TypeDescriptor::composite(value)
    }
}

#[cfg(feature = "serde")]
impl From<crate::serde::ByteOrderDef> for ByteOrder {
    fn from(value: crate::serde::ByteOrderDef) -> Self {
        match value {
            crate::serde::ByteOrderDef::Little => ByteOrder::Little,
            crate::serde::ByteOrderDef::Big => ByteOrder::Big,
        }
    }
}

#[cfg(feature = "serde")]
impl TryFrom<crate::serde::TypeDef> for TypeDescriptor {
    type Error = SchemaError;

    fn try_from(value: crate::serde::TypeDef) -> Result<Self, Self::Error> {
        match value {
            crate::serde::TypeDef::Primitive {
                width,
                order,
                signed,
            } => Ok(Primitive::new(width, order.into(), signed)?.into()),
            crate::serde::TypeDef::Composite {
                fields,
                pack,
                anonymous,
            } => {
                let fields = fields
                    .into_iter()
                    .map(|f| -> Result<(String, TypeDescriptor), SchemaError> {
                        match f.bits {
                            Some(bits) => Err(SchemaError::BitfieldUnsupported {
                                field: f.name,
                                bits,
                            }),
                            None => Ok((f.name, TypeDescriptor::try_from(f.ty)?)),
                        }
                    })
                    .collect::<Result<Vec<_>, _>>()?;
                let anonymous: Vec<&str> = anonymous.iter().map(String::as_str).collect();

                Ok(Layout::from_fields(fields, pack, &anonymous)?.into())
            }
            crate::serde::TypeDef::Repeated { element, count } => {
                Ok(TypeDescriptor::array(TypeDescriptor::try_from(*element)?, count))
            }
        }
    }
}
