//! Field values materialized on read from a [Layout] and an owned copy of the bytes.

use std::sync::Arc;

use crate::{
    bytes::{read_uint, sign_extend},
    descriptor::TypeDescriptor,
    errors::{DecodeError, LookupError},
    layout::Layout,
};

/// A value read out of a [DecodedStruct].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Value {
    U64(u64),
    I64(i64),
    Array(Vec<Value>),
    Struct(DecodedStruct),
}

impl Value {
    pub fn as_u64(&self) -> Option<u64> {
        match self {
            Value::U64(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::I64(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_array(&self) -> Option<&[Value]> {
        match self {
            Value::Array(values) => Some(values),
            _ => None,
        }
    }

    pub fn as_struct(&self) -> Option<&DecodedStruct> {
        match self {
            Value::Struct(s) => Some(s),
            _ => None,
        }
    }
}

/// A layout filled from a buffer.
///
/// The backing storage is always exactly `layout.size()` bytes. When the source buffer is
/// shorter, the tail stays zeroed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedStruct {
    layout: Arc<Layout>,
    backing: Box<[u8]>,
}

impl DecodedStruct {
    /// Copies `min(buffer.len(), layout.size())` bytes from `buffer`. Never fails.
    pub fn fill(layout: impl Into<Arc<Layout>>, buffer: &[u8]) -> Self {
        let layout = layout.into();
        let mut backing = vec![0u8; layout.size()].into_boxed_slice();
        let n = buffer.len().min(backing.len());
        backing[..n].copy_from_slice(&buffer[..n]);

        DecodedStruct { layout, backing }
    }

    pub fn layout(&self) -> &Arc<Layout> {
        &self.layout
    }

    pub fn size(&self) -> usize {
        self.backing.len()
    }

    /// Reads the field named `name`, falling back to names promoted from anonymous fields.
    pub fn field(&self, name: &str) -> Result<Value, LookupError> {
        let loc = self
            .layout
            .locate(name)
            .ok_or_else(|| LookupError::FieldNotFound {
                name: name.to_string(),
            })?;

        let end = loc.offset + loc.descriptor.size();
        Ok(decode_value(loc.descriptor, &self.backing[loc.offset..end]))
    }

    /// Reads an unsigned integer field.
    pub fn get_u64(&self, name: &str) -> Result<u64, LookupError> {
        self.field(name)?
            .as_u64()
            .ok_or_else(|| LookupError::TypeMismatch {
                name: name.to_string(),
                expected: "an unsigned integer",
            })
    }

    /// Reads a signed integer field.
    pub fn get_i64(&self, name: &str) -> Result<i64, LookupError> {
        self.field(name)?
            .as_i64()
            .ok_or_else(|| LookupError::TypeMismatch {
                name: name.to_string(),
                expected: "a signed integer",
            })
    }

    /// Borrowed view of the backing bytes.
    pub fn raw_bytes(&self) -> &[u8] {
        &self.backing
    }

    /// Owned copy of the backing bytes.
    pub fn raw_bytes_copy(&self) -> Vec<u8> {
        self.backing.to_vec()
    }

    /// Own fields in declaration order.
    pub fn all_fields(&self) -> Vec<(&str, &TypeDescriptor)> {
        self.layout
            .fields()
            .iter()
            .map(|f| (f.name.as_str(), &f.descriptor))
            .collect()
    }

    /// Own fields with their decoded values, in declaration order.
    pub fn values(&self) -> Vec<(&str, Value)> {
        self.layout
            .fields()
            .iter()
            .map(|f| {
                let bytes = &self.backing[f.offset..f.end()];
                (f.name.as_str(), decode_value(&f.descriptor, bytes))
            })
            .collect()
    }

    /// See [Layout::with_updated_field_type].
    pub fn with_updated_field_type(
        &self,
        name: &str,
        descriptor: TypeDescriptor,
    ) -> Result<Layout, DecodeError> {
        self.layout.with_updated_field_type(name, descriptor)
    }
}

/// Decodes `bytes`, which must be exactly `descriptor.size()` long. Every descriptor in a
/// [Layout] has a size that fits in `usize`, so the element slicing below cannot overflow.
fn decode_value(descriptor: &TypeDescriptor, bytes: &[u8]) -> Value {
    match descriptor {
        TypeDescriptor::Primitive(p) => {
            let raw = read_uint(bytes, p.order());
            if p.signed() {
                Value::I64(sign_extend(raw, p.width() * 8))
            } else {
                Value::U64(raw)
            }
        }
        TypeDescriptor::Composite(layout) => {
            Value::Struct(DecodedStruct::fill(Arc::clone(layout), bytes))
        }
        TypeDescriptor::Repeated { element, count } => {
            let stride = element.size();
            let values = (0..*count)
                .map(|i| decode_value(element, &bytes[i * stride..(i + 1) * stride]))
                .collect();
            Value::Array(values)
        }
    }
}
