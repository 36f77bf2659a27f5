//! Arrays of variable records laid back to back in a buffer.

use std::{fmt, sync::Arc};

use log::debug;

use crate::{
    decoded::DecodedStruct,
    descriptor::TypeDescriptor,
    errors::{BufferError, DecodeError, LookupError},
    field::FieldSpec,
    layout::Layout,
    schema::resolve,
};

/// Field name used when a selector picks a non-composite element type.
pub const ELEMENT_VALUE_FIELD: &str = "value";

/// Outcome of a [Selector] for the next element.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Selection {
    /// Decode one element of this type.
    Continue(TypeDescriptor),
    /// No more elements. Not an error.
    Stop,
}

/// Chooses the next element's type from the remaining buffer window.
pub type Selector = Arc<dyn Fn(&[u8]) -> Selection + Send + Sync>;

/// How each element of an array is described.
#[derive(Clone)]
pub enum ElementSpec {
    /// The same schema, re-resolved against every element's window.
    Fields(Vec<FieldSpec>),
    /// A per-element choice that may also end the array.
    Selector(Selector),
}

impl ElementSpec {
    pub fn selector<F>(select: F) -> Self
    where
        F: Fn(&[u8]) -> Selection + Send + Sync + 'static,
    {
        ElementSpec::Selector(Arc::new(select))
    }
}

impl From<Vec<FieldSpec>> for ElementSpec {
    fn from(value: Vec<FieldSpec>) -> Self {
        ElementSpec::Fields(value)
    }
}

impl fmt::Debug for ElementSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ElementSpec::Fields(fields) => f.debug_tuple("Fields").field(fields).finish(),
            ElementSpec::Selector(_) => f.write_str("Selector(..)"),
        }
    }
}

/// Decoded elements with their start offsets in the source buffer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArrayLayout {
    elements: Vec<DecodedStruct>,
    offsets: Vec<usize>,
    max_count: usize,
}

impl ArrayLayout {
    /// Number of elements produced; at most `max_count`.
    pub fn len(&self) -> usize {
        self.elements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    pub fn max_count(&self) -> usize {
        self.max_count
    }

    pub fn get(&self, index: usize) -> Option<&DecodedStruct> {
        self.elements.get(index)
    }

    /// Bounds-checked element access.
    pub fn get_element(&self, index: usize) -> Result<&DecodedStruct, LookupError> {
        self.elements
            .get(index)
            .ok_or(LookupError::IndexOutOfBounds {
                index,
                produced_count: self.elements.len(),
            })
    }

    /// Start offset of element `index` in the decoded buffer.
    pub fn element_offset(&self, index: usize) -> Option<usize> {
        self.offsets.get(index).copied()
    }

    /// Total bytes covered by all elements.
    pub fn size(&self) -> usize {
        self.elements.iter().map(DecodedStruct::size).sum()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, DecodedStruct> {
        self.elements.iter()
    }
}

impl<'a> IntoIterator for &'a ArrayLayout {
    type Item = &'a DecodedStruct;
    type IntoIter = std::slice::Iter<'a, DecodedStruct>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// Decodes up to `max_count` elements from the start of `buffer`.
///
/// Each element is resolved against the window that starts where the previous element
/// ended. A selector returning [Selection::Stop] ends the array early. A selected type
/// larger than its window fails with [BufferError::BufferSizeInsufficient].
///
/// A field list is filled like [crate::decode_struct]: only its resolved fields must fit,
/// and missing trailing bytes are zeroed.
pub fn decode_array(
    buffer: &[u8],
    spec: &ElementSpec,
    max_count: usize,
    pack: usize,
) -> Result<ArrayLayout, DecodeError> {
    // rejects a bad pack even when the selector stops immediately
    Layout::new(pack)?;

    let no_anonymous: &[&str] = &[];
    let mut elements = Vec::new();
    let mut offsets = Vec::new();
    let mut offset = 0;

    for i in 0..max_count {
        let window = buffer.get(offset..).unwrap_or_default();

        let layout = match spec {
            ElementSpec::Fields(fields) => Arc::new(resolve(fields, window, pack, no_anonymous)?),
            ElementSpec::Selector(select) => match select(window) {
                Selection::Continue(ty) => {
                    let layout = element_layout(ty, pack)?;
                    if window.len() < layout.size() {
                        return Err(BufferError::BufferSizeInsufficient {
                            field: format!("[{i}]"),
                            needed: layout.size(),
                            available: window.len(),
                        }
                        .into());
                    }
                    layout
                }
                Selection::Stop => {
                    debug!("selector stopped array after {} of {} elements", i, max_count);
                    break;
                }
            },
        };

        let size = layout.size();
        elements.push(DecodedStruct::fill(layout, window));
        offsets.push(offset);
        offset = offset.saturating_add(size);
    }

    debug!("decoded {} array elements covering {} bytes", elements.len(), offset);

    Ok(ArrayLayout {
        elements,
        offsets,
        max_count,
    })
}

fn element_layout(ty: TypeDescriptor, pack: usize) -> Result<Arc<Layout>, DecodeError> {
    match ty {
        TypeDescriptor::Composite(layout) => Ok(layout),
        other => Ok(Arc::new(Layout::from_fields(
            vec![(ELEMENT_VALUE_FIELD.to_string(), other)],
            pack,
            &[],
        )?)),
    }
}

#[cfg(test)]
mod tests {
    use crate::{decode_struct, decoded::Value, descriptor::Primitive, errors::SchemaError};

    use super::*;

    fn counting_buffer() -> Vec<u8> {
        (0..=254).collect()
    }

    #[test]
    fn test_fixed_fields_array() {
        let buffer = counting_buffer();
        let spec = ElementSpec::from(vec![
            FieldSpec::fixed("A", Primitive::U8),
            FieldSpec::fixed("B", Primitive::U8),
        ]);
        let array = decode_array(&buffer, &spec, 3, 1).unwrap();

        assert_eq!(array.len(), 3);
        assert_eq!(array.size(), 6);
        for i in 0..3 {
            let element = array.get_element(i).unwrap();
            assert_eq!(element.get_u64("A").unwrap(), 2 * i as u64);
            assert_eq!(element.get_u64("B").unwrap(), 2 * i as u64 + 1);
            assert_eq!(array.element_offset(i), Some(2 * i));
        }

        assert_eq!(
            array.get_element(3).unwrap_err(),
            LookupError::IndexOutOfBounds {
                index: 3,
                produced_count: 3
            }
        );
        assert!(array.get_element(usize::MAX).is_err());
    }

    #[test]
    fn test_dynamic_fields_array() {
        let buffer = counting_buffer();
        let spec = ElementSpec::from(vec![
            FieldSpec::fixed("NumElements", Primitive::U8),
            FieldSpec::resolved("Array", |prefix, _| {
                Ok(TypeDescriptor::array(
                    Primitive::U8,
                    prefix.get_u64("NumElements")? as usize,
                ))
            }),
        ]);
        let array = decode_array(&buffer, &spec, 3, 1).unwrap();

        assert_eq!(array.len(), 3);
        assert_eq!(array.get_element(0).unwrap().get_u64("NumElements").unwrap(), 0);
        assert_eq!(
            array.get_element(0).unwrap().field("Array").unwrap(),
            Value::Array(vec![])
        );
        assert_eq!(
            array.get_element(1).unwrap().field("Array").unwrap(),
            Value::Array(vec![Value::U64(2)])
        );
        assert_eq!(array.get_element(2).unwrap().get_u64("NumElements").unwrap(), 3);
        assert_eq!(
            array.get_element(2).unwrap().field("Array").unwrap(),
            Value::Array(vec![Value::U64(4), Value::U64(5), Value::U64(6)])
        );
        assert_eq!(array.element_offset(2), Some(3));
    }

    fn pick_by_tag(window: &[u8]) -> Selection {
        let fields = match window.first() {
            Some(0) => vec![("Field0".to_string(), Primitive::U8.into())],
            Some(1) => vec![("Field1".to_string(), Primitive::U16_LE.into())],
            _ => return Selection::Stop,
        };

        match Layout::from_fields(fields, 1, &[]) {
            Ok(layout) => Selection::Continue(layout.into()),
            Err(_) => Selection::Stop,
        }
    }

    #[test]
    fn test_selector_stops_early() {
        let buffer = counting_buffer();
        let array = decode_array(&buffer, &ElementSpec::selector(pick_by_tag), 3, 1).unwrap();

        assert_eq!(array.len(), 2);
        assert_eq!(array.max_count(), 3);
        assert_eq!(array.get_element(0).unwrap().get_u64("Field0").unwrap(), 0);
        assert_eq!(array.get_element(1).unwrap().get_u64("Field1").unwrap(), 0x0201);
        assert_eq!(
            array.get_element(2).unwrap_err(),
            LookupError::IndexOutOfBounds {
                index: 2,
                produced_count: 2
            }
        );
    }

    #[test]
    fn test_selector_starvation_is_an_error() {
        let spec = ElementSpec::selector(|_| Selection::Continue(Primitive::U32_LE.into()));
        let err = decode_array(&[1, 0, 0, 0, 2, 0], &spec, 5, 1).unwrap_err();

        assert_eq!(
            err,
            DecodeError::Buffer(BufferError::BufferSizeInsufficient {
                field: "[1]".to_string(),
                needed: 4,
                available: 2,
            })
        );
    }

    #[test]
    fn test_selector_primitive_is_wrapped() {
        let spec = ElementSpec::selector(|window| match window.first() {
            Some(&b) if b != 0 => Selection::Continue(Primitive::U8.into()),
            _ => Selection::Stop,
        });
        let array = decode_array(&[4, 5, 6, 0, 9], &spec, 10, 1).unwrap();

        assert_eq!(array.len(), 3);
        let values: Vec<u64> = array
            .iter()
            .map(|e| e.get_u64(ELEMENT_VALUE_FIELD).unwrap())
            .collect();
        assert_eq!(values, vec![4, 5, 6]);
    }

    #[test]
    fn test_fields_starvation_propagates() {
        let spec = ElementSpec::from(vec![
            FieldSpec::fixed("n", Primitive::U8),
            FieldSpec::resolved("data", |prefix, _| {
                Ok(TypeDescriptor::array(Primitive::U8, prefix.get_u64("n")? as usize))
            }),
        ]);
        let err = decode_array(&[1, 7, 4, 1], &spec, 3, 1).unwrap_err();

        assert_eq!(
            err,
            DecodeError::Buffer(BufferError::BufferSizeInsufficient {
                field: "data".to_string(),
                needed: 4,
                available: 1,
            })
        );
    }

    #[test]
    fn test_fields_truncated_trailing_padding_matches_struct() {
        let fields = vec![
            FieldSpec::fixed("A", Primitive::U32_LE),
            FieldSpec::fixed("B", Primitive::U8),
        ];
        let buffer = [1, 0, 0, 0, 2];

        let single = decode_struct(&fields, &buffer, 4, &[]).unwrap();
        let array = decode_array(&buffer, &ElementSpec::from(fields), 1, 4).unwrap();
        let element = array.get_element(0).unwrap();

        assert_eq!(element, &single);
        assert_eq!(element.get_u64("B").unwrap(), 2);
        assert_eq!(element.raw_bytes(), &[1, 0, 0, 0, 2, 0, 0, 0]);
    }

    #[test]
    fn test_selector_hostile_count_is_an_error() {
        let spec = ElementSpec::selector(|_| {
            Selection::Continue(TypeDescriptor::array(Primitive::U32_LE, 1 << 62))
        });

        assert_eq!(
            decode_array(&[1, 2, 3, 4], &spec, 1, 1).unwrap_err(),
            DecodeError::Schema(SchemaError::SizeOverflow {
                field: ELEMENT_VALUE_FIELD.to_string(),
            })
        );
    }

    #[test]
    fn test_zero_max_count() {
        let spec = ElementSpec::selector(|_| panic!("selector must not run"));
        let array = decode_array(&[1, 2, 3], &spec, 0, 1).unwrap();

        assert!(array.is_empty());
        assert_eq!(array.size(), 0);
    }

    #[test]
    fn test_invalid_pack() {
        let spec = ElementSpec::selector(|_| Selection::Stop);
        assert_eq!(
            decode_array(&[], &spec, 1, 0).unwrap_err(),
            DecodeError::Schema(SchemaError::InvalidPackAlignment(0))
        );
    }
}
