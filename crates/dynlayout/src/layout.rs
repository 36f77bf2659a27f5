//! Flattened, offset-addressed description of a structure's fields.
//!
//! Fields are appended in declaration order. Each offset is the previous field's end
//! rounded up to `min(pack, natural alignment)`; the total size is the last end rounded
//! up to the layout's own alignment (the largest effective field alignment).

use crate::{
    bytes::{align_up, checked_align_up},
    descriptor::TypeDescriptor,
    errors::{DecodeError, LookupError, SchemaError},
};

/// One placed field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LayoutField {
    pub name: String,
    pub descriptor: TypeDescriptor,
    /// Byte offset from the start of the enclosing layout.
    pub offset: usize,
    /// Declared anonymous. Only composite fields actually promote their names.
    pub anonymous: bool,
}

impl LayoutField {
    /// Inner layout whose names are reachable from the enclosing layout, if any.
    pub fn promoted(&self) -> Option<&Layout> {
        if self.anonymous {
            self.descriptor.as_layout().map(|layout| layout.as_ref())
        } else {
            None
        }
    }

    pub fn end(&self) -> usize {
        self.offset.saturating_add(self.descriptor.size())
    }
}

/// Result of resolving a (possibly promoted) name against a [Layout].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldLocation<'a> {
    /// Anonymous field of this layout that owns the name, or `None` for an own field.
    pub owner: Option<&'a str>,
    /// Byte offset from the start of `owner`. Equals `offset` for an own field.
    pub inner_offset: usize,
    /// Absolute byte offset within this layout.
    pub offset: usize,
    pub descriptor: &'a TypeDescriptor,
}

/// Ordered fields plus pack alignment and resulting size.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Layout {
    fields: Vec<LayoutField>,
    pack: usize,
    end: usize,
    align: usize,
}

impl Layout {
    /// Empty layout with the given pack alignment (a power of two).
    pub fn new(pack: usize) -> Result<Self, SchemaError> {
        if !pack.is_power_of_two() {
            return Err(SchemaError::InvalidPackAlignment(pack));
        }

        Ok(Layout {
            fields: Vec::new(),
            pack,
            end: 0,
            align: 1,
        })
    }

    /// Builds a layout of fixed fields. Names listed in `anonymous` are promoted when
    /// their field is a composite; unknown names are ignored.
    pub fn from_fields(
        fields: Vec<(String, TypeDescriptor)>,
        pack: usize,
        anonymous: &[&str],
    ) -> Result<Self, SchemaError> {
        let mut layout = Layout::new(pack)?;

        for (name, descriptor) in fields {
            let is_anonymous = anonymous.contains(&name.as_str());
            layout.push(name, descriptor, is_anonymous)?;
        }

        Ok(layout)
    }

    /// Offset a field of type `descriptor` would get if appended now.
    /// Saturates at `usize::MAX`.
    pub fn next_offset(&self, descriptor: &TypeDescriptor) -> usize {
        checked_align_up(self.end, self.effective_alignment(descriptor)).unwrap_or(usize::MAX)
    }

    /// Appends a field per the packing rule and returns its offset.
    ///
    /// Fails without modifying the layout when the field's end, or the padded total size,
    /// would overflow `usize`.
    pub(crate) fn push(
        &mut self,
        name: String,
        descriptor: TypeDescriptor,
        anonymous: bool,
    ) -> Result<usize, SchemaError> {
        let align = self.effective_alignment(&descriptor);
        let layout_align = self.align.max(align);

        let placed = checked_align_up(self.end, align).and_then(|offset| {
            let end = offset.checked_add(descriptor.checked_size()?)?;
            checked_align_up(end, layout_align)?;
            Some((offset, end))
        });
        let Some((offset, end)) = placed else {
            return Err(SchemaError::SizeOverflow { field: name });
        };

        self.end = end;
        self.align = layout_align;
        self.fields.push(LayoutField {
            name,
            descriptor,
            offset,
            anonymous,
        });

        Ok(offset)
    }

    fn effective_alignment(&self, descriptor: &TypeDescriptor) -> usize {
        descriptor.alignment().clamp(1, self.pack)
    }

    /// Own fields in declaration order.
    pub fn fields(&self) -> &[LayoutField] {
        &self.fields
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn pack(&self) -> usize {
        self.pack
    }

    pub fn alignment(&self) -> usize {
        self.align
    }

    /// End of the last field, without trailing padding.
    pub fn end(&self) -> usize {
        self.end
    }

    /// Total size including trailing padding.
    pub fn size(&self) -> usize {
        align_up(self.end, self.align)
    }

    /// First own field named `name`.
    pub fn field(&self, name: &str) -> Option<&LayoutField> {
        self.fields.iter().find(|f| f.name == name)
    }

    /// Resolves `name` to an offset and type.
    ///
    /// Own fields are checked first, in declaration order. Then each anonymous composite
    /// child is searched in declaration order (recursively through its own anonymous
    /// children). The first match wins.
    pub fn locate(&self, name: &str) -> Option<FieldLocation<'_>> {
        if let Some(field) = self.field(name) {
            return Some(FieldLocation {
                owner: None,
                inner_offset: field.offset,
                offset: field.offset,
                descriptor: &field.descriptor,
            });
        }

        self.fields.iter().find_map(|field| {
            let inner = field.promoted()?.locate(name)?;
            Some(FieldLocation {
                owner: Some(field.name.as_str()),
                inner_offset: inner.offset,
                offset: field.offset + inner.offset,
                descriptor: inner.descriptor,
            })
        })
    }

    /// Returns a copy with `name`'s type replaced and every later offset recomputed.
    ///
    /// Fails with [LookupError::FieldNotFound] for an unknown name, or with
    /// [SchemaError::SizeOverflow] when the new type no longer fits.
    pub fn with_updated_field_type(
        &self,
        name: &str,
        descriptor: TypeDescriptor,
    ) -> Result<Layout, DecodeError> {
        let target = self
            .fields
            .iter()
            .position(|f| f.name == name)
            .ok_or_else(|| LookupError::FieldNotFound {
                name: name.to_string(),
            })?;

        let mut updated = Layout {
            fields: Vec::with_capacity(self.fields.len()),
            pack: self.pack,
            end: 0,
            align: 1,
        };

        for (i, field) in self.fields.iter().enumerate() {
            let ty = if i == target {
                descriptor.clone()
            } else {
                field.descriptor.clone()
            };
            updated.push(field.name.clone(), ty, field.anonymous)?;
        }

        Ok(updated)
    }
}
