//! Schema: ordered field specs resolved against a buffer into a [Layout].

use log::trace;

use crate::{
    decoded::DecodedStruct,
    descriptor::TypeDescriptor,
    errors::{BufferError, DecodeError, SchemaError},
    field::{FieldKind, FieldSpec, Resolver},
    layout::Layout,
};

/// An ordered set of [FieldSpec]s plus the pack alignment and anonymous names used to
/// lay them out. Use [Schema::layout] to resolve against a buffer, or [Schema::decode]
/// to resolve and fill in one step.
#[derive(Debug, Clone)]
pub struct Schema {
    fields: Vec<FieldSpec>,
    pack: usize,
    anonymous: Vec<String>,
}

impl Schema {
    /// Schema with pack alignment 1 and no anonymous fields.
    pub fn new(fields: Vec<FieldSpec>) -> Self {
        Schema {
            fields,
            pack: 1,
            anonymous: Vec::new(),
        }
    }

    pub fn with_pack(mut self, pack: usize) -> Self {
        self.pack = pack;
        self
    }

    /// Names whose composite fields have their inner names promoted.
    pub fn with_anonymous<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.anonymous = names.into_iter().map(Into::into).collect();
        self
    }

    pub fn fields(&self) -> &[FieldSpec] {
        &self.fields
    }

    pub fn pack(&self) -> usize {
        self.pack
    }

    pub fn anonymous(&self) -> &[String] {
        &self.anonymous
    }

    /// Resolves every field against `buffer` into a [Layout].
    pub fn layout(&self, buffer: &[u8]) -> Result<Layout, DecodeError> {
        resolve(&self.fields, buffer, self.pack, self.anonymous.as_slice())
    }

    /// Resolves the layout and fills it from `buffer`.
    pub fn decode(&self, buffer: &[u8]) -> Result<DecodedStruct, DecodeError> {
        let layout = self.layout(buffer)?;
        Ok(DecodedStruct::fill(layout, buffer))
    }
}

#[cfg(feature = "serde")]
impl TryFrom<crate::serde::SchemaDef> for Schema {
    type Error = SchemaError;

    fn try_from(value: crate::serde::SchemaDef) -> Result<Self, Self::Error> {
        let fields = value
            .fields
            .into_iter()
            .map(|f| -> Result<FieldSpec, SchemaError> {
                let ty = TypeDescriptor::try_from(f.ty)?;
                Ok(match f.bits {
                    Some(bits) => FieldSpec::bitfield(f.name, ty, bits),
                    None => FieldSpec::fixed(f.name, ty),
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Schema::new(fields)
            .with_pack(value.pack)
            .with_anonymous(value.anonymous))
    }
}

/// Walks `fields` in order, placing each one per the packing rule.
///
/// Fixed fields are appended without looking at the buffer. For a resolved field the
/// prefix decoded so far and the bytes after it are handed to the resolver, and the
/// returned type must fit in what remains. Bitfields are rejected before the buffer is
/// touched.
pub(crate) fn resolve<S: AsRef<str>>(
    fields: &[FieldSpec],
    buffer: &[u8],
    pack: usize,
    anonymous: &[S],
) -> Result<Layout, DecodeError> {
    if let Some(err) = fields.iter().find_map(bitfield_error) {
        return Err(err.into());
    }

    let mut layout = Layout::new(pack)?;

    for spec in fields {
        let descriptor = match &spec.kind {
            FieldKind::Fixed(ty) => ty.clone(),
            FieldKind::Resolved(resolver) => {
                resolve_field(&layout, &spec.name, resolver, buffer)?
            }
            FieldKind::Bitfield { bits, .. } => {
                return Err(SchemaError::BitfieldUnsupported {
                    field: spec.name.clone(),
                    bits: *bits,
                }
                .into());
            }
        };

        let is_anonymous = anonymous.iter().any(|a| a.as_ref() == spec.name);
        let size = descriptor.size();
        let offset = layout.push(spec.name.clone(), descriptor, is_anonymous)?;

        trace!("placed field `{}` at offset {} ({} bytes)", spec.name, offset, size);
    }

    Ok(layout)
}

fn bitfield_error(spec: &FieldSpec) -> Option<SchemaError> {
    match spec.kind {
        FieldKind::Bitfield { bits, .. } => Some(SchemaError::BitfieldUnsupported {
            field: spec.name.clone(),
            bits,
        }),
        _ => None,
    }
}

fn resolve_field(
    layout: &Layout,
    name: &str,
    resolver: &Resolver,
    buffer: &[u8],
) -> Result<TypeDescriptor, DecodeError> {
    let consumed = layout.end();
    let remaining = buffer.get(consumed..).unwrap_or_default();

    if remaining.is_empty() {
        return Err(BufferError::BufferSizeInsufficient {
            field: name.to_string(),
            needed: 1,
            available: 0,
        }
        .into());
    }

    let prefix = DecodedStruct::fill(layout.clone(), &buffer[..consumed]);
    let descriptor = resolver(&prefix, remaining)?;

    let Some(size) = descriptor.checked_size() else {
        return Err(SchemaError::SizeOverflow {
            field: name.to_string(),
        }
        .into());
    };

    // padding in front of the field is taken from the remaining bytes too
    let needed = (layout.next_offset(&descriptor) - consumed).saturating_add(size);
    if remaining.len() < needed {
        return Err(BufferError::BufferSizeInsufficient {
            field: name.to_string(),
            needed,
            available: remaining.len(),
        }
        .into());
    }

    trace!("resolved field `{}` to {} bytes", name, size);
    Ok(descriptor)
}
