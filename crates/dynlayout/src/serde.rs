//! JSON‑deserializable schema description.
//!
//! These types describe fixed record shapes (primitives, composites, repeated elements)
//! so they can ship as configuration files and be converted into a [crate::schema::Schema]
//! or [crate::descriptor::TypeDescriptor]. Resolved fields are code and cannot be
//! expressed here; append them to the converted schema's fields instead.
//!
//! Decoded values also implement `Serialize`, so a [crate::decoded::DecodedStruct] can be
//! dumped as a JSON object keyed by its own field names.

use serde::{Deserialize, Serialize, Serializer, ser::SerializeMap, ser::SerializeSeq};

use crate::decoded::{DecodedStruct, Value};

fn default_pack() -> usize {
    1
}

/// Byte order of a multi‑byte primitive.
#[derive(Debug, Deserialize, Serialize, Default, Clone, Copy, PartialEq, Eq)]
pub enum ByteOrderDef {
    #[default]
    Little,
    Big,
}

/// Top‑level schema definition.
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct SchemaDef {
    /// Fields in declaration order.
    pub fields: Vec<FieldDef>,
    /// Pack alignment; defaults to 1.
    #[serde(default = "default_pack")]
    pub pack: usize,
    /// Names of composite fields whose inner names are promoted.
    #[serde(default)]
    pub anonymous: Vec<String>,
}

/// Description of a single field.
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct FieldDef {
    pub name: String,
    #[serde(rename = "type")]
    pub ty: TypeDef,
    /// Sub‑byte width. Accepted by the parser so it can be rejected with a clear error.
    #[serde(default)]
    pub bits: Option<u32>,
}

/// Shape of a field.
#[derive(Debug, Deserialize, Serialize, Clone)]
#[serde(tag = "kind")]
pub enum TypeDef {
    /// Whole‑byte integer of 1, 2, 4 or 8 bytes.
    Primitive {
        width: usize,
        #[serde(default)]
        order: ByteOrderDef,
        #[serde(default)]
        signed: bool,
    },
    /// Nested fixed record.
    Composite {
        fields: Vec<FieldDef>,
        #[serde(default = "default_pack")]
        pack: usize,
        #[serde(default)]
        anonymous: Vec<String>,
    },
    /// `count` copies of `element`.
    Repeated { element: Box<TypeDef>, count: usize },
}

impl Serialize for Value {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Value::U64(v) => serializer.serialize_u64(*v),
            Value::I64(v) => serializer.serialize_i64(*v),
            Value::Array(values) => {
                let mut seq = serializer.serialize_seq(Some(values.len()))?;
                for v in values {
                    seq.serialize_element(v)?;
                }
                seq.end()
            }
            Value::Struct(s) => s.serialize(serializer),
        }
    }
}

impl Serialize for DecodedStruct {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let values = self.values();
        let mut map = serializer.serialize_map(Some(values.len()))?;
        for (name, value) in &values {
            map.serialize_entry(name, value)?;
        }
        map.end()
    }
}
