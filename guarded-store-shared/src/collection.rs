use std::fmt;

use serde::{Deserialize, Serialize};

/// A collection is an index paired with a document kind.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CollectionId {
    /// Index name.
    pub name: String,
    /// Document kind stored in the index.
    pub kind: String,
}

impl CollectionId {
    pub fn new(name: impl Into<String>, kind: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: kind.into(),
        }
    }
}

impl fmt::Display for CollectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.name, self.kind)
    }
}

/// Primitive field types accepted in a collection schema.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldType {
    Text,
    Keyword,
    Long,
    Integer,
    Short,
    Byte,
    Double,
    Float,
    HalfFloat,
    ScaledFloat,
    Date,
    Boolean,
    Ip,
}

impl FieldType {
    pub const ALL: [FieldType; 13] = [
        FieldType::Text,
        FieldType::Keyword,
        FieldType::Long,
        FieldType::Integer,
        FieldType::Short,
        FieldType::Byte,
        FieldType::Double,
        FieldType::Float,
        FieldType::HalfFloat,
        FieldType::ScaledFloat,
        FieldType::Date,
        FieldType::Boolean,
        FieldType::Ip,
    ];

    /// The mapping name the search engine uses for this type.
    pub fn as_str(&self) -> &'static str {
        match self {
            FieldType::Text => "text",
            FieldType::Keyword => "keyword",
            FieldType::Long => "long",
            FieldType::Integer => "integer",
            FieldType::Short => "short",
            FieldType::Byte => "byte",
            FieldType::Double => "double",
            FieldType::Float => "float",
            FieldType::HalfFloat => "half_float",
            FieldType::ScaledFloat => "scaled_float",
            FieldType::Date => "date",
            FieldType::Boolean => "boolean",
            FieldType::Ip => "ip",
        }
    }

    /// Look up a type by its mapping name. Returns `None` for anything outside
    /// the recognised set.
    pub fn parse(name: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|t| t.as_str() == name)
    }
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_recognised_types() {
        for field_type in FieldType::ALL {
            assert_eq!(FieldType::parse(field_type.as_str()), Some(field_type));
        }
    }

    #[test]
    fn test_parse_rejects_unknown_types() {
        assert_eq!(FieldType::parse("geo_point"), None);
        assert_eq!(FieldType::parse("Text"), None);
        assert_eq!(FieldType::parse(""), None);
    }

    #[test]
    fn test_serde_uses_mapping_names() {
        let json = serde_json::to_string(&FieldType::HalfFloat).unwrap();
        assert_eq!(json, "\"half_float\"");
    }

    #[test]
    fn test_collection_display() {
        let collection = CollectionId::new("people", "person_info");
        assert_eq!(collection.to_string(), "people/person_info");
    }
}
