//! Shared types for the extraction engine
//!
//! Templates and field definitions mirror the camelCase JSON shape the
//! extension keeps in storage, so they deserialize straight from it.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;

/// Semantic field types the classifier can assign.
///
/// The declaration order of the concrete types is the classifier's
/// tie-break order: when two types score the same confidence, the one
/// listed first wins.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldType {
    Email,
    Phone,
    Address,
    Company,
    Website,
    Name,
    Title,
    Linkedin,
    Unknown,
    #[serde(rename = "free-text")]
    FreeText,
}

impl FieldType {
    pub fn as_str(&self) -> &'static str {
        match self {
            FieldType::Email => "email",
            FieldType::Phone => "phone",
            FieldType::Address => "address",
            FieldType::Company => "company",
            FieldType::Website => "website",
            FieldType::Name => "name",
            FieldType::Title => "title",
            FieldType::Linkedin => "linkedin",
            FieldType::Unknown => "unknown",
            FieldType::FreeText => "free-text",
        }
    }
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Result of classifying a piece of text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Classification {
    #[serde(rename = "type")]
    pub field_type: FieldType,
    /// Heuristic certainty, always in 0..=99.
    pub confidence: u8,
}

impl Classification {
    pub const UNKNOWN: Classification = Classification {
        field_type: FieldType::Unknown,
        confidence: 0,
    };
}

fn default_true() -> bool {
    true
}

/// One field of a template: a user-chosen output name, a semantic type,
/// and an optional trained selector.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldDefinition {
    pub name: String,
    #[serde(rename = "type")]
    pub field_type: FieldType,
    #[serde(default)]
    pub selector: Option<String>,
    /// Confidence stamped on values extracted for this field; 80 when unset.
    #[serde(default)]
    pub confidence: Option<u8>,
    /// Allow the type-targeted fallback search when the selector finds nothing.
    #[serde(default = "default_true")]
    pub auto_fallback: bool,
}

/// An ordered set of field definitions plus an optional record-container
/// selector, describing how to extract leads from a class of pages.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Template {
    #[serde(default)]
    pub name: Option<String>,
    pub fields: Vec<FieldDefinition>,
    #[serde(default)]
    pub record_selector: Option<String>,
}

/// One extracted lead: field name → value, a `<name>_confidence`
/// companion per filled field, and a fixed `_source` key holding the
/// page address.
pub type LeadRecord = Map<String, Value>;

#[derive(Debug, Error)]
pub enum EngineError {
    /// The element is the document body itself, or not attached under one.
    #[error("invalid element: {0}")]
    InvalidElement(&'static str),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_template_deserializes_from_storage_json() {
        let template: Template = serde_json::from_str(
            r#"{
                "name": "directory",
                "recordSelector": "div.result-card",
                "fields": [
                    { "name": "email", "type": "email", "selector": "a.contact" },
                    { "name": "bio", "type": "free-text", "autoFallback": false }
                ]
            }"#,
        )
        .unwrap();

        assert_eq!(template.record_selector.as_deref(), Some("div.result-card"));
        assert_eq!(template.fields.len(), 2);
        assert_eq!(template.fields[0].field_type, FieldType::Email);
        // autoFallback defaults on when omitted
        assert!(template.fields[0].auto_fallback);
        assert!(!template.fields[1].auto_fallback);
        assert_eq!(template.fields[1].field_type, FieldType::FreeText);
    }
}
