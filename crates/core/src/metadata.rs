//! Document metadata carried in the leading comment block.
//!
//! ```text
//! /*
//! id: acme/widget
//! type: record
//! revision: 2
//! */
//! ```

use std::fmt;

use serde::Deserialize;

use crate::dts::strip_gutters;
use crate::error::{ParseError, ValidationError};

/// `domain/name` identifier of a document.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DocumentId {
    domain: String,
    name: String,
}

impl DocumentId {
    /// Parses `domain/name`; exactly one `/` with non-empty halves.
    pub fn parse(raw: &str) -> Result<Self, ValidationError> {
        let invalid = || ValidationError::InvalidId(Some(raw.to_string()));
        let (domain, name) = raw.split_once('/').ok_or_else(invalid)?;
        if domain.is_empty() || name.is_empty() || name.contains('/') {
            return Err(invalid());
        }
        Ok(Self {
            domain: domain.to_string(),
            name: name.to_string(),
        })
    }

    /// Part before the slash.
    pub fn domain(&self) -> &str {
        &self.domain
    }

    /// Part after the slash.
    pub fn name(&self) -> &str {
        &self.name
    }
}

impl fmt::Display for DocumentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.domain, self.name)
    }
}

/// What a document describes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentKind {
    /// RPC interface; produces a client and a server.
    Api,
    /// Database record; produces a table binding.
    Record,
}

impl DocumentKind {
    fn parse(raw: &str) -> Option<Self> {
        match raw {
            "api" => Some(Self::Api),
            "record" | "adb-record" => Some(Self::Record),
            _ => None,
        }
    }
}

/// Validated metadata.
#[derive(Debug, Clone, PartialEq)]
pub struct Metadata {
    /// `domain/name` identifier.
    pub id: DocumentId,
    /// What the document describes.
    pub kind: DocumentKind,
    /// Revision, normalized to a string.
    pub revision: Option<String>,
    /// Human-readable title.
    pub title: Option<String>,
    /// Record templates, embedded verbatim in generated record bindings.
    pub templates: Option<serde_json::Value>,
    /// `false` closes every object schema that has no index signature.
    pub additional_properties: Option<bool>,
}

impl Metadata {
    /// Extracts and validates the metadata block of `text`.
    pub fn from_text(text: &str) -> Result<Result<Self, ValidationError>, ParseError> {
        RawMetadata::from_text(text).map(RawMetadata::validate)
    }
}

/// Metadata as written, before validation. Unknown keys are ignored.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawMetadata {
    /// Raw `domain/name`.
    pub id: Option<String>,
    /// Raw `type`.
    #[serde(rename = "type")]
    pub kind: Option<String>,
    /// Raw `revision`.
    pub revision: Option<Scalar>,
    /// Raw `title`.
    pub title: Option<String>,
    /// Record templates.
    pub templates: Option<serde_json::Value>,
    /// Raw `additionalProperties`.
    pub additional_properties: Option<bool>,
}

/// YAML scalar accepted where a string is expected.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum Scalar {
    /// Plain string.
    Text(String),
    /// Integer, as in `revision: 3`.
    Integer(i64),
    /// Float, as in `revision: 1.2`.
    Float(f64),
    /// Boolean.
    Bool(bool),
}

impl fmt::Display for Scalar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Text(s) => f.write_str(s),
            Self::Integer(n) => write!(f, "{n}"),
            Self::Float(n) => write!(f, "{n}"),
            Self::Bool(b) => write!(f, "{b}"),
        }
    }
}

impl RawMetadata {
    /// Parses the leading block comment of `text` as YAML. A document with no
    /// leading block comment yields empty metadata.
    pub fn from_text(text: &str) -> Result<Self, ParseError> {
        let Some(body) = leading_block_comment(text) else {
            return Ok(Self::default());
        };
        let yaml = strip_gutters(body);
        if yaml.trim().is_empty() {
            return Ok(Self::default());
        }
        let raw: Option<Self> = serde_yaml::from_str(&yaml)?;
        Ok(raw.unwrap_or_default())
    }

    /// Whether `text` opens with a metadata block rather than a doc comment.
    pub fn is_present_in(text: &str) -> bool {
        Self::from_text(text).is_ok_and(|raw| raw.id.is_some() || raw.kind.is_some())
    }

    /// Checks required keys and normalizes values.
    pub fn validate(self) -> Result<Metadata, ValidationError> {
        let id = match self.id.as_deref() {
            Some(raw) => DocumentId::parse(raw)?,
            None => return Err(ValidationError::InvalidId(None)),
        };
        let kind = self
            .kind
            .as_deref()
            .and_then(DocumentKind::parse)
            .ok_or_else(|| ValidationError::InvalidDocumentType(self.kind.clone()))?;
        Ok(Metadata {
            id,
            kind,
            revision: self.revision.map(|r| r.to_string()),
            title: self.title,
            templates: self.templates,
            additional_properties: self.additional_properties,
        })
    }
}

/// Returns the body of the block comment that opens `text`, if any.
fn leading_block_comment(text: &str) -> Option<&str> {
    let rest = text.trim_start_matches('\u{feff}').trim_start();
    let rest = rest.strip_prefix("/*")?;
    let end = rest.find("*/")?;
    let body = &rest[..end];
    Some(body.strip_prefix('*').unwrap_or(body))
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_plain_block() {
        let meta = Metadata::from_text("/*\nid: acme/widget\ntype: record\n*/\ninterface A {}")
            .unwrap()
            .unwrap();
        assert_eq!(meta.id.to_string(), "acme/widget");
        assert_eq!(meta.id.domain(), "acme");
        assert_eq!(meta.kind, DocumentKind::Record);
        assert_eq!(meta.revision, None);
    }

    #[test]
    fn test_parse_gutter_block_with_extras() {
        let text = "/**\n * id: acme/chat\n * type: api\n * revision: 3\n * title: Chat\n * templates:\n *   table:\n *     title: Chats\n * unknownKey: ignored\n */";
        let meta = Metadata::from_text(text).unwrap().unwrap();
        assert_eq!(meta.kind, DocumentKind::Api);
        assert_eq!(meta.revision.as_deref(), Some("3"));
        assert_eq!(meta.title.as_deref(), Some("Chat"));
        assert_eq!(
            meta.templates.unwrap()["table"]["title"],
            serde_json::json!("Chats")
        );
    }

    #[test]
    fn test_adb_record_alias() {
        let meta = Metadata::from_text("/*\nid: a/b\ntype: adb-record\n*/")
            .unwrap()
            .unwrap();
        assert_eq!(meta.kind, DocumentKind::Record);
    }

    #[test]
    fn test_missing_and_invalid_values() {
        let missing = Metadata::from_text("interface A {}").unwrap().unwrap_err();
        assert!(matches!(missing, ValidationError::InvalidId(None)));

        let bad_id = Metadata::from_text("/*\nid: a/b/c\ntype: api\n*/").unwrap().unwrap_err();
        assert!(matches!(bad_id, ValidationError::InvalidId(Some(_))));

        let bad_type = Metadata::from_text("/*\nid: a/b\ntype: table\n*/").unwrap().unwrap_err();
        assert!(matches!(bad_type, ValidationError::InvalidDocumentType(Some(t)) if t == "table"));
    }

    #[test]
    fn test_malformed_yaml() {
        let err = Metadata::from_text("/*\nid: [unclosed\n*/").unwrap_err();
        assert!(matches!(err, ParseError::Metadata(_)));
    }

    #[test]
    fn test_document_id_rules() {
        assert!(DocumentId::parse("acme/widget").is_ok());
        assert!(DocumentId::parse("/widget").is_err());
        assert!(DocumentId::parse("acme/").is_err());
        assert!(DocumentId::parse("acme").is_err());
    }
}
