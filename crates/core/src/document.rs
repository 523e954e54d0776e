//! A parsed declaration document: metadata plus declaration tree.

use tracing::debug;

use crate::dts::{DeclId, DeclTree, Declaration, Interface, parse_declarations_after_metadata};
use crate::error::{Error, ValidationError};
use crate::metadata::{DocumentKind, Metadata, RawMetadata};

/// Parsed and validated document.
#[derive(Debug, Clone)]
pub struct Document {
    /// Validated metadata block.
    pub metadata: Metadata,
    /// Declarations, with references resolved once the document has been through resolution.
    pub tree: DeclTree,
    /// The `export default interface`.
    pub primary: DeclId,
}

impl Document {
    /// The primary declaration.
    pub fn primary(&self) -> Option<&Declaration> {
        self.tree.get(self.primary)
    }

    /// The primary declaration's interface body.
    pub fn primary_interface(&self) -> Option<&Interface> {
        self.primary().and_then(Declaration::as_interface)
    }

    /// Name of the primary declaration.
    pub fn primary_name(&self) -> &str {
        self.primary().map_or("", |decl| decl.name.as_str())
    }

    /// Kind declared in the metadata.
    pub fn kind(&self) -> DocumentKind {
        self.metadata.kind
    }
}

/// Parses document text: metadata block, declarations, and the primary
/// interface.
///
/// Errors name the document id when the metadata got far enough to have one,
/// and `<unknown>` otherwise.
pub fn parse_document(text: &str) -> Result<Document, Error> {
    let raw = RawMetadata::from_text(text).map_err(|source| Error::parse(UNKNOWN, source))?;
    let label = raw.id.clone().unwrap_or_else(|| UNKNOWN.to_string());
    let metadata = raw
        .validate()
        .map_err(|source| Error::validation(&label, source))?;
    let document_id = metadata.id.to_string();

    let tree = parse_declarations_after_metadata(text)
        .map_err(|source| Error::parse(&document_id, source))?;
    let defaults = tree.default_interfaces();
    let primary = match defaults.as_slice() {
        [primary] => *primary,
        [] => return Err(Error::validation(&document_id, ValidationError::MissingPrimary)),
        _ => {
            let names = defaults
                .iter()
                .filter_map(|id| tree.get(*id))
                .map(|decl| decl.name.clone())
                .collect();
            return Err(Error::validation(
                &document_id,
                ValidationError::DuplicatePrimary { names },
            ));
        }
    };

    debug!(
        document = %document_id,
        declarations = tree.len(),
        imports = tree.imports().len(),
        "Parsed document."
    );
    Ok(Document {
        metadata,
        tree,
        primary,
    })
}

/// Label for errors raised before the document id is known.
pub(crate) const UNKNOWN: &str = "<unknown>";

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_document_finds_primary() {
        let doc = parse_document(
            "/*\nid: acme/widget\ntype: record\n*/\nexport default interface Widget { name: string }\ninterface Other {}",
        )
        .unwrap();
        assert_eq!(doc.primary_name(), "Widget");
        assert_eq!(doc.kind(), DocumentKind::Record);
        assert_eq!(doc.primary_interface().unwrap().properties.len(), 1);
    }

    #[test]
    fn test_missing_primary() {
        let err = parse_document("/*\nid: acme/widget\ntype: record\n*/\ninterface Widget {}")
            .unwrap_err();
        assert_eq!(err.document(), "acme/widget");
        assert!(matches!(
            err,
            Error::Validation {
                source: ValidationError::MissingPrimary,
                ..
            }
        ));
    }

    #[test]
    fn test_duplicate_primary() {
        let err = parse_document(
            "/*\nid: a/b\ntype: api\n*/\nexport default interface A {}\nexport default interface B {}",
        )
        .unwrap_err();
        assert!(matches!(
            err,
            Error::Validation {
                source: ValidationError::DuplicatePrimary { ref names },
                ..
            } if names == &["A", "B"]
        ));
    }

    #[test]
    fn test_parse_error_names_document() {
        let err = parse_document("/*\nid: a/b\ntype: api\n*/\nexport default interface A {")
            .unwrap_err();
        assert_eq!(err.document(), "a/b");
        assert!(matches!(err, Error::Parse { .. }));
    }

    #[test]
    fn test_invalid_document_type() {
        let err = parse_document("/*\nid: a/b\ntype: table\n*/").unwrap_err();
        assert!(matches!(
            err,
            Error::Validation {
                source: ValidationError::InvalidDocumentType(_),
                ..
            }
        ));
    }
}
