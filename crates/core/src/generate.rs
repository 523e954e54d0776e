//! Pipeline entry points.

use tracing::{debug, info};
use url::Url;

use crate::codegen::{Artifact, emit};
use crate::document::{self, Document, parse_document};
use crate::env::Environment;
use crate::error::{Error, ValidationError};
use crate::metadata::DocumentKind;
use crate::resolve::{Fetch, resolve_document};
use crate::schema::{Schema, default_recognizers, derive_document_schema};
use crate::transform::{ExportMap, transform_api};

/// Options for one generation request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerateOptions {
    /// Runtime the generated code targets.
    pub env: Environment,
    /// Location of the document; relative references are joined onto it.
    pub base: Url,
}

impl GenerateOptions {
    /// Parses the environment name.
    pub fn new(env: &str, base: Url) -> Result<Self, ValidationError> {
        Ok(Self {
            env: env.parse()?,
            base,
        })
    }
}

/// Runs the API shape transformer (API documents only) and derives the
/// document's schema.
///
/// Record documents get an empty export map.
pub fn generate_interface_schemas(document: &mut Document) -> Result<(Schema, ExportMap), Error> {
    let exports = match document.kind() {
        DocumentKind::Api => transform_api(document),
        DocumentKind::Record => ExportMap::default(),
    };
    let schema = derive_document_schema(document, &default_recognizers())
        .map_err(|source| Error::resolution(document.metadata.id.to_string(), source))?;
    Ok((schema, exports))
}

/// Parses, resolves, transforms, derives and emits `text`.
///
/// Either every artifact is returned or none is.
pub async fn generate<F: Fetch>(
    text: &str,
    options: &GenerateOptions,
    fetcher: &F,
) -> Result<Vec<Artifact>, Error> {
    let location = options.base.as_str();
    let mut document =
        parse_document(text).map_err(|e| e.labelled_or(document::UNKNOWN, location))?;
    debug!(document = %document.metadata.id, env = %options.env, "Generating.");

    resolve_document(&mut document, &options.base, fetcher).await?;
    let (schema, exports) = generate_interface_schemas(&mut document)?;
    let artifacts = emit(&document, &schema, &exports, options.env)?;

    info!(
        document = %document.metadata.id,
        artifacts = artifacts.len(),
        "Generated."
    );
    Ok(artifacts)
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::resolve::MemoryFetcher;

    fn base() -> Url {
        Url::parse("mem:///docs/widget.d.ts").unwrap()
    }

    #[test]
    fn test_options_reject_unknown_environment() {
        let err = GenerateOptions::new("browser", base()).unwrap_err();
        assert!(matches!(err, ValidationError::UnknownEnvironment(_)));
        assert_eq!(
            GenerateOptions::new("host", base()).unwrap().env,
            Environment::Host
        );
    }

    #[test]
    fn test_record_export_map_is_empty() {
        let mut doc = parse_document(
            "/*\nid: acme/widget\ntype: record\n*/\nexport default interface Widget { name: string }",
        )
        .unwrap();
        let (schema, exports) = generate_interface_schemas(&mut doc).unwrap();
        assert!(exports.is_empty());
        assert_eq!(schema.root.as_deref(), Some("#/definitions/Widget"));
    }

    #[test]
    fn test_unknown_type_names_document() {
        let mut doc = parse_document(
            "/*\nid: acme/widget\ntype: record\n*/\nexport default interface Widget { part: Part }",
        )
        .unwrap();
        let err = generate_interface_schemas(&mut doc).unwrap_err();
        assert_eq!(err.document(), "acme/widget");
        assert!(matches!(err, Error::Resolution { .. }));
    }

    #[tokio::test]
    async fn test_unlabelled_errors_name_the_location() {
        let options = GenerateOptions::new("deno-userland", base()).unwrap();
        let err = generate("/*\ntype: record\n*/", &options, &MemoryFetcher::new())
            .await
            .unwrap_err();
        assert_eq!(err.document(), "mem:///docs/widget.d.ts");
        assert!(matches!(err, Error::Validation { .. }));
    }
}
