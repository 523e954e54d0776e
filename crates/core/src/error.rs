//! Error types for every stage of the generation pipeline.
//!
//! Each stage has its own error enum. The top-level [`Error`] wraps them and
//! names the document that failed, so a caller processing a folder of
//! documents can report which one broke.

use thiserror::Error;

/// Error raised while lexing or parsing declaration text or its metadata.
#[derive(Debug, Error)]
pub enum ParseError {
    /// Unexpected token or character.
    #[error("{line}:{column}: {message}")]
    Syntax {
        /// 1-based line.
        line: u32,
        /// 1-based column.
        column: u32,
        /// What went wrong.
        message: String,
    },

    /// Syntax that is valid TypeScript but not supported by the generator.
    #[error("{line}:{column}: unsupported syntax: {construct}")]
    Unsupported {
        /// 1-based line.
        line: u32,
        /// 1-based column.
        column: u32,
        /// Description of the construct.
        construct: String,
    },

    /// The leading metadata block is not valid YAML or has the wrong shape.
    #[error("malformed metadata block: {0}")]
    Metadata(#[from] serde_yaml::Error),
}

impl ParseError {
    /// Creates a syntax error at the given position.
    pub fn syntax(line: u32, column: u32, message: impl Into<String>) -> Self {
        Self::Syntax {
            line,
            column,
            message: message.into(),
        }
    }

    /// Creates an unsupported-construct error at the given position.
    pub fn unsupported(line: u32, column: u32, construct: impl Into<String>) -> Self {
        Self::Unsupported {
            line,
            column,
            construct: construct.into(),
        }
    }
}

/// Error raised by a [`Fetch`](crate::resolve::Fetch) implementation.
#[derive(Debug, Error)]
pub enum FetchError {
    /// Local file could not be read.
    #[error("failed to read {location}: {source}")]
    Io {
        /// Location that was read.
        location: String,
        /// Underlying error.
        #[source]
        source: std::io::Error,
    },

    /// HTTP transport failure.
    #[error("request to {location} failed: {source}")]
    Http {
        /// Location that was requested.
        location: String,
        /// Underlying error.
        #[source]
        source: reqwest::Error,
    },

    /// Non-success HTTP status.
    #[error("request to {location} returned status {status}")]
    Status {
        /// Location that was requested.
        location: String,
        /// HTTP status code.
        status: u16,
    },

    /// No fetcher handles this URL scheme.
    #[error("unsupported location scheme '{scheme}' in {location}")]
    UnsupportedScheme {
        /// Scheme of the location.
        scheme: String,
        /// Full location.
        location: String,
    },

    /// The location is not known to the fetcher.
    #[error("document not found: {0}")]
    NotFound(String),
}

/// Error raised while resolving pointers, imports and type names.
#[derive(Debug, Error)]
pub enum ResolutionError {
    /// Fetching an external document failed.
    #[error("cannot resolve '{reference}': {source}")]
    Fetch {
        /// Reference being resolved.
        reference: String,
        /// Underlying fetch error.
        #[source]
        source: FetchError,
    },

    /// A fetched document could not be parsed.
    #[error("cannot resolve '{reference}': fetched document is invalid: {source}")]
    InvalidDocument {
        /// Reference being resolved.
        reference: String,
        /// Underlying parse error.
        #[source]
        source: ParseError,
    },

    /// A relative location could not be joined onto its base.
    #[error("cannot resolve '{reference}': invalid location: {source}")]
    InvalidLocation {
        /// Reference being resolved.
        reference: String,
        /// Underlying URL error.
        #[source]
        source: url::ParseError,
    },

    /// A pointer segment does not exist in the target document.
    #[error("cannot resolve '{reference}': segment '{segment}' not found")]
    PointerNotFound {
        /// Reference being resolved.
        reference: String,
        /// Segment that failed to match.
        segment: String,
    },

    /// An imported name is not declared by the imported document.
    #[error("cannot resolve '{reference}': '{name}' is not declared there")]
    MissingExport {
        /// Reference being resolved.
        reference: String,
        /// Missing declaration name.
        name: String,
    },

    /// Resolution re-entered a reference that is still being resolved.
    #[error("reference cycle: {chain}")]
    Cycle {
        /// Chain of references, outermost first.
        chain: String,
    },

    /// Two different declarations would share a name after splicing.
    #[error("cannot resolve '{reference}': declaration '{name}' conflicts with an existing one")]
    Conflict {
        /// Reference being resolved.
        reference: String,
        /// Conflicting name.
        name: String,
    },

    /// A type reference names nothing in scope.
    #[error("unknown type '{name}' referenced from '{from}'")]
    UnknownType {
        /// Unknown name.
        name: String,
        /// Declaration containing the reference.
        from: String,
    },
}

/// Error raised when a document violates a structural rule.
#[derive(Debug, Error)]
pub enum ValidationError {
    /// No `export default interface` in an api/record document.
    #[error("document declares no default interface")]
    MissingPrimary,

    /// More than one `export default interface`.
    #[error("document declares more than one default interface: {}", names.join(", "))]
    DuplicatePrimary {
        /// Names of all default interfaces.
        names: Vec<String>,
    },

    /// `type` is missing or not one of the recognized kinds.
    #[error("document type must be \"api\" or \"record\", got {0:?}")]
    InvalidDocumentType(Option<String>),

    /// The environment name is not in the profile table.
    #[error("the environment must be \"deno-userland\", \"node-userland\", or \"host\"; \"{0}\" is not valid")]
    UnknownEnvironment(String),

    /// `id` is missing or not of the form `domain/name`.
    #[error("document id must be set and fit the \"domain/name\" form, got {0:?}")]
    InvalidId(Option<String>),
}

/// Error raised while producing artifacts.
#[derive(Debug, Error)]
pub enum EmissionError {
    /// A declaration uses a construct the emitter cannot express.
    #[error("unsupported construct in '{declaration}': {construct}")]
    Unsupported {
        /// Declaration containing the construct.
        declaration: String,
        /// Description of the construct.
        construct: String,
    },

    /// `subscribe` is declared but no emitter interface exists.
    #[error("'{method}' is declared but the document has no event emitter interfaces")]
    MissingEmitters {
        /// Name of the subscription method.
        method: String,
    },

    /// Embedding a JSON literal failed.
    #[error("failed to serialize {what}: {source}")]
    Json {
        /// What was being serialized.
        what: &'static str,
        /// Underlying error.
        #[source]
        source: serde_json::Error,
    },
}

/// Top-level error naming the document that failed.
#[derive(Debug, Error)]
pub enum Error {
    /// Parsing failed.
    #[error("{document}: parse error: {source}")]
    Parse {
        /// Document id, or its location when the id is unknown.
        document: String,
        /// Underlying error.
        #[source]
        source: ParseError,
    },

    /// Reference resolution failed.
    #[error("{document}: resolution error: {source}")]
    Resolution {
        /// Document id, or its location when the id is unknown.
        document: String,
        /// Underlying error.
        #[source]
        source: ResolutionError,
    },

    /// Structural validation failed.
    #[error("{document}: validation error: {source}")]
    Validation {
        /// Document id, or its location when the id is unknown.
        document: String,
        /// Underlying error.
        #[source]
        source: ValidationError,
    },

    /// Emission failed.
    #[error("{document}: emission error: {source}")]
    Emission {
        /// Document id.
        document: String,
        /// Underlying error.
        #[source]
        source: EmissionError,
    },
}

impl Error {
    /// Returns the identifier of the document that failed.
    pub fn document(&self) -> &str {
        match self {
            Self::Parse { document, .. }
            | Self::Resolution { document, .. }
            | Self::Validation { document, .. }
            | Self::Emission { document, .. } => document,
        }
    }

    /// Replaces a placeholder document label with `location`.
    pub(crate) fn labelled_or(mut self, placeholder: &str, location: &str) -> Self {
        let (Self::Parse { document, .. }
        | Self::Resolution { document, .. }
        | Self::Validation { document, .. }
        | Self::Emission { document, .. }) = &mut self;
        if document == placeholder {
            *document = location.to_string();
        }
        self
    }

    pub(crate) fn parse(document: impl Into<String>, source: ParseError) -> Self {
        Self::Parse {
            document: document.into(),
            source,
        }
    }

    pub(crate) fn resolution(document: impl Into<String>, source: ResolutionError) -> Self {
        Self::Resolution {
            document: document.into(),
            source,
        }
    }

    pub(crate) fn validation(document: impl Into<String>, source: ValidationError) -> Self {
        Self::Validation {
            document: document.into(),
            source,
        }
    }

    pub(crate) fn emission(document: impl Into<String>, source: EmissionError) -> Self {
        Self::Emission {
            document: document.into(),
            source,
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn test_error_names_document() {
        let err = Error::validation("acme/widget", ValidationError::MissingPrimary);
        assert_eq!(err.document(), "acme/widget");
        assert_eq!(
            err.to_string(),
            "acme/widget: validation error: document declares no default interface"
        );
    }

    #[test]
    fn test_resolution_error_names_reference() {
        let err = ResolutionError::PointerNotFound {
            reference: "./other.d.ts#/Foo/bar".into(),
            segment: "bar".into(),
        };
        assert!(err.to_string().contains("./other.d.ts#/Foo/bar"));
    }
}
