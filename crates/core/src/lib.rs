//! Interface-definition to schema and TypeScript stub generator.
//!
//! A document is a TypeScript declaration file whose leading block comment
//! carries YAML metadata:
//!
//! ```text
//! /*
//! id: acme/widget
//! type: record
//! */
//! export default interface Widget { name: string; size: number }
//! ```
//!
//! The pipeline parses it ([`parse_document`]), resolves cross-document
//! references ([`resolve_document`]), rewrites API methods into data shapes
//! and derives a JSON schema ([`generate_interface_schemas`]), then emits
//! environment-specific TypeScript ([`emit`]). [`generate`] runs all of it.

pub mod codegen;
pub mod document;
pub mod dts;
pub mod env;
pub mod error;
pub mod generate;
pub mod metadata;
pub mod naming;
pub mod resolve;
pub mod schema;
pub mod transform;

pub use codegen::{Artifact, emit};
pub use document::{Document, parse_document};
pub use env::{Environment, EnvironmentProfile};
pub use error::{EmissionError, Error, FetchError, ParseError, ResolutionError, ValidationError};
pub use generate::{GenerateOptions, generate, generate_interface_schemas};
pub use metadata::{DocumentId, DocumentKind, Metadata};
pub use resolve::{DefaultFetcher, Fetch, FsFetcher, HttpFetcher, MemoryFetcher, resolve_document};
pub use schema::Schema;
pub use transform::ExportMap;
