//! TypeScript code generation.
//!
//! Two layers:
//! 1. Lowering and builders: document, schema and export map → TypeScript AST
//! 2. Emission: AST → code strings via the `Emit` trait
//!
//! ## Module Structure
//!
//! - `types`: TypeScript AST IR
//! - `lower`: declaration tree → AST, with environment substitutions
//! - `rpc`: client and server stubs for API documents
//! - `record`: table binding for record documents
//! - `emit`: AST → code strings
//! - `utils`: quoting and doc comment helpers

mod emit;
mod lower;
mod record;
mod rpc;
mod types;
pub mod utils;

use serde::Serialize;
use tracing::debug;

pub use emit::Emit;
pub use lower::Lowerer;
pub use types::{
    Export, ImportItem, TsClass, TsClassMethod, TsConst, TsExpr, TsImport, TsItem, TsLiteral,
    TsModule, TsParam, TsStmt, TsType, TsTypeDef,
};

use crate::document::Document;
use crate::env::{Environment, EnvironmentProfile};
use crate::error::{EmissionError, Error};
use crate::metadata::DocumentKind;
use crate::schema::Schema;
use crate::transform::ExportMap;

/// One generated file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Artifact {
    /// File name, relative to the document's output directory.
    pub name: String,
    /// Full file contents.
    pub text: String,
}

/// Emits the artifacts of a resolved and schema-derived document.
///
/// API documents produce `<name>.ts` (client) and `<name>.server.ts`
/// (server); record documents produce `<name>.ts`.
pub fn emit(
    document: &Document,
    schema: &Schema,
    exports: &ExportMap,
    env: Environment,
) -> Result<Vec<Artifact>, Error> {
    let ctx = EmitContext::new(document, schema, exports, env);
    let name = document.metadata.id.name();
    let modules = match document.kind() {
        DocumentKind::Api => vec![
            (format!("{name}.ts"), rpc::client(&ctx)),
            (format!("{name}.server.ts"), rpc::server(&ctx)),
        ],
        DocumentKind::Record => vec![(format!("{name}.ts"), record::table(&ctx))],
    };

    let artifacts = modules
        .into_iter()
        .map(|(name, module)| {
            let text = module?.emit();
            Ok(Artifact { name, text })
        })
        .collect::<Result<Vec<_>, EmissionError>>()
        .map_err(|source| Error::emission(document.metadata.id.to_string(), source))?;

    debug!(
        document = %document.metadata.id,
        env = %env,
        artifacts = artifacts.len(),
        "Emitted artifacts."
    );
    Ok(artifacts)
}

/// Everything a builder needs to produce one module.
#[derive(Debug)]
pub(crate) struct EmitContext<'a> {
    pub document: &'a Document,
    pub schema: &'a Schema,
    pub exports: &'a ExportMap,
    pub env: Environment,
    pub profile: &'static EnvironmentProfile,
    pub lowerer: Lowerer<'static>,
}

impl<'a> EmitContext<'a> {
    /// Bundles the inputs of one emission.
    pub fn new(
        document: &'a Document,
        schema: &'a Schema,
        exports: &'a ExportMap,
        env: Environment,
    ) -> Self {
        let profile = env.profile();
        Self {
            document,
            schema,
            exports,
            env,
            profile,
            lowerer: Lowerer::new(profile),
        }
    }

    /// Leading comment of every artifact.
    pub fn banner(&self) -> Vec<String> {
        vec![
            "File generated by tsgen".to_string(),
            format!("env={}", self.env),
            "DO NOT MODIFY".to_string(),
        ]
    }

    /// Environment imports followed by `names` from the base-type module.
    pub fn imports(&self, names: &[&str]) -> Vec<TsImport> {
        let mut imports: Vec<TsImport> = Vec::new();
        for (name, module) in self.profile.extra_imports {
            match imports.iter_mut().find(|i| i.from == *module) {
                Some(import) => import.items.push(ImportItem::new(*name)),
                None => imports.push(TsImport {
                    items: vec![ImportItem::new(*name)],
                    from: (*module).to_string(),
                }),
            }
        }
        imports.push(TsImport {
            items: names.iter().map(|n| ImportItem::new(*n)).collect(),
            from: self.profile.rpc_module.to_string(),
        });
        imports
    }

    /// `export const ID = "..."; export const REVISION = ...;`
    pub fn identity_consts(&self) -> Vec<TsItem> {
        let metadata = &self.document.metadata;
        let revision = metadata.revision.as_ref().map_or_else(
            || TsExpr::ident("undefined"),
            |r| TsExpr::Literal(TsLiteral::String(r.clone())),
        );
        vec![
            TsItem::Const(TsConst {
                name: "ID".into(),
                exported: true,
                init: TsExpr::Literal(TsLiteral::String(metadata.id.to_string())),
            }),
            TsItem::Const(TsConst {
                name: "REVISION".into(),
                exported: true,
                init: revision,
            }),
        ]
    }
}

/// `const NAME = <json>;`
pub(crate) fn json_const(
    name: &str,
    exported: bool,
    value: &impl Serialize,
    what: &'static str,
) -> Result<TsItem, EmissionError> {
    let json =
        serde_json::to_string(value).map_err(|source| EmissionError::Json { what, source })?;
    Ok(TsItem::Const(TsConst {
        name: name.to_string(),
        exported,
        init: TsExpr::Raw(json),
    }))
}

/// `super(args);`
pub(crate) fn super_call(args: &[&str]) -> TsStmt {
    TsStmt::Expr(TsExpr::Call {
        callee: Box::new(TsExpr::ident("super")),
        args: args.iter().map(|a| TsExpr::ident(*a)).collect(),
    })
}

/// `constructor(params) { body }`
pub(crate) fn constructor(params: Vec<TsParam>, body: Vec<TsStmt>) -> TsClassMethod {
    TsClassMethod {
        name: "constructor".into(),
        params,
        returns: None,
        body,
    }
}

/// A typed parameter.
pub(crate) fn param(name: &str, ty: TsType, optional: bool) -> TsParam {
    TsParam {
        name: name.to_string(),
        ty: Some(ty),
        optional,
    }
}
