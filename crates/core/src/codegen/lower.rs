//! Declaration tree → TypeScript IR.

use super::types::{
    Export, TsIndex, TsLiteral, TsMethodSig, TsObject, TsParam, TsPrimitive, TsProp,
    TsTupleElement, TsType, TsTypeDef, TypeDefKind,
};
use crate::dts::{
    DeclKind, Declaration, EnumValue, IndexSignature, Keyword, Literal, Method, ObjectType, Param,
    Property, TypeExpr,
};
use crate::env::EnvironmentProfile;
use crate::error::EmissionError;

/// Lowers types for one environment, applying its scalar substitutions.
#[derive(Debug, Clone, Copy)]
pub struct Lowerer<'p> {
    profile: &'p EnvironmentProfile,
}

impl<'p> Lowerer<'p> {
    /// Lowers for `profile`.
    pub fn new(profile: &'p EnvironmentProfile) -> Self {
        Self { profile }
    }

    /// Lowers a whole declaration. `export` overrides the source export
    /// flags.
    pub fn declaration(
        &self,
        decl: &Declaration,
        export: Export,
    ) -> Result<TsTypeDef, EmissionError> {
        let at = decl.name.as_str();
        let (type_params, kind) = match &decl.kind {
            DeclKind::Interface(iface) => (
                iface.type_params.clone(),
                TypeDefKind::Interface {
                    extends: self.types(&iface.extends, at)?,
                    body: self.object(&iface.properties, iface.index.as_ref(), at)?,
                    methods: iface
                        .methods
                        .iter()
                        .map(|m| self.method_signature(m, at))
                        .collect::<Result<_, _>>()?,
                },
            ),
            DeclKind::TypeAlias(alias) => (
                alias.type_params.clone(),
                TypeDefKind::TypeAlias {
                    ty: self.ty(&alias.ty, at)?,
                },
            ),
            DeclKind::Enum(decl) => (
                Vec::new(),
                TypeDefKind::Enum {
                    is_const: decl.is_const,
                    members: decl
                        .members
                        .iter()
                        .map(|m| {
                            let value = m.value.as_ref().map(|v| match v {
                                EnumValue::String(s) => TsLiteral::String(s.clone()),
                                EnumValue::Number(n) => TsLiteral::Number(n.clone()),
                            });
                            (m.name.clone(), value)
                        })
                        .collect(),
                },
            ),
        };
        Ok(TsTypeDef {
            name: decl.name.clone(),
            export,
            type_params,
            docs: decl.docs.clone(),
            kind,
        })
    }

    /// Lowers a method signature for an interface body.
    pub fn method_signature(&self, method: &Method, at: &str) -> Result<TsMethodSig, EmissionError> {
        Ok(TsMethodSig {
            name: method.name.clone(),
            type_params: method.type_params.clone(),
            params: self.params(&method.params, at)?,
            returns: method.returns.as_ref().map(|r| self.ty(r, at)).transpose()?,
            docs: method.docs.clone(),
        })
    }

    /// Lowers parameters; optional parameters keep their `?`.
    pub fn params(&self, params: &[Param], at: &str) -> Result<Vec<TsParam>, EmissionError> {
        params
            .iter()
            .map(|p| {
                Ok(TsParam {
                    name: p.name.clone(),
                    ty: Some(self.ty(&p.ty, at)?),
                    optional: p.optional,
                })
            })
            .collect()
    }

    fn types(&self, types: &[TypeExpr], at: &str) -> Result<Vec<TsType>, EmissionError> {
        types.iter().map(|t| self.ty(t, at)).collect()
    }

    fn object(
        &self,
        properties: &[Property],
        index: Option<&IndexSignature>,
        at: &str,
    ) -> Result<TsObject, EmissionError> {
        let properties = properties
            .iter()
            .map(|p| {
                Ok(TsProp {
                    name: p.name.clone(),
                    ty: self.ty(&p.ty, at)?,
                    optional: p.optional,
                    readonly: p.readonly,
                    docs: p.docs.clone(),
                })
            })
            .collect::<Result<_, EmissionError>>()?;
        let index = index
            .map(|i| {
                Ok::<_, EmissionError>(Box::new(TsIndex {
                    key_name: i.key_name.clone(),
                    key: self.ty(&i.key, at)?,
                    value: self.ty(&i.value, at)?,
                }))
            })
            .transpose()?;
        Ok(TsObject { properties, index })
    }

    /// Lowers a type expression. `at` names the enclosing declaration for
    /// error reporting.
    pub fn ty(&self, ty: &TypeExpr, at: &str) -> Result<TsType, EmissionError> {
        Ok(match ty {
            TypeExpr::Keyword(k) => TsType::Primitive(primitive(*k)),
            TypeExpr::Literal(l) => TsType::Literal(literal(l)),
            TypeExpr::Ref { name, args } => {
                if args.is_empty()
                    && let Some(replacement) = self.profile.substitute(name)
                {
                    return Ok(TsType::named(replacement));
                }
                TsType::Ref {
                    name: name.clone(),
                    args: self.types(args, at)?,
                }
            }
            TypeExpr::Array(inner) => TsType::Array(Box::new(self.ty(inner, at)?)),
            TypeExpr::Tuple(elements) => TsType::Tuple(
                elements
                    .iter()
                    .map(|e| {
                        Ok(TsTupleElement {
                            name: e.name.clone(),
                            ty: self.ty(&e.ty, at)?,
                            optional: e.optional,
                        })
                    })
                    .collect::<Result<_, EmissionError>>()?,
            ),
            TypeExpr::Union(members) => TsType::Union(self.types(members, at)?),
            TypeExpr::Intersection(members) => TsType::Intersection(self.types(members, at)?),
            TypeExpr::Object(ObjectType { properties, index }) => {
                TsType::Object(self.object(properties, index.as_deref(), at)?)
            }
            TypeExpr::Function { params, returns } => TsType::Function {
                params: self.params(params, at)?,
                returns: Box::new(self.ty(returns, at)?),
            },
            TypeExpr::Marker(marker) => {
                return Err(EmissionError::Unsupported {
                    declaration: at.to_string(),
                    construct: format!("unresolved reference {marker}"),
                });
            }
        })
    }
}

fn primitive(keyword: Keyword) -> TsPrimitive {
    match keyword {
        Keyword::String => TsPrimitive::String,
        Keyword::Number => TsPrimitive::Number,
        Keyword::Boolean => TsPrimitive::Boolean,
        Keyword::BigInt => TsPrimitive::BigInt,
        Keyword::Any => TsPrimitive::Any,
        Keyword::Unknown => TsPrimitive::Unknown,
        Keyword::Null => TsPrimitive::Null,
        Keyword::Undefined => TsPrimitive::Undefined,
        Keyword::Void => TsPrimitive::Void,
        Keyword::Never => TsPrimitive::Never,
        Keyword::Object => TsPrimitive::Object,
    }
}

fn literal(literal: &Literal) -> TsLiteral {
    match literal {
        Literal::String(s) => TsLiteral::String(s.clone()),
        Literal::Number(n) => TsLiteral::Number(n.clone()),
        Literal::Bool(b) => TsLiteral::Bool(*b),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::codegen::emit::Emit;
    use crate::dts::{RefMarker, parse_declarations};
    use crate::env::Environment;

    fn lower(text: &str, env: Environment) -> String {
        let tree = parse_declarations(text).unwrap();
        let lowerer = Lowerer::new(env.profile());
        tree.iter()
            .map(|(_, d)| lowerer.declaration(d, Export::Named).unwrap().emit())
            .collect()
    }

    #[test]
    fn test_scalar_substitution_by_environment() {
        let src = "interface File { data: Uint8Array; at: Date; parts: Array<Uint8Array> }";
        assert_eq!(
            lower(src, Environment::DenoUserland),
            "export interface File {\n  data: Uint8Array;\n  at: string;\n  parts: Array<Uint8Array>;\n}\n"
        );
        assert_eq!(
            lower(src, Environment::NodeUserland),
            "export interface File {\n  data: Buffer;\n  at: string;\n  parts: Array<Buffer>;\n}\n"
        );
    }

    #[test]
    fn test_lower_keeps_shape() {
        let src = r#"
interface Box<T> extends Base {
  readonly value?: T | null
  pairs: [key: string, count?: number][]
  [extra: string]: unknown
  map<U>(f: (value: T) => U): Box<U>
}
const enum Level { Low = 1, High }
"#;
        let out = lower(src, Environment::Host);
        assert!(out.contains("export interface Box<T> extends Base {\n"));
        assert!(out.contains("  readonly value?: T | null;\n"));
        assert!(out.contains("  pairs: [key: string, count?: number][];\n"));
        assert!(out.contains("  [extra: string]: unknown;\n"));
        assert!(out.contains("  map<U>(f: (value: T) => U): Box<U>;\n"));
        assert!(out.contains("export const enum Level {\n  Low = 1,\n  High,\n}\n"));
    }

    #[test]
    fn test_unresolved_marker_is_an_error() {
        let lowerer = Lowerer::new(Environment::DenoUserland.profile());
        let marker = TypeExpr::Marker(RefMarker::from_specifier("#/A", &[]));
        let err = lowerer.ty(&marker, "Holder").unwrap_err();
        assert!(matches!(
            err,
            EmissionError::Unsupported { ref declaration, .. } if declaration == "Holder"
        ));
    }
}
