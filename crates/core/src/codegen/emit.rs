//! TypeScript code emission via the Emit trait.
//!
//! Each AST type implements `Emit`; printing is purely mechanical. Output
//! uses double quotes, two-space indentation and semicolons.

use super::types::{
    Export, ImportItem, TsClass, TsClassMethod, TsConst, TsExpr, TsImport, TsIndex, TsItem,
    TsLiteral, TsMethodSig, TsModule, TsObject, TsParam, TsPrimitive, TsProp, TsStmt,
    TsTupleElement, TsType, TsTypeDef, TypeDefKind,
};
use super::utils::{doc_comment, escape_js_string, quote_if_needed};

/// Trait for emitting TypeScript code from AST nodes.
pub trait Emit {
    /// Convert the AST node to its TypeScript string representation.
    fn emit(&self) -> String;
}

fn join<T: Emit>(items: &[T], sep: &str) -> String {
    items.iter().map(Emit::emit).collect::<Vec<_>>().join(sep)
}

fn type_params(params: &[String]) -> String {
    if params.is_empty() {
        String::new()
    } else {
        format!("<{}>", params.join(", "))
    }
}

// =============================================================================
// Primitive Types
// =============================================================================

impl Emit for TsPrimitive {
    fn emit(&self) -> String {
        match self {
            TsPrimitive::String => "string",
            TsPrimitive::Number => "number",
            TsPrimitive::Boolean => "boolean",
            TsPrimitive::BigInt => "bigint",
            TsPrimitive::Null => "null",
            TsPrimitive::Undefined => "undefined",
            TsPrimitive::Void => "void",
            TsPrimitive::Unknown => "unknown",
            TsPrimitive::Any => "any",
            TsPrimitive::Never => "never",
            TsPrimitive::Object => "object",
        }
        .to_string()
    }
}

impl Emit for TsLiteral {
    fn emit(&self) -> String {
        match self {
            TsLiteral::String(s) => format!("\"{}\"", escape_js_string(s)),
            TsLiteral::Number(n) => n.clone(),
            TsLiteral::Bool(b) => b.to_string(),
        }
    }
}

// =============================================================================
// Types
// =============================================================================

impl Emit for TsType {
    fn emit(&self) -> String {
        match self {
            TsType::Primitive(p) => p.emit(),
            TsType::Array(inner) => {
                let inner_str = inner.emit();
                // Wrap complex types in parentheses
                if matches!(
                    **inner,
                    TsType::Union(_) | TsType::Intersection(_) | TsType::Function { .. }
                ) {
                    format!("({inner_str})[]")
                } else {
                    format!("{inner_str}[]")
                }
            }
            TsType::Tuple(elements) => format!("[{}]", join(elements, ", ")),
            TsType::Union(types) => types
                .iter()
                .map(|t| {
                    let s = t.emit();
                    if matches!(t, TsType::Function { .. }) {
                        format!("({s})")
                    } else {
                        s
                    }
                })
                .collect::<Vec<_>>()
                .join(" | "),
            TsType::Intersection(types) => types
                .iter()
                .map(|t| {
                    let s = t.emit();
                    if matches!(t, TsType::Union(_) | TsType::Function { .. }) {
                        format!("({s})")
                    } else {
                        s
                    }
                })
                .collect::<Vec<_>>()
                .join(" & "),
            TsType::Object(object) => object.emit(),
            TsType::Literal(lit) => lit.emit(),
            TsType::Ref { name, args } => {
                if args.is_empty() {
                    name.clone()
                } else {
                    format!("{name}<{}>", join(args, ", "))
                }
            }
            TsType::Function { params, returns } => {
                format!("({}) => {}", join(params, ", "), returns.emit())
            }
        }
    }
}

impl Emit for TsObject {
    fn emit(&self) -> String {
        let mut parts: Vec<String> = self.properties.iter().map(Emit::emit).collect();
        if let Some(index) = &self.index {
            parts.push(index.emit());
        }
        if parts.is_empty() {
            "{}".to_string()
        } else {
            format!("{{ {} }}", parts.join("; "))
        }
    }
}

impl Emit for TsProp {
    fn emit(&self) -> String {
        let readonly = if self.readonly { "readonly " } else { "" };
        let key = quote_if_needed(&self.name);
        let opt = if self.optional { "?" } else { "" };
        format!("{readonly}{key}{opt}: {}", self.ty.emit())
    }
}

impl Emit for TsIndex {
    fn emit(&self) -> String {
        format!("[{}: {}]: {}", self.key_name, self.key.emit(), self.value.emit())
    }
}

impl Emit for TsTupleElement {
    fn emit(&self) -> String {
        let opt = if self.optional { "?" } else { "" };
        match &self.name {
            Some(name) => format!("{name}{opt}: {}", self.ty.emit()),
            None => format!("{}{opt}", self.ty.emit()),
        }
    }
}

impl Emit for TsParam {
    fn emit(&self) -> String {
        let opt = if self.optional { "?" } else { "" };
        match &self.ty {
            Some(ty) => format!("{}{}: {}", self.name, opt, ty.emit()),
            None => format!("{}{}", self.name, opt),
        }
    }
}

// =============================================================================
// Type Definitions
// =============================================================================

impl Emit for TsMethodSig {
    fn emit(&self) -> String {
        let returns = self
            .returns
            .as_ref()
            .map(|t| format!(": {}", t.emit()))
            .unwrap_or_default();
        format!(
            "{}{}({}){}",
            quote_if_needed(&self.name),
            type_params(&self.type_params),
            join(&self.params, ", "),
            returns
        )
    }
}

impl Emit for Export {
    fn emit(&self) -> String {
        match self {
            Export::None => "",
            Export::Named => "export ",
            Export::Default => "export default ",
        }
        .to_string()
    }
}

impl Emit for TsTypeDef {
    fn emit(&self) -> String {
        let mut output = self
            .docs
            .as_deref()
            .map(|d| doc_comment(d, 0))
            .unwrap_or_default();
        let head = format!("{}{}", self.name, type_params(&self.type_params));
        match &self.kind {
            TypeDefKind::Interface {
                extends,
                body,
                methods,
            } => {
                output.push_str(&format!("{}interface {head}", self.export.emit()));
                if !extends.is_empty() {
                    output.push_str(&format!(" extends {}", join(extends, ", ")));
                }
                if body.properties.is_empty() && body.index.is_none() && methods.is_empty() {
                    output.push_str(" {}\n");
                    return output;
                }
                output.push_str(" {\n");
                for prop in &body.properties {
                    if let Some(docs) = &prop.docs {
                        output.push_str(&doc_comment(docs, 1));
                    }
                    output.push_str(&format!("  {};\n", prop.emit()));
                }
                if let Some(index) = &body.index {
                    output.push_str(&format!("  {};\n", index.emit()));
                }
                for method in methods {
                    if let Some(docs) = &method.docs {
                        output.push_str(&doc_comment(docs, 1));
                    }
                    output.push_str(&format!("  {};\n", method.emit()));
                }
                output.push_str("}\n");
            }
            TypeDefKind::TypeAlias { ty } => {
                output.push_str(&format!("{}type {head} = {};\n", self.export.emit(), ty.emit()));
            }
            TypeDefKind::Enum { is_const, members } => {
                let keyword = if *is_const { "const enum" } else { "enum" };
                output.push_str(&format!("{}{keyword} {head} {{\n", self.export.emit()));
                for (key, value) in members {
                    let key = quote_if_needed(key);
                    match value {
                        Some(value) => output.push_str(&format!("  {key} = {},\n", value.emit())),
                        None => output.push_str(&format!("  {key},\n")),
                    }
                }
                output.push_str("}\n");
            }
        }
        output
    }
}

// =============================================================================
// Expressions and Statements
// =============================================================================

impl Emit for TsExpr {
    fn emit(&self) -> String {
        match self {
            TsExpr::Ident(name) => name.clone(),
            TsExpr::Literal(lit) => lit.emit(),
            TsExpr::Call { callee, args } => format!("{}({})", callee.emit(), join(args, ", ")),
            TsExpr::Member { object, prop } => format!("{}.{}", object.emit(), prop),
            TsExpr::Array(items) => format!("[{}]", join(items, ", ")),
            TsExpr::Raw(code) => code.clone(),
        }
    }
}

impl Emit for TsStmt {
    fn emit(&self) -> String {
        self.emit_indented(1)
    }
}

impl TsStmt {
    /// Emit with specified indentation level (2 spaces per level)
    pub fn emit_indented(&self, indent: usize) -> String {
        let prefix = "  ".repeat(indent);
        match self {
            TsStmt::Expr(expr) => format!("{prefix}{};\n", expr.emit()),
            TsStmt::Return(Some(expr)) => format!("{prefix}return {};\n", expr.emit()),
            TsStmt::Return(None) => format!("{prefix}return;\n"),
        }
    }
}

// =============================================================================
// Module Items
// =============================================================================

impl Emit for TsConst {
    fn emit(&self) -> String {
        let export = if self.exported { "export " } else { "" };
        format!("{export}const {} = {};\n", self.name, self.init.emit())
    }
}

impl TsClassMethod {
    fn emit_member(&self) -> String {
        let returns = self
            .returns
            .as_ref()
            .map(|t| format!(": {}", t.emit()))
            .unwrap_or_default();
        let mut output = format!("  {}({}){} {{\n", self.name, join(&self.params, ", "), returns);
        for stmt in &self.body {
            output.push_str(&stmt.emit_indented(2));
        }
        output.push_str("  }\n");
        output
    }
}

impl Emit for TsClass {
    fn emit(&self) -> String {
        let mut output = format!("{}class {}", self.export.emit(), self.name);
        if let Some(extends) = &self.extends {
            output.push_str(&format!(" extends {}", extends.emit()));
        }
        output.push_str(" {\n");
        let members: Vec<String> = self
            .constructor
            .iter()
            .chain(&self.methods)
            .map(TsClassMethod::emit_member)
            .collect();
        output.push_str(&members.join("\n"));
        output.push_str("}\n");
        output
    }
}

impl Emit for TsItem {
    fn emit(&self) -> String {
        match self {
            TsItem::Const(c) => c.emit(),
            TsItem::TypeDef(t) => t.emit(),
            TsItem::Class(c) => c.emit(),
        }
    }
}

// =============================================================================
// Imports
// =============================================================================

impl Emit for ImportItem {
    fn emit(&self) -> String {
        self.name.clone()
    }
}

impl Emit for TsImport {
    fn emit(&self) -> String {
        format!(
            "import {{ {} }} from \"{}\";\n",
            join(&self.items, ", "),
            escape_js_string(&self.from)
        )
    }
}

// =============================================================================
// Module
// =============================================================================

impl Emit for TsModule {
    fn emit(&self) -> String {
        let mut output = String::new();

        if !self.banner.is_empty() {
            output.push_str("/**\n");
            for line in &self.banner {
                output.push_str(&format!(" * {line}\n"));
            }
            output.push_str(" */\n\n");
        }

        for import in &self.imports {
            output.push_str(&import.emit());
        }

        // Consecutive constants form one block; every other item stands alone.
        let mut previous: Option<&TsItem> = None;
        for item in &self.items {
            let grouped = matches!(
                (previous, item),
                (Some(TsItem::Const(_)), TsItem::Const(_))
            );
            if !grouped && (previous.is_some() || !self.imports.is_empty()) {
                output.push('\n');
            }
            output.push_str(&item.emit());
            previous = Some(item);
        }

        output
    }
}

// =============================================================================
// Tests
// =============================================================================
