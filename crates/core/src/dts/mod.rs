//! Declaration tree for TypeScript declaration documents.
//!
//! The tree is an arena: declarations live in a `Vec` and are addressed by
//! stable [`DeclId`] indices. Passes that rewrite the tree (reference
//! resolution, API shape transformation) never hold mutable references into
//! it while reading it; they record [`TreeEdit`]s and apply them at the end.

mod lexer;
mod parser;
mod span;

pub(crate) use lexer::strip_gutters;
pub use parser::{parse_declarations, parse_declarations_after_metadata};
pub use span::Span;

/// Stable index of a declaration inside a [`DeclTree`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DeclId(usize);

impl DeclId {
    /// Returns the raw arena index.
    pub fn index(self) -> usize {
        self.0
    }
}

/// Where a declaration came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Origin {
    /// Written in a source document (the root or an imported one).
    Source,
    /// Generated by the API shape transformer.
    Synthesized,
}

/// `import { A, B as C } from "location"`
#[derive(Debug, Clone, PartialEq)]
pub struct ImportDecl {
    /// Module specifier as written.
    pub location: String,
    /// Imported names.
    pub names: Vec<ImportName>,
    /// `import type { … }`
    pub type_only: bool,
}

/// One name in an import list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportName {
    /// Name declared by the imported document.
    pub imported: String,
    /// Name visible in the importing document.
    pub local: String,
}

/// A named top-level declaration.
#[derive(Debug, Clone, PartialEq)]
pub struct Declaration {
    /// Declared name.
    pub name: String,
    /// Whether the declaration carries `export`.
    pub exported: bool,
    /// `export default interface …`
    pub is_default: bool,
    /// Where the declaration came from.
    pub origin: Origin,
    /// Text of the attached doc comment.
    pub docs: Option<String>,
    /// What is declared.
    pub kind: DeclKind,
}

/// The three kinds of declarations a document may contain.
#[derive(Debug, Clone, PartialEq)]
pub enum DeclKind {
    /// `interface Name { ... }`
    Interface(Interface),
    /// `type Name = ...`
    TypeAlias(TypeAlias),
    /// `[const] enum Name { ... }`
    Enum(EnumDecl),
}

/// Interface body and heritage.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Interface {
    /// Generic parameter names.
    pub type_params: Vec<String>,
    /// `extends` clauses, in order.
    pub extends: Vec<TypeExpr>,
    /// Properties in declaration order.
    pub properties: Vec<Property>,
    /// Method signatures in declaration order.
    pub methods: Vec<Method>,
    /// `[key: K]: V`, if present.
    pub index: Option<IndexSignature>,
}

/// `type Name<T> = ...`
#[derive(Debug, Clone, PartialEq)]
pub struct TypeAlias {
    /// Generic parameter names.
    pub type_params: Vec<String>,
    /// Aliased type.
    pub ty: TypeExpr,
}

/// `[const] enum Name { ... }`
#[derive(Debug, Clone, PartialEq)]
pub struct EnumDecl {
    /// Declared with `const enum`.
    pub is_const: bool,
    /// Members in declaration order.
    pub members: Vec<EnumMember>,
}

impl EnumDecl {
    /// Value of each member, in order. Members without an initializer count
    /// up from the previous numeric value, starting at 0. Values are double
    /// precision, as at runtime.
    pub fn member_literals(&self) -> Vec<Literal> {
        let mut next = 0f64;
        self.members
            .iter()
            .map(|member| match &member.value {
                Some(EnumValue::String(s)) => Literal::String(s.clone()),
                Some(EnumValue::Number(n)) => {
                    if let Some(value) = numeric_value(n) {
                        next = value + 1.0;
                    }
                    Literal::Number(n.clone())
                }
                None => {
                    let value = next;
                    next += 1.0;
                    Literal::Number(value.to_string())
                }
            })
            .collect()
    }
}

/// Numeric literal text as a number: decimal, exponent, `0x`/`0o`/`0b`
/// prefixes and `_` separators.
fn numeric_value(text: &str) -> Option<f64> {
    let (negative, digits) = match text.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, text),
    };
    let digits = digits.replace('_', "");
    let radix = match digits.get(..2) {
        Some("0x" | "0X") => Some(16),
        Some("0o" | "0O") => Some(8),
        Some("0b" | "0B") => Some(2),
        _ => None,
    };
    let magnitude = match radix {
        Some(radix) => u64::from_str_radix(&digits[2..], radix).ok()? as f64,
        None => digits.parse::<f64>().ok()?,
    };
    Some(if negative { -magnitude } else { magnitude })
}

/// One enum member.
#[derive(Debug, Clone, PartialEq)]
pub struct EnumMember {
    /// Member name.
    pub name: String,
    /// Initializer, if written.
    pub value: Option<EnumValue>,
}

/// Explicit enum initializer.
#[derive(Debug, Clone, PartialEq)]
pub enum EnumValue {
    /// String initializer.
    String(String),
    /// Numeric literal, kept as written.
    Number(String),
}

/// `[readonly] name[?]: Type`
#[derive(Debug, Clone, PartialEq)]
pub struct Property {
    /// Property name.
    pub name: String,
    /// Property type.
    pub ty: TypeExpr,
    /// Declared with `?`.
    pub optional: bool,
    /// Declared `readonly`.
    pub readonly: bool,
    /// Text of the attached doc comment.
    pub docs: Option<String>,
}

impl Property {
    /// Creates a required, mutable, undocumented property.
    pub fn new(name: impl Into<String>, ty: TypeExpr) -> Self {
        Self {
            name: name.into(),
            ty,
            optional: false,
            readonly: false,
            docs: None,
        }
    }
}

/// `[key: K]: V`
#[derive(Debug, Clone, PartialEq)]
pub struct IndexSignature {
    /// Name of the key binding.
    pub key_name: String,
    /// Key type.
    pub key: TypeExpr,
    /// Value type.
    pub value: TypeExpr,
}

/// `name(params): Returns`
#[derive(Debug, Clone, PartialEq)]
pub struct Method {
    /// Method name.
    pub name: String,
    /// Generic parameter names.
    pub type_params: Vec<String>,
    /// Parameters in order.
    pub params: Vec<Param>,
    /// `None` when the signature has no return annotation.
    pub returns: Option<TypeExpr>,
    /// Text of the attached doc comment.
    pub docs: Option<String>,
}

impl Method {
    /// Returns `(event name, payload type)` when this method has the
    /// conventional emitter shape: exactly two parameters, a string literal
    /// event name followed by an object-shaped payload.
    ///
    /// `is_interface` decides whether a named payload reference is
    /// object-shaped.
    pub fn event_signature<'a>(
        &'a self,
        is_interface: impl Fn(&str) -> bool,
    ) -> Option<(&'a str, &'a TypeExpr)> {
        let [name, payload] = self.params.as_slice() else {
            return None;
        };
        let TypeExpr::Literal(Literal::String(event)) = &name.ty else {
            return None;
        };
        let object_shaped = match &payload.ty {
            TypeExpr::Object(_) => true,
            TypeExpr::Ref { name, args } => args.is_empty() && is_interface(name),
            _ => false,
        };
        object_shaped.then_some((event.as_str(), &payload.ty))
    }

    /// Return type with every `Promise<…>` wrapper removed; `void` when the
    /// method has no return annotation.
    pub fn unwrapped_return(&self) -> TypeExpr {
        self.returns
            .as_ref()
            .map_or(TypeExpr::Keyword(Keyword::Void), |ty| ty.unwrap_promise().clone())
    }
}

/// Method or function parameter.
#[derive(Debug, Clone, PartialEq)]
pub struct Param {
    /// Parameter name.
    pub name: String,
    /// Parameter type.
    pub ty: TypeExpr,
    /// Declared with `?`.
    pub optional: bool,
}

/// Tuple element, optionally named (`[key: string, len?: number]`).
#[derive(Debug, Clone, PartialEq)]
pub struct TupleElement {
    /// Label, for named tuples.
    pub name: Option<String>,
    /// Element type.
    pub ty: TypeExpr,
    /// Declared with `?`.
    pub optional: bool,
}

/// Object literal type.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ObjectType {
    /// Properties in declaration order.
    pub properties: Vec<Property>,
    /// Index signature, if present.
    pub index: Option<Box<IndexSignature>>,
}

/// Built-in keyword types.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Keyword {
    /// `string`
    String,
    /// `number`
    Number,
    /// `boolean`
    Boolean,
    /// `bigint`
    BigInt,
    /// `any`
    Any,
    /// `unknown`
    Unknown,
    /// `null`
    Null,
    /// `undefined`
    Undefined,
    /// `void`
    Void,
    /// `never`
    Never,
    /// `object`
    Object,
}

impl Keyword {
    /// Parses a keyword type name.
    pub fn from_name(name: &str) -> Option<Self> {
        Some(match name {
            "string" => Self::String,
            "number" => Self::Number,
            "boolean" => Self::Boolean,
            "bigint" => Self::BigInt,
            "any" => Self::Any,
            "unknown" => Self::Unknown,
            "null" => Self::Null,
            "undefined" => Self::Undefined,
            "void" => Self::Void,
            "never" => Self::Never,
            "object" => Self::Object,
            _ => return None,
        })
    }

    /// Keyword as written in source.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::String => "string",
            Self::Number => "number",
            Self::Boolean => "boolean",
            Self::BigInt => "bigint",
            Self::Any => "any",
            Self::Unknown => "unknown",
            Self::Null => "null",
            Self::Undefined => "undefined",
            Self::Void => "void",
            Self::Never => "never",
            Self::Object => "object",
        }
    }
}

/// Literal types.
#[derive(Debug, Clone, PartialEq)]
pub enum Literal {
    /// String literal, unescaped.
    String(String),
    /// Numeric literal, kept as written.
    Number(String),
    /// `true` or `false`
    Bool(bool),
}

/// An unresolved reference written as `import("location#/pointer").Name`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RefMarker {
    /// Document location; `None` for pointers into the current document.
    pub location: Option<String>,
    /// JSON-pointer style path, always starting with `/`.
    pub pointer: String,
}

impl RefMarker {
    /// Builds a marker from the string inside `import("…")` and any trailing
    /// `.Name` qualifiers.
    pub fn from_specifier(specifier: &str, qualifiers: &[String]) -> Self {
        let (location, mut pointer) = match specifier.split_once('#') {
            Some(("", ptr)) => (None, ptr.to_string()),
            Some((loc, ptr)) => (Some(loc.to_string()), ptr.to_string()),
            None if specifier.starts_with('/') && !specifier.starts_with("//") => {
                (None, specifier.to_string())
            }
            None => (Some(specifier.to_string()), String::new()),
        };
        for qualifier in qualifiers {
            pointer.push('/');
            pointer.push_str(&qualifier.replace('~', "~0").replace('/', "~1"));
        }
        Self { location, pointer }
    }
}

impl std::fmt::Display for RefMarker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.location {
            Some(loc) => write!(f, "{loc}#{}", self.pointer),
            None => write!(f, "#{}", self.pointer),
        }
    }
}

/// A type expression.
#[derive(Debug, Clone, PartialEq)]
pub enum TypeExpr {
    /// Built-in keyword type.
    Keyword(Keyword),
    /// Literal type.
    Literal(Literal),
    /// Named reference, possibly qualified (`A.B`) and with type arguments.
    Ref { name: String, args: Vec<TypeExpr> },
    /// `T[]` or `Array<T>`
    Array(Box<TypeExpr>),
    /// `[A, B]`
    Tuple(Vec<TupleElement>),
    /// `A | B`
    Union(Vec<TypeExpr>),
    /// `A & B`
    Intersection(Vec<TypeExpr>),
    /// Inline object type.
    Object(ObjectType),
    /// `(params) => returns`
    Function { params: Vec<Param>, returns: Box<TypeExpr> },
    /// Cross-document reference awaiting resolution.
    Marker(RefMarker),
}

impl TypeExpr {
    /// Shorthand for a reference without type arguments.
    pub fn named(name: impl Into<String>) -> Self {
        Self::Ref {
            name: name.into(),
            args: Vec::new(),
        }
    }

    /// Strips nested `Promise<…>` wrappers.
    pub fn unwrap_promise(&self) -> &Self {
        let mut ty = self;
        while let Self::Ref { name, args } = ty
            && name == "Promise"
            && args.len() == 1
        {
            ty = &args[0];
        }
        ty
    }

    /// Direct children, in source order.
    pub fn children(&self) -> Vec<&Self> {
        match self {
            Self::Keyword(_) | Self::Literal(_) | Self::Marker(_) => Vec::new(),
            Self::Ref { args, .. } => args.iter().collect(),
            Self::Array(inner) => vec![inner.as_ref()],
            Self::Tuple(elements) => elements.iter().map(|e| &e.ty).collect(),
            Self::Union(types) | Self::Intersection(types) => types.iter().collect(),
            Self::Object(object) => {
                let mut children: Vec<&Self> = object.properties.iter().map(|p| &p.ty).collect();
                if let Some(index) = &object.index {
                    children.push(&index.key);
                    children.push(&index.value);
                }
                children
            }
            Self::Function { params, returns } => params
                .iter()
                .map(|p| &p.ty)
                .chain(std::iter::once(returns.as_ref()))
                .collect(),
        }
    }

    /// Mutable direct children, in source order.
    pub fn children_mut(&mut self) -> Vec<&mut Self> {
        match self {
            Self::Keyword(_) | Self::Literal(_) | Self::Marker(_) => Vec::new(),
            Self::Ref { args, .. } => args.iter_mut().collect(),
            Self::Array(inner) => vec![inner.as_mut()],
            Self::Tuple(elements) => elements.iter_mut().map(|e| &mut e.ty).collect(),
            Self::Union(types) | Self::Intersection(types) => types.iter_mut().collect(),
            Self::Object(object) => {
                let ObjectType { properties, index } = object;
                let mut children: Vec<&mut Self> =
                    properties.iter_mut().map(|p| &mut p.ty).collect();
                if let Some(index) = index {
                    let IndexSignature { key, value, .. } = index.as_mut();
                    children.push(key);
                    children.push(value);
                }
                children
            }
            Self::Function { params, returns } => params
                .iter_mut()
                .map(|p| &mut p.ty)
                .chain(std::iter::once(returns.as_mut()))
                .collect(),
        }
    }

    /// Calls `f` on this node and every descendant, parents first.
    pub fn walk<'a>(&'a self, f: &mut impl FnMut(&'a Self)) {
        f(self);
        for child in self.children() {
            child.walk(f);
        }
    }

    /// Returns true if any [`TypeExpr::Marker`] remains in this expression.
    pub fn has_markers(&self) -> bool {
        let mut found = false;
        self.walk(&mut |ty| found |= matches!(ty, Self::Marker(_)));
        found
    }
}

impl Declaration {
    /// Every type expression directly held by this declaration.
    pub fn types(&self) -> Vec<&TypeExpr> {
        match &self.kind {
            DeclKind::Interface(iface) => {
                let mut types: Vec<&TypeExpr> = iface.extends.iter().collect();
                types.extend(iface.properties.iter().map(|p| &p.ty));
                for method in &iface.methods {
                    types.extend(method.params.iter().map(|p| &p.ty));
                    types.extend(method.returns.as_ref());
                }
                if let Some(index) = &iface.index {
                    types.push(&index.key);
                    types.push(&index.value);
                }
                types
            }
            DeclKind::TypeAlias(alias) => vec![&alias.ty],
            DeclKind::Enum(_) => Vec::new(),
        }
    }

    /// Mutable counterpart of [`Declaration::types`].
    pub fn types_mut(&mut self) -> Vec<&mut TypeExpr> {
        match &mut self.kind {
            DeclKind::Interface(iface) => {
                let Interface {
                    extends,
                    properties,
                    methods,
                    index,
                    ..
                } = iface;
                let mut types: Vec<&mut TypeExpr> = extends.iter_mut().collect();
                types.extend(properties.iter_mut().map(|p| &mut p.ty));
                for method in methods.iter_mut() {
                    types.extend(method.params.iter_mut().map(|p| &mut p.ty));
                    types.extend(method.returns.as_mut());
                }
                if let Some(index) = index {
                    types.push(&mut index.key);
                    types.push(&mut index.value);
                }
                types
            }
            DeclKind::TypeAlias(alias) => vec![&mut alias.ty],
            DeclKind::Enum(_) => Vec::new(),
        }
    }

    /// Names of every type referenced anywhere in this declaration.
    pub fn referenced_names(&self) -> Vec<&str> {
        let mut names = Vec::new();
        for ty in self.types() {
            ty.walk(&mut |node| {
                if let TypeExpr::Ref { name, .. } = node {
                    names.push(name.as_str());
                }
            });
        }
        names
    }

    /// The interface body, if this declares an interface.
    pub fn as_interface(&self) -> Option<&Interface> {
        match &self.kind {
            DeclKind::Interface(iface) => Some(iface),
            _ => None,
        }
    }
}

/// A structural edit applied to a [`DeclTree`].
#[derive(Debug, Clone)]
pub enum TreeEdit {
    /// Replace the declaration at `id`.
    Replace { id: DeclId, with: Declaration },
    /// Append a declaration after all existing ones.
    Append(Declaration),
}

/// Parsed declaration document: imports plus an arena of declarations.
#[derive(Debug, Clone, Default)]
pub struct DeclTree {
    imports: Vec<ImportDecl>,
    decls: Vec<Declaration>,
}

impl DeclTree {
    /// Empty tree.
    pub fn new() -> Self {
        Self::default()
    }

    /// Named imports in source order.
    pub fn imports(&self) -> &[ImportDecl] {
        &self.imports
    }

    pub(crate) fn push_import(&mut self, import: ImportDecl) {
        self.imports.push(import);
    }

    /// Appends a declaration and returns its id.
    pub fn push(&mut self, decl: Declaration) -> DeclId {
        self.decls.push(decl);
        DeclId(self.decls.len() - 1)
    }

    /// Declaration by id.
    pub fn get(&self, id: DeclId) -> Option<&Declaration> {
        self.decls.get(id.0)
    }

    /// Number of declarations.
    pub fn len(&self) -> usize {
        self.decls.len()
    }

    /// Whether the tree has no declarations.
    pub fn is_empty(&self) -> bool {
        self.decls.is_empty()
    }

    /// Declarations with their ids, in declaration order.
    pub fn iter(&self) -> impl Iterator<Item = (DeclId, &Declaration)> {
        self.decls.iter().enumerate().map(|(i, d)| (DeclId(i), d))
    }

    /// Finds the first declaration with the given name.
    pub fn find(&self, name: &str) -> Option<(DeclId, &Declaration)> {
        self.iter().find(|(_, d)| d.name == name)
    }

    /// Finds an interface by name.
    pub fn interface(&self, name: &str) -> Option<&Interface> {
        self.find(name).and_then(|(_, d)| d.as_interface())
    }

    /// Properties of the interface or object alias `name`, inherited ones
    /// first. A redeclared property replaces the inherited one in place.
    pub fn flattened_properties(&self, name: &str) -> Vec<Property> {
        let mut out = Vec::new();
        self.collect_properties(name, &mut Vec::new(), &mut out);
        out
    }

    fn collect_properties(&self, name: &str, visiting: &mut Vec<String>, out: &mut Vec<Property>) {
        if visiting.iter().any(|v| v == name) {
            return;
        }
        let Some((_, decl)) = self.find(name) else {
            return;
        };
        visiting.push(name.to_string());
        match &decl.kind {
            DeclKind::Interface(iface) => {
                for parent in &iface.extends {
                    self.collect_type_properties(parent, visiting, out);
                }
                for property in &iface.properties {
                    merge_property(out, property.clone());
                }
            }
            DeclKind::TypeAlias(alias) => self.collect_type_properties(&alias.ty, visiting, out),
            DeclKind::Enum(_) => {}
        }
        visiting.pop();
    }

    fn collect_type_properties(
        &self,
        ty: &TypeExpr,
        visiting: &mut Vec<String>,
        out: &mut Vec<Property>,
    ) {
        match ty {
            TypeExpr::Ref { name, .. } => self.collect_properties(name, visiting, out),
            TypeExpr::Object(object) => {
                for property in &object.properties {
                    merge_property(out, property.clone());
                }
            }
            TypeExpr::Intersection(types) => {
                for ty in types {
                    self.collect_type_properties(ty, visiting, out);
                }
            }
            _ => {}
        }
    }

    /// Ids of every `export default interface`.
    pub fn default_interfaces(&self) -> Vec<DeclId> {
        self.iter()
            .filter(|(_, d)| d.is_default && matches!(d.kind, DeclKind::Interface(_)))
            .map(|(id, _)| id)
            .collect()
    }

    /// Applies edits in order.
    pub fn apply(&mut self, edits: Vec<TreeEdit>) {
        for edit in edits {
            match edit {
                TreeEdit::Replace { id, with } => {
                    if let Some(slot) = self.decls.get_mut(id.0) {
                        *slot = with;
                    }
                }
                TreeEdit::Append(decl) => {
                    self.decls.push(decl);
                }
            }
        }
    }

    /// Returns true if any declaration still contains a reference marker.
    pub fn has_markers(&self) -> bool {
        self.decls
            .iter()
            .flat_map(|d| d.types())
            .any(|ty| ty.has_markers())
    }
}

fn merge_property(out: &mut Vec<Property>, property: Property) {
    match out.iter_mut().find(|p| p.name == property.name) {
        Some(existing) => *existing = property,
        None => out.push(property),
    }
}
