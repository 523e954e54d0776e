//! The slice of TypeScript that generated stubs are built from.
//!
//! [`TsType`] covers every type form a declaration document can contain.
//! Expressions and statements only go as far as stub bodies need:
//! `this._rpc("name", [args])` and `super(...)`.

/// A type position.
#[derive(Debug, Clone, PartialEq)]
pub enum TsType {
    /// `string`, `number`, ...
    Primitive(TsPrimitive),
    /// `T[]`
    Array(Box<TsType>),
    /// `[a: T, b?: U]`
    Tuple(Vec<TsTupleElement>),
    /// `A | B`
    Union(Vec<TsType>),
    /// `A & B`
    Intersection(Vec<TsType>),
    /// Inline `{ ... }`
    Object(TsObject),
    /// Literal type.
    Literal(TsLiteral),
    /// `Item`, `Promise<T>`
    Ref { name: String, args: Vec<TsType> },
    /// `(a: T) => U`
    Function {
        params: Vec<TsParam>,
        returns: Box<TsType>,
    },
}

impl TsType {
    /// A named reference without type arguments.
    pub fn named(name: impl Into<String>) -> Self {
        Self::Ref {
            name: name.into(),
            args: Vec::new(),
        }
    }

    /// `Promise<inner>`
    pub fn promise(inner: Self) -> Self {
        Self::Ref {
            name: "Promise".into(),
            args: vec![inner],
        }
    }
}

/// Keyword types.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TsPrimitive {
    /// `string`
    String,
    /// `number`
    Number,
    /// `boolean`
    Boolean,
    /// `bigint`
    BigInt,
    /// `null`
    Null,
    /// `undefined`
    Undefined,
    /// `void`
    Void,
    /// `unknown`
    Unknown,
    /// `any`
    Any,
    /// `never`
    Never,
    /// `object`
    Object,
}

/// `[readonly] name[?]: T`
#[derive(Debug, Clone, PartialEq)]
pub struct TsProp {
    /// Property name, quoted on output when not an identifier.
    pub name: String,
    /// Property type.
    pub ty: TsType,
    /// Printed as `?`.
    pub optional: bool,
    /// Printed as `readonly`.
    pub readonly: bool,
    /// Doc comment text.
    pub docs: Option<String>,
}

/// `[key: K]: V`
#[derive(Debug, Clone, PartialEq)]
pub struct TsIndex {
    /// Name of the key binding.
    pub key_name: String,
    /// Key type.
    pub key: TsType,
    /// Value type.
    pub value: TsType,
}

/// Members of an interface body or inline object type.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct TsObject {
    /// Properties in declaration order.
    pub properties: Vec<TsProp>,
    /// Index signature, printed after the properties.
    pub index: Option<Box<TsIndex>>,
}

/// Element of a tuple type.
#[derive(Debug, Clone, PartialEq)]
pub struct TsTupleElement {
    /// Label, if the tuple is named.
    pub name: Option<String>,
    /// Element type.
    pub ty: TsType,
    /// Printed as `?`.
    pub optional: bool,
}

/// Literal value, usable as a type or an expression.
#[derive(Debug, Clone, PartialEq)]
pub enum TsLiteral {
    /// Printed double-quoted.
    String(String),
    /// Numeric literal, printed as written.
    Number(String),
    /// `true` or `false`
    Bool(bool),
}

/// `name?: T`; the type is left out for untyped constructor parameters.
#[derive(Debug, Clone, PartialEq)]
pub struct TsParam {
    /// Parameter name.
    pub name: String,
    /// Parameter type.
    pub ty: Option<TsType>,
    /// Printed as `?`.
    pub optional: bool,
}

/// Expressions used in stub bodies.
#[derive(Debug, Clone, PartialEq)]
pub enum TsExpr {
    /// Bare identifier.
    Ident(String),
    /// Literal value.
    Literal(TsLiteral),
    /// `callee(args)`
    Call {
        callee: Box<TsExpr>,
        args: Vec<TsExpr>,
    },
    /// `object.prop`
    Member { object: Box<TsExpr>, prop: String },
    /// `[a, b]`
    Array(Vec<TsExpr>),
    /// Printed verbatim, used for serialized JSON.
    Raw(String),
}

impl TsExpr {
    /// Identifier expression.
    pub fn ident(name: impl Into<String>) -> Self {
        Self::Ident(name.into())
    }

    /// `this.<method>(args)`
    pub fn this_call(method: &str, args: Vec<Self>) -> Self {
        Self::Call {
            callee: Box::new(Self::Member {
                object: Box::new(Self::ident("this")),
                prop: method.to_string(),
            }),
            args,
        }
    }
}

/// Statements used in stub bodies.
#[derive(Debug, Clone, PartialEq)]
pub enum TsStmt {
    /// Expression statement.
    Expr(TsExpr),
    /// `return;` or `return expr;`
    Return(Option<TsExpr>),
}

/// How a top-level item is exported.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Export {
    /// Not exported.
    None,
    /// `export`
    Named,
    /// `export default`
    Default,
}

/// `import { A, B } from "module";`
#[derive(Debug, Clone, PartialEq)]
pub struct TsImport {
    /// Imported names.
    pub items: Vec<ImportItem>,
    /// Module specifier.
    pub from: String,
}

/// One name inside an import list.
#[derive(Debug, Clone, PartialEq)]
pub struct ImportItem {
    /// Imported name.
    pub name: String,
}

impl ImportItem {
    /// Imports `name` as is.
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

/// Method signature inside an interface body
#[derive(Debug, Clone, PartialEq)]
pub struct TsMethodSig {
    /// Method name.
    pub name: String,
    /// Generic parameters.
    pub type_params: Vec<String>,
    /// Parameters.
    pub params: Vec<TsParam>,
    /// Return type; omitted when `None`.
    pub returns: Option<TsType>,
    /// Doc comment text.
    pub docs: Option<String>,
}

/// Body of a [`TsTypeDef`].
#[derive(Debug, Clone, PartialEq)]
pub enum TypeDefKind {
    /// interface Foo extends Bar { ... }
    Interface {
        extends: Vec<TsType>,
        body: TsObject,
        methods: Vec<TsMethodSig>,
    },
    /// `type Foo = T`
    TypeAlias { ty: TsType },
    /// [const] enum Foo { A, B = "b" }
    Enum {
        is_const: bool,
        members: Vec<(String, Option<TsLiteral>)>,
    },
}

/// A named interface, alias or enum.
#[derive(Debug, Clone, PartialEq)]
pub struct TsTypeDef {
    /// Declared name.
    pub name: String,
    /// Export form.
    pub export: Export,
    /// Generic parameters.
    pub type_params: Vec<String>,
    /// Doc comment text.
    pub docs: Option<String>,
    /// What is declared.
    pub kind: TypeDefKind,
}

/// `const NAME = init;`
#[derive(Debug, Clone, PartialEq)]
pub struct TsConst {
    /// Constant name.
    pub name: String,
    /// Printed with `export`.
    pub exported: bool,
    /// Initializer.
    pub init: TsExpr,
}

/// Method of a class, with a body
#[derive(Debug, Clone, PartialEq)]
pub struct TsClassMethod {
    /// Method name; `constructor` for constructors.
    pub name: String,
    /// Parameters.
    pub params: Vec<TsParam>,
    /// Return annotation.
    pub returns: Option<TsType>,
    /// Statements of the body.
    pub body: Vec<TsStmt>,
}

/// A class with an optional constructor and methods.
#[derive(Debug, Clone, PartialEq)]
pub struct TsClass {
    /// Class name.
    pub name: String,
    /// Export form.
    pub export: Export,
    /// Base class.
    pub extends: Option<TsType>,
    /// Constructor, printed before the methods.
    pub constructor: Option<TsClassMethod>,
    /// Methods in order.
    pub methods: Vec<TsClassMethod>,
}

/// Top-level item of a module.
#[derive(Debug, Clone, PartialEq)]
pub enum TsItem {
    /// `const` declaration.
    Const(TsConst),
    /// Interface, alias or enum.
    TypeDef(TsTypeDef),
    /// Class declaration.
    Class(TsClass),
}

/// One generated file.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct TsModule {
    /// Lines of the leading block comment.
    pub banner: Vec<String>,
    /// Import statements, printed after the banner.
    pub imports: Vec<TsImport>,
    /// Items, separated by blank lines.
    pub items: Vec<TsItem>,
}
