//! Recursive-descent parser for the supported TypeScript declaration subset.

use super::lexer::{Lexer, Token, TokenKind};
use super::{
    DeclKind, DeclTree, Declaration, EnumDecl, EnumMember, EnumValue, ImportDecl, ImportName,
    IndexSignature, Interface, Keyword, Literal, Method, ObjectType, Origin, Param, Property,
    RefMarker, TupleElement, TypeAlias, TypeExpr,
};
use crate::error::ParseError;

/// Parses declaration text into a [`DeclTree`].
///
/// A `/** … */` comment before the first declaration documents it.
pub fn parse_declarations(text: &str) -> Result<DeclTree, ParseError> {
    let tokens = Lexer::tokenize(text)?;
    Parser::new(tokens).parse_tree()
}

/// Like [`parse_declarations`], for text whose opening block comment is a
/// metadata block.
pub fn parse_declarations_after_metadata(text: &str) -> Result<DeclTree, ParseError> {
    let tokens = Lexer::new(text).after_metadata().collect_tokens()?;
    Parser::new(tokens).parse_tree()
}

struct Parser {
    tokens: Vec<Token>,
    pos: usize,
}

/// Leading modifiers of a top-level statement.
#[derive(Default)]
struct Modifiers {
    exported: bool,
    is_default: bool,
    docs: Option<String>,
}

impl Parser {
    fn new(tokens: Vec<Token>) -> Self {
        Self { tokens, pos: 0 }
    }

    fn peek(&self) -> &Token {
        self.peek_at(0)
    }

    fn peek_at(&self, offset: usize) -> &Token {
        let idx = (self.pos + offset).min(self.tokens.len().saturating_sub(1));
        &self.tokens[idx]
    }

    fn at(&self, kind: &TokenKind) -> bool {
        &self.peek().kind == kind
    }

    fn at_ident(&self, name: &str) -> bool {
        matches!(&self.peek().kind, TokenKind::Ident(n) if n == name)
    }

    fn bump(&mut self) -> Token {
        let token = self.peek().clone();
        if token.kind != TokenKind::Eof {
            self.pos += 1;
        }
        token
    }

    fn eat(&mut self, kind: &TokenKind) -> bool {
        if self.at(kind) {
            self.bump();
            true
        } else {
            false
        }
    }

    fn expect(&mut self, kind: &TokenKind) -> Result<Token, ParseError> {
        if self.at(kind) {
            Ok(self.bump())
        } else {
            Err(self.unexpected(&kind.describe()))
        }
    }

    fn expect_ident(&mut self) -> Result<String, ParseError> {
        match &self.peek().kind {
            TokenKind::Ident(name) => {
                let name = name.clone();
                self.bump();
                Ok(name)
            }
            _ => Err(self.unexpected("identifier")),
        }
    }

    fn expect_keyword(&mut self, keyword: &str) -> Result<(), ParseError> {
        if self.at_ident(keyword) {
            self.bump();
            Ok(())
        } else {
            Err(self.unexpected(&format!("'{keyword}'")))
        }
    }

    fn unexpected(&self, expected: &str) -> ParseError {
        let token = self.peek();
        ParseError::syntax(
            token.span.line,
            token.span.column,
            format!("expected {expected}, found {}", token.kind.describe()),
        )
    }

    fn unsupported(&self, construct: &str) -> ParseError {
        let token = self.peek();
        ParseError::unsupported(token.span.line, token.span.column, construct)
    }

    // ---- statements ----------------------------------------------------------

    fn parse_tree(&mut self) -> Result<DeclTree, ParseError> {
        let mut tree = DeclTree::new();
        loop {
            if self.eat(&TokenKind::Semi) {
                continue;
            }
            if self.at(&TokenKind::Eof) {
                return Ok(tree);
            }
            if self.at_ident("import") {
                let import = self.parse_import()?;
                tree.push_import(import);
                continue;
            }
            let decl = self.parse_declaration()?;
            tree.push(decl);
        }
    }

    fn parse_import(&mut self) -> Result<ImportDecl, ParseError> {
        self.expect_keyword("import")?;
        let type_only = self.at_ident("type") && self.peek_at(1).kind == TokenKind::LBrace;
        if type_only {
            self.bump();
        }
        if !self.at(&TokenKind::LBrace) {
            return Err(self.unsupported("import form other than a named import list"));
        }
        self.bump();

        let mut names = Vec::new();
        while !self.at(&TokenKind::RBrace) {
            if self.at_ident("type") && matches!(self.peek_at(1).kind, TokenKind::Ident(_)) {
                self.bump();
            }
            let imported = self.expect_ident()?;
            let local = if self.at_ident("as") {
                self.bump();
                self.expect_ident()?
            } else {
                imported.clone()
            };
            names.push(ImportName { imported, local });
            if !self.eat(&TokenKind::Comma) {
                break;
            }
        }
        self.expect(&TokenKind::RBrace)?;
        self.expect_keyword("from")?;
        let location = match &self.peek().kind {
            TokenKind::Str(s) => s.clone(),
            _ => return Err(self.unexpected("module location string")),
        };
        self.bump();
        self.eat(&TokenKind::Semi);

        Ok(ImportDecl {
            location,
            names,
            type_only,
        })
    }

    fn parse_declaration(&mut self) -> Result<Declaration, ParseError> {
        let mut modifiers = Modifiers {
            docs: self.peek().doc.clone(),
            ..Modifiers::default()
        };
        if self.at_ident("export") {
            self.bump();
            modifiers.exported = true;
            if self.at(&TokenKind::LBrace) {
                return Err(self.unsupported("export list"));
            }
            if self.at_ident("default") {
                self.bump();
                modifiers.is_default = true;
            }
        }
        if self.at_ident("declare") {
            self.bump();
        }

        match &self.peek().kind {
            TokenKind::Ident(kw) if kw == "interface" => self.parse_interface(modifiers),
            TokenKind::Ident(kw) if kw == "type" => self.parse_type_alias(modifiers),
            TokenKind::Ident(kw) if kw == "enum" => self.parse_enum(modifiers, false),
            TokenKind::Ident(kw) if kw == "const" && self.peek_at(1).kind == ident("enum") => {
                self.bump();
                self.parse_enum(modifiers, true)
            }
            TokenKind::Ident(kw)
                if matches!(
                    kw.as_str(),
                    "class" | "function" | "const" | "let" | "var" | "namespace" | "module"
                        | "abstract"
                ) =>
            {
                Err(self.unsupported(&format!("'{kw}' declaration")))
            }
            _ => Err(self.unexpected("'interface', 'type' or 'enum'")),
        }
    }

    fn parse_interface(&mut self, modifiers: Modifiers) -> Result<Declaration, ParseError> {
        self.expect_keyword("interface")?;
        let name = self.expect_ident()?;
        let type_params = self.parse_type_params()?;

        let mut extends = Vec::new();
        if self.at_ident("extends") {
            self.bump();
            loop {
                extends.push(self.parse_type()?);
                if !self.eat(&TokenKind::Comma) {
                    break;
                }
            }
        }

        let body = self.parse_members()?;
        Ok(Declaration {
            name,
            exported: modifiers.exported,
            is_default: modifiers.is_default,
            origin: Origin::Source,
            docs: modifiers.docs,
            kind: DeclKind::Interface(Interface {
                type_params,
                extends,
                properties: body.properties,
                methods: body.methods,
                index: body.index,
            }),
        })
    }

    fn parse_type_alias(&mut self, modifiers: Modifiers) -> Result<Declaration, ParseError> {
        if modifiers.is_default {
            return Err(self.unsupported("default-exported type alias"));
        }
        self.expect_keyword("type")?;
        let name = self.expect_ident()?;
        let type_params = self.parse_type_params()?;
        self.expect(&TokenKind::Eq)?;
        let ty = self.parse_type()?;
        self.eat(&TokenKind::Semi);
        Ok(Declaration {
            name,
            exported: modifiers.exported,
            is_default: false,
            origin: Origin::Source,
            docs: modifiers.docs,
            kind: DeclKind::TypeAlias(TypeAlias { type_params, ty }),
        })
    }

    fn parse_enum(&mut self, modifiers: Modifiers, is_const: bool) -> Result<Declaration, ParseError> {
        if modifiers.is_default {
            return Err(self.unsupported("default-exported enum"));
        }
        self.expect_keyword("enum")?;
        let name = self.expect_ident()?;
        self.expect(&TokenKind::LBrace)?;
        let mut members = Vec::new();
        while !self.at(&TokenKind::RBrace) {
            let member = match &self.peek().kind {
                TokenKind::Ident(n) | TokenKind::Str(n) => n.clone(),
                _ => return Err(self.unexpected("enum member name")),
            };
            self.bump();
            let value = if self.eat(&TokenKind::Eq) {
                match &self.peek().kind {
                    TokenKind::Str(s) => Some(EnumValue::String(s.clone())),
                    TokenKind::Number(n) => Some(EnumValue::Number(n.clone())),
                    _ => return Err(self.unsupported("computed enum initializer")),
                }
            } else {
                None
            };
            if value.is_some() {
                self.bump();
            }
            members.push(EnumMember {
                name: member,
                value,
            });
            if !self.eat(&TokenKind::Comma) {
                break;
            }
        }
        self.expect(&TokenKind::RBrace)?;
        Ok(Declaration {
            name,
            exported: modifiers.exported,
            is_default: false,
            origin: Origin::Source,
            docs: modifiers.docs,
            kind: DeclKind::Enum(EnumDecl { is_const, members }),
        })
    }

    /// `<T, U extends X = Y>`; constraints and defaults are parsed and dropped.
    fn parse_type_params(&mut self) -> Result<Vec<String>, ParseError> {
        let mut params = Vec::new();
        if !self.eat(&TokenKind::LAngle) {
            return Ok(params);
        }
        loop {
            params.push(self.expect_ident()?);
            if self.at_ident("extends") {
                self.bump();
                self.parse_type()?;
            }
            if self.eat(&TokenKind::Eq) {
                self.parse_type()?;
            }
            if !self.eat(&TokenKind::Comma) {
                break;
            }
        }
        self.expect(&TokenKind::RAngle)?;
        Ok(params)
    }

    // ---- members -------------------------------------------------------------

    fn parse_members(&mut self) -> Result<MemberList, ParseError> {
        self.expect(&TokenKind::LBrace)?;
        let mut list = MemberList::default();
        while !self.at(&TokenKind::RBrace) {
            self.parse_member(&mut list)?;
            if self.eat(&TokenKind::Semi) || self.eat(&TokenKind::Comma) {
                continue;
            }
            if !self.at(&TokenKind::RBrace) && !self.peek().newline_before {
                return Err(self.unexpected("';', ',' or newline"));
            }
        }
        self.expect(&TokenKind::RBrace)?;
        Ok(list)
    }

    fn parse_member(&mut self, list: &mut MemberList) -> Result<(), ParseError> {
        let docs = self.peek().doc.clone();

        if self.at(&TokenKind::LBracket) {
            let is_index = matches!(self.peek_at(1).kind, TokenKind::Ident(_))
                && self.peek_at(2).kind == TokenKind::Colon;
            if !is_index {
                return Err(self.unsupported("computed property name"));
            }
            self.bump();
            let key_name = self.expect_ident()?;
            self.expect(&TokenKind::Colon)?;
            let key = self.parse_type()?;
            self.expect(&TokenKind::RBracket)?;
            self.expect(&TokenKind::Colon)?;
            let value = self.parse_type()?;
            list.index = Some(IndexSignature {
                key_name,
                key,
                value,
            });
            return Ok(());
        }

        let mut readonly = false;
        if self.at_ident("readonly") && self.starts_member_name(1) {
            self.bump();
            readonly = true;
        }
        if (self.at_ident("get") || self.at_ident("set")) && self.starts_member_name(1) {
            return Err(self.unsupported("accessor member"));
        }

        let name = match &self.peek().kind {
            TokenKind::Ident(n) | TokenKind::Str(n) | TokenKind::Number(n) => n.clone(),
            _ => return Err(self.unexpected("member name")),
        };
        self.bump();
        let optional = self.eat(&TokenKind::Question);

        if self.at(&TokenKind::LParen) || self.at(&TokenKind::LAngle) {
            let type_params = self.parse_type_params()?;
            let params = self.parse_params()?;
            let returns = if self.eat(&TokenKind::Colon) {
                Some(self.parse_type()?)
            } else {
                None
            };
            list.methods.push(Method {
                name,
                type_params,
                params,
                returns,
                docs,
            });
            return Ok(());
        }

        let ty = if self.eat(&TokenKind::Colon) {
            self.parse_type()?
        } else {
            TypeExpr::Keyword(Keyword::Any)
        };
        list.properties.push(Property {
            name,
            ty,
            optional,
            readonly,
            docs,
        });
        Ok(())
    }

    /// Whether the token at `offset` can start a member name, so the
    /// identifier before it is a modifier rather than the name itself.
    fn starts_member_name(&self, offset: usize) -> bool {
        matches!(
            self.peek_at(offset).kind,
            TokenKind::Ident(_) | TokenKind::Str(_) | TokenKind::Number(_) | TokenKind::LBracket
        )
    }

    fn parse_params(&mut self) -> Result<Vec<Param>, ParseError> {
        self.expect(&TokenKind::LParen)?;
        let mut params = Vec::new();
        while !self.at(&TokenKind::RParen) {
            if self.at(&TokenKind::Ellipsis) {
                return Err(self.unsupported("rest parameter"));
            }
            if self.at(&TokenKind::LBrace) || self.at(&TokenKind::LBracket) {
                return Err(self.unsupported("destructured parameter"));
            }
            let name = self.expect_ident()?;
            let optional = self.eat(&TokenKind::Question);
            let ty = if self.eat(&TokenKind::Colon) {
                self.parse_type()?
            } else {
                TypeExpr::Keyword(Keyword::Any)
            };
            params.push(Param { name, ty, optional });
            if !self.eat(&TokenKind::Comma) {
                break;
            }
        }
        self.expect(&TokenKind::RParen)?;
        Ok(params)
    }

    // ---- types ---------------------------------------------------------------

    fn parse_type(&mut self) -> Result<TypeExpr, ParseError> {
        self.eat(&TokenKind::Pipe);
        let first = self.parse_intersection()?;
        if !self.at(&TokenKind::Pipe) {
            return Ok(first);
        }
        let mut members = vec![first];
        while self.eat(&TokenKind::Pipe) {
            members.push(self.parse_intersection()?);
        }
        Ok(TypeExpr::Union(members))
    }

    fn parse_intersection(&mut self) -> Result<TypeExpr, ParseError> {
        self.eat(&TokenKind::Amp);
        let first = self.parse_postfix()?;
        if !self.at(&TokenKind::Amp) {
            return Ok(first);
        }
        let mut members = vec![first];
        while self.eat(&TokenKind::Amp) {
            members.push(self.parse_postfix()?);
        }
        Ok(TypeExpr::Intersection(members))
    }

    fn parse_postfix(&mut self) -> Result<TypeExpr, ParseError> {
        let mut ty = self.parse_primary()?;
        while self.at(&TokenKind::LBracket) && !self.peek().newline_before {
            if self.peek_at(1).kind != TokenKind::RBracket {
                return Err(self.unsupported("indexed access type"));
            }
            self.bump();
            self.bump();
            ty = TypeExpr::Array(Box::new(ty));
        }
        Ok(ty)
    }

    fn parse_primary(&mut self) -> Result<TypeExpr, ParseError> {
        let token = self.peek().clone();
        match token.kind {
            TokenKind::LParen => {
                if self.is_function_type() {
                    self.parse_function_type()
                } else {
                    self.bump();
                    let inner = self.parse_type()?;
                    self.expect(&TokenKind::RParen)?;
                    Ok(inner)
                }
            }
            TokenKind::LAngle => Err(self.unsupported("generic function type")),
            TokenKind::LBrace => {
                let body = self.parse_members()?;
                let mut properties = body.properties;
                for method in body.methods {
                    properties.push(Property {
                        name: method.name,
                        ty: TypeExpr::Function {
                            params: method.params,
                            returns: Box::new(
                                method.returns.unwrap_or(TypeExpr::Keyword(Keyword::Any)),
                            ),
                        },
                        optional: false,
                        readonly: false,
                        docs: method.docs,
                    });
                }
                Ok(TypeExpr::Object(ObjectType {
                    properties,
                    index: body.index.map(Box::new),
                }))
            }
            TokenKind::LBracket => self.parse_tuple(),
            TokenKind::Str(s) => {
                self.bump();
                Ok(TypeExpr::Literal(Literal::String(s)))
            }
            TokenKind::Number(n) => {
                self.bump();
                Ok(TypeExpr::Literal(Literal::Number(n)))
            }
            TokenKind::Ident(name) => self.parse_named(&name),
            _ => Err(self.unexpected("type")),
        }
    }

    fn parse_named(&mut self, name: &str) -> Result<TypeExpr, ParseError> {
        let followed_by_dot = self.peek_at(1).kind == TokenKind::Dot;
        match name {
            "true" | "false" => {
                self.bump();
                return Ok(TypeExpr::Literal(Literal::Bool(name == "true")));
            }
            "import" if self.peek_at(1).kind == TokenKind::LParen => return self.parse_marker(),
            "typeof" | "keyof" | "infer" | "unique" | "asserts" | "new" | "abstract" => {
                return Err(self.unsupported(&format!("'{name}' type operator")));
            }
            _ => {}
        }
        if !followed_by_dot && let Some(keyword) = Keyword::from_name(name) {
            self.bump();
            return Ok(TypeExpr::Keyword(keyword));
        }

        let mut qualified = self.expect_ident()?;
        while self.eat(&TokenKind::Dot) {
            qualified.push('.');
            qualified.push_str(&self.expect_ident()?);
        }
        let args = self.parse_type_args()?;
        Ok(TypeExpr::Ref {
            name: qualified,
            args,
        })
    }

    fn parse_type_args(&mut self) -> Result<Vec<TypeExpr>, ParseError> {
        let mut args = Vec::new();
        if !self.eat(&TokenKind::LAngle) {
            return Ok(args);
        }
        loop {
            args.push(self.parse_type()?);
            if !self.eat(&TokenKind::Comma) {
                break;
            }
        }
        self.expect(&TokenKind::RAngle)?;
        Ok(args)
    }

    /// `import("location#/pointer").Qualifier.Name`
    fn parse_marker(&mut self) -> Result<TypeExpr, ParseError> {
        self.expect_keyword("import")?;
        self.expect(&TokenKind::LParen)?;
        let specifier = match &self.peek().kind {
            TokenKind::Str(s) => s.clone(),
            _ => return Err(self.unexpected("reference location string")),
        };
        self.bump();
        self.expect(&TokenKind::RParen)?;
        let mut qualifiers = Vec::new();
        while self.eat(&TokenKind::Dot) {
            qualifiers.push(self.expect_ident()?);
        }
        if self.at(&TokenKind::LAngle) {
            return Err(self.unsupported("type arguments on an import type"));
        }
        Ok(TypeExpr::Marker(RefMarker::from_specifier(
            &specifier,
            &qualifiers,
        )))
    }

    fn parse_tuple(&mut self) -> Result<TypeExpr, ParseError> {
        self.expect(&TokenKind::LBracket)?;
        let mut elements = Vec::new();
        while !self.at(&TokenKind::RBracket) {
            if self.at(&TokenKind::Ellipsis) {
                return Err(self.unsupported("rest element in tuple"));
            }
            let labeled = matches!(self.peek().kind, TokenKind::Ident(_))
                && (self.peek_at(1).kind == TokenKind::Colon
                    || (self.peek_at(1).kind == TokenKind::Question
                        && self.peek_at(2).kind == TokenKind::Colon));
            let mut name = None;
            let mut optional = false;
            if labeled {
                name = Some(self.expect_ident()?);
                optional = self.eat(&TokenKind::Question);
                self.expect(&TokenKind::Colon)?;
            }
            let ty = self.parse_type()?;
            if self.eat(&TokenKind::Question) {
                optional = true;
            }
            elements.push(TupleElement { name, ty, optional });
            if !self.eat(&TokenKind::Comma) {
                break;
            }
        }
        self.expect(&TokenKind::RBracket)?;
        Ok(TypeExpr::Tuple(elements))
    }

    /// Looks past the balanced parentheses at the cursor for `=>`.
    fn is_function_type(&self) -> bool {
        let mut depth = 0usize;
        let mut idx = self.pos;
        while let Some(token) = self.tokens.get(idx) {
            match token.kind {
                TokenKind::LParen => depth += 1,
                TokenKind::RParen => {
                    depth -= 1;
                    if depth == 0 {
                        return self
                            .tokens
                            .get(idx + 1)
                            .is_some_and(|t| t.kind == TokenKind::Arrow);
                    }
                }
                TokenKind::Eof => return false,
                _ => {}
            }
            idx += 1;
        }
        false
    }

    fn parse_function_type(&mut self) -> Result<TypeExpr, ParseError> {
        let params = self.parse_params()?;
        self.expect(&TokenKind::Arrow)?;
        let returns = self.parse_type()?;
        Ok(TypeExpr::Function {
            params,
            returns: Box::new(returns),
        })
    }
}

#[derive(Default)]
struct MemberList {
    properties: Vec<Property>,
    methods: Vec<Method>,
    index: Option<IndexSignature>,
}

fn ident(name: &str) -> TokenKind {
    TokenKind::Ident(name.to_string())
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
mod tests {
    use super::*;

    fn parse(text: &str) -> DeclTree {
        parse_declarations(text).unwrap()
    }

    fn iface<'a>(tree: &'a DeclTree, name: &str) -> &'a Interface {
        tree.interface(name).unwrap()
    }

    fn alias_type<'a>(tree: &'a DeclTree, name: &str) -> &'a TypeExpr {
        match &tree.find(name).unwrap().1.kind {
            DeclKind::TypeAlias(alias) => &alias.ty,
            other => panic!("expected alias, got {other:?}"),
        }
    }

    #[test]
    fn test_parse_record_interface() {
        let tree = parse(
            r#"/*
id: acme/widget
type: record
*/
/** A widget. */
export default interface Widget {
  /** Display name. */
  name: string
  size: number;
  readonly tags?: string[],
  "quoted-key": boolean
}
"#,
        );
        let (_, decl) = tree.find("Widget").unwrap();
        assert!(decl.is_default && decl.exported);
        assert_eq!(decl.docs.as_deref(), Some("A widget."));
        let widget = iface(&tree, "Widget");
        let names: Vec<_> = widget.properties.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, vec!["name", "size", "tags", "quoted-key"]);
        assert_eq!(widget.properties[0].docs.as_deref(), Some("Display name."));
        assert!(widget.properties[2].optional && widget.properties[2].readonly);
        assert_eq!(
            widget.properties[2].ty,
            TypeExpr::Array(Box::new(TypeExpr::Keyword(Keyword::String)))
        );
    }

    #[test]
    fn test_parse_methods_and_events() {
        let tree = parse(
            r#"
export default interface ChatApi {
  send(room: string, text?: string): Promise<void>
  list(): Promise<Message[]>
  subscribe(room: string): ChatEvents
}
export interface ChatEvents {
  emit(name: "message", evt: { text: string }): void
}
export interface Message { text: string }
"#,
        );
        let api = iface(&tree, "ChatApi");
        assert_eq!(api.methods.len(), 3);
        assert!(api.methods[0].params[1].optional);
        assert_eq!(api.methods[1].unwrapped_return().to_string_debug(), "Array(Message)");

        let events = iface(&tree, "ChatEvents");
        let (event, payload) = events.methods[0]
            .event_signature(|n| tree.interface(n).is_some())
            .unwrap();
        assert_eq!(event, "message");
        assert!(matches!(payload, TypeExpr::Object(_)));
    }

    #[test]
    fn test_parse_type_forms() {
        let tree = parse(
            r##"
type A = "a" | "b" | 3 | true
type B = { x: number } & Base
type C = (err: Error, value?: string) => void
type D = [key: string, len?: number]
type E = Record<string, Array<number>>
type F = (string | number)[]
type G = ns.Inner<T>
type H = import("./other.d.ts#/Foo/bar")
type I = import("https://x.test/a.d.ts").Foo
type J = import("#/Widget/size")
"##,
        );
        assert!(matches!(alias_type(&tree, "A"), TypeExpr::Union(m) if m.len() == 4));
        assert!(matches!(alias_type(&tree, "B"), TypeExpr::Intersection(m) if m.len() == 2));
        let TypeExpr::Function { params, .. } = alias_type(&tree, "C") else {
            panic!("expected function type");
        };
        assert_eq!(params.len(), 2);
        let TypeExpr::Tuple(elements) = alias_type(&tree, "D") else {
            panic!("expected tuple");
        };
        assert_eq!(elements[0].name.as_deref(), Some("key"));
        assert!(elements[1].optional);
        assert!(matches!(alias_type(&tree, "F"), TypeExpr::Array(inner) if matches!(**inner, TypeExpr::Union(_))));
        assert!(matches!(alias_type(&tree, "G"), TypeExpr::Ref { name, args } if name == "ns.Inner" && args.len() == 1));

        let TypeExpr::Marker(h) = alias_type(&tree, "H") else {
            panic!("expected marker");
        };
        assert_eq!(h.location.as_deref(), Some("./other.d.ts"));
        assert_eq!(h.pointer, "/Foo/bar");
        let TypeExpr::Marker(i) = alias_type(&tree, "I") else {
            panic!("expected marker");
        };
        assert_eq!(i.pointer, "/Foo");
        let TypeExpr::Marker(j) = alias_type(&tree, "J") else {
            panic!("expected marker");
        };
        assert!(j.location.is_none());
    }

    #[test]
    fn test_parse_imports_and_enums() {
        let tree = parse(
            r#"
import { Foo, Bar as Baz } from "./other.d.ts";
import type { Qux } from "https://x.test/q.d.ts"
export const enum Color { Red = "red", Green = "green" }
enum Level { Low, High = 10 }
"#,
        );
        assert_eq!(tree.imports().len(), 2);
        assert_eq!(tree.imports()[0].names[1].imported, "Bar");
        assert_eq!(tree.imports()[0].names[1].local, "Baz");
        assert!(tree.imports()[1].type_only);
        let DeclKind::Enum(color) = &tree.find("Color").unwrap().1.kind else {
            panic!("expected enum");
        };
        assert!(color.is_const);
        assert_eq!(color.members[1].value, Some(EnumValue::String("green".into())));
        let DeclKind::Enum(level) = &tree.find("Level").unwrap().1.kind else {
            panic!("expected enum");
        };
        assert_eq!(level.members[0].value, None);
    }

    #[test]
    fn test_index_signature_and_extends() {
        let tree = parse("interface Map extends Base, Other<T> { [key: string]: number }");
        let map = iface(&tree, "Map");
        assert_eq!(map.extends.len(), 2);
        assert_eq!(map.index.as_ref().unwrap().value, TypeExpr::Keyword(Keyword::Number));
    }

    #[test]
    fn test_rest_parameter_rejected() {
        let err = parse_declarations("interface A { f(...args: string[]): void }").unwrap_err();
        assert!(matches!(err, ParseError::Unsupported { line: 1, .. }));
    }

    #[test]
    fn test_syntax_error_has_position() {
        let err = parse_declarations("interface A {\n  name string\n}").unwrap_err();
        let ParseError::Syntax { line, column, .. } = err else {
            panic!("expected syntax error");
        };
        assert_eq!((line, column), (2, 8));
    }

    trait DebugShape {
        fn to_string_debug(&self) -> String;
    }

    impl DebugShape for TypeExpr {
        fn to_string_debug(&self) -> String {
            match self {
                TypeExpr::Array(inner) => format!("Array({})", inner.to_string_debug()),
                TypeExpr::Ref { name, .. } => name.clone(),
                other => format!("{other:?}"),
            }
        }
    }
}
