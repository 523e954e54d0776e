//! Structural schema derivation.
//!
//! Walks every declaration reachable from a set of roots and produces one
//! named definition per declaration, linked with
//! `{"$ref": "#/definitions/Name"}`. Definitions appear in discovery order
//! and the serialized form is byte-stable for a given tree.

pub mod scalars;

use std::collections::{HashSet, VecDeque};

use serde::Serialize;
use serde_json::{Map, Value, json};
use tracing::debug;

pub use scalars::{
    BufferRecognizer, DateRecognizer, ScalarRecognizer, UrlRecognizer, default_recognizers,
};

use crate::document::Document;
use crate::dts::{
    DeclKind, DeclTree, Declaration, IndexSignature, Keyword, Literal, Origin, Property, TypeExpr,
};
use crate::error::ResolutionError;
use crate::metadata::DocumentKind;
use crate::transform::definition_pointer;

/// Derived schema: named definitions plus an optional root reference.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Schema {
    /// Definitions keyed by declaration name, in derivation order.
    pub definitions: Map<String, Value>,
    /// Pointer to the root definition.
    #[serde(rename = "$ref", skip_serializing_if = "Option::is_none")]
    pub root: Option<String>,
}

impl Schema {
    /// Definition named `name`.
    pub fn definition(&self, name: &str) -> Option<&Value> {
        self.definitions.get(name)
    }

    /// The schema as a JSON value.
    pub fn to_value(&self) -> Value {
        let mut out = Map::new();
        out.insert("definitions".into(), Value::Object(self.definitions.clone()));
        if let Some(root) = &self.root {
            out.insert("$ref".into(), Value::String(root.clone()));
        }
        Value::Object(out)
    }
}

/// Knobs for schema derivation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SchemaOptions {
    /// When false, object schemas without an index signature get
    /// `"additionalProperties": false`.
    pub additional_properties: bool,
}

impl Default for SchemaOptions {
    fn default() -> Self {
        Self {
            additional_properties: true,
        }
    }
}

/// Derives the schema of a (resolved, and for APIs transformed) document.
///
/// Roots are the primary interface and, for API documents, every
/// synthesized shape. Record documents point the root `$ref` at the primary.
pub fn derive_document_schema(
    document: &Document,
    recognizers: &[Box<dyn ScalarRecognizer>],
) -> Result<Schema, ResolutionError> {
    let primary = document.primary_name().to_string();
    let mut roots = vec![primary.clone()];
    if document.kind() == DocumentKind::Api {
        roots.extend(
            document
                .tree
                .iter()
                .filter(|(_, d)| d.origin == Origin::Synthesized)
                .map(|(_, d)| d.name.clone()),
        );
    }

    let options = SchemaOptions {
        additional_properties: document.metadata.additional_properties.unwrap_or(true),
    };
    let definitions = SchemaDeriver::new(&document.tree, recognizers, options).derive(&roots)?;
    let root = (document.kind() == DocumentKind::Record).then(|| definition_pointer(&primary));
    debug!(
        document = %document.metadata.id,
        definitions = definitions.len(),
        "Derived schema."
    );
    Ok(Schema { definitions, root })
}

/// Breadth-first walk from root declarations to definitions.
#[derive(Debug)]
pub struct SchemaDeriver<'t> {
    tree: &'t DeclTree,
    recognizers: &'t [Box<dyn ScalarRecognizer>],
    options: SchemaOptions,
    queue: VecDeque<String>,
    seen: HashSet<String>,
    /// Type parameters of the declaration being derived.
    type_params: Vec<String>,
}

impl<'t> SchemaDeriver<'t> {
    /// Deriver over `tree`.
    pub fn new(
        tree: &'t DeclTree,
        recognizers: &'t [Box<dyn ScalarRecognizer>],
        options: SchemaOptions,
    ) -> Self {
        Self {
            tree,
            recognizers,
            options,
            queue: VecDeque::new(),
            seen: HashSet::new(),
            type_params: Vec::new(),
        }
    }

    /// Derives definitions for `roots` and everything they reference.
    pub fn derive(mut self, roots: &[String]) -> Result<Map<String, Value>, ResolutionError> {
        for root in roots {
            self.enqueue(root);
        }
        let mut definitions = Map::new();
        while let Some(name) = self.queue.pop_front() {
            let Some((_, decl)) = self.tree.find(&name) else {
                return Err(ResolutionError::UnknownType {
                    name,
                    from: "<root>".into(),
                });
            };
            let schema = self.declaration_schema(decl)?;
            definitions.insert(name, schema);
        }
        Ok(definitions)
    }

    fn enqueue(&mut self, name: &str) {
        if self.seen.insert(name.to_string()) {
            self.queue.push_back(name.to_string());
        }
    }

    fn declaration_schema(&mut self, decl: &Declaration) -> Result<Value, ResolutionError> {
        let from = decl.name.as_str();
        let mut schema = match &decl.kind {
            DeclKind::Interface(iface) => {
                self.type_params.clone_from(&iface.type_params);
                let properties = self.tree.flattened_properties(from);
                self.object_schema(&properties, iface.index.as_ref(), from)?
            }
            DeclKind::TypeAlias(alias) => {
                self.type_params.clone_from(&alias.type_params);
                self.type_schema(&alias.ty, from)?
            }
            DeclKind::Enum(decl) => enum_schema(&decl.member_literals()),
        };
        self.type_params.clear();
        if let Some(docs) = &decl.docs {
            describe(&mut schema, docs);
        }
        Ok(schema)
    }

    fn object_schema(
        &mut self,
        properties: &[Property],
        index: Option<&IndexSignature>,
        from: &str,
    ) -> Result<Value, ResolutionError> {
        let mut props = Map::new();
        let mut required = Vec::new();
        for property in properties {
            if matches!(property.ty, TypeExpr::Function { .. }) {
                continue;
            }
            let mut schema = self.type_schema(&property.ty, from)?;
            if let Some(docs) = &property.docs {
                describe(&mut schema, docs);
            }
            props.insert(property.name.clone(), schema);
            if !property.optional {
                required.push(Value::String(property.name.clone()));
            }
        }

        let mut out = Map::new();
        out.insert("type".into(), json!("object"));
        out.insert("properties".into(), Value::Object(props));
        if !required.is_empty() {
            out.insert("required".into(), Value::Array(required));
        }
        if let Some(index) = index {
            let value = self.type_schema(&index.value, from)?;
            out.insert("additionalProperties".into(), value);
        } else if !self.options.additional_properties {
            out.insert("additionalProperties".into(), Value::Bool(false));
        }
        Ok(Value::Object(out))
    }

    fn type_schema(&mut self, ty: &TypeExpr, from: &str) -> Result<Value, ResolutionError> {
        Ok(match ty {
            TypeExpr::Keyword(keyword) => keyword_schema(*keyword),
            TypeExpr::Literal(literal) => {
                let (kind, value) = literal_value(literal);
                json!({"type": kind, "const": value})
            }
            TypeExpr::Ref { name, args } => return self.reference_schema(name, args, from),
            TypeExpr::Array(inner) => {
                json!({"type": "array", "items": self.type_schema(inner, from)?})
            }
            TypeExpr::Tuple(elements) => {
                let items = elements
                    .iter()
                    .map(|e| self.type_schema(&e.ty, from))
                    .collect::<Result<Vec<_>, _>>()?;
                let min = elements.iter().take_while(|e| !e.optional).count();
                json!({
                    "type": "array",
                    "items": items,
                    "minItems": min,
                    "maxItems": elements.len(),
                })
            }
            TypeExpr::Union(members) => return self.union_schema(members, from),
            TypeExpr::Intersection(members) => {
                let all = members
                    .iter()
                    .map(|m| self.type_schema(m, from))
                    .collect::<Result<Vec<_>, _>>()?;
                json!({ "allOf": all })
            }
            TypeExpr::Object(object) => {
                return self.object_schema(&object.properties, object.index.as_deref(), from);
            }
            // Functions carry no data.
            TypeExpr::Function { .. } => json!({}),
            TypeExpr::Marker(marker) => {
                return Err(ResolutionError::UnknownType {
                    name: marker.to_string(),
                    from: from.to_string(),
                });
            }
        })
    }

    fn reference_schema(
        &mut self,
        name: &str,
        args: &[TypeExpr],
        from: &str,
    ) -> Result<Value, ResolutionError> {
        if let Some(schema) = self.recognizers.iter().find_map(|r| r.recognize(name)) {
            return Ok(schema);
        }
        match (name, args) {
            ("Promise", [inner]) => return self.type_schema(inner, from),
            ("Array" | "ReadonlyArray", [inner]) => {
                return Ok(json!({"type": "array", "items": self.type_schema(inner, from)?}));
            }
            ("Record", [_, value]) => {
                return Ok(json!({
                    "type": "object",
                    "additionalProperties": self.type_schema(value, from)?,
                }));
            }
            _ => {}
        }
        if self.type_params.iter().any(|p| p == name) {
            return Ok(json!({}));
        }
        if self.tree.find(name).is_some() {
            self.enqueue(name);
            return Ok(json!({ "$ref": definition_pointer(name) }));
        }
        Err(ResolutionError::UnknownType {
            name: name.to_string(),
            from: from.to_string(),
        })
    }

    fn union_schema(&mut self, members: &[TypeExpr], from: &str) -> Result<Value, ResolutionError> {
        let members: Vec<&TypeExpr> = members
            .iter()
            .filter(|m| !matches!(m, TypeExpr::Keyword(Keyword::Undefined)))
            .collect();
        if let [single] = members.as_slice() {
            return self.type_schema(single, from);
        }

        let literals: Option<Vec<(&str, Value)>> = members
            .iter()
            .map(|m| match m {
                TypeExpr::Literal(literal) => Some(literal_value(literal)),
                _ => None,
            })
            .collect();
        if let Some(literals) = literals
            && let Some((kind, _)) = literals.first()
            && literals.iter().all(|(k, _)| k == kind)
        {
            let values = first_seen(literals.iter().map(|(_, v)| v.clone()));
            return Ok(json!({"type": kind, "enum": values}));
        }

        let keywords: Option<Vec<&str>> = members
            .iter()
            .map(|m| match m {
                TypeExpr::Keyword(
                    k @ (Keyword::String | Keyword::Number | Keyword::Boolean | Keyword::Null),
                ) => Some(k.as_str()),
                _ => None,
            })
            .collect();
        if let Some(keywords) = keywords {
            let keywords = first_seen(keywords);
            return Ok(match keywords.as_slice() {
                [only] => json!({ "type": only }),
                _ => json!({ "type": keywords }),
            });
        }

        let any_of = members
            .iter()
            .map(|m| self.type_schema(m, from))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(json!({ "anyOf": any_of }))
    }
}

fn keyword_schema(keyword: Keyword) -> Value {
    match keyword {
        Keyword::String => json!({"type": "string"}),
        Keyword::Number => json!({"type": "number"}),
        Keyword::Boolean => json!({"type": "boolean"}),
        Keyword::BigInt => json!({"type": "integer"}),
        Keyword::Null | Keyword::Void => json!({"type": "null"}),
        Keyword::Object => json!({"type": "object"}),
        Keyword::Any | Keyword::Unknown => json!({}),
        Keyword::Undefined | Keyword::Never => json!({"not": {}}),
    }
}

/// JSON type name and value of a literal.
fn literal_value(literal: &Literal) -> (&'static str, Value) {
    match literal {
        Literal::String(s) => ("string", Value::String(s.clone())),
        Literal::Number(n) => (
            "number",
            n.parse::<serde_json::Number>()
                .map_or_else(|_| Value::String(n.clone()), Value::Number),
        ),
        Literal::Bool(b) => ("boolean", Value::Bool(*b)),
    }
}

fn enum_schema(literals: &[Literal]) -> Value {
    let mut kinds: Vec<&str> = Vec::new();
    let mut values = Vec::new();
    for literal in literals {
        let (kind, value) = literal_value(literal);
        if !kinds.contains(&kind) {
            kinds.push(kind);
        }
        values.push(value);
    }
    let kind = match kinds.as_slice() {
        [single] => json!(single),
        _ => json!(kinds),
    };
    json!({"type": kind, "enum": values})
}

fn describe(schema: &mut Value, docs: &str) {
    if let Value::Object(map) = schema {
        map.insert("description".into(), Value::String(docs.to_string()));
    }
}

/// `items` without repeats, in first-seen order.
fn first_seen<T: PartialEq>(items: impl IntoIterator<Item = T>) -> Vec<T> {
    let mut unique = Vec::new();
    for item in items {
        if !unique.contains(&item) {
            unique.push(item);
        }
    }
    unique
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::document::parse_document;
    use crate::dts::parse_declarations;
    use crate::transform::transform_api;

    fn derive(text: &str, roots: &[&str]) -> Map<String, Value> {
        let tree = parse_declarations(text).unwrap();
        let recognizers = default_recognizers();
        let roots: Vec<String> = roots.iter().map(|r| r.to_string()).collect();
        SchemaDeriver::new(&tree, &recognizers, SchemaOptions::default())
            .derive(&roots)
            .unwrap()
    }

    #[test]
    fn test_record_schema_root_ref() {
        let doc = parse_document(
            "/*\nid: acme/widget\ntype: record\n*/\nexport default interface Widget { name: string; size: number }",
        )
        .unwrap();
        let schema = derive_document_schema(&doc, &default_recognizers()).unwrap();
        assert_eq!(
            serde_json::to_value(&schema).unwrap(),
            json!({
                "definitions": {
                    "Widget": {
                        "type": "object",
                        "properties": {
                            "name": {"type": "string"},
                            "size": {"type": "number"}
                        },
                        "required": ["name", "size"]
                    }
                },
                "$ref": "#/definitions/Widget"
            })
        );
        assert_eq!(schema.to_value(), serde_json::to_value(&schema).unwrap());
    }

    #[test]
    fn test_definitions_in_discovery_order() {
        let defs = derive(
            r#"
interface Root { b: B; a: A }
interface A { c: C }
interface B { n: number }
interface C { s: string }
interface Unused { x: string }
"#,
            &["Root"],
        );
        assert_eq!(defs.keys().collect::<Vec<_>>(), vec!["Root", "B", "A", "C"]);
        assert_eq!(defs["Root"]["properties"]["b"], json!({"$ref": "#/definitions/B"}));
    }

    #[test]
    fn test_scalar_recognizers() {
        let defs = derive(
            "interface Blob { data: Uint8Array; link: URL; at: Date; words: Int32Array[] }",
            &["Blob"],
        );
        let props = &defs["Blob"]["properties"];
        assert_eq!(props["data"], json!({"type": "string", "contentEncoding": "base64"}));
        assert_eq!(props["link"], json!({"type": "string", "format": "uri"}));
        assert_eq!(props["at"], json!({"type": "string", "format": "date-time"}));
        assert_eq!(props["words"]["items"]["contentEncoding"], json!("base64"));
        assert_eq!(defs.len(), 1);
    }

    #[test]
    fn test_type_forms() {
        let defs = derive(
            r#"
interface T {
  kind: "a" | "b"
  num: 1 | 2
  maybe?: string | undefined
  multi: string | number | null
  mixed: string | Other
  both: Other & { extra: boolean }
  pair: [key: string, len?: number]
  map: Record<string, number>
  dict: { [key: string]: Other }
  wrapped: Promise<Array<string>>
  anything: any
  nothing: void
  onChange: (value: string) => void
}
interface Other { x: number }
"#,
            &["T"],
        );
        let p = &defs["T"]["properties"];
        assert_eq!(p["kind"], json!({"type": "string", "enum": ["a", "b"]}));
        assert_eq!(p["num"], json!({"type": "number", "enum": [1, 2]}));
        assert_eq!(p["maybe"], json!({"type": "string"}));
        assert_eq!(p["multi"], json!({"type": ["string", "number", "null"]}));
        assert_eq!(
            p["mixed"],
            json!({"anyOf": [{"type": "string"}, {"$ref": "#/definitions/Other"}]})
        );
        assert_eq!(p["both"]["allOf"][0], json!({"$ref": "#/definitions/Other"}));
        assert_eq!(
            p["pair"],
            json!({"type": "array", "items": [{"type": "string"}, {"type": "number"}], "minItems": 1, "maxItems": 2})
        );
        assert_eq!(
            p["map"],
            json!({"type": "object", "additionalProperties": {"type": "number"}})
        );
        assert_eq!(
            p["dict"]["additionalProperties"],
            json!({"$ref": "#/definitions/Other"})
        );
        assert_eq!(p["wrapped"], json!({"type": "array", "items": {"type": "string"}}));
        assert_eq!(p["anything"], json!({}));
        assert_eq!(p["nothing"], json!({"type": "null"}));
        assert!(p.get("onChange").is_none());
        let required = defs["T"]["required"].as_array().unwrap();
        assert!(!required.contains(&json!("maybe")));
    }

    #[test]
    fn test_repeated_union_members_collapse() {
        let defs = derive(
            r#"
interface T {
  scattered: string | number | string
  same: boolean | boolean
  kind: "a" | "b" | "a"
}
"#,
            &["T"],
        );
        let p = &defs["T"]["properties"];
        assert_eq!(p["scattered"], json!({"type": ["string", "number"]}));
        assert_eq!(p["same"], json!({"type": "boolean"}));
        assert_eq!(p["kind"], json!({"type": "string", "enum": ["a", "b"]}));
    }

    #[test]
    fn test_inheritance_enum_and_docs() {
        let defs = derive(
            r#"
/** A labelled thing. */
interface Labelled extends Base {
  /** Shown to users. */
  label: string
  color: Color
}
interface Base { id: string }
enum Color { Red = "red", Blue = "blue" }
"#,
            &["Labelled"],
        );
        let labelled = &defs["Labelled"];
        assert_eq!(labelled["description"], json!("A labelled thing."));
        assert_eq!(
            labelled["properties"].as_object().unwrap().keys().collect::<Vec<_>>(),
            vec!["id", "label", "color"]
        );
        assert_eq!(labelled["properties"]["label"]["description"], json!("Shown to users."));
        assert_eq!(defs["Color"], json!({"type": "string", "enum": ["red", "blue"]}));
    }

    #[test]
    fn test_unknown_type() {
        let tree = parse_declarations("interface A { b: Missing }").unwrap();
        let recognizers = default_recognizers();
        let err = SchemaDeriver::new(&tree, &recognizers, SchemaOptions::default())
            .derive(&["A".to_string()])
            .unwrap_err();
        assert!(matches!(
            err,
            ResolutionError::UnknownType { ref name, ref from } if name == "Missing" && from == "A"
        ));
    }

    #[test]
    fn test_closed_objects() {
        let tree =
            parse_declarations("interface A { b: { c: string }; d: { [k: string]: number } }")
                .unwrap();
        let recognizers = default_recognizers();
        let options = SchemaOptions {
            additional_properties: false,
        };
        let defs = SchemaDeriver::new(&tree, &recognizers, options)
            .derive(&["A".to_string()])
            .unwrap();
        assert_eq!(defs["A"]["additionalProperties"], json!(false));
        assert_eq!(defs["A"]["properties"]["b"]["additionalProperties"], json!(false));
        assert_eq!(
            defs["A"]["properties"]["d"]["additionalProperties"],
            json!({"type": "number"})
        );
    }

    #[test]
    fn test_api_roots_include_shapes() {
        let mut doc = parse_document(
            "/*\nid: acme/calc\ntype: api\n*/\nexport default interface Calc { add(a: number, b: number): Promise<number> }",
        )
        .unwrap();
        transform_api(&mut doc);
        let schema = derive_document_schema(&doc, &default_recognizers()).unwrap();
        assert!(schema.root.is_none());
        assert_eq!(
            schema.definitions.keys().collect::<Vec<_>>(),
            vec!["Calc", "api_Calc_Add"]
        );
        assert_eq!(
            schema.definitions["api_Calc_Add"]["properties"]["returns"],
            json!({"type": "number"})
        );
    }
}
