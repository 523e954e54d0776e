//! Table binding for record documents.

use serde_json::Value;

use super::types::{Export, TsClass, TsItem, TsModule, TsPrimitive, TsType};
use super::{EmitContext, constructor, json_const, param, super_call};
use crate::dts::Origin;
use crate::error::EmissionError;

/// `<name>.ts`: constants, every source declaration, and the table class.
pub(crate) fn table(ctx: &EmitContext<'_>) -> Result<TsModule, EmissionError> {
    let document = ctx.document;
    let primary_name = document.primary_name();
    let profile = ctx.profile;

    let mut items = ctx.identity_consts();
    items.push(json_const("JSON_SCHEMA", true, ctx.schema, "schema")?);
    let empty = Value::Object(serde_json::Map::new());
    let templates = document.metadata.templates.as_ref().unwrap_or(&empty);
    items.push(json_const("TEMPLATES", true, templates, "templates")?);

    for (id, decl) in document.tree.iter() {
        if decl.origin != Origin::Source {
            continue;
        }
        let export = if id == document.primary {
            Export::Default
        } else if decl.exported {
            Export::Named
        } else {
            Export::None
        };
        items.push(TsItem::TypeDef(ctx.lowerer.declaration(decl, export)?));
    }

    items.push(TsItem::Class(TsClass {
        name: format!("{primary_name}Table"),
        export: Export::Named,
        extends: Some(TsType::Ref {
            name: profile.record_client.to_string(),
            args: vec![TsType::named(primary_name)],
        }),
        constructor: Some(constructor(
            vec![
                param("api", TsType::named(profile.api_client), false),
                param("dbId", TsType::Primitive(TsPrimitive::String), true),
            ],
            vec![super_call(&[
                "api",
                "dbId",
                "ID",
                "REVISION",
                "TEMPLATES",
                "JSON_SCHEMA",
            ])],
        )),
        methods: Vec::new(),
    }));

    Ok(TsModule {
        banner: ctx.banner(),
        imports: ctx.imports(&[profile.record_client, profile.api_client]),
        items,
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use crate::codegen::emit;
    use crate::document::parse_document;
    use crate::env::Environment;
    use crate::schema::{default_recognizers, derive_document_schema};
    use crate::transform::ExportMap;

    fn generate(text: &str, env: Environment) -> String {
        let doc = parse_document(text).unwrap();
        let schema = derive_document_schema(&doc, &default_recognizers()).unwrap();
        let artifacts = emit(&doc, &schema, &ExportMap::default(), env).unwrap();
        assert_eq!(artifacts.len(), 1);
        artifacts.into_iter().next().unwrap().text
    }

    #[test]
    fn test_widget_record() {
        let text = generate(
            "/*\nid: acme/widget\ntype: record\n*/\nexport default interface Widget {\n  name: string\n  size: number\n}\n",
            Environment::DenoUserland,
        );
        let expected = r##"/**
 * File generated by tsgen
 * env=deno-userland
 * DO NOT MODIFY
 */

import { AtekDbRecordClient, AtekDbApiClient } from "https://atek.cloud/x/rpc@latest/mod.ts";

export const ID = "acme/widget";
export const REVISION = undefined;
export const JSON_SCHEMA = {"definitions":{"Widget":{"type":"object","properties":{"name":{"type":"string"},"size":{"type":"number"}},"required":["name","size"]}},"$ref":"#/definitions/Widget"};
export const TEMPLATES = {};

export default interface Widget {
  name: string;
  size: number;
}

export class WidgetTable extends AtekDbRecordClient<Widget> {
  constructor(api: AtekDbApiClient, dbId?: string) {
    super(api, dbId, ID, REVISION, TEMPLATES, JSON_SCHEMA);
  }
}
"##;
        assert_eq!(text, expected);
    }

    #[test]
    fn test_templates_and_supporting_types() {
        let text = generate(
            r#"/*
id: acme/profile
type: adb-record
revision: "3"
templates:
  table:
    title: "{{/displayName}}"
*/
export default interface Profile {
  displayName: string
  avatar?: Blob
  updated: Date
}
interface Blob { mime: string; data: Uint8Array }
"#,
            Environment::NodeUserland,
        );
        assert!(text.contains("import { URL } from \"url\";\n"));
        assert!(text.contains("from \"@atek-cloud/node-rpc\";\n"));
        assert!(text.contains("export const REVISION = \"3\";\n"));
        assert!(text.contains("export const TEMPLATES = {\"table\":{\"title\":\"{{/displayName}}\"}};\n"));
        assert!(text.contains("  updated: string;\n"));
        assert!(text.contains("interface Blob {\n  mime: string;\n  data: Buffer;\n}\n"));
        assert!(!text.contains("export interface Blob"));
        assert!(text.contains("export class ProfileTable extends AtekDbRecordClient<Profile> {"));
    }
}
