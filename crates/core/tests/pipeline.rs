//! End-to-end generation through the public API.

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]

use serde_json::{Value, json};
use tsgen_core::{
    Artifact, DefaultFetcher, Environment, Error, GenerateOptions, MemoryFetcher,
    ValidationError, generate, generate_interface_schemas, parse_document,
};
use url::Url;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const WIDGET: &str = r#"/*
id: acme/widget
type: record
*/
export default interface Widget {
  name: string
  size: number
}
"#;

const CHAT: &str = r#"/**
 * id: acme/chat
 * type: api
 * title: Chat
 */

/** Room-scoped chat. */
export default interface ChatApi {
  join(room: string, user: Member): Promise<void>
  send(room: string, text: string, attachment?: Uint8Array): Promise<number>
  members(room: string): Promise<Member[]>
  subscribe(room: string): ChatEvents
}

export interface ChatEvents {
  emit(name: "message", evt: { from: string; text: string; at: Date }): void
  emit(name: "member-joined", evt: Member): void
}

export interface Member {
  id: string
  homepage?: URL
}
"#;

fn base(name: &str) -> Url {
    Url::parse(&format!("mem:///docs/{name}")).unwrap()
}

async fn run(text: &str, env: &str) -> Result<Vec<Artifact>, Error> {
    let options = GenerateOptions::new(env, base("doc.d.ts")).unwrap();
    generate(text, &options, &MemoryFetcher::new()).await
}

/// Parses the JSON initializer of `const <name> = ...;`.
fn json_const(text: &str, name: &str) -> Value {
    let marker = format!("const {name} = ");
    let line = text
        .lines()
        .find_map(|line| line.split_once(&marker).map(|(_, rest)| rest))
        .unwrap_or_else(|| panic!("no constant {name}"));
    serde_json::from_str(line.trim_end_matches(';')).unwrap()
}

#[tokio::test]
async fn test_widget_record_end_to_end() {
    let artifacts = run(WIDGET, "deno-userland").await.unwrap();
    assert_eq!(artifacts.len(), 1);
    let widget = &artifacts[0];
    assert_eq!(widget.name, "widget.ts");
    assert!(widget.text.contains("export const ID = \"acme/widget\";\n"));
    assert!(widget.text.contains("export const REVISION = undefined;\n"));
    assert!(widget.text.contains("export class WidgetTable extends AtekDbRecordClient<Widget>"));

    let schema = json_const(&widget.text, "JSON_SCHEMA");
    assert_eq!(schema["$ref"], json!("#/definitions/Widget"));
    assert_eq!(
        schema["definitions"]["Widget"]["properties"],
        json!({"name": {"type": "string"}, "size": {"type": "number"}})
    );
}

#[tokio::test]
async fn test_output_is_deterministic() {
    for env in Environment::ALL {
        for text in [WIDGET, CHAT] {
            let first = run(text, env.as_str()).await.unwrap();
            let second = run(text, env.as_str()).await.unwrap();
            assert_eq!(first, second, "{env}");
            assert!(first[0].text.contains(&format!(" * env={env}\n")));
        }
    }
}

#[tokio::test]
async fn test_export_map_covers_methods_and_events() {
    let artifacts = run(CHAT, "node-userland").await.unwrap();
    let names: Vec<_> = artifacts.iter().map(|a| a.name.as_str()).collect();
    assert_eq!(names, vec!["chat.ts", "chat.server.ts"]);

    let client = &artifacts[0].text;
    let exports = json_const(client, "EXPORT_MAP");
    let schemas = json_const(client, "SCHEMAS");
    for method in ["join", "send", "members", "subscribe"] {
        let pointer = exports["methods"][method].as_str().unwrap();
        let name = pointer.strip_prefix("#/definitions/").unwrap();
        assert!(schemas["definitions"].get(name).is_some(), "{method}");
    }
    for event in ["message", "member-joined"] {
        let pointer = exports["events"]["ChatEvents"][event].as_str().unwrap();
        let name = pointer.strip_prefix("#/definitions/").unwrap();
        assert!(schemas["definitions"].get(name).is_some(), "{event}");
    }
    assert_eq!(
        schemas["definitions"]["evt_ChatEvents_MemberJoined"]["required"],
        json!(["id"])
    );
    assert_eq!(json_const(&artifacts[1].text, "EXPORT_MAP"), exports);

    assert!(client.contains("export default class ChatApiClient extends AtekRpcClient {"));
    assert!(client.contains(
        "  send(room: string, text: string, attachment?: Buffer): Promise<number> {\n    return this._rpc(\"send\", [room, text, attachment]);\n  }\n"
    ));
    assert!(client.contains("  members(room: string): Promise<Member[]> {"));
    assert!(client.contains(
        "  on(name: \"message\", handler: (evt: { from: string; text: string; at: string }) => void): void;\n"
    ));
    assert!(client.contains("export interface Member {\n  id: string;\n  homepage?: URL;\n}\n"));
}

#[test]
fn test_scalar_lowering_in_schema() {
    let mut document = parse_document(CHAT).unwrap();
    let (schema, _) = generate_interface_schemas(&mut document).unwrap();

    let send = schema.definition("api_ChatApi_Send").unwrap();
    assert_eq!(
        send["properties"]["params"]["items"][2],
        json!({"type": "string", "contentEncoding": "base64"})
    );
    let member = schema.definition("Member").unwrap();
    assert_eq!(
        member["properties"]["homepage"],
        json!({"type": "string", "format": "uri"})
    );
    assert_eq!(
        schema.definition("evt_ChatEvents_Message").unwrap()["properties"]["at"],
        json!({"type": "string", "format": "date-time"})
    );
}

#[test]
fn test_unknown_environment_yields_no_artifacts() {
    let err = GenerateOptions::new("browser-userland", base("doc.d.ts")).unwrap_err();
    assert!(matches!(err, ValidationError::UnknownEnvironment(ref env) if env == "browser-userland"));
}

#[tokio::test]
async fn test_cross_document_types_are_inlined() {
    let fetcher = MemoryFetcher::new()
        .with(
            &base("common.d.ts"),
            "export interface Money { amount: number; currency: Currency }\nexport type Currency = \"usd\" | \"eur\"",
        )
        .with(&base("catalog/item.d.ts"), "export interface Item { sku: string }");
    let text = r#"/*
id: acme/shop
type: api
*/
import { Money } from "./common.d.ts"
export default interface ShopApi {
  price(item: import("./catalog/item.d.ts").Item): Promise<Money>
  sku(item: string): Promise<import("./catalog/item.d.ts#/Item/sku")>
}
"#;
    let options = GenerateOptions::new("deno-userland", base("shop.d.ts")).unwrap();
    let artifacts = generate(text, &options, &fetcher).await.unwrap();
    let client = &artifacts[0].text;

    assert!(client.contains("  price(item: Item): Promise<Money> {"));
    assert!(client.contains("  sku(item: string): Promise<string> {"));
    assert!(client.contains("export interface Money {\n  amount: number;\n  currency: Currency;\n}\n"));
    assert!(client.contains("export type Currency = \"usd\" | \"eur\";\n"));
    assert!(client.contains("export interface Item {\n  sku: string;\n}\n"));

    let schemas = json_const(client, "SCHEMAS");
    assert_eq!(
        schemas["definitions"]["Currency"],
        json!({"type": "string", "enum": ["usd", "eur"]})
    );
}

#[tokio::test]
async fn test_missing_reference_fails_whole_document() {
    let text = "/*\nid: acme/broken\ntype: record\n*/\nexport default interface Broken { part: import(\"./gone.d.ts#/Part\") }";
    let err = run(text, "host").await.unwrap_err();
    assert_eq!(err.document(), "acme/broken");
    assert!(matches!(err, Error::Resolution { .. }));
}

#[tokio::test]
async fn test_http_references() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/schemas/types.d.ts"))
        .respond_with(
            ResponseTemplate::new(200).set_body_string("export interface Dimensions { w: number; h: number }"),
        )
        .expect(1)
        .mount(&server)
        .await;

    let text = r#"/*
id: acme/frame
type: record
revision: 1.2
*/
import { Dimensions } from "./types.d.ts"
export default interface Frame { size: Dimensions }
"#;
    let base = Url::parse(&format!("{}/schemas/frame.d.ts", server.uri())).unwrap();
    let options = GenerateOptions::new("host", base).unwrap();
    let artifacts = generate(text, &options, &DefaultFetcher::new()).await.unwrap();
    let frame = &artifacts[0].text;

    assert!(frame.contains("export const REVISION = \"1.2\";\n"));
    assert!(frame.contains("import { AtekDbRecordClient, AtekDbApiClient } from \"@atek-cloud/api-broker\";\n"));
    let schema = json_const(frame, "JSON_SCHEMA");
    assert_eq!(
        schema["definitions"]["Dimensions"]["required"],
        json!(["w", "h"])
    );
}

#[tokio::test]
async fn test_file_references() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(
        dir.path().join("tags.d.ts"),
        "export type Tag = { label: string; color?: string }",
    )
    .unwrap();
    let text = r#"/*
id: acme/note
type: record
*/
export default interface Note {
  body: string
  tags: import("./tags.d.ts").Tag[]
}
"#;
    let base = Url::from_file_path(dir.path().join("note.d.ts")).unwrap();
    let options = GenerateOptions::new("deno-userland", base).unwrap();
    let artifacts = generate(text, &options, &DefaultFetcher::new()).await.unwrap();
    let note = &artifacts[0].text;

    assert!(note.contains("  tags: Tag[];\n"));
    assert!(note.contains("export type Tag = { label: string; color?: string };\n"));
}
