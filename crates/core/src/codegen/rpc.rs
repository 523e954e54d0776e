//! Client and server stubs for API documents.

use super::types::{
    Export, TsClass, TsClassMethod, TsExpr, TsItem, TsLiteral, TsMethodSig, TsModule, TsObject,
    TsPrimitive, TsStmt, TsType, TsTypeDef, TypeDefKind,
};
use super::{EmitContext, constructor, json_const, param, super_call};
use crate::dts::{Interface, Method, Origin, TypeExpr};
use crate::error::EmissionError;
use crate::naming::safe_name;

/// Method that opens an event subscription instead of making a call.
const SUBSCRIBE: &str = "subscribe";

/// `<name>.ts`: the RPC client, emitter interfaces and supporting types.
pub(crate) fn client(ctx: &EmitContext<'_>) -> Result<TsModule, EmissionError> {
    let (primary_name, primary) = primary(ctx)?;

    let mut items = ctx.identity_consts();
    items.push(json_const("SCHEMAS", false, ctx.schema, "schema")?);
    items.push(json_const("EXPORT_MAP", false, ctx.exports, "export map")?);

    let methods = primary
        .methods
        .iter()
        .map(|m| client_method(ctx, primary_name, m))
        .collect::<Result<Vec<_>, _>>()?;
    items.push(TsItem::Class(TsClass {
        name: format!("{}Client", safe_name(primary_name)),
        export: Export::Default,
        extends: Some(TsType::named(ctx.profile.rpc_client)),
        constructor: Some(constructor(
            Vec::new(),
            vec![super_call(&["ID", "SCHEMAS", "EXPORT_MAP"])],
        )),
        methods,
    }));

    for emitter in ctx.exports.events.keys() {
        items.push(TsItem::TypeDef(emitter_interface(ctx, emitter)?));
    }

    // Remaining source declarations are the data types the methods use.
    for (_, decl) in ctx.document.tree.iter() {
        if decl.origin != Origin::Source
            || decl.name == primary_name
            || ctx.exports.events.contains_key(&decl.name)
        {
            continue;
        }
        let export = if decl.exported {
            Export::Named
        } else {
            Export::None
        };
        items.push(TsItem::TypeDef(ctx.lowerer.declaration(decl, export)?));
    }

    Ok(TsModule {
        banner: ctx.banner(),
        imports: ctx.imports(&[ctx.profile.rpc_client]),
        items,
    })
}

/// `<name>.server.ts`: the RPC server bound to user handlers.
pub(crate) fn server(ctx: &EmitContext<'_>) -> Result<TsModule, EmissionError> {
    let (primary_name, _) = primary(ctx)?;

    let mut items = ctx.identity_consts();
    items.push(json_const("SCHEMAS", false, ctx.schema, "schema")?);
    items.push(json_const("EXPORT_MAP", false, ctx.exports, "export map")?);
    items.push(TsItem::Class(TsClass {
        name: format!("{}Server", safe_name(primary_name)),
        export: Export::Default,
        extends: Some(TsType::named(ctx.profile.rpc_server)),
        constructor: Some(constructor(
            vec![param(
                "handlers",
                TsType::named(ctx.profile.rpc_handlers),
                false,
            )],
            vec![super_call(&["SCHEMAS", "EXPORT_MAP", "handlers"])],
        )),
        methods: Vec::new(),
    }));

    Ok(TsModule {
        banner: ctx.banner(),
        imports: ctx.imports(&[ctx.profile.rpc_server, ctx.profile.rpc_handlers]),
        items,
    })
}

fn primary<'a>(ctx: &EmitContext<'a>) -> Result<(&'a str, &'a Interface), EmissionError> {
    let name = ctx.document.primary_name();
    ctx.document
        .primary_interface()
        .map(|iface| (name, iface))
        .ok_or_else(|| EmissionError::Unsupported {
            declaration: name.to_string(),
            construct: "default export is not an interface".into(),
        })
}

/// Forwarding method: `name(a, b): Promise<R> { return this._rpc("name", [a, b]); }`
fn client_method(
    ctx: &EmitContext<'_>,
    primary_name: &str,
    method: &Method,
) -> Result<TsClassMethod, EmissionError> {
    if !method.type_params.is_empty() {
        return Err(EmissionError::Unsupported {
            declaration: primary_name.to_string(),
            construct: format!("generic method '{}'", method.name),
        });
    }
    let params = ctx.lowerer.params(&method.params, primary_name)?;
    let args = TsExpr::Array(method.params.iter().map(|p| TsExpr::ident(&p.name)).collect());

    let (returns, call) = if method.name == SUBSCRIBE {
        let mut emitters: Vec<TsType> = ctx.exports.events.keys().map(TsType::named).collect();
        let returns = match emitters.len() {
            0 => {
                return Err(EmissionError::MissingEmitters {
                    method: method.name.clone(),
                });
            }
            1 => emitters.remove(0),
            _ => TsType::Union(emitters),
        };
        (returns, TsExpr::this_call("_subscribe", vec![args]))
    } else {
        let returns = ctx.lowerer.ty(&method.unwrapped_return(), primary_name)?;
        let name = TsExpr::Literal(TsLiteral::String(method.name.clone()));
        (
            TsType::promise(returns),
            TsExpr::this_call("_rpc", vec![name, args]),
        )
    };

    Ok(TsClassMethod {
        name: method.name.clone(),
        params,
        returns: Some(returns),
        body: vec![TsStmt::Return(Some(call))],
    })
}

/// `export interface Emitter { on(name: "evt", handler: (evt: Payload) => void): void; }`
fn emitter_interface(ctx: &EmitContext<'_>, emitter: &str) -> Result<TsTypeDef, EmissionError> {
    let tree = &ctx.document.tree;
    let source = tree
        .interface(emitter)
        .ok_or_else(|| EmissionError::Unsupported {
            declaration: emitter.to_string(),
            construct: "event emitter is not an interface".into(),
        })?;
    let events = ctx
        .exports
        .events
        .get(emitter)
        .map(|events| events.keys())
        .into_iter()
        .flatten();

    let mut methods = Vec::new();
    for event in events {
        let payload = source
            .methods
            .iter()
            .filter_map(|m| m.event_signature(|name| tree.interface(name).is_some()))
            .find(|(name, _)| *name == event.as_str())
            .map(|(_, payload)| payload)
            .ok_or_else(|| EmissionError::Unsupported {
                declaration: emitter.to_string(),
                construct: format!("no signature for event '{event}'"),
            })?;
        methods.push(on_signature(ctx, emitter, event, payload)?);
    }

    Ok(TsTypeDef {
        name: emitter.to_string(),
        export: Export::Named,
        type_params: Vec::new(),
        docs: tree.find(emitter).and_then(|(_, d)| d.docs.clone()),
        kind: TypeDefKind::Interface {
            extends: Vec::new(),
            body: TsObject::default(),
            methods,
        },
    })
}

fn on_signature(
    ctx: &EmitContext<'_>,
    emitter: &str,
    event: &str,
    payload: &TypeExpr,
) -> Result<TsMethodSig, EmissionError> {
    let void = || TsType::Primitive(TsPrimitive::Void);
    let handler = TsType::Function {
        params: vec![param("evt", ctx.lowerer.ty(payload, emitter)?, false)],
        returns: Box::new(void()),
    };
    let name = TsType::Literal(TsLiteral::String(event.to_string()));
    Ok(TsMethodSig {
        name: "on".into(),
        type_params: Vec::new(),
        params: vec![param("name", name, false), param("handler", handler, false)],
        returns: Some(void()),
        docs: None,
    })
}
