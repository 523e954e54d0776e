//! Rewrites API interfaces into plain data shapes that schema derivation can
//! describe.
//!
//! ```text
//! interface Chat { send(room: string, text?: string): Promise<number> }
//! ```
//!
//! gains the sibling
//!
//! ```text
//! interface api_Chat_Send { params: [room: string, text?: string]; returns: number }
//! ```
//!
//! and an event method `emit(name: "joined", evt: { user: string })` on an
//! emitter interface gains `interface evt_Events_Joined { user: string }`.

use std::collections::BTreeMap;

use serde::Serialize;
use tracing::debug;

use crate::document::Document;
use crate::dts::{
    DeclKind, DeclTree, Declaration, Interface, Method, Origin, Property, TreeEdit, TupleElement,
    TypeExpr,
};
use crate::naming::safe_name;

/// Where each method and event shape lives in the derived schema.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ExportMap {
    /// Method name → schema pointer.
    pub methods: BTreeMap<String, String>,
    /// Emitter interface name → event name → schema pointer.
    pub events: BTreeMap<String, BTreeMap<String, String>>,
}

impl ExportMap {
    /// Whether nothing is exported.
    pub fn is_empty(&self) -> bool {
        self.methods.is_empty() && self.events.is_empty()
    }
}

/// Pointer to a named definition in the derived schema.
pub fn definition_pointer(name: &str) -> String {
    format!("#/definitions/{name}")
}

/// Appends a shape declaration for every method and event of every source
/// interface and returns the export map. Original declarations are left
/// untouched. The primary interface is processed first so its methods win
/// when two interfaces share a method name.
pub fn transform_api(document: &mut Document) -> ExportMap {
    let (edits, exports) = api_shapes(&document.tree, document.primary_name());
    debug!(
        document = %document.metadata.id,
        shapes = edits.len(),
        methods = exports.methods.len(),
        emitters = exports.events.len(),
        "Synthesized API shapes."
    );
    document.tree.apply(edits);
    exports
}

/// Computes the shape declarations for `tree` without applying them.
pub fn api_shapes(tree: &DeclTree, primary: &str) -> (Vec<TreeEdit>, ExportMap) {
    let mut interfaces: Vec<(&str, &Interface)> = tree
        .iter()
        .filter(|(_, decl)| decl.origin == Origin::Source)
        .filter_map(|(_, decl)| decl.as_interface().map(|iface| (decl.name.as_str(), iface)))
        .collect();
    interfaces.sort_by_key(|(name, _)| *name != primary);

    let mut shapes: Vec<Declaration> = Vec::new();
    let mut exports = ExportMap::default();

    for (iface_name, iface) in interfaces {
        for method in &iface.methods {
            if let Some((event, payload)) =
                method.event_signature(|name| tree.interface(name).is_some())
            {
                let shape = format!("evt_{iface_name}_{}", safe_name(event));
                exports
                    .events
                    .entry(iface_name.to_string())
                    .or_default()
                    .entry(event.to_string())
                    .or_insert_with(|| definition_pointer(&shape));
                push_shape(&mut shapes, shape, payload_properties(tree, payload));
                continue;
            }

            if !method.type_params.is_empty() {
                debug!(interface = iface_name, method = %method.name, "Skipping generic method.");
                continue;
            }
            let shape = format!("api_{iface_name}_{}", safe_name(&method.name));
            exports
                .methods
                .entry(method.name.clone())
                .or_insert_with(|| definition_pointer(&shape));
            push_shape(&mut shapes, shape, call_properties(method));
        }
    }

    let edits = shapes.into_iter().map(TreeEdit::Append).collect();
    (edits, exports)
}

fn push_shape(shapes: &mut Vec<Declaration>, name: String, properties: Vec<Property>) {
    if shapes.iter().any(|s| s.name == name) {
        return;
    }
    shapes.push(Declaration {
        name,
        exported: true,
        is_default: false,
        origin: Origin::Synthesized,
        docs: None,
        kind: DeclKind::Interface(Interface {
            properties,
            ..Interface::default()
        }),
    });
}

/// `params` tuple and unwrapped `returns` of a method.
fn call_properties(method: &Method) -> Vec<Property> {
    let params = method
        .params
        .iter()
        .map(|param| TupleElement {
            name: Some(param.name.clone()),
            ty: param.ty.clone(),
            optional: param.optional,
        })
        .collect();
    vec![
        Property::new("params", TypeExpr::Tuple(params)),
        Property::new("returns", method.unwrapped_return()),
    ]
}

/// Properties of an event payload: an object literal's own, or a named
/// interface's including inherited ones.
fn payload_properties(tree: &DeclTree, payload: &TypeExpr) -> Vec<Property> {
    let mut properties = match payload {
        TypeExpr::Object(object) => object.properties.clone(),
        TypeExpr::Ref { name, .. } => tree.flattened_properties(name),
        _ => Vec::new(),
    };
    for property in &mut properties {
        let unwrapped = property.ty.unwrap_promise().clone();
        property.ty = unwrapped;
    }
    properties
}
