//! Reference resolution.
//!
//! Resolution runs in two phases. Loading is async: every document reachable
//! through imports and `import("…")` markers is fetched, sibling documents
//! concurrently, and parsed. Resolving is synchronous: each root declaration
//! is cloned with its markers replaced, and declarations from other documents
//! that become reachable are spliced into the root tree. Both phases produce
//! [`TreeEdit`]s; nothing is mutated until the whole document resolved.

pub mod fetch;
pub mod pointer;

use std::collections::HashMap;

use futures_util::future::try_join_all;
use tracing::debug;
use url::Url;

pub use fetch::{DefaultFetcher, Fetch, FsFetcher, HttpFetcher, MemoryFetcher};
pub use pointer::JsonPointer;

use crate::document::Document;
use crate::dts::{
    DeclKind, DeclTree, Declaration, ImportDecl, Keyword, Origin, Param, RefMarker, TreeEdit,
    TypeAlias, TypeExpr, parse_declarations, parse_declarations_after_metadata,
};
use crate::error::{Error, FetchError, ResolutionError};
use crate::metadata::RawMetadata;

/// Index of the root document in a [`DocumentSet`].
const ROOT: usize = 0;

/// Resolves every reference marker and import of `document` in place.
///
/// `base` is the location of the document itself; relative references are
/// joined onto it.
pub async fn resolve_document<F: Fetch>(
    document: &mut Document,
    base: &Url,
    fetcher: &F,
) -> Result<(), Error> {
    let id = document.metadata.id.to_string();
    debug!(document = %id, %base, "Resolving references.");
    let edits = resolve_tree(&document.tree, base, fetcher)
        .await
        .map_err(|source| Error::resolution(&id, source))?;
    debug!(document = %id, edits = edits.len(), "Applying resolution edits.");
    document.tree.apply(edits);
    Ok(())
}

/// Computes the edits that resolve `tree`.
pub async fn resolve_tree<F: Fetch>(
    tree: &DeclTree,
    base: &Url,
    fetcher: &F,
) -> Result<Vec<TreeEdit>, ResolutionError> {
    let set = DocumentSet::load(tree, base, fetcher).await?;
    Resolver::new(&set).resolve_root()
}

/// Resolves a pointer such as `#/Widget/size` against a single document,
/// without fetching anything.
pub fn resolve_pointer(
    tree: &DeclTree,
    base: &Url,
    pointer: &str,
) -> Result<TypeExpr, ResolutionError> {
    let set = DocumentSet::new(tree, base);
    let marker = RefMarker::from_specifier(pointer, &[]);
    Resolver::new(&set).resolve_marker(ROOT, &marker)
}

struct LoadedDoc {
    url: Url,
    tree: DeclTree,
}

/// The root document plus every document it transitively references.
struct DocumentSet<'a> {
    root: &'a DeclTree,
    root_url: Url,
    foreign: Vec<LoadedDoc>,
    by_url: HashMap<String, usize>,
}

impl<'a> DocumentSet<'a> {
    fn new(root: &'a DeclTree, base: &Url) -> Self {
        let mut root_url = base.clone();
        root_url.set_fragment(None);
        let mut by_url = HashMap::new();
        by_url.insert(root_url.to_string(), ROOT);
        Self {
            root,
            root_url,
            foreign: Vec::new(),
            by_url,
        }
    }

    async fn load<F: Fetch>(
        root: &'a DeclTree,
        base: &Url,
        fetcher: &F,
    ) -> Result<Self, ResolutionError> {
        let mut set = Self::new(root, base);
        let mut frontier = vec![ROOT];

        while !frontier.is_empty() {
            let mut pending: Vec<(Url, String)> = Vec::new();
            for doc in frontier {
                for location in external_locations(set.tree(doc)) {
                    let url = join(set.url(doc), &location, &location)?;
                    let known = set.by_url.contains_key(url.as_str())
                        || pending.iter().any(|(u, _)| *u == url);
                    if !known {
                        pending.push((url, location));
                    }
                }
            }
            if pending.is_empty() {
                break;
            }

            debug!(count = pending.len(), "Fetching referenced documents.");
            let texts = try_join_all(pending.iter().map(|(url, reference)| async move {
                fetcher
                    .fetch(url)
                    .await
                    .map_err(|source| ResolutionError::Fetch {
                        reference: reference.clone(),
                        source,
                    })
            }))
            .await?;

            frontier = Vec::new();
            for ((url, reference), text) in pending.into_iter().zip(texts) {
                let parsed = if RawMetadata::is_present_in(&text) {
                    parse_declarations_after_metadata(&text)
                } else {
                    parse_declarations(&text)
                };
                let tree = parsed
                    .map_err(|source| ResolutionError::InvalidDocument { reference, source })?;
                let idx = set.foreign.len() + 1;
                debug!(%url, declarations = tree.len(), "Loaded referenced document.");
                set.by_url.insert(url.to_string(), idx);
                set.foreign.push(LoadedDoc { url, tree });
                frontier.push(idx);
            }
        }
        Ok(set)
    }

    fn tree(&self, doc: usize) -> &DeclTree {
        match doc.checked_sub(1).and_then(|i| self.foreign.get(i)) {
            Some(loaded) => &loaded.tree,
            None => self.root,
        }
    }

    fn url(&self, doc: usize) -> &Url {
        match doc.checked_sub(1).and_then(|i| self.foreign.get(i)) {
            Some(loaded) => &loaded.url,
            None => &self.root_url,
        }
    }

    /// Finds the loaded document `location` refers to from `doc`.
    fn document_at(&self, doc: usize, location: &str, reference: &str) -> Result<usize, ResolutionError> {
        let url = join(self.url(doc), location, reference)?;
        self.by_url
            .get(url.as_str())
            .copied()
            .ok_or_else(|| ResolutionError::Fetch {
                reference: reference.to_string(),
                source: FetchError::NotFound(url.to_string()),
            })
    }
}

fn join(base: &Url, location: &str, reference: &str) -> Result<Url, ResolutionError> {
    let mut url = base
        .join(location)
        .map_err(|source| ResolutionError::InvalidLocation {
            reference: reference.to_string(),
            source,
        })?;
    url.set_fragment(None);
    Ok(url)
}

/// Locations referenced by imports and markers, in source order.
fn external_locations(tree: &DeclTree) -> Vec<String> {
    let mut locations: Vec<String> = tree.imports().iter().map(|i| i.location.clone()).collect();
    for (_, decl) in tree.iter() {
        for ty in decl.types() {
            ty.walk(&mut |node| {
                if let TypeExpr::Marker(RefMarker {
                    location: Some(location),
                    ..
                }) = node
                {
                    locations.push(location.clone());
                }
            });
        }
    }
    locations
}

/// Import that brings `name` into scope, with the name it has in the
/// imported document.
fn find_import<'t>(tree: &'t DeclTree, name: &str) -> Option<(&'t ImportDecl, &'t str)> {
    tree.imports().iter().find_map(|import| {
        import
            .names
            .iter()
            .find(|n| n.local == name)
            .map(|n| (import, n.imported.as_str()))
    })
}

/// Which document's names a type expression uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Namespace {
    Doc(usize),
    /// Already resolved into the root tree's names.
    Root,
}

/// Position reached while walking a pointer.
enum Cursor {
    Decl { doc: usize, name: String },
    Type { ns: Namespace, ty: TypeExpr },
}

struct Resolver<'s, 'a> {
    set: &'s DocumentSet<'a>,
    /// Markers currently being resolved, outermost first.
    stack: Vec<String>,
    /// Foreign declarations already spliced, by origin.
    spliced: HashMap<(usize, String), String>,
    /// Origin of every name added to the root tree.
    owners: HashMap<String, (usize, String)>,
    /// Spliced declarations in discovery order; filled once resolved.
    appended: Vec<Option<Declaration>>,
}

impl<'s, 'a> Resolver<'s, 'a> {
    fn new(set: &'s DocumentSet<'a>) -> Self {
        Self {
            set,
            stack: Vec::new(),
            spliced: HashMap::new(),
            owners: HashMap::new(),
            appended: Vec::new(),
        }
    }

    fn resolve_root(mut self) -> Result<Vec<TreeEdit>, ResolutionError> {
        let set = self.set;
        let mut aliases = Vec::new();

        for import in set.root.imports() {
            let target = set.document_at(ROOT, &import.location, &import.location)?;
            for name in &import.names {
                let reference = format!("{}#/{}", import.location, name.imported);
                let spliced = self.splice(target, &name.imported, &reference)?;
                if spliced == name.local {
                    continue;
                }
                if set.root.find(&name.local).is_some() || self.owners.contains_key(&name.local) {
                    return Err(ResolutionError::Conflict {
                        reference,
                        name: name.local.clone(),
                    });
                }
                self.owners
                    .insert(name.local.clone(), (ROOT, name.local.clone()));
                aliases.push(Declaration {
                    name: name.local.clone(),
                    exported: false,
                    is_default: false,
                    origin: Origin::Source,
                    docs: None,
                    kind: DeclKind::TypeAlias(TypeAlias {
                        type_params: Vec::new(),
                        ty: TypeExpr::named(spliced),
                    }),
                });
            }
        }

        let mut edits = Vec::with_capacity(set.root.len());
        for (id, decl) in set.root.iter() {
            let with = self.resolve_declaration(ROOT, decl)?;
            edits.push(TreeEdit::Replace { id, with });
        }
        debug!(
            spliced = self.appended.len(),
            aliases = aliases.len(),
            "Resolved root declarations."
        );
        edits.extend(self.appended.into_iter().flatten().map(TreeEdit::Append));
        edits.extend(aliases.into_iter().map(TreeEdit::Append));
        Ok(edits)
    }

    fn resolve_declaration(
        &mut self,
        doc: usize,
        decl: &Declaration,
    ) -> Result<Declaration, ResolutionError> {
        let mut out = decl.clone();
        for ty in out.types_mut() {
            let resolved = self.resolve_type(doc, ty)?;
            *ty = resolved;
        }
        Ok(out)
    }

    /// Returns `ty` with markers resolved and names mapped into the root tree.
    fn resolve_type(&mut self, doc: usize, ty: &TypeExpr) -> Result<TypeExpr, ResolutionError> {
        match ty {
            TypeExpr::Marker(marker) => self.resolve_marker(doc, marker),
            TypeExpr::Ref { name, args } => {
                let name = self.local_name(doc, name)?;
                let args = args
                    .iter()
                    .map(|arg| self.resolve_type(doc, arg))
                    .collect::<Result<_, _>>()?;
                Ok(TypeExpr::Ref { name, args })
            }
            _ => {
                let mut out = ty.clone();
                for child in out.children_mut() {
                    let resolved = self.resolve_type(doc, child)?;
                    *child = resolved;
                }
                Ok(out)
            }
        }
    }

    /// Name that `name`, as written in `doc`, has in the root tree.
    fn local_name(&mut self, doc: usize, name: &str) -> Result<String, ResolutionError> {
        if doc == ROOT || name.contains('.') {
            return Ok(name.to_string());
        }
        let tree = self.set.tree(doc);
        if tree.find(name).is_some() || find_import(tree, name).is_some() {
            let reference = format!("{}#/{}", self.set.url(doc), name);
            return self.splice(doc, name, &reference);
        }
        // Built-in or type parameter.
        Ok(name.to_string())
    }

    /// Copies the declaration `name` of `doc` into the root tree, resolved in
    /// its own document's context, and returns its root name.
    fn splice(&mut self, doc: usize, name: &str, reference: &str) -> Result<String, ResolutionError> {
        let set = self.set;
        if doc == ROOT {
            return if set.root.find(name).is_some() {
                Ok(name.to_string())
            } else {
                Err(ResolutionError::MissingExport {
                    reference: reference.to_string(),
                    name: name.to_string(),
                })
            };
        }
        let key = (doc, name.to_string());
        if let Some(existing) = self.spliced.get(&key) {
            return Ok(existing.clone());
        }

        let Some((_, decl)) = set.tree(doc).find(name) else {
            return match self.declaring_document(doc, name, reference)? {
                Some((target, declared)) => self.splice(target, &declared, reference),
                None => Err(ResolutionError::MissingExport {
                    reference: reference.to_string(),
                    name: name.to_string(),
                }),
            };
        };

        if set.root.find(name).is_some() || self.owners.contains_key(name) {
            return Err(ResolutionError::Conflict {
                reference: reference.to_string(),
                name: name.to_string(),
            });
        }

        debug!(%reference, "Splicing declaration into root document.");
        self.spliced.insert(key.clone(), name.to_string());
        self.owners.insert(name.to_string(), key);
        let slot = self.appended.len();
        self.appended.push(None);

        let mut resolved = self.resolve_declaration(doc, decl)?;
        resolved.is_default = false;
        self.appended[slot] = Some(resolved);
        Ok(name.to_string())
    }

    fn resolve_marker(&mut self, doc: usize, marker: &RefMarker) -> Result<TypeExpr, ResolutionError> {
        let reference = marker.to_string();
        let target = match &marker.location {
            Some(location) => self.set.document_at(doc, location, &reference)?,
            None => doc,
        };
        let key = format!("{}#{}", self.set.url(target), marker.pointer);
        if self.stack.contains(&key) {
            let mut chain = self.stack.clone();
            chain.push(key);
            return Err(ResolutionError::Cycle {
                chain: chain.join(" -> "),
            });
        }

        self.stack.push(key);
        let result = self.follow_pointer(target, &JsonPointer::parse(&marker.pointer), &reference);
        self.stack.pop();
        result
    }

    fn follow_pointer(
        &mut self,
        doc: usize,
        pointer: &JsonPointer,
        reference: &str,
    ) -> Result<TypeExpr, ResolutionError> {
        let Some((first, rest)) = pointer.split_first() else {
            return Err(ResolutionError::PointerNotFound {
                reference: reference.to_string(),
                segment: String::new(),
            });
        };
        let mut cursor = self.declaration_cursor(doc, first, reference)?;
        for segment in rest {
            cursor = match cursor {
                Cursor::Decl { doc, name } => {
                    self.step_declaration(doc, &name, segment, reference, &mut Vec::new())?
                }
                Cursor::Type { ns, ty } => {
                    self.step_type(ns, ty, segment, reference, &mut Vec::new())?
                }
            };
        }

        match cursor {
            Cursor::Decl { doc, name } if doc == ROOT => Ok(TypeExpr::named(name)),
            Cursor::Decl { doc, name } => Ok(TypeExpr::named(self.splice(doc, &name, reference)?)),
            Cursor::Type {
                ns: Namespace::Doc(doc),
                ty,
            } => self.resolve_type(doc, &ty),
            Cursor::Type {
                ns: Namespace::Root,
                ty,
            } => Ok(ty),
        }
    }

    /// Locates the declaration `name` in `doc`, following imports.
    fn declaration_cursor(&self, doc: usize, name: &str, reference: &str) -> Result<Cursor, ResolutionError> {
        match self.declaring_document(doc, name, reference)? {
            Some((doc, name)) => Ok(Cursor::Decl { doc, name }),
            None => Err(ResolutionError::PointerNotFound {
                reference: reference.to_string(),
                segment: name.to_string(),
            }),
        }
    }

    /// Follows imports from `doc` to the document that declares `name`, and
    /// returns it with the name the declaration has there. `None` when no
    /// declaration or import provides the name.
    fn declaring_document(
        &self,
        doc: usize,
        name: &str,
        reference: &str,
    ) -> Result<Option<(usize, String)>, ResolutionError> {
        let mut chain: Vec<(usize, String)> = Vec::new();
        let (mut doc, mut name) = (doc, name.to_string());
        loop {
            let tree = self.set.tree(doc);
            if tree.find(&name).is_some() {
                return Ok(Some((doc, name)));
            }
            let Some((import, imported)) = find_import(tree, &name) else {
                return Ok(None);
            };
            let link = (doc, name);
            if chain.contains(&link) {
                chain.push(link);
                let links: Vec<String> = chain
                    .iter()
                    .map(|(doc, name)| format!("{}#/{name}", self.set.url(*doc)))
                    .collect();
                return Err(ResolutionError::Cycle {
                    chain: links.join(" -> "),
                });
            }
            chain.push(link);
            doc = self.set.document_at(doc, &import.location, reference)?;
            name = imported.to_string();
        }
    }

    fn step_declaration(
        &mut self,
        doc: usize,
        name: &str,
        segment: &str,
        reference: &str,
        visited: &mut Vec<(usize, String)>,
    ) -> Result<Cursor, ResolutionError> {
        let not_found = || ResolutionError::PointerNotFound {
            reference: reference.to_string(),
            segment: segment.to_string(),
        };
        let set = self.set;
        let Some((_, decl)) = set.tree(doc).find(name) else {
            return match self.declaration_cursor(doc, name, reference)? {
                Cursor::Decl { doc, name } => {
                    self.step_declaration(doc, &name, segment, reference, visited)
                }
                Cursor::Type { .. } => Err(not_found()),
            };
        };

        let key = (doc, name.to_string());
        if visited.contains(&key) {
            return Err(ResolutionError::Cycle {
                chain: format!("{reference} (through '{name}')"),
            });
        }
        visited.push(key);

        let ns = Namespace::Doc(doc);
        match &decl.kind {
            DeclKind::Interface(iface) => {
                if let Some(prop) = iface.properties.iter().find(|p| p.name == segment) {
                    return Ok(Cursor::Type {
                        ns,
                        ty: prop.ty.clone(),
                    });
                }
                if let Some(method) = iface.methods.iter().find(|m| m.name == segment) {
                    return Ok(Cursor::Type {
                        ns,
                        ty: function_type(&method.params, method.returns.as_ref()),
                    });
                }
                for parent in &iface.extends {
                    if let Ok(cursor) = self.step_type(ns, parent.clone(), segment, reference, visited) {
                        return Ok(cursor);
                    }
                }
                Err(not_found())
            }
            DeclKind::TypeAlias(alias) => {
                self.step_type(ns, alias.ty.clone(), segment, reference, visited)
            }
            DeclKind::Enum(decl) => decl
                .member_literals()
                .into_iter()
                .zip(&decl.members)
                .find(|(_, member)| member.name == segment)
                .map(|(literal, _)| Cursor::Type {
                    ns: Namespace::Root,
                    ty: TypeExpr::Literal(literal),
                })
                .ok_or_else(not_found),
        }
    }

    fn step_type(
        &mut self,
        ns: Namespace,
        ty: TypeExpr,
        segment: &str,
        reference: &str,
        visited: &mut Vec<(usize, String)>,
    ) -> Result<Cursor, ResolutionError> {
        let not_found = || ResolutionError::PointerNotFound {
            reference: reference.to_string(),
            segment: segment.to_string(),
        };
        let child = |ty: TypeExpr| -> Result<Cursor, ResolutionError> { Ok(Cursor::Type { ns, ty }) };
        let index = segment.parse::<usize>().ok();

        match ty {
            TypeExpr::Marker(marker) => {
                let Namespace::Doc(doc) = ns else {
                    return Err(not_found());
                };
                let resolved = self.resolve_marker(doc, &marker)?;
                self.step_type(Namespace::Root, resolved, segment, reference, visited)
            }
            TypeExpr::Ref { name, mut args } => {
                if matches!(name.as_str(), "Array" | "ReadonlyArray") && args.len() == 1 {
                    return if segment == "items" {
                        child(args.remove(0))
                    } else {
                        Err(not_found())
                    };
                }
                if name == "Promise" && args.len() == 1 {
                    return self.step_type(ns, args.remove(0), segment, reference, visited);
                }
                let (doc, name) = match ns {
                    Namespace::Doc(doc) => (doc, name),
                    Namespace::Root => self.owners.get(&name).cloned().unwrap_or((ROOT, name)),
                };
                self.step_declaration(doc, &name, segment, reference, visited)
            }
            TypeExpr::Object(object) => object
                .properties
                .into_iter()
                .find(|p| p.name == segment)
                .map_or_else(|| Err(not_found()), |p| child(p.ty)),
            TypeExpr::Tuple(elements) => {
                let position =
                    index.or_else(|| elements.iter().position(|e| e.name.as_deref() == Some(segment)));
                position
                    .and_then(|i| elements.into_iter().nth(i))
                    .map_or_else(|| Err(not_found()), |e| child(e.ty))
            }
            TypeExpr::Union(types) | TypeExpr::Intersection(types) => index
                .and_then(|i| types.into_iter().nth(i))
                .map_or_else(|| Err(not_found()), child),
            TypeExpr::Array(inner) if segment == "items" => child(*inner),
            TypeExpr::Function { params, returns } => {
                if segment == "returns" {
                    return child(*returns);
                }
                params
                    .into_iter()
                    .find(|p| p.name == segment)
                    .map_or_else(|| Err(not_found()), |p| child(p.ty))
            }
            TypeExpr::Array(_) | TypeExpr::Keyword(_) | TypeExpr::Literal(_) => Err(not_found()),
        }
    }
}

fn function_type(params: &[Param], returns: Option<&TypeExpr>) -> TypeExpr {
    TypeExpr::Function {
        params: params.to_vec(),
        returns: Box::new(returns.cloned().unwrap_or(TypeExpr::Keyword(Keyword::Void))),
    }
}
