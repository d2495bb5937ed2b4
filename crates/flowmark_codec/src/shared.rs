// SPDX-License-Identifier: MIT OR Apache-2.0
//! Per-run identity tables, the delayed-reference queue and the object stack.
//!
//! None of this state outlives a single generation or consumption run; each
//! run creates fresh instances inside its context.

use crate::object::{ObjectKey, ObjectRef};
use crate::path::PropertyPath;
use crate::transformer::Transformer;
use indexmap::IndexMap;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// Writer-side identity table: object -> token.
///
/// Tokens are consecutive integers rendered as decimal text, assigned on
/// first request. The table keeps each object alive so its address cannot
/// be reused for another object during the run.
#[derive(Default)]
pub struct SharedObjects {
    tokens: HashMap<ObjectKey, (String, ObjectRef)>,
    next: u64,
}

impl SharedObjects {
    /// Create an empty table
    pub fn new() -> Self {
        Self::default()
    }

    /// Token for `object`, assigning the next free one if needed
    pub fn make_shared(&mut self, object: &ObjectRef) -> String {
        let key = ObjectKey::of(object);
        if let Some((token, _)) = self.tokens.get(&key) {
            return token.clone();
        }
        let token = self.next.to_string();
        self.next += 1;
        self.tokens.insert(key, (token.clone(), Arc::clone(object)));
        token
    }

    /// Token for `object`, if one was assigned
    pub fn find(&self, object: &ObjectRef) -> Option<&str> {
        self.tokens
            .get(&ObjectKey::of(object))
            .map(|(token, _)| token.as_str())
    }

    /// Number of assigned tokens
    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    /// Whether no token was assigned yet
    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }
}

/// Reader-side identity table: token -> object.
///
/// Defining a token twice silently replaces the earlier object.
#[derive(Default)]
pub struct SharedTokens {
    objects: HashMap<String, ObjectRef>,
}

impl SharedTokens {
    /// Create an empty table
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `object` under `token`
    pub fn define(&mut self, token: &str, object: &ObjectRef) {
        if let Some(previous) = self.objects.insert(token.to_string(), Arc::clone(object)) {
            if !Arc::ptr_eq(&previous, object) {
                tracing::debug!(token, "shared token redefined, last definition wins");
            }
        }
    }

    /// Object registered under `token`
    pub fn get(&self, token: &str) -> Option<&ObjectRef> {
        self.objects.get(token)
    }

    /// Number of registered tokens
    pub fn len(&self) -> usize {
        self.objects.len()
    }

    /// Whether nothing is registered
    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }
}

/// What a delayed reference finally resolved to
#[derive(Debug, Clone)]
pub enum Referent {
    /// The token named a known object
    Object(ObjectRef),
    /// The token never appeared; the raw text is handed over
    Unresolved(String),
}

/// A property that must be pointed at an object which has not been read yet
pub struct DelayedReference {
    /// Object whose property is pending
    pub owner: ObjectRef,
    /// Transformer responsible for `owner`
    pub transformer: Arc<dyn Transformer>,
    /// Property to update
    pub path: PropertyPath,
    /// Token to resolve
    pub token: String,
}

impl fmt::Debug for DelayedReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DelayedReference")
            .field("path", &self.path)
            .field("token", &self.token)
            .finish_non_exhaustive()
    }
}

/// Queue of references awaiting resolution, in the order they were met
#[derive(Debug, Default)]
pub struct DelayedReferences {
    pending: Vec<DelayedReference>,
}

impl DelayedReferences {
    /// Create an empty queue
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a reference
    pub fn push(&mut self, reference: DelayedReference) {
        self.pending.push(reference);
    }

    /// Take every queued reference, each paired with its resolution.
    ///
    /// The queue is left empty, so each reference is handed out once.
    pub fn drain(&mut self, tokens: &SharedTokens) -> Vec<(DelayedReference, Referent)> {
        std::mem::take(&mut self.pending)
            .into_iter()
            .map(|reference| {
                let referent = match tokens.get(&reference.token) {
                    Some(object) => Referent::Object(Arc::clone(object)),
                    None => Referent::Unresolved(reference.token.clone()),
                };
                (reference, referent)
            })
            .collect()
    }

    /// Number of queued references
    pub fn len(&self) -> usize {
        self.pending.len()
    }

    /// Whether the queue is empty
    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }
}

/// Ancestor chain of the objects currently being generated or consumed
#[derive(Default)]
pub struct ObjectStack {
    items: Vec<ObjectRef>,
}

impl ObjectStack {
    /// Create an empty stack
    pub fn new() -> Self {
        Self::default()
    }

    /// Enter an object's body
    pub fn push(&mut self, object: &ObjectRef) {
        self.items.push(Arc::clone(object));
    }

    /// Leave the innermost body
    pub fn pop(&mut self) -> Option<ObjectRef> {
        self.items.pop()
    }

    /// Innermost object whose body is being processed
    pub fn parent(&self) -> Option<&ObjectRef> {
        self.items.last()
    }

    /// The object enclosing [`ObjectStack::parent`]
    pub fn grandparent(&self) -> Option<&ObjectRef> {
        self.items.len().checked_sub(2).and_then(|i| self.items.get(i))
    }

    /// Whether `object` is anywhere on the stack
    pub fn contains(&self, object: &ObjectRef) -> bool {
        self.items.iter().any(|item| Arc::ptr_eq(item, object))
    }

    /// Depth of the stack
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Whether the stack is empty
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

/// Node adjacency derived from the links of a root collection.
///
/// Endpoints that are ports are mapped to their owning node; endpoints
/// without a port facet are taken to be nodes themselves.
#[derive(Default)]
pub struct LinkIndex {
    successors: IndexMap<ObjectKey, Vec<ObjectRef>>,
    predecessors: IndexMap<ObjectKey, Vec<ObjectRef>>,
}

impl LinkIndex {
    /// Index every link among `items`
    pub fn build(items: &[ObjectRef]) -> Self {
        let mut index = Self::default();
        for item in items {
            let ends = {
                let guard = item.read();
                guard.as_link().map(|link| (link.from_end(), link.to_end()))
            };
            if let Some((Some(from), Some(to))) = ends {
                let from = owning_node(&from);
                let to = owning_node(&to);
                index
                    .successors
                    .entry(ObjectKey::of(&from))
                    .or_default()
                    .push(Arc::clone(&to));
                index
                    .predecessors
                    .entry(ObjectKey::of(&to))
                    .or_default()
                    .push(from);
            }
        }
        index
    }

    /// Nodes reached by links leaving `node`
    pub fn successors(&self, node: &ObjectRef) -> &[ObjectRef] {
        self.successors
            .get(&ObjectKey::of(node))
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    /// Nodes whose links arrive at `node`
    pub fn predecessors(&self, node: &ObjectRef) -> &[ObjectRef] {
        self.predecessors
            .get(&ObjectKey::of(node))
            .map(Vec::as_slice)
            .unwrap_or_default()
    }
}

/// The node that owns an endpoint, or the endpoint itself
pub fn owning_node(end: &ObjectRef) -> ObjectRef {
    let owner = end.read().as_port().and_then(|port| port.node());
    owner.unwrap_or_else(|| Arc::clone(end))
}
