// SPDX-License-Identifier: MIT OR Apache-2.0
//! Dotted property paths and their resolution against live objects.
//!
//! A path such as `Label.Bounds.Width` is split once, when the binding is
//! declared, and then walked hop by hop on every access. Each hop either
//! dereferences a shared object (reference semantics) or reads a member
//! of a value-typed aggregate (value semantics). Writes that pass through
//! a value-typed hop re-assign the modified aggregate to its owner, since
//! otherwise the change would only land on a temporary copy.

use crate::object::{AccessError, ObjectRef};
use crate::value::{Value, ValueKind};
use std::fmt;
use std::sync::Arc;

/// Reserved pseudo-property naming an object's logical tree parent
pub const TREE_PARENT: &str = "TreeParent";

/// A parsed, immutable dotted property path
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct PropertyPath {
    segments: Arc<[String]>,
}

impl PropertyPath {
    /// Parse a dotted path. Empty segments are dropped.
    ///
    /// Returns `None` when nothing remains, since a binding needs at least
    /// one property to talk to.
    pub fn parse(path: &str) -> Option<Self> {
        let segments: Vec<String> = path
            .split('.')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .collect();
        if segments.is_empty() {
            None
        } else {
            Some(Self {
                segments: segments.into(),
            })
        }
    }

    /// The reserved [`TREE_PARENT`] path
    pub fn tree_parent() -> Self {
        Self {
            segments: Arc::from(vec![TREE_PARENT.to_string()]),
        }
    }

    /// The individual property names
    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    /// The final property name
    pub fn last(&self) -> &str {
        // parse() guarantees at least one segment
        self.segments.last().map_or("", String::as_str)
    }

    /// Whether this is the reserved logical-parent pseudo-property
    pub fn is_tree_parent(&self) -> bool {
        self.segments.len() == 1 && self.segments[0] == TREE_PARENT
    }
}

impl fmt::Display for PropertyPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.segments.join("."))
    }
}

impl fmt::Debug for PropertyPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PropertyPath({self})")
    }
}

/// Read one property of a shared object.
///
/// The lock is released before returning so the caller can descend into
/// the result, which may well be the same object.
fn get_property(object: &ObjectRef, name: &str) -> Result<Value, AccessError> {
    let guard = object.read();
    match guard.property(name).map(|info| info.readable) {
        None => Err(AccessError::missing(name)),
        Some(false) => Err(AccessError::NotReadable(name.to_string())),
        Some(true) => guard.get(name),
    }
}

fn set_property(object: &ObjectRef, name: &str, value: Value) -> Result<(), AccessError> {
    let mut guard = object.write();
    match guard.property(name).map(|info| info.writable) {
        None => Err(AccessError::missing(name)),
        Some(false) => Err(AccessError::NotWritable(name.to_string())),
        Some(true) => guard.set(name, value),
    }
}

/// One step of a walk: either a shared object or a value copy
fn step(current: &Value, name: &str) -> Result<Value, AccessError> {
    match current {
        Value::Object(object) => get_property(object, name),
        other => other.member(name),
    }
}

/// Read the value at `path`, starting from `root`.
///
/// `Ok(None)` means the value is unavailable: a hop does not exist, is not
/// readable, or an intermediate value is null. `Err` is reserved for
/// accessors that actively failed.
pub fn read(root: &ObjectRef, path: &PropertyPath) -> Result<Option<Value>, AccessError> {
    let mut current = Value::Object(Arc::clone(root));
    for name in path.segments() {
        if current.is_null() {
            return Ok(None);
        }
        match step(&current, name) {
            Ok(next) => current = next,
            Err(err) if err.is_unavailable() => return Ok(None),
            Err(err) => return Err(err),
        }
    }
    // a null reference at the end is still a value
    Ok(Some(current))
}

/// Write `value` at `path`, starting from `root`.
///
/// Returns `Ok(false)` when the target is unavailable (missing member,
/// read-only property, null intermediate).
pub fn write(root: &ObjectRef, path: &PropertyPath, value: Value) -> Result<bool, AccessError> {
    match write_object(root, path.segments(), value) {
        Ok(()) => Ok(true),
        Err(err) if err.is_unavailable() => Ok(false),
        Err(err) => Err(err),
    }
}

fn write_object(object: &ObjectRef, segments: &[String], value: Value) -> Result<(), AccessError> {
    let Some((name, rest)) = segments.split_first() else {
        return Ok(());
    };
    if rest.is_empty() {
        return set_property(object, name, value);
    }
    match get_property(object, name)? {
        Value::Object(child) => write_object(&child, rest, value),
        Value::Null => Err(AccessError::missing(&rest[0])),
        aggregate => {
            let updated = write_aggregate(aggregate, rest, value)?;
            // value-typed hop: hand the modified copy back to its owner
            set_property(object, name, updated)
        }
    }
}

fn write_aggregate(aggregate: Value, segments: &[String], value: Value) -> Result<Value, AccessError> {
    let Some((name, rest)) = segments.split_first() else {
        return Ok(aggregate);
    };
    if rest.is_empty() {
        return aggregate.with_member(name, value);
    }
    match aggregate.member(name)? {
        Value::Object(child) => {
            write_object(&child, rest, value)?;
            Ok(aggregate)
        }
        inner => {
            let updated = write_aggregate(inner, rest, value)?;
            aggregate.with_member(name, updated)
        }
    }
}

/// Static kind of the final member of `path`.
///
/// Walks the path like [`read`] up to the penultimate hop, then consults the
/// owner's property table (or the aggregate's member table).
pub fn kind(root: &ObjectRef, path: &PropertyPath) -> Result<Option<ValueKind>, AccessError> {
    let segments = path.segments();
    let Some((last, parents)) = segments.split_last() else {
        return Ok(None);
    };
    let mut current = Value::Object(Arc::clone(root));
    for name in parents {
        match step(&current, name) {
            Ok(Value::Null) => return Ok(None),
            Ok(next) => current = next,
            Err(err) if err.is_unavailable() => return Ok(None),
            Err(err) => return Err(err),
        }
    }
    Ok(match &current {
        Value::Object(object) => object.read().property(last).map(|info| info.kind.clone()),
        other => other.member_kind(last),
    })
}
