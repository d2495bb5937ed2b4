// SPDX-License-Identifier: MIT OR Apache-2.0
//! Bindings between markup attribute names and property paths.

use crate::path::PropertyPath;
use crate::value::Value;

/// Association between an external attribute and a property path.
///
/// Bindings are evaluated in the order they were added to a transformer.
/// That order is part of the contract: writing one property (say, the
/// text of a node) may resize or move the object, and a later binding
/// (say, its bounds) must observe and override that.
#[derive(Debug, Clone, PartialEq)]
pub struct Binding {
    /// Attribute name in the markup
    pub name: String,
    /// Property path on the object
    pub path: PropertyPath,
    /// Do not read this property when generating
    pub suppress_read: bool,
    /// Do not write this property when consuming
    pub suppress_write: bool,
    /// The referenced object is *defined* by this attribute rather than
    /// looked up: its token is registered when consuming
    pub defines_identity: bool,
    /// Accessor failures abort the run instead of being ignored
    pub propagate_errors: bool,
    /// Value written when the attribute text cannot be decoded
    pub default: Option<Value>,
}

impl Binding {
    /// Create a binding; returns `None` for an empty path
    pub fn new(name: impl Into<String>, path: &str) -> Option<Self> {
        PropertyPath::parse(path).map(|path| Self::with_path(name, path))
    }

    /// Create a binding from an already parsed path
    pub fn with_path(name: impl Into<String>, path: PropertyPath) -> Self {
        Self {
            name: name.into(),
            path,
            suppress_read: false,
            suppress_write: false,
            defines_identity: false,
            propagate_errors: false,
            default: None,
        }
    }

    /// Binding for the logical tree parent pseudo-property
    pub fn tree_parent(name: impl Into<String>) -> Self {
        Self::with_path(name, PropertyPath::tree_parent())
    }

    /// Only consume, never generate
    pub fn write_only(mut self) -> Self {
        self.suppress_read = true;
        self
    }

    /// Only generate, never consume
    pub fn read_only(mut self) -> Self {
        self.suppress_write = true;
        self
    }

    /// Mark as identity-defining
    pub fn defines_identity(mut self) -> Self {
        self.defines_identity = true;
        self
    }

    /// Propagate accessor failures
    pub fn propagate_errors(mut self) -> Self {
        self.propagate_errors = true;
        self
    }

    /// Fallback for unparsable input
    pub fn with_default(mut self, value: impl Into<Value>) -> Self {
        self.default = Some(value.into());
        self
    }

    /// Whether this binds the logical tree parent
    pub fn is_tree_parent(&self) -> bool {
        self.path.is_tree_parent()
    }
}
