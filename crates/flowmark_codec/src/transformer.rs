// SPDX-License-Identifier: MIT OR Apache-2.0
//! Per-type transformers.
//!
//! A transformer describes how one class of object is allocated, populated
//! and emitted. Most of that is declarative and lives in
//! [`TransformerConfig`]; the [`Transformer`] trait exposes every step of
//! the generation and consumption pipelines as an overridable hook whose
//! default runs the standard behaviour from [`crate::writer::standard`] and
//! [`crate::reader::standard`]. An override can do its own work and still
//! call the standard function.
//!
//! Transformers are shared by every run that uses their registry, so they
//! must not keep per-run state. Anything a run needs to remember belongs in
//! its [`WriteContext`] or [`ReadContext`].

use crate::binding::Binding;
use crate::error::Result;
use crate::object::{share, ObjectRef, Reflect, TypeKey};
use crate::path::PropertyPath;
use crate::reader::{self, ReadContext};
use crate::shared::Referent;
use crate::writer::{self, WriteContext};
use std::fmt;
use std::sync::Arc;

/// Factory producing bare instances of a type
pub type Factory = Arc<dyn Fn() -> Box<dyn Reflect> + Send + Sync>;

/// How `allocate` obtains a fresh object
#[derive(Clone)]
pub enum Allocator {
    /// Copy a pre-configured prototype
    Prototype(ObjectRef),
    /// Build a bare instance
    Factory(Factory),
}

impl Allocator {
    /// Produce a new shared object
    pub fn allocate(&self) -> ObjectRef {
        match self {
            Self::Prototype(prototype) => share(prototype.read().copy_object()),
            Self::Factory(factory) => share(factory()),
        }
    }
}

impl fmt::Debug for Allocator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Prototype(prototype) => f.debug_tuple("Prototype").field(prototype).finish(),
            Self::Factory(_) => f.write_str("Factory(..)"),
        }
    }
}

/// What the body of an element holds
#[derive(Debug, Clone, Default, PartialEq)]
pub enum ChildPolicy {
    /// No nested elements
    #[default]
    None,
    /// Nested elements are the items of a container.
    ///
    /// `container` is the path to the container object; `None` means the
    /// object is its own container.
    Flat {
        /// Path to the container
        container: Option<PropertyPath>,
    },
    /// Nested elements are logical tree children, joined to their parent
    /// by a synthesized link (see [`TreeOptions`])
    Tree,
}

/// Settings for tree-link synthesis
#[derive(Debug, Clone)]
pub struct TreeOptions {
    /// Copied to create each synthesized link
    pub link_prototype: ObjectRef,
    /// Port on the parent node
    pub parent_port: PropertyPath,
    /// Port on the child node
    pub child_port: PropertyPath,
    /// Link property receiving the source port
    pub link_from: PropertyPath,
    /// Link property receiving the destination port
    pub link_to: PropertyPath,
    /// Links run from child to parent instead of parent to child
    pub reverse: bool,
}

impl TreeOptions {
    /// Create tree options.
    ///
    /// Paths that fail to parse fall back to the conventional names
    /// `FromPort` / `ToPort` / `OutPort` / `InPort`.
    pub fn new(link_prototype: ObjectRef, parent_port: &str, child_port: &str) -> Self {
        Self {
            link_prototype,
            parent_port: path_or(parent_port, "OutPort"),
            child_port: path_or(child_port, "InPort"),
            link_from: path_or("FromPort", "FromPort"),
            link_to: path_or("ToPort", "ToPort"),
            reverse: false,
        }
    }

    /// Use different link endpoint properties
    pub fn with_link_ends(mut self, from: &str, to: &str) -> Self {
        self.link_from = path_or(from, "FromPort");
        self.link_to = path_or(to, "ToPort");
        self
    }

    /// Links point from child to parent
    pub fn reversed(mut self) -> Self {
        self.reverse = true;
        self
    }
}

fn path_or(path: &str, fallback: &'static str) -> PropertyPath {
    PropertyPath::parse(path)
        .or_else(|| PropertyPath::parse(fallback))
        .unwrap_or_else(PropertyPath::tree_parent)
}

/// Declarative description of a transformer
#[derive(Debug, Clone)]
pub struct TransformerConfig {
    /// Runtime type handled
    pub target: TypeKey,
    /// Element name in the markup
    pub element_name: String,
    /// Attribute bindings, in evaluation order
    pub bindings: Vec<Binding>,
    /// Attribute carrying the object's own token, when identity is enabled
    pub identity_attribute: Option<String>,
    /// What nested elements mean
    pub child_policy: ChildPolicy,
    /// Property bound to the element's text body
    pub text: Option<PropertyPath>,
    /// Tree-link synthesis settings
    pub tree: Option<TreeOptions>,
    /// How fresh objects are made
    pub allocator: Option<Allocator>,
    /// Log resolution diagnostics for this transformer
    pub trace: bool,
}

impl TransformerConfig {
    /// Create a configuration for `target`, emitted as `element_name`
    pub fn new(target: TypeKey, element_name: impl Into<String>) -> Self {
        Self {
            target,
            element_name: element_name.into(),
            bindings: Vec::new(),
            identity_attribute: None,
            child_policy: ChildPolicy::None,
            text: None,
            tree: None,
            allocator: None,
            trace: false,
        }
    }

    /// Configuration for a default-constructible type
    pub fn of<T: Reflect + Default>(element_name: impl Into<String>) -> Self {
        let target = T::default().type_key();
        Self::new(target, element_name).with_factory(|| Box::new(T::default()))
    }

    /// Add a binding of `name` to `path`; empty paths are ignored
    pub fn bind(self, name: &str, path: &str) -> Self {
        self.bind_with(name, path, std::convert::identity)
    }

    /// Add a binding of `name` to `path`, adjusted by `f`
    pub fn bind_with(mut self, name: &str, path: &str, f: impl FnOnce(Binding) -> Binding) -> Self {
        match Binding::new(name, path) {
            Some(binding) => self.bindings.push(f(binding)),
            None => tracing::warn!(element = %self.element_name, name, "ignoring binding with empty path"),
        }
        self
    }

    /// Add a fully configured binding
    pub fn with_binding(mut self, binding: Binding) -> Self {
        self.bindings.push(binding);
        self
    }

    /// Enable the identity attribute under the given name
    pub fn with_identity(mut self, attribute: impl Into<String>) -> Self {
        self.identity_attribute = Some(attribute.into());
        self
    }

    /// Nested elements are items of the container at `path` (or of the
    /// object itself when `path` is empty)
    pub fn with_flat_children(mut self, path: &str) -> Self {
        self.child_policy = ChildPolicy::Flat {
            container: PropertyPath::parse(path),
        };
        self
    }

    /// Nested elements are logical tree children
    pub fn with_tree(mut self, options: TreeOptions) -> Self {
        self.child_policy = ChildPolicy::Tree;
        self.tree = Some(options);
        self
    }

    /// Tree options used only by a logical-parent binding
    pub fn with_tree_links(mut self, options: TreeOptions) -> Self {
        self.tree = Some(options);
        self
    }

    /// Bind the element's text body to `path`
    pub fn with_text(mut self, path: &str) -> Self {
        self.text = PropertyPath::parse(path);
        self
    }

    /// Allocate by copying `prototype`
    pub fn with_prototype(mut self, prototype: ObjectRef) -> Self {
        self.allocator = Some(Allocator::Prototype(prototype));
        self
    }

    /// Allocate with a factory
    pub fn with_factory(mut self, factory: impl Fn() -> Box<dyn Reflect> + Send + Sync + 'static) -> Self {
        self.allocator = Some(Allocator::Factory(Arc::new(factory)));
        self
    }

    /// Log resolution diagnostics
    pub fn traced(mut self) -> Self {
        self.trace = true;
        self
    }

    /// Binding with the given attribute name
    pub fn binding(&self, name: &str) -> Option<&Binding> {
        self.bindings.iter().find(|b| b.name == name)
    }

    /// Binding for the given property path
    pub fn binding_for_path(&self, path: &PropertyPath) -> Option<&Binding> {
        self.bindings.iter().find(|b| &b.path == path)
    }

    /// Whether nested elements are consumed
    pub fn holds_children(&self) -> bool {
        self.child_policy != ChildPolicy::None
    }
}

/// Strategy for converting one class of object to and from markup.
///
/// Generation calls, per object: [`generate_definitions`] during the first
/// pass over the whole collection, then [`generate_element`],
/// [`generate_attributes`], [`generate_body`] and
/// [`generate_element_finish`] during the second.
///
/// Consumption calls, per element: [`allocate`], [`consume_attributes`],
/// [`consume_body`] (which recursively consumes nested elements and hands
/// each result to [`consume_child`]), then [`consume_object_finish`].
/// Deferred references come back through [`update_reference`] once the
/// whole document has been read.
///
/// [`generate_definitions`]: Transformer::generate_definitions
/// [`generate_element`]: Transformer::generate_element
/// [`generate_attributes`]: Transformer::generate_attributes
/// [`generate_body`]: Transformer::generate_body
/// [`generate_element_finish`]: Transformer::generate_element_finish
/// [`allocate`]: Transformer::allocate
/// [`consume_attributes`]: Transformer::consume_attributes
/// [`consume_body`]: Transformer::consume_body
/// [`consume_child`]: Transformer::consume_child
/// [`consume_object_finish`]: Transformer::consume_object_finish
/// [`update_reference`]: Transformer::update_reference
pub trait Transformer: Send + Sync {
    /// Declarative configuration
    fn config(&self) -> &TransformerConfig;

    /// Leave `object` out of the output entirely
    fn skip(&self, _ctx: &WriteContext<'_>, _object: &ObjectRef) -> bool {
        false
    }

    /// First pass: assign identities and visit nested objects
    fn generate_definitions(&self, ctx: &mut WriteContext<'_>, object: &ObjectRef) -> Result<()> {
        writer::standard::definitions(self, ctx, object)
    }

    /// Open the element; `false` means no element was opened and the
    /// attributes go to the enclosing element
    fn generate_element(&self, ctx: &mut WriteContext<'_>, object: &ObjectRef) -> Result<bool> {
        writer::standard::element(self, ctx, object)
    }

    /// Emit the identity attribute and every binding
    fn generate_attributes(&self, ctx: &mut WriteContext<'_>, object: &ObjectRef) -> Result<()> {
        writer::standard::attributes(self, ctx, object)
    }

    /// Emit nested elements or body text
    fn generate_body(&self, ctx: &mut WriteContext<'_>, object: &ObjectRef) -> Result<()> {
        writer::standard::body(self, ctx, object)
    }

    /// Close the element opened by [`Transformer::generate_element`]
    fn generate_element_finish(&self, ctx: &mut WriteContext<'_>, object: &ObjectRef) -> Result<()> {
        writer::standard::element_finish(self, ctx, object)
    }

    /// Produce a fresh object for the current element, or `None` to skip it
    fn allocate(&self, ctx: &mut ReadContext<'_>) -> Result<Option<ObjectRef>> {
        reader::standard::allocate(self, ctx)
    }

    /// Apply the identity attribute and every binding
    fn consume_attributes(&self, ctx: &mut ReadContext<'_>, object: &ObjectRef) -> Result<()> {
        reader::standard::attributes(self, ctx, object)
    }

    /// Consume nested elements or body text
    fn consume_body(&self, ctx: &mut ReadContext<'_>, object: &ObjectRef) -> Result<()> {
        reader::standard::body(self, ctx, object)
    }

    /// Incorporate a consumed nested object
    fn consume_child(&self, ctx: &mut ReadContext<'_>, object: &ObjectRef, child: &ObjectRef) -> Result<()> {
        reader::standard::child(self, ctx, object, child)
    }

    /// Final adjustment once the whole subtree is built
    fn consume_object_finish(&self, ctx: &mut ReadContext<'_>, object: &ObjectRef) -> Result<()> {
        reader::standard::object_finish(self, ctx, object)
    }

    /// A deferred reference has been resolved (or never will be)
    fn update_reference(
        &self,
        ctx: &mut ReadContext<'_>,
        object: &ObjectRef,
        path: &PropertyPath,
        referent: Referent,
    ) -> Result<()> {
        reader::standard::update_reference(self, ctx, object, path, referent)
    }
}

/// A transformer driven entirely by its configuration
#[derive(Debug, Clone)]
pub struct BindingTransformer {
    config: TransformerConfig,
}

impl BindingTransformer {
    /// Wrap a configuration
    pub fn new(config: TransformerConfig) -> Self {
        Self { config }
    }
}

impl Transformer for BindingTransformer {
    fn config(&self) -> &TransformerConfig {
        &self.config
    }
}

impl From<TransformerConfig> for BindingTransformer {
    fn from(config: TransformerConfig) -> Self {
        Self::new(config)
    }
}

/// A transformer that extends another one.
///
/// The configuration starts as a copy of the base's with a new target type
/// and element name; further bindings are appended after the inherited
/// ones. Skipping, child handling and the finishing hook are delegated to
/// the base, as is allocation when no allocator of its own is set.
pub struct Inherits {
    base: Arc<dyn Transformer>,
    config: TransformerConfig,
}

impl Inherits {
    /// Derive from `base` for `target`, emitted as `element_name`
    pub fn new(base: Arc<dyn Transformer>, target: TypeKey, element_name: impl Into<String>) -> Self {
        let mut config = base.config().clone();
        config.target = target;
        config.element_name = element_name.into();
        config.allocator = None;
        Self { base, config }
    }

    /// Modify the inherited configuration
    pub fn configure(mut self, f: impl FnOnce(TransformerConfig) -> TransformerConfig) -> Self {
        self.config = f(self.config);
        self
    }

    /// The wrapped transformer
    pub fn base(&self) -> &Arc<dyn Transformer> {
        &self.base
    }
}

impl Transformer for Inherits {
    fn config(&self) -> &TransformerConfig {
        &self.config
    }

    fn skip(&self, ctx: &WriteContext<'_>, object: &ObjectRef) -> bool {
        self.base.skip(ctx, object)
    }

    fn allocate(&self, ctx: &mut ReadContext<'_>) -> Result<Option<ObjectRef>> {
        if self.config.allocator.is_some() {
            reader::standard::allocate(self, ctx)
        } else {
            self.base.allocate(ctx)
        }
    }

    fn consume_child(&self, ctx: &mut ReadContext<'_>, object: &ObjectRef, child: &ObjectRef) -> Result<()> {
        self.base.consume_child(ctx, object, child)
    }

    fn consume_object_finish(&self, ctx: &mut ReadContext<'_>, object: &ObjectRef) -> Result<()> {
        self.base.consume_object_finish(ctx, object)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::Shape;
    use crate::object::share_value;

    #[test]
    fn test_config_builder() {
        let config = TransformerConfig::of::<Shape>("shape")
            .with_identity("id")
            .bind("name", "Name")
            .bind("bad", "")
            .bind("w", "Bounds.Width")
            .bind_with("secret", "Secret", Binding::write_only)
            .with_flat_children("");
        assert_eq!(config.target, TypeKey("Shape"));
        assert_eq!(config.bindings.len(), 3);
        assert!(config.binding("secret").is_some_and(|b| b.suppress_read));
        assert!(config.binding("w").is_some());
        assert!(config.binding("bad").is_none());
        assert_eq!(config.child_policy, ChildPolicy::Flat { container: None });
        assert!(config.holds_children());
        assert!(matches!(config.allocator, Some(Allocator::Factory(_))));
    }

    #[test]
    fn test_prototype_allocation_copies() {
        let prototype = share_value(Shape::new("template"));
        let allocator = Allocator::Prototype(prototype.clone());
        let first = allocator.allocate();
        let second = allocator.allocate();
        assert!(!Arc::ptr_eq(&first, &second));
        assert!(!Arc::ptr_eq(&first, &prototype));
        let name = first.read().get("Name").unwrap();
        assert_eq!(name.as_str(), Some("template"));
    }

    #[test]
    fn test_inherits_extends_bindings() {
        let base: Arc<dyn Transformer> = Arc::new(BindingTransformer::new(
            TransformerConfig::of::<Shape>("shape").bind("name", "Name"),
        ));
        let derived = Inherits::new(base, TypeKey("Special"), "special")
            .configure(|c| c.bind("w", "Bounds.Width"));
        let config = derived.config();
        assert_eq!(config.element_name, "special");
        assert_eq!(config.target, TypeKey("Special"));
        let names: Vec<_> = config.bindings.iter().map(|b| b.name.as_str()).collect();
        assert_eq!(names, ["name", "w"]);
        assert!(config.allocator.is_none());
    }

    #[test]
    fn test_tree_options_defaults() {
        let link = share_value(Shape::new("link"));
        let options = TreeOptions::new(link, "", "In").reversed();
        assert_eq!(options.parent_port.to_string(), "OutPort");
        assert_eq!(options.child_port.to_string(), "In");
        assert_eq!(options.link_from.to_string(), "FromPort");
        assert!(options.reverse);
    }
}
