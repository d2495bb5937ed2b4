// SPDX-License-Identifier: MIT OR Apache-2.0
//! Generation pipeline: object graph to markup.
//!
//! A run has two strictly separated stages. [`WriteContext::define`] visits
//! every object of the root collection first and assigns identity tokens;
//! only then does [`WriteContext::emit`] write elements. Because every token
//! exists before the first attribute is written, references can point
//! forward in the document without buffering.

use crate::binding::Binding;
use crate::error::{CodecError, Result};
use crate::markup::{Element, ElementBuilder, MarkupSink};
use crate::object::{type_of, ObjectKey, ObjectRef};
use crate::path::{self, PropertyPath};
use crate::registry::TransformerRegistry;
use crate::scalar::{self, NULL_TOKEN};
use crate::shared::{LinkIndex, ObjectStack, SharedObjects};
use crate::transformer::{Transformer, TransformerConfig};
use crate::tree;
use crate::value::{Value, ValueKind};
use crate::xml::XmlSink;
use std::collections::HashMap;
use std::io::Write;
use std::sync::Arc;

/// Writer options
#[derive(Debug, Clone, PartialEq)]
pub struct WriterOptions {
    /// Root element name when the root has no transformer of its own
    pub root_element: String,
    /// Emit graph nodes before other objects
    pub nodes_first: bool,
    /// Write well-known colours by name
    pub named_colors: bool,
    /// Log resolution diagnostics for every transformer
    pub trace: bool,
    /// Indentation for XML output
    pub indent: usize,
}

impl Default for WriterOptions {
    fn default() -> Self {
        Self {
            root_element: "flow".to_string(),
            nodes_first: true,
            named_colors: false,
            trace: false,
            indent: 2,
        }
    }
}

/// State of one generation run
pub struct WriteContext<'w> {
    registry: &'w TransformerRegistry,
    options: &'w WriterOptions,
    sink: &'w mut dyn MarkupSink,
    /// Identity tokens assigned so far
    pub shared: SharedObjects,
    /// Objects whose bodies are being written
    pub stack: ObjectStack,
    links: LinkIndex,
    defined: HashMap<ObjectKey, ObjectRef>,
}

impl<'w> WriteContext<'w> {
    fn new(
        registry: &'w TransformerRegistry,
        options: &'w WriterOptions,
        sink: &'w mut dyn MarkupSink,
        items: &[ObjectRef],
    ) -> Self {
        Self {
            registry,
            options,
            sink,
            shared: SharedObjects::new(),
            stack: ObjectStack::new(),
            links: LinkIndex::build(items),
            defined: HashMap::new(),
        }
    }

    /// Options of this run
    pub fn options(&self) -> &WriterOptions {
        self.options
    }

    /// Whether diagnostics are logged for a transformer
    pub fn tracing(&self, config: &TransformerConfig) -> bool {
        self.options.trace || config.trace
    }

    /// Definitions stage for one object.
    ///
    /// Each object is defined at most once per run; objects without a
    /// transformer, or that their transformer skips, are ignored.
    pub fn define(&mut self, object: &ObjectRef) -> Result<()> {
        let key = ObjectKey::of(object);
        if self.defined.contains_key(&key) {
            return Ok(());
        }
        self.defined.insert(key, Arc::clone(object));

        let registry = self.registry;
        let Some(transformer) = registry.resolve_object(object) else {
            return Ok(());
        };
        if transformer.skip(self, object) {
            return Ok(());
        }
        transformer.generate_definitions(self, object)
    }

    /// Emission stage for one object.
    ///
    /// Every object that may be referenced must have gone through
    /// [`WriteContext::define`] before the first call to this.
    pub fn emit(&mut self, object: &ObjectRef) -> Result<()> {
        let registry = self.registry;
        let Some(transformer) = registry.resolve_object(object) else {
            if self.options.trace {
                tracing::debug!(object_type = %type_of(object), "no transformer, object skipped");
            }
            return Ok(());
        };
        if transformer.skip(self, object) {
            return Ok(());
        }

        let opened = transformer.generate_element(self, object)?;
        transformer.generate_attributes(self, object)?;
        self.stack.push(object);
        let body = transformer.generate_body(self, object);
        self.stack.pop();
        body?;
        if opened {
            transformer.generate_element_finish(self, object)?;
        }
        Ok(())
    }

    /// Open an element
    pub fn start_element(&mut self, name: &str) -> Result<()> {
        self.sink.start_element(name)
    }

    /// Add an attribute to the open element
    pub fn attribute(&mut self, name: &str, value: &str) -> Result<()> {
        self.sink.attribute(name, value)
    }

    /// Add body text to the open element
    pub fn text(&mut self, text: &str) -> Result<()> {
        self.sink.text(text)
    }

    /// Close the open element
    pub fn end_element(&mut self) -> Result<()> {
        self.sink.end_element()
    }

    /// Read a binding's value.
    ///
    /// `Ok(None)` when the value is unavailable or the accessor failed on a
    /// binding that swallows failures.
    pub fn read_binding(
        &self,
        config: &TransformerConfig,
        object: &ObjectRef,
        binding: &Binding,
    ) -> Result<Option<Value>> {
        match path::read(object, &binding.path) {
            Ok(value) => {
                if value.is_none() && self.tracing(config) {
                    tracing::debug!(
                        element = %config.element_name,
                        path = %binding.path,
                        "property unavailable"
                    );
                }
                Ok(value)
            }
            Err(err) if binding.propagate_errors => {
                Err(CodecError::accessor(type_of(object), &binding.path, &err))
            }
            Err(err) => {
                if self.tracing(config) {
                    tracing::debug!(
                        element = %config.element_name,
                        path = %binding.path,
                        %err,
                        "accessor failed, attribute omitted"
                    );
                }
                Ok(None)
            }
        }
    }

    /// Items of the container at `container` (or of `object` itself)
    pub fn container_items(&self, object: &ObjectRef, container: Option<&PropertyPath>) -> Vec<ObjectRef> {
        let target = match container {
            None => Arc::clone(object),
            Some(path) => match path::read(object, path) {
                Ok(Some(Value::Object(target))) => target,
                _ => return Vec::new(),
            },
        };
        let guard = target.read();
        guard
            .collection()
            .map(|collection| collection.items())
            .unwrap_or_default()
    }

    /// Logical tree children of `object`
    pub fn tree_children(&self, config: &TransformerConfig, object: &ObjectRef) -> Vec<ObjectRef> {
        tree::children(&self.links, reversed(config), object)
    }

    /// Logical tree parent of `object`
    pub fn tree_parent_of(&self, config: &TransformerConfig, object: &ObjectRef) -> Option<ObjectRef> {
        tree::parent(&self.links, reversed(config), object)
    }
}

fn reversed(config: &TransformerConfig) -> bool {
    config.tree.as_ref().is_some_and(|tree| tree.reverse)
}

/// Standard generation hooks, used by the default [`Transformer`] methods
pub mod standard {
    use super::*;
    use crate::transformer::ChildPolicy;

    /// Assign tokens and define everything the object refers to or contains
    pub fn definitions<T: Transformer + ?Sized>(
        transformer: &T,
        ctx: &mut WriteContext<'_>,
        object: &ObjectRef,
    ) -> Result<()> {
        let config = transformer.config();
        if config.identity_attribute.is_some() {
            ctx.shared.make_shared(object);
        }
        for binding in config.bindings.iter().filter(|b| !b.suppress_read) {
            if binding.is_tree_parent() {
                if let Some(parent) = ctx.tree_parent_of(config, object) {
                    ctx.shared.make_shared(&parent);
                }
                continue;
            }
            if let Some(Value::Object(referent)) = ctx.read_binding(config, object, binding)? {
                ctx.shared.make_shared(&referent);
                if !binding.defines_identity {
                    ctx.define(&referent)?;
                }
            }
        }
        for child in body_children(ctx, config, object) {
            ctx.define(&child)?;
        }
        Ok(())
    }

    /// Open the element named by the configuration
    pub fn element<T: Transformer + ?Sized>(
        transformer: &T,
        ctx: &mut WriteContext<'_>,
        _object: &ObjectRef,
    ) -> Result<bool> {
        ctx.start_element(&transformer.config().element_name)?;
        Ok(true)
    }

    /// Identity attribute, then every binding in declaration order
    pub fn attributes<T: Transformer + ?Sized>(
        transformer: &T,
        ctx: &mut WriteContext<'_>,
        object: &ObjectRef,
    ) -> Result<()> {
        let config = transformer.config();
        if let Some(name) = &config.identity_attribute {
            let token = ctx.shared.make_shared(object);
            ctx.attribute(name, &token)?;
        }
        for binding in config.bindings.iter().filter(|b| !b.suppress_read) {
            if binding.is_tree_parent() {
                if let Some(parent) = ctx.tree_parent_of(config, object) {
                    let token = ctx.shared.make_shared(&parent);
                    ctx.attribute(&binding.name, &token)?;
                }
                continue;
            }
            let Some(value) = ctx.read_binding(config, object, binding)? else {
                continue;
            };
            match value {
                Value::Object(referent) => {
                    let token = ctx.shared.make_shared(&referent);
                    ctx.attribute(&binding.name, &token)?;
                }
                Value::Null => {
                    if let Ok(Some(ValueKind::Object)) = path::kind(object, &binding.path) {
                        ctx.attribute(&binding.name, NULL_TOKEN)?;
                    }
                }
                other => {
                    if let Some(text) = scalar::encode(&other, ctx.options.named_colors) {
                        ctx.attribute(&binding.name, &text)?;
                    }
                }
            }
        }
        Ok(())
    }

    /// Body text, then nested elements per the child policy
    pub fn body<T: Transformer + ?Sized>(
        transformer: &T,
        ctx: &mut WriteContext<'_>,
        object: &ObjectRef,
    ) -> Result<()> {
        let config = transformer.config();
        if let Some(text_path) = &config.text {
            if let Ok(Some(value)) = path::read(object, text_path) {
                if let Some(text) = scalar::encode(&value, ctx.options.named_colors) {
                    if !text.is_empty() {
                        ctx.text(&text)?;
                    }
                }
            }
        }
        for child in body_children(ctx, config, object) {
            // a cycle in the link structure would otherwise recurse forever
            if !ctx.stack.contains(&child) {
                ctx.emit(&child)?;
            }
        }
        Ok(())
    }

    /// Close the element
    pub fn element_finish<T: Transformer + ?Sized>(
        _transformer: &T,
        ctx: &mut WriteContext<'_>,
        _object: &ObjectRef,
    ) -> Result<()> {
        ctx.end_element()
    }

    fn body_children(ctx: &WriteContext<'_>, config: &TransformerConfig, object: &ObjectRef) -> Vec<ObjectRef> {
        match &config.child_policy {
            ChildPolicy::None => Vec::new(),
            ChildPolicy::Flat { container } => ctx.container_items(object, container.as_ref()),
            ChildPolicy::Tree => ctx.tree_children(config, object),
        }
    }
}

/// Writes object graphs as markup
#[derive(Clone)]
pub struct Writer {
    registry: Arc<TransformerRegistry>,
    options: WriterOptions,
}

impl Writer {
    /// Create a writer with default options
    pub fn new(registry: Arc<TransformerRegistry>) -> Self {
        Self::with_options(registry, WriterOptions::default())
    }

    /// Create a writer with the given options
    pub fn with_options(registry: Arc<TransformerRegistry>, options: WriterOptions) -> Self {
        Self { registry, options }
    }

    /// Options in use
    pub fn options(&self) -> &WriterOptions {
        &self.options
    }

    /// Start a run over `items` without writing anything yet.
    ///
    /// Lets callers drive [`WriteContext::define`] and
    /// [`WriteContext::emit`] themselves.
    pub fn context<'w>(&'w self, sink: &'w mut dyn MarkupSink, items: &[ObjectRef]) -> Result<WriteContext<'w>> {
        if self.registry.is_empty() {
            return Err(CodecError::NoTransformers);
        }
        Ok(WriteContext::new(&self.registry, &self.options, sink, items))
    }

    /// Write the whole document for `root`.
    ///
    /// When the root is a collection its items are written; otherwise the
    /// root itself is the only item. A collection root with a transformer
    /// of its own names the document element and contributes its bindings
    /// as document attributes.
    pub fn generate(&self, sink: &mut dyn MarkupSink, root: &ObjectRef) -> Result<()> {
        let (items, is_collection) = {
            let guard = root.read();
            match guard.collection() {
                Some(collection) => (collection.items(), true),
                None => (vec![Arc::clone(root)], false),
            }
        };
        let root_transformer = if is_collection {
            self.registry.resolve_object(root).cloned()
        } else {
            None
        };

        let mut ctx = self.context(sink, &items)?;

        if let Some(transformer) = &root_transformer {
            ctx.defined.insert(ObjectKey::of(root), Arc::clone(root));
            transformer.generate_definitions(&mut ctx, root)?;
        }
        for item in &items {
            ctx.define(item)?;
        }

        let root_name = root_transformer
            .as_ref()
            .map_or(self.options.root_element.as_str(), |t| t.config().element_name.as_str());
        ctx.start_element(root_name)?;
        if let Some(transformer) = &root_transformer {
            transformer.generate_attributes(&mut ctx, root)?;
        }
        ctx.stack.push(root);
        for item in self.emission_order(&items) {
            ctx.emit(item)?;
        }
        ctx.stack.pop();
        ctx.end_element()?;

        tracing::info!(
            objects = items.len(),
            tokens = ctx.shared.len(),
            "generated document"
        );
        Ok(())
    }

    /// Nodes first (stable) when requested, otherwise collection order
    fn emission_order<'a>(&self, items: &'a [ObjectRef]) -> Vec<&'a ObjectRef> {
        if !self.options.nodes_first {
            return items.iter().collect();
        }
        let (nodes, others): (Vec<_>, Vec<_>) = items.iter().partition(|item| item.read().is_node());
        nodes.into_iter().chain(others).collect()
    }

    /// Generate into an in-memory element tree
    pub fn to_element(&self, root: &ObjectRef) -> Result<Element> {
        let mut builder = ElementBuilder::new();
        self.generate(&mut builder, root)?;
        builder.finish()
    }

    /// Generate an XML document into `out`
    pub fn write_xml<W: Write>(&self, root: &ObjectRef, out: W) -> Result<W> {
        let mut sink = XmlSink::new(out, self.options.indent);
        sink.declaration()?;
        self.generate(&mut sink, root)?;
        sink.into_inner()
    }

    /// Generate an XML document as a string
    pub fn to_xml(&self, root: &ObjectRef) -> Result<String> {
        let bytes = self.write_xml(root, Vec::new())?;
        Ok(String::from_utf8_lossy(&bytes).into_owned())
    }
}
