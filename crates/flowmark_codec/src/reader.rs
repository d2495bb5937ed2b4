// SPDX-License-Identifier: MIT OR Apache-2.0
//! Consumption pipeline: markup to object graph.
//!
//! Elements are consumed in a single forward pass. References to objects
//! that have not been read yet are queued as delayed references and
//! resolved in one sweep once the whole document has been consumed.

use crate::binding::Binding;
use crate::error::{CodecError, Result};
use crate::markup::Element;
use crate::object::{type_of, ObjectRef};
use crate::path::{self, PropertyPath};
use crate::registry::TransformerRegistry;
use crate::scalar::{self, NULL_TOKEN};
use crate::shared::{DelayedReference, DelayedReferences, ObjectStack, Referent, SharedTokens};
use crate::transformer::{Transformer, TransformerConfig};
use crate::tree;
use crate::value::{Value, ValueKind};
use crate::xml;
use std::sync::Arc;

/// Reader options
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ReaderOptions {
    /// Log resolution diagnostics for every transformer
    pub trace: bool,
}

struct Frame<'a> {
    element: &'a Element,
    transformer: Arc<dyn Transformer>,
}

/// State of one consumption run
pub struct ReadContext<'a> {
    registry: &'a TransformerRegistry,
    options: &'a ReaderOptions,
    frames: Vec<Frame<'a>>,
    /// Objects registered under identity tokens
    pub tokens: SharedTokens,
    /// References waiting for their referent
    pub delayed: DelayedReferences,
    /// Objects whose bodies are being consumed
    pub stack: ObjectStack,
    results: Vec<ObjectRef>,
    last_slot: usize,
}

impl<'a> ReadContext<'a> {
    fn new(registry: &'a TransformerRegistry, options: &'a ReaderOptions) -> Self {
        Self {
            registry,
            options,
            frames: Vec::new(),
            tokens: SharedTokens::new(),
            delayed: DelayedReferences::new(),
            stack: ObjectStack::new(),
            results: Vec::new(),
            last_slot: 0,
        }
    }

    /// Whether diagnostics are logged for a transformer
    pub fn tracing(&self, config: &TransformerConfig) -> bool {
        self.options.trace || config.trace
    }

    /// Element currently being consumed
    pub fn element(&self) -> Option<&'a Element> {
        self.frames.last().map(|frame| frame.element)
    }

    /// Attribute of the current element
    pub fn attribute(&self, name: &str) -> Option<&'a str> {
        self.element().and_then(|element| element.attribute(name))
    }

    /// Transformer handling the current element
    pub fn transformer(&self) -> Option<&Arc<dyn Transformer>> {
        self.frames.last().map(|frame| &frame.transformer)
    }

    /// Run the full pipeline for one element.
    ///
    /// `Ok(None)` when no transformer handles the element name or the
    /// transformer declined to allocate; the whole subtree is skipped.
    pub fn consume_element(&mut self, element: &'a Element) -> Result<Option<ObjectRef>> {
        let registry = self.registry;
        let Some(transformer) = registry.for_element(&element.name) else {
            if self.options.trace {
                tracing::debug!(element = %element.name, "no transformer, element skipped");
            }
            return Ok(None);
        };
        let slot = self.results.len();
        self.frames.push(Frame {
            element,
            transformer: Arc::clone(transformer),
        });
        let result = self.consume_current(transformer.as_ref());
        self.frames.pop();
        self.last_slot = slot;
        result
    }

    fn consume_current(&mut self, transformer: &dyn Transformer) -> Result<Option<ObjectRef>> {
        let Some(object) = transformer.allocate(self)? else {
            return Ok(None);
        };
        transformer.consume_attributes(self, &object)?;
        transformer.consume_body(self, &object)?;
        transformer.consume_object_finish(self, &object)?;
        Ok(Some(object))
    }

    /// Append an object to the run's results
    pub fn add_result(&mut self, object: ObjectRef) {
        self.results.push(object);
    }

    /// Insert an object into the results at `slot`
    pub fn insert_result(&mut self, slot: usize, object: ObjectRef) {
        let slot = slot.min(self.results.len());
        self.results.insert(slot, object);
    }

    /// Result count observed when the most recently finished element began
    pub fn last_slot(&self) -> usize {
        self.last_slot
    }

    /// Results collected so far
    pub fn results(&self) -> &[ObjectRef] {
        &self.results
    }

    /// Write a decoded value through a binding.
    ///
    /// Unavailable members are ignored; accessor failures are ignored unless
    /// the binding propagates them.
    pub fn write_binding(
        &self,
        config: &TransformerConfig,
        object: &ObjectRef,
        binding: &Binding,
        value: Value,
    ) -> Result<()> {
        match path::write(object, &binding.path, value) {
            Ok(true) => Ok(()),
            Ok(false) => {
                if self.tracing(config) {
                    tracing::debug!(
                        element = %config.element_name,
                        path = %binding.path,
                        "property unavailable, value dropped"
                    );
                }
                Ok(())
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
                        "accessor failed, value dropped"
                    );
                }
                Ok(())
            }
        }
    }

    /// Static kind of a binding's target member
    pub fn binding_kind(
        &self,
        config: &TransformerConfig,
        object: &ObjectRef,
        binding: &Binding,
    ) -> Result<Option<ValueKind>> {
        match path::kind(object, &binding.path) {
            Ok(kind) => {
                if kind.is_none() && self.tracing(config) {
                    tracing::debug!(
                        element = %config.element_name,
                        path = %binding.path,
                        "no such member"
                    );
                }
                Ok(kind)
            }
            Err(err) if binding.propagate_errors => {
                Err(CodecError::accessor(type_of(object), &binding.path, &err))
            }
            Err(_) => Ok(None),
        }
    }

    /// Hand every delayed reference to its transformer, once
    pub fn resolve_delayed(&mut self) -> Result<()> {
        let pending = self.delayed.drain(&self.tokens);
        if !pending.is_empty() {
            tracing::debug!(count = pending.len(), "resolving delayed references");
        }
        for (reference, referent) in pending {
            reference
                .transformer
                .update_reference(self, &reference.owner, &reference.path, referent)?;
        }
        if !self.delayed.is_empty() {
            tracing::warn!(
                count = self.delayed.len(),
                "references queued during resolution are dropped"
            );
        }
        Ok(())
    }
}

/// Standard consumption hooks, used by the default [`Transformer`] methods
pub mod standard {
    use super::*;
    use crate::transformer::ChildPolicy;

    /// Fresh object from the configured allocator
    pub fn allocate<T: Transformer + ?Sized>(
        transformer: &T,
        ctx: &mut ReadContext<'_>,
    ) -> Result<Option<ObjectRef>> {
        let config = transformer.config();
        match &config.allocator {
            Some(allocator) => Ok(Some(allocator.allocate())),
            None => {
                if ctx.tracing(config) {
                    tracing::debug!(element = %config.element_name, "no allocator, element skipped");
                }
                Ok(None)
            }
        }
    }

    /// Identity token first, then every binding in declaration order
    pub fn attributes<T: Transformer + ?Sized>(
        transformer: &T,
        ctx: &mut ReadContext<'_>,
        object: &ObjectRef,
    ) -> Result<()> {
        let config = transformer.config();
        let Some(element) = ctx.element() else {
            return Ok(());
        };
        if let Some(token) = config
            .identity_attribute
            .as_deref()
            .and_then(|name| element.attribute(name))
        {
            ctx.tokens.define(token, object);
        }

        for binding in config.bindings.iter().filter(|b| !b.suppress_write) {
            let Some(text) = element.attribute(&binding.name) else {
                continue;
            };
            if binding.is_tree_parent() {
                parent_reference(ctx, config, object, text)?;
                continue;
            }
            match ctx.binding_kind(config, object, binding)? {
                None => {}
                Some(ValueKind::Object) => object_reference(ctx, config, object, binding, text)?,
                Some(kind) => {
                    let value = match scalar::decode(&kind, text) {
                        Ok(value) => value,
                        Err(err) => {
                            tracing::warn!(
                                element = %config.element_name,
                                attribute = %binding.name,
                                %err,
                                "unreadable value"
                            );
                            match &binding.default {
                                Some(default) => default.clone(),
                                None => continue,
                            }
                        }
                    };
                    ctx.write_binding(config, object, binding, value)?;
                }
            }
        }
        Ok(())
    }

    fn object_reference(
        ctx: &mut ReadContext<'_>,
        config: &TransformerConfig,
        object: &ObjectRef,
        binding: &Binding,
        token: &str,
    ) -> Result<()> {
        if binding.defines_identity {
            // the referent already exists as part of `object`; name it
            if let Ok(Some(Value::Object(current))) = path::read(object, &binding.path) {
                ctx.tokens.define(token, &current);
            }
            return Ok(());
        }
        if token == NULL_TOKEN {
            return ctx.write_binding(config, object, binding, Value::Null);
        }
        if let Some(referent) = ctx.tokens.get(token).cloned() {
            return ctx.write_binding(config, object, binding, Value::Object(referent));
        }
        queue(ctx, object, binding.path.clone(), token);
        Ok(())
    }

    fn parent_reference(
        ctx: &mut ReadContext<'_>,
        config: &TransformerConfig,
        object: &ObjectRef,
        token: &str,
    ) -> Result<()> {
        let Some(options) = &config.tree else {
            tracing::warn!(element = %config.element_name, "parent reference without tree options");
            return Ok(());
        };
        match ctx.tokens.get(token).cloned() {
            Some(parent) => {
                tree::synthesize(ctx, options, &parent, object, false)?;
            }
            None => queue(ctx, object, PropertyPath::tree_parent(), token),
        }
        Ok(())
    }

    fn queue(ctx: &mut ReadContext<'_>, object: &ObjectRef, path: PropertyPath, token: &str) {
        let Some(transformer) = ctx.transformer().cloned() else {
            return;
        };
        ctx.delayed.push(DelayedReference {
            owner: Arc::clone(object),
            transformer,
            path,
            token: token.to_string(),
        });
    }

    /// Body text, then nested elements when the child policy allows them
    pub fn body<T: Transformer + ?Sized>(
        transformer: &T,
        ctx: &mut ReadContext<'_>,
        object: &ObjectRef,
    ) -> Result<()> {
        let config = transformer.config();
        let Some(element) = ctx.element() else {
            return Ok(());
        };
        if let (Some(text_path), Some(text)) = (&config.text, &element.text) {
            let kind = path::kind(object, text_path).ok().flatten().unwrap_or(ValueKind::String);
            match scalar::decode(&kind, text) {
                Ok(value) => {
                    if let Err(err) = path::write(object, text_path, value) {
                        tracing::debug!(path = %text_path, %err, "body text dropped");
                    }
                }
                Err(err) => tracing::warn!(element = %config.element_name, %err, "unreadable body text"),
            }
        }
        if !config.holds_children() {
            return Ok(());
        }
        for child_element in &element.children {
            ctx.stack.push(object);
            let child = ctx.consume_element(child_element);
            ctx.stack.pop();
            if let Some(child) = child? {
                transformer.consume_child(ctx, object, &child)?;
            }
        }
        Ok(())
    }

    /// Append to the container or synthesize a tree link
    pub fn child<T: Transformer + ?Sized>(
        transformer: &T,
        ctx: &mut ReadContext<'_>,
        object: &ObjectRef,
        child: &ObjectRef,
    ) -> Result<()> {
        let config = transformer.config();
        match &config.child_policy {
            ChildPolicy::None => {}
            ChildPolicy::Flat { container } => {
                let target = match container {
                    None => Arc::clone(object),
                    Some(path) => match path::read(object, path) {
                        Ok(Some(Value::Object(target))) => target,
                        _ => {
                            tracing::warn!(element = %config.element_name, container = %path, "container not found");
                            return Ok(());
                        }
                    },
                };
                let mut guard = target.write();
                match guard.collection_mut() {
                    Some(collection) => collection.push(Arc::clone(child)),
                    None => tracing::warn!(element = %config.element_name, "container cannot hold children"),
                }
            }
            ChildPolicy::Tree => {
                if let Some(options) = &config.tree {
                    tree::synthesize(ctx, options, object, child, true)?;
                }
            }
        }
        Ok(())
    }

    /// Nothing to finish by default
    pub fn object_finish<T: Transformer + ?Sized>(
        _transformer: &T,
        _ctx: &mut ReadContext<'_>,
        _object: &ObjectRef,
    ) -> Result<()> {
        Ok(())
    }

    /// Write the resolved referent, or connect a tree parent
    pub fn update_reference<T: Transformer + ?Sized>(
        transformer: &T,
        ctx: &mut ReadContext<'_>,
        object: &ObjectRef,
        path: &PropertyPath,
        referent: Referent,
    ) -> Result<()> {
        let config = transformer.config();
        let target = match referent {
            Referent::Object(target) => target,
            Referent::Unresolved(token) => {
                tracing::warn!(
                    element = %config.element_name,
                    path = %path,
                    token,
                    "reference never resolved"
                );
                return Ok(());
            }
        };
        if path.is_tree_parent() {
            if let Some(options) = &config.tree {
                tree::synthesize(ctx, options, &target, object, false)?;
            }
            return Ok(());
        }
        match config.binding_for_path(path) {
            Some(binding) => ctx.write_binding(config, object, binding, Value::Object(target)),
            None => {
                let binding = Binding::with_path(path.last(), path.clone());
                ctx.write_binding(config, object, &binding, Value::Object(target))
            }
        }
    }
}

/// Reads markup back into object graphs
#[derive(Clone)]
pub struct Reader {
    registry: Arc<TransformerRegistry>,
    options: ReaderOptions,
}

impl Reader {
    /// Create a reader with default options
    pub fn new(registry: Arc<TransformerRegistry>) -> Self {
        Self::with_options(registry, ReaderOptions::default())
    }

    /// Create a reader with the given options
    pub fn with_options(registry: Arc<TransformerRegistry>, options: ReaderOptions) -> Self {
        Self { registry, options }
    }

    /// Consume a document.
    ///
    /// When `root` has a transformer whose element name matches the
    /// document element, the document attributes are bound to it. Every
    /// top-level element is consumed, delayed references are resolved,
    /// and the results are appended to `root` if it is a collection.
    /// Results are returned in document order; an object always precedes
    /// the children and links synthesized from its body.
    pub fn consume(&self, document: &Element, root: Option<&ObjectRef>) -> Result<Vec<ObjectRef>> {
        if self.registry.is_empty() {
            return Err(CodecError::NoTransformers);
        }
        let mut ctx = ReadContext::new(&self.registry, &self.options);

        if let Some(root) = root {
            if let Some(transformer) = self.registry.resolve_object(root) {
                if transformer.config().element_name == document.name {
                    ctx.frames.push(Frame {
                        element: document,
                        transformer: Arc::clone(transformer),
                    });
                    let bound = transformer.consume_attributes(&mut ctx, root);
                    ctx.frames.pop();
                    bound?;
                }
            }
            ctx.stack.push(root);
        }

        for element in &document.children {
            let slot = ctx.results.len();
            if let Some(object) = ctx.consume_element(element)? {
                ctx.insert_result(slot, object);
            }
        }
        ctx.resolve_delayed()?;
        if root.is_some() {
            ctx.stack.pop();
        }

        let results = std::mem::take(&mut ctx.results);
        if let Some(root) = root {
            let mut guard = root.write();
            if let Some(collection) = guard.collection_mut() {
                for object in &results {
                    collection.push(Arc::clone(object));
                }
            }
        }
        tracing::info!(
            objects = results.len(),
            tokens = ctx.tokens.len(),
            "consumed document"
        );
        Ok(results)
    }

    /// Parse and consume an XML document
    pub fn consume_xml(&self, text: &str, root: Option<&ObjectRef>) -> Result<Vec<ObjectRef>> {
        let document = xml::parse(text)?;
        self.consume(&document, root)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::{parent_registry, registry, tree_registry, Bag, Edge, Round, Shape, Throwing};
    use crate::object::{share_value, TypeKey};
    use crate::transformer::{BindingTransformer, Inherits};
    use crate::value::Rect;
    use crate::writer::Writer;

    fn reader() -> Reader {
        Reader::new(Arc::new(registry()))
    }

    fn name_of(object: &ObjectRef) -> String {
        let name = object.read().get("Name").unwrap();
        name.as_str().unwrap_or_default().to_string()
    }

    fn edge_ends(object: &ObjectRef) -> (ObjectRef, ObjectRef) {
        let guard = object.read();
        let edge = guard.downcast_ref::<Edge>().unwrap();
        (edge.from.clone().unwrap(), edge.to.clone().unwrap())
    }

    #[test]
    fn test_empty_registry_is_an_error() {
        let reader = Reader::new(Arc::new(TransformerRegistry::new()));
        let document = Element::new("bag");
        assert!(matches!(reader.consume(&document, None), Err(CodecError::NoTransformers)));
    }

    #[test]
    fn test_forward_reference() {
        let results = reader()
            .consume_xml(
                r#"<bag>
                    <edge from="5" to="5"/>
                    <shape id="5" name="target"/>
                </bag>"#,
                None,
            )
            .unwrap();
        assert_eq!(results.len(), 2);
        let (from, to) = edge_ends(&results[0]);
        assert!(Arc::ptr_eq(&from, &results[1]));
        assert!(Arc::ptr_eq(&to, &results[1]));
        assert_eq!(name_of(&from), "target");
    }

    #[test]
    fn test_backward_reference_resolves_immediately() {
        let document = xml::parse(r#"<bag><shape id="0"/><edge from="0" to="0"/></bag>"#).unwrap();
        let registry = registry();
        let options = ReaderOptions::default();
        let mut ctx = ReadContext::new(&registry, &options);
        for element in &document.children {
            ctx.consume_element(element).unwrap();
        }
        assert!(ctx.delayed.is_empty());
        assert_eq!(ctx.tokens.len(), 1);
    }

    #[test]
    fn test_unresolved_reference_is_not_fatal() {
        let results = reader()
            .consume_xml(r#"<bag><edge from="9" to="null"/></bag>"#, None)
            .unwrap();
        let guard = results[0].read();
        let edge = guard.downcast_ref::<Edge>().unwrap();
        assert!(edge.from.is_none());
        assert!(edge.to.is_none());
    }

    #[test]
    fn test_two_nodes_and_an_edge_round_trip() {
        let a = share_value(Shape::new("a"));
        let b = share_value(Shape::new("b"));
        let edge = share_value(Edge::between(&a, &b));
        let root = share_value(Bag::with_items(vec![a, b, edge]));
        let registry = Arc::new(registry());

        let xml = Writer::new(registry.clone()).to_xml(&root).unwrap();
        assert!(xml.contains("from=\"0\""));
        assert!(xml.contains("to=\"1\""));

        let rebuilt = share_value(Bag::default());
        let results = Reader::new(registry).consume_xml(&xml, Some(&rebuilt)).unwrap();
        assert_eq!(results.len(), 3);
        let (from, to) = edge_ends(&results[2]);
        assert!(Arc::ptr_eq(&from, &results[0]));
        assert!(Arc::ptr_eq(&to, &results[1]));
        assert_eq!(name_of(&from), "a");
        assert_eq!(name_of(&to), "b");

        let guard = rebuilt.read();
        assert_eq!(guard.downcast_ref::<Bag>().unwrap().items.len(), 3);
    }

    #[test]
    fn test_round_trip_preserves_scalars_and_references() {
        let a = share_value(Shape::new("first"));
        let b = share_value(Shape::new("second"));
        a.write().set("Bounds", Value::Rect(Rect::new(1.5, -2.0, 30.0, 40.25))).unwrap();
        a.write().set("Child", Value::Object(b.clone())).unwrap();
        let root = share_value(Bag::with_items(vec![a, b]));
        root.write().set("Title", Value::string("demo")).unwrap();
        let registry = Arc::new(registry());

        let element = Writer::new(registry.clone()).to_element(&root).unwrap();
        let rebuilt = share_value(Bag::default());
        let results = Reader::new(registry.clone()).consume(&element, Some(&rebuilt)).unwrap();

        assert_eq!(rebuilt.read().get("Title").unwrap(), Value::string("demo"));
        let first = results[0].read();
        assert_eq!(first.get("Bounds").unwrap(), Value::Rect(Rect::new(1.5, -2.0, 30.0, 40.25)));
        let child = first.get("Child").unwrap();
        assert!(Arc::ptr_eq(child.as_object().unwrap(), &results[1]));
        drop(first);

        // writing the rebuilt graph again gives the same markup
        let again = Writer::new(registry).to_element(&rebuilt).unwrap();
        assert_eq!(again, element);
    }

    #[test]
    fn test_binding_order_sensitivity() {
        // setting the name resizes the shape; the later bounds binding wins
        let results = reader()
            .consume_xml(r#"<bag><shape name="a long name" bounds="0 0 5 5"/></bag>"#, None)
            .unwrap();
        assert_eq!(results[0].read().get("Bounds").unwrap(), Value::Rect(Rect::new(0.0, 0.0, 5.0, 5.0)));

        let mut registry = TransformerRegistry::new();
        registry.register_config(
            TransformerConfig::of::<Shape>("shape")
                .bind("bounds", "Bounds")
                .bind("name", "Name"),
        );
        let results = Reader::new(Arc::new(registry))
            .consume_xml(r#"<bag><shape name="a long name" bounds="0 0 5 5"/></bag>"#, None)
            .unwrap();
        assert_eq!(results[0].read().get("Bounds").unwrap(), Value::Rect(Rect::new(0.0, 0.0, 110.0, 5.0)));
    }

    #[test]
    fn test_nested_path_writes_back_through_value() {
        let mut registry = registry();
        registry.register_config(TransformerConfig::of::<Shape>("shape").bind("w", "Bounds.Width"));
        let results = Reader::new(Arc::new(registry))
            .consume_xml(r#"<bag><shape w="42"/></bag>"#, None)
            .unwrap();
        assert_eq!(results[0].read().get("Bounds").unwrap(), Value::Rect(Rect::new(0.0, 0.0, 42.0, 10.0)));
    }

    #[test]
    fn test_unparsable_value_uses_default() {
        let mut registry = registry();
        registry.register_config(
            TransformerConfig::of::<Shape>("shape")
                .with_binding(
                    Binding::new("bounds", "Bounds")
                        .unwrap()
                        .with_default(Rect::new(1.0, 1.0, 2.0, 2.0)),
                )
                .bind("w", "Bounds.Width"),
        );
        let results = Reader::new(Arc::new(registry))
            .consume_xml(r#"<bag><shape bounds="wide" w="tall"/><shape/></bag>"#, None)
            .unwrap();
        assert_eq!(results.len(), 2);
        assert_eq!(results[0].read().get("Bounds").unwrap(), Value::Rect(Rect::new(1.0, 1.0, 2.0, 2.0)));
        assert_eq!(results[1].read().get("Bounds").unwrap(), Value::Rect(Rect::new(0.0, 0.0, 10.0, 10.0)));
    }

    #[test]
    fn test_propagating_setter_aborts() {
        let mut registry = registry();
        registry.register(BindingTransformer::new(
            TransformerConfig::of::<Throwing>("throwing")
                .with_binding(Binding::new("boom", "Boom").unwrap().propagate_errors()),
        ));
        let err = Reader::new(Arc::new(registry))
            .consume_xml(r#"<bag><shape name="a"/><throwing boom="1"/></bag>"#, None)
            .unwrap_err();
        assert!(matches!(err, CodecError::Accessor { type_name: "Throwing", .. }));
    }

    #[test]
    fn test_swallowing_setter_continues() {
        let mut registry = registry();
        registry.register_config(TransformerConfig::of::<Throwing>("throwing").bind("boom", "Boom"));
        let results = Reader::new(Arc::new(registry))
            .consume_xml(r#"<bag><throwing boom="1"/><shape name="a"/></bag>"#, None)
            .unwrap();
        assert_eq!(results.len(), 2);
    }

    #[test]
    fn test_unknown_element_is_skipped() {
        let results = reader()
            .consume_xml(
                r#"<bag>
                    <shape name="a"/>
                    <mystery><shape name="hidden"/></mystery>
                    <shape name="b"/>
                </bag>"#,
                None,
            )
            .unwrap();
        let names: Vec<_> = results.iter().map(name_of).collect();
        assert_eq!(names, ["a", "b"]);
    }

    /// Log sink shared with a scoped subscriber
    #[derive(Clone, Default)]
    struct Captured(Arc<parking_lot::Mutex<Vec<u8>>>);

    impl std::io::Write for Captured {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0.lock().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    fn skip_logs(trace: bool) -> String {
        let logs = Captured::default();
        let writer = logs.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_max_level(tracing::Level::DEBUG)
            .with_ansi(false)
            .with_writer(move || writer.clone())
            .finish();
        tracing::subscriber::with_default(subscriber, || {
            Reader::with_options(Arc::new(registry()), ReaderOptions { trace })
                .consume_xml("<bag><mystery/></bag>", None)
                .unwrap();
        });
        let bytes = logs.0.lock().clone();
        String::from_utf8(bytes).unwrap()
    }

    #[test]
    fn test_skipped_element_logged_only_when_tracing() {
        assert!(!skip_logs(false).contains("no transformer"));
        assert!(skip_logs(true).contains("no transformer, element skipped"));
    }

    #[test]
    fn test_flat_children_go_into_container() {
        let results = reader()
            .consume_xml(
                r#"<bag><bag title="inner"><shape name="a"/><shape name="b"/></bag></bag>"#,
                None,
            )
            .unwrap();
        assert_eq!(results.len(), 1);
        let guard = results[0].read();
        let inner = guard.downcast_ref::<Bag>().unwrap();
        assert_eq!(inner.title, "inner");
        assert_eq!(inner.items.len(), 2);
    }

    #[test]
    fn test_defines_identity_names_existing_object() {
        let mut registry = registry();
        registry.register_config(
            TransformerConfig::of::<Shape>("shape")
                .with_identity("id")
                .with_binding(Binding::new("anchor", "Anchor").unwrap().defines_identity()),
        );
        registry.register_config(TransformerConfig::of::<Edge>("edge").bind("from", "From"));
        let results = Reader::new(Arc::new(registry))
            .consume_xml(r#"<bag><edge from="7"/><shape id="0" anchor="7"/></bag>"#, None)
            .unwrap();
        let anchor = results[1].read().get("Anchor").unwrap();
        let guard = results[0].read();
        let edge = guard.downcast_ref::<Edge>().unwrap();
        assert!(Arc::ptr_eq(edge.from.as_ref().unwrap(), anchor.as_object().unwrap()));
    }

    #[test]
    fn test_nested_tree_synthesizes_link() {
        let results = Reader::new(Arc::new(tree_registry()))
            .consume_xml(r#"<bag><node id="0" name="root"><node id="1" name="leaf"/></node></bag>"#, None)
            .unwrap();
        assert_eq!(results.len(), 3);
        assert_eq!(name_of(&results[0]), "root");
        assert_eq!(name_of(&results[1]), "leaf");

        let (from, to) = edge_ends(&results[2]);
        let root_anchor = results[0].read().get("Anchor").unwrap();
        let leaf_anchor = results[1].read().get("Anchor").unwrap();
        assert!(Arc::ptr_eq(&from, root_anchor.as_object().unwrap()));
        assert!(Arc::ptr_eq(&to, leaf_anchor.as_object().unwrap()));
    }

    #[test]
    fn test_deep_tree_keeps_parents_first() {
        let results = Reader::new(Arc::new(tree_registry()))
            .consume_xml(
                r#"<bag><node name="a"><node name="b"><node name="c"/></node><node name="d"/></node></bag>"#,
                None,
            )
            .unwrap();
        let nodes: Vec<_> = results
            .iter()
            .filter(|r| r.read().is_node())
            .map(name_of)
            .collect();
        assert_eq!(nodes, ["a", "b", "c", "d"]);
        assert_eq!(results.len(), 7);
    }

    #[test]
    fn test_parent_reference_synthesizes_link() {
        let results = Reader::new(Arc::new(parent_registry()))
            .consume_xml(
                r#"<bag>
                    <item id="1" name="child" parent="0"/>
                    <item id="0" name="parent"/>
                    <item id="2" name="other" parent="0"/>
                </bag>"#,
                None,
            )
            .unwrap();
        // three items, one link resolved immediately and one delayed
        assert_eq!(results.len(), 5);
        let links: Vec<_> = results.iter().filter(|r| !r.read().is_node()).collect();
        assert_eq!(links.len(), 2);
        for link in links {
            let (from, _) = edge_ends(link);
            let owner = crate::shared::owning_node(&from);
            assert_eq!(name_of(&owner), "parent");
        }
    }

    #[test]
    fn test_tree_round_trip() {
        let registry = Arc::new(tree_registry());
        let original = Reader::new(registry.clone())
            .consume_xml(r#"<bag><node id="0" name="a"><node id="1" name="b"/></node></bag>"#, None)
            .unwrap();
        // the first result is the only tree root
        let root = share_value(Bag::with_items(original));
        let element = Writer::new(registry).to_element(&root).unwrap();

        assert_eq!(element.children.len(), 1);
        let a = &element.children[0];
        assert_eq!(a.attribute("name"), Some("a"));
        assert_eq!(a.children.len(), 1);
        assert_eq!(a.children[0].attribute("name"), Some("b"));
    }

    #[test]
    fn test_parent_binding_round_trip() {
        let parent = share_value(Shape::new("p"));
        let child = share_value(Shape::new("c"));
        let anchor = |shape: &ObjectRef| shape.read().downcast_ref::<Shape>().unwrap().anchor.clone().unwrap();
        let edge = share_value(Edge::between(&anchor(&parent), &anchor(&child)));
        let root = share_value(Bag::with_items(vec![parent, child, edge]));

        let registry = Arc::new(parent_registry());
        let element = Writer::new(registry.clone()).to_element(&root).unwrap();
        // the edge has no transformer; the child names its parent instead
        assert_eq!(element.children.len(), 2);
        let (p, c) = (&element.children[0], &element.children[1]);
        assert_eq!(p.attribute("name"), Some("p"));
        assert_eq!(p.attribute("parent"), None);
        assert_eq!(c.attribute("name"), Some("c"));
        assert_eq!(c.attribute("parent"), p.attribute("id"));

        let results = Reader::new(registry).consume(&element, None).unwrap();
        assert_eq!(results.len(), 3);
        let (from, to) = edge_ends(&results[2]);
        assert_eq!(name_of(&crate::shared::owning_node(&from)), "p");
        assert_eq!(name_of(&crate::shared::owning_node(&to)), "c");
    }

    #[test]
    fn test_derived_type_uses_ancestor_transformer() {
        let mut registry = registry();
        registry.derive(TypeKey("Round"), TypeKey("Shape"));
        let registry = Arc::new(registry);
        let root = share_value(Bag::with_items(vec![share_value(Round {
            name: "disc".to_string(),
            radius: 2.0,
        })]));

        let element = Writer::new(registry.clone()).to_element(&root).unwrap();
        let shape = &element.children[0];
        assert_eq!(shape.name, "shape");
        assert_eq!(shape.attribute("name"), Some("disc"));
        // Round has no bounds, so the inherited binding is left out
        assert_eq!(shape.attribute("bounds"), None);

        let results = Reader::new(registry).consume(&element, None).unwrap();
        assert_eq!(results.len(), 1);
        assert!(results[0].read().downcast_ref::<Shape>().is_some());
        assert_eq!(name_of(&results[0]), "disc");
    }

    #[test]
    fn test_inherited_transformer_round_trip() {
        let mut registry = registry();
        let base = registry.resolve(TypeKey("Shape")).unwrap().clone();
        registry.register(Inherits::new(base, TypeKey("Round"), "round").configure(|config| {
            config
                .with_factory(|| Box::new(Round::default()))
                .bind("radius", "Radius")
        }));
        let registry = Arc::new(registry);
        let root = share_value(Bag::with_items(vec![share_value(Round {
            name: "disc".to_string(),
            radius: 2.5,
        })]));

        let element = Writer::new(registry.clone()).to_element(&root).unwrap();
        let round = &element.children[0];
        assert_eq!(round.name, "round");
        assert_eq!(round.attribute("name"), Some("disc"));
        assert_eq!(round.attribute("radius"), Some("2.5"));

        let results = Reader::new(registry).consume(&element, None).unwrap();
        assert_eq!(results.len(), 1);
        let guard = results[0].read();
        let round = guard.downcast_ref::<Round>().unwrap();
        assert_eq!(round.name, "disc");
        assert_eq!(round.radius, 2.5);
    }
}
