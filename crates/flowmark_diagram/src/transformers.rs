// SPDX-License-Identifier: MIT OR Apache-2.0
//! Transformers mapping the diagram model to markup.
//!
//! Two registries are provided. [`flow_registry`] lists every item of the
//! diagram as a top-level element and refers to ports by token.
//! [`tree_registry`] nests each node inside its parent and recreates the
//! links on load; groups and explicit links are not part of that layout.

use crate::diagram::{FlowComment, FlowDiagram, FlowGroup};
use crate::link::FlowLink;
use crate::node::{FlowLabel, FlowNode};
use flowmark_codec::reader::{self, ReadContext};
use flowmark_codec::writer::{self, WriteContext};
use flowmark_codec::{
    share_value, Binding, CodecSettings, ObjectRef, Result, Transformer, TransformerConfig,
    TransformerRegistry, TreeOptions,
};

/// Element name of the flat document root
pub const FLOW_ROOT: &str = "flowchart";
/// Element name of the tree document root
pub const TREE_ROOT: &str = "flowtree";

/// The caption object of `node`, if it has one
fn label_of(node: &ObjectRef) -> Option<ObjectRef> {
    let label = node.read().get("Label").ok()?;
    label.as_object().cloned()
}

/// Transformer for [`FlowNode`].
///
/// Writes the node's caption as a nested `label` element and, when
/// configured for trees, only writes tree roots at the top level.
pub struct NodeTransformer {
    config: TransformerConfig,
    roots_only: bool,
}

impl NodeTransformer {
    /// Create a node transformer
    pub fn new(config: TransformerConfig) -> Self {
        Self {
            config,
            roots_only: false,
        }
    }

    /// Leave nodes that have a tree parent to be written by that parent
    pub fn roots_only(mut self) -> Self {
        self.roots_only = true;
        self
    }
}

impl Transformer for NodeTransformer {
    fn config(&self) -> &TransformerConfig {
        &self.config
    }

    fn skip(&self, ctx: &WriteContext<'_>, object: &ObjectRef) -> bool {
        // depth 1 is the document root's body
        self.roots_only
            && ctx.stack.len() == 1
            && ctx.tree_parent_of(&self.config, object).is_some()
    }

    fn generate_body(&self, ctx: &mut WriteContext<'_>, object: &ObjectRef) -> Result<()> {
        if let Some(label) = label_of(object) {
            let is_default = label
                .read()
                .downcast_ref::<FlowLabel>()
                .is_some_and(|label| *label == FlowLabel::default());
            if !is_default {
                ctx.emit(&label)?;
            }
        }
        writer::standard::body(self, ctx, object)
    }

    fn consume_body(&self, ctx: &mut ReadContext<'_>, object: &ObjectRef) -> Result<()> {
        if self.config.holds_children() {
            return reader::standard::body(self, ctx, object);
        }
        // no child policy, but the caption still comes as a nested element
        let Some(element) = ctx.element() else {
            return Ok(());
        };
        for child_element in &element.children {
            ctx.stack.push(object);
            let child = ctx.consume_element(child_element);
            ctx.stack.pop();
            if let Some(child) = child? {
                self.consume_child(ctx, object, &child)?;
            }
        }
        Ok(())
    }

    fn consume_child(&self, ctx: &mut ReadContext<'_>, object: &ObjectRef, child: &ObjectRef) -> Result<()> {
        if child.read().downcast_ref::<FlowLabel>().is_some() {
            return Ok(());
        }
        reader::standard::child(self, ctx, object, child)
    }
}

/// Transformer for [`FlowLabel`].
///
/// A caption is part of its node, so reading one updates the caption the
/// enclosing node already owns instead of allocating a new object.
pub struct LabelTransformer {
    config: TransformerConfig,
}

impl LabelTransformer {
    /// Create a label transformer
    pub fn new(config: TransformerConfig) -> Self {
        Self { config }
    }
}

impl Transformer for LabelTransformer {
    fn config(&self) -> &TransformerConfig {
        &self.config
    }

    fn allocate(&self, ctx: &mut ReadContext<'_>) -> Result<Option<ObjectRef>> {
        let label = ctx.stack.parent().and_then(label_of);
        if label.is_none() {
            tracing::debug!(element = %self.config.element_name, "label outside a node, skipped");
        }
        Ok(label)
    }
}

fn diagram_config(root: &str) -> TransformerConfig {
    TransformerConfig::of::<FlowDiagram>(root)
        .bind("name", "Name")
        .bind_with("version", "Version", Binding::propagate_errors)
        .bind("grid", "GridSize")
        .bind("background", "Background")
        .with_flat_children("")
}

fn node_config(element: &str, settings: &CodecSettings) -> TransformerConfig {
    let config = TransformerConfig::of::<FlowNode>(element)
        .with_identity(settings.identity_attribute.as_str())
        .bind("key", "Key")
        .bind("kind", "Kind")
        .bind("text", "Text")
        .bind("bounds", "Bounds")
        .bind("fill", "FillColor");
    if settings.trace {
        config.traced()
    } else {
        config
    }
}

fn label_transformer() -> LabelTransformer {
    LabelTransformer::new(
        TransformerConfig::of::<FlowLabel>("label")
            .bind("text", "Text")
            .bind("color", "TextColor")
            .bind("size", "FontSize")
            .bind("bold", "Bold"),
    )
}

fn comment_config() -> TransformerConfig {
    TransformerConfig::of::<FlowComment>("comment")
        .bind("bounds", "Bounds")
        .bind("color", "Color")
        .with_text("Text")
}

/// Registry for the flat layout.
///
/// Every node, link, group and comment is a top-level element of a
/// `flowchart` document. Links name the ports they connect by token.
pub fn flow_registry(settings: &CodecSettings) -> TransformerRegistry {
    let mut registry = TransformerRegistry::new();
    registry.register_config(diagram_config(FLOW_ROOT));
    registry.register(NodeTransformer::new(
        node_config("node", settings)
            .bind_with("in", "InPort", Binding::defines_identity)
            .bind_with("out", "OutPort", Binding::defines_identity),
    ));
    registry.register(label_transformer());
    registry.register_config(
        TransformerConfig::of::<FlowLink>("link")
            .bind("from", "FromPort")
            .bind("to", "ToPort")
            .bind("text", "Text")
            .bind("points", "Points")
            .bind("orthogonal", "Orthogonal")
            .bind("color", "Color")
            .bind("width", "Width"),
    );
    registry.register_config(
        TransformerConfig::of::<FlowGroup>("group")
            .with_identity(settings.identity_attribute.as_str())
            .bind("name", "Name")
            .bind("bounds", "Bounds")
            .bind("collapsed", "Collapsed")
            .with_flat_children(""),
    );
    registry.register_config(comment_config());
    registry
}

/// Registry for the tree layout.
///
/// Each `step` element nests its logical children; the links between them
/// are synthesized on load from an orthogonal [`FlowLink`] prototype.
pub fn tree_registry(settings: &CodecSettings) -> TransformerRegistry {
    let prototype = FlowLink {
        orthogonal: true,
        ..FlowLink::default()
    };
    let options = TreeOptions::new(share_value(prototype), "OutPort", "InPort");

    let mut registry = TransformerRegistry::new();
    registry.register_config(diagram_config(TREE_ROOT));
    registry.register(NodeTransformer::new(node_config("step", settings).with_tree(options)).roots_only());
    registry.register(label_transformer());
    registry.register_config(comment_config());
    registry
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diagram::FlowDiagram;
    use crate::node::NodeKind;
    use flowmark_codec::{Reader, Value, Writer};
    use std::sync::Arc;

    fn settings() -> CodecSettings {
        CodecSettings::default()
    }

    #[test]
    fn test_registries_cover_model() {
        let flat = flow_registry(&settings());
        for element in ["flowchart", "node", "label", "link", "group", "comment"] {
            assert!(flat.for_element(element).is_some(), "{element}");
        }
        let tree = tree_registry(&settings());
        assert!(tree.for_element("step").is_some());
        assert!(tree.for_element("link").is_none());
        assert!(tree.for_element("group").is_none());
    }

    #[test]
    fn test_label_written_only_when_customized() {
        let registry = Arc::new(flow_registry(&settings()));
        let root = share_value(FlowDiagram::new("labels"));
        let (_plain, custom) = FlowDiagram::edit(&root, |d| {
            (
                d.add_node(FlowNode::new(NodeKind::Process, "plain")),
                d.add_node(FlowNode::new(NodeKind::Process, "custom")),
            )
        })
        .unwrap();
        let label = label_of(&custom).unwrap();
        label.write().set("Text", Value::string("note")).unwrap();

        let doc = Writer::new(registry).to_element(&root).unwrap();
        assert!(doc.children[0].children.is_empty());
        let caption = doc.children[1].child("label").unwrap();
        assert_eq!(caption.attribute("text"), Some("note"));
    }

    #[test]
    fn test_label_updates_existing_caption() {
        let reader = Reader::new(Arc::new(flow_registry(&settings())));
        let root = share_value(FlowDiagram::default());
        let xml = r#"<flowchart version="2">
            <node id="0" text="a"><label text="first" bold="true"/></node>
        </flowchart>"#;
        let results = reader.consume_xml(xml, Some(&root)).unwrap();
        assert_eq!(results.len(), 1);

        let guard = results[0].read();
        let node = guard.downcast_ref::<FlowNode>().unwrap();
        let label = node.label().read();
        let label = label.downcast_ref::<FlowLabel>().unwrap();
        assert_eq!(label.text, "first");
        assert!(label.bold);
    }

    #[test]
    fn test_stray_label_is_skipped() {
        let reader = Reader::new(Arc::new(flow_registry(&settings())));
        let root = share_value(FlowDiagram::default());
        let xml = r#"<flowchart><label text="lost"/><comment>kept</comment></flowchart>"#;
        let results = reader.consume_xml(xml, Some(&root)).unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].read().get("Text").unwrap(), Value::string("kept"));
    }

    #[test]
    fn test_roots_only_skips_children_at_top_level() {
        let registry = Arc::new(tree_registry(&settings()));
        let root = share_value(FlowDiagram::new("tree"));
        FlowDiagram::edit(&root, |d| {
            let a = d.add_node(FlowNode::new(NodeKind::Start, "a"));
            let b = d.add_node(FlowNode::new(NodeKind::End, "b"));
            d.connect(&a, &b).map(|_| ())
        })
        .unwrap()
        .unwrap();

        let doc = Writer::new(registry).to_element(&root).unwrap();
        assert_eq!(doc.name, "flowtree");
        assert_eq!(doc.children.len(), 1);
        let step = &doc.children[0];
        assert_eq!(step.attribute("text"), Some("a"));
        assert_eq!(step.children.len(), 1);
        assert_eq!(step.children[0].attribute("text"), Some("b"));
    }
}
