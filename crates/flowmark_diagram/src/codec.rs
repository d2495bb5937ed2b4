// SPDX-License-Identifier: MIT OR Apache-2.0
//! Loading and saving diagrams.

use crate::diagram::{DiagramError, FlowDiagram};
use crate::transformers::{flow_registry, tree_registry, FLOW_ROOT, TREE_ROOT};
use flowmark_codec::{share_value, xml, CodecSettings, Element, ObjectRef, Reader, Writer};
use std::path::Path;
use std::sync::Arc;

/// Document layout
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Layout {
    /// Every item listed at the top level
    #[default]
    Flat,
    /// Nodes nested under their parent node
    Tree,
}

impl Layout {
    /// Name of the document element for this layout
    pub fn root_element(self) -> &'static str {
        match self {
            Self::Flat => FLOW_ROOT,
            Self::Tree => TREE_ROOT,
        }
    }

    /// Layout whose document element is `name`
    pub fn from_root(name: &str) -> Option<Self> {
        [Self::Flat, Self::Tree]
            .into_iter()
            .find(|layout| layout.root_element() == name)
    }
}

/// Reads and writes diagrams in one layout
#[derive(Clone)]
pub struct DiagramCodec {
    layout: Layout,
    writer: Writer,
    reader: Reader,
}

impl DiagramCodec {
    /// Create a codec for `layout`
    pub fn new(layout: Layout, settings: &CodecSettings) -> Self {
        let registry = Arc::new(match layout {
            Layout::Flat => flow_registry(settings),
            Layout::Tree => tree_registry(settings),
        });
        Self {
            layout,
            writer: Writer::with_options(Arc::clone(&registry), settings.writer_options()),
            reader: Reader::with_options(registry, settings.reader_options()),
        }
    }

    /// Layout handled by this codec
    pub fn layout(&self) -> Layout {
        self.layout
    }

    /// Build a diagram from a parsed document
    pub fn load_document(&self, document: &Element) -> Result<ObjectRef, DiagramError> {
        if document.name != self.layout.root_element() {
            tracing::warn!(
                expected = self.layout.root_element(),
                found = %document.name,
                "unexpected document element, attributes ignored"
            );
        }
        let diagram = share_value(FlowDiagram::default());
        let results = self.reader.consume(document, Some(&diagram))?;
        tracing::debug!(items = results.len(), layout = ?self.layout, "diagram loaded");
        Ok(diagram)
    }

    /// Build a diagram from document text
    pub fn load_str(&self, text: &str) -> Result<ObjectRef, DiagramError> {
        let document = xml::parse(text)?;
        self.load_document(&document)
    }

    /// Load a diagram file
    pub fn load_file(&self, path: &Path) -> Result<ObjectRef, DiagramError> {
        let text = std::fs::read_to_string(path)?;
        let diagram = self.load_str(&text)?;
        tracing::info!(path = %path.display(), "loaded diagram");
        Ok(diagram)
    }

    /// Render a diagram as document text
    pub fn save_string(&self, diagram: &ObjectRef) -> Result<String, DiagramError> {
        let (forest, losses) = FlowDiagram::inspect(diagram, |d| (d.is_forest(), d.tree_losses()))
            .ok_or(DiagramError::NotADiagram)?;
        if self.layout == Layout::Tree {
            if !forest {
                return Err(DiagramError::NotAForest);
            }
            if !losses.is_empty() {
                tracing::warn!(
                    groups = losses.groups,
                    styled_links = losses.styled_links,
                    "tree layout drops groups and link text, route and stroke"
                );
            }
        }
        Ok(self.writer.to_xml(diagram)?)
    }

    /// Save a diagram file
    pub fn save_file(&self, diagram: &ObjectRef, path: &Path) -> Result<(), DiagramError> {
        let text = self.save_string(diagram)?;
        std::fs::write(path, text)?;
        tracing::info!(path = %path.display(), "saved diagram");
        Ok(())
    }
}

/// Load a diagram in whichever layout its document element names
pub fn load_any(text: &str, settings: &CodecSettings) -> Result<(ObjectRef, Layout), DiagramError> {
    let document = xml::parse(text)?;
    let layout = Layout::from_root(&document.name).unwrap_or_default();
    let diagram = DiagramCodec::new(layout, settings).load_document(&document)?;
    Ok((diagram, layout))
}
