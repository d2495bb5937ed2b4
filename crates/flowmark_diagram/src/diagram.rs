// SPDX-License-Identifier: MIT OR Apache-2.0
//! The diagram document and its non-node items.

use crate::access;
use crate::link::FlowLink;
use crate::node::FlowNode;
use flowmark_codec::shared::{owning_node, LinkIndex};
use flowmark_codec::{
    share_value, AccessError, CodecError, Collection, Color, ObjectKey, ObjectRef, PropertyInfo, Rect,
    Reflect, TypeKey, Value, ValueKind,
};
use indexmap::IndexMap;
use std::collections::HashSet;
use std::sync::Arc;

/// Newest document format this crate reads and writes
pub const FORMAT_VERSION: i64 = 2;

/// A flowchart document
#[derive(Debug)]
pub struct FlowDiagram {
    /// Diagram name
    pub name: String,
    /// Document format version
    pub version: i64,
    /// Snap grid spacing
    pub grid_size: f32,
    /// Canvas colour; `None` uses the viewer's default
    pub background: Option<Color>,
    /// Top-level items in insertion order
    items: IndexMap<ObjectKey, ObjectRef>,
}

impl FlowDiagram {
    /// Create a new empty diagram
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            version: FORMAT_VERSION,
            grid_size: 10.0,
            background: None,
            items: IndexMap::new(),
        }
    }

    /// Run `f` on the diagram behind a shared handle
    pub fn edit<R>(root: &ObjectRef, f: impl FnOnce(&mut FlowDiagram) -> R) -> Option<R> {
        let mut guard = root.write();
        guard.downcast_mut::<FlowDiagram>().map(f)
    }

    /// Run `f` on the diagram behind a shared handle, read-only
    pub fn inspect<R>(root: &ObjectRef, f: impl FnOnce(&FlowDiagram) -> R) -> Option<R> {
        let guard = root.read();
        guard.downcast_ref::<FlowDiagram>().map(f)
    }

    /// Add a node to the diagram
    pub fn add_node(&mut self, node: FlowNode) -> ObjectRef {
        let node = share_value(node);
        self.add_item(node.clone());
        node
    }

    /// Add any shared item
    pub fn add_item(&mut self, item: ObjectRef) {
        self.items.insert(ObjectKey::of(&item), item);
    }

    /// Connect the output port of `from` to the input port of `to`
    pub fn connect(&mut self, from: &ObjectRef, to: &ObjectRef) -> Result<ObjectRef, DiagramError> {
        self.connect_with(from, to, FlowLink::default())
    }

    /// Connect two nodes with a pre-styled link; its ends are replaced
    pub fn connect_with(
        &mut self,
        from: &ObjectRef,
        to: &ObjectRef,
        mut link: FlowLink,
    ) -> Result<ObjectRef, DiagramError> {
        if Arc::ptr_eq(from, to) {
            return Err(DiagramError::SelfLoop);
        }
        link.from = Some(port_of(from, FlowNode::out_port)?);
        link.to = Some(port_of(to, FlowNode::in_port)?);
        let link = share_value(link);
        self.add_item(link.clone());
        Ok(link)
    }

    /// Remove an item; removing a node also removes its links
    pub fn remove_item(&mut self, item: &ObjectRef) -> Option<ObjectRef> {
        let removed = self.items.shift_remove(&ObjectKey::of(item))?;
        if removed.read().is_node() {
            self.items.retain(|_, other| !touches(other, &removed));
        }
        Some(removed)
    }

    /// Top-level nodes
    pub fn nodes(&self) -> Vec<ObjectRef> {
        self.items
            .values()
            .filter(|item| item.read().is_node())
            .cloned()
            .collect()
    }

    /// Top-level links
    pub fn links(&self) -> Vec<ObjectRef> {
        self.items
            .values()
            .filter(|item| item.read().as_link().is_some())
            .cloned()
            .collect()
    }

    /// Number of top-level items
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Whether the diagram is empty
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Count items by category, descending into groups
    pub fn stats(&self) -> DiagramStats {
        let mut stats = DiagramStats::default();
        let mut pending: Vec<ObjectRef> = self.items.values().cloned().collect();
        while let Some(item) = pending.pop() {
            let guard = item.read();
            if guard.is_node() {
                stats.nodes += 1;
            } else if guard.as_link().is_some() {
                stats.links += 1;
            } else if let Some(group) = guard.downcast_ref::<FlowGroup>() {
                stats.groups += 1;
                pending.extend(group.items.iter().cloned());
            } else if guard.downcast_ref::<FlowComment>().is_some() {
                stats.comments += 1;
            }
        }
        stats
    }

    /// Whether the top-level links arrange the nodes as a forest: no node
    /// has two parents and every node is reachable from a root
    pub fn is_forest(&self) -> bool {
        let items: Vec<ObjectRef> = self.items.values().cloned().collect();
        let links = LinkIndex::build(&items);
        let nodes = self.nodes();
        if nodes.iter().any(|node| links.predecessors(node).len() > 1) {
            return false;
        }

        let mut seen = HashSet::new();
        let mut pending: Vec<ObjectRef> = nodes
            .iter()
            .filter(|node| links.predecessors(node).is_empty())
            .cloned()
            .collect();
        while let Some(node) = pending.pop() {
            if seen.insert(ObjectKey::of(&node)) {
                pending.extend(links.successors(&node).iter().cloned());
            }
        }
        seen.len() == nodes.len()
    }

    /// Top-level items the tree layout cannot store
    pub fn tree_losses(&self) -> TreeLosses {
        let mut losses = TreeLosses::default();
        for item in self.items.values() {
            let guard = item.read();
            if guard.downcast_ref::<FlowGroup>().is_some() {
                losses.groups += 1;
            } else if guard.downcast_ref::<FlowLink>().is_some_and(FlowLink::is_styled) {
                losses.styled_links += 1;
            }
        }
        losses
    }
}

impl Default for FlowDiagram {
    fn default() -> Self {
        Self::new("Untitled")
    }
}

fn port_of(
    node: &ObjectRef,
    port: impl Fn(&FlowNode) -> Option<&ObjectRef>,
) -> Result<ObjectRef, DiagramError> {
    let guard = node.read();
    let node = guard.downcast_ref::<FlowNode>().ok_or(DiagramError::NotANode)?;
    port(node).cloned().ok_or(DiagramError::NotANode)
}

fn touches(item: &ObjectRef, node: &ObjectRef) -> bool {
    let ends = {
        let guard = item.read();
        guard.as_link().map(|link| [link.from_end(), link.to_end()])
    };
    ends.into_iter()
        .flatten()
        .flatten()
        .any(|end| Arc::ptr_eq(&owning_node(&end), node))
}

const DIAGRAM_PROPERTIES: &[PropertyInfo] = &[
    PropertyInfo::new("Name", ValueKind::String),
    PropertyInfo::new("Version", ValueKind::Int),
    PropertyInfo::new("GridSize", ValueKind::Float),
    PropertyInfo::new("Background", ValueKind::Color),
    PropertyInfo::read_only("Count", ValueKind::Int),
];

impl Collection for FlowDiagram {
    fn items(&self) -> Vec<ObjectRef> {
        self.items.values().cloned().collect()
    }

    fn push(&mut self, item: ObjectRef) {
        self.add_item(item);
    }
}

impl Reflect for FlowDiagram {
    fn type_key(&self) -> TypeKey {
        TypeKey("FlowDiagram")
    }

    fn properties(&self) -> &[PropertyInfo] {
        DIAGRAM_PROPERTIES
    }

    fn get(&self, name: &str) -> Result<Value, AccessError> {
        match name {
            "Name" => Ok(Value::string(&self.name)),
            "Version" => Ok(Value::Int(self.version)),
            "GridSize" => Ok(Value::Float(f64::from(self.grid_size))),
            "Background" => Ok(Value::Color(self.background)),
            "Count" => Ok(Value::Int(self.items.len() as i64)),
            _ => Err(AccessError::missing(name)),
        }
    }

    fn set(&mut self, name: &str, value: Value) -> Result<(), AccessError> {
        match name {
            "Name" => self.name = access::string(name, value)?,
            "Version" => {
                let version = access::int(name, &value)?;
                if !(1..=FORMAT_VERSION).contains(&version) {
                    return Err(AccessError::failed(
                        name,
                        format!("unsupported format version {version} (newest is {FORMAT_VERSION})"),
                    ));
                }
                self.version = version;
            }
            "GridSize" => self.grid_size = access::float(name, &value)?,
            "Background" => self.background = access::color(name, &value)?,
            _ => return Err(AccessError::missing(name)),
        }
        Ok(())
    }

    fn copy_object(&self) -> Box<dyn Reflect> {
        Box::new(Self {
            name: self.name.clone(),
            version: self.version,
            grid_size: self.grid_size,
            background: self.background,
            items: IndexMap::new(),
        })
    }

    fn collection(&self) -> Option<&dyn Collection> {
        Some(self)
    }

    fn collection_mut(&mut self) -> Option<&mut dyn Collection> {
        Some(self)
    }

    reflect_any!();
}

/// A named frame holding other items
#[derive(Debug, Default)]
pub struct FlowGroup {
    /// Group title
    pub name: String,
    /// Frame bounds
    pub bounds: Rect,
    /// Whether members are hidden
    pub collapsed: bool,
    items: Vec<ObjectRef>,
}

impl FlowGroup {
    /// Create a new empty group
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// Members of the group
    pub fn members(&self) -> &[ObjectRef] {
        &self.items
    }
}

const GROUP_PROPERTIES: &[PropertyInfo] = &[
    PropertyInfo::new("Name", ValueKind::String),
    PropertyInfo::new("Bounds", ValueKind::Rect),
    PropertyInfo::new("Collapsed", ValueKind::Bool),
];

impl Collection for FlowGroup {
    fn items(&self) -> Vec<ObjectRef> {
        self.items.clone()
    }

    fn push(&mut self, item: ObjectRef) {
        self.items.push(item);
    }
}

impl Reflect for FlowGroup {
    fn type_key(&self) -> TypeKey {
        TypeKey("FlowGroup")
    }

    fn properties(&self) -> &[PropertyInfo] {
        GROUP_PROPERTIES
    }

    fn get(&self, name: &str) -> Result<Value, AccessError> {
        match name {
            "Name" => Ok(Value::string(&self.name)),
            "Bounds" => Ok(Value::Rect(self.bounds)),
            "Collapsed" => Ok(Value::Bool(self.collapsed)),
            _ => Err(AccessError::missing(name)),
        }
    }

    fn set(&mut self, name: &str, value: Value) -> Result<(), AccessError> {
        match name {
            "Name" => self.name = access::string(name, value)?,
            "Bounds" => self.bounds = access::rect(name, &value)?,
            "Collapsed" => self.collapsed = access::boolean(name, &value)?,
            _ => return Err(AccessError::missing(name)),
        }
        Ok(())
    }

    fn copy_object(&self) -> Box<dyn Reflect> {
        Box::new(Self {
            name: self.name.clone(),
            bounds: self.bounds,
            collapsed: self.collapsed,
            items: Vec::new(),
        })
    }

    fn collection(&self) -> Option<&dyn Collection> {
        Some(self)
    }

    fn collection_mut(&mut self) -> Option<&mut dyn Collection> {
        Some(self)
    }

    reflect_any!();
}

/// Free-standing note
#[derive(Debug, Clone, PartialEq)]
pub struct FlowComment {
    /// Note text
    pub text: String,
    /// Note bounds
    pub bounds: Rect,
    /// Note colour
    pub color: Color,
}

impl Default for FlowComment {
    fn default() -> Self {
        Self {
            text: String::new(),
            bounds: Rect::new(0.0, 0.0, 120.0, 60.0),
            color: Color::rgb(0xFF, 0xF9, 0xC4),
        }
    }
}

impl FlowComment {
    /// Create a new comment
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            ..Self::default()
        }
    }
}

const COMMENT_PROPERTIES: &[PropertyInfo] = &[
    PropertyInfo::new("Text", ValueKind::String),
    PropertyInfo::new("Bounds", ValueKind::Rect),
    PropertyInfo::new("Color", ValueKind::Color),
];

impl Reflect for FlowComment {
    fn type_key(&self) -> TypeKey {
        TypeKey("FlowComment")
    }

    fn properties(&self) -> &[PropertyInfo] {
        COMMENT_PROPERTIES
    }

    fn get(&self, name: &str) -> Result<Value, AccessError> {
        match name {
            "Text" => Ok(Value::string(&self.text)),
            "Bounds" => Ok(Value::Rect(self.bounds)),
            "Color" => Ok(Value::from(self.color)),
            _ => Err(AccessError::missing(name)),
        }
    }

    fn set(&mut self, name: &str, value: Value) -> Result<(), AccessError> {
        match name {
            "Text" => self.text = access::string(name, value)?,
            "Bounds" => self.bounds = access::rect(name, &value)?,
            "Color" => {
                self.color = access::color(name, &value)?.unwrap_or(Self::default().color);
            }
            _ => return Err(AccessError::missing(name)),
        }
        Ok(())
    }

    fn copy_object(&self) -> Box<dyn Reflect> {
        Box::new(self.clone())
    }

    reflect_any!();
}

/// Item counts of a diagram
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DiagramStats {
    /// Nodes, including those inside groups
    pub nodes: usize,
    /// Links
    pub links: usize,
    /// Groups
    pub groups: usize,
    /// Comments
    pub comments: usize,
}

/// What saving in the tree layout leaves out
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TreeLosses {
    /// Groups, dropped together with their members
    pub groups: usize,
    /// Links whose text, route or stroke is replaced by the plain tree link
    pub styled_links: usize,
}

impl TreeLosses {
    /// Whether nothing would be lost
    pub fn is_empty(&self) -> bool {
        self.groups == 0 && self.styled_links == 0
    }
}

/// Errors from diagram editing and storage
#[derive(Debug, thiserror::Error)]
pub enum DiagramError {
    /// Codec failure while reading or writing
    #[error(transparent)]
    Codec(#[from] CodecError),

    /// File could not be read or written
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The object is not a flowchart node
    #[error("Object is not a flowchart node")]
    NotANode,

    /// Self-loop not allowed
    #[error("Self-loop not allowed")]
    SelfLoop,

    /// The diagram cannot be written as a tree
    #[error("Diagram is not a forest; a node has several parents or lies on a cycle")]
    NotAForest,

    /// The loaded document did not produce a diagram
    #[error("Document root is not a flowchart diagram")]
    NotADiagram,
}
