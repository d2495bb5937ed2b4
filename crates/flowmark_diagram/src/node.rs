// SPDX-License-Identifier: MIT OR Apache-2.0
//! Flowchart nodes and their captions.

use crate::access;
use crate::port::{FlowPort, PortDirection};
use flowmark_codec::{
    share_value, AccessError, Color, ObjectRef, Point, PropertyInfo, Rect, Reflect, Size, TypeKey,
    Value, ValueKind, WeakObject,
};
use std::fmt;
use uuid::Uuid;

/// Width of one character of node text
const CHAR_WIDTH: f32 = 8.0;
/// Horizontal padding around node text
const TEXT_PADDING: f32 = 24.0;
/// Nodes never shrink below this width
const MIN_WIDTH: f32 = 60.0;

/// Unique identifier for a node
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeKey(pub Uuid);

impl NodeKey {
    /// Create a new random node key
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Parse a key from its hyphenated form
    pub fn parse(text: &str) -> Option<Self> {
        Uuid::parse_str(text).ok().map(Self)
    }
}

impl Default for NodeKey {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for NodeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Flowchart node shape
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum NodeKind {
    /// Entry point
    Start,
    /// A processing step
    #[default]
    Process,
    /// A branch
    Decision,
    /// Data read or written
    InputOutput,
    /// Exit point
    End,
}

impl NodeKind {
    /// Every kind, in palette order
    pub const ALL: [NodeKind; 5] = [
        Self::Start,
        Self::Process,
        Self::Decision,
        Self::InputOutput,
        Self::End,
    ];

    /// Name used in documents
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Start => "start",
            Self::Process => "process",
            Self::Decision => "decision",
            Self::InputOutput => "io",
            Self::End => "end",
        }
    }

    /// Parse a document name
    pub fn parse(text: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.as_str() == text)
    }

    /// Default fill for nodes of this kind
    pub fn default_fill(self) -> Color {
        match self {
            Self::Start | Self::End => Color::rgb(0xC8, 0xE6, 0xC9),
            Self::Process => Color::WHITE,
            Self::Decision => Color::rgb(0xFF, 0xF5, 0x9D),
            Self::InputOutput => Color::rgb(0xBB, 0xDE, 0xFB),
        }
    }
}

/// Caption drawn under a node
#[derive(Debug, Clone, PartialEq)]
pub struct FlowLabel {
    /// Caption text
    pub text: String,
    /// Text colour; `None` inherits the diagram default
    pub text_color: Option<Color>,
    /// Font size in points
    pub font_size: f32,
    /// Bold face
    pub bold: bool,
}

impl Default for FlowLabel {
    fn default() -> Self {
        Self {
            text: String::new(),
            text_color: None,
            font_size: 11.0,
            bold: false,
        }
    }
}

const LABEL_PROPERTIES: &[PropertyInfo] = &[
    PropertyInfo::new("Text", ValueKind::String),
    PropertyInfo::new("TextColor", ValueKind::Color),
    PropertyInfo::new("FontSize", ValueKind::Float),
    PropertyInfo::new("Bold", ValueKind::Bool),
];

impl Reflect for FlowLabel {
    fn type_key(&self) -> TypeKey {
        TypeKey("FlowLabel")
    }

    fn properties(&self) -> &[PropertyInfo] {
        LABEL_PROPERTIES
    }

    fn get(&self, name: &str) -> Result<Value, AccessError> {
        match name {
            "Text" => Ok(Value::string(&self.text)),
            "TextColor" => Ok(Value::Color(self.text_color)),
            "FontSize" => Ok(Value::Float(f64::from(self.font_size))),
            "Bold" => Ok(Value::Bool(self.bold)),
            _ => Err(AccessError::missing(name)),
        }
    }

    fn set(&mut self, name: &str, value: Value) -> Result<(), AccessError> {
        match name {
            "Text" => self.text = access::string(name, value)?,
            "TextColor" => self.text_color = access::color(name, &value)?,
            "FontSize" => {
                let size = access::float(name, &value)?;
                if size <= 0.0 {
                    return Err(AccessError::failed(name, "font size must be positive"));
                }
                self.font_size = size;
            }
            "Bold" => self.bold = access::boolean(name, &value)?,
            _ => return Err(AccessError::missing(name)),
        }
        Ok(())
    }

    fn copy_object(&self) -> Box<dyn Reflect> {
        Box::new(self.clone())
    }

    reflect_any!();
}

/// A node instance in the diagram
#[derive(Debug)]
pub struct FlowNode {
    /// Stable key, kept across save and load
    pub key: NodeKey,
    /// Shape
    pub kind: NodeKind,
    /// Text drawn inside the node
    pub text: String,
    /// Position and size
    pub bounds: Rect,
    /// Fill colour; `None` uses [`NodeKind::default_fill`]
    pub fill: Option<Color>,
    label: ObjectRef,
    in_port: Option<ObjectRef>,
    out_port: Option<ObjectRef>,
}

impl FlowNode {
    /// Create a new node of the given kind
    pub fn new(kind: NodeKind, text: impl Into<String>) -> Self {
        let mut node = Self {
            key: NodeKey::new(),
            kind,
            text: String::new(),
            bounds: Rect::new(0.0, 0.0, MIN_WIDTH, 40.0),
            fill: None,
            label: share_value(FlowLabel::default()),
            in_port: None,
            out_port: None,
        };
        node.set_text(text.into());
        node
    }

    /// Move the node
    pub fn at(mut self, x: f32, y: f32) -> Self {
        self.bounds.x = x;
        self.bounds.y = y;
        self
    }

    /// Replace the text and resize the node to fit it
    pub fn set_text(&mut self, text: String) {
        let chars = text.chars().count() as f32;
        self.bounds.width = (chars * CHAR_WIDTH + TEXT_PADDING).max(MIN_WIDTH);
        self.text = text;
    }

    /// The caption object
    pub fn label(&self) -> &ObjectRef {
        &self.label
    }

    /// Port links arrive at; present once the node is shared
    pub fn in_port(&self) -> Option<&ObjectRef> {
        self.in_port.as_ref()
    }

    /// Port links leave from; present once the node is shared
    pub fn out_port(&self) -> Option<&ObjectRef> {
        self.out_port.as_ref()
    }

    /// Effective fill colour
    pub fn effective_fill(&self) -> Color {
        self.fill.unwrap_or_else(|| self.kind.default_fill())
    }
}

impl Default for FlowNode {
    fn default() -> Self {
        Self::new(NodeKind::default(), "")
    }
}

const NODE_PROPERTIES: &[PropertyInfo] = &[
    PropertyInfo::new("Key", ValueKind::String),
    PropertyInfo::new("Kind", ValueKind::String),
    PropertyInfo::new("Text", ValueKind::String),
    PropertyInfo::new("Bounds", ValueKind::Rect),
    PropertyInfo::new("Location", ValueKind::Point),
    PropertyInfo::new("Size", ValueKind::Size),
    PropertyInfo::read_only("Center", ValueKind::Point),
    PropertyInfo::new("FillColor", ValueKind::Color),
    PropertyInfo::read_only("Label", ValueKind::Object),
    PropertyInfo::read_only("InPort", ValueKind::Object),
    PropertyInfo::read_only("OutPort", ValueKind::Object),
];

impl Reflect for FlowNode {
    fn type_key(&self) -> TypeKey {
        TypeKey("FlowNode")
    }

    fn properties(&self) -> &[PropertyInfo] {
        NODE_PROPERTIES
    }

    fn get(&self, name: &str) -> Result<Value, AccessError> {
        match name {
            "Key" => Ok(Value::string(self.key.to_string())),
            "Kind" => Ok(Value::string(self.kind.as_str())),
            "Text" => Ok(Value::string(&self.text)),
            "Bounds" => Ok(Value::Rect(self.bounds)),
            "Location" => Ok(Value::Point(self.bounds.location())),
            "Size" => Ok(Value::Size(self.bounds.size())),
            "Center" => Ok(Value::Point(self.bounds.center())),
            "FillColor" => Ok(Value::Color(self.fill)),
            "Label" => Ok(Value::Object(self.label.clone())),
            "InPort" => Ok(access::object_value(self.in_port.as_ref())),
            "OutPort" => Ok(access::object_value(self.out_port.as_ref())),
            _ => Err(AccessError::missing(name)),
        }
    }

    fn set(&mut self, name: &str, value: Value) -> Result<(), AccessError> {
        match name {
            "Key" => {
                let text = access::string(name, value)?;
                self.key = NodeKey::parse(&text)
                    .ok_or_else(|| AccessError::failed(name, format!("`{text}` is not a node key")))?;
            }
            "Kind" => {
                let text = access::string(name, value)?;
                self.kind = NodeKind::parse(&text)
                    .ok_or_else(|| AccessError::failed(name, format!("unknown node kind `{text}`")))?;
            }
            "Text" => self.set_text(access::string(name, value)?),
            "Bounds" => self.bounds = access::rect(name, &value)?,
            "Location" => {
                let Point { x, y } = access::point(name, &value)?;
                self.bounds.x = x;
                self.bounds.y = y;
            }
            "Size" => {
                let Size { width, height } = access::size(name, &value)?;
                self.bounds.width = width;
                self.bounds.height = height;
            }
            "FillColor" => self.fill = access::color(name, &value)?,
            _ => return Err(AccessError::missing(name)),
        }
        Ok(())
    }

    fn copy_object(&self) -> Box<dyn Reflect> {
        let label = self.label.read().copy_object();
        Box::new(Self {
            key: NodeKey::new(),
            kind: self.kind,
            text: self.text.clone(),
            bounds: self.bounds,
            fill: self.fill,
            label: flowmark_codec::share(label),
            in_port: None,
            out_port: None,
        })
    }

    fn attached(&mut self, this: &WeakObject) {
        self.in_port = Some(share_value(FlowPort::new(PortDirection::Input, this.clone())));
        self.out_port = Some(share_value(FlowPort::new(PortDirection::Output, this.clone())));
    }

    fn is_node(&self) -> bool {
        true
    }

    reflect_any!();
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[test]
    fn test_node_key_parse() {
        let key = NodeKey::new();
        assert_eq!(NodeKey::parse(&key.to_string()), Some(key));
        assert_eq!(NodeKey::parse("not-a-key"), None);
    }

    #[test]
    fn test_node_kind_names() {
        for kind in NodeKind::ALL {
            assert_eq!(NodeKind::parse(kind.as_str()), Some(kind));
        }
        assert_eq!(NodeKind::parse("cloud"), None);
    }

    #[test]
    fn test_text_resizes_width() {
        let mut node = FlowNode::new(NodeKind::Process, "x");
        assert_eq!(node.bounds.width, MIN_WIDTH);
        node.set("Text", Value::string("a longer step")).unwrap();
        assert_eq!(node.bounds.width, 13.0 * CHAR_WIDTH + TEXT_PADDING);
        node.set("Bounds", Value::Rect(Rect::new(1.0, 2.0, 30.0, 40.0)))
            .unwrap();
        assert_eq!(node.bounds.width, 30.0);
    }

    #[test]
    fn test_rejected_values() {
        let mut node = FlowNode::default();
        assert!(matches!(
            node.set("Kind", Value::string("cloud")),
            Err(AccessError::Failed { .. })
        ));
        assert!(node.set("Key", Value::string("nope")).is_err());
        assert!(matches!(
            node.set("Bounds", Value::Int(3)),
            Err(AccessError::TypeMismatch { .. })
        ));
        assert_eq!(node.kind, NodeKind::Process);
    }

    #[test]
    fn test_ports_owned_by_shared_node() {
        let node = FlowNode::new(NodeKind::Start, "go");
        assert!(node.in_port().is_none());

        let shared = share_value(node);
        let out = shared.read().get("OutPort").unwrap();
        let out = out.as_object().unwrap();
        let owner = out.read().as_port().and_then(|port| port.node()).unwrap();
        assert!(Arc::ptr_eq(&owner, &shared));
    }

    #[test]
    fn test_copy_is_independent() {
        let original = FlowNode::new(NodeKind::Decision, "ok?");
        original.label.write().set("Text", Value::string("check")).unwrap();
        let copy = flowmark_codec::share(original.copy_object());

        let guard = copy.read();
        let node = guard.downcast_ref::<FlowNode>().unwrap();
        assert_ne!(node.key, original.key);
        assert!(!Arc::ptr_eq(node.label(), original.label()));
        assert_eq!(node.label().read().get("Text").unwrap(), Value::string("check"));
        assert!(node.out_port().is_some());
    }
}
