// SPDX-License-Identifier: MIT OR Apache-2.0
//! Small reflected types and registries shared by the unit tests.

use crate::binding::Binding;
use crate::object::{
    share_value, AccessError, Collection, GraphLink, GraphPort, ObjectRef, PropertyInfo, Reflect,
    TypeKey, WeakObject,
};
use crate::registry::TransformerRegistry;
use crate::transformer::{Transformer, TransformerConfig, TreeOptions};
use crate::value::{Rect, Value, ValueKind};
use crate::writer::WriteContext;
use std::any::Any;

macro_rules! reflect_basics {
    () => {
        fn as_any(&self) -> &dyn Any {
            self
        }

        fn as_any_mut(&mut self) -> &mut dyn Any {
            self
        }
    };
}

fn object_or_null(object: &Option<ObjectRef>) -> Value {
    object.clone().map_or(Value::Null, Value::Object)
}

fn object_from(member: &str, value: Value) -> Result<Option<ObjectRef>, AccessError> {
    match value {
        Value::Null => Ok(None),
        Value::Object(object) => Ok(Some(object)),
        other => Err(AccessError::mismatch(member, "object", &other)),
    }
}

/// A node with a name, bounds, an optional child and a port-like anchor.
/// Setting the name resizes the bounds.
#[derive(Debug, Clone)]
pub(crate) struct Shape {
    pub name: String,
    pub bounds: Rect,
    pub child: Option<ObjectRef>,
    pub secret: String,
    pub anchor: Option<ObjectRef>,
}

impl Default for Shape {
    fn default() -> Self {
        Self {
            name: String::new(),
            bounds: Rect::new(0.0, 0.0, 10.0, 10.0),
            child: None,
            secret: String::new(),
            anchor: None,
        }
    }
}

impl Shape {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            ..Default::default()
        }
    }
}

const SHAPE_PROPERTIES: &[PropertyInfo] = &[
    PropertyInfo::new("Name", ValueKind::String),
    PropertyInfo::new("Bounds", ValueKind::Rect),
    PropertyInfo::new("Child", ValueKind::Object),
    PropertyInfo::read_only("Area", ValueKind::Float),
    PropertyInfo::write_only("Secret", ValueKind::String),
    PropertyInfo::read_only("Anchor", ValueKind::Object),
];

impl Reflect for Shape {
    fn type_key(&self) -> TypeKey {
        TypeKey("Shape")
    }

    fn properties(&self) -> &[PropertyInfo] {
        SHAPE_PROPERTIES
    }

    fn get(&self, name: &str) -> Result<Value, AccessError> {
        Ok(match name {
            "Name" => Value::string(&self.name),
            "Bounds" => Value::Rect(self.bounds),
            "Child" => object_or_null(&self.child),
            "Area" => Value::Float(f64::from(self.bounds.width * self.bounds.height)),
            "Anchor" => object_or_null(&self.anchor),
            _ => return Err(AccessError::missing(name)),
        })
    }

    fn set(&mut self, name: &str, value: Value) -> Result<(), AccessError> {
        match (name, value) {
            ("Name", Value::String(text)) => {
                self.bounds.width = 10.0 * text.chars().count() as f32;
                self.name = text;
            }
            ("Bounds", Value::Rect(rect)) => self.bounds = rect,
            ("Child", value) => self.child = object_from(name, value)?,
            ("Secret", Value::String(text)) => self.secret = text,
            (_, other) => return Err(AccessError::mismatch(name, "matching value", &other)),
        }
        Ok(())
    }

    fn copy_object(&self) -> Box<dyn Reflect> {
        Box::new(Self {
            anchor: None,
            ..self.clone()
        })
    }

    fn attached(&mut self, this: &WeakObject) {
        self.anchor = Some(share_value(Anchor { owner: this.clone() }));
    }

    fn is_node(&self) -> bool {
        true
    }

    reflect_basics!();
}

/// Port owned by a [`Shape`]
#[derive(Debug, Clone)]
pub(crate) struct Anchor {
    owner: WeakObject,
}

impl GraphPort for Anchor {
    fn node(&self) -> Option<ObjectRef> {
        self.owner.upgrade()
    }
}

impl Reflect for Anchor {
    fn type_key(&self) -> TypeKey {
        TypeKey("Anchor")
    }

    fn properties(&self) -> &[PropertyInfo] {
        &[]
    }

    fn get(&self, name: &str) -> Result<Value, AccessError> {
        Err(AccessError::missing(name))
    }

    fn set(&mut self, name: &str, _value: Value) -> Result<(), AccessError> {
        Err(AccessError::missing(name))
    }

    fn copy_object(&self) -> Box<dyn Reflect> {
        Box::new(self.clone())
    }

    fn as_port(&self) -> Option<&dyn GraphPort> {
        Some(self)
    }

    reflect_basics!();
}

/// A directed edge
#[derive(Debug, Clone, Default)]
pub(crate) struct Edge {
    pub from: Option<ObjectRef>,
    pub to: Option<ObjectRef>,
}

impl Edge {
    pub fn between(from: &ObjectRef, to: &ObjectRef) -> Self {
        Self {
            from: Some(from.clone()),
            to: Some(to.clone()),
        }
    }
}

const EDGE_PROPERTIES: &[PropertyInfo] = &[
    PropertyInfo::new("From", ValueKind::Object),
    PropertyInfo::new("To", ValueKind::Object),
];

impl GraphLink for Edge {
    fn from_end(&self) -> Option<ObjectRef> {
        self.from.clone()
    }

    fn to_end(&self) -> Option<ObjectRef> {
        self.to.clone()
    }
}

impl Reflect for Edge {
    fn type_key(&self) -> TypeKey {
        TypeKey("Edge")
    }

    fn properties(&self) -> &[PropertyInfo] {
        EDGE_PROPERTIES
    }

    fn get(&self, name: &str) -> Result<Value, AccessError> {
        match name {
            "From" => Ok(object_or_null(&self.from)),
            "To" => Ok(object_or_null(&self.to)),
            _ => Err(AccessError::missing(name)),
        }
    }

    fn set(&mut self, name: &str, value: Value) -> Result<(), AccessError> {
        match name {
            "From" => self.from = object_from(name, value)?,
            "To" => self.to = object_from(name, value)?,
            _ => return Err(AccessError::missing(name)),
        }
        Ok(())
    }

    fn copy_object(&self) -> Box<dyn Reflect> {
        Box::new(self.clone())
    }

    fn as_link(&self) -> Option<&dyn GraphLink> {
        Some(self)
    }

    reflect_basics!();
}

/// A titled collection
#[derive(Debug, Clone, Default)]
pub(crate) struct Bag {
    pub title: String,
    pub items: Vec<ObjectRef>,
}

impl Bag {
    pub fn with_items(items: Vec<ObjectRef>) -> Self {
        Self {
            title: String::new(),
            items,
        }
    }
}

const BAG_PROPERTIES: &[PropertyInfo] = &[PropertyInfo::new("Title", ValueKind::String)];

impl Collection for Bag {
    fn items(&self) -> Vec<ObjectRef> {
        self.items.clone()
    }

    fn push(&mut self, item: ObjectRef) {
        self.items.push(item);
    }
}

impl Reflect for Bag {
    fn type_key(&self) -> TypeKey {
        TypeKey("Bag")
    }

    fn properties(&self) -> &[PropertyInfo] {
        BAG_PROPERTIES
    }

    fn get(&self, name: &str) -> Result<Value, AccessError> {
        match name {
            "Title" => Ok(Value::string(&self.title)),
            _ => Err(AccessError::missing(name)),
        }
    }

    fn set(&mut self, name: &str, value: Value) -> Result<(), AccessError> {
        match (name, value) {
            ("Title", Value::String(text)) => self.title = text,
            (_, other) => return Err(AccessError::mismatch(name, "string", &other)),
        }
        Ok(())
    }

    fn copy_object(&self) -> Box<dyn Reflect> {
        Box::new(Self {
            title: self.title.clone(),
            items: Vec::new(),
        })
    }

    fn collection(&self) -> Option<&dyn Collection> {
        Some(self)
    }

    fn collection_mut(&mut self) -> Option<&mut dyn Collection> {
        Some(self)
    }

    reflect_basics!();
}

/// A type without a transformer of its own
#[derive(Debug, Clone, Default)]
pub(crate) struct Round {
    pub name: String,
    pub radius: f64,
}

const ROUND_PROPERTIES: &[PropertyInfo] = &[
    PropertyInfo::new("Name", ValueKind::String),
    PropertyInfo::new("Radius", ValueKind::Float),
];

impl Reflect for Round {
    fn type_key(&self) -> TypeKey {
        TypeKey("Round")
    }

    fn properties(&self) -> &[PropertyInfo] {
        ROUND_PROPERTIES
    }

    fn get(&self, name: &str) -> Result<Value, AccessError> {
        match name {
            "Name" => Ok(Value::string(&self.name)),
            "Radius" => Ok(Value::Float(self.radius)),
            _ => Err(AccessError::missing(name)),
        }
    }

    fn set(&mut self, name: &str, value: Value) -> Result<(), AccessError> {
        match (name, value) {
            ("Name", Value::String(text)) => self.name = text,
            ("Radius", Value::Float(radius)) => self.radius = radius,
            ("Radius", Value::Int(radius)) => self.radius = radius as f64,
            (_, other) => return Err(AccessError::mismatch(name, "matching value", &other)),
        }
        Ok(())
    }

    fn copy_object(&self) -> Box<dyn Reflect> {
        Box::new(self.clone())
    }

    reflect_basics!();
}

/// Every access to `Boom` fails
#[derive(Debug, Clone, Default)]
pub(crate) struct Throwing;

const THROWING_PROPERTIES: &[PropertyInfo] = &[PropertyInfo::new("Boom", ValueKind::Int)];

impl Reflect for Throwing {
    fn type_key(&self) -> TypeKey {
        TypeKey("Throwing")
    }

    fn properties(&self) -> &[PropertyInfo] {
        THROWING_PROPERTIES
    }

    fn get(&self, name: &str) -> Result<Value, AccessError> {
        Err(AccessError::failed(name, "getter exploded"))
    }

    fn set(&mut self, name: &str, _value: Value) -> Result<(), AccessError> {
        Err(AccessError::failed(name, "setter exploded"))
    }

    fn copy_object(&self) -> Box<dyn Reflect> {
        Box::new(Self)
    }

    reflect_basics!();
}

/// `bag` (flat), `shape` with identity, and `edge`
pub(crate) fn registry() -> TransformerRegistry {
    let mut registry = TransformerRegistry::new();
    registry.register_config(
        TransformerConfig::of::<Bag>("bag")
            .bind("title", "Title")
            .with_flat_children(""),
    );
    registry.register_config(
        TransformerConfig::of::<Shape>("shape")
            .with_identity("id")
            .bind("name", "Name")
            .bind("bounds", "Bounds")
            .bind("child", "Child")
            .bind("secret", "Secret"),
    );
    registry.register_config(
        TransformerConfig::of::<Edge>("edge")
            .bind("from", "From")
            .bind("to", "To"),
    );
    registry
}

/// Writes only tree roots at the top level
pub(crate) struct TreeNodes {
    config: TransformerConfig,
}

impl Transformer for TreeNodes {
    fn config(&self) -> &TransformerConfig {
        &self.config
    }

    fn skip(&self, ctx: &WriteContext<'_>, object: &ObjectRef) -> bool {
        ctx.stack.len() == 1 && ctx.tree_parent_of(&self.config, object).is_some()
    }
}

/// Tree options linking shape anchors with a copied [`Edge`]
pub(crate) fn tree_options() -> TreeOptions {
    TreeOptions::new(share_value(Edge::default()), "Anchor", "Anchor").with_link_ends("From", "To")
}

/// `bag` and nested `node` shapes
pub(crate) fn tree_registry() -> TransformerRegistry {
    let mut registry = TransformerRegistry::new();
    registry.register_config(TransformerConfig::of::<Bag>("bag").with_flat_children(""));
    registry.register(TreeNodes {
        config: TransformerConfig::of::<Shape>("node")
            .with_identity("id")
            .bind("name", "Name")
            .with_tree(tree_options()),
    });
    registry
}

/// `bag` and flat `item` shapes naming their parent; links stay implicit
pub(crate) fn parent_registry() -> TransformerRegistry {
    let mut registry = TransformerRegistry::new();
    registry.register_config(TransformerConfig::of::<Bag>("bag").with_flat_children(""));
    registry.register_config(
        TransformerConfig::of::<Shape>("item")
            .with_identity("id")
            .bind("name", "Name")
            .with_binding(Binding::tree_parent("parent"))
            .with_tree_links(tree_options()),
    );
    registry
}
