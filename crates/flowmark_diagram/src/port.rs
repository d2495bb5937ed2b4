// SPDX-License-Identifier: MIT OR Apache-2.0
//! Ports: the connection points of a node.

use crate::access;
use flowmark_codec::{
    AccessError, GraphPort, ObjectRef, PropertyInfo, Reflect, TypeKey, Value, ValueKind, WeakObject,
};
use std::sync::Weak;

/// Port direction
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PortDirection {
    /// Links arrive here
    Input,
    /// Links leave from here
    Output,
}

impl PortDirection {
    /// Name used in documents
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Input => "in",
            Self::Output => "out",
        }
    }
}

/// A connection point owned by a node
#[derive(Debug, Clone)]
pub struct FlowPort {
    /// Which way links run through this port
    pub direction: PortDirection,
    owner: WeakObject,
}

impl FlowPort {
    /// Create a port owned by `owner`
    pub fn new(direction: PortDirection, owner: WeakObject) -> Self {
        Self { direction, owner }
    }

    /// A port with no owner yet
    pub fn detached(direction: PortDirection) -> Self {
        let owner: WeakObject = Weak::<parking_lot::RwLock<FlowPort>>::new();
        Self::new(direction, owner)
    }

    /// The node this port belongs to, while it is alive
    pub fn owner(&self) -> Option<ObjectRef> {
        self.owner.upgrade()
    }
}

const PORT_PROPERTIES: &[PropertyInfo] = &[
    PropertyInfo::read_only("Direction", ValueKind::String),
    PropertyInfo::read_only("Node", ValueKind::Object),
];

impl GraphPort for FlowPort {
    fn node(&self) -> Option<ObjectRef> {
        self.owner()
    }
}

impl Reflect for FlowPort {
    fn type_key(&self) -> TypeKey {
        TypeKey("FlowPort")
    }

    fn properties(&self) -> &[PropertyInfo] {
        PORT_PROPERTIES
    }

    fn get(&self, name: &str) -> Result<Value, AccessError> {
        match name {
            "Direction" => Ok(Value::string(self.direction.as_str())),
            "Node" => Ok(access::object_value(self.owner().as_ref())),
            _ => Err(AccessError::missing(name)),
        }
    }

    fn set(&mut self, name: &str, _value: Value) -> Result<(), AccessError> {
        Err(AccessError::NotWritable(name.to_string()))
    }

    fn copy_object(&self) -> Box<dyn Reflect> {
        Box::new(Self::detached(self.direction))
    }

    fn as_port(&self) -> Option<&dyn GraphPort> {
        Some(self)
    }

    reflect_any!();
}
