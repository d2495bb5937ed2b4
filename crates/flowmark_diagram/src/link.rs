// SPDX-License-Identifier: MIT OR Apache-2.0
//! Links between node ports.

use crate::access;
use flowmark_codec::{
    AccessError, Color, GraphLink, ObjectRef, Point, PropertyInfo, Reflect, TypeKey, Value, ValueKind,
};

/// A directed connection from an output port to an input port
#[derive(Debug, Clone)]
pub struct FlowLink {
    /// Source port
    pub from: Option<ObjectRef>,
    /// Destination port
    pub to: Option<ObjectRef>,
    /// Text drawn along the link
    pub text: String,
    /// Intermediate route points
    pub points: Vec<Point>,
    /// Route with right angles only
    pub orthogonal: bool,
    /// Stroke colour
    pub color: Color,
    /// Stroke width
    pub width: f32,
}

impl Default for FlowLink {
    fn default() -> Self {
        Self {
            from: None,
            to: None,
            text: String::new(),
            points: Vec::new(),
            orthogonal: false,
            color: Color::BLACK,
            width: 1.0,
        }
    }
}

impl FlowLink {
    /// Create a link between two ports
    pub fn between(from: &ObjectRef, to: &ObjectRef) -> Self {
        Self {
            from: Some(from.clone()),
            to: Some(to.clone()),
            ..Self::default()
        }
    }

    /// Set the link text
    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text = text.into();
        self
    }

    /// Whether both ends are attached
    pub fn is_connected(&self) -> bool {
        self.from.is_some() && self.to.is_some()
    }

    /// Whether the link carries text, a route or a non-default stroke
    pub fn is_styled(&self) -> bool {
        let plain = Self::default();
        !self.text.is_empty()
            || !self.points.is_empty()
            || self.color != plain.color
            || self.width != plain.width
    }
}

const POINT_KIND: ValueKind = ValueKind::Point;

const LINK_PROPERTIES: &[PropertyInfo] = &[
    PropertyInfo::new("FromPort", ValueKind::Object),
    PropertyInfo::new("ToPort", ValueKind::Object),
    PropertyInfo::new("Text", ValueKind::String),
    PropertyInfo::new("Points", ValueKind::Array(&POINT_KIND)),
    PropertyInfo::new("Orthogonal", ValueKind::Bool),
    PropertyInfo::new("Color", ValueKind::Color),
    PropertyInfo::new("Width", ValueKind::Float),
];

impl GraphLink for FlowLink {
    fn from_end(&self) -> Option<ObjectRef> {
        self.from.clone()
    }

    fn to_end(&self) -> Option<ObjectRef> {
        self.to.clone()
    }
}

impl Reflect for FlowLink {
    fn type_key(&self) -> TypeKey {
        TypeKey("FlowLink")
    }

    fn properties(&self) -> &[PropertyInfo] {
        LINK_PROPERTIES
    }

    fn get(&self, name: &str) -> Result<Value, AccessError> {
        match name {
            "FromPort" => Ok(access::object_value(self.from.as_ref())),
            "ToPort" => Ok(access::object_value(self.to.as_ref())),
            "Text" => Ok(Value::string(&self.text)),
            "Points" => Ok(Value::Array(self.points.iter().copied().map(Value::Point).collect())),
            "Orthogonal" => Ok(Value::Bool(self.orthogonal)),
            "Color" => Ok(Value::from(self.color)),
            "Width" => Ok(Value::Float(f64::from(self.width))),
            _ => Err(AccessError::missing(name)),
        }
    }

    fn set(&mut self, name: &str, value: Value) -> Result<(), AccessError> {
        match name {
            "FromPort" => self.from = access::object(name, value)?,
            "ToPort" => self.to = access::object(name, value)?,
            "Text" => self.text = access::string(name, value)?,
            "Points" => self.points = access::points(name, value)?,
            "Orthogonal" => self.orthogonal = access::boolean(name, &value)?,
            "Color" => self.color = access::color(name, &value)?.unwrap_or(Color::BLACK),
            "Width" => self.width = access::float(name, &value)?.max(0.0),
            _ => return Err(AccessError::missing(name)),
        }
        Ok(())
    }

    fn copy_object(&self) -> Box<dyn Reflect> {
        // a copy keeps the styling but not the ends
        Box::new(Self {
            from: None,
            to: None,
            ..self.clone()
        })
    }

    fn as_link(&self) -> Option<&dyn GraphLink> {
        Some(self)
    }

    reflect_any!();
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::node::{FlowNode, NodeKind};
    use flowmark_codec::share_value;

    #[test]
    fn test_copy_drops_ends() {
        let a = share_value(FlowNode::new(NodeKind::Start, "a"));
        let b = share_value(FlowNode::new(NodeKind::End, "b"));
        let out = a.read().get("OutPort").unwrap().as_object().cloned().unwrap();
        let input = b.read().get("InPort").unwrap().as_object().cloned().unwrap();
        let mut link = FlowLink::between(&out, &input).with_text("yes");
        link.orthogonal = true;
        assert!(link.is_connected());

        let copy = link.copy_object();
        let copy = copy.as_any().downcast_ref::<FlowLink>().unwrap();
        assert!(!copy.is_connected());
        assert!(copy.orthogonal);
        assert_eq!(copy.text, "yes");
    }

    #[test]
    fn test_points_property() {
        let mut link = FlowLink::default();
        let route = Value::Array(vec![
            Value::Point(Point::new(1.0, 2.0)),
            Value::Point(Point::new(3.0, 4.0)),
        ]);
        link.set("Points", route.clone()).unwrap();
        assert_eq!(link.points.len(), 2);
        assert_eq!(link.get("Points").unwrap(), route);
        assert!(link.set("Points", Value::Array(vec![Value::Int(1)])).is_err());
        link.set("Points", Value::Null).unwrap();
        assert!(link.points.is_empty());
    }
}
