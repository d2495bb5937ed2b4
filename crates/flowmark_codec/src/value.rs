// SPDX-License-Identifier: MIT OR Apache-2.0
//! Dynamically typed property values.
//!
//! [`Value`] is what a property accessor hands to the codec and what the
//! codec hands back. Geometry and colour values are *value types*: reading
//! one yields a copy, so writing through one of their members (for example
//! `Bounds.X`) has to re-assign the whole aggregate to its owner. The
//! [`Value::member`] / [`Value::with_member`] pair is what the path resolver
//! uses for that.

use crate::object::{AccessError, ObjectRef};
use std::fmt;
use std::sync::Arc;

/// A 2-D point
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Point {
    /// Horizontal coordinate
    pub x: f32,
    /// Vertical coordinate
    pub y: f32,
}

impl Point {
    /// Create a new point
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
}

/// A 2-D extent
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Size {
    /// Horizontal extent
    pub width: f32,
    /// Vertical extent
    pub height: f32,
}

impl Size {
    /// Create a new size
    pub const fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }
}

/// An axis-aligned rectangle
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Rect {
    /// Left edge
    pub x: f32,
    /// Top edge
    pub y: f32,
    /// Width
    pub width: f32,
    /// Height
    pub height: f32,
}

impl Rect {
    /// Create a new rectangle
    pub const fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self { x, y, width, height }
    }

    /// Top-left corner
    pub fn location(&self) -> Point {
        Point::new(self.x, self.y)
    }

    /// Width and height
    pub fn size(&self) -> Size {
        Size::new(self.width, self.height)
    }

    /// Center point
    pub fn center(&self) -> Point {
        Point::new(self.x + self.width / 2.0, self.y + self.height / 2.0)
    }
}

/// A colour with alpha
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Color {
    /// Alpha
    pub a: u8,
    /// Red
    pub r: u8,
    /// Green
    pub g: u8,
    /// Blue
    pub b: u8,
}

/// Well-known colour names, matched case-insensitively on input.
const NAMED_COLORS: &[(&str, u32)] = &[
    ("Transparent", 0x00FF_FFFF),
    ("Black", 0xFF00_0000),
    ("White", 0xFFFF_FFFF),
    ("Red", 0xFFFF_0000),
    ("Green", 0xFF00_8000),
    ("Lime", 0xFF00_FF00),
    ("Blue", 0xFF00_00FF),
    ("Yellow", 0xFFFF_FF00),
    ("Orange", 0xFFFF_A500),
    ("Gray", 0xFF80_8080),
    ("LightGray", 0xFFD3_D3D3),
    ("DarkGray", 0xFFA9_A9A9),
    ("LightBlue", 0xFFAD_D8E6),
    ("LightGreen", 0xFF90_EE90),
    ("LightYellow", 0xFFFF_FFE0),
    ("Navy", 0xFF00_0080),
    ("Purple", 0xFF80_0080),
];

impl Color {
    /// Opaque black
    pub const BLACK: Color = Color::from_argb(0xFF00_0000);
    /// Opaque white
    pub const WHITE: Color = Color::from_argb(0xFFFF_FFFF);

    /// Create an opaque colour
    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { a: 255, r, g, b }
    }

    /// Create a colour from packed `0xAARRGGBB`
    pub const fn from_argb(argb: u32) -> Self {
        Self {
            a: (argb >> 24) as u8,
            r: (argb >> 16) as u8,
            g: (argb >> 8) as u8,
            b: argb as u8,
        }
    }

    /// Packed `0xAARRGGBB`
    pub const fn to_argb(self) -> u32 {
        (self.a as u32) << 24 | (self.r as u32) << 16 | (self.g as u32) << 8 | self.b as u32
    }

    /// Look up a well-known colour by name
    pub fn from_name(name: &str) -> Option<Self> {
        NAMED_COLORS
            .iter()
            .find(|(known, _)| known.eq_ignore_ascii_case(name))
            .map(|(_, argb)| Self::from_argb(*argb))
    }

    /// The well-known name of this colour, if it has one
    pub fn name(self) -> Option<&'static str> {
        let argb = self.to_argb();
        NAMED_COLORS
            .iter()
            .find(|(_, known)| *known == argb)
            .map(|(name, _)| *name)
    }
}

/// The static kind of a property, used to pick a textual decoder
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValueKind {
    /// Text
    String,
    /// Signed integer
    Int,
    /// Floating point
    Float,
    /// Boolean
    Bool,
    /// [`Point`]
    Point,
    /// [`Size`]
    Size,
    /// [`Rect`]
    Rect,
    /// Optional [`Color`]
    Color,
    /// Name of a type
    TypeName,
    /// Homogeneous array of scalars
    Array(&'static ValueKind),
    /// Reference to another shared object
    Object,
}

impl ValueKind {
    /// Whether values of this kind are encoded inline as text
    pub fn is_scalar(&self) -> bool {
        !matches!(self, Self::Object)
    }
}

/// A dynamically typed property value
#[derive(Clone, Default)]
pub enum Value {
    /// No value (or a null reference)
    #[default]
    Null,
    /// Text
    String(String),
    /// Signed integer
    Int(i64),
    /// Floating point
    Float(f64),
    /// Boolean
    Bool(bool),
    /// 2-D point
    Point(Point),
    /// 2-D extent
    Size(Size),
    /// Rectangle
    Rect(Rect),
    /// Colour; `None` is the empty colour
    Color(Option<Color>),
    /// Name of a type
    TypeName(String),
    /// Array of scalars
    Array(Vec<Value>),
    /// Reference to a shared object
    Object(ObjectRef),
}

impl Value {
    /// Wrap any string-like value
    pub fn string(text: impl Into<String>) -> Self {
        Self::String(text.into())
    }

    /// Whether this is [`Value::Null`]
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// The referenced object, if this is a reference
    pub fn as_object(&self) -> Option<&ObjectRef> {
        match self {
            Self::Object(object) => Some(object),
            _ => None,
        }
    }

    /// Text content, for `String` and `TypeName`
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(text) | Self::TypeName(text) => Some(text),
            _ => None,
        }
    }

    /// Numeric content widened to `f64`
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Float(v) => Some(*v),
            Self::Int(v) => Some(*v as f64),
            _ => None,
        }
    }

    /// Numeric content as `i64`
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Self::Int(v) => Some(*v),
            _ => None,
        }
    }

    /// Boolean content
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(v) => Some(*v),
            _ => None,
        }
    }

    /// Name of the variant, for diagnostics
    pub fn kind_name(&self) -> &'static str {
        match self {
            Self::Null => "null",
            Self::String(_) => "string",
            Self::Int(_) => "int",
            Self::Float(_) => "float",
            Self::Bool(_) => "bool",
            Self::Point(_) => "point",
            Self::Size(_) => "size",
            Self::Rect(_) => "rect",
            Self::Color(_) => "color",
            Self::TypeName(_) => "type",
            Self::Array(_) => "array",
            Self::Object(_) => "object",
        }
    }

    /// Read a member of a value-typed aggregate
    pub fn member(&self, name: &str) -> Result<Value, AccessError> {
        let float = |v: f32| Ok(Value::Float(f64::from(v)));
        match (self, name) {
            (Self::Point(p), "X") => float(p.x),
            (Self::Point(p), "Y") => float(p.y),
            (Self::Size(s), "Width") => float(s.width),
            (Self::Size(s), "Height") => float(s.height),
            (Self::Rect(r), "X" | "Left") => float(r.x),
            (Self::Rect(r), "Y" | "Top") => float(r.y),
            (Self::Rect(r), "Width") => float(r.width),
            (Self::Rect(r), "Height") => float(r.height),
            (Self::Rect(r), "Location") => Ok(Value::Point(r.location())),
            (Self::Rect(r), "Size") => Ok(Value::Size(r.size())),
            (Self::Rect(r), "Center") => Ok(Value::Point(r.center())),
            (Self::Color(Some(c)), "A") => Ok(Value::Int(i64::from(c.a))),
            (Self::Color(Some(c)), "R") => Ok(Value::Int(i64::from(c.r))),
            (Self::Color(Some(c)), "G") => Ok(Value::Int(i64::from(c.g))),
            (Self::Color(Some(c)), "B") => Ok(Value::Int(i64::from(c.b))),
            (Self::Array(items), "Length") => Ok(Value::Int(items.len() as i64)),
            (Self::String(s), "Length") => Ok(Value::Int(s.chars().count() as i64)),
            _ => Err(AccessError::missing(name)),
        }
    }

    /// Static kind of a member of a value-typed aggregate
    pub fn member_kind(&self, name: &str) -> Option<ValueKind> {
        match (self, name) {
            (Self::Point(_), "X" | "Y")
            | (Self::Size(_), "Width" | "Height")
            | (Self::Rect(_), "X" | "Y" | "Left" | "Top" | "Width" | "Height") => {
                Some(ValueKind::Float)
            }
            (Self::Rect(_), "Location" | "Center") => Some(ValueKind::Point),
            (Self::Rect(_), "Size") => Some(ValueKind::Size),
            (Self::Color(Some(_)), "A" | "R" | "G" | "B")
            | (Self::Array(_) | Self::String(_), "Length") => Some(ValueKind::Int),
            _ => None,
        }
    }

    /// Return a copy of this aggregate with one member replaced
    pub fn with_member(&self, name: &str, value: Value) -> Result<Value, AccessError> {
        let float = |v: &Value| {
            v.as_f64()
                .map(|f| f as f32)
                .ok_or_else(|| AccessError::mismatch(name, "float", v))
        };
        let byte = |v: &Value| {
            v.as_i64()
                .and_then(|i| u8::try_from(i).ok())
                .ok_or_else(|| AccessError::mismatch(name, "byte", v))
        };
        let mut copy = self.clone();
        match (&mut copy, name) {
            (Self::Point(p), "X") => p.x = float(&value)?,
            (Self::Point(p), "Y") => p.y = float(&value)?,
            (Self::Size(s), "Width") => s.width = float(&value)?,
            (Self::Size(s), "Height") => s.height = float(&value)?,
            (Self::Rect(r), "X" | "Left") => r.x = float(&value)?,
            (Self::Rect(r), "Y" | "Top") => r.y = float(&value)?,
            (Self::Rect(r), "Width") => r.width = float(&value)?,
            (Self::Rect(r), "Height") => r.height = float(&value)?,
            (Self::Rect(r), "Location") => match value {
                Value::Point(p) => {
                    r.x = p.x;
                    r.y = p.y;
                }
                other => return Err(AccessError::mismatch(name, "point", &other)),
            },
            (Self::Rect(r), "Size") => match value {
                Value::Size(s) => {
                    r.width = s.width;
                    r.height = s.height;
                }
                other => return Err(AccessError::mismatch(name, "size", &other)),
            },
            (Self::Color(Some(c)), "A") => c.a = byte(&value)?,
            (Self::Color(Some(c)), "R") => c.r = byte(&value)?,
            (Self::Color(Some(c)), "G") => c.g = byte(&value)?,
            (Self::Color(Some(c)), "B") => c.b = byte(&value)?,
            (_, "Length" | "Center") => return Err(AccessError::NotWritable(name.to_string())),
            _ => return Err(AccessError::missing(name)),
        }
        Ok(copy)
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Null, Self::Null) => true,
            (Self::String(a), Self::String(b)) | (Self::TypeName(a), Self::TypeName(b)) => a == b,
            (Self::Int(a), Self::Int(b)) => a == b,
            (Self::Float(a), Self::Float(b)) => a == b,
            (Self::Bool(a), Self::Bool(b)) => a == b,
            (Self::Point(a), Self::Point(b)) => a == b,
            (Self::Size(a), Self::Size(b)) => a == b,
            (Self::Rect(a), Self::Rect(b)) => a == b,
            (Self::Color(a), Self::Color(b)) => a == b,
            (Self::Array(a), Self::Array(b)) => a == b,
            (Self::Object(a), Self::Object(b)) => Arc::ptr_eq(a, b),
            _ => false,
        }
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Null => f.write_str("Null"),
            Self::String(v) => f.debug_tuple("String").field(v).finish(),
            Self::Int(v) => f.debug_tuple("Int").field(v).finish(),
            Self::Float(v) => f.debug_tuple("Float").field(v).finish(),
            Self::Bool(v) => f.debug_tuple("Bool").field(v).finish(),
            Self::Point(v) => f.debug_tuple("Point").field(v).finish(),
            Self::Size(v) => f.debug_tuple("Size").field(v).finish(),
            Self::Rect(v) => f.debug_tuple("Rect").field(v).finish(),
            Self::Color(v) => f.debug_tuple("Color").field(v).finish(),
            Self::TypeName(v) => f.debug_tuple("TypeName").field(v).finish(),
            Self::Array(v) => f.debug_tuple("Array").field(v).finish(),
            // Avoid locking: the object may be mid-update on this thread.
            Self::Object(object) => write!(f, "Object({:p})", Arc::as_ptr(object).cast::<()>()),
        }
    }
}

macro_rules! value_from {
    ($($ty:ty => $variant:ident),* $(,)?) => {
        $(impl From<$ty> for Value {
            fn from(v: $ty) -> Self {
                Self::$variant(v.into())
            }
        })*
    };
}

value_from! {
    String => String,
    &str => String,
    i64 => Int,
    i32 => Int,
    f64 => Float,
    f32 => Float,
    bool => Bool,
    Point => Point,
    Size => Size,
    Rect => Rect,
    ObjectRef => Object,
}

impl From<Color> for Value {
    fn from(color: Color) -> Self {
        Self::Color(Some(color))
    }
}

impl From<Option<Color>> for Value {
    fn from(color: Option<Color>) -> Self {
        Self::Color(color)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rect_members() {
        let rect = Value::Rect(Rect::new(1.0, 2.0, 30.0, 40.0));
        assert_eq!(rect.member("Width").unwrap(), Value::Float(30.0));
        assert_eq!(rect.member("Location").unwrap(), Value::Point(Point::new(1.0, 2.0)));
        assert_eq!(rect.member_kind("Size"), Some(ValueKind::Size));
        assert!(matches!(rect.member("Depth"), Err(AccessError::Missing(_))));
    }

    #[test]
    fn test_with_member_copies() {
        let rect = Value::Rect(Rect::new(1.0, 2.0, 30.0, 40.0));
        let moved = rect
            .with_member("Location", Value::Point(Point::new(5.0, 6.0)))
            .unwrap();
        assert_eq!(moved, Value::Rect(Rect::new(5.0, 6.0, 30.0, 40.0)));
        // the original is untouched: value semantics
        assert_eq!(rect, Value::Rect(Rect::new(1.0, 2.0, 30.0, 40.0)));
    }

    #[test]
    fn test_with_member_type_mismatch() {
        let point = Value::Point(Point::new(0.0, 0.0));
        let err = point.with_member("X", Value::string("left")).unwrap_err();
        assert!(matches!(err, AccessError::TypeMismatch { .. }));
        assert!(matches!(
            point.with_member("Z", Value::Float(1.0)),
            Err(AccessError::Missing(_))
        ));
    }

    #[test]
    fn test_named_colors() {
        assert_eq!(Color::from_name("red"), Some(Color::rgb(255, 0, 0)));
        assert_eq!(Color::rgb(255, 255, 0).name(), Some("Yellow"));
        assert_eq!(Color::rgb(1, 2, 3).name(), None);
        assert_eq!(Color::from_argb(0x8011_2233).to_argb(), 0x8011_2233);
    }
}
