// SPDX-License-Identifier: MIT OR Apache-2.0
//! Value unpacking shared by the property setters.

use flowmark_codec::{AccessError, Color, ObjectRef, Point, Rect, Size, Value};

pub(crate) fn string(member: &str, value: Value) -> Result<String, AccessError> {
    match value {
        Value::String(text) | Value::TypeName(text) => Ok(text),
        other => Err(AccessError::mismatch(member, "string", &other)),
    }
}

pub(crate) fn float(member: &str, value: &Value) -> Result<f32, AccessError> {
    value
        .as_f64()
        .map(|v| v as f32)
        .ok_or_else(|| AccessError::mismatch(member, "float", value))
}

pub(crate) fn int(member: &str, value: &Value) -> Result<i64, AccessError> {
    value
        .as_i64()
        .ok_or_else(|| AccessError::mismatch(member, "integer", value))
}

pub(crate) fn boolean(member: &str, value: &Value) -> Result<bool, AccessError> {
    value
        .as_bool()
        .ok_or_else(|| AccessError::mismatch(member, "boolean", value))
}

pub(crate) fn point(member: &str, value: &Value) -> Result<Point, AccessError> {
    match value {
        Value::Point(point) => Ok(*point),
        other => Err(AccessError::mismatch(member, "point", other)),
    }
}

pub(crate) fn size(member: &str, value: &Value) -> Result<Size, AccessError> {
    match value {
        Value::Size(size) => Ok(*size),
        other => Err(AccessError::mismatch(member, "size", other)),
    }
}

pub(crate) fn rect(member: &str, value: &Value) -> Result<Rect, AccessError> {
    match value {
        Value::Rect(rect) => Ok(*rect),
        other => Err(AccessError::mismatch(member, "rectangle", other)),
    }
}

pub(crate) fn color(member: &str, value: &Value) -> Result<Option<Color>, AccessError> {
    match value {
        Value::Color(color) => Ok(*color),
        Value::Null => Ok(None),
        other => Err(AccessError::mismatch(member, "color", other)),
    }
}

pub(crate) fn points(member: &str, value: Value) -> Result<Vec<Point>, AccessError> {
    match value {
        Value::Array(items) => items.iter().map(|item| point(member, item)).collect(),
        Value::Null => Ok(Vec::new()),
        other => Err(AccessError::mismatch(member, "point array", &other)),
    }
}

pub(crate) fn object(member: &str, value: Value) -> Result<Option<ObjectRef>, AccessError> {
    match value {
        Value::Object(object) => Ok(Some(object)),
        Value::Null => Ok(None),
        other => Err(AccessError::mismatch(member, "object", &other)),
    }
}

pub(crate) fn object_value(object: Option<&ObjectRef>) -> Value {
    object.cloned().map_or(Value::Null, Value::Object)
}
