// SPDX-License-Identifier: MIT OR Apache-2.0
//! Textual encodings for scalar values.
//!
//! The formats are fixed so documents stay readable by older tooling:
//! - numbers use locale-independent, round-trippable text
//! - booleans are `true` / `false`
//! - points, sizes and rectangles are space-separated components
//! - colours are `none`, a well-known name, or a signed 32-bit ARGB integer
//! - arrays are space-separated element encodings

use crate::value::{Color, Point, Rect, Size, Value, ValueKind};
use std::str::FromStr;

/// Reserved token meaning "explicitly no reference"
pub const NULL_TOKEN: &str = "null";

/// Text used for the empty colour
pub const NO_COLOR: &str = "none";

/// A literal that could not be decoded
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("cannot read {expected} from `{text}`")]
pub struct ScalarError {
    /// Kind that was requested
    pub expected: &'static str,
    /// Offending text
    pub text: String,
}

impl ScalarError {
    fn new(expected: &'static str, text: &str) -> Self {
        Self {
            expected,
            text: text.to_string(),
        }
    }
}

/// Encode a scalar value as text.
///
/// Returns `None` for values with no textual form (`Null`, object references).
pub fn encode(value: &Value, named_colors: bool) -> Option<String> {
    Some(match value {
        Value::Null | Value::Object(_) => return None,
        Value::String(s) | Value::TypeName(s) => s.clone(),
        Value::Int(v) => v.to_string(),
        Value::Float(v) => encode_float(*v),
        Value::Bool(v) => v.to_string(),
        Value::Point(p) => format!("{} {}", p.x, p.y),
        Value::Size(s) => format!("{} {}", s.width, s.height),
        Value::Rect(r) => format!("{} {} {} {}", r.x, r.y, r.width, r.height),
        Value::Color(None) => NO_COLOR.to_string(),
        Value::Color(Some(color)) => match color.name().filter(|_| named_colors) {
            Some(name) => name.to_string(),
            // signed, like the 32-bit ARGB integers older files carry
            None => (color.to_argb() as i32).to_string(),
        },
        Value::Array(items) => items
            .iter()
            .filter_map(|item| encode(item, named_colors))
            .collect::<Vec<_>>()
            .join(" "),
    })
}

fn encode_float(v: f64) -> String {
    if v.is_nan() {
        "NaN".to_string()
    } else if v.is_infinite() {
        let text = if v > 0.0 { "Infinity" } else { "-Infinity" };
        text.to_string()
    } else {
        v.to_string()
    }
}

fn decode_float<T: FromStr>(text: &str) -> Result<T, ScalarError> {
    let trimmed = text.trim();
    let normalized = match trimmed {
        "Infinity" => "inf",
        "-Infinity" => "-inf",
        other => other,
    };
    normalized
        .parse::<T>()
        .map_err(|_| ScalarError::new("float", text))
}

fn components<const N: usize>(text: &str, expected: &'static str) -> Result<[f32; N], ScalarError> {
    let mut out = [0.0f32; N];
    let mut parts = text.split_whitespace();
    for slot in &mut out {
        let part = parts.next().ok_or_else(|| ScalarError::new(expected, text))?;
        *slot = decode_float::<f32>(part).map_err(|_| ScalarError::new(expected, text))?;
    }
    if parts.next().is_some() {
        return Err(ScalarError::new(expected, text));
    }
    Ok(out)
}

fn decode_color(text: &str) -> Result<Option<Color>, ScalarError> {
    let trimmed = text.trim();
    if trimmed.eq_ignore_ascii_case(NO_COLOR) || trimmed.is_empty() {
        return Ok(None);
    }
    if let Ok(argb) = trimmed.parse::<i64>() {
        // accept both the signed and the unsigned reading of 32 bits
        return i32::try_from(argb)
            .map(|v| v as u32)
            .or_else(|_| u32::try_from(argb))
            .map(|v| Some(Color::from_argb(v)))
            .map_err(|_| ScalarError::new("color", text));
    }
    Color::from_name(trimmed)
        .map(Some)
        .ok_or_else(|| ScalarError::new("color", text))
}

/// Decode text into a value of the given kind
pub fn decode(kind: &ValueKind, text: &str) -> Result<Value, ScalarError> {
    Ok(match kind {
        ValueKind::String => Value::String(text.to_string()),
        ValueKind::TypeName => Value::TypeName(text.trim().to_string()),
        ValueKind::Int => Value::Int(
            text.trim()
                .parse()
                .map_err(|_| ScalarError::new("integer", text))?,
        ),
        ValueKind::Float => Value::Float(decode_float(text)?),
        ValueKind::Bool => match text.trim() {
            t if t.eq_ignore_ascii_case("true") => Value::Bool(true),
            t if t.eq_ignore_ascii_case("false") => Value::Bool(false),
            _ => return Err(ScalarError::new("boolean", text)),
        },
        ValueKind::Point => {
            let [x, y] = components(text, "point")?;
            Value::Point(Point::new(x, y))
        }
        ValueKind::Size => {
            let [width, height] = components(text, "size")?;
            Value::Size(Size::new(width, height))
        }
        ValueKind::Rect => {
            let [x, y, width, height] = components(text, "rectangle")?;
            Value::Rect(Rect::new(x, y, width, height))
        }
        ValueKind::Color => Value::Color(decode_color(text)?),
        ValueKind::Array(element) => decode_array(element, text)?,
        ValueKind::Object => return Err(ScalarError::new("scalar", text)),
    })
}

/// Arrays of aggregates are flattened component by component, so the
/// element width decides how many words make up one element.
fn decode_array(element: &ValueKind, text: &str) -> Result<Value, ScalarError> {
    let width = match element {
        ValueKind::Point | ValueKind::Size => 2,
        ValueKind::Rect => 4,
        ValueKind::Array(_) | ValueKind::Object => return Err(ScalarError::new("array", text)),
        _ => 1,
    };
    let words: Vec<&str> = text.split_whitespace().collect();
    if words.len() % width != 0 {
        return Err(ScalarError::new("array", text));
    }
    words
        .chunks(width)
        .map(|chunk| decode(element, &chunk.join(" ")))
        .collect::<Result<Vec<_>, _>>()
        .map(Value::Array)
}
