// SPDX-License-Identifier: MIT OR Apache-2.0
//! Error types for the codec.
//!
//! Only configuration errors, markup/I-O failures and accessor failures on
//! bindings that ask for propagation ever abort a run. Everything else
//! (missing members, unparsable literals, unresolved tokens) is recovered
//! locally and, at most, logged.

use crate::object::{AccessError, TypeKey};
use crate::path::PropertyPath;
use thiserror::Error;

/// Codec errors
#[derive(Debug, Error)]
pub enum CodecError {
    /// No transformer is registered at all
    #[error("No transformers registered; nothing could be generated or consumed")]
    NoTransformers,

    /// A property accessor failed on a binding that propagates errors
    #[error("Accessor failed on {type_name}.{path}: {message}")]
    Accessor {
        /// Runtime type of the object
        type_name: &'static str,
        /// Property path of the binding
        path: String,
        /// Accessor message
        message: String,
    },

    /// Markup syntax error
    #[error("Markup error: {0}")]
    Xml(#[from] quick_xml::Error),

    /// Malformed attribute in the markup
    #[error("Markup attribute error: {0}")]
    XmlAttribute(#[from] quick_xml::events::attributes::AttrError),

    /// Underlying stream failure
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Settings file could not be parsed
    #[error("Settings error: {0}")]
    Settings(#[from] ron::error::SpannedError),

    /// Settings could not be written
    #[error("Settings serialization error: {0}")]
    SettingsWrite(#[from] ron::Error),

    /// Start/end calls on a sink did not pair up
    #[error("Unbalanced markup: {0}")]
    Unbalanced(&'static str),

    /// The document has no root element
    #[error("Document has no root element")]
    MissingRoot,
}

impl CodecError {
    /// Accessor failure on a propagating binding
    pub fn accessor(type_key: TypeKey, path: &PropertyPath, err: &AccessError) -> Self {
        Self::Accessor {
            type_name: type_key.name(),
            path: path.to_string(),
            message: err.to_string(),
        }
    }
}

/// Result type for codec operations
pub type Result<T> = std::result::Result<T, CodecError>;
