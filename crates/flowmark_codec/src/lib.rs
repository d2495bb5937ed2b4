// SPDX-License-Identifier: MIT OR Apache-2.0
//! Attribute-driven object graph codec.
//!
//! This crate reads and writes arbitrary object graphs as structured markup.
//! Each runtime type is handled by a [`Transformer`] that binds markup
//! attributes to dotted property paths; a [`TransformerRegistry`] maps
//! types and element names to transformers.
//!
//! # Writing
//!
//! [`Writer::generate`] runs two stages over a root collection: a
//! definitions stage that hands out identity tokens for every object that
//! may be referenced, then an emission stage that writes one element per
//! object. References are written as tokens, never inline.
//!
//! # Reading
//!
//! [`Reader::consume`] allocates one object per known element, applies its
//! attributes in binding order and recurses into nested elements.
//! References to objects further down the document are queued and resolved
//! once everything has been read.
//!
//! # Trees
//!
//! Transformers configured with [`ChildPolicy::Tree`] treat nesting as a
//! parent/child relation between graph nodes and synthesize a link object
//! for each one (see [`tree`]).

pub mod binding;
pub mod error;
pub mod markup;
pub mod object;
pub mod path;
pub mod reader;
pub mod registry;
pub mod scalar;
pub mod settings;
pub mod shared;
pub mod transformer;
pub mod tree;
pub mod value;
pub mod writer;
pub mod xml;

#[cfg(test)]
pub(crate) mod fixtures;

pub use binding::Binding;
pub use error::{CodecError, Result};
pub use markup::{Element, ElementBuilder, MarkupSink};
pub use object::{
    share, share_value, AccessError, Collection, GraphLink, GraphPort, ObjectKey, ObjectRef,
    PropertyInfo, Reflect, TypeKey, WeakObject,
};
pub use path::{PropertyPath, TREE_PARENT};
pub use reader::{ReadContext, Reader, ReaderOptions};
pub use registry::TransformerRegistry;
pub use settings::CodecSettings;
pub use shared::Referent;
pub use transformer::{
    Allocator, BindingTransformer, ChildPolicy, Inherits, Transformer, TransformerConfig,
    TreeOptions,
};
pub use value::{Color, Point, Rect, Size, Value, ValueKind};
pub use writer::{WriteContext, Writer, WriterOptions};
