// SPDX-License-Identifier: MIT OR Apache-2.0
//! Flowchart model for the flowmark codec.
//!
//! This crate provides the objects a flowchart document is made of and
//! the transformers that map them to markup:
//! - Nodes with ports, captions and auto-sizing text
//! - Links between ports
//! - Groups and free-standing comments
//!
//! ## Layouts
//!
//! Documents come in two layouts. The flat layout lists every node and
//! link and refers to ports by token. The tree layout nests each node
//! inside its parent and leaves the links implicit; it only suits
//! diagrams that form a forest.

/// Boilerplate `as_any` upcasts for [`flowmark_codec::Reflect`] impls
macro_rules! reflect_any {
    () => {
        fn as_any(&self) -> &dyn std::any::Any {
            self
        }

        fn as_any_mut(&mut self) -> &mut dyn std::any::Any {
            self
        }
    };
}

mod access;
pub mod codec;
pub mod diagram;
pub mod link;
pub mod node;
pub mod port;
pub mod sample;
pub mod transformers;

pub use codec::{DiagramCodec, Layout};
pub use diagram::{DiagramError, DiagramStats, FlowComment, FlowDiagram, FlowGroup, TreeLosses};
pub use link::FlowLink;
pub use node::{FlowLabel, FlowNode, NodeKey, NodeKind};
pub use port::{FlowPort, PortDirection};
pub use transformers::{flow_registry, tree_registry, LabelTransformer, NodeTransformer};
