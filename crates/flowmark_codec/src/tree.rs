// SPDX-License-Identifier: MIT OR Apache-2.0
//! Tree-link synthesis.
//!
//! Tree-structured markup nests logical child nodes inside their parent
//! instead of listing links explicitly. When reading, every nesting (or
//! `TreeParent` reference) becomes a fresh link copied from a prototype
//! and connected between a port on the parent and a port on the child.
//! When writing, the links of the root collection are indexed so each node
//! can emit its logical children in turn.
//!
//! Only tree roots should be passed to the writer at the top level. A
//! non-root member in the top-level collection is written once there and
//! again inside its parent, together with its whole subtree.

use crate::error::Result;
use crate::object::{share, ObjectRef};
use crate::path::{self, PropertyPath};
use crate::reader::ReadContext;
use crate::shared::LinkIndex;
use crate::transformer::TreeOptions;
use crate::value::Value;

/// Logical children of `node`, following link direction
pub fn children(links: &LinkIndex, reverse: bool, node: &ObjectRef) -> Vec<ObjectRef> {
    if reverse {
        links.predecessors(node).to_vec()
    } else {
        links.successors(node).to_vec()
    }
}

/// Logical parent of `node`, if it has one
pub fn parent(links: &LinkIndex, reverse: bool, node: &ObjectRef) -> Option<ObjectRef> {
    let candidates = if reverse {
        links.successors(node)
    } else {
        links.predecessors(node)
    };
    candidates.first().cloned()
}

fn port(node: &ObjectRef, path: &PropertyPath) -> Option<ObjectRef> {
    match path::read(node, path) {
        Ok(Some(Value::Object(port))) => Some(port),
        _ => None,
    }
}

/// Connect `parent` to `child` with a new link.
///
/// With `add_child`, the child is placed in the results ahead of anything
/// consumed inside it. The link always goes at the end. Returns the link,
/// or `None` when either port could not be found.
pub fn synthesize(
    ctx: &mut ReadContext<'_>,
    options: &TreeOptions,
    parent: &ObjectRef,
    child: &ObjectRef,
    add_child: bool,
) -> Result<Option<ObjectRef>> {
    if add_child {
        let slot = ctx.last_slot();
        ctx.insert_result(slot, child.clone());
    }

    let (Some(parent_port), Some(child_port)) = (
        port(parent, &options.parent_port),
        port(child, &options.child_port),
    ) else {
        tracing::warn!(
            parent_port = %options.parent_port,
            child_port = %options.child_port,
            "tree ports not found, no link created"
        );
        return Ok(None);
    };

    let link = share(options.link_prototype.read().copy_object());
    let (from, to) = if options.reverse {
        (child_port, parent_port)
    } else {
        (parent_port, child_port)
    };
    for (end, port) in [(&options.link_from, from), (&options.link_to, to)] {
        match path::write(&link, end, Value::Object(port)) {
            Ok(true) => {}
            Ok(false) => tracing::warn!(property = %end, "link endpoint not writable"),
            Err(err) => tracing::warn!(property = %end, %err, "link endpoint rejected"),
        }
    }
    ctx.add_result(link.clone());
    Ok(Some(link))
}
