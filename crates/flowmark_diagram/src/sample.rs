// SPDX-License-Identifier: MIT OR Apache-2.0
//! A small order-handling flowchart, used by the command line tool and tests.

use crate::diagram::{DiagramError, FlowComment, FlowDiagram, FlowGroup};
use crate::link::FlowLink;
use crate::node::{FlowNode, NodeKind};
use flowmark_codec::{share_value, Collection, Rect};

/// Build the sample diagram.
///
/// The links form a tree rooted at the start node, so the result can be
/// saved in either layout.
pub fn sample() -> Result<FlowDiagram, DiagramError> {
    let mut diagram = FlowDiagram::new("Order handling");

    let start = diagram.add_node(FlowNode::new(NodeKind::Start, "Begin").at(40.0, 20.0));
    let read = diagram.add_node(FlowNode::new(NodeKind::InputOutput, "Read order").at(40.0, 100.0));
    let check = diagram.add_node(FlowNode::new(NodeKind::Decision, "In stock?").at(40.0, 180.0));
    let ship = diagram.add_node(FlowNode::new(NodeKind::Process, "Ship order").at(40.0, 260.0));
    let done = diagram.add_node(FlowNode::new(NodeKind::End, "Done").at(40.0, 340.0));
    let notify = diagram.add_node(FlowNode::new(NodeKind::Process, "Notify customer").at(240.0, 260.0));

    diagram.connect(&start, &read)?;
    diagram.connect(&read, &check)?;
    diagram.connect_with(&check, &ship, FlowLink::default().with_text("yes"))?;
    diagram.connect(&ship, &done)?;
    diagram.connect_with(&check, &notify, FlowLink::default().with_text("no"))?;

    let mut comment = FlowComment::new("Stock is checked against the warehouse feed");
    comment.bounds = Rect::new(240.0, 160.0, 180.0, 60.0);
    diagram.add_item(share_value(comment));

    let mut group = FlowGroup::new("Backlog");
    group.bounds = Rect::new(440.0, 20.0, 200.0, 120.0);
    group.push(share_value(FlowComment::new("Handle partial shipments")));
    diagram.add_item(share_value(group));

    Ok(diagram)
}
