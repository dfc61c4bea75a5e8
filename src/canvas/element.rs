//! Canvas-side element wrappers.

use crate::definition::{GraphNode, Position};

/// A node as the canvas holds it: the definition data plus the live
/// position, which the canvas owns while dragging.
#[derive(Debug, Clone, PartialEq)]
pub struct CanvasNode {
    pub data: GraphNode,
    pub position: Position,
}

impl CanvasNode {
    pub fn id(&self) -> &str {
        &self.data.id
    }
}

/// What is currently selected on the canvas.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Selection {
    #[default]
    None,
    Node(String),
    Edge(String),
}

impl Selection {
    pub fn node_id(&self) -> Option<&str> {
        match self {
            Selection::Node(id) => Some(id),
            _ => None,
        }
    }

    pub fn edge_id(&self) -> Option<&str> {
        match self {
            Selection::Edge(id) => Some(id),
            _ => None,
        }
    }
}
