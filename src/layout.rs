//! Flow-based auto-layout.
//!
//! Nodes are placed on columns by their breadth-first distance from the
//! start nodes, with all end nodes pinned to one final column and each
//! column centered vertically. The result is deterministic for a given
//! definition.

use std::collections::VecDeque;

use ahash::AHashMap;
use itertools::Itertools;

use crate::definition::{GraphDefinition, NodeType, Position};

pub const LEVEL_X_BASE: f64 = 220.0;
pub const LEVEL_X_GAP: f64 = 280.0;
pub const CENTER_Y: f64 = 240.0;
pub const GAP_Y: f64 = 170.0;

/// Computes a position for every node of the definition.
pub fn layout_nodes_by_flow(definition: &GraphDefinition) -> AHashMap<String, Position> {
    let mut positions = AHashMap::new();
    if definition.nodes.is_empty() {
        return positions;
    }

    let mut adjacency: AHashMap<&str, Vec<&str>> = AHashMap::new();
    for edge in &definition.edges {
        adjacency
            .entry(edge.source.as_str())
            .or_default()
            .push(edge.target.as_str());
    }

    // Minimum edge-distance from the start nodes. Every start node is a
    // co-equal level-zero source; without one, the first node seeds the
    // walk so the graph still lays out.
    let mut levels: AHashMap<&str, usize> = AHashMap::new();
    let mut queue = VecDeque::new();
    for node in &definition.nodes {
        if node.node_type == NodeType::Start {
            levels.insert(node.id.as_str(), 0);
            queue.push_back(node.id.as_str());
        }
    }
    if queue.is_empty() {
        if let Some(first) = definition.nodes.first() {
            levels.insert(first.id.as_str(), 0);
            queue.push_back(first.id.as_str());
        }
    }
    while let Some(current) = queue.pop_front() {
        let level = levels.get(current).copied().unwrap_or(0);
        if let Some(next) = adjacency.get(current) {
            for target in next {
                if !levels.contains_key(target) {
                    levels.insert(target, level + 1);
                    queue.push_back(target);
                }
            }
        }
    }

    // Unreached nodes trail off in their own columns.
    let mut max_level = levels.values().copied().max().unwrap_or(0);
    for node in &definition.nodes {
        if !levels.contains_key(node.id.as_str()) {
            max_level += 1;
            levels.insert(node.id.as_str(), max_level);
        }
    }

    // End nodes share one final column past everything else.
    let final_level = definition
        .nodes
        .iter()
        .filter(|node| node.node_type != NodeType::End)
        .filter_map(|node| levels.get(node.id.as_str()).copied())
        .max()
        .unwrap_or(0)
        .max(1)
        + 1;
    for node in &definition.nodes {
        if node.node_type == NodeType::End {
            levels.insert(node.id.as_str(), final_level);
        }
    }

    // Column buckets, ordered start first, end last, then by id.
    let mut buckets: AHashMap<usize, Vec<&str>> = AHashMap::new();
    for node in &definition.nodes {
        let level = levels.get(node.id.as_str()).copied().unwrap_or(0);
        buckets.entry(level).or_default().push(node.id.as_str());
    }
    let rank = |id: &str| {
        definition
            .node(id)
            .map(|node| match node.node_type {
                NodeType::Start => 0u8,
                NodeType::End => 2,
                _ => 1,
            })
            .unwrap_or(1)
    };
    for (level, bucket) in buckets.into_iter().sorted_by_key(|(level, _)| *level) {
        let ordered: Vec<&str> = bucket
            .into_iter()
            .sorted_by(|a, b| rank(a).cmp(&rank(b)).then_with(|| a.cmp(b)))
            .collect();
        let count = ordered.len();
        for (index, id) in ordered.into_iter().enumerate() {
            let x = LEVEL_X_BASE + level as f64 * LEVEL_X_GAP;
            let y = CENTER_Y - (count as f64 - 1.0) * GAP_Y / 2.0 + index as f64 * GAP_Y;
            positions.insert(id.to_string(), Position::new(x, y));
        }
    }
    positions
}
