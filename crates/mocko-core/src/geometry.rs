//! Object geometry: intrinsic sizes, transforms, and bounding boxes.
//!
//! Each object has a local frame whose origin is its `left`/`top` point.
//! Scale and rotation apply around that origin. Group members are placed
//! in the group's frame, so world transforms compose parent-first.

use crate::model::*;
use kurbo::{Affine, Point, Rect};
use petgraph::graph::NodeIndex;
use std::collections::HashMap;

/// Affine transform from an object's local frame to its parent's frame.
pub fn local_affine(t: &Transform) -> Affine {
    Affine::translate((t.left, t.top))
        * Affine::rotate(t.angle.to_radians())
        * Affine::scale_non_uniform(t.scale_x, t.scale_y)
}

/// Affine transform from an object's local frame to canvas coordinates.
pub fn world_affine(graph: &SceneGraph, idx: NodeIndex) -> Affine {
    let mut affine = Affine::IDENTITY;
    let mut current = idx;
    while current != graph.root {
        affine = local_affine(&graph.graph[current].transform) * affine;
        match graph.parent(current) {
            Some(parent) => current = parent,
            None => break,
        }
    }
    affine
}

/// Untransformed extent of a leaf kind, in its local frame.
fn kind_rect(kind: &NodeKind) -> Option<Rect> {
    match kind {
        NodeKind::Root | NodeKind::Group => None,
        NodeKind::Rect { width, height, .. }
        | NodeKind::Triangle { width, height }
        | NodeKind::Image { width, height, .. } => Some(Rect::new(0.0, 0.0, *width, *height)),
        NodeKind::Circle { radius } => Some(Rect::new(0.0, 0.0, radius * 2.0, radius * 2.0)),
        NodeKind::Line { x1, y1, x2, y2 } => {
            Some(Rect::from_points(Point::new(*x1, *y1), Point::new(*x2, *y2)))
        }
        NodeKind::Textbox {
            text,
            width,
            font_size,
            ..
        } => {
            let lines = text.lines().count().max(1) as f64;
            Some(Rect::new(0.0, 0.0, *width, lines * font_size * TEXT_LINE_HEIGHT))
        }
        NodeKind::Path { commands } => {
            let mut points = commands.iter().flat_map(|cmd| match *cmd {
                PathCmd::QuadTo(cx, cy, x, y) => vec![Point::new(cx, cy), Point::new(x, y)],
                other => other
                    .end_point()
                    .map(|(x, y)| vec![Point::new(x, y)])
                    .unwrap_or_default(),
            });
            let first = points.next()?;
            Some(points.fold(Rect::from_points(first, first), |r, p| r.union_pt(p)))
        }
    }
}

/// Extent of a node in its own local frame. Groups cover their members.
pub fn local_rect(graph: &SceneGraph, idx: NodeIndex) -> Option<Rect> {
    let node = &graph.graph[idx];
    match node.kind {
        NodeKind::Group => graph
            .children(idx)
            .iter()
            .filter_map(|child| {
                let rect = local_rect(graph, *child)?;
                Some(local_affine(&graph.graph[*child].transform).transform_rect_bbox(rect))
            })
            .reduce(|a, b| a.union(b))
            .or(Some(Rect::ZERO)),
        _ => kind_rect(&node.kind),
    }
}

/// Intrinsic size of a leaf object, ignoring its transform.
pub fn intrinsic_size(kind: &NodeKind) -> (f64, f64) {
    kind_rect(kind)
        .map(|r| (r.width(), r.height()))
        .unwrap_or((0.0, 0.0))
}

/// Axis-aligned bounding box of a node in canvas coordinates.
pub fn object_bounds(graph: &SceneGraph, idx: NodeIndex) -> Option<Bounds> {
    let rect = local_rect(graph, idx)?;
    let bbox = world_affine(graph, idx).transform_rect_bbox(rect);
    Some(Bounds::new(bbox.x0, bbox.y0, bbox.width(), bbox.height()))
}

/// Resolve canvas-space bounds for every object in the graph.
pub fn resolve_bounds(graph: &SceneGraph) -> HashMap<NodeIndex, Bounds> {
    graph
        .graph
        .node_indices()
        .filter(|idx| *idx != graph.root)
        .filter_map(|idx| object_bounds(graph, idx).map(|b| (idx, b)))
        .collect()
}

/// Union of the bounds of the given nodes.
pub fn union_bounds(bounds: &HashMap<NodeIndex, Bounds>, nodes: &[NodeIndex]) -> Option<Bounds> {
    nodes
        .iter()
        .filter_map(|idx| bounds.get(idx))
        .copied()
        .reduce(|a, b| a.union(&b))
}
