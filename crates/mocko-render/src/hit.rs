//! Hit testing: point, marquee, and eraser lookups.
//!
//! Only top-level objects are targets; a group is hit as a whole. All
//! queries run against resolved canvas-space bounds and are linear in the
//! number of top-level objects.

use mocko_core::id::ObjectId;
use mocko_core::{Bounds, NodeIndex, SceneGraph};
use std::collections::HashMap;

/// Find the topmost object whose bounds contain (px, py).
/// Returns `None` if the point is over the empty canvas.
pub fn hit_test(
    graph: &SceneGraph,
    bounds: &HashMap<NodeIndex, Bounds>,
    px: f64,
    py: f64,
) -> Option<ObjectId> {
    // Last painted = topmost
    graph
        .top_level()
        .iter()
        .rev()
        .find(|idx| bounds.get(idx).is_some_and(|b| b.contains(px, py)))
        .map(|idx| graph.graph[*idx].id)
}

/// All objects whose bounds intersect `rect`, in z-order.
/// Used for marquee (box) selection.
pub fn hit_test_rect(
    graph: &SceneGraph,
    bounds: &HashMap<NodeIndex, Bounds>,
    rect: &Bounds,
) -> Vec<ObjectId> {
    graph
        .top_level()
        .iter()
        .filter(|idx| bounds.get(idx).is_some_and(|b| b.intersects_rect(rect)))
        .map(|idx| graph.graph[*idx].id)
        .collect()
}

/// All objects within the eraser circle, in z-order.
///
/// An object is hit iff the minimum distance from the cursor to its
/// axis-aligned bounding box is strictly less than `radius`.
pub fn hit_test_circle(
    graph: &SceneGraph,
    bounds: &HashMap<NodeIndex, Bounds>,
    cx: f64,
    cy: f64,
    radius: f64,
) -> Vec<ObjectId> {
    graph
        .top_level()
        .iter()
        .filter(|idx| {
            bounds
                .get(idx)
                .is_some_and(|b| b.distance_to_point(cx, cy) < radius)
        })
        .map(|idx| graph.graph[*idx].id)
        .collect()
}
