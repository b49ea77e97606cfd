//! Bounding-volume hierarchy over mesh triangles.

use super::{ClosestPoint, ClosestPointIndex};
use crate::geometry::Triangle;
use crate::mesh::SurfaceMesh;
use crate::spatial::{BoundingBox, Point3};

const MAX_LEAF_SIZE: usize = 4;

#[derive(Debug, Clone)]
enum NodeKind {
    Leaf { start: usize, count: usize },
    Interior { left: usize, right: usize },
}

#[derive(Debug, Clone)]
struct BvhNode {
    bounds: BoundingBox,
    kind: NodeKind,
}

struct BuildItem {
    id: usize,
    centroid: Point3,
    bounds: BoundingBox,
}

/// Axis-aligned bounding-volume hierarchy for point-to-surface queries.
///
/// Built by median splits of triangle centroids along the longest axis.
/// Queries visit children nearest-first and prune any box farther than the
/// best distance found so far.
#[derive(Debug, Clone)]
pub struct TriangleBvh {
    nodes: Vec<BvhNode>,
    /// Triangles in leaf order.
    triangles: Vec<Triangle>,
    /// Source triangle index for each entry of `triangles`.
    ids: Vec<usize>,
}

impl TriangleBvh {
    /// Build the hierarchy over every triangle of `mesh`.
    ///
    /// A mesh without triangles yields an empty index that answers no query.
    pub fn build(mesh: &SurfaceMesh) -> Self {
        let mut items: Vec<BuildItem> = mesh
            .iter_triangles()
            .enumerate()
            .map(|(id, t)| BuildItem {
                id,
                centroid: t.centroid(),
                bounds: t.bounds(),
            })
            .collect();

        let mut nodes = Vec::with_capacity(2 * items.len() / MAX_LEAF_SIZE + 1);
        if !items.is_empty() {
            build_node(&mut nodes, &mut items, 0);
        }

        let ids: Vec<usize> = items.iter().map(|it| it.id).collect();
        let triangles = ids.iter().map(|&id| mesh.triangle(id)).collect();

        Self {
            nodes,
            triangles,
            ids,
        }
    }

    /// Bounds of the whole indexed surface.
    pub fn bounds(&self) -> BoundingBox {
        self.nodes
            .first()
            .map(|n| n.bounds)
            .unwrap_or_else(BoundingBox::empty)
    }

    /// Number of nodes in the hierarchy.
    pub fn num_nodes(&self) -> usize {
        self.nodes.len()
    }
}

fn build_node(nodes: &mut Vec<BvhNode>, items: &mut [BuildItem], offset: usize) -> usize {
    let bounds = items
        .iter()
        .fold(BoundingBox::empty(), |acc, it| acc.union(&it.bounds));
    let node_index = nodes.len();

    if items.len() <= MAX_LEAF_SIZE {
        nodes.push(BvhNode {
            bounds,
            kind: NodeKind::Leaf {
                start: offset,
                count: items.len(),
            },
        });
        return node_index;
    }

    let axis = BoundingBox::from_points(items.iter().map(|it| &it.centroid)).longest_axis();
    let mid = items.len() / 2;
    items.select_nth_unstable_by(mid, |a, b| a.centroid[axis].total_cmp(&b.centroid[axis]));

    // Reserve the slot so children follow their parent.
    nodes.push(BvhNode {
        bounds,
        kind: NodeKind::Leaf { start: offset, count: 0 },
    });
    let (lower, upper) = items.split_at_mut(mid);
    let left = build_node(nodes, lower, offset);
    let right = build_node(nodes, upper, offset + mid);
    nodes[node_index].kind = NodeKind::Interior { left, right };
    node_index
}

impl ClosestPointIndex for TriangleBvh {
    fn closest_point(&self, query: &Point3) -> Option<ClosestPoint> {
        let root = self.nodes.first()?;
        let mut best: Option<ClosestPoint> = None;
        let mut best_d = f64::INFINITY;
        let mut stack = vec![(0usize, root.bounds.distance_squared(query))];

        while let Some((index, box_d)) = stack.pop() {
            if box_d >= best_d {
                continue;
            }
            match self.nodes[index].kind {
                NodeKind::Leaf { start, count } => {
                    for i in start..start + count {
                        let point = self.triangles[i].closest_point(query);
                        let d = (point - query).norm_squared();
                        if d < best_d {
                            best_d = d;
                            best = Some(ClosestPoint {
                                point,
                                distance_squared: d,
                                primitive: self.ids[i],
                            });
                        }
                    }
                }
                NodeKind::Interior { left, right } => {
                    let dl = self.nodes[left].bounds.distance_squared(query);
                    let dr = self.nodes[right].bounds.distance_squared(query);
                    // Nearer child is popped first.
                    if dl <= dr {
                        stack.push((right, dr));
                        stack.push((left, dl));
                    } else {
                        stack.push((left, dl));
                        stack.push((right, dr));
                    }
                }
            }
        }

        best
    }

    fn len(&self) -> usize {
        self.triangles.len()
    }
}
