//! 2D k-d tree for spatial indexing
//!
//! Provides O(log n) k-nearest-neighbor queries over the known
//! coordinates of a local kriging model. The tree is built once and never
//! mutated, so shared references can be queried from several threads.
//!
//! Neighbor order is fully deterministic: results are sorted by ascending
//! distance, and equal distances are broken by ascending insertion index.
//!
//! Reference:
//! Bentley, J.L. (1975). Multidimensional binary search trees used
//! for associative searching. CACM, 18(9).

use std::cmp::Ordering;

use super::Coordinate;

/// A 2D k-d tree over a frozen snapshot of coordinates.
#[derive(Debug, Clone)]
pub struct KdTree {
    nodes: Vec<KdNode>,
    /// Coordinates in insertion order; node indices point into this.
    points: Vec<Coordinate>,
}

#[derive(Debug, Clone)]
struct KdNode {
    /// Index into `points`
    point_idx: usize,
    /// Split dimension: 0 = x, 1 = y
    split_dim: u8,
    /// Left child index (None = leaf)
    left: Option<usize>,
    /// Right child index (None = leaf)
    right: Option<usize>,
}

/// Result of a nearest-neighbor query
#[derive(Debug, Clone, Copy)]
pub struct NearestResult {
    /// The matched coordinate
    pub coordinate: Coordinate,
    /// Squared Euclidean distance to the query point
    pub distance_sq: f64,
    /// Position of the coordinate in the slice the tree was built from
    pub index: usize,
}

/// Total order on `(distance², index)` candidates.
#[inline]
fn candidate_cmp(a: &(f64, usize), b: &(f64, usize)) -> Ordering {
    a.0.partial_cmp(&b.0)
        .unwrap_or(Ordering::Equal)
        .then(a.1.cmp(&b.1))
}

impl KdTree {
    /// Build a k-d tree from coordinates.
    ///
    /// Construction is O(n log n) using median-of-coordinate splitting.
    pub fn build(points: &[Coordinate]) -> Self {
        if points.is_empty() {
            return Self {
                nodes: Vec::new(),
                points: Vec::new(),
            };
        }

        let mut indices: Vec<usize> = (0..points.len()).collect();
        let stored_points: Vec<Coordinate> = points.to_vec();
        let mut nodes = Vec::with_capacity(points.len());

        build_recursive(&stored_points, &mut indices, 0, &mut nodes);

        Self {
            nodes,
            points: stored_points,
        }
    }

    /// Number of points in the tree.
    pub fn len(&self) -> usize {
        self.points.len()
    }

    /// Whether the tree is empty.
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// The indexed coordinates, in insertion order.
    pub fn points(&self) -> &[Coordinate] {
        &self.points
    }

    /// Find the k nearest points to (qx, qy).
    ///
    /// Returns `min(k, len)` results sorted by ascending distance, ties
    /// ordered by ascending index. Complexity: O(k log n) average case.
    pub fn k_nearest(&self, qx: f64, qy: f64, k: usize) -> Vec<NearestResult> {
        if self.nodes.is_empty() || k == 0 {
            return Vec::new();
        }

        // Bounded candidate list kept in descending order, so the current
        // worst candidate is always at the front.
        let mut heap: Vec<(f64, usize)> = Vec::with_capacity(k + 1);

        self.knn_recursive(0, qx, qy, k, &mut heap);

        heap.sort_by(candidate_cmp);

        heap.iter()
            .map(|&(dist_sq, idx)| NearestResult {
                coordinate: self.points[idx],
                distance_sq: dist_sq,
                index: idx,
            })
            .collect()
    }

    /// k-nearest query returning parallel `(distances, indices)` vectors,
    /// sorted by ascending distance.
    pub fn query(&self, point: Coordinate, k: usize) -> (Vec<f64>, Vec<usize>) {
        self.k_nearest(point.x, point.y, k)
            .into_iter()
            .map(|r| (r.distance_sq.sqrt(), r.index))
            .unzip()
    }

    fn knn_recursive(
        &self,
        node_idx: usize,
        qx: f64,
        qy: f64,
        k: usize,
        heap: &mut Vec<(f64, usize)>,
    ) {
        let node = &self.nodes[node_idx];
        let p = &self.points[node.point_idx];

        let dx = qx - p.x;
        let dy = qy - p.y;
        let candidate = (dx * dx + dy * dy, node.point_idx);

        if heap.len() < k || candidate_cmp(&candidate, &heap[0]) == Ordering::Less {
            if heap.len() >= k {
                // Drop the current worst candidate
                heap.remove(0);
            }
            let pos = heap
                .binary_search_by(|probe| candidate_cmp(probe, &candidate).reverse())
                .unwrap_or_else(|e| e);
            heap.insert(pos, candidate);
        }

        let diff = if node.split_dim == 0 { dx } else { dy };
        let (first, second) = if diff < 0.0 {
            (node.left, node.right)
        } else {
            (node.right, node.left)
        };

        if let Some(child) = first {
            self.knn_recursive(child, qx, qy, k, heap);
        }

        let threshold = if heap.len() >= k { heap[0].0 } else { f64::MAX };

        // `<=` so that equidistant points with a lower index on the far
        // side of the split are still considered.
        if diff * diff <= threshold {
            if let Some(child) = second {
                self.knn_recursive(child, qx, qy, k, heap);
            }
        }
    }
}

/// Recursively build the k-d tree.
fn build_recursive(
    points: &[Coordinate],
    indices: &mut [usize],
    depth: usize,
    nodes: &mut Vec<KdNode>,
) -> usize {
    let n = indices.len();
    let split_dim = (depth % 2) as u8;

    let axis = |i: usize| if split_dim == 0 { points[i].x } else { points[i].y };
    indices.sort_by(|&a, &b| axis(a).partial_cmp(&axis(b)).unwrap_or(Ordering::Equal));

    let median = n / 2;
    let point_idx = indices[median];

    let node_idx = nodes.len();
    nodes.push(KdNode {
        point_idx,
        split_dim,
        left: None,
        right: None,
    });

    if median > 0 {
        let left_idx = build_recursive(points, &mut indices[..median], depth + 1, nodes);
        nodes[node_idx].left = Some(left_idx);
    }

    if median + 1 < n {
        let right_idx = build_recursive(points, &mut indices[median + 1..], depth + 1, nodes);
        nodes[node_idx].right = Some(right_idx);
    }

    node_idx
}
