//! A 3-D k-d tree over points carrying an arbitrary payload.
//!
//! Used to index photon hit positions for the radius searches the radiance
//! estimator performs, but kept generic (and tested) over any
//! [`Positioned`] payload so its correctness can be verified independently
//! of the photon-mapping machinery.

use crate::primitives::Vec3;

/// Anything that can be indexed by a 3-D position.
pub trait Positioned {
    fn position(&self) -> Vec3;
}

impl Positioned for Vec3 {
    fn position(&self) -> Vec3 {
        *self
    }
}

/// The splitting axis at a given tree depth; cycles X -> Y -> Z.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Axis {
    X,
    Y,
    Z,
}

impl Axis {
    fn at_depth(depth: usize) -> Self {
        match depth % 3 {
            0 => Axis::X,
            1 => Axis::Y,
            _ => Axis::Z,
        }
    }

    fn component(self, v: &Vec3) -> f64 {
        match self {
            Axis::X => v.x,
            Axis::Y => v.y,
            Axis::Z => v.z,
        }
    }
}

/// Below this depth, the left sub-build is spawned as a concurrent task;
/// at or below, the build continues sequentially on the current thread.
const CONCURRENT_BUILD_CUTOFF: usize = 3;

struct KdNode<T> {
    position: Vec3,
    split: Axis,
    payload: T,
    left: Option<Box<KdNode<T>>>,
    right: Option<Box<KdNode<T>>>,
}

/// A 3-D binary search tree over the positions of a set of payload values.
pub struct KdTree<T> {
    root: Option<Box<KdNode<T>>>,
    len: usize,
}

impl<T> Default for KdTree<T> {
    fn default() -> Self {
        Self { root: None, len: 0 }
    }
}

impl<T: Positioned + Send> KdTree<T> {
    /// Builds a tree over `items`. The top [`CONCURRENT_BUILD_CUTOFF`] + 1
    /// recursion levels spawn their left sub-build as a rayon task and
    /// join on it; deeper levels build sequentially on the current thread.
    pub fn build(items: Vec<T>) -> Self {
        let len = items.len();
        let root = build_node(items, 0);
        Self { root, len }
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// All payloads whose position lies strictly within radius `r` of
    /// `point` (`distance^2 < r^2`).
    pub fn neighbors(&self, point: Vec3, r: f64) -> Vec<&T> {
        let mut out = Vec::new();
        collect_neighbors(&self.root, point, r, &mut out);
        out
    }

    /// The longest root-to-leaf path. Debug-only (not on the render hot
    /// path), used to sanity-check tree balance after construction.
    pub fn depth(&self) -> usize {
        node_depth(&self.root)
    }
}

fn build_node<T: Positioned + Send>(mut items: Vec<T>, depth: usize) -> Option<Box<KdNode<T>>> {
    if items.is_empty() {
        return None;
    }

    let axis = Axis::at_depth(depth);
    items.sort_by(|a, b| {
        axis.component(&a.position())
            .partial_cmp(&axis.component(&b.position()))
            .expect("photon positions must not contain NaN")
    });

    let mut median = items.len() / 2;
    let median_value = axis.component(&items[median].position());
    while median > 0 && axis.component(&items[median - 1].position()) == median_value {
        median -= 1;
    }

    let right_items = items.split_off(median + 1);
    let pivot = items.pop().expect("median index is always populated");
    let left_items = items;

    let (left, right) = if depth <= CONCURRENT_BUILD_CUTOFF {
        rayon::join(
            || build_node(left_items, depth + 1),
            || build_node(right_items, depth + 1),
        )
    } else {
        (
            build_node(left_items, depth + 1),
            build_node(right_items, depth + 1),
        )
    };

    Some(Box::new(KdNode {
        position: pivot.position(),
        split: axis,
        payload: pivot,
        left,
        right,
    }))
}

fn collect_neighbors<'a, T>(node: &'a Option<Box<KdNode<T>>>, point: Vec3, r: f64, out: &mut Vec<&'a T>) {
    let Some(node) = node else { return };

    if node.position.dist_sqr(&point) < r * r {
        out.push(&node.payload);
    }

    let split_value = node.split.component(&node.position);
    let point_value = node.split.component(&point);

    if split_value > point_value - r {
        collect_neighbors(&node.left, point, r, out);
    }
    if split_value < point_value + r {
        collect_neighbors(&node.right, point, r, out);
    }
}

fn node_depth<T>(node: &Option<Box<KdNode<T>>>) -> usize {
    match node {
        None => 0,
        Some(n) => 1 + node_depth(&n.left).max(node_depth(&n.right)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::{Rng, SeedableRng};
    use rand::rngs::StdRng;

    fn random_points(n: usize, seed: u64) -> Vec<Vec3> {
        let mut rng = StdRng::seed_from_u64(seed);
        (0..n)
            .map(|_| Vec3::new(rng.gen_range(0.0..1.0), rng.gen_range(0.0..1.0), rng.gen_range(0.0..1.0)))
            .collect()
    }

    fn brute_force(points: &[Vec3], query: Vec3, r: f64) -> usize {
        points.iter().filter(|p| p.dist_sqr(&query) < r * r).count()
    }

    #[test]
    fn neighbors_matches_brute_force_on_random_cloud() {
        let points = random_points(2_000, 7);
        let tree = KdTree::build(points.clone());
        let mut rng = StdRng::seed_from_u64(42);

        for _ in 0..200 {
            let query = Vec3::new(rng.gen_range(0.0..1.0), rng.gen_range(0.0..1.0), rng.gen_range(0.0..1.0));
            let r = 0.05;
            let expected = brute_force(&points, query, r);
            let actual = tree.neighbors(query, r).len();
            assert_eq!(actual, expected, "mismatch at query {:?}", query);
        }
    }

    #[test]
    fn empty_tree_has_no_neighbors_and_zero_depth() {
        let tree: KdTree<Vec3> = KdTree::build(Vec::new());
        assert!(tree.neighbors(Vec3::ZERO, 1.0).is_empty());
        assert_eq!(tree.depth(), 0);
        assert!(tree.is_empty());
    }

    #[test]
    fn depth_is_bounded_by_log2_plus_small_constant() {
        let points = random_points(10_000, 11);
        let tree = KdTree::build(points);
        let n = tree.len() as f64;
        let bound = (n + 1.0).log2().ceil() as usize + 8;
        assert!(tree.depth() <= bound, "depth {} exceeded bound {}", tree.depth(), bound);
    }

    #[test]
    fn duplicate_coordinates_on_split_axis_do_not_break_construction() {
        let points = vec![
            Vec3::new(1.0, 0.0, 0.0),
            Vec3::new(1.0, 1.0, 0.0),
            Vec3::new(1.0, 2.0, 0.0),
            Vec3::new(1.0, 3.0, 0.0),
        ];
        let tree = KdTree::build(points.clone());
        assert_eq!(tree.len(), 4);
        assert_eq!(tree.neighbors(Vec3::new(1.0, 1.5, 0.0), 2.0).len(), brute_force(&points, Vec3::new(1.0, 1.5, 0.0), 2.0));
    }
}
