//! Bounding Volume Hierarchy (BVH) acceleration structure.
//!
//! The tree is stored as a flat arena of nodes. Children are addressed by
//! index, either another node or a primitive in the BVH's own primitive
//! array, so the whole structure is plain owned data that can be shared
//! freely between render threads.

use crate::{HitRecord, Hittable, HittableList, Primitive, Ray};
use blunder_math::{Aabb, Interval};

/// Child slot of a BVH node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BvhChild {
    /// Index into the node arena.
    Node(usize),
    /// Index into the primitive array.
    Primitive(usize),
}

/// Internal node with two children.
///
/// A node built over a single primitive stores it in both slots.
#[derive(Debug, Clone, Copy)]
pub struct BvhNode {
    pub left: BvhChild,
    pub right: BvhChild,
    /// Union of both children's boxes
    pub bbox: Aabb,
}

/// Binary BVH built by median split along the longest axis.
#[derive(Debug, Clone, Default)]
pub struct Bvh {
    primitives: Vec<Primitive>,
    nodes: Vec<BvhNode>,
    root: Option<usize>,
}

impl Bvh {
    /// Build a BVH over the given primitives.
    pub fn new(primitives: Vec<Primitive>) -> Self {
        let mut bvh = Self {
            primitives,
            nodes: Vec::new(),
            root: None,
        };

        if !bvh.primitives.is_empty() {
            let mut indices: Vec<usize> = (0..bvh.primitives.len()).collect();
            bvh.nodes.reserve(bvh.primitives.len());
            let root = build(&bvh.primitives, &mut bvh.nodes, &mut indices);
            bvh.root = Some(root);
        }

        log::debug!(
            "Built BVH: {} primitives, {} nodes, depth {}",
            bvh.primitives.len(),
            bvh.nodes.len(),
            bvh.depth()
        );

        bvh
    }

    pub fn primitives(&self) -> &[Primitive] {
        &self.primitives
    }

    pub fn nodes(&self) -> &[BvhNode] {
        &self.nodes
    }

    pub fn root(&self) -> Option<usize> {
        self.root
    }

    pub fn is_empty(&self) -> bool {
        self.primitives.is_empty()
    }

    /// Number of node levels from the root to the deepest node.
    pub fn depth(&self) -> usize {
        self.root.map_or(0, |root| self.node_depth(root))
    }

    fn node_depth(&self, index: usize) -> usize {
        let node = &self.nodes[index];
        let child_depth = |child: BvhChild| match child {
            BvhChild::Node(i) => self.node_depth(i),
            BvhChild::Primitive(_) => 0,
        };
        1 + child_depth(node.left).max(child_depth(node.right))
    }

    /// Bounding box of a child slot.
    pub fn child_box(&self, child: BvhChild) -> Aabb {
        child_box(&self.primitives, &self.nodes, child)
    }

    fn hit_child(&self, child: BvhChild, ray: &Ray, ray_t: Interval) -> Option<HitRecord> {
        match child {
            BvhChild::Node(i) => self.hit_node(i, ray, ray_t),
            BvhChild::Primitive(i) => self.primitives[i].hit(ray, ray_t),
        }
    }

    fn hit_node(&self, index: usize, ray: &Ray, ray_t: Interval) -> Option<HitRecord> {
        let node = &self.nodes[index];
        if !node.bbox.hit(ray, ray_t) {
            return None;
        }

        let hit_left = self.hit_child(node.left, ray, ray_t);

        // Only check right up to closest hit
        let right_max = hit_left.map_or(ray_t.max, |rec| rec.t);
        let hit_right = self.hit_child(node.right, ray, Interval::new(ray_t.min, right_max));

        hit_right.or(hit_left)
    }
}

impl From<HittableList> for Bvh {
    fn from(list: HittableList) -> Self {
        Self::new(list.into_objects())
    }
}

impl FromIterator<Primitive> for Bvh {
    fn from_iter<I: IntoIterator<Item = Primitive>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}

impl Hittable for Bvh {
    fn hit(&self, ray: &Ray, ray_t: Interval) -> Option<HitRecord> {
        self.root.and_then(|root| self.hit_node(root, ray, ray_t))
    }

    fn bounding_box(&self) -> Aabb {
        self.root.map_or(Aabb::EMPTY, |root| self.nodes[root].bbox)
    }
}

fn child_box(primitives: &[Primitive], nodes: &[BvhNode], child: BvhChild) -> Aabb {
    match child {
        BvhChild::Node(i) => nodes[i].bbox,
        BvhChild::Primitive(i) => primitives[i].bounding_box(),
    }
}

/// Recursive construction over a non-empty range of primitive indices.
///
/// Returns the arena index of the node covering `indices`.
fn build(primitives: &[Primitive], nodes: &mut Vec<BvhNode>, indices: &mut [usize]) -> usize {
    let bounds = indices.iter().fold(Aabb::EMPTY, |acc, &i| {
        Aabb::surrounding(&acc, &primitives[i].bounding_box())
    });
    let axis = bounds.longest_axis();

    // Stable, so equal keys keep their input order
    indices.sort_by(|&a, &b| {
        let a_min = primitives[a].bounding_box().axis_interval(axis).min;
        let b_min = primitives[b].bounding_box().axis_interval(axis).min;
        a_min.total_cmp(&b_min)
    });

    let (left, right) = match indices.len() {
        1 => (BvhChild::Primitive(indices[0]), BvhChild::Primitive(indices[0])),
        2 => (BvhChild::Primitive(indices[0]), BvhChild::Primitive(indices[1])),
        _ => {
            let mid = indices.len() / 2;
            let (lo, hi) = indices.split_at_mut(mid);
            let left = build(primitives, nodes, lo);
            let right = build(primitives, nodes, hi);
            (BvhChild::Node(left), BvhChild::Node(right))
        }
    };

    // Recomputed from the children rather than reusing `bounds`
    let bbox = Aabb::surrounding(
        &child_box(primitives, nodes, left),
        &child_box(primitives, nodes, right),
    );

    nodes.push(BvhNode { left, right, bbox });
    nodes.len() - 1
}
