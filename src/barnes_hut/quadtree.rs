//! Region quadtree over the simulation plane.
//!
//! A node is one of three things:
//! - *empty*: no particle, no children;
//! - *leaf*: exactly one particle, no children;
//! - *internal*: no particle, at least one child.
//!
//! Inserting into a leaf subdivides it into four child cells and pushes both
//! the resident and the incoming particle down. Subdivision creates all four
//! children, so internal nodes routinely carry present-but-empty cells; the
//! aggregation and force passes treat those as zero-mass regions.

use crate::barnes_hut::particle::{ParticleId, ParticleStore};

/// A single cell of the Barnes-Hut quadtree.
///
/// Bounds satisfy `left_x < right_x` and `bot_y < top_y`; the pivot
/// `(center_x, center_y)` splits the cell into the four quadrants held by
/// `top_left` (NW), `top_right` (NE), `bot_left` (SW) and `bot_right` (SE).
/// `total_mass` and `(com_x, com_y)` are filled in by the aggregation pass.
///
/// # Examples
///
/// ```
/// use rs_nbody::barnes_hut::{Particle, ParticleStore, QuadNode};
///
/// let store = ParticleStore::new(vec![Particle::new(0.5, 0.5)]);
/// let mut root = QuadNode::new(-1.0, 1.0, -1.0, 1.0, None);
/// root.insert(0, &store);
/// assert_eq!(root.particle, Some(0));
/// ```
#[derive(Debug, Clone)]
pub struct QuadNode {
    pub left_x: f64,
    pub right_x: f64,
    pub bot_y: f64,
    pub top_y: f64,
    pub center_x: f64,
    pub center_y: f64,
    pub total_mass: f64,
    pub com_x: f64,
    pub com_y: f64,
    pub particle: Option<ParticleId>,
    pub top_left: Option<Box<QuadNode>>,
    pub bot_left: Option<Box<QuadNode>>,
    pub top_right: Option<Box<QuadNode>>,
    pub bot_right: Option<Box<QuadNode>>,
}

impl QuadNode {
    /// Creates a cell with the given bounds, optionally seeded with a particle.
    ///
    /// The pivot is computed as `low + (high - low) / 2`, which avoids the
    /// additive overflow `(low + high) / 2` would hit near the universe
    /// bounds.
    pub fn new(
        left_x: f64,
        right_x: f64,
        bot_y: f64,
        top_y: f64,
        particle: Option<ParticleId>,
    ) -> Self {
        QuadNode {
            left_x,
            right_x,
            bot_y,
            top_y,
            center_x: left_x + (right_x - left_x) / 2.0,
            center_y: bot_y + (top_y - bot_y) / 2.0,
            total_mass: 0.0,
            com_x: 0.0,
            com_y: 0.0,
            particle,
            top_left: None,
            bot_left: None,
            top_right: None,
            bot_right: None,
        }
    }

    /// Creates an empty root spanning the whole representable plane.
    ///
    /// The bounds are the 64-bit integer extremes cast to `f64`, not
    /// infinities, so pivot arithmetic stays finite. Particles at or beyond
    /// those extremes are outside the supported domain.
    pub fn universe() -> Self {
        QuadNode::new(
            i64::MIN as f64,
            i64::MAX as f64,
            i64::MIN as f64,
            i64::MAX as f64,
            None,
        )
    }

    /// Width of the cell, the `S` of the Barnes-Hut opening test.
    pub fn width(&self) -> f64 {
        self.right_x - self.left_x
    }

    /// True when the node has no children (it is empty or a leaf).
    pub fn is_external(&self) -> bool {
        self.top_left.is_none()
            && self.top_right.is_none()
            && self.bot_left.is_none()
            && self.bot_right.is_none()
    }

    pub fn is_empty(&self) -> bool {
        self.particle.is_none() && self.is_external()
    }

    pub fn is_leaf(&self) -> bool {
        self.particle.is_some() && self.is_external()
    }

    /// Inserts a particle into the subtree rooted at this node.
    ///
    /// Positions outside the node's bounds are a precondition violation; the
    /// root must span every particle. Two particles at exactly the same
    /// coordinates can never be separated by subdivision, so coordinates are
    /// assumed distinct.
    ///
    /// # Examples
    ///
    /// ```
    /// use rs_nbody::barnes_hut::{Particle, ParticleStore, QuadNode};
    ///
    /// let store = ParticleStore::new(vec![
    ///     Particle::new(-1.0, -1.0),
    ///     Particle::new(1.0, 1.0),
    /// ]);
    /// let mut root = QuadNode::new(-2.0, 2.0, -2.0, 2.0, None);
    /// root.insert(0, &store);
    /// root.insert(1, &store);
    /// // The colliding leaf subdivided; both particles now live in child cells.
    /// assert!(root.particle.is_none());
    /// assert!(root.bot_left.as_ref().unwrap().is_leaf());
    /// assert!(root.top_right.as_ref().unwrap().is_leaf());
    /// ```
    pub fn insert(&mut self, id: ParticleId, store: &ParticleStore) {
        if self.is_empty() {
            self.particle = Some(id);
            return;
        }

        if let Some(resident) = self.particle {
            // Leaf collision: subdivide, then push the resident down before
            // the newcomer. The particle slot is cleared first so the
            // recursive calls take the internal path.
            self.subdivide();
            self.particle = None;
            self.insert(resident, store);
            self.insert(id, store);
            return;
        }

        // Internal node: route by the quadrant rule (west when x is below the
        // pivot, north when y is at or above it), creating the child on demand.
        let p = store.get(id);
        if p.x < self.center_x && p.y >= self.center_y {
            let (left_x, center_x, center_y, top_y) =
                (self.left_x, self.center_x, self.center_y, self.top_y);
            self.top_left
                .get_or_insert_with(|| {
                    Box::new(QuadNode::new(left_x, center_x, center_y, top_y, None))
                })
                .insert(id, store);
        } else if p.x < self.center_x {
            let (left_x, center_x, bot_y, center_y) =
                (self.left_x, self.center_x, self.bot_y, self.center_y);
            self.bot_left
                .get_or_insert_with(|| {
                    Box::new(QuadNode::new(left_x, center_x, bot_y, center_y, None))
                })
                .insert(id, store);
        } else if p.y >= self.center_y {
            let (center_x, right_x, center_y, top_y) =
                (self.center_x, self.right_x, self.center_y, self.top_y);
            self.top_right
                .get_or_insert_with(|| {
                    Box::new(QuadNode::new(center_x, right_x, center_y, top_y, None))
                })
                .insert(id, store);
        } else {
            let (center_x, right_x, bot_y, center_y) =
                (self.center_x, self.right_x, self.bot_y, self.center_y);
            self.bot_right
                .get_or_insert_with(|| {
                    Box::new(QuadNode::new(center_x, right_x, bot_y, center_y, None))
                })
                .insert(id, store);
        }
    }

    /// Splits the cell into its four quadrants, all initially empty.
    fn subdivide(&mut self) {
        let (cx, cy) = (self.center_x, self.center_y);
        self.top_left = Some(Box::new(QuadNode::new(self.left_x, cx, cy, self.top_y, None)));
        self.bot_left = Some(Box::new(QuadNode::new(self.left_x, cx, self.bot_y, cy, None)));
        self.top_right = Some(Box::new(QuadNode::new(cx, self.right_x, cy, self.top_y, None)));
        self.bot_right = Some(Box::new(QuadNode::new(cx, self.right_x, self.bot_y, cy, None)));
    }

    /// Visits every particle in the subtree in NW, NE, SW, SE leaf order.
    ///
    /// This is the order snapshots are written in and the order particles are
    /// reinserted during a rebuild, so it is kept fixed.
    pub fn for_each_particle<F: FnMut(ParticleId)>(&self, visit: &mut F) {
        if let Some(id) = self.particle {
            visit(id);
        }
        for child in [
            &self.top_left,
            &self.top_right,
            &self.bot_left,
            &self.bot_right,
        ] {
            if let Some(child) = child {
                child.for_each_particle(visit);
            }
        }
    }

    /// Collects every particle id in the subtree in leaf-traversal order.
    pub fn particle_ids(&self) -> Vec<ParticleId> {
        let mut ids = Vec::new();
        self.for_each_particle(&mut |id| ids.push(id));
        ids
    }
}

/// Reinserts every particle of `old` into the fresh root `new_root`.
///
/// Used after a position phase: the old tree still indexes every particle,
/// but at stale coordinates, so each leaf's particle is rerouted through the
/// new root at its updated position. The old tree is discarded by the caller
/// afterwards.
pub fn recreate_with_new_pos(old: &QuadNode, new_root: &mut QuadNode, store: &ParticleStore) {
    if let Some(id) = old.particle {
        new_root.insert(id, store);
    } else {
        for child in [&old.top_left, &old.top_right, &old.bot_left, &old.bot_right] {
            if let Some(child) = child {
                recreate_with_new_pos(child, new_root, store);
            }
        }
    }
}
