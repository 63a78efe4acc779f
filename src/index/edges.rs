//! R*-tree over edge envelopes for nearest-boundary queries.
//!
//! Each edge is boxed by the axis-aligned bounds of its endpoints in 3D,
//! widened by the arc's sagitta so the box also holds the bulge of the great
//! circle between them. A query within angle `r` of `p` only has to look at
//! edges whose box meets the cube of half-width `chord(r)` around `p`.

use crate::compute::sphere::{ChordAngle, Point, distance_to_edge};
use crate::index::IndexedEdge;
use rstar::{AABB, RTree, RTreeObject};
use s2::s1::chordangle::STRAIGHT;

/// Bounding box of one edge.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct EdgeEnvelope {
    pub edge: u32,
    min: [f64; 3],
    max: [f64; 3],
}

impl EdgeEnvelope {
    fn new(edge: u32, a: &Point, b: &Point) -> Self {
        let half_angle = 0.5 * a.distance(b).rad();
        let bulge = 1.0 - half_angle.cos();
        let (a, b) = (coords(a), coords(b));
        let mut min = [0.0; 3];
        let mut max = [0.0; 3];
        for i in 0..3 {
            min[i] = a[i].min(b[i]) - bulge;
            max[i] = a[i].max(b[i]) + bulge;
        }
        Self { edge, min, max }
    }
}

fn coords(p: &Point) -> [f64; 3] {
    [p.0.x, p.0.y, p.0.z]
}

impl RTreeObject for EdgeEnvelope {
    type Envelope = AABB<[f64; 3]>;

    fn envelope(&self) -> Self::Envelope {
        AABB::from_corners(self.min, self.max)
    }
}

#[derive(Debug, Clone)]
pub(crate) struct EdgeTree {
    tree: RTree<EdgeEnvelope>,
}

impl EdgeTree {
    pub fn new(edges: &[IndexedEdge]) -> Self {
        let envelopes = edges
            .iter()
            .enumerate()
            .map(|(id, edge)| EdgeEnvelope::new(id as u32, &edge.a, &edge.b))
            .collect();
        Self {
            tree: RTree::bulk_load(envelopes),
        }
    }

    /// The edge closest to `p` among those strictly closer than `limit`, with
    /// its distance. Ties go to the lowest edge id.
    pub fn closest_within(
        &self,
        p: &Point,
        limit: ChordAngle,
        edges: &[IndexedEdge],
    ) -> Option<(u32, ChordAngle)> {
        let reach = limit.0.clamp(0.0, STRAIGHT.0).sqrt();
        let center = coords(p);
        let query = AABB::from_corners(
            [center[0] - reach, center[1] - reach, center[2] - reach],
            [center[0] + reach, center[1] + reach, center[2] + reach],
        );

        self.tree
            .locate_in_envelope_intersecting(&query)
            .filter_map(|envelope| {
                let edge = &edges[envelope.edge as usize];
                let distance = distance_to_edge(p, &edge.a, &edge.b);
                (distance < limit).then_some((envelope.edge, distance))
            })
            .min_by(|(ea, da), (eb, db)| da.0.total_cmp(&db.0).then(ea.cmp(eb)))
    }
}
