//! Cube-face cell tree answering point containment.
//!
//! The sphere is covered by the six face cells of `s2`, each subdivided as a
//! quadtree of [`Cell`]s. Cell boundaries are straight lines in the face's
//! `(u, v)` coordinates and so are great-circle arcs, which lets edges be
//! clipped to cells with plain 2D arithmetic.
//!
//! Each leaf lists, per shape, the edges that may touch the cell together
//! with whether the shape contains the cell's *anchor*, a fixed interior
//! point. Containment of a query point then only needs the edges of one leaf:
//! start from the anchor's known state and flip it for every edge crossed on
//! the way to the point. Anchor states are derived top-down while the tree is
//! built, by the same crossing parity from the parent's anchor.
//!
//! A cell splits while it holds more than `max_edges_per_cell` edges that are
//! short compared to the cell. Edges at least as long as the cell stop
//! counting, so cells around shared vertices and duplicated boundaries stop
//! splitting once they are smaller than the edges meeting there.

use crate::compute::sphere::{Point, crosses_half_open, on_edge};
use crate::config::IndexConfig;
use crate::index::{IndexedEdge, ShapeId};
use s2::cell::Cell;
use s2::cellid::{CellID, MAX_LEVEL, NUM_FACES};
use s2::metric::AVG_EDGEMETRIC;
use s2::r2::point::Point as UvPoint;
use s2::r2::rect::Rect;
use s2::r3::vector::Vector;
use smallvec::SmallVec;
use std::ops::Range;

/// Slack, in face coordinates, added around a cell when assigning edges.
const CELL_PADDING: f64 = 1e-9;

/// Fractional position of the anchor inside its cell. Off-centre so that
/// anchors never line up with vertices digitized on round coordinates.
const ANCHOR_U: f64 = 0.5 + 0.0130817;
const ANCHOR_V: f64 = 0.5 - 0.0088439;

/// Point on the cube surface for face coordinates `(u, v)`.
fn face_uv_to_xyz(face: u8, u: f64, v: f64) -> Vector {
    match face {
        0 => Vector::new(1.0, u, v),
        1 => Vector::new(-u, 1.0, v),
        2 => Vector::new(-u, -v, 1.0),
        3 => Vector::new(-1.0, -v, -u),
        4 => Vector::new(v, -1.0, -u),
        _ => Vector::new(v, u, -1.0),
    }
}

/// `p` in the frame of `face` as `(u·w, v·w, w)`, where `w` is the component
/// along the face axis.
fn face_uvw(face: u8, p: &Vector) -> [f64; 3] {
    match face {
        0 => [p.y, p.z, p.x],
        1 => [-p.x, p.z, p.y],
        2 => [-p.x, -p.y, p.z],
        3 => [-p.z, -p.y, -p.x],
        4 => [-p.z, p.x, -p.y],
        _ => [p.y, p.x, -p.z],
    }
}

/// Narrow `range` to the parameters `t` where `f0 + t * (f1 - f0) <= 0`.
/// False once the range is empty.
fn clip_param(f0: f64, f1: f64, range: &mut (f64, f64)) -> bool {
    if f0 > 0.0 && f1 > 0.0 {
        return false;
    }
    if f0 > 0.0 {
        range.0 = range.0.max(f0 / (f0 - f1));
    } else if f1 > 0.0 {
        range.1 = range.1.min(f0 / (f0 - f1));
    }
    range.0 <= range.1
}

/// Part of an edge inside a cell, in the cell's face coordinates.
#[derive(Debug, Clone, Copy)]
struct UvSegment {
    a: UvPoint,
    b: UvPoint,
}

impl UvSegment {
    /// The part of edge `a -> b` on `face` that falls inside `rect`.
    ///
    /// Every point of the arc is a positive multiple of a point on the chord
    /// `a + t (b - a)`, and the face projection is linear in homogeneous
    /// coordinates, so the clip reduces to four linear constraints on `t`.
    /// Together they also force `w >= 0`, which drops the far hemisphere.
    fn clip_edge(face: u8, a: &Point, b: &Point, rect: &Rect) -> Option<Self> {
        let pa = face_uvw(face, &a.0);
        let pb = face_uvw(face, &b.0);
        let mut range = (0.0, 1.0);
        let inside = clip_param(
            pa[0] - rect.x.hi * pa[2],
            pb[0] - rect.x.hi * pb[2],
            &mut range,
        ) && clip_param(
            rect.x.lo * pa[2] - pa[0],
            rect.x.lo * pb[2] - pb[0],
            &mut range,
        ) && clip_param(
            pa[1] - rect.y.hi * pa[2],
            pb[1] - rect.y.hi * pb[2],
            &mut range,
        ) && clip_param(
            rect.y.lo * pa[2] - pa[1],
            rect.y.lo * pb[2] - pb[1],
            &mut range,
        );
        if !inside {
            return None;
        }

        let at = |t: f64| {
            let [u, v, w] = [0, 1, 2].map(|k| pa[k] + t * (pb[k] - pa[k]));
            UvPoint::new(u / w, v / w)
        };
        Some(Self {
            a: at(range.0),
            b: at(range.1),
        })
    }

    /// The part of this segment inside `rect`.
    fn clip(&self, rect: &Rect) -> Option<Self> {
        let (a, b) = (self.a, self.b);
        let mut range = (0.0, 1.0);
        let inside = clip_param(a.x - rect.x.hi, b.x - rect.x.hi, &mut range)
            && clip_param(rect.x.lo - a.x, rect.x.lo - b.x, &mut range)
            && clip_param(a.y - rect.y.hi, b.y - rect.y.hi, &mut range)
            && clip_param(rect.y.lo - a.y, rect.y.lo - b.y, &mut range);
        if !inside {
            return None;
        }

        let at = |t: f64| UvPoint::new(a.x + t * (b.x - a.x), a.y + t * (b.y - a.y));
        Some(Self {
            a: at(range.0),
            b: at(range.1),
        })
    }

    fn bound(&self) -> Rect {
        Rect::from_points(&[self.a, self.b])
    }
}

/// Fixed interior point of a cell, in face coordinates and on the sphere.
#[derive(Debug, Clone, Copy)]
struct Anchor {
    uv: UvPoint,
    point: Point,
}

impl Anchor {
    fn of(cell: &Cell) -> Self {
        let bound = cell.bound_uv();
        let uv = UvPoint::new(
            bound.x.lo + bound.x.len() * ANCHOR_U,
            bound.y.lo + bound.y.len() * ANCHOR_V,
        );
        Self {
            uv,
            point: Point(face_uv_to_xyz(cell.face(), uv.x, uv.y).normalize()),
        }
    }
}

/// First level whose cells are no longer than `edge` scaled by `ratio`.
/// Below it the edge no longer counts towards splitting a cell.
fn edge_max_level(edge: &IndexedEdge, ratio: f64) -> u8 {
    let size = (edge.a - edge.b).norm() * ratio;
    if size > 0.0 {
        AVG_EDGEMETRIC.min_level(size) as u8
    } else {
        MAX_LEVEL as u8
    }
}

/// One shape's share of a cell.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct ClippedShape {
    pub shape: ShapeId,
    /// Whether the shape contains the cell's anchor.
    pub contains_anchor: bool,
    /// Global edge ids that may touch the cell. Empty when the cell lies
    /// entirely inside the shape.
    pub edges: Vec<u32>,
}

#[derive(Debug, Clone)]
enum CellNode {
    /// Children in `s2` child position order.
    Branch([u32; 4]),
    Leaf(SmallVec<[ClippedShape; 2]>),
}

/// Quadtrees for the six cube faces, stored in one arena.
#[derive(Debug, Clone)]
pub(crate) struct CellTree {
    nodes: Vec<CellNode>,
    faces: [u32; NUM_FACES as usize],
    max_depth: u8,
}

#[derive(Debug, Clone, Copy)]
struct ClippedEdge {
    edge: u32,
    segment: UvSegment,
}

/// A shape's share of a cell while the tree is built.
#[derive(Debug, Clone)]
struct PendingShape {
    shape: ShapeId,
    contains_anchor: bool,
    edges: Vec<ClippedEdge>,
}

impl PendingShape {
    fn finish(self) -> ClippedShape {
        ClippedShape {
            shape: self.shape,
            contains_anchor: self.contains_anchor,
            edges: self.edges.into_iter().map(|clipped| clipped.edge).collect(),
        }
    }
}

struct TreeBuilder<'a> {
    edges: &'a [IndexedEdge],
    edge_max_levels: Vec<u8>,
    max_edges_per_cell: usize,
    max_cell_level: u8,
    nodes: Vec<CellNode>,
    max_depth: u8,
}

impl CellTree {
    /// Build the tree over `shapes`, each given as its range of ids in
    /// `edges`. `contains(shape, point)` answers containment directly and is
    /// only consulted for the anchor of each face.
    pub fn build<F>(
        edges: &[IndexedEdge],
        shapes: &[Range<u32>],
        config: &IndexConfig,
        contains: F,
    ) -> Self
    where
        F: Fn(usize, &Point) -> bool,
    {
        let mut builder = TreeBuilder {
            edges,
            edge_max_levels: edges
                .iter()
                .map(|edge| edge_max_level(edge, config.long_edge_ratio))
                .collect(),
            max_edges_per_cell: config.max_edges_per_cell,
            max_cell_level: config.max_cell_level,
            nodes: Vec::new(),
            max_depth: 0,
        };

        let mut faces = [0u32; NUM_FACES as usize];
        for (face, slot) in faces.iter_mut().enumerate() {
            let cell = Cell::from(CellID::from_face(face as u64));
            let anchor = Anchor::of(&cell);
            let rect = cell.bound_uv().expanded_by_margin(CELL_PADDING);
            let mut entries = Vec::new();
            for (shape, range) in shapes.iter().enumerate() {
                let face_edges: Vec<ClippedEdge> = range
                    .clone()
                    .filter_map(|e| {
                        let edge = &edges[e as usize];
                        UvSegment::clip_edge(cell.face(), &edge.a, &edge.b, &rect)
                            .map(|segment| ClippedEdge { edge: e, segment })
                    })
                    .collect();
                let contains_anchor = contains(shape, &anchor.point);
                if contains_anchor || !face_edges.is_empty() {
                    entries.push(PendingShape {
                        shape: ShapeId(shape as u32),
                        contains_anchor,
                        edges: face_edges,
                    });
                }
            }
            *slot = builder.build_cell(cell, anchor, entries);
        }

        CellTree {
            nodes: builder.nodes,
            faces,
            max_depth: builder.max_depth,
        }
    }

    pub fn num_cells(&self) -> usize {
        self.nodes.len()
    }

    pub fn max_depth(&self) -> u8 {
        self.max_depth
    }

    /// Shapes whose interior contains `p`, excluding shapes with `p` on their
    /// boundary. Ascending by id.
    pub fn containing(&self, p: &Point, edges: &[IndexedEdge]) -> Vec<ShapeId> {
        let leaf = CellID::from(p);
        let mut id = CellID::from_face(u64::from(leaf.face()));
        let mut node = self.faces[leaf.face() as usize];

        let entries = loop {
            match &self.nodes[node as usize] {
                CellNode::Branch(children) => {
                    let k = leaf.child_position(id.level() + 1) as usize;
                    id = id.children()[k];
                    node = children[k];
                }
                CellNode::Leaf(entries) => break entries,
            }
        };

        // Entries keep the shape order of the face roots.
        let anchor = Anchor::of(&Cell::from(id)).point;
        entries
            .iter()
            .filter(|entry| {
                let mut inside = entry.contains_anchor;
                for &e in &entry.edges {
                    let edge = &edges[e as usize];
                    if on_edge(p, &edge.a, &edge.b) {
                        return false;
                    }
                    if crosses_half_open(&anchor, p, &edge.a, &edge.b) {
                        inside = !inside;
                    }
                }
                inside
            })
            .map(|entry| entry.shape)
            .collect()
    }
}

impl TreeBuilder<'_> {
    fn build_cell(&mut self, cell: Cell, anchor: Anchor, entries: Vec<PendingShape>) -> u32 {
        let level = cell.level();
        self.max_depth = self.max_depth.max(level);

        let children = if level < self.max_cell_level && self.needs_split(level, &entries) {
            cell.children()
        } else {
            None
        };
        let Some(children) = children else {
            let leaf = entries.into_iter().map(PendingShape::finish).collect();
            self.nodes.push(CellNode::Leaf(leaf));
            return (self.nodes.len() - 1) as u32;
        };

        let slot = self.nodes.len();
        self.nodes.push(CellNode::Branch([0; 4]));

        let mut ids = [0u32; 4];
        for (child, id) in children.into_iter().zip(ids.iter_mut()) {
            let child_anchor = Anchor::of(&child);
            let child_entries = self.clip(&entries, &anchor, &child, &child_anchor);
            *id = self.build_cell(child, child_anchor, child_entries);
        }

        self.nodes[slot] = CellNode::Branch(ids);
        slot as u32
    }

    /// More than `max_edges_per_cell` edges are still short at `level`.
    fn needs_split(&self, level: u8, entries: &[PendingShape]) -> bool {
        let mut short = 0;
        for entry in entries {
            for clipped in &entry.edges {
                if level < self.edge_max_levels[clipped.edge as usize] {
                    short += 1;
                    if short > self.max_edges_per_cell {
                        return true;
                    }
                }
            }
        }
        false
    }

    /// Narrow the parent's entries to `child`, carrying anchor containment
    /// across the path from the parent's anchor.
    fn clip(
        &self,
        entries: &[PendingShape],
        anchor: &Anchor,
        child: &Cell,
        child_anchor: &Anchor,
    ) -> Vec<PendingShape> {
        let rect = child.bound_uv().expanded_by_margin(CELL_PADDING);
        let path =
            Rect::from_points(&[anchor.uv, child_anchor.uv]).expanded_by_margin(CELL_PADDING);

        let mut clipped = Vec::new();
        for entry in entries {
            let mut contains_anchor = entry.contains_anchor;
            let mut edges = Vec::new();
            for parent in &entry.edges {
                let bound = parent.segment.bound();
                if bound.intersects(&path) {
                    let edge = &self.edges[parent.edge as usize];
                    if crosses_half_open(&anchor.point, &child_anchor.point, &edge.a, &edge.b) {
                        contains_anchor = !contains_anchor;
                    }
                }
                if !bound.intersects(&rect) {
                    continue;
                }
                if let Some(segment) = parent.segment.clip(&rect) {
                    edges.push(ClippedEdge {
                        edge: parent.edge,
                        segment,
                    });
                }
            }
            if contains_anchor || !edges.is_empty() {
                clipped.push(PendingShape {
                    shape: entry.shape,
                    contains_anchor,
                    edges,
                });
            }
        }
        clipped
    }
}
