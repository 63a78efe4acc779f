//! Spatial index over spherical polygons.
//!
//! Shapes are inserted into a [`ShapeIndexBuilder`] together with an opaque
//! tag, then frozen into a [`ShapeIndex`]. The built index answers two
//! queries:
//!
//! - [`ShapeIndex::containing_shapes`]: every shape whose interior holds a
//!   point, using a cube-face cell tree.
//! - [`ShapeIndex::nearest_edge_within`]: the shape with the closest boundary
//!   edge, if within a distance bound, using an R*-tree of edge envelopes.
//!
//! A built index is immutable and can be shared between threads.

mod cells;
mod edges;

use crate::compute::polygon::Polygon;
use crate::compute::sphere::{ChordAngle, Point};
use crate::config::IndexConfig;
use cells::CellTree;
use edges::EdgeTree;
use std::ops::Range;
use std::time::Instant;

/// Handle of a shape, assigned in insertion order starting at zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ShapeId(pub u32);

impl ShapeId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// One boundary edge, owned by the shape it came from.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct IndexedEdge {
    pub shape: ShapeId,
    pub a: Point,
    pub b: Point,
}

/// Size and shape of a built index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct IndexStats {
    pub shapes: usize,
    pub edges: usize,
    pub cells: usize,
    pub max_depth: u8,
}

/// Collects shapes before the index is built.
#[derive(Debug, Clone)]
pub struct ShapeIndexBuilder<T> {
    polygons: Vec<Polygon>,
    data: Vec<T>,
    config: IndexConfig,
}

impl<T> ShapeIndexBuilder<T> {
    pub fn new() -> Self {
        Self::with_config(IndexConfig::default())
    }

    pub fn with_config(config: IndexConfig) -> Self {
        Self {
            polygons: Vec::new(),
            data: Vec::new(),
            config,
        }
    }

    /// Add a shape. Overlapping and identical shapes are all kept.
    pub fn insert(&mut self, polygon: Polygon, data: T) -> ShapeId {
        let id = ShapeId(self.polygons.len() as u32);
        self.polygons.push(polygon);
        self.data.push(data);
        id
    }

    pub fn len(&self) -> usize {
        self.polygons.len()
    }

    pub fn is_empty(&self) -> bool {
        self.polygons.is_empty()
    }

    /// Freeze the collected shapes into a queryable index.
    pub fn build(self) -> ShapeIndex<T> {
        let start = Instant::now();
        let mut edges = Vec::new();
        let mut ranges: Vec<Range<u32>> = Vec::with_capacity(self.polygons.len());
        for (i, polygon) in self.polygons.iter().enumerate() {
            let first = edges.len() as u32;
            edges.extend(polygon.edges().map(|(a, b)| IndexedEdge {
                shape: ShapeId(i as u32),
                a: *a,
                b: *b,
            }));
            ranges.push(first..edges.len() as u32);
        }

        let polygons = self.polygons;
        let cells = CellTree::build(&edges, &ranges, &self.config, |shape, p| {
            polygons[shape].contains_point(p)
        });
        let edge_tree = EdgeTree::new(&edges);

        let index = ShapeIndex {
            polygons,
            data: self.data,
            edges,
            cells,
            edge_tree,
        };

        let stats = index.stats();
        log::info!(
            "Built shape index: {} shapes, {} edges, {} cells, depth {} in {:?}",
            stats.shapes,
            stats.edges,
            stats.cells,
            stats.max_depth,
            start.elapsed()
        );
        index
    }
}

impl<T> Default for ShapeIndexBuilder<T> {
    fn default() -> Self {
        Self::new()
    }
}

/// Immutable index over tagged polygons.
#[derive(Debug, Clone)]
pub struct ShapeIndex<T> {
    polygons: Vec<Polygon>,
    data: Vec<T>,
    edges: Vec<IndexedEdge>,
    cells: CellTree,
    edge_tree: EdgeTree,
}

impl<T> ShapeIndex<T> {
    /// Every shape whose interior contains `p`, in ascending id order.
    ///
    /// Boundaries are open: a point on a shape's edge or vertex is not inside
    /// that shape.
    pub fn containing_shapes(&self, p: &Point) -> Vec<ShapeId> {
        self.cells.containing(p, &self.edges)
    }

    /// The shape owning the edge closest to `p`, if that edge is strictly
    /// closer than `limit`. Pass `limit.successor()` to include edges at
    /// exactly `limit`.
    pub fn nearest_edge_within(&self, p: &Point, limit: ChordAngle) -> Option<ShapeId> {
        self.closest_edge_within(p, limit).map(|(shape, _)| shape)
    }

    /// Like [`ShapeIndex::nearest_edge_within`], also returning the distance.
    /// Equally distant edges resolve to the earliest inserted shape.
    pub fn closest_edge_within(
        &self,
        p: &Point,
        limit: ChordAngle,
    ) -> Option<(ShapeId, ChordAngle)> {
        self.edge_tree
            .closest_within(p, limit, &self.edges)
            .map(|(edge, distance)| (self.edges[edge as usize].shape, distance))
    }

    pub fn shape(&self, id: ShapeId) -> Option<&Polygon> {
        self.polygons.get(id.index())
    }

    pub fn data(&self, id: ShapeId) -> Option<&T> {
        self.data.get(id.index())
    }

    /// All shapes with their tags, in id order.
    pub fn iter(&self) -> impl Iterator<Item = (ShapeId, &Polygon, &T)> + '_ {
        self.polygons
            .iter()
            .zip(&self.data)
            .enumerate()
            .map(|(i, (polygon, data))| (ShapeId(i as u32), polygon, data))
    }

    pub fn len(&self) -> usize {
        self.polygons.len()
    }

    pub fn is_empty(&self) -> bool {
        self.polygons.is_empty()
    }

    pub fn num_edges(&self) -> usize {
        self.edges.len()
    }

    pub fn stats(&self) -> IndexStats {
        IndexStats {
            shapes: self.polygons.len(),
            edges: self.edges.len(),
            cells: self.cells.num_cells(),
            max_depth: self.cells.max_depth(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compute::sphere::{
        chord_degrees, chord_from_degrees, point_from_degrees, point_to_coord,
    };
    use geo::Coord;
    use s2::s1::chordangle::STRAIGHT;

    fn square(x0: f64, y0: f64, x1: f64, y1: f64) -> Polygon {
        let ring: Vec<Coord<f64>> = [(x0, y0), (x1, y0), (x1, y1), (x0, y1), (x0, y0)]
            .iter()
            .map(|&(x, y)| Coord { x, y })
            .collect();
        Polygon::from_rings(&[ring]).unwrap()
    }

    /// Circle-ish polygon with many vertices, forcing cell splits.
    fn dense_ring(lon: f64, lat: f64, radius: f64, n: usize) -> Polygon {
        let mut ring: Vec<Coord<f64>> = (0..n)
            .map(|i| {
                let t = i as f64 / n as f64 * std::f64::consts::TAU;
                Coord {
                    x: lon + radius * t.cos(),
                    y: lat + radius * t.sin(),
                }
            })
            .collect();
        ring.push(ring[0]);
        Polygon::from_rings(&[ring]).unwrap()
    }

    /// Square whose sides are split into `n` edges each.
    fn subdivided_square(x0: f64, y0: f64, size: f64, n: usize) -> Polygon {
        let step = size / n as f64;
        let mut ring = Vec::with_capacity(4 * n + 1);
        for i in 0..n {
            ring.push(Coord { x: x0 + step * i as f64, y: y0 });
        }
        for i in 0..n {
            ring.push(Coord { x: x0 + size, y: y0 + step * i as f64 });
        }
        for i in 0..n {
            ring.push(Coord { x: x0 + size - step * i as f64, y: y0 + size });
        }
        for i in 0..n {
            ring.push(Coord { x: x0, y: y0 + size - step * i as f64 });
        }
        ring.push(ring[0]);
        Polygon::from_rings(&[ring]).unwrap()
    }

    fn sp(lon: f64, lat: f64) -> Point {
        point_from_degrees(lon, lat)
    }

    #[test]
    fn test_empty_index() {
        let index: ShapeIndex<()> = ShapeIndexBuilder::new().build();
        assert!(index.is_empty());
        assert!(index.containing_shapes(&sp(0.0, 0.0)).is_empty());
        assert!(
            index
                .nearest_edge_within(&sp(0.0, 0.0), STRAIGHT.successor())
                .is_none()
        );
        assert_eq!(index.stats().cells, 6);
    }

    #[test]
    fn test_insert_assigns_sequential_ids() {
        let mut builder = ShapeIndexBuilder::new();
        assert_eq!(builder.insert(square(0.0, 0.0, 1.0, 1.0), "a"), ShapeId(0));
        assert_eq!(builder.insert(square(0.0, 0.0, 1.0, 1.0), "b"), ShapeId(1));
        let index = builder.build();
        assert_eq!(index.data(ShapeId(1)), Some(&"b"));
        assert!(index.data(ShapeId(2)).is_none());
        assert_eq!(index.num_edges(), 8);
    }

    #[test]
    fn test_overlapping_shapes_all_returned() {
        let mut builder = ShapeIndexBuilder::new();
        builder.insert(square(0.0, 0.0, 20.0, 20.0), "country");
        builder.insert(square(5.0, 5.0, 10.0, 10.0), "province");
        builder.insert(square(30.0, 30.0, 40.0, 40.0), "elsewhere");
        let index = builder.build();

        assert_eq!(
            index.containing_shapes(&sp(7.0, 7.0)),
            vec![ShapeId(0), ShapeId(1)]
        );
        assert_eq!(index.containing_shapes(&sp(15.0, 15.0)), vec![ShapeId(0)]);
        assert!(index.containing_shapes(&sp(-5.0, -5.0)).is_empty());
    }

    #[test]
    fn test_hole_excluded() {
        let outer: Vec<Coord<f64>> = [(0.0, 0.0), (10.0, 0.0), (10.0, 10.0), (0.0, 10.0), (0.0, 0.0)]
            .iter()
            .map(|&(x, y)| Coord { x, y })
            .collect();
        let hole: Vec<Coord<f64>> = [(4.0, 4.0), (6.0, 4.0), (6.0, 6.0), (4.0, 6.0), (4.0, 4.0)]
            .iter()
            .map(|&(x, y)| Coord { x, y })
            .collect();
        let mut builder = ShapeIndexBuilder::new();
        builder.insert(Polygon::from_rings(&[outer, hole]).unwrap(), ());
        let index = builder.build();

        assert_eq!(index.containing_shapes(&sp(2.0, 2.0)), vec![ShapeId(0)]);
        assert!(index.containing_shapes(&sp(5.0, 5.0)).is_empty());
    }

    #[test]
    fn test_shared_edge_is_open_boundary() {
        let mut builder = ShapeIndexBuilder::new();
        builder.insert(square(-10.0, 0.0, 0.0, 10.0), "west");
        builder.insert(square(0.0, 0.0, 10.0, 10.0), "east");
        builder.insert(square(0.0, -10.0, 10.0, 0.0), "south");
        let index = builder.build();

        // On the shared meridian: inside neither.
        assert!(index.containing_shapes(&sp(0.0, 5.0)).is_empty());
        assert!(index.containing_shapes(&sp(0.0, 9.5)).is_empty());
        // On the shared stretch of equator.
        assert!(index.containing_shapes(&sp(5.0, 0.0)).is_empty());
        // At shared vertices.
        assert!(index.containing_shapes(&sp(0.0, 0.0)).is_empty());
        assert!(index.containing_shapes(&sp(10.0, 0.0)).is_empty());

        // The boundary has no width: the closest representable neighbours
        // already fall on one side.
        assert_eq!(index.containing_shapes(&sp(-1e-11, 5.0)), vec![ShapeId(0)]);
        assert_eq!(index.containing_shapes(&sp(1e-11, 5.0)), vec![ShapeId(1)]);
        assert_eq!(index.containing_shapes(&sp(5.0, 1e-11)), vec![ShapeId(1)]);
        assert_eq!(index.containing_shapes(&sp(5.0, -1e-11)), vec![ShapeId(2)]);
    }

    #[test]
    fn test_duplicated_boundaries_stay_shallow() {
        // Two copies of a grid of 5 degree squares with 0.125 degree edges.
        // Every grid line carries four coincident edges and every grid corner
        // sixteen, more than a cell may hold however far it is split.
        let mut builder = ShapeIndexBuilder::new();
        for copy in 0..2 {
            for i in 0..6 {
                for j in 0..4 {
                    let x0 = -15.0 + 5.0 * i as f64;
                    let y0 = -10.0 + 5.0 * j as f64;
                    builder.insert(subdivided_square(x0, y0, 5.0, 40), (copy, i, j));
                }
            }
        }
        let index = builder.build();
        let stats = index.stats();
        assert_eq!(stats.edges, 2 * 24 * 160);

        // Cells at level 10 are smaller than a 0.125 degree edge.
        assert!(stats.max_depth <= 10, "depth {}", stats.max_depth);
        assert!(stats.cells < 200_000, "{} cells", stats.cells);

        for lon in (-15..15).step_by(2) {
            for lat in -10..10 {
                let p = sp(lon as f64 + 0.37, lat as f64 + 0.21);
                let expected: Vec<ShapeId> = index
                    .iter()
                    .filter(|(_, polygon, _)| polygon.contains_point(&p))
                    .map(|(id, _, _)| id)
                    .collect();
                assert_eq!(expected.len(), 2);
                assert_eq!(index.containing_shapes(&p), expected, "at {:?}", point_to_coord(&p));
            }
        }

        // On a grid line between the copies: in none of them.
        assert!(index.containing_shapes(&sp(0.0, 2.5)).is_empty());
        assert!(index.containing_shapes(&sp(0.0, 0.0)).is_empty());
    }

    #[test]
    fn test_dense_shapes_match_brute_force() {
        let mut builder = ShapeIndexBuilder::with_config(
            IndexConfig::default().with_max_edges_per_cell(4),
        );
        builder.insert(dense_ring(0.0, 0.0, 8.0, 200), 0);
        builder.insert(dense_ring(5.0, 3.0, 6.0, 150), 1);
        builder.insert(dense_ring(120.0, -60.0, 15.0, 300), 2);
        builder.insert(dense_ring(-179.0, 80.0, 4.0, 64), 3);
        let index = builder.build();
        assert!(index.stats().max_depth > 2);

        for lon in (-180..180).step_by(7) {
            for lat in (-85..=85).step_by(5) {
                let p = sp(lon as f64 + 0.37, lat as f64 + 0.21);
                let expected: Vec<ShapeId> = index
                    .iter()
                    .filter(|(_, polygon, _)| polygon.contains_point(&p))
                    .map(|(id, _, _)| id)
                    .collect();
                assert_eq!(index.containing_shapes(&p), expected, "at {:?}", point_to_coord(&p));
            }
        }
    }

    #[test]
    fn test_nearest_edge_within() {
        let mut builder = ShapeIndexBuilder::new();
        builder.insert(square(0.0, 0.0, 10.0, 10.0), "near");
        builder.insert(square(20.0, 0.0, 30.0, 10.0), "far");
        let index = builder.build();

        let p = sp(12.0, 5.0);
        assert_eq!(
            index.nearest_edge_within(&p, chord_from_degrees(3.0)),
            Some(ShapeId(0))
        );
        assert!(
            index
                .nearest_edge_within(&p, chord_from_degrees(1.0))
                .is_none()
        );

        let (shape, distance) = index
            .closest_edge_within(&sp(18.5, 5.0), chord_from_degrees(5.0))
            .unwrap();
        assert_eq!(shape, ShapeId(1));
        assert!(chord_degrees(distance) < 1.6);
    }
}
