//! Spherical loops and polygons, built from GeoJSON-style lon/lat rings.
//!
//! A [`Loop`] bounds the region to the left of its edges. Input rings carry
//! no reliable orientation, so [`Loop::from_ring`] picks one in two steps:
//!
//! 1. **Planar guess**: the shoelace sum over the raw lon/lat coordinates. A
//!    clockwise-looking ring is built in reverse vertex order.
//! 2. **Cap check**: region polygons never span more than a hemisphere, so a
//!    loop whose bounding cap is wider than 90° was oriented the wrong way by
//!    the planar guess (typically near a pole or across the antimeridian) and
//!    is inverted in place.
//!
//! A [`Polygon`] is a list of loops; a point is inside when an odd number of
//! loops contain it, which makes holes (loops nested in an outer loop) and
//! multi-polygons (disjoint outer loops) the same thing.

use crate::compute::sphere::{
    Angle, Cap, Point, Rad, crosses_half_open, is_left, point_from_coord, turn_angle,
};
use crate::error::{Result, RgeoError};
use geo::{Coord, Geometry, MultiPolygon};
use s2::r3::vector::Vector;

/// A closed chain of at least three distinct vertices on the unit sphere.
#[derive(Debug, Clone, PartialEq)]
pub struct Loop {
    vertices: Vec<Point>,
    /// Sum of turning angles; `2π - area` of the interior.
    turning: f64,
    cap: Cap,
}

impl Loop {
    /// Build a loop from vertices already in their final orientation.
    ///
    /// Consecutive duplicates and a trailing copy of the first vertex are
    /// dropped.
    pub fn new(points: Vec<Point>) -> Result<Self> {
        let mut vertices: Vec<Point> = Vec::with_capacity(points.len());
        for point in points {
            if vertices.last() != Some(&point) {
                vertices.push(point);
            }
        }
        while vertices.len() > 1 && vertices.first() == vertices.last() {
            vertices.pop();
        }

        if vertices.len() < 3 {
            return Err(RgeoError::InvalidGeometry(format!(
                "Loop needs at least 3 distinct vertices, got {}",
                vertices.len()
            )));
        }

        let mut lp = Loop {
            vertices,
            turning: 0.0,
            cap: Cap::full(),
        };
        lp.init_bound();
        Ok(lp)
    }

    /// Build a loop from a closed lon/lat ring, choosing the orientation that
    /// bounds the smaller side.
    pub fn from_ring(ring: &[Coord<f64>]) -> Result<Self> {
        let n = ring.len();
        if n < 4 {
            return Err(RgeoError::InvalidGeometry(format!(
                "Ring has {} coordinates, need at least 4",
                n
            )));
        }
        if ring[0] != ring[n - 1] {
            return Err(RgeoError::InvalidGeometry(format!(
                "Ring is not closed: first coordinate {:?} differs from last {:?}",
                ring[0],
                ring[n - 1]
            )));
        }

        let points: Vec<Point> = if is_clockwise(ring) {
            ring[1..].iter().rev().map(|c| point_from_coord(*c)).collect()
        } else {
            ring[..n - 1].iter().map(|c| point_from_coord(*c)).collect()
        };

        let mut lp = Loop::new(points)?;
        if lp.cap_bound().radius().deg() > 90.0 {
            lp.invert();
        }
        Ok(lp)
    }

    fn init_bound(&mut self) {
        let n = self.vertices.len();
        self.turning = (0..n)
            .map(|i| turn_angle(self.vertex(i + n - 1), self.vertex(i), self.vertex(i + 1)))
            .sum();
        self.cap = self.compute_cap();
    }

    fn compute_cap(&self) -> Cap {
        // The interior is the larger side of the boundary.
        if self.turning < 0.0 {
            return Cap::full();
        }

        // Edge midpoints weighted by length keep densely digitized stretches
        // of coastline from dragging the centre towards them.
        let weighted = self.edges().fold(Vector::default(), |acc, (a, b)| {
            acc + (a.0 + b.0) * a.distance(b).rad()
        });
        if weighted.norm2() == 0.0 {
            return Cap::full();
        }

        let center = Point(weighted.normalize());
        let radius = self
            .vertices
            .iter()
            .map(|v| center.distance(v).rad())
            .fold(0.0, f64::max);
        Cap::from_center_angle(&center, &Angle::from(Rad(radius)))
    }

    /// Reverse the orientation, so the loop bounds the other side.
    pub fn invert(&mut self) {
        self.vertices.reverse();
        self.init_bound();
    }

    pub fn vertices(&self) -> &[Point] {
        &self.vertices
    }

    pub fn num_vertices(&self) -> usize {
        self.vertices.len()
    }

    /// Vertex `i`, wrapping around the end of the loop.
    pub fn vertex(&self, i: usize) -> &Point {
        &self.vertices[i % self.vertices.len()]
    }

    /// Edges in order, the last one closing back to the first vertex.
    pub fn edges(&self) -> impl Iterator<Item = (&Point, &Point)> + '_ {
        (0..self.vertices.len()).map(move |i| (self.vertex(i), self.vertex(i + 1)))
    }

    pub fn cap_bound(&self) -> &Cap {
        &self.cap
    }

    /// Sum of the turning angles at every vertex, in radians.
    pub fn turning_angle(&self) -> f64 {
        self.turning
    }

    /// True when the interior is the smaller of the two sides.
    pub fn is_normalized(&self) -> bool {
        self.turning >= 0.0
    }

    /// Brute-force containment test over every edge.
    ///
    /// Counts boundary crossings along the path from the midpoint of the edge
    /// whose great circle lies farthest from `p`; just off that edge the
    /// interior is known to be on its left. The result is unspecified for
    /// points on the boundary.
    pub fn contains_point(&self, p: &Point) -> bool {
        let n = self.vertices.len();

        let mut reference = 0;
        let mut best_score = -1.0;
        for i in 0..n {
            let normal = self.vertex(i).0.cross(&self.vertex(i + 1).0);
            let len = normal.norm();
            if len == 0.0 {
                continue;
            }
            let score = (normal.dot(&p.0) / len).abs();
            if score > best_score {
                best_score = score;
                reference = i;
            }
        }

        let (a, b) = (self.vertex(reference), self.vertex(reference + 1));
        let start = (*a + *b).normalize();
        let mut inside = is_left(a, b, p);
        for i in 0..n {
            if i != reference && crosses_half_open(&start, p, self.vertex(i), self.vertex(i + 1)) {
                inside = !inside;
            }
        }
        inside
    }
}

/// Planar shoelace test on raw lon/lat coordinates; true for rings that
/// look clockwise. Wrong near the poles and across the antimeridian.
pub fn is_clockwise(ring: &[Coord<f64>]) -> bool {
    let n = ring.len();
    let area: f64 = (0..n)
        .map(|i| {
            let p1 = ring[i];
            let p2 = ring[(i + 1) % n];
            (p2.x - p1.x) * (p1.y + p2.y)
        })
        .sum();
    area > 0.0
}

/// One or more loops; the interior is covered by an odd number of them.
#[derive(Debug, Clone, PartialEq)]
pub struct Polygon {
    loops: Vec<Loop>,
}

impl Polygon {
    pub fn from_loops(loops: Vec<Loop>) -> Result<Self> {
        if loops.is_empty() {
            return Err(RgeoError::InvalidGeometry(
                "Polygon must have at least one loop".to_string(),
            ));
        }
        Ok(Self { loops })
    }

    /// Build from the rings of a single polygon: the outer boundary followed
    /// by its holes.
    pub fn from_rings<R: AsRef<[Coord<f64>]>>(rings: &[R]) -> Result<Self> {
        let loops = loops_from_rings(rings)?;
        Self::from_loops(loops)
    }

    /// Build from several polygons' rings, concatenating all their loops.
    pub fn from_multi_rings<R: AsRef<[Coord<f64>]>>(polygons: &[Vec<R>]) -> Result<Self> {
        let mut loops = Vec::new();
        for rings in polygons {
            loops.extend(loops_from_rings(rings)?);
        }
        Self::from_loops(loops)
    }

    pub fn from_geo_polygon(polygon: &geo::Polygon<f64>) -> Result<Self> {
        Self::from_loops(loops_from_geo_polygon(polygon)?)
    }

    pub fn from_geo_multi_polygon(multi: &MultiPolygon<f64>) -> Result<Self> {
        let mut loops = Vec::new();
        for polygon in &multi.0 {
            loops.extend(loops_from_geo_polygon(polygon)?);
        }
        Self::from_loops(loops)
    }

    /// Build from any areal `geo` geometry. Points, lines and collections are
    /// rejected with [`RgeoError::UnsupportedGeometry`].
    pub fn from_geometry(geometry: &Geometry<f64>) -> Result<Self> {
        match geometry {
            Geometry::Polygon(p) => Self::from_geo_polygon(p),
            Geometry::MultiPolygon(mp) => Self::from_geo_multi_polygon(mp),
            Geometry::Rect(r) => Self::from_geo_polygon(&r.to_polygon()),
            Geometry::Triangle(t) => Self::from_geo_polygon(&t.to_polygon()),
            other => Err(RgeoError::UnsupportedGeometry(format!(
                "Needs Polygon or MultiPolygon, got {}",
                geometry_kind(other)
            ))),
        }
    }

    pub fn loops(&self) -> &[Loop] {
        &self.loops
    }

    pub fn num_loops(&self) -> usize {
        self.loops.len()
    }

    pub fn num_vertices(&self) -> usize {
        self.loops.iter().map(Loop::num_vertices).sum()
    }

    /// Every edge of every loop, loop by loop.
    pub fn edges(&self) -> impl Iterator<Item = (&Point, &Point)> + '_ {
        self.loops.iter().flat_map(Loop::edges)
    }

    /// Brute-force containment: parity of the loops containing `p`.
    pub fn contains_point(&self, p: &Point) -> bool {
        self.loops
            .iter()
            .filter(|lp| lp.contains_point(p))
            .count()
            % 2
            == 1
    }
}

fn loops_from_rings<R: AsRef<[Coord<f64>]>>(rings: &[R]) -> Result<Vec<Loop>> {
    rings.iter().map(|ring| Loop::from_ring(ring.as_ref())).collect()
}

fn loops_from_geo_polygon(polygon: &geo::Polygon<f64>) -> Result<Vec<Loop>> {
    let mut loops = Vec::with_capacity(1 + polygon.interiors().len());
    loops.push(Loop::from_ring(&polygon.exterior().0)?);
    for interior in polygon.interiors() {
        loops.push(Loop::from_ring(&interior.0)?);
    }
    Ok(loops)
}

fn geometry_kind(geometry: &Geometry<f64>) -> &'static str {
    match geometry {
        Geometry::Point(_) => "Point",
        Geometry::Line(_) => "Line",
        Geometry::LineString(_) => "LineString",
        Geometry::Polygon(_) => "Polygon",
        Geometry::MultiPoint(_) => "MultiPoint",
        Geometry::MultiLineString(_) => "MultiLineString",
        Geometry::MultiPolygon(_) => "MultiPolygon",
        Geometry::GeometryCollection(_) => "GeometryCollection",
        Geometry::Rect(_) => "Rect",
        Geometry::Triangle(_) => "Triangle",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compute::sphere::point_from_degrees;
    use geo::{LineString, coord, polygon};

    fn ring(coords: &[(f64, f64)]) -> Vec<Coord<f64>> {
        coords.iter().map(|&(x, y)| Coord { x, y }).collect()
    }

    fn square(x0: f64, y0: f64, x1: f64, y1: f64) -> Vec<Coord<f64>> {
        ring(&[(x0, y0), (x1, y0), (x1, y1), (x0, y1), (x0, y0)])
    }

    fn sp(lon: f64, lat: f64) -> Point {
        point_from_degrees(lon, lat)
    }

    #[test]
    fn test_ring_too_short() {
        let err = Loop::from_ring(&ring(&[(0.0, 0.0), (1.0, 0.0), (0.0, 0.0)])).unwrap_err();
        assert!(matches!(err, RgeoError::InvalidGeometry(_)));
    }

    #[test]
    fn test_ring_not_closed() {
        let err = Loop::from_ring(&ring(&[(0.0, 0.0), (1.0, 0.0), (1.0, 1.0), (0.0, 1.0)]))
            .unwrap_err();
        assert!(matches!(err, RgeoError::InvalidGeometry(_)));
    }

    #[test]
    fn test_ring_with_repeated_vertices_is_degenerate() {
        let err = Loop::from_ring(&ring(&[(0.0, 0.0), (1.0, 0.0), (1.0, 0.0), (0.0, 0.0)]))
            .unwrap_err();
        assert!(matches!(err, RgeoError::InvalidGeometry(_)));
    }

    #[test]
    fn test_closing_vertex_dropped() {
        let lp = Loop::from_ring(&square(0.0, 0.0, 10.0, 10.0)).unwrap();
        assert_eq!(lp.num_vertices(), 4);
        assert_ne!(lp.vertices().first(), lp.vertices().last());
    }

    #[test]
    fn test_orientation_independent_of_winding() {
        let ccw = square(0.0, 0.0, 10.0, 10.0);
        let mut cw = ccw.clone();
        cw.reverse();
        assert!(!is_clockwise(&ccw));
        assert!(is_clockwise(&cw));

        for r in [ccw, cw] {
            let lp = Loop::from_ring(&r).unwrap();
            assert!(lp.is_normalized());
            assert!(lp.cap_bound().radius().deg() <= 90.0);
            assert!(lp.contains_point(&sp(5.0, 5.0)));
            assert!(!lp.contains_point(&sp(15.0, 5.0)));
            assert!(!lp.contains_point(&sp(-170.0, -40.0)));
        }
    }

    #[test]
    fn test_antimeridian_ring_corrected_by_cap() {
        // Planar shoelace sees a 340° wide box; on the sphere it is 20° wide.
        let r = ring(&[
            (170.0, 0.0),
            (-170.0, 0.0),
            (-170.0, 10.0),
            (170.0, 10.0),
            (170.0, 0.0),
        ]);
        let lp = Loop::from_ring(&r).unwrap();
        assert!(lp.cap_bound().radius().deg() <= 90.0);
        assert!(lp.contains_point(&sp(180.0, 5.0)));
        assert!(lp.contains_point(&sp(-175.0, 5.0)));
        assert!(!lp.contains_point(&sp(0.0, 5.0)));
    }

    #[test]
    fn test_polar_ring() {
        // A ring circling the north pole at 80°N.
        let r = ring(&[
            (0.0, 80.0),
            (90.0, 80.0),
            (180.0, 80.0),
            (-90.0, 80.0),
            (0.0, 80.0),
        ]);
        let lp = Loop::from_ring(&r).unwrap();
        assert!(lp.cap_bound().radius().deg() <= 90.0);
        assert!(lp.contains_point(&sp(45.0, 89.0)));
        assert!(!lp.contains_point(&sp(45.0, 0.0)));
    }

    #[test]
    fn test_invert_swaps_sides() {
        let mut lp = Loop::from_ring(&square(0.0, 0.0, 10.0, 10.0)).unwrap();
        let inside = sp(5.0, 5.0);
        let outside = sp(50.0, -20.0);
        lp.invert();
        assert!(!lp.is_normalized());
        assert!(lp.cap_bound().is_full());
        assert!(!lp.contains_point(&inside));
        assert!(lp.contains_point(&outside));
    }

    #[test]
    fn test_polygon_with_hole() {
        let poly = Polygon::from_rings(&[
            square(0.0, 0.0, 10.0, 10.0),
            square(4.0, 4.0, 6.0, 6.0),
        ])
        .unwrap();
        assert_eq!(poly.num_loops(), 2);
        assert_eq!(poly.num_vertices(), 8);
        assert!(poly.contains_point(&sp(2.0, 2.0)));
        assert!(!poly.contains_point(&sp(5.0, 5.0)));
        assert!(!poly.contains_point(&sp(12.0, 5.0)));
    }

    #[test]
    fn test_multi_polygon_concatenates_loops() {
        let poly = Polygon::from_multi_rings(&[
            vec![square(0.0, 0.0, 1.0, 1.0)],
            vec![square(10.0, 10.0, 11.0, 11.0), square(10.2, 10.2, 10.8, 10.8)],
        ])
        .unwrap();
        assert_eq!(poly.num_loops(), 3);
        assert!(poly.contains_point(&sp(0.5, 0.5)));
        assert!(poly.contains_point(&sp(10.1, 10.1)));
        assert!(!poly.contains_point(&sp(10.5, 10.5)));
    }

    #[test]
    fn test_from_geometry() {
        let geo_poly = polygon![
            (x: 0.0, y: 0.0),
            (x: 5.0, y: 0.0),
            (x: 5.0, y: 5.0),
            (x: 0.0, y: 5.0),
        ];
        let poly = Polygon::from_geometry(&Geometry::Polygon(geo_poly.clone())).unwrap();
        assert_eq!(poly.num_loops(), 1);
        assert_eq!(poly.num_vertices(), 4);

        let multi = MultiPolygon::new(vec![geo_poly]);
        assert!(Polygon::from_geometry(&Geometry::MultiPolygon(multi)).is_ok());

        let point = Geometry::Point(geo::Point::new(1.0, 1.0));
        assert!(matches!(
            Polygon::from_geometry(&point),
            Err(RgeoError::UnsupportedGeometry(_))
        ));

        let line = Geometry::LineString(LineString::new(vec![
            coord! { x: 0.0, y: 0.0 },
            coord! { x: 1.0, y: 1.0 },
        ]));
        assert!(matches!(
            Polygon::from_geometry(&line),
            Err(RgeoError::UnsupportedGeometry(_))
        ));
    }

    #[test]
    fn test_empty_polygon_rejected() {
        let rings: Vec<Vec<Coord<f64>>> = Vec::new();
        assert!(matches!(
            Polygon::from_rings(&rings),
            Err(RgeoError::InvalidGeometry(_))
        ));
    }
}
