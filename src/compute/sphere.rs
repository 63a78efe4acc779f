//! Unit-sphere geometry on top of the `s2` crate.
//!
//! Points, chord angles and caps are the `s2` types themselves. This module
//! adds the longitude-first conventions of the `geo` crate and the few edge
//! predicates the index needs beyond what `s2` exports:
//!
//! - [`crosses_half_open`] counts boundary crossings with exact parity for
//!   paths that run through a vertex shared by two edges.
//! - [`on_edge`] decides whether a point lies on an edge. It relies on
//!   [`robust_sign`], so only points that are collinear with the edge as far
//!   as the determinant can be resolved qualify.
//! - [`distance_to_edge`] is [`distance_from_segment`] as a [`ChordAngle`],
//!   the form every distance comparison in rgeo uses.

use geo::Coord;
use s2::edgeutil::distance_from_segment;
use s2::latlng::LatLng;
use s2::predicates::{Direction, robust_sign};

pub use s2::cap::Cap;
pub use s2::point::Point;
pub use s2::s1::{Angle, ChordAngle, Deg, Rad};

/// Unit vector for a longitude/latitude pair in degrees.
pub fn point_from_degrees(lon: f64, lat: f64) -> Point {
    Point::from(LatLng::from_degrees(lat, lon))
}

/// Unit vector for a `geo` coordinate (`x` = longitude, `y` = latitude).
pub fn point_from_coord(coord: Coord<f64>) -> Point {
    point_from_degrees(coord.x, coord.y)
}

pub fn point_to_coord(p: &Point) -> Coord<f64> {
    Coord {
        x: p.longitude().deg(),
        y: p.latitude().deg(),
    }
}

/// Chord angle for an angle in degrees. Negative input is treated as zero.
pub fn chord_from_degrees(degrees: f64) -> ChordAngle {
    ChordAngle::from(Deg(degrees.max(0.0)))
}

pub fn chord_degrees(angle: ChordAngle) -> f64 {
    Angle::from(angle).deg()
}

/// True when `c` lies strictly to the left of the directed great circle
/// `a -> b`. Collinear and coincident points are not to the left.
pub fn is_left(a: &Point, b: &Point, c: &Point) -> bool {
    robust_sign(a, b, c) == Direction::CounterClockwise
}

/// Signed turn at `b` when walking `a -> b -> c`; positive for left turns.
pub fn turn_angle(a: &Point, b: &Point, c: &Point) -> f64 {
    let angle = a.cross(b).0.angle(&b.cross(c).0).rad();
    if is_left(a, b, c) { angle } else { -angle }
}

/// Parity-exact crossing test between the path `a -> b` and edge `c -> d`.
///
/// Vertices on the great circle through `a` and `b` count as being on its
/// right-hand side, so a path through the vertex shared by two consecutive
/// edges crosses exactly one of them when the boundary passes over the path
/// and zero or two when it only touches. `a` and `b` must not lie on the
/// edge; see [`on_edge`].
pub fn crosses_half_open(a: &Point, b: &Point, c: &Point, d: &Point) -> bool {
    let c_left = is_left(a, b, c);
    let d_left = is_left(a, b, d);
    if c_left == d_left {
        return false;
    }

    // a and b must sit strictly on opposite sides of the edge's circle, with
    // the orientation that picks the intersection inside both arcs rather
    // than its antipode.
    let a_side = robust_sign(c, d, a);
    let b_side = robust_sign(c, d, b);
    if d_left {
        a_side == Direction::CounterClockwise && b_side == Direction::Clockwise
    } else {
        a_side == Direction::Clockwise && b_side == Direction::CounterClockwise
    }
}

/// True when `p` is a vertex of the edge `a -> b` or lies on the arc between
/// them.
pub fn on_edge(p: &Point, a: &Point, b: &Point) -> bool {
    if p == a || p == b {
        return true;
    }
    if robust_sign(a, b, p) != Direction::Indeterminate {
        return false;
    }
    let n = a.0.cross(&b.0);
    a.0.cross(&p.0).dot(&n) > 0.0 && p.0.cross(&b.0).dot(&n) > 0.0
}

/// Distance from `p` to the closest point of the edge `a -> b`.
pub fn distance_to_edge(p: &Point, a: &Point, b: &Point) -> ChordAngle {
    ChordAngle::from(distance_from_segment(p, a, b))
}
