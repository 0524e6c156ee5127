//! Board geometry: integer points, closed contours made of line and arc
//! segments, and polygon sets with holes.
//!
//! Coordinates are board internal units (nanometres) with the Y axis pointing
//! down. Angles are degrees, counter-clockwise as seen on screen.

use serde::{Deserialize, Serialize};
use std::f64::consts::PI;
use std::ops::{Add, Neg, Sub};

/// Point in board internal units
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize,
)]
pub struct Point {
    pub x: i64,
    pub y: i64,
}

impl Point {
    pub const fn new(x: i64, y: i64) -> Self {
        Self { x, y }
    }

    /// Rotate around the origin by `deg` (counter-clockwise on screen)
    pub fn rotated(self, deg: f64) -> Self {
        if deg == 0.0 {
            return self;
        }
        let (s, c) = deg.to_radians().sin_cos();
        let x = self.x as f64;
        let y = self.y as f64;
        Self {
            x: (x * c + y * s).round() as i64,
            y: (-x * s + y * c).round() as i64,
        }
    }

    pub fn rotated_about(self, center: Point, deg: f64) -> Self {
        (self - center).rotated(deg) + center
    }

    /// Mirror across the Y axis (x becomes -x)
    pub fn mirrored_x(self) -> Self {
        Self {
            x: -self.x,
            y: self.y,
        }
    }

    pub fn distance(self, other: Point) -> f64 {
        let dx = (self.x - other.x) as f64;
        let dy = (self.y - other.y) as f64;
        dx.hypot(dy)
    }

    fn cross(self, other: Point) -> i128 {
        self.x as i128 * other.y as i128 - self.y as i128 * other.x as i128
    }
}

impl Add for Point {
    type Output = Point;
    fn add(self, rhs: Point) -> Point {
        Point::new(self.x + rhs.x, self.y + rhs.y)
    }
}

impl Sub for Point {
    type Output = Point;
    fn sub(self, rhs: Point) -> Point {
        Point::new(self.x - rhs.x, self.y - rhs.y)
    }
}

impl Neg for Point {
    type Output = Point;
    fn neg(self) -> Point {
        Point::new(-self.x, -self.y)
    }
}

/// Width and height in board internal units
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Size {
    pub w: i64,
    pub h: i64,
}

impl Size {
    pub const fn new(w: i64, h: i64) -> Self {
        Self { w, h }
    }

    pub fn min_dim(&self) -> i64 {
        self.w.min(self.h)
    }

    pub fn inflated(&self, margin: i64) -> Self {
        Self::new(self.w + 2 * margin, self.h + 2 * margin)
    }
}

/// Axis-aligned bounding box
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BBox {
    pub min: Point,
    pub max: Point,
}

impl BBox {
    pub fn from_points(points: impl IntoIterator<Item = Point>) -> Option<Self> {
        let mut it = points.into_iter();
        let first = it.next()?;
        let mut bbox = BBox {
            min: first,
            max: first,
        };
        for p in it {
            bbox.add_point(p);
        }
        Some(bbox)
    }

    pub fn add_point(&mut self, p: Point) {
        self.min.x = self.min.x.min(p.x);
        self.min.y = self.min.y.min(p.y);
        self.max.x = self.max.x.max(p.x);
        self.max.y = self.max.y.max(p.y);
    }

    pub fn merge(&mut self, other: &BBox) {
        self.add_point(other.min);
        self.add_point(other.max);
    }

    pub fn width(&self) -> i64 {
        self.max.x - self.min.x
    }

    pub fn height(&self) -> i64 {
        self.max.y - self.min.y
    }

    pub fn center(&self) -> Point {
        Point::new(
            (self.min.x + self.max.x) / 2,
            (self.min.y + self.max.y) / 2,
        )
    }
}

/// One boundary step of a contour, ending at `end`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Segment {
    Line {
        end: Point,
    },
    /// `clockwise` is measured on raw board coordinates (a negative cross
    /// product of the start and end radii).
    Arc {
        end: Point,
        center: Point,
        clockwise: bool,
    },
}

impl Segment {
    pub fn end(&self) -> Point {
        match *self {
            Segment::Line { end } | Segment::Arc { end, .. } => end,
        }
    }

    fn map(&self, f: &impl Fn(Point) -> Point, flip: bool) -> Segment {
        match *self {
            Segment::Line { end } => Segment::Line { end: f(end) },
            Segment::Arc {
                end,
                center,
                clockwise,
            } => Segment::Arc {
                end: f(end),
                center: f(center),
                clockwise: clockwise ^ flip,
            },
        }
    }
}

/// Closed boundary: the last segment ends on `start`
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Contour {
    pub start: Point,
    pub segments: Vec<Segment>,
}

impl Contour {
    /// Closed polyline through `points`; a closing segment is added when needed.
    pub fn from_points(points: &[Point]) -> Self {
        let Some((&start, rest)) = points.split_first() else {
            return Self::default();
        };
        let mut segments: Vec<Segment> = rest.iter().map(|&end| Segment::Line { end }).collect();
        if points.len() > 1 && points.last() != Some(&start) {
            segments.push(Segment::Line { end: start });
        }
        Self { start, segments }
    }

    /// Full circle represented as a single 360 degree arc
    pub fn circle(center: Point, radius: i64) -> Self {
        let start = Point::new(center.x + radius, center.y);
        Self {
            start,
            segments: vec![Segment::Arc {
                end: start,
                center,
                clockwise: false,
            }],
        }
    }

    pub fn has_arcs(&self) -> bool {
        self.segments
            .iter()
            .any(|s| matches!(s, Segment::Arc { .. }))
    }

    /// Too few vertices to enclose an area
    pub fn is_degenerate(&self) -> bool {
        if self.has_arcs() {
            self.segments.is_empty()
        } else {
            self.vertices().len() < 3
        }
    }

    /// Distinct vertices, without the closing repeat of `start`
    pub fn vertices(&self) -> Vec<Point> {
        let mut pts = Vec::with_capacity(self.segments.len() + 1);
        if self.segments.is_empty() {
            return pts;
        }
        pts.push(self.start);
        for seg in &self.segments {
            let end = seg.end();
            if pts.last() != Some(&end) {
                pts.push(end);
            }
        }
        if pts.len() > 1 && pts.last() == Some(&self.start) {
            pts.pop();
        }
        pts
    }

    /// Vertices with arcs approximated by chords within `max_error`
    pub fn flattened(&self, max_error: i64) -> Vec<Point> {
        let mut pts = Vec::new();
        if self.segments.is_empty() {
            return pts;
        }
        let mut cur = self.start;
        pts.push(cur);
        for seg in &self.segments {
            match *seg {
                Segment::Line { end } => pts.push(end),
                Segment::Arc {
                    end,
                    center,
                    clockwise,
                } => {
                    pts.extend(arc_points(cur, end, center, clockwise, max_error).into_iter().skip(1));
                }
            }
            cur = seg.end();
        }
        pts.dedup();
        if pts.len() > 1 && pts.last() == pts.first() {
            pts.pop();
        }
        pts
    }

    /// Apply a point transform; `flip` reverses arc directions (mirroring).
    pub fn map(&self, f: impl Fn(Point) -> Point, flip: bool) -> Self {
        Self {
            start: f(self.start),
            segments: self.segments.iter().map(|s| s.map(&f, flip)).collect(),
        }
    }

    pub fn translated(&self, d: Point) -> Self {
        self.map(|p| p + d, false)
    }

    pub fn rotated(&self, center: Point, deg: f64) -> Self {
        self.map(|p| p.rotated_about(center, deg), false)
    }

    pub fn mirrored_x(&self) -> Self {
        self.map(Point::mirrored_x, true)
    }

    pub fn bbox(&self, max_error: i64) -> Option<BBox> {
        BBox::from_points(self.flattened(max_error))
    }

    /// Signed area of the flattened contour; positive when counter-clockwise
    /// on raw coordinates.
    pub fn signed_area(&self, max_error: i64) -> f64 {
        signed_area(&self.flattened(max_error))
    }
}

/// Outline with optional holes
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Polygon {
    pub outline: Contour,
    #[serde(default)]
    pub holes: Vec<Contour>,
}

impl Polygon {
    pub fn new(outline: Contour) -> Self {
        Self {
            outline,
            holes: Vec::new(),
        }
    }

    pub fn with_holes(outline: Contour, holes: Vec<Contour>) -> Self {
        Self { outline, holes }
    }

    pub fn contours(&self) -> impl Iterator<Item = &Contour> {
        std::iter::once(&self.outline).chain(self.holes.iter())
    }

    pub fn map(&self, f: impl Fn(Point) -> Point + Copy, flip: bool) -> Self {
        Self {
            outline: self.outline.map(f, flip),
            holes: self.holes.iter().map(|h| h.map(f, flip)).collect(),
        }
    }
}

/// Set of polygons, as produced by the board's polygon engine
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct PolySet {
    pub polygons: Vec<Polygon>,
}

impl PolySet {
    pub fn new(polygons: Vec<Polygon>) -> Self {
        Self { polygons }
    }

    pub fn from_contour(outline: Contour) -> Self {
        Self::new(vec![Polygon::new(outline)])
    }

    pub fn is_empty(&self) -> bool {
        self.polygons.is_empty()
    }

    pub fn outline_count(&self) -> usize {
        self.polygons.len()
    }

    pub fn map(&self, f: impl Fn(Point) -> Point + Copy, flip: bool) -> Self {
        Self {
            polygons: self.polygons.iter().map(|p| p.map(f, flip)).collect(),
        }
    }

    pub fn rotated(&self, center: Point, deg: f64) -> Self {
        self.map(move |p| p.rotated_about(center, deg), false)
    }

    pub fn translated(&self, d: Point) -> Self {
        self.map(move |p| p + d, false)
    }

    pub fn bbox(&self, max_error: i64) -> Option<BBox> {
        let mut out: Option<BBox> = None;
        for poly in &self.polygons {
            if let Some(b) = poly.outline.bbox(max_error) {
                match out.as_mut() {
                    Some(o) => o.merge(&b),
                    None => out = Some(b),
                }
            }
        }
        out
    }

    /// Grow (or shrink, for negative margins) every outline.
    ///
    /// Arcs are flattened first; the result is simplified and holes are
    /// shrunk by the same margin.
    pub fn inflated(&self, margin: i64, max_error: i64) -> Self {
        if margin == 0 {
            return self.clone();
        }
        let polygons = self
            .polygons
            .iter()
            .filter_map(|poly| {
                let outline = offset_points(&poly.outline.flattened(max_error), margin);
                if outline.len() < 3 {
                    return None;
                }
                let holes = poly
                    .holes
                    .iter()
                    .map(|h| offset_points(&h.flattened(max_error), -margin))
                    .filter(|h| h.len() >= 3)
                    .map(|h| Contour::from_points(&h))
                    .collect();
                Some(Polygon::with_holes(Contour::from_points(&outline), holes))
            })
            .collect();
        Self { polygons }
    }
}

/// Signed shoelace area of a closed point list
pub fn signed_area(points: &[Point]) -> f64 {
    if points.len() < 3 {
        return 0.0;
    }
    let mut acc: i128 = 0;
    for (i, &a) in points.iter().enumerate() {
        let b = points[(i + 1) % points.len()];
        acc += a.cross(b);
    }
    acc as f64 / 2.0
}

/// Drop repeated and collinear vertices
pub fn simplify(points: &[Point]) -> Vec<Point> {
    let mut pts: Vec<Point> = points.to_vec();
    pts.dedup();
    while pts.len() > 1 && pts.first() == pts.last() {
        pts.pop();
    }
    let mut changed = true;
    while changed && pts.len() >= 3 {
        changed = false;
        let n = pts.len();
        for i in 0..n {
            let a = pts[(i + n - 1) % n];
            let b = pts[i];
            let c = pts[(i + 1) % n];
            if (b - a).cross(c - b) == 0 {
                pts.remove(i);
                changed = true;
                break;
            }
        }
    }
    pts
}

/// Miter offset of a simple polygon; positive margins grow it.
pub fn offset_points(points: &[Point], margin: i64) -> Vec<Point> {
    let pts = simplify(points);
    if pts.len() < 3 {
        return pts;
    }
    let orientation = if signed_area(&pts) >= 0.0 { 1.0 } else { -1.0 };
    let n = pts.len();
    let d = margin as f64;

    let normal = |a: Point, b: Point| -> (f64, f64) {
        let dx = (b.x - a.x) as f64;
        let dy = (b.y - a.y) as f64;
        let len = dx.hypot(dy);
        (orientation * dy / len, -orientation * dx / len)
    };

    let mut out = Vec::with_capacity(n);
    for i in 0..n {
        let prev = pts[(i + n - 1) % n];
        let cur = pts[i];
        let next = pts[(i + 1) % n];
        let n1 = normal(prev, cur);
        let n2 = normal(cur, next);
        let denom = (1.0 + n1.0 * n2.0 + n1.1 * n2.1).max(0.25);
        let ox = (n1.0 + n2.0) * d / denom;
        let oy = (n1.1 + n2.1) * d / denom;
        out.push(Point::new(
            cur.x + ox.round() as i64,
            cur.y + oy.round() as i64,
        ));
    }
    simplify(&out)
}

/// Convex hull (monotone chain), counter-clockwise on raw coordinates
pub fn convex_hull(points: &[Point]) -> Vec<Point> {
    let mut pts = points.to_vec();
    pts.sort();
    pts.dedup();
    if pts.len() < 3 {
        return pts;
    }

    let mut hull: Vec<Point> = Vec::with_capacity(pts.len() * 2);
    for pass in 0..2 {
        let start = hull.len();
        let iter: Box<dyn Iterator<Item = &Point>> = if pass == 0 {
            Box::new(pts.iter())
        } else {
            Box::new(pts.iter().rev())
        };
        for &p in iter {
            while hull.len() >= start + 2 {
                let a = hull[hull.len() - 2];
                let b = hull[hull.len() - 1];
                if (b - a).cross(p - a) <= 0 {
                    hull.pop();
                } else {
                    break;
                }
            }
            hull.push(p);
        }
        hull.pop();
    }
    hull
}

/// Centre of the circle through three points, if they are not collinear
pub fn arc_center(start: Point, mid: Point, end: Point) -> Option<Point> {
    let (ax, ay) = (start.x as f64, start.y as f64);
    let (bx, by) = (mid.x as f64, mid.y as f64);
    let (cx, cy) = (end.x as f64, end.y as f64);
    let d = 2.0 * (ax * (by - cy) + bx * (cy - ay) + cx * (ay - by));
    if d.abs() < f64::EPSILON {
        return None;
    }
    let a2 = ax * ax + ay * ay;
    let b2 = bx * bx + by * by;
    let c2 = cx * cx + cy * cy;
    let ux = (a2 * (by - cy) + b2 * (cy - ay) + c2 * (ay - by)) / d;
    let uy = (a2 * (cx - bx) + b2 * (ax - cx) + c2 * (bx - ax)) / d;
    Some(Point::new(ux.round() as i64, uy.round() as i64))
}

/// Direction of the arc start -> mid -> end on raw coordinates
pub fn arc_is_clockwise(start: Point, mid: Point, end: Point) -> bool {
    (mid - start).cross(end - start) < 0
}

/// Chord approximation of an arc, including both end points.
/// An arc whose end equals its start is a full circle.
pub fn arc_points(
    start: Point,
    end: Point,
    center: Point,
    clockwise: bool,
    max_error: i64,
) -> Vec<Point> {
    let radius = start.distance(center);
    let a0 = ((start.y - center.y) as f64).atan2((start.x - center.x) as f64);
    let a1 = ((end.y - center.y) as f64).atan2((end.x - center.x) as f64);
    let mut sweep = a1 - a0;
    if clockwise {
        while sweep >= 0.0 {
            sweep -= 2.0 * PI;
        }
    } else {
        while sweep <= 0.0 {
            sweep += 2.0 * PI;
        }
    }

    let n = segment_count(radius, sweep.abs(), max_error);
    let mut pts = Vec::with_capacity(n + 1);
    pts.push(start);
    for i in 1..n {
        let a = a0 + sweep * i as f64 / n as f64;
        pts.push(Point::new(
            center.x + (radius * a.cos()).round() as i64,
            center.y + (radius * a.sin()).round() as i64,
        ));
    }
    pts.push(end);
    pts
}

fn segment_count(radius: f64, sweep: f64, max_error: i64) -> usize {
    let err = (max_error.max(1) as f64).min(radius / 2.0).max(1.0);
    if radius <= err {
        return 4;
    }
    let step = 2.0 * (1.0 - err / radius).acos();
    ((sweep / step).ceil() as usize).clamp(2, 720)
}

/// Cubic bezier sampled into a polyline (end points included)
pub fn bezier_points(p0: Point, p1: Point, p2: Point, p3: Point, max_error: i64) -> Vec<Point> {
    let hull_len = p0.distance(p1) + p1.distance(p2) + p2.distance(p3);
    let n = ((hull_len / (max_error.max(1) as f64)).sqrt().ceil() as usize).clamp(2, 128);
    (0..=n)
        .map(|i| {
            let t = i as f64 / n as f64;
            let u = 1.0 - t;
            let b0 = u * u * u;
            let b1 = 3.0 * u * u * t;
            let b2 = 3.0 * u * t * t;
            let b3 = t * t * t;
            let x = b0 * p0.x as f64 + b1 * p1.x as f64 + b2 * p2.x as f64 + b3 * p3.x as f64;
            let y = b0 * p0.y as f64 + b1 * p1.y as f64 + b2 * p2.y as f64 + b3 * p3.y as f64;
            Point::new(x.round() as i64, y.round() as i64)
        })
        .collect()
}

/// Rectangle centred on the origin
pub fn rect_contour(size: Size) -> Contour {
    let (hw, hh) = (size.w / 2, size.h / 2);
    Contour::from_points(&[
        Point::new(-hw, -hh),
        Point::new(hw, -hh),
        Point::new(hw, hh),
        Point::new(-hw, hh),
    ])
}

/// Rounded rectangle centred on the origin, corners drawn as arcs
pub fn round_rect_contour(size: Size, radius: i64) -> Contour {
    let r = radius.clamp(0, size.min_dim() / 2);
    if r == 0 {
        return rect_contour(size);
    }
    let (hw, hh) = (size.w / 2, size.h / 2);
    let corners = [
        // (arc start, arc end, centre) walking counter-clockwise on raw coordinates
        (
            Point::new(hw - r, -hh),
            Point::new(hw, -hh + r),
            Point::new(hw - r, -hh + r),
        ),
        (
            Point::new(hw, hh - r),
            Point::new(hw - r, hh),
            Point::new(hw - r, hh - r),
        ),
        (
            Point::new(-hw + r, hh),
            Point::new(-hw, hh - r),
            Point::new(-hw + r, hh - r),
        ),
        (
            Point::new(-hw, -hh + r),
            Point::new(-hw + r, -hh),
            Point::new(-hw + r, -hh + r),
        ),
    ];

    let start = corners[3].1;
    let mut segments = Vec::with_capacity(8);
    let mut cur = start;
    for (arc_start, arc_end, center) in corners {
        if arc_start != cur {
            segments.push(Segment::Line { end: arc_start });
        }
        segments.push(Segment::Arc {
            end: arc_end,
            center,
            clockwise: false,
        });
        cur = arc_end;
    }
    Contour { start, segments }
}

/// Stadium shape centred on the origin
pub fn oval_contour(size: Size) -> Contour {
    round_rect_contour(size, size.min_dim() / 2)
}

/// Chamfer corner bits, following the board convention
pub mod corners {
    pub const TOP_LEFT: u8 = 1;
    pub const TOP_RIGHT: u8 = 2;
    pub const BOTTOM_LEFT: u8 = 4;
    pub const BOTTOM_RIGHT: u8 = 8;
    pub const ALL: u8 = 15;
}

/// Rectangle with the corners in `mask` cut by `chamfer`
pub fn chamfered_rect_contour(size: Size, chamfer: i64, mask: u8) -> Contour {
    let (hw, hh) = (size.w / 2, size.h / 2);
    let c = chamfer.clamp(0, size.min_dim() / 2);
    let mut pts = Vec::with_capacity(8);
    // top-left, top-right, bottom-right, bottom-left ("top" is negative Y)
    let walk = [
        (corners::TOP_LEFT, Point::new(-hw, -hh), Point::new(0, c), Point::new(c, 0)),
        (corners::TOP_RIGHT, Point::new(hw, -hh), Point::new(-c, 0), Point::new(0, c)),
        (corners::BOTTOM_RIGHT, Point::new(hw, hh), Point::new(0, -c), Point::new(-c, 0)),
        (corners::BOTTOM_LEFT, Point::new(-hw, hh), Point::new(c, 0), Point::new(0, -c)),
    ];
    for (bit, corner, before, after) in walk {
        if c > 0 && mask & bit != 0 {
            pts.push(corner + before);
            pts.push(corner + after);
        } else {
            pts.push(corner);
        }
    }
    Contour::from_points(&simplify(&pts))
}

/// Trapezoid pad outline; `delta` narrows one pair of opposite edges
pub fn trapezoid_contour(size: Size, delta: Size) -> Contour {
    let (hx, hy) = (size.w / 2, size.h / 2);
    let (dx, dy) = (delta.w / 2, delta.h / 2);
    Contour::from_points(&[
        Point::new(-hx - dy, hy + dx),
        Point::new(-hx + dy, -hy - dx),
        Point::new(hx - dy, -hy + dx),
        Point::new(hx + dy, hy - dx),
    ])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rotation_is_counter_clockwise_on_screen() {
        // +X rotated by 90 degrees points up the screen (negative Y)
        assert_eq!(Point::new(1000, 0).rotated(90.0), Point::new(0, -1000));
        assert_eq!(Point::new(1000, 0).rotated(180.0), Point::new(-1000, 0));
    }

    #[test]
    fn from_points_closes_the_contour() {
        let c = Contour::from_points(&[Point::new(0, 0), Point::new(10, 0), Point::new(10, 10)]);
        assert_eq!(c.segments.len(), 3);
        assert_eq!(c.segments.last().unwrap().end(), c.start);
        assert!(!c.is_degenerate());
        assert!(Contour::from_points(&[Point::new(0, 0), Point::new(1, 1)]).is_degenerate());
        assert!(Contour::from_points(&[]).is_degenerate());
    }

    #[test]
    fn full_circle_is_a_single_arc() {
        let c = Contour::circle(Point::new(0, 0), 1000);
        assert_eq!(c.segments.len(), 1);
        assert_eq!(c.segments[0].end(), c.start);
        assert!(!c.is_degenerate());
        let pts = c.flattened(10);
        assert!(pts.len() > 8);
        for p in pts {
            assert!((p.distance(Point::new(0, 0)) - 1000.0).abs() < 2.0);
        }
    }

    #[test]
    fn round_rect_is_closed_and_counter_clockwise() {
        let c = round_rect_contour(Size::new(2000, 1000), 200);
        assert_eq!(c.segments.last().unwrap().end(), c.start);
        assert!(c.signed_area(10) > 0.0);
        let bbox = c.bbox(10).unwrap();
        assert_eq!(bbox.width(), 2000);
        assert_eq!(bbox.height(), 1000);
    }

    #[test]
    fn chamfer_cuts_only_masked_corners() {
        let c = chamfered_rect_contour(Size::new(1000, 1000), 100, corners::TOP_LEFT);
        assert_eq!(c.vertices().len(), 5);
        let all = chamfered_rect_contour(Size::new(1000, 1000), 100, corners::ALL);
        assert_eq!(all.vertices().len(), 8);
    }

    #[test]
    fn inflate_grows_square() {
        let square = PolySet::from_contour(rect_contour(Size::new(1000, 1000)));
        let grown = square.inflated(100, 10);
        let bbox = grown.bbox(10).unwrap();
        assert_eq!(bbox.width(), 1200);
        assert_eq!(bbox.height(), 1200);
        let shrunk = square.inflated(-100, 10);
        assert_eq!(shrunk.bbox(10).unwrap().width(), 800);
    }

    #[test]
    fn hull_drops_interior_points() {
        let pts = [
            Point::new(0, 0),
            Point::new(10, 0),
            Point::new(5, 5),
            Point::new(10, 10),
            Point::new(0, 10),
        ];
        let hull = convex_hull(&pts);
        assert_eq!(hull.len(), 4);
        assert!(signed_area(&hull) > 0.0);
    }

    #[test]
    fn arc_center_and_direction() {
        let s = Point::new(1000, 0);
        let m = Point::new(0, 1000);
        let e = Point::new(-1000, 0);
        assert_eq!(arc_center(s, m, e), Some(Point::new(0, 0)));
        assert!(!arc_is_clockwise(s, m, e));
        assert!(arc_is_clockwise(e, m, s));
        assert_eq!(arc_center(s, Point::new(0, 0), e), None);
    }

    #[test]
    fn bezier_keeps_end_points() {
        let pts = bezier_points(
            Point::new(0, 0),
            Point::new(0, 1000),
            Point::new(1000, 1000),
            Point::new(1000, 0),
            10,
        );
        assert_eq!(pts.first(), Some(&Point::new(0, 0)));
        assert_eq!(pts.last(), Some(&Point::new(1000, 0)));
    }
}
