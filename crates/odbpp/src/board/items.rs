use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::layer::{BoardLayer, LayerSet, Side, copper_span};
use crate::geom::{
    self, Contour, Point, PolySet, Polygon, Size, chamfered_rect_contour, oval_contour,
    rect_contour, round_rect_contour, trapezoid_contour,
};
use crate::units::normalize_angle;

fn default_roundrect_ratio() -> f64 {
    0.25
}

fn default_chamfer_ratio() -> f64 {
    0.2
}

fn default_front() -> BoardLayer {
    BoardLayer::FCu
}

fn default_back() -> BoardLayer {
    BoardLayer::BCu
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PadShape {
    #[default]
    Circle,
    Rect,
    Oval,
    RoundRect,
    ChamferedRect,
    Trapezoid,
    Custom,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PadAttribute {
    #[default]
    Pth,
    Smd,
    Conn,
    Npth,
}

/// Fabrication property of a pad
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PadProperty {
    #[default]
    None,
    FiducialGlobal,
    FiducialLocal,
    Testpoint,
    HeatSink,
    Castellated,
}

/// Pad of a footprint, in absolute board coordinates
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Pad {
    #[serde(default = "Uuid::new_v4")]
    pub id: Uuid,
    #[serde(default)]
    pub number: String,
    /// Anchor point, which is also the hole centre
    pub position: Point,
    /// Absolute orientation in degrees
    #[serde(default)]
    pub orientation: f64,
    /// Shape offset from the anchor, in the pad's own frame
    #[serde(default)]
    pub offset: Point,
    pub size: Size,
    #[serde(default)]
    pub shape: PadShape,
    /// Drill size; a differing width and height means an oblong hole
    #[serde(default)]
    pub drill: Option<Size>,
    #[serde(default)]
    pub attribute: PadAttribute,
    #[serde(default)]
    pub layers: LayerSet,
    #[serde(default)]
    pub net: i32,
    #[serde(default = "default_roundrect_ratio")]
    pub roundrect_ratio: f64,
    #[serde(default = "default_chamfer_ratio")]
    pub chamfer_ratio: f64,
    /// Chamfered corners (TL=1, TR=2, BL=4, BR=8)
    #[serde(default)]
    pub chamfer_corners: u8,
    #[serde(default)]
    pub trapezoid_delta: Size,
    /// Custom pad geometry relative to the anchor, unrotated
    #[serde(default)]
    pub primitives: PolySet,
    #[serde(default)]
    pub solder_mask_margin: Option<i64>,
    #[serde(default)]
    pub solder_paste_margin: Option<i64>,
    #[serde(default)]
    pub solder_paste_ratio: Option<f64>,
    #[serde(default)]
    pub property: PadProperty,
}

impl Pad {
    pub fn new(number: &str, position: Point, size: Size, shape: PadShape) -> Self {
        Self {
            id: Uuid::new_v4(),
            number: number.to_string(),
            position,
            orientation: 0.0,
            offset: Point::default(),
            size,
            shape,
            drill: None,
            attribute: PadAttribute::Smd,
            layers: LayerSet::new(),
            net: 0,
            roundrect_ratio: default_roundrect_ratio(),
            chamfer_ratio: default_chamfer_ratio(),
            chamfer_corners: 0,
            trapezoid_delta: Size::default(),
            primitives: PolySet::default(),
            solder_mask_margin: None,
            solder_paste_margin: None,
            solder_paste_ratio: None,
            property: PadProperty::None,
        }
    }

    pub fn has_hole(&self) -> bool {
        self.drill.is_some_and(|d| d.w > 0 && d.h > 0)
    }

    pub fn is_plated(&self) -> bool {
        self.attribute == PadAttribute::Pth
    }

    pub fn is_on(&self, layer: BoardLayer) -> bool {
        self.layers.contains(&layer)
    }

    /// Copper layers the pad is present on, front to back
    pub fn copper_layers(&self) -> Vec<BoardLayer> {
        self.layers.iter().copied().filter(|l| l.is_copper()).collect()
    }

    /// Centre of the pad shape (anchor plus rotated offset)
    pub fn shape_center(&self) -> Point {
        self.position + self.offset.rotated(self.orientation)
    }

    pub fn round_rect_radius(&self) -> i64 {
        (self.roundrect_ratio * self.size.min_dim() as f64).round() as i64
    }

    pub fn chamfer_size(&self) -> i64 {
        (self.chamfer_ratio * self.size.min_dim() as f64).round() as i64
    }

    /// Outline in the pad frame (centred on the shape centre, unrotated),
    /// grown by `margin`.
    pub fn local_outline(&self, margin: i64, max_error: i64) -> PolySet {
        let size = self.size.inflated(margin);
        let contour = match self.shape {
            PadShape::Circle => Contour::circle(Point::default(), size.w / 2),
            PadShape::Rect if margin > 0 => round_rect_contour(size, margin),
            PadShape::Rect => rect_contour(size),
            PadShape::Oval => oval_contour(size),
            PadShape::RoundRect => round_rect_contour(size, self.round_rect_radius() + margin),
            PadShape::ChamferedRect => {
                chamfered_rect_contour(size, self.chamfer_size(), self.chamfer_corners)
            }
            PadShape::Trapezoid => {
                let base = trapezoid_contour(self.size, self.trapezoid_delta);
                let pts = geom::offset_points(&base.vertices(), margin);
                Contour::from_points(&pts)
            }
            PadShape::Custom => {
                return self
                    .primitives
                    .map(|p| p - self.offset, false)
                    .inflated(margin, max_error);
            }
        };
        PolySet::from_contour(contour)
    }

    /// Outline in absolute board coordinates, grown by `margin`
    pub fn effective_outline(&self, margin: i64, max_error: i64) -> PolySet {
        let center = self.shape_center();
        let angle = self.orientation;
        self.local_outline(margin, max_error)
            .map(move |p| p.rotated(angle) + center, false)
    }

    pub fn is_fiducial(&self) -> bool {
        matches!(
            self.property,
            PadProperty::FiducialGlobal | PadProperty::FiducialLocal
        )
    }
}

/// Free-form footprint field
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Field {
    pub name: String,
    pub value: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MountType {
    #[default]
    Unspecified,
    Smd,
    ThroughHole,
}

/// Placed footprint; every child item uses absolute board coordinates
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Footprint {
    #[serde(default = "Uuid::new_v4")]
    pub id: Uuid,
    pub reference: String,
    #[serde(default)]
    pub value: String,
    /// Library identifier, used as the package name
    #[serde(default)]
    pub footprint: String,
    pub position: Point,
    #[serde(default)]
    pub orientation: f64,
    #[serde(default)]
    pub flipped: bool,
    #[serde(default)]
    pub pads: Vec<Pad>,
    #[serde(default)]
    pub shapes: Vec<Shape>,
    #[serde(default)]
    pub texts: Vec<Text>,
    #[serde(default)]
    pub zones: Vec<Zone>,
    #[serde(default)]
    pub courtyard_front: PolySet,
    #[serde(default)]
    pub courtyard_back: PolySet,
    #[serde(default)]
    pub fields: Vec<Field>,
    #[serde(default)]
    pub part_number: Option<String>,
    #[serde(default)]
    pub height: Option<i64>,
    #[serde(default)]
    pub mount: MountType,
    #[serde(default)]
    pub dnp: bool,
}

impl Footprint {
    pub fn new(reference: &str, footprint: &str, position: Point) -> Self {
        Self {
            id: Uuid::new_v4(),
            reference: reference.to_string(),
            value: String::new(),
            footprint: footprint.to_string(),
            position,
            orientation: 0.0,
            flipped: false,
            pads: Vec::new(),
            shapes: Vec::new(),
            texts: Vec::new(),
            zones: Vec::new(),
            courtyard_front: PolySet::default(),
            courtyard_back: PolySet::default(),
            fields: Vec::new(),
            part_number: None,
            height: None,
            mount: MountType::Unspecified,
            dnp: false,
        }
    }

    pub fn side(&self) -> Side {
        if self.flipped {
            Side::Bottom
        } else {
            Side::Top
        }
    }

    /// Map an absolute point into the footprint's unplaced frame
    pub fn to_local(&self, p: Point) -> Point {
        let q = (p - self.position).rotated(-self.orientation);
        if self.flipped { q.mirrored_x() } else { q }
    }

    /// Map an absolute pad orientation into the footprint's unplaced frame
    pub fn local_angle(&self, deg: f64) -> f64 {
        let rel = deg - self.orientation;
        normalize_angle(if self.flipped { -rel } else { rel })
    }

    /// Apply `to_local` to a polygon set (arcs change direction when flipped)
    pub fn polys_to_local(&self, polys: &PolySet) -> PolySet {
        let (pos, orient, flipped) = (self.position, self.orientation, self.flipped);
        polys.map(
            move |p| {
                let q = (p - pos).rotated(-orient);
                if flipped { q.mirrored_x() } else { q }
            },
            flipped,
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct SideFlags {
    #[serde(default)]
    pub front: bool,
    #[serde(default)]
    pub back: bool,
}

impl SideFlags {
    pub const fn both(v: bool) -> Self {
        Self { front: v, back: v }
    }

    pub fn get(&self, side: Side) -> bool {
        match side {
            Side::Top => self.front,
            Side::Bottom => self.back,
        }
    }
}

/// Secondary drilling that removes a via stub
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Backdrill {
    pub start: BoardLayer,
    pub end: BoardLayer,
    pub diameter: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Via {
    #[serde(default = "Uuid::new_v4")]
    pub id: Uuid,
    pub position: Point,
    pub width: i64,
    pub drill: i64,
    #[serde(default = "default_front")]
    pub start_layer: BoardLayer,
    #[serde(default = "default_back")]
    pub end_layer: BoardLayer,
    #[serde(default)]
    pub net: i32,
    #[serde(default)]
    pub tenting: SideFlags,
    #[serde(default)]
    pub covering: SideFlags,
    #[serde(default)]
    pub plugging: SideFlags,
    #[serde(default)]
    pub filled: bool,
    #[serde(default)]
    pub capped: bool,
    #[serde(default)]
    pub backdrill: Option<Backdrill>,
}

impl Via {
    pub fn new(position: Point, width: i64, drill: i64, net: i32) -> Self {
        Self {
            id: Uuid::new_v4(),
            position,
            width,
            drill,
            start_layer: BoardLayer::FCu,
            end_layer: BoardLayer::BCu,
            net,
            tenting: SideFlags::default(),
            covering: SideFlags::default(),
            plugging: SideFlags::default(),
            filled: false,
            capped: false,
            backdrill: None,
        }
    }

    /// Start and end layers ordered front to back
    pub fn layer_pair(&self) -> (BoardLayer, BoardLayer) {
        if self.start_layer <= self.end_layer {
            (self.start_layer, self.end_layer)
        } else {
            (self.end_layer, self.start_layer)
        }
    }

    pub fn copper_layers(&self, copper_count: usize) -> Vec<BoardLayer> {
        copper_span(self.start_layer, self.end_layer, copper_count)
    }

    pub fn is_through(&self) -> bool {
        self.layer_pair() == (BoardLayer::FCu, BoardLayer::BCu)
    }

    pub fn is_blind(&self) -> bool {
        !self.is_through()
    }

    /// Whether the via reaches the outer copper on `side`
    pub fn reaches(&self, side: Side) -> bool {
        let (top, bottom) = self.layer_pair();
        match side {
            Side::Top => top == BoardLayer::FCu,
            Side::Bottom => bottom == BoardLayer::BCu,
        }
    }
}

/// Straight track segment or track arc
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Track {
    #[serde(default = "Uuid::new_v4")]
    pub id: Uuid,
    pub start: Point,
    pub end: Point,
    /// Mid point of an arc track
    #[serde(default)]
    pub mid: Option<Point>,
    pub width: i64,
    pub layer: BoardLayer,
    #[serde(default)]
    pub net: i32,
}

impl Track {
    pub fn segment(start: Point, end: Point, width: i64, layer: BoardLayer, net: i32) -> Self {
        Self {
            id: Uuid::new_v4(),
            start,
            end,
            mid: None,
            width,
            layer,
            net,
        }
    }
}

/// Copper zone with precomputed fills
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Zone {
    #[serde(default = "Uuid::new_v4")]
    pub id: Uuid,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub net: i32,
    #[serde(default)]
    pub layers: LayerSet,
    #[serde(default)]
    pub fills: std::collections::BTreeMap<BoardLayer, PolySet>,
    #[serde(default)]
    pub rule_area: bool,
    #[serde(default)]
    pub teardrop: bool,
}

impl Zone {
    pub fn fill(&self, layer: BoardLayer) -> Option<&PolySet> {
        self.fills.get(&layer).filter(|p| !p.is_empty())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FillMode {
    #[default]
    None,
    Solid,
    Hatch,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ShapeGeometry {
    Segment {
        start: Point,
        end: Point,
    },
    Rect {
        start: Point,
        end: Point,
    },
    Circle {
        center: Point,
        radius: i64,
    },
    Arc {
        start: Point,
        mid: Point,
        end: Point,
    },
    Poly {
        polys: PolySet,
    },
    Bezier {
        start: Point,
        c1: Point,
        c2: Point,
        end: Point,
    },
}

/// Graphic item (board-level or footprint-owned)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Shape {
    #[serde(default = "Uuid::new_v4")]
    pub id: Uuid,
    pub geometry: ShapeGeometry,
    #[serde(default)]
    pub width: i64,
    #[serde(default)]
    pub fill: FillMode,
    /// Precomputed hatch pattern for `FillMode::Hatch`
    #[serde(default)]
    pub hatching: PolySet,
    pub layer: BoardLayer,
    #[serde(default)]
    pub net: i32,
    #[serde(default)]
    pub solder_mask_margin: Option<i64>,
}

impl Shape {
    pub fn new(geometry: ShapeGeometry, width: i64, layer: BoardLayer) -> Self {
        Self {
            id: Uuid::new_v4(),
            geometry,
            width,
            fill: FillMode::None,
            hatching: PolySet::default(),
            layer,
            net: 0,
            solder_mask_margin: None,
        }
    }

    pub fn is_filled(&self) -> bool {
        self.fill != FillMode::None
    }
}

/// Text or text box, already rendered into strokes by the font engine
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Text {
    #[serde(default = "Uuid::new_v4")]
    pub id: Uuid,
    pub text: String,
    pub layer: BoardLayer,
    #[serde(default)]
    pub stroke_width: i64,
    /// Polylines of the rendered glyphs
    #[serde(default)]
    pub strokes: Vec<Vec<Point>>,
    #[serde(default)]
    pub knockout: bool,
    /// Filled outline for knockout text
    #[serde(default)]
    pub knockout_polys: PolySet,
    #[serde(default)]
    pub visible: Option<bool>,
}

/// Dimension annotation; not exported
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Dimension {
    #[serde(default = "Uuid::new_v4")]
    pub id: Uuid,
    pub layer: BoardLayer,
}

/// Barcode graphic; not exported
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Barcode {
    #[serde(default = "Uuid::new_v4")]
    pub id: Uuid,
    pub layer: BoardLayer,
    #[serde(default)]
    pub text: String,
}

/// Convex hull of the given polygons, as a single closed contour
pub(crate) fn hull_of(polys: &[Polygon], max_error: i64) -> Option<Contour> {
    let pts: Vec<Point> = polys
        .iter()
        .flat_map(|p| p.outline.flattened(max_error))
        .collect();
    let hull = geom::convex_hull(&pts);
    (hull.len() >= 3).then(|| Contour::from_points(&hull))
}
