//! Manufacturing netlist of a step (`eda/data`): packages with their pins,
//! nets, and the subnets that tie emitted features back to nets.

use std::collections::hash_map::DefaultHasher;
use std::collections::HashMap;
use std::hash::{Hash, Hasher};
use std::io::{self, Write};
use uuid::Uuid;

use crate::attr::{AttrManager, AttrRecord, Attribute};
use crate::board::{BoardLayer, Footprint, NO_NET, Pad, PadAttribute, PadShape, Side};
use crate::feature::write_contour;
use crate::geom::{self, BBox, Contour, Point, PolySet, Size};
use crate::names::{legal_net_name, unique_name};
use crate::units::{Formatter, IU_PER_MM, normalize_angle};

/// Name of the reserved unconnected net
pub const NONE_NET_NAME: &str = "$NONE$";

/// Pitch written for packages with fewer than two pins
pub const PLACEHOLDER_PITCH: i64 = IU_PER_MM as i64;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FeatureIdKind {
    Copper,
    Laminate,
    Hole,
}

impl FeatureIdKind {
    fn letter(&self) -> char {
        match self {
            FeatureIdKind::Copper => 'C',
            FeatureIdKind::Laminate => 'L',
            FeatureIdKind::Hole => 'H',
        }
    }
}

/// Back-reference from a subnet to one emitted feature
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FeatureId {
    pub kind: FeatureIdKind,
    /// Index into the `LYR` list
    pub layer: usize,
    pub feature: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaneFill {
    Solid,
    Outline,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaneCutout {
    Circle,
    Rect,
    Octagon,
    Exact,
}

#[derive(Debug, Clone, PartialEq)]
pub enum SubnetKind {
    Via,
    Trace,
    Plane {
        fill: PlaneFill,
        cutout: PlaneCutout,
        size: i64,
    },
    Toeprint {
        side: Side,
        component: usize,
        toeprint: usize,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub struct Subnet {
    pub kind: SubnetKind,
    pub feature_ids: Vec<FeatureId>,
}

impl Subnet {
    fn write(&self, out: &mut dyn Write, fmt: &Formatter) -> io::Result<()> {
        match &self.kind {
            SubnetKind::Via => writeln!(out, "SNT VIA")?,
            SubnetKind::Trace => writeln!(out, "SNT TRC")?,
            SubnetKind::Plane { fill, cutout, size } => {
                let fill = match fill {
                    PlaneFill::Solid => 'S',
                    PlaneFill::Outline => 'O',
                };
                let cutout = match cutout {
                    PlaneCutout::Circle => 'C',
                    PlaneCutout::Rect => 'R',
                    PlaneCutout::Octagon => 'O',
                    PlaneCutout::Exact => 'E',
                };
                writeln!(out, "SNT PLN {fill} {cutout} {}", fmt.data(*size))?
            }
            SubnetKind::Toeprint {
                side,
                component,
                toeprint,
            } => writeln!(out, "SNT TOP {} {component} {toeprint}", side.letter())?,
        }
        for fid in &self.feature_ids {
            writeln!(out, "FID {} {} {}", fid.kind.letter(), fid.layer, fid.feature)?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Net {
    pub index: usize,
    pub name: String,
    pub subnets: Vec<Subnet>,
}

/// Location of a subnet: (net index, subnet index within the net)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubnetRef {
    pub net: usize,
    pub subnet: usize,
}

/// Non-owning indices from board items to the subnets built for them
#[derive(Debug, Default, Clone)]
pub struct SubnetLookups {
    pub pads: HashMap<Uuid, SubnetRef>,
    /// Tracks, arcs and vias
    pub tracks: HashMap<Uuid, SubnetRef>,
    pub planes: HashMap<(BoardLayer, Uuid), SubnetRef>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PinType {
    ThroughHole,
    Blind,
    Surface,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PinElectrical {
    Electrical,
    Mechanical,
    Undefined,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PinMount {
    Smt,
    ThroughHole,
    Hole,
    Undefined,
}

#[derive(Debug, Clone, PartialEq)]
pub enum PinOutline {
    Circle { center: Point, radius: i64 },
    Rect { lower_left: Point, size: Size },
    Contour(PolySet),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Pin {
    pub index: usize,
    pub name: String,
    pub kind: PinType,
    pub electrical: PinElectrical,
    pub mount: PinMount,
    /// Position relative to the package origin
    pub center: Point,
    pub outline: PinOutline,
}

impl Pin {
    fn write(&self, out: &mut dyn Write, fmt: &Formatter) -> io::Result<()> {
        let kind = match self.kind {
            PinType::ThroughHole => 'T',
            PinType::Blind => 'B',
            PinType::Surface => 'S',
        };
        let electrical = match self.electrical {
            PinElectrical::Electrical => 'E',
            PinElectrical::Mechanical => 'M',
            PinElectrical::Undefined => 'U',
        };
        let mount = match self.mount {
            PinMount::Smt => 'S',
            PinMount::ThroughHole => 'T',
            PinMount::Hole => 'H',
            PinMount::Undefined => 'U',
        };
        writeln!(
            out,
            "PIN {} {kind} {} 0 {electrical} {mount}",
            self.name,
            fmt.point(self.center)
        )?;
        write_outline(out, fmt, &self.outline)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Package {
    pub index: usize,
    pub name: String,
    pub pitch: i64,
    pub bbox: Option<BBox>,
    pub outline: PolySet,
    pub pins: Vec<Pin>,
    pub attrs: AttrRecord,
}

impl Package {
    fn write(&self, out: &mut dyn Write, fmt: &Formatter) -> io::Result<()> {
        writeln!(out, "# PKG {}", self.index)?;
        let (min, max) = match self.bbox {
            Some(b) => (b.min, b.max),
            None => (Point::default(), Point::default()),
        };
        // Y is negated on output, so the corners swap vertically
        write!(
            out,
            "PKG {} {} {} {} {} {}",
            self.name,
            fmt.data(self.pitch),
            fmt.data(min.x),
            fmt.data(-max.y),
            fmt.data(max.x),
            fmt.data(-min.y)
        )?;
        self.attrs.write(out)?;
        writeln!(out)?;
        write_outline(out, fmt, &PinOutline::Contour(self.outline.clone()))?;
        for pin in &self.pins {
            pin.write(out, fmt)?;
        }
        Ok(())
    }
}

fn write_outline(out: &mut dyn Write, fmt: &Formatter, outline: &PinOutline) -> io::Result<()> {
    match outline {
        PinOutline::Circle { center, radius } => {
            writeln!(out, "CR {} {}", fmt.point(*center), fmt.data(*radius))
        }
        PinOutline::Rect { lower_left, size } => writeln!(
            out,
            "RC {} {} {} {}",
            fmt.data(lower_left.x),
            fmt.data(-lower_left.y),
            fmt.data(size.w),
            fmt.data(size.h)
        ),
        PinOutline::Contour(polys) => {
            for poly in &polys.polygons {
                writeln!(out, "CT")?;
                for (idx, contour) in poly.contours().enumerate() {
                    write_contour(out, fmt, contour, idx == 0)?;
                }
                writeln!(out, "CE")?;
            }
            Ok(())
        }
    }
}

/// EDA data of one step
#[derive(Debug)]
pub struct EdaData {
    fmt: Formatter,
    source: String,
    max_error: i64,
    pub packages: Vec<Package>,
    package_by_hash: HashMap<u64, usize>,
    package_by_footprint: HashMap<Uuid, usize>,
    package_names: std::collections::HashSet<String>,
    pub nets: Vec<Net>,
    net_by_code: HashMap<i32, usize>,
    layers: Vec<String>,
    layer_index: HashMap<String, usize>,
    attrs: AttrManager,
    pub lookups: SubnetLookups,
}

impl EdaData {
    pub fn new(fmt: Formatter, source: &str, max_error: i64) -> Self {
        let mut eda = Self {
            fmt,
            source: source.to_string(),
            max_error,
            packages: Vec::new(),
            package_by_hash: HashMap::new(),
            package_by_footprint: HashMap::new(),
            package_names: Default::default(),
            nets: Vec::new(),
            net_by_code: HashMap::new(),
            layers: Vec::new(),
            layer_index: HashMap::new(),
            attrs: AttrManager::new(),
            lookups: SubnetLookups::default(),
        };
        eda.add_net(NO_NET, NONE_NET_NAME);
        eda
    }

    /// Net index for a board net code, creating the net on first use
    pub fn add_net(&mut self, code: i32, name: &str) -> usize {
        if let Some(&idx) = self.net_by_code.get(&code) {
            return idx;
        }
        let idx = self.nets.len();
        let name = if code == NO_NET {
            NONE_NET_NAME.to_string()
        } else if name.is_empty() {
            format!("NET{code}")
        } else {
            legal_net_name(name)
        };
        self.nets.push(Net {
            index: idx,
            name,
            subnets: Vec::new(),
        });
        self.net_by_code.insert(code, idx);
        idx
    }

    pub fn net_index(&self, code: i32) -> Option<usize> {
        self.net_by_code.get(&code).copied()
    }

    pub fn add_subnet(&mut self, net: usize, kind: SubnetKind) -> SubnetRef {
        let subnets = &mut self.nets[net].subnets;
        subnets.push(Subnet {
            kind,
            feature_ids: Vec::new(),
        });
        SubnetRef {
            net,
            subnet: subnets.len() - 1,
        }
    }

    pub fn subnet(&self, r: SubnetRef) -> Option<&Subnet> {
        self.nets.get(r.net)?.subnets.get(r.subnet)
    }

    /// Index of `name` in the `LYR` list, appending it on first use
    pub fn layer_index(&mut self, name: &str) -> usize {
        if let Some(&idx) = self.layer_index.get(name) {
            return idx;
        }
        let idx = self.layers.len();
        self.layers.push(name.to_string());
        self.layer_index.insert(name.to_string(), idx);
        idx
    }

    pub fn layers(&self) -> &[String] {
        &self.layers
    }

    pub fn add_feature_id(
        &mut self,
        subnet: SubnetRef,
        kind: FeatureIdKind,
        layer_name: &str,
        feature: usize,
    ) {
        let layer = self.layer_index(layer_name);
        if let Some(sn) = self
            .nets
            .get_mut(subnet.net)
            .and_then(|n| n.subnets.get_mut(subnet.subnet))
        {
            sn.feature_ids.push(FeatureId {
                kind,
                layer,
                feature,
            });
        }
    }

    pub fn package_of(&self, footprint: Uuid) -> Option<usize> {
        self.package_by_footprint.get(&footprint).copied()
    }

    /// Register the package of `fp`, reusing an identical one when present
    pub fn add_package(&mut self, fp: &Footprint) -> usize {
        let hash = footprint_hash(fp, self.max_error);
        if let Some(&idx) = self.package_by_hash.get(&hash) {
            self.package_by_footprint.insert(fp.id, idx);
            return idx;
        }

        let idx = self.packages.len();
        let base = if fp.footprint.is_empty() {
            format!("PKG{idx}")
        } else {
            legal_net_name(&fp.footprint)
        };
        let name = unique_name(&mut self.package_names, &base);

        let mut pins = Vec::with_capacity(fp.pads.len());
        let mut npth_count = 0;
        for pad in &fp.pads {
            self.add_pin(&mut pins, fp, pad, &mut npth_count);
        }

        let outline = package_outline(fp, self.max_error);
        let mut bbox = outline.bbox(self.max_error);
        for pin in &pins {
            if let Some(b) = pin_bbox(pin, self.max_error) {
                match bbox.as_mut() {
                    Some(acc) => acc.merge(&b),
                    None => bbox = Some(b),
                }
            }
        }

        let mut attrs = AttrRecord::default();
        if !fp.footprint.is_empty() {
            let geometry = Attribute::Geometry(fp.footprint.clone());
            self.attrs.add(&mut attrs, &geometry, &self.fmt);
        }

        let local: Vec<Point> = fp.pads.iter().map(|p| fp.to_local(p.position)).collect();
        self.packages.push(Package {
            index: idx,
            name,
            pitch: min_pitch(&local),
            bbox,
            outline,
            pins,
            attrs,
        });
        self.package_by_hash.insert(hash, idx);
        self.package_by_footprint.insert(fp.id, idx);
        log::debug!("package {idx} for {}", fp.reference);
        idx
    }

    /// Append the pin of `pad` to `pins`; NPTH pins are numbered separately
    fn add_pin(&self, pins: &mut Vec<Pin>, fp: &Footprint, pad: &Pad, npth_count: &mut usize) {
        let index = pins.len();
        let (kind, mut electrical, mount) = match pad.attribute {
            PadAttribute::Smd => (PinType::Surface, PinElectrical::Electrical, PinMount::Smt),
            PadAttribute::Conn => (PinType::Surface, PinElectrical::Electrical, PinMount::Undefined),
            PadAttribute::Pth => (
                PinType::ThroughHole,
                PinElectrical::Electrical,
                PinMount::ThroughHole,
            ),
            PadAttribute::Npth => (PinType::ThroughHole, PinElectrical::Mechanical, PinMount::Hole),
        };

        let name = if pad.attribute == PadAttribute::Npth {
            *npth_count += 1;
            format!("NPTH{}", *npth_count - 1)
        } else if pad.number.is_empty() {
            electrical = PinElectrical::Undefined;
            format!("PAD{index}")
        } else {
            legal_net_name(&pad.number)
        };

        pins.push(Pin {
            index,
            name,
            kind,
            electrical,
            mount,
            center: fp.to_local(pad.position),
            outline: self.pin_outline(fp, pad),
        });
    }

    fn pin_outline(&self, fp: &Footprint, pad: &Pad) -> PinOutline {
        let center = fp.to_local(pad.shape_center());
        let angle = fp.local_angle(pad.orientation);
        let axis_aligned = (angle % 90.0).abs() < 1e-6;
        match pad.shape {
            PadShape::Circle => PinOutline::Circle {
                center,
                radius: pad.size.w / 2,
            },
            PadShape::Rect if axis_aligned => {
                let quarter = (normalize_angle(angle) / 90.0).round() as i64;
                let size = if quarter % 2 == 1 {
                    Size::new(pad.size.h, pad.size.w)
                } else {
                    pad.size
                };
                // lower left in output terms (Y up) is max Y on the board
                PinOutline::Rect {
                    lower_left: Point::new(center.x - size.w / 2, center.y + size.h / 2),
                    size,
                }
            }
            _ => PinOutline::Contour(
                fp.polys_to_local(&pad.effective_outline(0, self.max_error)),
            ),
        }
    }

    /// `eda/data` file
    pub fn write(&self, out: &mut dyn Write) -> io::Result<()> {
        let fmt = &self.fmt;
        writeln!(out, "HDR {}", self.source)?;
        writeln!(out, "UNITS={}", fmt.units().as_str())?;
        writeln!(out, "LYR {}", self.layers.join(" "))?;
        writeln!(out)?;
        self.attrs.write_tables(out)?;

        for net in &self.nets {
            writeln!(out, "#\n#Net {}\n#", net.index)?;
            writeln!(out, "NET {}", net.name)?;
            for subnet in &net.subnets {
                subnet.write(out, fmt)?;
            }
        }
        writeln!(out)?;

        for pkg in &self.packages {
            pkg.write(out, fmt)?;
        }
        Ok(())
    }
}

/// Outline on the component's own side first, then the opposite side,
/// then the convex hull of the pads.
fn package_outline(fp: &Footprint, max_error: i64) -> PolySet {
    let (own, other) = if fp.flipped {
        (&fp.courtyard_back, &fp.courtyard_front)
    } else {
        (&fp.courtyard_front, &fp.courtyard_back)
    };
    if !own.is_empty() {
        return fp.polys_to_local(own);
    }
    if !other.is_empty() {
        return fp.polys_to_local(other);
    }

    let pads: Vec<_> = fp
        .pads
        .iter()
        .flat_map(|p| fp.polys_to_local(&p.effective_outline(0, max_error)).polygons)
        .collect();
    match crate::board::hull_of(&pads, max_error) {
        Some(hull) => PolySet::from_contour(hull),
        None => PolySet::default(),
    }
}

fn pin_bbox(pin: &Pin, max_error: i64) -> Option<BBox> {
    match &pin.outline {
        PinOutline::Circle { center, radius } => BBox::from_points([
            *center - Point::new(*radius, *radius),
            *center + Point::new(*radius, *radius),
        ]),
        PinOutline::Rect { lower_left, size } => {
            BBox::from_points([*lower_left, *lower_left + Point::new(size.w, -size.h)])
        }
        PinOutline::Contour(polys) => polys.bbox(max_error),
    }
}

/// Smallest distance between any two pin centres
fn min_pitch(centers: &[Point]) -> i64 {
    let mut best: Option<f64> = None;
    for (i, a) in centers.iter().enumerate() {
        for b in &centers[i + 1..] {
            let d = a.distance(*b);
            if best.is_none_or(|m| d < m) {
                best = Some(d);
            }
        }
    }
    best.map_or(PLACEHOLDER_PITCH, |d| d.round() as i64)
}

/// Hash of the footprint geometry with placement, side and nets removed
fn footprint_hash(fp: &Footprint, max_error: i64) -> u64 {
    let mut h = DefaultHasher::new();
    fp.pads.len().hash(&mut h);
    for pad in &fp.pads {
        fp.to_local(pad.position).hash(&mut h);
        ((fp.local_angle(pad.orientation) * 1000.0).round() as i64).hash(&mut h);
        pad.number.hash(&mut h);
        pad.shape.hash(&mut h);
        pad.size.hash(&mut h);
        pad.offset.hash(&mut h);
        pad.drill.hash(&mut h);
        pad.attribute.hash(&mut h);
        pad.roundrect_ratio.to_bits().hash(&mut h);
        pad.chamfer_ratio.to_bits().hash(&mut h);
        pad.chamfer_corners.hash(&mut h);
        pad.trapezoid_delta.hash(&mut h);
        pad.primitives.hash(&mut h);
    }
    // vertex order and winding change under mirroring, so hash the sorted set
    let outline: Vec<Contour> = package_outline(fp, max_error)
        .polygons
        .into_iter()
        .map(|p| p.outline)
        .collect();
    for contour in outline {
        let mut pts = geom::simplify(&contour.flattened(max_error));
        pts.sort();
        pts.hash(&mut h);
    }
    h.finish()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::LayerSet;
    use crate::geom::rect_contour;
    use crate::units::Units;

    fn two_pad(reference: &str, at: Point, angle: f64, flipped: bool) -> Footprint {
        let mut fp = Footprint::new(reference, "R_0603", at);
        fp.orientation = angle;
        fp.flipped = flipped;
        for (num, dx) in [("1", -800_000), ("2", 800_000)] {
            let local = Point::new(dx, 0);
            let local = if flipped { local.mirrored_x() } else { local };
            let mut pad = Pad::new(
                num,
                local.rotated(angle) + at,
                Size::new(800_000, 900_000),
                PadShape::Rect,
            );
            pad.orientation = angle;
            pad.layers = LayerSet::from([BoardLayer::FCu]);
            fp.pads.push(pad);
        }
        fp.courtyard_front =
            PolySet::from_contour(rect_contour(Size::new(3_000_000, 1_500_000)).translated(at));
        if flipped {
            fp.courtyard_back = fp.courtyard_front.clone();
            fp.courtyard_front = PolySet::default();
        }
        fp
    }

    fn eda() -> EdaData {
        EdaData::new(Formatter::new(Units::Mm, None), "test", 5_000)
    }

    #[test]
    fn none_net_always_exists() {
        let eda = eda();
        assert_eq!(eda.nets.len(), 1);
        assert_eq!(eda.nets[0].name, NONE_NET_NAME);
        assert_eq!(eda.net_index(NO_NET), Some(0));
    }

    #[test]
    fn nets_are_created_once_per_code() {
        let mut eda = eda();
        let gnd = eda.add_net(1, "GND");
        assert_eq!(eda.add_net(1, "GND"), gnd);
        assert_eq!(eda.add_net(2, "Net 2"), 2);
        assert_eq!(eda.nets[2].name, "Net_2");
    }

    #[test]
    fn identical_footprints_share_a_package() {
        let mut eda = eda();
        let a = eda.add_package(&two_pad("R1", Point::new(0, 0), 0.0, false));
        let b = eda.add_package(&two_pad("R2", Point::new(5_000_000, 7_000_000), 0.0, false));
        let c = eda.add_package(&two_pad("R3", Point::new(1_000_000, 0), 0.0, true));
        assert_eq!(a, b);
        assert_eq!(a, c);
        assert_eq!(eda.packages.len(), 1);
    }

    #[test]
    fn package_pitch_and_pins() {
        let mut eda = eda();
        let idx = eda.add_package(&two_pad("R1", Point::new(0, 0), 0.0, false));
        let pkg = &eda.packages[idx];
        assert_eq!(pkg.pitch, 1_600_000);
        assert_eq!(pkg.pins.len(), 2);
        assert_eq!(pkg.pins[0].name, "1");
        assert_eq!(pkg.pins[0].kind, PinType::Surface);
        assert_eq!(pkg.pins[0].mount, PinMount::Smt);
        assert!(matches!(pkg.pins[0].outline, PinOutline::Rect { .. }));
    }

    #[test]
    fn package_carries_its_footprint_name_as_geometry() {
        let mut eda = eda();
        eda.add_package(&two_pad("R1", Point::new(0, 0), 0.0, false));
        let mut out = Vec::new();
        eda.write(&mut out).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert!(text.contains("#\n#Attribute names\n#\n@0 .geometry\n"));
        assert!(text.contains("#\n#Attribute text strings\n#\n&0 R_0603\n"));
        let pkg = text.lines().find(|l| l.starts_with("PKG R_0603 ")).unwrap();
        assert!(pkg.ends_with(";0=0"), "{pkg}");
    }

    #[test]
    fn single_pad_package_uses_placeholder_pitch() {
        let mut fp = two_pad("TP1", Point::new(0, 0), 0.0, false);
        fp.pads.truncate(1);
        fp.pads[0].attribute = PadAttribute::Npth;
        fp.pads[0].drill = Some(Size::new(1_000_000, 1_000_000));
        fp.courtyard_front = PolySet::default();
        let mut eda = eda();
        let idx = eda.add_package(&fp);
        let pkg = &eda.packages[idx];
        assert_eq!(pkg.pitch, PLACEHOLDER_PITCH);
        assert_eq!(pkg.pins[0].name, "NPTH0");
        assert_eq!(pkg.pins[0].electrical, PinElectrical::Mechanical);
        assert_eq!(pkg.pins[0].mount, PinMount::Hole);
        // falls back to the pad hull
        assert!(!pkg.outline.is_empty());
    }

    #[test]
    fn feature_ids_are_written_under_their_subnet() {
        let mut eda = eda();
        let net = eda.add_net(1, "GND");
        let trace = eda.add_subnet(net, SubnetKind::Trace);
        eda.add_feature_id(trace, FeatureIdKind::Copper, "f.cu", 4);
        let mut out = Vec::new();
        eda.write(&mut out).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert!(text.starts_with("HDR test\nUNITS=MM\nLYR f.cu\n"));
        assert!(text.contains("NET GND\nSNT TRC\nFID C 0 4\n"));
    }
}
