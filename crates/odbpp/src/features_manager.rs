//! Per-layer feature accumulation.
//!
//! The manager walks the board items assigned to one layer, emits their
//! features, attaches system attributes and links every feature to the
//! subnet of the item that produced it.

use std::collections::BTreeMap;
use std::io::{self, Write};
use std::ops::Range;

use crate::attr::{AttrManager, Attribute, DrillKind, PadUsage};
use crate::board::{
    Barcode, Board, BoardLayer, Dimension, FillMode, Footprint, LayerClass, Pad, PadProperty,
    PadShape, Shape, ShapeGeometry, Text, Track, Via, Zone,
};
use crate::eda_data::{EdaData, FeatureIdKind, SubnetRef};
use crate::feature::{Feature, FeatureKind};
use crate::geom::{Point, PolySet, Polygon, arc_center, arc_is_clockwise, bezier_points, corners};
use crate::symbols::{SymbolDict, mirror_corners};
use crate::units::Formatter;

/// Board item borrowed for one layer
#[derive(Debug, Clone, Copy)]
pub enum BoardItem<'a> {
    Track(&'a Track),
    Via(&'a Via),
    Pad(&'a Footprint, &'a Pad),
    Zone(&'a Zone),
    Shape(&'a Shape),
    Text(&'a Text),
    Dimension(&'a Dimension),
    Barcode(&'a Barcode),
}

impl BoardItem<'_> {
    /// Net code of the item; graphics without a net report zero
    pub fn net(&self) -> i32 {
        match self {
            BoardItem::Track(t) => t.net,
            BoardItem::Via(v) => v.net,
            BoardItem::Pad(_, p) => p.net,
            BoardItem::Zone(z) => z.net,
            BoardItem::Shape(s) => s.net,
            BoardItem::Text(_) | BoardItem::Dimension(_) | BoardItem::Barcode(_) => 0,
        }
    }
}

/// Items of one layer, grouped by net code
pub type LayerItems<'a> = BTreeMap<i32, Vec<BoardItem<'a>>>;

/// Layers whose features are holes: drill spans and via fill/cap/plug layers
pub fn is_hole_layer(name: &str) -> bool {
    ["drill", "filling", "capping", "plugging"]
        .iter()
        .any(|k| name.contains(k))
}

pub fn is_drill_layer(name: &str) -> bool {
    name.contains("drill")
}

pub fn is_aux_layer(name: &str) -> bool {
    ["filling", "capping", "covering", "plugging", "tenting"]
        .iter()
        .any(|k| name.contains(k))
}

#[derive(Debug)]
pub struct FeaturesManager {
    fmt: Formatter,
    max_error: i64,
    layer_name: String,
    features: Vec<Feature>,
    symbols: SymbolDict,
    attrs: AttrManager,
}

impl FeaturesManager {
    pub fn new(fmt: Formatter, layer_name: &str, max_error: i64) -> Self {
        Self {
            fmt,
            max_error,
            layer_name: layer_name.to_string(),
            features: Vec::new(),
            symbols: SymbolDict::new(fmt),
            attrs: AttrManager::new(),
        }
    }

    pub fn layer_name(&self) -> &str {
        &self.layer_name
    }

    pub fn features(&self) -> &[Feature] {
        &self.features
    }

    pub fn len(&self) -> usize {
        self.features.len()
    }

    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }

    pub fn symbols(&self) -> &SymbolDict {
        &self.symbols
    }

    fn push(&mut self, kind: FeatureKind) {
        self.features.push(Feature::new(kind));
    }

    pub fn add_feature_line(&mut self, start: Point, end: Point, width: i64) {
        let symbol = self.symbols.circle(width);
        self.push(FeatureKind::Line { start, end, symbol });
    }

    /// `clockwise` is the direction in the output frame
    pub fn add_feature_arc(
        &mut self,
        start: Point,
        end: Point,
        center: Point,
        width: i64,
        clockwise: bool,
    ) {
        let symbol = self.symbols.circle(width);
        self.push(FeatureKind::Arc {
            start,
            end,
            center,
            symbol,
            clockwise,
        });
    }

    pub fn add_pad_circle(&mut self, center: Point, diameter: i64) {
        let symbol = self.symbols.circle(diameter);
        self.push(FeatureKind::Pad {
            center,
            symbol,
            angle: 0.0,
            mirror: false,
            resize: None,
        });
    }

    /// One surface per polygon; degenerate outlines are dropped
    pub fn add_feature_surface(&mut self, polygon: &Polygon) {
        if polygon.outline.is_degenerate() {
            return;
        }
        let contours = std::iter::once(polygon.outline.clone())
            .chain(polygon.holes.iter().filter(|h| !h.is_degenerate()).cloned())
            .collect();
        self.push(FeatureKind::Surface { contours });
    }

    /// Emit outline `idx` of `polys` (with its holes) as one surface.
    ///
    /// Returns false, leaving the feature list untouched, when the outline
    /// does not exist or encloses no area.
    pub fn add_contour(&mut self, polys: &PolySet, idx: usize) -> bool {
        let Some(polygon) = polys.polygons.get(idx) else {
            return false;
        };
        if polygon.outline.is_degenerate() {
            return false;
        }
        self.add_feature_surface(polygon);
        true
    }

    fn add_polyset(&mut self, polys: &PolySet) {
        for idx in 0..polys.outline_count() {
            self.add_contour(polys, idx);
        }
    }

    fn add_polyline(&mut self, points: &[Point], width: i64, closed: bool) {
        for pair in points.windows(2) {
            self.add_feature_line(pair[0], pair[1], width);
        }
        if closed && points.len() > 2 {
            if let (Some(&last), Some(&first)) = (points.last(), points.first()) {
                self.add_feature_line(last, first, width);
            }
        }
    }

    /// Graphic shape; `margin` grows it (solder mask expansion)
    pub fn add_shape(&mut self, shape: &Shape, margin: i64) {
        let width = shape.width;
        match &shape.geometry {
            ShapeGeometry::Segment { start, end } => {
                self.add_feature_line(*start, *end, width + 2 * margin);
            }
            ShapeGeometry::Rect { start, end } => {
                let w = (end.x - start.x).abs() + 2 * margin;
                let h = (end.y - start.y).abs() + 2 * margin;
                let center = Point::new((start.x + end.x) / 2, (start.y + end.y) / 2);
                let symbol = if shape.fill == FillMode::Solid {
                    if width > 0 {
                        self.symbols
                            .round_rect(w + width, h + width, width / 2, corners::ALL)
                    } else {
                        self.symbols.rect(w, h)
                    }
                } else {
                    self.symbols
                        .round_rect_donut(w + width, h + width, width, width / 2)
                };
                self.push(FeatureKind::Pad {
                    center,
                    symbol,
                    angle: 0.0,
                    mirror: false,
                    resize: None,
                });
            }
            ShapeGeometry::Circle { center, radius } => {
                let d = 2 * radius + 2 * margin;
                let symbol = if shape.fill == FillMode::Solid {
                    self.symbols.circle(d + width)
                } else {
                    self.symbols.round_donut(d + width, d - width)
                };
                self.push(FeatureKind::Pad {
                    center: *center,
                    symbol,
                    angle: 0.0,
                    mirror: false,
                    resize: None,
                });
            }
            ShapeGeometry::Arc { start, mid, end } => match arc_center(*start, *mid, *end) {
                Some(center) => {
                    let cw = arc_is_clockwise(*start, *mid, *end);
                    self.add_feature_arc(*start, *end, center, width + 2 * margin, !cw);
                }
                None => self.add_feature_line(*start, *end, width + 2 * margin),
            },
            ShapeGeometry::Poly { polys } => {
                let polys = if margin != 0 {
                    polys.inflated(margin, self.max_error)
                } else {
                    polys.clone()
                };
                if shape.fill == FillMode::Solid {
                    self.add_polyset(&polys);
                }
                if width > 0 || shape.fill == FillMode::None {
                    for poly in &polys.polygons {
                        let pts = poly.outline.flattened(self.max_error);
                        self.add_polyline(&pts, width, true);
                    }
                }
            }
            ShapeGeometry::Bezier { start, c1, c2, end } => {
                let pts = bezier_points(*start, *c1, *c2, *end, self.max_error);
                self.add_polyline(&pts, width + 2 * margin, false);
            }
        }

        if shape.fill == FillMode::Hatch {
            self.add_polyset(&shape.hatching);
        }
    }

    /// Pad flash grown by `margin`; trapezoid and custom pads become surfaces
    pub fn add_pad_shape(&mut self, pad: &Pad, mirror: bool, margin: i64) {
        let size = pad.size.inflated(margin);
        let symbol = match pad.shape {
            PadShape::Circle => self.symbols.circle(size.w),
            PadShape::Rect if margin > 0 => {
                self.symbols.round_rect(size.w, size.h, margin, corners::ALL)
            }
            PadShape::Rect => self.symbols.rect(size.w, size.h),
            PadShape::Oval => self.symbols.oval(size.w, size.h),
            PadShape::RoundRect => self.symbols.round_rect(
                size.w,
                size.h,
                pad.round_rect_radius() + margin,
                corners::ALL,
            ),
            PadShape::ChamferedRect => {
                let mask = if mirror {
                    mirror_corners(pad.chamfer_corners)
                } else {
                    pad.chamfer_corners
                };
                self.symbols
                    .chamfered_rect(size.w, size.h, pad.chamfer_size(), mask)
            }
            PadShape::Trapezoid | PadShape::Custom => {
                let outline = pad.effective_outline(margin, self.max_error);
                self.add_polyset(&outline);
                return;
            }
        };
        self.push(FeatureKind::Pad {
            center: pad.shape_center(),
            symbol,
            angle: pad.orientation,
            mirror,
            resize: None,
        });
    }

    /// Via flash on a copper or mask layer
    pub fn add_via(&mut self, via: &Via, margin: i64) {
        self.add_pad_circle(via.position, via.width + 2 * margin);
    }

    pub fn add_via_drill_hole(&mut self, via: &Via) {
        self.add_pad_circle(via.position, via.drill);
    }

    /// Pad hole as a circle or oval at the hole centre
    pub fn add_pad_drill_hole(&mut self, pad: &Pad) {
        let Some(drill) = pad.drill else { return };
        if drill.w == drill.h {
            self.add_pad_circle(pad.position, drill.w);
            return;
        }
        let symbol = self.symbols.oval(drill.w, drill.h);
        self.push(FeatureKind::Pad {
            center: pad.position,
            symbol,
            angle: pad.orientation,
            mirror: false,
            resize: None,
        });
    }

    /// Rendered text. Strokes become line chains; knockout text its filled outline.
    pub fn add_text(&mut self, text: &Text) {
        if text.knockout {
            self.add_polyset(&text.knockout_polys);
            return;
        }
        for stroke in &text.strokes {
            match stroke.as_slice() {
                [] => {}
                [p] => self.add_feature_line(*p, *p, text.stroke_width),
                pts => self.add_polyline(pts, text.stroke_width, false),
            }
        }
    }

    fn tag(&mut self, range: Range<usize>, attr: &Attribute) {
        for feature in &mut self.features[range] {
            self.attrs.add(&mut feature.attrs, attr, &self.fmt);
        }
    }

    fn link(&self, eda: &mut EdaData, range: Range<usize>, sref: SubnetRef, kind: FeatureIdKind) {
        for fid in range {
            eda.add_feature_id(sref, kind, &self.layer_name, fid);
        }
    }

    /// Emit every item of the layer.
    ///
    /// Items whose subnet lookup is missing are logged and skipped.
    pub fn init_feature_list(
        &mut self,
        board: &Board,
        eda: &mut EdaData,
        layer: Option<BoardLayer>,
        items: &LayerItems<'_>,
    ) {
        let hole_layer = is_hole_layer(&self.layer_name);
        let aux_layer = is_aux_layer(&self.layer_name);
        let copper = layer.is_some_and(|l| l.is_copper());

        for item in items.values().flatten() {
            let before = self.features.len();
            match *item {
                BoardItem::Track(track) => {
                    match track.mid.and_then(|mid| {
                        arc_center(track.start, mid, track.end)
                            .map(|c| (c, arc_is_clockwise(track.start, mid, track.end)))
                    }) {
                        Some((center, cw)) => {
                            self.add_feature_arc(track.start, track.end, center, track.width, !cw)
                        }
                        None => self.add_feature_line(track.start, track.end, track.width),
                    }
                    if copper {
                        match eda.lookups.tracks.get(&track.id).copied() {
                            Some(sref) => {
                                self.link(eda, before..self.features.len(), sref, FeatureIdKind::Copper)
                            }
                            None => log::error!("no subnet for track {}", track.id),
                        }
                    }
                }
                BoardItem::Via(via) => {
                    // backdrilling removes the barrel, it belongs to no net
                    if self.layer_name.contains("backdrill") {
                        if let Some(bd) = &via.backdrill {
                            self.add_pad_circle(via.position, bd.diameter);
                            let end = self.features.len();
                            self.tag(before..end, &Attribute::Drill(DrillKind::NonPlated));
                        }
                        continue;
                    }
                    let sref = eda.lookups.tracks.get(&via.id).copied();
                    if hole_layer || aux_layer {
                        let Some(sref) = sref else {
                            log::error!("no subnet for via {}", via.id);
                            continue;
                        };
                        if hole_layer {
                            self.add_via_drill_hole(via);
                            let end = self.features.len();
                            self.tag(before..end, &Attribute::Drill(DrillKind::Via));
                            let geometry = format!("VIA_RoundD{}", self.fmt.data(via.width));
                            self.tag(before..end, &Attribute::Geometry(geometry));
                        } else {
                            self.add_via(via, 0);
                        }
                        self.link(eda, before..self.features.len(), sref, FeatureIdKind::Hole);
                    } else if copper {
                        let Some(sref) = sref else {
                            log::error!("no subnet for via {}", via.id);
                            continue;
                        };
                        self.add_via(via, 0);
                        let end = self.features.len();
                        self.tag(before..end, &Attribute::PadUsage(PadUsage::Via));
                        self.link(eda, before..end, sref, FeatureIdKind::Copper);
                    } else {
                        self.add_via(via, board.design.solder_mask_margin);
                    }
                }
                BoardItem::Pad(fp, pad) => self.emit_pad(board, eda, layer, fp, pad),
                BoardItem::Zone(zone) => {
                    let Some(l) = layer else { continue };
                    let Some(fill) = zone.fill(l) else { continue };
                    let sref = if copper {
                        match eda.lookups.planes.get(&(l, zone.id)).copied() {
                            Some(sref) => Some(sref),
                            None => {
                                log::error!("no plane subnet for zone {} on {l}", zone.id);
                                continue;
                            }
                        }
                    } else {
                        None
                    };
                    for idx in 0..fill.outline_count() {
                        let start = self.features.len();
                        if !self.add_contour(fill, idx) {
                            continue;
                        }
                        let end = self.features.len();
                        if zone.teardrop {
                            self.tag(start..end, &Attribute::TearDrop);
                        }
                        if let Some(sref) = sref {
                            self.link(eda, start..end, sref, FeatureIdKind::Copper);
                        }
                    }
                }
                BoardItem::Shape(shape) => {
                    let margin = match layer.map(|l| l.class()) {
                        Some(LayerClass::Mask) => shape.solder_mask_margin.unwrap_or(0),
                        _ => 0,
                    };
                    self.add_shape(shape, margin);
                }
                BoardItem::Text(text) => {
                    self.add_text(text);
                    let end = self.features.len();
                    self.tag(before..end, &Attribute::String(text.text.clone()));
                }
                BoardItem::Dimension(dim) => {
                    log::warn!("dimension {} on {} is not exported", dim.id, self.layer_name);
                }
                BoardItem::Barcode(code) => {
                    log::warn!("barcode {} on {} is not exported", code.id, self.layer_name);
                }
            }
        }
        log::debug!("{}: {} features", self.layer_name, self.features.len());
    }

    fn emit_pad(
        &mut self,
        board: &Board,
        eda: &mut EdaData,
        layer: Option<BoardLayer>,
        fp: &Footprint,
        pad: &Pad,
    ) {
        let before = self.features.len();

        if is_drill_layer(&self.layer_name) {
            if !pad.has_hole() {
                return;
            }
            let sref = eda.lookups.pads.get(&pad.id).copied();
            self.add_pad_drill_hole(pad);
            let end = self.features.len();
            let kind = if pad.is_plated() {
                DrillKind::Plated
            } else {
                DrillKind::NonPlated
            };
            self.tag(before..end, &Attribute::Drill(kind));
            if pad.is_plated() {
                match sref {
                    Some(sref) => self.link(eda, before..end, sref, FeatureIdKind::Hole),
                    None => log::error!("no subnet for pad {} of {}", pad.number, fp.reference),
                }
            }
            return;
        }

        let Some(l) = layer else { return };
        if l.is_copper() {
            let Some(sref) = eda.lookups.pads.get(&pad.id).copied() else {
                log::error!("no subnet for pad {} of {}", pad.number, fp.reference);
                return;
            };
            self.add_pad_shape(pad, fp.flipped, 0);
            let end = self.features.len();
            let usage = match pad.property {
                PadProperty::FiducialGlobal => PadUsage::GlobalFiducial,
                PadProperty::FiducialLocal => PadUsage::LocalFiducial,
                _ => PadUsage::Toeprint,
            };
            self.tag(before..end, &Attribute::PadUsage(usage));
            if !pad.has_hole() {
                self.tag(before..end, &Attribute::Smd);
            }
            self.link(eda, before..end, sref, FeatureIdKind::Copper);
            return;
        }

        let margin = match l.class() {
            LayerClass::Mask => pad
                .solder_mask_margin
                .unwrap_or(board.design.solder_mask_margin),
            LayerClass::Paste => {
                let margin = pad
                    .solder_paste_margin
                    .unwrap_or(board.design.solder_paste_margin);
                let ratio = pad
                    .solder_paste_ratio
                    .unwrap_or(board.design.solder_paste_ratio);
                margin + (ratio * pad.size.min_dim() as f64).round() as i64
            }
            _ => 0,
        };
        // a paste opening cannot shrink past nothing
        if pad.size.min_dim() + 2 * margin <= 0 {
            return;
        }
        self.add_pad_shape(pad, fp.flipped, margin);
        if pad.property == PadProperty::FiducialGlobal || pad.property == PadProperty::FiducialLocal
        {
            let end = self.features.len();
            let usage = if pad.property == PadProperty::FiducialGlobal {
                PadUsage::GlobalFiducial
            } else {
                PadUsage::LocalFiducial
            };
            self.tag(before..end, &Attribute::PadUsage(usage));
        }
    }

    /// `features` file of the layer
    pub fn write_features_file(&self, out: &mut dyn Write) -> io::Result<()> {
        writeln!(out, "UNITS={}", self.fmt.units().as_str())?;
        writeln!(out, "#\n#Num Features\n#\nF {}\n", self.features.len())?;
        if !self.symbols.is_empty() {
            writeln!(out, "#\n#Feature symbol names\n#")?;
            self.symbols.write(out)?;
            writeln!(out)?;
        }
        self.attrs.write_tables(out)?;
        if !self.features.is_empty() {
            writeln!(out, "#\n#Layer features\n#")?;
        }
        for feature in &self.features {
            feature.write(out, &self.fmt)?;
        }
        Ok(())
    }
}
