//! In-memory board model consumed by the exporter.
//!
//! Geometry the layout tool normally derives on demand (zone fills, rendered
//! text, the board outline) is carried precomputed. The model round-trips
//! through JSON so boards can be handed over from other tools.

mod items;
mod layer;

pub use items::*;
pub use layer::*;

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::geom::PolySet;
use crate::{OdbError, Result};

/// Net code of the unconnected net
pub const NO_NET: i32 = 0;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NetInfo {
    pub code: i32,
    pub name: String,
}

/// Stackup entry, listed front to back
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum StackupItem {
    Layer {
        layer: BoardLayer,
    },
    Dielectric {
        name: String,
        /// Core material; prepreg otherwise
        #[serde(default)]
        core: bool,
        #[serde(default)]
        thickness: i64,
    },
}

fn default_max_error() -> i64 {
    5_000
}

fn default_thickness() -> i64 {
    1_600_000
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DesignSettings {
    /// Maximum deviation when approximating arcs with chords
    #[serde(default = "default_max_error")]
    pub max_error: i64,
    pub solder_mask_margin: i64,
    pub solder_paste_margin: i64,
    pub solder_paste_ratio: f64,
    #[serde(default = "default_thickness")]
    pub board_thickness: i64,
}

impl Default for DesignSettings {
    fn default() -> Self {
        Self {
            max_error: default_max_error(),
            solder_mask_margin: 0,
            solder_paste_margin: 0,
            solder_paste_ratio: 0.0,
            board_thickness: default_thickness(),
        }
    }
}

fn default_copper_count() -> usize {
    2
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Board {
    #[serde(default)]
    pub name: String,
    #[serde(default = "default_copper_count")]
    pub copper_layer_count: usize,
    #[serde(default)]
    pub enabled_layers: LayerSet,
    /// User layer names; layers missing here use their default name
    #[serde(default)]
    pub layer_names: BTreeMap<BoardLayer, String>,
    #[serde(default)]
    pub nets: Vec<NetInfo>,
    #[serde(default)]
    pub stackup: Vec<StackupItem>,
    #[serde(default)]
    pub design: DesignSettings,
    #[serde(default)]
    pub outline: PolySet,
    #[serde(default)]
    pub footprints: Vec<Footprint>,
    #[serde(default)]
    pub tracks: Vec<Track>,
    #[serde(default)]
    pub vias: Vec<Via>,
    #[serde(default)]
    pub zones: Vec<Zone>,
    #[serde(default)]
    pub shapes: Vec<Shape>,
    #[serde(default)]
    pub texts: Vec<Text>,
    #[serde(default)]
    pub dimensions: Vec<Dimension>,
    #[serde(default)]
    pub barcodes: Vec<Barcode>,
}

impl Default for Board {
    fn default() -> Self {
        Self::new(2)
    }
}

impl Board {
    /// Empty board with the usual technical layers enabled
    pub fn new(copper_layer_count: usize) -> Self {
        let mut enabled_layers: LayerSet = copper_layers(copper_layer_count).into_iter().collect();
        enabled_layers.extend([
            BoardLayer::FMask,
            BoardLayer::BMask,
            BoardLayer::FPaste,
            BoardLayer::BPaste,
            BoardLayer::FSilkS,
            BoardLayer::BSilkS,
            BoardLayer::EdgeCuts,
        ]);
        Self {
            name: String::new(),
            copper_layer_count,
            enabled_layers,
            layer_names: BTreeMap::new(),
            nets: Vec::new(),
            stackup: Vec::new(),
            design: DesignSettings::default(),
            outline: PolySet::default(),
            footprints: Vec::new(),
            tracks: Vec::new(),
            vias: Vec::new(),
            zones: Vec::new(),
            shapes: Vec::new(),
            texts: Vec::new(),
            dimensions: Vec::new(),
            barcodes: Vec::new(),
        }
    }

    pub fn from_json(s: &str) -> Result<Self> {
        let board: Board = serde_json::from_str(s)?;
        board.validate()?;
        Ok(board)
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Reject boards the exporter cannot represent
    pub fn validate(&self) -> Result<()> {
        let max = MAX_INNER_LAYERS as usize + 2;
        if self.copper_layer_count < 2 || self.copper_layer_count > max {
            return Err(OdbError::InvalidBoard(format!(
                "copper layer count {} outside 2..={max}",
                self.copper_layer_count
            )));
        }
        if self.copper_layer_count % 2 != 0 {
            return Err(OdbError::InvalidBoard(format!(
                "copper layer count {} is odd",
                self.copper_layer_count
            )));
        }
        for layer in &self.enabled_layers {
            if let BoardLayer::In(n) = layer {
                if *n as usize > self.copper_layer_count - 2 {
                    return Err(OdbError::InvalidBoard(format!(
                        "{layer} enabled on a {}-layer board",
                        self.copper_layer_count
                    )));
                }
            }
        }
        Ok(())
    }

    pub fn layer_name(&self, layer: BoardLayer) -> String {
        self.layer_names
            .get(&layer)
            .cloned()
            .unwrap_or_else(|| layer.default_name())
    }

    pub fn copper_layers(&self) -> Vec<BoardLayer> {
        copper_layers(self.copper_layer_count)
    }

    pub fn is_enabled(&self, layer: BoardLayer) -> bool {
        self.enabled_layers.contains(&layer)
    }

    pub fn net_name(&self, code: i32) -> Option<&str> {
        self.nets
            .iter()
            .find(|n| n.code == code)
            .map(|n| n.name.as_str())
    }

    pub fn add_net(&mut self, name: &str) -> i32 {
        if let Some(net) = self.nets.iter().find(|n| n.name == name) {
            return net.code;
        }
        let code = self.nets.iter().map(|n| n.code).max().unwrap_or(0) + 1;
        self.nets.push(NetInfo {
            code,
            name: name.to_string(),
        });
        code
    }

    pub fn has_flipped_footprints(&self) -> bool {
        self.footprints.iter().any(|fp| fp.flipped)
    }

    /// Every pad on the board together with its footprint
    pub fn pads(&self) -> impl Iterator<Item = (&Footprint, &Pad)> {
        self.footprints
            .iter()
            .flat_map(|fp| fp.pads.iter().map(move |pad| (fp, pad)))
    }

    /// Board-level and footprint-owned zones
    pub fn all_zones(&self) -> impl Iterator<Item = &Zone> {
        self.zones
            .iter()
            .chain(self.footprints.iter().flat_map(|fp| fp.zones.iter()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geom::{Point, Size};

    #[test]
    fn json_round_trip_keeps_items() {
        let mut board = Board::new(4);
        let gnd = board.add_net("GND");
        let mut fp = Footprint::new("R1", "R_0603", Point::new(0, 0));
        let mut pad = Pad::new("1", Point::new(-800_000, 0), Size::new(800_000, 900_000), PadShape::Rect);
        pad.net = gnd;
        pad.layers.insert(BoardLayer::FCu);
        fp.pads.push(pad);
        board.footprints.push(fp);
        board.vias.push(Via::new(Point::new(5, 5), 600_000, 300_000, gnd));

        let json = board.to_json().unwrap();
        let back = Board::from_json(&json).unwrap();
        assert_eq!(back, board);
        assert!(json.contains("\"F.Cu\""));
    }

    #[test]
    fn missing_fields_take_defaults() {
        let board = Board::from_json("{}").unwrap();
        assert_eq!(board.copper_layer_count, 2);
        assert_eq!(board.design.max_error, 5_000);
        assert!(board.footprints.is_empty());
    }

    #[test]
    fn odd_layer_count_is_rejected() {
        let err = Board::from_json(r#"{"copper_layer_count": 3}"#).unwrap_err();
        assert!(matches!(err, OdbError::InvalidBoard(_)));
    }

    #[test]
    fn net_codes_are_stable() {
        let mut board = Board::new(2);
        let a = board.add_net("A");
        let b = board.add_net("B");
        assert_eq!(board.add_net("A"), a);
        assert_ne!(a, b);
        assert_eq!(board.net_name(b), Some("B"));
        assert_eq!(board.net_name(NO_NET), None);
    }
}
