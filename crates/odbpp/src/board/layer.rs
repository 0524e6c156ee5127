use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

/// Highest inner copper layer number
pub const MAX_INNER_LAYERS: u8 = 30;

/// Board layer identifier.
///
/// The derived ordering follows the physical stack for copper: front copper,
/// inner layers in order, back copper. Technical layers sort after copper.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum BoardLayer {
    FCu,
    In(u8),
    BCu,
    FAdhes,
    BAdhes,
    FPaste,
    BPaste,
    FSilkS,
    BSilkS,
    FMask,
    BMask,
    DwgsUser,
    CmtsUser,
    Eco1User,
    Eco2User,
    EdgeCuts,
    Margin,
    FCrtYd,
    BCrtYd,
    FFab,
    BFab,
    User(u8),
}

/// Broad layer category used by the matrix mapping table
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LayerClass {
    Copper,
    Mask,
    Paste,
    Silk,
    Adhesive,
    Fab,
    Courtyard,
    EdgeCuts,
    User,
    Margin,
}

/// Side of the board
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    Top,
    Bottom,
}

impl Side {
    /// Single-letter code used by the netlist records
    pub fn letter(&self) -> char {
        match self {
            Side::Top => 'T',
            Side::Bottom => 'B',
        }
    }
}

impl BoardLayer {
    pub fn is_copper(&self) -> bool {
        matches!(self, BoardLayer::FCu | BoardLayer::In(_) | BoardLayer::BCu)
    }

    pub fn class(&self) -> LayerClass {
        use BoardLayer::*;
        match self {
            FCu | In(_) | BCu => LayerClass::Copper,
            FMask | BMask => LayerClass::Mask,
            FPaste | BPaste => LayerClass::Paste,
            FSilkS | BSilkS => LayerClass::Silk,
            FAdhes | BAdhes => LayerClass::Adhesive,
            FFab | BFab => LayerClass::Fab,
            FCrtYd | BCrtYd => LayerClass::Courtyard,
            EdgeCuts => LayerClass::EdgeCuts,
            Margin => LayerClass::Margin,
            DwgsUser | CmtsUser | Eco1User | Eco2User | User(_) => LayerClass::User,
        }
    }

    pub fn side(&self) -> Option<Side> {
        use BoardLayer::*;
        match self {
            FCu | FAdhes | FPaste | FSilkS | FMask | FCrtYd | FFab => Some(Side::Top),
            BCu | BAdhes | BPaste | BSilkS | BMask | BCrtYd | BFab => Some(Side::Bottom),
            _ => None,
        }
    }

    /// Counterpart on the opposite side; layers without a side map to themselves
    pub fn flipped(&self) -> BoardLayer {
        use BoardLayer::*;
        match *self {
            FCu => BCu,
            BCu => FCu,
            FAdhes => BAdhes,
            BAdhes => FAdhes,
            FPaste => BPaste,
            BPaste => FPaste,
            FSilkS => BSilkS,
            BSilkS => FSilkS,
            FMask => BMask,
            BMask => FMask,
            FCrtYd => BCrtYd,
            BCrtYd => FCrtYd,
            FFab => BFab,
            BFab => FFab,
            other => other,
        }
    }

    /// Copper layer for a side
    pub fn copper(side: Side) -> BoardLayer {
        match side {
            Side::Top => BoardLayer::FCu,
            Side::Bottom => BoardLayer::BCu,
        }
    }

    /// Solder mask layer for a side
    pub fn mask(side: Side) -> BoardLayer {
        match side {
            Side::Top => BoardLayer::FMask,
            Side::Bottom => BoardLayer::BMask,
        }
    }

    /// Conventional name, as shown in the layer manager
    pub fn default_name(&self) -> String {
        use BoardLayer::*;
        match self {
            FCu => "F.Cu".into(),
            In(n) => format!("In{n}.Cu"),
            BCu => "B.Cu".into(),
            FAdhes => "F.Adhes".into(),
            BAdhes => "B.Adhes".into(),
            FPaste => "F.Paste".into(),
            BPaste => "B.Paste".into(),
            FSilkS => "F.SilkS".into(),
            BSilkS => "B.SilkS".into(),
            FMask => "F.Mask".into(),
            BMask => "B.Mask".into(),
            DwgsUser => "Dwgs.User".into(),
            CmtsUser => "Cmts.User".into(),
            Eco1User => "Eco1.User".into(),
            Eco2User => "Eco2.User".into(),
            EdgeCuts => "Edge.Cuts".into(),
            Margin => "Margin".into(),
            FCrtYd => "F.CrtYd".into(),
            BCrtYd => "B.CrtYd".into(),
            FFab => "F.Fab".into(),
            BFab => "B.Fab".into(),
            User(n) => format!("User.{n}"),
        }
    }
}

impl fmt::Display for BoardLayer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.default_name())
    }
}

impl FromStr for BoardLayer {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        use BoardLayer::*;
        let layer = match s {
            "F.Cu" => FCu,
            "B.Cu" => BCu,
            "F.Adhes" => FAdhes,
            "B.Adhes" => BAdhes,
            "F.Paste" => FPaste,
            "B.Paste" => BPaste,
            "F.SilkS" => FSilkS,
            "B.SilkS" => BSilkS,
            "F.Mask" => FMask,
            "B.Mask" => BMask,
            "Dwgs.User" => DwgsUser,
            "Cmts.User" => CmtsUser,
            "Eco1.User" => Eco1User,
            "Eco2.User" => Eco2User,
            "Edge.Cuts" => EdgeCuts,
            "Margin" => Margin,
            "F.CrtYd" => FCrtYd,
            "B.CrtYd" => BCrtYd,
            "F.Fab" => FFab,
            "B.Fab" => BFab,
            _ => {
                if let Some(n) = s.strip_prefix("In").and_then(|r| r.strip_suffix(".Cu")) {
                    let n: u8 = n.parse().map_err(|_| format!("invalid inner layer: {s}"))?;
                    if n == 0 || n > MAX_INNER_LAYERS {
                        return Err(format!("inner layer out of range: {s}"));
                    }
                    In(n)
                } else if let Some(n) = s.strip_prefix("User.") {
                    User(n.parse().map_err(|_| format!("invalid user layer: {s}"))?)
                } else {
                    return Err(format!("unknown layer: {s}"));
                }
            }
        };
        Ok(layer)
    }
}

impl TryFrom<String> for BoardLayer {
    type Error = String;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

impl From<BoardLayer> for String {
    fn from(layer: BoardLayer) -> String {
        layer.default_name()
    }
}

pub type LayerSet = BTreeSet<BoardLayer>;

/// Copper layers of a board with `count` copper layers, front to back
pub fn copper_layers(count: usize) -> Vec<BoardLayer> {
    let count = count.max(2);
    let inner = (count - 2).min(MAX_INNER_LAYERS as usize) as u8;
    std::iter::once(BoardLayer::FCu)
        .chain((1..=inner).map(BoardLayer::In))
        .chain(std::iter::once(BoardLayer::BCu))
        .collect()
}

/// Copper layers between `a` and `b` inclusive, in stack order
pub fn copper_span(a: BoardLayer, b: BoardLayer, count: usize) -> Vec<BoardLayer> {
    let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
    copper_layers(count)
        .into_iter()
        .filter(|l| *l >= lo && *l <= hi)
        .collect()
}
