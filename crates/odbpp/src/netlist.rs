//! `netlists/cadnet/netlist`: one test point per net pad and via.

use std::io::{self, Write};

use crate::board::{Board, BoardLayer, NO_NET, PadShape, Side};
use crate::eda_data::EdaData;
use crate::geom::{Point, Size};
use crate::units::{Formatter, normalize_angle};

/// Copper access of a point
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PointSide {
    Top,
    Bottom,
    Both,
}

impl PointSide {
    fn letter(&self) -> char {
        match self {
            PointSide::Top => 'T',
            PointSide::Bottom => 'B',
            PointSide::Both => 'D',
        }
    }
}

/// Solder mask exposure of a point
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Exposure {
    /// Exposed on both sides
    Both,
    Covered,
    /// Exposed on the primary (top) side only
    Primary,
    /// Exposed on the secondary (bottom) side only
    Secondary,
}

impl Exposure {
    pub fn from_openings(front: bool, back: bool) -> Self {
        match (front, back) {
            (true, true) => Exposure::Both,
            (true, false) => Exposure::Primary,
            (false, true) => Exposure::Secondary,
            (false, false) => Exposure::Covered,
        }
    }

    fn letter(&self) -> char {
        match self {
            Exposure::Both => 'e',
            Exposure::Covered => 'c',
            Exposure::Primary => 'p',
            Exposure::Secondary => 's',
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct NetPoint {
    pub net: usize,
    /// Drill radius, zero for surface pads
    pub radius: i64,
    pub center: Point,
    pub side: PointSide,
    /// Pad size for non-circular pads
    pub size: Option<Size>,
    pub exposure: Exposure,
    pub via: bool,
}

#[derive(Debug, Clone)]
pub struct Netlist {
    fmt: Formatter,
    nets: Vec<String>,
    points: Vec<NetPoint>,
}

impl Netlist {
    /// Collect the points of every connected pad and via.
    ///
    /// Net indices are those of `eda`, so both files agree.
    pub fn build(board: &Board, eda: &EdaData, fmt: Formatter) -> Self {
        let nets = eda.nets.iter().map(|n| n.name.clone()).collect();
        let mut points = Vec::new();

        for (_, pad) in board.pads() {
            if pad.net == NO_NET {
                continue;
            }
            let Some(net) = eda.net_index(pad.net) else {
                continue;
            };
            let side = if pad.has_hole() {
                PointSide::Both
            } else if pad.is_on(BoardLayer::FCu) {
                PointSide::Top
            } else if pad.is_on(BoardLayer::BCu) {
                PointSide::Bottom
            } else {
                continue;
            };
            let size = (pad.shape != PadShape::Circle).then(|| {
                let a = normalize_angle(pad.orientation);
                if (a - 90.0).abs() < 1e-6 || (a - 270.0).abs() < 1e-6 {
                    Size::new(pad.size.h, pad.size.w)
                } else {
                    pad.size
                }
            });
            points.push(NetPoint {
                net,
                radius: pad.drill.map(|d| d.w.min(d.h) / 2).unwrap_or(0),
                center: pad.position,
                side,
                size,
                exposure: Exposure::from_openings(
                    pad.is_on(BoardLayer::FMask),
                    pad.is_on(BoardLayer::BMask),
                ),
                via: false,
            });
        }

        for via in &board.vias {
            if via.net == NO_NET {
                continue;
            }
            let Some(net) = eda.net_index(via.net) else {
                continue;
            };
            let side = match (via.reaches(Side::Top), via.reaches(Side::Bottom)) {
                (true, true) => PointSide::Both,
                (true, false) => PointSide::Top,
                (false, true) => PointSide::Bottom,
                // buried vias cannot be probed
                (false, false) => continue,
            };
            let front = via.reaches(Side::Top) && !via.tenting.front;
            let back = via.reaches(Side::Bottom) && !via.tenting.back;
            points.push(NetPoint {
                net,
                radius: via.drill / 2,
                center: via.position,
                side,
                size: None,
                exposure: Exposure::from_openings(front, back),
                via: true,
            });
        }

        Self { fmt, nets, points }
    }

    pub fn points(&self) -> &[NetPoint] {
        &self.points
    }

    pub fn write(&self, out: &mut dyn Write) -> io::Result<()> {
        let fmt = &self.fmt;
        writeln!(out, "H optimize n staggered n")?;
        for (idx, name) in self.nets.iter().enumerate() {
            writeln!(out, "${idx} {name}")?;
        }
        writeln!(out, "#\n#Netlist points\n#")?;
        for p in &self.points {
            write!(
                out,
                "{} {} {} {}",
                p.net,
                fmt.data(p.radius),
                fmt.point(p.center),
                p.side.letter()
            )?;
            if let Some(size) = p.size {
                write!(out, " {} {}", fmt.data(size.w), fmt.data(size.h))?;
            }
            write!(out, " e {}", p.exposure.letter())?;
            if p.via {
                write!(out, " v")?;
            }
            writeln!(out)?;
        }
        Ok(())
    }
}
