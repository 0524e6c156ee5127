//! Feature records of a layer `features` file.

use std::io::{self, Write};

use crate::attr::AttrRecord;
use crate::geom::{Contour, Point, Segment};
use crate::units::{Formatter, odb_rotation};

#[derive(Debug, Clone, PartialEq)]
pub enum FeatureKind {
    Line {
        start: Point,
        end: Point,
        symbol: usize,
    },
    /// `clockwise` is the direction in the output frame (Y up).
    /// A start equal to the end is a full circle.
    Arc {
        start: Point,
        end: Point,
        center: Point,
        symbol: usize,
        clockwise: bool,
    },
    /// Flash of `symbol`; `angle` is counter-clockwise in board terms
    Pad {
        center: Point,
        symbol: usize,
        angle: f64,
        mirror: bool,
        resize: Option<f64>,
    },
    /// First contour is the island, the rest are holes
    Surface { contours: Vec<Contour> },
}

#[derive(Debug, Clone, PartialEq)]
pub struct Feature {
    pub kind: FeatureKind,
    pub attrs: AttrRecord,
}

impl Feature {
    pub fn new(kind: FeatureKind) -> Self {
        Self {
            kind,
            attrs: AttrRecord::default(),
        }
    }

    pub fn tag(&self) -> char {
        match self.kind {
            FeatureKind::Line { .. } => 'L',
            FeatureKind::Arc { .. } => 'A',
            FeatureKind::Pad { .. } => 'P',
            FeatureKind::Surface { .. } => 'S',
        }
    }

    /// Write the record with its type tag and trailing newline
    pub fn write(&self, out: &mut dyn Write, fmt: &Formatter) -> io::Result<()> {
        write!(out, "{} ", self.tag())?;
        self.write_record_content(out, fmt)?;
        writeln!(out)
    }

    fn write_record_content(&self, out: &mut dyn Write, fmt: &Formatter) -> io::Result<()> {
        match &self.kind {
            FeatureKind::Line { start, end, symbol } => {
                write!(out, "{} {} {symbol} P 0", fmt.point(*start), fmt.point(*end))?;
                self.attrs.write(out)
            }
            FeatureKind::Arc {
                start,
                end,
                center,
                symbol,
                clockwise,
            } => {
                write!(
                    out,
                    "{} {} {} {symbol} P 0 {}",
                    fmt.point(*start),
                    fmt.point(*end),
                    fmt.point(*center),
                    yes_no(*clockwise)
                )?;
                self.attrs.write(out)
            }
            FeatureKind::Pad {
                center,
                symbol,
                angle,
                mirror,
                resize,
            } => {
                write!(out, "{} ", fmt.point(*center))?;
                match resize {
                    Some(factor) => write!(out, "-1 {symbol} {}", fmt.number(*factor))?,
                    None => write!(out, "{symbol}")?,
                }
                let orient_def = if *mirror { 9 } else { 8 };
                write!(
                    out,
                    " P 0 {orient_def} {}",
                    fmt.angle(odb_rotation(*angle, *mirror))
                )?;
                self.attrs.write(out)
            }
            FeatureKind::Surface { contours } => {
                write!(out, "P 0")?;
                self.attrs.write(out)?;
                writeln!(out)?;
                for (idx, contour) in contours.iter().enumerate() {
                    write_contour(out, fmt, contour, idx == 0)?;
                }
                write!(out, "SE")
            }
        }
    }
}

fn yes_no(v: bool) -> char {
    if v { 'Y' } else { 'N' }
}

/// `OB`/`OS`/`OC`/`OE` block of one surface contour.
///
/// Arc directions are flipped because the output Y axis points up.
pub fn write_contour(
    out: &mut dyn Write,
    fmt: &Formatter,
    contour: &Contour,
    island: bool,
) -> io::Result<()> {
    writeln!(
        out,
        "OB {} {}",
        fmt.point(contour.start),
        if island { 'I' } else { 'H' }
    )?;
    let mut last = contour.start;
    for seg in &contour.segments {
        match *seg {
            Segment::Line { end } => writeln!(out, "OS {}", fmt.point(end))?,
            Segment::Arc {
                end,
                center,
                clockwise,
            } => writeln!(
                out,
                "OC {} {} {}",
                fmt.point(end),
                fmt.point(center),
                yes_no(!clockwise)
            )?,
        }
        last = seg.end();
    }
    if last != contour.start {
        writeln!(out, "OS {}", fmt.point(contour.start))?;
    }
    writeln!(out, "OE")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geom::{Polygon, rect_contour, Size};
    use crate::units::Units;

    fn render(feature: &Feature) -> String {
        let fmt = Formatter::new(Units::Mm, None);
        let mut out = Vec::new();
        feature.write(&mut out, &fmt).unwrap();
        String::from_utf8(out).unwrap()
    }

    #[test]
    fn line_record() {
        let f = Feature::new(FeatureKind::Line {
            start: Point::new(0, 0),
            end: Point::new(1_000_000, 2_000_000),
            symbol: 3,
        });
        assert_eq!(render(&f), "L 0.0 0.0 1.0 -2.0 3 P 0\n");
    }

    #[test]
    fn arc_record_keeps_direction() {
        let f = Feature::new(FeatureKind::Arc {
            start: Point::new(1_000_000, 0),
            end: Point::new(1_000_000, 0),
            center: Point::new(0, 0),
            symbol: 0,
            clockwise: true,
        });
        assert_eq!(render(&f), "A 1.0 0.0 1.0 0.0 0.0 0.0 0 P 0 Y\n");
    }

    #[test]
    fn pad_rotation_is_complemented_unless_mirrored() {
        let pad = |angle: f64, mirror: bool| {
            Feature::new(FeatureKind::Pad {
                center: Point::new(0, 0),
                symbol: 1,
                angle,
                mirror,
                resize: None,
            })
        };
        assert_eq!(render(&pad(90.0, false)), "P 0.0 0.0 1 P 0 8 270.0\n");
        assert_eq!(render(&pad(90.0, true)), "P 0.0 0.0 1 P 0 9 90.0\n");
        assert_eq!(render(&pad(0.0, false)), "P 0.0 0.0 1 P 0 8 0.0\n");
    }

    #[test]
    fn resized_pad_record() {
        let f = Feature::new(FeatureKind::Pad {
            center: Point::new(0, 0),
            symbol: 2,
            angle: 0.0,
            mirror: false,
            resize: Some(1.5),
        });
        assert_eq!(render(&f), "P 0.0 0.0 -1 2 1.50 P 0 8 0.0\n");
    }

    #[test]
    fn surface_has_one_island_and_n_holes() {
        let outline = rect_contour(Size::new(4_000_000, 4_000_000));
        let hole_a = rect_contour(Size::new(1_000_000, 1_000_000));
        let hole_b = hole_a.translated(Point::new(1_500_000, 0));
        let poly = Polygon::with_holes(outline, vec![hole_a, hole_b]);
        let f = Feature::new(FeatureKind::Surface {
            contours: poly.contours().cloned().collect(),
        });
        let text = render(&f);
        assert!(text.starts_with("S P 0\nOB "));
        assert!(text.ends_with("SE\n"));
        assert_eq!(text.matches(" I\n").count(), 1);
        assert_eq!(text.matches(" H\n").count(), 2);
        assert_eq!(text.matches("OE\n").count(), 3);

        // every contour closes on its start point
        for block in text.split("OB ").skip(1) {
            let start = block.lines().next().unwrap();
            let start = start.rsplit_once(' ').unwrap().0;
            let last = block
                .lines()
                .filter(|l| l.starts_with("OS "))
                .last()
                .unwrap();
            assert_eq!(&last[3..], start);
        }
    }

    #[test]
    fn surface_arc_direction_is_flipped() {
        let contour = crate::geom::Contour::circle(Point::new(0, 0), 1_000_000);
        let f = Feature::new(FeatureKind::Surface {
            contours: vec![contour],
        });
        let text = render(&f);
        assert!(text.contains("OC 1.0 0.0 0.0 0.0 Y\n"));
    }
}
