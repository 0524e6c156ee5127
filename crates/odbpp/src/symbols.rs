//! Symbol interning. Each distinct shape is keyed by its canonical
//! standard-symbol name, so identical pads share one symbol index.

use std::collections::HashMap;
use std::io::{self, Write};

use crate::geom::corners;
use crate::units::Formatter;

#[derive(Debug, Clone)]
pub struct SymbolDict {
    fmt: Formatter,
    keys: Vec<String>,
    index: HashMap<String, usize>,
}

impl SymbolDict {
    pub fn new(fmt: Formatter) -> Self {
        Self {
            fmt,
            keys: Vec::new(),
            index: HashMap::new(),
        }
    }

    pub fn intern(&mut self, key: String) -> usize {
        if let Some(&idx) = self.index.get(&key) {
            return idx;
        }
        let idx = self.keys.len();
        self.keys.push(key.clone());
        self.index.insert(key, idx);
        idx
    }

    pub fn keys(&self) -> &[String] {
        &self.keys
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    pub fn circle(&mut self, diameter: i64) -> usize {
        let key = format!("r{}", self.fmt.sym(diameter));
        self.intern(key)
    }

    pub fn rect(&mut self, w: i64, h: i64) -> usize {
        let key = format!("rect{}x{}", self.fmt.sym(w), self.fmt.sym(h));
        self.intern(key)
    }

    /// Stadium; a square oval is a circle
    pub fn oval(&mut self, w: i64, h: i64) -> usize {
        if w == h {
            return self.circle(w);
        }
        let key = format!("oval{}x{}", self.fmt.sym(w), self.fmt.sym(h));
        self.intern(key)
    }

    pub fn round_rect(&mut self, w: i64, h: i64, radius: i64, mask: u8) -> usize {
        if radius <= 0 {
            return self.rect(w, h);
        }
        let key = format!(
            "rect{}x{}xr{}{}",
            self.fmt.sym(w),
            self.fmt.sym(h),
            self.fmt.sym(radius),
            corner_suffix(mask)
        );
        self.intern(key)
    }

    pub fn round_rect_donut(&mut self, w: i64, h: i64, line_width: i64, radius: i64) -> usize {
        let key = format!(
            "donut_rc{}x{}x{}xr{}",
            self.fmt.sym(w),
            self.fmt.sym(h),
            self.fmt.sym(line_width),
            self.fmt.sym(radius)
        );
        self.intern(key)
    }

    pub fn round_donut(&mut self, outer: i64, inner: i64) -> usize {
        let key = format!("donut_r{}x{}", self.fmt.sym(outer), self.fmt.sym(inner));
        self.intern(key)
    }

    pub fn chamfered_rect(&mut self, w: i64, h: i64, chamfer: i64, mask: u8) -> usize {
        if chamfer <= 0 || mask & corners::ALL == 0 {
            return self.rect(w, h);
        }
        let key = format!(
            "rect{}x{}xc{}{}",
            self.fmt.sym(w),
            self.fmt.sym(h),
            self.fmt.sym(chamfer),
            corner_suffix(mask)
        );
        self.intern(key)
    }

    pub fn write(&self, out: &mut dyn Write) -> io::Result<()> {
        for (idx, key) in self.keys.iter().enumerate() {
            writeln!(out, "${idx} {key}")?;
        }
        Ok(())
    }
}

/// Corner list of a rounded or chamfered rectangle.
///
/// ODB numbers corners counter-clockwise from the upper right. An empty
/// suffix means all four corners.
fn corner_suffix(mask: u8) -> String {
    let mask = mask & corners::ALL;
    if mask == corners::ALL || mask == 0 {
        return String::new();
    }
    let mut out = String::from("x");
    for (bit, digit) in [
        (corners::TOP_RIGHT, '1'),
        (corners::TOP_LEFT, '2'),
        (corners::BOTTOM_LEFT, '3'),
        (corners::BOTTOM_RIGHT, '4'),
    ] {
        if mask & bit != 0 {
            out.push(digit);
        }
    }
    out
}

/// Swap left and right corners, for symbols drawn mirrored
pub fn mirror_corners(mask: u8) -> u8 {
    let mut out = 0;
    for (from, to) in [
        (corners::TOP_LEFT, corners::TOP_RIGHT),
        (corners::TOP_RIGHT, corners::TOP_LEFT),
        (corners::BOTTOM_LEFT, corners::BOTTOM_RIGHT),
        (corners::BOTTOM_RIGHT, corners::BOTTOM_LEFT),
    ] {
        if mask & from != 0 {
            out |= to;
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::units::Units;

    fn dict() -> SymbolDict {
        SymbolDict::new(Formatter::new(Units::Mm, None))
    }

    #[test]
    fn same_dimensions_share_an_index() {
        let mut symbols = dict();
        let a = symbols.rect(1_000_000, 500_000);
        let b = symbols.circle(600_000);
        assert_eq!(symbols.rect(1_000_000, 500_000), a);
        assert_ne!(symbols.rect(1_000_000, 510_000), a);
        assert_eq!(b, 1);
        assert_eq!(symbols.keys(), ["rect1000.0x500.0", "r600.0", "rect1000.0x510.0"]);
    }

    #[test]
    fn shape_keys() {
        let mut symbols = dict();
        symbols.oval(2_000_000, 1_000_000);
        symbols.oval(1_000_000, 1_000_000);
        symbols.round_rect(2_000_000, 1_000_000, 250_000, corners::ALL);
        symbols.round_donut(1_000_000, 800_000);
        symbols.round_rect_donut(2_000_000, 1_000_000, 100_000, 50_000);
        assert_eq!(
            symbols.keys(),
            [
                "oval2000.0x1000.0",
                "r1000.0",
                "rect2000.0x1000.0xr250.0",
                "donut_r1000.0x800.0",
                "donut_rc2000.0x1000.0x100.0xr50.0",
            ]
        );
    }

    #[test]
    fn corner_digits_follow_odb_numbering() {
        let mut symbols = dict();
        symbols.chamfered_rect(1_000_000, 1_000_000, 100_000, corners::TOP_LEFT);
        symbols.chamfered_rect(
            1_000_000,
            1_000_000,
            100_000,
            corners::TOP_RIGHT | corners::BOTTOM_RIGHT,
        );
        symbols.round_rect(1_000_000, 1_000_000, 100_000, corners::BOTTOM_LEFT);
        assert_eq!(
            symbols.keys(),
            [
                "rect1000.0x1000.0xc100.0x2",
                "rect1000.0x1000.0xc100.0x14",
                "rect1000.0x1000.0xr100.0x3",
            ]
        );
    }

    #[test]
    fn mirrored_corners_swap_sides() {
        assert_eq!(mirror_corners(corners::TOP_LEFT), corners::TOP_RIGHT);
        assert_eq!(
            mirror_corners(corners::BOTTOM_LEFT | corners::TOP_RIGHT),
            corners::BOTTOM_RIGHT | corners::TOP_LEFT
        );
        assert_eq!(mirror_corners(corners::ALL), corners::ALL);
    }

    #[test]
    fn symbols_file_lines() {
        let mut symbols = dict();
        symbols.circle(100_000);
        let mut out = Vec::new();
        symbols.write(&mut out).unwrap();
        assert_eq!(String::from_utf8(out).unwrap(), "$0 r100.0\n");
    }
}
