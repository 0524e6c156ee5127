use serde::{Deserialize, Serialize};

use crate::geom::Point;
use crate::Result;

/// Board internal units per millimetre (lengths are stored as integer nanometres)
pub const IU_PER_MM: f64 = 1_000_000.0;

/// Output units of an ODB++ product model
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Units {
    #[default]
    Mm,
    Inch,
}

impl Units {
    /// Value of the `UNITS=` header line
    pub fn as_str(&self) -> &'static str {
        match self {
            Units::Mm => "MM",
            Units::Inch => "INCH",
        }
    }

    fn default_digits(&self) -> usize {
        match self {
            Units::Mm => 4,
            Units::Inch => 6,
        }
    }
}

/// Archive format applied to the finished directory tree
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Compression {
    #[default]
    None,
    Zip,
    Tgz,
}

/// Immutable export settings threaded through every writer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExportConfig {
    pub units: Units,
    /// Decimal digits written for lengths. `None` picks the unit default.
    pub sig_digits: Option<usize>,
    pub step_name: String,
    pub job_name: String,
    pub compression: Compression,
    /// Value written as `ODB_SOURCE` and in the `HDR` line of `eda/data`
    pub source: String,
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            units: Units::Mm,
            sig_digits: None,
            step_name: "pcb".to_string(),
            job_name: "job".to_string(),
            compression: Compression::None,
            source: "pcb-odbpp".to_string(),
        }
    }
}

impl ExportConfig {
    /// Load settings from a TOML document; missing keys keep their defaults.
    pub fn from_toml_str(s: &str) -> Result<Self> {
        Ok(toml::from_str(s)?)
    }

    pub fn formatter(&self) -> Formatter {
        Formatter::new(self.units, self.sig_digits)
    }
}

/// Number formatting for one export.
///
/// Lengths come in as board internal units. Coordinates are scaled to the
/// output units, symbol dimensions to microns (MM) or mils (INCH).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Formatter {
    units: Units,
    scale: f64,
    sym_scale: f64,
    digits: usize,
}

impl Formatter {
    pub fn new(units: Units, digits: Option<usize>) -> Self {
        let scale = match units {
            Units::Mm => 1.0 / IU_PER_MM,
            Units::Inch => 1.0 / (IU_PER_MM * 25.4),
        };
        Self {
            units,
            scale,
            sym_scale: scale * 1000.0,
            digits: digits.unwrap_or_else(|| units.default_digits()),
        }
    }

    pub fn units(&self) -> Units {
        self.units
    }

    /// Format a length in output units
    pub fn data(&self, iu: i64) -> String {
        double_to_string(iu as f64 * self.scale, self.digits)
    }

    /// Format a length given as a float in internal units
    pub fn data_f(&self, iu: f64) -> String {
        double_to_string(iu * self.scale, self.digits)
    }

    /// Format a symbol dimension (microns or mils)
    pub fn sym(&self, iu: i64) -> String {
        double_to_string(iu as f64 * self.sym_scale, self.digits)
    }

    /// Format a point in output coordinates. The output Y axis points up.
    pub fn point(&self, p: Point) -> String {
        format!("{} {}", self.data(p.x), self.data(-p.y))
    }

    pub fn angle(&self, deg: f64) -> String {
        double_to_string(deg, self.digits)
    }

    pub fn number(&self, v: f64) -> String {
        double_to_string(v, self.digits)
    }
}

/// Fixed-decimal formatting that keeps at most one trailing zero.
///
/// `1.500000` becomes `1.50`, `2.000000` becomes `2.0` and `-0` becomes `0`.
pub fn double_to_string(value: f64, digits: usize) -> String {
    let mut s = format!("{:.*}", digits, value);
    if s.starts_with('-') && s[1..].chars().all(|c| c == '0' || c == '.') {
        s.remove(0);
    }
    if s.contains('.') {
        while s.ends_with("00") {
            s.pop();
        }
    }
    s
}

/// Convert a counter-clockwise board angle to the clockwise output convention.
///
/// Mirrored records keep the raw angle because mirroring inverts the sense again.
pub fn odb_rotation(angle: f64, mirror: bool) -> f64 {
    let a = normalize_angle(angle);
    if mirror {
        a
    } else {
        normalize_angle(360.0 - a)
    }
}

/// Normalize an angle in degrees to `[0, 360)`
pub fn normalize_angle(deg: f64) -> f64 {
    let a = deg.rem_euclid(360.0);
    // rem_euclid can return 360.0 for tiny negative inputs
    if a >= 360.0 - 1e-9 { 0.0 } else { a }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_trailing_zero_pairs() {
        assert_eq!(double_to_string(1.5, 6), "1.50");
        assert_eq!(double_to_string(2.0, 6), "2.0");
        assert_eq!(double_to_string(0.125, 4), "0.1250");
        assert_eq!(double_to_string(0.1234, 4), "0.1234");
    }

    #[test]
    fn negative_zero_is_positive() {
        assert_eq!(double_to_string(-0.0, 4), "0.0");
        assert_eq!(double_to_string(-0.00001, 4), "0.0");
        assert_eq!(double_to_string(-1.25, 4), "-1.250");
    }

    #[test]
    fn zero_digits_keeps_integers() {
        assert_eq!(double_to_string(100.0, 0), "100");
    }

    #[test]
    fn formatter_scales_to_mm_and_microns() {
        let fmt = Formatter::new(Units::Mm, None);
        assert_eq!(fmt.data(1_500_000), "1.50");
        assert_eq!(fmt.sym(250_000), "250.0");
        assert_eq!(fmt.point(Point::new(1_000_000, 2_000_000)), "1.0 -2.0");
    }

    #[test]
    fn formatter_scales_to_inch_and_mils() {
        let fmt = Formatter::new(Units::Inch, None);
        assert_eq!(fmt.data(25_400_000), "1.0");
        assert_eq!(fmt.sym(254_000), "10.0");
    }

    #[test]
    fn rotation_complements_unless_mirrored() {
        for theta in [0.0, 15.0, 90.0, 180.0, 270.0, 359.5] {
            let expected = (360.0 - theta) % 360.0;
            assert!((odb_rotation(theta, false) - expected).abs() < 1e-9);
            assert!((odb_rotation(theta, true) - theta).abs() < 1e-9);
        }
        assert!((odb_rotation(-90.0, false) - 90.0).abs() < 1e-9);
    }

    #[test]
    fn config_from_toml_keeps_defaults() {
        let cfg = ExportConfig::from_toml_str("units = \"inch\"\nstep_name = \"board\"").unwrap();
        assert_eq!(cfg.units, Units::Inch);
        assert_eq!(cfg.step_name, "board");
        assert_eq!(cfg.compression, Compression::None);
    }
}
