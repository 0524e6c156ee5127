//! Component records of one board side (`comp_+_top` / `comp_+_bot`).

use std::collections::HashSet;
use std::io::{self, Write};

use crate::attr::{AttrManager, AttrRecord, Attribute, CompMountType};
use crate::board::{Board, Footprint, MountType, Side};
use crate::eda_data::EdaData;
use crate::geom::Point;
use crate::names::{legal_component_name, odb_string};
use crate::units::{Formatter, odb_rotation};
use crate::{OdbError, Result};

#[derive(Debug, Clone, PartialEq)]
pub struct Toeprint {
    pub pin: usize,
    pub position: Point,
    /// Board angle, counter-clockwise
    pub rotation: f64,
    pub mirror: bool,
    pub net: usize,
    pub subnet: usize,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Component {
    pub index: usize,
    pub package: usize,
    pub position: Point,
    pub rotation: f64,
    pub mirror: bool,
    pub name: String,
    pub part_name: String,
    pub properties: Vec<(String, String)>,
    pub attrs: AttrRecord,
    pub toeprints: Vec<Toeprint>,
}

#[derive(Debug)]
pub struct ComponentsManager {
    fmt: Formatter,
    side: Side,
    components: Vec<Component>,
    names: HashSet<String>,
    attrs: AttrManager,
}

impl ComponentsManager {
    pub fn new(fmt: Formatter, side: Side) -> Self {
        Self {
            fmt,
            side,
            components: Vec::new(),
            names: HashSet::new(),
            attrs: AttrManager::new(),
        }
    }

    pub fn side(&self) -> Side {
        self.side
    }

    pub fn components(&self) -> &[Component] {
        &self.components
    }

    /// Build the records of every footprint on this side.
    ///
    /// Toeprints take their net and subnet from the lookups published while
    /// the EDA data was built; a missing entry is fatal.
    pub fn init_component_data(&mut self, board: &Board, eda: &EdaData) -> Result<()> {
        let side = self.side;
        for fp in board.footprints.iter().filter(|fp| fp.side() == side) {
            let package = eda.package_of(fp.id).ok_or_else(|| {
                OdbError::MissingSubnet(format!("package of footprint {}", fp.reference))
            })?;
            let comp = self.add_component(fp, package);

            for (pin, pad) in fp.pads.iter().enumerate() {
                let sref = eda.lookups.pads.get(&pad.id).ok_or_else(|| {
                    OdbError::MissingSubnet(format!("pad {} of {}", pad.number, fp.reference))
                })?;
                self.components[comp].toeprints.push(Toeprint {
                    pin,
                    position: pad.position,
                    rotation: pad.orientation,
                    mirror: fp.flipped,
                    net: sref.net,
                    subnet: sref.subnet,
                    name: if pad.number.is_empty() {
                        format!("PAD{pin}")
                    } else {
                        legal_component_name(&pad.number)
                    },
                });
            }
        }
        log::debug!(
            "{} components on the {:?} side",
            self.components.len(),
            self.side
        );
        Ok(())
    }

    /// Append the record of `fp`; returns its index on this side
    pub fn add_component(&mut self, fp: &Footprint, package: usize) -> usize {
        let base = if fp.reference.is_empty() {
            "UNNAMED".to_string()
        } else {
            legal_component_name(&fp.reference)
        };
        let name = if self.names.insert(base.clone()) {
            base
        } else {
            let mut n = 1;
            loop {
                let candidate = format!("{base}_{n}");
                if self.names.insert(candidate.clone()) {
                    log::warn!("duplicate component name {base}, renamed to {candidate}");
                    break candidate;
                }
                n += 1;
            }
        };

        let mut attrs = AttrRecord::default();
        if let Some(height) = fp.height {
            self.attrs
                .add(&mut attrs, &Attribute::CompHeight(height), &self.fmt);
        }
        let mount = match fp.mount {
            MountType::Smd => CompMountType::Smd,
            MountType::ThroughHole => CompMountType::Thmt,
            MountType::Unspecified => CompMountType::Other,
        };
        self.attrs
            .add(&mut attrs, &Attribute::CompMountType(mount), &self.fmt);
        if fp.dnp {
            self.attrs.add(&mut attrs, &Attribute::CompIgnore, &self.fmt);
        }
        if let Some(pn) = fp.part_number.as_deref().filter(|s| !s.is_empty()) {
            self.attrs
                .add(&mut attrs, &Attribute::PartName(pn.to_string()), &self.fmt);
        }

        let mut properties = Vec::new();
        if !fp.value.is_empty() {
            properties.push(("VALUE".to_string(), fp.value.clone()));
        }
        if let Some(pn) = &fp.part_number {
            properties.push(("PART_NUMBER".to_string(), pn.clone()));
        }
        for field in &fp.fields {
            properties.push((field.name.clone(), field.value.clone()));
        }

        let part_name = fp
            .part_number
            .clone()
            .filter(|s| !s.is_empty())
            .unwrap_or_else(|| fp.footprint.clone());

        let index = self.components.len();
        self.components.push(Component {
            index,
            package,
            position: fp.position,
            rotation: fp.orientation,
            mirror: fp.flipped,
            name,
            part_name: legal_component_name(&part_name),
            properties,
            attrs,
            toeprints: Vec::new(),
        });
        index
    }

    /// `components` file of the layer
    pub fn write(&self, out: &mut dyn Write) -> io::Result<()> {
        let fmt = &self.fmt;
        writeln!(out, "UNITS={}", fmt.units().as_str())?;
        self.attrs.write_tables(out)?;

        for comp in &self.components {
            writeln!(out, "# CMP {}", comp.index)?;
            write!(
                out,
                "CMP {} {} {} {} {}",
                comp.package,
                fmt.point(comp.position),
                fmt.angle(odb_rotation(comp.rotation, comp.mirror)),
                mirror_flag(comp.mirror),
                comp.name,
            )?;
            if comp.part_name.is_empty() {
                write!(out, " UNKNOWN")?;
            } else {
                write!(out, " {}", comp.part_name)?;
            }
            comp.attrs.write(out)?;
            writeln!(out)?;

            for (key, value) in &comp.properties {
                writeln!(
                    out,
                    "PRP {} '{}'",
                    odb_string(key).replace(' ', "_"),
                    value.replace('\'', "")
                )?;
            }
            for top in &comp.toeprints {
                writeln!(
                    out,
                    "TOP {} {} {} {} {} {} {}",
                    top.pin,
                    fmt.point(top.position),
                    fmt.angle(odb_rotation(top.rotation, top.mirror)),
                    mirror_flag(top.mirror),
                    top.net,
                    top.subnet,
                    top.name
                )?;
            }
            writeln!(out, "#")?;
        }
        Ok(())
    }
}

fn mirror_flag(mirror: bool) -> char {
    if mirror { 'M' } else { 'N' }
}
