//! Attribute interning and the system attribute catalogue.

use std::collections::HashMap;
use std::io::{self, Write};

use crate::names::text_attr_value;
use crate::units::Formatter;

/// Insertion-ordered interning tables for attribute names and text values
#[derive(Debug, Default, Clone)]
pub struct AttrManager {
    names: Vec<String>,
    name_index: HashMap<String, usize>,
    texts: Vec<String>,
    text_index: HashMap<String, usize>,
}

impl AttrManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Intern an attribute name (lowercased)
    pub fn intern_name(&mut self, name: &str) -> usize {
        intern(&mut self.names, &mut self.name_index, name.to_ascii_lowercase())
    }

    /// Intern a text value (printable ASCII, uppercased)
    pub fn intern_text(&mut self, text: &str) -> usize {
        intern(&mut self.texts, &mut self.text_index, text_attr_value(text))
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }

    pub fn texts(&self) -> &[String] {
        &self.texts
    }

    /// Attach `attr` to `record`, interning whatever it needs
    pub fn add(&mut self, record: &mut AttrRecord, attr: &Attribute, fmt: &Formatter) {
        let name = self.intern_name(attr.name());
        let value = match attr.value() {
            AttrValue::Flag => None,
            AttrValue::Option(n) => Some(n.to_string()),
            AttrValue::Text(t) => Some(self.intern_text(t).to_string()),
            AttrValue::Length(iu) => Some(fmt.data(iu)),
        };
        record.set(name, value);
    }

    pub fn write_names(&self, out: &mut dyn Write, prefix: &str) -> io::Result<()> {
        for (idx, name) in self.names.iter().enumerate() {
            writeln!(out, "{prefix}@{idx} {name}")?;
        }
        Ok(())
    }

    pub fn write_texts(&self, out: &mut dyn Write, prefix: &str) -> io::Result<()> {
        for (idx, text) in self.texts.iter().enumerate() {
            writeln!(out, "{prefix}&{idx} {text}")?;
        }
        Ok(())
    }

    /// Both tables, names first, followed by a separating blank line
    pub fn write_tables(&self, out: &mut dyn Write) -> io::Result<()> {
        if self.names.is_empty() && self.texts.is_empty() {
            return Ok(());
        }
        writeln!(out, "#\n#Attribute names\n#")?;
        self.write_names(out, "")?;
        writeln!(out, "#\n#Attribute text strings\n#")?;
        self.write_texts(out, "")?;
        writeln!(out)
    }
}

fn intern(list: &mut Vec<String>, index: &mut HashMap<String, usize>, key: String) -> usize {
    if let Some(&idx) = index.get(&key) {
        return idx;
    }
    let idx = list.len();
    list.push(key.clone());
    index.insert(key, idx);
    idx
}

/// Attribute set of one record, in insertion order
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct AttrRecord {
    entries: Vec<(usize, Option<String>)>,
}

impl AttrRecord {
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn entries(&self) -> &[(usize, Option<String>)] {
        &self.entries
    }

    /// Set a value; a name already present is overwritten in place
    pub fn set(&mut self, name: usize, value: Option<String>) {
        match self.entries.iter_mut().find(|(n, _)| *n == name) {
            Some(entry) => entry.1 = value,
            None => self.entries.push((name, value)),
        }
    }

    /// `;0,1=3` suffix, or nothing for an empty set
    pub fn write(&self, out: &mut dyn Write) -> io::Result<()> {
        if self.entries.is_empty() {
            return Ok(());
        }
        out.write_all(b";")?;
        for (i, (name, value)) in self.entries.iter().enumerate() {
            if i > 0 {
                out.write_all(b",")?;
            }
            match value {
                Some(v) => write!(out, "{name}={v}")?,
                None => write!(out, "{name}")?,
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PadUsage {
    Toeprint,
    Via,
    GlobalFiducial,
    LocalFiducial,
    ToolingHole,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DrillKind {
    Plated,
    NonPlated,
    Via,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompMountType {
    Other,
    Smd,
    Thmt,
}

/// System attributes emitted by the exporter
#[derive(Debug, Clone, PartialEq)]
pub enum Attribute {
    Smd,
    TearDrop,
    CompIgnore,
    PadUsage(PadUsage),
    Drill(DrillKind),
    CompMountType(CompMountType),
    Geometry(String),
    String(String),
    PartName(String),
    CompHeight(i64),
}

enum AttrValue<'a> {
    Flag,
    Option(usize),
    Text(&'a str),
    Length(i64),
}

impl Attribute {
    pub fn name(&self) -> &'static str {
        match self {
            Attribute::Smd => ".smd",
            Attribute::TearDrop => ".tear_drop",
            Attribute::CompIgnore => ".comp_ignore",
            Attribute::PadUsage(_) => ".pad_usage",
            Attribute::Drill(_) => ".drill",
            Attribute::CompMountType(_) => ".comp_mount_type",
            Attribute::Geometry(_) => ".geometry",
            Attribute::String(_) => ".string",
            Attribute::PartName(_) => ".part_name",
            Attribute::CompHeight(_) => ".comp_height",
        }
    }

    fn value(&self) -> AttrValue<'_> {
        match self {
            Attribute::Smd | Attribute::TearDrop | Attribute::CompIgnore => AttrValue::Flag,
            Attribute::PadUsage(u) => AttrValue::Option(*u as usize),
            Attribute::Drill(d) => AttrValue::Option(*d as usize),
            Attribute::CompMountType(m) => AttrValue::Option(*m as usize),
            Attribute::Geometry(s)
            | Attribute::String(s)
            | Attribute::PartName(s) => AttrValue::Text(s),
            Attribute::CompHeight(h) => AttrValue::Length(*h),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::units::Units;

    fn render(f: impl FnOnce(&mut Vec<u8>) -> io::Result<()>) -> String {
        let mut buf = Vec::new();
        f(&mut buf).unwrap();
        String::from_utf8(buf).unwrap()
    }

    #[test]
    fn interning_is_idempotent_and_ordered() {
        let mut attrs = AttrManager::new();
        assert_eq!(attrs.intern_name(".SMD"), 0);
        assert_eq!(attrs.intern_name(".pad_usage"), 1);
        assert_eq!(attrs.intern_name(".smd"), 0);
        assert_eq!(attrs.intern_text("via"), 0);
        assert_eq!(attrs.intern_text("VIA"), 0);
        assert_eq!(attrs.intern_text("other"), 1);

        let names = render(|out| attrs.write_names(out, ""));
        assert_eq!(names, "@0 .smd\n@1 .pad_usage\n");
        let texts = render(|out| attrs.write_texts(out, ""));
        assert_eq!(texts, "&0 VIA\n&1 OTHER\n");
    }

    #[test]
    fn record_lists_flags_and_values() {
        let fmt = Formatter::new(Units::Mm, None);
        let mut attrs = AttrManager::new();
        let mut record = AttrRecord::default();
        attrs.add(&mut record, &Attribute::Smd, &fmt);
        attrs.add(&mut record, &Attribute::PadUsage(PadUsage::Via), &fmt);
        attrs.add(&mut record, &Attribute::Geometry("VIA_RoundD0.6".into()), &fmt);
        let line = render(|out| record.write(out));
        assert_eq!(line, ";0,1=1,2=0");
        assert_eq!(attrs.texts(), ["VIA_ROUNDD0.6"]);
    }

    #[test]
    fn empty_record_writes_nothing() {
        let record = AttrRecord::default();
        assert_eq!(render(|out| record.write(out)), "");
    }

    #[test]
    fn option_indices_follow_catalogue_order() {
        let fmt = Formatter::new(Units::Mm, None);
        let mut attrs = AttrManager::new();
        let mut record = AttrRecord::default();
        attrs.add(&mut record, &Attribute::Drill(DrillKind::NonPlated), &fmt);
        attrs.add(&mut record, &Attribute::CompMountType(CompMountType::Thmt), &fmt);
        assert_eq!(render(|out| record.write(out)), ";0=1,1=2");
    }
}
