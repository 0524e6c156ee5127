//! Drill spans and the per-layer `tools` table.

use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::hash::{Hash, Hasher};
use std::io::{self, Write};

use crate::board::{Board, BoardLayer};
use crate::names::legal_entity_name;
use crate::units::Formatter;
use crate::writer::TextWriter;

/// One drilling operation between two copper layers.
///
/// Equality, ordering and hashing only look at the normalised layer pair
/// and the flags, so the declaration order of the layers never matters.
#[derive(Debug, Clone, Copy)]
pub struct DrillSpan {
    pub start: BoardLayer,
    pub end: BoardLayer,
    pub backdrill: bool,
    pub non_plated: bool,
}

impl DrillSpan {
    pub fn new(start: BoardLayer, end: BoardLayer, backdrill: bool, non_plated: bool) -> Self {
        Self {
            start,
            end,
            backdrill,
            non_plated,
        }
    }

    pub fn top(&self) -> BoardLayer {
        self.start.min(self.end)
    }

    pub fn bottom(&self) -> BoardLayer {
        self.start.max(self.end)
    }

    pub fn is_through(&self) -> bool {
        self.top() == BoardLayer::FCu && self.bottom() == BoardLayer::BCu
    }

    fn key(&self) -> (BoardLayer, BoardLayer, bool, bool) {
        (self.top(), self.bottom(), self.backdrill, self.non_plated)
    }

    /// Layer name of the span, e.g. `drill_plated_f.cu-b.cu`
    pub fn span_name(&self, board: &Board) -> String {
        let kind = if self.backdrill {
            "backdrill"
        } else if self.non_plated {
            "non_plated"
        } else {
            "plated"
        };
        legal_entity_name(&format!(
            "drill_{kind}_{}-{}",
            legal_entity_name(&board.layer_name(self.top())),
            legal_entity_name(&board.layer_name(self.bottom()))
        ))
    }
}

impl PartialEq for DrillSpan {
    fn eq(&self, other: &Self) -> bool {
        self.key() == other.key()
    }
}

impl Eq for DrillSpan {}

impl PartialOrd for DrillSpan {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for DrillSpan {
    fn cmp(&self, other: &Self) -> Ordering {
        self.key().cmp(&other.key())
    }
}

impl Hash for DrillSpan {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.key().hash(state);
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ToolType {
    Plated,
    NonPlated,
    Via,
}

impl ToolType {
    fn as_str(&self) -> &'static str {
        match self {
            ToolType::Plated => "PLATED",
            ToolType::NonPlated => "NON_PLATED",
            ToolType::Via => "VIA",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ToolType2 {
    Standard,
    Blind,
}

impl ToolType2 {
    fn as_str(&self) -> &'static str {
        match self {
            ToolType2::Standard => "STANDARD",
            ToolType2::Blind => "BLIND",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DrillTool {
    pub num: usize,
    pub kind: ToolType,
    pub kind2: ToolType2,
    pub diameter: i64,
}

/// Tool list of a drill layer, numbered from 1 in first-use order
#[derive(Debug, Clone)]
pub struct DrillTools {
    fmt: Formatter,
    thickness: i64,
    index: BTreeMap<(ToolType, i64, ToolType2), usize>,
    tools: Vec<DrillTool>,
}

impl DrillTools {
    pub fn new(fmt: Formatter, thickness: i64) -> Self {
        Self {
            fmt,
            thickness,
            index: BTreeMap::new(),
            tools: Vec::new(),
        }
    }

    /// Tool number for the given hole, adding a tool on first use
    pub fn add(&mut self, kind: ToolType, diameter: i64, kind2: ToolType2) -> usize {
        if let Some(&num) = self.index.get(&(kind, diameter, kind2)) {
            return num;
        }
        let num = self.tools.len() + 1;
        self.tools.push(DrillTool {
            num,
            kind,
            kind2,
            diameter,
        });
        self.index.insert((kind, diameter, kind2), num);
        num
    }

    pub fn tools(&self) -> &[DrillTool] {
        &self.tools
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }

    pub fn write(&self, out: &mut dyn Write) -> io::Result<()> {
        let fmt = &self.fmt;
        let mut tw = TextWriter::new(out);
        tw.equation("UNITS", fmt.units().as_str())?;
        tw.equation("THICKNESS", fmt.data(self.thickness))?;
        tw.equation("USER_PARAMS", "")?;
        tw.line("")?;
        for tool in &self.tools {
            tw.array("TOOLS", |tw| {
                tw.equation("NUM", tool.num)?;
                tw.equation("TYPE", tool.kind.as_str())?;
                tw.equation("TYPE2", tool.kind2.as_str())?;
                tw.equation("MIN_TOL", 0)?;
                tw.equation("MAX_TOL", 0)?;
                tw.equation("BIT", "")?;
                tw.equation("FINISH_SIZE", fmt.sym(tool.diameter))?;
                tw.equation("DRILL_SIZE", fmt.sym(tool.diameter))
            })?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::units::Units;
    use std::collections::HashSet;

    #[test]
    fn span_is_independent_of_layer_order() {
        let a = DrillSpan::new(BoardLayer::FCu, BoardLayer::In(2), false, false);
        let b = DrillSpan::new(BoardLayer::In(2), BoardLayer::FCu, false, false);
        assert_eq!(a, b);
        assert_eq!(a.cmp(&b), Ordering::Equal);
        assert_eq!(a.top(), BoardLayer::FCu);
        assert_eq!(b.bottom(), BoardLayer::In(2));
        let set: HashSet<_> = [a, b].into_iter().collect();
        assert_eq!(set.len(), 1);
    }

    #[test]
    fn flags_distinguish_spans() {
        let plated = DrillSpan::new(BoardLayer::FCu, BoardLayer::BCu, false, false);
        let npth = DrillSpan::new(BoardLayer::FCu, BoardLayer::BCu, false, true);
        let back = DrillSpan::new(BoardLayer::BCu, BoardLayer::FCu, true, false);
        assert_ne!(plated, npth);
        assert_ne!(plated, back);
        assert!(plated < npth);
    }

    #[test]
    fn span_names() {
        let board = Board::new(4);
        let plated = DrillSpan::new(BoardLayer::BCu, BoardLayer::FCu, false, false);
        let npth = DrillSpan::new(BoardLayer::FCu, BoardLayer::BCu, false, true);
        let back = DrillSpan::new(BoardLayer::BCu, BoardLayer::In(2), true, false);
        assert_eq!(plated.span_name(&board), "drill_plated_f.cu-b.cu");
        assert_eq!(npth.span_name(&board), "drill_non_plated_f.cu-b.cu");
        assert_eq!(back.span_name(&board), "drill_backdrill_in2.cu-b.cu");
    }

    #[test]
    fn one_tool_per_distinct_key() {
        let mut tools = DrillTools::new(Formatter::new(Units::Mm, None), 1_600_000);
        assert_eq!(tools.add(ToolType::Via, 300_000, ToolType2::Standard), 1);
        assert_eq!(tools.add(ToolType::Plated, 1_000_000, ToolType2::Standard), 2);
        assert_eq!(tools.add(ToolType::Via, 300_000, ToolType2::Standard), 1);
        assert_eq!(tools.add(ToolType::Via, 300_000, ToolType2::Blind), 3);
        assert_eq!(tools.tools().len(), 3);

        let mut out = Vec::new();
        tools.write(&mut out).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert!(text.starts_with("UNITS=MM\nTHICKNESS=1.60\nUSER_PARAMS=\n\nTOOLS {\n"));
        assert!(text.contains("    NUM=2\n    TYPE=PLATED\n    TYPE2=STANDARD\n"));
        assert!(text.contains("    FINISH_SIZE=300.0\n    DRILL_SIZE=300.0\n}\n"));
        assert_eq!(text.matches("TOOLS {").count(), 3);
    }
}
