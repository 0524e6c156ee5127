//! Matrix rows and the layer plan of a step.
//!
//! The plan lists every matrix row in order, the drawable layers that get a
//! layer entity, and the item groups of the derived drill and via
//! processing layers.

use std::collections::{BTreeMap, BTreeSet, HashSet};
use std::io::{self, Write};

use crate::board::{Board, BoardLayer, LayerClass, Side, StackupItem, Via};
use crate::drill::DrillSpan;
use crate::features_manager::BoardItem;
use crate::names::{legal_entity_name, unique_name};
use crate::writer::TextWriter;

pub const COMP_TOP: &str = "comp_+_top";
pub const COMP_BOT: &str = "comp_+_bot";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LayerType {
    Component,
    Signal,
    Dielectric,
    SolderMask,
    SolderPaste,
    SilkScreen,
    Drill,
    Document,
}

impl LayerType {
    pub fn as_str(&self) -> &'static str {
        match self {
            LayerType::Component => "COMPONENT",
            LayerType::Signal => "SIGNAL",
            LayerType::Dielectric => "DIELECTRIC",
            LayerType::SolderMask => "SOLDER_MASK",
            LayerType::SolderPaste => "SOLDER_PASTE",
            LayerType::SilkScreen => "SILK_SCREEN",
            LayerType::Drill => "DRILL",
            LayerType::Document => "DOCUMENT",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Context {
    Board,
    Misc,
}

impl Context {
    pub fn as_str(&self) -> &'static str {
        match self {
            Context::Board => "BOARD",
            Context::Misc => "MISC",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Polarity {
    Positive,
    Negative,
}

impl Polarity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Polarity::Positive => "POSITIVE",
            Polarity::Negative => "NEGATIVE",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DielectricType {
    Core,
    Prepreg,
}

impl DielectricType {
    pub fn as_str(&self) -> &'static str {
        match self {
            DielectricType::Core => "CORE",
            DielectricType::Prepreg => "PREPREG",
        }
    }
}

/// Via processing steps that get their own document layer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum AuxType {
    Filling,
    Capping,
    Covering,
    Plugging,
    Tenting,
}

impl AuxType {
    pub fn as_str(&self) -> &'static str {
        match self {
            AuxType::Filling => "filling",
            AuxType::Capping => "capping",
            AuxType::Covering => "covering",
            AuxType::Plugging => "plugging",
            AuxType::Tenting => "tenting",
        }
    }
}

/// Where an auxiliary layer applies: one board face or one via span
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum AuxScope {
    Side(Side),
    Span(BoardLayer, BoardLayer),
}

pub type AuxKey = (AuxType, AuxScope);

/// What a matrix row was derived from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LayerSource {
    Component(Side),
    Board(BoardLayer),
    Dielectric,
    Drill(DrillSpan),
    Aux(AuxKey),
}

#[derive(Debug, Clone, PartialEq)]
pub struct MatrixLayer {
    pub row: usize,
    pub name: String,
    pub kind: LayerType,
    pub context: Context,
    pub polarity: Polarity,
    /// Start and end layer names of drill and span layers
    pub span: Option<(String, String)>,
    pub dielectric: Option<DielectricType>,
    pub add_type: Option<String>,
    pub source: LayerSource,
}

#[derive(Debug, Clone)]
pub struct DrillGroup<'a> {
    pub name: String,
    pub items: Vec<BoardItem<'a>>,
}

#[derive(Debug, Clone)]
pub struct AuxGroup<'a> {
    pub name: String,
    pub vias: Vec<&'a Via>,
}

/// Ordered matrix of a board plus the derived layer groups
#[derive(Debug, Clone, Default)]
pub struct LayerPlan<'a> {
    pub matrix: Vec<MatrixLayer>,
    /// Rows that get a layer entity, with their board layer if any
    pub entries: Vec<(Option<BoardLayer>, String)>,
    pub drill_spans: BTreeMap<DrillSpan, DrillGroup<'a>>,
    pub aux_layers: BTreeMap<AuxKey, AuxGroup<'a>>,
}

impl<'a> LayerPlan<'a> {
    /// `matrix/matrix` file
    pub fn write_matrix(&self, out: &mut dyn Write, step_name: &str) -> io::Result<()> {
        let mut tw = TextWriter::new(out);
        tw.array("STEP", |tw| {
            tw.equation("COL", 1)?;
            tw.equation("NAME", legal_entity_name(step_name))
        })?;
        for (id, layer) in self.matrix.iter().enumerate() {
            tw.array("LAYER", |tw| {
                tw.equation("ROW", layer.row)?;
                tw.equation("CONTEXT", layer.context.as_str())?;
                tw.equation("TYPE", layer.kind.as_str())?;
                tw.equation("NAME", &layer.name)?;
                tw.equation("OLD_NAME", "")?;
                tw.equation("POLARITY", layer.polarity.as_str())?;
                match layer.dielectric {
                    Some(d) => tw.equation("DIELECTRIC_TYPE", d.as_str())?,
                    None => tw.equation("DIELECTRIC_TYPE", "NONE")?,
                }
                tw.equation("DIELECTRIC_NAME", "")?;
                tw.equation("FORM", "RIGID")?;
                tw.equation("CU_TOP", "")?;
                tw.equation("CU_BOTTOM", "")?;
                tw.equation("REF", "")?;
                let (start, end) = layer
                    .span
                    .as_ref()
                    .map(|(s, e)| (s.as_str(), e.as_str()))
                    .unwrap_or(("", ""));
                tw.equation("START_NAME", start)?;
                tw.equation("END_NAME", end)?;
                tw.equation("ADD_TYPE", layer.add_type.as_deref().unwrap_or(""))?;
                tw.equation("COLOR", 0)?;
                tw.equation("ID", id + 1)
            })?;
        }
        Ok(())
    }

    pub fn drill_span_named(&self, name: &str) -> Option<(&DrillSpan, &DrillGroup<'a>)> {
        self.drill_spans.iter().find(|(_, g)| g.name == name)
    }

    pub fn aux_named(&self, name: &str) -> Option<(&AuxKey, &AuxGroup<'a>)> {
        self.aux_layers.iter().find(|(_, g)| g.name == name)
    }
}

/// Matrix type and context of a board layer; `None` for layers that are
/// never exported
pub fn layer_mapping(layer: BoardLayer) -> Option<(LayerType, Context)> {
    let mapped = match layer.class() {
        LayerClass::Copper => (LayerType::Signal, Context::Board),
        LayerClass::Mask => (LayerType::SolderMask, Context::Board),
        LayerClass::Paste => (LayerType::SolderPaste, Context::Board),
        LayerClass::Silk => (LayerType::SilkScreen, Context::Board),
        LayerClass::Margin => return None,
        _ => (LayerType::Document, Context::Misc),
    };
    Some(mapped)
}

/// Front to back stackup used when the board does not carry one
pub fn default_stackup(board: &Board) -> Vec<StackupItem> {
    let mut items = Vec::new();
    let push_tech = |items: &mut Vec<StackupItem>, layer: BoardLayer| {
        if board.is_enabled(layer) {
            items.push(StackupItem::Layer { layer });
        }
    };
    for layer in [BoardLayer::FSilkS, BoardLayer::FPaste, BoardLayer::FMask] {
        push_tech(&mut items, layer);
    }

    let copper = board.copper_layers();
    let gaps = copper.len().saturating_sub(1);
    let thickness = board.design.board_thickness / gaps.max(1) as i64;
    for (i, layer) in copper.iter().enumerate() {
        items.push(StackupItem::Layer { layer: *layer });
        if i < gaps {
            let n = i + 1;
            items.push(StackupItem::Dielectric {
                name: format!("dielectric_{n}"),
                core: gaps == 1 || n % 2 == 0,
                thickness,
            });
        }
    }

    for layer in [BoardLayer::BMask, BoardLayer::BPaste, BoardLayer::BSilkS] {
        push_tech(&mut items, layer);
    }
    items
}

/// Aux layer name before uniqueness is enforced
fn aux_name(board: &Board, key: &AuxKey) -> String {
    let (kind, scope) = key;
    let kind = kind.as_str();
    match scope {
        AuxScope::Side(Side::Top) => format!("{kind}_front"),
        AuxScope::Side(Side::Bottom) => format!("{kind}_back"),
        AuxScope::Span(top, _) if *top == BoardLayer::FCu => format!("{kind}_front"),
        AuxScope::Span(_, bottom) if *bottom == BoardLayer::BCu => format!("{kind}_back"),
        AuxScope::Span(top, bottom) => legal_entity_name(&format!(
            "{kind}_{}_{}",
            board.layer_name(*top),
            board.layer_name(*bottom)
        )),
    }
}

/// Builds the layer plan of a board
pub struct MatrixBuilder<'a> {
    board: &'a Board,
    matrix: Vec<MatrixLayer>,
    covered: BTreeSet<BoardLayer>,
}

impl<'a> MatrixBuilder<'a> {
    pub fn new(board: &'a Board) -> Self {
        Self {
            board,
            matrix: Vec::new(),
            covered: BTreeSet::new(),
        }
    }

    fn push(&mut self, name: String, kind: LayerType, context: Context, source: LayerSource) -> &mut MatrixLayer {
        let row = self.matrix.len() + 1;
        self.matrix.push(MatrixLayer {
            row,
            name,
            kind,
            context,
            polarity: Polarity::Positive,
            span: None,
            dielectric: None,
            add_type: None,
            source,
        });
        let last = self.matrix.len() - 1;
        &mut self.matrix[last]
    }

    fn push_board_layer(&mut self, layer: BoardLayer) {
        if !self.covered.insert(layer) {
            return;
        }
        let Some((kind, context)) = layer_mapping(layer) else {
            log::debug!("layer {layer} is not exported");
            return;
        };
        let name = legal_entity_name(&self.board.layer_name(layer));
        self.push(name, kind, context, LayerSource::Board(layer));
    }

    fn span_names(&self, top: BoardLayer, bottom: BoardLayer) -> (String, String) {
        (
            legal_entity_name(&self.board.layer_name(top)),
            legal_entity_name(&self.board.layer_name(bottom)),
        )
    }

    pub fn build(mut self) -> LayerPlan<'a> {
        let board = self.board;

        self.push(
            COMP_TOP.to_string(),
            LayerType::Component,
            Context::Board,
            LayerSource::Component(Side::Top),
        );

        let stackup = if board.stackup.is_empty() {
            default_stackup(board)
        } else {
            board.stackup.clone()
        };
        for item in &stackup {
            match item {
                StackupItem::Layer { layer } => self.push_board_layer(*layer),
                StackupItem::Dielectric { name, core, .. } => {
                    let row = self.push(
                        legal_entity_name(name),
                        LayerType::Dielectric,
                        Context::Board,
                        LayerSource::Dielectric,
                    );
                    row.dielectric = Some(if *core {
                        DielectricType::Core
                    } else {
                        DielectricType::Prepreg
                    });
                }
            }
        }

        for layer in &board.enabled_layers {
            self.push_board_layer(*layer);
        }

        let mut drill_spans: BTreeMap<DrillSpan, DrillGroup<'a>> = BTreeMap::new();
        let mut add_to_span = |span: DrillSpan, item: BoardItem<'a>| {
            drill_spans
                .entry(span)
                .or_insert_with(|| DrillGroup {
                    name: span.span_name(board),
                    items: Vec::new(),
                })
                .items
                .push(item);
        };
        for via in &board.vias {
            add_to_span(
                DrillSpan::new(via.start_layer, via.end_layer, false, false),
                BoardItem::Via(via),
            );
            if let Some(bd) = &via.backdrill {
                add_to_span(DrillSpan::new(bd.start, bd.end, true, false), BoardItem::Via(via));
            }
        }
        for (fp, pad) in board.pads().filter(|(_, pad)| pad.has_hole()) {
            let span = DrillSpan::new(BoardLayer::FCu, BoardLayer::BCu, false, !pad.is_plated());
            add_to_span(span, BoardItem::Pad(fp, pad));
        }
        for (span, group) in &drill_spans {
            let (start, end) = self.span_names(span.top(), span.bottom());
            let row = self.push(
                group.name.clone(),
                LayerType::Drill,
                Context::Board,
                LayerSource::Drill(*span),
            );
            row.span = Some((start, end));
            if span.backdrill {
                row.add_type = Some("BACKDRILL".to_string());
            }
        }

        let mut aux_layers: BTreeMap<AuxKey, AuxGroup<'a>> = BTreeMap::new();
        for via in &board.vias {
            let (top, bottom) = via.layer_pair();
            let mut keys = Vec::new();
            for side in [Side::Top, Side::Bottom] {
                if !via.reaches(side) {
                    continue;
                }
                for (kind, flags) in [
                    (AuxType::Covering, via.covering),
                    (AuxType::Plugging, via.plugging),
                    (AuxType::Tenting, via.tenting),
                ] {
                    if flags.get(side) {
                        keys.push((kind, AuxScope::Side(side)));
                    }
                }
            }
            if via.filled {
                keys.push((AuxType::Filling, AuxScope::Span(top, bottom)));
            }
            if via.capped {
                keys.push((AuxType::Capping, AuxScope::Span(top, bottom)));
            }
            for key in keys {
                aux_layers
                    .entry(key)
                    .or_insert_with(|| AuxGroup {
                        name: aux_name(board, &key),
                        vias: Vec::new(),
                    })
                    .vias
                    .push(via);
            }
        }
        for (key, group) in &aux_layers {
            let span = match key.1 {
                AuxScope::Span(top, bottom) => Some(self.span_names(top, bottom)),
                AuxScope::Side(_) => None,
            };
            let row = self.push(
                group.name.clone(),
                LayerType::Document,
                Context::Board,
                LayerSource::Aux(*key),
            );
            row.span = span;
            row.add_type = Some(key.0.as_str().to_ascii_uppercase());
        }

        if board.has_flipped_footprints() {
            self.push(
                COMP_BOT.to_string(),
                LayerType::Component,
                Context::Board,
                LayerSource::Component(Side::Bottom),
            );
        }

        ensure_unique_layer_names(&mut self.matrix);

        let mut entries = Vec::new();
        for layer in &self.matrix {
            match layer.source {
                LayerSource::Dielectric => continue,
                LayerSource::Board(l) => entries.push((Some(l), layer.name.clone())),
                LayerSource::Drill(span) => {
                    if let Some(group) = drill_spans.get_mut(&span) {
                        group.name = layer.name.clone();
                    }
                    entries.push((None, layer.name.clone()));
                }
                LayerSource::Aux(key) => {
                    if let Some(group) = aux_layers.get_mut(&key) {
                        group.name = layer.name.clone();
                    }
                    entries.push((None, layer.name.clone()));
                }
                LayerSource::Component(_) => entries.push((None, layer.name.clone())),
            }
        }

        log::debug!(
            "matrix: {} rows, {} drill spans, {} aux layers",
            self.matrix.len(),
            drill_spans.len(),
            aux_layers.len()
        );

        LayerPlan {
            matrix: self.matrix,
            entries,
            drill_spans,
            aux_layers,
        }
    }
}

/// Append `_N` to repeated names, staying within the entity name limit
pub fn ensure_unique_layer_names(layers: &mut [MatrixLayer]) {
    let mut taken = HashSet::new();
    for layer in layers {
        let name = unique_name(&mut taken, &layer.name);
        if name != layer.name {
            log::debug!("layer name {} renamed to {name}", layer.name);
            layer.name = name;
        }
    }
}
