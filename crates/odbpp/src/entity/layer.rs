use crate::board::{Board, BoardLayer, Side};
use crate::components::ComponentsManager;
use crate::drill::{DrillTools, ToolType, ToolType2};
use crate::eda_data::EdaData;
use crate::features_manager::{BoardItem, FeaturesManager, LayerItems, is_aux_layer, is_drill_layer};
use crate::matrix::{COMP_BOT, COMP_TOP, LayerPlan};
use crate::units::Formatter;
use crate::writer::TreeWriter;
use crate::Result;

/// One matrix layer with its items and generated records
#[derive(Debug)]
pub struct LayerEntity<'a> {
    name: String,
    layer: Option<BoardLayer>,
    fmt: Formatter,
    items: LayerItems<'a>,
    features: FeaturesManager,
    components: Option<ComponentsManager>,
    tools: Option<DrillTools>,
}

impl<'a> LayerEntity<'a> {
    pub fn new(name: &str, layer: Option<BoardLayer>, fmt: Formatter, max_error: i64) -> Self {
        Self {
            name: name.to_string(),
            layer,
            fmt,
            items: LayerItems::new(),
            features: FeaturesManager::new(fmt, name, max_error),
            components: None,
            tools: None,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn layer(&self) -> Option<BoardLayer> {
        self.layer
    }

    pub fn add_item(&mut self, item: BoardItem<'a>) {
        self.items.entry(item.net()).or_default().push(item);
    }

    pub fn items(&self) -> &LayerItems<'a> {
        &self.items
    }

    pub fn features(&self) -> &FeaturesManager {
        &self.features
    }

    pub fn components(&self) -> Option<&ComponentsManager> {
        self.components.as_ref()
    }

    pub fn tools(&self) -> Option<&DrillTools> {
        self.tools.as_ref()
    }

    fn component_side(&self) -> Option<Side> {
        match self.name.as_str() {
            COMP_TOP => Some(Side::Top),
            COMP_BOT => Some(Side::Bottom),
            _ => None,
        }
    }

    /// Resolve the layer's own items and emit its records.
    ///
    /// Must run after the EDA data has published its subnet lookups.
    pub fn init_entity_data(
        &mut self,
        board: &'a Board,
        plan: &LayerPlan<'a>,
        eda: &mut EdaData,
    ) -> Result<()> {
        if let Some(side) = self.component_side() {
            let fmt = self.fmt;
            self.components
                .get_or_insert_with(|| ComponentsManager::new(fmt, side))
                .init_component_data(board, eda)?;
            return Ok(());
        }

        if self.layer.is_none() && is_drill_layer(&self.name) {
            self.init_drill_layer(board, plan);
        } else if self.layer.is_none() && is_aux_layer(&self.name) {
            match plan.aux_named(&self.name) {
                Some((_, group)) => {
                    for via in &group.vias {
                        self.add_item(BoardItem::Via(*via));
                    }
                }
                None => log::warn!("no vias found for layer {}", self.name),
            }
        }

        self.features
            .init_feature_list(board, eda, self.layer, &self.items);
        Ok(())
    }

    fn init_drill_layer(&mut self, board: &'a Board, plan: &LayerPlan<'a>) {
        let (items, backdrill) = match plan.drill_span_named(&self.name) {
            Some((span, group)) => (group.items.clone(), span.backdrill),
            None => {
                log::debug!("{}: no drill span, matching by name", self.name);
                (legacy_drill_items(board, &self.name), false)
            }
        };

        let mut tools = DrillTools::new(self.fmt, board.design.board_thickness);
        for item in &items {
            match item {
                BoardItem::Via(via) => {
                    let diameter = match (&via.backdrill, backdrill) {
                        (Some(bd), true) => bd.diameter,
                        _ => via.drill,
                    };
                    let kind2 = if via.is_blind() {
                        ToolType2::Blind
                    } else {
                        ToolType2::Standard
                    };
                    tools.add(ToolType::Via, diameter, kind2);
                }
                BoardItem::Pad(_, pad) => {
                    let Some(drill) = pad.drill else { continue };
                    let kind = if pad.is_plated() {
                        ToolType::Plated
                    } else {
                        ToolType::NonPlated
                    };
                    tools.add(kind, drill.w.min(drill.h), ToolType2::Standard);
                }
                _ => {}
            }
        }
        self.tools = Some(tools);
        for item in items {
            self.add_item(item);
        }
    }

    /// Write `attrlist`, `features` and, when present, `components` and `tools`
    pub fn generate_files(&self, tree: &TreeWriter, dir: &str) -> Result<()> {
        tree.create_dir(dir)?;
        let units = self.fmt.units().as_str();
        tree.write_file(format!("{dir}/attrlist"), |out| writeln!(out, "UNITS={units}"))?;
        tree.write_file(format!("{dir}/features"), |out| {
            self.features.write_features_file(out)
        })?;
        if let Some(components) = &self.components {
            tree.write_file(format!("{dir}/components"), |out| components.write(out))?;
        }
        if let Some(tools) = self.tools.as_ref().filter(|t| !t.is_empty()) {
            tree.write_file(format!("{dir}/tools"), |out| tools.write(out))?;
        }
        Ok(())
    }
}

/// Drill items chosen by layer name alone, for layers without a span entry
fn legacy_drill_items<'a>(board: &'a Board, name: &str) -> Vec<BoardItem<'a>> {
    let mut items = Vec::new();
    if name.contains("non_plated") {
        items.extend(
            board
                .pads()
                .filter(|(_, pad)| pad.has_hole() && !pad.is_plated())
                .map(|(fp, pad)| BoardItem::Pad(fp, pad)),
        );
    } else if name.contains("plated") {
        items.extend(
            board
                .vias
                .iter()
                .filter(|via| via.is_through())
                .map(BoardItem::Via),
        );
        items.extend(
            board
                .pads()
                .filter(|(_, pad)| pad.has_hole() && pad.is_plated())
                .map(|(fp, pad)| BoardItem::Pad(fp, pad)),
        );
    }
    items
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::{Footprint, Pad, PadAttribute, PadShape, Via};
    use crate::geom::{Point, Size};
    use crate::matrix::MatrixBuilder;
    use crate::units::Units;

    fn fmt() -> Formatter {
        Formatter::new(Units::Mm, None)
    }

    fn board() -> Board {
        let mut board = Board::new(2);
        board.vias.push(Via::new(Point::new(0, 0), 600_000, 300_000, 0));
        board.vias.push(Via::new(Point::new(1_000_000, 0), 600_000, 300_000, 0));
        let mut fp = Footprint::new("H1", "MountingHole", Point::new(0, 0));
        let mut hole = Pad::new("", Point::new(5_000_000, 0), Size::new(3_200_000, 3_200_000), PadShape::Circle);
        hole.attribute = PadAttribute::Npth;
        hole.drill = Some(Size::new(3_200_000, 3_200_000));
        fp.pads.push(hole);
        board.footprints.push(fp);
        board
    }

    #[test]
    fn drill_layer_from_span_fills_tools() {
        let board = board();
        let plan = MatrixBuilder::new(&board).build();
        let mut eda = EdaData::new(fmt(), "test", 5_000);
        for via in &board.vias {
            let sref = eda.add_subnet(0, crate::eda_data::SubnetKind::Via);
            eda.lookups.tracks.insert(via.id, sref);
        }

        let mut layer = LayerEntity::new("drill_plated_f.cu-b.cu", None, fmt(), 5_000);
        layer.init_entity_data(&board, &plan, &mut eda).unwrap();
        assert_eq!(layer.features().len(), 2);
        let tools = layer.tools().unwrap();
        assert_eq!(tools.tools().len(), 1);
        assert_eq!(tools.tools()[0].kind, ToolType::Via);

        let mut npth = LayerEntity::new("drill_non_plated_f.cu-b.cu", None, fmt(), 5_000);
        npth.init_entity_data(&board, &plan, &mut eda).unwrap();
        assert_eq!(npth.features().len(), 1);
        assert_eq!(npth.tools().unwrap().tools()[0].kind, ToolType::NonPlated);
    }

    #[test]
    fn unknown_drill_name_falls_back_to_name_matching() {
        let board = board();
        let plan = MatrixBuilder::new(&board).build();
        let mut eda = EdaData::new(fmt(), "test", 5_000);
        let mut layer = LayerEntity::new("old_drill_non_plated", None, fmt(), 5_000);
        layer.init_entity_data(&board, &plan, &mut eda).unwrap();
        assert_eq!(layer.items().values().flatten().count(), 1);
        assert_eq!(layer.features().len(), 1);
    }

    #[test]
    fn items_are_grouped_by_net() {
        let board = board();
        let mut via = board.vias[0].clone();
        via.net = 3;
        let mut layer = LayerEntity::new("f.cu", Some(BoardLayer::FCu), fmt(), 5_000);
        layer.add_item(BoardItem::Via(&board.vias[0]));
        layer.add_item(BoardItem::Via(&via));
        layer.add_item(BoardItem::Via(&board.vias[1]));
        assert_eq!(layer.items()[&0].len(), 2);
        assert_eq!(layer.items()[&3].len(), 1);
    }
}
