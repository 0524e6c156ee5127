use std::collections::HashMap;
use std::io::Write;

use super::{Entity, LayerEntity, write_equations};
use crate::board::{Board, BoardLayer, Side};
use crate::eda_data::{EdaData, PlaneCutout, PlaneFill, SubnetKind};
use crate::features_manager::{BoardItem, FeaturesManager};
use crate::matrix::LayerPlan;
use crate::names::legal_entity_name;
use crate::netlist::Netlist;
use crate::units::{ExportConfig, Formatter};
use crate::writer::TreeWriter;
use crate::Result;

/// One step: layers, EDA data, netlist, profile and header
pub struct StepEntity<'p, 'a> {
    board: &'a Board,
    plan: &'p LayerPlan<'a>,
    fmt: Formatter,
    dir: String,
    eda: EdaData,
    layers: Vec<LayerEntity<'a>>,
    netlist: Option<Netlist>,
    profile: FeaturesManager,
}

impl<'p, 'a> StepEntity<'p, 'a> {
    pub fn new(board: &'a Board, plan: &'p LayerPlan<'a>, config: &ExportConfig) -> Self {
        let fmt = config.formatter();
        let max_error = board.design.max_error;
        Self {
            board,
            plan,
            fmt,
            dir: format!("steps/{}", legal_entity_name(&config.step_name)),
            eda: EdaData::new(fmt, &config.source, max_error),
            layers: Vec::new(),
            netlist: None,
            profile: FeaturesManager::new(fmt, "profile", max_error),
        }
    }

    /// Build every record of the step, in dependency order
    pub fn init(&mut self) -> Result<()> {
        self.make_layer_entity();
        self.init_eda_data();
        self.init_layer_entity_data()?;
        self.init_profile();
        self.netlist = Some(Netlist::build(self.board, &self.eda, self.fmt));
        Ok(())
    }

    pub fn eda(&self) -> &EdaData {
        &self.eda
    }

    pub fn layers(&self) -> &[LayerEntity<'a>] {
        &self.layers
    }

    pub fn layer(&self, name: &str) -> Option<&LayerEntity<'a>> {
        self.layers.iter().find(|l| l.name() == name)
    }

    pub fn feature_count(&self) -> usize {
        self.layers.iter().map(|l| l.features().len()).sum()
    }

    pub fn component_count(&self) -> usize {
        self.layers
            .iter()
            .filter_map(|l| l.components())
            .map(|c| c.components().len())
            .sum()
    }

    /// Create one layer entity per plan entry and bucket the board items
    /// into the layers they are drawn on
    pub fn make_layer_entity(&mut self) {
        let board = self.board;
        self.layers = self
            .plan
            .entries
            .iter()
            .map(|(layer, name)| LayerEntity::new(name, *layer, self.fmt, board.design.max_error))
            .collect();
        let index: HashMap<BoardLayer, usize> = self
            .layers
            .iter()
            .enumerate()
            .filter_map(|(i, l)| l.layer().map(|layer| (layer, i)))
            .collect();

        let layers = &mut self.layers;
        let mut add = |layer: BoardLayer, item: BoardItem<'a>| {
            if let Some(&i) = index.get(&layer) {
                layers[i].add_item(item);
            }
        };

        for track in &board.tracks {
            add(track.layer, BoardItem::Track(track));
        }

        for via in &board.vias {
            for layer in via.copper_layers(board.copper_layer_count) {
                add(layer, BoardItem::Via(via));
            }
            for side in [Side::Top, Side::Bottom] {
                if via.reaches(side) && !via.tenting.get(side) {
                    add(BoardLayer::mask(side), BoardItem::Via(via));
                }
            }
        }

        for (fp, pad) in board.pads() {
            let mut layers = pad.layers.clone();
            // plated holes connect every copper layer in between
            if pad.is_plated() && pad.is_on(BoardLayer::FCu) && pad.is_on(BoardLayer::BCu) {
                layers.extend(board.copper_layers());
            }
            for layer in layers {
                add(layer, BoardItem::Pad(fp, pad));
            }
        }

        for zone in board.all_zones().filter(|z| !z.rule_area) {
            for layer in zone.fills.keys() {
                if zone.fill(*layer).is_some() {
                    add(*layer, BoardItem::Zone(zone));
                }
            }
        }

        let shapes = board
            .shapes
            .iter()
            .chain(board.footprints.iter().flat_map(|fp| fp.shapes.iter()));
        for shape in shapes {
            add(shape.layer, BoardItem::Shape(shape));
        }

        let texts = board
            .texts
            .iter()
            .chain(board.footprints.iter().flat_map(|fp| fp.texts.iter()));
        for text in texts.filter(|t| t.visible != Some(false)) {
            add(text.layer, BoardItem::Text(text));
        }

        for dim in &board.dimensions {
            add(dim.layer, BoardItem::Dimension(dim));
        }
        for code in &board.barcodes {
            add(code.layer, BoardItem::Barcode(code));
        }
    }

    /// Packages, nets and subnets; publishes the subnet lookups the layers use
    pub fn init_eda_data(&mut self) {
        let board = self.board;
        let eda = &mut self.eda;
        let net_name = |code: i32| board.net_name(code).unwrap_or("");

        for net in &board.nets {
            eda.add_net(net.code, &net.name);
        }

        let mut next_component = [0usize; 2];
        for fp in &board.footprints {
            eda.add_package(fp);
            let side = fp.side();
            let slot = match side {
                Side::Top => 0,
                Side::Bottom => 1,
            };
            let component = next_component[slot];
            next_component[slot] += 1;

            for (toeprint, pad) in fp.pads.iter().enumerate() {
                let net = eda.add_net(pad.net, net_name(pad.net));
                let sref = eda.add_subnet(
                    net,
                    SubnetKind::Toeprint {
                        side,
                        component,
                        toeprint,
                    },
                );
                eda.lookups.pads.insert(pad.id, sref);
            }
        }

        for track in &board.tracks {
            let net = eda.add_net(track.net, net_name(track.net));
            let sref = eda.add_subnet(net, SubnetKind::Trace);
            eda.lookups.tracks.insert(track.id, sref);
        }

        for via in &board.vias {
            let net = eda.add_net(via.net, net_name(via.net));
            let sref = eda.add_subnet(net, SubnetKind::Via);
            eda.lookups.tracks.insert(via.id, sref);
        }

        for zone in board.all_zones().filter(|z| !z.rule_area) {
            let net = eda.add_net(zone.net, net_name(zone.net));
            for layer in zone.fills.keys().filter(|l| l.is_copper()) {
                let sref = eda.add_subnet(
                    net,
                    SubnetKind::Plane {
                        fill: PlaneFill::Solid,
                        cutout: PlaneCutout::Exact,
                        size: 0,
                    },
                );
                eda.lookups.planes.insert((*layer, zone.id), sref);
            }
        }

        log::debug!(
            "eda data: {} packages, {} nets",
            eda.packages.len(),
            eda.nets.len()
        );
    }

    fn init_layer_entity_data(&mut self) -> Result<()> {
        for layer in &mut self.layers {
            layer.init_entity_data(self.board, self.plan, &mut self.eda)?;
        }
        Ok(())
    }

    fn init_profile(&mut self) {
        let outline = &self.board.outline;
        if outline.is_empty() {
            log::warn!("board has no outline, the step profile is empty");
        }
        for idx in 0..outline.outline_count() {
            self.profile.add_contour(outline, idx);
        }
    }

    fn write_stephdr(&self, out: &mut dyn Write) -> std::io::Result<()> {
        let zero = "0".to_string();
        let pairs = [
            ("UNITS", self.fmt.units().as_str().to_string()),
            ("X_DATUM", zero.clone()),
            ("Y_DATUM", zero.clone()),
            ("X_ORIGIN", zero.clone()),
            ("Y_ORIGIN", zero.clone()),
            ("TOP_ACTIVE", zero.clone()),
            ("BOTTOM_ACTIVE", zero.clone()),
            ("RIGHT_ACTIVE", zero.clone()),
            ("LEFT_ACTIVE", zero.clone()),
            ("AFFECTING_BOM", String::new()),
            ("AFFECTING_BOM_CHANGED", zero),
        ];
        write_equations(out, &pairs)
    }
}

impl Entity for StepEntity<'_, '_> {
    fn dir(&self) -> &str {
        &self.dir
    }

    fn generate_files(&mut self, tree: &TreeWriter) -> Result<()> {
        let dir = &self.dir;
        tree.create_dir(format!("{dir}/layers"))?;
        for layer in &self.layers {
            layer.generate_files(tree, &format!("{dir}/layers/{}", layer.name()))?;
        }

        tree.create_dir(format!("{dir}/eda"))?;
        tree.write_file(format!("{dir}/eda/data"), |out| self.eda.write(out))?;

        tree.create_dir(format!("{dir}/netlists/cadnet"))?;
        tree.write_file(format!("{dir}/netlists/cadnet/netlist"), |out| match &self.netlist {
            Some(netlist) => netlist.write(out),
            None => Ok(()),
        })?;

        tree.write_file(format!("{dir}/profile"), |out| {
            self.profile.write_features_file(out)
        })?;
        tree.write_file(format!("{dir}/stephdr"), |out| self.write_stephdr(out))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::{Footprint, Pad, PadShape, Track, Via, Zone};
    use crate::geom::{Contour, Point, PolySet, Size};
    use crate::matrix::MatrixBuilder;

    fn board() -> Board {
        let mut board = Board::new(4);
        let gnd = board.add_net("GND");
        let sig = board.add_net("SIG");
        board
            .tracks
            .push(Track::segment(Point::new(0, 0), Point::new(5_000_000, 0), 200_000, BoardLayer::FCu, sig));
        board.vias.push(Via::new(Point::new(5_000_000, 0), 600_000, 300_000, sig));

        let mut fp = Footprint::new("U1", "SOT23", Point::new(0, 0));
        let mut pad = Pad::new("1", Point::new(0, 0), Size::new(500_000, 500_000), PadShape::Rect);
        pad.layers.extend([BoardLayer::FCu, BoardLayer::FMask, BoardLayer::FPaste]);
        pad.net = sig;
        fp.pads.push(pad);
        board.footprints.push(fp);

        let mut zone = Zone {
            id: uuid::Uuid::new_v4(),
            name: "gnd".into(),
            net: gnd,
            layers: [BoardLayer::In(1)].into_iter().collect(),
            fills: Default::default(),
            rule_area: false,
            teardrop: false,
        };
        zone.fills.insert(
            BoardLayer::In(1),
            PolySet::from_contour(Contour::from_points(&[
                Point::new(0, 0),
                Point::new(10_000_000, 0),
                Point::new(10_000_000, 10_000_000),
            ])),
        );
        board.zones.push(zone);
        board
    }

    #[test]
    fn items_land_on_their_layers() {
        let board = board();
        let plan = MatrixBuilder::new(&board).build();
        let mut step = StepEntity::new(&board, &plan, &ExportConfig::default());
        step.make_layer_entity();

        let count = |name: &str| {
            step.layer(name)
                .map(|l| l.items().values().flatten().count())
                .unwrap_or(0)
        };
        // track, via and pad
        assert_eq!(count("f.cu"), 3);
        // via and zone
        assert_eq!(count("in1.cu"), 2);
        assert_eq!(count("in2.cu"), 1);
        // untented via and the pad opening
        assert_eq!(count("f.mask"), 2);
        assert_eq!(count("f.paste"), 1);
        assert_eq!(count("b.paste"), 0);
    }

    #[test]
    fn subnets_are_published_before_layers_initialise() {
        let board = board();
        let plan = MatrixBuilder::new(&board).build();
        let mut step = StepEntity::new(&board, &plan, &ExportConfig::default());
        step.init().unwrap();

        let eda = step.eda();
        assert_eq!(eda.lookups.pads.len(), 1);
        assert_eq!(eda.lookups.tracks.len(), 2);
        assert_eq!(eda.lookups.planes.len(), 1);

        let names: Vec<_> = eda.nets.iter().map(|n| n.name.as_str()).collect();
        assert_eq!(names, ["$NONE$", "GND", "SIG"]);

        // the via is flashed on all four copper layers
        let sig = &eda.nets[2];
        let via = sig
            .subnets
            .iter()
            .find(|s| s.kind == SubnetKind::Via)
            .unwrap();
        assert_eq!(via.feature_ids.len(), 5);
        assert_eq!(step.component_count(), 1);
        assert!(step.feature_count() > 0);
    }
}
