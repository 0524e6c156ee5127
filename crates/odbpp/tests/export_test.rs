use std::collections::HashSet;
use std::fs::{self, File};
use std::io::Read;
use std::path::Path;

use assert_fs::TempDir;
use odbpp::board::{BoardLayer, Footprint, Pad, PadShape, Track, Via};
use odbpp::eda_data::{FeatureIdKind, SubnetKind};
use odbpp::entity::StepEntity;
use odbpp::features_manager::FeaturesManager;
use odbpp::geom::{Contour, Point, PolySet, Size};
use odbpp::{Board, Compression, ExportConfig, Formatter, Units, export_board, plan_layers};
use walkdir::WalkDir;

const MM: i64 = 1_000_000;

fn outline() -> PolySet {
    PolySet::from_contour(Contour::from_points(&[
        Point::new(-10 * MM, -10 * MM),
        Point::new(10 * MM, -10 * MM),
        Point::new(10 * MM, 10 * MM),
        Point::new(-10 * MM, 10 * MM),
    ]))
}

/// Two-pad SMD part on GND with a routed track and a through via
fn resistor_board() -> Board {
    let mut board = Board::new(2);
    board.outline = outline();
    let gnd = board.add_net("GND");

    let mut fp = Footprint::new("R1", "R_0603", Point::new(0, 0));
    for (number, x) in [("1", -MM), ("2", MM)] {
        let mut pad = Pad::new(number, Point::new(x, 0), Size::new(800_000, 900_000), PadShape::Rect);
        pad.layers.extend([BoardLayer::FCu, BoardLayer::FMask, BoardLayer::FPaste]);
        pad.net = gnd;
        fp.pads.push(pad);
    }
    board.footprints.push(fp);

    board.tracks.push(Track::segment(
        Point::new(MM, 0),
        Point::new(5 * MM, 0),
        250_000,
        BoardLayer::FCu,
        gnd,
    ));
    board.vias.push(Via::new(Point::new(5 * MM, 0), 600_000, 300_000, gnd));
    board
}

/// `R_0603` two-pad SMD footprint placed at `at`, rotated by `angle`
fn resistor(reference: &str, at: Point, angle: f64, net: i32) -> Footprint {
    let mut fp = Footprint::new(reference, "R_0603", at);
    fp.orientation = angle;
    for (number, x) in [("1", -MM), ("2", MM)] {
        let position = Point::new(x, 0).rotated(angle) + at;
        let mut pad = Pad::new(number, position, Size::new(800_000, 900_000), PadShape::Rect);
        pad.orientation = angle;
        pad.layers.extend([BoardLayer::FCu, BoardLayer::FMask, BoardLayer::FPaste]);
        pad.net = net;
        fp.pads.push(pad);
    }
    fp
}

fn relative_files(root: &Path) -> HashSet<String> {
    WalkDir::new(root)
        .into_iter()
        .filter_map(|e| e.ok())
        .filter_map(|e| {
            e.path()
                .strip_prefix(root)
                .ok()
                .map(|p| p.to_string_lossy().replace('\\', "/"))
        })
        .filter(|p| !p.is_empty())
        .collect()
}

#[test]
fn smd_part_builds_one_package_and_component() {
    let board = resistor_board();
    let plan = plan_layers(&board);
    let mut step = StepEntity::new(&board, &plan, &ExportConfig::default());
    step.init().unwrap();

    let eda = step.eda();
    assert_eq!(eda.packages.len(), 1);
    assert_eq!(eda.packages[0].pins.len(), 2);
    assert_eq!(eda.packages[0].pitch, 2 * MM);

    let comp_top = step.layer("comp_+_top").unwrap();
    let components = comp_top.components().unwrap().components();
    assert_eq!(components.len(), 1);
    assert_eq!(components[0].toeprints.len(), 2);

    let gnd = eda.nets.iter().find(|n| n.name == "GND").unwrap();
    let toeprints: Vec<_> = gnd
        .subnets
        .iter()
        .filter(|s| matches!(s.kind, SubnetKind::Toeprint { .. }))
        .collect();
    assert_eq!(toeprints.len(), 2);
    for subnet in toeprints {
        assert_eq!(subnet.feature_ids.len(), 1);
        assert_eq!(subnet.feature_ids[0].kind, FeatureIdKind::Copper);
    }
}

#[test]
fn footprint_without_routing_still_gets_toeprint_subnets() {
    let mut board = Board::new(2);
    board.outline = outline();
    let gnd = board.add_net("GND");
    board.footprints.push(resistor("R1", Point::new(0, 0), 0.0, gnd));

    let plan = plan_layers(&board);
    let mut step = StepEntity::new(&board, &plan, &ExportConfig::default());
    step.init().unwrap();

    let eda = step.eda();
    assert_eq!(eda.packages.len(), 1);
    assert_eq!(eda.packages[0].pitch, 2 * MM);
    assert_eq!(step.component_count(), 1);

    let gnd = eda.nets.iter().find(|n| n.name == "GND").unwrap();
    assert_eq!(gnd.subnets.len(), 2);
    for subnet in &gnd.subnets {
        assert!(matches!(subnet.kind, SubnetKind::Toeprint { .. }));
        assert_eq!(subnet.feature_ids.len(), 1);
        assert_eq!(subnet.feature_ids[0].kind, FeatureIdKind::Copper);
    }
}

#[test]
fn moved_and_rotated_copies_share_a_package() {
    let mut board = Board::new(2);
    board.outline = outline();
    let gnd = board.add_net("GND");
    board.footprints.push(resistor("R1", Point::new(0, 0), 0.0, gnd));
    board.footprints.push(resistor("R2", Point::new(5 * MM, 5 * MM), 90.0, gnd));

    let plan = plan_layers(&board);
    let mut step = StepEntity::new(&board, &plan, &ExportConfig::default());
    step.init().unwrap();

    let eda = step.eda();
    assert_eq!(eda.packages.len(), 1);
    assert_eq!(step.component_count(), 2);
    let gnd = eda.nets.iter().find(|n| n.name == "GND").unwrap();
    let toeprints = gnd
        .subnets
        .iter()
        .filter(|s| matches!(s.kind, SubnetKind::Toeprint { .. }))
        .count();
    assert_eq!(toeprints, 4);
}

#[test]
fn filled_via_adds_only_the_filling_layer() {
    let mut board = Board::new(2);
    let mut via = Via::new(Point::new(0, 0), 600_000, 300_000, 0);
    via.filled = true;
    board.vias.push(via);

    let plan = plan_layers(&board);
    let names: Vec<_> = plan.matrix.iter().map(|l| l.name.as_str()).collect();
    assert!(names.contains(&"filling_front"));
    assert!(!names.iter().any(|n| n.starts_with("capping")));
}

#[test]
fn profile_contour_needs_an_outline() {
    let fmt = Formatter::new(Units::Mm, None);
    let mut profile = FeaturesManager::new(fmt, "profile", 5_000);
    assert!(!profile.add_contour(&PolySet::default(), 0));
    assert!(profile.add_contour(&outline(), 0));
    assert_eq!(profile.len(), 1);
}

#[test]
fn export_writes_the_job_tree() {
    let temp = TempDir::new().unwrap();
    let out = temp.path().join("job");
    let board = resistor_board();
    let summary = export_board(&board, &ExportConfig::default(), &out).unwrap();

    assert_eq!(summary.output_path, out);
    assert_eq!(summary.component_count, 1);
    assert_eq!(summary.package_count, 1);
    assert_eq!(summary.net_count, 2);
    assert!(summary.feature_count > 0);

    let files = relative_files(&out);
    for expected in [
        "fonts/standard",
        "input",
        "matrix/matrix",
        "misc/info",
        "symbols",
        "user",
        "wheels",
        "steps/pcb/stephdr",
        "steps/pcb/profile",
        "steps/pcb/eda/data",
        "steps/pcb/netlists/cadnet/netlist",
        "steps/pcb/layers/f.cu/features",
        "steps/pcb/layers/f.cu/attrlist",
        "steps/pcb/layers/comp_+_top/components",
        "steps/pcb/layers/drill_plated_f.cu-b.cu/tools",
    ] {
        assert!(files.contains(expected), "missing {expected}");
    }
    assert!(!files.contains("steps/pcb/layers/comp_+_bot"));

    let matrix = fs::read_to_string(out.join("matrix/matrix")).unwrap();
    let rows = matrix.matches("LAYER {").count();
    assert_eq!(rows, summary.layer_count);

    let profile = fs::read_to_string(out.join("steps/pcb/profile")).unwrap();
    assert!(profile.contains("\nS P 0\n"));
}

#[test]
fn duplicate_user_names_stay_unique() {
    let temp = TempDir::new().unwrap();
    let mut board = resistor_board();
    board.layer_names.insert(BoardLayer::FCu, "Signal".into());
    board.layer_names.insert(BoardLayer::BCu, "Signal".into());

    let plan = plan_layers(&board);
    let names: HashSet<_> = plan.matrix.iter().map(|l| l.name.clone()).collect();
    assert_eq!(names.len(), plan.matrix.len());

    let out = temp.path().join("job");
    export_board(&board, &ExportConfig::default(), &out).unwrap();
    assert!(names.contains("signal") && names.contains("signal_1"));
    // dielectric rows have no layer directory
    for (_, name) in &plan.entries {
        assert!(out.join("steps/pcb/layers").join(name).is_dir());
    }
}

#[test]
fn zip_archive_replaces_the_directory() {
    let temp = TempDir::new().unwrap();
    let out = temp.path().join("job");
    let config = ExportConfig {
        compression: Compression::Zip,
        ..ExportConfig::default()
    };
    let summary = export_board(&resistor_board(), &config, &out).unwrap();

    assert_eq!(summary.output_path, temp.path().join("job.zip"));
    assert!(!out.exists());
    let mut archive = zip::ZipArchive::new(File::open(&summary.output_path).unwrap()).unwrap();
    let mut matrix = String::new();
    archive
        .by_name("job/matrix/matrix")
        .unwrap()
        .read_to_string(&mut matrix)
        .unwrap();
    assert!(matrix.contains("NAME=f.cu"));
}

#[test]
fn tgz_archive_contains_the_job() {
    let temp = TempDir::new().unwrap();
    let out = temp.path().join("job");
    let config = ExportConfig {
        compression: Compression::Tgz,
        ..ExportConfig::default()
    };
    let summary = export_board(&resistor_board(), &config, &out).unwrap();

    assert_eq!(summary.output_path, temp.path().join("job.tgz"));
    assert!(!out.exists());
    let gz = flate2::read::GzDecoder::new(File::open(&summary.output_path).unwrap());
    let mut archive = tar::Archive::new(gz);
    let paths: Vec<String> = archive
        .entries()
        .unwrap()
        .map(|e| e.unwrap().path().unwrap().to_string_lossy().into_owned())
        .collect();
    assert!(paths.iter().any(|p| p == "job/misc/info"));
    assert!(paths.iter().any(|p| p == "job/steps/pcb/eda/data"));
}
