use std::path::Path;

use anyhow::Result;
use colored::Colorize;
use comfy_table::presets::UTF8_FULL_CONDENSED;
use comfy_table::{Cell, Color, Table};
use odbpp::Board;
use odbpp::matrix::LayerPlan;
use serde_json::json;

use crate::OutputFormat;
use crate::utils::file as file_utils;

pub fn execute(file: &Path, format: OutputFormat) -> Result<()> {
    let board = file_utils::load_board(file)?;
    let plan = odbpp::plan_layers(&board);

    match format {
        OutputFormat::Text => output_text(&board, &plan),
        OutputFormat::Json => output_json(&board, &plan),
    }
}

/// Label and count for each board statistic
fn board_stats(board: &Board) -> Vec<(&'static str, usize)> {
    vec![
        ("Copper Layers", board.copper_layer_count),
        ("Nets", board.nets.len()),
        ("Footprints", board.footprints.len()),
        ("Pads", board.pads().count()),
        ("Tracks", board.tracks.len()),
        ("Vias", board.vias.len()),
        ("Zones", board.all_zones().count()),
    ]
}

fn output_text(board: &Board, plan: &LayerPlan<'_>) -> Result<()> {
    println!("{}", "Board Summary".bold());

    let mut summary_table = Table::new();
    summary_table.load_preset(UTF8_FULL_CONDENSED);
    summary_table.set_content_arrangement(comfy_table::ContentArrangement::Dynamic);
    if !board.name.is_empty() {
        summary_table.add_row(vec![
            Cell::new("Design").fg(Color::Cyan),
            Cell::new(&board.name),
        ]);
    }
    for (label, count) in board_stats(board) {
        summary_table.add_row(vec![
            Cell::new(label).fg(Color::Cyan),
            Cell::new(count.to_string()),
        ]);
    }
    println!("{summary_table}");

    println!();
    println!("{}", "Layer Matrix".bold());

    let mut matrix_table = Table::new();
    matrix_table.load_preset(UTF8_FULL_CONDENSED);
    matrix_table.set_content_arrangement(comfy_table::ContentArrangement::Dynamic);
    matrix_table.set_header(vec!["Row", "Name", "Type", "Context", "Polarity", "Span"]);
    for layer in &plan.matrix {
        let span = layer
            .span
            .as_ref()
            .map(|(start, end)| format!("{start} → {end}"))
            .unwrap_or_default();
        matrix_table.add_row(vec![
            Cell::new(layer.row.to_string()),
            Cell::new(&layer.name).fg(Color::Green),
            Cell::new(layer.kind.as_str()),
            Cell::new(layer.context.as_str()),
            Cell::new(layer.polarity.as_str()),
            Cell::new(span),
        ]);
    }
    println!("{matrix_table}");

    Ok(())
}

fn output_json(board: &Board, plan: &LayerPlan<'_>) -> Result<()> {
    let stats: serde_json::Map<String, serde_json::Value> = board_stats(board)
        .into_iter()
        .map(|(label, count)| (label.to_lowercase().replace(' ', "_"), json!(count)))
        .collect();

    let layers: Vec<_> = plan
        .matrix
        .iter()
        .map(|layer| {
            json!({
                "row": layer.row,
                "name": layer.name,
                "type": layer.kind.as_str(),
                "context": layer.context.as_str(),
                "polarity": layer.polarity.as_str(),
                "start": layer.span.as_ref().map(|(start, _)| start),
                "end": layer.span.as_ref().map(|(_, end)| end),
                "add_type": layer.add_type,
            })
        })
        .collect();

    let info = json!({
        "name": board.name,
        "stats": stats,
        "layers": layers,
    });
    println!("{}", serde_json::to_string_pretty(&info)?);
    Ok(())
}
