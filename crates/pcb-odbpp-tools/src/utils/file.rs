use std::path::Path;

use anyhow::{Context, Result};
use odbpp::{Board, ExportConfig};

/// Load and validate a board JSON file
pub fn load_board(path: &Path) -> Result<Board> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read file: {:?}", path))?;
    Board::from_json(&content).with_context(|| format!("Failed to load board: {:?}", path))
}

/// Load export settings from a TOML file
pub fn load_config(path: &Path) -> Result<ExportConfig> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config: {:?}", path))?;
    ExportConfig::from_toml_str(&content)
        .with_context(|| format!("Invalid export config: {:?}", path))
}
