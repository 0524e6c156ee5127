//! ODB++ product model export for PCB boards.
//!
//! The exporter turns a [`Board`] into the ODB++ directory tree: the job
//! matrix, one step with its layers, the `eda/data` netlist, the `cadnet`
//! netlist and the board profile.
//!
//! ```no_run
//! use odbpp::{Board, ExportConfig, export_board};
//!
//! let board = Board::from_json(&std::fs::read_to_string("board.json")?)?;
//! let summary = export_board(&board, &ExportConfig::default(), "out/odb".as_ref())?;
//! println!("{} layers", summary.layer_count);
//! # Ok::<(), odbpp::OdbError>(())
//! ```

pub mod attr;
pub mod board;
pub mod components;
pub mod drill;
pub mod eda_data;
pub mod entity;
mod export;
pub mod feature;
pub mod features_manager;
pub mod geom;
pub mod matrix;
pub mod names;
pub mod netlist;
pub mod symbols;
pub mod units;
pub mod writer;

pub use board::Board;
pub use export::{ExportSummary, export_board, plan_layers};
pub use units::{Compression, ExportConfig, Formatter, Units};

use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum OdbError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to create directory {}: {source}", path.display())]
    CreateDir {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to write {}: {source}", path.display())]
    WriteFile {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Missing subnet for {0}")]
    MissingSubnet(String),

    #[error("Invalid board: {0}")]
    InvalidBoard(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid export configuration: {0}")]
    Config(#[from] toml::de::Error),

    #[error("Archive error: {0}")]
    Archive(String),
}

pub type Result<T> = std::result::Result<T, OdbError>;
