use std::path::PathBuf;

use clap::{Parser, Subcommand};
use env_logger::Env;

use pcb_odbpp_tools::commands::export::ExportArgs;
use pcb_odbpp_tools::{ArchiveFormat, OutputFormat, UnitFormat, commands, utils};

#[derive(Parser)]
#[command(name = "pcb-odbpp")]
#[command(about = "ODB++ export and inspection tool", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Export a board to an ODB++ job directory
    Export {
        /// Board JSON file
        #[arg(value_hint = clap::ValueHint::FilePath)]
        file: PathBuf,

        /// Output job directory
        #[arg(short, long, value_hint = clap::ValueHint::DirPath)]
        output: PathBuf,

        /// Output units
        #[arg(short, long)]
        units: Option<UnitFormat>,

        /// Decimal digits written for lengths
        #[arg(long)]
        precision: Option<usize>,

        /// Step name
        #[arg(long)]
        step: Option<String>,

        /// Archive the finished job directory
        #[arg(long)]
        compress: Option<ArchiveFormat>,

        /// TOML file with export settings; flags take precedence
        #[arg(long, value_hint = clap::ValueHint::FilePath)]
        config: Option<PathBuf>,
    },

    /// Show the planned layer matrix and board statistics
    Info {
        /// Board JSON file
        #[arg(value_hint = clap::ValueHint::FilePath)]
        file: PathBuf,

        /// Output format
        #[arg(short, long, default_value = "text")]
        format: OutputFormat,
    },
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Initialize color handling (respects NO_COLOR)
    utils::color::init_color();

    // Initialize logger with default level (overridden by RUST_LOG)
    let env = Env::default().default_filter_or("warn");
    env_logger::Builder::from_env(env).init();

    match cli.command {
        Commands::Export {
            file,
            output,
            units,
            precision,
            step,
            compress,
            config,
        } => commands::export::execute(&ExportArgs {
            file,
            output,
            units,
            precision,
            step,
            compress,
            config,
        }),

        Commands::Info { file, format } => commands::info::execute(&file, format),
    }
}
