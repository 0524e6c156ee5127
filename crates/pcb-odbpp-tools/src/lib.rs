use clap::ValueEnum;

pub mod commands;
pub mod utils;

// Re-export odbpp for external use
pub use odbpp;

#[derive(ValueEnum, Debug, Clone, Copy)]
pub enum OutputFormat {
    Text,
    Json,
}

#[derive(ValueEnum, Debug, Clone, Copy)]
pub enum UnitFormat {
    Mm,
    Inch,
}

impl From<UnitFormat> for odbpp::Units {
    fn from(units: UnitFormat) -> Self {
        match units {
            UnitFormat::Mm => odbpp::Units::Mm,
            UnitFormat::Inch => odbpp::Units::Inch,
        }
    }
}

#[derive(ValueEnum, Debug, Clone, Copy)]
pub enum ArchiveFormat {
    None,
    Zip,
    Tgz,
}

impl From<ArchiveFormat> for odbpp::Compression {
    fn from(format: ArchiveFormat) -> Self {
        match format {
            ArchiveFormat::None => odbpp::Compression::None,
            ArchiveFormat::Zip => odbpp::Compression::Zip,
            ArchiveFormat::Tgz => odbpp::Compression::Tgz,
        }
    }
}
