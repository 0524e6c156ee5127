use std::path::PathBuf;

use anyhow::{Context, Result};
use colored::Colorize;
use odbpp::{ExportConfig, export_board};

use crate::utils::file as file_utils;
use crate::{ArchiveFormat, UnitFormat};

pub struct ExportArgs {
    pub file: PathBuf,
    pub output: PathBuf,
    pub units: Option<UnitFormat>,
    pub precision: Option<usize>,
    pub step: Option<String>,
    pub compress: Option<ArchiveFormat>,
    pub config: Option<PathBuf>,
}

impl ExportArgs {
    /// Settings from the config file (or defaults) with the flags applied on top
    pub fn export_config(&self) -> Result<ExportConfig> {
        let mut config = match &self.config {
            Some(path) => file_utils::load_config(path)?,
            None => ExportConfig::default(),
        };
        if let Some(units) = self.units {
            config.units = units.into();
        }
        if let Some(precision) = self.precision {
            config.sig_digits = Some(precision);
        }
        if let Some(step) = &self.step {
            config.step_name = step.clone();
        }
        if let Some(compress) = self.compress {
            config.compression = compress.into();
        }
        Ok(config)
    }
}

pub fn execute(args: &ExportArgs) -> Result<()> {
    let board = file_utils::load_board(&args.file)?;
    let config = args.export_config()?;
    log::debug!("export config: {config:?}");

    let summary = export_board(&board, &config, &args.output)
        .with_context(|| format!("Failed to export {:?}", args.file))?;

    eprintln!(
        "{} {} ({} layers, {} features, {} nets, {} components)",
        "✓ Exported".green().bold(),
        summary.output_path.display(),
        summary.layer_count,
        summary.feature_count,
        summary.net_count,
        summary.component_count,
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use odbpp::{Compression, Units};

    fn args() -> ExportArgs {
        ExportArgs {
            file: "board.json".into(),
            output: "out".into(),
            units: None,
            precision: None,
            step: None,
            compress: None,
            config: None,
        }
    }

    #[test]
    fn defaults_without_flags() {
        assert_eq!(args().export_config().unwrap(), ExportConfig::default());
    }

    #[test]
    fn flags_override_config_file() {
        let temp = assert_fs::TempDir::new().unwrap();
        let path = temp.path().join("odb.toml");
        std::fs::write(&path, "units = \"inch\"\nstep_name = \"main\"\ncompression = \"zip\"\n")
            .unwrap();

        let mut args = args();
        args.config = Some(path);
        args.step = Some("panel".into());
        let config = args.export_config().unwrap();
        assert_eq!(config.units, Units::Inch);
        assert_eq!(config.step_name, "panel");
        assert_eq!(config.compression, Compression::Zip);
    }
}
