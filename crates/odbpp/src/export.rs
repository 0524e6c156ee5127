use std::fs::{self, File};
use std::path::{Path, PathBuf};

use flate2::Compression as GzLevel;
use flate2::write::GzEncoder;
use serde::Serialize;
use zip::ZipWriter;
use zip::write::FileOptions;

use crate::board::Board;
use crate::entity::{EmptyEntity, Entity, FontsEntity, MatrixEntity, MiscEntity, StepEntity};
use crate::matrix::{LayerPlan, MatrixBuilder};
use crate::units::{Compression, ExportConfig};
use crate::writer::TreeWriter;
use crate::{OdbError, Result};

/// Counts reported after a successful export
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExportSummary {
    pub layer_count: usize,
    pub feature_count: usize,
    pub net_count: usize,
    pub package_count: usize,
    pub component_count: usize,
    /// Job directory, or the archive when compression was requested
    pub output_path: PathBuf,
}

/// Matrix rows and derived layer groups of `board`
pub fn plan_layers(board: &Board) -> LayerPlan<'_> {
    MatrixBuilder::new(board).build()
}

/// Write `board` as an ODB++ job directory at `path`.
///
/// The whole step is built in memory before anything is written. I/O
/// failures abort the export; problems with single items are logged and
/// the item is skipped.
pub fn export_board(board: &Board, config: &ExportConfig, path: &Path) -> Result<ExportSummary> {
    board.validate()?;

    log::debug!("building matrix");
    let plan = plan_layers(board);

    log::debug!("building step {}", config.step_name);
    let mut step = StepEntity::new(board, &plan, config);
    step.init()?;

    let summary = ExportSummary {
        layer_count: plan.matrix.len(),
        feature_count: step.feature_count(),
        net_count: step.eda().nets.len(),
        package_count: step.eda().packages.len(),
        component_count: step.component_count(),
        output_path: path.to_path_buf(),
    };

    log::debug!("writing {}", path.display());
    let tree = TreeWriter::new(path)?;
    let mut entities: Vec<Box<dyn Entity + '_>> = vec![
        Box::new(FontsEntity::new(config.formatter())),
        Box::new(EmptyEntity::input()),
        Box::new(MatrixEntity::new(&plan, &config.step_name)),
        Box::new(step),
        Box::new(MiscEntity::new(config)),
        Box::new(EmptyEntity::symbols()),
        Box::new(EmptyEntity::user()),
        Box::new(EmptyEntity::wheels()),
    ];
    for entity in &mut entities {
        tree.create_dir(entity.dir())?;
        entity.generate_files(&tree)?;
    }

    let output_path = match config.compression {
        Compression::None => path.to_path_buf(),
        Compression::Zip => archive_zip(path)?,
        Compression::Tgz => archive_tgz(path)?,
    };

    log::info!(
        "exported {} layers, {} features, {} nets, {} components to {}",
        summary.layer_count,
        summary.feature_count,
        summary.net_count,
        summary.component_count,
        output_path.display()
    );
    Ok(ExportSummary {
        output_path,
        ..summary
    })
}

fn archive_path(dir: &Path, ext: &str) -> PathBuf {
    let mut name = dir.as_os_str().to_os_string();
    name.push(".");
    name.push(ext);
    PathBuf::from(name)
}

/// Name of the job directory inside an archive
fn job_root(dir: &Path) -> String {
    dir.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "odb".to_string())
}

fn archive_zip(dir: &Path) -> Result<PathBuf> {
    let zip_path = archive_path(dir, "zip");
    let mut zip = ZipWriter::new(File::create(&zip_path)?);
    add_directory_to_zip(&mut zip, dir, dir, &job_root(dir))?;
    zip.finish()
        .map_err(|e| OdbError::Archive(format!("{}: {e}", zip_path.display())))?;
    fs::remove_dir_all(dir)?;
    Ok(zip_path)
}

fn add_directory_to_zip(
    zip: &mut ZipWriter<File>,
    dir: &Path,
    base: &Path,
    root: &str,
) -> Result<()> {
    let mut entries = fs::read_dir(dir)?
        .map(|e| e.map(|e| e.path()))
        .collect::<std::io::Result<Vec<_>>>()?;
    entries.sort();
    for path in entries {
        let rel = path
            .strip_prefix(base)
            .map_err(|e| OdbError::Archive(e.to_string()))?
            .to_string_lossy()
            .replace('\\', "/");
        if path.is_dir() {
            zip.add_directory(format!("{root}/{rel}/"), FileOptions::<()>::default())
                .map_err(|e| OdbError::Archive(e.to_string()))?;
            add_directory_to_zip(zip, &path, base, root)?;
        } else {
            zip.start_file(format!("{root}/{rel}"), FileOptions::<()>::default())
                .map_err(|e| OdbError::Archive(e.to_string()))?;
            std::io::copy(&mut File::open(&path)?, zip)?;
        }
    }
    Ok(())
}

fn archive_tgz(dir: &Path) -> Result<PathBuf> {
    let tgz_path = archive_path(dir, "tgz");
    let encoder = GzEncoder::new(File::create(&tgz_path)?, GzLevel::default());
    let mut builder = tar::Builder::new(encoder);
    builder.mode(tar::HeaderMode::Deterministic);
    builder.append_dir_all(job_root(dir), dir)?;
    builder.into_inner()?.finish()?;
    fs::remove_dir_all(dir)?;
    Ok(tgz_path)
}
