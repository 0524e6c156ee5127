use jiff::Zoned;

use super::{Entity, write_equations};
use crate::Result;
use crate::names::odb_string;
use crate::units::ExportConfig;
use crate::writer::TreeWriter;

pub const ODB_VERSION_MAJOR: u32 = 8;
pub const ODB_VERSION_MINOR: u32 = 1;

/// `misc/info`: job identification and timestamps
pub struct MiscEntity {
    units: &'static str,
    source: String,
    job_name: String,
    user: String,
    timestamp: String,
}

impl MiscEntity {
    pub fn new(config: &ExportConfig) -> Self {
        Self::at(config, &Zoned::now())
    }

    /// Entity stamped with a fixed creation time
    pub fn at(config: &ExportConfig, now: &Zoned) -> Self {
        Self {
            units: config.units.as_str(),
            source: config.source.clone(),
            job_name: config.job_name.clone(),
            user: std::env::var("USER")
                .or_else(|_| std::env::var("USERNAME"))
                .unwrap_or_default(),
            timestamp: now.strftime("%Y%m%d.%H%M%S").to_string(),
        }
    }
}

impl Entity for MiscEntity {
    fn dir(&self) -> &str {
        "misc"
    }

    fn generate_files(&mut self, tree: &TreeWriter) -> Result<()> {
        let pairs = [
            ("UNITS", self.units.to_string()),
            ("ODB_VERSION_MAJOR", ODB_VERSION_MAJOR.to_string()),
            ("ODB_VERSION_MINOR", ODB_VERSION_MINOR.to_string()),
            ("ODB_SOURCE", odb_string(&self.source)),
            ("CREATION_DATE", self.timestamp.clone()),
            ("SAVE_DATE", self.timestamp.clone()),
            ("SAVE_APP", odb_string(&self.source)),
            ("SAVE_USER", odb_string(&self.user)),
            ("JOB_NAME", odb_string(&self.job_name)),
        ];
        tree.write_file("misc/info", |out| write_equations(out, &pairs))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_fs::TempDir;

    #[test]
    fn info_lists_version_and_dates() {
        let temp = TempDir::new().unwrap();
        let tree = TreeWriter::new(temp.path()).unwrap();
        let now: Zoned = "2024-03-05T07:08:09[UTC]".parse().unwrap();
        let mut misc = MiscEntity::at(&ExportConfig::default(), &now);
        misc.generate_files(&tree).unwrap();

        let info = std::fs::read_to_string(temp.path().join("misc/info")).unwrap();
        assert!(info.starts_with("UNITS=MM\nODB_VERSION_MAJOR=8\nODB_VERSION_MINOR=1\n"));
        assert!(info.contains("ODB_SOURCE=PCB-ODBPP\n"));
        assert!(info.contains("CREATION_DATE=20240305.070809\n"));
        assert!(info.contains("JOB_NAME=JOB\n"));
    }
}
