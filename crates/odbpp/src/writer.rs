//! Directory tree and structured text writers.

use std::fmt::Display;
use std::fs::{self, File};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

use crate::{OdbError, Result};

/// Writes files below a root directory, creating parents first
#[derive(Debug, Clone)]
pub struct TreeWriter {
    root: PathBuf,
}

impl TreeWriter {
    pub fn new(root: impl Into<PathBuf>) -> Result<Self> {
        let writer = Self { root: root.into() };
        writer.create_dir("")?;
        Ok(writer)
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Create `rel` (and its parents) below the root
    pub fn create_dir(&self, rel: impl AsRef<Path>) -> Result<PathBuf> {
        let path = self.root.join(rel);
        fs::create_dir_all(&path).map_err(|source| OdbError::CreateDir {
            path: path.clone(),
            source,
        })?;
        Ok(path)
    }

    /// Open `rel` for writing; the parent directory is created if needed
    pub fn create_file(&self, rel: impl AsRef<Path>) -> Result<FileProxy> {
        let path = self.root.join(rel);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|source| OdbError::CreateDir {
                path: parent.to_path_buf(),
                source,
            })?;
        }
        let file = File::create(&path).map_err(|source| OdbError::WriteFile {
            path: path.clone(),
            source,
        })?;
        Ok(FileProxy {
            path,
            out: BufWriter::new(file),
        })
    }

    /// Create `rel` and fill it through `f`
    pub fn write_file<F>(&self, rel: impl AsRef<Path>, f: F) -> Result<()>
    where
        F: FnOnce(&mut dyn Write) -> io::Result<()>,
    {
        let mut file = self.create_file(rel)?;
        if let Err(source) = f(&mut file) {
            return Err(OdbError::WriteFile {
                path: file.path,
                source,
            });
        }
        file.finish()
    }
}

/// Open output file; dropped without `finish` it is still flushed, but
/// errors are lost
#[derive(Debug)]
pub struct FileProxy {
    path: PathBuf,
    out: BufWriter<File>,
}

impl FileProxy {
    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn finish(mut self) -> Result<()> {
        self.out.flush().map_err(|source| OdbError::WriteFile {
            path: self.path.clone(),
            source,
        })
    }
}

impl Write for FileProxy {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.out.write(buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.out.flush()
    }
}

/// `KEY=VALUE` lines and `NAME {` ... `}` array scopes
pub struct TextWriter<'a> {
    out: &'a mut dyn Write,
    indent: usize,
}

impl<'a> TextWriter<'a> {
    pub fn new(out: &'a mut dyn Write) -> Self {
        Self { out, indent: 0 }
    }

    pub fn equation(&mut self, key: &str, value: impl Display) -> io::Result<()> {
        writeln!(self.out, "{:w$}{key}={value}", "", w = self.indent)
    }

    pub fn line(&mut self, text: &str) -> io::Result<()> {
        writeln!(self.out, "{:w$}{text}", "", w = self.indent)
    }

    /// Write one array scope; `f` fills its body
    pub fn array<F>(&mut self, name: &str, f: F) -> io::Result<()>
    where
        F: FnOnce(&mut TextWriter<'_>) -> io::Result<()>,
    {
        writeln!(self.out, "{:w$}{name} {{", "", w = self.indent)?;
        self.indent += 4;
        let body = f(self);
        self.indent -= 4;
        body?;
        writeln!(self.out, "{:w$}}}\n", "", w = self.indent)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_fs::TempDir;

    #[test]
    fn arrays_are_indented() {
        let mut buf = Vec::new();
        let mut tw = TextWriter::new(&mut buf);
        tw.equation("UNITS", "MM").unwrap();
        tw.array("STEP", |tw| {
            tw.equation("COL", 1)?;
            tw.equation("NAME", "PCB")
        })
        .unwrap();
        assert_eq!(
            String::from_utf8(buf).unwrap(),
            "UNITS=MM\nSTEP {\n    COL=1\n    NAME=PCB\n}\n\n"
        );
    }

    #[test]
    fn files_get_their_parent_directories() {
        let temp = TempDir::new().unwrap();
        let tree = TreeWriter::new(temp.path().join("odb")).unwrap();
        tree.write_file("steps/pcb/layers/f.cu/features", |out| {
            writeln!(out, "UNITS=MM")
        })
        .unwrap();
        let written =
            fs::read_to_string(temp.path().join("odb/steps/pcb/layers/f.cu/features")).unwrap();
        assert_eq!(written, "UNITS=MM\n");
    }

    #[test]
    fn blocked_directory_is_fatal() {
        let temp = TempDir::new().unwrap();
        let blocker = temp.path().join("blocker");
        fs::write(&blocker, "").unwrap();
        let tree = TreeWriter { root: blocker };
        let err = tree.create_dir("sub").unwrap_err();
        assert!(matches!(err, OdbError::CreateDir { .. }));
    }
}
