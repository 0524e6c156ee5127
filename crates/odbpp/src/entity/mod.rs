//! Top-level entities of a job directory.
//!
//! Each entity owns one directory below the job root. Export creates the
//! directory first and then lets the entity write its files.

mod layer;
mod misc;
mod step;

pub use layer::LayerEntity;
pub use misc::MiscEntity;
pub use step::StepEntity;

use std::io::Write;

use crate::Result;
use crate::matrix::LayerPlan;
use crate::units::Formatter;
use crate::writer::{TextWriter, TreeWriter};

pub trait Entity {
    /// Directory of the entity, relative to the job root
    fn dir(&self) -> &str;

    fn generate_files(&mut self, tree: &TreeWriter) -> Result<()>;
}

/// `fonts/standard`
pub struct FontsEntity {
    fmt: Formatter,
}

impl FontsEntity {
    pub fn new(fmt: Formatter) -> Self {
        Self { fmt }
    }
}

impl Entity for FontsEntity {
    fn dir(&self) -> &str {
        "fonts"
    }

    fn generate_files(&mut self, tree: &TreeWriter) -> Result<()> {
        let fmt = self.fmt;
        tree.write_file("fonts/standard", |out| {
            writeln!(out, "XSIZE {}", fmt.number(0.302))?;
            writeln!(out, "YSIZE {}", fmt.number(0.302))?;
            writeln!(out, "OFFSET {}", fmt.number(0.0))
        })
    }
}

/// Entity that only contributes an empty directory
pub struct EmptyEntity {
    dir: &'static str,
}

impl EmptyEntity {
    pub fn input() -> Self {
        Self { dir: "input" }
    }

    pub fn symbols() -> Self {
        Self { dir: "symbols" }
    }

    pub fn user() -> Self {
        Self { dir: "user" }
    }

    pub fn wheels() -> Self {
        Self { dir: "wheels" }
    }
}

impl Entity for EmptyEntity {
    fn dir(&self) -> &str {
        self.dir
    }

    fn generate_files(&mut self, _tree: &TreeWriter) -> Result<()> {
        Ok(())
    }
}

/// `matrix/matrix`
pub struct MatrixEntity<'p, 'a> {
    plan: &'p LayerPlan<'a>,
    step_name: String,
}

impl<'p, 'a> MatrixEntity<'p, 'a> {
    pub fn new(plan: &'p LayerPlan<'a>, step_name: &str) -> Self {
        Self {
            plan,
            step_name: step_name.to_string(),
        }
    }
}

impl Entity for MatrixEntity<'_, '_> {
    fn dir(&self) -> &str {
        "matrix"
    }

    fn generate_files(&mut self, tree: &TreeWriter) -> Result<()> {
        tree.write_file("matrix/matrix", |out| {
            self.plan.write_matrix(out, &self.step_name)
        })
    }
}

/// Equation-only file shared by `stephdr` and `misc/info`
pub(crate) fn write_equations(out: &mut dyn Write, pairs: &[(&str, String)]) -> std::io::Result<()> {
    let mut tw = TextWriter::new(out);
    for (key, value) in pairs {
        tw.equation(key, value)?;
    }
    Ok(())
}
