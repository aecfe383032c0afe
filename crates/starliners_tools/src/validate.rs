//! Ship class data validation.
//!
//! Walks a directory of `.ron` files, parses every class definition and
//! checks it the same way the game does when it loads ship data. Unlike
//! the loader it keeps going after the first problem so one pass reports
//! everything that is wrong.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::{debug, warn};

use starliners_core::data::{parse_ship_classes, ShipClassData};
use starliners_core::error::GameError;

/// A problem that makes the data unusable.
#[derive(Error, Debug)]
pub enum ValidationError {
    /// The directory does not exist or is not a directory.
    #[error("Not a data directory: {0}")]
    NotADirectory(String),
    /// A file or directory could not be read.
    #[error("IO error reading '{path}': {source}")]
    Io {
        /// Offending path.
        path: String,
        /// Underlying error.
        #[source]
        source: std::io::Error,
    },
    /// A file did not parse, or a class failed its checks.
    #[error(transparent)]
    Invalid(#[from] GameError),
    /// Two definitions share an id.
    #[error("Duplicate ship class '{id}' in {first} and {second}")]
    DuplicateId {
        /// Class id.
        id: String,
        /// File of the first definition.
        first: String,
        /// File of the second definition.
        second: String,
    },
}

/// Outcome of validating a data directory.
#[derive(Debug, Default)]
pub struct ValidationReport {
    /// `.ron` files inspected.
    pub files: usize,
    /// Class definitions parsed.
    pub classes: usize,
    /// Problems that would stop the game from loading the data.
    pub errors: Vec<ValidationError>,
    /// Suspicious but loadable definitions.
    pub warnings: Vec<String>,
}

impl ValidationReport {
    /// Check if no errors were found.
    #[must_use]
    pub fn is_ok(&self) -> bool {
        self.errors.is_empty()
    }
}

fn ron_files(dir: &Path) -> Result<Vec<PathBuf>, ValidationError> {
    let io_error = |source| ValidationError::Io {
        path: dir.display().to_string(),
        source,
    };
    let mut files = Vec::new();
    for entry in fs::read_dir(dir).map_err(io_error)? {
        let path = entry.map_err(io_error)?.path();
        if path.is_dir() {
            files.extend(ron_files(&path)?);
        } else if path.extension().is_some_and(|ext| ext == "ron") {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}

fn lint(class: &ShipClassData, file: &str, warnings: &mut Vec<String>) {
    let support: u32 = class.support.shield + class.support.armour + class.support.hull;
    if !class.is_combatant() && support == 0 {
        warnings.push(format!("{file}: '{}' has neither firepower nor support", class.id));
    }
    if class.is_combatant() && class.tracking == 0 {
        warnings.push(format!("{file}: '{}' has firepower but zero tracking", class.id));
    }
}

/// Validate every ship class definition under `dir`.
pub fn validate_ship_data(dir: &Path) -> ValidationReport {
    let mut report = ValidationReport::default();
    if !dir.is_dir() {
        report
            .errors
            .push(ValidationError::NotADirectory(dir.display().to_string()));
        return report;
    }

    let files = match ron_files(dir) {
        Ok(files) => files,
        Err(e) => {
            report.errors.push(e);
            return report;
        }
    };

    let mut seen: BTreeMap<String, String> = BTreeMap::new();
    for path in files {
        report.files += 1;
        let file = path.display().to_string();
        let source = match fs::read_to_string(&path) {
            Ok(source) => source,
            Err(source) => {
                report.errors.push(ValidationError::Io { path: file, source });
                continue;
            }
        };
        let classes = match parse_ship_classes(&source, &file) {
            Ok(classes) => classes,
            Err(e) => {
                warn!(%file, error = %e, "Parse failed");
                report.errors.push(e.into());
                continue;
            }
        };
        debug!(%file, classes = classes.len(), "Parsed");

        for class in classes {
            report.classes += 1;
            if let Err(e) = class.validate() {
                report.errors.push(e.into());
                continue;
            }
            if let Some(first) = seen.get(&class.id) {
                report.errors.push(ValidationError::DuplicateId {
                    id: class.id.clone(),
                    first: first.clone(),
                    second: file.clone(),
                });
                continue;
            }
            lint(&class, &file, &mut report.warnings);
            seen.insert(class.id, file.clone());
        }
    }
    report
}
