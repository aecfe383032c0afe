//! Ship class data loading for headless runs.
//!
//! Ship classes live in RON files, one class or a list of classes per file.
//! A copy of the bundled data is compiled in so the runner works from any
//! directory.

use std::fs;
use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::{info, warn};

use starliners_core::data::{parse_ship_classes, ShipClassData};
use starliners_core::error::GameError;
use starliners_core::ship::ShipClassRegistry;

/// Bundled ship classes, keyed by file name.
pub const BUILTIN_SHIP_DATA: [(&str, &str); 3] = [
    ("escorts.ron", include_str!("../../../data/ships/escorts.ron")),
    ("line.ron", include_str!("../../../data/ships/line.ron")),
    ("tender.ron", include_str!("../../../data/ships/tender.ron")),
];

/// Environment variable overriding the ship data directory.
pub const SHIP_DATA_ENV: &str = "STARLINERS_SHIP_DATA_DIR";

/// Errors that can occur while loading ship data.
#[derive(Error, Debug)]
pub enum DataLoadError {
    /// Failed to read a file or directory.
    #[error("IO error reading '{path}': {source}")]
    Io {
        /// Offending path.
        path: String,
        /// Underlying error.
        #[source]
        source: std::io::Error,
    },
    /// Directory not found.
    #[error("Directory not found: {0}")]
    DirectoryNotFound(String),
    /// A file did not parse or a class failed validation.
    #[error(transparent)]
    Invalid(#[from] GameError),
    /// No class definitions were found.
    #[error("No ship classes found in {0}")]
    Empty(String),
}

/// Resolve the ship data directory.
///
/// Checks, in order:
/// 1. Environment variable `STARLINERS_SHIP_DATA_DIR`
/// 2. `./data/ships/` (repo root)
/// 3. `../../data/ships/` (running from a crate directory)
pub fn default_ship_data_dir() -> Option<PathBuf> {
    if let Ok(dir) = std::env::var(SHIP_DATA_ENV) {
        let path = PathBuf::from(dir);
        if path.exists() {
            return Some(path);
        }
    }

    ["data/ships", "../../data/ships"]
        .iter()
        .map(PathBuf::from)
        .find(|path| path.exists())
}

/// Parse every `.ron` file of a directory, in file name order.
pub fn load_class_data<P: AsRef<Path>>(dir: P) -> Result<Vec<ShipClassData>, DataLoadError> {
    let dir = dir.as_ref();
    if !dir.exists() {
        return Err(DataLoadError::DirectoryNotFound(dir.display().to_string()));
    }
    let io_error = |source| DataLoadError::Io {
        path: dir.display().to_string(),
        source,
    };

    let mut files: Vec<PathBuf> = fs::read_dir(dir)
        .map_err(io_error)?
        .map(|entry| entry.map(|e| e.path()).map_err(io_error))
        .collect::<Result<_, _>>()?;
    files.retain(|path| path.extension().is_some_and(|ext| ext == "ron"));
    files.sort();

    let mut classes = Vec::new();
    for path in files {
        let source = fs::read_to_string(&path).map_err(|source| DataLoadError::Io {
            path: path.display().to_string(),
            source,
        })?;
        classes.extend(parse_ship_classes(&source, &path.display().to_string())?);
    }
    Ok(classes)
}

/// Build a registry from a directory of ship data.
pub fn load_ship_classes_from_path<P: AsRef<Path>>(
    dir: P,
) -> Result<ShipClassRegistry, DataLoadError> {
    let dir = dir.as_ref();
    let data = load_class_data(dir)?;
    if data.is_empty() {
        return Err(DataLoadError::Empty(dir.display().to_string()));
    }
    for class in &data {
        class.validate()?;
    }
    let registry = ShipClassRegistry::from_data(&data)?;
    info!(path = %dir.display(), classes = registry.len(), "Ship data loaded");
    Ok(registry)
}

/// Build a registry from the compiled-in ship data.
pub fn builtin_ship_classes() -> Result<ShipClassRegistry, DataLoadError> {
    let mut data = Vec::new();
    for (name, source) in BUILTIN_SHIP_DATA {
        data.extend(parse_ship_classes(source, name)?);
    }
    Ok(ShipClassRegistry::from_data(&data)?)
}

/// Load ship classes from `dir`, or the default directory, or the bundled copy.
pub fn resolve_ship_classes(dir: Option<&Path>) -> Result<ShipClassRegistry, DataLoadError> {
    if let Some(dir) = dir {
        return load_ship_classes_from_path(dir);
    }
    match default_ship_data_dir() {
        Some(dir) => load_ship_classes_from_path(dir),
        None => {
            warn!("No ship data directory found, using bundled classes");
            builtin_ship_classes()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use starliners_test_utils::SAMPLE_CLASSES;

    #[test]
    fn test_builtin_classes_parse() {
        let registry = builtin_ship_classes().unwrap();
        for id in ["interceptor", "skirmisher", "lancer", "bastion", "dominion", "tender"] {
            assert!(registry.get(id).is_some(), "missing {id}");
        }
    }

    #[test]
    fn test_load_directory() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("fleet.ron"), SAMPLE_CLASSES).unwrap();
        fs::write(dir.path().join("notes.txt"), "ignored").unwrap();

        let registry = load_ship_classes_from_path(dir.path()).unwrap();
        assert_eq!(registry.len(), 6);
    }

    #[test]
    fn test_parse_error_names_file() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("broken.ron"), "ShipClassData(id: ").unwrap();

        let err = load_ship_classes_from_path(dir.path()).unwrap_err();
        assert!(matches!(
            err,
            DataLoadError::Invalid(GameError::DataParseError { .. })
        ));
        assert!(err.to_string().contains("broken.ron"));
    }

    #[test]
    fn test_empty_directory() {
        let dir = tempfile::tempdir().unwrap();
        assert!(matches!(
            load_ship_classes_from_path(dir.path()),
            Err(DataLoadError::Empty(_))
        ));
    }

    #[test]
    fn test_missing_directory() {
        assert!(matches!(
            load_ship_classes_from_path("/nonexistent/ships"),
            Err(DataLoadError::DirectoryNotFound(_))
        ));
    }
}
