#![allow(clippy::module_name_repetitions)]
//! Canonical file paths for the spatial datasets.
//!
//! Defaults live under the project root's `data/` directory and can be
//! overridden with `HYDRAX_DATA_DIR`, `HYDRAX_BUILDINGS_PATH` and
//! `HYDRAX_RAINFALL_PATH`.

use std::path::{Path, PathBuf};

/// File name of the building footprint dataset inside the data directory.
pub const BUILDINGS_FILE_NAME: &str = "buildings.geojson";

/// File name of the annual rainfall raster inside the data directory.
pub const RAINFALL_FILE_NAME: &str = "rainfall.tif";

/// Returns the workspace root directory.
///
/// Resolved at compile time from `CARGO_MANIFEST_DIR`.
#[must_use]
pub fn project_root() -> PathBuf {
    let manifest_dir = Path::new(env!("CARGO_MANIFEST_DIR"));
    manifest_dir
        .ancestors()
        .nth(2)
        .unwrap_or(manifest_dir)
        .to_path_buf()
}

/// Returns the `data/` directory, honoring `HYDRAX_DATA_DIR`.
#[must_use]
pub fn data_dir() -> PathBuf {
    std::env::var_os("HYDRAX_DATA_DIR")
        .map_or_else(|| project_root().join("data"), PathBuf::from)
}

/// Returns the building dataset path, honoring `HYDRAX_BUILDINGS_PATH`.
#[must_use]
pub fn buildings_path() -> PathBuf {
    std::env::var_os("HYDRAX_BUILDINGS_PATH")
        .map_or_else(|| data_dir().join(BUILDINGS_FILE_NAME), PathBuf::from)
}

/// Returns the rainfall raster path, honoring `HYDRAX_RAINFALL_PATH`.
#[must_use]
pub fn rainfall_path() -> PathBuf {
    std::env::var_os("HYDRAX_RAINFALL_PATH")
        .map_or_else(|| data_dir().join(RAINFALL_FILE_NAME), PathBuf::from)
}

/// Locations of both datasets, resolved once at startup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DatasetPaths {
    /// Building footprint dataset.
    pub buildings: PathBuf,
    /// Annual rainfall raster.
    pub rainfall: PathBuf,
}

impl DatasetPaths {
    /// Resolves both paths from the environment.
    #[must_use]
    pub fn from_env() -> Self {
        Self {
            buildings: buildings_path(),
            rainfall: rainfall_path(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn project_root_contains_workspace_manifest() {
        assert!(project_root().join("Cargo.toml").exists());
    }

    #[test]
    fn default_dataset_names() {
        let paths = DatasetPaths {
            buildings: data_dir().join(BUILDINGS_FILE_NAME),
            rainfall: data_dir().join(RAINFALL_FILE_NAME),
        };
        assert!(paths.buildings.ends_with("buildings.geojson"));
        assert!(paths.rainfall.ends_with("rainfall.tif"));
    }
}
