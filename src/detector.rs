use std::fs;
use std::path::{Path, PathBuf};

use crate::error::DepledgerError;
use crate::models::Ecosystem;

/// Map a manifest file to its ecosystem by basename (case-insensitive).
pub fn ecosystem_for(path: &Path) -> Result<Ecosystem, DepledgerError> {
    let basename = path
        .file_name()
        .map(|n| n.to_string_lossy().to_lowercase())
        .unwrap_or_default();

    match basename.as_str() {
        "go.mod" => Ok(Ecosystem::Go),
        "package-lock.json" => Ok(Ecosystem::Npm),
        "pom.xml" => Ok(Ecosystem::Maven),
        "cargo.lock" => Ok(Ecosystem::Cargo),
        "requirements.txt" => Ok(Ecosystem::Pypi),
        _ => Err(DepledgerError::UnsupportedManifest {
            path: path.to_path_buf(),
        }),
    }
}

/// Bring explicitly supplied manifest paths onto the same canonical form as
/// the scan root, so their report origins relativize cleanly. A path that
/// cannot be canonicalized (it does not exist, say) is kept as given and
/// surfaces as a read error later.
pub fn canonicalize_manifests(paths: &[PathBuf]) -> Vec<PathBuf> {
    paths
        .iter()
        .map(|path| path.canonicalize().unwrap_or_else(|_| path.clone()))
        .collect()
}

/// Collect manifest files under `root`, sorted for a reproducible processing
/// order. Hidden entries and `node_modules` trees are skipped; subdirectories
/// are only entered with `recurse`. An empty `types` slice matches all
/// ecosystems.
pub fn find_manifests(root: &Path, recurse: bool, types: &[Ecosystem]) -> Vec<PathBuf> {
    let mut found = Vec::new();
    walk(root, recurse, types, &mut found);
    found.sort();
    found
}

fn walk(dir: &Path, recurse: bool, types: &[Ecosystem], found: &mut Vec<PathBuf>) {
    let entries = match fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(err) => {
            log::warn!("could not read directory {}: {}", dir.display(), err);
            return;
        }
    };

    for entry in entries.flatten() {
        let name = entry.file_name().to_string_lossy().into_owned();
        if name.starts_with('.') {
            continue;
        }

        let path = entry.path();
        if path.is_dir() {
            if name == "node_modules" {
                continue;
            }
            if recurse {
                walk(&path, recurse, types, found);
            }
            continue;
        }

        if let Ok(ecosystem) = ecosystem_for(&path) {
            if types.is_empty() || types.contains(&ecosystem) {
                found.push(path);
            }
        }
    }
}
