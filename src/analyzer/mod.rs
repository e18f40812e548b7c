use std::collections::HashSet;
use std::path::Path;

use anyhow::Result;

use crate::detector;
use crate::error::DepledgerError;
use crate::models::{Dependency, Ecosystem};

pub mod cargo;
pub mod gomod;
pub mod maven;
pub mod node;
pub mod pom;
pub mod python;

pub trait Analyzer {
    fn analyze(&self, path: &Path) -> Result<Vec<Dependency>>;
}

/// Parse one manifest file, dispatching on its basename.
///
/// Parser errors are classified as [`DepledgerError::MalformedManifest`];
/// callers skip the file and continue. Output is deduplicated by identity
/// triple so one file never yields two records for the same dependency.
pub fn parse_manifest(path: &Path) -> Result<Vec<Dependency>, DepledgerError> {
    let ecosystem = detector::ecosystem_for(path)?;

    let parsed = match ecosystem {
        Ecosystem::Go => gomod::GoModAnalyzer.analyze(path),
        Ecosystem::Npm => node::NodeAnalyzer.analyze(path),
        Ecosystem::Maven => maven::MavenAnalyzer.analyze(path),
        Ecosystem::Cargo => cargo::CargoAnalyzer.analyze(path),
        Ecosystem::Pypi => python::PythonAnalyzer.analyze(path),
    };

    let deps = parsed.map_err(|err| DepledgerError::MalformedManifest {
        path: path.to_path_buf(),
        reason: format!("{err:#}"),
    })?;

    Ok(dedup_by_identity(deps))
}

/// Keep the first record for each `(ecosystem, name, version)` triple,
/// preserving declaration order.
pub fn dedup_by_identity(deps: Vec<Dependency>) -> Vec<Dependency> {
    let mut seen: HashSet<String> = HashSet::new();
    deps.into_iter()
        .filter(|dep| seen.insert(dep.key()))
        .collect()
}
