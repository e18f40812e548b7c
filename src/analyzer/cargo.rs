use std::collections::HashSet;
use std::path::Path;

use anyhow::Result;
use serde::Deserialize;

use crate::models::{Dependency, Ecosystem};

/// Parser for `Cargo.lock`.
///
/// The package without a `source` field is the workspace root; its
/// dependency list defines the direct set and the root itself is excluded
/// from output.
pub struct CargoAnalyzer;

#[derive(Debug, Deserialize)]
struct CargoLock {
    #[serde(default)]
    package: Vec<CargoPackage>,
}

#[derive(Debug, Deserialize)]
struct CargoPackage {
    name: String,
    version: String,
    source: Option<String>,
    #[serde(default)]
    dependencies: Vec<String>,
}

impl super::Analyzer for CargoAnalyzer {
    fn analyze(&self, path: &Path) -> Result<Vec<Dependency>> {
        let content = std::fs::read_to_string(path)?;
        let lockfile: CargoLock = toml::from_str(&content)?;
        Ok(extract(&lockfile, path))
    }
}

fn extract(lockfile: &CargoLock, origin: &Path) -> Vec<Dependency> {
    let root = lockfile.package.iter().find(|pkg| pkg.source.is_none());

    // Entries may carry a disambiguating version ("serde 1.0.150"); only the
    // name decides directness.
    let direct: HashSet<&str> = root
        .map(|pkg| {
            pkg.dependencies
                .iter()
                .filter_map(|dep| dep.split_whitespace().next())
                .collect()
        })
        .unwrap_or_default();

    lockfile
        .package
        .iter()
        .filter(|pkg| root.map_or(true, |r| pkg.name != r.name))
        .map(|pkg| Dependency {
            ecosystem: Ecosystem::Cargo,
            name: pkg.name.clone(),
            version: pkg.version.clone(),
            origin: origin.to_path_buf(),
            indirect: !direct.contains(pkg.name.as_str()),
            licenses: Vec::new(),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    const LOCKFILE: &str = r#"
version = 3

[[package]]
name = "my-app"
version = "0.1.0"
dependencies = [
 "serde",
 "tokio 1.25.0",
]

[[package]]
name = "serde"
version = "1.0.150"
source = "registry+https://github.com/rust-lang/crates.io-index"
checksum = "abc123"

[[package]]
name = "tokio"
version = "1.25.0"
source = "registry+https://github.com/rust-lang/crates.io-index"
checksum = "def456"
dependencies = [
 "mio",
]

[[package]]
name = "mio"
version = "0.8.6"
source = "registry+https://github.com/rust-lang/crates.io-index"
checksum = "123abc"
"#;

    fn parse(content: &str) -> Vec<Dependency> {
        let lockfile: CargoLock = toml::from_str(content).unwrap();
        extract(&lockfile, Path::new("Cargo.lock"))
    }

    #[test]
    fn test_root_package_is_excluded() {
        let deps = parse(LOCKFILE);
        assert_eq!(deps.len(), 3);
        assert!(deps.iter().all(|d| d.name != "my-app"));
    }

    #[test]
    fn test_directness_from_root_dependency_list() {
        let deps = parse(LOCKFILE);
        let serde_dep = deps.iter().find(|d| d.name == "serde").unwrap();
        let tokio_dep = deps.iter().find(|d| d.name == "tokio").unwrap();
        let mio_dep = deps.iter().find(|d| d.name == "mio").unwrap();
        assert!(!serde_dep.indirect);
        assert!(!tokio_dep.indirect, "versioned entry should still match");
        assert!(mio_dep.indirect);
    }

    #[test]
    fn test_lockfile_without_root_marks_all_indirect() {
        let content = r#"
[[package]]
name = "serde"
version = "1.0.150"
source = "registry+https://github.com/rust-lang/crates.io-index"
"#;
        let deps = parse(content);
        assert_eq!(deps.len(), 1);
        assert!(deps[0].indirect);
    }
}
