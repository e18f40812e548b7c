use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Sentinel used when the registry has no license data for a version.
pub const UNKNOWN_LICENSE: &str = "~unknown";

/// Sentinel used when the registry reports a license it could not map to an
/// SPDX identifier. The `~` prefix keeps it out of the SPDX link synthesis.
pub const NON_STANDARD_LICENSE: &str = "~non-standard";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Ecosystem {
    Go,
    Npm,
    Maven,
    Cargo,
    Pypi,
}

impl std::fmt::Display for Ecosystem {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Ecosystem::Go => write!(f, "go"),
            Ecosystem::Npm => write!(f, "npm"),
            Ecosystem::Maven => write!(f, "maven"),
            Ecosystem::Cargo => write!(f, "cargo"),
            Ecosystem::Pypi => write!(f, "pypi"),
        }
    }
}

/// A single dependency declaration extracted from a manifest file.
///
/// Two records describe the same dependency iff `(ecosystem, name, version)`
/// are equal; that triple is both the cache key and the dedup key. Parsers
/// leave `licenses` empty — only the resolver populates it.
#[derive(Debug, Clone)]
pub struct Dependency {
    pub ecosystem: Ecosystem,
    /// Ecosystem-scoped identifier; `group:artifact` for Maven.
    pub name: String,
    pub version: String,
    /// Path of the manifest file that declared this dependency.
    pub origin: PathBuf,
    /// True when only reachable transitively.
    pub indirect: bool,
    pub licenses: Vec<String>,
}

impl Dependency {
    pub fn key(&self) -> String {
        dep_key(self.ecosystem, &self.name, &self.version)
    }
}

/// Identity key shared by the dedup step and the license cache.
pub fn dep_key(ecosystem: Ecosystem, name: &str, version: &str) -> String {
    format!("{}|{}|{}", ecosystem, name, version)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dep_key_format() {
        assert_eq!(
            dep_key(Ecosystem::Maven, "org.postgresql:postgresql", "42.3.8"),
            "maven|org.postgresql:postgresql|42.3.8"
        );
    }

    #[test]
    fn test_ecosystem_serde_tags() {
        assert_eq!(serde_json::to_string(&Ecosystem::Go).unwrap(), "\"go\"");
        assert_eq!(
            serde_json::from_str::<Ecosystem>("\"pypi\"").unwrap(),
            Ecosystem::Pypi
        );
    }
}
