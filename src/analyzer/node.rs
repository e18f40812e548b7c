use std::collections::HashMap;
use std::path::Path;

use anyhow::Result;
use serde::Deserialize;

use crate::models::{Dependency, Ecosystem};

/// Parser for `package-lock.json` (lockfile v2/v3 with a legacy fallback).
///
/// The `packages` map keys every physically-deduplicated copy of a package
/// by its filesystem path, so the same logical package may appear both as
/// `node_modules/entities` and `node_modules/parse5/node_modules/entities`.
/// Canonicalization picks exactly one entry per basename before records are
/// emitted.
pub struct NodeAnalyzer;

#[derive(Debug, Deserialize)]
struct LockFile {
    #[serde(default)]
    packages: HashMap<String, PackageEntry>,
    /// Legacy nested tree from lockfile v1; only the top level is merged.
    #[serde(default)]
    dependencies: HashMap<String, LegacyEntry>,
}

#[derive(Debug, Default, Deserialize)]
struct PackageEntry {
    #[serde(default)]
    version: Option<String>,
    #[serde(default)]
    dev: bool,
    /// For the root entry (empty key) this is the project's declared
    /// dependency set, which defines directness.
    #[serde(default)]
    dependencies: HashMap<String, String>,
}

#[derive(Debug, Deserialize)]
struct LegacyEntry {
    #[serde(default)]
    version: Option<String>,
    #[serde(default)]
    dev: bool,
}

impl super::Analyzer for NodeAnalyzer {
    fn analyze(&self, path: &Path) -> Result<Vec<Dependency>> {
        let content = std::fs::read_to_string(path)?;
        let lockfile: LockFile = serde_json::from_str(&content)?;
        Ok(extract(&lockfile, path))
    }
}

/// The segment after the last `node_modules/` separator, i.e. the package
/// name a path key resolves to.
fn canonical_name(path_key: &str) -> &str {
    path_key
        .rsplit("node_modules/")
        .next()
        .unwrap_or(path_key)
}

fn extract(lockfile: &LockFile, origin: &Path) -> Vec<Dependency> {
    let direct: Vec<&String> = lockfile
        .packages
        .get("")
        .map(|root| root.dependencies.keys().collect())
        .unwrap_or_default();

    // Canonical selection: shortest path key wins (the root-hoisted copy is
    // what satisfies top-level resolution). Path keys are sorted first so
    // equal-length ties break lexicographically instead of by map order.
    let mut path_keys: Vec<&String> = lockfile.packages.keys().collect();
    path_keys.sort();

    let mut chosen: HashMap<&str, &String> = HashMap::new();
    for key in path_keys {
        let name = canonical_name(key);
        match chosen.get(name) {
            Some(current) if key.len() >= current.len() => {}
            _ => {
                chosen.insert(name, key);
            }
        }
    }

    // (name, version, dev) per canonical package.
    let mut merged: HashMap<&str, (Option<&String>, bool)> = chosen
        .into_iter()
        .map(|(name, key)| {
            let entry = &lockfile.packages[key];
            (name, (entry.version.as_ref(), entry.dev))
        })
        .collect();

    // Older lockfiles carry a flat `dependencies` tree; merge entries the
    // modern `packages` map did not already provide.
    for (name, entry) in &lockfile.dependencies {
        merged
            .entry(canonical_name(name))
            .or_insert((entry.version.as_ref(), entry.dev));
    }

    let mut names: Vec<&&str> = merged.keys().collect();
    names.sort();

    let mut deps = Vec::new();
    for name in names {
        // The root package keys itself under the empty string.
        if name.is_empty() {
            continue;
        }
        let (version, dev) = merged[*name];
        if dev {
            continue;
        }
        deps.push(Dependency {
            ecosystem: Ecosystem::Npm,
            name: name.to_string(),
            version: version.cloned().unwrap_or_default(),
            origin: origin.to_path_buf(),
            indirect: !direct.iter().any(|d| d.as_str() == *name),
            licenses: Vec::new(),
        });
    }
    deps
}
