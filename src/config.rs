use std::path::Path;

use anyhow::Result;
use serde::Deserialize;

use crate::models::{Dependency, Ecosystem};

/// Override configuration, deserialized from `.depledger.toml`.
///
/// ```toml
/// [[rule]]
/// ecosystem = "npm"
/// name = "internal-tool"
/// action = "ignore"
///
/// [[rule]]
/// ecosystem = "maven"
/// name = "com.example:relicensed"
/// version = "1.2.3"
/// action = "override"
/// licenses = ["Apache-2.0"]
/// ```
#[derive(Debug, Default, Deserialize)]
pub struct Config {
    #[serde(default, rename = "rule")]
    pub rules: Vec<OverrideRule>,
}

#[derive(Debug, Deserialize)]
pub struct OverrideRule {
    pub ecosystem: Ecosystem,
    pub name: String,
    /// `*`, empty, or absent matches any version.
    #[serde(default)]
    pub version: Option<String>,
    pub action: OverrideAction,
    #[serde(default)]
    pub licenses: Vec<String>,
}

#[derive(Debug, Deserialize, Clone, Copy, PartialEq)]
#[serde(rename_all = "lowercase")]
pub enum OverrideAction {
    /// Drop the dependency from output entirely.
    Ignore,
    /// Replace the resolved license list with `licenses`.
    Override,
}

impl OverrideRule {
    fn matches(&self, dep: &Dependency) -> bool {
        if self.ecosystem != dep.ecosystem || self.name != dep.name {
            return false;
        }
        match self.version.as_deref() {
            None | Some("") | Some("*") => true,
            Some(version) => version == dep.version,
        }
    }
}

/// Load the override configuration, searching in order:
///
/// 1. `config_override` — path passed via `--config`
/// 2. `<root>/.depledger.toml`
/// 3. `~/.config/depledger/config.toml`
/// 4. Empty config (no rules)
pub fn load_config(root: &Path, config_override: Option<&Path>) -> Result<Config> {
    if let Some(path) = config_override {
        let content = std::fs::read_to_string(path)?;
        return Ok(toml::from_str(&content)?);
    }

    let project_config = root.join(".depledger.toml");
    if project_config.exists() {
        let content = std::fs::read_to_string(&project_config)?;
        return Ok(toml::from_str(&content)?);
    }

    if let Some(home) = dirs::home_dir() {
        let home_config = home.join(".config").join("depledger").join("config.toml");
        if home_config.exists() {
            let content = std::fs::read_to_string(&home_config)?;
            return Ok(toml::from_str(&content)?);
        }
    }

    Ok(Config::default())
}

/// Apply override rules after resolution and before aggregation.
pub fn apply_overrides(config: &Config, deps: Vec<Dependency>) -> Vec<Dependency> {
    deps.into_iter()
        .filter_map(|mut dep| {
            for rule in &config.rules {
                if !rule.matches(&dep) {
                    continue;
                }
                match rule.action {
                    OverrideAction::Ignore => return None,
                    OverrideAction::Override => dep.licenses = rule.licenses.clone(),
                }
            }
            Some(dep)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn dep(ecosystem: Ecosystem, name: &str, version: &str) -> Dependency {
        Dependency {
            ecosystem,
            name: name.to_string(),
            version: version.to_string(),
            origin: PathBuf::from("manifest"),
            indirect: false,
            licenses: vec!["~unknown".to_string()],
        }
    }

    #[test]
    fn test_ignore_rule_drops_dependency() {
        let config: Config = toml::from_str(
            r#"
[[rule]]
ecosystem = "npm"
name = "internal-tool"
action = "ignore"
"#,
        )
        .unwrap();

        let deps = vec![
            dep(Ecosystem::Npm, "internal-tool", "1.0.0"),
            dep(Ecosystem::Npm, "express", "4.18.2"),
        ];
        let kept = apply_overrides(&config, deps);
        assert_eq!(kept.len(), 1);
        assert_eq!(kept[0].name, "express");
    }

    #[test]
    fn test_override_replaces_licenses() {
        let config: Config = toml::from_str(
            r#"
[[rule]]
ecosystem = "maven"
name = "com.example:lib"
version = "1.2.3"
action = "override"
licenses = ["Apache-2.0"]
"#,
        )
        .unwrap();

        let deps = vec![
            dep(Ecosystem::Maven, "com.example:lib", "1.2.3"),
            dep(Ecosystem::Maven, "com.example:lib", "2.0.0"),
        ];
        let kept = apply_overrides(&config, deps);
        assert_eq!(kept[0].licenses, vec!["Apache-2.0"]);
        // Different version, untouched.
        assert_eq!(kept[1].licenses, vec!["~unknown"]);
    }

    #[test]
    fn test_wildcard_version_matches_any() {
        let config: Config = toml::from_str(
            r#"
[[rule]]
ecosystem = "cargo"
name = "leftover"
version = "*"
action = "ignore"
"#,
        )
        .unwrap();

        let deps = vec![
            dep(Ecosystem::Cargo, "leftover", "0.1.0"),
            dep(Ecosystem::Cargo, "leftover", "0.2.0"),
        ];
        assert!(apply_overrides(&config, deps).is_empty());
    }

    #[test]
    fn test_rule_is_ecosystem_scoped() {
        let config: Config = toml::from_str(
            r#"
[[rule]]
ecosystem = "npm"
name = "shared-name"
action = "ignore"
"#,
        )
        .unwrap();

        let deps = vec![dep(Ecosystem::Pypi, "shared-name", "1.0.0")];
        assert_eq!(apply_overrides(&config, deps).len(), 1);
    }
}
