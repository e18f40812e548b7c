use std::collections::HashMap;

use anyhow::Result;
use regex::Regex;
use serde::Deserialize;

/// Minimal POM document model, covering the elements dependency extraction
/// needs: coordinates, `<properties>`, `<dependencyManagement>` and the
/// dependency list itself.
#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct PomXml {
    pub parent: PomParent,
    pub group_id: String,
    pub artifact_id: String,
    pub version: String,
    pub properties: HashMap<String, String>,
    pub dependency_management: DependencyManagement,
    pub dependencies: Dependencies,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct PomParent {
    pub group_id: String,
    pub artifact_id: String,
    pub version: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct DependencyManagement {
    pub dependencies: Dependencies,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct Dependencies {
    pub dependency: Vec<PomDependency>,
}

#[derive(Debug, Default, Clone, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct PomDependency {
    pub group_id: String,
    pub artifact_id: String,
    pub version: String,
    pub scope: String,
    pub optional: bool,
    pub exclusions: Exclusions,
}

#[derive(Debug, Default, Clone, Deserialize)]
#[serde(default)]
pub struct Exclusions {
    pub exclusion: Vec<Exclusion>,
}

#[derive(Debug, Default, Clone, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Exclusion {
    pub group_id: String,
    pub artifact_id: String,
}

impl PomXml {
    /// The property table used for `${...}` evaluation: the POM's own
    /// `<properties>` plus the implicit project properties. Each project
    /// field is registered under its `project.`-prefixed key and under the
    /// deprecated unprefixed alias (`${project.version}` and `${version}`).
    pub fn property_table(&self) -> HashMap<String, String> {
        let group_id = if self.group_id.is_empty() {
            &self.parent.group_id
        } else {
            &self.group_id
        };
        let version = if self.version.is_empty() {
            &self.parent.version
        } else {
            &self.version
        };

        let mut table = self.properties.clone();

        let fields = [
            ("groupId", group_id.clone()),
            ("artifactId", self.artifact_id.clone()),
            ("version", version.clone()),
            ("parent.groupId", self.parent.group_id.clone()),
            ("parent.artifactId", self.parent.artifact_id.clone()),
            ("parent.version", self.parent.version.clone()),
        ];
        for (key, value) in fields {
            table.insert(format!("project.{key}"), value.clone());
            // An explicit <properties> entry outranks the implicit alias.
            table.entry(key.to_string()).or_insert(value);
        }

        // <properties> entries are reachable through the project namespace
        // as well, unless that would shadow a real project field.
        for (key, value) in &self.properties {
            if key.starts_with("project.") {
                continue;
            }
            table
                .entry(format!("project.{key}"))
                .or_insert_with(|| value.clone());
        }
        table
    }
}

impl PomDependency {
    /// Dependency-management match key.
    pub fn name(&self) -> String {
        format!("{}:{}", self.group_id, self.artifact_id)
    }

    /// Evaluate variables in the dependency's coordinates and inherit fields
    /// from dependency management.
    ///
    /// Precedence: a match in the *root* POM's management overrides
    /// version/scope/optional/exclusions unconditionally; otherwise a match
    /// in the current POM's management only fills fields left unset here.
    pub fn resolve(
        &self,
        props: &PropertyResolver,
        dep_management: &[PomDependency],
        root_dep_management: &[PomDependency],
    ) -> PomDependency {
        let mut dep = PomDependency {
            group_id: props.evaluate(&self.group_id),
            artifact_id: props.evaluate(&self.artifact_id),
            version: props.evaluate(&self.version),
            scope: props.evaluate(&self.scope),
            optional: self.optional,
            exclusions: self.exclusions.clone(),
        };

        if let Some(managed) = find_managed(&self.name(), root_dep_management) {
            if !managed.version.is_empty() {
                dep.version = props.evaluate(&managed.version);
            }
            if !managed.scope.is_empty() {
                dep.scope = props.evaluate(&managed.scope);
            }
            if managed.optional {
                dep.optional = true;
            }
            if !managed.exclusions.exclusion.is_empty() {
                dep.exclusions = managed.exclusions.clone();
            }
            return dep;
        }

        if let Some(managed) = find_managed(&self.name(), dep_management) {
            if dep.version.is_empty() {
                dep.version = props.evaluate(&managed.version);
            }
            if dep.scope.is_empty() {
                dep.scope = props.evaluate(&managed.scope);
            }
            if !dep.optional {
                dep.optional = managed.optional;
            }
            if dep.exclusions.exclusion.is_empty() {
                dep.exclusions = managed.exclusions.clone();
            }
        }
        dep
    }
}

fn find_managed<'a>(name: &str, managed: &'a [PomDependency]) -> Option<&'a PomDependency> {
    managed.iter().find(|dep| dep.name() == name)
}

/// Recursive `${...}` substitution over a property table.
///
/// A property's value may itself contain references; those are expanded
/// first. `env.NAME` references read the process environment. The chain of
/// values under expansion is tracked so a cycle collapses the current
/// expansion to an empty string instead of recursing forever.
pub struct PropertyResolver {
    props: HashMap<String, String>,
    pattern: Regex,
}

impl PropertyResolver {
    pub fn new(props: HashMap<String, String>) -> Result<Self> {
        Ok(Self {
            props,
            pattern: Regex::new(r"\$\{([^}\s]+?)\}")?,
        })
    }

    pub fn evaluate(&self, raw: &str) -> String {
        self.evaluate_inner(raw, &mut Vec::new())
    }

    fn evaluate_inner(&self, raw: &str, seen: &mut Vec<String>) -> String {
        let mut resolved = raw.to_string();

        for caps in self.pattern.captures_iter(raw) {
            let reference = &caps[0];
            let key = &caps[1];

            let value = if let Some(env_name) = key.strip_prefix("env.") {
                std::env::var(env_name).unwrap_or_default()
            } else if let Some(inner) = self.props.get(key) {
                if seen.contains(inner) {
                    log::warn!(
                        "looped properties detected: {} -> {}",
                        seen.join(" -> "),
                        reference
                    );
                    return String::new();
                }
                seen.push(inner.clone());
                let value = self.evaluate_inner(inner, seen);
                // Reset between sibling references so `${foo}-${foo}` works.
                seen.clear();
                value
            } else {
                String::new()
            };

            resolved = resolved.replace(reference, &value);
        }
        resolved
    }
}
