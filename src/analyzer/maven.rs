use std::path::Path;

use anyhow::Result;

use crate::analyzer::pom::{PomXml, PropertyResolver};
use crate::models::{Dependency, Ecosystem};

/// Parser for Maven `pom.xml` files.
///
/// Each `<dependency>` has its `${...}` variables evaluated and unset fields
/// inherited from `<dependencyManagement>` before a record is emitted.
/// Test-scoped dependencies are excluded. Maven's single-file model carries
/// no transitivity information, so every record is direct.
pub struct MavenAnalyzer;

impl super::Analyzer for MavenAnalyzer {
    fn analyze(&self, path: &Path) -> Result<Vec<Dependency>> {
        let content = std::fs::read_to_string(path)?;
        let pom: PomXml = quick_xml::de::from_str(&content)?;
        parse_pom(&pom, path)
    }
}

fn parse_pom(pom: &PomXml, origin: &Path) -> Result<Vec<Dependency>> {
    let props = PropertyResolver::new(pom.property_table())?;
    let managed = &pom.dependency_management.dependencies.dependency;

    let mut deps = Vec::new();
    for dep in &pom.dependencies.dependency {
        let resolved = dep.resolve(&props, managed, &[]);

        if resolved.scope == "test" {
            continue;
        }

        deps.push(Dependency {
            ecosystem: Ecosystem::Maven,
            name: resolved.name(),
            version: resolved.version,
            origin: origin.to_path_buf(),
            indirect: false,
            licenses: Vec::new(),
        });
    }
    Ok(deps)
}
