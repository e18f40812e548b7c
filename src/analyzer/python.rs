use std::path::Path;

use anyhow::Result;

use crate::models::{Dependency, Ecosystem};

/// Parser for `requirements.txt`.
///
/// Only exact pins (`name==version`) are extracted. Range specifiers, VCS
/// URLs, pip options and blank lines are skipped. All entries are direct —
/// a requirements file has no notion of transitive declarations.
pub struct PythonAnalyzer;

impl super::Analyzer for PythonAnalyzer {
    fn analyze(&self, path: &Path) -> Result<Vec<Dependency>> {
        let content = std::fs::read_to_string(path)?;
        Ok(parse_requirements(&content, path))
    }
}

fn parse_requirements(content: &str, origin: &Path) -> Vec<Dependency> {
    let mut deps = Vec::new();

    for raw in content.lines() {
        let mut line = raw.replace(' ', "").replace('\\', "");
        line = strip_extras(&line);
        for marker in ["#", ";", "--"] {
            if let Some(pos) = line.find(marker) {
                line.truncate(pos);
            }
        }

        let parts: Vec<&str> = line.split("==").collect();
        if parts.len() != 2 {
            continue;
        }

        deps.push(Dependency {
            ecosystem: Ecosystem::Pypi,
            name: parts[0].to_string(),
            version: parts[1].to_string(),
            origin: origin.to_path_buf(),
            indirect: false,
            licenses: Vec::new(),
        });
    }

    deps
}

/// Remove a `[extras]` suffix, e.g. `uvicorn[standard]==0.23` → `uvicorn==0.23`.
fn strip_extras(line: &str) -> String {
    match (line.find('['), line.find(']')) {
        (Some(start), Some(end)) if end > start => {
            format!("{}{}", &line[..start], &line[end + 1..])
        }
        _ => line.to_string(),
    }
}
