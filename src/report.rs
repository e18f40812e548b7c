use std::collections::BTreeMap;
use std::path::Path;

use crate::models::{Dependency, NON_STANDARD_LICENSE, UNKNOWN_LICENSE};

const INDIRECT_SUFFIX: &str = " //indirect";

/// Dependencies grouped license → origin file → display string. Built fresh
/// per run; BTreeMaps keep both grouping levels sorted so the rendered
/// report is deterministic.
pub struct LicenseReport {
    groups: BTreeMap<String, BTreeMap<String, Vec<String>>>,
}

impl LicenseReport {
    pub fn build(root: &Path, deps: &[Dependency]) -> Self {
        let mut groups: BTreeMap<String, BTreeMap<String, Vec<String>>> = BTreeMap::new();

        for dep in deps {
            let mut display = format!("{} {}", dep.name, dep.version);
            if dep.indirect {
                display.push_str(INDIRECT_SUFFIX);
            }

            // Origins display relative to the scan root; a path outside it
            // keeps its absolute form behind a marker instead of failing.
            let origin = match dep.origin.strip_prefix(root) {
                Ok(relative) => relative.display().to_string(),
                Err(_) => format!("!{}", dep.origin.display()),
            };

            for license in &dep.licenses {
                groups
                    .entry(license.clone())
                    .or_default()
                    .entry(origin.clone())
                    .or_default()
                    .push(display.clone());
            }
        }

        Self { groups }
    }

    /// Render the report: a header with per-license totals, then one body
    /// section per license listing each origin file's direct dependencies
    /// before its indirect ones.
    pub fn render(&self) -> String {
        let mut header = String::new();
        let mut body = String::new();

        for (license, files) in &self.groups {
            let link = if is_sentinel(license) {
                String::new()
            } else {
                format!("  //  {}", spdx_links(license))
            };
            body.push_str(&format!("[{license}]{link}\n\n"));

            let mut direct_count = 0;
            let mut indirect_count = 0;

            for (file, entries) in files {
                body.push_str(&format!(" [[{file}]]\n"));

                let mut entries = entries.clone();
                entries.sort();

                for entry in entries.iter().filter(|e| !e.ends_with(INDIRECT_SUFFIX)) {
                    direct_count += 1;
                    body.push_str(&format!("   {entry}\n"));
                }
                for entry in entries.iter().filter(|e| e.ends_with(INDIRECT_SUFFIX)) {
                    indirect_count += 1;
                    body.push_str(&format!("   {entry}\n"));
                }
                body.push('\n');
            }

            header.push_str(&format!("{license}: {}\n", direct_count + indirect_count));
            body.push('\n');
        }

        format!("---\n{header}---\n{body}")
    }
}

fn is_sentinel(license: &str) -> bool {
    license == UNKNOWN_LICENSE || license == NON_STANDARD_LICENSE
}

/// Turn each license token of an SPDX expression into a deep link to its
/// text; operators and parentheses pass through unlinked.
fn spdx_links(expr: &str) -> String {
    let padded = expr.replace('(', "( ").replace(')', " )");
    padded
        .split(' ')
        .filter(|token| !token.is_empty())
        .map(|token| match token {
            "AND" | "OR" | "WITH" | "(" | ")" => token.to_string(),
            id => format!("https://spdx.org/licenses/{id}.html"),
        })
        .collect::<Vec<_>>()
        .join(" ")
}
