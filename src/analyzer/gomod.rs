use std::path::Path;

use anyhow::{bail, Result};
use regex::Regex;

use crate::models::{Dependency, Ecosystem};

/// Parser for `go.mod` files.
///
/// Extracts every `require` directive, both the inline form and the
/// parenthesised block form. The module's own `// indirect` comment marks
/// transitively-required modules.
pub struct GoModAnalyzer;

impl super::Analyzer for GoModAnalyzer {
    fn analyze(&self, path: &Path) -> Result<Vec<Dependency>> {
        let content = std::fs::read_to_string(path)?;
        parse_go_mod(&content, path)
    }
}

// Top-level go.mod directives. Anything else fails the parse instead of
// being silently skipped.
const DIRECTIVES: [&str; 9] = [
    "module",
    "go",
    "toolchain",
    "godebug",
    "require",
    "exclude",
    "replace",
    "retract",
    "tool",
];

fn parse_go_mod(content: &str, origin: &Path) -> Result<Vec<Dependency>> {
    // "module/path v1.2.3 // indirect"
    let require_re = Regex::new(r"^(\S+)\s+(\S+)\s*(//.*)?$")?;

    let mut deps = Vec::new();
    let mut saw_module = false;
    let mut in_require_block = false;
    let mut in_other_block = false;

    for raw in content.lines() {
        let line = raw.trim();
        if line.is_empty() || line.starts_with("//") {
            continue;
        }

        if in_require_block {
            if line == ")" {
                in_require_block = false;
                continue;
            }
            deps.push(parse_require_entry(&require_re, line, origin)?);
            continue;
        }

        if in_other_block {
            if line == ")" {
                in_other_block = false;
            }
            continue;
        }

        if line == "require (" {
            in_require_block = true;
            continue;
        }
        if let Some(rest) = line.strip_prefix("require ") {
            deps.push(parse_require_entry(&require_re, rest.trim(), origin)?);
            continue;
        }

        let keyword = line.split_whitespace().next().unwrap_or_default();
        if !DIRECTIVES.contains(&keyword) {
            bail!("unrecognized directive: {line}");
        }
        if keyword == "module" {
            saw_module = true;
        }
        if line.ends_with('(') {
            // exclude/replace/retract blocks
            in_other_block = true;
        }
    }

    if !saw_module {
        bail!("missing module directive");
    }
    Ok(deps)
}

fn parse_require_entry(re: &Regex, line: &str, origin: &Path) -> Result<Dependency> {
    let Some(caps) = re.captures(line) else {
        bail!("invalid require directive: {line}");
    };

    let indirect = caps
        .get(3)
        .map_or(false, |comment| comment.as_str().contains("indirect"));

    Ok(Dependency {
        ecosystem: Ecosystem::Go,
        name: caps[1].to_string(),
        version: caps[2].to_string(),
        origin: origin.to_path_buf(),
        indirect,
        licenses: Vec::new(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_require_block() {
        let content = r#"
module example.com/app

go 1.21

require (
	github.com/labstack/echo/v4 v4.9.1
	github.com/modfin/henry v0.0.0-20230824150253-35f12224ee68
	golang.org/x/net v0.17.0 // indirect
)
"#;
        let deps = parse_go_mod(content, Path::new("go.mod")).unwrap();
        assert_eq!(deps.len(), 3);
        assert_eq!(deps[0].name, "github.com/labstack/echo/v4");
        assert_eq!(deps[0].version, "v4.9.1");
        assert!(!deps[0].indirect);
        assert_eq!(deps[2].name, "golang.org/x/net");
        assert!(deps[2].indirect);
    }

    #[test]
    fn test_parse_inline_require() {
        let content = "module m\n\nrequire github.com/sirupsen/logrus v1.9.3\n";
        let deps = parse_go_mod(content, Path::new("go.mod")).unwrap();
        assert_eq!(deps.len(), 1);
        assert_eq!(deps[0].name, "github.com/sirupsen/logrus");
        assert_eq!(deps[0].version, "v1.9.3");
    }

    #[test]
    fn test_other_blocks_are_ignored() {
        let content = r#"
module m

replace (
	example.com/a => example.com/b v1.0.0
)

require (
	example.com/c v1.1.0
)
"#;
        let deps = parse_go_mod(content, Path::new("go.mod")).unwrap();
        assert_eq!(deps.len(), 1);
        assert_eq!(deps[0].name, "example.com/c");
    }

    #[test]
    fn test_bad_require_entry_is_malformed() {
        let content = "require (\n\tonly-one-token\n)\n";
        assert!(parse_go_mod(content, Path::new("go.mod")).is_err());
    }

    #[test]
    fn test_prose_is_rejected() {
        let content = "These are the project's release notes,\nnot a module definition.\n";
        assert!(parse_go_mod(content, Path::new("go.mod")).is_err());
    }

    #[test]
    fn test_missing_module_directive_is_rejected() {
        let content = "go 1.21\n\nrequire example.com/a v1.0.0\n";
        assert!(parse_go_mod(content, Path::new("go.mod")).is_err());
    }
}
