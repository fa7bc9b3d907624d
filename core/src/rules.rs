//! Rule loading: raw gitignore-style pattern lines, grouped into layers.
//!
//! A layer is the ordered pattern list contributed by one rule source,
//! anchored at one directory. Matching itself lives in [`crate::spec`].

use crate::error::{AppError, Result};
use std::fs;
use std::path::{Path, PathBuf};

pub const CONTEXT_FILENAME: &str = ".contextfiles";
pub const GITIGNORE_FILENAME: &str = ".gitignore";

/// Built-in exclusions applied beneath every walk target when no override
/// rules are active. Order matters: later rules win over earlier ones.
pub const DEFAULT_RULES: &[&str] = &[
    // Dotted anything, plus version-control metadata explicitly.
    ".*",
    ".git/",
    ".hg/",
    ".svn/",
    // Editor / IDE metadata.
    ".idea/",
    ".vscode/",
    // Dependency and build output directories.
    "node_modules/",
    "venv/",
    ".venv/",
    "__pycache__/",
    "dist/",
    "build/",
    "target/",
    "out/",
    "bin/",
    "obj/",
    "*.egg-info/",
    // Logs, backups, temporaries.
    "*.log",
    "log.*",
    "*.bak",
    "*.tmp",
    "*.temp",
    "*.swp",
    "*~",
];

/// A single parsed rule line. The flags are descriptive; the authoritative
/// match semantics come from the compiled matcher in [`crate::spec`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Pattern {
    pub raw: String,
    pub anchored: bool,
    pub negated: bool,
    pub dir_only: bool,
}

impl Pattern {
    pub fn parse(line: &str) -> Self {
        let negated = line.starts_with('!');
        // `\!` escapes a literal leading bang.
        let body = if negated {
            &line[1..]
        } else if let Some(stripped) = line.strip_prefix("\\!") {
            stripped
        } else {
            line
        };
        Pattern {
            raw: line.to_string(),
            anchored: body.starts_with('/'),
            negated,
            dir_only: body.ends_with('/'),
        }
    }
}

/// Where a layer's patterns came from. `Gitignore` and `Contextfile` carry
/// the directory (relative to the walk target) that anchors their
/// non-anchored patterns.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RuleSource {
    Defaults,
    Gitignore(PathBuf),
    Contextfile(PathBuf),
    Override,
}

impl RuleSource {
    /// Anchor directory relative to the walk target. Defaults and overrides
    /// anchor at the walk target itself.
    pub fn anchor(&self) -> &Path {
        match self {
            RuleSource::Gitignore(dir) | RuleSource::Contextfile(dir) => dir,
            RuleSource::Defaults | RuleSource::Override => Path::new(""),
        }
    }

    pub fn describe(&self) -> String {
        match self {
            RuleSource::Defaults => "built-in defaults".to_string(),
            RuleSource::Gitignore(dir) => format!(".gitignore at './{}'", dir.display()),
            RuleSource::Contextfile(dir) => {
                format!("{} at './{}'", CONTEXT_FILENAME, dir.display())
            }
            RuleSource::Override => "override rules".to_string(),
        }
    }
}

/// Ordered patterns from one source, in source order.
#[derive(Debug, Clone)]
pub struct RuleLayer {
    pub source: RuleSource,
    pub patterns: Vec<Pattern>,
}

impl RuleLayer {
    pub fn new(source: RuleSource, lines: &[String]) -> Self {
        RuleLayer {
            source,
            patterns: clean_rule_lines(lines.iter().map(String::as_str)),
        }
    }

    pub fn defaults() -> Self {
        RuleLayer {
            source: RuleSource::Defaults,
            patterns: DEFAULT_RULES.iter().map(|line| Pattern::parse(line)).collect(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }
}

/// Drop comment and whitespace-only lines; keep everything else verbatim
/// (interior whitespace is significant to gitignore matching).
pub fn clean_rule_lines<'a>(lines: impl Iterator<Item = &'a str>) -> Vec<Pattern> {
    lines
        .filter(|line| !line.trim().is_empty() && !line.trim_start().starts_with('#'))
        .map(Pattern::parse)
        .collect()
}

/// Load an explicitly named rule file (an overrides file). Unreadable or
/// non-UTF-8 content is a hard error.
pub fn load_rule_file(path: &Path) -> Result<Vec<String>> {
    let content = fs::read_to_string(path).map_err(|source| AppError::RuleRead {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(content.lines().map(str::to_string).collect())
}

/// Load a rule file discovered during a walk. Missing or unreadable files
/// contribute zero patterns, silently.
pub fn load_discovered_rules(path: &Path) -> Vec<String> {
    match fs::read_to_string(path) {
        Ok(content) => content.lines().map(str::to_string).collect(),
        Err(err) => {
            if path.exists() {
                log::warn!("Could not read rule file {}: {}", path.display(), err);
            }
            Vec::new()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::tempdir;

    #[test]
    fn clean_rule_lines_strips_comments_and_blanks() {
        let lines = ["# comment", "", "   ", "*.log", "  spaced pattern  ", "!keep.log"];
        let patterns = clean_rule_lines(lines.iter().copied());
        let raw: Vec<&str> = patterns.iter().map(|p| p.raw.as_str()).collect();
        assert_eq!(raw, vec!["*.log", "  spaced pattern  ", "!keep.log"]);
    }

    #[test]
    fn pattern_flags() {
        let p = Pattern::parse("!/build/");
        assert!(p.negated);
        assert!(p.anchored);
        assert!(p.dir_only);

        let p = Pattern::parse("\\!literal");
        assert!(!p.negated);
        assert!(!p.anchored);

        let p = Pattern::parse("src/**/*.py");
        assert!(!p.negated);
        assert!(!p.dir_only);
    }

    #[test]
    fn defaults_reproduce_the_builtin_list() {
        let layer = RuleLayer::defaults();
        assert_eq!(layer.patterns.len(), DEFAULT_RULES.len());
        assert_eq!(layer.patterns[0].raw, ".*");
        assert!(layer
            .patterns
            .iter()
            .any(|p| p.raw == "node_modules/" && p.dir_only));
        assert!(layer.patterns.iter().any(|p| p.raw == "*~"));
    }

    #[test]
    fn load_rule_file_errors_on_missing_file() {
        let dir = tempdir().unwrap();
        let err = load_rule_file(&dir.path().join("absent.rules")).unwrap_err();
        assert!(matches!(err, AppError::RuleRead { .. }));
    }

    #[test]
    fn load_rule_file_errors_on_invalid_utf8() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("bad.rules");
        let mut f = std::fs::File::create(&path).unwrap();
        f.write_all(&[0xff, 0xfe, 0x2a]).unwrap();
        let err = load_rule_file(&path).unwrap_err();
        assert!(matches!(err, AppError::RuleRead { .. }));
    }

    #[test]
    fn discovered_rules_are_silent_when_missing() {
        let dir = tempdir().unwrap();
        assert!(load_discovered_rules(&dir.path().join(CONTEXT_FILENAME)).is_empty());
    }

    #[test]
    fn rule_source_anchor() {
        assert_eq!(RuleSource::Defaults.anchor(), Path::new(""));
        assert_eq!(
            RuleSource::Contextfile(PathBuf::from("src/api")).anchor(),
            Path::new("src/api")
        );
    }
}
