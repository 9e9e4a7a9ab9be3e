/// Static trust check over application sources
///
/// Flags literals that fabricate a status or a number instead of deriving
/// it from real data: hardcoded "healthy" states, success lifecycles set by
/// hand, constant compliance scores, random metrics, zero fallbacks.

pub mod rules;

use std::fmt;
use std::path::{Path, PathBuf};

use regex::RegexSet;
use thiserror::Error;
use walkdir::{DirEntry, WalkDir};

pub use rules::{Rule, DEFAULT_RULES};

/// Extensions that are scanned; everything else is ignored.
pub const SCANNED_EXTENSIONS: &[&str] = &["ts", "tsx", "js", "jsx", "mjs", "cjs", "rs"];

/// Directories never descended into.
pub const SKIPPED_DIRS: &[&str] = &["node_modules", "target", ".git", ".next", "dist", "build", "coverage"];

/// Marker that suppresses findings on its line.
pub const ALLOW_MARKER: &str = "trust-check: allow";

#[derive(Debug, Error)]
pub enum TrustCheckError {
    #[error("invalid rule pattern: {0}")]
    InvalidPattern(#[from] regex::Error),
    #[error("scan root does not exist: {0}")]
    RootNotFound(PathBuf),
    #[error("failed to walk source tree: {0}")]
    Walk(#[from] walkdir::Error),
}

/// Compiled rule set
pub struct Checker {
    set: RegexSet,
    rules: &'static [Rule],
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Violation {
    pub path: PathBuf,
    pub line: usize,
    pub rule: &'static str,
    pub message: &'static str,
    pub excerpt: String,
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}:{}: [{}] {}\n    {}",
            self.path.display(),
            self.line,
            self.rule,
            self.message,
            self.excerpt
        )
    }
}

#[derive(Debug, Default)]
pub struct Report {
    pub files_scanned: usize,
    pub violations: Vec<Violation>,
}

impl Report {
    pub fn is_clean(&self) -> bool {
        self.violations.is_empty()
    }

    /// 0 when clean, 1 when any violation was found.
    pub fn exit_code(&self) -> u8 {
        if self.is_clean() {
            0
        } else {
            1
        }
    }

    pub fn summary(&self) -> String {
        if self.is_clean() {
            format!("trust-check: OK ({} files scanned)", self.files_scanned)
        } else {
            format!(
                "trust-check: {} violation(s) across {} files scanned",
                self.violations.len(),
                self.files_scanned
            )
        }
    }
}

impl Checker {
    pub fn new(rules: &'static [Rule]) -> Result<Self, TrustCheckError> {
        let set = RegexSet::new(rules.iter().map(|r| r.pattern))?;
        Ok(Self { set, rules })
    }

    pub fn with_default_rules() -> Result<Self, TrustCheckError> {
        Self::new(DEFAULT_RULES)
    }

    /// Check one file's text. `path` is only used for reporting.
    pub fn check_source(&self, path: &Path, text: &str) -> Vec<Violation> {
        let mut found = Vec::new();
        for (idx, line) in text.lines().enumerate() {
            if line.contains(ALLOW_MARKER) {
                continue;
            }
            for rule_idx in self.set.matches(line).iter() {
                let rule = &self.rules[rule_idx];
                found.push(Violation {
                    path: path.to_path_buf(),
                    line: idx + 1,
                    rule: rule.id,
                    message: rule.message,
                    excerpt: line.trim().to_string(),
                });
            }
        }
        found
    }

    /// Walk `root` and check every eligible file.
    pub fn scan_tree(&self, root: &Path) -> Result<Report, TrustCheckError> {
        if !root.exists() {
            return Err(TrustCheckError::RootNotFound(root.to_path_buf()));
        }

        let mut report = Report::default();
        let walker = WalkDir::new(root)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(|e| !is_skipped_dir(e));

        for entry in walker {
            let entry = entry?;
            if !entry.file_type().is_file() {
                continue;
            }
            let path = entry.path();
            let relative = path.strip_prefix(root).unwrap_or(path);
            if !has_scanned_extension(path) || is_excluded(relative) {
                continue;
            }

            let text = match std::fs::read_to_string(path) {
                Ok(t) => t,
                Err(e) => {
                    tracing::warn!(path = %path.display(), error = %e, "Skipping unreadable file");
                    continue;
                }
            };

            report.files_scanned += 1;
            report.violations.extend(self.check_source(relative, &text));
        }

        tracing::debug!(
            files_scanned = report.files_scanned,
            violations = report.violations.len(),
            "Scan finished"
        );
        Ok(report)
    }
}

fn is_skipped_dir(entry: &DirEntry) -> bool {
    entry.depth() > 0
        && entry.file_type().is_dir()
        && entry
            .file_name()
            .to_str()
            .map(|name| SKIPPED_DIRS.contains(&name))
            .unwrap_or(false)
}

fn has_scanned_extension(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| SCANNED_EXTENSIONS.contains(&e))
        .unwrap_or(false)
}

/// Files the rules do not apply to: tests, fixtures and the checker itself.
pub fn is_excluded(relative: &Path) -> bool {
    let in_excluded_dir = relative.components().any(|c| {
        matches!(
            c.as_os_str().to_str(),
            Some("tests" | "__tests__" | "__fixtures__" | "fixtures" | "__mocks__" | "trust-check")
        )
    });
    if in_excluded_dir {
        return true;
    }

    let file_name = relative.file_name().and_then(|n| n.to_str()).unwrap_or_default();
    file_name.contains(".test.")
        || file_name.contains(".spec.")
        || file_name.ends_with("_test.rs")
        || file_name.starts_with("trust-check.")
}
