//! Architectural Enforcement Integration Tests
//!
//! Helpers for the tests that keep the workspace honest:
//! - The core never sleeps; time only moves through `Stage::tick`
//! - The surface sleeps only to limit its frame rate
//! - The core stays headless (no terminal crates)

use std::fs;
use std::path::{Path, PathBuf};

use walkdir::WalkDir;

/// Workspace root, two levels above this crate
pub fn workspace_root() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("..").join("..")
}

/// All `.rs` files under `dir`, relative to the workspace root
pub fn rust_sources(dir: &str) -> Vec<PathBuf> {
    let base = workspace_root().join(dir);
    WalkDir::new(&base)
        .into_iter()
        .filter_map(Result::ok)
        .filter(|e| e.file_type().is_file())
        .filter(|e| e.path().extension().is_some_and(|ext| ext == "rs"))
        .map(|e| e.into_path())
        .collect()
}

/// A line of code that matched a forbidden pattern
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Violation {
    pub file: PathBuf,
    pub line: usize,
    pub text: String,
}

impl std::fmt::Display for Violation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}: {}", self.file.display(), self.line, self.text)
    }
}

/// Lines in `files` containing `needle`, skipping comments
pub fn find_pattern(files: &[PathBuf], needle: &str) -> Vec<Violation> {
    let mut found = Vec::new();
    for file in files {
        let Ok(source) = fs::read_to_string(file) else {
            continue;
        };
        for (i, line) in source.lines().enumerate() {
            let trimmed = line.trim_start();
            if trimmed.starts_with("//") {
                continue;
            }
            if line.contains(needle) {
                found.push(Violation {
                    file: file.clone(),
                    line: i + 1,
                    text: trimmed.to_string(),
                });
            }
        }
    }
    found
}

/// Dependency names declared in a Cargo manifest's `[dependencies]` table
pub fn dependency_names(manifest: &str) -> Vec<String> {
    let mut names = Vec::new();
    let mut in_deps = false;
    for line in manifest.lines() {
        let line = line.trim();
        if line.starts_with('[') {
            in_deps = line == "[dependencies]";
            continue;
        }
        if !in_deps || line.is_empty() || line.starts_with('#') {
            continue;
        }
        if let Some((name, _)) = line.split_once('=') {
            let name = name.trim();
            let name = name.split_once('.').map_or(name, |(head, _)| head);
            names.push(name.to_string());
        }
    }
    names
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dependency_names_reads_only_dependencies() {
        let manifest = r#"
[package]
name = "x"

[dependencies]
# comment
serde = { workspace = true }
tokio.workspace = true

[dev-dependencies]
tempfile = "3"
"#;
        assert_eq!(dependency_names(manifest), vec!["serde", "tokio"]);
    }

    #[test]
    fn test_find_pattern_skips_comments() {
        let dir = std::env::temp_dir().join("arch-enforcement-find-pattern");
        let _ = fs::create_dir_all(&dir);
        let file = dir.join("sample.rs");
        fs::write(&file, "// sleep here is fine\nfn f() { sleep(); }\n").unwrap();

        let found = find_pattern(&[file], "sleep(");
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].line, 2);
    }
}
