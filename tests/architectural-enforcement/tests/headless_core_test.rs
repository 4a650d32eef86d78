//! Keeps the core headless and clock-driven

use std::fs;

use architectural_enforcement::{dependency_names, find_pattern, rust_sources, workspace_root};

#[test]
fn test_core_never_sleeps() {
    let files = rust_sources("core/src");
    assert!(!files.is_empty(), "core sources not found");

    let mut violations = find_pattern(&files, "sleep(");
    violations.extend(find_pattern(&files, "Instant::now"));
    assert!(
        violations.is_empty(),
        "core must only move time through Stage::tick:\n{}",
        violations
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join("\n")
    );
}

#[test]
fn test_surface_sleeps_only_for_frame_limiting() {
    let files = rust_sources("tui/src");
    let offenders: Vec<_> = find_pattern(&files, "sleep(")
        .into_iter()
        .filter(|v| !v.file.ends_with("app.rs"))
        .collect();
    assert!(offenders.is_empty(), "unexpected sleeps: {offenders:?}");

    for v in find_pattern(&files, "sleep(") {
        assert!(
            v.text.contains("tokio::time::sleep"),
            "blocking sleep in the event loop: {v}"
        );
    }
}

#[test]
fn test_core_has_no_terminal_dependencies() {
    let manifest = fs::read_to_string(workspace_root().join("core/Cargo.toml")).unwrap();
    let deps = dependency_names(&manifest);
    assert!(deps.iter().any(|d| d == "tokio"));
    for forbidden in ["ratatui", "crossterm"] {
        assert!(
            !deps.iter().any(|d| d == forbidden),
            "gremlin-core must not depend on {forbidden}"
        );
    }
}
