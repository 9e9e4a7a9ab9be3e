use std::fs;
use std::path::Path;

use tempfile::TempDir;
use trust_check::{Checker, TrustCheckError};

fn write(root: &Path, rel: &str, body: &str) {
    let path = root.join(rel);
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, body).unwrap();
}

#[test]
fn clean_tree_exits_zero() {
    let dir = TempDir::new().unwrap();
    write(
        dir.path(),
        "app/api/cfo/route.ts",
        "export async function GET() {\n  const snapshot = await fetchSnapshot();\n  return json(snapshot);\n}\n",
    );
    write(dir.path(), "README.md", "status = \"healthy\"\n");

    let report = Checker::with_default_rules().unwrap().scan_tree(dir.path()).unwrap();
    assert_eq!(report.files_scanned, 1);
    assert!(report.is_clean());
    assert_eq!(report.exit_code(), 0);
}

#[test]
fn forbidden_literal_exits_one() {
    let dir = TempDir::new().unwrap();
    write(
        dir.path(),
        "app/api/status/route.ts",
        "export function GET() {\n  const status = \"healthy\";\n  return json({ status });\n}\n",
    );

    let report = Checker::with_default_rules().unwrap().scan_tree(dir.path()).unwrap();
    assert_eq!(report.exit_code(), 1);
    assert_eq!(report.violations.len(), 1);

    let v = &report.violations[0];
    assert_eq!(v.path, Path::new("app/api/status/route.ts"));
    assert_eq!(v.line, 2);
    assert_eq!(v.rule, "hardcoded-status");
}

#[test]
fn excluded_files_are_not_checked() {
    let dir = TempDir::new().unwrap();
    write(dir.path(), "app/__tests__/status.ts", "const status = \"healthy\";\n");
    write(dir.path(), "lib/status.test.ts", "const status = \"healthy\";\n");
    write(dir.path(), "scripts/trust-check.ts", "const status = \"healthy\";\n");
    write(dir.path(), "node_modules/pkg/index.js", "const status = \"healthy\";\n");

    let report = Checker::with_default_rules().unwrap().scan_tree(dir.path()).unwrap();
    assert_eq!(report.files_scanned, 0);
    assert_eq!(report.exit_code(), 0);
}

#[test]
fn findings_are_ordered_by_path() {
    let dir = TempDir::new().unwrap();
    write(dir.path(), "b.ts", "const health = 'healthy';\n");
    write(dir.path(), "a.ts", "const score = Math.random();\n");

    let report = Checker::with_default_rules().unwrap().scan_tree(dir.path()).unwrap();
    let paths: Vec<_> = report.violations.iter().map(|v| v.path.clone()).collect();
    assert_eq!(paths, vec![Path::new("a.ts").to_path_buf(), Path::new("b.ts").to_path_buf()]);
}

#[test]
fn missing_root_is_an_error() {
    let dir = TempDir::new().unwrap();
    let missing = dir.path().join("nope");
    let err = Checker::with_default_rules().unwrap().scan_tree(&missing).unwrap_err();
    assert!(matches!(err, TrustCheckError::RootNotFound(_)));
}
