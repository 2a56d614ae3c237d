use assert_cmd::prelude::*;
use predicates::prelude::*;
use std::io::Write;
use std::process::Command;

fn write_input(dir: &tempfile::TempDir, name: &str, content: &str) -> String {
    let path = dir.path().join(name);
    let mut file = std::fs::File::create(&path).unwrap();
    file.write_all(content.as_bytes()).unwrap();
    path.to_str().unwrap().to_string()
}

fn run_success(args: &[&str]) -> String {
    let mut cmd = Command::cargo_bin("tensorlang").unwrap();
    cmd.args(args);
    let output = cmd.output().unwrap();
    let stderr = String::from_utf8(output.stderr).unwrap();
    assert!(output.status.success(), "tensorlang failed: {stderr}");
    String::from_utf8(output.stdout).unwrap()
}

#[test]
fn translate_file() {
    let dir = tempfile::TempDir::new().unwrap();
    let path = write_input(
        &dir,
        "input.tex",
        "% define metric gUU (2);\n% define nosym wD (2);\nv^a = g^{ab} w_b\n",
    );
    let got = run_success(&[&path]);
    let symbols: Vec<&str> = got
        .lines()
        .map(|line| line.split(" = ").next().unwrap())
        .collect();
    assert_eq!(symbols, vec!["gUU", "gDD", "gdet", "wD", "vU"]);
    assert!(
        got.ends_with("vU = [gUU00*wD0 + gUU01*wD1, gUU01*wD0 + gUU11*wD1]\n"),
        "{got}"
    );
}

#[test]
fn files_share_one_session() {
    let dir = tempfile::TempDir::new().unwrap();
    let first = write_input(&dir, "first.tex", "% define nosym uU (2)");
    let second = write_input(&dir, "second.tex", "v^a = u^a");
    let got = run_success(&[&first, &second]);
    similar_asserts::assert_eq!(got, "uU = [uU0, uU1]\nvU = [uU0, uU1]\n");
}

#[test]
fn no_retention() {
    let dir = tempfile::TempDir::new().unwrap();
    let first = write_input(&dir, "first.tex", "% define nosym uU (2)");
    let second = write_input(&dir, "second.tex", "v^a = u^a");
    let mut cmd = Command::cargo_bin("tensorlang").unwrap();
    cmd.args(["--no-retention", first.as_str(), second.as_str()]);
    cmd.assert()
        .failure()
        .stderr(predicate::str::contains("dimension"));
}

#[test]
fn expression() {
    let got = run_success(&["--expression", r"\frac{1}{2} x + x"]);
    similar_asserts::assert_eq!(got, "3*x/2\n");
}

#[test]
fn code_format() {
    let dir = tempfile::TempDir::new().unwrap();
    let path = write_input(&dir, "input.tex", "% define nosym uU (3); v^a = u^a");
    let got = run_success(&["--format", "code", &path]);
    similar_asserts::assert_eq!(got, "vU[a] = [uU[a] for a in range(0, 3)]\n");
}

#[test]
fn json_format() {
    let dir = tempfile::TempDir::new().unwrap();
    let path = write_input(&dir, "input.tex", "% define const c; x = 2");
    let got = run_success(&["--format", "json", &path]);
    let got: serde_json::Value = serde_json::from_str(&got).unwrap();
    let symbols: Vec<&str> = got
        .as_array()
        .unwrap()
        .iter()
        .map(|definition| definition["symbol"].as_str().unwrap())
        .collect();
    assert_eq!(symbols, vec!["c", "x"]);
}

#[test]
fn override_notice() {
    let dir = tempfile::TempDir::new().unwrap();
    let path = write_input(&dir, "input.tex", "% define nosym uU (2)");
    let mut cmd = Command::cargo_bin("tensorlang").unwrap();
    cmd.args([&path, &path]);
    cmd.assert()
        .success()
        .stderr(predicate::str::contains("OverrideWarning: uU"));

    let mut cmd = Command::cargo_bin("tensorlang").unwrap();
    cmd.args(["--ignore-override", path.as_str(), path.as_str()]);
    cmd.assert()
        .success()
        .stderr(predicate::str::contains("OverrideWarning").not());
}

#[test]
fn parse_error() {
    let mut cmd = assert_cmd::Command::cargo_bin("tensorlang").unwrap();
    cmd.write_stdin(r"v^a = \foo");
    cmd.assert()
        .failure()
        .stderr(predicate::str::contains("unsupported command"));
}

#[test]
fn missing_file() {
    let mut cmd = Command::cargo_bin("tensorlang").unwrap();
    cmd.arg("does_not_exist.tex");
    cmd.assert()
        .failure()
        .stderr(predicate::str::contains("Failed to read `does_not_exist.tex`"));
}
