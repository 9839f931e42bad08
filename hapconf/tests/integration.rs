use std::path::Path;
use std::process::{Command, Output};

const MESSY: &str = "frontend  www\n  bind   *:80\n\tdefault_backend app\n\nbackend app\n  server web1 10.0.0.1:80\n";
const TIDY: &str = "frontend www\n    bind            *:80\n    default_backend app\n\nbackend app\n    server web1 10.0.0.1:80\n";

fn hapconf(args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_hapconf"))
        .args(args)
        .env_remove("RUST_LOG")
        .output()
        .expect("Failed to run hapconf")
}

fn write_config(dir: &Path, body: &str) -> String {
    let path = dir.join("haproxy.cfg");
    std::fs::write(&path, body).unwrap();
    path.to_str().unwrap().to_string()
}

#[test]
fn test_fmt_prints_canonical_form() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_config(dir.path(), MESSY);

    let output = hapconf(&["fmt", &path]);
    assert!(output.status.success());
    assert_eq!(String::from_utf8_lossy(&output.stdout), TIDY);
    assert_eq!(std::fs::read_to_string(&path).unwrap(), MESSY);
}

#[test]
fn test_fmt_write_and_check() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_config(dir.path(), MESSY);

    assert!(!hapconf(&["fmt", &path, "--check"]).status.success());

    let output = hapconf(&["fmt", &path, "--write"]);
    assert!(output.status.success());
    assert_eq!(std::fs::read_to_string(&path).unwrap(), TIDY);

    assert!(hapconf(&["fmt", &path, "--check"]).status.success());
}

#[test]
fn test_fmt_with_style() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_config(dir.path(), "backend app\n    mode http\n");
    let style = dir.path().join("style.toml");
    std::fs::write(&style, "spaces_per_indent = 2\n").unwrap();

    let output = hapconf(&["fmt", &path, "--style", style.to_str().unwrap()]);
    assert!(output.status.success());
    assert_eq!(String::from_utf8_lossy(&output.stdout), "backend app\n  mode http\n");
}

#[test]
fn test_check_reports_errors() {
    let dir = tempfile::tempdir().unwrap();

    let path = write_config(dir.path(), TIDY);
    let output = hapconf(&["check", &path]);
    assert!(output.status.success());
    assert!(String::from_utf8_lossy(&output.stdout).contains("is valid"));

    let path = write_config(dir.path(), "frontend www\n    bind nowhere\n");
    let output = hapconf(&["check", &path]);
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("Invalid bind parameters"));
}

#[test]
fn test_missing_file() {
    let dir = tempfile::tempdir().unwrap();
    let missing = dir.path().join("missing.cfg");

    let output = hapconf(&["check", missing.to_str().unwrap()]);
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("Cannot read file"));
}

#[test]
fn test_version() {
    let output = hapconf(&["version"]);
    assert!(output.status.success());
    assert!(String::from_utf8_lossy(&output.stdout).starts_with("hapconf v"));
}
