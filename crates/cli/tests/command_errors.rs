use assert_cmd::Command;
use predicates::prelude::*;

fn fnsweep() -> Command {
    Command::cargo_bin("fnsweep").expect("binary builds")
}

#[test]
fn analyze_missing_binary_fails_clearly() {
    fnsweep()
        .args(["analyze", "--path", "/nonexistent/definitely-missing.bin"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Failed to read binary"));
}

#[test]
fn analyze_base_without_size_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let bin = dir.path().join("raw.bin");
    std::fs::write(&bin, [0x90u8; 4]).unwrap();

    fnsweep()
        .args(["analyze", "--path", bin.to_str().unwrap(), "--base", "0x1000"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("--size is required with --base"));
}

#[test]
fn analyze_rejects_unknown_architecture() {
    let dir = tempfile::tempdir().unwrap();
    let bin = dir.path().join("raw.bin");
    std::fs::write(&bin, [0x90u8; 4]).unwrap();

    fnsweep()
        .args(["analyze", "--path", bin.to_str().unwrap(), "--arch", "vax"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("unsupported architecture"));
}

#[test]
fn analyze_rejects_bad_hex_base() {
    let dir = tempfile::tempdir().unwrap();
    let bin = dir.path().join("raw.bin");
    std::fs::write(&bin, [0x90u8; 4]).unwrap();

    fnsweep()
        .args([
            "analyze",
            "--path",
            bin.to_str().unwrap(),
            "--base",
            "0xnotanumber",
            "--size",
            "4",
        ])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Invalid hex value"));
}

#[test]
fn analyze_rejects_empty_spec_file() {
    let dir = tempfile::tempdir().unwrap();
    let bin = dir.path().join("raw.bin");
    std::fs::write(&bin, [0x90u8; 4]).unwrap();
    let spec = dir.path().join("regions.yaml");
    std::fs::write(&spec, "[]\n").unwrap();

    fnsweep()
        .args([
            "analyze",
            "--path",
            bin.to_str().unwrap(),
            "--regions",
            spec.to_str().unwrap(),
        ])
        .assert()
        .failure()
        .stderr(predicate::str::contains("lists no regions"));
}

#[test]
fn ranges_on_unopenable_db_fails_clearly() {
    let dir = tempfile::tempdir().unwrap();

    fnsweep()
        .args(["ranges", "--db", dir.path().to_str().unwrap()])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Failed to open range database"));
}
