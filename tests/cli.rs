use std::fs;
use std::process::Command;
use assert_cmd::assert::OutputAssertExt;
use assert_cmd::cargo::CommandCargoExt;
use tempfile::TempDir;
const SAMPLE: &str = concat!(env!("CARGO_MANIFEST_DIR"), "/data/sample_data_file.txt");
#[test]
fn cli_renders_sample_file() {
    let temp_dir = TempDir::new().unwrap();
    let output = temp_dir.path().join("plot.png");
    let mut cmd = Command::cargo_bin("voltage-plot").unwrap();
    cmd.arg(SAMPLE)
        .arg("--output")
        .arg(&output)
        .arg("--print")
        .assert()
        .success();
    let png = fs::read(&output).unwrap();
    assert!(png.starts_with(&[0x89, b'P', b'N', b'G']));
}
#[test]
fn cli_prints_table() {
    let temp_dir = TempDir::new().unwrap();
    let mut cmd = Command::cargo_bin("voltage-plot").unwrap();
    let out = cmd
        .current_dir(&temp_dir)
        .args([SAMPLE, "--print", "--no-spline", "--smoothing", "0.5"])
        .output()
        .unwrap();
    assert!(out.status.success());
    let stdout = String::from_utf8(out.stdout).unwrap();
    assert!(stdout.starts_with("Row -> Time [s], Voltage [mV]\n0 -> 0.0, 0.00 +/- 0.50"));
    assert!(temp_dir.path().join("Voltage_vs_time.png").exists());
}
#[test]
fn cli_fails_on_missing_input() {
    let temp_dir = TempDir::new().unwrap();
    let mut cmd = Command::cargo_bin("voltage-plot").unwrap();
    cmd.current_dir(&temp_dir)
        .arg("does_not_exist.txt")
        .assert()
        .failure();
    assert!(!temp_dir.path().join("Voltage_vs_time.png").exists());
}
#[test]
fn cli_rejects_bad_config() {
    let temp_dir = TempDir::new().unwrap();
    let config = temp_dir.path().join("plot.json");
    fs::write(&config, r#"{"marker": "hexagon"}"#).unwrap();
    let mut cmd = Command::cargo_bin("voltage-plot").unwrap();
    cmd.current_dir(&temp_dir)
        .arg(SAMPLE)
        .arg("--config")
        .arg(&config)
        .assert()
        .failure();
}
