//! Integration tests for the `sonant` binary.

use std::process::Command;

use tempfile::TempDir;

/// Helper to get the path to the `sonant` binary built by cargo.
fn sonant_bin() -> Command {
    Command::new(env!("CARGO_BIN_EXE_sonant"))
}

fn stdout_of(args: &[&str]) -> String {
    let output = sonant_bin()
        .args(args)
        .output()
        .expect("failed to run sonant");
    assert!(
        output.status.success(),
        "sonant {args:?} failed: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    String::from_utf8_lossy(&output.stdout).into_owned()
}

const SWEEP: &str = r#"
name = "sweep"
units = "frequency"
initial = 100.0
duration = 1.0

[[events]]
type = "ramp_to"
value = 400.0
duration = 1.0
"#;

// ---------------------------------------------------------------------------
// convert
// ---------------------------------------------------------------------------

#[test]
fn cli_convert_musical_time() {
    let stdout = stdout_of(&["convert", "4n", "--units", "time"]);
    assert!(stdout.contains("= 0.5 raw"), "{stdout}");
}

#[test]
fn cli_convert_note_to_frequency() {
    let stdout = stdout_of(&["convert", "A4", "--units", "frequency"]);
    assert!(stdout.contains("= 440 raw"), "{stdout}");
}

#[test]
fn cli_convert_decibels_both_ways() {
    let stdout = stdout_of(&["convert", "-20", "--units", "db"]);
    let raw: f64 = stdout
        .trim()
        .rsplit(' ')
        .nth(1)
        .and_then(|s| s.parse().ok())
        .expect("raw value in output");
    assert!((raw - 0.1).abs() < 1e-9, "{stdout}");

    let stdout = stdout_of(&["convert", "1", "--units", "decibels", "--to-semantic"]);
    assert!(stdout.contains("= 0 decibels"), "{stdout}");
}

#[test]
fn cli_convert_rejects_unknown_units() {
    let output = sonant_bin()
        .args(["convert", "1", "--units", "furlongs"])
        .output()
        .expect("failed to run sonant");
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("unknown units"));
}

// ---------------------------------------------------------------------------
// clamp
// ---------------------------------------------------------------------------

#[test]
fn cli_clamp_min() {
    assert!(stdout_of(&["clamp", "--threshold", "5", "--input", "3"]).contains("min(3, 5) = 3"));
    assert!(stdout_of(&["clamp", "--threshold", "5", "--input", "8"]).contains("min(8, 5) = 5"));
    assert!(stdout_of(&["clamp", "--threshold", "2", "--input", "3"]).contains("min(3, 2) = 2"));
}

#[test]
fn cli_clamp_max() {
    assert!(
        stdout_of(&["clamp", "--threshold", "5", "--input", "3", "--max"]).contains("max(3, 5) = 5")
    );
    assert!(
        stdout_of(&["clamp", "--threshold", "-1", "--input", "-4", "--max"])
            .contains("max(-4, -1) = -1")
    );
}

// ---------------------------------------------------------------------------
// render
// ---------------------------------------------------------------------------

#[test]
fn cli_render_json() {
    let dir = TempDir::new().unwrap();
    let script = dir.path().join("sweep.toml");
    let config = dir.path().join("ctx.toml");
    std::fs::write(&script, SWEEP).unwrap();
    std::fs::write(&config, "sample_rate = 100\n").unwrap();

    let stdout = stdout_of(&[
        "render",
        script.to_str().unwrap(),
        "--config",
        config.to_str().unwrap(),
        "--json",
    ]);
    let json: serde_json::Value = serde_json::from_str(&stdout).unwrap();
    assert_eq!(json["name"], "sweep");
    assert_eq!(json["units"], "frequency");
    assert_eq!(json["frames"], 100);

    let samples = json["samples"].as_array().unwrap();
    assert_eq!(samples.len(), 100);
    let mid = samples[50].as_f64().unwrap();
    assert!((mid - 200.0).abs() < 1e-6, "exponential midpoint was {mid}");
}

#[test]
fn cli_render_wav() {
    let dir = TempDir::new().unwrap();
    let script = dir.path().join("sweep.toml");
    let wav = dir.path().join("out").join("sweep.wav");
    std::fs::create_dir_all(wav.parent().unwrap()).unwrap();
    std::fs::write(&script, SWEEP).unwrap();

    let stdout = stdout_of(&[
        "render",
        script.to_str().unwrap(),
        "--output",
        wav.to_str().unwrap(),
    ]);
    assert!(stdout.contains("Wrote 48000 samples"), "{stdout}");

    let reader = hound::WavReader::open(&wav).unwrap();
    let spec = reader.spec();
    assert_eq!(spec.channels, 1);
    assert_eq!(spec.sample_rate, 48000);
    assert_eq!(spec.bits_per_sample, 32);
    assert_eq!(spec.sample_format, hound::SampleFormat::Float);
    assert_eq!(reader.len(), 48000);
}

#[test]
fn cli_render_summary_and_errors() {
    let dir = TempDir::new().unwrap();
    let script = dir.path().join("sweep.toml");
    std::fs::write(&script, SWEEP).unwrap();

    let stdout = stdout_of(&["render", script.to_str().unwrap()]);
    assert!(stdout.contains("Script: sweep"), "{stdout}");
    assert!(stdout.contains("48000 at 48000 Hz"), "{stdout}");

    let output = sonant_bin()
        .args(["render", dir.path().join("missing.toml").to_str().unwrap()])
        .output()
        .expect("failed to run sonant");
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("failed to read file"));
}
