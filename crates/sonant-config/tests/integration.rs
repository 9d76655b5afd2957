//! File-level tests for context settings and automation scripts.

use sonant_config::{
    AutomationScript, AutomationStep, ConfigError, ContextConfig, ValidationError,
};
use sonant_core::{Time, Units, Value};
use tempfile::TempDir;

#[test]
fn context_config_save_load_roundtrip() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("nested").join("context.toml");

    let config = ContextConfig {
        sample_rate: 96000,
        bpm: 174.0,
        beats_per_bar: 4.0,
        ppq: 192.0,
    };
    config.save(&path).unwrap();
    assert!(path.exists());

    let loaded = ContextConfig::load(&path).unwrap();
    assert_eq!(loaded, config);
}

#[test]
fn missing_file_is_read_error() {
    let dir = TempDir::new().unwrap();
    let err = AutomationScript::load(dir.path().join("absent.toml")).unwrap_err();
    assert!(matches!(err, ConfigError::ReadFile { .. }));
}

#[test]
fn script_save_load_render() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("sweep.toml");

    let mut script = AutomationScript::new("sweep", "2n")
        .with_units(Units::Frequency)
        .with_initial(100.0);
    script.description = "octave sweep".to_string();
    script.push(AutomationStep::RampTo {
        value: Value::from(200.0),
        duration: Time::from("2n"),
    });
    script.save(&path).unwrap();

    let loaded = AutomationScript::load(&path).unwrap();
    assert_eq!(loaded, script);

    let config = ContextConfig {
        sample_rate: 1000,
        ..ContextConfig::default()
    };
    // 2n at 120 bpm is one second.
    let out = loaded.render(&config).unwrap();
    assert_eq!(out.len(), 1000);
    assert!((out[0] - 100.0).abs() < 1e-9);
    // Frequency ramps are exponential: halfway in time is the geometric mean.
    let expected = (100.0_f64 * 200.0).sqrt();
    assert!((out[500] - expected).abs() < 1e-6, "{}", out[500]);
}

#[test]
fn tempo_from_config_drives_musical_time() {
    let script = AutomationScript::from_toml(
        r#"
name = "gate"
duration = "1m"

[[events]]
type = "set"
value = 1.0
time = "4n"
"#,
    )
    .unwrap();

    let slow = ContextConfig {
        sample_rate: 100,
        bpm: 60.0,
        ..ContextConfig::default()
    };
    // One measure of 4/4 at 60 bpm is four seconds; the step lands at one.
    let out = script.render(&slow).unwrap();
    assert_eq!(out.len(), 400);
    assert_eq!(out[99], 0.0);
    assert_eq!(out[100], 1.0);
}

#[test]
fn cancel_step_reverts_to_resting_value() {
    let script = AutomationScript::from_toml(
        r#"
name = "undo"
initial = 0.25
duration = 1.0

[[events]]
type = "set"
value = 0.75
time = 0.5

[[events]]
type = "cancel"
time = 0.5
"#,
    )
    .unwrap();

    let out = script
        .render(&ContextConfig {
            sample_rate: 10,
            ..ContextConfig::default()
        })
        .unwrap();
    assert!(out.iter().all(|&s| s == 0.25));
}

#[test]
fn invalid_script_reports_every_problem() {
    let script = AutomationScript::from_toml(
        r#"
name = "broken"
duration = 0

[[events]]
type = "curve"
values = []
time = "later"
duration = 1.0
"#,
    )
    .unwrap();

    let err = script.render(&ContextConfig::default()).unwrap_err();
    match err {
        ConfigError::Validation(ValidationError::Multiple(errors)) => {
            assert_eq!(errors.len(), 3, "{errors:?}");
        }
        other => panic!("expected aggregated validation errors, got {other}"),
    }
}
