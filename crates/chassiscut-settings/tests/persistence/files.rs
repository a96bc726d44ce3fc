use chassiscut_settings::{PlannerSettings, SettingsError};
use tempfile::TempDir;

fn tuned() -> PlannerSettings {
    let mut settings = PlannerSettings::default();
    settings.synthesis = settings
        .synthesis
        .with_wire_joint_distance(3.5)
        .with_approach_length(8.0)
        .with_wire_joints(false);
    settings.logging.level = "debug".to_string();
    settings.logging.json = true;
    settings
}

#[test]
fn test_toml_round_trip() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("settings.toml");
    let settings = tuned();
    settings.save_to_file(&path).unwrap();

    let text = std::fs::read_to_string(&path).unwrap();
    assert!(text.contains("[synthesis]"));
    assert!(text.contains("[logging]"));

    let loaded = PlannerSettings::load_from_file(&path).unwrap();
    assert_eq!(loaded, settings);
}

#[test]
fn test_json_round_trip() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("settings.json");
    let settings = tuned();
    settings.save_to_file(&path).unwrap();
    let loaded = PlannerSettings::load_from_file(&path).unwrap();
    assert_eq!(loaded, settings);
}

#[test]
fn test_save_creates_parent_directories() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("nested").join("chassiscut").join("settings.toml");
    PlannerSettings::default().save_to_file(&path).unwrap();
    assert!(path.exists());
}

#[test]
fn test_unsupported_extension_rejected() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("settings.yaml");
    let result = PlannerSettings::default().save_to_file(&path);
    assert!(matches!(result, Err(SettingsError::UnsupportedFormat(_))));
    assert!(!path.exists());
}

#[test]
fn test_invalid_file_rejected_on_load() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("settings.json");
    std::fs::write(&path, r#"{ "synthesis": { "approach_length": -1.0 } }"#).unwrap();
    assert!(matches!(
        PlannerSettings::load_from_file(&path),
        Err(SettingsError::Invalid(_))
    ));
}

#[test]
fn test_invalid_settings_not_written() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("settings.toml");
    let mut settings = PlannerSettings::default();
    settings.synthesis.tolerance = 0.0;
    assert!(settings.save_to_file(&path).is_err());
    assert!(!path.exists());
}

#[test]
fn test_missing_file_is_io_error() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("absent.toml");
    assert!(matches!(
        PlannerSettings::load_from_file(&path),
        Err(SettingsError::Io(_))
    ));
}

#[test]
fn test_malformed_toml_is_parse_error() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("settings.toml");
    std::fs::write(&path, "[synthesis\nwire_joint_distance = ").unwrap();
    assert!(matches!(
        PlannerSettings::load_from_file(&path),
        Err(SettingsError::TomlDe(_))
    ));
}
