use figment::providers::{Format, Serialized};
use fileworker::config::{CliOverrides, ConfigError, Settings};
use fileworker::scanner::HashAlgorithm;
use std::fs;
use std::path::PathBuf;
use tempfile::tempdir;

#[test]
fn test_settings_load_defaults() {
    // Use figment directly without Env to avoid interference from other tests
    let figment = figment::Figment::from(Serialized::defaults(Settings::default()));
    let settings: Settings = figment.extract().unwrap();
    assert_eq!(settings.source_path, PathBuf::from("."));
    assert_eq!(settings.workers, 10);
    assert_eq!(settings.random_copy_iterations, 10);
    assert_eq!(settings.copy_buffer_size, 512);
    assert!(!settings.delete_duplicates);
    assert!(!settings.random_copy);
    assert!(!settings.unattended);
    assert_eq!(settings.hash_algorithm, HashAlgorithm::Sha256);
}

#[test]
fn test_settings_load_from_env() {
    std::env::set_var("FILEWORKER_RANDOM_COPY_ITERATIONS", "33");
    std::env::set_var("FILEWORKER_HASH_ALGORITHM", "blake3");

    use figment::{providers::Env, Figment};
    let figment = Figment::from(Serialized::defaults(Settings::default()))
        .merge(Env::prefixed("FILEWORKER_").split("__"));

    let settings: Settings = figment.extract().unwrap();

    assert_eq!(settings.random_copy_iterations, 33);
    assert_eq!(settings.hash_algorithm, HashAlgorithm::Blake3);

    std::env::remove_var("FILEWORKER_RANDOM_COPY_ITERATIONS");
    std::env::remove_var("FILEWORKER_HASH_ALGORITHM");
}

#[test]
fn test_settings_load_from_toml() {
    let temp_dir = tempdir().unwrap();
    let config_path = temp_dir.path().join("fileworker.toml");

    let toml_content = r#"
source_path = "/srv/share"
workers = 3
copy_buffer_size = 4096
delete_duplicates = true
"#;
    fs::write(&config_path, toml_content).unwrap();

    let settings = Settings::load(Some(&config_path), &CliOverrides::default()).unwrap();

    assert_eq!(settings.source_path, PathBuf::from("/srv/share"));
    assert_eq!(settings.workers, 3);
    assert_eq!(settings.copy_buffer_size, 4096);
    assert!(settings.delete_duplicates);
    assert!(!settings.random_copy);
}

#[test]
fn test_cli_overrides_beat_config_file() {
    let temp_dir = tempdir().unwrap();
    let config_path = temp_dir.path().join("fileworker.toml");
    fs::write(&config_path, "workers = 3\nunattended = true\n").unwrap();

    let overrides = CliOverrides {
        workers: Some(7),
        source_path: Some(PathBuf::from("/data")),
        ..CliOverrides::default()
    };
    let settings = Settings::load(Some(&config_path), &overrides).unwrap();

    assert_eq!(settings.workers, 7);
    assert_eq!(settings.source_path, PathBuf::from("/data"));
    // Not given on the command line, so the file value stands.
    assert!(settings.unattended);
}

#[test]
fn test_invalid_toml_is_an_error() {
    let temp_dir = tempdir().unwrap();
    let config_path = temp_dir.path().join("fileworker.toml");
    fs::write(&config_path, "workers = [not toml").unwrap();

    let result = Settings::load(Some(&config_path), &CliOverrides::default());
    assert!(matches!(result, Err(ConfigError::Figment(_))));
}

#[test]
fn test_zero_workers_in_file_is_rejected() {
    let temp_dir = tempdir().unwrap();
    let config_path = temp_dir.path().join("fileworker.toml");
    fs::write(&config_path, "workers = 0\n").unwrap();

    let result = Settings::load(Some(&config_path), &CliOverrides::default());
    match result {
        Err(ConfigError::InvalidValue { field, .. }) => assert_eq!(field, "workers"),
        other => panic!("expected InvalidValue, got {other:?}"),
    }
}

#[test]
fn test_missing_explicit_config_file_is_ignored() {
    let temp_dir = tempdir().unwrap();
    let config_path = temp_dir.path().join("absent.toml");

    let overrides = CliOverrides {
        workers: Some(2),
        ..CliOverrides::default()
    };
    let settings = Settings::load(Some(&config_path), &overrides).unwrap();
    assert_eq!(settings.workers, 2);
}

#[test]
fn test_rendered_settings_round_trip_through_file() {
    let temp_dir = tempdir().unwrap();
    let config_path = temp_dir.path().join("fileworker.toml");

    let original = Settings {
        workers: 4,
        random_copy: true,
        hash_algorithm: HashAlgorithm::Blake3,
        ..Settings::default()
    };
    fs::write(&config_path, original.to_toml().unwrap()).unwrap();

    let figment = figment::Figment::from(Serialized::defaults(Settings::default()))
        .merge(figment::providers::Toml::file(&config_path));
    let loaded: Settings = figment.extract().unwrap();

    assert_eq!(loaded.workers, 4);
    assert!(loaded.random_copy);
    assert_eq!(loaded.hash_algorithm, HashAlgorithm::Blake3);
}
