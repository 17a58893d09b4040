// Configuration tests
// Author: Gabriel Demetrios Lafis

mod common;

use std::fs;

use tempfile::tempdir;

use datalexir::{recording::RecordingProxy, utils::AppError, Config};

use common::people;

#[test]
fn test_defaults() {
    let config = Config::default();

    assert_eq!(config.session.sample_ratio, 0.3);
    assert_eq!(config.session.seed, None);
    assert_eq!(config.pipeline.format, "json");
    assert_eq!(config.log_level_filter(), log::LevelFilter::Info);
    assert!(config.validate().is_ok());
}

#[test]
fn test_partial_yaml_file_fills_in_defaults() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("datalexir.yaml");
    fs::write(
        &path,
        "session:\n  sample_ratio: 0.5\n  seed: 7\nlogging:\n  level: debug\n",
    )
    .unwrap();

    let config = Config::from_file(&path).unwrap();

    assert_eq!(config.session.sample_ratio, 0.5);
    assert_eq!(config.session.seed, Some(7));
    assert_eq!(config.pipeline.name, "pipeline");
    assert_eq!(config.log_level_filter(), log::LevelFilter::Debug);

    let proxy = RecordingProxy::from_config(people(), &config.session).unwrap();
    assert_eq!(proxy.sample().len(), 5);
}

#[test]
fn test_json_file() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("datalexir.json");
    fs::write(&path, r#"{"pipeline": {"name": "cleanup", "format": "yaml"}}"#).unwrap();

    let config = Config::from_file(&path).unwrap();

    assert_eq!(config.pipeline.name, "cleanup");
    assert_eq!(config.pipeline.format, "yaml");
    assert_eq!(config.session.sample_ratio, 0.3);
}

#[test]
fn test_invalid_values_are_rejected() {
    let dir = tempdir().unwrap();

    let ratio = dir.path().join("ratio.yaml");
    fs::write(&ratio, "session:\n  sample_ratio: 0.0\n").unwrap();
    assert!(matches!(Config::from_file(&ratio), Err(AppError::Config(_))));

    let format = dir.path().join("format.json");
    fs::write(&format, r#"{"pipeline": {"format": "xml"}}"#).unwrap();
    assert!(matches!(Config::from_file(&format), Err(AppError::Config(_))));

    let extension = dir.path().join("config.toml");
    fs::write(&extension, "").unwrap();
    assert!(matches!(Config::from_file(&extension), Err(AppError::Config(_))));

    let broken = dir.path().join("broken.json");
    fs::write(&broken, "{").unwrap();
    assert!(matches!(Config::from_file(&broken), Err(AppError::Serialization(_))));
}
