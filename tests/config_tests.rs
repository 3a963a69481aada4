// SPDX-License-Identifier: GPL-3.0-only

//! Integration tests for configuration module

use photobooth::Config;
use photobooth::backends::camera::CameraSpec;
use photobooth::constants::{export, server};

#[test]
fn test_config_default() {
    let config = Config::default();

    assert_eq!(config.server.port, server::DEFAULT_PORT);
    assert_eq!(config.export.scale, export::SCALE);
    assert_eq!(config.capture.camera, CameraSpec::Auto);
    assert!(config.capture.mirror, "Photos should be mirrored by default");
    assert!(config.validate().is_ok());
}

#[test]
fn test_config_file_roundtrip() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("nested").join("config.json");

    let mut config = Config::default();
    config.server.port = 8080;
    config.capture.camera = CameraSpec::Pattern;
    config.export.caption = "Summer Party".to_string();
    config.save(&path).unwrap();

    let loaded = Config::from_file(&path).unwrap();
    assert_eq!(loaded, config);
}

#[test]
fn test_partial_config_keeps_defaults() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("config.json");
    std::fs::write(&path, r#"{ "server": { "port": 4000 } }"#).unwrap();

    let config = Config::from_file(&path).unwrap();
    assert_eq!(config.server.port, 4000);
    assert_eq!(config.server.host, server::DEFAULT_HOST);
    assert_eq!(config.export.scale, export::SCALE);
}

#[test]
fn test_missing_config_file_is_default() {
    let dir = tempfile::tempdir().unwrap();
    let config = Config::from_file(&dir.path().join("absent.json")).unwrap();
    assert_eq!(config, Config::default());
}

#[test]
fn test_malformed_config_is_an_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("config.json");
    std::fs::write(&path, "{ not json").unwrap();

    assert!(Config::from_file(&path).is_err());
}

#[test]
fn test_serve_port_falls_back_to_config() {
    let mut config = Config::default();
    assert_eq!(config.serve_port(None, None).unwrap(), server::DEFAULT_PORT);

    config.server.port = 5050;
    assert_eq!(config.serve_port(None, Some("")).unwrap(), 5050);
    assert_eq!(config.serve_port(None, Some("7070")).unwrap(), 7070);
}

#[test]
fn test_malformed_port_only_fails_serve() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("config.json");
    std::fs::write(&path, r#"{ "server": { "port": 4000 } }"#).unwrap();

    // Loading never looks at PORT, so list/shoot/the shell start regardless
    let config = Config::load(Some(&path)).unwrap();
    assert_eq!(config.server.port, 4000);

    assert!(config.serve_port(None, Some("not-a-port")).is_err());
    assert_eq!(config.serve_port(Some(8080), Some("not-a-port")).unwrap(), 8080);
}

#[test]
fn test_scale_out_of_range_is_rejected() {
    let mut config = Config::default();
    config.export.scale = 0;
    assert!(config.validate().is_err());

    config.export.scale = export::MAX_SCALE + 1;
    assert!(config.validate().is_err());
}
