//! Integration tests for flexspace-core infrastructure

use flexspace_core::validation::{page_request, validate_new_room};
use flexspace_core::{
    config_error, init_logging, FlexSpaceConfig, FlexSpaceError, LogFormat, LoggingConfig,
    NewRoom, RoomType,
};

#[test]
fn test_config_file_roundtrip() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("flexspace.toml");

    let mut config = FlexSpaceConfig::default();
    config.server.port = 4100;
    config.database.url = Some("sqlite://flexspace.db".to_string());
    config.auth.admin_email = Some("root@flexspace.local".to_string());
    config.auth.admin_password = Some("supersecret".to_string());
    config.logging.format = LogFormat::Json;
    config.save_to_file(&path).unwrap();

    let loaded = FlexSpaceConfig::from_file(&path).unwrap();
    assert_eq!(loaded.server.port, 4100);
    assert_eq!(loaded.database.url.as_deref(), Some("sqlite://flexspace.db"));
    assert_eq!(loaded.logging.format, LogFormat::Json);
    assert!(loaded.validate().is_ok());
}

#[test]
fn test_partial_config_file_uses_defaults() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("partial.toml");
    std::fs::write(&path, "[server]\nport = 9000\n").unwrap();

    let loaded = FlexSpaceConfig::from_file(&path).unwrap();
    assert_eq!(loaded.server.port, 9000);
    assert_eq!(loaded.server.host, "127.0.0.1");
    assert_eq!(loaded.auth.access_ttl_secs, 900);
    assert!(loaded.database.url.is_none());
}

#[test]
fn test_missing_config_file_is_config_error() {
    let err = FlexSpaceConfig::from_file("/definitely/not/here.toml").unwrap_err();
    assert!(matches!(err, FlexSpaceError::Config { .. }));
    assert_eq!(err.http_status(), 500);
}

#[test]
fn test_validation_errors_are_bad_requests() {
    let room = NewRoom {
        slug: "Bad Slug".to_string(),
        name: "Loft".to_string(),
        room_type: RoomType::Meeting,
        capacity: 6,
        price_hour: 20.0,
        description: None,
        amenities: vec![],
    };
    let err = validate_new_room(&room).unwrap_err();
    assert_eq!(err.http_status(), 400);
    assert_eq!(err.code(), "bad_request");

    let err = page_request(Some(1), Some(500)).unwrap_err();
    assert!(err.to_string().contains("limit"));
}

#[test]
fn test_logging_initialization() {
    let config = LoggingConfig {
        format: LogFormat::Compact,
        ..LoggingConfig::quiet()
    };
    // A second install in the same process reports an error instead of panicking.
    let _ = init_logging(&config);
    assert!(init_logging(&config).is_err());

    config_error!("logged after init").log();
}
