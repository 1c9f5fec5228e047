use garmin_strava_sync::config::{ConfigOverrides, StravaAccess, apply_overrides, load_config};
use garmin_strava_sync::sync::UploadErrorPolicy;
use std::time::Duration;
use tempdir::TempDir;

fn write_config(dir: &TempDir, contents: &str) -> std::path::PathBuf {
    let path = dir.path().join("config.toml");
    std::fs::write(&path, contents).expect("Failed to write config");
    path
}

#[test]
fn test_full_config_file() {
    let dir = TempDir::new("gsync_config").expect("Failed to create temp directory");
    let path = write_config(
        &dir,
        r#"
        http_timeout_secs = 30

        [garmin]
        username = "runner@example.com"
        password = "hunter2"

        [strava]
        client_id = 12345
        client_secret = "s3cret"
        callback_port = 9001
        scope = "activity:write"
        authorize_timeout_secs = 120

        [sync]
        private = true
        on_upload_error = "continue"
        "#,
    );

    let config = load_config(Some(&path)).unwrap();

    assert_eq!(config.http_timeout(), Duration::from_secs(30));
    assert_eq!(config.authorize_timeout(), Some(Duration::from_secs(120)));
    assert_eq!(config.strava.callback_port, 9001);
    assert_eq!(config.strava.scope, "activity:write");
    assert_eq!(
        config.strava_access().unwrap(),
        StravaAccess::Authorize {
            client_id: "12345",
            client_secret: "s3cret",
        }
    );
    assert_eq!(
        config.garmin_credentials().unwrap(),
        ("runner@example.com", "hunter2")
    );
    let options = config.sync_options();
    assert!(options.private);
    assert_eq!(options.on_upload_error, UploadErrorPolicy::Continue);
}

#[test]
fn test_positional_credentials_fill_missing_login() {
    let dir = TempDir::new("gsync_config").expect("Failed to create temp directory");
    let path = write_config(
        &dir,
        r#"
        [strava]
        access_token = "cached-token"
        "#,
    );

    let config = load_config(Some(&path)).unwrap();
    assert!(config.garmin_credentials().is_err());

    let config = apply_overrides(
        config,
        &ConfigOverrides {
            username: Some("runner".to_string()),
            password: Some("pw".to_string()),
            authorize_timeout_secs: Some(60),
            ..Default::default()
        },
    );
    assert_eq!(config.garmin_credentials().unwrap(), ("runner", "pw"));
    assert_eq!(config.strava_access().unwrap(), StravaAccess::Token("cached-token"));
    assert_eq!(config.authorize_timeout(), Some(Duration::from_secs(60)));
}

#[test]
fn test_malformed_file_is_an_error() {
    let dir = TempDir::new("gsync_config").expect("Failed to create temp directory");
    let path = write_config(&dir, "[strava\ncallback_port = \"not a port\"");

    let err = load_config(Some(&path)).unwrap_err();
    assert!(format!("{err:#}").contains("config.toml"));
}
