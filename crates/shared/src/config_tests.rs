//! Configuration loading tests.

use std::path::PathBuf;

use crate::config::{AppConfig, StorageProvider};

const BASE_VARS: [(&str, Option<&str>); 3] = [
    ("IMGRELAY__JWT__SECRET", Some("s3cret")),
    ("IMGRELAY__UPLOAD__DEFAULT_BUCKET", Some("photos")),
    (
        "IMGRELAY__UPLOAD__PUBLIC_URL_TEMPLATE",
        Some("https://storage.googleapis.com/{{BUCKET_NAME}}/{{FILENAME}}"),
    ),
];

#[test]
fn test_load_applies_defaults() {
    let mut vars = BASE_VARS.to_vec();
    vars.push(("IMGRELAY__STORAGE__TYPE", Some("memory")));

    temp_env::with_vars(vars, || {
        let config = AppConfig::load().expect("config should load");

        assert_eq!(config.server.host, "0.0.0.0");
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.server.max_body_bytes, 16 * 1024 * 1024);
        assert_eq!(config.jwt.secret, "s3cret");
        assert_eq!(config.jwt.access_token_expiry_secs, 900);
        assert_eq!(config.upload.default_bucket, "photos");
        assert_eq!(config.upload.default_timezone, "UTC");
        assert_eq!(config.upload.max_download_bytes, 10 * 1024 * 1024);
        assert!(config.upload.fetch_timeout_secs.is_none());
        assert!(matches!(config.storage, StorageProvider::Memory));
    });
}

#[test]
fn test_load_reads_overrides() {
    let mut vars = BASE_VARS.to_vec();
    vars.extend([
        ("IMGRELAY__SERVER__PORT", Some("9090")),
        ("IMGRELAY__UPLOAD__DEFAULT_TIMEZONE", Some("Asia/Jakarta")),
        ("IMGRELAY__UPLOAD__FETCH_TIMEOUT_SECS", Some("30")),
        ("IMGRELAY__STORAGE__TYPE", Some("local_fs")),
        ("IMGRELAY__STORAGE__ROOT", Some("/var/lib/imgrelay")),
    ]);

    temp_env::with_vars(vars, || {
        let config = AppConfig::load().expect("config should load");

        assert_eq!(config.server.port, 9090);
        assert_eq!(config.upload.default_timezone, "Asia/Jakarta");
        assert_eq!(config.upload.fetch_timeout_secs, Some(30));
        match config.storage {
            StorageProvider::LocalFs { root } => {
                assert_eq!(root, PathBuf::from("/var/lib/imgrelay"));
            }
            other => panic!("unexpected provider: {other:?}"),
        }
    });
}

#[test]
fn test_load_fails_without_bucket() {
    temp_env::with_vars(
        [
            ("IMGRELAY__JWT__SECRET", Some("s3cret")),
            ("IMGRELAY__UPLOAD__DEFAULT_BUCKET", None),
            (
                "IMGRELAY__UPLOAD__PUBLIC_URL_TEMPLATE",
                Some("https://cdn/{{BUCKET_NAME}}/{{FILENAME}}"),
            ),
            ("IMGRELAY__STORAGE__TYPE", Some("memory")),
        ],
        || {
            assert!(AppConfig::load().is_err());
        },
    );
}

#[test]
fn test_storage_provider_names() {
    assert_eq!(StorageProvider::gcs(None).name(), "gcs");
    assert_eq!(
        StorageProvider::s3("https://r2.example", "key", "secret", "auto").name(),
        "s3"
    );
    assert_eq!(StorageProvider::local_fs("./storage").name(), "local");
    assert_eq!(StorageProvider::Memory.name(), "memory");
}

#[test]
fn test_load_gcs_without_acl() {
    let mut vars = BASE_VARS.to_vec();
    vars.extend([
        ("IMGRELAY__STORAGE__TYPE", Some("gcs")),
        ("IMGRELAY__STORAGE__PREDEFINED_ACL", None),
    ]);

    temp_env::with_vars(vars, || {
        let config = AppConfig::load().expect("config should load");

        assert_eq!(config.storage.name(), "gcs");
        assert_eq!(config.storage.predefined_acl(), None);
    });
}

#[test]
fn test_load_gcs_with_acl() {
    let mut vars = BASE_VARS.to_vec();
    vars.extend([
        ("IMGRELAY__STORAGE__TYPE", Some("gcs")),
        ("IMGRELAY__STORAGE__PREDEFINED_ACL", Some("publicRead")),
    ]);

    temp_env::with_vars(vars, || {
        let config = AppConfig::load().expect("config should load");

        assert_eq!(config.storage.predefined_acl(), Some("publicRead"));
    });
}

#[test]
fn test_predefined_acl_only_applies_to_gcs() {
    assert_eq!(StorageProvider::gcs(None).predefined_acl(), None);
    assert_eq!(
        StorageProvider::gcs(None)
            .with_predefined_acl("publicRead")
            .predefined_acl(),
        Some("publicRead")
    );
    assert_eq!(
        StorageProvider::local_fs("./storage")
            .with_predefined_acl("publicRead")
            .predefined_acl(),
        None
    );
}
