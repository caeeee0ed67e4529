use ccse_study::config::{
    Config, DatasetConfig, ExportConfig, FeatureConfig, LoggingConfig, StorageConfig,
};
use ccse_study::{DatasetSource, SqliteStore};
use std::path::PathBuf;

fn config(storage_url: &str, dataset_source: &str) -> Config {
    Config {
        dataset: DatasetConfig {
            source: dataset_source.to_string(),
        },
        storage: StorageConfig {
            url: storage_url.to_string(),
        },
        features: FeatureConfig::default(),
        export: ExportConfig {
            directory: PathBuf::from("."),
        },
        logging: LoggingConfig {
            level: "info,ccse_study=debug".to_string(),
            file_enabled: false,
            console_enabled: true,
            log_directory: "logs".to_string(),
        },
    }
}

#[test]
fn test_premium_is_enabled_by_default() {
    assert!(FeatureConfig::default().premium_enabled);
}

#[test]
fn test_validation_accepts_defaults() {
    let config = config("sqlite:ccse_study.db", "public/data/data-25.json");
    assert!(config.validate().is_ok());
}

#[test]
fn test_validation_rejects_bad_values() {
    let cases = vec![
        ("postgres://localhost/ccse", "public/data/data-25.json"),
        ("ccse_study.db", "public/data/data-25.json"),
        ("sqlite:ccse_study.db", "   "),
    ];

    for (storage_url, dataset_source) in cases {
        let config = config(storage_url, dataset_source);
        assert!(
            config.validate().is_err(),
            "'{}' / '{}' should be rejected",
            storage_url,
            dataset_source
        );
    }
}

#[test]
fn test_unknown_log_level_only_warns() {
    let mut config = config("sqlite::memory:", "public/data/data-25.json");
    config.logging.level = "verbose".to_string();
    assert!(config.validate().is_ok());
}

#[test]
fn test_dataset_source_kinds() {
    let source = config("sqlite::memory:", "https://example.org/data/data-25.json").dataset.source;
    assert!(matches!(DatasetSource::parse(&source), DatasetSource::Url(_)));

    let source = config("sqlite::memory:", "public/data/data-25.json").dataset.source;
    assert!(matches!(DatasetSource::parse(&source), DatasetSource::File(_)));
}

#[tokio::test]
async fn test_configured_storage_url_opens() {
    let dir = tempfile::tempdir().unwrap();
    let url = format!("sqlite:{}", dir.path().join("ccse_study.db").display());
    let config = config(&url, "public/data/data-25.json");
    config.validate().unwrap();

    assert!(SqliteStore::new(&config.storage.url).await.is_ok());
    assert!(dir.path().join("ccse_study.db").exists());
}
