//! `IRIS_*` environment overrides for settings
//!
//! Kept in its own test binary: it mutates the process environment.

use iris_trainer::Settings;
use std::io::Write;
use std::path::PathBuf;
use tempfile::Builder;

#[test]
fn test_environment_overrides_file_and_defaults() {
    let mut file = Builder::new().suffix(".toml").tempfile().unwrap();
    writeln!(file, "model_dir = \"/from/file/models\"").unwrap();
    writeln!(file, "metadata_dir = \"/from/file/metadata\"").unwrap();
    file.flush().unwrap();

    std::env::set_var("IRIS_METADATA_DIR", "/from/env/metadata");
    std::env::set_var("IRIS_DATA_TRANSFORMED_DIR", "/from/env/data");
    let with_file = Settings::load(Some(file.path()));
    let without_file = Settings::load(None);
    std::env::remove_var("IRIS_METADATA_DIR");
    std::env::remove_var("IRIS_DATA_TRANSFORMED_DIR");

    let with_file = with_file.unwrap();
    assert_eq!(with_file.model_dir, PathBuf::from("/from/file/models"));
    assert_eq!(with_file.metadata_dir, PathBuf::from("/from/env/metadata"));
    assert_eq!(with_file.data_transformed_dir, PathBuf::from("/from/env/data"));

    let without_file = without_file.unwrap();
    assert_eq!(without_file.model_dir, Settings::default().model_dir);
    assert_eq!(without_file.metadata_dir, PathBuf::from("/from/env/metadata"));
}
