//! Naming convention linking a model artifact to its metadata file.
//!
//! The metadata file carries the artifact's file stem, so either file can be
//! located from the other's name:
//!
//! ```text
//! models/iris_rf.json  <->  models/metadata/iris_rf.metadata.json
//! ```

use std::path::Path;

/// Suffix appended to the model stem to form the metadata file name
pub const METADATA_SUFFIX: &str = ".metadata.json";

/// Metadata file name for a model stem (`iris_rf` -> `iris_rf.metadata.json`)
pub fn metadata_file_name(model_stem: &str) -> String {
    format!("{model_stem}{METADATA_SUFFIX}")
}

/// File stem of a model artifact path (`models/iris_rf.json` -> `iris_rf`)
pub fn model_stem(model_location: &Path) -> Option<&str> {
    model_location.file_stem().and_then(|stem| stem.to_str())
}

/// Recover the model stem from a metadata file name
pub fn model_stem_from_metadata_file(file_name: &str) -> Option<&str> {
    file_name
        .strip_suffix(METADATA_SUFFIX)
        .filter(|stem| !stem.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn metadata_name_is_derived_from_stem() {
        assert_eq!(metadata_file_name("iris_rf"), "iris_rf.metadata.json");
        assert_eq!(metadata_file_name("iris_rf"), metadata_file_name("iris_rf"));
    }

    #[test]
    fn stem_round_trips_through_metadata_name() {
        let stem = model_stem(Path::new("models/iris_rf.json")).unwrap();
        assert_eq!(stem, "iris_rf");
        assert_eq!(
            model_stem_from_metadata_file(&metadata_file_name(stem)),
            Some("iris_rf")
        );
    }

    #[test]
    fn foreign_names_have_no_stem() {
        assert_eq!(model_stem_from_metadata_file("iris_rf.json"), None);
        assert_eq!(model_stem_from_metadata_file(METADATA_SUFFIX), None);
    }
}
