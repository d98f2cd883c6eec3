//! Run metadata recorder for trained regression models
//!
//! Assembles a structured description of one training run and persists it
//! next to the model artifact it describes.
//!
//! Modules:
//! - `record`: the `ModelRecord` entity and its save path
//! - `value`: variant-valued entries for `extra_metadata`
//! - `naming`: artifact stem <-> metadata file name convention
//! - `serialization`: canonical JSON helpers
//! - `errors`: error types

pub mod errors;
pub mod naming;
pub mod record;
pub mod serialization;
pub mod value;

pub use errors::{MetadataError, Result};
pub use naming::{metadata_file_name, model_stem, model_stem_from_metadata_file, METADATA_SUFFIX};
pub use record::{
    DescribeModel, FeatureImportance, MetadataDocument, ModelRecord, RecordSpec, RecordState,
    RECORD_VERSION,
};
pub use value::MetadataValue;

/// Crate version string, embedded in log lines.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
