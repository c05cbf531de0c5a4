//! Storage Config

use std::path::PathBuf;

use clap::Args;

use crate::fixtures::DEFAULT_SET;

/// Local storage and fixture settings.
#[derive(Debug, Clone, Args)]
pub struct StorageConfig {
    /// Directory holding the local fallback cache
    #[arg(long, env = "BOUTIQUE_DATA_DIR", default_value = ".boutique")]
    pub data_dir: PathBuf,

    /// Directory holding catalog and coupon fixtures for offline use
    #[arg(long, env = "BOUTIQUE_FIXTURES_DIR", default_value = "fixtures")]
    pub fixtures_dir: PathBuf,

    /// Fixture set to load
    #[arg(long, env = "BOUTIQUE_FIXTURE_SET", default_value = DEFAULT_SET)]
    pub fixture_set: String,
}
