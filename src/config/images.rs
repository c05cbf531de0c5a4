//! Image Config

use clap::Args;

use crate::products::{ImagePolicy, PLACEHOLDER_IMAGE};

/// Product image settings.
#[derive(Debug, Clone, Args)]
pub struct ImagesConfig {
    /// Base URL relative image paths are served from
    #[arg(long, env = "IMAGE_BASE_URL", default_value = "http://localhost:5000")]
    pub image_base_url: String,

    /// Image shown when a product has none
    #[arg(long, env = "PLACEHOLDER_IMAGE", default_value = PLACEHOLDER_IMAGE)]
    pub placeholder_image: String,
}

impl ImagesConfig {
    /// Image policy for these settings.
    #[must_use]
    pub fn policy(&self) -> ImagePolicy {
        ImagePolicy::new(&self.image_base_url, &self.placeholder_image)
    }
}
