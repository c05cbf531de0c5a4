//! Storefront configuration

use clap::Args;

pub mod images;
pub mod logging;
pub mod pricing;
pub mod remote;
pub mod storage;

pub use images::ImagesConfig;
pub use logging::{LogFormat, LoggingConfig};
pub use pricing::PricingConfig;
pub use remote::RemoteConfig;
pub use storage::StorageConfig;

/// Everything needed to build a [`StoreContext`](crate::context::StoreContext).
#[derive(Debug, Clone, Args)]
pub struct StorefrontConfig {
    /// Acting user; the guest identity when omitted
    #[arg(short, long, env = "BOUTIQUE_USER", global = true)]
    pub user: Option<String>,

    /// Remote commerce API settings.
    #[command(flatten)]
    pub remote: RemoteConfig,

    /// Product image settings.
    #[command(flatten)]
    pub images: ImagesConfig,

    /// Local storage and fixture settings.
    #[command(flatten)]
    pub storage: StorageConfig,

    /// Tax and shipping settings.
    #[command(flatten)]
    pub pricing: PricingConfig,

    /// Logging output settings.
    #[command(flatten)]
    pub logging: LoggingConfig,
}
