pub mod adapters;
pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

#[cfg(feature = "cli")]
pub use config::CliConfig;

pub use adapters::AwsProvider;
pub use config::{MigrationConfig, TomlConfig};
pub use core::migrator::VolumeMigrator;
pub use domain::model::{MigrationReport, StorageClass, VolumeOutcome};
pub use domain::ports::CloudProvider;
pub use utils::error::{MigrationError, ProviderError, Result};
