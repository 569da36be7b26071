#[cfg(feature = "cli")]
pub mod cli;
pub mod toml_config;

#[cfg(feature = "cli")]
pub use cli::CliConfig;
pub use toml_config::TomlConfig;

use crate::domain::model::StorageClass;
use crate::utils::error::{MigrationError, Result};
use crate::utils::validation::{self, Validate};
use std::time::Duration;

pub const DEFAULT_REGION: &str = "us-east-1";
pub const DEFAULT_OWNERSHIP_TAG_PREFIX: &str = "kubernetes.io/cluster/";
pub const DEFAULT_IOPS_WARNING_THRESHOLD: i32 = 3000;
pub const DEFAULT_POLL_INTERVAL_SECS: u64 = 15;

/// Fully resolved settings for one run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MigrationConfig {
    pub region: String,
    /// Shared-credentials profile; `None` uses the default credential chain.
    pub profile: Option<String>,
    pub endpoint_url: Option<String>,
    pub cluster_name: String,
    pub ownership_tag_prefix: String,
    pub source_class: StorageClass,
    pub target_class: StorageClass,
    pub iops_warning_threshold: i32,
    pub poll_interval: Duration,
    /// `None` waits for as long as the modification takes.
    pub max_wait: Option<Duration>,
    pub dry_run: bool,
}

impl Default for MigrationConfig {
    fn default() -> Self {
        Self {
            region: DEFAULT_REGION.to_string(),
            profile: None,
            endpoint_url: None,
            cluster_name: String::new(),
            ownership_tag_prefix: DEFAULT_OWNERSHIP_TAG_PREFIX.to_string(),
            source_class: StorageClass::Gp2,
            target_class: StorageClass::Gp3,
            iops_warning_threshold: DEFAULT_IOPS_WARNING_THRESHOLD,
            poll_interval: Duration::from_secs(DEFAULT_POLL_INTERVAL_SECS),
            max_wait: None,
            dry_run: false,
        }
    }
}

impl MigrationConfig {
    pub fn for_cluster(cluster_name: impl Into<String>) -> Self {
        Self {
            cluster_name: cluster_name.into(),
            ..Self::default()
        }
    }

    /// `tag:Name` filter value used for instance discovery.
    pub fn name_filter(&self) -> String {
        format!("*{}*", self.cluster_name)
    }

    /// Tag key prefix that marks an instance as owned by the cluster.
    pub fn ownership_tag(&self) -> String {
        format!("{}{}", self.ownership_tag_prefix, self.cluster_name)
    }
}

impl Validate for MigrationConfig {
    fn validate(&self) -> Result<()> {
        if self.cluster_name.is_empty() {
            return Err(MigrationError::MissingConfigError {
                field: "cluster.name".to_string(),
            });
        }
        validation::validate_cluster_name("cluster.name", &self.cluster_name)?;
        validation::validate_non_empty_string(
            "cluster.ownership_tag_prefix",
            &self.ownership_tag_prefix,
        )?;
        validation::validate_aws_region("aws.region", &self.region)?;

        if let Some(profile) = &self.profile {
            validation::validate_non_empty_string("aws.profile", profile)?;
        }
        if let Some(endpoint) = &self.endpoint_url {
            validation::validate_url("aws.endpoint_url", endpoint)?;
        }

        for (field, class) in [
            ("migration.source_class", &self.source_class),
            ("migration.target_class", &self.target_class),
        ] {
            if !class.is_known() {
                return Err(MigrationError::InvalidConfigValueError {
                    field: field.to_string(),
                    value: class.to_string(),
                    reason: "Unknown EBS volume type".to_string(),
                });
            }
        }
        if self.source_class == self.target_class {
            return Err(MigrationError::InvalidConfigValueError {
                field: "migration.target_class".to_string(),
                value: self.target_class.to_string(),
                reason: "Target class must differ from source class".to_string(),
            });
        }

        validation::validate_range(
            "migration.iops_warning_threshold",
            self.iops_warning_threshold,
            0,
            256_000,
        )?;
        validation::validate_range(
            "migration.poll_interval_seconds",
            self.poll_interval.as_secs(),
            1,
            3600,
        )?;
        if let Some(max_wait) = self.max_wait {
            validation::validate_positive_number(
                "migration.max_wait_seconds",
                max_wait.as_secs(),
                self.poll_interval.as_secs(),
            )?;
        }

        tracing::debug!("Configuration validation passed");
        Ok(())
    }
}
