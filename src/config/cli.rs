use crate::config::{MigrationConfig, TomlConfig};
use crate::domain::model::StorageClass;
use crate::utils::error::Result;
use clap::Parser;
use std::path::PathBuf;
use std::time::Duration;

#[derive(Debug, Clone, Default, Parser)]
#[command(name = "ebs-class-migrator")]
#[command(about = "Migrate the EBS volumes of a cluster's instances to a new volume type")]
pub struct CliConfig {
    /// TOML configuration file; flags override its values
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// AWS region (default: us-east-1)
    #[arg(long, env = "AWS_REGION")]
    pub region: Option<String>,

    /// Shared credentials profile
    #[arg(long, env = "AWS_PROFILE")]
    pub profile: Option<String>,

    /// Override the EC2/STS endpoint, e.g. for LocalStack
    #[arg(long)]
    pub endpoint_url: Option<String>,

    /// Cluster whose instances are migrated
    #[arg(long, env = "CLUSTER_NAME")]
    pub cluster_name: Option<String>,

    #[arg(long)]
    pub ownership_tag_prefix: Option<String>,

    /// Volume type to migrate from (default: gp2)
    #[arg(long)]
    pub source_class: Option<String>,

    /// Volume type to migrate to (default: gp3)
    #[arg(long)]
    pub target_class: Option<String>,

    #[arg(long)]
    pub iops_warning_threshold: Option<i32>,

    /// Seconds between modification status polls (default: 15)
    #[arg(long)]
    pub poll_interval_secs: Option<u64>,

    /// Give up waiting on a single volume after this many seconds
    #[arg(long)]
    pub max_wait_secs: Option<u64>,

    /// Log the planned modifications without issuing them
    #[arg(long)]
    pub dry_run: bool,

    /// Write the run report as JSON to this path
    #[arg(long)]
    pub report_json: Option<PathBuf>,

    #[arg(long, help = "Emit logs as JSON lines")]
    pub json_logs: bool,

    #[arg(short, long, help = "Enable verbose output")]
    pub verbose: bool,
}

impl CliConfig {
    /// Merges defaults, the optional config file, and flags, in that order.
    pub fn resolve(&self) -> Result<MigrationConfig> {
        let base = match &self.config {
            Some(path) => {
                tracing::info!("📁 Loading configuration from: {}", path.display());
                TomlConfig::from_file(path)?.into_migration_config()
            }
            None => MigrationConfig::default(),
        };
        Ok(self.apply_to(base))
    }

    fn apply_to(&self, mut config: MigrationConfig) -> MigrationConfig {
        if let Some(region) = &self.region {
            config.region = region.clone();
        }
        if let Some(profile) = &self.profile {
            config.profile = Some(profile.clone());
        }
        if let Some(endpoint) = &self.endpoint_url {
            config.endpoint_url = Some(endpoint.clone());
        }
        if let Some(name) = &self.cluster_name {
            config.cluster_name = name.clone();
        }
        if let Some(prefix) = &self.ownership_tag_prefix {
            config.ownership_tag_prefix = prefix.clone();
        }
        if let Some(class) = &self.source_class {
            config.source_class = StorageClass::from(class.as_str());
        }
        if let Some(class) = &self.target_class {
            config.target_class = StorageClass::from(class.as_str());
        }
        if let Some(threshold) = self.iops_warning_threshold {
            config.iops_warning_threshold = threshold;
        }
        if let Some(secs) = self.poll_interval_secs {
            config.poll_interval = Duration::from_secs(secs);
        }
        if let Some(secs) = self.max_wait_secs {
            config.max_wait = Some(Duration::from_secs(secs));
        }
        if self.dry_run {
            config.dry_run = true;
        }
        config
    }
}
