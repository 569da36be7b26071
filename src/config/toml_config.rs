use crate::config::MigrationConfig;
use crate::domain::model::StorageClass;
use crate::utils::error::{MigrationError, Result};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::OnceLock;
use std::time::Duration;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TomlConfig {
    #[serde(default)]
    pub aws: AwsConfig,
    #[serde(default)]
    pub cluster: ClusterConfig,
    #[serde(default)]
    pub migration: MigrationSection,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AwsConfig {
    pub region: Option<String>,
    pub profile: Option<String>,
    pub endpoint_url: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ClusterConfig {
    pub name: Option<String>,
    pub ownership_tag_prefix: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct MigrationSection {
    pub source_class: Option<String>,
    pub target_class: Option<String>,
    pub iops_warning_threshold: Option<i32>,
    pub poll_interval_seconds: Option<u64>,
    pub max_wait_seconds: Option<u64>,
    pub dry_run: Option<bool>,
}

fn env_var_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"\$\{([A-Za-z_][A-Za-z0-9_]*)\}").expect("static regex"))
}

impl TomlConfig {
    /// Loads and parses a TOML config file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path).map_err(MigrationError::IoError)?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        let processed_content = Self::substitute_env_vars(content);

        toml::from_str(&processed_content).map_err(|e| MigrationError::ConfigError {
            message: format!("TOML parsing error: {}", e),
        })
    }

    /// Replaces `${VAR}` with the variable's value. Unset variables are left as written.
    fn substitute_env_vars(content: &str) -> String {
        env_var_pattern()
            .replace_all(content, |caps: &regex::Captures| {
                let var_name = &caps[1];
                std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
            })
            .into_owned()
    }

    /// Lays the file's values over `base`.
    pub fn apply_to(&self, mut base: MigrationConfig) -> MigrationConfig {
        if let Some(region) = &self.aws.region {
            base.region = region.clone();
        }
        if let Some(profile) = &self.aws.profile {
            base.profile = Some(profile.clone());
        }
        if let Some(endpoint) = &self.aws.endpoint_url {
            base.endpoint_url = Some(endpoint.clone());
        }
        if let Some(name) = &self.cluster.name {
            base.cluster_name = name.clone();
        }
        if let Some(prefix) = &self.cluster.ownership_tag_prefix {
            base.ownership_tag_prefix = prefix.clone();
        }

        let m = &self.migration;
        if let Some(class) = &m.source_class {
            base.source_class = StorageClass::from(class.as_str());
        }
        if let Some(class) = &m.target_class {
            base.target_class = StorageClass::from(class.as_str());
        }
        if let Some(threshold) = m.iops_warning_threshold {
            base.iops_warning_threshold = threshold;
        }
        if let Some(secs) = m.poll_interval_seconds {
            base.poll_interval = Duration::from_secs(secs);
        }
        if let Some(secs) = m.max_wait_seconds {
            base.max_wait = Some(Duration::from_secs(secs));
        }
        if let Some(dry_run) = m.dry_run {
            base.dry_run = dry_run;
        }
        base
    }

    pub fn into_migration_config(self) -> MigrationConfig {
        self.apply_to(MigrationConfig::default())
    }
}
