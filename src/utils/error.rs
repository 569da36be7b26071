use thiserror::Error;

#[derive(Error, Debug)]
pub enum MigrationError {
    #[error("Identity lookup failed: {0}")]
    IdentityError(ProviderError),

    #[error("Instance discovery failed: {0}")]
    DiscoveryError(ProviderError),

    #[error("No volumes found for cluster '{cluster}'")]
    NoVolumesError { cluster: String },

    #[error("Failed to wait for modification of volume {volume_id}: {source}")]
    WaiterError {
        volume_id: String,
        source: ProviderError,
    },

    #[error("Modification of volume {volume_id} ended in state '{state}'")]
    ModificationFailedError { volume_id: String, state: String },

    #[error("Modification of volume {volume_id} still '{state}' after {waited_secs}s")]
    WaitTimeoutError {
        volume_id: String,
        state: String,
        waited_secs: u64,
    },

    #[error("Invalid volume id: '{value}'")]
    InvalidVolumeIdError { value: String },

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Configuration error: {message}")]
    ConfigError { message: String },

    #[error("Missing configuration: {field}")]
    MissingConfigError { field: String },

    #[error("Invalid value for {field}: '{value}' ({reason})")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },
}

/// An error returned by the cloud API, with the service error code when the
/// provider supplied one.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{operation}: {message}")]
pub struct ProviderError {
    pub operation: String,
    pub code: Option<String>,
    pub message: String,
}

impl ProviderError {
    pub fn new(operation: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            operation: operation.into(),
            code: None,
            message: message.into(),
        }
    }

    pub fn with_code(mut self, code: Option<&str>) -> Self {
        self.code = code.map(str::to_string);
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Configuration,
    Authentication,
    Discovery,
    Modification,
    Internal,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ErrorSeverity {
    Low,
    Medium,
    High,
    Critical,
}

impl MigrationError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            MigrationError::IdentityError(_) => ErrorCategory::Authentication,
            MigrationError::DiscoveryError(_) | MigrationError::NoVolumesError { .. } => {
                ErrorCategory::Discovery
            }
            MigrationError::WaiterError { .. }
            | MigrationError::ModificationFailedError { .. }
            | MigrationError::WaitTimeoutError { .. }
            | MigrationError::InvalidVolumeIdError { .. } => ErrorCategory::Modification,
            MigrationError::ConfigError { .. }
            | MigrationError::MissingConfigError { .. }
            | MigrationError::InvalidConfigValueError { .. } => ErrorCategory::Configuration,
            MigrationError::IoError(_) => ErrorCategory::Internal,
        }
    }

    /// Errors at `High` and above end the run with a non-zero exit code.
    pub fn severity(&self) -> ErrorSeverity {
        match self {
            MigrationError::ModificationFailedError { .. }
            | MigrationError::WaitTimeoutError { .. }
            | MigrationError::InvalidVolumeIdError { .. } => ErrorSeverity::Medium,
            MigrationError::IdentityError(_)
            | MigrationError::DiscoveryError(_)
            | MigrationError::NoVolumesError { .. }
            | MigrationError::WaiterError { .. }
            | MigrationError::ConfigError { .. }
            | MigrationError::MissingConfigError { .. }
            | MigrationError::InvalidConfigValueError { .. } => ErrorSeverity::High,
            MigrationError::IoError(_) => ErrorSeverity::Critical,
        }
    }

    /// Process exit code for an error that ended the run.
    pub fn exit_code(&self) -> i32 {
        match self.severity() {
            ErrorSeverity::Low | ErrorSeverity::Medium => 0,
            ErrorSeverity::High | ErrorSeverity::Critical => 1,
        }
    }

    pub fn recovery_suggestion(&self) -> &'static str {
        match self {
            MigrationError::IdentityError(_) => {
                "Check the AWS profile, e.g. `aws sts get-caller-identity --profile <name>`"
            }
            MigrationError::DiscoveryError(_) => {
                "Verify the region and that the credentials allow ec2:DescribeInstances"
            }
            MigrationError::NoVolumesError { .. } => {
                "Check the cluster name and the instances' kubernetes.io/cluster/<name> tag"
            }
            MigrationError::WaiterError { .. } => {
                "Inspect the modification with `aws ec2 describe-volumes-modifications` and re-run"
            }
            MigrationError::ModificationFailedError { .. } => {
                "The volume keeps its previous class; check the EC2 console for the reason"
            }
            MigrationError::WaitTimeoutError { .. } => {
                "The modification keeps running remotely; re-run later or raise --max-wait-secs"
            }
            MigrationError::InvalidVolumeIdError { .. } => {
                "Check the instance block device mappings; this volume was skipped"
            }
            MigrationError::ConfigError { .. }
            | MigrationError::MissingConfigError { .. }
            | MigrationError::InvalidConfigValueError { .. } => {
                "Fix the configuration file or command line flags and try again"
            }
            MigrationError::IoError(_) => "Check file permissions and available disk space",
        }
    }

    pub fn user_friendly_message(&self) -> String {
        match self {
            MigrationError::IdentityError(e) => {
                format!("Could not authenticate to AWS ({})", e.message)
            }
            MigrationError::NoVolumesError { cluster } => {
                format!("No volumes found for cluster '{}'", cluster)
            }
            MigrationError::MissingConfigError { field } => {
                format!("Missing required setting '{}'", field)
            }
            other => other.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, MigrationError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fatal_errors_exit_with_one() {
        let identity =
            MigrationError::IdentityError(ProviderError::new("GetCallerIdentity", "denied"));
        let no_volumes = MigrationError::NoVolumesError {
            cluster: "prod".to_string(),
        };
        let waiter = MigrationError::WaiterError {
            volume_id: "vol-1".to_string(),
            source: ProviderError::new("DescribeVolumesModifications", "throttled"),
        };

        assert_eq!(identity.exit_code(), 1);
        assert_eq!(no_volumes.exit_code(), 1);
        assert_eq!(waiter.exit_code(), 1);
    }

    #[test]
    fn test_per_volume_errors_are_not_fatal() {
        let failed = MigrationError::ModificationFailedError {
            volume_id: "vol-1".to_string(),
            state: "failed".to_string(),
        };
        assert_eq!(failed.severity(), ErrorSeverity::Medium);
        assert_eq!(failed.exit_code(), 0);
        assert_eq!(failed.category(), ErrorCategory::Modification);
    }

    #[test]
    fn test_provider_error_keeps_code() {
        let err = ProviderError::new("ModifyVolume", "rate exceeded")
            .with_code(Some("RequestLimitExceeded"));
        assert_eq!(err.code.as_deref(), Some("RequestLimitExceeded"));
        assert_eq!(err.to_string(), "ModifyVolume: rate exceeded");
    }
}
