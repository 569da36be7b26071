use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

/// EBS volume type.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "String", from = "String")]
pub enum StorageClass {
    Standard,
    Io1,
    Io2,
    Gp2,
    Gp3,
    Sc1,
    St1,
    Other(String),
}

impl StorageClass {
    pub fn as_str(&self) -> &str {
        match self {
            StorageClass::Standard => "standard",
            StorageClass::Io1 => "io1",
            StorageClass::Io2 => "io2",
            StorageClass::Gp2 => "gp2",
            StorageClass::Gp3 => "gp3",
            StorageClass::Sc1 => "sc1",
            StorageClass::St1 => "st1",
            StorageClass::Other(s) => s,
        }
    }

    pub fn is_known(&self) -> bool {
        !matches!(self, StorageClass::Other(_))
    }
}

impl From<&str> for StorageClass {
    fn from(value: &str) -> Self {
        match value {
            "standard" => StorageClass::Standard,
            "io1" => StorageClass::Io1,
            "io2" => StorageClass::Io2,
            "gp2" => StorageClass::Gp2,
            "gp3" => StorageClass::Gp3,
            "sc1" => StorageClass::Sc1,
            "st1" => StorageClass::St1,
            other => StorageClass::Other(other.to_string()),
        }
    }
}

impl From<String> for StorageClass {
    fn from(value: String) -> Self {
        StorageClass::from(value.as_str())
    }
}

impl From<StorageClass> for String {
    fn from(value: StorageClass) -> Self {
        value.as_str().to_string()
    }
}

impl FromStr for StorageClass {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(StorageClass::from(s))
    }
}

impl fmt::Display for StorageClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// State of an in-flight volume modification as reported by EC2.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ModificationState {
    Modifying,
    Optimizing,
    Completed,
    Failed,
    Other(String),
}

impl ModificationState {
    pub fn as_str(&self) -> &str {
        match self {
            ModificationState::Modifying => "modifying",
            ModificationState::Optimizing => "optimizing",
            ModificationState::Completed => "completed",
            ModificationState::Failed => "failed",
            ModificationState::Other(s) => s,
        }
    }
}

impl From<&str> for ModificationState {
    fn from(value: &str) -> Self {
        match value {
            "modifying" => ModificationState::Modifying,
            "optimizing" => ModificationState::Optimizing,
            "completed" => ModificationState::Completed,
            "failed" => ModificationState::Failed,
            other => ModificationState::Other(other.to_string()),
        }
    }
}

impl fmt::Display for ModificationState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CallerIdentity {
    pub account: String,
    pub arn: Option<String>,
    pub user_id: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct Instance {
    pub id: String,
    pub tags: HashMap<String, String>,
    pub volume_ids: Vec<String>,
}

impl Instance {
    pub fn name(&self) -> Option<&str> {
        self.tags.get("Name").map(String::as_str)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Volume {
    pub id: String,
    pub class: StorageClass,
    pub iops: Option<i32>,
    pub size_gib: Option<i32>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VolumeModification {
    pub volume_id: String,
    pub state: ModificationState,
    pub start_time: Option<String>,
    pub progress: Option<i64>,
}

/// What happened to one volume during a run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum VolumeOutcome {
    AlreadyTarget,
    Migrated { waited_secs: u64 },
    WouldMigrate,
    Skipped { class: StorageClass },
    Failed { reason: String },
}

#[derive(Debug, Clone, Serialize)]
pub struct VolumeReport {
    pub volume_id: String,
    pub original_class: StorageClass,
    pub size_gib: Option<i32>,
    #[serde(flatten)]
    pub outcome: VolumeOutcome,
    /// Modification state seen by the final re-check, if any.
    pub final_state: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct MigrationReport {
    pub started_at: DateTime<Utc>,
    pub finished_at: Option<DateTime<Utc>>,
    pub account: String,
    pub cluster: String,
    pub volumes: Vec<VolumeReport>,
}

impl MigrationReport {
    pub fn new(account: impl Into<String>, cluster: impl Into<String>) -> Self {
        Self {
            started_at: Utc::now(),
            finished_at: None,
            account: account.into(),
            cluster: cluster.into(),
            volumes: Vec::new(),
        }
    }

    pub fn count(&self, pred: impl Fn(&VolumeOutcome) -> bool) -> usize {
        self.volumes.iter().filter(|v| pred(&v.outcome)).count()
    }

    pub fn migrated(&self) -> usize {
        self.count(|o| matches!(o, VolumeOutcome::Migrated { .. }))
    }

    pub fn failed(&self) -> usize {
        self.count(|o| matches!(o, VolumeOutcome::Failed { .. }))
    }

    pub fn already_target(&self) -> usize {
        self.count(|o| matches!(o, VolumeOutcome::AlreadyTarget))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_storage_class_parsing() {
        assert_eq!(StorageClass::from("gp2"), StorageClass::Gp2);
        assert_eq!(StorageClass::from("gp3").as_str(), "gp3");
        let unknown = StorageClass::from("gp4");
        assert_eq!(unknown, StorageClass::Other("gp4".to_string()));
        assert!(!unknown.is_known());
    }

    #[test]
    fn test_modification_state_parsing() {
        assert_eq!(ModificationState::from("completed"), ModificationState::Completed);
        // "complete" is not an EC2 state and must not be mistaken for success
        assert_eq!(
            ModificationState::from("complete"),
            ModificationState::Other("complete".to_string())
        );
    }

    #[test]
    fn test_report_serializes_outcome_inline() {
        let mut report = MigrationReport::new("123456789012", "prod");
        report.volumes.push(VolumeReport {
            volume_id: "vol-1".to_string(),
            original_class: StorageClass::Gp2,
            size_gib: Some(100),
            outcome: VolumeOutcome::Migrated { waited_secs: 30 },
            final_state: Some("completed".to_string()),
        });

        let json = serde_json::to_value(&report).unwrap();
        let volume = &json["volumes"][0];
        assert_eq!(volume["outcome"], "migrated");
        assert_eq!(volume["waited_secs"], 30);
        assert_eq!(volume["original_class"], "gp2");
        assert_eq!(volume["size_gib"], 100);
        assert_eq!(report.migrated(), 1);
        assert_eq!(report.failed(), 0);
    }
}
