//! Scripted in-memory provider for unit tests.

use crate::domain::model::{
    CallerIdentity, Instance, ModificationState, StorageClass, Volume, VolumeModification,
};
use crate::domain::ports::{CloudProvider, ProviderResult};
use crate::utils::error::ProviderError;
use async_trait::async_trait;
use std::collections::{HashMap, HashSet, VecDeque};
use tokio::sync::Mutex;

type PollScript = VecDeque<ProviderResult<ModificationState>>;

#[derive(Default)]
pub struct ScriptedProvider {
    pub identity_error: Option<ProviderError>,
    pub discovery_error: Option<ProviderError>,
    pub describe_volumes_error: Option<ProviderError>,
    pub instances: Vec<Instance>,
    pub volumes: Vec<Volume>,
    pub failing_modifications: HashSet<String>,
    pub polls: Mutex<HashMap<String, PollScript>>,
    pub calls: Mutex<Vec<String>>,
}

impl ScriptedProvider {
    /// States returned by successive polls. The last one repeats forever.
    pub async fn script_states(&self, volume_id: &str, states: Vec<ModificationState>) {
        let script = states.into_iter().map(Ok).collect();
        self.polls.lock().await.insert(volume_id.to_string(), script);
    }

    pub async fn script_poll_error(&self, volume_id: &str, error: ProviderError) {
        let script = VecDeque::from([Err(error)]);
        self.polls.lock().await.insert(volume_id.to_string(), script);
    }

    pub async fn calls(&self) -> Vec<String> {
        self.calls.lock().await.clone()
    }

    pub async fn modify_calls(&self) -> Vec<String> {
        self.calls()
            .await
            .into_iter()
            .filter_map(|c| c.strip_prefix("modify:").map(str::to_string))
            .collect()
    }

    pub async fn poll_count(&self, volume_id: &str) -> usize {
        let needle = format!("poll:{}", volume_id);
        self.calls().await.iter().filter(|c| **c == needle).count()
    }

    async fn record(&self, call: String) {
        self.calls.lock().await.push(call);
    }
}

#[async_trait]
impl CloudProvider for ScriptedProvider {
    async fn caller_identity(&self) -> ProviderResult<CallerIdentity> {
        self.record("identity".to_string()).await;
        match &self.identity_error {
            Some(e) => Err(e.clone()),
            None => Ok(CallerIdentity {
                account: "123456789012".to_string(),
                arn: None,
                user_id: None,
            }),
        }
    }

    async fn describe_instances(&self, name_pattern: &str) -> ProviderResult<Vec<Instance>> {
        self.record(format!("instances:{}", name_pattern)).await;
        match &self.discovery_error {
            Some(e) => Err(e.clone()),
            None => Ok(self.instances.clone()),
        }
    }

    async fn describe_volumes(&self, volume_ids: &[String]) -> ProviderResult<Vec<Volume>> {
        self.record(format!("volumes:{}", volume_ids.join(","))).await;
        if let Some(e) = &self.describe_volumes_error {
            return Err(e.clone());
        }
        Ok(self
            .volumes
            .iter()
            .filter(|v| volume_ids.contains(&v.id))
            .cloned()
            .collect())
    }

    async fn modify_volume(
        &self,
        volume_id: &str,
        target: &StorageClass,
    ) -> ProviderResult<VolumeModification> {
        self.record(format!("modify:{}", volume_id)).await;
        if self.failing_modifications.contains(volume_id) {
            return Err(ProviderError::new("ModifyVolume", "IncorrectModificationState")
                .with_code(Some("IncorrectModificationState")));
        }
        tracing::debug!("scripted modify of {} to {}", volume_id, target);
        Ok(VolumeModification {
            volume_id: volume_id.to_string(),
            state: ModificationState::Modifying,
            start_time: Some("2024-01-01T00:00:00Z".to_string()),
            progress: Some(0),
        })
    }

    async fn volume_modification(&self, volume_id: &str) -> ProviderResult<VolumeModification> {
        self.record(format!("poll:{}", volume_id)).await;
        let mut polls = self.polls.lock().await;
        let script = polls.get_mut(volume_id).ok_or_else(|| {
            ProviderError::new(
                "DescribeVolumesModifications",
                format!("Volume {} not found", volume_id),
            )
        })?;

        let next = if script.len() > 1 {
            script.pop_front()
        } else {
            script.front().cloned()
        };
        let state = next.unwrap_or_else(|| {
            Err(ProviderError::new("DescribeVolumesModifications", "empty script"))
        })?;

        Ok(VolumeModification {
            volume_id: volume_id.to_string(),
            progress: Some(if state == ModificationState::Completed { 100 } else { 50 }),
            state,
            start_time: None,
        })
    }
}
