use crate::domain::model::{
    CallerIdentity, Instance, StorageClass, Volume, VolumeModification,
};
use crate::utils::error::ProviderError;
use async_trait::async_trait;

pub type ProviderResult<T> = std::result::Result<T, ProviderError>;

/// The slice of the cloud API the migrator needs.
#[async_trait]
pub trait CloudProvider: Send + Sync {
    async fn caller_identity(&self) -> ProviderResult<CallerIdentity>;

    /// Instances whose `Name` tag matches the wildcard pattern.
    async fn describe_instances(&self, name_pattern: &str) -> ProviderResult<Vec<Instance>>;

    async fn describe_volumes(&self, volume_ids: &[String]) -> ProviderResult<Vec<Volume>>;

    async fn modify_volume(
        &self,
        volume_id: &str,
        target: &StorageClass,
    ) -> ProviderResult<VolumeModification>;

    /// Latest modification for the volume. Errors when EC2 has no record of one.
    async fn volume_modification(&self, volume_id: &str) -> ProviderResult<VolumeModification>;
}
