use crate::config::MigrationConfig;
use crate::domain::model::{
    CallerIdentity, Instance, ModificationState, StorageClass, Volume, VolumeModification,
};
use crate::domain::ports::{CloudProvider, ProviderResult};
use crate::utils::error::ProviderError;
use async_trait::async_trait;
use aws_config::BehaviorVersion;
use aws_sdk_ec2::config::Region;
use aws_sdk_ec2::error::{DisplayErrorContext, ProvideErrorMetadata};
use aws_sdk_ec2::primitives::DateTimeFormat;
use aws_sdk_ec2::types::{Filter, VolumeType};
use aws_sdk_ec2::Client as Ec2Client;
use aws_sdk_sts::Client as StsClient;

/// EC2 + STS backed provider.
#[derive(Debug, Clone)]
pub struct AwsProvider {
    ec2: Ec2Client,
    sts: StsClient,
}

impl AwsProvider {
    /// Loads credentials from the configured profile, or the default chain.
    pub async fn from_config(config: &MigrationConfig) -> Self {
        let mut loader = aws_config::defaults(BehaviorVersion::latest())
            .region(Region::new(config.region.clone()));
        if let Some(profile) = &config.profile {
            loader = loader.profile_name(profile);
        }
        if let Some(endpoint) = &config.endpoint_url {
            loader = loader.endpoint_url(endpoint);
        }
        let shared = loader.load().await;

        tracing::debug!(
            "AWS session: region={}, profile={}",
            config.region,
            config.profile.as_deref().unwrap_or("<default chain>")
        );
        Self::new(Ec2Client::new(&shared), StsClient::new(&shared))
    }

    pub fn new(ec2: Ec2Client, sts: StsClient) -> Self {
        Self { ec2, sts }
    }
}

fn provider_error<E>(operation: &str, err: E) -> ProviderError
where
    E: ProvideErrorMetadata + std::error::Error,
{
    let message = err
        .message()
        .map(str::to_string)
        .unwrap_or_else(|| DisplayErrorContext(&err).to_string());
    ProviderError::new(operation, message).with_code(err.code())
}

fn require_volume_id(operation: &str, volume_id: &str) -> ProviderResult<()> {
    if volume_id.is_empty() {
        return Err(ProviderError::new(operation, "volume id must not be empty"));
    }
    Ok(())
}

fn to_instance(instance: &aws_sdk_ec2::types::Instance) -> Instance {
    Instance {
        id: instance.instance_id().unwrap_or_default().to_string(),
        tags: instance
            .tags()
            .iter()
            .filter_map(|tag| {
                let key = tag.key()?;
                Some((key.to_string(), tag.value().unwrap_or_default().to_string()))
            })
            .collect(),
        volume_ids: instance
            .block_device_mappings()
            .iter()
            .filter_map(|mapping| mapping.ebs()?.volume_id())
            .map(str::to_string)
            .collect(),
    }
}

fn to_volume(volume: &aws_sdk_ec2::types::Volume) -> Volume {
    Volume {
        id: volume.volume_id().unwrap_or_default().to_string(),
        class: volume
            .volume_type()
            .map(|t| StorageClass::from(t.as_str()))
            .unwrap_or_else(|| StorageClass::Other(String::new())),
        iops: volume.iops(),
        size_gib: volume.size(),
    }
}

fn to_modification(
    fallback_id: &str,
    modification: &aws_sdk_ec2::types::VolumeModification,
) -> VolumeModification {
    VolumeModification {
        volume_id: modification
            .volume_id()
            .unwrap_or(fallback_id)
            .to_string(),
        state: modification
            .modification_state()
            .map(|s| ModificationState::from(s.as_str()))
            .unwrap_or_else(|| ModificationState::Other(String::new())),
        start_time: modification
            .start_time()
            .and_then(|t| t.fmt(DateTimeFormat::DateTime).ok()),
        progress: modification.progress(),
    }
}

#[async_trait]
impl CloudProvider for AwsProvider {
    async fn caller_identity(&self) -> ProviderResult<CallerIdentity> {
        let output = self
            .sts
            .get_caller_identity()
            .send()
            .await
            .map_err(|e| provider_error("GetCallerIdentity", e))?;

        Ok(CallerIdentity {
            account: output.account().unwrap_or_default().to_string(),
            arn: output.arn().map(str::to_string),
            user_id: output.user_id().map(str::to_string),
        })
    }

    async fn describe_instances(&self, name_pattern: &str) -> ProviderResult<Vec<Instance>> {
        let filter = Filter::builder().name("tag:Name").values(name_pattern).build();

        let mut instances = Vec::new();
        let mut next_token: Option<String> = None;
        loop {
            let output = self
                .ec2
                .describe_instances()
                .filters(filter.clone())
                .set_next_token(next_token.take())
                .send()
                .await
                .map_err(|e| provider_error("DescribeInstances", e))?;

            for reservation in output.reservations() {
                instances.extend(reservation.instances().iter().map(to_instance));
            }

            match output.next_token() {
                Some(token) if !token.is_empty() => next_token = Some(token.to_string()),
                _ => break,
            }
        }

        Ok(instances)
    }

    async fn describe_volumes(&self, volume_ids: &[String]) -> ProviderResult<Vec<Volume>> {
        if volume_ids.is_empty() {
            return Ok(Vec::new());
        }
        for id in volume_ids {
            require_volume_id("DescribeVolumes", id)?;
        }

        let output = self
            .ec2
            .describe_volumes()
            .set_volume_ids(Some(volume_ids.to_vec()))
            .send()
            .await
            .map_err(|e| provider_error("DescribeVolumes", e))?;

        Ok(output.volumes().iter().map(to_volume).collect())
    }

    async fn modify_volume(
        &self,
        volume_id: &str,
        target: &StorageClass,
    ) -> ProviderResult<VolumeModification> {
        require_volume_id("ModifyVolume", volume_id)?;

        let output = self
            .ec2
            .modify_volume()
            .volume_id(volume_id)
            .volume_type(VolumeType::from(target.as_str()))
            .send()
            .await
            .map_err(|e| provider_error("ModifyVolume", e))?;

        output
            .volume_modification()
            .map(|m| to_modification(volume_id, m))
            .ok_or_else(|| {
                ProviderError::new("ModifyVolume", "response did not include a volume modification")
            })
    }

    async fn volume_modification(&self, volume_id: &str) -> ProviderResult<VolumeModification> {
        require_volume_id("DescribeVolumesModifications", volume_id)?;

        let output = self
            .ec2
            .describe_volumes_modifications()
            .volume_ids(volume_id)
            .send()
            .await
            .map_err(|e| provider_error("DescribeVolumesModifications", e))?;

        output
            .volumes_modifications()
            .first()
            .map(|m| to_modification(volume_id, m))
            .ok_or_else(|| {
                ProviderError::new(
                    "DescribeVolumesModifications",
                    format!("Volume {} not found", volume_id),
                )
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use aws_sdk_ec2::types::{
        EbsInstanceBlockDevice, InstanceBlockDeviceMapping, Tag, VolumeModificationState,
    };

    #[test]
    fn test_to_instance_maps_tags_and_volumes() {
        let instance = aws_sdk_ec2::types::Instance::builder()
            .instance_id("i-123")
            .tags(Tag::builder().key("Name").value("prod-worker").build())
            .tags(Tag::builder().key("kubernetes.io/cluster/prod").value("owned").build())
            .block_device_mappings(
                InstanceBlockDeviceMapping::builder()
                    .device_name("/dev/xvda")
                    .ebs(EbsInstanceBlockDevice::builder().volume_id("vol-1").build())
                    .build(),
            )
            .block_device_mappings(
                InstanceBlockDeviceMapping::builder()
                    .device_name("/dev/xvdb")
                    .build(),
            )
            .build();

        let mapped = to_instance(&instance);
        assert_eq!(mapped.id, "i-123");
        assert_eq!(mapped.name(), Some("prod-worker"));
        assert_eq!(mapped.volume_ids, vec!["vol-1"]);
        assert!(mapped.tags.contains_key("kubernetes.io/cluster/prod"));
    }

    #[test]
    fn test_to_volume_and_modification() {
        let volume = aws_sdk_ec2::types::Volume::builder()
            .volume_id("vol-1")
            .volume_type(VolumeType::Gp2)
            .iops(4500)
            .size(1500)
            .build();
        let mapped = to_volume(&volume);
        assert_eq!(mapped.class, StorageClass::Gp2);
        assert_eq!(mapped.iops, Some(4500));

        let modification = aws_sdk_ec2::types::VolumeModification::builder()
            .modification_state(VolumeModificationState::Optimizing)
            .progress(40)
            .build();
        let mapped = to_modification("vol-1", &modification);
        assert_eq!(mapped.volume_id, "vol-1");
        assert_eq!(mapped.state, ModificationState::Optimizing);
        assert_eq!(mapped.progress, Some(40));
    }
}
