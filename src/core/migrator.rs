use crate::config::MigrationConfig;
use crate::core::discovery::{collect_volume_ids, OwnershipMatcher};
use crate::core::waiter::ModificationWaiter;
use crate::core::CloudProvider;
use crate::domain::model::{
    MigrationReport, ModificationState, Volume, VolumeOutcome, VolumeReport,
};
use crate::utils::error::{MigrationError, ProviderError, Result};
use chrono::Utc;

/// Runs one discovery-and-migrate pass over a cluster's volumes.
pub struct VolumeMigrator<P: CloudProvider> {
    provider: P,
    config: MigrationConfig,
    waiter: ModificationWaiter,
}

impl<P: CloudProvider> VolumeMigrator<P> {
    pub fn new(provider: P, config: MigrationConfig) -> Self {
        let waiter = ModificationWaiter::new(config.poll_interval, config.max_wait);
        Self {
            provider,
            config,
            waiter,
        }
    }

    pub fn provider(&self) -> &P {
        &self.provider
    }

    /// Fails on identity, discovery, empty discovery, and waiter errors.
    /// Per-volume failures are recorded in the report and the run continues.
    pub async fn run(&self) -> Result<MigrationReport> {
        tracing::info!("🚀 Starting migration in region {}", self.config.region);

        let identity = self
            .provider
            .caller_identity()
            .await
            .map_err(|e| {
                log_provider_error(&e);
                MigrationError::IdentityError(e)
            })?;
        tracing::info!("🔑 Account {}", identity.account);

        let matcher = OwnershipMatcher::new(&self.config.ownership_tag())?;
        let name_filter = self.config.name_filter();
        tracing::debug!("Listing instances with tag:Name = {}", name_filter);

        let instances = self
            .provider
            .describe_instances(&name_filter)
            .await
            .map_err(|e| {
                log_provider_error(&e);
                MigrationError::DiscoveryError(e)
            })?;
        tracing::info!("Found {} instances matching {}", instances.len(), name_filter);

        let volume_ids = collect_volume_ids(&instances, &matcher);
        if volume_ids.is_empty() {
            return Err(MigrationError::NoVolumesError {
                cluster: self.config.cluster_name.clone(),
            });
        }

        let mut report = MigrationReport::new(identity.account, &self.config.cluster_name);

        for id in &volume_ids {
            tracing::info!("Describing volume: {}", id);
        }
        let volumes = match self.provider.describe_volumes(&volume_ids).await {
            Ok(volumes) => volumes,
            Err(e) => {
                log_provider_error(&e);
                tracing::error!("❌ Could not describe volumes, nothing migrated");
                report.finished_at = Some(Utc::now());
                return Ok(report);
            }
        };

        for volume in &volumes {
            let entry = self.process_volume(volume).await?;
            report.volumes.push(entry);
        }

        report.finished_at = Some(Utc::now());
        tracing::info!(
            "📊 {} volumes: {} migrated, {} already {}, {} failed",
            report.volumes.len(),
            report.migrated(),
            report.already_target(),
            self.config.target_class,
            report.failed()
        );
        Ok(report)
    }

    async fn process_volume(&self, volume: &Volume) -> Result<VolumeReport> {
        if volume.id.is_empty() {
            let err = MigrationError::InvalidVolumeIdError {
                value: volume.id.clone(),
            };
            tracing::warn!("⚠️ {}, skipping", err);
            return Ok(VolumeReport {
                volume_id: volume.id.clone(),
                original_class: volume.class.clone(),
                size_gib: volume.size_gib,
                outcome: VolumeOutcome::Failed {
                    reason: err.to_string(),
                },
                final_state: None,
            });
        }

        let outcome = if volume.class == self.config.target_class {
            tracing::info!("Volume {} is already type {}", volume.id, volume.class);
            VolumeOutcome::AlreadyTarget
        } else if volume.class == self.config.source_class {
            self.migrate(volume).await?
        } else {
            tracing::debug!(
                "Volume {} is type {}, leaving it alone",
                volume.id,
                volume.class
            );
            VolumeOutcome::Skipped {
                class: volume.class.clone(),
            }
        };

        let final_state = self.check_status(&volume.id).await;

        Ok(VolumeReport {
            volume_id: volume.id.clone(),
            original_class: volume.class.clone(),
            size_gib: volume.size_gib,
            outcome,
            final_state,
        })
    }

    /// Only waiter failures escape as errors; everything else becomes an outcome.
    async fn migrate(&self, volume: &Volume) -> Result<VolumeOutcome> {
        let target = &self.config.target_class;
        tracing::info!(
            "🔧 Migrate volume {} which is type {} ({} GiB)",
            volume.id,
            volume.class,
            volume
                .size_gib
                .map_or_else(|| "?".to_string(), |size| size.to_string())
        );

        if let Some(iops) = volume.iops {
            if iops > self.config.iops_warning_threshold {
                tracing::warn!(
                    "⚠️ Volume {} IOPS greater than {}: {}",
                    volume.id,
                    self.config.iops_warning_threshold,
                    iops
                );
            }
        }

        if self.config.dry_run {
            tracing::info!("🔍 [dry run] would modify volume {} to {}", volume.id, target);
            return Ok(VolumeOutcome::WouldMigrate);
        }

        let modification = match self.provider.modify_volume(&volume.id, target).await {
            Ok(modification) => modification,
            Err(e) => {
                log_provider_error(&e);
                tracing::error!("❌ Failed to modify volume {}: {}", volume.id, e);
                return Ok(VolumeOutcome::Failed {
                    reason: e.to_string(),
                });
            }
        };
        tracing::info!(
            "Modifying volume {}: start time {}: state: {}",
            modification.volume_id,
            modification.start_time.as_deref().unwrap_or("unknown"),
            modification.state
        );

        match self.waiter.wait(&self.provider, &volume.id).await {
            Ok(elapsed) => Ok(VolumeOutcome::Migrated {
                waited_secs: elapsed.as_secs(),
            }),
            Err(
                e @ (MigrationError::ModificationFailedError { .. }
                | MigrationError::WaitTimeoutError { .. }),
            ) => {
                tracing::warn!("⚠️ {}", e);
                tracing::warn!("💡 {}", e.recovery_suggestion());
                Ok(VolumeOutcome::Failed {
                    reason: e.to_string(),
                })
            }
            Err(e) => Err(e),
        }
    }

    /// Logs and returns the volume's latest modification state. Never fails the run.
    async fn check_status(&self, volume_id: &str) -> Option<String> {
        match self.provider.volume_modification(volume_id).await {
            Ok(modification) => {
                if modification.state != ModificationState::Completed {
                    tracing::warn!(
                        "Volume {} migration not complete, status: {}",
                        volume_id,
                        modification.state
                    );
                }
                tracing::info!(
                    "Volume id: {} modification {}",
                    volume_id,
                    modification.state
                );
                Some(modification.state.to_string())
            }
            Err(e) => {
                tracing::warn!("Failed to get volume status: {}", e);
                None
            }
        }
    }
}

fn log_provider_error(e: &ProviderError) {
    match e.code.as_deref() {
        Some(code) => tracing::error!(code, "{}", e),
        None => tracing::error!("{}", e),
    }
}
