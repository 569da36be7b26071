use clap::Parser;
use ebs_class_migrator::utils::{logger, validation::Validate};
use ebs_class_migrator::{AwsProvider, CliConfig, MigrationReport, VolumeMigrator, VolumeOutcome};
use std::path::Path;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = CliConfig::parse();

    if cli.json_logs {
        logger::init_json_logger(cli.verbose);
    } else {
        logger::init_cli_logger(cli.verbose);
    }

    tracing::info!("Starting ebs-class-migrator");
    if cli.verbose {
        tracing::debug!("CLI config: {:?}", cli);
    }

    let config = match cli.resolve().and_then(|config| config.validate().map(|_| config)) {
        Ok(config) => config,
        Err(e) => {
            tracing::error!("❌ Configuration validation failed: {}", e);
            tracing::error!("💡 Suggestion: {}", e.recovery_suggestion());
            eprintln!("❌ {}", e.user_friendly_message());
            std::process::exit(1);
        }
    };

    tracing::info!(
        "Cluster {}: {} -> {} in {}{}",
        config.cluster_name,
        config.source_class,
        config.target_class,
        config.region,
        if config.dry_run { " (dry run)" } else { "" }
    );
    if config.max_wait.is_none() {
        tracing::warn!("No --max-wait-secs set; each modification is waited on until it completes");
    }

    let provider = AwsProvider::from_config(&config).await;
    let migrator = VolumeMigrator::new(provider, config);

    match migrator.run().await {
        Ok(report) => {
            print_summary(&report);
            if let Some(path) = &cli.report_json {
                write_report(&report, path)?;
                println!("📁 Report saved to: {}", path.display());
            }
        }
        Err(e) => {
            tracing::error!(
                "❌ Migration failed: {} (Category: {:?}, Severity: {:?})",
                e,
                e.category(),
                e.severity()
            );
            tracing::error!("💡 Recovery suggestion: {}", e.recovery_suggestion());

            eprintln!("❌ {}", e.user_friendly_message());
            eprintln!("💡 {}", e.recovery_suggestion());

            let exit_code = e.exit_code();
            if exit_code > 0 {
                std::process::exit(exit_code);
            }
        }
    }

    Ok(())
}

fn print_summary(report: &MigrationReport) {
    println!("Account {} / cluster {}", report.account, report.cluster);
    for volume in &report.volumes {
        let outcome = match &volume.outcome {
            VolumeOutcome::AlreadyTarget => "already on target class".to_string(),
            VolumeOutcome::Migrated { waited_secs } => format!("migrated after {}s", waited_secs),
            VolumeOutcome::WouldMigrate => "would migrate (dry run)".to_string(),
            VolumeOutcome::Skipped { class } => format!("skipped ({})", class),
            VolumeOutcome::Failed { reason } => format!("FAILED: {}", reason),
        };
        println!(
            "  {} [{}, {} GiB] {} (status: {})",
            volume.volume_id,
            volume.original_class,
            volume
                .size_gib
                .map_or_else(|| "?".to_string(), |size| size.to_string()),
            outcome,
            volume.final_state.as_deref().unwrap_or("none")
        );
    }
    println!(
        "✅ {} migrated, {} already on target, {} failed",
        report.migrated(),
        report.already_target(),
        report.failed()
    );
}

fn write_report(report: &MigrationReport, path: &Path) -> anyhow::Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }
    std::fs::write(path, serde_json::to_vec_pretty(report)?)?;
    Ok(())
}
