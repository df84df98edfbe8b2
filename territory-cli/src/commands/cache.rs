//! Cache management CLI commands.

use std::path::PathBuf;

use clap::Subcommand;
use territory::cache::CacheStatus;
use territory::prewarm::PrewarmMode;
use territory::QualityTier;

use crate::error::CliError;
use crate::runner::CliRunner;

/// Cache action subcommands.
#[derive(Debug, Subcommand)]
pub enum CacheAction {
    /// Show artifacts, manifest and dirty flag per tier
    Status {
        /// coarse, fine or both
        #[arg(default_value = "both")]
        tier: String,
    },
    /// Delete the clipped collection so the next request regenerates it
    ///
    /// The manifest is kept, so the regenerated collection continues its
    /// version sequence.
    Invalidate {
        /// coarse, fine or both
        #[arg(default_value = "both")]
        tier: String,
    },
    /// Invalidate and also delete the union artifact and manifest
    Clean {
        /// coarse, fine or both
        #[arg(default_value = "both")]
        tier: String,
    },
}

/// Run a cache subcommand.
pub async fn run(runner: &CliRunner, action: CacheAction) -> Result<(), CliError> {
    runner.log_startup("cache");
    let cache = runner.create_cache()?;
    println!("Artifact directory: {}", cache.paths().directory().display());

    match action {
        CacheAction::Status { tier } => {
            for &tier in PrewarmMode::coerce(&tier).tiers() {
                print_status(&cache.status(tier).await?);
            }
        }
        CacheAction::Invalidate { tier } => {
            for &tier in PrewarmMode::coerce(&tier).tiers() {
                report_removed(tier, cache.invalidate(tier).await?);
            }
        }
        CacheAction::Clean { tier } => {
            for &tier in PrewarmMode::coerce(&tier).tiers() {
                report_removed(tier, cache.clean(tier).await?);
            }
        }
    }

    Ok(())
}

fn report_removed(tier: QualityTier, removed: Vec<PathBuf>) {
    if removed.is_empty() {
        println!("[{}] nothing to remove", tier);
        return;
    }
    println!("[{}] removed {} file(s)", tier, removed.len());
    for path in removed {
        println!("  {}", path.display());
    }
}

fn print_status(status: &CacheStatus) {
    println!();
    println!("[{}]", status.tier);
    println!("  Raw landmass: {}", present(status.raw_present));
    println!("  Union:        {}", present(status.union_present));

    match &status.collection {
        Some(meta) => println!("  Collection:   {} bytes", meta.size),
        None => println!("  Collection:   missing"),
    }
    if let Some(validator) = &status.validator {
        println!("  ETag:         {}", validator);
    }

    match &status.manifest {
        Some(manifest) => {
            println!(
                "  Manifest:     v{} generated {} ({} partitions, {} skipped)",
                manifest.version,
                manifest.generated_at,
                manifest.partitions,
                manifest.skipped.len()
            );
            for skipped in &manifest.skipped {
                println!(
                    "    skipped {} ({}): {}",
                    skipped.site_id, skipped.site_name, skipped.reason
                );
            }
        }
        None => println!("  Manifest:     none"),
    }

    if let Some(flag) = &status.dirty {
        println!("  Dirty:        {} at {}", flag.reason, flag.dirty_at);
    }
}

fn present(flag: bool) -> &'static str {
    if flag {
        "present"
    } else {
        "missing"
    }
}
