//! Prewarm command - build tier collections out of band.

use clap::Args;
use territory::prewarm::{PrewarmMode, Prewarmer};

use crate::error::CliError;
use crate::runner::CliRunner;

/// Arguments for the prewarm command.
///
/// At most one selector may be given; with none the coarse tier is warmed.
#[derive(Debug, Default, Args)]
#[command(group(
    clap::ArgGroup::new("selector")
        .args(["target", "coarse", "fine", "both", "mode"])
        .multiple(false)
))]
pub struct PrewarmArgs {
    /// Tier(s) to warm: coarse, fine or both
    pub target: Option<String>,

    /// Warm the coarse tier
    #[arg(long)]
    pub coarse: bool,

    /// Warm the fine tier
    #[arg(long)]
    pub fine: bool,

    /// Warm both tiers, coarse first
    #[arg(long)]
    pub both: bool,

    /// Tier(s) to warm; unknown values resolve to fine
    #[arg(long, value_name = "MODE")]
    pub mode: Option<String>,

    /// Remove the tier's union, collection, manifest and dirty flag first
    #[arg(long)]
    pub clean: bool,
}

impl PrewarmArgs {
    /// Resolve the selected mode.
    pub fn mode(&self) -> PrewarmMode {
        if self.coarse {
            PrewarmMode::Coarse
        } else if self.fine {
            PrewarmMode::Fine
        } else if self.both {
            PrewarmMode::Both
        } else {
            self.mode
                .as_deref()
                .or(self.target.as_deref())
                .map(PrewarmMode::coerce)
                .unwrap_or_default()
        }
    }
}

/// Run the prewarm command.
pub async fn run(runner: &CliRunner, args: PrewarmArgs) -> Result<(), CliError> {
    runner.log_startup("prewarm");

    let mode = args.mode();
    let cache = runner.create_cache()?;
    let registry = runner.create_registry(&cache);

    println!("Prewarming {} (clean: {})", mode, args.clean);
    let report = Prewarmer::new(cache, registry).run(mode, args.clean).await?;

    for tier in &report.tiers {
        println!(
            "  {:<6} {} partitions in {}s",
            tier.tier,
            tier.partitions,
            tier.elapsed.as_secs()
        );
    }

    Ok(())
}
