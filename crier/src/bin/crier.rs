//! Dispatch one campaign described by a TOML file, delivering through the
//! provider it names. Ctrl-C cancels the campaign and the run stops at the
//! next batch boundary.

use std::{path::PathBuf, sync::Arc};

use anyhow::Context;
use clap::Parser;
use crier::{Campaigns, DispatchConfig, NewCampaign};
use crier_store::{JobStatus, MemoryStore};
use crier_transport::ProviderFactory;
use serde::Deserialize;

#[derive(Debug, Parser)]
#[command(author, version, about)]
struct Args {
    /// Campaign description to dispatch.
    #[arg(long, env = "CRIER_CAMPAIGN", default_value = "campaign.toml")]
    config: PathBuf,
}

#[derive(Debug, Deserialize)]
struct CampaignFile {
    campaign: NewCampaign,
    #[serde(default)]
    dispatch: DispatchConfig,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_target(false)
        .compact()
        .init();

    let args = Args::parse();

    let raw = std::fs::read_to_string(&args.config)
        .with_context(|| format!("reading {}", args.config.display()))?;
    let file: CampaignFile =
        toml::from_str(&raw).with_context(|| format!("parsing {}", args.config.display()))?;

    let store = Arc::new(MemoryStore::new());
    let campaigns = Campaigns::new(
        store.clone(),
        store,
        Arc::new(ProviderFactory::new()),
        file.dispatch,
    );

    let job = campaigns.create(file.campaign).await?;

    let runner = campaigns.clone();
    let run_id = job.id.clone();
    let mut handle = tokio::spawn(async move { runner.start(&run_id).await });

    let finished = tokio::select! {
        outcome = &mut handle => outcome?,
        _ = tokio::signal::ctrl_c() => {
            tracing::info!(job = %job.id, "interrupt received, cancelling campaign");
            if let Err(e) = campaigns.cancel(&job.id).await {
                tracing::warn!(error = %e, "cancel rejected");
            }
            handle.await?
        }
    }?;

    let tally = campaigns.tally(&finished.id).await?;
    println!(
        "campaign {} finished {}: {} sent, {} failed, {} pending",
        finished.id, finished.status, tally.sent, tally.failed, tally.pending
    );

    if finished.status != JobStatus::Completed {
        anyhow::bail!("campaign finished {}", finished.status);
    }

    Ok(())
}
