mod config;
mod ip;
mod provider;

use anyhow::Result;
use clap::Parser;
use log::{debug, info};

use config::Config;
use provider::RunMode;

#[derive(Parser, Debug)]
#[command(name = "cf-sync")]
#[command(about = "Keep a Cloudflare DNS A record pointed at this host's public IPv4 address")]
struct Args {
    /// Path to the configuration file; CF_* environment variables are read when omitted
    #[arg(short, long)]
    config: Option<String>,

    /// Rewrite the record even if the IP address has not changed
    #[arg(long, conflicts_with = "force_delete_create")]
    force_update: bool,

    /// Delete the record (when present) and recreate it from scratch
    #[arg(long)]
    force_delete_create: bool,
}

impl Args {
    fn mode(&self) -> RunMode {
        if self.force_update {
            RunMode::ForceUpdate
        } else if self.force_delete_create {
            RunMode::ForceDeleteCreate
        } else {
            RunMode::Sync
        }
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Load configuration first (before logger init)
    let config = match &args.config {
        Some(path) => Config::load(path)?,
        None => Config::from_env()?,
    };

    // Initialize logger with config log level (env var takes precedence)
    env_logger::Builder::from_env(
        env_logger::Env::default().default_filter_or(&config.log_level),
    )
    .init();

    info!(
        "Managing record {} in zone {} (api key {})",
        config.record_name,
        config.zone_id,
        config.masked_api_key()
    );

    let client = reqwest::Client::new();

    // The public address is resolved before any provider call; failure here
    // aborts the run with no DNS request issued.
    let current_ip = ip::resolve_ipv4(&client).await?;
    info!("Current public IPv4 address: {}", current_ip);

    let outcome =
        provider::cloudflare::sync_record(&client, &config, args.mode(), current_ip).await?;
    debug!("Record id after this run: {:?}", outcome.record_id);
    info!("Run finished: {}", outcome.message);

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn force_flags_are_mutually_exclusive() {
        let result = Args::try_parse_from(["cf-sync", "--force-update", "--force-delete-create"]);
        assert!(result.is_err());
    }

    #[test]
    fn flags_map_to_run_modes() {
        let sync = Args::try_parse_from(["cf-sync"]).unwrap();
        assert_eq!(sync.mode(), RunMode::Sync);

        let update = Args::try_parse_from(["cf-sync", "--force-update"]).unwrap();
        assert_eq!(update.mode(), RunMode::ForceUpdate);

        let recreate = Args::try_parse_from(["cf-sync", "--force-delete-create"]).unwrap();
        assert_eq!(recreate.mode(), RunMode::ForceDeleteCreate);
    }
}
