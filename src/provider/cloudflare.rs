use anyhow::{bail, Context, Result};
use log::{debug, info};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::net::Ipv4Addr;

use super::{RunMode, RunOutcome};
use crate::config::Config;

const CLOUDFLARE_API_BASE: &str = "https://api.cloudflare.com/client/v4";

const RECORD_TYPE: &str = "A";

// Freshly created records get a long TTL; rewrites a short one.
const CREATE_TTL: u32 = 3600;
const UPDATE_TTL: u32 = 120;

/// What a run decided to do, given the mode and the record found at the
/// provider. Computed before any write is issued.
#[derive(Debug, Clone, PartialEq, Eq)]
enum Action {
    Create,
    Update { record_id: String },
    DeleteThenCreate { record_id: String },
    Noop { record_id: String },
}

fn plan(mode: RunMode, existing: Option<&DnsRecord>, ip: Ipv4Addr) -> Action {
    match (mode, existing) {
        (_, None) => Action::Create,
        (RunMode::Sync, Some(record)) if record.content == ip.to_string() => Action::Noop {
            record_id: record.id.clone(),
        },
        (RunMode::Sync | RunMode::ForceUpdate, Some(record)) => Action::Update {
            record_id: record.id.clone(),
        },
        (RunMode::ForceDeleteCreate, Some(record)) => Action::DeleteThenCreate {
            record_id: record.id.clone(),
        },
    }
}

/// Looks up the configured record, decides what to do for this run, and
/// performs the API calls. At most one delete and one write per run.
pub async fn sync_record(
    client: &Client,
    config: &Config,
    mode: RunMode,
    ip: Ipv4Addr,
) -> Result<RunOutcome> {
    let name = &config.record_name;
    let existing = fetch_existing_record(client, config).await?;

    match plan(mode, existing.as_ref(), ip) {
        Action::Noop { record_id } => {
            info!("IP address has not changed, no update necessary ({} -> {})", name, ip);
            Ok(RunOutcome {
                message: format!("{} already points at {}, no update necessary", name, ip),
                record_id: Some(record_id),
            })
        }
        Action::Create => {
            info!("No existing record found, creating {} with IP {}", name, ip);
            let record = create_record(client, config, ip).await?;
            Ok(RunOutcome {
                message: format!("created {} with IP {}", name, ip),
                record_id: Some(record.id),
            })
        }
        Action::Update { record_id } => {
            let previous = existing.as_ref().map_or("unknown", |r| r.content.as_str());
            info!("Updating {} from {} to {}", name, previous, ip);
            let record = update_record(client, config, &record_id, ip).await?;
            Ok(RunOutcome {
                message: format!("updated {} to {}", name, ip),
                record_id: Some(record.id),
            })
        }
        Action::DeleteThenCreate { record_id } => {
            info!("Deleting {} and recreating it with IP {}", name, ip);
            delete_record(client, config, &record_id).await?;
            // No rollback: if the create below fails, the record stays
            // absent until a later run recreates it.
            let record = create_record(client, config, ip).await?;
            Ok(RunOutcome {
                message: format!("recreated {} with IP {}", name, ip),
                record_id: Some(record.id),
            })
        }
    }
}

async fn fetch_existing_record(client: &Client, config: &Config) -> Result<Option<DnsRecord>> {
    let url = format!(
        "{}/zones/{}/dns_records?type={}&name={}",
        CLOUDFLARE_API_BASE, config.zone_id, RECORD_TYPE, config.record_name
    );

    let response: ListResponse = client
        .get(&url)
        .header("X-Auth-Email", &config.email)
        .header("X-Auth-Key", &config.api_key)
        .header("Content-Type", "application/json")
        .send()
        .await
        .context("Failed to send record lookup to Cloudflare")?
        .json()
        .await
        .context("Failed to parse Cloudflare lookup response")?;

    ensure_success(response.success, &response.errors, "record lookup")?;

    // Uniqueness of (type, name) per zone is assumed; the first match is
    // authoritative.
    Ok(response.result.into_iter().next())
}

async fn create_record(client: &Client, config: &Config, ip: Ipv4Addr) -> Result<DnsRecord> {
    let url = format!(
        "{}/zones/{}/dns_records",
        CLOUDFLARE_API_BASE, config.zone_id
    );

    let body = WriteRecordRequest {
        record_type: RECORD_TYPE.to_string(),
        name: config.record_name.clone(),
        content: ip.to_string(),
        ttl: CREATE_TTL,
        proxied: false,
    };

    let response: WriteResponse = client
        .post(&url)
        .header("X-Auth-Email", &config.email)
        .header("X-Auth-Key", &config.api_key)
        .header("Content-Type", "application/json")
        .json(&body)
        .send()
        .await
        .context("Failed to send create request to Cloudflare")?
        .json()
        .await
        .context("Failed to parse Cloudflare create response")?;

    ensure_success(response.success, &response.errors, "record creation")?;

    response
        .result
        .ok_or_else(|| anyhow::anyhow!("No result in Cloudflare create response"))
}

async fn update_record(
    client: &Client,
    config: &Config,
    record_id: &str,
    ip: Ipv4Addr,
) -> Result<DnsRecord> {
    let url = format!(
        "{}/zones/{}/dns_records/{}",
        CLOUDFLARE_API_BASE, config.zone_id, record_id
    );

    let body = WriteRecordRequest {
        record_type: RECORD_TYPE.to_string(),
        name: config.record_name.clone(),
        content: ip.to_string(),
        ttl: UPDATE_TTL,
        proxied: false,
    };

    let response: WriteResponse = client
        .put(&url)
        .header("X-Auth-Email", &config.email)
        .header("X-Auth-Key", &config.api_key)
        .header("Content-Type", "application/json")
        .json(&body)
        .send()
        .await
        .context("Failed to send update request to Cloudflare")?
        .json()
        .await
        .context("Failed to parse Cloudflare update response")?;

    ensure_success(response.success, &response.errors, "record update")?;

    response
        .result
        .ok_or_else(|| anyhow::anyhow!("No result in Cloudflare update response"))
}

async fn delete_record(client: &Client, config: &Config, record_id: &str) -> Result<()> {
    let url = format!(
        "{}/zones/{}/dns_records/{}",
        CLOUDFLARE_API_BASE, config.zone_id, record_id
    );

    let response: DeleteResponse = client
        .delete(&url)
        .header("X-Auth-Email", &config.email)
        .header("X-Auth-Key", &config.api_key)
        .header("Content-Type", "application/json")
        .send()
        .await
        .context("Failed to send delete request to Cloudflare")?
        .json()
        .await
        .context("Failed to parse Cloudflare delete response")?;

    ensure_success(response.success, &response.errors, "record deletion")?;

    if let Some(deleted) = response.result {
        debug!("Cloudflare confirmed deletion of record {}", deleted.id);
    }

    Ok(())
}

fn ensure_success(success: bool, errors: &[ApiError], what: &str) -> Result<()> {
    if success {
        return Ok(());
    }

    let errors: Vec<String> = errors
        .iter()
        .map(|e| format!("{}: {}", e.code, e.message))
        .collect();
    bail!("Cloudflare rejected {}: {}", what, errors.join(", "));
}

// Cloudflare API types

#[derive(Debug, Serialize)]
struct WriteRecordRequest {
    #[serde(rename = "type")]
    record_type: String,
    name: String,
    content: String,
    ttl: u32,
    proxied: bool,
}

#[derive(Debug, Deserialize)]
struct ListResponse {
    success: bool,
    #[serde(default)]
    errors: Vec<ApiError>,
    // An absent result field and an empty list both mean "no record".
    #[serde(default)]
    result: Vec<DnsRecord>,
}

#[derive(Debug, Deserialize)]
struct WriteResponse {
    success: bool,
    #[serde(default)]
    errors: Vec<ApiError>,
    result: Option<DnsRecord>,
}

#[derive(Debug, Deserialize)]
struct DeleteResponse {
    success: bool,
    #[serde(default)]
    errors: Vec<ApiError>,
    result: Option<DeletedRecord>,
}

#[derive(Debug, Deserialize)]
struct DeletedRecord {
    id: String,
}

#[derive(Debug, Deserialize)]
struct ApiError {
    code: i32,
    message: String,
}

#[derive(Debug, Clone, Deserialize)]
struct DnsRecord {
    id: String,
    #[allow(dead_code)]
    #[serde(rename = "type")]
    record_type: String,
    #[allow(dead_code)]
    name: String,
    content: String,
    #[allow(dead_code)]
    #[serde(default)]
    ttl: u32,
    #[allow(dead_code)]
    #[serde(default)]
    proxied: bool,
}
