use reqwest::{Client, StatusCode};
use serde::Deserialize;
use std::net::Ipv4Addr;
use thiserror::Error;

const IP_ECHO_URL: &str = "http://api.ipify.org/?format=json";

/// Failure while resolving the public address. Always fatal: the run aborts
/// before any DNS API call is attempted.
#[derive(Debug, Error)]
pub enum IpResolveError {
    #[error("request to IP echo service failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("IP echo service returned HTTP {0}")]
    Status(StatusCode),
    #[error("IP echo service returned '{0}', which is not an IPv4 address")]
    NotIpv4(String),
}

#[derive(Debug, Deserialize)]
struct IpEchoBody {
    ip: String,
}

/// Fetches the public IPv4 address of this host from ipify. No caching;
/// every run asks again.
pub async fn resolve_ipv4(client: &Client) -> Result<Ipv4Addr, IpResolveError> {
    let response = client
        .get(IP_ECHO_URL)
        .header("Accept", "application/json")
        .send()
        .await?;

    let status = response.status();
    if !status.is_success() {
        return Err(IpResolveError::Status(status));
    }

    // A body without the `ip` field surfaces as a decode error here.
    let body: IpEchoBody = response.json().await?;

    body.ip.parse().map_err(|_| IpResolveError::NotIpv4(body.ip))
}
