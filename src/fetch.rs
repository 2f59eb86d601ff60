//! Outbound origin fetch.
//!
//! Centralizes the header spoofing every origin request needs: media CDNs
//! routinely reject requests that lack a browser User-Agent or a Referer and
//! Origin matching their player page, so those headers are a functional
//! requirement here, not cosmetics. Retry is deliberately absent; failures
//! surface immediately and the caller decides what the client sees.

use crate::config::Config;
use reqwest::{Client, Response, header};
use tracing::warn;
use url::Url;

/// Issue the GET for a proxied resource.
///
/// Sends `Accept: */*` plus the configured User-Agent, Referer, and an Origin
/// derived from the Referer. Redirects and the per-request timeout are
/// properties of the shared client.
///
/// # Errors
///
/// Returns the transport error, or the non-2xx status error from
/// `error_for_status`, for the caller to map onto the client response.
pub async fn fetch_origin(
    client: &Client,
    target: &Url,
    config: &Config,
) -> Result<Response, reqwest::Error> {
    let response = client
        .get(target.clone())
        .header(header::ACCEPT, "*/*")
        .header(header::USER_AGENT, config.user_agent.as_str())
        .header(header::REFERER, config.referer.as_str())
        .header(header::ORIGIN, referer_origin(&config.referer))
        .send()
        .await
        .inspect_err(|e| warn!("Origin fetch failed for {}: {}", target, e))?;

    if !response.status().is_success() {
        warn!(
            "Origin returned {} for {}",
            response.status(),
            target
        );
    }

    response.error_for_status()
}

/// Origin form (`scheme://host[:port]`) of the configured Referer.
///
/// Falls back to the Referer string with its trailing slash trimmed if it
/// does not parse as a URL.
fn referer_origin(referer: &str) -> String {
    Url::parse(referer)
        .map(|u| u.origin().ascii_serialization())
        .unwrap_or_else(|_| referer.trim_end_matches('/').to_string())
}
