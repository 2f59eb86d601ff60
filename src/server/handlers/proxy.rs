use crate::{
    error::{ProxyError, Result},
    fetch::fetch_origin,
    hls::classify::{self, ResourceClass},
    hls::rewrite::{LineTransform, RewriteStream},
    metrics,
    server::{state::AppState, url_validation::validate_target_url},
};
use axum::{
    body::Body,
    extract::{Query, State},
    http::{HeaderMap, HeaderValue, StatusCode, header},
    response::{IntoResponse, Response},
};
use std::collections::HashMap;
use std::time::Instant;
use tracing::info;
use url::Url;

/// Proxy one HLS resource from the origin to the player.
///
/// Static media streams through byte-for-byte; manifests are piped through
/// the line rewriter so every reference they contain routes back here. Both
/// paths stream: whole documents are never buffered.
pub async fn proxy_media(
    Query(params): Query<HashMap<String, String>>,
    State(state): State<AppState>,
) -> Result<Response> {
    let start = Instant::now();

    // Reject before any outbound traffic: no url, no fetch.
    let url = params
        .get("url")
        .map(String::as_str)
        .filter(|u| !u.is_empty())
        .ok_or(ProxyError::MissingUrl)?;

    let target = validate_target_url(url, state.config.allow_private_origins)?;
    let class = ResourceClass::of(&target);

    info!("Proxying {} as {}", target, class.label());

    let response = match fetch_origin(&state.http_client, &target, &state.config).await {
        Ok(response) => response,
        Err(e) => {
            metrics::record_origin_error();
            metrics::record_request(
                class.label(),
                e.status().map(|s| s.as_u16()).unwrap_or(502),
            );
            return Err(ProxyError::OriginFetch(e));
        }
    };

    let headers = response_headers(&state, &target, class, response.headers());

    let body = match class {
        ResourceClass::Static => Body::from_stream(response.bytes_stream()),
        ResourceClass::Manifest => {
            // Base derivation is string-level on the raw target: everything
            // after the last path slash drops, matching player expectations.
            let base_url = classify::base_url_of(url);
            let transform = LineTransform::new(&base_url, &state.config.proxy_path)?;
            Body::from_stream(RewriteStream::new(response.bytes_stream(), transform))
        }
    };

    metrics::record_request(class.label(), 200);
    metrics::record_duration(class.label(), start);

    Ok((StatusCode::OK, headers, body).into_response())
}

/// Assemble the headers forwarded to the player.
///
/// Only Content-Type, Cache-Control, and (for pass-through bodies)
/// Content-Length survive; everything else from the origin is dropped, which
/// is also what keeps origin CORS headers from leaking past the proxy's own.
fn response_headers(
    state: &AppState,
    target: &Url,
    class: ResourceClass,
    origin: &HeaderMap,
) -> HeaderMap {
    let mut headers = HeaderMap::new();

    let content_type = origin
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_else(|| classify::content_type_for(target));
    if let Ok(value) = HeaderValue::from_str(content_type) {
        headers.insert(header::CONTENT_TYPE, value);
    }

    let cache_control = origin
        .get(header::CACHE_CONTROL)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string)
        .unwrap_or_else(|| {
            let max_age = if class.is_static() {
                state.config.static_cache_secs
            } else {
                state.config.manifest_cache_secs
            };
            format!("public, max-age={max_age}")
        });
    if let Ok(value) = HeaderValue::from_str(&cache_control) {
        headers.insert(header::CACHE_CONTROL, value);
    }

    // Rewriting changes the body length, so Content-Length is only safe to
    // forward on pass-through responses.
    if class.is_static() {
        if let Some(length) = origin.get(header::CONTENT_LENGTH) {
            headers.insert(header::CONTENT_LENGTH, length.clone());
        }
    }

    headers
}
