use std::sync::Arc;

use axum::body::Bytes;
use axum::extract::State;
use axum::http::{Method, StatusCode, Uri};
use axum::response::{IntoResponse, Response};
use axum::routing::{any, get};
use axum::{Json, Router};
use chrono::Utc;
use serde_json::json;
use tracing::{error, info, warn};
use usdt_bob_common::config::{Platform, RESPONSE_CACHE_SECS};
use usdt_bob_common::{CriteriaOverrides, ProxyRatesPayload, SearchCriteria};

use crate::feed::RateFeed;

/// Shared state behind every route.
#[derive(Clone)]
pub struct AppState {
    pub feed: Arc<dyn RateFeed>,
}

impl AppState {
    pub fn new(feed: Arc<dyn RateFeed>) -> Self {
        Self { feed }
    }
}

/// Build the service router: the same proxy handler mounted under each
/// platform path, plus the small service-check endpoints.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route(Platform::Vercel.route(), any(vercel_proxy))
        .route(Platform::Netlify.route(), any(netlify_proxy))
        .route("/api/test", get(service_check))
        .route("/api/index", get(endpoint_index))
        .with_state(state)
}

async fn vercel_proxy(State(state): State<AppState>, method: Method, body: Bytes) -> Response {
    proxy_route(Platform::Vercel, state, method, body).await
}

async fn netlify_proxy(State(state): State<AppState>, method: Method, body: Bytes) -> Response {
    proxy_route(Platform::Netlify, state, method, body).await
}

/// The proxy endpoint, shared by both platform routes.
///
/// Answers CORS preflights itself, rejects everything but POST, and never
/// returns an error status for a POST: when the live fetch fails the
/// response degrades to the fixed fallback payload, still HTTP 200.
async fn proxy_route(platform: Platform, state: AppState, method: Method, body: Bytes) -> Response {
    if method == Method::OPTIONS {
        return (StatusCode::OK, cors_headers(), ()).into_response();
    }

    if method != Method::POST {
        warn!("⚠️ [{}] {} request rejected", platform.label(), method);
        return (
            StatusCode::METHOD_NOT_ALLOWED,
            cors_headers(),
            Json(json!({ "error": "Method not allowed" })),
        )
            .into_response();
    }

    let criteria = merge_criteria(&body);
    info!(
        "📡 [{}] searching {}/{} {} listings",
        platform.label(),
        criteria.asset,
        criteria.fiat,
        criteria.trade_type
    );

    match state.feed.fetch_rates(&criteria).await {
        Ok(rates) => {
            info!(
                "✅ [{}] {} listings aggregated - min: Bs.{:.2}, avg: Bs.{:.2}",
                platform.label(),
                rates.count,
                rates.min,
                rates.avg
            );
            let payload = ProxyRatesPayload::realtime(rates.min, rates.avg, rates.count, platform);
            (
                StatusCode::OK,
                cors_headers(),
                [cache_directive()],
                Json(payload),
            )
                .into_response()
        }
        Err(e) => {
            error!("❌ [{}] live fetch failed: {:#}", platform.label(), e);
            let payload = ProxyRatesPayload::platform_fallback(platform, format!("{:#}", e));
            (StatusCode::OK, cors_headers(), Json(payload)).into_response()
        }
    }
}

/// Quick liveness probe, mirrors the hosted function of the same path.
async fn service_check(method: Method, uri: Uri) -> impl IntoResponse {
    (
        cors_headers(),
        Json(json!({
            "message": "Rate proxy is working!",
            "timestamp": Utc::now().to_rfc3339(),
            "method": method.as_str(),
            "url": uri.to_string(),
        })),
    )
}

/// Directory of everything this service serves.
async fn endpoint_index() -> impl IntoResponse {
    let endpoints = json!([
        { "path": "/api/test", "description": "Service check" },
        { "path": Platform::Vercel.route(), "description": "Binance P2P rate proxy" },
        { "path": Platform::Netlify.route(), "description": "Binance P2P rate proxy (netlify path)" },
        { "path": "/api/index", "description": "This directory" },
    ]);

    (
        cors_headers(),
        Json(json!({
            "message": "API directory is working!",
            "timestamp": Utc::now().to_rfc3339(),
            "available_endpoints": endpoints,
        })),
    )
}

/// Merge caller overrides over the default search criteria. A missing or
/// malformed body keeps the defaults, exactly like the hosted functions.
fn merge_criteria(body: &Bytes) -> SearchCriteria {
    let defaults = SearchCriteria::default();
    if body.is_empty() {
        return defaults;
    }

    match serde_json::from_slice::<CriteriaOverrides>(body) {
        Ok(overrides) => defaults.merged(overrides),
        Err(e) => {
            warn!("⚠️ Using default criteria, request body did not parse: {}", e);
            defaults
        }
    }
}

fn cors_headers() -> [(&'static str, &'static str); 3] {
    [
        ("access-control-allow-origin", "*"),
        ("access-control-allow-methods", "POST, OPTIONS"),
        ("access-control-allow-headers", "Content-Type"),
    ]
}

fn cache_directive() -> (&'static str, String) {
    (
        "cache-control",
        format!("public, max-age={}", RESPONSE_CACHE_SECS),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_body_keeps_defaults() {
        let criteria = merge_criteria(&Bytes::new());
        assert_eq!(criteria, SearchCriteria::default());
    }

    #[test]
    fn test_body_overrides_are_merged() {
        let body = Bytes::from_static(br#"{"tradeType":"SELL","rows":20}"#);
        let criteria = merge_criteria(&body);

        assert_eq!(criteria.trade_type, "SELL");
        assert_eq!(criteria.rows, 20);
        assert_eq!(criteria.asset, "USDT");
        assert_eq!(criteria.fiat, "BOB");
    }

    #[test]
    fn test_malformed_body_keeps_defaults() {
        let body = Bytes::from_static(b"definitely not json");
        let criteria = merge_criteria(&body);
        assert_eq!(criteria, SearchCriteria::default());
    }

    #[test]
    fn test_cache_directive_advertises_five_minutes() {
        let (name, value) = cache_directive();
        assert_eq!(name, "cache-control");
        assert_eq!(value, "public, max-age=300");
    }
}
