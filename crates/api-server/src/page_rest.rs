//! Page composition endpoints: audience-targeted component lists.

use std::collections::HashMap;

use axum::extract::{Path, RawQuery, State};
use axum::Json;
use serde::{Deserialize, Serialize};
use storefront_core::ComponentDescriptor;
use storefront_targeting::{resolve, AudienceTargeting, PageResolution, RequestAttributes};

use crate::error::ApiError;
use crate::rest::AppState;

#[derive(Debug, Deserialize)]
pub struct ResolveRequest {
    #[serde(default)]
    pub targeting: Option<serde_json::Value>,
    #[serde(default)]
    pub default_components: Vec<ComponentDescriptor>,
    /// Query parameters of the visitor's request.
    #[serde(default)]
    pub query: HashMap<String, String>,
}

#[derive(Debug, Serialize)]
pub struct ResolveResponse {
    pub variant: Option<String>,
    pub personalized: bool,
    pub components: Vec<ComponentDescriptor>,
}

/// Where the targeting config of a resolution came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TargetingSource {
    /// Page documents owned by the site.
    Content,
    /// Config posted by the caller; its variant names are never used as labels.
    Inline,
}

/// Label value for a matched variant.
fn variant_label(variant: &str, source: TargetingSource) -> String {
    match source {
        TargetingSource::Content => variant.to_string(),
        TargetingSource::Inline => "inline".to_string(),
    }
}

fn record_resolution(variant: Option<&str>, personalized: bool, source: TargetingSource) {
    match variant {
        Some(name) => {
            metrics::counter!("targeting.variant_matched", "variant" => variant_label(name, source))
                .increment(1);
        }
        None => metrics::counter!("targeting.default_served").increment(1),
    }
    if variant.is_some() && !personalized {
        metrics::counter!("targeting.empty_variant_fallback").increment(1);
    }
}

/// GET /v1/pages/:slug — Page components for this visitor's query string.
pub async fn get_page(
    State(state): State<AppState>,
    Path(slug): Path<String>,
    RawQuery(query): RawQuery,
) -> Result<Json<PageResolution>, ApiError> {
    let page = state
        .content
        .load_page(&slug)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("page '{slug}' not found")))?;

    let attrs = RequestAttributes::from_query(query.as_deref().unwrap_or_default());
    let resolution = state.resolver.resolve_page(&page, &attrs);
    record_resolution(
        resolution.variant.as_deref(),
        resolution.personalized,
        TargetingSource::Content,
    );

    Ok(Json(resolution))
}

/// POST /v1/targeting/resolve — Resolve an inline targeting config.
pub async fn resolve_targeting(
    State(state): State<AppState>,
    Json(request): Json<ResolveRequest>,
) -> Json<ResolveResponse> {
    let targeting = if state.resolver.is_enabled() {
        request
            .targeting
            .as_ref()
            .and_then(AudienceTargeting::<ComponentDescriptor>::from_value_lenient)
    } else {
        None
    };
    let attrs = RequestAttributes::from_pairs(request.query);
    let resolution = resolve(targeting.as_ref(), &request.default_components, &attrs);
    record_resolution(resolution.variant, resolution.personalized, TargetingSource::Inline);

    Json(ResolveResponse {
        variant: resolution.variant.map(str::to_string),
        personalized: resolution.personalized,
        components: resolution.components.to_vec(),
    })
}
