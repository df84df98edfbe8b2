//! HTTP handlers for partitions and site moves.

use std::sync::Arc;

use axum::body::Body;
use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{Path, Query, State};
use axum::http::header::{CACHE_CONTROL, CONTENT_TYPE, ETAG, IF_NONE_MATCH};
use axum::http::{HeaderMap, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, patch};
use axum::{Json, Router};
use serde_json::{json, Value};
use tower_http::trace::TraceLayer;
use tracing::{debug, error, warn};

use super::validator::WeakValidator;
use crate::cache::DerivedCache;
use crate::site::{RegistryError, SiteRegistry};
use crate::tier::QualityTier;

/// Revalidate on every use.
pub const CACHE_CONTROL_VALUE: &str = "public, max-age=0, must-revalidate";

/// Prefix under which every route is mounted a second time.
pub const API_PREFIX: &str = "/api/v1";

/// Shared handler state.
#[derive(Clone)]
pub struct AppState {
    pub cache: Arc<DerivedCache>,
    pub registry: Arc<dyn SiteRegistry>,
}

impl AppState {
    pub fn new(cache: Arc<DerivedCache>, registry: Arc<dyn SiteRegistry>) -> Self {
        Self { cache, registry }
    }
}

/// Routes mounted at `/` and at [`API_PREFIX`].
pub fn router(state: AppState) -> Router {
    let routes = Router::new()
        .route("/clipped-polygons", get(clipped_polygons))
        .route("/target/:id", patch(update_target));

    Router::new()
        .merge(routes.clone())
        .nest(API_PREFIX, routes)
        .with_state(state)
        .layer(TraceLayer::new_for_http())
}

/// Tier from the first `tier` value, else the first `detail` value sent by
/// older clients. A query that cannot be decoded counts as absent.
fn requested_tier(query: Result<Query<Vec<(String, String)>>, QueryRejection>) -> QualityTier {
    let pairs = query.map(|Query(pairs)| pairs).unwrap_or_default();
    let first = |name: &str| {
        pairs
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    };
    QualityTier::coerce(first("tier").or_else(|| first("detail")))
}

async fn clipped_polygons(
    State(state): State<AppState>,
    query: Result<Query<Vec<(String, String)>>, QueryRejection>,
    headers: HeaderMap,
) -> Response {
    let tier = requested_tier(query);
    let path = state.cache.paths().collection(tier);

    if let Some(validator) = WeakValidator::for_path(&path).await {
        let presented = headers.get(IF_NONE_MATCH).and_then(|v| v.to_str().ok());
        if presented.is_some_and(|v| validator.matches(v)) {
            debug!(tier = %tier, etag = %validator, "Not modified");
            return not_modified(&validator);
        }
    }

    // A persisted collection is served without decoding it.
    let body = match state.cache.read_bytes(tier).await {
        Ok(Some(bytes)) => bytes,
        cached => {
            if let Err(e) = cached {
                warn!(tier = %tier, error = %e, "Unreadable collection, regenerating");
            }
            match generated_bytes(&state, tier).await {
                Ok(bytes) => bytes,
                Err(response) => return response,
            }
        }
    };

    let mut headers = HeaderMap::new();
    headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
    headers.insert(CACHE_CONTROL, HeaderValue::from_static(CACHE_CONTROL_VALUE));
    if let Some(validator) = WeakValidator::for_path(&path).await {
        insert_etag(&mut headers, &validator);
    }
    (StatusCode::OK, headers, Body::from(body)).into_response()
}

/// Generate the tier and return the bytes as persisted, so they match the
/// file's ETag.
async fn generated_bytes(state: &AppState, tier: QualityTier) -> Result<Vec<u8>, Response> {
    let collection = state
        .cache
        .ensure(tier, state.registry.as_ref())
        .await
        .map_err(|e| {
            error!(tier = %tier, error = %e, "Failed to generate clipped polygons");
            generation_failed()
        })?;

    match state.cache.read_bytes(tier).await {
        Ok(Some(bytes)) => Ok(bytes),
        other => {
            if let Err(e) = other {
                warn!(tier = %tier, error = %e, "Falling back to in-memory collection");
            }
            collection.to_bytes().map_err(|e| {
                error!(tier = %tier, error = %e, "Failed to encode collection");
                generation_failed()
            })
        }
    }
}

fn generation_failed() -> Response {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(json!({ "error": "Failed to generate clipped polygons" })),
    )
        .into_response()
}

fn not_modified(validator: &WeakValidator) -> Response {
    let mut headers = HeaderMap::new();
    headers.insert(CACHE_CONTROL, HeaderValue::from_static(CACHE_CONTROL_VALUE));
    insert_etag(&mut headers, validator);
    (StatusCode::NOT_MODIFIED, headers).into_response()
}

fn insert_etag(headers: &mut HeaderMap, validator: &WeakValidator) {
    if let Ok(value) = HeaderValue::from_str(validator.as_str()) {
        headers.insert(ETAG, value);
    }
}

async fn update_target(
    State(state): State<AppState>,
    Path(id): Path<String>,
    body: Result<Json<Value>, JsonRejection>,
) -> Response {
    let Ok(id) = id.parse::<i64>() else {
        return bad_request("Invalid id");
    };
    let coordinates = body.ok().and_then(|Json(v)| {
        let lat = v.get("lat")?.as_f64()?;
        let lng = v.get("lng")?.as_f64()?;
        Some((lat, lng))
    });
    let Some((lat, lng)) = coordinates.filter(|(lat, lng)| lat.is_finite() && lng.is_finite())
    else {
        return bad_request("Invalid lat/lng");
    };

    match state.registry.update_location(id, lat, lng).await {
        Ok(site) => Json(json!({
            "status": "ok",
            "id": site.id,
            "lat": site.lat,
            "lng": site.lng,
        }))
        .into_response(),
        Err(RegistryError::NotFound(_)) => (
            StatusCode::NOT_FOUND,
            Json(json!({ "error": "Target not found" })),
        )
            .into_response(),
        Err(RegistryError::InvalidCoordinates { .. }) => bad_request("Invalid lat/lng"),
        Err(e) => {
            error!(site_id = id, error = %e, "Failed to update target");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "error": "Failed to update target" })),
            )
                .into_response()
        }
    }
}

fn bad_request(message: &str) -> Response {
    (StatusCode::BAD_REQUEST, Json(json!({ "error": message }))).into_response()
}
