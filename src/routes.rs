use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::header::CONTENT_TYPE,
    response::{IntoResponse, Response},
    routing::{get, post},
};
use serde_json::{Value, json};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use crate::{
    AppState,
    error::{AppError, AppResult},
    models::{CountryFilter, CountryView, ListQuery, RefreshSummary, StatusView, from_epoch},
    refresh,
};

const COUNTRY_NOT_FOUND: &str = "Country not found";
const IMAGE_NOT_FOUND: &str = "Summary image not found";

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/countries", get(list_countries))
        .route("/countries/refresh", post(refresh_countries))
        .route("/countries/image", get(summary_image))
        .route("/countries/{name}", get(get_country).delete(delete_country))
        .route("/status", get(status))
        .with_state(state)
        .layer(CorsLayer::new().allow_origin(Any).allow_headers(Any))
        .layer(TraceLayer::new_for_http())
}

pub async fn refresh_countries(
    State(state): State<Arc<AppState>>,
) -> AppResult<Json<RefreshSummary>> {
    let outcome = refresh::refresh(&state.upstream, &state.store, &state.summary).await?;

    Ok(Json(RefreshSummary {
        message: "Countries refreshed successfully",
        total_countries: outcome.total_countries,
        processed: outcome.processed,
    }))
}

pub async fn list_countries(
    State(state): State<Arc<AppState>>,
    Query(q): Query<ListQuery>,
) -> AppResult<Json<Vec<CountryView>>> {
    let filter = CountryFilter::from(q);
    let countries = state.store.list(&filter).await?;
    Ok(Json(countries.into_iter().map(CountryView::from).collect()))
}

pub async fn get_country(
    State(state): State<Arc<AppState>>,
    Path(name): Path<String>,
) -> AppResult<Json<CountryView>> {
    let country =
        state.store.find_by_name(&name).await?.ok_or(AppError::NotFound(COUNTRY_NOT_FOUND))?;
    Ok(Json(country.into()))
}

pub async fn delete_country(
    State(state): State<Arc<AppState>>,
    Path(name): Path<String>,
) -> AppResult<Json<Value>> {
    if !state.store.delete_by_name(&name).await? {
        return Err(AppError::NotFound(COUNTRY_NOT_FOUND));
    }
    tracing::debug!(country = %name, "deleted country");
    Ok(Json(json!({ "message": format!("Country '{name}' deleted successfully") })))
}

pub async fn status(State(state): State<Arc<AppState>>) -> AppResult<Json<StatusView>> {
    let total_countries = state.store.count().await?;
    let last_refreshed_at = state.store.status().await?.map(|s| from_epoch(s.last_refreshed_at));
    Ok(Json(StatusView { total_countries, last_refreshed_at }))
}

pub async fn summary_image(State(state): State<Arc<AppState>>) -> AppResult<Response> {
    let bytes = match tokio::fs::read(state.summary.image_path()).await {
        Ok(bytes) => bytes,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
            return Err(AppError::NotFound(IMAGE_NOT_FOUND));
        },
        Err(err) => return Err(anyhow::Error::new(err).context("reading summary image").into()),
    };

    Ok(([(CONTENT_TYPE, "image/png")], bytes).into_response())
}
