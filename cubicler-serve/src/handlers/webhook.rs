//! `POST /webhook/:identifier`: inbound webhook entry point.
//! Accepts an optional `?agent=` query override; authentication reads the
//! `x-signature-256` and `authorization` headers against the exact raw
//! body bytes (the signature header falls back to a top-level `signature`
//! field in the body itself, checked by the webhook service).

use axum::body::Bytes;
use axum::extract::{Path, Query, State};
use axum::http::HeaderMap;
use axum::Json;
use std::collections::HashMap;
use std::sync::Arc;

use crate::response::ApiError;
use crate::state::AppState;
use cubicler_core::DispatchResponse;

pub async fn handle(
    State(state): State<Arc<AppState>>,
    Path(identifier): Path<String>,
    Query(query): Query<HashMap<String, String>>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<DispatchResponse>, ApiError> {
    let agent = query.get("agent").map(String::as_str);
    let signature = headers.get("x-signature-256").and_then(|v| v.to_str().ok());
    let bearer = headers.get("authorization").and_then(|v| v.to_str().ok());

    let resp = state
        .webhook
        .process(&identifier, agent, signature, bearer, &body)
        .await?;
    Ok(Json(resp))
}
