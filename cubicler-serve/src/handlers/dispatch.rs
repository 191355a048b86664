//! `POST /dispatch` and `POST /dispatch/:agent_id`.

use axum::extract::{Path, State};
use axum::Json;
use std::sync::Arc;

use crate::response::ApiError;
use crate::state::AppState;
use cubicler_core::{DispatchRequest, DispatchResponse};

pub async fn dispatch_default(
    State(state): State<Arc<AppState>>,
    Json(request): Json<DispatchRequest>,
) -> Result<Json<DispatchResponse>, ApiError> {
    let resp = state.dispatch.dispatch(None, request).await?;
    Ok(Json(resp))
}

pub async fn dispatch_agent(
    State(state): State<Arc<AppState>>,
    Path(agent_id): Path<String>,
    Json(request): Json<DispatchRequest>,
) -> Result<Json<DispatchResponse>, ApiError> {
    let resp = state.dispatch.dispatch(Some(&agent_id), request).await?;
    Ok(Json(resp))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::test_state;
    use axum::http::StatusCode;
    use cubicler_core::Message;

    #[tokio::test]
    async fn dispatch_with_no_agents_configured_is_a_server_error() {
        let state = test_state();
        let request = DispatchRequest {
            messages: vec![Message::User { content: "hi".into() }],
        };
        let err = dispatch_default(State(state), Json(request)).await.unwrap_err();
        assert_eq!(err.0, StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[tokio::test]
    async fn dispatch_unknown_agent_is_not_found() {
        let state = test_state();
        let request = DispatchRequest {
            messages: vec![Message::User { content: "hi".into() }],
        };
        let err = dispatch_agent(State(state), Path("nope".into()), Json(request))
            .await
            .unwrap_err();
        assert_eq!(err.0, StatusCode::NOT_FOUND);
    }
}
