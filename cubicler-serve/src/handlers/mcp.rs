//! `POST /mcp` and `GET /mcp/sse`: the JSON-RPC router surface and its
//! SSE bridge. A POST tagged with `X-MCP-Client-Id` for a client
//! that has an open SSE stream gets its response delivered over that stream
//! instead of in the HTTP response body.

use axum::body::Body;
use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use std::sync::Arc;
use tokio_stream::wrappers::ReceiverStream;
use tokio_stream::StreamExt;

use crate::response::ApiError;
use crate::state::AppState;
use cubicler_core::mcp::jsonrpc::MCPRequest;

const CLIENT_ID_HEADER: &str = "x-mcp-client-id";

fn client_id(headers: &HeaderMap) -> Option<&str> {
    headers.get(CLIENT_ID_HEADER).and_then(|v| v.to_str().ok())
}

pub async fn handle(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(request): Json<MCPRequest>,
) -> Response {
    let request_id = request.id.clone();
    let response = state.router.handle(request).await;

    if let Some(id) = client_id(&headers) {
        if state.sse.send(id, &response).await {
            return (
                StatusCode::ACCEPTED,
                Json(json!({ "streamed": true, "id": request_id })),
            )
                .into_response();
        }
    }
    Json(response).into_response()
}

pub async fn sse_stream(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<Response, ApiError> {
    let Some(id) = client_id(&headers) else {
        return Err(ApiError(
            StatusCode::BAD_REQUEST,
            format!("missing required header: {CLIENT_ID_HEADER}"),
        ));
    };

    let rx = state.sse.register(id);
    let stream = ReceiverStream::new(rx).map(|frame| Ok::<_, std::io::Error>(frame));
    let body = Body::from_stream(stream);

    Response::builder()
        .status(StatusCode::OK)
        .header("content-type", "text/event-stream")
        .header("cache-control", "no-cache")
        .header("connection", "keep-alive")
        .body(body)
        .map_err(|e| ApiError(StatusCode::INTERNAL_SERVER_ERROR, e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::test_state;
    use cubicler_core::mcp::jsonrpc::RequestId;

    #[tokio::test]
    async fn unregistered_client_id_falls_back_to_inline_response() {
        let state = test_state();
        let mut headers = HeaderMap::new();
        headers.insert(CLIENT_ID_HEADER, "nope".parse().unwrap());
        let request = MCPRequest::new(RequestId::Number(1), "tools/list", None);
        let resp = handle(State(state), headers, Json(request)).await;
        assert_eq!(resp.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn missing_client_id_header_on_sse_stream_is_bad_request() {
        let state = test_state();
        let err = sse_stream(State(state), HeaderMap::new()).await.unwrap_err();
        assert_eq!(err.0, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn registered_client_receives_response_over_sse_not_inline() {
        let state = test_state();
        state.sse.register("client-a");

        let mut headers = HeaderMap::new();
        headers.insert(CLIENT_ID_HEADER, "client-a".parse().unwrap());
        let request = MCPRequest::new(RequestId::Number(2), "tools/list", None);
        let resp = handle(State(state), headers, Json(request)).await;
        assert_eq!(resp.status(), StatusCode::ACCEPTED);
    }
}
