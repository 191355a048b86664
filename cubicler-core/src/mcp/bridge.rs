//! MCP-over-SSE bridge: correlates inbound MCP HTTP POSTs with a
//! previously-registered SSE client. Transparent to the router — it only
//! interposes on response delivery.

use dashmap::DashMap;
use tokio::sync::mpsc;

use super::jsonrpc::MCPResponse;

/// Writes one JSON-RPC response as the exact `data: <json>\n\n` SSE frame.
pub fn write_sse_line(response: &MCPResponse) -> String {
    let json = serde_json::to_string(response).expect("MCPResponse serialization is infallible");
    format!("data: {json}\n\n")
}

/// Registry of live SSE channels keyed by client id. A re-register replaces
/// the previous channel (last writer wins); at most one channel per client.
pub struct SseRegistry {
    channels: DashMap<String, mpsc::Sender<String>>,
}

impl SseRegistry {
    pub fn new() -> Self {
        Self {
            channels: DashMap::new(),
        }
    }

    /// Registers a new channel for `client_id`, returning the receiving end.
    /// Any previously-registered channel for the same id is dropped.
    pub fn register(&self, client_id: &str) -> mpsc::Receiver<String> {
        let (tx, rx) = mpsc::channel(32);
        self.channels.insert(client_id.to_string(), tx);
        rx
    }

    pub fn unregister(&self, client_id: &str) {
        self.channels.remove(client_id);
    }

    pub fn is_registered(&self, client_id: &str) -> bool {
        self.channels.contains_key(client_id)
    }

    /// Writes `response` as a single SSE frame to the channel registered
    /// under `client_id`, if any.
    pub async fn send(&self, client_id: &str, response: &MCPResponse) -> bool {
        let Some(sender) = self.channels.get(client_id).map(|s| s.clone()) else {
            return false;
        };
        sender.send(write_sse_line(response)).await.is_ok()
    }
}

impl Default for SseRegistry {
    fn default() -> Self {
        Self::new()
    }
}
