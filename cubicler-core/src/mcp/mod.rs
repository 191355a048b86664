//! MCP surface Cubicler itself exposes: the JSON-RPC envelope, the router
//! that dispatches it across providers, and the SSE correlation bridge.

pub mod bridge;
pub mod jsonrpc;
pub mod router;
