//! SSE MCP transport: opens a long-lived event stream for receiving,
//! correlates POSTed requests with streamed responses by `id`.

use async_trait::async_trait;
use dashmap::DashMap;
use futures_util::StreamExt;
use reqwest::Client;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::oneshot;

use super::{McpTransport, TransportError};
use crate::mcp::jsonrpc::{MCPRequest, MCPResponse, RequestId};

type PendingMap = Arc<DashMap<RequestId, oneshot::Sender<MCPResponse>>>;

pub struct SseTransport {
    url: String,
    headers: HashMap<String, String>,
    client: Client,
    pending: PendingMap,
}

impl SseTransport {
    pub fn new(url: String, headers: HashMap<String, String>) -> Self {
        Self {
            url,
            headers,
            client: Client::builder()
                .timeout(Duration::from_secs(30))
                .build()
                .expect("reqwest client builds"),
            pending: Arc::new(DashMap::new()),
        }
    }

    fn request_builder(&self, method: reqwest::Method, url: &str) -> reqwest::RequestBuilder {
        let mut builder = self.client.request(method, url);
        for (k, v) in &self.headers {
            builder = builder.header(k, v);
        }
        builder
    }

    async fn open_stream(&self) -> Result<(), TransportError> {
        let resp = self
            .request_builder(reqwest::Method::GET, &self.url)
            .header("Accept", "text/event-stream")
            .send()
            .await?;
        if !resp.status().is_success() {
            return Err(TransportError::InitFailed(format!(
                "SSE stream returned status {}",
                resp.status()
            )));
        }

        let pending = Arc::clone(&self.pending);
        let mut stream = resp.bytes_stream();
        tokio::spawn(async move {
            let mut buf = String::new();
            while let Some(chunk) = stream.next().await {
                let Ok(chunk) = chunk else { break };
                buf.push_str(&String::from_utf8_lossy(&chunk));
                while let Some(pos) = buf.find("\n\n") {
                    let frame: String = buf.drain(..pos + 2).collect();
                    for line in frame.lines() {
                        if let Some(data) = line.strip_prefix("data:") {
                            if let Ok(resp) =
                                serde_json::from_str::<MCPResponse>(data.trim())
                            {
                                if let Some((_, sender)) = pending.remove(&resp.id) {
                                    let _ = sender.send(resp);
                                }
                            }
                        }
                    }
                }
            }
        });
        Ok(())
    }
}

#[async_trait]
impl McpTransport for SseTransport {
    async fn initialize(&self) -> Result<(), TransportError> {
        self.open_stream().await
    }

    async fn send_request(&self, request: MCPRequest) -> Result<MCPResponse, TransportError> {
        let id = request.id.clone();
        let (tx, rx) = oneshot::channel();
        self.pending.insert(id.clone(), tx);

        if let Err(e) = self
            .request_builder(reqwest::Method::POST, &self.url)
            .json(&request)
            .send()
            .await
        {
            self.pending.remove(&id);
            return Err(TransportError::Http(e));
        }

        match tokio::time::timeout(Duration::from_secs(30), rx).await {
            Ok(Ok(resp)) => Ok(resp),
            _ => {
                self.pending.remove(&id);
                Err(TransportError::Timeout)
            }
        }
    }

    async fn close(&self) -> Result<(), TransportError> {
        Ok(())
    }
}
