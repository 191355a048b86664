//! HTTP MCP transport: POST JSON to `server.url`; non-2xx becomes an MCP
//! error response rather than a transport exception.

use async_trait::async_trait;
use reqwest::Client;
use std::collections::HashMap;
use std::time::Duration;

use super::{McpTransport, TransportError};
use crate::mcp::jsonrpc::{MCPError, MCPResponse, MCPRequest};

fn default_timeout() -> Duration {
    let secs = std::env::var("CUBICLER_DEFAULT_FETCH_TIMEOUT_SECONDS")
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(30);
    Duration::from_secs(secs)
}

pub struct HttpTransport {
    url: String,
    headers: HashMap<String, String>,
    client: Client,
}

impl HttpTransport {
    pub fn new(url: String, headers: HashMap<String, String>) -> Self {
        Self {
            url,
            headers,
            client: Client::builder()
                .timeout(default_timeout())
                .build()
                .expect("reqwest client builds"),
        }
    }

    fn build_request(&self, method: reqwest::Method, url: &str) -> reqwest::RequestBuilder {
        let mut builder = self.client.request(method, url);
        for (k, v) in &self.headers {
            builder = builder.header(k, v);
        }
        builder
    }
}

#[async_trait]
impl McpTransport for HttpTransport {
    async fn initialize(&self) -> Result<(), TransportError> {
        Ok(())
    }

    async fn send_request(&self, request: MCPRequest) -> Result<MCPResponse, TransportError> {
        let id = request.id.clone();
        let resp = self
            .build_request(reqwest::Method::POST, &self.url)
            .json(&request)
            .send()
            .await;

        let resp = match resp {
            Ok(r) => r,
            Err(e) if e.is_timeout() => return Ok(MCPResponse::failure(id, timeout_error())),
            Err(e) => return Err(TransportError::Http(e)),
        };

        if !resp.status().is_success() {
            let status = resp.status();
            return Ok(MCPResponse::failure(
                id,
                MCPError::internal(format!("upstream returned status {status}")),
            ));
        }

        match resp.json::<MCPResponse>().await {
            Ok(parsed) => Ok(parsed),
            Err(e) => Ok(MCPResponse::failure(
                id,
                MCPError::internal(format!("failed to parse upstream response: {e}")),
            )),
        }
    }

    async fn close(&self) -> Result<(), TransportError> {
        Ok(())
    }
}

fn timeout_error() -> MCPError {
    MCPError::internal("request to upstream MCP server timed out")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mcp::jsonrpc::{RequestId, CODE_INTERNAL_ERROR};
    use serde_json::json;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::{TcpListener, TcpStream};

    async fn read_http_request(stream: &mut TcpStream) -> String {
        let mut buf = Vec::new();
        let mut tmp = [0u8; 1024];
        loop {
            let n = stream.read(&mut tmp).await.unwrap();
            if n == 0 {
                break;
            }
            buf.extend_from_slice(&tmp[..n]);
            if let Some(pos) = buf.windows(4).position(|w| w == b"\r\n\r\n") {
                let header_end = pos + 4;
                let headers = String::from_utf8_lossy(&buf[..header_end]).to_string();
                let content_length = headers
                    .lines()
                    .find_map(|line| {
                        let lower = line.to_ascii_lowercase();
                        lower
                            .strip_prefix("content-length:")
                            .and_then(|v| v.trim().parse::<usize>().ok())
                    })
                    .unwrap_or(0);
                let mut body = buf[header_end..].to_vec();
                while body.len() < content_length {
                    let m = stream.read(&mut tmp).await.unwrap();
                    if m == 0 {
                        break;
                    }
                    body.extend_from_slice(&tmp[..m]);
                }
                return String::from_utf8_lossy(&body[..content_length]).to_string();
            }
        }
        String::new()
    }

    async fn write_http_response(stream: &mut TcpStream, status: &str, body: &str) {
        let resp = format!(
            "HTTP/1.1 {status}\r\nContent-Type: application/json\r\nContent-Length: {}\r\n\r\n{body}",
            body.len()
        );
        stream.write_all(resp.as_bytes()).await.unwrap();
    }

    #[tokio::test]
    async fn successful_response_round_trips() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let server = tokio::spawn(async move {
            let (mut stream, _) = listener.accept().await.unwrap();
            let _body = read_http_request(&mut stream).await;
            let body = json!({"jsonrpc":"2.0","id":"1","result":{"tools":[]}}).to_string();
            write_http_response(&mut stream, "200 OK", &body).await;
        });

        let transport = HttpTransport::new(format!("http://{addr}"), HashMap::new());
        let req = MCPRequest::new(RequestId::String("1".into()), "tools/list", None);
        let resp = transport.send_request(req).await.unwrap();
        assert!(resp.error.is_none());
        assert_eq!(resp.result.unwrap()["tools"], json!([]));
        server.await.unwrap();
    }

    #[tokio::test]
    async fn non_2xx_becomes_mcp_error_not_exception() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let server = tokio::spawn(async move {
            let (mut stream, _) = listener.accept().await.unwrap();
            let _body = read_http_request(&mut stream).await;
            write_http_response(&mut stream, "500 Internal Server Error", "oops").await;
        });

        let transport = HttpTransport::new(format!("http://{addr}"), HashMap::new());
        let req = MCPRequest::new(RequestId::Number(1), "tools/list", None);
        let resp = transport.send_request(req).await.unwrap();
        assert!(resp.error.is_some());
        assert_eq!(resp.error.unwrap().code, CODE_INTERNAL_ERROR);
        server.await.unwrap();
    }
}
