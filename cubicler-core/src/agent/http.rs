//! HTTP agent transport: POST the `AgentRequest` as JSON to the configured
//! agent URL, parse and validate the `AgentResponse`.

use async_trait::async_trait;
use std::collections::HashMap;
use std::time::Duration;

use super::{AgentTransport, AgentTransportError};
use crate::model::{AgentRequest, AgentResponse};

pub struct HttpAgentTransport {
    url: String,
    headers: HashMap<String, String>,
    client: reqwest::Client,
}

impl HttpAgentTransport {
    pub fn new(url: String, headers: HashMap<String, String>) -> Self {
        Self {
            url,
            headers,
            client: reqwest::Client::builder()
                .timeout(Duration::from_secs(60))
                .build()
                .expect("reqwest client builds"),
        }
    }
}

#[async_trait]
impl AgentTransport for HttpAgentTransport {
    async fn dispatch(&self, request: AgentRequest) -> Result<AgentResponse, AgentTransportError> {
        let mut builder = self.client.post(&self.url).json(&request);
        for (k, v) in &self.headers {
            builder = builder.header(k, v);
        }
        let resp = builder.send().await?;
        if !resp.status().is_success() {
            return Err(AgentTransportError::InvalidAgentResponse(format!(
                "agent returned status {}",
                resp.status()
            )));
        }
        let parsed: AgentResponse = resp
            .json()
            .await
            .map_err(|e| AgentTransportError::InvalidAgentResponse(e.to_string()))?;
        if !parsed.is_valid() {
            return Err(AgentTransportError::InvalidAgentResponse(
                "missing required fields".to_string(),
            ));
        }
        Ok(parsed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
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

    fn sample_request() -> AgentRequest {
        AgentRequest {
            agent: crate::model::AgentSummary {
                identifier: "main".to_string(),
                name: "Main".to_string(),
                description: "d".to_string(),
                prompt: None,
            },
            tools: vec![],
            servers: vec![],
            messages: vec![],
        }
    }

    #[tokio::test]
    async fn valid_agent_response_round_trips() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let server = tokio::spawn(async move {
            let (mut stream, _) = listener.accept().await.unwrap();
            let _body = read_http_request(&mut stream).await;
            let body = json!({
                "timestamp": "2026-01-01T00:00:00Z",
                "type": "text",
                "content": "hello",
                "metadata": {},
            })
            .to_string();
            write_http_response(&mut stream, "200 OK", &body).await;
        });

        let transport = HttpAgentTransport::new(format!("http://{addr}"), HashMap::new());
        let response = transport.dispatch(sample_request()).await.unwrap();
        assert_eq!(response.content.as_deref(), Some("hello"));
        server.await.unwrap();
    }

    #[tokio::test]
    async fn non_2xx_status_is_invalid_agent_response() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let server = tokio::spawn(async move {
            let (mut stream, _) = listener.accept().await.unwrap();
            let _body = read_http_request(&mut stream).await;
            write_http_response(&mut stream, "503 Service Unavailable", "down").await;
        });

        let transport = HttpAgentTransport::new(format!("http://{addr}"), HashMap::new());
        let err = transport.dispatch(sample_request()).await.unwrap_err();
        assert!(matches!(err, AgentTransportError::InvalidAgentResponse(_)));
        server.await.unwrap();
    }
}
