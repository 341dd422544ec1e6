use std::time::Duration;

use async_trait::async_trait;
use serde_json::json;

use crate::{
    config::HttpApiConfig,
    error::{Result, TransportError},
    message::EmailMessage,
    r#trait::Transport,
};

/// Delivery through a JSON mail API with bearer-token authentication.
///
/// The request body is `{"from", "to", "subject", "html"}`; any 2xx answer
/// counts as accepted and everything else surfaces as a provider error
/// carrying the response body.
pub struct HttpApiTransport {
    client: reqwest::Client,
    endpoint: String,
    api_key: String,
    from: String,
}

impl HttpApiTransport {
    /// Build an HTTP client for the configured endpoint.
    ///
    /// # Errors
    ///
    /// Returns an error when the endpoint is missing or the client cannot
    /// be constructed.
    pub fn connect(config: &HttpApiConfig) -> Result<Self> {
        if config.endpoint.is_empty() {
            return Err(TransportError::Configuration(
                "api endpoint is empty".to_string(),
            ));
        }

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| TransportError::Configuration(e.to_string()))?;

        Ok(Self {
            client,
            endpoint: config.endpoint.clone(),
            api_key: config.api_key.clone(),
            from: config.from.clone(),
        })
    }
}

#[async_trait]
impl Transport for HttpApiTransport {
    async fn send(&self, message: &EmailMessage) -> Result<()> {
        let payload = json!({
            "from": self.from,
            "to": message.to,
            "subject": message.subject,
            "html": message.html_body,
        });

        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .json(&payload)
            .send()
            .await
            .map_err(|e| TransportError::Connection(e.to_string()))?;

        let status = response.status();
        if status.is_success() {
            return Ok(());
        }

        let body = response.text().await.unwrap_or_default();
        Err(TransportError::Provider {
            status: status.as_u16(),
            body,
        })
    }

    fn kind(&self) -> &'static str {
        "http_api"
    }
}

#[cfg(test)]
mod tests {
    use tokio::{
        io::{AsyncReadExt, AsyncWriteExt},
        net::TcpListener,
        sync::oneshot,
    };

    use super::*;

    /// Answers exactly one request with a canned status and body, handing
    /// the raw request bytes back for inspection.
    async fn one_shot_server(
        status_line: &'static str,
        body: &'static str,
    ) -> (String, oneshot::Receiver<String>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
        let addr = listener.local_addr().expect("local addr");
        let (tx, rx) = oneshot::channel();

        tokio::spawn(async move {
            if let Ok((mut stream, _peer)) = listener.accept().await {
                let mut request = Vec::new();
                let mut chunk = vec![0u8; 4096];
                loop {
                    match stream.read(&mut chunk).await {
                        Ok(0) | Err(_) => break,
                        Ok(n) => {
                            request.extend_from_slice(&chunk[..n]);
                            // the JSON payload closes the request
                            if request.ends_with(b"}") {
                                break;
                            }
                        }
                    }
                }

                let response = format!(
                    "HTTP/1.1 {status_line}\r\ncontent-length: {}\r\nconnection: close\r\n\r\n{body}",
                    body.len()
                );
                let _ = stream.write_all(response.as_bytes()).await;
                let _ = stream.shutdown().await;
                let _ = tx.send(String::from_utf8_lossy(&request).into_owned());
            }
        });

        (format!("http://{addr}/v1/send"), rx)
    }

    fn transport_for(endpoint: String) -> HttpApiTransport {
        HttpApiTransport::connect(&HttpApiConfig {
            endpoint,
            api_key: "secret-key".to_string(),
            from: "news@example.com".to_string(),
            timeout_secs: 5,
        })
        .expect("connect")
    }

    fn test_message() -> EmailMessage {
        EmailMessage {
            to: "guest@example.com".to_string(),
            subject: "Hello".to_string(),
            html_body: "<p>Hi</p>".to_string(),
        }
    }

    #[tokio::test]
    async fn test_accepted_on_success_status() {
        let (endpoint, request) = one_shot_server("200 OK", "{}").await;
        let transport = transport_for(endpoint);

        transport.send(&test_message()).await.expect("send");

        let request = request.await.expect("request captured");
        assert!(request.contains("Bearer secret-key"));
        assert!(request.contains(r#""to":"guest@example.com""#));
        assert!(request.contains(r#""from":"news@example.com""#));
    }

    #[tokio::test]
    async fn test_error_status_carries_provider_body() {
        let (endpoint, _request) = one_shot_server("422 Unprocessable Entity", "bad address").await;
        let transport = transport_for(endpoint);

        let result = transport.send(&test_message()).await;
        match result {
            Err(TransportError::Provider { status, body }) => {
                assert_eq!(status, 422);
                assert_eq!(body, "bad address");
            }
            other => panic!("expected provider error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_server_errors_classify_as_temporary() {
        let (endpoint, _request) = one_shot_server("503 Service Unavailable", "try later").await;
        let transport = transport_for(endpoint);

        let error = transport.send(&test_message()).await.expect_err("send fails");
        assert!(error.is_temporary());
    }

    #[test]
    fn test_connect_rejects_empty_endpoint() {
        let result = HttpApiTransport::connect(&HttpApiConfig {
            endpoint: String::new(),
            api_key: "secret".to_string(),
            from: "news@example.com".to_string(),
            timeout_secs: 5,
        });
        assert!(matches!(result, Err(TransportError::Configuration(_))));
    }
}
