//! Forwards a transformed event to its destination URL over HTTP.

use std::time::Duration;

use gateway_core::model::{DispatchStatus, RESPONSE_BODY_CAPTURE_LIMIT};
use reqwest::Client;
use uuid::Uuid;

/// Only these three gateway-generated headers are forwarded to the
/// destination. Arbitrary caller headers are deliberately dropped: a
/// webhook registration does not get to dictate what headers the gateway
/// process sends on its behalf to a third party.
pub const FORWARDED_HEADER_EVENT_ID: &str = "X-Gateway-Event-Id";
pub const FORWARDED_HEADER_WEBHOOK_ID: &str = "X-Gateway-Webhook-Id";
pub const FORWARDED_HEADER_SOURCE_PATH: &str = "X-Gateway-Source-Path";

/// The outcome of one dispatch attempt.
pub struct DispatchResult {
    pub status: DispatchStatus,
    pub status_code: Option<u16>,
    pub response_body: Option<String>,
    pub error: Option<String>,
}

/// Truncates a response body to the audit log's capture limit, on a char
/// boundary so the result is still valid UTF-8.
fn truncate_response_body(body: String) -> String {
    if body.len() <= RESPONSE_BODY_CAPTURE_LIMIT {
        return body;
    }
    let mut end = RESPONSE_BODY_CAPTURE_LIMIT;
    while !body.is_char_boundary(end) {
        end -= 1;
    }
    body[..end].to_string()
}

/// A thin wrapper around a `reqwest::Client` configured with the
/// gateway-wide dispatch timeout, mirroring how the original
/// price-collector built its own client once and reused it for every
/// request.
#[derive(Clone)]
pub struct Dispatcher {
    client: Client,
}

impl Dispatcher {
    pub fn new(timeout: Duration) -> Result<Self, reqwest::Error> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Dispatcher { client })
    }

    pub async fn dispatch(
        &self,
        destination_url: &str,
        event_id: Uuid,
        webhook_id: Uuid,
        source_path: &str,
        payload: &serde_json::Value,
    ) -> DispatchResult {
        let response = self
            .client
            .post(destination_url)
            .header(FORWARDED_HEADER_EVENT_ID, event_id.to_string())
            .header(FORWARDED_HEADER_WEBHOOK_ID, webhook_id.to_string())
            .header(FORWARDED_HEADER_SOURCE_PATH, source_path)
            .json(payload)
            .send()
            .await;

        match response {
            Ok(resp) => {
                let status_code = resp.status().as_u16();
                let is_success = resp.status().is_success();
                let body = resp.text().await.ok().map(truncate_response_body);
                if is_success {
                    DispatchResult {
                        status: DispatchStatus::Success,
                        status_code: Some(status_code),
                        response_body: body,
                        error: None,
                    }
                } else {
                    DispatchResult {
                        status: DispatchStatus::Failed,
                        status_code: Some(status_code),
                        response_body: body,
                        error: Some(format!("destination returned status {status_code}")),
                    }
                }
            }
            Err(err) if err.is_timeout() => DispatchResult {
                status: DispatchStatus::Timeout,
                status_code: None,
                response_body: None,
                error: Some(err.to_string()),
            },
            Err(err) => DispatchResult {
                status: DispatchStatus::Failed,
                status_code: None,
                response_body: None,
                error: Some(err.to_string()),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{Read, Write};
    use std::net::TcpListener;

    /// Spawns a one-shot raw TCP listener that replies with `status_line`
    /// to the first request it receives, as a stand-in destination.
    fn spawn_mock_sink(status_line: &'static str) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        std::thread::spawn(move || {
            if let Ok((mut stream, _)) = listener.accept() {
                let mut buf = [0u8; 1024];
                let _ = stream.read(&mut buf);
                let _ = stream.write_all(
                    format!("{status_line}\r\nContent-Length: 0\r\n\r\n").as_bytes(),
                );
            }
        });
        format!("http://{addr}")
    }

    #[tokio::test]
    async fn success_response_yields_success_status() {
        let url = spawn_mock_sink("HTTP/1.1 200 OK");
        let dispatcher = Dispatcher::new(Duration::from_secs(5)).unwrap();
        let result = dispatcher
            .dispatch(&url, Uuid::new_v4(), Uuid::new_v4(), "orders/new", &serde_json::json!({}))
            .await;
        assert_eq!(result.status, DispatchStatus::Success);
        assert_eq!(result.status_code, Some(200));
    }

    #[tokio::test]
    async fn server_error_yields_failed_status() {
        let url = spawn_mock_sink("HTTP/1.1 500 Internal Server Error");
        let dispatcher = Dispatcher::new(Duration::from_secs(5)).unwrap();
        let result = dispatcher
            .dispatch(&url, Uuid::new_v4(), Uuid::new_v4(), "orders/new", &serde_json::json!({}))
            .await;
        assert_eq!(result.status, DispatchStatus::Failed);
        assert_eq!(result.status_code, Some(500));
    }

    #[tokio::test]
    async fn unreachable_destination_yields_failed_status() {
        let dispatcher = Dispatcher::new(Duration::from_secs(1)).unwrap();
        let result = dispatcher
            .dispatch(
                "http://127.0.0.1:1",
                Uuid::new_v4(),
                Uuid::new_v4(),
                "orders/new",
                &serde_json::json!({}),
            )
            .await;
        assert_eq!(result.status, DispatchStatus::Failed);
        assert!(result.error.is_some());
    }
}
