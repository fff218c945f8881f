//! Async HTTP transport wrapping reqwest.
//!
//! One GET per call, no retries. Timeouts, connection errors and non-2xx
//! statuses all surface as a [`TransportFailure`].

use async_trait::async_trait;
use std::time::Duration;
use url::Url;

use crate::error::TransportFailure;
use crate::types::HttpResponse;

/// Issues a single request against the remote service.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn get(&self, url: &Url) -> Result<HttpResponse, TransportFailure>;
}

/// reqwest-backed transport shared by every in-flight request.
#[derive(Clone)]
pub struct HttpTransport {
    client: reqwest::Client,
    timeout: Duration,
}

impl HttpTransport {
    /// Create a client with the given per-request timeout and user agent.
    pub fn new(timeout_ms: u64, user_agent: &str) -> Result<Self, TransportFailure> {
        let timeout = Duration::from_millis(timeout_ms);
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .redirect(reqwest::redirect::Policy::limited(5))
            .user_agent(user_agent)
            .build()
            .map_err(|e| TransportFailure::Request(e.to_string()))?;

        Ok(Self { client, timeout })
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn get(&self, url: &Url) -> Result<HttpResponse, TransportFailure> {
        let resp = self
            .client
            .get(url.clone())
            .timeout(self.timeout)
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            return Err(TransportFailure::Status {
                status: status.as_u16(),
            });
        }

        let final_url = resp.url().to_string();
        let body = resp.text().await?;

        Ok(HttpResponse {
            url: final_url,
            status: status.as_u16(),
            body,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[test]
    fn test_http_transport_creation() {
        let transport = HttpTransport::new(10_000, "feature-harvest-test");
        assert!(transport.is_ok());
    }

    #[tokio::test]
    async fn test_get_success_returns_body() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/find"))
            .and(query_param("searchText", "Banff"))
            .respond_with(ResponseTemplate::new(200).set_body_string(r#"{"results":[]}"#))
            .mount(&server)
            .await;

        let transport = HttpTransport::new(5_000, "test").unwrap();
        let url = Url::parse(&format!("{}/find?searchText=Banff", server.uri())).unwrap();
        let resp = transport.get(&url).await.unwrap();
        assert_eq!(resp.status, 200);
        assert_eq!(resp.body, r#"{"results":[]}"#);
    }

    #[tokio::test]
    async fn test_non_success_status_is_failure() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&server)
            .await;

        let transport = HttpTransport::new(5_000, "test").unwrap();
        let url = Url::parse(&format!("{}/find", server.uri())).unwrap();
        let err = transport.get(&url).await.unwrap_err();
        assert!(matches!(err, TransportFailure::Status { status: 503 }));
    }

    #[tokio::test]
    async fn test_slow_response_times_out() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_string("{}")
                    .set_delay(Duration::from_millis(1_000)),
            )
            .mount(&server)
            .await;

        let transport = HttpTransport::new(100, "test").unwrap();
        let url = Url::parse(&format!("{}/find", server.uri())).unwrap();
        let err = transport.get(&url).await.unwrap_err();
        assert!(matches!(err, TransportFailure::Timeout));
    }
}
