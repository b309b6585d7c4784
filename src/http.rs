use crate::models::Credential;
use reqwest::{Client, RequestBuilder, StatusCode};
use serde::Serialize;
use serde_json::Value;
use std::time::Duration;

/// How a provider expects the secret to be presented.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthScheme {
    /// `Authorization: Bearer <secret>`
    Bearer,
    /// `<header>: <secret>`
    Header(&'static str),
}

/// Raw reply; callers decide what a status code means for them.
#[derive(Debug, Clone)]
pub struct HttpReply {
    pub status: StatusCode,
    pub body: String,
}

impl HttpReply {
    pub fn json(&self) -> Option<Value> {
        serde_json::from_str(&self.body).ok()
    }
}

/// Thin authenticated client bound to one provider base URL and one credential.
pub struct ProviderHttpClient {
    client: Client,
    base_url: String,
    auth: AuthScheme,
    secret: String,
    timeout: Duration,
}

impl ProviderHttpClient {
    pub fn new(
        client: Client,
        base_url: &str,
        auth: AuthScheme,
        credential: &Credential,
        timeout: Duration,
    ) -> Self {
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            auth,
            secret: credential.secret.clone(),
            timeout,
        }
    }

    pub fn url(&self, path: &str) -> String {
        if path.starts_with("http://") || path.starts_with("https://") {
            return path.to_string();
        }
        format!("{}{}", self.base_url, path)
    }

    fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
        match self.auth {
            AuthScheme::Bearer => request.bearer_auth(&self.secret),
            AuthScheme::Header(name) => request.header(name, &self.secret),
        }
    }

    pub async fn post_json<Req: Serialize + ?Sized>(
        &self,
        path: &str,
        body: &Req,
    ) -> Result<HttpReply, reqwest::Error> {
        let url = self.url(path);
        tracing::debug!("POST {}", url);

        let request = self
            .authorize(self.client.post(&url))
            .timeout(self.timeout)
            .json(body);
        self.send(request).await
    }

    pub async fn get(&self, path: &str) -> Result<HttpReply, reqwest::Error> {
        let url = self.url(path);
        tracing::debug!("GET {}", url);

        let request = self.authorize(self.client.get(&url)).timeout(self.timeout);
        self.send(request).await
    }

    async fn send(&self, request: RequestBuilder) -> Result<HttpReply, reqwest::Error> {
        let response = request.send().await.map_err(|e| {
            tracing::error!("Failed to send request to provider: {}", e);
            e
        })?;

        let status = response.status();
        let body = response.text().await?;
        Ok(HttpReply { status, body })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{CredentialTier, Provider};
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn credential() -> Credential {
        Credential {
            provider: Provider::VideoQueue,
            secret: "secret-key-123".to_string(),
            source_tier: CredentialTier::Settings,
        }
    }

    #[tokio::test]
    async fn test_bearer_auth_header_is_sent() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/v1/submit"))
            .and(header("Authorization", "Bearer secret-key-123"))
            .respond_with(ResponseTemplate::new(200).set_body_string("{\"ok\":true}"))
            .expect(1)
            .mount(&server)
            .await;

        let client = ProviderHttpClient::new(
            Client::new(),
            &server.uri(),
            AuthScheme::Bearer,
            &credential(),
            Duration::from_secs(5),
        );
        let reply = client
            .post_json("/v1/submit", &serde_json::json!({"prompt": "x"}))
            .await
            .unwrap();
        assert!(reply.status.is_success());
        assert_eq!(reply.json().unwrap()["ok"], true);
    }

    #[tokio::test]
    async fn test_custom_header_auth_and_non_success_passthrough() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/status/1"))
            .and(header("x-api-key", "secret-key-123"))
            .respond_with(ResponseTemplate::new(503).set_body_string("busy"))
            .mount(&server)
            .await;

        let client = ProviderHttpClient::new(
            Client::new(),
            &format!("{}/", server.uri()),
            AuthScheme::Header("x-api-key"),
            &credential(),
            Duration::from_secs(5),
        );
        let reply = client.get("/status/1").await.unwrap();
        assert_eq!(reply.status, StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(reply.body, "busy");
        assert!(reply.json().is_none());
    }

    #[test]
    fn test_absolute_urls_bypass_base_url() {
        let client = ProviderHttpClient::new(
            Client::new(),
            "https://api.example.test",
            AuthScheme::Bearer,
            &credential(),
            Duration::from_secs(5),
        );
        assert_eq!(
            client.url("/v1/tasks/1"),
            "https://api.example.test/v1/tasks/1"
        );
        assert_eq!(
            client.url("https://files.example.test/result/1"),
            "https://files.example.test/result/1"
        );
    }
}
