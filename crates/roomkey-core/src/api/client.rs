//! API client for the hotel booking backend.
//!
//! This module provides the `ApiClient` struct for the auth and profile
//! endpoints. Requests are built, run through the middleware chain, sent, and
//! their responses checked and decoded in one place.

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::{header, Client, Method, Request, Url};
use serde::{de::DeserializeOwned, Serialize};
use tracing::{debug, warn};

use super::middleware::{BearerAuth, JsonHeaders, RequestMiddleware};
use super::{ApiError, ApiResult, AuthApi};
use crate::auth::TokenStore;
use crate::config::Config;
use crate::models::user::ProfileEnvelope;
use crate::models::{LoginResponse, RegisterRequest, SignInRequest, UserProfile};

// ============================================================================
// Constants
// ============================================================================

/// HTTP request timeout in seconds.
/// 30s allows for slow mobile networks while failing fast enough for good UX.
pub const REQUEST_TIMEOUT_SECS: u64 = 30;

const REGISTER_PATH: &str = "/auth/register";
const LOGIN_PATH: &str = "/auth/login";
const PROFILE_PATH: &str = "/profile";

/// API client for the booking backend.
/// Clone is cheap - reqwest::Client and the middleware chain are shared via Arc.
#[derive(Clone)]
pub struct ApiClient {
    client: Client,
    base_url: String,
    middleware: Vec<Arc<dyn RequestMiddleware>>,
}

impl ApiClient {
    /// Create a client that reads its bearer token from `store`
    pub fn new(base_url: &str, store: Arc<dyn TokenStore>) -> Result<Self> {
        Self::with_timeout(base_url, Duration::from_secs(REQUEST_TIMEOUT_SECS), store)
    }

    pub fn with_timeout(
        base_url: &str,
        timeout: Duration,
        store: Arc<dyn TokenStore>,
    ) -> Result<Self> {
        Url::parse(base_url).with_context(|| format!("Invalid API base URL: {}", base_url))?;

        let client = Client::builder()
            .timeout(timeout)
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            middleware: vec![Arc::new(JsonHeaders), Arc::new(BearerAuth::new(store))],
        })
    }

    pub fn from_config(config: &Config, store: Arc<dyn TokenStore>) -> Result<Self> {
        Self::with_timeout(&config.api_base_url(), config.request_timeout(), store)
    }

    /// Append a stage to the request pipeline; it runs after the built-in ones.
    pub fn with_middleware(mut self, middleware: Arc<dyn RequestMiddleware>) -> Self {
        self.middleware.push(middleware);
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    /// Build a request and run it through the middleware chain.
    pub fn build_request<B: Serialize + ?Sized>(
        &self,
        method: Method,
        path: &str,
        body: Option<&B>,
    ) -> ApiResult<Request> {
        let mut builder = self.client.request(method, self.url(path));
        if let Some(body) = body {
            builder = builder.json(body);
        }
        let mut request = builder.build().map_err(ApiError::Network)?;

        for stage in &self.middleware {
            stage.handle(&mut request)?;
        }
        Ok(request)
    }

    /// Check if response is successful, returning an error with body if not.
    async fn check_response(response: reqwest::Response) -> ApiResult<reqwest::Response> {
        if response.status().is_success() {
            Ok(response)
        } else {
            let status = response.status();
            let path = response.url().path().to_string();
            let body = response.text().await.unwrap_or_default();
            warn!(status = %status, path = %path, "Request failed");
            Err(ApiError::from_status(status, &body))
        }
    }

    async fn execute<T: DeserializeOwned>(&self, request: Request) -> ApiResult<T> {
        let method = request.method().clone();
        let path = request.url().path().to_string();
        debug!(
            %method,
            path = %path,
            authorized = request.headers().contains_key(header::AUTHORIZATION),
            "Sending request"
        );

        let response = self.client.execute(request).await?;
        let status = response.status();
        let response = Self::check_response(response).await?;

        let text = response.text().await?;
        debug!(%method, path = %path, status = %status, "Response received");
        decode_body(&text).map_err(|e| {
            ApiError::InvalidResponse(format!("Failed to parse response from {}: {}", path, e))
        })
    }

    async fn get<T: DeserializeOwned>(&self, path: &str) -> ApiResult<T> {
        let request = self.build_request::<()>(Method::GET, path, None)?;
        self.execute(request).await
    }

    async fn post<T: DeserializeOwned, B: Serialize + ?Sized>(
        &self,
        path: &str,
        body: &B,
    ) -> ApiResult<T> {
        let request = self.build_request(Method::POST, path, Some(body))?;
        self.execute(request).await
    }

    // ===== Auth Endpoints =====

    /// Create an account. Not idempotent: a repeated submit may be rejected
    /// by the server as a duplicate.
    pub async fn register(&self, payload: &RegisterRequest) -> ApiResult<serde_json::Value> {
        self.post(REGISTER_PATH, payload).await
    }

    /// Exchange credentials for a bearer token. The caller decides where the
    /// token is stored.
    pub async fn login(&self, payload: &SignInRequest) -> ApiResult<LoginResponse> {
        self.post(LOGIN_PATH, payload).await
    }

    /// Fetch the profile of the session's user
    pub async fn get_profile(&self) -> ApiResult<UserProfile> {
        let envelope: ProfileEnvelope = self.get(PROFILE_PATH).await?;
        Ok(envelope.into_profile())
    }
}

#[async_trait]
impl AuthApi for ApiClient {
    async fn register(&self, payload: &RegisterRequest) -> ApiResult<serde_json::Value> {
        ApiClient::register(self, payload).await
    }

    async fn login(&self, payload: &SignInRequest) -> ApiResult<LoginResponse> {
        ApiClient::login(self, payload).await
    }

    async fn get_profile(&self) -> ApiResult<UserProfile> {
        ApiClient::get_profile(self).await
    }
}

/// Decode a JSON body; an empty body decodes as `null`.
fn decode_body<T: DeserializeOwned>(text: &str) -> serde_json::Result<T> {
    if text.trim().is_empty() {
        serde_json::from_str("null")
    } else {
        serde_json::from_str(text)
    }
}
