//! REST API client module for the hotel booking backend.
//!
//! This module provides the `ApiClient` for the auth and profile endpoints.
//! Requests authenticate with a bearer token read from the session store by
//! the `BearerAuth` middleware.

pub mod client;
pub mod error;
pub mod middleware;

use async_trait::async_trait;

use crate::models::{LoginResponse, RegisterRequest, SignInRequest, UserProfile};

pub use client::ApiClient;
pub use error::{ApiError, ValidationErrors};
pub use middleware::{BearerAuth, JsonHeaders, RequestMiddleware};

pub type ApiResult<T> = std::result::Result<T, ApiError>;

/// The calls the auth layer makes against the backend.
#[async_trait]
pub trait AuthApi: Send + Sync {
    async fn register(&self, payload: &RegisterRequest) -> ApiResult<serde_json::Value>;

    async fn login(&self, payload: &SignInRequest) -> ApiResult<LoginResponse>;

    async fn get_profile(&self) -> ApiResult<UserProfile>;
}
