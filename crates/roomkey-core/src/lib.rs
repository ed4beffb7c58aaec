//! Authenticated API access layer for the roomkey hotel booking app.
//!
//! - `auth`: session token storage and the signed-in user state
//! - `api`: REST client for the auth and profile endpoints
//! - `models`: profile and credential types
//! - `config`: base URL, timeout and storage settings

pub mod api;
pub mod auth;
pub mod config;
pub mod models;

pub use api::{ApiClient, ApiError, AuthApi, ValidationErrors};
pub use auth::{AuthContext, AuthError, AuthPhase, AuthState, FetchOutcome, TokenStore};
pub use config::Config;
pub use models::{LoginResponse, RegisterRequest, SignInRequest, UserProfile};
