//! Data models for the hotel booking API.
//!
//! - `user`: the signed-in customer's profile
//! - `credentials`: sign-in / sign-up payloads and the login response

pub mod credentials;
pub mod user;

pub use credentials::{LoginResponse, RegisterRequest, SignInRequest};
pub use user::UserProfile;
