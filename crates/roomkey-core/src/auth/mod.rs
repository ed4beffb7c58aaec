//! Authentication module for managing the user session.
//!
//! This module provides:
//! - `TokenStore`: where the bearer token lives (file, OS keychain, memory)
//! - `AuthContext`: the signed-in user and loading flag, kept in step with
//!   the stored token
//!
//! Tokens carry no expiry on the client; the server decides when a token is
//! no longer valid.

pub mod context;
pub mod credentials;
pub mod error;
pub mod session;
pub mod store;

pub use context::{AuthContext, AuthPhase, AuthState, FetchOutcome};
pub use credentials::KeyringTokenStore;
pub use error::AuthError;
pub use session::{FileTokenStore, SessionData};
pub use store::{MemoryTokenStore, TokenStore, TOKEN_KEY};
