//! Request pipeline stages.
//!
//! Every outgoing request passes through the client's middleware chain, in
//! order, right before it is sent. Stages mutate the built request in place.

use std::sync::Arc;

use reqwest::header::{self, HeaderValue};
use reqwest::Request;

use super::{ApiError, ApiResult};
use crate::auth::TokenStore;

pub trait RequestMiddleware: Send + Sync {
    fn handle(&self, request: &mut Request) -> ApiResult<()>;
}

/// Sets `Accept` and `Content-Type` to JSON on every request.
#[derive(Debug, Default, Clone, Copy)]
pub struct JsonHeaders;

impl RequestMiddleware for JsonHeaders {
    fn handle(&self, request: &mut Request) -> ApiResult<()> {
        let headers = request.headers_mut();
        headers.insert(header::ACCEPT, HeaderValue::from_static("application/json"));
        headers.insert(header::CONTENT_TYPE, HeaderValue::from_static("application/json"));
        Ok(())
    }
}

/// Attaches `Authorization: Bearer <token>` when the store holds a token.
///
/// The store is read on every request, so a sign-in or sign-out takes effect
/// on the very next call without rebuilding the client. With no token the
/// header is left off entirely; the server decides what that means.
pub struct BearerAuth {
    store: Arc<dyn TokenStore>,
}

impl BearerAuth {
    pub fn new(store: Arc<dyn TokenStore>) -> Self {
        Self { store }
    }
}

impl RequestMiddleware for BearerAuth {
    fn handle(&self, request: &mut Request) -> ApiResult<()> {
        let headers = request.headers_mut();
        headers.remove(header::AUTHORIZATION);

        if let Some(token) = self.store.get() {
            let mut value = HeaderValue::from_str(&format!("Bearer {}", token))
                .map_err(|_| ApiError::InvalidToken)?;
            value.set_sensitive(true);
            headers.insert(header::AUTHORIZATION, value);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::MemoryTokenStore;
    use reqwest::{Method, Url};

    fn request() -> Request {
        Request::new(Method::GET, Url::parse("http://localhost/profile").unwrap())
    }

    #[test]
    fn test_bearer_attached_when_token_present() {
        let store = Arc::new(MemoryTokenStore::with_token("abc123"));
        let mut req = request();
        BearerAuth::new(store).handle(&mut req).unwrap();

        let value = req.headers().get(header::AUTHORIZATION).unwrap();
        assert_eq!(value, "Bearer abc123");
        assert!(value.is_sensitive());
    }

    #[test]
    fn test_no_header_without_token() {
        let store = Arc::new(MemoryTokenStore::new());
        let mut req = request();
        BearerAuth::new(store).handle(&mut req).unwrap();
        assert!(req.headers().get(header::AUTHORIZATION).is_none());
    }

    #[test]
    fn test_follows_store_changes() {
        let store = Arc::new(MemoryTokenStore::with_token("old"));
        let auth = BearerAuth::new(store.clone());

        let mut req = request();
        auth.handle(&mut req).unwrap();
        assert_eq!(req.headers()[header::AUTHORIZATION], "Bearer old");

        // Re-running on the same request must not keep a stale header
        store.clear().unwrap();
        auth.handle(&mut req).unwrap();
        assert!(req.headers().get(header::AUTHORIZATION).is_none());
    }

    #[test]
    fn test_unrepresentable_token_is_rejected() {
        let store = Arc::new(MemoryTokenStore::with_token("bad\ntoken"));
        let mut req = request();
        let err = BearerAuth::new(store).handle(&mut req).unwrap_err();
        assert!(matches!(err, ApiError::InvalidToken));
    }

    #[test]
    fn test_json_headers() {
        let mut req = request();
        JsonHeaders.handle(&mut req).unwrap();
        assert_eq!(req.headers()[header::ACCEPT], "application/json");
        assert_eq!(req.headers()[header::CONTENT_TYPE], "application/json");
    }
}
