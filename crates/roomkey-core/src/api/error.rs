use std::fmt;

use reqwest::StatusCode;
use serde::de::{Deserializer, IgnoredAny, MapAccess, Visitor};
use serde::Deserialize;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("Validation failed: {}", .0.first_message().unwrap_or("invalid input"))]
    Validation(ValidationErrors),

    #[error("Unauthorized - token may be missing or expired")]
    Unauthorized,

    #[error("Access denied: {0}")]
    AccessDenied(String),

    #[error("Resource not found: {0}")]
    NotFound(String),

    #[error("Rate limited - please wait before retrying")]
    RateLimited,

    #[error("Server error ({status}): {body}")]
    Server { status: StatusCode, body: String },

    #[error("Unexpected status {status}: {body}")]
    UnexpectedStatus { status: StatusCode, body: String },

    #[error("Request timed out")]
    Timeout,

    #[error("Network error: {0}")]
    Network(reqwest::Error),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("Stored token cannot be sent as a header")]
    InvalidToken,
}

/// Maximum length for error response bodies in error messages
const MAX_ERROR_BODY_LENGTH: usize = 500;

impl From<reqwest::Error> for ApiError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            ApiError::Timeout
        } else {
            ApiError::Network(err)
        }
    }
}

impl ApiError {
    /// Truncate a response body to avoid logging excessive data
    fn truncate_body(body: &str) -> String {
        if body.len() <= MAX_ERROR_BODY_LENGTH {
            return body.to_string();
        }
        let mut end = MAX_ERROR_BODY_LENGTH;
        while !body.is_char_boundary(end) {
            end -= 1;
        }
        format!("{}... (truncated, {} total bytes)", &body[..end], body.len())
    }

    pub fn from_status(status: StatusCode, body: &str) -> Self {
        let truncated = Self::truncate_body(body);
        match status.as_u16() {
            401 => ApiError::Unauthorized,
            403 => ApiError::AccessDenied(truncated),
            404 => ApiError::NotFound(truncated),
            422 => match serde_json::from_str::<ValidationErrors>(body) {
                Ok(errors) => ApiError::Validation(errors),
                Err(_) => ApiError::UnexpectedStatus { status, body: truncated },
            },
            429 => ApiError::RateLimited,
            500..=599 => ApiError::Server { status, body: truncated },
            _ => ApiError::UnexpectedStatus { status, body: truncated },
        }
    }

    /// HTTP status of the failed response, if one was received.
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            ApiError::Validation(_) => Some(StatusCode::UNPROCESSABLE_ENTITY),
            ApiError::Unauthorized => Some(StatusCode::UNAUTHORIZED),
            ApiError::AccessDenied(_) => Some(StatusCode::FORBIDDEN),
            ApiError::NotFound(_) => Some(StatusCode::NOT_FOUND),
            ApiError::RateLimited => Some(StatusCode::TOO_MANY_REQUESTS),
            ApiError::Server { status, .. } | ApiError::UnexpectedStatus { status, .. } => {
                Some(*status)
            }
            ApiError::Network(err) => err.status(),
            ApiError::Timeout | ApiError::InvalidResponse(_) | ApiError::InvalidToken => None,
        }
    }

    pub fn validation_errors(&self) -> Option<&ValidationErrors> {
        match self {
            ApiError::Validation(errors) => Some(errors),
            _ => None,
        }
    }

    /// 401/403: the session is not (or no longer) accepted by the server.
    pub fn is_auth_failure(&self) -> bool {
        matches!(self, ApiError::Unauthorized | ApiError::AccessDenied(_))
    }

    /// No response was received at all.
    pub fn is_transport(&self) -> bool {
        matches!(self, ApiError::Network(_) | ApiError::Timeout)
    }
}

/// Field-keyed validation messages, in the order the server sent them.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationErrors {
    fields: Vec<(String, Vec<String>)>,
}

impl ValidationErrors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, field: impl Into<String>, message: impl Into<String>) {
        let field = field.into();
        let message = message.into();
        match self.fields.iter_mut().find(|(name, _)| *name == field) {
            Some((_, messages)) => messages.push(message),
            None => self.fields.push((field, vec![message])),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Messages for one field
    pub fn get(&self, field: &str) -> Option<&[String]> {
        self.fields
            .iter()
            .find(|(name, _)| name == field)
            .map(|(_, messages)| messages.as_slice())
    }

    /// Name of the first failing field
    pub fn first_field(&self) -> Option<&str> {
        self.fields.first().map(|(name, _)| name.as_str())
    }

    /// First message of the first failing field, the one the UI displays.
    pub fn first_message(&self) -> Option<&str> {
        self.fields
            .iter()
            .find_map(|(_, messages)| messages.first())
            .map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &[String])> {
        self.fields
            .iter()
            .map(|(name, messages)| (name.as_str(), messages.as_slice()))
    }
}

/// One value in a 422 body. Servers send either a list of messages, a single
/// message, or nest the whole map under `errors`.
#[derive(Deserialize)]
#[serde(untagged)]
enum ValidationEntry {
    Messages(Vec<String>),
    Message(String),
    Nested(ValidationErrors),
    Other(IgnoredAny),
}

struct ValidationErrorsVisitor;

impl<'de> Visitor<'de> for ValidationErrorsVisitor {
    type Value = ValidationErrors;

    fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
        formatter.write_str("a map of field names to validation messages")
    }

    fn visit_map<A: MapAccess<'de>>(self, mut map: A) -> Result<Self::Value, A::Error> {
        let mut fields = ValidationErrors::new();
        let mut nested: Option<ValidationErrors> = None;

        while let Some(key) = map.next_key::<String>()? {
            match map.next_value::<ValidationEntry>()? {
                ValidationEntry::Messages(messages) => {
                    if !messages.is_empty() {
                        fields.fields.push((key, messages));
                    }
                }
                // Top-level summary, not a field
                ValidationEntry::Message(_) if key == "message" => {}
                ValidationEntry::Message(message) => fields.fields.push((key, vec![message])),
                ValidationEntry::Nested(inner) if key == "errors" => nested = Some(inner),
                ValidationEntry::Nested(_) | ValidationEntry::Other(_) => {}
            }
        }

        match nested {
            Some(inner) if !inner.is_empty() => Ok(inner),
            _ => Ok(fields),
        }
    }
}

impl<'de> Deserialize<'de> for ValidationErrors {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_map(ValidationErrorsVisitor)
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for (field, messages) in &self.fields {
            for message in messages {
                if !first {
                    f.write_str("; ")?;
                }
                write!(f, "{}: {}", field, message)?;
                first = false;
            }
        }
        Ok(())
    }
}
