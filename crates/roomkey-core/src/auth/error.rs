use thiserror::Error;

use crate::api::{ApiError, ValidationErrors};

/// Generic message for failures the user can only retry
pub const GENERIC_FAILURE_MESSAGE: &str = "Something went wrong";

#[derive(Error, Debug)]
pub enum AuthError {
    #[error(transparent)]
    Api(#[from] ApiError),

    /// The form failed local checks and was never sent
    #[error("Invalid input: {0}")]
    Validation(ValidationErrors),

    #[error("Invalid email or password")]
    InvalidCredentials,

    #[error("Session storage failed: {0:#}")]
    Storage(anyhow::Error),
}

impl AuthError {
    /// Field messages from either the local checks or a 422 response
    pub fn validation_errors(&self) -> Option<&ValidationErrors> {
        match self {
            AuthError::Validation(errors) => Some(errors),
            AuthError::Api(err) => err.validation_errors(),
            _ => None,
        }
    }

    /// Text to show the user. Validation failures show the first message of
    /// the first failing field.
    pub fn user_message(&self) -> String {
        if let Some(message) = self.validation_errors().and_then(|e| e.first_message()) {
            return message.to_string();
        }
        match self {
            AuthError::InvalidCredentials => "Invalid email or password".to_string(),
            AuthError::Api(err) if err.is_transport() => {
                "Unable to connect to the server. Please try again.".to_string()
            }
            AuthError::Api(err) if err.is_auth_failure() => {
                "Your session has expired. Please sign in again.".to_string()
            }
            _ => GENERIC_FAILURE_MESSAGE.to_string(),
        }
    }
}
