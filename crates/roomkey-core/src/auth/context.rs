//! Signed-in user state for the rest of the app.
//!
//! `AuthContext` owns two observable fields, `user` and `is_loading`, and
//! keeps them in step with the token in the session store:
//!
//! - no token: `user = None`, `is_loading = false`, no network call
//! - fetch in flight: `is_loading = true`, `user` keeps its previous value
//! - fetch succeeded: `user = Some(profile)`
//! - fetch failed: `user = None`; the error goes back to the caller
//!
//! Every profile fetch gets a generation number. Starting a new fetch, or
//! signing out, bumps the generation and aborts the pending one, and a
//! completion whose generation is no longer current is dropped. Claiming a
//! generation and applying its result both happen under the `in_flight`
//! lock. A login still pending when the user signs out is discarded.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use futures::future::{AbortHandle, Abortable};
use tokio::sync::watch;
use tracing::{debug, info, warn};

use super::{AuthError, TokenStore};
use crate::api::{AuthApi, ValidationErrors};
use crate::models::{RegisterRequest, SignInRequest, UserProfile};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AuthState {
    pub user: Option<UserProfile>,
    pub is_loading: bool,
    /// False until the stored session has been checked once
    pub initialized: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthPhase {
    Unauthenticated,
    Loading,
    Authenticated,
}

impl AuthState {
    pub fn phase(&self) -> AuthPhase {
        if self.is_loading {
            AuthPhase::Loading
        } else if self.user.is_some() {
            AuthPhase::Authenticated
        } else {
            AuthPhase::Unauthenticated
        }
    }

    pub fn is_authenticated(&self) -> bool {
        self.phase() == AuthPhase::Authenticated
    }
}

/// How a profile fetch ended
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchOutcome {
    Authenticated(UserProfile),
    /// No token was stored; no request was made
    SignedOut,
    /// A newer fetch or a sign-out replaced this one; state was left alone
    Superseded,
}

pub struct AuthContext {
    api: Arc<dyn AuthApi>,
    store: Arc<dyn TokenStore>,
    state: watch::Sender<AuthState>,
    generation: AtomicU64,
    /// Bumped by every sign-out; a login that started before it is dropped
    sign_out_epoch: AtomicU64,
    in_flight: Mutex<Option<AbortHandle>>,
}

impl AuthContext {
    pub fn new(api: Arc<dyn AuthApi>, store: Arc<dyn TokenStore>) -> Self {
        let (state, _) = watch::channel(AuthState::default());
        Self {
            api,
            store,
            state,
            generation: AtomicU64::new(0),
            sign_out_epoch: AtomicU64::new(0),
            in_flight: Mutex::new(None),
        }
    }

    pub fn snapshot(&self) -> AuthState {
        self.state.borrow().clone()
    }

    /// Receiver that sees every state change
    pub fn subscribe(&self) -> watch::Receiver<AuthState> {
        self.state.subscribe()
    }

    pub fn user(&self) -> Option<UserProfile> {
        self.state.borrow().user.clone()
    }

    pub fn is_loading(&self) -> bool {
        self.state.borrow().is_loading
    }

    /// App start: check the stored session and load the profile if there is one.
    pub async fn initialize(&self) -> Result<FetchOutcome, AuthError> {
        debug!(has_token = self.store.has_token(), "Checking stored session");
        self.refresh().await
    }

    /// Re-fetch the profile for whatever token is stored now.
    pub async fn refresh(&self) -> Result<FetchOutcome, AuthError> {
        // Read the store before claiming a generation
        let has_token = self.store.has_token();

        let (generation, registration) = {
            let mut in_flight = self.lock_in_flight();
            let generation = self.supersede_pending(&mut in_flight);
            if !has_token {
                self.set_signed_out();
                return Ok(FetchOutcome::SignedOut);
            }
            let (handle, registration) = AbortHandle::new_pair();
            *in_flight = Some(handle);
            self.state.send_modify(|state| state.is_loading = true);
            (generation, registration)
        };

        let result = Abortable::new(self.api.get_profile(), registration).await;

        let mut in_flight = self.lock_in_flight();
        if self.generation.load(Ordering::SeqCst) != generation {
            debug!(generation, "Discarding superseded profile response");
            return Ok(FetchOutcome::Superseded);
        }
        in_flight.take();

        match result {
            Err(_aborted) => {
                self.state.send_modify(|state| state.is_loading = false);
                Ok(FetchOutcome::Superseded)
            }
            Ok(Ok(profile)) => {
                debug!(user_id = profile.id, "Profile loaded");
                self.state.send_modify(|state| {
                    state.user = Some(profile.clone());
                    state.is_loading = false;
                    state.initialized = true;
                });
                Ok(FetchOutcome::Authenticated(profile))
            }
            Ok(Err(e)) => {
                if e.is_auth_failure() {
                    info!("Stored session was rejected by the server");
                } else {
                    warn!(error = %e, "Profile fetch failed");
                }
                self.set_signed_out();
                Err(e.into())
            }
        }
    }

    /// Exchange credentials for a token, store it, then load the profile.
    ///
    /// A failed login leaves the existing session untouched. If the user
    /// signs out while the login is pending, the token is discarded and
    /// `Superseded` is returned.
    pub async fn sign_in(&self, credentials: &SignInRequest) -> Result<FetchOutcome, AuthError> {
        validate_sign_in(credentials)?;
        let epoch = self.sign_out_epoch.load(Ordering::SeqCst);

        let response = match self.api.login(credentials).await {
            Ok(response) => response,
            Err(e) if e.is_auth_failure() => return Err(AuthError::InvalidCredentials),
            Err(e) => return Err(e.into()),
        };

        {
            // A sign-out is either seen here or clears the token afterwards
            let _in_flight = self.lock_in_flight();
            if self.sign_out_epoch.load(Ordering::SeqCst) != epoch {
                info!("Discarding login that completed after sign-out");
                return Ok(FetchOutcome::Superseded);
            }
            self.store.set(&response.token).map_err(AuthError::Storage)?;
        }
        info!("Signed in");
        self.refresh().await
    }

    /// Create an account. The session is not changed; the caller signs in
    /// afterwards.
    pub async fn sign_up(&self, form: &RegisterRequest) -> Result<serde_json::Value, AuthError> {
        validate_registration(form)?;
        let body = self.api.register(form).await?;
        info!("Account registered");
        Ok(body)
    }

    /// Clear the session. The state goes to signed-out at once, without a
    /// network call, and any pending profile fetch or login is cancelled.
    pub fn sign_out(&self) -> Result<(), AuthError> {
        let cleared = {
            let mut in_flight = self.lock_in_flight();
            self.supersede_pending(&mut in_flight);
            self.sign_out_epoch.fetch_add(1, Ordering::SeqCst);
            let cleared = self.store.clear();
            self.set_signed_out();
            cleared
        };
        info!("Signed out");
        cleared.map_err(AuthError::Storage)
    }

    /// Bump the generation and abort the pending fetch, if any. Callers hold
    /// the `in_flight` lock.
    fn supersede_pending(&self, in_flight: &mut Option<AbortHandle>) -> u64 {
        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        if let Some(pending) = in_flight.take() {
            debug!(generation, "Cancelling pending profile fetch");
            pending.abort();
        }
        generation
    }

    fn set_signed_out(&self) {
        self.state.send_modify(|state| {
            state.user = None;
            state.is_loading = false;
            state.initialized = true;
        });
    }

    fn lock_in_flight(&self) -> std::sync::MutexGuard<'_, Option<AbortHandle>> {
        self.in_flight
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

fn required(errors: &mut ValidationErrors, field: &str, label: &str, value: &str) {
    if value.trim().is_empty() {
        errors.add(field, format!("The {} field is required.", label));
    }
}

/// Passwords are taken as typed; only an empty one is missing.
fn required_password(errors: &mut ValidationErrors, value: &str) {
    if value.is_empty() {
        errors.add("password", "The password field is required.");
    }
}

fn validate_sign_in(credentials: &SignInRequest) -> Result<(), AuthError> {
    let mut errors = ValidationErrors::new();
    required(&mut errors, "email", "email", &credentials.email);
    required_password(&mut errors, &credentials.password);
    if errors.is_empty() {
        Ok(())
    } else {
        Err(AuthError::Validation(errors))
    }
}

/// Local checks before the form is sent. The server still validates
/// everything (uniqueness, formats); these only catch what needs no round trip.
fn validate_registration(form: &RegisterRequest) -> Result<(), AuthError> {
    let mut errors = ValidationErrors::new();
    required(&mut errors, "full_name", "full name", &form.full_name);
    required(&mut errors, "email", "email", &form.email);
    required(&mut errors, "phone", "phone", &form.phone);
    required_password(&mut errors, &form.password);
    if !form.password.is_empty() && form.password != form.password_confirmation {
        errors.add("password", "The password confirmation does not match.");
    }
    if errors.is_empty() {
        Ok(())
    } else {
        Err(AuthError::Validation(errors))
    }
}
