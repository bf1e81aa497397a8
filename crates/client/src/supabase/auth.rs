//! Auth operations against the GoTrue endpoint.
//!
//! Session state lives in the client: a successful sign-in installs the
//! access token (used as the bearer on subsequent calls) and emits an
//! [`AuthChange`] on the broadcast channel, replacing the callback-style
//! auth-state listener a browser SDK would offer.

use reqwest::Method;
use serde::Serialize;
use serde_json::Value;

use learnhub_core::Email;

use super::types::{AuthSession, AuthUser, UserMetadata};
use super::{SupabaseClient, SupabaseError};

/// An auth-state change pushed to subscribers.
#[derive(Debug, Clone)]
pub enum AuthChange {
    /// A session was established; carries the raw identity.
    SignedIn(AuthUser),
    /// The session was cleared.
    SignedOut,
}

/// Result of a sign-up attempt.
///
/// With email confirmation disabled the provider hands back a session
/// immediately; with confirmation required it returns only the created
/// identity and the caller must establish a session separately.
#[derive(Debug, Clone)]
pub struct SignUpOutcome {
    /// The created identity, when the provider reported one.
    pub user: Option<AuthUser>,
    /// Whether a session was installed as part of the sign-up.
    pub session_established: bool,
}

#[derive(Serialize)]
struct SignUpRequest<'a> {
    email: &'a str,
    password: &'a str,
    data: &'a UserMetadata,
}

#[derive(Serialize)]
struct PasswordGrantRequest<'a> {
    email: &'a str,
    password: &'a str,
}

#[derive(Serialize)]
struct PasswordUpdateRequest<'a> {
    password: &'a str,
}

impl SupabaseClient {
    /// Register a new identity with attached metadata.
    ///
    /// # Errors
    ///
    /// Returns `SupabaseError` if the provider rejects the sign-up (e.g.
    /// the email is already registered) or the transport fails.
    pub async fn sign_up(
        &self,
        email: &Email,
        password: &str,
        metadata: &UserMetadata,
    ) -> Result<SignUpOutcome, SupabaseError> {
        let body = SignUpRequest {
            email: email.as_str(),
            password,
            data: metadata,
        };

        let request = self
            .request(Method::POST, self.auth_url("signup"))
            .await
            .json(&body);
        let payload: Value = self.send_json(request).await?;

        // With auto-confirm the response is a session; otherwise it is the
        // bare user object (possibly nested under "user" with no session).
        if payload.get("access_token").is_some() {
            let session: AuthSession = serde_json::from_value(payload)?;
            let user = session.user.clone();
            self.install_session(&session).await;
            return Ok(SignUpOutcome {
                user: Some(user),
                session_established: true,
            });
        }

        let user_value = match payload.get("user") {
            Some(nested) if !nested.is_null() => nested.clone(),
            _ => payload,
        };
        let user = if user_value.get("id").is_some() {
            Some(serde_json::from_value::<AuthUser>(user_value)?)
        } else {
            None
        };

        Ok(SignUpOutcome {
            user,
            session_established: false,
        })
    }

    /// Sign in with the password grant.
    ///
    /// On success the session token is installed and a
    /// [`AuthChange::SignedIn`] event is emitted.
    ///
    /// # Errors
    ///
    /// Returns `SupabaseError` on invalid credentials or transport failure.
    pub async fn sign_in_with_password(
        &self,
        email: &Email,
        password: &str,
    ) -> Result<AuthUser, SupabaseError> {
        let body = PasswordGrantRequest {
            email: email.as_str(),
            password,
        };

        let request = self
            .request(Method::POST, self.auth_url("token"))
            .await
            .query(&[("grant_type", "password")])
            .json(&body);
        let session: AuthSession = self.send_json(request).await?;

        let user = session.user.clone();
        self.install_session(&session).await;
        Ok(user)
    }

    /// Resolve the identity behind the installed session token, if any.
    ///
    /// Returns `Ok(None)` when no token is installed or the provider no
    /// longer accepts it (the stale token is dropped).
    ///
    /// # Errors
    ///
    /// Returns `SupabaseError` on transport failure or unexpected statuses.
    pub async fn current_session(&self) -> Result<Option<AuthUser>, SupabaseError> {
        if !self.has_session_token().await {
            return Ok(None);
        }

        let request = self.request(Method::GET, self.auth_url("user")).await;
        match self.send_json::<AuthUser>(request).await {
            Ok(user) => Ok(Some(user)),
            Err(SupabaseError::Api { status: 401 | 403, .. }) => {
                tracing::warn!("restored session token rejected, clearing it");
                self.set_access_token(None).await;
                Ok(None)
            }
            Err(err) => Err(err),
        }
    }

    /// Sign out of the current session.
    ///
    /// Local session state is always cleared and [`AuthChange::SignedOut`]
    /// emitted, even when the remote revocation fails.
    ///
    /// # Errors
    ///
    /// Returns the remote failure, after local state has been cleared.
    pub async fn sign_out(&self) -> Result<(), SupabaseError> {
        let result = if self.has_session_token().await {
            let request = self.request(Method::POST, self.auth_url("logout")).await;
            self.send_ok(request).await
        } else {
            Ok(())
        };

        self.set_access_token(None).await;
        self.emit_auth_change(AuthChange::SignedOut);
        result
    }

    /// Change the password of the signed-in identity.
    ///
    /// # Errors
    ///
    /// Returns `SupabaseError` if no session is installed or the provider
    /// rejects the change.
    pub async fn update_password(&self, new_password: &str) -> Result<(), SupabaseError> {
        let body = PasswordUpdateRequest {
            password: new_password,
        };
        let request = self
            .request(Method::PUT, self.auth_url("user"))
            .await
            .json(&body);
        self.send_ok(request).await
    }

    async fn install_session(&self, session: &AuthSession) {
        self.set_access_token(Some(session.access_token.clone().into()))
            .await;
        self.emit_auth_change(AuthChange::SignedIn(session.user.clone()));
    }
}
