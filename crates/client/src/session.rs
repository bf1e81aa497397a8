//! Session store: the authenticated identity and its derived profile.
//!
//! Bootstrapped once at process start with a bounded wait, then kept in
//! sync by consuming the client's auth-change broadcast for as long as the
//! store is alive. State is observed through a `watch` channel, so a front
//! end can render "loading / signed out / signed in" reactively.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{broadcast, watch};
use tracing::{debug, error, warn};

use learnhub_core::{Email, EmailError, Role};

use crate::models::CurrentUser;
use crate::supabase::types::{AuthUser, ProfileRow, ProfileUpsert, UserMetadata};
use crate::supabase::{AuthChange, SupabaseClient, SupabaseError};

/// Errors from auth flows.
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    /// The supplied email address is structurally invalid.
    #[error("invalid email: {0}")]
    InvalidEmail(#[from] EmailError),

    /// Username login could not resolve the username to an account.
    #[error("username not found: {0}")]
    UnknownUsername(String),

    /// The operation requires a signed-in session.
    #[error("not signed in")]
    NotAuthenticated,

    /// The auth provider or profile store failed.
    #[error("provider error: {0}")]
    Provider(#[from] SupabaseError),
}

/// Observable session state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionState {
    /// Bootstrap or a sign-out round-trip is in flight.
    Loading,
    /// No authenticated session.
    SignedOut,
    /// A session exists; carries the merged identity.
    SignedIn(CurrentUser),
}

impl SessionState {
    /// The signed-in user, if any.
    #[must_use]
    pub const fn user(&self) -> Option<&CurrentUser> {
        match self {
            Self::SignedIn(user) => Some(user),
            _ => None,
        }
    }

    /// Whether the store is still resolving.
    #[must_use]
    pub const fn is_loading(&self) -> bool {
        matches!(self, Self::Loading)
    }
}

/// Fields a user may change about their own profile.
///
/// Role is deliberately absent: it is assigned at registration and does
/// not change through profile edits.
#[derive(Debug, Clone, Default)]
pub struct ProfileUpdate {
    pub username: Option<String>,
    pub avatar_url: Option<String>,
    /// When set, the auth password is changed as well.
    pub password: Option<String>,
}

/// Session store shared across the application.
#[derive(Clone)]
pub struct SessionStore {
    inner: Arc<SessionStoreInner>,
}

struct SessionStoreInner {
    supabase: SupabaseClient,
    state: watch::Sender<SessionState>,
}

impl SessionStore {
    /// Create the store and start consuming auth-change events.
    ///
    /// The listener task holds only a weak reference; dropping the last
    /// store clone ends the subscription.
    #[must_use]
    pub fn new(supabase: SupabaseClient) -> Self {
        let (state, _) = watch::channel(SessionState::Loading);
        let inner = Arc::new(SessionStoreInner { supabase, state });

        spawn_listener(&inner);
        Self { inner }
    }

    // =========================================================================
    // Observation
    // =========================================================================

    /// Subscribe to session-state changes.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<SessionState> {
        self.inner.state.subscribe()
    }

    /// Snapshot of the current state.
    #[must_use]
    pub fn state(&self) -> SessionState {
        self.inner.state.borrow().clone()
    }

    /// The signed-in user, if any.
    #[must_use]
    pub fn current_user(&self) -> Option<CurrentUser> {
        self.state().user().cloned()
    }

    // =========================================================================
    // Bootstrap
    // =========================================================================

    /// Resolve whether a previously authenticated session exists.
    ///
    /// The provider query is bounded by `limit`; if no answer arrives in
    /// time the store resolves to signed-out rather than staying in the
    /// loading state forever. Bootstrap itself never fails - every failure
    /// path degrades to signed-out.
    pub async fn bootstrap(&self, limit: Duration) {
        let restore = self.inner.supabase.current_session();
        self.bootstrap_with(restore, limit).await;
    }

    /// Bootstrap against an arbitrary session-restore future. Split out so
    /// the timeout behaviour is testable without a provider.
    async fn bootstrap_with<F>(&self, restore: F, limit: Duration)
    where
        F: Future<Output = Result<Option<AuthUser>, SupabaseError>>,
    {
        self.inner.state.send_replace(SessionState::Loading);

        match tokio::time::timeout(limit, restore).await {
            Err(_elapsed) => {
                warn!(limit = ?limit, "session bootstrap timed out");
                self.inner.state.send_replace(SessionState::SignedOut);
            }
            Ok(Err(err)) => {
                error!(error = %err, "session bootstrap failed");
                self.inner.state.send_replace(SessionState::SignedOut);
            }
            Ok(Ok(None)) => {
                debug!("no active session");
                self.inner.state.send_replace(SessionState::SignedOut);
            }
            Ok(Ok(Some(user))) => {
                self.resolve_profile(&user).await;
            }
        }
    }

    /// Fetch the profile row for an identity and publish the merged user.
    ///
    /// A missing or unfetchable profile falls back to the metadata carried
    /// on the identity itself.
    async fn resolve_profile(&self, auth_user: &AuthUser) -> CurrentUser {
        let profile = match self.inner.supabase.select_profile(auth_user.id).await {
            Ok(profile) => profile,
            Err(err) => {
                warn!(error = %err, user = %auth_user.id, "profile fetch failed, using identity metadata");
                None
            }
        };

        let user = merge_profile(auth_user, profile);
        self.inner.state.send_replace(SessionState::SignedIn(user.clone()));
        user
    }

    // =========================================================================
    // Auth operations
    // =========================================================================

    /// Sign in with an email or username plus password.
    ///
    /// An identifier without `@` is treated as a username and resolved to
    /// its account email through the profile table first.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::UnknownUsername`] when the username resolves to
    /// nothing, otherwise provider/validation errors.
    pub async fn login(&self, identifier: &str, password: &str) -> Result<CurrentUser, AuthError> {
        let email = if identifier.contains('@') {
            Email::parse(identifier)?
        } else {
            let found = self
                .inner
                .supabase
                .lookup_email_by_username(identifier)
                .await
                .map_err(|err| {
                    error!(error = %err, "username lookup failed");
                    err
                })?;
            let raw = found.ok_or_else(|| AuthError::UnknownUsername(identifier.to_string()))?;
            Email::parse(&raw)?
        };

        let user = self
            .inner
            .supabase
            .sign_in_with_password(&email, password)
            .await?;
        Ok(self.resolve_profile(&user).await)
    }

    /// Register a new account.
    ///
    /// Returns `true` when a session was established. When the provider
    /// creates the user without a session (e.g. email confirmation is
    /// toggled mid-deploy), an immediate password sign-in is attempted; if
    /// that also fails the account still exists and `false` is returned.
    ///
    /// # Errors
    ///
    /// Returns validation or provider errors from the sign-up itself.
    pub async fn register(
        &self,
        username: &str,
        email: &str,
        password: &str,
        role: Role,
    ) -> Result<bool, AuthError> {
        let username = username.trim();
        let email = Email::parse(email)?;
        let password = password.trim();

        let metadata = UserMetadata {
            username: Some(username.to_string()),
            role: Some(role.as_str().to_string()),
            avatar_url: Some(generated_avatar_url(username)),
        };

        debug!(%email, username, "registering account");
        let outcome = self.inner.supabase.sign_up(&email, password, &metadata).await?;

        if outcome.session_established {
            if let Some(user) = &outcome.user {
                self.resolve_profile(user).await;
            }
            return Ok(true);
        }

        if outcome.user.is_some() {
            // Session missing right after sign-up; try to establish one.
            debug!("no session after sign-up, attempting manual login");
            match self.inner.supabase.sign_in_with_password(&email, password).await {
                Ok(user) => {
                    self.resolve_profile(&user).await;
                    return Ok(true);
                }
                Err(err) => {
                    warn!(error = %err, "manual login after registration failed");
                }
            }
        }

        Ok(false)
    }

    /// Sign out and clear the session.
    ///
    /// Local state is always cleared; a failed remote revocation is logged
    /// and swallowed, since the user's intent is already satisfied.
    pub async fn logout(&self) {
        self.inner.state.send_replace(SessionState::Loading);

        if let Err(err) = self.inner.supabase.sign_out().await {
            error!(error = %err, "remote sign-out failed");
        }

        self.inner.state.send_replace(SessionState::SignedOut);
    }

    /// Update the signed-in user's profile, and password when requested.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::NotAuthenticated`] without a session, otherwise
    /// re-throws the first failing remote call.
    pub async fn update_profile(&self, updates: ProfileUpdate) -> Result<CurrentUser, AuthError> {
        let current = self.current_user().ok_or(AuthError::NotAuthenticated)?;

        let upsert = ProfileUpsert {
            id: current.id,
            email: None,
            username: updates.username.clone(),
            role: None,
            avatar_url: updates.avatar_url.clone(),
        };
        self.inner.supabase.upsert_profile(&upsert).await.map_err(|err| {
            error!(error = %err, "profile update failed");
            err
        })?;

        if let Some(password) = &updates.password {
            self.inner.supabase.update_password(password).await.map_err(|err| {
                error!(error = %err, "password update failed");
                err
            })?;
        }

        let updated = CurrentUser {
            username: updates.username.or(current.username),
            avatar_url: updates.avatar_url.or(current.avatar_url),
            ..current
        };
        self.inner
            .state
            .send_replace(SessionState::SignedIn(updated.clone()));
        Ok(updated)
    }
}

/// Consume auth-change events until the store or the client goes away.
fn spawn_listener(inner: &Arc<SessionStoreInner>) {
    let weak = Arc::downgrade(inner);
    let mut events = inner.supabase.subscribe_auth();

    tokio::spawn(async move {
        loop {
            match events.recv().await {
                Ok(change) => {
                    let Some(inner) = weak.upgrade() else { break };
                    let store = SessionStore { inner };
                    match change {
                        AuthChange::SignedIn(user) => {
                            store.resolve_profile(&user).await;
                        }
                        AuthChange::SignedOut => {
                            store.inner.state.send_replace(SessionState::SignedOut);
                        }
                    }
                }
                Err(broadcast::error::RecvError::Lagged(missed)) => {
                    warn!(missed, "auth event stream lagged");
                }
                Err(broadcast::error::RecvError::Closed) => break,
            }
        }
    });
}

/// Merge a profile row over the raw identity.
///
/// Field precedence, for the listed fields only: the profile row wins,
/// then the identity's metadata, then defaults (`student` role, no
/// username/avatar).
#[must_use]
pub fn merge_profile(auth_user: &AuthUser, profile: Option<ProfileRow>) -> CurrentUser {
    let metadata = &auth_user.user_metadata;

    let profile = profile.unwrap_or(ProfileRow {
        id: auth_user.id,
        email: None,
        username: None,
        role: None,
        avatar_url: None,
    });

    CurrentUser {
        id: auth_user.id,
        email: profile.email.or_else(|| auth_user.email.clone()),
        username: profile.username.or_else(|| metadata.username.clone()),
        role: profile
            .role
            .as_deref()
            .or(metadata.role.as_deref())
            .map_or(Role::Student, Role::parse_lenient),
        avatar_url: profile.avatar_url.or_else(|| metadata.avatar_url.clone()),
    }
}

/// Deterministic placeholder avatar for a fresh registration.
fn generated_avatar_url(username: &str) -> String {
    format!(
        "https://ui-avatars.com/api/?name={}&background=random",
        urlencoding::encode(username)
    )
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use uuid::Uuid;

    use learnhub_core::UserId;

    use crate::testutil::{serve_script, stub_client};

    fn test_client() -> SupabaseClient {
        // Port 1 refuses connections immediately, so remote calls made by
        // fallback paths fail fast instead of hanging.
        stub_client("http://127.0.0.1:1")
    }

    fn identity(username: Option<&str>, role: Option<&str>) -> AuthUser {
        AuthUser {
            id: UserId::new(Uuid::from_u128(7)),
            email: Some("ada@example.com".to_string()),
            user_metadata: UserMetadata {
                username: username.map(String::from),
                role: role.map(String::from),
                avatar_url: Some("https://meta/avatar.png".to_string()),
            },
        }
    }

    #[test]
    fn test_merge_profile_overrides_identity() {
        let profile = ProfileRow {
            id: UserId::new(Uuid::from_u128(7)),
            email: Some("profile@example.com".to_string()),
            username: Some("ada-l".to_string()),
            role: Some("instructor".to_string()),
            avatar_url: Some("https://profile/avatar.png".to_string()),
        };

        let user = merge_profile(&identity(Some("meta-name"), Some("student")), Some(profile));

        assert_eq!(user.email.as_deref(), Some("profile@example.com"));
        assert_eq!(user.username.as_deref(), Some("ada-l"));
        assert_eq!(user.role, Role::Instructor);
        assert_eq!(user.avatar_url.as_deref(), Some("https://profile/avatar.png"));
    }

    #[test]
    fn test_merge_without_profile_falls_back_to_metadata() {
        let user = merge_profile(&identity(Some("meta-name"), Some("instructor")), None);

        assert_eq!(user.email.as_deref(), Some("ada@example.com"));
        assert_eq!(user.username.as_deref(), Some("meta-name"));
        assert_eq!(user.role, Role::Instructor);
        assert_eq!(user.avatar_url.as_deref(), Some("https://meta/avatar.png"));
    }

    #[test]
    fn test_merge_defaults_role_to_student() {
        let user = merge_profile(&identity(None, None), None);
        assert_eq!(user.role, Role::Student);
        assert!(user.username.is_none());
    }

    #[test]
    fn test_merge_partial_profile_backfills_from_metadata() {
        let profile = ProfileRow {
            id: UserId::new(Uuid::from_u128(7)),
            email: None,
            username: Some("ada-l".to_string()),
            role: None,
            avatar_url: None,
        };

        let user = merge_profile(&identity(Some("meta-name"), Some("instructor")), Some(profile));

        assert_eq!(user.username.as_deref(), Some("ada-l"));
        assert_eq!(user.role, Role::Instructor);
        assert_eq!(user.email.as_deref(), Some("ada@example.com"));
        assert_eq!(user.avatar_url.as_deref(), Some("https://meta/avatar.png"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_bootstrap_timeout_resolves_to_signed_out() {
        let store = SessionStore::new(test_client());
        assert!(store.state().is_loading());

        // The provider never answers; the bounded wait must still resolve.
        store
            .bootstrap_with(std::future::pending(), Duration::from_secs(5))
            .await;

        assert_eq!(store.state(), SessionState::SignedOut);
    }

    #[tokio::test]
    async fn test_bootstrap_without_session_signs_out() {
        let store = SessionStore::new(test_client());
        store
            .bootstrap_with(async { Ok(None) }, Duration::from_secs(5))
            .await;
        assert_eq!(store.state(), SessionState::SignedOut);
    }

    #[tokio::test]
    async fn test_bootstrap_provider_error_signs_out() {
        let store = SessionStore::new(test_client());
        store
            .bootstrap_with(
                async { Err(SupabaseError::NotFound("session".to_string())) },
                Duration::from_secs(5),
            )
            .await;
        assert_eq!(store.state(), SessionState::SignedOut);
    }

    #[tokio::test]
    async fn test_bootstrap_with_session_falls_back_to_metadata() {
        // The profile fetch fails (nothing listens on the test address), so
        // the merged user must come from the identity's own metadata.
        let store = SessionStore::new(test_client());
        let auth_user = identity(Some("meta-name"), Some("instructor"));

        store
            .bootstrap_with(async { Ok(Some(auth_user)) }, Duration::from_secs(30))
            .await;

        let user = store.current_user().expect("signed in");
        assert_eq!(user.username.as_deref(), Some("meta-name"));
        assert_eq!(user.role, Role::Instructor);
    }

    #[tokio::test]
    async fn test_login_unknown_username_is_reported() {
        // The identifier has no `@`, so it resolves through the profiles
        // table; an empty result must not reach the password grant.
        let base = serve_script(vec![("200 OK", "[]")]);
        let store = SessionStore::new(stub_client(&base));

        let err = store.login("ada", "pw").await.unwrap_err();
        assert!(matches!(err, AuthError::UnknownUsername(name) if name == "ada"));
    }

    #[tokio::test]
    async fn test_login_resolves_username_through_profiles() {
        // Username lookup, then the password grant, then profile fetches
        // (one from the login itself, one from the auth-event listener).
        let session_body = r#"{"access_token":"tok-1","user":{"id":"00000000-0000-0000-0000-000000000007","email":"ada@example.com","user_metadata":{"username":"ada","role":"student"}}}"#;
        let base = serve_script(vec![
            ("200 OK", r#"[{"email":"ada@example.com"}]"#),
            ("200 OK", session_body),
            ("200 OK", "[]"),
            ("200 OK", "[]"),
        ]);
        let store = SessionStore::new(stub_client(&base));

        let user = store.login("ada", "pw").await.unwrap();
        assert_eq!(user.email.as_deref(), Some("ada@example.com"));
        assert_eq!(user.username.as_deref(), Some("ada"));
        assert!(matches!(store.state(), SessionState::SignedIn(_)));
    }

    #[tokio::test]
    async fn test_logout_clears_state() {
        let store = SessionStore::new(test_client());
        store.logout().await;
        assert_eq!(store.state(), SessionState::SignedOut);
    }

    #[tokio::test]
    async fn test_update_profile_requires_session() {
        let store = SessionStore::new(test_client());
        store
            .bootstrap_with(async { Ok(None) }, Duration::from_secs(5))
            .await;

        let result = store.update_profile(ProfileUpdate::default()).await;
        assert!(matches!(result, Err(AuthError::NotAuthenticated)));
    }

    #[test]
    fn test_generated_avatar_url_encodes_username() {
        let url = generated_avatar_url("Ada Lovelace");
        assert_eq!(
            url,
            "https://ui-avatars.com/api/?name=Ada%20Lovelace&background=random"
        );
    }
}
