//! Shared application state: one client, one store per concern.

use std::sync::Arc;

use tracing::debug;

use crate::config::AppConfig;
use crate::courses::CourseStore;
use crate::error::Result;
use crate::reviews::Reviews;
use crate::session::SessionStore;
use crate::supabase::SupabaseClient;

/// Application-wide shared state. Cheap to clone; all clones share the
/// same backend client and caches.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: AppConfig,
    supabase: SupabaseClient,
    session: SessionStore,
    courses: CourseStore,
    reviews: Reviews,
}

impl AppState {
    /// Wire up the backend client and the stores over it.
    #[must_use]
    pub fn new(config: AppConfig) -> Self {
        let supabase = SupabaseClient::new(&config);
        let session = SessionStore::new(supabase.clone());
        let courses = CourseStore::new(supabase.clone());
        let reviews = Reviews::new(supabase.clone());

        Self {
            inner: Arc::new(AppStateInner {
                config,
                supabase,
                session,
                courses,
                reviews,
            }),
        }
    }

    /// Resolve the session (bounded by the configured timeout) and load
    /// the published catalog.
    ///
    /// # Errors
    ///
    /// Returns the catalog-load failure; session resolution itself never
    /// fails, it degrades to signed-out.
    pub async fn bootstrap(&self) -> Result<()> {
        debug!("bootstrapping application state");
        self.inner
            .session
            .bootstrap(self.inner.config.bootstrap_timeout)
            .await;
        self.inner.courses.fetch_published().await
    }

    #[must_use]
    pub fn config(&self) -> &AppConfig {
        &self.inner.config
    }

    #[must_use]
    pub fn supabase(&self) -> &SupabaseClient {
        &self.inner.supabase
    }

    #[must_use]
    pub fn session(&self) -> &SessionStore {
        &self.inner.session
    }

    #[must_use]
    pub fn courses(&self) -> &CourseStore {
        &self.inner.courses
    }

    #[must_use]
    pub fn reviews(&self) -> &Reviews {
        &self.inner.reviews
    }
}
