// Route exports
pub mod auth;
pub mod discovery;
pub mod likes;
pub mod messages;

use actix_web::{web, HttpResponse};
use moka::future::Cache;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use uuid::Uuid;

use crate::config::{DiscoverySettings, Settings};
use crate::core::{Curator, DiscoverySession, LikeWorkflow, Messenger};
use crate::error::Error;
use crate::models::{ErrorResponse, Gender, LikeQuota, Preferences, Profile};
use crate::services::{CacheManager, ProfileRepository, Store};
use auth::{JwtVerifier, Viewer};

/// A viewer's discovery session, locked for the length of one swipe
pub type SharedSession = Arc<Mutex<DiscoverySession>>;

/// Sessions expire a day after they start, which is also when the like
/// quota resets
const SESSION_TTL: Duration = Duration::from_secs(24 * 60 * 60);

/// Application state shared across all handlers
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn Store>,
    pub repository: ProfileRepository,
    pub curator: Curator,
    pub messenger: Messenger,
    pub auth: Arc<JwtVerifier>,
    pub discovery: DiscoverySettings,
    /// One like workflow per viewer, so concurrent requests for the same
    /// target share one in-flight guard
    likes: Cache<Uuid, Arc<LikeWorkflow>>,
    sessions: Cache<Uuid, SharedSession>,
}

impl AppState {
    pub fn new(store: Arc<dyn Store>, cache: Option<Arc<CacheManager>>, settings: &Settings) -> Self {
        let likes = Cache::builder()
            .max_capacity(settings.cache.max_workflows.unwrap_or(10_000))
            .time_to_idle(Duration::from_secs(30 * 60))
            .eviction_listener(|viewer, workflow: Arc<LikeWorkflow>, cause| {
                tracing::debug!("Evicting like workflow for {} ({:?})", viewer, cause);
                workflow.close();
            })
            .build();

        let sessions = Cache::builder()
            .max_capacity(settings.cache.max_workflows.unwrap_or(10_000))
            .time_to_live(SESSION_TTL)
            .build();

        let repository = ProfileRepository::new(Arc::clone(&store), cache);

        Self {
            messenger: Messenger::new(repository.clone()),
            repository,
            store,
            curator: Curator::new(settings.discovery.curated_limit),
            auth: Arc::new(JwtVerifier::from_settings(&settings.auth)),
            discovery: settings.discovery.clone(),
            likes,
            sessions,
        }
    }

    /// Load a fresh candidate list into the viewer's session, creating it
    /// with the daily like limit on first use. An existing session keeps its
    /// remaining likes.
    pub async fn open_session(
        &self,
        viewer: Viewer,
        profiles: Vec<Profile>,
        viewer_gender: Option<Gender>,
        preferences: Option<Preferences>,
    ) -> SharedSession {
        let quota = LikeQuota::for_viewer(viewer.is_premium, self.discovery.daily_like_limit);
        let session = self
            .sessions
            .get_with(viewer.id, async move {
                Arc::new(Mutex::new(DiscoverySession::new(Vec::new(), viewer_gender, None, quota)))
            })
            .await;

        {
            let mut guard = session.lock().await;
            guard.replace_profiles(profiles, viewer_gender, preferences);
            // plan changed since the session started
            if guard.quota().is_premium() != viewer.is_premium {
                guard.set_quota(quota);
            }
        }

        session
    }

    /// Session opened by an earlier discover call
    pub async fn session(&self, viewer: Uuid) -> Option<SharedSession> {
        self.sessions.get(&viewer).await
    }

    /// Like workflow for `viewer`, created on first use
    pub async fn like_workflow(&self, viewer: Uuid) -> Arc<LikeWorkflow> {
        let store = Arc::clone(&self.store);
        self.likes
            .get_with(viewer, async move { Arc::new(LikeWorkflow::new(store, Some(viewer))) })
            .await
    }
}

pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api/v1")
            .configure(discovery::configure)
            .configure(likes::configure)
            .configure(messages::configure),
    );
}

/// Map a core error to its JSON error response
pub fn error_response(err: &Error) -> HttpResponse {
    let (mut builder, code, label) = match err {
        Error::Validation(_) => (HttpResponse::BadRequest(), 400, "invalid_request"),
        Error::Unauthenticated => (HttpResponse::Unauthorized(), 401, "unauthenticated"),
        Error::Conflict => (HttpResponse::Conflict(), 409, "conflict"),
        Error::QuotaExhausted => (HttpResponse::TooManyRequests(), 429, "quota_exhausted"),
        Error::PremiumRequired => (HttpResponse::Forbidden(), 403, "premium_required"),
        Error::Store(_) => (HttpResponse::BadGateway(), 502, "store_error"),
        Error::Closed => (HttpResponse::ServiceUnavailable(), 503, "unavailable"),
        Error::NotFound(_) => (HttpResponse::NotFound(), 404, "not_found"),
    };

    builder.json(ErrorResponse {
        error: label.to_string(),
        message: err.to_string(),
        status_code: code,
    })
}
