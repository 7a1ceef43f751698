use actix_web::{web, HttpRequest, HttpResponse, Responder};
use uuid::Uuid;
use validator::Validate;

use crate::core::{Discovery, DiscoverySession, SwipeOutcome};
use crate::error::{Error, Result};
use crate::models::samples::discovery_profiles;
use crate::models::{
    CuratedMatchesRequest, CuratedMatchesResponse, DiscoverRequest, DiscoverResponse, ErrorResponse,
    HealthResponse, Profile, ProfileId, SwipeRequest, SwipeResponse,
};
use crate::routes::{error_response, AppState, SharedSession};

/// Configure health and discovery routes
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.route("/health", web::get().to(health_check))
        .route("/discover", web::post().to(discover))
        .route("/discover/swipe", web::post().to(swipe))
        .route("/discover/super-like", web::post().to(super_like))
        .route("/matches/curated", web::post().to(curated_matches));
}

/// Health check endpoint
async fn health_check(state: web::Data<AppState>) -> impl Responder {
    let store_healthy = state.store.health_check().await.unwrap_or(false);

    let status = if store_healthy { "healthy" } else { "degraded" };

    HttpResponse::Ok().json(HealthResponse {
        status: status.to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        timestamp: chrono::Utc::now(),
    })
}

/// Viewer's own profile; `None` when they have not created one yet
async fn viewer_profile(state: &AppState, viewer: Uuid) -> Result<Option<Profile>> {
    state
        .repository
        .profile(&ProfileId::from(viewer))
        .await
        .map_err(|e| {
            tracing::error!("Failed to fetch profile for {}: {}", viewer, e);
            Error::Store(e)
        })
}

/// Discovery candidates endpoint
///
/// POST /api/v1/discover
///
/// Request body:
/// ```json
/// {
///   "preferences": { "ageRange": [25, 30], "religion": "hindu", "civilStatus": "single" }
/// }
/// ```
async fn discover(
    state: web::Data<AppState>,
    req: web::Json<DiscoverRequest>,
    http_req: HttpRequest,
) -> impl Responder {
    let viewer = match state.auth.authenticate(&http_req) {
        Ok(viewer) => viewer,
        Err(e) => return error_response(&e),
    };

    let viewer_gender = match viewer_profile(&state, viewer.id).await {
        Ok(profile) => profile.and_then(|p| p.gender),
        Err(e) => return error_response(&e),
    };

    if viewer_gender.is_none() {
        tracing::info!("Viewer {} has no gender on file, no candidates", viewer.id);
    }

    let mut candidates = match state.repository.candidates_for(viewer_gender).await {
        Ok(candidates) => candidates,
        Err(e) => {
            tracing::error!("Failed to query candidates for {}: {}", viewer.id, e);
            return error_response(&Error::Store(e));
        }
    };

    if state.discovery.include_sample_profiles {
        candidates.extend(discovery_profiles());
    }

    let own_id = ProfileId::from(viewer.id);
    candidates.retain(|p| p.id != own_id);
    let total_candidates = candidates.len();

    let session = state
        .open_session(viewer, candidates, viewer_gender, req.into_inner().preferences)
        .await;
    let session = session.lock().await;
    let profiles = session.candidates().to_vec();

    tracing::info!(
        "Discovery for {}: {} of {} candidates",
        viewer.id,
        profiles.len(),
        total_candidates
    );

    HttpResponse::Ok().json(DiscoverResponse {
        profiles,
        total_candidates,
        quota: session.quota(),
    })
}

/// Session for a swipe request; swiping needs a prior discover call
async fn swipe_session(state: &AppState, viewer: Uuid) -> Result<SharedSession, HttpResponse> {
    state.session(viewer).await.ok_or_else(|| {
        HttpResponse::NotFound().json(ErrorResponse {
            error: "session_not_found".to_string(),
            message: "Load discovery profiles before swiping".to_string(),
            status_code: 404,
        })
    })
}

fn swipe_response(session: &DiscoverySession, outcome: Result<SwipeOutcome>) -> HttpResponse {
    match outcome {
        Ok(outcome) => HttpResponse::Ok().json(SwipeResponse {
            outcome,
            next: session.current().cloned(),
            quota: session.quota(),
        }),
        Err(e) => error_response(&e),
    }
}

/// Swipe on the current candidate
///
/// POST /api/v1/discover/swipe
///
/// Request body:
/// ```json
/// { "direction": "right" }
/// ```
///
/// A right-swipe likes the candidate and uses one of the day's likes.
async fn swipe(
    state: web::Data<AppState>,
    req: web::Json<SwipeRequest>,
    http_req: HttpRequest,
) -> impl Responder {
    let viewer = match state.auth.viewer(&http_req) {
        Ok(viewer) => viewer,
        Err(e) => return error_response(&e),
    };

    let session = match swipe_session(&state, viewer).await {
        Ok(session) => session,
        Err(response) => return response,
    };

    let discovery = Discovery::new(state.like_workflow(viewer).await);
    let mut session = session.lock().await;
    let outcome = discovery.swipe(&mut session, req.direction).await;

    if let Ok(outcome) = &outcome {
        tracing::debug!("Viewer {} swiped {:?}: {:?}", viewer, req.direction, outcome);
    }
    swipe_response(&session, outcome)
}

/// Super-like the current candidate; premium only and free of quota
///
/// POST /api/v1/discover/super-like
async fn super_like(state: web::Data<AppState>, http_req: HttpRequest) -> impl Responder {
    let viewer = match state.auth.viewer(&http_req) {
        Ok(viewer) => viewer,
        Err(e) => return error_response(&e),
    };

    let session = match swipe_session(&state, viewer).await {
        Ok(session) => session,
        Err(response) => return response,
    };

    let discovery = Discovery::new(state.like_workflow(viewer).await);
    let mut session = session.lock().await;
    let outcome = discovery.super_like(&mut session).await;

    swipe_response(&session, outcome)
}

/// Curated matches endpoint
///
/// POST /api/v1/matches/curated
///
/// Request body:
/// ```json
/// {
///   "filters": { "minAge": 25, "maxAge": 35, "location": "colombo", "priority": "interests" },
///   "limit": 4
/// }
/// ```
async fn curated_matches(
    state: web::Data<AppState>,
    req: web::Json<CuratedMatchesRequest>,
    http_req: HttpRequest,
) -> impl Responder {
    if let Err(errors) = req.validate() {
        tracing::info!("Validation failed for curated matches request: {:?}", errors);
        return HttpResponse::BadRequest().json(ErrorResponse {
            error: "Validation failed".to_string(),
            message: errors.to_string(),
            status_code: 400,
        });
    }

    let viewer = match state.auth.viewer(&http_req) {
        Ok(viewer) => viewer,
        Err(e) => return error_response(&e),
    };

    let profile = match viewer_profile(&state, viewer).await {
        Ok(Some(profile)) => profile,
        Ok(None) => {
            return HttpResponse::NotFound().json(ErrorResponse {
                error: "profile_not_found".to_string(),
                message: "Create a profile before requesting matches".to_string(),
                status_code: 404,
            });
        }
        Err(e) => return error_response(&e),
    };

    let mut candidates = match state.repository.candidates_for(profile.gender).await {
        Ok(candidates) => candidates,
        Err(e) => {
            tracing::error!("Failed to query candidates for {}: {}", viewer, e);
            return error_response(&Error::Store(e));
        }
    };

    if state.discovery.include_sample_profiles {
        candidates.extend(discovery_profiles());
    }

    let result = state.curator.curate(
        &profile,
        candidates,
        &req.filters,
        req.limit.map(usize::from),
    );

    tracing::info!(
        "Curated {} matches for {} from {} candidates",
        result.matches.len(),
        viewer,
        result.total_candidates
    );

    HttpResponse::Ok().json(CuratedMatchesResponse {
        matches: result.matches,
        total_candidates: result.total_candidates,
    })
}
