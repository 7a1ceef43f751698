use actix_web::{web, HttpRequest, HttpResponse, Responder};
use std::future::Future;
use uuid::Uuid;

use crate::error::Error;
use crate::models::{LikeActionResponse, LikeStatusResponse, Profile, ProfileId, ProfileListResponse};
use crate::routes::{error_response, AppState};
use crate::services::StoreError;

/// Configure like routes
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.route("/likes", web::get().to(liked_profiles))
        .route("/likes/{profile_id}", web::get().to(check_like))
        .route("/likes/{profile_id}", web::post().to(toggle_like))
        .route("/admirers", web::get().to(admirers));
}

/// Parse the authenticated viewer and the target id from the path
fn viewer_and_target(
    state: &AppState,
    http_req: &HttpRequest,
    raw: &str,
) -> Result<(Uuid, ProfileId), Error> {
    let viewer = state.auth.viewer(http_req)?;
    let target = ProfileId::parse(raw)?;
    Ok((viewer, target))
}

/// Check whether the viewer likes a profile
///
/// GET /api/v1/likes/{profile_id}
async fn check_like(
    state: web::Data<AppState>,
    path: web::Path<String>,
    http_req: HttpRequest,
) -> impl Responder {
    let (viewer, target) = match viewer_and_target(&state, &http_req, &path) {
        Ok(ids) => ids,
        Err(e) => return error_response(&e),
    };

    let workflow = state.like_workflow(viewer).await;
    match workflow.check_existing_like(&target).await {
        Ok(liked) => HttpResponse::Ok().json(LikeStatusResponse {
            profile_id: target,
            liked,
        }),
        Err(e) => error_response(&e),
    }
}

/// Toggle the viewer's like on a profile
///
/// POST /api/v1/likes/{profile_id}
async fn toggle_like(
    state: web::Data<AppState>,
    path: web::Path<String>,
    http_req: HttpRequest,
) -> impl Responder {
    let (viewer, target) = match viewer_and_target(&state, &http_req, &path) {
        Ok(ids) => ids,
        Err(e) => return error_response(&e),
    };

    let workflow = state.like_workflow(viewer).await;
    match workflow.like(&target).await {
        Ok(action) => HttpResponse::Ok().json(LikeActionResponse {
            liked: workflow.is_liked(&target),
            profile_id: target,
            action,
        }),
        Err(e) => error_response(&e),
    }
}

/// Profiles the viewer has liked
///
/// GET /api/v1/likes
async fn liked_profiles(state: web::Data<AppState>, http_req: HttpRequest) -> impl Responder {
    profile_list(&state, &http_req, "liked profiles", |viewer| {
        state.repository.liked_profiles(viewer)
    })
    .await
}

/// Profiles that have liked the viewer
///
/// GET /api/v1/admirers
async fn admirers(state: web::Data<AppState>, http_req: HttpRequest) -> impl Responder {
    profile_list(&state, &http_req, "admirers", |viewer| state.repository.admirers(viewer)).await
}

async fn profile_list<F, Fut>(state: &AppState, http_req: &HttpRequest, what: &str, fetch: F) -> HttpResponse
where
    F: FnOnce(Uuid) -> Fut,
    Fut: Future<Output = Result<Vec<Profile>, StoreError>>,
{
    let viewer = match state.auth.viewer(http_req) {
        Ok(viewer) => viewer,
        Err(e) => return error_response(&e),
    };

    match fetch(viewer).await {
        Ok(profiles) => HttpResponse::Ok().json(ProfileListResponse {
            count: profiles.len(),
            profiles,
        }),
        Err(e) => {
            tracing::error!("Failed to fetch {} for {}: {}", what, viewer, e);
            error_response(&Error::Store(e))
        }
    }
}
