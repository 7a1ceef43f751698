use actix_web::{web, HttpRequest, HttpResponse, Responder};
use validator::Validate;

use crate::error::Error;
use crate::models::{
    ErrorResponse, MessageListResponse, MessageRequestListResponse, ProfileId, SendMessageRequest,
};
use crate::routes::auth::Viewer;
use crate::routes::{error_response, AppState};

/// Configure messaging routes. Request routes go first so `requests` is not
/// taken for a profile id.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.route("/messages/requests", web::get().to(message_requests))
        .route(
            "/messages/requests/{profile_id}/accept",
            web::post().to(accept_request),
        )
        .route("/messages/{profile_id}", web::get().to(conversation))
        .route("/messages/{profile_id}", web::post().to(send_message));
}

fn viewer_and_other(state: &AppState, http_req: &HttpRequest, raw: &str) -> Result<(Viewer, ProfileId), Error> {
    let viewer = state.auth.authenticate(http_req)?;
    let other = ProfileId::parse(raw)?;
    Ok((viewer, other))
}

/// Messages exchanged with a profile, oldest first
///
/// GET /api/v1/messages/{profile_id}
async fn conversation(
    state: web::Data<AppState>,
    path: web::Path<String>,
    http_req: HttpRequest,
) -> impl Responder {
    let (viewer, other) = match viewer_and_other(&state, &http_req, &path) {
        Ok(ids) => ids,
        Err(e) => return error_response(&e),
    };

    match state.messenger.conversation(viewer.id, &other).await {
        Ok(messages) => HttpResponse::Ok().json(MessageListResponse {
            count: messages.len(),
            messages,
        }),
        Err(e) => error_response(&e),
    }
}

/// Send a message to a profile
///
/// POST /api/v1/messages/{profile_id}
///
/// Request body:
/// ```json
/// { "text": "Hello!", "imageUrl": null }
/// ```
async fn send_message(
    state: web::Data<AppState>,
    path: web::Path<String>,
    req: web::Json<SendMessageRequest>,
    http_req: HttpRequest,
) -> impl Responder {
    if let Err(errors) = req.validate() {
        tracing::info!("Validation failed for message: {:?}", errors);
        return HttpResponse::BadRequest().json(ErrorResponse {
            error: "Validation failed".to_string(),
            message: errors.to_string(),
            status_code: 400,
        });
    }

    let (viewer, recipient) = match viewer_and_other(&state, &http_req, &path) {
        Ok(ids) => ids,
        Err(e) => return error_response(&e),
    };

    let SendMessageRequest { text, image_url } = req.into_inner();
    match state
        .messenger
        .send(viewer.id, &recipient, &text, image_url, viewer.is_premium)
        .await
    {
        Ok(message) => HttpResponse::Created().json(message),
        Err(e) => error_response(&e),
    }
}

/// Pending likes toward the viewer, shown as message requests
///
/// GET /api/v1/messages/requests
async fn message_requests(state: web::Data<AppState>, http_req: HttpRequest) -> impl Responder {
    let viewer = match state.auth.viewer(&http_req) {
        Ok(viewer) => viewer,
        Err(e) => return error_response(&e),
    };

    match state.messenger.requests(viewer).await {
        Ok(requests) => HttpResponse::Ok().json(MessageRequestListResponse {
            count: requests.len(),
            requests,
        }),
        Err(e) => error_response(&e),
    }
}

/// Accept a message request
///
/// POST /api/v1/messages/requests/{profile_id}/accept
async fn accept_request(
    state: web::Data<AppState>,
    path: web::Path<String>,
    http_req: HttpRequest,
) -> impl Responder {
    let (viewer, admirer) = match viewer_and_other(&state, &http_req, &path) {
        Ok(ids) => ids,
        Err(e) => return error_response(&e),
    };

    match state.messenger.accept_request(viewer.id, &admirer).await {
        Ok(like) => HttpResponse::Ok().json(like),
        Err(e) => error_response(&e),
    }
}
