//! Upload route.

use axum::{
    Json, Router,
    extract::{State, rejection::JsonRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::post,
};
use tracing::warn;

use crate::{AppState, middleware::AuthUser, response::UploadReply};
use imgrelay_core::upload::UploadRequest;

/// Creates the upload routes.
pub fn routes() -> Router<AppState> {
    Router::new().route("/upload", post(upload))
}

/// POST `/upload`
/// Store an inline or remote image and return its public URL.
async fn upload(
    State(state): State<AppState>,
    auth: AuthUser,
    payload: Result<Json<UploadRequest>, JsonRejection>,
) -> Response {
    let request = match payload {
        Ok(Json(request)) => request,
        Err(rejection) if rejection.status() == StatusCode::PAYLOAD_TOO_LARGE => {
            return rejection.into_response();
        }
        Err(rejection) => {
            warn!(subject = auth.subject(), error = %rejection, "Unreadable upload body");
            return UploadReply::BadRequest.into_response();
        }
    };

    let result = state.uploads.handle(request).await;
    if let Err(err) = &result {
        warn!(subject = auth.subject(), error = %err, "Bad request");
    }

    UploadReply::from(result).into_response()
}
