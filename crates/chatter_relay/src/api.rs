use axum::{
    Json,
    extract::{
        Path, State,
        rejection::{JsonRejection, PathRejection},
    },
    http::StatusCode,
    response::{IntoResponse, Response},
};
use chatter_protocol::{
    Conversation, ConversationId, CreateConversationRequest, CreateResponseRequest, Feedback,
};
use serde_json::Value;
use tracing::{debug, info};

use crate::{
    error::{Error, ErrorBody, GENERIC_ERROR, Redactable, Result},
    relay,
    state::AppState,
};

pub(crate) async fn create_conversation(State(state): State<AppState>) -> Result<Json<Conversation>> {
    // The user context comes from the relay's own trust boundary, never from
    // the request.
    let request = CreateConversationRequest {
        user_identifier: uuid::Uuid::new_v4().to_string(),
        user_context: state.user_context.as_ref().clone(),
    };

    let conversation = state.upstream.create_conversation(&request).await?;
    info!(conversation = %conversation.id, "Created conversation.");

    Ok(Json(conversation))
}

pub(crate) async fn create_response(
    State(state): State<AppState>,
    body: std::result::Result<Json<CreateResponseRequest>, JsonRejection>,
) -> Result<Response> {
    let Json(request) = body.map_err(|rejection| Error::BadRequest(rejection.body_text()))?;

    if request.message.trim().is_empty() {
        return Err(Error::BadRequest("message must not be empty".to_owned()));
    }

    let conversation_id = request
        .conversation_id
        .filter(|id| !id.is_empty())
        .ok_or_else(|| Error::BadRequest("conversationId is required".to_owned()))?;

    debug!(conversation = %conversation_id, stream = request.stream, "Creating response.");

    if !request.stream {
        let response = state
            .upstream
            .create_response(&conversation_id, &request.message)
            .await?;

        return Ok(Json(response).into_response());
    }

    // Any failure up to here is still a regular error response. After this
    // point, headers are committed and failures travel in-band.
    let frames = state
        .upstream
        .create_response_stream(&conversation_id, &request.message)
        .await?;

    Ok(relay::sse_response(relay::relay(frames)))
}

pub(crate) async fn create_feedback(
    State(state): State<AppState>,
    path: std::result::Result<Path<(String, String)>, PathRejection>,
    body: std::result::Result<Json<Feedback>, JsonRejection>,
) -> Result<Json<Value>> {
    let Path((conversation_id, response_id)) = path.map_err(bad_path)?;
    let Json(feedback) = body.map_err(|rejection| Error::BadRequest(rejection.body_text()))?;

    let feedback = state
        .upstream
        .create_feedback(&ConversationId::new(conversation_id), &response_id, &feedback)
        .await?;

    Ok(Json(feedback))
}

pub(crate) async fn update_feedback(
    State(state): State<AppState>,
    path: std::result::Result<Path<(String, String, String)>, PathRejection>,
    body: std::result::Result<Json<Feedback>, JsonRejection>,
) -> Result<Json<Value>> {
    let Path((conversation_id, response_id, feedback_id)) = path.map_err(bad_path)?;
    let Json(feedback) = body.map_err(|rejection| Error::BadRequest(rejection.body_text()))?;

    let feedback = state
        .upstream
        .update_feedback(
            &ConversationId::new(conversation_id),
            &response_id,
            &feedback_id,
            &feedback,
        )
        .await?;

    Ok(Json(feedback))
}

pub(crate) async fn not_found() -> impl IntoResponse {
    (StatusCode::NOT_FOUND, Json(ErrorBody::new("Route not found")))
}

/// Replace error messages with a generic one, unless errors are exposed.
pub(crate) async fn redact_errors(State(state): State<AppState>, response: Response) -> Response {
    if state.expose_errors || response.extensions().get::<Redactable>().is_none() {
        return response;
    }

    (response.status(), Json(ErrorBody::new(GENERIC_ERROR))).into_response()
}

fn bad_path(rejection: PathRejection) -> Error {
    Error::BadRequest(rejection.body_text())
}
