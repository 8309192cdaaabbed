use axum::{
    extract::{Multipart, Path, State},
    http::StatusCode,
    Json,
};
use serde::Serialize;
use uuid::Uuid;

use crate::chat::orchestrator::{Submission, TurnOutcome, UserText};
use crate::chat::store::Turn;
use crate::errors::AppError;
use crate::extract::ResumeDocument;
use crate::state::AppState;

#[derive(Serialize)]
pub struct SessionCreatedResponse {
    pub session_id: Uuid,
}

#[derive(Serialize)]
pub struct HistoryResponse {
    pub turns: Vec<Turn>,
}

/// POST /api/v1/sessions
pub async fn handle_create_session(State(state): State<AppState>) -> Json<SessionCreatedResponse> {
    let session_id = state.sessions.create().await;
    tracing::info!("Session {session_id} created");
    Json(SessionCreatedResponse { session_id })
}

/// POST /api/v1/sessions/:id/chat
///
/// Multipart form: optional `message` (typed text), `transcript`
/// (voice-transcribed text), and `resume` (file part with a declared content
/// type). The session's conversation lock is held for the whole turn, so a
/// session processes at most one submission at a time.
pub async fn handle_chat(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    mut multipart: Multipart,
) -> Result<Json<TurnOutcome>, AppError> {
    let conversation = state
        .sessions
        .get(id)
        .await
        .ok_or_else(|| AppError::NotFound(format!("Session {id} not found")))?;

    let mut typed = None;
    let mut transcript = None;
    let mut document = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::Validation(format!("invalid multipart body: {e}")))?
    {
        let name = field.name().map(str::to_string);
        match name.as_deref() {
            Some("message") => {
                typed = Some(field.text().await.map_err(bad_field("message"))?);
            }
            Some("transcript") => {
                transcript = Some(field.text().await.map_err(bad_field("transcript"))?);
            }
            Some("resume") => {
                let media_type = field
                    .content_type()
                    .map(str::to_string)
                    .unwrap_or_else(|| "application/octet-stream".to_string());
                let bytes = field.bytes().await.map_err(bad_field("resume"))?;
                document = Some(ResumeDocument { media_type, bytes });
            }
            _ => {} // unknown fields are ignored
        }
    }

    let submission = Submission {
        utterance: UserText::resolve(typed, transcript),
        document,
    };
    if submission.is_empty() {
        return Err(AppError::Validation(
            "submission contained no message and no resume".to_string(),
        ));
    }

    let mut conversation = conversation.lock().await;
    let outcome = state.orchestrator.run_turn(&mut conversation, submission).await;
    Ok(Json(outcome))
}

/// GET /api/v1/sessions/:id/history
pub async fn handle_history(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<HistoryResponse>, AppError> {
    let conversation = state
        .sessions
        .get(id)
        .await
        .ok_or_else(|| AppError::NotFound(format!("Session {id} not found")))?;
    let turns = conversation.lock().await.turns().to_vec();
    Ok(Json(HistoryResponse { turns }))
}

/// DELETE /api/v1/sessions/:id/history
pub async fn handle_reset_history(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    let conversation = state
        .sessions
        .get(id)
        .await
        .ok_or_else(|| AppError::NotFound(format!("Session {id} not found")))?;
    conversation.lock().await.reset();
    Ok(StatusCode::NO_CONTENT)
}

/// DELETE /api/v1/sessions/:id
pub async fn handle_delete_session(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    if state.sessions.remove(id).await {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(AppError::NotFound(format!("Session {id} not found")))
    }
}

fn bad_field(name: &'static str) -> impl Fn(axum::extract::multipart::MultipartError) -> AppError {
    move |e| AppError::Validation(format!("invalid '{name}' field: {e}"))
}
