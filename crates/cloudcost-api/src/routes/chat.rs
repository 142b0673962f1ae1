use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use utoipa::{IntoParams, ToSchema};

use cloudcost_chat::{ChatInput, ChatSession, TurnOutcome};
use cloudcost_persist::{FileType, MessageRole, StoredMessage, ThreadListing, UploadedFile};
use crate::{
    error::{ApiError, ApiResult},
    extract::UserId,
    state::AppState,
};

#[derive(Debug, Default, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SendMessageRequest {
    pub message: Option<String>,
    pub plan: Option<String>,
    pub metrics: Option<String>,
    pub thread_id: Option<String>,
    /// Correlation id of files uploaded ahead of this turn
    pub session_id: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SendMessageResponse {
    pub reply: String,
    pub thread_id: String,
    pub mode: String,
    pub relevant: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub analysis_id: Option<String>,
}

#[derive(Debug, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct HistoryQuery {
    pub thread_id: Option<String>,
    pub session_id: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct HistoryMessage {
    pub role: MessageRoleName,
    pub text: String,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum MessageRoleName {
    User,
    Assistant,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct HistoryResponse {
    pub thread_id: Option<String>,
    pub messages: Vec<HistoryMessage>,
}

#[derive(Debug, Default, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct NewChatRequest {
    pub session_id: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct NewChatResponse {
    pub thread_id: String,
    pub session_id: String,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ThreadSummaryRow {
    pub thread_id: String,
    pub title: String,
    pub created_at: DateTime<Utc>,
    pub msg_count: u64,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ListThreadsResponse {
    pub threads: Vec<ThreadSummaryRow>,
}

#[derive(Debug, Default, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SummarizeRequest {
    pub thread_id: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct SummarizeResponse {
    pub summary: String,
}

/// Send one chat turn
///
/// Pending uploads of `sessionId` typed `plan` or `metrics` fill in missing
/// fields; the files merged this way are consumed once the turn succeeds.
/// Nothing to send yields 204.
#[utoipa::path(
    post,
    path = "/api/chat",
    request_body = SendMessageRequest,
    responses(
        (status = 200, description = "Assistant reply", body = SendMessageResponse),
        (status = 204, description = "Nothing to send"),
        (status = 404, description = "Thread not found"),
        (status = 502, description = "AI service error")
    ),
    tag = "chat"
)]
pub async fn send_message(
    State(state): State<Arc<AppState>>,
    UserId(user_id): UserId,
    Json(req): Json<SendMessageRequest>,
) -> ApiResult<Response> {
    let mut session = ChatSession::new(user_id);
    if let Some(thread_id) = non_blank(req.thread_id.as_deref()) {
        session = session.with_thread(thread_id);
    }

    let mut input = ChatInput {
        message: req.message,
        plan: req.plan,
        metrics: req.metrics,
    };

    let pending = match non_blank(req.session_id.as_deref()) {
        Some(session_id) => {
            session = session.with_session_id(session_id);
            state.uploads.session_files(&session.user_id, session_id).await
        }
        None => Vec::new(),
    };
    let mut merged = Vec::new();
    if non_blank(input.plan.as_deref()).is_none() {
        input.plan = read_uploads(&state, &pending, FileType::Plan, &mut merged).await?;
    }
    if non_blank(input.metrics.as_deref()).is_none() {
        input.metrics = read_uploads(&state, &pending, FileType::Metrics, &mut merged).await?;
    }

    let outcome = state.pipeline.handle_turn(&mut session, input).await?;
    let reply = match outcome {
        TurnOutcome::Skipped => return Ok(StatusCode::NO_CONTENT.into_response()),
        TurnOutcome::Replied(reply) => reply,
    };

    for file in merged {
        state
            .uploads
            .delete(&session.user_id, &file.id.to_string())
            .await?;
    }

    Ok(Json(SendMessageResponse {
        reply: reply.reply,
        thread_id: reply.thread_id,
        mode: reply.mode.to_string(),
        relevant: reply.relevant,
        analysis_id: reply.analysis_id,
    })
    .into_response())
}

/// Message history of a thread (the latest one when no id is given)
#[utoipa::path(
    get,
    path = "/api/chat/history",
    params(HistoryQuery),
    responses(
        (status = 200, description = "Thread history", body = HistoryResponse),
        (status = 404, description = "Thread not found")
    ),
    tag = "chat"
)]
pub async fn history(
    State(state): State<Arc<AppState>>,
    UserId(user_id): UserId,
    Query(query): Query<HistoryQuery>,
) -> ApiResult<Json<HistoryResponse>> {
    let (thread_id, messages) = match non_blank(query.thread_id.as_deref()) {
        Some(thread_id) => {
            let mut session = ChatSession::new(user_id);
            if let Some(session_id) = non_blank(query.session_id.as_deref()) {
                session = session.with_session_id(session_id);
            }
            let messages = state
                .pipeline
                .lifecycle()
                .select_thread(&mut session, thread_id)
                .await?;
            (Some(thread_id.to_string()), messages)
        }
        None => match state.persist.get_latest_thread(&user_id).await? {
            Some(thread) => {
                let messages = state.persist.get_thread_messages(&user_id, &thread.id).await?;
                (Some(thread.id), messages)
            }
            None => (None, Vec::new()),
        },
    };

    Ok(Json(HistoryResponse {
        thread_id,
        messages: messages.iter().map(history_message).collect(),
    }))
}

/// Start a new chat thread and a fresh upload session
#[utoipa::path(
    post,
    path = "/api/chat/new",
    request_body = NewChatRequest,
    responses(
        (status = 200, description = "Thread created", body = NewChatResponse)
    ),
    tag = "chat"
)]
pub async fn new_chat(
    State(state): State<Arc<AppState>>,
    UserId(user_id): UserId,
    body: Option<Json<NewChatRequest>>,
) -> ApiResult<Json<NewChatResponse>> {
    let req = body.map(|Json(req)| req).unwrap_or_default();

    let mut session = ChatSession::new(user_id);
    if let Some(session_id) = non_blank(req.session_id.as_deref()) {
        session = session.with_session_id(session_id);
    }

    let fresh = state.pipeline.lifecycle().start_new_chat(&session).await?;
    let thread_id = fresh.thread_id.ok_or(ApiError::Internal)?;

    Ok(Json(NewChatResponse {
        thread_id,
        session_id: fresh.session_id,
    }))
}

/// List the caller's threads, newest first
#[utoipa::path(
    get,
    path = "/api/chat/list",
    responses(
        (status = 200, description = "Threads with message counts", body = ListThreadsResponse)
    ),
    tag = "chat"
)]
pub async fn list_threads(
    State(state): State<Arc<AppState>>,
    UserId(user_id): UserId,
) -> ApiResult<Json<ListThreadsResponse>> {
    let threads = state.persist.list_threads(&user_id).await?;

    Ok(Json(ListThreadsResponse {
        threads: threads.into_iter().map(thread_row).collect(),
    }))
}

/// Summarize a whole thread with the LLM
#[utoipa::path(
    post,
    path = "/api/chat/summarize",
    request_body = SummarizeRequest,
    responses(
        (status = 200, description = "Thread summary", body = SummarizeResponse),
        (status = 400, description = "threadId missing"),
        (status = 404, description = "Thread not found"),
        (status = 502, description = "AI service error")
    ),
    tag = "chat"
)]
pub async fn summarize(
    State(state): State<Arc<AppState>>,
    UserId(user_id): UserId,
    body: Option<Json<SummarizeRequest>>,
) -> ApiResult<Json<SummarizeResponse>> {
    let req = body.map(|Json(req)| req).unwrap_or_default();
    let thread_id = non_blank(req.thread_id.as_deref())
        .ok_or_else(|| ApiError::BadRequest("threadId is required".to_string()))?;

    let summary = state.pipeline.summarize(&user_id, thread_id).await?;
    Ok(Json(SummarizeResponse { summary }))
}

// Text of every pending upload of `file_type`, oldest first. Files read are
// pushed onto `merged`.
async fn read_uploads<'a>(
    state: &AppState,
    pending: &'a [UploadedFile],
    file_type: FileType,
    merged: &mut Vec<&'a UploadedFile>,
) -> ApiResult<Option<String>> {
    let mut parts = Vec::new();
    for file in pending.iter().filter(|f| f.file_type == file_type) {
        parts.push(state.uploads.read_text(file).await?);
        merged.push(file);
    }

    Ok((!parts.is_empty()).then(|| parts.join("\n\n")))
}

fn history_message(message: &StoredMessage) -> HistoryMessage {
    HistoryMessage {
        role: match message.role {
            MessageRole::User => MessageRoleName::User,
            MessageRole::Assistant => MessageRoleName::Assistant,
        },
        text: message.content.clone(),
        timestamp: message.created_at,
    }
}

fn thread_row(listing: ThreadListing) -> ThreadSummaryRow {
    ThreadSummaryRow {
        thread_id: listing.thread.id,
        title: listing.thread.title,
        created_at: listing.thread.created_at,
        msg_count: listing.message_count,
    }
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|s| !s.is_empty())
}
