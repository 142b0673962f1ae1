use axum::Json;
use utoipa::OpenApi;

use crate::routes::{chat, files, health};

#[derive(OpenApi)]
#[openapi(
    paths(
        health::health_check,
        chat::send_message,
        chat::history,
        chat::new_chat,
        chat::list_threads,
        chat::summarize,
        files::upload_file,
        files::delete_file,
    ),
    components(schemas(
        health::HealthResponse,
        chat::SendMessageRequest,
        chat::SendMessageResponse,
        chat::HistoryMessage,
        chat::MessageRoleName,
        chat::HistoryResponse,
        chat::NewChatRequest,
        chat::NewChatResponse,
        chat::ThreadSummaryRow,
        chat::ListThreadsResponse,
        chat::SummarizeRequest,
        chat::SummarizeResponse,
        files::FileResponse,
        files::UploadResponse,
        files::DeleteResponse,
    )),
    tags(
        (name = "health", description = "Service status"),
        (name = "chat", description = "Threads, messages and summaries"),
        (name = "files", description = "Plan and metrics uploads")
    )
)]
pub struct ApiDoc;

pub async fn openapi_json() -> Json<utoipa::openapi::OpenApi> {
    Json(ApiDoc::openapi())
}
