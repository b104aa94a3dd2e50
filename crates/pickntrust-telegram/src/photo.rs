//! Telegram photo proxy.
//!
//! Photo posts are stored with a proxy URL holding only the file id. The
//! proxy downloads the file through the Bot API on request, so stored URLs
//! never carry the bot token.

use axum::{
    extract::{Path, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde_json::json;
use teloxide::net::Download;
use teloxide::prelude::*;
use tracing::{debug, warn};

/// Path prefix served by the proxy.
pub const PHOTO_PATH: &str = "/api/telegram/photo";

/// Returns the proxy URL for a Telegram file id.
pub fn photo_url(file_id: &str) -> String {
    format!("{}/{}", PHOTO_PATH, file_id)
}

/// Creates the proxy router.
pub fn photo_router(bot: Bot) -> Router {
    Router::new()
        .route("/api/telegram/photo/:file_id", get(proxy_photo))
        .with_state(bot)
}

fn is_valid_file_id(file_id: &str) -> bool {
    !file_id.is_empty()
        && file_id.len() <= 256
        && file_id
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
}

fn content_type_for(path: &str) -> &'static str {
    let ext = path.rsplit('.').next().unwrap_or_default().to_lowercase();
    match ext.as_str() {
        "jpg" | "jpeg" => "image/jpeg",
        "png" => "image/png",
        "webp" => "image/webp",
        "gif" => "image/gif",
        _ => "application/octet-stream",
    }
}

fn error_response(status: StatusCode, message: &str) -> Response {
    (status, Json(json!({ "error": message }))).into_response()
}

/// GET /api/telegram/photo/:file_id - Streams a Telegram photo.
async fn proxy_photo(State(bot): State<Bot>, Path(file_id): Path<String>) -> Response {
    if !is_valid_file_id(&file_id) {
        return error_response(StatusCode::BAD_REQUEST, "invalid file id");
    }

    let file = match bot.get_file(file_id.clone()).await {
        Ok(file) => file,
        Err(e) => {
            debug!(file_id = %file_id, error = %e, "Telegram file lookup failed");
            return error_response(StatusCode::NOT_FOUND, "photo not found");
        }
    };

    let mut data = Vec::new();
    if let Err(e) = bot.download_file(&file.path, &mut data).await {
        warn!(file_id = %file_id, error = %e, "Telegram file download failed");
        return error_response(StatusCode::BAD_GATEWAY, "photo download failed");
    }

    (
        [
            (header::CONTENT_TYPE, content_type_for(&file.path)),
            (header::CACHE_CONTROL, "public, max-age=86400"),
        ],
        data,
    )
        .into_response()
}
