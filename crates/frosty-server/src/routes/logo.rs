use std::{path::Path, sync::Arc};

use axum::{extract::State, response::IntoResponse, Json};
use base64::Engine;
use serde_json::json;

use crate::state::AppState;

pub const LOGO_NOTICE: &str = "Logo not uploaded";

/// `GET /logo` - the sidebar logo as a `data:` URI.
///
/// A missing file is not an error: the response carries `"data": null` and a
/// text notice the sidebar shows instead.
pub async fn get_logo(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let path = Path::new(&state.config.logo_path);
    match tokio::fs::read(path).await {
        Ok(bytes) => Json(json!({
            "data": { "src": data_uri(path, &bytes) },
            "notice": null
        })),
        Err(e) => {
            if e.kind() != std::io::ErrorKind::NotFound {
                tracing::warn!(path = %path.display(), error = %e, "Logo unreadable");
            }
            Json(json!({ "data": null, "notice": LOGO_NOTICE }))
        }
    }
}

/// `data:image/<ext>;base64,...` with the extension taken from the file name.
fn data_uri(path: &Path, bytes: &[u8]) -> String {
    let mime = path
        .extension()
        .and_then(|ext| ext.to_str())
        .map(str::to_ascii_lowercase)
        .unwrap_or_else(|| "png".to_string());
    let encoded = base64::engine::general_purpose::STANDARD.encode(bytes);
    format!("data:image/{mime};base64,{encoded}")
}
