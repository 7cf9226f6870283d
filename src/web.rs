//! Browser editor: serves a file in a CodeMirror page and saves it back
//!
//! `GET /?path=FILE` renders the editor, `POST /save` with
//! `{"path": ..., "content": ...}` writes the file.

use std::path::PathBuf;

use axum::body::Bytes;
use axum::extract::Query;
use axum::http::StatusCode;
use axum::response::Html;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};

use crate::core::document::Document;

/// Port used when `PORT` is not set
pub const DEFAULT_PORT: u16 = 5000;

const EDITOR_PAGE: &str = r#"<!doctype html>
<html>
<head>
<title>NovaAtom Web Editor</title>
<link rel="stylesheet" href="https://cdnjs.cloudflare.com/ajax/libs/codemirror/5.65.5/codemirror.min.css">
<script src="https://cdnjs.cloudflare.com/ajax/libs/codemirror/5.65.5/codemirror.min.js"></script>
<script src="https://cdnjs.cloudflare.com/ajax/libs/codemirror/5.65.5/mode/python/python.min.js"></script>
</head>
<body>
<textarea id="editor">{{content}}</textarea>
<div style="margin-top:10px;">
  <input id="path" type="text" value="{{path}}" placeholder="File path" style="width:70%;"/>
  <button onclick="save()">Save</button>
  <span id="status" style="margin-left:10px;"></span>
</div>
<script>
var editor = CodeMirror.fromTextArea(document.getElementById('editor'), {
  lineNumbers: true,
  lineWrapping: true,
  mode: 'python'
});
editor.setSize('100%', '80vh');
function save() {
  fetch('/save', {
    method: 'POST',
    headers: {'Content-Type': 'application/json'},
    body: JSON.stringify({path: document.getElementById('path').value, content: editor.getValue()})
  }).then(resp => resp.json()).then(data => {
    document.getElementById('status').textContent = data.message || data.status;
    setTimeout(() => { document.getElementById('status').textContent = ''; }, 2000);
  });
}
document.addEventListener('keydown', function(e) {
  if ((e.ctrlKey || e.metaKey) && e.key === 's') {
    e.preventDefault();
    save();
  }
});
</script>
</body>
</html>
"#;

#[derive(Debug, Default, Deserialize)]
struct PageQuery {
    #[serde(default)]
    path: String,
}

#[derive(Debug, Default, Deserialize)]
struct SaveRequest {
    #[serde(default)]
    path: Option<String>,
    #[serde(default)]
    content: String,
}

/// Body of every `/save` reply
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SaveResponse {
    pub status: String,
    pub message: String,
}

impl SaveResponse {
    fn ok(message: impl Into<String>) -> Self {
        Self {
            status: "ok".to_string(),
            message: message.into(),
        }
    }

    fn error(message: impl Into<String>) -> Self {
        Self {
            status: "error".to_string(),
            message: message.into(),
        }
    }
}

/// Routes of the browser editor
pub fn router() -> Router {
    Router::new()
        .route("/", get(editor_page))
        .route("/save", post(save_file))
}

fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            c => out.push(c),
        }
    }
    out
}

/// Fill the editor template
pub fn render_page(path: &str, content: &str) -> String {
    let path = escape_html(path);
    let content = escape_html(content);
    // The file text must not be scanned for placeholders
    match EDITOR_PAGE.split_once("{{content}}") {
        Some((head, tail)) => format!("{}{}{}", head, content, tail.replace("{{path}}", &path)),
        None => EDITOR_PAGE.replace("{{path}}", &path),
    }
}

async fn editor_page(Query(query): Query<PageQuery>) -> Html<String> {
    let content = if query.path.is_empty() {
        String::new()
    } else {
        let path = PathBuf::from(&query.path);
        // An unreadable file opens as an empty editor
        match tokio::task::spawn_blocking(move || Document::open(&path)).await {
            Ok(Ok(doc)) => doc.content,
            Ok(Err(e)) => {
                tracing::debug!("{:#}", e);
                String::new()
            }
            Err(e) => {
                tracing::error!("Open task failed: {}", e);
                String::new()
            }
        }
    };

    Html(render_page(&query.path, &content))
}

async fn save_file(body: Bytes) -> (StatusCode, Json<SaveResponse>) {
    // Accept JSON whatever the Content-Type says
    let request: SaveRequest = match serde_json::from_slice(&body) {
        Ok(request) => request,
        Err(e) => {
            return (
                StatusCode::BAD_REQUEST,
                Json(SaveResponse::error(format!("Invalid JSON: {}", e))),
            )
        }
    };

    let Some(path) = request.path.filter(|p| !p.is_empty()) else {
        return (
            StatusCode::BAD_REQUEST,
            Json(SaveResponse::error("No path provided")),
        );
    };

    let content = request.content;
    let path = PathBuf::from(path);
    let result = tokio::task::spawn_blocking(move || {
        let mut doc = Document::new();
        doc.content = content;
        doc.save_as(&path)
    })
    .await;

    match result {
        Ok(Ok(())) => (StatusCode::OK, Json(SaveResponse::ok("File saved"))),
        Ok(Err(e)) => {
            tracing::error!("Failed to save from web editor: {:#}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(SaveResponse::error(format!("{:#}", e))),
            )
        }
        Err(e) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(SaveResponse::error(e.to_string())),
        ),
    }
}
