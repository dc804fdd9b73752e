use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::Json;
use axum::extract::State;
use axum::response::Html;
use log::info;
use serde_json::{Value, json};

use super::error::Result;
use super::state::AppState;
use super::types::*;
use crate::searcher::Searcher;

/// 搜索页
pub async fn index_handler() -> Html<&'static str> {
    Html(INDEX_HTML)
}

/// 用一段文本搜索相似图片
#[utoipa::path(
    post,
    path = "/search",
    request_body = SearchRequest,
    responses(
        (status = 200, body = SearchResponse),
    )
)]
pub async fn search_handler(
    State(state): State<Arc<AppState>>,
    Json(req): Json<SearchRequest>,
) -> Result<Json<Value>> {
    let start = Instant::now();
    info!("正在搜索: {:?}", req.text);

    let matches = Searcher::new(&state.model, &state.db, &state.source)
        .count(req.count.unwrap_or(state.search.count))
        .url_ttl(Duration::from_secs(state.search.url_ttl))
        .search(&req.text)
        .await?;

    Ok(Json(json!({
        "time": start.elapsed().as_millis() as u64,
        "result": matches,
    })))
}

const INDEX_HTML: &str = r#"<!doctype html>
<html>
<head><meta charset="utf-8"><title>picsearch</title></head>
<body>
<p>
  <input id="text" placeholder="Find images like..." size="40">
  <button onclick="search()">Search</button>
</p>
<ol id="result"></ol>
<script>
async function search() {
  const resp = await fetch('/search', {
    method: 'POST',
    headers: {'Content-Type': 'application/json'},
    body: JSON.stringify({text: document.getElementById('text').value}),
  });
  const data = await resp.json();
  const list = document.getElementById('result');
  list.innerHTML = '';
  for (const m of data.result) {
    const li = document.createElement('li');
    li.innerHTML = `<a href="${m.url}">${m.key}</a><br><img src="${m.url}" height="160">`;
    list.appendChild(li);
  }
}
</script>
</body>
</html>
"#;
