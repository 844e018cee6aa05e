//! Listing and player page handlers.
//!
//! Both pages read a fresh index snapshot; every validation or lookup
//! failure on the player route degrades to a silent redirect to the
//! listing.

use axum::{
    extract::{Query, State},
    response::{Html, IntoResponse, Redirect, Response},
};
use serde::Deserialize;

use super::AppContext;
use crate::index::{self, SegmentId, SegmentIndex};

#[derive(Deserialize)]
pub struct PlayerQuery {
    #[serde(default)]
    v: String,
}

/// Serve the playlist listing page.
///
/// An unreadable index renders as an empty listing, never as an error.
pub async fn index_page(State(ctx): State<AppContext>) -> Html<String> {
    let index = SegmentIndex::load_or_empty(&ctx.config.index.path);
    Html(render_index(&index))
}

/// Serve the player page for the segment requested via `?v=<id>`.
pub async fn player_page(
    State(ctx): State<AppContext>,
    Query(query): Query<PlayerQuery>,
) -> Response {
    let Ok(id) = query.v.parse::<SegmentId>() else {
        return Redirect::to("/").into_response();
    };

    let index = match SegmentIndex::load(&ctx.config.index.path) {
        Ok(index) => index,
        Err(e) => {
            tracing::debug!("player request with unreadable index: {}", e);
            return Redirect::to("/").into_response();
        }
    };

    let filename = id.filename();
    if !index.contains(&filename) {
        return Redirect::to("/").into_response();
    }

    let next_id = index.next_after(&filename).unwrap_or("");
    let manifest_url = format!(
        "{}{}",
        ctx.config.origin.base_url,
        urlencoding::encode(&filename)
    );

    Html(render_player(id.as_str(), &manifest_url, next_id)).into_response()
}

fn render_index(index: &SegmentIndex) -> String {
    let mut html = String::from(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="UTF-8">
    <title>Playlist</title>
    <style>
        body {
            background: #0d0d0d;
            color: #f0f0f0;
            font-family: system-ui, sans-serif;
            margin: 2rem;
        }
        h1 { color: #00d0ff; }
        ul { list-style: none; padding: 0; }
        li { margin: 0.5rem 0; }
        a {
            color: #80d4ff;
            text-decoration: none;
            background: #1a1a1a;
            border-radius: 4px;
            padding: 0.4rem 0.6rem;
            display: inline-block;
        }
        a:hover { background: #2e2e2e; }
    </style>
</head>
<body>
    <h1>Playlist</h1>
    <ul>
"#,
    );

    for filename in index.iter() {
        let base = index::strip_extension(filename);
        html.push_str(&format!(
            "        <li><a href=\"/player?v={}\">{} <small>({})</small></a></li>\n",
            urlencoding::encode(base),
            escape_html(index::display_title(base)),
            index::format_time(base)
        ));
    }

    html.push_str("    </ul>\n</body>\n</html>\n");
    html
}

fn render_player(id: &str, manifest_url: &str, next_id: &str) -> String {
    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="UTF-8">
    <title>{title}</title>
    <script src="https://cdn.jsdelivr.net/npm/hls.js@latest"></script>
    <meta name="viewport" content="width=device-width, initial-scale=1.0">
    <style>
        html, body {{
            margin: 0;
            padding: 0;
            background: #111;
            color: #0f0;
            font-family: monospace;
            display: flex;
            flex-direction: column;
            align-items: center;
        }}

        #back-btn {{
            margin-top: 1em;
            padding: 0.5em 1.2em;
            background: #0f0;
            color: #111;
            border: none;
            border-radius: 4px;
            font-weight: bold;
            font-family: monospace;
            cursor: pointer;
        }}

        #back-btn:hover {{
            background: #5f5;
        }}

        video {{
            width: 100%;
            max-width: 960px;
            height: auto;
            margin-top: 1em;
            border: 2px solid #0f0;
            box-sizing: border-box;
        }}

        #info {{
            width: 100%;
            max-width: 960px;
            margin: 1em;
            padding: 1em;
            background: #222;
            color: #0f0;
            font-size: 14px;
            white-space: pre-wrap;
            overflow-y: auto;
            max-height: 160px;
            box-sizing: border-box;
            border: 1px solid #0f0;
        }}
    </style>
</head>
<body>
    <button id="back-btn">&larr; Back to Playlist</button>
    <video id="video" controls autoplay></video>
    <div id="info">Latency info...</div>

<script>
const video = document.getElementById('video');
const info = document.getElementById('info');
const m3u8Url = {manifest};
const nextId = {next};
const fetchTimestamps = {{}};
const logBuffer = [];

document.getElementById('back-btn').addEventListener('click', () => {{
    window.location.href = '/';
}});

function addLog(line) {{
    logBuffer.unshift(line);
    if (logBuffer.length > 5) logBuffer.pop();
    info.textContent = logBuffer.join("\n");
}}

function goNext() {{
    if (nextId) {{
        window.location.href = '/player?v=' + encodeURIComponent(nextId);
    }}
}}

if (Hls.isSupported()) {{
    const hls = new Hls({{
        xhrSetup: function(xhr, url) {{
            const tsName = url.split('/ts/')[1] || 'unknown.ts';
            fetchTimestamps[tsName] = Date.now();

            xhr.addEventListener("loadend", function() {{
                const end = Date.now();
                const start = fetchTimestamps[tsName] || end;
                const latencySec = ((end - start) / 1000).toFixed(3);
                addLog(`[${{new Date().toLocaleTimeString()}}] ${{tsName}} - Read latency: ${{latencySec}} s`);
            }});
        }}
    }});

    hls.loadSource(m3u8Url);
    hls.attachMedia(video);
    video.addEventListener('ended', goNext);
}} else if (video.canPlayType('application/vnd.apple.mpegurl')) {{
    video.src = m3u8Url;
    video.addEventListener('ended', goNext);
}}
</script>
</body>
</html>
"#,
        title = escape_html(id),
        manifest = js_string(manifest_url),
        next = js_string(next_id),
    )
}

fn escape_html(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for c in input.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

/// Encode a value for embedding in an inline `<script>` block.
fn js_string(value: &str) -> String {
    serde_json::Value::String(value.to_string()).to_string()
}
