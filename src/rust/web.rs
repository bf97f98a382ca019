use askama::Template;
use axum::{
    extract::State,
    http::StatusCode,
    response::{Html, IntoResponse, Response},
    routing::{get, post},
    Form, Json, Router,
};
use serde::Deserialize;
use serde_json::json;
use std::fmt;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::signal;
use tower_http::compression::CompressionLayer;

use crate::analysis::analyze_shared;
use crate::format::{format, FormattedResult};
use crate::prediction::SharedModel;

type SharedState = Arc<AppState>;

pub struct AppState {
    pub model: SharedModel,
    /// Shown in the "About" panel
    pub model_name: String,
}

impl AppState {
    pub fn new(model: SharedModel, model_name: impl Into<String>) -> Self {
        Self {
            model,
            model_name: model_name.into(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct WebConfig {
    pub addr: SocketAddr,
}

impl Default for WebConfig {
    fn default() -> Self {
        Self {
            addr: SocketAddr::from(([127, 0, 0, 1], 8501)),
        }
    }
}

#[derive(Debug)]
pub enum WebError {
    Io(std::io::Error),
}

impl fmt::Display for WebError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WebError::Io(err) => write!(f, "io error: {err}"),
        }
    }
}

impl std::error::Error for WebError {}

impl From<std::io::Error> for WebError {
    fn from(value: std::io::Error) -> Self {
        WebError::Io(value)
    }
}

pub async fn serve(config: WebConfig, state: AppState) -> Result<(), WebError> {
    let router = build_router(state);
    log::info!("Binding HTTP listener on http://{}", config.addr);
    let listener = TcpListener::bind(config.addr).await?;
    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    log::info!("HTTP server exited");
    Ok(())
}

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(home))
        .route("/analyze", post(analyze_form).get(home))
        .route("/healthz", get(health))
        .with_state(Arc::new(state))
        .layer(CompressionLayer::new())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        let _ = signal::ctrl_c().await;
    };
    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{signal, SignalKind};
        if let Ok(mut stream) = signal(SignalKind::terminate()) {
            let _ = stream.recv().await;
        }
    };
    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}

#[derive(Debug, Default, Deserialize)]
struct AnalyzeForm {
    #[serde(default)]
    text: String,
}

async fn home(State(state): State<SharedState>) -> Response {
    render_page(PageTemplate::blank(&state.model_name))
}

async fn analyze_form(
    State(state): State<SharedState>,
    Form(form): Form<AnalyzeForm>,
) -> Response {
    let mut page = PageTemplate::blank(&state.model_name);
    page.text = &form.text;

    match analyze_shared(Arc::clone(&state.model), form.text.clone()).await {
        Ok(predictions) => page.result = Some(format(&predictions)),
        Err(err) if err.is_warning() => page.warning = Some(err.to_string()),
        Err(err) => {
            log::error!("Analysis failed: {}", err);
            page.error = Some(err.to_string());
        }
    }
    render_page(page)
}

async fn health() -> impl IntoResponse {
    Json(json!({ "status": "ok", "service": "emotion-detector" }))
}

fn render_page(page: PageTemplate<'_>) -> Response {
    match page.render() {
        Ok(html) => Html(html).into_response(),
        Err(err) => {
            log::error!("Failed to render page: {}", err);
            (StatusCode::INTERNAL_SERVER_ERROR, "failed to render page").into_response()
        }
    }
}

#[derive(Template)]
#[template(
    source = r#"<!DOCTYPE html>
<html lang="en">
  <head>
    <meta charset="utf-8" />
    <meta name="viewport" content="width=device-width, initial-scale=1" />
    <title>Emotion Detector</title>
    <style>
      body {
        margin: 0;
        min-height: 100vh;
        font-family: system-ui, -apple-system, "Segoe UI", sans-serif;
        background: linear-gradient(135deg, #e0e7ff 0%, #f0fff4 100%);
      }
      .main {
        max-width: 760px;
        margin: 32px auto;
        background-color: #ffffffcc;
        border-radius: 18px;
        padding: 2rem 2rem 1rem 2rem;
        box-shadow: 0 8px 32px 0 rgba(31, 38, 135, 0.12);
      }
      h1.emotion-title {
        font-family: "Brush Script MT", "Brush Script Std", cursive;
        font-size: 3.5rem;
        letter-spacing: 2px;
        text-transform: uppercase;
        text-align: center;
        color: #6366f1;
        margin-bottom: 0;
      }
      .subtitle { text-align: center; color: #64748b; font-size: 1.1rem; }
      textarea {
        width: 100%;
        box-sizing: border-box;
        background: #f0f4f8;
        border: 1px solid #cbd5e1;
        border-radius: 10px;
        font-size: 1.1rem;
        min-height: 120px;
        color: #000;
        padding: 0.6em;
      }
      button {
        background: linear-gradient(90deg, #6366f1 0%, #06b6d4 100%);
        color: white;
        border: none;
        border-radius: 8px;
        font-weight: bold;
        font-size: 1.1rem;
        padding: 0.5em 2em;
        margin-top: 0.5em;
        cursor: pointer;
      }
      button:hover { background: linear-gradient(90deg, #06b6d4 0%, #6366f1 100%); }
      .alert { border-radius: 8px; padding: 0.8em 1em; margin-top: 1em; }
      .alert-warning { background: #fef9c3; color: #854d0e; }
      .alert-error { background: #fee2e2; color: #991b1b; }
      table { width: 100%; border-collapse: collapse; margin-top: 0.5em; }
      th, td { text-align: left; padding: 0.4em 0.6em; border-bottom: 1px solid #e2e8f0; }
      .chart { margin-top: 1.5em; }
      .chart-row { display: flex; align-items: center; margin: 0.3em 0; }
      .chart-label { width: 7em; color: #374151; }
      .chart-track { flex: 1; background: #f1f5f9; border-radius: 4px; height: 1.4em; }
      .chart-bar { height: 100%; border-radius: 4px; }
      .chart-value { width: 4.5em; text-align: right; color: #64748b; font-variant-numeric: tabular-nums; }
      .chart-axis { text-align: center; color: #64748b; font-size: 0.9rem; }
      .about {
        max-width: 600px;
        margin: 40px auto 24px auto;
        background: #f8fafc;
        border-radius: 18px;
        border: 2px solid #6366f1;
        box-shadow: 0 4px 24px rgba(99, 102, 241, 0.08);
        padding: 28px 32px 18px 32px;
        text-align: center;
      }
      .about h3 { color: #6366f1; margin-bottom: 0.5em; }
      .about p { color: #374151; font-size: 1.05rem; }
      footer { text-align: center; color: #a0aec0; font-size: 0.95rem; padding-bottom: 1em; }
    </style>
  </head>
  <body>
    <main class="main">
      <h1 class="emotion-title">Emotion Detector</h1>
      <p class="subtitle">Analyze the emotions in your text instantly!</p>

      <form method="post" action="/analyze">
        <label for="text">Type a sentence to analyze emotions:</label>
        <textarea id="text" name="text" rows="5">{{ text }}</textarea>
        <button type="submit">Analyze</button>
      </form>

      {% if let Some(message) = warning %}
      <div class="alert alert-warning" role="alert">{{ message }}</div>
      {% endif %}
      {% if let Some(message) = error %}
      <div class="alert alert-error" role="alert">{{ message }}</div>
      {% endif %}

      {% if let Some(result) = result %}
      <section id="results">
        <h2>Predicted Emotions</h2>
        <table>
          <thead>
            <tr><th>Emoji</th><th>Emotion</th><th>Confidence</th></tr>
          </thead>
          <tbody>
            {% for row in result.table %}
            <tr><td>{{ row.glyph }}</td><td>{{ row.label }}</td><td>{{ "{:.4}"|format(row.confidence) }}</td></tr>
            {% endfor %}
          </tbody>
        </table>

        <div class="chart" role="img" aria-label="Confidence by emotion">
          {% for bar in result.chart %}
          <div class="chart-row">
            <span class="chart-label">{{ bar.label }}</span>
            <div class="chart-track">
              <div class="chart-bar" style="width: {{ "{:.2}"|format(bar.width_percent) }}%; background: {{ bar.color }};"></div>
            </div>
            <span class="chart-value">{{ "{:.4}"|format(bar.confidence) }}</span>
          </div>
          {% endfor %}
          <p class="chart-axis">Confidence</p>
        </div>
      </section>
      {% endif %}
    </main>

    <div class="about">
      <h3>About This App</h3>
      <p>
        <strong>Emotion Detector</strong> analyzes the emotions in your text using a transformer model
        (<code>{{ model_name }}</code>).<br>
        Enter any sentence and instantly see the predicted emotions and their confidence scores.
      </p>
    </div>

    <footer><hr>&copy; 2025 Emotion Detector App &middot; v{{ version }}</footer>
  </body>
</html>"#,
    ext = "html"
)]
struct PageTemplate<'a> {
    text: &'a str,
    warning: Option<String>,
    error: Option<String>,
    result: Option<FormattedResult>,
    model_name: &'a str,
    version: &'static str,
}

impl<'a> PageTemplate<'a> {
    fn blank(model_name: &'a str) -> Self {
        Self {
            text: "",
            warning: None,
            error: None,
            result: None,
            model_name,
            version: env!("CARGO_PKG_VERSION"),
        }
    }
}
