use crate::agent::{Agent, AzureChatModel, ToolAgent};
use crate::config::Config;
use crate::datetime_tools::DateTimeTools;
use crate::movie_tools::MovieTools;
use crate::registry::build_registry;
use crate::tmdb::{TmdbApi, TmdbClient};
use anyhow::Result;
use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::sync::Arc;
use tower_http::{limit::RequestBodyLimitLayer, trace::TraceLayer};
use tracing::{error, info};

const MAX_BODY_BYTES: usize = 64 * 1024;

#[derive(Clone)]
pub struct AppState {
    pub agent: Arc<dyn Agent>,
    pub environment: String,
    pub machine_name: String,
}

impl AppState {
    pub fn new(agent: Arc<dyn Agent>, config: &Config) -> Self {
        Self {
            agent,
            environment: config.environment.clone(),
            machine_name: config.machine_name.clone(),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct AskRequest {
    #[serde(default)]
    pub question: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct AskResponse {
    pub answer: String,
}

pub async fn run_server(config: Config) -> Result<()> {
    let tmdb: Arc<dyn TmdbApi> = Arc::new(TmdbClient::new(&config.tmdb)?);
    let registry = Arc::new(build_registry(MovieTools::new(tmdb), DateTimeTools::new()));
    info!("Registered {} tools", registry.names().len());

    let model = Arc::new(AzureChatModel::new(&config.agent)?);
    let agent: Arc<dyn Agent> = Arc::new(ToolAgent::new(config.agent.name.clone(), model, registry));

    let app = build_router(AppState::new(agent, &config));

    info!("Listening on {}", config.bind_addr);
    let listener = tokio::net::TcpListener::bind(config.bind_addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/ask", post(ask))
        .route("/health", get(health))
        .route("/health/ready", get(ready))
        .route("/version", get(version))
        .layer(RequestBodyLimitLayer::new(MAX_BODY_BYTES))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn health() -> Json<&'static str> {
    Json("healthy")
}

async fn ready() -> Json<&'static str> {
    Json("ready")
}

async fn version(State(state): State<AppState>) -> Json<serde_json::Value> {
    Json(json!({
        "version": env!("CARGO_PKG_VERSION"),
        "build_time": option_env!("BUILD_TIME"),
        "environment": state.environment,
        "machine_name": state.machine_name,
    }))
}

async fn ask(State(state): State<AppState>, Json(req): Json<AskRequest>) -> Response {
    let question = req.question.trim();
    if question.is_empty() {
        return (StatusCode::BAD_REQUEST, "Question is required.").into_response();
    }

    match state.agent.ask(question).await {
        Ok(answer) => Json(AskResponse { answer }).into_response(),
        Err(e) => {
            error!("Agent failed to answer: {:#}", e);
            (
                StatusCode::BAD_GATEWAY,
                Json(json!({ "error": format!("{e}") })),
            )
                .into_response()
        }
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{signal, SignalKind};
        let mut term = signal(SignalKind::terminate()).expect("failed to install SIGTERM handler");
        term.recv().await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Shutdown signal received (Ctrl+C)");
        }
        _ = terminate => {
            info!("Shutdown signal received (SIGTERM)");
        }
    }
}
