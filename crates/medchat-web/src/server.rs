//! Chat page and question endpoint

use axum::{
    Form, Json, Router,
    extract::State,
    response::{Html, IntoResponse},
    routing::get,
};
use serde::Deserialize;
use serde_json::json;
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::trace::TraceLayer;

use medchat_core::{Error, Result};
use medchat_rag::QueryPipeline;

use crate::error::ChatError;

/// Single-page chat UI served at `/`
pub const CHAT_PAGE: &str = include_str!("../templates/chat.html");

/// Shared state handed to every request handler
#[derive(Clone)]
pub struct AppContext {
    pipeline: Arc<QueryPipeline>,
}

impl AppContext {
    pub fn new(pipeline: QueryPipeline) -> Self {
        Self {
            pipeline: Arc::new(pipeline),
        }
    }

    pub fn pipeline(&self) -> &QueryPipeline {
        &self.pipeline
    }
}

#[derive(Debug, Deserialize)]
struct ChatForm {
    msg: Option<String>,
}

pub fn router(ctx: AppContext) -> Router {
    Router::new()
        .route("/", get(index_handler))
        .route("/get", get(chat_handler).post(chat_handler))
        .route("/health", get(health_handler))
        .layer(TraceLayer::new_for_http())
        .with_state(ctx)
}

/// Bind `addr` and serve until Ctrl-C
pub async fn serve(ctx: AppContext, addr: SocketAddr) -> Result<()> {
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!("chat server listening on http://{}", listener.local_addr()?);

    axum::serve(listener, router(ctx))
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("chat server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!("failed to listen for Ctrl-C: {}", e);
        std::future::pending::<()>().await;
    }
}

async fn index_handler() -> Html<&'static str> {
    Html(CHAT_PAGE)
}

async fn chat_handler(
    State(ctx): State<AppContext>,
    form: Option<Form<ChatForm>>,
) -> std::result::Result<String, ChatError> {
    let msg = form
        .and_then(|Form(form)| form.msg)
        .filter(|msg| !msg.trim().is_empty())
        .ok_or_else(|| Error::InvalidInput("missing form field 'msg'".to_string()))?;

    tracing::info!(question = %msg, "chat request");
    match ctx.pipeline.answer(&msg).await {
        Ok(answer) => {
            tracing::info!(matches = answer.context.len(), "answered");
            Ok(answer.text)
        }
        Err(e) => {
            tracing::error!(question = %msg, error = %e, "failed to answer");
            Err(ChatError(e))
        }
    }
}

async fn health_handler(State(ctx): State<AppContext>) -> impl IntoResponse {
    let config = ctx.pipeline.config();
    Json(json!({
        "status": "ok",
        "index": config.index_name,
        "top_k": config.top_k,
    }))
}
