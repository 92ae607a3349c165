use crate::types::{AnalyzeRequest, ErrorBody};
use anyhow::{Context, Result};
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use emoquest_core::{
    AnalyzeResponse, ClassifierError, HistoryView, ProgressRecord, QuestEngine, QuestError, QuestLedgerEntry,
};
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

/// Shared state for the gateway server.
#[derive(Clone)]
struct AppState {
    engine: Arc<QuestEngine>,
}

/// Error returned by route handlers, rendered as `{"error": .., "retryable": ..}`.
#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub body: ErrorBody,
}

impl ApiError {
    fn not_found(message: &str) -> Self {
        Self {
            status: StatusCode::NOT_FOUND,
            body: ErrorBody {
                error: message.to_string(),
                retryable: false,
            },
        }
    }
}

impl From<QuestError> for ApiError {
    fn from(err: QuestError) -> Self {
        let status = match &err {
            QuestError::Classification(ClassifierError::EmptyInput) => StatusCode::BAD_REQUEST,
            QuestError::Classification(_) => StatusCode::BAD_GATEWAY,
            QuestError::Store(_) => StatusCode::SERVICE_UNAVAILABLE,
        };
        if status.is_server_error() {
            tracing::error!("Request failed: {}", err);
        }
        Self {
            status,
            body: ErrorBody {
                error: err.to_string(),
                retryable: err.is_retryable(),
            },
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(self.body)).into_response()
    }
}

/// The gateway HTTP server.
///
/// Exposes the quest engine as JSON:
/// - `POST /analyze`: classify text and apply progression
/// - `GET /users/:username/history`: gated trend view
/// - `GET /users/:username/status`: current progress record
/// - `GET /users/:username/quests`: quest ledger
/// - `POST /users/:username/init`: create a zeroed progress record
/// - `GET /health`: health check
pub struct GatewayServer {
    engine: Arc<QuestEngine>,
    host: String,
    port: u16,
}

impl GatewayServer {
    pub fn new(engine: Arc<QuestEngine>, host: &str, port: u16) -> Self {
        Self {
            engine,
            host: host.to_string(),
            port,
        }
    }

    pub fn router(&self) -> Router {
        let state = AppState {
            engine: self.engine.clone(),
        };
        Router::new()
            .route("/health", get(health))
            .route("/analyze", post(analyze))
            .route("/users/:username/history", get(history))
            .route("/users/:username/status", get(status))
            .route("/users/:username/quests", get(quests))
            .route("/users/:username/init", post(init_user))
            .layer(TraceLayer::new_for_http())
            .layer(CorsLayer::permissive())
            .with_state(state)
    }

    /// Bind the listener and start serving on a background task.
    ///
    /// Bind failures are returned to the caller instead of being logged inside
    /// the task.
    pub async fn start(self) -> Result<tokio::task::JoinHandle<()>> {
        let app = self.router();
        let addr = format!("{}:{}", self.host, self.port);
        let listener = tokio::net::TcpListener::bind(&addr)
            .await
            .with_context(|| format!("Gateway failed to bind {}", addr))?;
        let local = listener.local_addr().map(|a| a.to_string()).unwrap_or(addr);
        tracing::info!("Gateway listening on {}", local);

        Ok(tokio::spawn(async move {
            if let Err(e) = axum::serve(listener, app).await {
                tracing::error!("Gateway server error: {}", e);
            }
        }))
    }
}

// ============================================================================
// Route handlers
// ============================================================================

async fn health() -> &'static str {
    "ok"
}

async fn analyze(
    State(state): State<AppState>,
    Json(req): Json<AnalyzeRequest>,
) -> Result<Json<AnalyzeResponse>, ApiError> {
    let response = state.engine.handle_analyze(&req.username, &req.text).await?;
    Ok(Json(response))
}

async fn history(
    State(state): State<AppState>,
    Path(username): Path<String>,
) -> Result<Json<HistoryView>, ApiError> {
    Ok(Json(state.engine.handle_history_view(&username).await?))
}

async fn status(
    State(state): State<AppState>,
    Path(username): Path<String>,
) -> Result<Json<ProgressRecord>, ApiError> {
    match state.engine.status(&username).await? {
        Some(record) => Ok(Json(record)),
        None => Err(ApiError::not_found("no progress data")),
    }
}

async fn quests(
    State(state): State<AppState>,
    Path(username): Path<String>,
) -> Result<Json<Vec<QuestLedgerEntry>>, ApiError> {
    Ok(Json(state.engine.quest_history(&username).await?))
}

async fn init_user(
    State(state): State<AppState>,
    Path(username): Path<String>,
) -> Result<Json<ProgressRecord>, ApiError> {
    Ok(Json(state.engine.init_user(&username).await?))
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use emoquest_core::{Classification, EmotionClassifier, InMemoryStore, StoreError};

    struct FixedClassifier(&'static str);

    #[async_trait]
    impl EmotionClassifier for FixedClassifier {
        async fn classify(&self, _text: &str) -> Result<Classification, ClassifierError> {
            Ok(Classification {
                label: self.0.to_string(),
                score: 0.9,
            })
        }

        fn name(&self) -> &str {
            "fixed"
        }
    }

    fn state(label: &'static str) -> AppState {
        let engine = QuestEngine::new(Arc::new(FixedClassifier(label)), Arc::new(InMemoryStore::new()));
        AppState {
            engine: Arc::new(engine),
        }
    }

    fn request(username: &str, text: &str) -> Json<AnalyzeRequest> {
        Json(AnalyzeRequest {
            username: username.to_string(),
            text: text.to_string(),
        })
    }

    #[tokio::test]
    async fn test_health_endpoint() {
        assert_eq!(health().await, "ok");
    }

    #[tokio::test]
    async fn test_gateway_server_creates() {
        let server = GatewayServer::new(state("joy").engine, "127.0.0.1", 0);
        assert_eq!(server.host, "127.0.0.1");
        assert_eq!(server.port, 0);
        let _router = server.router();
    }

    #[tokio::test]
    async fn test_start_serves_on_ephemeral_port() {
        let server = GatewayServer::new(state("joy").engine, "127.0.0.1", 0);
        let handle = server.start().await.unwrap();
        handle.abort();
    }

    #[tokio::test]
    async fn test_start_reports_bind_failure() {
        let taken = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = taken.local_addr().unwrap().port();

        let server = GatewayServer::new(state("joy").engine, "127.0.0.1", port);
        let err = server.start().await.unwrap_err();
        assert!(err.to_string().contains("failed to bind"));
    }

    #[tokio::test]
    async fn test_analyze_returns_payload() {
        let st = state("anger");
        let Json(resp) = analyze(State(st.clone()), request("alice", "so annoying")).await.unwrap();
        assert_eq!(resp.emotion, "anger");
        assert_eq!(resp.quest, "댄스 챌린지");
        assert_eq!(resp.exp_gain, 7);
        assert_eq!(resp.total_exp, 7);
        assert_eq!(resp.level, 1);

        let Json(record) = status(State(st.clone()), Path("alice".to_string())).await.unwrap();
        assert_eq!(record.experience, 7);

        let Json(ledger) = quests(State(st), Path("alice".to_string())).await.unwrap();
        assert_eq!(ledger.len(), 1);
    }

    #[tokio::test]
    async fn test_analyze_empty_text_is_bad_request() {
        let err = analyze(State(state("joy")), request("bob", "")).await.unwrap_err();
        assert_eq!(err.status, StatusCode::BAD_REQUEST);
        assert!(!err.body.retryable);
    }

    #[tokio::test]
    async fn test_status_unknown_user_not_found() {
        let err = status(State(state("joy")), Path("ghost".to_string())).await.unwrap_err();
        assert_eq!(err.status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_history_blocked_then_trend() {
        let st = state("fear");
        let Json(view) = history(State(st.clone()), Path("carol".to_string())).await.unwrap();
        assert!(view.is_blocked());

        for _ in 0..10 {
            analyze(State(st.clone()), request("carol", "nervous")).await.unwrap();
        }
        let Json(view) = history(State(st), Path("carol".to_string())).await.unwrap();
        assert!(!view.is_blocked());
    }

    #[tokio::test]
    async fn test_init_user() {
        let st = state("joy");
        let Json(record) = init_user(State(st), Path("dave".to_string())).await.unwrap();
        assert_eq!(record.experience, 0);
        assert_eq!(record.level, 1);
    }

    #[test]
    fn test_error_status_mapping() {
        let e = ApiError::from(QuestError::from(ClassifierError::NoLabel));
        assert_eq!(e.status, StatusCode::BAD_GATEWAY);
        let e = ApiError::from(QuestError::from(StoreError::Unavailable("down".into())));
        assert_eq!(e.status, StatusCode::SERVICE_UNAVAILABLE);
        assert!(e.body.retryable);
    }
}
