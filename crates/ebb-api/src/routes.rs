use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::{get, put};
use axum::{Json, Router};
use ebb_core::remote::TodoTable;
use ebb_core::{NewTodo, Todo, TodoId, TodoPatch};
use serde::Serialize;
use tokio::sync::RwLock;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::error::AppError;

#[derive(Clone, Default)]
pub struct AppState {
    todos: Arc<RwLock<TodoTable>>,
}

#[derive(Debug, Serialize)]
struct HealthResponse {
    status: &'static str,
    timestamp: i64,
}

pub fn app_router(state: AppState) -> Router {
    Router::new()
        .route("/healthz", get(healthz))
        .route("/api/todos", get(list_todos).post(create_todo))
        .route("/api/todos/{id}", put(update_todo).delete(delete_todo))
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .with_state(state)
}

async fn healthz() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        timestamp: chrono::Utc::now().timestamp(),
    })
}

async fn list_todos(State(state): State<AppState>) -> Json<Vec<Todo>> {
    Json(state.todos.read().await.list())
}

async fn create_todo(
    State(state): State<AppState>,
    Json(new): Json<NewTodo>,
) -> Result<(StatusCode, Json<Todo>), AppError> {
    let todo = state.todos.write().await.create(new)?;
    tracing::info!(id = %todo.id, "Created todo");
    Ok((StatusCode::CREATED, Json(todo)))
}

async fn update_todo(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(mut patch): Json<TodoPatch>,
) -> Result<Json<Todo>, AppError> {
    patch.id = TodoId::new(id);
    let todo = state.todos.write().await.update(&patch)?;
    tracing::info!(id = %todo.id, "Updated todo");
    Ok(Json(todo))
}

async fn delete_todo(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<StatusCode, AppError> {
    state.todos.write().await.delete(TodoId::new(id))?;
    tracing::info!(id, "Deleted todo");
    Ok(StatusCode::NO_CONTENT)
}

#[cfg(test)]
mod tests {
    use axum::body::Body;
    use axum::http::{Method, Request};
    use serde_json::{json, Value};
    use tower::ServiceExt;

    use super::*;

    async fn send(
        router: &Router,
        method: Method,
        uri: &str,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        let body = match body {
            Some(value) => {
                builder = builder.header("content-type", "application/json");
                Body::from(value.to_string())
            }
            None => Body::empty(),
        };
        let response = router
            .clone()
            .oneshot(builder.body(body).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let value = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, value)
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn healthz_reports_ok() {
        let router = app_router(AppState::default());
        let (status, body) = send(&router, Method::GET, "/healthz", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "ok");
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn create_assigns_ids_and_lists_newest_first() {
        let router = app_router(AppState::default());

        let (status, first) = send(
            &router,
            Method::POST,
            "/api/todos",
            Some(json!({ "title": "  buy milk  " })),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(first["id"], 1);
        assert_eq!(first["title"], "buy milk");
        assert_eq!(first["completed"], false);

        let (_, second) = send(
            &router,
            Method::POST,
            "/api/todos",
            Some(json!({ "title": "walk dog", "completed": true })),
        )
        .await;
        assert_eq!(second["id"], 2);

        let (status, list) = send(&router, Method::GET, "/api/todos", None).await;
        assert_eq!(status, StatusCode::OK);
        let ids: Vec<i64> = list
            .as_array()
            .unwrap()
            .iter()
            .map(|todo| todo["id"].as_i64().unwrap())
            .collect();
        assert_eq!(ids, vec![2, 1]);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn blank_title_is_rejected() {
        let router = app_router(AppState::default());
        let (status, body) = send(
            &router,
            Method::POST,
            "/api/todos",
            Some(json!({ "title": "   " })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["error"].as_str().unwrap().contains("blank"));
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn update_applies_present_fields_only() {
        let router = app_router(AppState::default());
        send(
            &router,
            Method::POST,
            "/api/todos",
            Some(json!({ "title": "a" })),
        )
        .await;

        let (status, updated) = send(
            &router,
            Method::PUT,
            "/api/todos/1",
            Some(json!({ "completed": true })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(updated["title"], "a");
        assert_eq!(updated["completed"], true);
        assert!(!updated["updatedAt"].is_null());
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn unknown_ids_return_not_found() {
        let router = app_router(AppState::default());
        let (status, _) = send(
            &router,
            Method::PUT,
            "/api/todos/42",
            Some(json!({ "title": "x" })),
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        let (status, body) = send(&router, Method::DELETE, "/api/todos/42", None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert!(body["error"].as_str().unwrap().contains("42"));
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn delete_leaves_a_tombstone() {
        let router = app_router(AppState::default());
        send(
            &router,
            Method::POST,
            "/api/todos",
            Some(json!({ "title": "a" })),
        )
        .await;

        let (status, _) = send(&router, Method::DELETE, "/api/todos/1", None).await;
        assert_eq!(status, StatusCode::NO_CONTENT);

        let (_, list) = send(&router, Method::GET, "/api/todos", None).await;
        assert_eq!(list[0]["id"], 1);
        assert_eq!(list[0]["deleted"], true);
    }
}
