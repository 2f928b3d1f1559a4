//! REST client for the remote todo API.

use std::time::Duration;

use reqwest::{Method, RequestBuilder, Response};

use super::RemoteStore;
use crate::models::{NewTodo, Todo, TodoId, TodoPatch};
use crate::util::{compact_text, is_http_url, normalize_text_option};
use crate::{Error, Result};

/// HTTP implementation of [`RemoteStore`] against `{base_url}/api/todos`.
#[derive(Debug, Clone)]
pub struct HttpRemoteStore {
    base_url: String,
    client: reqwest::Client,
}

impl HttpRemoteStore {
    /// Builds a client for an explicit API base URL with a per-request timeout.
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self> {
        let base_url = normalize_base_url(&base_url.into())?;
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|error| {
                Error::InvalidInput(format!("Failed to construct HTTP client: {error}"))
            })?;
        Ok(Self { base_url, client })
    }

    /// Returns the base URL this client was configured with.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        self.client
            .request(method, format!("{}{path}", self.base_url))
            .header("Accept", "application/json")
    }

    async fn send(&self, request: RequestBuilder, action: &str) -> Result<Response> {
        let response = request
            .send()
            .await
            .map_err(|error| Error::RemoteUnavailable(format!("{action} request failed: {error}")))?;
        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(Error::RemoteUnavailable(format!(
                "{action} failed with HTTP {status}: {}",
                compact_text(&body)
            )));
        }
        Ok(response)
    }

    async fn read_todo(response: Response, action: &str) -> Result<Todo> {
        response.json::<Todo>().await.map_err(|error| {
            Error::RemoteUnavailable(format!("Failed to parse {action} response: {error}"))
        })
    }
}

impl RemoteStore for HttpRemoteStore {
    async fn list(&self) -> Result<Vec<Todo>> {
        let response = self
            .send(self.request(Method::GET, "/api/todos"), "List")
            .await?;
        response.json::<Vec<Todo>>().await.map_err(|error| {
            Error::RemoteUnavailable(format!("Failed to parse list response: {error}"))
        })
    }

    async fn create(&self, todo: &Todo) -> Result<Todo> {
        let body = NewTodo::from(todo);
        let response = self
            .send(
                self.request(Method::POST, "/api/todos").json(&body),
                "Create",
            )
            .await?;
        Self::read_todo(response, "create").await
    }

    async fn update(&self, patch: &TodoPatch) -> Result<Todo> {
        let path = format!("/api/todos/{}", patch.id);
        let response = self
            .send(self.request(Method::PUT, &path).json(patch), "Update")
            .await?;
        Self::read_todo(response, "update").await
    }

    async fn delete(&self, id: TodoId) -> Result<()> {
        let path = format!("/api/todos/{id}");
        self.send(self.request(Method::DELETE, &path), "Delete")
            .await?;
        Ok(())
    }

    async fn probe(&self) -> Result<()> {
        self.send(self.request(Method::GET, "/healthz"), "Health check")
            .await?;
        Ok(())
    }
}

/// Validate and trim an API base URL: http(s) only, no trailing slash.
pub fn normalize_base_url(raw: &str) -> Result<String> {
    let value = normalize_text_option(Some(raw.to_string()))
        .ok_or_else(|| Error::InvalidInput("API base URL must not be empty".to_string()))?;
    if !is_http_url(&value) {
        return Err(Error::InvalidInput(
            "API base URL must include http:// or https://".to_string(),
        ));
    }
    Ok(value.trim_end_matches('/').to_string())
}
