//! HTTP client for the persistence service.
//!
//! Thin typed wrapper over `reqwest`. Every call returns either the
//! server's authoritative entity representation or a [`ClientError`]
//! classified from the response status; callers never patch local state
//! from their own optimistic payloads.

use reqwest::{Method, RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::sync::RwLock;

use taskforge_shared::model::{List, Task, User};
use taskforge_shared::protocol::{
    ErrorBody, ListPatch, LoginRequest, LoginResponse, NewList, NewTask, ProfilePatch, TaskPatch,
};
use taskforge_shared::types::{ListId, TaskId};

use crate::error::{ClientError, Result};

pub struct ApiClient {
    http: reqwest::Client,
    base_url: String,
    token: RwLock<Option<String>>,
}

impl ApiClient {
    /// `base_url` without a trailing slash, e.g. `http://localhost:5000`.
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.into(),
            token: RwLock::new(None),
        }
    }

    pub fn set_token(&self, token: Option<String>) {
        *self.token.write().expect("token lock poisoned") = token;
    }

    pub fn has_token(&self) -> bool {
        self.token.read().expect("token lock poisoned").is_some()
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let mut builder = self
            .http
            .request(method, format!("{}{}", self.base_url, path));
        if let Some(token) = self.token.read().expect("token lock poisoned").as_deref() {
            builder = builder.bearer_auth(token);
        }
        builder
    }

    async fn send<T: DeserializeOwned>(&self, builder: RequestBuilder) -> Result<T> {
        let response = builder
            .send()
            .await
            .map_err(|e| ClientError::Transient(e.to_string()))?;

        let status = response.status();
        if status.is_success() {
            return response
                .json()
                .await
                .map_err(|e| ClientError::Transient(format!("malformed response: {e}")));
        }

        // Pull the server's error message when there is one.
        let message = response
            .json::<ErrorBody>()
            .await
            .map(|body| body.error)
            .unwrap_or_else(|_| status.to_string());

        Err(match status {
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => ClientError::Auth(message),
            StatusCode::BAD_REQUEST => ClientError::Validation(message),
            StatusCode::NOT_FOUND => ClientError::NotFound,
            _ => ClientError::Transient(message),
        })
    }

    async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        self.send(self.request(Method::GET, path)).await
    }

    async fn post<B: Serialize, T: DeserializeOwned>(&self, path: &str, body: &B) -> Result<T> {
        self.send(self.request(Method::POST, path).json(body)).await
    }

    async fn patch<B: Serialize, T: DeserializeOwned>(&self, path: &str, body: &B) -> Result<T> {
        self.send(self.request(Method::PATCH, path).json(body))
            .await
    }

    async fn delete(&self, path: &str) -> Result<serde_json::Value> {
        self.send(self.request(Method::DELETE, path)).await
    }

    // -- auth ---------------------------------------------------------

    pub async fn login(&self, provider: &str, credential: &str) -> Result<LoginResponse> {
        let body = LoginRequest {
            credential: credential.to_string(),
        };
        self.post(&format!("/api/auth/{provider}"), &body).await
    }

    pub async fn me(&self) -> Result<User> {
        self.get("/api/auth/me").await
    }

    pub async fn update_me(&self, patch: &ProfilePatch) -> Result<User> {
        self.patch("/api/auth/me", patch).await
    }

    // -- lists --------------------------------------------------------

    pub async fn lists(&self) -> Result<Vec<List>> {
        self.get("/api/lists").await
    }

    pub async fn create_list(&self, new: &NewList) -> Result<List> {
        self.post("/api/lists", new).await
    }

    pub async fn update_list(&self, id: ListId, patch: &ListPatch) -> Result<List> {
        self.patch(&format!("/api/lists/{id}"), patch).await
    }

    pub async fn delete_list(&self, id: ListId) -> Result<()> {
        self.delete(&format!("/api/lists/{id}")).await?;
        Ok(())
    }

    // -- tasks --------------------------------------------------------

    pub async fn tasks(&self) -> Result<Vec<Task>> {
        self.get("/api/tasks").await
    }

    pub async fn tasks_for_list(&self, list_id: ListId) -> Result<Vec<Task>> {
        self.get(&format!("/api/tasks/{list_id}")).await
    }

    pub async fn create_task(&self, new: &NewTask) -> Result<Task> {
        self.post("/api/tasks", new).await
    }

    pub async fn update_task(&self, id: TaskId, patch: &TaskPatch) -> Result<Task> {
        self.patch(&format!("/api/tasks/{id}"), patch).await
    }

    pub async fn delete_task(&self, id: TaskId) -> Result<()> {
        self.delete(&format!("/api/tasks/{id}")).await?;
        Ok(())
    }
}
