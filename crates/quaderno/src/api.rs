//! Thin HTTP client for the dashboard backend.
//!
//! Every call goes through [`ApiClient::send`], which adds the base URL and
//! JSON headers and turns non-2xx responses into [`ApiError::Http`].

use reqwest::header::{ACCEPT, CONTENT_TYPE};
use reqwest::{Method, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{json, Value};
use thiserror::Error;
use tracing::debug;

use crate::chat::ChatReply;
use crate::types::{Document, Resource, Source, SourceType};

#[derive(Debug, Error)]
pub enum ApiError {
    /// The request never produced a response
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),

    /// The server answered with a non-2xx status
    #[error("server returned {status}: {message}")]
    Http { status: u16, message: String },

    #[error("failed to decode response: {0}")]
    Decode(#[from] serde_json::Error),
}

#[derive(Debug, Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    base_url: String,
}

impl ApiClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn builder(&self, method: Method, path: &str) -> RequestBuilder {
        self.http
            .request(method, format!("{}{}", self.base_url, path))
            .header(ACCEPT, "application/json")
    }

    /// Send a request, surfacing non-2xx responses as errors
    async fn send(&self, builder: RequestBuilder) -> Result<Response, ApiError> {
        let response = builder.send().await?;
        let status = response.status();
        debug!(url = %response.url(), status = status.as_u16(), "Response received");

        if status.is_success() {
            Ok(response)
        } else {
            Err(error_from_response(response).await)
        }
    }

    /// Send a JSON request and decode the JSON response
    pub async fn request<T, B>(&self, method: Method, path: &str, body: Option<&B>) -> Result<T, ApiError>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        let mut builder = self.builder(method, path);
        if let Some(body) = body {
            builder = builder.json(body);
        }
        decode(self.send(builder).await?).await
    }

    pub async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T, ApiError> {
        self.request::<T, ()>(Method::GET, path, None).await
    }

    pub async fn documents(&self) -> Result<Vec<Document>, ApiError> {
        self.get("/api/documents").await
    }

    pub async fn sources(&self, notebook_id: &str) -> Result<Vec<Source>, ApiError> {
        self.get(&format!("/api/notebooks/{notebook_id}/sources")).await
    }

    /// Replace the notebook's whole source list
    pub async fn replace_sources(&self, notebook_id: &str, sources: &[Source]) -> Result<(), ApiError> {
        let _: Value = self
            .request(
                Method::PUT,
                &format!("/api/notebooks/{notebook_id}/sources"),
                Some(sources),
            )
            .await?;
        Ok(())
    }

    pub async fn discover(
        &self,
        query: &str,
        resource_type: Option<SourceType>,
        limit: Option<usize>,
    ) -> Result<Vec<Resource>, ApiError> {
        let mut params: Vec<(&str, String)> = vec![("query", query.to_string())];
        if let Some(t) = resource_type {
            params.push(("type", t.to_string()));
        }
        if let Some(limit) = limit {
            params.push(("limit", limit.to_string()));
        }

        let builder = self.builder(Method::GET, "/api/discover").query(&params);
        decode(self.send(builder).await?).await
    }

    /// Ask the assistant, reading the reply according to its content type
    pub async fn chat(&self, message: &str, sources: &[String]) -> Result<ChatReply, ApiError> {
        let builder = self
            .builder(Method::POST, "/api/chat")
            .json(&json!({ "message": message, "sources": sources }));
        let response = self.send(builder).await?;

        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default()
            .to_string();
        let bytes = response.bytes().await?;
        debug!(content_type = %content_type, bytes = bytes.len(), "Chat reply");

        Ok(ChatReply::from_body(&content_type, bytes.to_vec())?)
    }
}

async fn decode<T: DeserializeOwned>(response: Response) -> Result<T, ApiError> {
    let bytes = response.bytes().await?;
    Ok(serde_json::from_slice(&bytes)?)
}

/// Build an [`ApiError::Http`] from a failed response.
///
/// Uses the `error` or `message` field of a JSON body when there is one,
/// the status text otherwise.
async fn error_from_response(response: Response) -> ApiError {
    let status = response.status();
    let body = response.bytes().await.unwrap_or_default();

    let message = serde_json::from_slice::<Value>(&body)
        .ok()
        .and_then(|v| {
            ["error", "message"]
                .iter()
                .find_map(|key| v.get(key).and_then(Value::as_str).map(str::to_string))
        })
        .unwrap_or_else(|| status.canonical_reason().unwrap_or("unknown error").to_string());

    ApiError::Http {
        status: status.as_u16(),
        message,
    }
}
