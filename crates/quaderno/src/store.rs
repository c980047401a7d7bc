use async_trait::async_trait;

use crate::api::{ApiClient, ApiError};
use crate::types::Source;

/// A list held by the backend and written back as a whole
#[async_trait]
pub trait RemoteList<T: Send + Sync>: Send + Sync {
    /// Read the authoritative list
    async fn fetch(&self) -> Result<Vec<T>, ApiError>;

    /// Replace the remote list with `items`
    async fn replace(&self, items: &[T]) -> Result<(), ApiError>;
}

/// The source list of one notebook
#[derive(Debug, Clone)]
pub struct NotebookSources {
    client: ApiClient,
    notebook_id: String,
}

impl NotebookSources {
    pub fn new(client: ApiClient, notebook_id: impl Into<String>) -> Self {
        Self {
            client,
            notebook_id: notebook_id.into(),
        }
    }

    pub fn notebook_id(&self) -> &str {
        &self.notebook_id
    }
}

#[async_trait]
impl RemoteList<Source> for NotebookSources {
    async fn fetch(&self) -> Result<Vec<Source>, ApiError> {
        self.client.sources(&self.notebook_id).await
    }

    async fn replace(&self, items: &[Source]) -> Result<(), ApiError> {
        self.client.replace_sources(&self.notebook_id, items).await
    }
}
