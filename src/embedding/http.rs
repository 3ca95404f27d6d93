//! Shared HTTP plumbing for hosted embedding backends.
//!
//! The providers are synchronous, so requests are driven to completion on the
//! tokio runtime that was current when the provider was built.

use std::time::Duration;

use reqwest::{Client, RequestBuilder};
use serde::de::DeserializeOwned;
use tokio::runtime::Handle;

use crate::error::{EmbeddingError, MemoryError};

pub(crate) struct HttpTransport {
    client: Client,
    runtime: Handle,
}

impl HttpTransport {
    /// Must be called from within a tokio runtime.
    pub(crate) fn new(timeout_secs: u64) -> Result<Self, MemoryError> {
        let runtime = Handle::try_current().map_err(|e| MemoryError::Runtime(e.to_string()))?;
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()
            .map_err(|e| MemoryError::Config(format!("failed to build HTTP client: {e}")))?;
        Ok(Self { client, runtime })
    }

    pub(crate) fn client(&self) -> &Client {
        &self.client
    }

    /// Send a request and decode a JSON body. Blocks the calling thread, so it
    /// must not run on an async worker thread.
    pub(crate) fn send<R: DeserializeOwned>(&self, request: RequestBuilder) -> Result<R, EmbeddingError> {
        self.runtime.block_on(async move {
            let response = request.send().await?;
            let status = response.status();
            if !status.is_success() {
                let body = response.text().await.unwrap_or_default();
                return Err(EmbeddingError::from_status(status.as_u16(), body));
            }
            response
                .json::<R>()
                .await
                .map_err(|e| EmbeddingError::InvalidResponse(e.to_string()))
        })
    }
}
