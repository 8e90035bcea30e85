//! HTTP client for the four relay operations.

use crate::config::{ClientConfig, ConfigError};
use crate::request::RequestBuilder;
use reqwest::{Method, StatusCode};
use stage_core::{CryptoError, PrivateKey, SharedKey};
use stage_types::{EntryId, Operation, Target, WireError};
use thiserror::Error;

/// Errors returned by [`StageClient`].
#[derive(Debug, Error)]
pub enum ClientError {
    /// HTTP request failed.
    #[error("http error: {0}")]
    Http(String),

    /// Could not reach the relay.
    #[error("connection failed: {0}")]
    ConnectionFailed(String),

    /// The relay answered with an unexpected status.
    #[error("relay returned {status} for {op}")]
    Status {
        /// Operation that was attempted.
        op: Operation,
        /// HTTP status code.
        status: u16,
    },

    /// Crypto error.
    #[error("crypto error: {0}")]
    Crypto(#[from] CryptoError),

    /// Payload encoding error.
    #[error("wire error: {0}")]
    Wire(#[from] WireError),

    /// Reply opened but did not have the expected shape.
    #[error("invalid response: {0}")]
    InvalidResponse(String),

    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),
}

impl From<reqwest::Error> for ClientError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_connect() {
            ClientError::ConnectionFailed(e.to_string())
        } else {
            ClientError::Http(e.to_string())
        }
    }
}

fn method(op: Operation) -> Method {
    match op {
        Operation::Copy => Method::POST,
        Operation::Move => Method::DELETE,
        Operation::Paste | Operation::List => Method::GET,
    }
}

/// Client for a stagebox relay.
#[derive(Debug, Clone)]
pub struct StageClient {
    endpoint: String,
    requests: RequestBuilder,
    http: reqwest::Client,
}

impl StageClient {
    /// Create a client for the relay at `endpoint`.
    pub fn new(endpoint: &str, shared_key: SharedKey, private_key: PrivateKey) -> Self {
        Self {
            endpoint: endpoint.trim_end_matches('/').to_string(),
            requests: RequestBuilder::new(shared_key, private_key),
            http: reqwest::Client::new(),
        }
    }

    /// Create a client from a validated configuration.
    pub fn from_config(config: &ClientConfig) -> Result<Self, ClientError> {
        config.validate()?;
        Ok(Self::new(
            &config.endpoint,
            config.shared_key.clone(),
            config.sign_private_key.clone(),
        ))
    }

    /// Get the relay base URL.
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Build the URL for an operation.
    pub fn url(&self, op: Operation) -> String {
        format!("{}/v1/{}", self.endpoint, op.as_str())
    }

    /// Send a sealed body. Returns `None` for a verified not-found reply.
    async fn send(&self, op: Operation, body: Vec<u8>) -> Result<Option<Vec<u8>>, ClientError> {
        let response = self
            .http
            .request(method(op), self.url(op))
            .body(body)
            .send()
            .await?;

        let status = response.status();
        let bytes = response.bytes().await?;
        tracing::debug!(%op, status = status.as_u16(), size = bytes.len(), "relay replied");

        if status == StatusCode::NOT_FOUND && !bytes.is_empty() {
            self.requests.open_not_found(&bytes)?;
            return Ok(None);
        }

        if !status.is_success() {
            return Err(ClientError::Status {
                op,
                status: status.as_u16(),
            });
        }

        Ok(Some(bytes.to_vec()))
    }

    async fn send_expecting_body(&self, op: Operation, body: Vec<u8>) -> Result<Vec<u8>, ClientError> {
        self.send(op, body).await?.ok_or(ClientError::Status {
            op,
            status: StatusCode::NOT_FOUND.as_u16(),
        })
    }

    /// Stage `content` and return its id.
    pub async fn copy(&self, content: &[u8]) -> Result<EntryId, ClientError> {
        let body = self.requests.copy(content)?;
        let reply = self.send_expecting_body(Operation::Copy, body).await?;
        self.requests.open_id(&reply)
    }

    /// Take an entry out of the relay.
    ///
    /// Returns `None` if the target does not exist.
    pub async fn move_entry(&self, target: Target) -> Result<Option<Vec<u8>>, ClientError> {
        let body = self.requests.move_entry(target)?;
        match self.send(Operation::Move, body).await? {
            Some(reply) => Ok(Some(self.requests.open(&reply)?)),
            None => Ok(None),
        }
    }

    /// Read an entry, leaving it staged.
    ///
    /// Returns `None` if the target does not exist.
    pub async fn paste(&self, target: Target) -> Result<Option<Vec<u8>>, ClientError> {
        let body = self.requests.paste(target)?;
        match self.send(Operation::Paste, body).await? {
            Some(reply) => Ok(Some(self.requests.open(&reply)?)),
            None => Ok(None),
        }
    }

    /// Ids of every staged entry, oldest first.
    pub async fn list(&self) -> Result<Vec<EntryId>, ClientError> {
        let body = self.requests.list()?;
        let reply = self.send_expecting_body(Operation::List, body).await?;
        self.requests.open_list(&reply)
    }
}
