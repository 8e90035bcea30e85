//! # stage-client
//!
//! Client library for the stagebox staging relay.
//!
//! ## Features
//!
//! - **Sealed requests**: every body is sealed with the shared key
//! - **Signed payloads**: every request is signed with the client's private key
//! - **Typed results**: ids come back as [`EntryId`], missing entries as `None`
//!
//! ## Example
//!
//! ```ignore
//! use stage_client::{ClientConfig, StageClient};
//! use stage_types::Target;
//!
//! let config = ClientConfig::from_file("~/.stagebox.toml".as_ref())?;
//! let client = StageClient::from_config(&config)?;
//!
//! let id = client.copy(b"hello").await?;
//! let content = client.paste(Target::Specific(id)).await?;
//! ```
//!
//! [`EntryId`]: stage_types::EntryId

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod client;
pub mod config;
pub mod request;

pub use client::{ClientError, StageClient};
pub use config::{ClientConfig, ConfigError};
pub use request::RequestBuilder;
