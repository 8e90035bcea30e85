//! # stage-relay
//!
//! Staging relay server for stagebox.
//!
//! This crate implements a relay server that:
//! - Accepts sealed, signed requests over HTTP
//! - Keeps staged entries in memory, ordered by creation time
//! - Rejects anything it cannot open and verify before touching the store
//! - Seals every response under the same shared key
//!
//! ## Architecture
//!
//! ```text
//! Device A ──┐                    ┌── Device B
//!            │   sealed HTTP      │
//!            ├───────────────────►│
//!            │                    │
//!        ┌───┴────────────────────┴───┐
//!        │        stage-relay         │
//!        │  open → verify → dispatch  │
//!        │  ┌─────────────────────┐   │
//!        │  │ MemoryStore (BTree) │   │
//!        │  └─────────────────────┘   │
//!        └────────────────────────────┘
//! ```
//!
//! ## Protocol
//!
//! - `POST /v1/copy` → stage content, reply with the new id
//! - `DELETE /v1/move` → take an entry out (oldest or by id)
//! - `GET /v1/paste` → read an entry, leaving it staged
//! - `GET /v1/list` → ids of every staged entry, oldest first

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod config;
pub mod dispatcher;
pub mod error;
pub mod http;
pub mod server;
pub mod storage;

pub use config::Config;
pub use dispatcher::{Dispatcher, Reply, Status, NOT_FOUND_MARKER};
pub use error::{DispatchError, RelayError, StorageError};
pub use server::StageRelay;
