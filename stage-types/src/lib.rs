//! # stage-types
//!
//! Wire format types for the stagebox staging relay.
//!
//! This crate provides the foundational types shared by the relay and its clients:
//! - [`EntryId`] - Time-sortable identifier of a staged entry
//! - [`Target`] - Which entry a move/paste applies to
//! - [`Signature`] - Fixed-size Ed25519 signature bytes
//! - [`CopyRequest`], [`MoveRequest`], [`PasteRequest`], [`ListRequest`] - Request payloads
//! - [`WireError`] - Error types

#![warn(missing_docs)]
#![warn(clippy::all)]

mod error;
mod ids;
mod messages;

pub use error::WireError;
pub use ids::{EntryId, ENTRY_ID_SIZE, TIMESTAMP_MAX};
pub use messages::{
    CopyRequest, ListRequest, ListResponse, MoveRequest, Operation, PasteRequest, Signature,
    Target, WireMessage, LIST_SIGNED_BYTES, NOT_FOUND_MARKER, SIGNATURE_SIZE,
};
