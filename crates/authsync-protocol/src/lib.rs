//! Data model for authsync.
//!
//! This crate defines what the rest of the workspace talks about:
//!
//! - **Types** ([`Identity`], [`Session`], [`AuthStateChange`],
//!   [`AuthEventKind`]): the values an identity provider hands over.
//! - **Codec** ([`Codec`] trait, [`JsonCodec`]): how provider payloads
//!   are turned into those types.
//! - **Errors** ([`ProtocolError`]): what can go wrong while decoding.
//!
//! # Architecture
//!
//! ```text
//! Provider client (bytes/JSON) → Protocol (typed values) → Session layer (store)
//! ```
//!
//! Nothing here performs I/O or knows about scopes.

mod codec;
mod error;
mod types;

pub use codec::{Codec, JsonCodec};
pub use error::ProtocolError;
pub use types::{AuthEventKind, AuthStateChange, Identity, Metadata, Session, UserId};
