//! Observer-node adapter.
//!
//! Implements the [`tessera_core::ports::NetworkProvider`] port over the
//! observer's REST API: block reads, account reads, mempool lookups and
//! transaction submission. Wire DTOs live in [`resources`]; the client in
//! [`client`].

pub mod client;
pub mod resources;

pub use client::{ObserverClient, ObserverClientConfig};
