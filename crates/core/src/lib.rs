//! Core domain layer for the Tessera Rosetta middleware.
//!
//! This crate contains the domain models, port traits (interfaces), and the
//! pure chain arithmetic (shard computation, address codec) used by the
//! transformation pipeline. It follows hexagonal architecture principles -
//! this is the innermost layer with no dependencies on infrastructure.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                     tessera (binary)                        │
//! ├─────────────────────────────────────────────────────────────┤
//! │     tessera-api       │          tessera-observer           │
//! │   (Rosetta HTTP)      │        (observer REST client)       │
//! ├───────────────────────┴─────────────────────────────────────┤
//! │                    tessera-transform                        │
//! │          (block window, reconciler, synthesizer)            │
//! ├─────────────────────────────────────────────────────────────┤
//! │                     tessera-core  ← YOU ARE HERE            │
//! │            (models, ports, sharding, addresses)             │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Modules
//!
//! - [`models`] - Native chain entities (blocks, miniblocks, transactions)
//! - [`canonical`] - Rosetta-shaped output entities (blocks, operations)
//! - [`ports`] - Interface traits for adapters to implement
//! - [`addresses`] - Bech32 address codec and contract-address predicates
//! - [`sharding`] - Shard coordinator arithmetic and the observed-shard filter
//! - [`config`] - Network configuration read once at startup
//! - [`error`] - Domain error types
//! - [`metrics`] - Prometheus metrics definitions
//! - [`testkit`] - Map-backed `NetworkProvider` mock shared by unit tests

pub mod addresses;
pub mod canonical;
pub mod config;
pub mod error;
pub mod metrics;
pub mod models;
pub mod ports;
pub mod sharding;
pub mod testkit;
