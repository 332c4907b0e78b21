//! Error types for the middleware domain layer.
//!
//! This module defines a hierarchy of error types:
//!
//! - [`ChainError`] - Observer node / provider errors
//! - [`TransformError`] - Block and transaction transformation errors
//!
//! Error conversion is automatic via `From` implementations,
//! allowing `?` to work across error boundaries. The pipeline performs no
//! recovery: every request either yields a complete canonical block or a
//! single error surfaced to the caller.

use thiserror::Error;

use crate::addresses::AddressError;

// =============================================================================
// Chain Errors
// =============================================================================

/// Errors raised at the observer-node boundary.
///
/// Any `NetworkProvider` failure during a request surfaces as one of these;
/// the transformation layer never retries on its own.
#[derive(Debug, Error)]
pub enum ChainError {
    /// The observer could not be reached or answered with a non-API failure.
    #[error("Observer unreachable: {0}")]
    Unreachable(String),

    /// The requested block does not exist on the observer.
    #[error("Block not found: {0}")]
    BlockNotFound(String),

    /// The deployment runs offline; write operations are rejected.
    #[error("Node is offline")]
    Offline,

    /// The caller supplied an unparsable hash, nonce or transaction.
    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

// =============================================================================
// Transform Errors
// =============================================================================

/// Errors raised while turning a native block into its canonical form.
///
/// These are fail-fast by design: silently skipping a transaction or an event
/// would break the balance-completeness guarantee of the emitted operations.
#[derive(Debug, Error)]
pub enum TransformError {
    /// Provider failure while fetching the block window or observer checks.
    #[error("Chain error: {0}")]
    Chain(#[from] ChainError),

    /// A transaction carries a `type` string outside the known set.
    #[error("Unknown transaction type: {0}")]
    UnknownTransactionType(String),

    /// A typed log event has fewer topics than its schema requires.
    #[error("Cannot parse event {event_index} of transaction {tx_hash}: {reason}")]
    EventParse {
        /// Hash of the transaction holding the offending event.
        tx_hash: String,
        /// Zero-based index of the event within the transaction's log.
        event_index: usize,
        /// What was expected and what was found.
        reason: String,
    },

    /// An address could not be decoded to a public key.
    #[error("Address error: {0}")]
    Address(#[from] AddressError),
}

// =============================================================================
// Result Type Aliases
// =============================================================================

/// Result type for provider operations.
pub type ChainResult<T> = Result<T, ChainError>;

/// Result type for transformation operations.
pub type TransformResult<T> = Result<T, TransformError>;
