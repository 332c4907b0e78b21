//! Transaction transformation pipeline.
//!
//! Turns a native block - miniblocks of normal transfers, unsigned contract
//! results, rewards, invalid transactions, receipts and chain-scheduling
//! artifacts - into a deterministic, gap-free sequence of balance-changing
//! operations in canonical (Rosetta) form.
//!
//! # Flow
//!
//! ```text
//! block nonce
//!   └─► window   fetch (N−1, N, N+1)            [window]
//!       └─► reconcile scheduled miniblocks      [scheduled]
//!           └─► flatten txs + receipts
//!               └─► pre-transform filters       [filters]
//!                   └─► per tx: classify        [classify]
//!                              extract events   [events]
//!                              emit operations  [synthesize]
//!                       └─► observed-address filtering,
//!                           status + indices    [block]
//! ```
//!
//! The pipeline is stateless: blocks are fetched, transformed in memory,
//! returned, and discarded. The only shared resource is the
//! [`tessera_core::ports::NetworkProvider`].

pub mod block;
pub mod classify;
pub mod constants;
pub mod events;
pub mod filters;
pub mod mempool;
pub mod scheduled;
pub mod synthesize;
pub mod window;

pub use block::BlockTransformer;
pub use mempool::MempoolTransformer;
