//! Native chain entities, as read from an observer node.
//!
//! These models mirror the observer API's block shape after wire decoding
//! (the adapter crate owns the wire DTOs). A block is a set of miniblocks;
//! a miniblock groups transactions sharing (sender shard, receiver shard,
//! type); scheduling artifacts (`processing_type`, `construction_state`) are
//! what the reconciler consumes to make a block self-contained.

// =============================================================================
// Blocks & miniblocks
// =============================================================================

/// A block as returned by the observer, before reconciliation.
///
/// The middleware rewrites a local copy only; the native block is immutable
/// once finalized by the chain.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Block {
    /// Block height.
    pub nonce: u64,
    /// Block hash, hex-encoded.
    pub hash: String,
    /// Hash of the previous block, hex-encoded.
    pub previous_block_hash: String,
    /// Block timestamp, in seconds.
    pub timestamp: u64,
    /// Miniblocks, in consensus order.
    pub miniblocks: Vec<MiniBlock>,
}

impl Block {
    /// Whether every miniblock has the `Normal` processing type.
    ///
    /// When this holds, the block carries no scheduling artifacts and the
    /// reconciler is the identity.
    pub fn has_only_normal_miniblocks(&self) -> bool {
        self.miniblocks
            .iter()
            .all(|miniblock| miniblock.processing_type == MiniBlockProcessingType::Normal)
    }
}

/// Intra-block grouping of transactions.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MiniBlock {
    pub kind: MiniBlockType,
    pub processing_type: MiniBlockProcessingType,
    /// Absent for miniblocks the chain has not annotated.
    pub construction_state: Option<ConstructionState>,
    pub transactions: Vec<Transaction>,
    pub receipts: Vec<Receipt>,
}

impl MiniBlock {
    /// A scheduled miniblock whose construction is not `Final` produced no
    /// effects in its own block.
    pub fn is_scheduled_and_not_final(&self) -> bool {
        self.processing_type == MiniBlockProcessingType::Scheduled
            && self.construction_state != Some(ConstructionState::Final)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum MiniBlockType {
    #[default]
    TxBlock,
    InvalidBlock,
    ReceiptBlock,
    RewardsBlock,
    SmartContractResultBlock,
    PeerBlock,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum MiniBlockProcessingType {
    #[default]
    Normal,
    /// Execution deferred to the next block.
    Scheduled,
    /// Scheduled in the previous block, executed in this one.
    Processed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConstructionState {
    Proposed,
    Notarized,
    Final,
}

// =============================================================================
// Transactions
// =============================================================================

/// A transaction as the observer reports it, with hyperblock annotations.
///
/// `value` and `initially_paid_fee` are unbounded non-negative integers in
/// decimal-string form; arithmetic goes through `num_bigint` and serializes
/// back on emission.
#[derive(Debug, Clone, PartialEq)]
pub struct Transaction {
    pub hash: String,
    pub nonce: u64,
    pub sender: String,
    pub receiver: String,
    pub value: String,
    pub data: Vec<u8>,
    pub gas_price: u64,
    pub gas_limit: u64,
    pub kind: TransactionType,
    pub processing_type_on_source: Option<TransactionProcessingType>,
    pub processing_type_on_destination: Option<TransactionProcessingType>,
    pub source_shard: u32,
    pub destination_shard: u32,
    pub initially_paid_fee: String,
    /// Set on unsigned results that return unspent gas to the caller.
    pub is_refund: bool,
    pub previous_transaction_hash: String,
    pub original_transaction_hash: String,
    /// Present on relayed transactions; the relayer pays the fee.
    pub relayer_address: Option<String>,
    /// Present on guarded transactions; affects the move-balance fee.
    pub guardian_address: Option<String>,
    pub logs: Option<TransactionLogs>,
}

impl Default for Transaction {
    fn default() -> Self {
        Self {
            hash: String::new(),
            nonce: 0,
            sender: String::new(),
            receiver: String::new(),
            value: "0".to_string(),
            data: Vec::new(),
            gas_price: 0,
            gas_limit: 0,
            kind: TransactionType::Normal,
            processing_type_on_source: None,
            processing_type_on_destination: None,
            source_shard: 0,
            destination_shard: 0,
            initially_paid_fee: "0".to_string(),
            is_refund: false,
            previous_transaction_hash: String::new(),
            original_transaction_hash: String::new(),
            relayer_address: None,
            guardian_address: None,
            logs: None,
        }
    }
}

impl Transaction {
    /// Source and destination shard coincide.
    pub fn is_intrashard(&self) -> bool {
        self.source_shard == self.destination_shard
    }

    /// Either annotation marks the transaction as relayed (v1 or v2).
    pub fn is_relayed(&self) -> bool {
        let relayed = |processing: &Option<TransactionProcessingType>| {
            matches!(
                processing,
                Some(TransactionProcessingType::RelayedTx)
                    | Some(TransactionProcessingType::RelayedTxV2)
            )
        };

        relayed(&self.processing_type_on_source) || relayed(&self.processing_type_on_destination)
    }

    /// All log events of the transaction, in emission order.
    pub fn events(&self) -> &[Event] {
        self.logs
            .as_ref()
            .map(|logs| logs.events.as_slice())
            .unwrap_or_default()
    }
}

/// Transaction type, as tagged by the observer.
///
/// Unknown strings are preserved so classification can fail fast with the
/// offending value instead of silently miscounting balances.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum TransactionType {
    #[default]
    Normal,
    Reward,
    Unsigned,
    Invalid,
    Unknown(String),
}

impl From<&str> for TransactionType {
    fn from(value: &str) -> Self {
        match value {
            "normal" => Self::Normal,
            "reward" => Self::Reward,
            "unsigned" => Self::Unsigned,
            "invalid" => Self::Invalid,
            other => Self::Unknown(other.to_string()),
        }
    }
}

/// Processing type annotation assigned by the protocol on each shard.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransactionProcessingType {
    MoveBalance,
    RelayedTx,
    RelayedTxV2,
    BuiltInFunctionCall,
    SCInvoking,
    SCDeployment,
    Unknown(String),
}

impl From<&str> for TransactionProcessingType {
    fn from(value: &str) -> Self {
        match value {
            "MoveBalance" => Self::MoveBalance,
            "RelayedTx" => Self::RelayedTx,
            "RelayedTxV2" => Self::RelayedTxV2,
            "BuiltInFunctionCall" => Self::BuiltInFunctionCall,
            "SCInvoking" => Self::SCInvoking,
            "SCDeployment" => Self::SCDeployment,
            other => Self::Unknown(other.to_string()),
        }
    }
}

// =============================================================================
// Receipts & logs
// =============================================================================

/// A receipt attached to a miniblock. Only the gas-refund receipt
/// (`data == "refundedGas"`) is material to balance tracking.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Receipt {
    pub hash: String,
    pub sender_address: String,
    pub value: String,
    pub data: String,
}

/// Log unit attached to a transaction.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TransactionLogs {
    /// Account the log is recorded under.
    pub address: String,
    pub events: Vec<Event>,
}

/// A typed log event.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Event {
    /// Event identifier, e.g. `ESDTTransfer` or `signalError`.
    pub identifier: String,
    /// Account the event is attributed to.
    pub address: String,
    /// Raw topics; numeric topics are big-endian unsigned integers.
    pub topics: Vec<Vec<u8>>,
    pub data: Vec<u8>,
    pub additional_data: Vec<Vec<u8>>,
}

// =============================================================================
// Accounts & node status
// =============================================================================

/// Account state snapshot.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Account {
    pub address: String,
    pub nonce: u64,
    pub balance: String,
}

/// Coordinates of the block at which an account was read.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BlockCoordinates {
    pub nonce: u64,
    pub hash: String,
    pub root_hash: String,
}

/// Account state plus the block it was read at.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AccountOnBlock {
    pub account: Account,
    pub block_coordinates: BlockCoordinates,
}

/// Custom-token balance of an account, plus the block it was read at.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AccountTokenBalance {
    pub balance: String,
    pub block_coordinates: BlockCoordinates,
}

/// Condensed description of a block, used in status reporting.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BlockSummary {
    pub nonce: u64,
    pub hash: String,
    pub previous_block_hash: String,
    pub timestamp: u64,
}

/// Aggregated observer status.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NodeStatus {
    pub synced: bool,
    pub latest_block: BlockSummary,
    pub oldest_block_with_historical_state: BlockSummary,
}

// =============================================================================
// Submission
// =============================================================================

/// A signed transaction as accepted by the observer's submission endpoint.
#[derive(Debug, Clone, Default, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct SubmittableTransaction {
    pub nonce: u64,
    pub value: String,
    pub receiver: String,
    pub sender: String,
    #[serde(rename = "gasPrice")]
    pub gas_price: u64,
    #[serde(rename = "gasLimit")]
    pub gas_limit: u64,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub data: String,
    pub signature: String,
    #[serde(rename = "chainID")]
    pub chain_id: String,
    pub version: u32,
}
