//! Wire DTOs for the observer REST API.
//!
//! The observer wraps every payload in `{data, error, code}` and encodes
//! binary fields (transaction data, event topics) as base64. DTOs convert
//! into the core models at the adapter boundary; nothing downstream sees the
//! wire shapes.

use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use serde::Deserialize;

use tessera_core::error::{ChainError, ChainResult};
use tessera_core::models::{
    Account, AccountOnBlock, AccountTokenBalance, Block, BlockCoordinates, BlockSummary,
    ConstructionState, Event, MiniBlock, MiniBlockProcessingType, MiniBlockType, NodeStatus,
    Receipt, Transaction, TransactionLogs, TransactionProcessingType, TransactionType,
};

// =============================================================================
// Response envelope
// =============================================================================

/// The observer's uniform response envelope.
#[derive(Debug, Deserialize)]
#[serde(bound(deserialize = "T: serde::de::DeserializeOwned"))]
pub struct ApiResponse<T> {
    #[serde(default)]
    pub data: Option<T>,
    #[serde(default)]
    pub error: String,
    #[serde(default)]
    pub code: String,
}

impl<T> ApiResponse<T> {
    /// Unwrap the payload, surfacing the observer's error message otherwise.
    pub fn into_data(self) -> ChainResult<T> {
        match self.data {
            Some(data) => Ok(data),
            None => Err(ChainError::Unreachable(if self.error.is_empty() {
                "empty response".to_string()
            } else {
                self.error
            })),
        }
    }
}

// =============================================================================
// Blocks
// =============================================================================

#[derive(Debug, Deserialize)]
pub struct BlockData {
    pub block: BlockDto,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BlockDto {
    pub nonce: u64,
    pub hash: String,
    #[serde(default)]
    pub prev_block_hash: String,
    #[serde(default)]
    pub timestamp: u64,
    #[serde(default)]
    pub mini_blocks: Vec<MiniBlockDto>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MiniBlockDto {
    #[serde(rename = "type", default)]
    pub kind: String,
    #[serde(default)]
    pub processing_type: String,
    #[serde(default)]
    pub construction_state: String,
    #[serde(default)]
    pub transactions: Vec<TransactionDto>,
    #[serde(default)]
    pub receipts: Vec<ReceiptDto>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionDto {
    pub hash: String,
    #[serde(default)]
    pub nonce: u64,
    #[serde(default)]
    pub sender: String,
    #[serde(default)]
    pub receiver: String,
    #[serde(default = "zero_string")]
    pub value: String,
    /// Base64 of the raw payload.
    #[serde(default)]
    pub data: String,
    #[serde(default)]
    pub gas_price: u64,
    #[serde(default)]
    pub gas_limit: u64,
    #[serde(rename = "type", default)]
    pub kind: String,
    #[serde(default)]
    pub processing_type_on_source: String,
    #[serde(default)]
    pub processing_type_on_destination: String,
    #[serde(default)]
    pub source_shard: u32,
    #[serde(default)]
    pub destination_shard: u32,
    #[serde(default = "zero_string")]
    pub initially_paid_fee: String,
    #[serde(default)]
    pub is_refund: bool,
    #[serde(default)]
    pub previous_transaction_hash: String,
    #[serde(default)]
    pub original_transaction_hash: String,
    #[serde(default)]
    pub relayer_address: Option<String>,
    #[serde(default)]
    pub guardian_address: Option<String>,
    #[serde(default)]
    pub logs: Option<LogsDto>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReceiptDto {
    #[serde(default)]
    pub hash: String,
    #[serde(default)]
    pub sender: String,
    #[serde(default = "zero_string")]
    pub value: String,
    #[serde(default)]
    pub data: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LogsDto {
    #[serde(default)]
    pub address: String,
    #[serde(default)]
    pub events: Vec<EventDto>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventDto {
    #[serde(default)]
    pub identifier: String,
    #[serde(default)]
    pub address: String,
    /// Base64-encoded topics.
    #[serde(default)]
    pub topics: Vec<String>,
    /// Base64-encoded data.
    #[serde(default)]
    pub data: String,
    #[serde(default)]
    pub additional_data: Vec<String>,
}

fn zero_string() -> String {
    "0".to_string()
}

// =============================================================================
// Accounts, mempool, status
// =============================================================================

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccountData {
    pub account: AccountDto,
    #[serde(default)]
    pub block_info: Option<BlockInfoDto>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccountDto {
    pub address: String,
    #[serde(default)]
    pub nonce: u64,
    #[serde(default = "zero_string")]
    pub balance: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenBalanceData {
    #[serde(default)]
    pub token_data: TokenBalanceDto,
    #[serde(default)]
    pub block_info: Option<BlockInfoDto>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenBalanceDto {
    #[serde(default = "zero_string")]
    pub balance: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BlockInfoDto {
    #[serde(default)]
    pub nonce: u64,
    #[serde(default)]
    pub hash: String,
    #[serde(default)]
    pub root_hash: String,
}

#[derive(Debug, Deserialize)]
pub struct MempoolTransactionData {
    pub transaction: Option<TransactionDto>,
}

#[derive(Debug, Deserialize)]
pub struct NodeStatusData {
    pub status: NodeStatusDto,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeStatusDto {
    #[serde(default)]
    pub synced: bool,
    #[serde(default)]
    pub latest_block: BlockSummaryDto,
    #[serde(default)]
    pub oldest_block_with_historical_state: BlockSummaryDto,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BlockSummaryDto {
    #[serde(default)]
    pub nonce: u64,
    #[serde(default)]
    pub hash: String,
    #[serde(default)]
    pub prev_block_hash: String,
    #[serde(default)]
    pub timestamp: u64,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SendTransactionData {
    pub tx_hash: String,
}

// =============================================================================
// Conversions
// =============================================================================

impl BlockDto {
    pub fn into_model(self) -> ChainResult<Block> {
        let miniblocks = self
            .mini_blocks
            .into_iter()
            .map(MiniBlockDto::into_model)
            .collect::<ChainResult<Vec<_>>>()?;

        Ok(Block {
            nonce: self.nonce,
            hash: self.hash,
            previous_block_hash: self.prev_block_hash,
            timestamp: self.timestamp,
            miniblocks,
        })
    }
}

impl MiniBlockDto {
    pub fn into_model(self) -> ChainResult<MiniBlock> {
        let transactions = self
            .transactions
            .into_iter()
            .map(TransactionDto::into_model)
            .collect::<ChainResult<Vec<_>>>()?;

        Ok(MiniBlock {
            kind: parse_miniblock_type(&self.kind),
            processing_type: parse_processing_type(&self.processing_type),
            construction_state: parse_construction_state(&self.construction_state),
            transactions,
            receipts: self.receipts.into_iter().map(ReceiptDto::into_model).collect(),
        })
    }
}

impl TransactionDto {
    pub fn into_model(self) -> ChainResult<Transaction> {
        Ok(Transaction {
            data: decode_base64_field(&self.data, "transaction data")?,
            hash: self.hash,
            nonce: self.nonce,
            sender: self.sender,
            receiver: self.receiver,
            value: self.value,
            gas_price: self.gas_price,
            gas_limit: self.gas_limit,
            kind: TransactionType::from(self.kind.as_str()),
            processing_type_on_source: parse_tx_processing_type(&self.processing_type_on_source),
            processing_type_on_destination: parse_tx_processing_type(
                &self.processing_type_on_destination,
            ),
            source_shard: self.source_shard,
            destination_shard: self.destination_shard,
            initially_paid_fee: self.initially_paid_fee,
            is_refund: self.is_refund,
            previous_transaction_hash: self.previous_transaction_hash,
            original_transaction_hash: self.original_transaction_hash,
            relayer_address: self.relayer_address.filter(|address| !address.is_empty()),
            guardian_address: self.guardian_address.filter(|address| !address.is_empty()),
            logs: self.logs.map(LogsDto::into_model).transpose()?,
        })
    }
}

impl ReceiptDto {
    pub fn into_model(self) -> Receipt {
        Receipt {
            hash: self.hash,
            sender_address: self.sender,
            value: self.value,
            data: self.data,
        }
    }
}

impl LogsDto {
    pub fn into_model(self) -> ChainResult<TransactionLogs> {
        let events = self
            .events
            .into_iter()
            .map(EventDto::into_model)
            .collect::<ChainResult<Vec<_>>>()?;

        Ok(TransactionLogs {
            address: self.address,
            events,
        })
    }
}

impl EventDto {
    pub fn into_model(self) -> ChainResult<Event> {
        Ok(Event {
            topics: self
                .topics
                .iter()
                .map(|topic| decode_base64_field(topic, "event topic"))
                .collect::<ChainResult<Vec<_>>>()?,
            data: decode_base64_field(&self.data, "event data")?,
            additional_data: self
                .additional_data
                .iter()
                .map(|data| decode_base64_field(data, "event additional data"))
                .collect::<ChainResult<Vec<_>>>()?,
            identifier: self.identifier,
            address: self.address,
        })
    }
}

impl AccountData {
    pub fn into_model(self) -> AccountOnBlock {
        AccountOnBlock {
            account: Account {
                address: self.account.address,
                nonce: self.account.nonce,
                balance: self.account.balance,
            },
            block_coordinates: self.block_info.map(BlockInfoDto::into_model).unwrap_or_default(),
        }
    }
}

impl TokenBalanceData {
    pub fn into_model(self) -> AccountTokenBalance {
        AccountTokenBalance {
            balance: self.token_data.balance,
            block_coordinates: self.block_info.map(BlockInfoDto::into_model).unwrap_or_default(),
        }
    }
}

impl BlockInfoDto {
    pub fn into_model(self) -> BlockCoordinates {
        BlockCoordinates {
            nonce: self.nonce,
            hash: self.hash,
            root_hash: self.root_hash,
        }
    }
}

impl NodeStatusDto {
    pub fn into_model(self) -> NodeStatus {
        NodeStatus {
            synced: self.synced,
            latest_block: self.latest_block.into_model(),
            oldest_block_with_historical_state: self
                .oldest_block_with_historical_state
                .into_model(),
        }
    }
}

impl BlockSummaryDto {
    pub fn into_model(self) -> BlockSummary {
        BlockSummary {
            nonce: self.nonce,
            hash: self.hash,
            previous_block_hash: self.prev_block_hash,
            timestamp: self.timestamp,
        }
    }
}

fn parse_miniblock_type(value: &str) -> MiniBlockType {
    match value {
        "InvalidBlock" => MiniBlockType::InvalidBlock,
        "ReceiptBlock" => MiniBlockType::ReceiptBlock,
        "RewardsBlock" => MiniBlockType::RewardsBlock,
        "SmartContractResultBlock" => MiniBlockType::SmartContractResultBlock,
        "PeerBlock" => MiniBlockType::PeerBlock,
        _ => MiniBlockType::TxBlock,
    }
}

fn parse_processing_type(value: &str) -> MiniBlockProcessingType {
    match value {
        "Scheduled" => MiniBlockProcessingType::Scheduled,
        "Processed" => MiniBlockProcessingType::Processed,
        _ => MiniBlockProcessingType::Normal,
    }
}

fn parse_construction_state(value: &str) -> Option<ConstructionState> {
    match value {
        "Proposed" => Some(ConstructionState::Proposed),
        "Notarized" => Some(ConstructionState::Notarized),
        "Final" => Some(ConstructionState::Final),
        _ => None,
    }
}

fn parse_tx_processing_type(value: &str) -> Option<TransactionProcessingType> {
    if value.is_empty() {
        None
    } else {
        Some(TransactionProcessingType::from(value))
    }
}

fn decode_base64_field(value: &str, field: &str) -> ChainResult<Vec<u8>> {
    if value.is_empty() {
        return Ok(Vec::new());
    }
    BASE64
        .decode(value)
        .map_err(|e| ChainError::InvalidInput(format!("cannot decode {field}: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn block_payload_converts_into_the_model() {
        let payload = r#"{
            "data": {
                "block": {
                    "nonce": 7,
                    "hash": "aa",
                    "prevBlockHash": "bb",
                    "timestamp": 1596117700,
                    "miniBlocks": [
                        {
                            "type": "TxBlock",
                            "processingType": "Scheduled",
                            "constructionState": "Final",
                            "transactions": [
                                {
                                    "hash": "tx1",
                                    "sender": "alice",
                                    "receiver": "bob",
                                    "value": "1000",
                                    "data": "aGVsbG8=",
                                    "type": "normal",
                                    "processingTypeOnSource": "MoveBalance",
                                    "initiallyPaidFee": "50",
                                    "logs": {
                                        "address": "alice",
                                        "events": [
                                            {
                                                "identifier": "ESDTTransfer",
                                                "address": "alice",
                                                "topics": ["VE9LLWFiY2RlZg==", "", "ZA=="],
                                                "data": ""
                                            }
                                        ]
                                    }
                                }
                            ],
                            "receipts": [
                                {"hash": "r1", "sender": "alice", "value": "25", "data": "refundedGas"}
                            ]
                        }
                    ]
                }
            },
            "error": "",
            "code": "successful"
        }"#;

        let response: ApiResponse<BlockData> = serde_json::from_str(payload).unwrap();
        let block = response.into_data().unwrap().block.into_model().unwrap();

        assert_eq!(block.nonce, 7);
        assert_eq!(block.previous_block_hash, "bb");

        let miniblock = &block.miniblocks[0];
        assert_eq!(miniblock.processing_type, MiniBlockProcessingType::Scheduled);
        assert_eq!(miniblock.construction_state, Some(ConstructionState::Final));

        let tx = &miniblock.transactions[0];
        assert_eq!(tx.kind, TransactionType::Normal);
        assert_eq!(tx.data, b"hello");
        assert_eq!(
            tx.processing_type_on_source,
            Some(TransactionProcessingType::MoveBalance)
        );
        assert!(tx.processing_type_on_destination.is_none());

        let event = &tx.logs.as_ref().unwrap().events[0];
        assert_eq!(event.topics[0], b"TOK-abcdef");
        assert!(event.topics[1].is_empty());
        assert_eq!(event.topics[2], vec![0x64]);

        assert_eq!(miniblock.receipts[0].sender_address, "alice");
    }

    #[test]
    fn error_envelope_surfaces_the_message() {
        let payload = r#"{"data": null, "error": "block not found", "code": "internal_issue"}"#;
        let response: ApiResponse<BlockData> = serde_json::from_str(payload).unwrap();

        let err = response.into_data().unwrap_err();
        assert!(err.to_string().contains("block not found"));
    }

    #[test]
    fn unknown_enum_strings_degrade_without_loss_of_invalid_detection() {
        let dto = MiniBlockDto {
            kind: "InvalidBlock".into(),
            processing_type: "".into(),
            construction_state: "".into(),
            transactions: vec![],
            receipts: vec![],
        };

        let miniblock = dto.into_model().unwrap();
        assert_eq!(miniblock.kind, MiniBlockType::InvalidBlock);
        assert_eq!(miniblock.processing_type, MiniBlockProcessingType::Normal);
        assert!(miniblock.construction_state.is_none());
    }

    #[test]
    fn malformed_base64_is_rejected() {
        let dto = EventDto {
            identifier: "x".into(),
            address: "y".into(),
            topics: vec!["%%%".into()],
            data: String::new(),
            additional_data: vec![],
        };

        assert!(dto.into_model().is_err());
    }

    #[test]
    fn empty_relayer_is_normalized_to_none() {
        let dto = TransactionDto {
            hash: "h".into(),
            nonce: 0,
            sender: String::new(),
            receiver: String::new(),
            value: "0".into(),
            data: String::new(),
            gas_price: 0,
            gas_limit: 0,
            kind: "normal".into(),
            processing_type_on_source: String::new(),
            processing_type_on_destination: String::new(),
            source_shard: 0,
            destination_shard: 0,
            initially_paid_fee: "0".into(),
            is_refund: false,
            previous_transaction_hash: String::new(),
            original_transaction_hash: String::new(),
            relayer_address: Some(String::new()),
            guardian_address: None,
            logs: None,
        };

        let tx = dto.into_model().unwrap();
        assert!(tx.relayer_address.is_none());
    }
}
