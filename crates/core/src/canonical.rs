//! Canonical (Rosetta-shaped) output entities.
//!
//! These types serialize exactly to the wire contract clients consume:
//! `block_identifier`, `parent_block_identifier`, millisecond timestamps,
//! per-operation `operation_identifier.index` / `type` / `status` /
//! `account.address` / `amount.value` / `amount.currency`.

use serde::{Deserialize, Serialize};

// =============================================================================
// Identifiers
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockIdentifier {
    pub index: u64,
    pub hash: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionIdentifier {
    pub hash: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct OperationIdentifier {
    pub index: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountIdentifier {
    pub address: String,
}

// =============================================================================
// Currencies & amounts
// =============================================================================

/// A currency, native or custom. Custom currencies are configured per
/// deployment; amounts in unconfigured tokens are never emitted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Currency {
    pub symbol: String,
    pub decimals: u32,
}

/// A signed amount, in the smallest unit of its currency.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Amount {
    /// Signed decimal string, e.g. `"-50000000000000"`.
    pub value: String,
    pub currency: Currency,
}

// =============================================================================
// Operations
// =============================================================================

/// Balance-changing operation types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OperationType {
    Transfer,
    Fee,
    FeeRefund,
    FeeOfInvalidTx,
    Reward,
    SmartContractResult,
}

/// Operation status, assigned only after shard filtering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OperationStatus {
    Success,
    Failed,
}

/// A single balance delta on one account.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Operation {
    pub operation_identifier: OperationIdentifier,
    #[serde(rename = "type")]
    pub kind: OperationType,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<OperationStatus>,
    pub account: AccountIdentifier,
    pub amount: Amount,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadata: Option<serde_json::Value>,
}

impl Operation {
    /// An unindexed, unstamped operation; index and status are assigned by
    /// the block transformer after filtering.
    pub fn new(kind: OperationType, address: &str, amount: Amount) -> Self {
        Self {
            operation_identifier: OperationIdentifier { index: 0 },
            kind,
            status: None,
            account: AccountIdentifier {
                address: address.to_string(),
            },
            amount,
            metadata: None,
        }
    }
}

// =============================================================================
// Transactions & blocks
// =============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CanonicalTransaction {
    pub transaction_identifier: TransactionIdentifier,
    pub operations: Vec<Operation>,
}

impl CanonicalTransaction {
    pub fn new(hash: &str, operations: Vec<Operation>) -> Self {
        Self {
            transaction_identifier: TransactionIdentifier {
                hash: hash.to_string(),
            },
            operations,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CanonicalBlock {
    pub block_identifier: BlockIdentifier,
    pub parent_block_identifier: BlockIdentifier,
    /// Milliseconds since the Unix epoch.
    pub timestamp: u64,
    pub transactions: Vec<CanonicalTransaction>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn operation_serializes_to_the_wire_shape() {
        let mut operation = Operation::new(
            OperationType::Transfer,
            "addr",
            Amount {
                value: "-1000".to_string(),
                currency: Currency {
                    symbol: "TOK".to_string(),
                    decimals: 18,
                },
            },
        );
        operation.status = Some(OperationStatus::Success);

        let json = serde_json::to_value(&operation).unwrap();
        assert_eq!(json["operation_identifier"]["index"], 0);
        assert_eq!(json["type"], "Transfer");
        assert_eq!(json["status"], "Success");
        assert_eq!(json["account"]["address"], "addr");
        assert_eq!(json["amount"]["value"], "-1000");
        assert_eq!(json["amount"]["currency"]["symbol"], "TOK");
        assert_eq!(json["amount"]["currency"]["decimals"], 18);
        // Pas de champ metadata tant qu'il n'est pas renseigné
        assert!(json.get("metadata").is_none());
    }

    #[test]
    fn block_serializes_identifiers() {
        let block = CanonicalBlock {
            block_identifier: BlockIdentifier {
                index: 7,
                hash: "aa".into(),
            },
            parent_block_identifier: BlockIdentifier {
                index: 6,
                hash: "bb".into(),
            },
            timestamp: 1596117600000,
            transactions: vec![],
        };

        let json = serde_json::to_value(&block).unwrap();
        assert_eq!(json["block_identifier"]["index"], 7);
        assert_eq!(json["parent_block_identifier"]["hash"], "bb");
        assert_eq!(json["timestamp"], 1596117600000u64);
    }
}
