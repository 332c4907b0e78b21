//! Transaction classification.
//!
//! Every transaction is tagged with exactly one processing kind before
//! synthesis. The set is closed and small: the synthesizer dispatches on it
//! with a plain `match` rather than open-method dispatch.

use std::sync::Arc;

use tessera_core::addresses::is_smart_contract_pubkey;
use tessera_core::error::{TransformError, TransformResult};
use tessera_core::models::{Transaction, TransactionType};
use tessera_core::ports::NetworkProvider;

use crate::constants::{ARGUMENTS_SEPARATOR, BUILT_IN_FUNCTIONS};

/// Processing kind of a transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransactionKind {
    MoveBalance,
    Relayed,
    BuiltInFunctionCall,
    ContractInvoking,
    ContractDeployment,
    SmartContractResult,
    Reward,
    Invalid,
}

/// Classifies transactions from their native tags, payload and receiver.
pub struct TxClassifier {
    provider: Arc<dyn NetworkProvider>,
}

impl TxClassifier {
    pub fn new(provider: Arc<dyn NetworkProvider>) -> Self {
        Self { provider }
    }

    /// Tag a transaction. An unknown native `type` string fails fast with
    /// the offending value.
    pub fn classify(&self, tx: &Transaction) -> TransformResult<TransactionKind> {
        match &tx.kind {
            TransactionType::Reward => Ok(TransactionKind::Reward),
            TransactionType::Unsigned => Ok(TransactionKind::SmartContractResult),
            TransactionType::Invalid => Ok(TransactionKind::Invalid),
            TransactionType::Normal => self.classify_normal(tx),
            TransactionType::Unknown(value) => {
                Err(TransformError::UnknownTransactionType(value.clone()))
            }
        }
    }

    fn classify_normal(&self, tx: &Transaction) -> TransformResult<TransactionKind> {
        if starts_with_built_in_function(&tx.data) {
            return Ok(TransactionKind::BuiltInFunctionCall);
        }

        if tx.is_relayed() {
            return Ok(TransactionKind::Relayed);
        }

        let receiver_pubkey = self.provider.convert_address_to_pubkey(&tx.receiver)?;

        // Deployments go through the all-zero system address; other contract
        // accounts only share the zero prefix.
        if receiver_pubkey.iter().all(|byte| *byte == 0) {
            return Ok(TransactionKind::ContractDeployment);
        }
        if is_smart_contract_pubkey(&receiver_pubkey) {
            return Ok(TransactionKind::ContractInvoking);
        }

        Ok(TransactionKind::MoveBalance)
    }
}

/// Whether the payload starts with a recognized built-in function name.
fn starts_with_built_in_function(data: &[u8]) -> bool {
    let Ok(text) = std::str::from_utf8(data) else {
        return false;
    };
    let function_name = text.split(ARGUMENTS_SEPARATOR).next().unwrap_or_default();
    BUILT_IN_FUNCTIONS.contains(&function_name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tessera_core::models::TransactionProcessingType;
    use tessera_core::testkit::{
        NetworkProviderMock, TEST_ADDRESS_ALICE, TEST_ADDRESS_BOB, TEST_ADDRESS_CONTRACT,
        TEST_ADDRESS_SYSTEM_DEPLOY,
    };

    fn classifier() -> TxClassifier {
        TxClassifier::new(Arc::new(NetworkProviderMock::default()))
    }

    fn normal_tx_to(receiver: &str) -> Transaction {
        Transaction {
            sender: TEST_ADDRESS_ALICE.to_string(),
            receiver: receiver.to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn native_tags_take_precedence() {
        let classifier = classifier();

        let reward = Transaction {
            kind: TransactionType::Reward,
            ..Default::default()
        };
        assert_eq!(
            classifier.classify(&reward).unwrap(),
            TransactionKind::Reward
        );

        let unsigned = Transaction {
            kind: TransactionType::Unsigned,
            ..Default::default()
        };
        assert_eq!(
            classifier.classify(&unsigned).unwrap(),
            TransactionKind::SmartContractResult
        );

        let invalid = Transaction {
            kind: TransactionType::Invalid,
            ..Default::default()
        };
        assert_eq!(
            classifier.classify(&invalid).unwrap(),
            TransactionKind::Invalid
        );
    }

    #[test]
    fn unknown_type_fails_with_the_offending_value() {
        let classifier = classifier();
        let tx = Transaction {
            kind: TransactionType::Unknown("exotic".to_string()),
            ..Default::default()
        };

        let err = classifier.classify(&tx).unwrap_err();
        assert!(matches!(err, TransformError::UnknownTransactionType(ref v) if v == "exotic"));
    }

    #[test]
    fn built_in_function_calls_win_over_receiver_rules() {
        let classifier = classifier();
        let mut tx = normal_tx_to(TEST_ADDRESS_CONTRACT);
        tx.data = b"ESDTTransfer@544f4b2d616263646566@64".to_vec();

        assert_eq!(
            classifier.classify(&tx).unwrap(),
            TransactionKind::BuiltInFunctionCall
        );
    }

    #[test]
    fn relayed_transactions_are_recognized_on_either_shard() {
        let classifier = classifier();
        let mut tx = normal_tx_to(TEST_ADDRESS_BOB);
        tx.processing_type_on_destination = Some(TransactionProcessingType::RelayedTxV2);

        assert_eq!(classifier.classify(&tx).unwrap(), TransactionKind::Relayed);
    }

    #[test]
    fn receiver_class_drives_the_remaining_cases() {
        let classifier = classifier();

        assert_eq!(
            classifier
                .classify(&normal_tx_to(TEST_ADDRESS_SYSTEM_DEPLOY))
                .unwrap(),
            TransactionKind::ContractDeployment
        );
        assert_eq!(
            classifier
                .classify(&normal_tx_to(TEST_ADDRESS_CONTRACT))
                .unwrap(),
            TransactionKind::ContractInvoking
        );
        assert_eq!(
            classifier.classify(&normal_tx_to(TEST_ADDRESS_BOB)).unwrap(),
            TransactionKind::MoveBalance
        );
    }

    #[test]
    fn binary_payload_is_not_a_built_in_call() {
        assert!(!starts_with_built_in_function(&[0xff, 0xfe, 0x00]));
        assert!(starts_with_built_in_function(b"ClaimDeveloperRewards"));
        assert!(!starts_with_built_in_function(b"claimDeveloperRewards"));
    }
}
