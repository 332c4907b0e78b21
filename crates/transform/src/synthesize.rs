//! Operation synthesis.
//!
//! Per transaction, emits the canonical operation list: transfers, fees, fee
//! refunds, rewards, contract-result flows, invalid-transaction fees, and
//! custom-currency token movements. All amounts are signed decimal strings
//! in the smallest unit of their currency.

use std::sync::Arc;

use serde_json::json;

use tessera_core::canonical::{
    Amount, CanonicalTransaction, Currency, Operation, OperationStatus, OperationType,
};
use tessera_core::error::TransformResult;
use tessera_core::models::{Receipt, Transaction};
use tessera_core::ports::NetworkProvider;

use crate::classify::TransactionKind;
use crate::constants::{
    BUILT_IN_FUNCTION_CLAIM_DEVELOPER_REWARDS, EVENT_TOPIC_INVALID_META_TRANSACTION,
};
use crate::events::{EventExtractor, TokenEventRecord};

/// Emits the operation list of each transaction, by processing kind.
pub struct OperationSynthesizer {
    provider: Arc<dyn NetworkProvider>,
    extractor: EventExtractor,
}

impl OperationSynthesizer {
    pub fn new(provider: Arc<dyn NetworkProvider>) -> Self {
        let extractor = EventExtractor::new(provider.clone());
        Self {
            provider,
            extractor,
        }
    }

    /// Turn one transaction into its canonical form (operations unindexed
    /// and unstamped; the block transformer finalizes them after filtering).
    pub fn transaction_to_canonical(
        &self,
        tx: &Transaction,
        txs_in_block: &[Transaction],
        kind: TransactionKind,
    ) -> TransformResult<CanonicalTransaction> {
        match kind {
            TransactionKind::Reward => Ok(self.reward_to_canonical(tx)),
            TransactionKind::SmartContractResult => {
                Ok(self.contract_result_to_canonical(tx, txs_in_block))
            }
            TransactionKind::Invalid => self.invalid_to_canonical(tx),
            TransactionKind::MoveBalance
            | TransactionKind::Relayed
            | TransactionKind::BuiltInFunctionCall
            | TransactionKind::ContractInvoking
            | TransactionKind::ContractDeployment => self.normal_to_canonical(tx, kind),
        }
    }

    /// Move-balance shaped transactions: optional value transfer, then the
    /// fee, then any custom-currency movements carried by the log.
    fn normal_to_canonical(
        &self,
        tx: &Transaction,
        kind: TransactionKind,
    ) -> TransformResult<CanonicalTransaction> {
        let mut operations = Vec::new();

        if tx.value != "0" {
            operations.push(Operation::new(
                OperationType::Transfer,
                &tx.sender,
                self.native_amount(&negated(&tx.value)),
            ));
            operations.push(Operation::new(
                OperationType::Transfer,
                &tx.receiver,
                self.native_amount(&tx.value),
            ));
        }

        // On relayed transactions, the relayer pays; the inner transaction's
        // own transfers only surface through the resulting contract results.
        let fee_payer = match (kind, &tx.relayer_address) {
            (TransactionKind::Relayed, Some(relayer)) => relayer.as_str(),
            _ => tx.sender.as_str(),
        };
        operations.push(Operation::new(
            OperationType::Fee,
            fee_payer,
            self.native_amount(&negated(&tx.initially_paid_fee)),
        ));

        operations.extend(self.token_operations(tx)?);

        Ok(CanonicalTransaction::new(&tx.hash, operations))
    }

    /// Unsigned transactions (contract results).
    fn contract_result_to_canonical(
        &self,
        scr: &Transaction,
        txs_in_block: &[Transaction],
    ) -> CanonicalTransaction {
        // Gas refunds only credit the receiver; the debit already happened
        // through the original transaction's fee.
        let one_sided = scr.is_refund
            || contract_result_holds_claimed_developer_rewards(scr, txs_in_block);

        let mut operations = Vec::new();
        if !one_sided {
            operations.push(Operation::new(
                OperationType::SmartContractResult,
                &scr.sender,
                self.native_amount(&negated(&scr.value)),
            ));
        }
        operations.push(Operation::new(
            OperationType::SmartContractResult,
            &scr.receiver,
            self.native_amount(&scr.value),
        ));

        CanonicalTransaction::new(&scr.hash, operations)
    }

    fn reward_to_canonical(&self, tx: &Transaction) -> CanonicalTransaction {
        CanonicalTransaction::new(
            &tx.hash,
            vec![Operation::new(
                OperationType::Reward,
                &tx.receiver,
                self.native_amount(&tx.value),
            )],
        )
    }

    /// Invalid transactions only charge a fee. When the failure is "sending
    /// value to a non-payable contract", the observer's `initiallyPaidFee`
    /// is not reliable and the fee is recomputed from the data-movement
    /// component alone.
    fn invalid_to_canonical(&self, tx: &Transaction) -> TransformResult<CanonicalTransaction> {
        let fee = if self
            .extractor
            .has_signal_error_of_sending_value_to_non_payable_contract(tx)
        {
            self.provider
                .compute_transaction_fee_for_move_balance(tx)
                .to_string()
        } else {
            tx.initially_paid_fee.clone()
        };

        let mut operation = Operation::new(
            OperationType::FeeOfInvalidTx,
            &tx.sender,
            self.native_amount(&negated(&fee)),
        );

        if self
            .extractor
            .has_signal_error_of_meta_transaction_is_invalid(tx)
        {
            operation.metadata = Some(json!({ "error": EVENT_TOPIC_INVALID_META_TRANSACTION }));
        }

        Ok(CanonicalTransaction::new(&tx.hash, vec![operation]))
    }

    /// The gas-refund receipt becomes its own canonical transaction.
    pub fn refund_receipt_to_canonical(&self, receipt: &Receipt) -> CanonicalTransaction {
        CanonicalTransaction::new(
            &receipt.hash,
            vec![Operation::new(
                OperationType::FeeRefund,
                &receipt.sender_address,
                self.native_amount(&receipt.value),
            )],
        )
    }

    /// Unconfirmed transactions: value transfer only - the fee is not
    /// charged yet. Operations are indexed here since the mempool path skips
    /// the block transformer.
    pub fn mempool_transaction_to_canonical(&self, tx: &Transaction) -> CanonicalTransaction {
        let mut operations = Vec::new();

        if tx.value != "0" {
            operations.push(Operation::new(
                OperationType::Transfer,
                &tx.sender,
                self.native_amount(&negated(&tx.value)),
            ));
            operations.push(Operation::new(
                OperationType::Transfer,
                &tx.receiver,
                self.native_amount(&tx.value),
            ));
        }

        index_operations(&mut operations);

        CanonicalTransaction::new(&tx.hash, operations)
    }

    /// Custom-currency movements carried by the transaction's log. Only
    /// configured currencies are emitted; everything else is ignored by
    /// policy, not by accident.
    fn token_operations(&self, tx: &Transaction) -> TransformResult<Vec<Operation>> {
        let mut operations = Vec::new();

        let mut transfers = self.extractor.extract_token_transfers(tx)?;
        transfers.extend(self.extractor.extract_nft_transfers(tx)?);
        transfers.extend(self.extractor.extract_multi_transfers(tx)?);
        for record in &transfers {
            if let Some(currency) = self.custom_currency_of(record) {
                operations.push(Operation::new(
                    OperationType::Transfer,
                    &record.holder,
                    token_amount(&negated(&record.value), &currency),
                ));
                if let Some(receiver) = &record.receiver {
                    operations.push(Operation::new(
                        OperationType::Transfer,
                        receiver,
                        token_amount(&record.value, &currency),
                    ));
                }
            }
        }

        let mut mint_like = self.extractor.extract_nft_creates(tx)?;
        mint_like.extend(self.extractor.extract_nft_add_quantities(tx)?);
        mint_like.extend(self.extractor.extract_local_mints(tx)?);
        for record in &mint_like {
            if let Some(currency) = self.custom_currency_of(record) {
                operations.push(Operation::new(
                    OperationType::Transfer,
                    &record.holder,
                    token_amount(&record.value, &currency),
                ));
            }
        }

        let mut burn_like = self.extractor.extract_nft_burns(tx)?;
        burn_like.extend(self.extractor.extract_local_burns(tx)?);
        burn_like.extend(self.extractor.extract_wipes(tx)?);
        for record in &burn_like {
            if let Some(currency) = self.custom_currency_of(record) {
                operations.push(Operation::new(
                    OperationType::Transfer,
                    &record.holder,
                    token_amount(&negated(&record.value), &currency),
                ));
            }
        }

        Ok(operations)
    }

    fn custom_currency_of(&self, record: &TokenEventRecord) -> Option<Currency> {
        self.provider.custom_currency(&record.identifier)
    }

    fn native_amount(&self, value: &str) -> Amount {
        Amount {
            value: value.to_string(),
            currency: self.provider.native_currency(),
        }
    }
}

fn token_amount(value: &str, currency: &Currency) -> Amount {
    Amount {
        value: value.to_string(),
        currency: currency.clone(),
    }
}

/// Whether a contract result pays out `ClaimDeveloperRewards`, detected by
/// walking back to the original transaction within the same block.
fn contract_result_holds_claimed_developer_rewards(
    scr: &Transaction,
    txs_in_block: &[Transaction],
) -> bool {
    txs_in_block.iter().any(|tx| {
        tx.hash == scr.original_transaction_hash
            && tx.data == BUILT_IN_FUNCTION_CLAIM_DEVELOPER_REWARDS.as_bytes()
    })
}

/// Negate a non-negative decimal string; zero stays zero.
fn negated(value: &str) -> String {
    if value == "0" || value.is_empty() {
        "0".to_string()
    } else {
        format!("-{value}")
    }
}

/// Assign contiguous indices `0..k-1` in emission order.
pub fn index_operations(operations: &mut [Operation]) {
    for (index, operation) in operations.iter_mut().enumerate() {
        operation.operation_identifier.index = index as i64;
    }
}

/// Stamp every operation with the transaction-level status.
pub fn populate_status_of_operations(operations: &mut [Operation], status: OperationStatus) {
    for operation in operations {
        operation.status = Some(status);
    }
}
