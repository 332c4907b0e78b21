//! Block transformation orchestration.
//!
//! Drives the pipeline over all transactions and receipts of one block:
//! window fetch, scheduled reconciliation, pre-transform filters,
//! per-transaction synthesis, observed-address filtering, then status and
//! index stamping. Transforming the same block twice yields identical
//! output; nothing is cached between requests.

use std::sync::Arc;

use tracing::{debug, instrument};

use tessera_core::canonical::{
    BlockIdentifier, CanonicalBlock, CanonicalTransaction, OperationStatus,
};
use tessera_core::error::TransformResult;
use tessera_core::metrics::{
    TransformTimer, record_block_transformed, record_operations_emitted, record_transform_error,
};
use tessera_core::models::{Block, Receipt, Transaction};
use tessera_core::ports::NetworkProvider;

use crate::classify::{TransactionKind, TxClassifier};
use crate::constants::REFUND_GAS_MESSAGE;
use crate::events::EventExtractor;
use crate::filters;
use crate::scheduled;
use crate::synthesize::{OperationSynthesizer, index_operations, populate_status_of_operations};
use crate::window::BlockWindowFetcher;

/// Transforms native blocks into canonical ones.
pub struct BlockTransformer {
    provider: Arc<dyn NetworkProvider>,
    fetcher: BlockWindowFetcher,
    classifier: TxClassifier,
    extractor: EventExtractor,
    synthesizer: OperationSynthesizer,
}

impl BlockTransformer {
    pub fn new(provider: Arc<dyn NetworkProvider>) -> Self {
        Self {
            fetcher: BlockWindowFetcher::new(provider.clone()),
            classifier: TxClassifier::new(provider.clone()),
            extractor: EventExtractor::new(provider.clone()),
            synthesizer: OperationSynthesizer::new(provider.clone()),
            provider,
        }
    }

    /// Transform the block at `nonce`.
    #[instrument(skip(self))]
    pub async fn transform_block_by_nonce(&self, nonce: u64) -> TransformResult<CanonicalBlock> {
        let window = self.fetcher.fetch_by_nonce(nonce).await.map_err(|e| {
            record_transform_error("fetch");
            e
        })?;
        self.transform_reconciled(scheduled::reconcile(window)).await
    }

    /// Transform the block with the given hash.
    #[instrument(skip(self))]
    pub async fn transform_block_by_hash(&self, hash: &str) -> TransformResult<CanonicalBlock> {
        let block = self.provider.get_block_by_hash(hash).await?;
        let window = self.fetcher.fetch_neighbors_of(block).await.map_err(|e| {
            record_transform_error("fetch");
            e
        })?;
        self.transform_reconciled(scheduled::reconcile(window)).await
    }

    async fn transform_reconciled(&self, block: Block) -> TransformResult<CanonicalBlock> {
        let _timer = TransformTimer::new();

        let transactions = self.transform_transactions(&block).await.map_err(|e| {
            record_transform_error("synthesize");
            e
        })?;
        record_block_transformed();
        debug!(
            nonce = block.nonce,
            transactions = transactions.len(),
            "Block transformed"
        );

        Ok(CanonicalBlock {
            block_identifier: BlockIdentifier {
                index: block.nonce,
                hash: block.hash.clone(),
            },
            parent_block_identifier: BlockIdentifier {
                index: block.nonce.saturating_sub(1),
                hash: block.previous_block_hash.clone(),
            },
            timestamp: block.timestamp * 1000,
            transactions,
        })
    }

    async fn transform_transactions(
        &self,
        block: &Block,
    ) -> TransformResult<Vec<CanonicalTransaction>> {
        let (txs, receipts) = flatten_block(block);

        let invalid_hashes = filters::invalid_transaction_hashes(&txs);
        let txs =
            filters::filter_out_intrashard_contract_results_of_invalid_transactions(
                txs,
                &invalid_hashes,
            );
        let txs = filters::filter_out_intrashard_relayed_transactions_held_in_invalid_miniblock(
            txs,
            &invalid_hashes,
        );
        let txs = filters::filter_out_contract_results_with_no_value(txs);
        let txs = filters::filter_out_contract_results_with_contract_sender_same_as_receiver(
            self.provider.as_ref(),
            txs,
        )?;

        let mut stamped: Vec<(CanonicalTransaction, OperationStatus)> = Vec::new();

        for tx in &txs {
            let kind = self.classifier.classify(tx)?;
            let canonical = self.synthesizer.transaction_to_canonical(tx, &txs, kind)?;
            stamped.push((canonical, self.status_of(tx, kind)));
        }

        for receipt in &receipts {
            if receipt.data == REFUND_GAS_MESSAGE {
                let canonical = self.synthesizer.refund_receipt_to_canonical(receipt);
                stamped.push((canonical, OperationStatus::Success));
            }
        }

        let mut transactions = Vec::with_capacity(stamped.len());
        let mut operations_emitted = 0u64;

        for (mut canonical, status) in stamped {
            let mut kept = Vec::with_capacity(canonical.operations.len());
            for operation in canonical.operations {
                if self.provider.is_address_observed(&operation.account.address)? {
                    kept.push(operation);
                }
            }

            // A transaction whose operations all dropped does not concern
            // this shard's clients at all.
            if kept.is_empty() {
                continue;
            }

            index_operations(&mut kept);
            populate_status_of_operations(&mut kept, status);
            operations_emitted += kept.len() as u64;

            canonical.operations = kept;
            transactions.push(canonical);
        }

        record_operations_emitted(operations_emitted);
        Ok(transactions)
    }

    /// A transaction's operations are `Failed` only when it carries a VM
    /// error signal and is not an invalid transaction - for those, the
    /// single fee operation did settle.
    fn status_of(&self, tx: &Transaction, kind: TransactionKind) -> OperationStatus {
        if kind != TransactionKind::Invalid && self.extractor.has_any_signal_error(tx) {
            OperationStatus::Failed
        } else {
            OperationStatus::Success
        }
    }
}

fn flatten_block(block: &Block) -> (Vec<Transaction>, Vec<Receipt>) {
    let mut txs = Vec::new();
    let mut receipts = Vec::new();

    for miniblock in &block.miniblocks {
        txs.extend(miniblock.transactions.iter().cloned());
        receipts.extend(miniblock.receipts.iter().cloned());
    }

    (txs, receipts)
}
