//! Mempool transaction transformation.
//!
//! A single unconfirmed transaction yields its move-balance operations only:
//! no fee (nothing has been charged yet) and no shard filtering (the mempool
//! is shard-local already).

use std::sync::Arc;

use tracing::instrument;

use tessera_core::canonical::CanonicalTransaction;
use tessera_core::error::TransformResult;
use tessera_core::ports::NetworkProvider;

use crate::synthesize::OperationSynthesizer;

/// Transforms pooled transactions into canonical form.
pub struct MempoolTransformer {
    provider: Arc<dyn NetworkProvider>,
    synthesizer: OperationSynthesizer,
}

impl MempoolTransformer {
    pub fn new(provider: Arc<dyn NetworkProvider>) -> Self {
        Self {
            synthesizer: OperationSynthesizer::new(provider.clone()),
            provider,
        }
    }

    /// Look up an unconfirmed transaction and transform it; `None` when the
    /// pool does not hold it.
    #[instrument(skip(self))]
    pub async fn transform_transaction_by_hash(
        &self,
        hash: &str,
    ) -> TransformResult<Option<CanonicalTransaction>> {
        let Some(tx) = self.provider.get_mempool_transaction_by_hash(hash).await? else {
            return Ok(None);
        };

        Ok(Some(self.synthesizer.mempool_transaction_to_canonical(&tx)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tessera_core::canonical::OperationType;
    use tessera_core::models::Transaction;
    use tessera_core::testkit::{NetworkProviderMock, TEST_ADDRESS_ALICE, TEST_ADDRESS_BOB};

    #[tokio::test]
    async fn absent_transaction_yields_none() {
        let transformer = MempoolTransformer::new(Arc::new(NetworkProviderMock::default()));
        let result = transformer.transform_transaction_by_hash("aa").await.unwrap();
        assert!(result.is_none());
    }

    #[tokio::test]
    async fn pooled_transaction_yields_transfers_without_fee() {
        let mut provider = NetworkProviderMock::default();
        provider.mempool_transactions_by_hash.insert(
            "aa".to_string(),
            Transaction {
                hash: "aa".into(),
                sender: TEST_ADDRESS_ALICE.into(),
                receiver: TEST_ADDRESS_BOB.into(),
                value: "300".into(),
                initially_paid_fee: "50".into(),
                ..Default::default()
            },
        );

        let transformer = MempoolTransformer::new(Arc::new(provider));
        let canonical = transformer
            .transform_transaction_by_hash("aa")
            .await
            .unwrap()
            .unwrap();

        assert_eq!(canonical.operations.len(), 2);
        assert!(canonical
            .operations
            .iter()
            .all(|op| op.kind == OperationType::Transfer));
        // Le statut reste non renseigné: rien n'est encore réglé
        assert!(canonical.operations.iter().all(|op| op.status.is_none()));
    }
}
