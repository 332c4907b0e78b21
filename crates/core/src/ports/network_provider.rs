//! Port trait for the observer-node provider.
//!
//! This trait is the single seam between the transformation pipeline and the
//! outside world. Implementations live in the infrastructure layer (e.g.
//! `tessera-observer`); tests use the map-backed mock from
//! [`crate::testkit`]. The provider must be safe for concurrent calls -
//! request handlers share one instance behind an `Arc`.

use async_trait::async_trait;
use num_bigint::BigUint;

use crate::addresses::AddressError;
use crate::canonical::Currency;
use crate::config::NetworkConfig;
use crate::error::ChainResult;
use crate::models::{
    AccountOnBlock, AccountTokenBalance, Block, NodeStatus, SubmittableTransaction, Transaction,
};

/// Read-and-submit access to an observer node, plus the network facts the
/// pipeline needs (currencies, shard topology, address codec).
#[async_trait]
pub trait NetworkProvider: Send + Sync {
    /// Whether this deployment runs without network access. Offline
    /// deployments serve cached/derived data and reject submissions.
    fn is_offline(&self) -> bool;

    /// The static network configuration this provider was built with.
    fn network_config(&self) -> &NetworkConfig;

    fn native_currency(&self) -> Currency {
        self.network_config().native_currency()
    }

    fn custom_currency(&self, symbol: &str) -> Option<Currency> {
        self.network_config().custom_currency(symbol).cloned()
    }

    /// Decode a bech32 address into its raw public key.
    fn convert_address_to_pubkey(&self, address: &str) -> Result<Vec<u8>, AddressError>;

    /// Encode a raw public key into a bech32 address.
    fn convert_pubkey_to_address(&self, pubkey: &[u8]) -> Result<String, AddressError>;

    /// Whether an address belongs to the shard this deployment observes
    /// (actual or projected, per configuration).
    fn is_address_observed(&self, address: &str) -> Result<bool, AddressError> {
        let pubkey = self.convert_address_to_pubkey(address)?;
        Ok(self
            .network_config()
            .shard_filter()
            .is_observed_pubkey(&pubkey))
    }

    /// The fee charged for the data-movement component of a transaction:
    /// `(minGasLimit + gasPerDataByte * len(data) (+ extraGasLimitGuardedTx
    /// if guarded)) * gasPrice`.
    fn compute_transaction_fee_for_move_balance(&self, tx: &Transaction) -> BigUint {
        let config = self.network_config();

        let mut gas_limit = config.min_gas_limit + config.gas_per_data_byte * tx.data.len() as u64;
        if tx.guardian_address.is_some() {
            gas_limit += config.extra_gas_limit_guarded_tx;
        }

        BigUint::from(gas_limit) * BigUint::from(tx.gas_price)
    }

    async fn get_block_by_nonce(&self, nonce: u64) -> ChainResult<Block>;

    async fn get_block_by_hash(&self, hash: &str) -> ChainResult<Block>;

    async fn get_account(&self, address: &str) -> ChainResult<AccountOnBlock>;

    async fn get_account_native_balance(&self, address: &str) -> ChainResult<AccountOnBlock>;

    async fn get_account_token_balance(
        &self,
        address: &str,
        token_identifier: &str,
    ) -> ChainResult<AccountTokenBalance>;

    /// The hash the chain will assign to a submittable transaction; used to
    /// echo an identifier back to the submitter.
    async fn compute_transaction_hash(&self, tx: &SubmittableTransaction) -> ChainResult<String>;

    /// Submit a signed transaction; returns its hash.
    async fn send_transaction(&self, tx: &SubmittableTransaction) -> ChainResult<String>;

    /// A pooled (unconfirmed) transaction, or `None` when absent.
    async fn get_mempool_transaction_by_hash(&self, hash: &str)
        -> ChainResult<Option<Transaction>>;

    async fn get_node_status(&self) -> ChainResult<NodeStatus>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testkit::NetworkProviderMock;

    #[test]
    fn move_balance_fee_includes_data_bytes() {
        let provider = NetworkProviderMock::default();
        // minGasLimit = 50_000, gasPerDataByte = 1_500, gasPrice du tx
        let tx = Transaction {
            data: b"hello".to_vec(),
            gas_price: 1_000_000_000,
            ..Default::default()
        };

        let fee = provider.compute_transaction_fee_for_move_balance(&tx);
        let expected = BigUint::from((50_000u64 + 1_500 * 5) * 1_000_000_000);
        assert_eq!(fee, expected);
    }

    #[test]
    fn move_balance_fee_of_guarded_transaction() {
        let provider = NetworkProviderMock::default();
        let tx = Transaction {
            guardian_address: Some(crate::testkit::TEST_ADDRESS_BOB.to_string()),
            gas_price: 1_000_000_000,
            ..Default::default()
        };

        let fee = provider.compute_transaction_fee_for_move_balance(&tx);
        let expected = BigUint::from((50_000u64 + 50_000) * 1_000_000_000);
        assert_eq!(fee, expected);
    }

    #[test]
    fn observed_address_uses_the_shard_filter() {
        // Le mock observe le shard 0 sur 3; Bob y réside, Alice non
        let provider = NetworkProviderMock::default();
        assert!(provider
            .is_address_observed(crate::testkit::TEST_ADDRESS_BOB)
            .unwrap());
        assert!(!provider
            .is_address_observed(crate::testkit::TEST_ADDRESS_ALICE)
            .unwrap());
    }
}
