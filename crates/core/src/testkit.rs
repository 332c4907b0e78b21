//! Test support: a map-backed [`NetworkProvider`] mock and known addresses.
//!
//! The mock mirrors the observer's read surface with plain hash maps, so
//! tests script exactly the chain state they need. It uses the real address
//! codec and the real shard arithmetic - filtering behavior under test is
//! the production code path.

use std::collections::HashMap;

use async_trait::async_trait;

use crate::addresses::{AddressConverter, AddressError};
use crate::config::NetworkConfig;
use crate::error::{ChainError, ChainResult};
use crate::models::{
    AccountOnBlock, AccountTokenBalance, Block, NodeStatus, SubmittableTransaction, Transaction,
};
use crate::ports::NetworkProvider;

/// HRP of the test network.
pub const TEST_HRP: &str = "erd";

/// A well-known user address; its pubkey lands on shard 1 of 3.
pub const TEST_ADDRESS_ALICE: &str =
    "erd1qyu5wthldzr8wx5c9ucg8kjagg0jfs53s8nr3zpz3hypefsdd8ssycr6th";

/// A well-known user address; its pubkey lands on shard 0 of 3.
pub const TEST_ADDRESS_BOB: &str =
    "erd1spyavw0956vq68xj8y4tenjpq2wd5a9p2c6j8gsz7ztyrnpxrruqzu66jx";

/// A contract address (zero-prefixed pubkey), shard 0 of 3.
pub const TEST_ADDRESS_CONTRACT: &str =
    "erd1qqqqqqqqqqqqqpgqfejaxfh4ktp8mh8s77pl90dq0uzvh2vk396qlcwepw";

/// The system address contracts are deployed through.
pub const TEST_ADDRESS_SYSTEM_DEPLOY: &str =
    "erd1qqqqqqqqqqqqqqqqqqqqqqqqqqqqqqqqqqqqqqqqqqqqqqqqqqqq6gq4hu";

/// A 32-byte all-zero hash, hex-encoded.
pub fn empty_hash() -> String {
    "0".repeat(64)
}

/// The configuration the mock provider runs with, mirroring a three-shard
/// test network observed from shard 0.
pub fn test_network_config() -> NetworkConfig {
    NetworkConfig {
        num_shards: 3,
        observed_actual_shard: 0,
        observed_projected_shard: None,
        address_hrp: TEST_HRP.to_string(),
        native_currency_symbol: "XeGLD".to_string(),
        native_currency_decimals: 18,
        custom_currencies: Vec::new(),
        genesis_block_hash: empty_hash(),
        genesis_timestamp: 1_596_117_600,
        min_gas_price: 1_000_000_000,
        min_gas_limit: 50_000,
        gas_per_data_byte: 1_500,
        gas_price_modifier: 0.01,
        extra_gas_limit_guarded_tx: 50_000,
    }
}

/// Map-backed provider mock. Populate the public fields, then hand it to the
/// code under test behind an `Arc`.
pub struct NetworkProviderMock {
    pub config: NetworkConfig,
    pub offline: bool,
    pub blocks_by_nonce: HashMap<u64, Block>,
    pub blocks_by_hash: HashMap<String, Block>,
    pub accounts_by_address: HashMap<String, AccountOnBlock>,
    pub token_balances: HashMap<(String, String), AccountTokenBalance>,
    pub mempool_transactions_by_hash: HashMap<String, Transaction>,
    pub node_status: NodeStatus,
    pub computed_transaction_hash: String,
    /// When set, every provider call fails with this message.
    pub next_error: Option<String>,
    converter: AddressConverter,
}

impl Default for NetworkProviderMock {
    fn default() -> Self {
        Self {
            config: test_network_config(),
            offline: false,
            blocks_by_nonce: HashMap::new(),
            blocks_by_hash: HashMap::new(),
            accounts_by_address: HashMap::new(),
            token_balances: HashMap::new(),
            mempool_transactions_by_hash: HashMap::new(),
            node_status: NodeStatus::default(),
            computed_transaction_hash: empty_hash(),
            next_error: None,
            converter: AddressConverter::new(TEST_HRP),
        }
    }
}

impl NetworkProviderMock {
    /// A mock whose single-shard topology observes every address.
    pub fn single_shard() -> Self {
        let mut mock = Self::default();
        mock.config.num_shards = 1;
        mock
    }

    pub fn with_block(mut self, block: Block) -> Self {
        self.blocks_by_hash.insert(block.hash.clone(), block.clone());
        self.blocks_by_nonce.insert(block.nonce, block);
        self
    }

    fn fail_if_scripted(&self) -> ChainResult<()> {
        match &self.next_error {
            Some(message) => Err(ChainError::Unreachable(message.clone())),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl NetworkProvider for NetworkProviderMock {
    fn is_offline(&self) -> bool {
        self.offline
    }

    fn network_config(&self) -> &NetworkConfig {
        &self.config
    }

    fn convert_address_to_pubkey(&self, address: &str) -> Result<Vec<u8>, AddressError> {
        self.converter.decode(address)
    }

    fn convert_pubkey_to_address(&self, pubkey: &[u8]) -> Result<String, AddressError> {
        self.converter.encode(pubkey)
    }

    async fn get_block_by_nonce(&self, nonce: u64) -> ChainResult<Block> {
        self.fail_if_scripted()?;
        self.blocks_by_nonce
            .get(&nonce)
            .cloned()
            .ok_or_else(|| ChainError::BlockNotFound(nonce.to_string()))
    }

    async fn get_block_by_hash(&self, hash: &str) -> ChainResult<Block> {
        self.fail_if_scripted()?;
        self.blocks_by_hash
            .get(hash)
            .cloned()
            .ok_or_else(|| ChainError::BlockNotFound(hash.to_string()))
    }

    async fn get_account(&self, address: &str) -> ChainResult<AccountOnBlock> {
        self.fail_if_scripted()?;
        self.accounts_by_address
            .get(address)
            .cloned()
            .ok_or_else(|| ChainError::InvalidInput(format!("account {address} not found")))
    }

    async fn get_account_native_balance(&self, address: &str) -> ChainResult<AccountOnBlock> {
        self.get_account(address).await
    }

    async fn get_account_token_balance(
        &self,
        address: &str,
        token_identifier: &str,
    ) -> ChainResult<AccountTokenBalance> {
        self.fail_if_scripted()?;
        self.token_balances
            .get(&(address.to_string(), token_identifier.to_string()))
            .cloned()
            .ok_or_else(|| ChainError::InvalidInput(format!("account {address} not found")))
    }

    async fn compute_transaction_hash(
        &self,
        _tx: &SubmittableTransaction,
    ) -> ChainResult<String> {
        self.fail_if_scripted()?;
        Ok(self.computed_transaction_hash.clone())
    }

    async fn send_transaction(&self, _tx: &SubmittableTransaction) -> ChainResult<String> {
        self.fail_if_scripted()?;
        if self.offline {
            return Err(ChainError::Offline);
        }
        Ok(self.computed_transaction_hash.clone())
    }

    async fn get_mempool_transaction_by_hash(
        &self,
        hash: &str,
    ) -> ChainResult<Option<Transaction>> {
        self.fail_if_scripted()?;
        Ok(self.mempool_transactions_by_hash.get(hash).cloned())
    }

    async fn get_node_status(&self) -> ChainResult<NodeStatus> {
        self.fail_if_scripted()?;
        Ok(self.node_status.clone())
    }
}
