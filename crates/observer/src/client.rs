//! Observer REST client implementing the `NetworkProvider` port.

use std::time::Duration;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use sha2::{Digest, Sha256};
use tracing::{debug, instrument};
use url::Url;

use tessera_core::addresses::{AddressConverter, AddressError};
use tessera_core::config::NetworkConfig;
use tessera_core::error::{ChainError, ChainResult};
use tessera_core::metrics::record_transaction_submitted;
use tessera_core::models::{
    AccountOnBlock, AccountTokenBalance, Block, NodeStatus, SubmittableTransaction, Transaction,
};
use tessera_core::ports::NetworkProvider;

use crate::resources::{
    AccountData, ApiResponse, BlockData, MempoolTransactionData, NodeStatusData,
    SendTransactionData, TokenBalanceData,
};

/// Configuration for the observer client.
#[derive(Debug, Clone)]
pub struct ObserverClientConfig {
    /// Base URL of the observer's REST API (e.g. "http://localhost:8080").
    pub url: String,
    /// Offline deployments serve reads from configuration only and reject
    /// submissions.
    pub offline: bool,
    /// Per-request timeout.
    pub request_timeout: Duration,
}

impl Default for ObserverClientConfig {
    fn default() -> Self {
        Self {
            url: "http://127.0.0.1:8080".to_string(),
            offline: false,
            request_timeout: Duration::from_secs(30),
        }
    }
}

/// Observer adapter: pooled HTTP client plus the network facts the pipeline
/// reads synchronously.
pub struct ObserverClient {
    http: reqwest::Client,
    base_url: Url,
    network: NetworkConfig,
    converter: AddressConverter,
    offline: bool,
}

impl ObserverClient {
    pub fn new(config: ObserverClientConfig, network: NetworkConfig) -> ChainResult<Self> {
        let http = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .build()
            .map_err(|e| ChainError::Unreachable(format!("cannot build HTTP client: {e}")))?;

        // A trailing slash keeps Url::join from eating the last path segment.
        let mut url = config.url;
        if !url.ends_with('/') {
            url.push('/');
        }
        let base_url =
            Url::parse(&url).map_err(|e| ChainError::InvalidInput(format!("observer URL: {e}")))?;

        let converter = AddressConverter::new(&network.address_hrp);

        Ok(Self {
            http,
            base_url,
            converter,
            offline: config.offline,
            network,
        })
    }

    fn url(&self, path: &str) -> ChainResult<Url> {
        self.base_url
            .join(path)
            .map_err(|e| ChainError::InvalidInput(format!("observer path {path}: {e}")))
    }

    /// GET a wrapped payload; `None` on HTTP 404.
    async fn get_optional<T: DeserializeOwned>(&self, path: &str) -> ChainResult<Option<T>> {
        let url = self.url(path)?;
        debug!(%url, "Observer request");

        let response = self
            .http
            .get(url)
            .send()
            .await
            .map_err(|e| ChainError::Unreachable(e.to_string()))?;

        if response.status() == reqwest::StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if !response.status().is_success() {
            return Err(ChainError::Unreachable(format!(
                "{path}: HTTP {}",
                response.status()
            )));
        }

        let envelope: ApiResponse<T> = response
            .json()
            .await
            .map_err(|e| ChainError::Unreachable(format!("{path}: {e}")))?;
        envelope.into_data().map(Some)
    }

    async fn get_required<T: DeserializeOwned>(&self, path: &str) -> ChainResult<T> {
        self.get_optional(path)
            .await?
            .ok_or_else(|| ChainError::InvalidInput(format!("{path}: not found")))
    }
}

#[async_trait]
impl NetworkProvider for ObserverClient {
    fn is_offline(&self) -> bool {
        self.offline
    }

    fn network_config(&self) -> &NetworkConfig {
        &self.network
    }

    fn convert_address_to_pubkey(&self, address: &str) -> Result<Vec<u8>, AddressError> {
        self.converter.decode(address)
    }

    fn convert_pubkey_to_address(&self, pubkey: &[u8]) -> Result<String, AddressError> {
        self.converter.encode(pubkey)
    }

    #[instrument(skip(self))]
    async fn get_block_by_nonce(&self, nonce: u64) -> ChainResult<Block> {
        let data: BlockData = self
            .get_optional(&format!("blocks/by-nonce/{nonce}?withTxs=true"))
            .await?
            .ok_or_else(|| ChainError::BlockNotFound(nonce.to_string()))?;
        data.block.into_model()
    }

    #[instrument(skip(self))]
    async fn get_block_by_hash(&self, hash: &str) -> ChainResult<Block> {
        let data: BlockData = self
            .get_optional(&format!("blocks/by-hash/{hash}?withTxs=true"))
            .await?
            .ok_or_else(|| ChainError::BlockNotFound(hash.to_string()))?;
        data.block.into_model()
    }

    async fn get_account(&self, address: &str) -> ChainResult<AccountOnBlock> {
        let data: AccountData = self.get_required(&format!("address/{address}")).await?;
        Ok(data.into_model())
    }

    async fn get_account_native_balance(&self, address: &str) -> ChainResult<AccountOnBlock> {
        self.get_account(address).await
    }

    async fn get_account_token_balance(
        &self,
        address: &str,
        token_identifier: &str,
    ) -> ChainResult<AccountTokenBalance> {
        let data: TokenBalanceData = self
            .get_required(&format!("address/{address}/esdt/{token_identifier}"))
            .await?;
        Ok(data.into_model())
    }

    /// The chain hashes the canonical JSON serialization of the signed
    /// transaction; reproduced locally so submissions can be echoed without
    /// a round-trip.
    async fn compute_transaction_hash(&self, tx: &SubmittableTransaction) -> ChainResult<String> {
        let serialized = serde_json::to_vec(tx)
            .map_err(|e| ChainError::InvalidInput(format!("cannot serialize transaction: {e}")))?;
        Ok(hex::encode(Sha256::digest(&serialized)))
    }

    #[instrument(skip(self, tx))]
    async fn send_transaction(&self, tx: &SubmittableTransaction) -> ChainResult<String> {
        if self.offline {
            return Err(ChainError::Offline);
        }

        let url = self.url("transaction/send")?;
        let response = self
            .http
            .post(url)
            .json(tx)
            .send()
            .await
            .map_err(|e| ChainError::Unreachable(e.to_string()))?;

        if !response.status().is_success() {
            return Err(ChainError::InvalidInput(format!(
                "transaction rejected: HTTP {}",
                response.status()
            )));
        }

        let envelope: ApiResponse<SendTransactionData> = response
            .json()
            .await
            .map_err(|e| ChainError::Unreachable(e.to_string()))?;

        record_transaction_submitted();
        Ok(envelope.into_data()?.tx_hash)
    }

    async fn get_mempool_transaction_by_hash(
        &self,
        hash: &str,
    ) -> ChainResult<Option<Transaction>> {
        let data: Option<MempoolTransactionData> = self
            .get_optional(&format!("transaction/pool?by-hash={hash}"))
            .await?;

        match data.and_then(|data| data.transaction) {
            Some(dto) => Ok(Some(dto.into_model()?)),
            None => Ok(None),
        }
    }

    async fn get_node_status(&self) -> ChainResult<NodeStatus> {
        let data: NodeStatusData = self.get_required("network/status").await?;
        Ok(data.status.into_model())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tessera_core::testkit::test_network_config;

    fn client() -> ObserverClient {
        ObserverClient::new(ObserverClientConfig::default(), test_network_config()).unwrap()
    }

    #[test]
    fn base_url_gains_a_trailing_slash() {
        let client = ObserverClient::new(
            ObserverClientConfig {
                url: "http://observer:8080/gateway".to_string(),
                ..Default::default()
            },
            test_network_config(),
        )
        .unwrap();

        let url = client.url("blocks/by-nonce/7?withTxs=true").unwrap();
        assert_eq!(
            url.as_str(),
            "http://observer:8080/gateway/blocks/by-nonce/7?withTxs=true"
        );
    }

    #[test]
    fn invalid_base_url_is_rejected() {
        let result = ObserverClient::new(
            ObserverClientConfig {
                url: "not a url".to_string(),
                ..Default::default()
            },
            test_network_config(),
        );
        assert!(matches!(result, Err(ChainError::InvalidInput(_))));
    }

    #[tokio::test]
    async fn transaction_hash_is_deterministic() {
        let client = client();
        let tx = SubmittableTransaction {
            nonce: 7,
            value: "1000".into(),
            sender: "alice".into(),
            receiver: "bob".into(),
            signature: "sig".into(),
            chain_id: "T".into(),
            version: 1,
            ..Default::default()
        };

        let first = client.compute_transaction_hash(&tx).await.unwrap();
        let second = client.compute_transaction_hash(&tx).await.unwrap();
        assert_eq!(first, second);
        assert_eq!(first.len(), 64);

        let mut other = tx.clone();
        other.nonce = 8;
        assert_ne!(first, client.compute_transaction_hash(&other).await.unwrap());
    }

    #[tokio::test]
    async fn offline_client_rejects_submission() {
        let client = ObserverClient::new(
            ObserverClientConfig {
                offline: true,
                ..Default::default()
            },
            test_network_config(),
        )
        .unwrap();

        let result = client
            .send_transaction(&SubmittableTransaction::default())
            .await;
        assert!(matches!(result, Err(ChainError::Offline)));
    }
}
