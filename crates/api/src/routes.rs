//! Rosetta endpoint handlers.

use axum::Json;
use axum::extract::State;
use serde::{Deserialize, Serialize};
use tracing::instrument;

use tessera_core::canonical::{
    AccountIdentifier, Amount, BlockIdentifier, CanonicalBlock, CanonicalTransaction, Currency,
    TransactionIdentifier,
};
use tessera_core::models::SubmittableTransaction;

use crate::error::ApiError;
use crate::server::AppState;

// =============================================================================
// Request / response shapes
// =============================================================================

#[derive(Debug, Default, Deserialize)]
pub struct NetworkRequest {}

#[derive(Debug, Serialize)]
pub struct NetworkStatusResponse {
    pub current_block_identifier: BlockIdentifier,
    pub current_block_timestamp: u64,
    pub genesis_block_identifier: BlockIdentifier,
    pub oldest_block_identifier: BlockIdentifier,
    pub sync_status: SyncStatus,
}

#[derive(Debug, Serialize)]
pub struct SyncStatus {
    pub synced: bool,
}

/// Either coordinate may be given; index wins when both are present.
#[derive(Debug, Default, Deserialize)]
pub struct PartialBlockIdentifier {
    pub index: Option<u64>,
    pub hash: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct BlockRequest {
    #[serde(default)]
    pub block_identifier: PartialBlockIdentifier,
}

#[derive(Debug, Serialize)]
pub struct BlockResponse {
    pub block: CanonicalBlock,
}

#[derive(Debug, Deserialize)]
pub struct AccountBalanceRequest {
    pub account_identifier: AccountIdentifier,
    /// When given, balances are restricted to these currencies; custom
    /// currencies are read per token, the native one from the account.
    #[serde(default)]
    pub currencies: Vec<Currency>,
}

#[derive(Debug, Serialize)]
pub struct AccountBalanceResponse {
    pub block_identifier: BlockIdentifier,
    pub balances: Vec<Amount>,
}

#[derive(Debug, Deserialize)]
pub struct MempoolTransactionRequest {
    pub transaction_identifier: TransactionIdentifier,
}

#[derive(Debug, Serialize)]
pub struct MempoolTransactionResponse {
    pub transaction: CanonicalTransaction,
}

#[derive(Debug, Deserialize)]
pub struct ConstructionSubmitRequest {
    /// JSON-serialized signed transaction.
    pub signed_transaction: String,
}

#[derive(Debug, Serialize)]
pub struct TransactionIdentifierResponse {
    pub transaction_identifier: TransactionIdentifier,
}

// =============================================================================
// Handlers
// =============================================================================

#[instrument(skip_all)]
pub async fn network_status(
    State(state): State<AppState>,
    Json(_request): Json<NetworkRequest>,
) -> Result<Json<NetworkStatusResponse>, ApiError> {
    let status = state.provider.get_node_status().await?;
    let config = state.provider.network_config();

    Ok(Json(NetworkStatusResponse {
        current_block_identifier: BlockIdentifier {
            index: status.latest_block.nonce,
            hash: status.latest_block.hash.clone(),
        },
        current_block_timestamp: status.latest_block.timestamp * 1000,
        genesis_block_identifier: BlockIdentifier {
            index: 0,
            hash: config.genesis_block_hash.clone(),
        },
        oldest_block_identifier: BlockIdentifier {
            index: status.oldest_block_with_historical_state.nonce,
            hash: status.oldest_block_with_historical_state.hash.clone(),
        },
        sync_status: SyncStatus {
            synced: status.synced,
        },
    }))
}

#[instrument(skip_all)]
pub async fn block(
    State(state): State<AppState>,
    Json(request): Json<BlockRequest>,
) -> Result<Json<BlockResponse>, ApiError> {
    let block = match (request.block_identifier.index, &request.block_identifier.hash) {
        (Some(index), _) => state.blocks.transform_block_by_nonce(index).await?,
        (None, Some(hash)) => state.blocks.transform_block_by_hash(hash).await?,
        (None, None) => {
            return Err(ApiError::invalid_input(
                "block_identifier requires an index or a hash",
            ));
        }
    };

    Ok(Json(BlockResponse { block }))
}

#[instrument(skip_all)]
pub async fn account_balance(
    State(state): State<AppState>,
    Json(request): Json<AccountBalanceRequest>,
) -> Result<Json<AccountBalanceResponse>, ApiError> {
    let address = &request.account_identifier.address;
    let native = state.provider.native_currency();

    let mut requested = request.currencies;
    if requested.is_empty() {
        requested.push(native.clone());
    }

    let account = state.provider.get_account_native_balance(address).await?;
    let coordinates = account.block_coordinates;

    let mut balances = Vec::with_capacity(requested.len());
    for currency in requested {
        if currency.symbol == native.symbol {
            balances.push(Amount {
                value: account.account.balance.clone(),
                currency: native.clone(),
            });
        } else {
            let currency = state
                .provider
                .custom_currency(&currency.symbol)
                .ok_or_else(|| {
                    ApiError::invalid_input(format!("unknown currency: {}", currency.symbol))
                })?;
            let token = state
                .provider
                .get_account_token_balance(address, &currency.symbol)
                .await?;
            balances.push(Amount {
                value: token.balance,
                currency,
            });
        }
    }

    Ok(Json(AccountBalanceResponse {
        block_identifier: BlockIdentifier {
            index: coordinates.nonce,
            hash: coordinates.hash,
        },
        balances,
    }))
}

#[instrument(skip_all)]
pub async fn mempool_transaction(
    State(state): State<AppState>,
    Json(request): Json<MempoolTransactionRequest>,
) -> Result<Json<MempoolTransactionResponse>, ApiError> {
    let hash = &request.transaction_identifier.hash;

    let transaction = state
        .mempool
        .transform_transaction_by_hash(hash)
        .await?
        .ok_or_else(|| ApiError::transaction_not_found(hash))?;

    Ok(Json(MempoolTransactionResponse { transaction }))
}

#[instrument(skip_all)]
pub async fn construction_submit(
    State(state): State<AppState>,
    Json(request): Json<ConstructionSubmitRequest>,
) -> Result<Json<TransactionIdentifierResponse>, ApiError> {
    let tx: SubmittableTransaction = serde_json::from_str(&request.signed_transaction)
        .map_err(|e| ApiError::invalid_input(format!("malformed signed transaction: {e}")))?;

    let hash = state.provider.send_transaction(&tx).await?;

    Ok(Json(TransactionIdentifierResponse {
        transaction_identifier: TransactionIdentifier { hash },
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use tessera_core::models::{BlockSummary, NodeStatus};
    use tessera_core::testkit::NetworkProviderMock;

    fn state_with(provider: NetworkProviderMock) -> AppState {
        AppState::new(Arc::new(provider))
    }

    #[tokio::test]
    async fn block_request_requires_a_coordinate() {
        let state = state_with(NetworkProviderMock::default());
        let result = block(State(state), Json(BlockRequest::default())).await;

        let err = result.err().unwrap();
        assert_eq!(err.code, crate::error::codes::INVALID_INPUT);
    }

    #[tokio::test]
    async fn missing_block_maps_to_the_block_not_found_code() {
        let state = state_with(NetworkProviderMock::default());
        let request = BlockRequest {
            block_identifier: PartialBlockIdentifier {
                index: Some(42),
                hash: None,
            },
        };

        let err = block(State(state), Json(request)).await.err().unwrap();
        assert_eq!(err.code, crate::error::codes::BLOCK_NOT_FOUND);
        assert!(!err.retriable);
    }

    #[tokio::test]
    async fn account_balance_reads_native_and_token_balances() {
        use tessera_core::models::{Account, AccountOnBlock, AccountTokenBalance, BlockCoordinates};
        use tessera_core::testkit::TEST_ADDRESS_ALICE;

        let mut provider = NetworkProviderMock::default();
        provider.config.custom_currencies.push(Currency {
            symbol: "TOK-abcdef".into(),
            decimals: 6,
        });
        provider.accounts_by_address.insert(
            TEST_ADDRESS_ALICE.to_string(),
            AccountOnBlock {
                account: Account {
                    address: TEST_ADDRESS_ALICE.into(),
                    nonce: 3,
                    balance: "12345".into(),
                },
                block_coordinates: BlockCoordinates {
                    nonce: 7,
                    hash: "aa".into(),
                    root_hash: "bb".into(),
                },
            },
        );
        provider.token_balances.insert(
            (TEST_ADDRESS_ALICE.to_string(), "TOK-abcdef".to_string()),
            AccountTokenBalance {
                balance: "900".into(),
                block_coordinates: BlockCoordinates::default(),
            },
        );

        let state = state_with(provider);
        let request = AccountBalanceRequest {
            account_identifier: AccountIdentifier {
                address: TEST_ADDRESS_ALICE.into(),
            },
            currencies: vec![
                Currency {
                    symbol: "XeGLD".into(),
                    decimals: 18,
                },
                Currency {
                    symbol: "TOK-abcdef".into(),
                    decimals: 6,
                },
            ],
        };

        let response = account_balance(State(state), Json(request)).await.unwrap();
        assert_eq!(response.0.block_identifier.index, 7);
        assert_eq!(response.0.balances.len(), 2);
        assert_eq!(response.0.balances[0].value, "12345");
        assert_eq!(response.0.balances[1].value, "900");
        assert_eq!(response.0.balances[1].currency.decimals, 6);
    }

    #[tokio::test]
    async fn absent_mempool_transaction_is_a_client_error() {
        let state = state_with(NetworkProviderMock::default());
        let request = MempoolTransactionRequest {
            transaction_identifier: TransactionIdentifier { hash: "aa".into() },
        };

        let err = mempool_transaction(State(state), Json(request))
            .await
            .err()
            .unwrap();
        assert_eq!(err.code, crate::error::codes::TRANSACTION_NOT_FOUND);
    }

    #[tokio::test]
    async fn network_status_reports_chain_coordinates_in_milliseconds() {
        let mut provider = NetworkProviderMock::default();
        provider.node_status = NodeStatus {
            synced: true,
            latest_block: BlockSummary {
                nonce: 7,
                hash: "aa".into(),
                previous_block_hash: "bb".into(),
                timestamp: 1_596_117_700,
            },
            ..Default::default()
        };

        let response = network_status(State(state_with(provider)), Json(NetworkRequest::default()))
            .await
            .unwrap();

        assert_eq!(response.0.current_block_identifier.index, 7);
        assert_eq!(response.0.current_block_timestamp, 1_596_117_700_000);
        assert!(response.0.sync_status.synced);
    }

    #[tokio::test]
    async fn malformed_submission_is_rejected_before_the_observer() {
        let state = state_with(NetworkProviderMock::default());
        let request = ConstructionSubmitRequest {
            signed_transaction: "not json".into(),
        };

        let err = construction_submit(State(state), Json(request))
            .await
            .err()
            .unwrap();
        assert_eq!(err.code, crate::error::codes::INVALID_INPUT);
    }

    #[tokio::test]
    async fn offline_submission_maps_to_the_offline_code() {
        let mut provider = NetworkProviderMock::default();
        provider.offline = true;
        let state = state_with(provider);

        let request = ConstructionSubmitRequest {
            signed_transaction: serde_json::to_string(&SubmittableTransaction::default()).unwrap(),
        };

        let err = construction_submit(State(state), Json(request))
            .await
            .err()
            .unwrap();
        assert_eq!(err.code, crate::error::codes::OFFLINE_MODE);
    }
}
