//! Typed log-event extraction.
//!
//! Transactions carry a log unit whose events encode balance movements the
//! transaction body does not: token transfers, mints and burns, internal
//! value transfers performed by contracts, and VM error signals. Parsers are
//! fail-fast: an event with fewer topics than its schema requires aborts the
//! whole transformation (silently skipping it would leave the emitted
//! operations inconsistent with the chain's state transition).

use std::sync::Arc;

use num_bigint::BigUint;

use tessera_core::error::{TransformError, TransformResult};
use tessera_core::models::{Event, Transaction};
use tessera_core::ports::NetworkProvider;

use crate::constants::{
    EVENT_ESDT_LOCAL_BURN, EVENT_ESDT_LOCAL_MINT, EVENT_ESDT_NFT_ADD_QUANTITY,
    EVENT_ESDT_NFT_BURN, EVENT_ESDT_NFT_CREATE, EVENT_ESDT_NFT_TRANSFER, EVENT_ESDT_TRANSFER,
    EVENT_ESDT_WIPE, EVENT_MULTI_ESDT_NFT_TRANSFER, EVENT_SC_DEPLOY, EVENT_SIGNAL_ERROR,
    EVENT_TOPIC_INVALID_META_TRANSACTION, EVENT_TOPIC_INVALID_META_TRANSACTION_NOT_ENOUGH_GAS,
    EVENT_TRANSFER_VALUE_ONLY, sending_value_to_non_payable_contract_data_prefix,
};

// =============================================================================
// Extracted records
// =============================================================================

/// A token balance movement extracted from one event.
///
/// `holder` is the account the event is attributed to; `receiver` is present
/// on transfer-shaped events only. `nonce_bytes` is empty for fungible
/// tokens.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenEventRecord {
    pub identifier: String,
    pub nonce_bytes: Vec<u8>,
    pub value: String,
    pub holder: String,
    pub receiver: Option<String>,
}

/// An internal native-value transfer performed by a contract.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransferValueOnlyRecord {
    pub sender: String,
    pub receiver: String,
    pub value: String,
}

// =============================================================================
// Extractor
// =============================================================================

/// Parses the typed events of a transaction into structured records.
pub struct EventExtractor {
    provider: Arc<dyn NetworkProvider>,
}

impl EventExtractor {
    pub fn new(provider: Arc<dyn NetworkProvider>) -> Self {
        Self { provider }
    }

    /// Whether any event signals a VM error.
    pub fn has_any_signal_error(&self, tx: &Transaction) -> bool {
        tx.events()
            .iter()
            .any(|event| event.identifier == EVENT_SIGNAL_ERROR)
    }

    /// Whether a `signalError` event marks value sent to a non-payable
    /// contract (recognized by its hex-encoded data prefix).
    pub fn has_signal_error_of_sending_value_to_non_payable_contract(
        &self,
        tx: &Transaction,
    ) -> bool {
        let prefix = sending_value_to_non_payable_contract_data_prefix();
        self.find_many_events_by_identifier(tx, EVENT_SIGNAL_ERROR)
            .iter()
            .any(|(_, event)| {
                std::str::from_utf8(&event.data)
                    .map(|data| data.starts_with(&prefix))
                    .unwrap_or(false)
            })
    }

    /// Whether a `signalError` event marks a rejected meta-transaction.
    pub fn has_signal_error_of_meta_transaction_is_invalid(&self, tx: &Transaction) -> bool {
        self.find_many_events_by_identifier(tx, EVENT_SIGNAL_ERROR)
            .iter()
            .any(|(_, event)| {
                event_has_topic(event, EVENT_TOPIC_INVALID_META_TRANSACTION)
                    || event_has_topic(event, EVENT_TOPIC_INVALID_META_TRANSACTION_NOT_ENOUGH_GAS)
            })
    }

    /// Whether the transaction deployed a contract successfully.
    pub fn has_sc_deploy(&self, tx: &Transaction) -> bool {
        tx.events()
            .iter()
            .any(|event| event.identifier == EVENT_SC_DEPLOY)
    }

    /// All events matching `identifier`, with their index in the log.
    pub fn find_many_events_by_identifier<'a>(
        &self,
        tx: &'a Transaction,
        identifier: &str,
    ) -> Vec<(usize, &'a Event)> {
        tx.events()
            .iter()
            .enumerate()
            .filter(|(_, event)| event.identifier == identifier)
            .collect()
    }

    /// Fungible token transfers: topics `[token, "", value, receiver]`.
    pub fn extract_token_transfers(&self, tx: &Transaction) -> TransformResult<Vec<TokenEventRecord>> {
        self.extract_transfer_shaped(tx, EVENT_ESDT_TRANSFER)
    }

    /// Single NFT transfers: topics `[token, nonce, value, receiver]`.
    pub fn extract_nft_transfers(&self, tx: &Transaction) -> TransformResult<Vec<TokenEventRecord>> {
        self.extract_transfer_shaped(tx, EVENT_ESDT_NFT_TRANSFER)
    }

    fn extract_transfer_shaped(
        &self,
        tx: &Transaction,
        identifier: &str,
    ) -> TransformResult<Vec<TokenEventRecord>> {
        let mut records = Vec::new();

        for (event_index, event) in self.find_many_events_by_identifier(tx, identifier) {
            if event.topics.len() < 4 {
                return Err(topics_error(tx, event_index, 4, event.topics.len()));
            }

            let receiver = self.pubkey_topic_to_address(tx, event_index, &event.topics[3])?;
            records.push(TokenEventRecord {
                identifier: topic_to_string(&event.topics[0]),
                nonce_bytes: event.topics[1].clone(),
                value: topic_to_decimal(&event.topics[2]),
                holder: event.address.clone(),
                receiver: Some(receiver),
            });
        }

        Ok(records)
    }

    /// Batched transfers: repeated `(token, nonce, value)` triples, then the
    /// receiver as the last topic. Trailing unknown topics are tolerated.
    pub fn extract_multi_transfers(&self, tx: &Transaction) -> TransformResult<Vec<TokenEventRecord>> {
        let mut records = Vec::new();

        for (event_index, event) in
            self.find_many_events_by_identifier(tx, EVENT_MULTI_ESDT_NFT_TRANSFER)
        {
            if event.topics.len() < 4 {
                return Err(topics_error(tx, event_index, 4, event.topics.len()));
            }

            let receiver_topic = &event.topics[event.topics.len() - 1];
            let receiver = self.pubkey_topic_to_address(tx, event_index, receiver_topic)?;

            let num_triples = (event.topics.len() - 1) / 3;
            for triple in event.topics[..num_triples * 3].chunks_exact(3) {
                records.push(TokenEventRecord {
                    identifier: topic_to_string(&triple[0]),
                    nonce_bytes: triple[1].clone(),
                    value: topic_to_decimal(&triple[2]),
                    holder: event.address.clone(),
                    receiver: Some(receiver.clone()),
                });
            }
        }

        Ok(records)
    }

    /// NFT creations: topics `[token, nonce, value, ...]`; the creator is the
    /// event's address.
    pub fn extract_nft_creates(&self, tx: &Transaction) -> TransformResult<Vec<TokenEventRecord>> {
        self.extract_quantity_shaped(tx, EVENT_ESDT_NFT_CREATE)
    }

    /// NFT burns: topics `[token, nonce, value]`.
    pub fn extract_nft_burns(&self, tx: &Transaction) -> TransformResult<Vec<TokenEventRecord>> {
        self.extract_quantity_shaped(tx, EVENT_ESDT_NFT_BURN)
    }

    /// NFT quantity additions: topics `[token, nonce, value]`.
    pub fn extract_nft_add_quantities(
        &self,
        tx: &Transaction,
    ) -> TransformResult<Vec<TokenEventRecord>> {
        self.extract_quantity_shaped(tx, EVENT_ESDT_NFT_ADD_QUANTITY)
    }

    /// Local burns: topics `[token, "", value]`.
    pub fn extract_local_burns(&self, tx: &Transaction) -> TransformResult<Vec<TokenEventRecord>> {
        self.extract_quantity_shaped(tx, EVENT_ESDT_LOCAL_BURN)
    }

    /// Local mints: topics `[token, "", value]`.
    pub fn extract_local_mints(&self, tx: &Transaction) -> TransformResult<Vec<TokenEventRecord>> {
        self.extract_quantity_shaped(tx, EVENT_ESDT_LOCAL_MINT)
    }

    /// Administrative wipes: topics `[token, "", value]`.
    pub fn extract_wipes(&self, tx: &Transaction) -> TransformResult<Vec<TokenEventRecord>> {
        self.extract_quantity_shaped(tx, EVENT_ESDT_WIPE)
    }

    fn extract_quantity_shaped(
        &self,
        tx: &Transaction,
        identifier: &str,
    ) -> TransformResult<Vec<TokenEventRecord>> {
        let mut records = Vec::new();

        for (event_index, event) in self.find_many_events_by_identifier(tx, identifier) {
            if event.topics.len() < 3 {
                return Err(topics_error(tx, event_index, 3, event.topics.len()));
            }

            records.push(TokenEventRecord {
                identifier: topic_to_string(&event.topics[0]),
                nonce_bytes: event.topics[1].clone(),
                value: topic_to_decimal(&event.topics[2]),
                holder: event.address.clone(),
                receiver: None,
            });
        }

        Ok(records)
    }

    /// Internal value transfers from contracts: topics `[value, receiver]`.
    pub fn extract_transfer_value_only(
        &self,
        tx: &Transaction,
    ) -> TransformResult<Vec<TransferValueOnlyRecord>> {
        let mut records = Vec::new();

        for (event_index, event) in
            self.find_many_events_by_identifier(tx, EVENT_TRANSFER_VALUE_ONLY)
        {
            if event.topics.len() < 2 {
                return Err(topics_error(tx, event_index, 2, event.topics.len()));
            }

            let receiver = self.pubkey_topic_to_address(tx, event_index, &event.topics[1])?;
            records.push(TransferValueOnlyRecord {
                sender: event.address.clone(),
                receiver,
                value: topic_to_decimal(&event.topics[0]),
            });
        }

        Ok(records)
    }

    fn pubkey_topic_to_address(
        &self,
        tx: &Transaction,
        event_index: usize,
        topic: &[u8],
    ) -> TransformResult<String> {
        self.provider
            .convert_pubkey_to_address(topic)
            .map_err(|e| TransformError::EventParse {
                tx_hash: tx.hash.clone(),
                event_index,
                reason: format!("receiver topic is not a public key: {e}"),
            })
    }
}

/// Topics holding numeric values are big-endian unsigned integers.
fn topic_to_decimal(topic: &[u8]) -> String {
    BigUint::from_bytes_be(topic).to_string()
}

fn topic_to_string(topic: &[u8]) -> String {
    String::from_utf8_lossy(topic).to_string()
}

fn event_has_topic(event: &Event, topic: &str) -> bool {
    event.topics.iter().any(|held| held == topic.as_bytes())
}

fn topics_error(
    tx: &Transaction,
    event_index: usize,
    expected: usize,
    found: usize,
) -> TransformError {
    TransformError::EventParse {
        tx_hash: tx.hash.clone(),
        event_index,
        reason: format!("expected at least {expected} topics, found {found}"),
    }
}
