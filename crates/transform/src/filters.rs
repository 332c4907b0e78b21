//! Pre-transform filters.
//!
//! Applied on the flattened transaction list of a reconciled block, before
//! synthesis. Each filter removes records the chain never settled (or that
//! would be double-counted), so invariant holds: every balance delta is
//! represented exactly once.

use std::collections::HashSet;

use tessera_core::addresses::is_smart_contract_pubkey;
use tessera_core::error::TransformResult;
use tessera_core::models::{Transaction, TransactionType};
use tessera_core::ports::NetworkProvider;

/// Hashes of transactions the block holds under the `invalid` native type.
pub fn invalid_transaction_hashes(txs: &[Transaction]) -> HashSet<String> {
    txs.iter()
        .filter(|tx| tx.kind == TransactionType::Invalid)
        .map(|tx| tx.hash.clone())
        .collect()
}

/// Drop intrashard contract results whose originating transaction sits in an
/// invalid miniblock of the same block: the chain never settled them.
pub fn filter_out_intrashard_contract_results_of_invalid_transactions(
    txs: Vec<Transaction>,
    invalid_hashes: &HashSet<String>,
) -> Vec<Transaction> {
    txs.into_iter()
        .filter(|tx| {
            !(tx.kind == TransactionType::Unsigned
                && tx.is_intrashard()
                && invalid_hashes.contains(&tx.original_transaction_hash))
        })
        .collect()
}

/// Drop intrashard relayed transactions already held in an invalid miniblock
/// of the same block (the invalid copy is the one that carries the fee).
pub fn filter_out_intrashard_relayed_transactions_held_in_invalid_miniblock(
    txs: Vec<Transaction>,
    invalid_hashes: &HashSet<String>,
) -> Vec<Transaction> {
    txs.into_iter()
        .filter(|tx| {
            !(tx.kind == TransactionType::Normal
                && tx.is_relayed()
                && tx.is_intrashard()
                && invalid_hashes.contains(&tx.hash))
        })
        .collect()
}

/// Drop contract results with no value: they carry no balance effect.
pub fn filter_out_contract_results_with_no_value(txs: Vec<Transaction>) -> Vec<Transaction> {
    txs.into_iter()
        .filter(|tx| !(tx.kind == TransactionType::Unsigned && tx.value == "0"))
        .collect()
}

/// Drop contract results carrying data between a contract and itself: pure
/// internal movement, no external delta.
pub fn filter_out_contract_results_with_contract_sender_same_as_receiver(
    provider: &dyn NetworkProvider,
    txs: Vec<Transaction>,
) -> TransformResult<Vec<Transaction>> {
    let mut kept = Vec::with_capacity(txs.len());

    for tx in txs {
        let is_self_call_carrier = tx.kind == TransactionType::Unsigned
            && !tx.data.is_empty()
            && tx.sender == tx.receiver;

        if is_self_call_carrier {
            let sender_pubkey = provider.convert_address_to_pubkey(&tx.sender)?;
            if is_smart_contract_pubkey(&sender_pubkey) {
                continue;
            }
        }

        kept.push(tx);
    }

    Ok(kept)
}
