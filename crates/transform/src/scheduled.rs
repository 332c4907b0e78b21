//! Scheduled-miniblock reconciliation.
//!
//! The protocol defers the execution of some miniblocks to the next block:
//! a miniblock `Scheduled` in N produces its effects in N+1, where it shows
//! up again as `Processed`. Downstream stages must see each effect exactly
//! once, on the block where the protocol considers it final, so block N is
//! rewritten (on a local copy) using its two neighbors:
//!
//! 1. drop `Processed` miniblocks of N (their effects belong to N−1);
//! 2. adopt `Processed` miniblocks of N+1 (scheduled in N);
//! 3. replace N's invalid miniblocks with a single synthetic one, gathered
//!    from N and N+1 against the scheduled sets of N−1 and N;
//! 4. drop N's scheduled-not-final miniblocks (handled by steps 2-3).

use std::collections::HashSet;

use tessera_core::models::{Block, MiniBlock, MiniBlockProcessingType, MiniBlockType, Transaction};

use crate::window::BlockWindow;

/// Rewrite the window's current block into a self-contained one.
///
/// Identity when the window carries no neighbors (the block had only
/// `Normal` miniblocks, or is genesis).
pub fn reconcile(window: BlockWindow) -> Block {
    let (previous, next) = match (window.previous, window.next) {
        (Some(previous), Some(next)) => (previous, next),
        _ => return window.current,
    };

    let mut block = window.current;

    remove_processed_miniblocks(&mut block);

    let processed_in_next = find_processed_miniblocks(&next);
    block.miniblocks.extend(processed_in_next);

    let invalid_txs = gather_invalid_transactions(&previous, &block, &next);
    remove_invalid_miniblocks(&mut block);
    if !invalid_txs.is_empty() {
        block.miniblocks.push(MiniBlock {
            kind: MiniBlockType::InvalidBlock,
            transactions: invalid_txs,
            ..Default::default()
        });
    }

    remove_scheduled_not_final_miniblocks(&mut block);

    block
}

fn remove_processed_miniblocks(block: &mut Block) {
    block
        .miniblocks
        .retain(|miniblock| miniblock.processing_type != MiniBlockProcessingType::Processed);
}

fn remove_scheduled_not_final_miniblocks(block: &mut Block) {
    block
        .miniblocks
        .retain(|miniblock| !miniblock.is_scheduled_and_not_final());
}

fn remove_invalid_miniblocks(block: &mut Block) {
    block
        .miniblocks
        .retain(|miniblock| miniblock.kind != MiniBlockType::InvalidBlock);
}

fn find_processed_miniblocks(block: &Block) -> Vec<MiniBlock> {
    block
        .miniblocks
        .iter()
        .filter(|miniblock| miniblock.processing_type == MiniBlockProcessingType::Processed)
        .cloned()
        .collect()
}

/// The invalid transactions whose effects the protocol settles in this block.
///
/// Invalid transactions of N already accounted for by N−1's scheduled set
/// are discarded; invalid transactions of N+1 that were scheduled in N are
/// adopted. A block can legitimately hold two invalid miniblocks (one in the
/// block body, one in the receipts unit) with overlapping content, hence the
/// final dedup (by hash, first insertion wins).
fn gather_invalid_transactions(previous: &Block, block: &Block, next: &Block) -> Vec<Transaction> {
    let scheduled_in_previous = find_scheduled_transaction_hashes(previous);
    let mut invalid_txs: Vec<Transaction> = find_invalid_transactions(block)
        .into_iter()
        .filter(|tx| !scheduled_in_previous.contains(&tx.hash))
        .collect();

    let scheduled_in_block = find_scheduled_transaction_hashes(block);
    let invalid_in_next_scheduled_here = find_invalid_transactions(next)
        .into_iter()
        .filter(|tx| scheduled_in_block.contains(&tx.hash));
    invalid_txs.extend(invalid_in_next_scheduled_here);

    deduplicate_transactions(invalid_txs)
}

fn find_scheduled_transaction_hashes(block: &Block) -> HashSet<String> {
    block
        .miniblocks
        .iter()
        .filter(|miniblock| miniblock.is_scheduled_and_not_final())
        .flat_map(|miniblock| miniblock.transactions.iter())
        .map(|tx| tx.hash.clone())
        .collect()
}

fn find_invalid_transactions(block: &Block) -> Vec<Transaction> {
    block
        .miniblocks
        .iter()
        .filter(|miniblock| miniblock.kind == MiniBlockType::InvalidBlock)
        .flat_map(|miniblock| miniblock.transactions.iter())
        .cloned()
        .collect()
}

fn deduplicate_transactions(txs: Vec<Transaction>) -> Vec<Transaction> {
    let mut seen = HashSet::new();
    txs.into_iter()
        .filter(|tx| seen.insert(tx.hash.clone()))
        .collect()
}
