//! Three-block window fetching.
//!
//! Scheduled-miniblock reconciliation needs exactly one neighbor on each
//! side of the requested block: effects the protocol defers between blocks
//! surface in N−1 and N+1. A bigger window is unnecessary, a smaller one is
//! insufficient. When the requested block carries only `Normal` miniblocks,
//! the neighbors are not fetched at all - the reconciler would be the
//! identity.

use std::sync::Arc;

use tracing::{debug, instrument};

use tessera_core::error::TransformResult;
use tessera_core::models::Block;
use tessera_core::ports::NetworkProvider;

/// The (N−1, N, N+1) window. Neighbors are absent when block N is already
/// self-contained.
#[derive(Debug, Clone)]
pub struct BlockWindow {
    pub previous: Option<Block>,
    pub current: Block,
    pub next: Option<Block>,
}

impl BlockWindow {
    /// A window that needs no reconciliation.
    pub fn self_contained(block: Block) -> Self {
        Self {
            previous: None,
            current: block,
            next: None,
        }
    }
}

/// Fetches the block window from the observer.
pub struct BlockWindowFetcher {
    provider: Arc<dyn NetworkProvider>,
}

impl BlockWindowFetcher {
    pub fn new(provider: Arc<dyn NetworkProvider>) -> Self {
        Self { provider }
    }

    /// Fetch the window around the block at `nonce`.
    ///
    /// Any fetch failure is fatal to the request; the caller is assumed to
    /// have checked that `nonce` is at most the latest final block.
    #[instrument(skip(self))]
    pub async fn fetch_by_nonce(&self, nonce: u64) -> TransformResult<BlockWindow> {
        let block = self.provider.get_block_by_nonce(nonce).await?;
        self.fetch_neighbors_of(block).await
    }

    /// Fetch the window around an already-fetched block.
    pub async fn fetch_neighbors_of(&self, block: Block) -> TransformResult<BlockWindow> {
        // Genesis carries no scheduling artifacts and has no left neighbor.
        if block.nonce == 0 || block.has_only_normal_miniblocks() {
            return Ok(BlockWindow::self_contained(block));
        }

        debug!(nonce = block.nonce, "Fetching window neighbors");

        let (previous, next) = tokio::try_join!(
            self.provider.get_block_by_nonce(block.nonce - 1),
            self.provider.get_block_by_nonce(block.nonce + 1),
        )?;

        Ok(BlockWindow {
            previous: Some(previous),
            current: block,
            next: Some(next),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tessera_core::error::TransformError;
    use tessera_core::models::{MiniBlock, MiniBlockProcessingType};
    use tessera_core::testkit::NetworkProviderMock;

    fn block(nonce: u64, hash: &str) -> Block {
        Block {
            nonce,
            hash: hash.to_string(),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn self_contained_block_skips_neighbor_fetches() {
        // Seul le bloc N est présent chez l'observer: si les voisins étaient
        // récupérés, l'appel échouerait
        let provider = NetworkProviderMock::default().with_block(block(7, "aa"));
        let fetcher = BlockWindowFetcher::new(Arc::new(provider));

        let window = fetcher.fetch_by_nonce(7).await.unwrap();
        assert!(window.previous.is_none());
        assert!(window.next.is_none());
        assert_eq!(window.current.hash, "aa");
    }

    #[tokio::test]
    async fn scheduled_artifacts_pull_both_neighbors() {
        let mut scheduled_block = block(7, "bb");
        scheduled_block.miniblocks.push(MiniBlock {
            processing_type: MiniBlockProcessingType::Scheduled,
            ..Default::default()
        });

        let provider = NetworkProviderMock::default()
            .with_block(block(6, "aa"))
            .with_block(scheduled_block)
            .with_block(block(8, "cc"));
        let fetcher = BlockWindowFetcher::new(Arc::new(provider));

        let window = fetcher.fetch_by_nonce(7).await.unwrap();
        assert_eq!(window.previous.unwrap().hash, "aa");
        assert_eq!(window.next.unwrap().hash, "cc");
    }

    #[tokio::test]
    async fn missing_neighbor_is_fatal() {
        let mut scheduled_block = block(7, "bb");
        scheduled_block.miniblocks.push(MiniBlock {
            processing_type: MiniBlockProcessingType::Processed,
            ..Default::default()
        });

        // N+1 absent
        let provider = NetworkProviderMock::default()
            .with_block(block(6, "aa"))
            .with_block(scheduled_block);
        let fetcher = BlockWindowFetcher::new(Arc::new(provider));

        let result = fetcher.fetch_by_nonce(7).await;
        assert!(matches!(result, Err(TransformError::Chain(_))));
    }
}
