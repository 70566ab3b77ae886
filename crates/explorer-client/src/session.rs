//! A browsing session: one feed, one scroll controller, one client.

use explorer_core::{BlockEntity, BlockFeedStore, FeedChange, LoadState, ScrollLoadController};
use tokio::sync::{broadcast, Mutex};
use tracing::{debug, info, warn};

use crate::client::ExplorerClient;
use crate::error::ExplorerError;

const CHANGE_CHANNEL_CAPACITY: usize = 64;

/// How a "load older" attempt ended, short of an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadOutcome {
    /// A page was appended below the previous oldest block.
    Appended { count: usize, oldest: u64 },
    /// The feed is empty, there is nothing to page from.
    NothingToLoad,
    /// The oldest block is genesis, there is nothing older.
    EndOfHistory,
    /// A refresh replaced the feed while the page was in flight; the page was dropped.
    Stale { discarded: usize },
    /// The page held nothing below the current oldest block; it was dropped.
    NoProgress { received: usize },
}

/// Owns the feed of one browsing session.
///
/// Refreshes and scroll-driven loads may overlap; scroll-driven loads never
/// overlap each other.
pub struct FeedSession {
    client: ExplorerClient,
    store: Mutex<BlockFeedStore>,
    controller: Mutex<ScrollLoadController>,
    changes: broadcast::Sender<FeedChange>,
}

impl std::fmt::Debug for FeedSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FeedSession")
            .field("client", &self.client)
            .finish_non_exhaustive()
    }
}

impl FeedSession {
    pub fn new(client: ExplorerClient, visible_threshold: usize) -> Self {
        let (changes, _) = broadcast::channel(CHANGE_CHANNEL_CAPACITY);
        let mut store = BlockFeedStore::new();
        let sender = changes.clone();
        store.subscribe(move |change| {
            // no receivers is fine
            let _ = sender.send(*change);
        });

        Self {
            client,
            store: Mutex::new(store),
            controller: Mutex::new(ScrollLoadController::new(visible_threshold)),
            changes,
        }
    }

    pub fn client(&self) -> &ExplorerClient {
        &self.client
    }

    /// Feed changes, one per effective merge.
    pub fn changes(&self) -> broadcast::Receiver<FeedChange> {
        self.changes.subscribe()
    }

    /// Load the newest page and make it the whole feed. Not gated by the scroll
    /// controller. Returns the page size.
    pub async fn refresh(&self) -> Result<usize, ExplorerError> {
        let blocks = self
            .client
            .list_blocks(None)
            .await
            .inspect_err(|e| warn!(error = %e, "refresh failed"))?;
        let count = blocks.len();
        let newest = blocks.first().map(BlockEntity::height);
        self.store.lock().await.merge(blocks, true);
        info!(count, newest, "feed refreshed");
        Ok(count)
    }

    /// Fetch the page just below the oldest block and append it.
    pub async fn load_older(&self) -> Result<LoadOutcome, ExplorerError> {
        let (oldest_height, generation) = {
            let store = self.store.lock().await;
            match store.oldest() {
                None => return Ok(LoadOutcome::NothingToLoad),
                Some(oldest) if oldest.is_genesis() => return Ok(LoadOutcome::EndOfHistory),
                Some(oldest) => (oldest.height(), store.generation()),
            }
        };
        // heights come from non-negative i64 records
        let start_height = oldest_height as i64 - 1;

        let blocks = self.client.list_blocks(Some(start_height)).await?;

        let mut store = self.store.lock().await;
        if store.generation() != generation {
            warn!(
                start_height,
                discarded = blocks.len(),
                "feed was refreshed while loading, dropping page"
            );
            return Ok(LoadOutcome::Stale {
                discarded: blocks.len(),
            });
        }
        // an indexer that ignores the start height would otherwise re-trigger forever
        let extends_feed = blocks
            .iter()
            .any(|b| b.height() < oldest_height && !store.contains(b.hash()));
        if !extends_feed {
            warn!(
                start_height,
                received = blocks.len(),
                "page has no blocks below the feed, dropping it"
            );
            return Ok(LoadOutcome::NoProgress {
                received: blocks.len(),
            });
        }
        let count = blocks.len();
        store.merge(blocks, false);
        let oldest = store.oldest().map_or(0, BlockEntity::height);
        debug!(count, oldest, "older page appended");
        Ok(LoadOutcome::Appended { count, oldest })
    }

    /// Forward a scroll update. Every load it triggers runs to completion before
    /// this returns; completions that still leave the reader near the bottom chain
    /// straight into the next load.
    pub async fn position_changed(
        &self,
        visible_count: usize,
        total_count: usize,
        last_visible_index: usize,
    ) -> Vec<Result<LoadOutcome, ExplorerError>> {
        let mut ticket = self.controller.lock().await.position_changed(
            visible_count,
            total_count,
            last_visible_index,
        );

        let mut outcomes = Vec::new();
        while let Some(current) = ticket.take() {
            let result = self.load_older().await;
            let total = self.store.lock().await.count();

            let mut controller = self.controller.lock().await;
            ticket = match &result {
                Ok(LoadOutcome::Appended { .. }) => {
                    controller.record_total_count(total);
                    controller.request_completed(current)
                }
                Ok(outcome) => {
                    debug!(?outcome, "load finished without new blocks");
                    controller.request_abandoned(current);
                    None
                }
                Err(e) => {
                    warn!(error = %e, "load older failed");
                    controller.request_abandoned(current);
                    None
                }
            };
            outcomes.push(result);
        }
        outcomes
    }

    /// Look up a single block without touching the feed.
    pub async fn jump_to_height(&self, height: i64) -> Result<BlockEntity, ExplorerError> {
        self.client
            .get_block_by_height(height)
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| ExplorerError::EmptyResult(format!("block-height/{height}")))
    }

    pub async fn load_state(&self) -> LoadState {
        self.controller.lock().await.state()
    }

    pub async fn len(&self) -> usize {
        self.store.lock().await.count()
    }

    pub async fn is_empty(&self) -> bool {
        self.store.lock().await.is_empty()
    }

    /// Block at a feed position.
    pub async fn block_at(&self, index: usize) -> Option<BlockEntity> {
        self.store.lock().await.get(index).cloned()
    }

    pub async fn oldest(&self) -> Option<BlockEntity> {
        self.store.lock().await.oldest().cloned()
    }

    /// Copy of the feed, newest first.
    pub async fn snapshot(&self) -> Vec<BlockEntity> {
        self.store.lock().await.blocks().to_vec()
    }
}
