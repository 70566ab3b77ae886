//! The block feed: height-descending, deduplicated by block hash.

use std::collections::HashSet;
use std::fmt;

use tracing::debug;

use crate::{BlockEntity, BlockHash};

/// Emitted once after every merge that changed the feed.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FeedChange {
    /// Counts merges since the store was created.
    pub revision: u64,
    /// Bumped by every replacing merge.
    pub generation: u64,
    pub len: usize,
    pub replaced: bool,
}

type Listener = Box<dyn FnMut(&FeedChange) + Send>;

/// Ordered set of blocks, newest first.
#[derive(Default)]
pub struct BlockFeedStore {
    blocks: Vec<BlockEntity>,
    revision: u64,
    generation: u64,
    listeners: Vec<Listener>,
}

impl BlockFeedStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Merge a page into the feed.
    ///
    /// Entries already present under an incoming hash are dropped first. With
    /// `replace_all` the page becomes the whole feed (a fresh tip); otherwise it is
    /// appended after the current oldest block. An empty page is a no-op and
    /// notifies nobody.
    pub fn merge(&mut self, incoming: Vec<BlockEntity>, replace_all: bool) {
        if incoming.is_empty() {
            return;
        }

        let mut seen: HashSet<BlockHash> = HashSet::with_capacity(incoming.len());
        let incoming: Vec<BlockEntity> = incoming
            .into_iter()
            .filter(|b| seen.insert(*b.hash()))
            .collect();

        if replace_all {
            self.blocks = incoming;
            self.generation += 1;
        } else {
            self.blocks.retain(|b| !seen.contains(b.hash()));
            self.blocks.extend(incoming);
        }
        self.revision += 1;

        let change = FeedChange {
            revision: self.revision,
            generation: self.generation,
            len: self.blocks.len(),
            replaced: replace_all,
        };
        debug!(
            revision = change.revision,
            len = change.len,
            replaced = change.replaced,
            "feed merged"
        );
        for listener in &mut self.listeners {
            listener(&change);
        }
    }

    /// Register a listener called synchronously after each effective merge.
    pub fn subscribe(&mut self, listener: impl FnMut(&FeedChange) + Send + 'static) {
        self.listeners.push(Box::new(listener));
    }

    /// Lowest-height block, the point older pages continue from.
    pub fn oldest(&self) -> Option<&BlockEntity> {
        self.blocks.last()
    }

    pub fn newest(&self) -> Option<&BlockEntity> {
        self.blocks.first()
    }

    /// Block at a feed position, as selected by a reader.
    pub fn get(&self, index: usize) -> Option<&BlockEntity> {
        self.blocks.get(index)
    }

    pub fn contains(&self, hash: &BlockHash) -> bool {
        self.blocks.iter().any(|b| b.hash() == hash)
    }

    pub fn count(&self) -> usize {
        self.blocks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &BlockEntity> {
        self.blocks.iter()
    }

    pub fn blocks(&self) -> &[BlockEntity] {
        &self.blocks
    }

    pub fn revision(&self) -> u64 {
        self.revision
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }
}

impl fmt::Debug for BlockFeedStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BlockFeedStore")
            .field("len", &self.blocks.len())
            .field("newest", &self.newest().map(BlockEntity::height))
            .field("oldest", &self.oldest().map(BlockEntity::height))
            .field("revision", &self.revision)
            .field("generation", &self.generation)
            .field("listeners", &self.listeners.len())
            .finish()
    }
}
