//! Esplora REST client for block pages and single blocks.

use std::sync::Arc;

use explorer_core::{BlockEntity, BlockHash, BlockRecord};
use tracing::{debug, warn};

use crate::config::{join_url, ClientConfig};
use crate::error::{ExplorerError, TransportError};
use crate::transport::{HttpTransport, ReqwestTransport};

/// Maps feed requests onto the indexer's REST paths:
///
/// | request | path |
/// |---|---|
/// | newest page | `blocks` |
/// | page at and below a height | `blocks/{height}` |
/// | hash at a height | `block-height/{height}` |
/// | single block | `block/{hash}` |
#[derive(Clone)]
pub struct ExplorerClient {
    base_url: String,
    transport: Arc<dyn HttpTransport>,
}

impl std::fmt::Debug for ExplorerClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ExplorerClient")
            .field("base_url", &self.base_url)
            .finish_non_exhaustive()
    }
}

impl ExplorerClient {
    /// Client over the real HTTP stack.
    pub fn new(config: &ClientConfig) -> Result<Self, ExplorerError> {
        let transport = ReqwestTransport::new(&config.user_agent)?;
        Ok(Self::with_transport(
            config.base_url.clone(),
            Arc::new(transport),
        ))
    }

    pub fn with_transport(base_url: impl Into<String>, transport: Arc<dyn HttpTransport>) -> Self {
        Self {
            base_url: base_url.into(),
            transport,
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn url(&self, path: &str) -> String {
        join_url(&self.base_url, path)
    }

    /// One page of blocks, newest first. Without `start_height` this is the most
    /// recent page; with it, the page at and below that height.
    ///
    /// An empty page is an [`ExplorerError::EmptyResult`], and a single bad record
    /// rejects the whole page.
    pub async fn list_blocks(
        &self,
        start_height: Option<i64>,
    ) -> Result<Vec<BlockEntity>, ExplorerError> {
        let path = match start_height {
            Some(height) if height < 0 => return Err(ExplorerError::negative_height(height)),
            Some(height) => format!("blocks/{height}"),
            None => "blocks".to_string(),
        };

        let body = self.fetch(&path).await?;
        let records: Vec<BlockRecord> =
            serde_json::from_str(&body).map_err(TransportError::Malformed)?;
        if records.is_empty() {
            return Err(ExplorerError::EmptyResult(path));
        }

        let blocks = records
            .iter()
            .map(BlockEntity::from_source_record)
            .collect::<Result<Vec<_>, _>>()
            .inspect_err(|e| warn!(%path, error = %e, "rejecting page"))?;
        debug!(
            %path,
            count = blocks.len(),
            newest = blocks.first().map(BlockEntity::height),
            oldest = blocks.last().map(BlockEntity::height),
            "page loaded"
        );
        Ok(blocks)
    }

    /// The block at `height`, resolved through its hash. Returns one block.
    pub async fn get_block_by_height(&self, height: i64) -> Result<Vec<BlockEntity>, ExplorerError> {
        if height < 0 {
            return Err(ExplorerError::negative_height(height));
        }

        let path = format!("block-height/{height}");
        let body = self.fetch(&path).await?;
        let hash = body.trim();
        if hash.is_empty() {
            return Err(ExplorerError::EmptyResult(path));
        }
        let hash = BlockHash::parse("id", hash)?;
        self.fetch_block(&hash).await
    }

    /// The block with the given hex hash. Returns one block.
    pub async fn get_block(&self, hash: &str) -> Result<Vec<BlockEntity>, ExplorerError> {
        let hash = BlockHash::parse("hash", hash)
            .map_err(|e| ExplorerError::InvalidArgument(e.to_string()))?;
        self.fetch_block(&hash).await
    }

    async fn fetch_block(&self, hash: &BlockHash) -> Result<Vec<BlockEntity>, ExplorerError> {
        let body = self.fetch(&format!("block/{hash}")).await?;
        let record: BlockRecord =
            serde_json::from_str(&body).map_err(TransportError::Malformed)?;
        let block = BlockEntity::from_source_record(&record)?;
        debug!(height = block.height(), %hash, "block loaded");
        Ok(vec![block])
    }

    async fn fetch(&self, path: &str) -> Result<String, TransportError> {
        let url = self.url(path);
        self.transport
            .get(&url)
            .await
            .inspect_err(|e| warn!(%url, error = %e, "request failed"))
    }
}
