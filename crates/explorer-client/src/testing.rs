//! Scripted transport and Esplora-shaped fixtures for unit tests.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use serde_json::json;
use tokio::sync::Notify;

use crate::error::TransportError;
use crate::transport::HttpTransport;

pub const BASE: &str = "http://indexer.test/api/";

pub fn hash_for(height: u64) -> String {
    format!("00{height:062x}")
}

pub fn block_value(height: u64) -> serde_json::Value {
    let mut value = json!({
        "id": hash_for(height),
        "height": height,
        "version": 0x2000_0000,
        "timestamp": 1_700_000_000 + height * 600,
        "tx_count": 1_800,
        "size": 1_450_000,
        "weight": 3_992_000,
        "merkle_root": format!("{height:064x}"),
        "nonce": 3_000_000_000u32,
        "bits": 0x1703_a30c,
    });
    if height > 0 {
        value["previousblockhash"] = json!(hash_for(height - 1));
    }
    value
}

pub fn block_json(height: u64) -> String {
    block_value(height).to_string()
}

/// Up to `count` blocks from `top` downwards, stopping at genesis.
pub fn page_json(top: u64, count: u64) -> String {
    let blocks: Vec<_> = (0..count)
        .filter_map(|i| top.checked_sub(i))
        .map(block_value)
        .collect();
    serde_json::Value::Array(blocks).to_string()
}

enum Reply {
    Body(String),
    Status(u16),
}

/// Answers GETs from a table keyed by path relative to [`BASE`].
#[derive(Default)]
pub struct ScriptedTransport {
    replies: Mutex<HashMap<String, Reply>>,
    gates: Mutex<HashMap<String, Arc<Notify>>>,
    requests: Mutex<Vec<String>>,
    hits: AtomicUsize,
}

impl ScriptedTransport {
    pub fn respond(&self, path: &str, body: String) {
        self.replies
            .lock()
            .unwrap()
            .insert(path.to_string(), Reply::Body(body));
    }

    pub fn fail(&self, path: &str, status: u16) {
        self.replies
            .lock()
            .unwrap()
            .insert(path.to_string(), Reply::Status(status));
    }

    /// Hold requests for `path` until the returned gate is notified.
    pub fn gate(&self, path: &str) -> Arc<Notify> {
        let gate = Arc::new(Notify::new());
        self.gates
            .lock()
            .unwrap()
            .insert(path.to_string(), gate.clone());
        gate
    }

    pub fn hits(&self) -> usize {
        self.hits.load(Ordering::SeqCst)
    }

    pub fn requests(&self) -> Vec<String> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl HttpTransport for ScriptedTransport {
    async fn get(&self, url: &str) -> Result<String, TransportError> {
        self.hits.fetch_add(1, Ordering::SeqCst);
        self.requests.lock().unwrap().push(url.to_string());
        let path = url.strip_prefix(BASE).unwrap_or(url).to_string();

        let gate = self.gates.lock().unwrap().get(&path).cloned();
        if let Some(gate) = gate {
            gate.notified().await;
        }

        match self.replies.lock().unwrap().get(&path) {
            Some(Reply::Body(body)) => Ok(body.clone()),
            Some(Reply::Status(status)) => Err(TransportError::Http {
                status: *status,
                url: url.to_string(),
            }),
            None => Err(TransportError::Http {
                status: 404,
                url: url.to_string(),
            }),
        }
    }
}
