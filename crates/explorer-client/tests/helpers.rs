#![allow(dead_code)]

use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use serde_json::{json, Value};
use sha2::{Digest, Sha256};

/// Deterministic "00"-prefixed hash that also encodes its height in the last 16 hex chars.
pub fn block_hash(height: u64) -> String {
    let digest = Sha256::digest(height.to_be_bytes());
    format!("00{}{height:016x}", &hex::encode(digest)[..46])
}

pub fn height_of(hash: &str) -> Option<u64> {
    if hash.len() != 64 {
        return None;
    }
    let height = u64::from_str_radix(&hash[48..], 16).ok()?;
    (block_hash(height) == hash.to_lowercase()).then_some(height)
}

/// What the fake indexer gets wrong on purpose.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Fault {
    None,
    EmptyPages,
    InvalidHashAt(u64),
    WrongTypeAt(u64),
}

pub struct FakeIndexer {
    tip: AtomicU64,
    page_size: u64,
    fault: Mutex<Fault>,
    hits: AtomicUsize,
}

impl FakeIndexer {
    pub fn set_fault(&self, fault: Fault) {
        *self.fault.lock().unwrap() = fault;
    }

    pub fn set_tip(&self, tip: u64) {
        self.tip.store(tip, Ordering::SeqCst);
    }

    pub fn tip(&self) -> u64 {
        self.tip.load(Ordering::SeqCst)
    }

    pub fn hits(&self) -> usize {
        self.hits.load(Ordering::SeqCst)
    }

    fn hit(&self) {
        self.hits.fetch_add(1, Ordering::SeqCst);
    }

    fn fault(&self) -> Fault {
        *self.fault.lock().unwrap()
    }

    pub fn record(&self, height: u64) -> Value {
        let mut record = json!({
            "id": block_hash(height),
            "height": height,
            "version": 0x2000_0000,
            "timestamp": 1_600_000_000 + height * 600,
            "tx_count": 2_500,
            "size": 1_380_000,
            "weight": 3_993_000,
            "merkle_root": format!("{:064x}", height * 7),
            "mediantime": 1_600_000_000 + height * 600 - 3_000,
            "nonce": 2_868_154_400u32,
            "bits": 0x1703_a30c,
            "difficulty": 57_321_508_229_258.04,
        });
        if height > 0 {
            record["previousblockhash"] = json!(block_hash(height - 1));
        }
        match self.fault() {
            Fault::InvalidHashAt(h) if h == height => {
                record["id"] = json!(format!("ff{}", &block_hash(height)[2..]));
            }
            Fault::WrongTypeAt(h) if h == height => {
                record["tx_count"] = json!("lots");
            }
            _ => {}
        }
        record
    }

    fn page(&self, top: u64) -> Vec<Value> {
        if self.fault() == Fault::EmptyPages {
            return Vec::new();
        }
        (0..self.page_size)
            .filter_map(|i| top.checked_sub(i))
            .map(|h| self.record(h))
            .collect()
    }
}

type Shared = State<Arc<FakeIndexer>>;

async fn recent(State(indexer): Shared) -> Json<Vec<Value>> {
    indexer.hit();
    Json(indexer.page(indexer.tip()))
}

async fn from_height(State(indexer): Shared, Path(height): Path<u64>) -> Json<Vec<Value>> {
    indexer.hit();
    Json(indexer.page(height.min(indexer.tip())))
}

async fn height_to_hash(State(indexer): Shared, Path(height): Path<u64>) -> String {
    indexer.hit();
    if height > indexer.tip() {
        return String::new();
    }
    block_hash(height)
}

async fn block(State(indexer): Shared, Path(hash): Path<String>) -> Response {
    indexer.hit();
    match height_of(&hash) {
        Some(height) if height <= indexer.tip() => Json(indexer.record(height)).into_response(),
        _ => (StatusCode::NOT_FOUND, "Block not found").into_response(),
    }
}

pub struct Indexer {
    /// Includes the `/api/` prefix, like the public instance.
    pub base_url: String,
    pub state: Arc<FakeIndexer>,
}

/// Serve an Esplora-shaped chain of `tip + 1` blocks on an ephemeral local port.
pub async fn spawn_indexer(tip: u64, page_size: u64) -> Indexer {
    let state = Arc::new(FakeIndexer {
        tip: AtomicU64::new(tip),
        page_size,
        fault: Mutex::new(Fault::None),
        hits: AtomicUsize::new(0),
    });

    let api = Router::new()
        .route("/blocks", get(recent))
        .route("/blocks/{height}", get(from_height))
        .route("/block-height/{height}", get(height_to_hash))
        .route("/block/{hash}", get(block))
        .with_state(state.clone());
    let app = Router::new().nest("/api", api);

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind fake indexer");
    let addr = listener.local_addr().expect("Failed to read local addr");
    tokio::spawn(async move {
        axum::serve(listener, app).await.expect("fake indexer crashed");
    });

    Indexer {
        base_url: format!("http://{addr}/api/"),
        state,
    }
}
