//! Block records and the in-memory block feed of the explorer.
pub mod constants;
pub mod error;
pub mod scroll;
pub mod store;

use std::fmt;
use std::hash::{Hash, Hasher};
use std::str::FromStr;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};

use constants::{HASH_HEX_SIZE, HASH_SIZE, MIN_HASH_ZERO_BITS, WEIGHT_UNITS_PER_VBYTE};
pub use error::ValidationError;
pub use scroll::{LoadState, LoadTicket, ScrollLoadController, ScrollPosition};
pub use store::{BlockFeedStore, FeedChange};

/// A 32 byte block hash. Compared by bytes, so the hex form is case-insensitive.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BlockHash([u8; HASH_SIZE]);

impl BlockHash {
    /// Parse a hex block hash on behalf of record field `field`.
    pub fn parse(field: &'static str, value: &str) -> Result<Self, ValidationError> {
        let invalid = || ValidationError::InvalidHash {
            field,
            value: value.to_string(),
        };
        if value.len() != HASH_HEX_SIZE {
            return Err(invalid());
        }
        let mut bytes = [0u8; HASH_SIZE];
        hex::decode_to_slice(value, &mut bytes).map_err(|_| invalid())?;
        let hash = Self(bytes);
        if pow::count_leading_zero_bits(&hash) < MIN_HASH_ZERO_BITS {
            return Err(invalid());
        }
        Ok(hash)
    }

    pub fn as_bytes(&self) -> &[u8; HASH_SIZE] {
        &self.0
    }
}

impl FromStr for BlockHash {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse("hash", s)
    }
}

impl fmt::Display for BlockHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&hex::encode(self.0))
    }
}

impl fmt::Debug for BlockHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "BlockHash({self})")
    }
}

/// A block as the Esplora indexer serves it. Every field is optional on the wire;
/// [`BlockEntity::from_source_record`] decides what is actually required.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockRecord {
    pub id: Option<String>,
    pub height: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub previousblockhash: Option<String>,
    pub version: Option<i64>,
    pub timestamp: Option<i64>,
    pub tx_count: Option<i64>,
    pub size: Option<i64>,
    pub weight: Option<i64>,
    pub merkle_root: Option<String>,
    pub nonce: Option<i64>,
    pub bits: Option<i64>,
}

/// One validated, immutable block summary. Identity is the block hash.
#[derive(Clone, Debug)]
pub struct BlockEntity {
    hash: BlockHash,
    previous_hash: Option<BlockHash>,
    height: u64,
    version: i32,
    timestamp: u64,
    tx_count: u64,
    size: u64,
    weight: u64,
    merkle_root: String,
    nonce: u32,
    bits: u32,
}

impl BlockEntity {
    /// Validate an indexer record. Fails on a malformed hash, a missing field or a
    /// negative count, height or timestamp. The previous hash is only read above genesis.
    pub fn from_source_record(record: &BlockRecord) -> Result<Self, ValidationError> {
        let id = record
            .id
            .as_deref()
            .ok_or(ValidationError::MissingField { field: "id" })?;
        let hash = BlockHash::parse("id", id)?;
        let height = unsigned("height", record.height)?;

        let previous_hash = if height == 0 {
            None
        } else {
            let prev = record
                .previousblockhash
                .as_deref()
                .ok_or(ValidationError::MissingPreviousHash { height })?;
            Some(BlockHash::parse("previousblockhash", prev)?)
        };

        let version = required("version", record.version)?;
        let version =
            i32::try_from(version).map_err(|_| ValidationError::OutOfRange {
                field: "version",
                value: version,
            })?;

        Ok(Self {
            hash,
            previous_hash,
            height,
            version,
            timestamp: unsigned("timestamp", record.timestamp)?,
            tx_count: unsigned("tx_count", record.tx_count)?,
            size: unsigned("size", record.size)?,
            weight: unsigned("weight", record.weight)?,
            merkle_root: record
                .merkle_root
                .clone()
                .ok_or(ValidationError::MissingField {
                    field: "merkle_root",
                })?,
            nonce: word("nonce", record.nonce)?,
            bits: word("bits", record.bits)?,
        })
    }

    pub fn hash(&self) -> &BlockHash {
        &self.hash
    }

    pub fn previous_hash(&self) -> Option<&BlockHash> {
        self.previous_hash.as_ref()
    }

    pub fn height(&self) -> u64 {
        self.height
    }

    pub fn is_genesis(&self) -> bool {
        self.height == 0
    }

    pub fn version(&self) -> i32 {
        self.version
    }

    /// Seconds since the unix epoch.
    pub fn timestamp(&self) -> u64 {
        self.timestamp
    }

    pub fn time(&self) -> SystemTime {
        UNIX_EPOCH + Duration::from_secs(self.timestamp)
    }

    pub fn tx_count(&self) -> u64 {
        self.tx_count
    }

    /// Serialized size in bytes.
    pub fn size(&self) -> u64 {
        self.size
    }

    pub fn weight(&self) -> u64 {
        self.weight
    }

    /// Virtual size in vbytes (weight / 4, not rounded).
    pub fn virtual_size(&self) -> f64 {
        self.weight as f64 / WEIGHT_UNITS_PER_VBYTE as f64
    }

    pub fn merkle_root(&self) -> &str {
        &self.merkle_root
    }

    pub fn nonce(&self) -> u32 {
        self.nonce
    }

    pub fn bits(&self) -> u32 {
        self.bits
    }
}

impl PartialEq for BlockEntity {
    fn eq(&self, other: &Self) -> bool {
        self.hash == other.hash
    }
}

impl Eq for BlockEntity {}

impl Hash for BlockEntity {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.hash.hash(state);
    }
}

impl From<&BlockEntity> for BlockRecord {
    fn from(block: &BlockEntity) -> Self {
        Self {
            id: Some(block.hash.to_string()),
            height: Some(block.height as i64),
            previousblockhash: block.previous_hash.map(|h| h.to_string()),
            version: Some(i64::from(block.version)),
            timestamp: Some(block.timestamp as i64),
            tx_count: Some(block.tx_count as i64),
            size: Some(block.size as i64),
            weight: Some(block.weight as i64),
            merkle_root: Some(block.merkle_root.clone()),
            nonce: Some(i64::from(block.nonce)),
            bits: Some(i64::from(block.bits)),
        }
    }
}

fn required(field: &'static str, value: Option<i64>) -> Result<i64, ValidationError> {
    value.ok_or(ValidationError::MissingField { field })
}

fn unsigned(field: &'static str, value: Option<i64>) -> Result<u64, ValidationError> {
    let value = required(field, value)?;
    u64::try_from(value).map_err(|_| ValidationError::Negative { field, value })
}

// nonce and bits are raw 32-bit header words
fn word(field: &'static str, value: Option<i64>) -> Result<u32, ValidationError> {
    let value = required(field, value)?;
    u32::try_from(value).map_err(|_| ValidationError::OutOfRange { field, value })
}

pub mod pow {
    use super::BlockHash;

    /// Number of leading zero bits in the hash, reading the bytes in display order.
    pub fn count_leading_zero_bits(hash: &BlockHash) -> u32 {
        let mut total = 0u32;
        for b in hash.as_bytes() {
            if *b == 0 {
                total += 8;
            } else {
                total += b.leading_zeros();
                break;
            }
        }
        total
    }
}
