pub const BYTE: usize = 8;
pub const HASH_SIZE: usize = 32;
pub const HASH_HEX_SIZE: usize = HASH_SIZE * 2;
/// Proof-of-work convention: every block hash starts with one zero byte ("00" in hex).
pub const MIN_HASH_ZERO_BITS: u32 = BYTE as u32;
pub const WEIGHT_UNITS_PER_VBYTE: u64 = 4;
pub const DEFAULT_VISIBLE_THRESHOLD: usize = 10;
pub const LIST_VISIBLE_THRESHOLD: usize = 20;
