//! Text formatting for block listings.

use explorer_core::BlockEntity;

/// `800000` -> `800 000`
pub fn group_thousands(n: u64) -> String {
    let digits = n.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(' ');
        }
        out.push(c);
    }
    out
}

/// Bytes as kilobytes with up to three decimals, trailing zeros dropped.
pub fn kilobytes(bytes: u64) -> String {
    let kb = format!("{:.3}", bytes as f64 / 1000.0);
    kb.trim_end_matches('0').trim_end_matches('.').to_string()
}

/// Whole kilobytes, truncated.
pub fn whole_kilobytes(bytes: f64) -> String {
    ((bytes / 1000.0) as u64).to_string()
}

/// Header words as `0x`-prefixed hex padded to an even number of digits.
pub fn hex_word(word: u32) -> String {
    let hex = format!("{word:x}");
    if hex.len() % 2 == 0 {
        format!("0x{hex}")
    } else {
        format!("0x0{hex}")
    }
}

pub fn row_header() -> String {
    format!(
        "{:>11}  {:>10}  {:>6}  {:>10}  {:>8}  {}",
        "height", "time", "txs", "size kB", "vsize kB", "hash"
    )
}

pub fn row(block: &BlockEntity) -> String {
    format!(
        "{:>11}  {:>10}  {:>6}  {:>10}  {:>8}  {}",
        group_thousands(block.height()),
        block.timestamp(),
        block.tx_count(),
        kilobytes(block.size()),
        whole_kilobytes(block.virtual_size()),
        block.hash()
    )
}

pub fn detail(block: &BlockEntity) -> String {
    let previous = block
        .previous_hash()
        .map_or_else(|| "-".to_string(), ToString::to_string);
    [
        format!("height        {}", group_thousands(block.height())),
        format!("hash          {}", block.hash()),
        format!("previous      {previous}"),
        format!("time          {}", block.timestamp()),
        format!("transactions  {}", block.tx_count()),
        format!("size          {} kB", kilobytes(block.size())),
        format!("virtual size  {} kB", whole_kilobytes(block.virtual_size())),
        format!("weight        {} kWU", kilobytes(block.weight())),
        format!("version       {}", hex_word(block.version() as u32)),
        format!("merkle root   {}", block.merkle_root()),
        format!("bits          {}", hex_word(block.bits())),
        format!("nonce         {}", hex_word(block.nonce())),
    ]
    .join("\n")
}
