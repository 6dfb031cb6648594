//! Order book integrity digest.
//!
//! The server computes a CRC-32 over a canonical string built from the top
//! 25 levels of each side and ships it with every checksummed book frame.
//! The local book must reproduce that digest exactly after every snapshot
//! load and every incremental merge; any disagreement means the local book
//! has diverged and must be resynced.

use crate::models::book::PriceLevel;

/// Number of levels per side that participate in the digest.
pub const CHECKSUM_DEPTH: usize = 25;

/// Computes the integrity digest over the top [`CHECKSUM_DEPTH`] levels.
///
/// For each index the bid entry is appended first, then the ask entry,
/// each rendered as `"<price>:<size>:"` — interleaved, not two separate
/// passes. A side that runs out of levels contributes nothing at that
/// index; there is no padding. Exactly one trailing `:` is trimmed before
/// the CRC-32 (IEEE polynomial) is taken over the UTF-8 bytes.
pub fn digest(bids: &[PriceLevel], asks: &[PriceLevel]) -> u32 {
    let mut buf = String::with_capacity(CHECKSUM_DEPTH * 32);

    for i in 0..CHECKSUM_DEPTH {
        if let Some(bid) = bids.get(i) {
            buf.push_str(&bid.price.to_string());
            buf.push(':');
            buf.push_str(&bid.size.to_string());
            buf.push(':');
        }
        if let Some(ask) = asks.get(i) {
            buf.push_str(&ask.price.to_string());
            buf.push(':');
            buf.push_str(&ask.size.to_string());
            buf.push(':');
        }
    }
    buf.pop();

    crc32fast::hash(buf.as_bytes())
}

/// Bit-width interpretation used when comparing the local digest to the
/// wire value.
///
/// Some feed versions transmit the CRC as a signed 32-bit integer, others
/// as unsigned. The digest bits are identical either way; only the
/// comparison differs. Selected via `OKX_CHECKSUM_WIDTH`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ChecksumWidth {
    /// Wire value is a signed int32 (current OKX documentation).
    #[default]
    Signed,
    /// Wire value is an unsigned uint32.
    Unsigned,
}

impl ChecksumWidth {
    /// Compares a locally computed digest against the wire checksum.
    pub fn matches(&self, local: u32, wire: i64) -> bool {
        match self {
            ChecksumWidth::Signed => i64::from(local as i32) == wire,
            ChecksumWidth::Unsigned => i64::from(local) == wire,
        }
    }
}
