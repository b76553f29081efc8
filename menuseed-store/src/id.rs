//! Client-generated record identifiers.
//!
//! Ids are 20 lowercase hex characters: an 11-char millisecond timestamp
//! followed by 9 chars of a SHA-256 digest over a process-wide counter,
//! the clock's nanoseconds, and the process id.

use std::sync::atomic::{AtomicU64, Ordering};

use chrono::Utc;
use sha2::{Digest, Sha256};

use menuseed_core::RecordId;

static COUNTER: AtomicU64 = AtomicU64::new(0);

/// Generate a fresh identifier, unique within and across processes.
pub fn unique_id() -> RecordId {
    let now = Utc::now();
    let millis = now.timestamp_millis().max(0) as u64;
    let seq = COUNTER.fetch_add(1, Ordering::Relaxed);

    let mut hasher = Sha256::new();
    hasher.update(seq.to_le_bytes());
    hasher.update(now.timestamp_subsec_nanos().to_le_bytes());
    hasher.update(std::process::id().to_le_bytes());
    let digest = hex::encode(hasher.finalize());

    RecordId(format!("{millis:011x}{}", &digest[..9]))
}
