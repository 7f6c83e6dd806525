//! On-disk entry format
//!
//! An entry file holds `<expiry>|<payload>`: the absolute expiry instant
//! in epoch seconds as decimal ASCII, a literal `|`, then the serialized
//! value bytes.

/// Expiry instant stored for entries that never expire.
///
/// The maximum representable instant, so the freshness comparison stays
/// uniform instead of special-casing "forever".
pub const NEVER_EXPIRES: i64 = i64::MAX;

/// Compute the absolute expiry for a TTL relative to `now`.
///
/// A TTL of zero is the "store forever" sentinel. Negative TTLs produce
/// an expiry that is already in the past.
pub(crate) fn expiry_for(ttl: i64, now: i64) -> i64 {
    if ttl == 0 {
        NEVER_EXPIRES
    } else {
        now.saturating_add(ttl)
    }
}

/// Whether an entry with the given expiry is still valid at `now`.
///
/// Strict: an entry at or past its expiry is invalid.
pub(crate) fn is_fresh(expires_at: i64, now: i64) -> bool {
    now < expires_at
}

/// Encode an entry's file content.
pub(crate) fn encode(expires_at: i64, payload: &str) -> String {
    format!("{expires_at}|{payload}")
}

/// Decode an entry's file content into `(expires_at, payload)`.
///
/// Returns `None` when the content does not match the expected shape.
/// The expiry region must be a non-empty run of ASCII digits; corrupt or
/// foreign files read as cache misses, never errors.
pub(crate) fn decode(content: &str) -> Option<(i64, &str)> {
    let (time, payload) = content.split_once('|')?;
    if time.is_empty() || !time.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    let expires_at = time.parse().ok()?;
    Some((expires_at, payload))
}
