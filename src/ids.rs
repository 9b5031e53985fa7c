//! Stable identifier derivation for runs, plans, and snapshots.
//!
//! Run ids are compared for equality across snapshots and audit trails, so
//! [`djb2_hash`] and [`generate_run_id`] must never change output for a given
//! input.

use chrono::{DateTime, Utc};

/// djb2 over the UTF-16 code units of `s`, with 32-bit wrapping arithmetic
/// and the absolute value taken at the end.
///
/// # Examples
///
/// ```
/// use gridcase_sim::ids::djb2_hash;
///
/// assert_eq!(djb2_hash(""), 5381);
/// assert_eq!(djb2_hash("a"), 177_670);
/// ```
pub fn djb2_hash(s: &str) -> u32 {
    let hash = s.encode_utf16().fold(5381_i32, |hash, unit| {
        (hash << 5).wrapping_add(hash).wrapping_add(i32::from(unit))
    });
    hash.unsigned_abs()
}

/// Deterministic result id for a `(plan, scenario, seed)` triple,
/// formatted as `run_` followed by at least eight lowercase hex digits.
pub fn generate_run_id(plan_id: &str, scenario_id: &str, seed: u32) -> String {
    let raw = format!("{plan_id}::{scenario_id}::{seed}");
    format!("run_{:08x}", djb2_hash(&raw))
}

/// Lowercase base-36 rendering, used for timestamp-derived ids.
pub fn base36(mut n: u64) -> String {
    const DIGITS: &[u8; 36] = b"0123456789abcdefghijklmnopqrstuvwxyz";
    if n == 0 {
        return "0".to_string();
    }
    let mut out = Vec::new();
    while n > 0 {
        out.push(DIGITS[(n % 36) as usize]);
        n /= 36;
    }
    out.reverse();
    out.into_iter().map(char::from).collect()
}

/// Millisecond timestamp in base 36. Negative instants clamp to zero.
pub(crate) fn timestamp_token(at: DateTime<Utc>) -> String {
    base36(u64::try_from(at.timestamp_millis()).unwrap_or(0))
}
