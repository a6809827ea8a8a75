//! Time-ordered 128-bit identifiers.
//!
//! Layout, most significant bits first:
//!
//! | bits | content                      |
//! |------|------------------------------|
//! | 48   | Unix timestamp, milliseconds |
//! | 4    | version `0x7`                |
//! | 12   | random                       |
//! | 2    | variant `0b10`               |
//! | 62   | random                       |
//!
//! Ids built at different milliseconds compare in time order as unsigned
//! big-endian integers. Ids from the same millisecond have no defined order;
//! there is no sequence counter.

use chrono::{DateTime, TimeZone, Utc};
use rand::RngCore;
use thiserror::Error;
use uuid::Uuid;

const TIMESTAMP_BITS: u32 = 48;
const MAX_TIMESTAMP_MS: i64 = (1i64 << TIMESTAMP_BITS) - 1;
const VERSION: u128 = 0x7;
const VARIANT: u128 = 0b10;
const RAND_A_MASK: u16 = 0x0fff;
const RAND_B_MASK: u64 = (1u64 << 62) - 1;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum TimeOrderedIdError {
    #[error("timestamp {0} ms is outside the 48-bit range")]
    TimestampOutOfRange(i64),
}

/// Build an id for `timestamp` with fresh random bits.
pub fn construct_at(timestamp: DateTime<Utc>) -> Result<Uuid, TimeOrderedIdError> {
    let mut rng = rand::thread_rng();
    let rand_a = (rng.next_u32() as u16) & RAND_A_MASK;
    let rand_b = rng.next_u64() & RAND_B_MASK;
    from_parts(timestamp.timestamp_millis(), rand_a, rand_b)
}

/// Id for the current instant. Fails if the wall clock is set before the
/// epoch or beyond the 48-bit millisecond range.
pub fn now() -> Result<Uuid, TimeOrderedIdError> {
    construct_at(Utc::now())
}

/// Smallest id any `construct_at(timestamp)` call can produce. Used as an
/// inclusive range-pagination boundary.
pub fn lower_bound_at(timestamp: DateTime<Utc>) -> Result<Uuid, TimeOrderedIdError> {
    from_parts(timestamp.timestamp_millis(), 0, 0)
}

/// Largest id any `construct_at(timestamp)` call can produce.
pub fn upper_bound_at(timestamp: DateTime<Utc>) -> Result<Uuid, TimeOrderedIdError> {
    from_parts(timestamp.timestamp_millis(), RAND_A_MASK, RAND_B_MASK)
}

/// Millisecond timestamp carried in the top 48 bits.
pub fn recover_timestamp(id: Uuid) -> DateTime<Utc> {
    let millis = (id.as_u128() >> 80) as i64;
    // 48-bit millisecond values are always representable.
    Utc.timestamp_millis_opt(millis)
        .single()
        .unwrap_or_default()
}

fn from_parts(millis: i64, rand_a: u16, rand_b: u64) -> Result<Uuid, TimeOrderedIdError> {
    if !(0..=MAX_TIMESTAMP_MS).contains(&millis) {
        return Err(TimeOrderedIdError::TimestampOutOfRange(millis));
    }
    debug_assert!(rand_a <= RAND_A_MASK && rand_b <= RAND_B_MASK);

    let value = ((millis as u128) << 80)
        | (VERSION << 76)
        | (u128::from(rand_a & RAND_A_MASK) << 64)
        | (VARIANT << 62)
        | u128::from(rand_b & RAND_B_MASK);

    Ok(Uuid::from_u128(value))
}
