//! Opaque public identifiers
//!
//! Internal rows are keyed by sequential integers. Anything crossing the
//! service boundary carries an opaque string instead, so callers cannot
//! enumerate forms or fields by counting.

use crate::{Error, Result};
use uuid::Uuid;

/// Reversible mapping between internal integer keys and external ids
pub trait IdentifierCodec: Send + Sync {
    /// Encode an internal key (a positive row id)
    fn encode(&self, id: i64) -> String;

    /// Decode an external id, rejecting anything malformed with `Error::InvalidInput`
    fn decode(&self, external: &str) -> Result<i64>;
}

/// Renders the key as a zero-padded 128-bit value in hyphenated UUID layout
///
/// ```
/// use formix_common::ids::{IdentifierCodec, UuidIdCodec};
///
/// let codec = UuidIdCodec;
/// assert_eq!(codec.encode(255), "00000000-0000-0000-0000-0000000000ff");
/// assert_eq!(codec.decode("00000000-0000-0000-0000-0000000000ff").unwrap(), 255);
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct UuidIdCodec;

impl IdentifierCodec for UuidIdCodec {
    fn encode(&self, id: i64) -> String {
        Uuid::from_u128(u128::from(id.unsigned_abs())).hyphenated().to_string()
    }

    fn decode(&self, external: &str) -> Result<i64> {
        let uuid = Uuid::parse_str(external.trim())
            .map_err(|e| Error::InvalidInput(format!("Malformed id '{}': {}", external, e)))?;

        i64::try_from(uuid.as_u128())
            .ok()
            .filter(|id| *id > 0)
            .ok_or_else(|| Error::InvalidInput(format!("Id out of range: '{}'", external)))
    }
}
