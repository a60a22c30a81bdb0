//! Well-known boundary values used to build absolute anchor tuples.
//!
//! Cursor anchors for the `latest`/`earliest`/`most`/`least` keywords
//! are tuples of these sentinels; a range condition against them is
//! saturated on one side and naturally empty on the other.

use mongodb::bson::oid::ObjectId;

/// Smallest 64-bit signed long a sort field can hold.
pub const MIN_LONG: i64 = i64::MIN;

/// Largest 64-bit signed long a sort field can hold.
pub const MAX_LONG: i64 = i64::MAX;

/// The all-zero 12-byte document id, below every real id.
pub fn min_object_id() -> ObjectId {
    ObjectId::from_bytes([0x00; 12])
}

/// The all-F 12-byte document id, above every real id.
pub fn max_object_id() -> ObjectId {
    ObjectId::from_bytes([0xFF; 12])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn object_id_sentinels_bound_real_ids() {
        let real = ObjectId::parse_str("61a0b3c4d5e6f7a8b9c0d1e2").unwrap();
        assert!(min_object_id() < real);
        assert!(real < max_object_id());
    }

    #[test]
    fn sentinel_hex_spellings() {
        assert_eq!(min_object_id().to_hex(), "000000000000000000000000");
        assert_eq!(max_object_id().to_hex(), "ffffffffffffffffffffffff");
    }
}
