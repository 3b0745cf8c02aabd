//! Opaque record identifiers.

use chrono::Utc;
use uuid::Uuid;

/// Identifier of a category or an item.
pub type RecordId = String;

/// Generate a new identifier: 12 random hex digits followed by the current
/// epoch milliseconds in hex. Unique without consulting any registry.
pub fn new_id() -> RecordId {
    let random = Uuid::new_v4().simple().to_string();
    format!("{}{:x}", &random[..12], Utc::now().timestamp_millis())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn ids_are_hex_and_non_empty() {
        let id = new_id();
        assert!(id.len() > 12);
        assert!(id.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn ids_do_not_collide() {
        let ids: HashSet<RecordId> = (0..10_000).map(|_| new_id()).collect();
        assert_eq!(ids.len(), 10_000);
    }
}
