//! UUID v7 utilities for time-ordered identifiers.

use uuid::Uuid;

/// Generate a new UUIDv7 identifier.
///
/// UUIDv7 embeds a Unix timestamp (milliseconds) in the first 48 bits,
/// providing natural time-ordering for job and activity rows.
#[inline]
pub fn new_v7() -> Uuid {
    Uuid::now_v7()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_v7_is_version_7() {
        let id = new_v7();
        assert_eq!(id.get_version_num(), 7);
    }

    #[test]
    fn test_new_v7_is_time_ordered() {
        let a = new_v7();
        std::thread::sleep(std::time::Duration::from_millis(2));
        let b = new_v7();
        assert!(a < b);
    }
}
