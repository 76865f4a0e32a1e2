//! Freshness check for cached responses.

use std::time::Duration;

use chrono::{DateTime, Utc};

/// Returns true once more than `ttl` has elapsed since `inserted_at`.
///
/// Exactly `ttl` old is still fresh. A clock that moved backwards yields a
/// negative age, which is treated as fresh.
pub fn is_expired(now: DateTime<Utc>, inserted_at: DateTime<Utc>, ttl: Duration) -> bool {
    let age_ms = (now - inserted_at).num_milliseconds();
    age_ms > 0 && age_ms as u128 > ttl.as_millis()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeDelta;

    const TTL: Duration = Duration::from_millis(1000);

    #[test]
    fn test_fresh_within_ttl() {
        let inserted = Utc::now();
        assert!(!is_expired(inserted, inserted, TTL));
        assert!(!is_expired(inserted + TimeDelta::milliseconds(999), inserted, TTL));
    }

    #[test]
    fn test_boundary_is_fresh() {
        let inserted = Utc::now();
        assert!(!is_expired(inserted + TimeDelta::milliseconds(1000), inserted, TTL));
    }

    #[test]
    fn test_expired_past_ttl() {
        let inserted = Utc::now();
        assert!(is_expired(inserted + TimeDelta::milliseconds(1001), inserted, TTL));
    }

    #[test]
    fn test_clock_skew_is_fresh() {
        let inserted = Utc::now();
        assert!(!is_expired(inserted - TimeDelta::seconds(5), inserted, TTL));
    }
}
