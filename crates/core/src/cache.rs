//! Single-entry TTL cache slot.
//!
//! Client repositories keep the last response for a short time and serve it
//! again while it is fresh. There is no eviction policy and no size bound:
//! a slot holds one value, replaced on every `put`.
//!
//! The clock is passed in explicitly so callers (and tests) decide what
//! "now" is.

use std::time::{Duration, Instant};

/// One cached value and the instant it was stored.
#[derive(Debug, Clone)]
pub struct TtlSlot<T> {
    ttl: Duration,
    entry: Option<(T, Instant)>,
}

impl<T> TtlSlot<T> {
    /// Create an empty slot whose entries live for `ttl`.
    #[must_use]
    pub const fn new(ttl: Duration) -> Self {
        Self { ttl, entry: None }
    }

    /// Store `value` as of `now`, replacing any previous entry.
    pub fn put(&mut self, value: T, now: Instant) {
        self.entry = Some((value, now));
    }

    /// Whether the slot holds an entry younger than the TTL at `now`.
    ///
    /// An entry is stale exactly at `stored_at + ttl`. If `now` is earlier
    /// than the stored instant the entry counts as fresh.
    #[must_use]
    pub fn is_fresh(&self, now: Instant) -> bool {
        self.entry
            .as_ref()
            .is_some_and(|(_, stored_at)| now.saturating_duration_since(*stored_at) < self.ttl)
    }

    /// The cached value if it is still fresh at `now`.
    #[must_use]
    pub fn get(&self, now: Instant) -> Option<&T> {
        if self.is_fresh(now) {
            self.entry.as_ref().map(|(value, _)| value)
        } else {
            None
        }
    }

    /// Drop the cached value.
    pub fn invalidate(&mut self) {
        self.entry = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TTL: Duration = Duration::from_secs(60);

    #[test]
    fn test_empty_slot_is_stale() {
        let slot: TtlSlot<u32> = TtlSlot::new(TTL);
        assert!(!slot.is_fresh(Instant::now()));
        assert_eq!(slot.get(Instant::now()), None);
    }

    #[test]
    fn test_fresh_just_before_expiry() {
        let start = Instant::now();
        let mut slot = TtlSlot::new(TTL);
        slot.put(7, start);

        let almost = start + TTL - Duration::from_nanos(1);
        assert_eq!(slot.get(almost), Some(&7));
    }

    #[test]
    fn test_stale_exactly_at_expiry() {
        let start = Instant::now();
        let mut slot = TtlSlot::new(TTL);
        slot.put(7, start);

        assert!(!slot.is_fresh(start + TTL));
        assert_eq!(slot.get(start + TTL), None);
    }

    #[test]
    fn test_put_restarts_the_clock() {
        let start = Instant::now();
        let mut slot = TtlSlot::new(TTL);
        slot.put(1, start);
        slot.put(2, start + Duration::from_secs(30));

        assert_eq!(slot.get(start + TTL), Some(&2));
    }

    #[test]
    fn test_earlier_clock_counts_as_fresh() {
        let start = Instant::now() + Duration::from_secs(5);
        let mut slot = TtlSlot::new(TTL);
        slot.put("x", start);

        assert!(slot.is_fresh(start - Duration::from_secs(1)));
    }

    #[test]
    fn test_invalidate() {
        let start = Instant::now();
        let mut slot = TtlSlot::new(TTL);
        slot.put(1, start);
        slot.invalidate();
        assert_eq!(slot.get(start), None);
    }

    #[test]
    fn test_zero_ttl_never_serves() {
        let start = Instant::now();
        let mut slot = TtlSlot::new(Duration::ZERO);
        slot.put(1, start);
        assert_eq!(slot.get(start), None);
    }
}
