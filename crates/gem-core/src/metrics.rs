//! Global object lifecycle counters
//!
//! Enabled with `feature = "metrics"`. Cost per event: one
//! `AtomicU64::fetch_add(1, Relaxed)`. Without the feature the recording
//! functions compile to nothing and [`snapshot`] reads all zeros.

use core::sync::atomic::{AtomicU64, Ordering};

static CREATED: AtomicU64 = AtomicU64::new(0);
static DESTROYED: AtomicU64 = AtomicU64::new(0);
static CREATE_FAILED: AtomicU64 = AtomicU64::new(0);
static QUERY_MISSED: AtomicU64 = AtomicU64::new(0);

/// Point-in-time copy of the counters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Snapshot {
    /// Objects whose `initialize` succeeded
    pub created: u64,
    /// Objects torn down (including failed creations)
    pub destroyed: u64,
    /// `create` calls that returned a failure after allocating
    pub create_failed: u64,
    /// `query_interface` calls that returned `NoInterface`
    pub query_missed: u64,
}

impl Snapshot {
    /// Objects allocated and not yet destroyed
    pub fn live(&self) -> u64 {
        (self.created + self.create_failed).saturating_sub(self.destroyed)
    }
}

#[inline(always)]
pub fn record_created() {
    bump(&CREATED);
}

#[inline(always)]
pub fn record_destroyed() {
    bump(&DESTROYED);
}

#[inline(always)]
pub fn record_create_failed() {
    bump(&CREATE_FAILED);
}

#[inline(always)]
pub fn record_query_missed() {
    bump(&QUERY_MISSED);
}

cfg_if::cfg_if! {
    if #[cfg(feature = "metrics")] {
        #[inline(always)]
        fn bump(counter: &AtomicU64) {
            counter.fetch_add(1, Ordering::Relaxed);
        }
    } else {
        #[inline(always)]
        fn bump(_counter: &AtomicU64) {}
    }
}

/// Read all counters
pub fn snapshot() -> Snapshot {
    Snapshot {
        created: CREATED.load(Ordering::Relaxed),
        destroyed: DESTROYED.load(Ordering::Relaxed),
        create_failed: CREATE_FAILED.load(Ordering::Relaxed),
        query_missed: QUERY_MISSED.load(Ordering::Relaxed),
    }
}

/// Reset all counters
pub fn reset_all() {
    for counter in [&CREATED, &DESTROYED, &CREATE_FAILED, &QUERY_MISSED] {
        counter.store(0, Ordering::Relaxed);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_live_accounts_for_failures() {
        let snap = Snapshot {
            created: 5,
            destroyed: 4,
            create_failed: 2,
            query_missed: 0,
        };
        assert_eq!(snap.live(), 3);
    }

    #[cfg(feature = "metrics")]
    #[test]
    fn test_counters_bump() {
        let before = snapshot();
        record_created();
        record_query_missed();
        let after = snapshot();
        assert!(after.created > before.created);
        assert!(after.query_missed > before.query_missed);
    }

    #[cfg(not(feature = "metrics"))]
    #[test]
    fn test_counters_disabled() {
        record_created();
        record_destroyed();
        assert_eq!(snapshot(), Snapshot::default());
    }
}
