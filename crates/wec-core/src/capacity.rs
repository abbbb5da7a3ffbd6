//! Capacity advisory
//!
//! Observes the live cache size and emits a non-blocking advisory when a
//! threshold is reached. Purely advisory: it never denies an open and never
//! evicts. Invoked only after genuine new inserts (not cache-hit refreshes),
//! so it re-fires on every insert past the threshold. That repeat is the
//! intended behavior, not a bug to fix.

/// Advisory emitted when the live cache reaches the threshold
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CapacityAdvisory {
    /// Live entry count at the time of the check
    pub count: usize,
    /// Configured threshold
    pub threshold: usize,
}

impl CapacityAdvisory {
    /// Message suitable for the user-facing notification surface
    #[must_use]
    pub fn user_message(&self) -> String {
        format!(
            "{} embedded views are open; closing unused ones may improve performance",
            self.count
        )
    }
}

/// Threshold check over the live entry count
#[derive(Debug, Clone, Copy)]
pub struct CapacityGuard {
    threshold: usize,
}

impl CapacityGuard {
    /// Guard with the given threshold
    #[inline]
    #[must_use]
    pub fn new(threshold: usize) -> Self {
        Self { threshold }
    }

    /// Advisory when `count` has reached the threshold, else `None`
    #[inline]
    #[must_use]
    pub fn check(&self, count: usize) -> Option<CapacityAdvisory> {
        (count >= self.threshold).then_some(CapacityAdvisory {
            count,
            threshold: self.threshold,
        })
    }
}
