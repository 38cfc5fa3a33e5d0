//! Slot accounting for the context pool.
//!
//! Pure bookkeeping, separated from chromiumoxide so the bounding and
//! round-robin reuse rules are testable without launching a browser.

use std::time::Instant;

/// Metadata for one context slot.
#[derive(Debug, Clone)]
pub(crate) struct SlotMeta {
    pub id: u64,
    pub created_at: Instant,
    pub last_used: Instant,
    /// Number of outstanding leases. At capacity a slot may be shared, so
    /// this is a count rather than a flag.
    pub lease_count: u32,
}

/// What a lease request should do.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum LeaseDecision {
    /// Create a new context under this pre-assigned id.
    Create(u64),
    /// Reuse the existing context with this id.
    Reuse(u64),
}

/// Bounded slot table with round-robin reuse at capacity.
#[derive(Debug)]
pub(crate) struct SlotTable {
    cap: usize,
    cursor: usize,
    next_id: u64,
    slots: Vec<SlotMeta>,
}

impl SlotTable {
    pub(crate) fn new(cap: usize) -> Self {
        Self {
            cap: cap.max(1),
            cursor: 0,
            next_id: 0,
            slots: Vec::new(),
        }
    }

    /// Decide how to satisfy a lease.
    ///
    /// Preference order: an idle slot, then growth while under the cap,
    /// then round-robin reuse of a leased slot. Never blocks, never grows
    /// past the cap.
    pub(crate) fn lease(&mut self, now: Instant) -> LeaseDecision {
        if let Some(slot) = self.slots.iter_mut().find(|s| s.lease_count == 0) {
            slot.lease_count = 1;
            slot.last_used = now;
            return LeaseDecision::Reuse(slot.id);
        }

        if self.slots.len() < self.cap {
            let id = self.next_id;
            self.next_id += 1;
            return LeaseDecision::Create(id);
        }

        // At capacity with every slot busy: share one, round-robin.
        self.cursor = (self.cursor + 1) % self.slots.len();
        let slot = &mut self.slots[self.cursor];
        slot.lease_count += 1;
        slot.last_used = now;
        LeaseDecision::Reuse(slot.id)
    }

    /// Register a slot created after a `Create` decision.
    pub(crate) fn register(&mut self, id: u64, now: Instant) {
        self.slots.push(SlotMeta {
            id,
            created_at: now,
            last_used: now,
            lease_count: 1,
        });
    }

    /// Return a lease. Unknown ids are ignored (slot may have been swept).
    pub(crate) fn release(&mut self, id: u64, now: Instant) {
        if let Some(slot) = self.slots.iter_mut().find(|s| s.id == id) {
            slot.lease_count = slot.lease_count.saturating_sub(1);
            slot.last_used = now;
        }
    }

    /// Remove a slot outright (broken context).
    pub(crate) fn remove(&mut self, id: u64) {
        self.slots.retain(|s| s.id != id);
        if self.cursor >= self.slots.len() {
            self.cursor = 0;
        }
    }

    /// Pick idle slots older than `max_age` for closing, always retaining
    /// at least one slot for warm reuse.
    pub(crate) fn sweep(&mut self, max_age: std::time::Duration, now: Instant) -> Vec<u64> {
        let mut victims = Vec::new();
        for slot in &self.slots {
            if self.slots.len() - victims.len() <= 1 {
                break;
            }
            if slot.lease_count == 0 && now.duration_since(slot.created_at) > max_age {
                victims.push(slot.id);
            }
        }
        for id in &victims {
            self.slots.retain(|s| s.id != *id);
        }
        if self.cursor >= self.slots.len().max(1) {
            self.cursor = 0;
        }
        victims
    }

    pub(crate) fn len(&self) -> usize {
        self.slots.len()
    }

    pub(crate) fn leased(&self) -> usize {
        self.slots.iter().filter(|s| s.lease_count > 0).count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn grows_until_cap_then_reuses() {
        let now = Instant::now();
        let mut table = SlotTable::new(3);

        for expected in 0..3u64 {
            match table.lease(now) {
                LeaseDecision::Create(id) => {
                    assert_eq!(id, expected);
                    table.register(id, now);
                }
                LeaseDecision::Reuse(id) => panic!("unexpected reuse of {id}"),
            }
        }
        assert_eq!(table.len(), 3);

        // cap+1-th lease must share, not create or hang
        match table.lease(now) {
            LeaseDecision::Reuse(_) => {}
            LeaseDecision::Create(_) => panic!("pool grew past cap"),
        }
        assert_eq!(table.len(), 3);
    }

    #[test]
    fn idle_slot_preferred_over_creation() {
        let now = Instant::now();
        let mut table = SlotTable::new(3);
        let LeaseDecision::Create(id) = table.lease(now) else {
            panic!("expected create")
        };
        table.register(id, now);
        table.release(id, now);

        assert_eq!(table.lease(now), LeaseDecision::Reuse(id));
        assert_eq!(table.len(), 1);
    }

    #[test]
    fn shared_reuse_round_robins() {
        let now = Instant::now();
        let mut table = SlotTable::new(2);
        for _ in 0..2 {
            if let LeaseDecision::Create(id) = table.lease(now) {
                table.register(id, now);
            }
        }
        let LeaseDecision::Reuse(first) = table.lease(now) else {
            panic!("expected reuse")
        };
        let LeaseDecision::Reuse(second) = table.lease(now) else {
            panic!("expected reuse")
        };
        assert_ne!(first, second);
    }

    #[test]
    fn sweep_retains_warm_slot() {
        let start = Instant::now();
        let mut table = SlotTable::new(3);
        for _ in 0..3 {
            if let LeaseDecision::Create(id) = table.lease(start) {
                table.register(id, start);
            }
        }
        for id in 0..3u64 {
            table.release(id, start);
        }

        let later = start + Duration::from_secs(600);
        let victims = table.sweep(Duration::from_secs(300), later);
        assert_eq!(victims.len(), 2);
        assert_eq!(table.len(), 1);
    }

    #[test]
    fn sweep_skips_leased_slots() {
        let start = Instant::now();
        let mut table = SlotTable::new(2);
        for _ in 0..2 {
            if let LeaseDecision::Create(id) = table.lease(start) {
                table.register(id, start);
            }
        }
        table.release(0, start);

        let later = start + Duration::from_secs(600);
        let victims = table.sweep(Duration::from_secs(300), later);
        // Slot 1 is still leased; slot 0 is the only candidate and is kept
        // as the warm slot... unless another slot survives.
        assert!(victims.len() <= 1);
        assert!(table.slots.iter().any(|s| s.id == 1));
    }
}
