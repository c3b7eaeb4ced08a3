//! Grid event counters
//!
//! With the `metrics` feature the grid counts registrations, crossings and
//! queries. Without it [`GridCounters`] is a zero-sized stub with the same API,
//! so call sites need no `cfg` of their own.

/// Countable grid events
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum GridEvent {
    Registered,
    Removed,
    CellCrossing,
    Evicted,
    Query,
}

impl GridEvent {
    pub const ALL: [GridEvent; 5] = [
        GridEvent::Registered,
        GridEvent::Removed,
        GridEvent::CellCrossing,
        GridEvent::Evicted,
        GridEvent::Query,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            GridEvent::Registered => "registered",
            GridEvent::Removed => "removed",
            GridEvent::CellCrossing => "cell_crossing",
            GridEvent::Evicted => "evicted",
            GridEvent::Query => "query",
        }
    }

    #[cfg(feature = "metrics")]
    fn slot(&self) -> usize {
        *self as usize
    }
}

#[cfg(feature = "metrics")]
pub struct GridCounters {
    // Cell so queries can count through a shared borrow
    counts: [std::cell::Cell<u64>; GridEvent::ALL.len()],
}

#[cfg(feature = "metrics")]
impl GridCounters {
    pub fn new() -> Self {
        Self {
            counts: Default::default(),
        }
    }

    pub fn increment(&self, event: GridEvent) {
        let slot = &self.counts[event.slot()];
        slot.set(slot.get() + 1);
    }

    pub fn get(&self, event: GridEvent) -> u64 {
        self.counts[event.slot()].get()
    }

    pub fn reset_all(&self) {
        for slot in &self.counts {
            slot.set(0);
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (GridEvent, u64)> + '_ {
        GridEvent::ALL.into_iter().map(|event| (event, self.get(event)))
    }
}

#[cfg(not(feature = "metrics"))]
pub struct GridCounters;

#[cfg(not(feature = "metrics"))]
impl GridCounters {
    pub fn new() -> Self { Self }
    pub fn increment(&self, _event: GridEvent) {}
    pub fn get(&self, _event: GridEvent) -> u64 { 0 }
    pub fn reset_all(&self) {}
    pub fn iter(&self) -> impl Iterator<Item = (GridEvent, u64)> + '_ { std::iter::empty() }
}

impl Default for GridCounters {
    fn default() -> Self {
        Self::new()
    }
}
