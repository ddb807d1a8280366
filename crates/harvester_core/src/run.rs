use std::fmt;

use crate::{FetchStatus, HarvestEntry, RecordState};

/// Counters reported at the end of every run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct HarvestTally {
    /// Records whose detail fetch completed cleanly.
    pub success: usize,
    /// Records whose detail fetch degraded.
    pub failure: usize,
    /// Records without a detail link.
    pub unlinked: usize,
    /// Records dropped while being processed.
    pub skipped: usize,
    /// Listing elements dropped before becoming records (no question).
    pub listing_dropped: usize,
    /// Summary records handed to the coordinator.
    pub total_considered: usize,
}

impl fmt::Display for HarvestTally {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "success={} failure={} total={} (unlinked={} skipped={} listing_dropped={})",
            self.success,
            self.failure,
            self.total_considered,
            self.unlinked,
            self.skipped,
            self.listing_dropped
        )
    }
}

/// The finished, read-only result of a harvest.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HarvestRun {
    entries: Vec<HarvestEntry>,
    tally: HarvestTally,
}

impl HarvestRun {
    /// Entries in listing discovery order.
    pub fn entries(&self) -> &[HarvestEntry] {
        &self.entries
    }

    pub fn tally(&self) -> HarvestTally {
        self.tally
    }

    pub fn success_count(&self) -> usize {
        self.tally.success
    }

    pub fn failure_count(&self) -> usize {
        self.tally.failure
    }

    pub fn into_entries(self) -> Vec<HarvestEntry> {
        self.entries
    }
}

#[derive(Debug, Default)]
struct Slot {
    state: RecordState,
    entry: Option<HarvestEntry>,
}

/// Mutable accumulator driven by the coordinator.
///
/// Slots are indexed by the record's position in the listing, so the order
/// in which records complete has no effect on the finished run.
#[derive(Debug)]
pub struct HarvestRunBuilder {
    slots: Vec<Slot>,
    tally: HarvestTally,
}

impl HarvestRunBuilder {
    pub fn new(record_count: usize, listing_dropped: usize) -> Self {
        let mut slots = Vec::with_capacity(record_count);
        slots.resize_with(record_count, Slot::default);
        Self {
            slots,
            tally: HarvestTally {
                listing_dropped,
                total_considered: record_count,
                ..HarvestTally::default()
            },
        }
    }

    pub fn state(&self, index: usize) -> Option<RecordState> {
        self.slots.get(index).map(|slot| slot.state)
    }

    /// Pending -> Fetching. Returns false if the record is unknown or not
    /// pending.
    pub fn begin_fetch(&mut self, index: usize) -> bool {
        match self.slots.get_mut(index) {
            Some(slot) if slot.state == RecordState::Pending => {
                slot.state = RecordState::Fetching;
                true
            }
            _ => false,
        }
    }

    /// Pending or Fetching -> Merged, counting the entry by `status`.
    /// Terminal records are left untouched and false is returned.
    pub fn merge(&mut self, index: usize, entry: HarvestEntry, status: FetchStatus) -> bool {
        let Some(slot) = self.slots.get_mut(index) else {
            return false;
        };
        if slot.state.is_terminal() {
            return false;
        }
        slot.state = RecordState::Merged;
        slot.entry = Some(entry);
        match status {
            FetchStatus::Clean => self.tally.success += 1,
            FetchStatus::Degraded => self.tally.failure += 1,
            FetchStatus::NotAttempted => self.tally.unlinked += 1,
        }
        true
    }

    /// Drop a record from the output. Terminal records are left untouched.
    pub fn skip(&mut self, index: usize) -> bool {
        let Some(slot) = self.slots.get_mut(index) else {
            return false;
        };
        if slot.state.is_terminal() {
            return false;
        }
        slot.state = RecordState::Skipped;
        slot.entry = None;
        self.tally.skipped += 1;
        true
    }

    /// Finalize the run. Records never driven to a terminal state are counted
    /// as skipped.
    pub fn finish(mut self) -> HarvestRun {
        let stranded = self
            .slots
            .iter()
            .filter(|slot| !slot.state.is_terminal())
            .count();
        self.tally.skipped += stranded;
        let entries = self.slots.into_iter().filter_map(|slot| slot.entry).collect();
        HarvestRun {
            entries,
            tally: self.tally,
        }
    }
}
