//! Time-slot dispatch tracker.
//!
//! A `Slot` names a daily time window; the `DispatchLedger` remembers which
//! `(day, slot)` pairs already fired so a slot delivers at most once per
//! calendar day. Eligibility is level-triggered on the hour value, so the
//! poll interval must stay under one hour for the window to be observed.

use std::collections::HashSet;

use chrono::{DateTime, NaiveDate, Timelike, Utc};
use serde::Deserialize;

/// Static slot definition, read from the slots config file.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct Slot {
    pub name: String,
    /// Hour of day (0-23, UTC) at which the slot fires.
    pub trigger_hour: u32,
    /// Day offset of the forecast target relative to "today".
    #[serde(default)]
    pub target_offset_days: i64,
    /// Hour of day the forecast target refers to.
    pub target_hour: u32,
}

/// Set of slot-keys already dispatched. Pruned to the current day at the
/// start of each cycle, which keeps it bounded and makes day rollover
/// implicit.
#[derive(Debug, Default)]
pub struct DispatchLedger {
    fired: HashSet<(NaiveDate, String)>,
}

impl DispatchLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Drop every entry whose day is not `today`.
    pub fn prune(&mut self, today: NaiveDate) {
        let before = self.fired.len();
        self.fired.retain(|(day, _)| *day == today);
        let dropped = before - self.fired.len();
        if dropped > 0 {
            tracing::debug!(dropped, "pruned stale ledger entries");
        }
    }

    /// True iff `now` is inside the slot's trigger hour and the slot has not
    /// fired today. Does not mutate state.
    pub fn is_eligible(&self, slot: &Slot, now: DateTime<Utc>) -> bool {
        now.hour() == slot.trigger_hour
            && !self
                .fired
                .contains(&(now.date_naive(), slot.name.clone()))
    }

    /// Record that a dispatch attempt was made for `slot` today. Called
    /// unconditionally once a best-effort delivery attempt happened; a
    /// failed delivery still marks, trading a possible missed notification
    /// for never sending twice.
    pub fn mark_dispatched(&mut self, slot: &Slot, now: DateTime<Utc>) {
        self.fired.insert((now.date_naive(), slot.name.clone()));
    }

    pub fn len(&self) -> usize {
        self.fired.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fired.is_empty()
    }

    #[cfg(test)]
    pub(crate) fn seed(&mut self, day: NaiveDate, name: &str) {
        self.fired.insert((day, name.to_string()));
    }
}
