//! Sequence watermark tracker.
//!
//! Turns possibly repeated fetch batches into a strictly-ordered sequence of
//! "new" events. Holds the highest item id ever classified; an item is new
//! iff the watermark is primed and the id compares strictly greater.
//! Advancement is unconditional with respect to downstream transform or
//! delivery outcomes, so a failed notification is never re-attempted on the
//! next cycle (at-most-once).

use crate::source::FetchedItem;

/// One classified item out of a batch.
#[derive(Debug, Clone)]
pub struct Classified {
    pub item: FetchedItem,
    pub is_new: bool,
}

/// Highest processed item id. `None` until the first non-empty batch, which
/// primes the baseline silently instead of flooding a cold start with the
/// fetched backlog.
#[derive(Debug, Clone, Default)]
pub struct Watermark {
    high: Option<String>,
}

impl Watermark {
    pub fn new() -> Self {
        Self::default()
    }

    /// Resume from a known id (primed from the start). Used by tests and by
    /// embedders that seed a baseline explicitly.
    pub fn from_id(id: impl Into<String>) -> Self {
        Self {
            high: Some(id.into()),
        }
    }

    pub fn is_primed(&self) -> bool {
        self.high.is_some()
    }

    pub fn high(&self) -> Option<&str> {
        self.high.as_deref()
    }

    /// Classify a batch sorted ascending by id (caller sorts). Afterwards the
    /// watermark equals `max(previous, last id in batch)`; an empty batch is
    /// a no-op.
    pub fn classify(&mut self, batch: Vec<FetchedItem>) -> Vec<Classified> {
        debug_assert!(
            batch.windows(2).all(|w| w[0].id <= w[1].id),
            "batch must be sorted ascending by id"
        );

        let Some(last_id) = batch.last().map(|it| it.id.clone()) else {
            return Vec::new();
        };

        let out: Vec<Classified> = batch
            .into_iter()
            .map(|item| {
                let is_new = match &self.high {
                    Some(high) => item.id > *high,
                    None => false,
                };
                Classified { item, is_new }
            })
            .collect();

        let advance = match &self.high {
            Some(high) => *high < last_id,
            None => true,
        };
        if advance {
            tracing::debug!(high = %last_id, "watermark advanced");
            self.high = Some(last_id);
        }

        out
    }
}
