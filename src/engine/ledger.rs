use std::collections::HashMap;

use chrono::NaiveDate;

use crate::model::*;

/// Local copy of the calendar window the UI is showing.
#[derive(Debug, Clone, Default)]
pub struct Ledger {
    pub(super) window: Option<StayRange>,
    sites: Vec<Site>,
    /// Per-site intervals, sorted by `start_date`.
    by_site: HashMap<SiteId, Vec<StayInterval>>,
    /// Reverse lookup: interval key → site it currently sits on.
    index: HashMap<IntervalKey, SiteId>,
}

impl Ledger {
    pub fn replace_all(
        &mut self,
        window: StayRange,
        sites: Vec<Site>,
        bookings: Vec<Booking>,
        reservations: Vec<Reservation>,
    ) {
        self.window = Some(window);
        self.sites = sites;
        self.by_site.clear();
        self.index.clear();
        for interval in into_intervals(bookings, reservations) {
            self.upsert(interval);
        }
    }

    /// Swap in freshly listed data for one site over `window`. Anything we
    /// had there that the store no longer reports is dropped.
    pub fn replace_site_window(
        &mut self,
        site_id: SiteId,
        window: &StayRange,
        fresh: impl IntoIterator<Item = StayInterval>,
    ) {
        let stale: Vec<IntervalKey> = self
            .overlapping(site_id, window)
            .map(StayInterval::key)
            .collect();
        for key in stale {
            self.remove(&key);
        }
        for interval in fresh {
            self.upsert(interval);
        }
    }

    /// Insert or replace by key, keeping per-site order. Handles an
    /// interval that changed sites.
    pub fn upsert(&mut self, interval: StayInterval) {
        let key = interval.key();
        self.remove(&key);
        let site_id = interval.site_id();
        let list = self.by_site.entry(site_id).or_default();
        let start = interval.start_date();
        let pos = list.partition_point(|i| i.start_date() <= start);
        list.insert(pos, interval);
        self.index.insert(key, site_id);
    }

    pub fn remove(&mut self, key: &IntervalKey) -> Option<StayInterval> {
        let site_id = self.index.remove(key)?;
        let list = self.by_site.get_mut(&site_id)?;
        let pos = list.iter().position(|i| i.key() == *key)?;
        Some(list.remove(pos))
    }

    pub fn get(&self, key: &IntervalKey) -> Option<&StayInterval> {
        let site_id = self.index.get(key)?;
        self.by_site.get(site_id)?.iter().find(|i| i.key() == *key)
    }

    pub fn site(&self, id: SiteId) -> Option<&Site> {
        self.sites.iter().find(|s| s.id == id)
    }

    pub fn sites(&self) -> &[Site] {
        &self.sites
    }

    pub fn on_site(&self, site_id: SiteId) -> &[StayInterval] {
        self.by_site.get(&site_id).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn intervals(&self) -> impl Iterator<Item = &StayInterval> {
        self.by_site.values().flatten()
    }

    pub fn len(&self) -> usize {
        self.index.len()
    }

    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    /// Intervals on `site_id` sharing a night with `query`.
    /// Binary search skips everything starting at or after `query.end`.
    pub fn overlapping(&self, site_id: SiteId, query: &StayRange) -> impl Iterator<Item = &StayInterval> {
        let list = self.on_site(site_id);
        let right_bound = list.partition_point(|i| i.start_date() < query.end);
        let query_start = query.start;
        list[..right_bound]
            .iter()
            .filter(move |i| i.end_date() > query_start)
    }

    /// Whether anyone is on `site_id` the night of `day`. Cancelled
    /// reservations don't count.
    pub fn occupied(&self, site_id: SiteId, day: NaiveDate) -> bool {
        self.on_site(site_id)
            .iter()
            .any(|i| i.occupies_site() && i.start_date() <= day && day < i.end_date())
    }
}

pub(super) fn into_intervals(
    bookings: Vec<Booking>,
    reservations: Vec<Reservation>,
) -> impl Iterator<Item = StayInterval> {
    bookings
        .into_iter()
        .map(StayInterval::Booking)
        .chain(reservations.into_iter().map(StayInterval::Reservation))
}
