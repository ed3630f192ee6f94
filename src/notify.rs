use dashmap::DashMap;
use tokio::sync::broadcast;

use crate::model::{Outcome, SiteId};

const CHANNEL_CAPACITY: usize = 256;

/// Broadcast hub for scheduler outcomes, both as one global feed and per
/// site.
pub struct OutcomeHub {
    all: broadcast::Sender<Outcome>,
    sites: DashMap<SiteId, broadcast::Sender<Outcome>>,
}

impl Default for OutcomeHub {
    fn default() -> Self {
        Self::new()
    }
}

impl OutcomeHub {
    pub fn new() -> Self {
        Self {
            all: broadcast::channel(CHANNEL_CAPACITY).0,
            sites: DashMap::new(),
        }
    }

    /// Every outcome, rejections included.
    pub fn subscribe(&self) -> broadcast::Receiver<Outcome> {
        self.all.subscribe()
    }

    /// Outcomes touching one site. Creates the channel if needed.
    pub fn subscribe_site(&self, site_id: SiteId) -> broadcast::Receiver<Outcome> {
        let sender = self
            .sites
            .entry(site_id)
            .or_insert_with(|| broadcast::channel(CHANNEL_CAPACITY).0);
        sender.subscribe()
    }

    /// Send an outcome. No-op if nobody is listening.
    pub fn send(&self, outcome: &Outcome) {
        let _ = self.all.send(outcome.clone());
        if let Some(site_id) = outcome.site_id()
            && let Some(sender) = self.sites.get(&site_id)
        {
            let _ = sender.send(outcome.clone());
        }
    }

    /// Drop a site's channel. Existing receivers see the stream close.
    pub fn remove(&self, site_id: &SiteId) {
        self.sites.remove(site_id);
    }
}
