use std::collections::{BTreeSet, HashMap, HashSet};
use std::sync::Arc;
use tokio::sync::{
    mpsc::{unbounded_channel, UnboundedReceiver, UnboundedSender},
    RwLock,
};
use uuid::Uuid;

use super::events::ChannelEvent;

/// Unique identifier for one live-session subscriber.
///
/// Allows precise cleanup when a connection closes, so repeated join/leave
/// cycles cannot leak senders or presence entries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriberId(Uuid);

impl SubscriberId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for SubscriberId {
    fn default() -> Self {
        Self::new()
    }
}

struct Subscriber {
    id: SubscriberId,
    sender: UnboundedSender<ChannelEvent>,
}

#[derive(Default)]
struct StreamEntry {
    subscribers: Vec<Subscriber>,
    /// Presence keys by subscriber; the authoritative membership set for
    /// this stream on this instance.
    presence: HashMap<SubscriberId, String>,
}

/// Per-stream subscriber registry with presence tracking.
///
/// Every presence change re-broadcasts the full membership snapshot rather
/// than a delta, so a receiver that missed events converges on the next
/// sync.
#[derive(Default, Clone)]
pub struct StreamRegistry {
    inner: Arc<RwLock<HashMap<Uuid, StreamEntry>>>,
}

impl StreamRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Subscribe to a stream's events. Returns the id used for cleanup and
    /// the event receiver.
    pub async fn subscribe(
        &self,
        creator_id: Uuid,
    ) -> (SubscriberId, UnboundedReceiver<ChannelEvent>) {
        let (tx, rx) = unbounded_channel();
        let id = SubscriberId::new();

        let mut guard = self.inner.write().await;
        let entry = guard.entry(creator_id).or_default();
        entry.subscribers.push(Subscriber { id, sender: tx });

        tracing::debug!(
            %creator_id,
            subscribers = entry.subscribers.len(),
            "subscriber joined stream"
        );

        (id, rx)
    }

    /// Remove a subscriber and its presence entry; broadcasts a fresh
    /// snapshot if the membership changed.
    pub async fn unsubscribe(&self, creator_id: Uuid, id: SubscriberId) {
        let mut guard = self.inner.write().await;
        let Some(entry) = guard.get_mut(&creator_id) else {
            return;
        };

        entry.subscribers.retain(|s| s.id != id);
        let had_presence = entry.presence.remove(&id).is_some();
        if had_presence {
            Self::broadcast_presence(creator_id, entry);
        }

        if entry.subscribers.is_empty() {
            guard.remove(&creator_id);
            // Last one out: drop the per-stream gauge series so label
            // cardinality stays bounded by concurrently live streams.
            crate::metrics::clear_live_viewers(creator_id);
        }
    }

    /// Register a presence key for a subscriber and resync everyone.
    ///
    /// Re-tracking under the same subscriber replaces the old key, so a
    /// stale registration from a reconnect self-heals.
    pub async fn track(&self, creator_id: Uuid, id: SubscriberId, key: String) {
        let mut guard = self.inner.write().await;
        let entry = guard.entry(creator_id).or_default();
        entry.presence.insert(id, key);
        Self::broadcast_presence(creator_id, entry);
    }

    pub async fn untrack(&self, creator_id: Uuid, id: SubscriberId) {
        let mut guard = self.inner.write().await;
        if let Some(entry) = guard.get_mut(&creator_id) {
            if entry.presence.remove(&id).is_some() {
                Self::broadcast_presence(creator_id, entry);
            }
        }
    }

    /// Send an event to every subscriber of a stream; dead senders are
    /// pruned as a side effect.
    pub async fn broadcast(&self, creator_id: Uuid, event: ChannelEvent) {
        let mut guard = self.inner.write().await;
        if let Some(entry) = guard.get_mut(&creator_id) {
            entry
                .subscribers
                .retain(|s| s.sender.send(event.clone()).is_ok());

            // A connection torn down without leave() must not keep a ghost
            // presence entry; drop presence whose subscriber is gone and
            // resync the survivors.
            let alive: HashSet<SubscriberId> =
                entry.subscribers.iter().map(|s| s.id).collect();
            let before = entry.presence.len();
            entry.presence.retain(|id, _| alive.contains(id));
            if entry.presence.len() != before {
                Self::broadcast_presence(creator_id, entry);
            }
        }
    }

    pub async fn presence_snapshot(&self, creator_id: Uuid) -> Vec<String> {
        let guard = self.inner.read().await;
        guard
            .get(&creator_id)
            .map(|e| Self::distinct_members(e))
            .unwrap_or_default()
    }

    /// Distinct presence keys: a viewer with two open connections is one
    /// member, matching what clients see after deduping a snapshot.
    pub async fn viewer_count(&self, creator_id: Uuid) -> usize {
        let guard = self.inner.read().await;
        guard
            .get(&creator_id)
            .map(|e| e.presence.values().collect::<HashSet<_>>().len())
            .unwrap_or(0)
    }

    pub async fn subscriber_count(&self, creator_id: Uuid) -> usize {
        let guard = self.inner.read().await;
        guard
            .get(&creator_id)
            .map(|e| e.subscribers.len())
            .unwrap_or(0)
    }

    fn distinct_members(entry: &StreamEntry) -> Vec<String> {
        entry
            .presence
            .values()
            .cloned()
            .collect::<BTreeSet<String>>()
            .into_iter()
            .collect()
    }

    fn broadcast_presence(creator_id: Uuid, entry: &mut StreamEntry) {
        let members = Self::distinct_members(entry);
        crate::metrics::set_live_viewers(creator_id, members.len() as i64);
        let event = ChannelEvent::PresenceSync { members };
        entry
            .subscribers
            .retain(|s| s.sender.send(event.clone()).is_ok());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn track_broadcasts_full_snapshot() {
        let registry = StreamRegistry::new();
        let creator = Uuid::new_v4();

        let (id_a, mut rx_a) = registry.subscribe(creator).await;
        let (id_b, mut rx_b) = registry.subscribe(creator).await;

        registry.track(creator, id_a, "alice".into()).await;
        registry.track(creator, id_b, "bob".into()).await;

        // Drain rx_a: the last sync holds the complete membership.
        let mut last = None;
        while let Ok(event) = rx_a.try_recv() {
            last = Some(event);
        }
        match last {
            Some(ChannelEvent::PresenceSync { mut members }) => {
                members.sort();
                assert_eq!(members, vec!["alice".to_string(), "bob".to_string()]);
            }
            other => panic!("expected presence sync, got {other:?}"),
        }

        // rx_b stays subscribed; ensure it received events too.
        assert!(rx_b.try_recv().is_ok());
    }

    #[tokio::test]
    async fn unsubscribe_removes_presence_and_sender() {
        let registry = StreamRegistry::new();
        let creator = Uuid::new_v4();

        let (id_a, _rx_a) = registry.subscribe(creator).await;
        let (id_b, _rx_b) = registry.subscribe(creator).await;
        registry.track(creator, id_a, "alice".into()).await;
        registry.track(creator, id_b, "bob".into()).await;

        registry.unsubscribe(creator, id_a).await;
        assert_eq!(registry.viewer_count(creator).await, 1);
        assert_eq!(registry.subscriber_count(creator).await, 1);
        assert_eq!(
            registry.presence_snapshot(creator).await,
            vec!["bob".to_string()]
        );
    }

    #[tokio::test]
    async fn retrack_replaces_stale_key() {
        let registry = StreamRegistry::new();
        let creator = Uuid::new_v4();

        let (id, _rx) = registry.subscribe(creator).await;
        registry.track(creator, id, "guest_1".into()).await;
        registry.track(creator, id, "guest_2".into()).await;

        assert_eq!(registry.viewer_count(creator).await, 1);
        assert_eq!(
            registry.presence_snapshot(creator).await,
            vec!["guest_2".to_string()]
        );
    }

    #[tokio::test]
    async fn broadcast_prunes_presence_of_dead_subscribers() {
        let registry = StreamRegistry::new();
        let creator = Uuid::new_v4();

        let (id, rx) = registry.subscribe(creator).await;
        registry.track(creator, id, "alice".into()).await;
        assert_eq!(registry.viewer_count(creator).await, 1);

        // Connection torn down without leave().
        drop(rx);
        registry.broadcast(creator, ChannelEvent::StreamEnd).await;

        assert_eq!(registry.viewer_count(creator).await, 0);
        assert!(registry.presence_snapshot(creator).await.is_empty());
    }

    #[tokio::test]
    async fn two_connections_of_one_viewer_count_once() {
        let registry = StreamRegistry::new();
        let creator = Uuid::new_v4();
        let key = Uuid::new_v4().to_string();

        let (id_a, _rx_a) = registry.subscribe(creator).await;
        let (id_b, _rx_b) = registry.subscribe(creator).await;
        registry.track(creator, id_a, key.clone()).await;
        registry.track(creator, id_b, key.clone()).await;

        assert_eq!(registry.viewer_count(creator).await, 1);
        assert_eq!(registry.presence_snapshot(creator).await, vec![key.clone()]);

        // Dropping one connection keeps the member; dropping both removes
        // it.
        registry.untrack(creator, id_a).await;
        registry.unsubscribe(creator, id_a).await;
        assert_eq!(registry.viewer_count(creator).await, 1);

        registry.untrack(creator, id_b).await;
        registry.unsubscribe(creator, id_b).await;
        assert_eq!(registry.viewer_count(creator).await, 0);
    }

    #[tokio::test]
    async fn viewer_gauge_series_dropped_with_last_subscriber() {
        let registry = StreamRegistry::new();
        let creator = Uuid::new_v4();

        let (id, _rx) = registry.subscribe(creator).await;
        registry.track(creator, id, "alice".into()).await;
        registry.untrack(creator, id).await;
        registry.unsubscribe(creator, id).await;

        let label = creator.to_string();
        let lingering = prometheus::gather()
            .iter()
            .filter(|f| f.get_name() == "entitlement_service_live_viewers")
            .flat_map(|f| f.get_metric())
            .any(|m| m.get_label().iter().any(|l| l.get_value() == label));
        assert!(!lingering);
    }
}
