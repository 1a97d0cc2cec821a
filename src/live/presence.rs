use std::collections::HashSet;
use uuid::Uuid;

/// Presence key for one open connection: the user id, or a per-connection
/// guest marker for anonymous viewers of an ungated stream.
pub fn presence_key(user_id: Option<Uuid>) -> String {
    match user_id {
        Some(id) => id.to_string(),
        None => format!("guest_{}", Uuid::new_v4().simple()),
    }
}

/// Viewer-side projection of a stream's presence membership.
///
/// The transport delivers full snapshots, not join/leave deltas; every sync
/// replaces the whole set, so missed events cannot accumulate drift.
#[derive(Debug, Clone, Default)]
pub struct PresenceSet {
    members: HashSet<String>,
}

impl PresenceSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn apply_sync<I>(&mut self, members: I)
    where
        I: IntoIterator<Item = String>,
    {
        self.members = members.into_iter().collect();
    }

    pub fn viewer_count(&self) -> usize {
        self.members.len()
    }

    pub fn contains(&self, key: &str) -> bool {
        self.members.contains(key)
    }
}
