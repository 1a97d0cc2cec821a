//! Live session coordination: presence, chat fanout, and the trusted tip
//! leaderboard, all gated by the entitlement resolver.

pub mod events;
pub mod fanout;
pub mod leaderboard;
pub mod presence;
pub mod registry;
pub mod session;

pub use events::{stream_topic, ChannelEvent, ClientCommand};
pub use leaderboard::LeaderboardCache;
pub use presence::PresenceSet;
pub use registry::{StreamRegistry, SubscriberId};
pub use session::{LiveSessionManager, ViewerSession};
