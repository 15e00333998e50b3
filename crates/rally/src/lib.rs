//! # Rally
//!
//! Typed client for commanding and querying a running real-time-strategy
//! game server over its JSON socket protocol.
//!
//! Rally is layered, leaves first:
//!
//! | Crate             | Job                                                  |
//! |-------------------|------------------------------------------------------|
//! | `rally-transport` | one TCP connection per request, read until close     |
//! | `rally-protocol`  | request/response envelopes and their JSON codec      |
//! | `rally-client`    | request id correlation, error classification, retry  |
//! | `rally-poll`      | deadline-bounded polling for long operations         |
//! | `rally`           | [`GameApi`]: one typed method per game command       |
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use rally::prelude::*;
//!
//! # async fn run() -> Result<(), RallyError> {
//! let api = GameApi::from_client(GameClient::builder().host("127.0.0.1").build());
//! if !api.ping().await {
//!     return Ok(());
//! }
//!
//! let infantry = api
//!     .query_actor(&TargetsQuery::new().kind("步兵").faction(FACTION_OWN))
//!     .await?;
//! api.move_units_by_location(&infantry, Location::new(40, 22), true).await?;
//!
//! if api.ensure_can_produce_unit("重坦", &PollConfig::production(), std::time::Duration::from_secs(1)).await? {
//!     api.produce_wait("重坦", 2, false, &PollConfig::production()).await?;
//! }
//! # Ok(())
//! # }
//! ```

mod api;
pub mod deps;
mod domain;
mod error;
mod payload;

pub use api::{GameApi, MAX_ID_SCAN_SPAN, MCV_TYPE};
pub use domain::{
    Actor, ActorId, FACTION_ANY, FACTION_ENEMY, FACTION_NEUTRAL, FACTION_OWN, Location,
    PathMethod, ProductionAction, QueryRange, QueueType, Restraint, TargetsQuery, WaitId,
};
pub use error::RallyError;
pub use payload::{
    AttributeReport, MapInfo, PlayerBaseInfo, ProductionQueue, QueueItem, QueueItemStatus,
    ScreenInfo, UnitAttributes,
};

pub use rally_client as client;
pub use rally_poll as poll;
pub use rally_protocol as protocol;
pub use rally_transport as transport;

/// Convenient re-exports for common usage.
///
/// ```rust
/// use rally::prelude::*;
/// ```
pub mod prelude {
    pub use crate::{
        Actor, ActorId, FACTION_ANY, FACTION_ENEMY, FACTION_OWN, GameApi, Location, PathMethod,
        ProductionAction, QueryRange, QueueType, RallyError, Restraint, TargetsQuery, WaitId,
    };
    pub use rally_client::{ClientBuilder, ClientConfig, ClientError, GameClient, Language};
    pub use rally_poll::{PollConfig, WaitOutcome};
}
