//! `GameApi`: one typed method per game command.
//!
//! Every method builds the command's parameter object from domain values,
//! sends it through [`GameClient::call`], and shapes the answer. The
//! methods fall into four groups:
//!
//! - **Commands** return `()` once the server accepts them.
//! - **Queries** deserialize `data` into a typed struct.
//! - **Checks** return `bool`. A few map a documented server error to
//!   `false` instead of failing (see each method).
//! - **Wait helpers** issue commands, then poll with a caller-supplied
//!   [`PollConfig`] and report whether the goal was reached in time.

use std::ops::Range;
use std::time::Duration;

use rally_client::{ClientConfig, GameClient, Transport};
use rally_poll::{PollConfig, poll_until};
use rally_transport::TcpTransport;
use serde::de::DeserializeOwned;
use serde_json::{Value, json};
use tracing::{debug, warn};

use crate::deps;
use crate::domain::{
    Actor, ActorId, ActorTargets, FACTION_OWN, Location, PathMethod, ProductionAction, QueueType,
    Restraint, TargetsQuery, WaitId,
};
use crate::payload::{
    ActorsData, AttackData, AttributeReport, CanProduceData, FogData, MapInfo, PathData,
    PlayerBaseInfo, ProduceData, ProductionQueue, ScreenInfo, ScreenInfoData, WaitInfoData, parse,
};
use crate::RallyError;

/// Upper bound on how many ids [`GameApi::discover_actors_by_id_scan`]
/// will probe in one call.
pub const MAX_ID_SCAN_SPAN: u64 = 1_000;

/// Type name the server uses for the mobile construction vehicle.
pub const MCV_TYPE: &str = "mcv";

/// Typed client for the game-control server.
///
/// Cheap to share: it holds only the client configuration, and every call
/// opens its own connection.
#[derive(Debug, Clone)]
pub struct GameApi<T = TcpTransport> {
    client: GameClient<T>,
}

impl GameApi<TcpTransport> {
    /// Creates a TCP-backed API from `config`.
    pub fn new(config: ClientConfig) -> Self {
        Self::from_client(GameClient::new(config))
    }
}

impl<T: Transport> From<GameClient<T>> for GameApi<T> {
    fn from(client: GameClient<T>) -> Self {
        Self::from_client(client)
    }
}

impl<T: Transport> GameApi<T> {
    pub fn from_client(client: GameClient<T>) -> Self {
        Self { client }
    }

    /// The underlying request/response client.
    pub fn client(&self) -> &GameClient<T> {
        &self.client
    }

    // -----------------------------------------------------------------------
    // Plumbing
    // -----------------------------------------------------------------------

    /// Sends `command` and returns its `data`, if any.
    async fn call(&self, command: &str, params: Value) -> Result<Option<Value>, RallyError> {
        Ok(self.client.call(command, params).await?.data)
    }

    /// Sends `command` and ignores whatever data comes back.
    async fn command(&self, command: &str, params: Value) -> Result<(), RallyError> {
        self.call(command, params).await.map(drop)
    }

    /// Sends `command` and deserializes `data` into `D`.
    async fn query<D: DeserializeOwned>(&self, command: &str, params: Value) -> Result<D, RallyError> {
        let data = self.call(command, params).await?;
        parse(command, data)
    }

    // -----------------------------------------------------------------------
    // Liveness
    // -----------------------------------------------------------------------

    /// Returns `true` if the server answers a `ping` in time. Never fails.
    pub async fn ping(&self) -> bool {
        self.client.ping().await
    }

    // -----------------------------------------------------------------------
    // Camera
    // -----------------------------------------------------------------------

    pub async fn move_camera_to_location(&self, location: Location) -> Result<(), RallyError> {
        self.command("camera_move", json!({ "location": location })).await
    }

    /// Pans the camera `distance` cells towards `direction` (e.g. `"左上"`).
    pub async fn move_camera_by_direction(&self, direction: &str, distance: i32) -> Result<(), RallyError> {
        self.command("camera_move", json!({ "direction": direction, "distance": distance }))
            .await
    }

    /// Centres the camera on an actor.
    pub async fn move_camera_to_actor(&self, actor: impl Into<ActorId>) -> Result<(), RallyError> {
        self.command("view", json!({ "actorId": actor.into() })).await
    }

    // -----------------------------------------------------------------------
    // Production
    // -----------------------------------------------------------------------

    /// Whether `unit_type` can be produced right now.
    pub async fn can_produce(&self, unit_type: &str) -> Result<bool, RallyError> {
        let data: CanProduceData = self
            .query("query_can_produce", json!({ "units": [{ "unit_type": unit_type }] }))
            .await?;
        Ok(data.can_produce)
    }

    /// Starts producing `quantity` of `unit_type`.
    ///
    /// Returns the task's [`WaitId`], or `None` when the server refuses with
    /// `COMMAND_EXECUTION_ERROR` (nothing to produce it with, no money...).
    /// `auto_place_building` only matters for buildings: it places them at
    /// a server-chosen spot once finished.
    pub async fn produce(
        &self,
        unit_type: &str,
        quantity: u32,
        auto_place_building: bool,
    ) -> Result<Option<WaitId>, RallyError> {
        let params = json!({
            "units": [{ "unit_type": unit_type, "quantity": quantity }],
            "autoPlaceBuilding": auto_place_building,
        });
        match self.query::<ProduceData>("start_production", params).await {
            Ok(data) => Ok(data.wait_id),
            Err(e) if e.is_command_execution_error() => {
                debug!(unit_type, quantity, error = %e, "production refused");
                Ok(None)
            }
            Err(e) => Err(e),
        }
    }

    /// Produces and waits for the task to finish.
    ///
    /// Returns `false` if the server refused to start the task or it did
    /// not finish within `poll.timeout`.
    pub async fn produce_wait(
        &self,
        unit_type: &str,
        quantity: u32,
        auto_place_building: bool,
        poll: &PollConfig,
    ) -> Result<bool, RallyError> {
        match self.produce(unit_type, quantity, auto_place_building).await? {
            Some(wait_id) => self.wait(wait_id, poll).await,
            None => Ok(false),
        }
    }

    /// Whether the task has finished, per its `status` flag.
    pub async fn is_ready(&self, wait_id: WaitId) -> Result<bool, RallyError> {
        let data: WaitInfoData = self.query("query_wait_info", json!({ "waitId": wait_id })).await?;
        Ok(data.status)
    }

    /// Polls until the task reports `waitStatus: "success"`.
    ///
    /// The server forgets finished tasks and then answers with
    /// `COMMAND_EXECUTION_ERROR`, so that error counts as finished.
    pub async fn wait(&self, wait_id: WaitId, poll: &PollConfig) -> Result<bool, RallyError> {
        let outcome = poll_until(poll, move || async move {
            let data: WaitInfoData = self.query("query_wait_info", json!({ "waitId": wait_id })).await?;
            Ok::<_, RallyError>(data.succeeded())
        })
        .await;

        match outcome {
            Ok(outcome) => Ok(outcome.is_done()),
            Err(e) if e.is_command_execution_error() => {
                debug!(%wait_id, "wait task no longer known, treating as finished");
                Ok(true)
            }
            Err(e) => Err(e),
        }
    }

    pub async fn query_production_queue(&self, queue: QueueType) -> Result<ProductionQueue, RallyError> {
        self.query("query_production_queue", json!({ "queueType": queue })).await
    }

    /// Places the finished building at the head of `queue`, at `location`
    /// or at a server-chosen spot.
    pub async fn place_building(&self, queue: QueueType, location: Option<Location>) -> Result<(), RallyError> {
        let mut params = json!({ "queueType": queue });
        if let Some(location) = location {
            params["location"] = json!(location);
        }
        self.command("place_building", params).await
    }

    pub async fn manage_production(&self, queue: QueueType, action: ProductionAction) -> Result<(), RallyError> {
        self.command("manage_production", json!({ "queueType": queue, "action": action }))
            .await
    }

    // -----------------------------------------------------------------------
    // Movement
    // -----------------------------------------------------------------------

    /// Orders `actors` to `location`. With `attack_move` they engage
    /// anything they meet on the way.
    pub async fn move_units_by_location<I>(
        &self,
        actors: I,
        location: Location,
        attack_move: bool,
    ) -> Result<(), RallyError>
    where
        I: IntoIterator,
        I::Item: Into<ActorId>,
    {
        let params = json!({
            "targets": ActorTargets::new(actors),
            "location": location,
            "isAttackMove": u8::from(attack_move),
        });
        self.command("move_actor", params).await
    }

    pub async fn move_units_by_direction<I>(&self, actors: I, direction: &str, distance: i32) -> Result<(), RallyError>
    where
        I: IntoIterator,
        I::Item: Into<ActorId>,
    {
        let params = json!({
            "targets": ActorTargets::new(actors),
            "direction": direction,
            "distance": distance,
        });
        self.command("move_actor", params).await
    }

    /// Orders `actors` along `path`. An empty path sends nothing.
    pub async fn move_units_by_path<I>(&self, actors: I, path: &[Location]) -> Result<(), RallyError>
    where
        I: IntoIterator,
        I::Item: Into<ActorId>,
    {
        if path.is_empty() {
            return Ok(());
        }
        let params = json!({ "targets": ActorTargets::new(actors), "path": path });
        self.command("move_actor", params).await
    }

    /// Moves `actors` to `location` and waits until every one of them is
    /// within `tolerance` cells (Manhattan) of it.
    ///
    /// An actor that disappears (destroyed, garrisoned) never arrives, so
    /// the wait then runs to the timeout and returns `false`.
    pub async fn move_units_by_location_and_wait<I>(
        &self,
        actors: I,
        location: Location,
        tolerance: u32,
        poll: &PollConfig,
    ) -> Result<bool, RallyError>
    where
        I: IntoIterator,
        I::Item: Into<ActorId>,
    {
        let ids: Vec<ActorId> = actors.into_iter().map(Into::into).collect();
        self.move_units_by_location(&ids, location, false).await?;

        let ids = &ids;
        let outcome = poll_until(poll, move || async move {
            let data: ActorsData = self
                .query("query_actor", json!({ "targets": ActorTargets::new(ids) }))
                .await?;
            let actors: Vec<Actor> = data.actors.into_iter().map(Actor::from).collect();
            let arrived = ids.iter().all(|id| {
                actors
                    .iter()
                    .any(|a| a.id == *id && a.position.manhattan_distance(location) <= tolerance)
            });
            Ok::<_, RallyError>(arrived)
        })
        .await?;
        Ok(outcome.is_done())
    }

    /// Computes a route for `actors` to `destination`.
    ///
    /// The first point is the destination and the last is the actors'
    /// current position; neighbouring points touch in one of eight
    /// directions.
    pub async fn find_path<I>(&self, actors: I, destination: Location, method: PathMethod) -> Result<Vec<Location>, RallyError>
    where
        I: IntoIterator,
        I::Item: Into<ActorId>,
    {
        let params = json!({
            "targets": ActorTargets::new(actors),
            "destination": destination,
            "method": method,
        });
        let data: PathData = self.query("query_path", params).await?;
        Ok(data.path)
    }

    pub async fn set_rally_point<I>(&self, actors: I, location: Location) -> Result<(), RallyError>
    where
        I: IntoIterator,
        I::Item: Into<ActorId>,
    {
        let params = json!({ "targets": ActorTargets::new(actors), "location": location });
        self.command("set_rally_point", params).await
    }

    // -----------------------------------------------------------------------
    // Selection and groups
    // -----------------------------------------------------------------------

    /// Performs an in-game selection of the actors matching `query`.
    pub async fn select_units(&self, query: &TargetsQuery) -> Result<(), RallyError> {
        self.command("select_unit", json!({ "targets": query })).await
    }

    pub async fn form_group<I>(&self, actors: I, group_id: i64) -> Result<(), RallyError>
    where
        I: IntoIterator,
        I::Item: Into<ActorId>,
    {
        let params = json!({ "targets": ActorTargets::new(actors), "groupId": group_id });
        self.command("form_group", params).await
    }

    // -----------------------------------------------------------------------
    // Actor queries
    // -----------------------------------------------------------------------

    /// Every actor matching `query`.
    ///
    /// # Errors
    /// [`RallyError::MalformedPayload`] if any record lacks its id, type,
    /// faction, position or health fields.
    pub async fn query_actor(&self, query: &TargetsQuery) -> Result<Vec<Actor>, RallyError> {
        let data: ActorsData = self.query("query_actor", json!({ "targets": query })).await?;
        Ok(data.actors.into_iter().map(Actor::from).collect())
    }

    /// A fresh snapshot of one actor, or `None` if it no longer exists.
    ///
    /// Records for any other id in the reply are ignored.
    pub async fn get_actor_by_id(&self, id: impl Into<ActorId>) -> Result<Option<Actor>, RallyError> {
        let id = id.into();
        let data: ActorsData = self
            .query("query_actor", json!({ "targets": ActorTargets::new([id]) }))
            .await?;
        Ok(data.actors.into_iter().map(Actor::from).find(|actor| actor.id == id))
    }

    /// Refreshes `actor` in place. Returns `false`, leaving it untouched,
    /// if the actor no longer exists.
    pub async fn update_actor(&self, actor: &mut Actor) -> Result<bool, RallyError> {
        match self.get_actor_by_id(actor.id).await? {
            Some(fresh) => {
                *actor = fresh;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    /// Probes every id in `ids` one request at a time, `pace` apart, and
    /// returns the actors that exist.
    ///
    /// A fallback for when a filtered [`query_actor`](Self::query_actor)
    /// can't express what's wanted. The span is capped at
    /// [`MAX_ID_SCAN_SPAN`] ids.
    pub async fn discover_actors_by_id_scan(&self, ids: Range<u64>, pace: Duration) -> Result<Vec<Actor>, RallyError> {
        let end = ids.end.min(ids.start.saturating_add(MAX_ID_SCAN_SPAN));
        if end < ids.end {
            warn!(start = ids.start, requested_end = ids.end, end, "id scan span capped");
        }

        let mut found = Vec::new();
        for id in ids.start..end {
            if id > ids.start {
                tokio::time::sleep(pace).await;
            }
            if let Some(actor) = self.get_actor_by_id(ActorId(id)).await? {
                found.push(actor);
            }
        }
        debug!(scanned = end.saturating_sub(ids.start), found = found.len(), "id scan finished");
        Ok(found)
    }

    pub async fn unit_attribute_query<I>(&self, actors: I) -> Result<AttributeReport, RallyError>
    where
        I: IntoIterator,
        I::Item: Into<ActorId>,
    {
        self.query("unit_attribute_query", json!({ "targets": ActorTargets::new(actors) }))
            .await
    }

    // -----------------------------------------------------------------------
    // Unit orders
    // -----------------------------------------------------------------------

    /// Deploys (unpacks) the actors, e.g. turns an MCV into a base.
    pub async fn deploy_units<I>(&self, actors: I) -> Result<(), RallyError>
    where
        I: IntoIterator,
        I::Item: Into<ActorId>,
    {
        self.command("deploy", json!({ "targets": ActorTargets::new(actors) })).await
    }

    pub async fn occupy_units<O, G>(&self, occupiers: O, targets: G) -> Result<(), RallyError>
    where
        O: IntoIterator,
        O::Item: Into<ActorId>,
        G: IntoIterator,
        G::Item: Into<ActorId>,
    {
        let params = json!({
            "occupiers": ActorTargets::new(occupiers),
            "targets": ActorTargets::new(targets),
        });
        self.command("occupy", params).await
    }

    /// Orders `attacker` to attack `target`.
    ///
    /// Returns `false` when the attack could not be started (target not
    /// visible or unreachable, attacker dead), which the server reports as
    /// `COMMAND_EXECUTION_ERROR` or as a non-positive `data.status`.
    pub async fn attack_target(&self, attacker: impl Into<ActorId>, target: impl Into<ActorId>) -> Result<bool, RallyError> {
        let params = json!({
            "attackers": ActorTargets::new([attacker.into()]),
            "targets": ActorTargets::new([target.into()]),
        });
        match self.call("attack", params).await {
            // No data: the envelope's own positive status is the answer.
            Ok(None) => Ok(true),
            Ok(data) => Ok(parse::<AttackData>("attack", data)?.status > 0),
            Err(e) if e.is_command_execution_error() => {
                debug!(error = %e, "attack refused");
                Ok(false)
            }
            Err(e) => Err(e),
        }
    }

    /// Whether `target` is currently visible, and so attackable, for
    /// `attacker`'s side. Any server error counts as `false`.
    pub async fn can_attack_target(&self, attacker: impl Into<ActorId>, target: impl Into<ActorId>) -> Result<bool, RallyError> {
        let attacker = attacker.into();
        let targets = ActorTargets::new([target.into()]).restrain(Restraint::Visible(true));
        match self.query::<ActorsData>("query_actor", json!({ "targets": targets })).await {
            Ok(data) => Ok(!data.actors.is_empty()),
            Err(e) if e.server_error().is_some() => {
                debug!(%attacker, error = %e, "visibility check refused");
                Ok(false)
            }
            Err(e) => Err(e),
        }
    }

    /// Sends vehicles to repair, or starts repairing buildings.
    pub async fn repair_units<I>(&self, actors: I) -> Result<(), RallyError>
    where
        I: IntoIterator,
        I::Item: Into<ActorId>,
    {
        self.command("repair", json!({ "targets": ActorTargets::new(actors) })).await
    }

    pub async fn stop<I>(&self, actors: I) -> Result<(), RallyError>
    where
        I: IntoIterator,
        I::Item: Into<ActorId>,
    {
        self.command("stop", json!({ "targets": ActorTargets::new(actors) })).await
    }

    // -----------------------------------------------------------------------
    // Map and player state
    // -----------------------------------------------------------------------

    /// Whether `location` is in view. Any server error counts as `false`.
    pub async fn visible_query(&self, location: Location) -> Result<bool, RallyError> {
        Ok(self.fog(location).await?.is_some_and(|fog| fog.is_visible))
    }

    /// Whether `location` has ever been seen. Any server error counts as
    /// `false`.
    pub async fn explorer_query(&self, location: Location) -> Result<bool, RallyError> {
        Ok(self.fog(location).await?.is_some_and(|fog| fog.is_explored))
    }

    /// `fog_query` with server errors mapped to `None`.
    async fn fog(&self, location: Location) -> Result<Option<FogData>, RallyError> {
        match self.query::<FogData>("fog_query", json!({ "pos": location })).await {
            Ok(fog) => Ok(Some(fog)),
            Err(e) if e.server_error().is_some() => {
                debug!(%location, error = %e, "fog query refused");
                Ok(None)
            }
            Err(e) => Err(e),
        }
    }

    pub async fn map_query(&self) -> Result<MapInfo, RallyError> {
        self.query("map_query", json!({})).await
    }

    pub async fn player_base_info_query(&self) -> Result<PlayerBaseInfo, RallyError> {
        self.query("player_baseinfo_query", json!({})).await
    }

    pub async fn screen_info_query(&self) -> Result<ScreenInfo, RallyError> {
        let data: ScreenInfoData = self.query("screen_info_query", json!({})).await?;
        Ok(data.into())
    }

    // -----------------------------------------------------------------------
    // Base building
    // -----------------------------------------------------------------------

    /// Deploys our MCV, then gives the server `settle` to finish unpacking.
    ///
    /// Returns `false` if we have no MCV.
    pub async fn deploy_mcv_and_wait(&self, settle: Duration) -> Result<bool, RallyError> {
        let mcv = self
            .query_actor(&TargetsQuery::new().kind(MCV_TYPE).faction(FACTION_OWN))
            .await?;
        if mcv.is_empty() {
            debug!("no MCV to deploy");
            return Ok(false);
        }
        self.deploy_units(&mcv).await?;
        tokio::time::sleep(settle).await;
        Ok(true)
    }

    /// Makes sure we own `building`, producing it and any missing
    /// prerequisites in dependency order.
    ///
    /// Each production is awaited with `poll`. Returns `false` as soon as
    /// one building in the chain can't be produced or doesn't finish.
    pub async fn ensure_can_build_wait(&self, building: &str, poll: &PollConfig) -> Result<bool, RallyError> {
        if self.owns(building).await? {
            return Ok(true);
        }
        for step in deps::build_order(building) {
            if !self.ensure_building(step, poll).await? {
                debug!(building, missing = step, "build chain stopped");
                return Ok(false);
            }
        }
        Ok(true)
    }

    /// Makes sure `unit` can be produced, building whatever it needs.
    ///
    /// Prerequisites are attempted best-effort. If the unit still can't be
    /// produced afterwards, waits `settle` once (a fresh building may
    /// still be powering up) and asks again.
    pub async fn ensure_can_produce_unit(&self, unit: &str, poll: &PollConfig, settle: Duration) -> Result<bool, RallyError> {
        if self.can_produce(unit).await? {
            return Ok(true);
        }
        for building in deps::unit_prerequisites(unit) {
            for step in deps::build_order(building) {
                if !self.ensure_building(step, poll).await? {
                    debug!(unit, building, missing = step, "prerequisite not available");
                    break;
                }
            }
        }
        if self.can_produce(unit).await? {
            return Ok(true);
        }
        tokio::time::sleep(settle).await;
        self.can_produce(unit).await
    }

    /// Whether we already own at least one `building`.
    async fn owns(&self, building: &str) -> Result<bool, RallyError> {
        let found = self
            .query_actor(&TargetsQuery::new().kind(building).faction(FACTION_OWN))
            .await?;
        Ok(!found.is_empty())
    }

    /// Owns `building` already, or produces one (auto-placed) and waits.
    async fn ensure_building(&self, building: &str, poll: &PollConfig) -> Result<bool, RallyError> {
        if self.owns(building).await? {
            return Ok(true);
        }
        if !self.can_produce(building).await? {
            return Ok(false);
        }
        match self.produce(building, 1, true).await? {
            Some(wait_id) => self.wait(wait_id, poll).await,
            None => Ok(false),
        }
    }
}
