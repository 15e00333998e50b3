//! Domain value objects: positions, actor handles, query filters and the
//! small enums the server accepts as parameters.
//!
//! None of these talk to the server. They are plain data with equality,
//! arithmetic and the serde shape each command expects.

use std::borrow::Borrow;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::ops::{Add, Div, Mul, Sub};

use serde::{Deserialize, Serialize};

/// Faction name for the caller's own side, as the server spells it.
pub const FACTION_OWN: &str = "自己";
/// Faction name for hostile actors.
pub const FACTION_ENEMY: &str = "敌人";
/// Faction name for neutral actors.
pub const FACTION_NEUTRAL: &str = "中立";
/// Faction filter matching every side.
pub const FACTION_ANY: &str = "任意";

// ---------------------------------------------------------------------------
// Location
// ---------------------------------------------------------------------------

/// A map cell. The origin is the top-left corner, `x` grows to the right
/// and `y` grows downwards.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Location {
    pub x: i32,
    pub y: i32,
}

impl Location {
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    pub fn manhattan_distance(self, other: Location) -> u32 {
        self.x.abs_diff(other.x) + self.y.abs_diff(other.y)
    }

    pub fn euclidean_distance(self, other: Location) -> f64 {
        let dx = f64::from(self.x) - f64::from(other.x);
        let dy = f64::from(self.y) - f64::from(other.y);
        dx.hypot(dy)
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

// Add, Sub and Mul saturate at the i32 bounds on each axis.

impl Add for Location {
    type Output = Location;

    fn add(self, rhs: Location) -> Location {
        Location::new(self.x.saturating_add(rhs.x), self.y.saturating_add(rhs.y))
    }
}

impl Sub for Location {
    type Output = Location;

    fn sub(self, rhs: Location) -> Location {
        Location::new(self.x.saturating_sub(rhs.x), self.y.saturating_sub(rhs.y))
    }
}

impl Mul<i32> for Location {
    type Output = Location;

    fn mul(self, factor: i32) -> Location {
        Location::new(self.x.saturating_mul(factor), self.y.saturating_mul(factor))
    }
}

impl Div<i32> for Location {
    type Output = Location;

    /// Floor division on both axes, so `(-3, 3) / 2 == (-2, 1)`.
    ///
    /// # Panics
    /// Panics if `divisor` is zero, like integer division.
    fn div(self, divisor: i32) -> Location {
        Location::new(floor_div(self.x, divisor), floor_div(self.y, divisor))
    }
}

fn floor_div(a: i32, b: i32) -> i32 {
    let q = a / b;
    if a % b != 0 && ((a < 0) != (b < 0)) {
        q - 1
    } else {
        q
    }
}

// ---------------------------------------------------------------------------
// Actors
// ---------------------------------------------------------------------------

/// Numeric handle of a unit or building on the server.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ActorId(pub u64);

impl ActorId {
    pub fn into_inner(self) -> u64 {
        self.0
    }
}

impl fmt::Display for ActorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "actor-{}", self.0)
    }
}

impl From<u64> for ActorId {
    fn from(id: u64) -> Self {
        Self(id)
    }
}

impl From<&Actor> for ActorId {
    fn from(actor: &Actor) -> Self {
        actor.id
    }
}

impl From<&ActorId> for ActorId {
    fn from(id: &ActorId) -> Self {
        *id
    }
}

/// A snapshot of one actor as the server last described it.
///
/// Everything except `id` goes stale as soon as game time moves on; call
/// [`GameApi::update_actor`](crate::GameApi::update_actor) to refresh.
/// Two snapshots are equal (and hash alike) when their ids are equal,
/// whatever the other fields say.
#[derive(Debug, Clone, Serialize)]
pub struct Actor {
    pub id: ActorId,
    /// Unit or building type name, e.g. `"步兵"`.
    pub kind: String,
    pub faction: String,
    pub position: Location,
    /// Health as a whole percentage, or `-1` when the actor has no
    /// maximum health (e.g. some neutral props).
    pub hp_percent: i64,
}

impl PartialEq for Actor {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for Actor {}

impl Hash for Actor {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

/// Lets a `HashSet<Actor>` be probed with a bare [`ActorId`].
impl Borrow<ActorId> for Actor {
    fn borrow(&self) -> &ActorId {
        &self.id
    }
}

// ---------------------------------------------------------------------------
// Target queries
// ---------------------------------------------------------------------------

/// One extra condition on a [`TargetsQuery`].
///
/// Serializes as a single-key object: `{"distance": 5}`, `{"visible": true}`
/// or `{"maxnum": 3}`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Restraint {
    /// Only actors within this distance of the query's `location`.
    Distance(u32),
    /// Only actors whose visibility matches.
    Visible(bool),
    /// At most this many actors; the ones nearest the query's `direction`
    /// if one is set, otherwise an arbitrary pick.
    MaxNum(u32),
}

/// Which actors a query starts from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QueryRange {
    Screen,
    Selected,
    All,
}

/// Filter describing a set of actors.
///
/// Unset fields are sent as `null`, which the server reads as "no
/// constraint".
///
/// ```rust
/// use rally::{Location, QueryRange, Restraint, TargetsQuery};
///
/// let nearby_tanks = TargetsQuery::new()
///     .kind("重坦")
///     .faction("敌人")
///     .location(Location::new(40, 22))
///     .restrain(Restraint::Distance(10))
///     .range(QueryRange::All);
/// assert_eq!(nearby_tanks.types.as_deref(), Some(&["重坦".to_string()][..]));
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct TargetsQuery {
    #[serde(rename = "type")]
    pub types: Option<Vec<String>>,
    pub faction: Option<String>,
    #[serde(rename = "groupId")]
    pub group_ids: Option<Vec<i64>>,
    pub restrain: Option<Vec<Restraint>>,
    /// Reference point for [`Restraint::Distance`].
    pub location: Option<Location>,
    /// Reference direction for [`Restraint::MaxNum`].
    pub direction: Option<String>,
    pub range: Option<QueryRange>,
}

impl TargetsQuery {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds one type name to the type filter.
    pub fn kind(mut self, kind: impl Into<String>) -> Self {
        self.types.get_or_insert_with(Vec::new).push(kind.into());
        self
    }

    /// Replaces the type filter.
    pub fn types<I, S>(mut self, kinds: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.types = Some(kinds.into_iter().map(Into::into).collect());
        self
    }

    pub fn faction(mut self, faction: impl Into<String>) -> Self {
        self.faction = Some(faction.into());
        self
    }

    pub fn group(mut self, group_id: i64) -> Self {
        self.group_ids.get_or_insert_with(Vec::new).push(group_id);
        self
    }

    pub fn restrain(mut self, restraint: Restraint) -> Self {
        self.restrain.get_or_insert_with(Vec::new).push(restraint);
        self
    }

    pub fn location(mut self, location: Location) -> Self {
        self.location = Some(location);
        self
    }

    pub fn direction(mut self, direction: impl Into<String>) -> Self {
        self.direction = Some(direction.into());
        self
    }

    pub fn range(mut self, range: QueryRange) -> Self {
        self.range = Some(range);
        self
    }
}

/// Explicit list of actors, the `{"actorId": [...]}` form of a target.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub(crate) struct ActorTargets {
    #[serde(rename = "actorId")]
    pub(crate) actor_id: Vec<ActorId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) restrain: Option<Vec<Restraint>>,
}

impl ActorTargets {
    pub(crate) fn new<I>(actors: I) -> Self
    where
        I: IntoIterator,
        I::Item: Into<ActorId>,
    {
        Self {
            actor_id: actors.into_iter().map(Into::into).collect(),
            restrain: None,
        }
    }

    pub(crate) fn restrain(mut self, restraint: Restraint) -> Self {
        self.restrain.get_or_insert_with(Vec::new).push(restraint);
        self
    }
}

// ---------------------------------------------------------------------------
// Production
// ---------------------------------------------------------------------------

/// Identifier of a production task, used to poll for its completion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct WaitId(pub i64);

impl fmt::Display for WaitId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "wait-{}", self.0)
    }
}

/// The production queues a player owns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum QueueType {
    Building,
    Defense,
    Infantry,
    Vehicle,
    Aircraft,
    Naval,
}

/// What to do with the item at the head of a production queue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProductionAction {
    Pause,
    Cancel,
    Resume,
}

/// Route preference for path finding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum PathMethod {
    #[default]
    #[serde(rename = "最短路")]
    Shortest,
    #[serde(rename = "左路")]
    Left,
    #[serde(rename = "右路")]
    Right,
}
