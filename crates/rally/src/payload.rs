//! Typed shapes of the `data` member, one per command.
//!
//! Each query deserializes the server's `data` into one of these structs.
//! Fields that identify something (actor ids, positions, item names) are
//! required and a missing one is a [`RallyError::MalformedPayload`].
//! Purely informational numbers and flags default to 0 / `false`.

use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};

use crate::domain::{Actor, ActorId, Location, WaitId};
use crate::RallyError;

/// Deserializes `data` for `command`. An absent `data` member reads as an
/// empty object, so structs whose fields all have defaults still succeed.
pub(crate) fn parse<T: DeserializeOwned>(command: &str, data: Option<Value>) -> Result<T, RallyError> {
    let data = data.unwrap_or_else(|| Value::Object(Map::new()));
    serde_json::from_value(data).map_err(|e| RallyError::MalformedPayload {
        command: command.to_string(),
        reason: e.to_string(),
    })
}

// ---------------------------------------------------------------------------
// Actors and paths
// ---------------------------------------------------------------------------

/// One entry of `query_actor`'s `actors` array.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct ActorRecord {
    id: ActorId,
    #[serde(rename = "type")]
    kind: String,
    faction: String,
    position: Location,
    hp: i64,
    max_hp: i64,
}

impl From<ActorRecord> for Actor {
    fn from(record: ActorRecord) -> Self {
        Actor {
            id: record.id,
            kind: record.kind,
            faction: record.faction,
            position: record.position,
            hp_percent: hp_percent(record.hp, record.max_hp),
        }
    }
}

/// Whole-number health percentage, `-1` when there is no maximum.
pub(crate) fn hp_percent(hp: i64, max_hp: i64) -> i64 {
    if max_hp > 0 {
        (hp.saturating_mul(100)).div_euclid(max_hp)
    } else {
        -1
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct ActorsData {
    #[serde(default)]
    pub(crate) actors: Vec<ActorRecord>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct PathData {
    pub(crate) path: Vec<Location>,
}

// ---------------------------------------------------------------------------
// Production
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
pub(crate) struct CanProduceData {
    #[serde(rename = "canProduce", default)]
    pub(crate) can_produce: bool,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ProduceData {
    #[serde(rename = "waitId", default)]
    pub(crate) wait_id: Option<WaitId>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct WaitInfoData {
    /// `"success"` once the task has finished.
    #[serde(rename = "waitStatus", default)]
    pub(crate) wait_status: Option<String>,
    #[serde(default)]
    pub(crate) status: bool,
}

impl WaitInfoData {
    pub(crate) fn succeeded(&self) -> bool {
        self.wait_status.as_deref() == Some("success")
    }
}

/// State of one item in a production queue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QueueItemStatus {
    Completed,
    Paused,
    /// Being built: the head of the queue.
    InProgress,
    /// Queued behind the head.
    Waiting,
}

/// One entry in a production queue.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct QueueItem {
    /// Internal item name.
    pub name: String,
    /// Localized display name.
    #[serde(rename = "chineseName", default)]
    pub display_name: Option<String>,
    #[serde(default)]
    pub remaining_time: i64,
    #[serde(default)]
    pub total_time: i64,
    #[serde(default)]
    pub remaining_cost: i64,
    #[serde(default)]
    pub total_cost: i64,
    #[serde(default)]
    pub paused: bool,
    #[serde(default)]
    pub done: bool,
    #[serde(default)]
    pub progress_percent: f64,
    /// The building that owns this queue slot.
    #[serde(default)]
    pub owner_actor_id: Option<ActorId>,
    pub status: QueueItemStatus,
}

/// Answer to `query_production_queue`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ProductionQueue {
    #[serde(default)]
    pub queue_type: String,
    #[serde(default)]
    pub queue_items: Vec<QueueItem>,
    /// A finished item is waiting to be placed.
    #[serde(default)]
    pub has_ready_item: bool,
}

impl ProductionQueue {
    /// Items whose display or internal name is `name`.
    pub fn items_named<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a QueueItem> + 'a {
        self.queue_items
            .iter()
            .filter(move |item| item.name == name || item.display_name.as_deref() == Some(name))
    }
}

// ---------------------------------------------------------------------------
// Combat
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
pub(crate) struct AttackData {
    #[serde(default)]
    pub(crate) status: i64,
}

/// Attributes the server reports for one queried actor.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct UnitAttributes {
    /// Actors currently inside this unit's attack range.
    #[serde(default)]
    pub targets: Vec<ActorId>,
    /// Everything else the server sent, untouched.
    #[serde(flatten)]
    pub other: Map<String, Value>,
}

/// Answer to `unit_attribute_query`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct AttributeReport {
    #[serde(default)]
    pub attributes: Vec<UnitAttributes>,
}

impl AttributeReport {
    /// Every actor in range of any queried unit, in report order.
    pub fn targets_in_range(&self) -> Vec<ActorId> {
        self.attributes
            .iter()
            .flat_map(|a| a.targets.iter().copied())
            .collect()
    }
}

// ---------------------------------------------------------------------------
// Map, fog, base, screen
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
pub(crate) struct FogData {
    #[serde(rename = "IsVisible", default)]
    pub(crate) is_visible: bool,
    #[serde(rename = "IsExplored", default)]
    pub(crate) is_explored: bool,
}

/// Answer to `map_query`. Grids are indexed `[x][y]`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct MapInfo {
    #[serde(rename = "MapWidth")]
    pub width: i32,
    #[serde(rename = "MapHeight")]
    pub height: i32,
    #[serde(rename = "Height", default)]
    pub elevation: Vec<Vec<i64>>,
    #[serde(rename = "IsVisible", default)]
    pub visible: Vec<Vec<bool>>,
    #[serde(rename = "IsExplored", default)]
    pub explored: Vec<Vec<bool>>,
    #[serde(rename = "Terrain", default)]
    pub terrain: Vec<Vec<String>>,
    #[serde(rename = "ResourcesType", default)]
    pub resources_type: Vec<Vec<String>>,
    #[serde(rename = "Resources", default)]
    pub resources: Vec<Vec<i64>>,
}

impl MapInfo {
    /// Whether `location` lies inside the map.
    pub fn contains(&self, location: Location) -> bool {
        (0..self.width).contains(&location.x) && (0..self.height).contains(&location.y)
    }

    /// Explored flag at `location`, `None` outside the reported grid.
    pub fn is_explored(&self, location: Location) -> Option<bool> {
        cell(&self.explored, location).copied()
    }

    /// Visibility flag at `location`, `None` outside the reported grid.
    pub fn is_visible(&self, location: Location) -> Option<bool> {
        cell(&self.visible, location).copied()
    }

    /// Unexplored cells within Manhattan distance `max_distance` of
    /// `center`, excluding `center` itself, in row-major scan order.
    ///
    /// Cells outside the map or missing from the explored grid are skipped.
    pub fn unexplored_near(&self, center: Location, max_distance: u32) -> Vec<Location> {
        let r = i32::try_from(max_distance).unwrap_or(i32::MAX);
        let mut found = Vec::new();
        for dx in -r..=r {
            for dy in -r..=r {
                if (dx == 0 && dy == 0) || dx.unsigned_abs() + dy.unsigned_abs() > max_distance {
                    continue;
                }
                let here = Location::new(center.x.saturating_add(dx), center.y.saturating_add(dy));
                if self.contains(here) && self.is_explored(here) == Some(false) {
                    found.push(here);
                }
            }
        }
        found
    }
}

fn cell<T>(grid: &[Vec<T>], location: Location) -> Option<&T> {
    let x = usize::try_from(location.x).ok()?;
    let y = usize::try_from(location.y).ok()?;
    grid.get(x)?.get(y)
}

/// Answer to `player_baseinfo_query`. `cash + resources` is the money the
/// player can spend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
pub struct PlayerBaseInfo {
    #[serde(rename = "Cash", default)]
    pub cash: i64,
    #[serde(rename = "Resources", default)]
    pub resources: i64,
    /// Spare power: provided minus drained.
    #[serde(rename = "Power", default)]
    pub power: i64,
    #[serde(rename = "PowerDrained", default)]
    pub power_drained: i64,
    #[serde(rename = "PowerProvided", default)]
    pub power_provided: i64,
}

/// A screen-space point; this command spells its keys in upper case.
#[derive(Debug, Deserialize)]
struct ScreenPoint {
    #[serde(rename = "X")]
    x: i32,
    #[serde(rename = "Y")]
    y: i32,
}

impl From<ScreenPoint> for Location {
    fn from(p: ScreenPoint) -> Self {
        Location::new(p.x, p.y)
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub(crate) struct ScreenInfoData {
    screen_min: ScreenPoint,
    screen_max: ScreenPoint,
    #[serde(default)]
    is_mouse_on_screen: bool,
    mouse_position: ScreenPoint,
}

/// What part of the map the player is looking at.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScreenInfo {
    /// Top-left corner.
    pub screen_min: Location,
    /// Bottom-right corner.
    pub screen_max: Location,
    pub is_mouse_on_screen: bool,
    pub mouse_position: Location,
}

impl From<ScreenInfoData> for ScreenInfo {
    fn from(data: ScreenInfoData) -> Self {
        Self {
            screen_min: data.screen_min.into(),
            screen_max: data.screen_max.into(),
            is_mouse_on_screen: data.is_mouse_on_screen,
            mouse_position: data.mouse_position.into(),
        }
    }
}
