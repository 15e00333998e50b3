//! An in-memory game server for facade tests.
//!
//! `FakeGame` implements `Transport` by decoding the request, running it
//! against a tiny world model, and encoding the answer the way the real
//! server would. The model is just rich enough for the wait helpers:
//! production tasks finish after a few status polls, units walk a few
//! cells per `query_actor`, and buildings unlock by the prerequisite table.

#![allow(dead_code)]

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use rally::client::{GameClient, Transport, TransportError};
use rally::protocol::{COMMAND_EXECUTION_ERROR, RequestEnvelope};
use rally::{FACTION_OWN, GameApi, Location, deps};
use serde_json::{Value, json};

pub const ENEMY: &str = "敌人";

const INFANTRY: &[&str] = &["步兵", "火箭兵", "工程师", "手雷兵"];

#[derive(Debug, Clone)]
pub struct FakeActor {
    pub id: u64,
    pub kind: String,
    pub faction: String,
    pub position: Location,
    pub hp: i64,
    pub max_hp: i64,
    pub visible: bool,
    pub destination: Option<Location>,
}

#[derive(Debug, Clone)]
struct Task {
    id: i64,
    name: String,
    quantity: u32,
    queue: &'static str,
    polls_left: u32,
    done: bool,
}

/// The server's state. Tests tweak the public fields through
/// [`FakeGame::with`].
pub struct World {
    pub actors: Vec<FakeActor>,
    /// Extra type names producible regardless of prerequisites.
    pub producible: HashSet<String>,
    /// `query_wait_info` calls before a task finishes.
    pub build_polls: u32,
    /// Cells a moving unit covers per `query_actor`.
    pub speed: i32,
    pub explored: HashSet<Location>,
    pub visible: HashSet<Location>,
    /// Commands that fail with the given error code.
    pub failures: HashMap<String, String>,
    /// Commands answered with fixed data.
    pub canned: HashMap<String, Value>,
    /// When set, every attempt fails at the transport level.
    pub offline: bool,
    tasks: Vec<Task>,
    next_wait_id: i64,
    next_actor_id: u64,
    requests: Vec<RequestEnvelope>,
}

impl Default for World {
    fn default() -> Self {
        Self {
            actors: Vec::new(),
            producible: HashSet::new(),
            build_polls: 3,
            speed: 2,
            explored: HashSet::new(),
            visible: HashSet::new(),
            failures: HashMap::new(),
            canned: HashMap::new(),
            offline: false,
            tasks: Vec::new(),
            next_wait_id: 1,
            next_actor_id: 100,
            requests: Vec::new(),
        }
    }
}

#[derive(Clone, Default)]
pub struct FakeGame {
    world: Arc<Mutex<World>>,
}

impl FakeGame {
    pub fn new() -> Self {
        Self::default()
    }

    fn world(&self) -> MutexGuard<'_, World> {
        self.world.lock().unwrap()
    }

    /// Runs `f` against the world.
    pub fn with<R>(&self, f: impl FnOnce(&mut World) -> R) -> R {
        f(&mut self.world())
    }

    /// Adds a full-health actor and returns its id.
    pub fn spawn(&self, kind: &str, faction: &str, position: Location) -> u64 {
        self.world().spawn(kind, faction, position)
    }

    pub fn fail(&self, command: &str, code: &str) {
        self.world().failures.insert(command.into(), code.into());
    }

    pub fn can(&self, command: &str, data: Value) {
        self.world().canned.insert(command.into(), data);
    }

    pub fn requests(&self) -> Vec<RequestEnvelope> {
        self.world().requests.clone()
    }

    /// Params of every request for `command`, oldest first.
    pub fn sent(&self, command: &str) -> Vec<Value> {
        self.world()
            .requests
            .iter()
            .filter(|r| r.command == command)
            .map(|r| r.params.clone())
            .collect()
    }

    pub fn commands(&self) -> Vec<String> {
        self.world().requests.iter().map(|r| r.command.clone()).collect()
    }

    pub fn actor(&self, id: u64) -> Option<FakeActor> {
        self.world().actors.iter().find(|a| a.id == id).cloned()
    }

    /// Own actors of `kind`, in spawn order.
    pub fn own(&self, kind: &str) -> Vec<FakeActor> {
        self.world()
            .actors
            .iter()
            .filter(|a| a.kind == kind && a.faction == FACTION_OWN)
            .cloned()
            .collect()
    }
}

impl Transport for FakeGame {
    async fn round_trip(&self, _addr: &str, request: &[u8]) -> Result<Vec<u8>, TransportError> {
        let request: RequestEnvelope = serde_json::from_slice(request).expect("client sent valid JSON");
        let mut world = self.world();
        world.requests.push(request.clone());
        if world.offline {
            return Err(TransportError::ConnectFailed {
                addr: "fake".into(),
                source: std::io::Error::from(std::io::ErrorKind::ConnectionRefused),
            });
        }

        let reply = match world.handle(&request.command, &request.params) {
            Ok(data) => json!({ "requestId": request.request_id, "status": 1, "data": data }),
            Err((code, message)) => json!({
                "requestId": request.request_id,
                "status": -1,
                "error": { "code": code, "message": message }
            }),
        };
        Ok(reply.to_string().into_bytes())
    }
}

/// A facade over `game` with fast retries.
pub fn api(game: &FakeGame) -> GameApi<FakeGame> {
    GameApi::from_client(
        GameClient::builder()
            .max_retries(2)
            .retry_delay(Duration::from_millis(10))
            .build_with_transport(game.clone()),
    )
}

// ---------------------------------------------------------------------------
// World model
// ---------------------------------------------------------------------------

type Reply = Result<Value, (String, String)>;

fn refuse(message: &str) -> Reply {
    Err((COMMAND_EXECUTION_ERROR.to_string(), message.to_string()))
}

fn actor_ids(targets: &Value) -> Vec<u64> {
    targets["actorId"]
        .as_array()
        .map(|ids| ids.iter().filter_map(Value::as_u64).collect())
        .unwrap_or_default()
}

fn location(value: &Value) -> Option<Location> {
    serde_json::from_value(value.clone()).ok()
}

fn is_building(name: &str) -> bool {
    deps::BUILDING_PREREQUISITES.iter().any(|(b, _)| *b == name)
}

fn is_unit(name: &str) -> bool {
    deps::UNIT_PREREQUISITES.iter().any(|(u, _)| *u == name)
}

fn queue_for(name: &str) -> &'static str {
    if is_building(name) {
        "Building"
    } else if INFANTRY.contains(&name) {
        "Infantry"
    } else {
        "Vehicle"
    }
}

impl World {
    fn spawn(&mut self, kind: &str, faction: &str, position: Location) -> u64 {
        let id = self.next_actor_id;
        self.next_actor_id += 1;
        self.actors.push(FakeActor {
            id,
            kind: kind.into(),
            faction: faction.into(),
            position,
            hp: 100,
            max_hp: 100,
            visible: true,
            destination: None,
        });
        id
    }

    fn owns(&self, kind: &str) -> bool {
        self.actors.iter().any(|a| a.kind == kind && a.faction == FACTION_OWN)
    }

    fn can_produce(&self, name: &str) -> bool {
        if self.producible.contains(name) {
            return true;
        }
        let needs = if is_building(name) {
            deps::building_prerequisites(name)
        } else if is_unit(name) {
            deps::unit_prerequisites(name)
        } else {
            return false;
        };
        needs.iter().all(|b| self.owns(b))
    }

    fn select(&self, targets: &Value) -> Vec<&FakeActor> {
        if targets.get("actorId").is_some() {
            let ids = actor_ids(targets);
            let visible_only = targets["restrain"]
                .as_array()
                .is_some_and(|r| r.iter().any(|c| c["visible"] == true));
            return self
                .actors
                .iter()
                .filter(|a| ids.contains(&a.id) && (!visible_only || a.visible))
                .collect();
        }

        let types: Vec<&str> = targets["type"]
            .as_array()
            .map(|t| t.iter().filter_map(Value::as_str).collect())
            .unwrap_or_default();
        let faction = targets["faction"].as_str().filter(|f| *f != "任意");
        self.actors
            .iter()
            .filter(|a| types.is_empty() || types.contains(&a.kind.as_str()))
            .filter(|a| faction.is_none_or(|f| a.faction == f))
            .collect()
    }

    fn advance_movement(&mut self) {
        let speed = self.speed;
        for actor in &mut self.actors {
            let Some(dest) = actor.destination else { continue };
            let mx = (dest.x - actor.position.x).clamp(-speed, speed);
            actor.position.x += mx;
            let left = speed - mx.abs();
            let my = (dest.y - actor.position.y).clamp(-left, left);
            actor.position.y += my;
            if actor.position == dest {
                actor.destination = None;
            }
        }
    }

    fn handle(&mut self, command: &str, params: &Value) -> Reply {
        if let Some(code) = self.failures.get(command) {
            return Err((code.clone(), format!("{command} failed")));
        }
        if let Some(data) = self.canned.get(command) {
            return Ok(data.clone());
        }

        match command {
            "ping" => Ok(json!({ "version": "fake" })),
            "query_actor" => {
                self.advance_movement();
                let actors: Vec<Value> = self
                    .select(&params["targets"])
                    .into_iter()
                    .map(|a| {
                        json!({
                            "id": a.id, "type": a.kind, "faction": a.faction,
                            "position": a.position, "hp": a.hp, "maxHp": a.max_hp
                        })
                    })
                    .collect();
                Ok(json!({ "actors": actors }))
            }
            "move_actor" => {
                if let Some(dest) = location(&params["location"]) {
                    let ids = actor_ids(&params["targets"]);
                    for actor in self.actors.iter_mut().filter(|a| ids.contains(&a.id)) {
                        actor.destination = Some(dest);
                    }
                }
                Ok(json!({}))
            }
            "query_can_produce" => {
                let name = params["units"][0]["unit_type"].as_str().unwrap_or_default();
                Ok(json!({ "canProduce": self.can_produce(name) }))
            }
            "start_production" => {
                let name = params["units"][0]["unit_type"].as_str().unwrap_or_default().to_string();
                let quantity = params["units"][0]["quantity"].as_u64().unwrap_or(1) as u32;
                if !self.can_produce(&name) {
                    return refuse("prerequisites missing");
                }
                let id = self.next_wait_id;
                self.next_wait_id += 1;
                self.tasks.push(Task {
                    id,
                    queue: queue_for(&name),
                    name,
                    quantity,
                    polls_left: self.build_polls,
                    done: false,
                });
                Ok(json!({ "waitId": id }))
            }
            "query_wait_info" => {
                let id = params["waitId"].as_i64().unwrap_or_default();
                let Some(index) = self.tasks.iter().position(|t| t.id == id) else {
                    return refuse("no such task");
                };
                if !self.tasks[index].done {
                    let task = &mut self.tasks[index];
                    task.polls_left = task.polls_left.saturating_sub(1);
                    if task.polls_left == 0 {
                        task.done = true;
                        let (name, quantity) = (task.name.clone(), task.quantity);
                        for _ in 0..quantity {
                            self.spawn(&name, FACTION_OWN, Location::new(5, 5));
                        }
                    }
                }
                let done = self.tasks[index].done;
                Ok(json!({ "waitStatus": if done { "success" } else { "pending" }, "status": done }))
            }
            "query_production_queue" => {
                let queue = params["queueType"].as_str().unwrap_or_default();
                let items: Vec<Value> = self
                    .tasks
                    .iter()
                    .filter(|t| t.queue == queue && !t.done)
                    .enumerate()
                    .map(|(i, t)| {
                        json!({
                            "name": t.name, "chineseName": t.name,
                            "remaining_time": t.polls_left, "total_time": 10,
                            "remaining_cost": 100, "total_cost": 100,
                            "paused": false, "done": false, "progress_percent": 0,
                            "owner_actor_id": null,
                            "status": if i == 0 { "in_progress" } else { "waiting" }
                        })
                    })
                    .collect();
                Ok(json!({ "queue_type": queue, "queue_items": items, "has_ready_item": false }))
            }
            "attack" => {
                let target = actor_ids(&params["targets"]).first().copied();
                let reachable = self.actors.iter().any(|a| Some(a.id) == target && a.visible);
                if reachable {
                    Ok(json!({ "status": 1 }))
                } else {
                    refuse("target not reachable")
                }
            }
            "fog_query" => {
                let pos = location(&params["pos"]).unwrap_or_default();
                Ok(json!({
                    "IsVisible": self.visible.contains(&pos),
                    "IsExplored": self.explored.contains(&pos)
                }))
            }
            "map_query" => {
                let explored: Vec<Vec<bool>> = (0..4)
                    .map(|x| (0..4).map(|y| self.explored.contains(&Location::new(x, y))).collect())
                    .collect();
                Ok(json!({ "MapWidth": 4, "MapHeight": 4, "IsExplored": explored }))
            }
            "player_baseinfo_query" => Ok(json!({
                "Cash": 500, "Resources": 200, "Power": 30, "PowerDrained": 70, "PowerProvided": 100
            })),
            "screen_info_query" => Ok(json!({
                "ScreenMin": { "X": 0, "Y": 0 },
                "ScreenMax": { "X": 32, "Y": 20 },
                "IsMouseOnScreen": true,
                "MousePosition": { "X": 7, "Y": 9 }
            })),
            "query_path" => {
                let dest = location(&params["destination"]).unwrap_or_default();
                let ids = actor_ids(&params["targets"]);
                let start = self
                    .actors
                    .iter()
                    .find(|a| ids.contains(&a.id))
                    .map_or(dest, |a| a.position);
                Ok(json!({ "path": [dest, start] }))
            }
            "unit_attribute_query" => {
                let enemies: Vec<u64> = self
                    .actors
                    .iter()
                    .filter(|a| a.faction == ENEMY && a.visible)
                    .map(|a| a.id)
                    .collect();
                let attributes: Vec<Value> = actor_ids(&params["targets"])
                    .into_iter()
                    .map(|id| json!({ "id": id, "attackRange": 5, "targets": enemies }))
                    .collect();
                Ok(json!({ "attributes": attributes }))
            }
            "deploy" => {
                let ids = actor_ids(&params["targets"]);
                for actor in self.actors.iter_mut().filter(|a| ids.contains(&a.id)) {
                    if actor.kind == rally::MCV_TYPE {
                        actor.kind = "建造厂".into();
                    }
                }
                Ok(json!({}))
            }
            _ => Ok(json!({})),
        }
    }
}
