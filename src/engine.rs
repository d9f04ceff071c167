//! Engine state management.
//!
//! One `Engine` runs per client. It owns the client's view of the game and
//! its boat identity, applies commands and events depth first, and writes
//! every new game state through the store. Other clients' writes arrive
//! through `resolve_db_change`.

use std::time::Duration;

use rand::rngs::SmallRng;
use rand::SeedableRng;
use serde_json::Value;
use thiserror::Error;

use crate::board::boat::{Boat, BoatColor, BoatId, ALL_COLORS};
use crate::board::position::Direction;
use crate::board::state::Game;
use crate::cards::expire_active;
use crate::control::{ControlPanel, ControlPatch, GameObserver, NoopObserver};
use crate::protocol::record::{game_to_record, record_to_game, RecordError};
use crate::resolve::{FollowUps, GameCommand, GameEvent};
use crate::rules::speed::{potential_speed_and_tack, PotentialMove};
use crate::store::{GameStore, IdentityStore, LogEntry, StoreError, WriteBreaker};

/// Default board edge length in cells.
pub const DEFAULT_BOARD_SIZE: i32 = 30;

/// Default cap on nested command and event resolution.
pub const MAX_CASCADE_DEPTH: usize = 64;

/// Default write breaker: writes allowed per window.
pub const DEFAULT_WRITE_LIMIT: usize = 256;

/// Default write breaker window.
pub const DEFAULT_WRITE_WINDOW: Duration = Duration::from_millis(10);

#[derive(Debug, Error)]
pub enum EngineError {
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error(transparent)]
    Record(#[from] RecordError),
    #[error("writes halted by the write breaker")]
    WritesHalted,
    #[error("command cascade exceeded depth {0}")]
    CascadeTooDeep(usize),
    #[error("invalid value {value:?} for option {name}")]
    BadOption { name: String, value: String },
    #[error("unknown option {0}")]
    UnknownOption(String),
}

/// Engine configuration.
#[derive(Debug, Clone)]
pub struct EngineOptions {
    pub board_size: i32,
    /// Resolve course and initial wind choices automatically.
    pub auto_choose: bool,
    /// Seed for shuffles, boat ids and automatic choices. `None` uses entropy.
    pub seed: Option<u64>,
    /// Writes allowed per `write_window`. `None` disables the breaker.
    pub write_limit: Option<usize>,
    pub write_window: Duration,
    pub max_cascade_depth: usize,
}

impl Default for EngineOptions {
    fn default() -> Self {
        EngineOptions {
            board_size: DEFAULT_BOARD_SIZE,
            auto_choose: true,
            seed: None,
            write_limit: Some(DEFAULT_WRITE_LIMIT),
            write_window: DEFAULT_WRITE_WINDOW,
            max_cascade_depth: MAX_CASCADE_DEPTH,
        }
    }
}

impl EngineOptions {
    /// Sets an option by its protocol name. Names are case-insensitive.
    pub fn set(&mut self, name: &str, value: Option<&str>) -> Result<(), EngineError> {
        let raw = value.unwrap_or("");
        let bad = || EngineError::BadOption {
            name: name.to_string(),
            value: raw.to_string(),
        };
        match name.to_ascii_lowercase().as_str() {
            "boardsize" => {
                let size: i32 = raw.parse().map_err(|_| bad())?;
                if size < 1 {
                    return Err(bad());
                }
                self.board_size = size;
            }
            "autochoose" => self.auto_choose = parse_bool(raw).ok_or_else(bad)?,
            "seed" => {
                self.seed = match raw {
                    "" | "0" => None,
                    s => Some(s.parse().map_err(|_| bad())?),
                }
            }
            "writelimit" => {
                self.write_limit = match raw {
                    "" | "0" | "off" => None,
                    s => Some(s.parse().map_err(|_| bad())?),
                }
            }
            "maxcascadedepth" => self.max_cascade_depth = raw.parse().map_err(|_| bad())?,
            _ => return Err(EngineError::UnknownOption(name.to_string())),
        }
        Ok(())
    }

    /// Current values by protocol name, in a fixed order.
    pub fn values(&self) -> Vec<(&'static str, String)> {
        vec![
            ("BoardSize", self.board_size.to_string()),
            ("AutoChoose", self.auto_choose.to_string()),
            ("Seed", self.seed.map(|s| s.to_string()).unwrap_or_default()),
            (
                "WriteLimit",
                self.write_limit.map(|l| l.to_string()).unwrap_or_else(|| "off".to_string()),
            ),
            ("MaxCascadeDepth", self.max_cascade_depth.to_string()),
        ]
    }

    pub(crate) fn breaker(&self) -> WriteBreaker {
        match self.write_limit {
            Some(limit) => WriteBreaker::new(limit, self.write_window),
            None => WriteBreaker::disabled(),
        }
    }
}

fn parse_bool(raw: &str) -> Option<bool> {
    match raw.to_ascii_lowercase().as_str() {
        "" | "true" | "on" | "1" => Some(true),
        "false" | "off" | "0" => Some(false),
        _ => None,
    }
}

/// Holds one client's view of a game between commands.
pub struct Engine<S: GameStore, I: IdentityStore> {
    pub(crate) game: Game,
    pub(crate) my_boat_id: Option<BoatId>,
    pub(crate) store: S,
    pub(crate) identity: I,
    pub(crate) options: EngineOptions,
    pub(crate) controls: ControlPanel,
    pub(crate) observer: Box<dyn GameObserver + Send>,
    pub(crate) breaker: WriteBreaker,
    pub(crate) rng: SmallRng,
    depth: usize,
}

impl<S: GameStore, I: IdentityStore> Engine<S, I> {
    /// Opens `game_id`, creating the game when the store has no document.
    pub fn open(game_id: &str, store: S, identity: I, options: EngineOptions) -> Result<Self, EngineError> {
        Self::open_with_observer(game_id, store, identity, options, Box::new(NoopObserver))
    }

    /// Like `open`, reporting to `observer` from the start.
    ///
    /// A client with no boat in this game is asked to choose one.
    pub fn open_with_observer(
        game_id: &str,
        store: S,
        identity: I,
        options: EngineOptions,
        observer: Box<dyn GameObserver + Send>,
    ) -> Result<Self, EngineError> {
        let mut rng = match options.seed {
            Some(seed) => SmallRng::seed_from_u64(seed),
            None => SmallRng::from_entropy(),
        };
        let existing = store.load(game_id)?;
        let (game, is_new) = match existing {
            Some(record) => (record_to_game(&record)?, false),
            None => (Game::new(game_id, &mut rng), true),
        };
        let my_boat_id = identity.boat_id(game_id)?;
        let mut engine = Engine {
            game,
            my_boat_id,
            store,
            identity,
            breaker: options.breaker(),
            options,
            controls: ControlPanel::default(),
            observer,
            rng,
            depth: 0,
        };
        if is_new {
            log::debug!("creating game {}", game_id);
            let game = engine.game.clone();
            engine.write(game)?;
        }
        engine.observer.on_game_change(&engine.game);
        if engine.my_boat_id.is_none() {
            engine.dispatch_event(GameEvent::INeedToChooseMyBoat)?;
        }
        Ok(engine)
    }

    pub fn game(&self) -> &Game {
        &self.game
    }

    pub fn controls(&self) -> &ControlPanel {
        &self.controls
    }

    pub fn options(&self) -> &EngineOptions {
        &self.options
    }

    pub fn my_boat_id(&self) -> Option<BoatId> {
        self.my_boat_id
    }

    pub fn my_boat(&self) -> Option<&Boat> {
        self.my_boat_id.and_then(|id| self.game.boat(id))
    }

    /// The owner is whoever joined first.
    pub fn i_am_owner(&self) -> bool {
        self.my_boat_id.is_some() && self.game.boats.first().map(|b| b.boat_id) == self.my_boat_id
    }

    pub fn my_turn(&self) -> bool {
        self.my_boat_id.is_some_and(|id| self.game.is_turn_of(id))
    }

    /// Colours no boat in this game has taken yet.
    pub fn available_colors(&self) -> Vec<BoatColor> {
        ALL_COLORS
            .iter()
            .copied()
            .filter(|c| !self.game.boats.iter().any(|b| b.settings.color == *c))
            .collect()
    }

    /// How far this client's boat could go heading toward `dir`.
    pub fn potential_speed_and_tack(&self, dir: Direction) -> PotentialMove {
        potential_speed_and_tack(&self.game, self.my_boat_id, dir, self.options.board_size)
    }

    /// Sets an engine option. Breaker settings take effect immediately.
    pub fn set_option(&mut self, name: &str, value: Option<&str>) -> Result<(), EngineError> {
        self.options.set(name, value)?;
        if name.eq_ignore_ascii_case("writelimit") {
            self.breaker = self.options.breaker();
        }
        if name.eq_ignore_ascii_case("seed") {
            if let Some(seed) = self.options.seed {
                self.rng = SmallRng::seed_from_u64(seed);
            }
        }
        Ok(())
    }

    /// The `count` most recent logged snapshots, newest first.
    pub fn history(&self, count: usize) -> Result<Vec<Game>, EngineError> {
        self.store
            .history(&self.game.game_id, count)?
            .iter()
            .map(|e| record_to_game(&e.game).map_err(EngineError::from))
            .collect()
    }

    /// Every logged snapshot, oldest first, each also shown to the observer.
    pub fn replay(&mut self) -> Result<Vec<Game>, EngineError> {
        let games: Vec<Game> = self
            .store
            .replay(&self.game.game_id)?
            .iter()
            .map(|e| record_to_game(&e.game))
            .collect::<Result<_, _>>()?;
        for g in &games {
            self.observer.on_game_change(g);
        }
        Ok(games)
    }

    /// Resolves a player command and everything it sets off.
    pub fn dispatch_command(&mut self, command: GameCommand) -> Result<(), EngineError> {
        self.resolve_command(command)
    }

    /// Resolves an event and everything it sets off.
    pub fn dispatch_event(&mut self, event: GameEvent) -> Result<(), EngineError> {
        self.resolve_event(event)
    }

    pub(crate) fn resolve_command(&mut self, command: GameCommand) -> Result<(), EngineError> {
        self.nested(|engine| {
            log::debug!("command {}", command.name());
            let follow_ups = engine.apply_command(command)?;
            engine.drain(follow_ups)
        })
    }

    pub(crate) fn resolve_event(&mut self, event: GameEvent) -> Result<(), EngineError> {
        self.nested(|engine| {
            log::debug!("event {}", event.name());
            engine.observer.on_game_event(event);
            let follow_ups = engine.apply_event(event)?;
            engine.drain(follow_ups)
        })
    }

    /// Resolves every event, then every command, in order.
    pub(crate) fn drain(&mut self, follow_ups: FollowUps) -> Result<(), EngineError> {
        for event in follow_ups.events {
            self.resolve_event(event)?;
        }
        for command in follow_ups.commands {
            self.resolve_command(command)?;
        }
        Ok(())
    }

    /// Runs `f` one level deeper, with `updating` raised for its duration.
    pub(crate) fn nested<F>(&mut self, f: F) -> Result<(), EngineError>
    where
        F: FnOnce(&mut Self) -> Result<(), EngineError>,
    {
        if self.depth >= self.options.max_cascade_depth {
            log::error!("cascade deeper than {}, giving up", self.options.max_cascade_depth);
            return Err(EngineError::CascadeTooDeep(self.options.max_cascade_depth));
        }
        self.depth += 1;
        if self.depth == 1 {
            self.patch(ControlPatch::updating(true));
        }
        let result = f(self);
        self.depth -= 1;
        if self.depth == 0 {
            self.patch(ControlPatch::updating(false));
        }
        result
    }

    pub(crate) fn patch(&mut self, patch: ControlPatch) {
        if patch.is_empty() {
            return;
        }
        self.controls.apply(&patch);
        self.observer.on_controls(&patch);
    }

    /// Writes a new state for this client: expires this client's benefit
    /// cards against the current state, then stores the result.
    pub(crate) fn commit(&mut self, mut next: Game) -> Result<(), EngineError> {
        if let Some(me) = self.my_boat_id {
            let expired = expire_active(me, &self.game, &mut next);
            if !expired.is_empty() {
                log::debug!("benefit cards expired: {:?}", expired);
            }
        }
        self.write(next)
    }

    /// Stores `next` as a full replacement, logs a snapshot, and adopts it.
    pub(crate) fn write(&mut self, next: Game) -> Result<(), EngineError> {
        if !self.breaker.allow() {
            return Err(EngineError::WritesHalted);
        }
        let record = game_to_record(&next)?;
        self.store.save(&next.game_id, &record)?;
        self.store.append_log(LogEntry::now(next.game_id.clone(), record))?;
        self.game = next;
        self.observer.on_game_change(&self.game);
        Ok(())
    }

    /// Adopts an externally written record without writing it back.
    pub(crate) fn adopt(&mut self, record: &Value) -> Result<Game, EngineError> {
        let next = record_to_game(record)?;
        let previous = std::mem::replace(&mut self.game, next);
        self.observer.on_game_change(&self.game);
        Ok(previous)
    }
}
