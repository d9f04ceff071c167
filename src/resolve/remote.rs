//! Reconciling with snapshots written by other clients.

use serde_json::Value;

use super::{FollowUps, GameCommand, GameEvent};
use crate::board::state::Game;
use crate::cards::expire_active;
use crate::engine::{Engine, EngineError};
use crate::rules::right_of_way::{who_has_right_of_way, Contender};
use crate::rules::turn::last_to_sail;
use crate::store::{GameStore, IdentityStore};

impl<S: GameStore, I: IdentityStore> Engine<S, I> {
    /// Adopts a record another client wrote and reacts to it.
    ///
    /// In order: expire this client's benefit cards, bump this client's boat
    /// if the last boat to sail ran into it with right of way, and announce
    /// the turn if it has just passed here. The adopted record itself is never
    /// written back.
    pub fn resolve_db_change(&mut self, record: &Value) -> Result<(), EngineError> {
        self.nested(|engine| {
            let previous = engine.adopt(record)?;
            if let Some(me) = engine.my_boat_id {
                let mut next = engine.game.clone();
                let expired = expire_active(me, &previous, &mut next);
                if !expired.is_empty() {
                    log::debug!("benefit cards expired: {:?}", expired);
                    engine.write(next)?;
                }
            }
            let mut follow_ups = engine.bump_if_collided();
            if let Some(event) = engine.turn_arrived(&previous) {
                follow_ups.push_event(event);
            }
            engine.drain(follow_ups)
        })
    }

    /// Asks to be blown downwind when the boat that sailed last ended up in
    /// my cell and holds right of way over me, whoever holds the turn now.
    fn bump_if_collided(&self) -> FollowUps {
        let Some(me) = self.my_boat_id else {
            return FollowUps::none();
        };
        let (Some(mine), Some(mover), Some(wind)) = (
            self.game.boat(me),
            last_to_sail(&self.game),
            self.game.wind_origin_dir,
        ) else {
            return FollowUps::none();
        };
        if mover == me || mine.state.pos.is_none() {
            return FollowUps::none();
        }
        let Some(other) = self.game.boat(mover).filter(|b| b.state.pos == mine.state.pos) else {
            return FollowUps::none();
        };
        let (Some(mut moving), Some(stationary)) = (Contender::of(other), Contender::of(mine)) else {
            return FollowUps::none();
        };
        // Judge the mover from the cell it sailed in from.
        if let Some(dir) = other.state.most_recent_move_dir {
            moving.pos = moving.pos.step(dir.opposite());
        }
        let row = who_has_right_of_way(wind, &moving, &stationary);
        if row.winner != other.boat_id {
            return FollowUps::none();
        }
        log::info!("collision with {}: {}", other.name(), row.reason);
        FollowUps::command(GameCommand::MoveMe1SpaceDownwindForFree)
    }

    /// The event to raise when the turn has just become mine.
    fn turn_arrived(&self, previous: &Game) -> Option<GameEvent> {
        let me = self.my_boat_id?;
        if previous.is_turn_of(me) && previous.started {
            return None;
        }
        if !self.game.started || self.game.is_finished() || !self.game.is_turn_of(me) {
            return None;
        }
        match self.game.boat(me)?.state.pos {
            None => Some(GameEvent::MyTurnToChooseBoatStartingPos),
            Some(_) => Some(GameEvent::MyTurnNow),
        }
    }
}
