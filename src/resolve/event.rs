//! Event handlers.
//!
//! Events mostly raise control flags for the front end. With
//! `auto_choose` on, the setup choices are answered right away.

use super::{FollowUps, GameCommand, GameEvent};
use crate::board::course::Course;
use crate::board::state::TurnPhase;
use crate::control::ControlPatch;
use crate::engine::{Engine, EngineError};
use crate::store::{GameStore, IdentityStore};

impl<S: GameStore, I: IdentityStore> Engine<S, I> {
    pub(crate) fn apply_event(&mut self, event: GameEvent) -> Result<FollowUps, EngineError> {
        match event {
            GameEvent::INeedToChooseMyBoat => {
                self.patch(ControlPatch {
                    i_need_to_choose_my_boat: Some(true),
                    ..Default::default()
                });
                Ok(FollowUps::none())
            }
            GameEvent::INeedToChooseTheCourse => {
                self.patch(ControlPatch {
                    i_need_to_choose_the_course: Some(true),
                    ..Default::default()
                });
                if self.options.auto_choose && self.game.course.is_none() {
                    return Ok(FollowUps::command(GameCommand::ChooseCourse(Course::default())));
                }
                Ok(FollowUps::none())
            }
            GameEvent::INeedToChooseWindOriginDir => {
                self.patch(ControlPatch {
                    i_need_to_choose_wind_origin_dir: Some(true),
                    ..Default::default()
                });
                // A card-granted choice is left to the player.
                if self.options.auto_choose && self.game.wind_origin_dir.is_none() {
                    let dir = self.random_wind();
                    return Ok(FollowUps::command(GameCommand::DecideInitWindOriginDir(dir)));
                }
                Ok(FollowUps::none())
            }
            GameEvent::MyTurnToChooseBoatStartingPos => {
                self.patch(ControlPatch {
                    my_turn: Some(true),
                    my_turn_to_choose_starting_pos: Some(true),
                    ..Default::default()
                });
                Ok(FollowUps::none())
            }
            GameEvent::MyTurnNow => {
                if self.game.current_turn_phase != Some(TurnPhase::BeforeWeather) {
                    let mut next = self.game.clone();
                    next.current_turn_phase = Some(TurnPhase::BeforeWeather);
                    self.commit(next)?;
                }
                self.patch(ControlPatch {
                    my_turn: Some(true),
                    ..Default::default()
                });
                Ok(FollowUps::command(GameCommand::BeginTurnByRevealingWeatherCard))
            }
            GameEvent::IAmNotAllowedToMoveThisTurn => {
                self.patch(ControlPatch {
                    i_am_not_allowed_to_move_this_turn: Some(true),
                    ..Default::default()
                });
                Ok(FollowUps::none())
            }
        }
    }
}
