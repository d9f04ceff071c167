//! Command transitions.
//!
//! Each command reads the engine's current game, builds the next one, and
//! writes it through `Engine::commit`. Commands that make no sense in the
//! current state are logged and ignored.

use chrono::Utc;
use rand::seq::SliceRandom;

use super::{FollowUps, GameCommand, GameEvent};
use crate::board::boat::{new_boat_id, Boat, BoatId, BoatSettings};
use crate::board::course::Course;
use crate::board::position::{Direction, Position, WindDirection, ALL_WIND_DIRECTIONS};
use crate::board::state::{Game, TurnPhase};
use crate::cards::{self, BenefitCard, PlayEffect, WeatherCard};
use crate::control::ControlPatch;
use crate::engine::{Engine, EngineError};
use crate::rules::speed::{crosses_start_early, potential_speed_and_tack, target_obstacle, EARLY_START};
use crate::rules::turn::{first_turn_id, next_turn_id, race_is_over};
use crate::sailing::point_of_sail_and_tack;
use crate::store::{GameStore, IdentityStore};

/// Snapshots searched for the state before this turn's weather.
pub const UNDO_HISTORY_DEPTH: usize = 64;

impl<S: GameStore, I: IdentityStore> Engine<S, I> {
    pub(crate) fn apply_command(&mut self, command: GameCommand) -> Result<FollowUps, EngineError> {
        if self.game.is_finished() {
            log::warn!("ignoring {}: the race is over", command.name());
            return Ok(FollowUps::none());
        }
        match command {
            GameCommand::ChooseMyBoat(settings) => self.choose_my_boat(settings),
            GameCommand::ChooseCourse(course) => self.choose_course(course),
            GameCommand::DecideInitWindOriginDir(dir) => self.decide_init_wind(dir),
            GameCommand::ChangeWindOriginDir(dir) => self.change_wind(dir),
            GameCommand::StartGame => self.start_game(),
            GameCommand::BeginTurnCycle => Ok(self.begin_turn_cycle()),
            GameCommand::ChooseBoatStartingPos(pos) => self.choose_starting_pos(pos),
            GameCommand::BeginTurnByRevealingWeatherCard => self.reveal_weather(),
            GameCommand::ChooseMoveDirection(dir) => self.choose_move_direction(dir),
            GameCommand::DrawBenefitCard => self.draw_benefit_card(),
            GameCommand::PlayBenefitCard(card) => self.play_benefit_card(card),
            GameCommand::MoveMe1SpaceDownwindForFree => self.move_one_downwind(),
            GameCommand::EndTurnAndCycle => self.end_turn_and_cycle(),
        }
    }

    /// My boat id, when it is my turn in a running race.
    fn my_turn_id(&self, command: &str) -> Option<BoatId> {
        let Some(me) = self.my_boat_id else {
            log::warn!("ignoring {}: no boat chosen", command);
            return None;
        };
        if !self.game.started {
            log::warn!("ignoring {}: the race has not started", command);
            return None;
        }
        if !self.game.is_turn_of(me) {
            log::warn!("ignoring {}: not my turn", command);
            return None;
        }
        Some(me)
    }

    /// My boat and its position, when it is my turn and the boat is placed.
    fn my_placed_boat(&self, command: &str) -> Option<(Boat, Position)> {
        let me = self.my_turn_id(command)?;
        let boat = self.game.boat(me)?.clone();
        match boat.state.pos {
            Some(pos) => Some((boat, pos)),
            None => {
                log::warn!("ignoring {}: boat not placed", command);
                None
            }
        }
    }

    fn in_phase(&self, command: &str, phases: &[TurnPhase]) -> bool {
        let ok = self.game.current_turn_phase.is_some_and(|p| phases.contains(&p));
        if !ok {
            log::warn!("ignoring {}: phase is {:?}", command, self.game.current_turn_phase);
        }
        ok
    }

    fn choose_my_boat(&mut self, settings: BoatSettings) -> Result<FollowUps, EngineError> {
        if self.my_boat_id.is_some() {
            log::warn!("ignoring ChooseMyBoat: already sailing a boat");
            return Ok(FollowUps::none());
        }
        if self.game.boats.iter().any(|b| b.settings.color == settings.color) {
            log::warn!("ignoring ChooseMyBoat: {} is taken", settings.color);
            return Ok(FollowUps::none());
        }
        let id = new_boat_id(&mut self.rng);
        log::debug!("{} joins as {}", settings.name, id);
        let mut next = self.game.clone();
        next.boats.push(Boat::new(id, settings));
        next.turn_order.push(id);
        self.commit(next)?;
        self.identity.set_boat_id(&self.game.game_id, id)?;
        self.my_boat_id = Some(id);
        self.patch(ControlPatch {
            i_need_to_choose_my_boat: Some(false),
            ..Default::default()
        });
        if self.i_am_owner() {
            return Ok(FollowUps::event(GameEvent::INeedToChooseTheCourse));
        }
        Ok(FollowUps::none())
    }

    fn choose_course(&mut self, course: Course) -> Result<FollowUps, EngineError> {
        if !self.i_am_owner() {
            log::warn!("ignoring ChooseCourse: only the owner picks the course");
            return Ok(FollowUps::none());
        }
        if self.game.course.is_some() {
            log::warn!("ignoring ChooseCourse: course already set");
            return Ok(FollowUps::none());
        }
        let mut next = self.game.clone();
        next.course = Some(course);
        self.commit(next)?;
        self.patch(ControlPatch {
            i_need_to_choose_the_course: Some(false),
            ..Default::default()
        });
        Ok(FollowUps::event(GameEvent::INeedToChooseWindOriginDir))
    }

    fn decide_init_wind(&mut self, dir: WindDirection) -> Result<FollowUps, EngineError> {
        if !self.i_am_owner() {
            log::warn!("ignoring DecideInitWindOriginDir: only the owner sets the first wind");
            return Ok(FollowUps::none());
        }
        if self.game.wind_origin_dir.is_some() {
            log::warn!("ignoring DecideInitWindOriginDir: wind already set");
            return Ok(FollowUps::none());
        }
        self.set_wind(dir)
    }

    /// Shifts the wind mid-race. Only the turn holder may, and only while a
    /// revealed weather card or a played wind card calls for it.
    fn change_wind(&mut self, dir: WindDirection) -> Result<FollowUps, EngineError> {
        const NAME: &str = "ChangeWindOriginDir";
        let Some(me) = self.my_turn_id(NAME) else {
            return Ok(FollowUps::none());
        };
        if !self.in_phase(NAME, &[TurnPhase::BeforeMove]) {
            return Ok(FollowUps::none());
        }
        let by_weather = self.game.current_weather == Some(WeatherCard::WindDirChanges(dir));
        let by_card = self.controls.i_need_to_choose_wind_origin_dir
            && self
                .game
                .boat(me)
                .is_some_and(|b| b.state.benefit_cards_active.contains(&BenefitCard::ChooseWindOriginDir));
        if !by_weather && !by_card {
            log::warn!("ignoring {} {}: no wind choice is pending", NAME, dir.as_str());
            return Ok(FollowUps::none());
        }
        self.set_wind(dir)
    }

    fn set_wind(&mut self, dir: WindDirection) -> Result<FollowUps, EngineError> {
        log::debug!("wind now from {}", dir.as_str());
        let mut next = self.game.clone();
        next.wind_origin_dir = Some(dir.into());
        self.commit(next)?;
        self.patch(ControlPatch {
            i_need_to_choose_wind_origin_dir: Some(false),
            ..Default::default()
        });
        Ok(FollowUps::none())
    }

    /// A random diagonal for the opening wind.
    pub(crate) fn random_wind(&mut self) -> WindDirection {
        *ALL_WIND_DIRECTIONS
            .choose(&mut self.rng)
            .unwrap_or(&WindDirection::NW)
    }

    fn start_game(&mut self) -> Result<FollowUps, EngineError> {
        if !self.i_am_owner() {
            log::warn!("ignoring StartGame: only the owner starts the race");
            return Ok(FollowUps::none());
        }
        if self.game.started {
            log::warn!("ignoring StartGame: already started");
            return Ok(FollowUps::none());
        }
        if self.game.course.is_none() || self.game.wind_origin_dir.is_none() {
            log::warn!("ignoring StartGame: course and wind must be chosen first");
            return Ok(FollowUps::none());
        }
        let mut next = self.game.clone();
        next.started = true;
        next.id_of_boat_whose_turn_it_is = first_turn_id(&next);
        next.current_turn_phase = Some(TurnPhase::BeforeWeather);
        log::debug!("race started with {} boats", next.boats.len());
        self.commit(next)?;
        Ok(FollowUps::command(GameCommand::BeginTurnCycle))
    }

    fn begin_turn_cycle(&mut self) -> FollowUps {
        if !self.game.started {
            return FollowUps::none();
        }
        match self.my_boat() {
            Some(boat) if self.game.is_turn_of(boat.boat_id) => {
                if boat.state.pos.is_none() {
                    FollowUps::event(GameEvent::MyTurnToChooseBoatStartingPos)
                } else {
                    FollowUps::event(GameEvent::MyTurnNow)
                }
            }
            _ => FollowUps::none(),
        }
    }

    fn choose_starting_pos(&mut self, pos: Position) -> Result<FollowUps, EngineError> {
        let Some(me) = self.my_turn_id("ChooseBoatStartingPos") else {
            return Ok(FollowUps::none());
        };
        if self.game.boat(me).and_then(|b| b.state.pos).is_some() {
            log::warn!("ignoring ChooseBoatStartingPos: boat already placed");
            return Ok(FollowUps::none());
        }
        if !self.valid_starting_pos(pos) {
            log::warn!("ignoring ChooseBoatStartingPos: {} is not a valid start", pos);
            return Ok(FollowUps::none());
        }
        let mut next = self.game.clone();
        if let Some(boat) = next.boat_mut(me) {
            boat.state.pos = Some(pos);
        }
        self.commit(next)?;
        self.patch(ControlPatch {
            my_turn_to_choose_starting_pos: Some(false),
            ..Default::default()
        });
        Ok(FollowUps::command(GameCommand::EndTurnAndCycle))
    }

    /// In bounds, free, and south of the start line.
    pub fn valid_starting_pos(&self, pos: Position) -> bool {
        let Some(course) = self.game.course.as_ref() else {
            return false;
        };
        pos.in_bounds(self.options.board_size)
            && !course.is_buoy(pos)
            && self.game.boat_at(pos, None).is_none()
            && course.is_behind_start(pos)
    }

    fn reveal_weather(&mut self) -> Result<FollowUps, EngineError> {
        if self.my_placed_boat("BeginTurnByRevealingWeatherCard").is_none()
            || !self.in_phase("BeginTurnByRevealingWeatherCard", &[TurnPhase::BeforeWeather])
        {
            return Ok(FollowUps::none());
        }
        let mut next = self.game.clone();
        let deck = &mut next.weather_cards;
        let Some(card) = cards::draw(&mut deck.deck, &mut deck.revealed, &mut self.rng) else {
            log::warn!("weather deck is empty");
            return Ok(FollowUps::none());
        };
        deck.revealed.push(card);
        next.current_weather = Some(card);
        next.current_turn_phase = Some(TurnPhase::BeforeMove);
        log::debug!("revealed weather {}", card);
        self.commit(next)?;
        Ok(card.reveal())
    }

    fn choose_move_direction(&mut self, dir: Direction) -> Result<FollowUps, EngineError> {
        const NAME: &str = "ChooseMoveDirection";
        let Some((boat, from)) = self.my_placed_boat(NAME) else {
            return Ok(FollowUps::none());
        };
        if !self.in_phase(NAME, &[TurnPhase::BeforeMove, TurnPhase::Moving]) {
            return Ok(FollowUps::none());
        }
        let Some(wind) = self.game.wind_origin_dir else {
            return Ok(FollowUps::none());
        };
        let size = self.options.board_size;

        let (speed, tack) = if !boat.state.has_moved_this_turn {
            let potential = potential_speed_and_tack(&self.game, Some(boat.boat_id), dir, size);
            if !potential.is_possible() {
                log::warn!("ignoring {} {}: {}", NAME, dir, potential.reason);
                return Ok(FollowUps::none());
            }
            let tack = potential
                .tack
                .unwrap_or_else(|| point_of_sail_and_tack(dir, wind, boat.state.tack).1);
            (potential.speed, tack)
        } else {
            if boat.state.most_recent_move_dir != Some(dir) {
                log::warn!("ignoring {} {}: direction is locked mid-move", NAME, dir);
                return Ok(FollowUps::none());
            }
            if boat.state.speed == 0 {
                log::warn!("ignoring {} {}: no speed left", NAME, dir);
                return Ok(FollowUps::none());
            }
            let tack = boat
                .state
                .tack
                .unwrap_or_else(|| point_of_sail_and_tack(dir, wind, None).1);
            let blocked = target_obstacle(&self.game, &boat, tack, from, dir, size)
                .or_else(|| crosses_start_early(&self.game, &boat, from, dir).then(|| EARLY_START.to_string()));
            if let Some(reason) = blocked {
                log::info!("{} stops short: {}", boat.name(), reason);
                let mut next = self.game.clone();
                if let Some(b) = next.boat_mut(boat.boat_id) {
                    b.state.speed = 0;
                }
                self.commit(next)?;
                return Ok(FollowUps::command(GameCommand::EndTurnAndCycle));
            }
            (boat.state.speed, tack)
        };

        let to = from.step(dir);
        let mut next = self.game.clone();
        let course = next.course.clone();
        let mut remaining = speed - 1;
        if let Some(b) = next.boat_mut(boat.boat_id) {
            b.state.pos = Some(to);
            b.state.tack = Some(tack);
            b.state.most_recent_move_dir = Some(dir);
            b.state.has_moved_this_turn = true;
            if let Some(course) = &course {
                course.track(&mut b.state.progress, from, to, size);
            }
            if b.has_finished() {
                log::info!("{} crossed the finish line", b.name());
                remaining = 0;
            }
            b.state.speed = remaining;
        }
        next.current_turn_phase = Some(TurnPhase::Moving);
        self.commit(next)?;
        if remaining == 0 {
            return Ok(FollowUps::command(GameCommand::EndTurnAndCycle));
        }
        Ok(FollowUps::none())
    }

    fn draw_benefit_card(&mut self) -> Result<FollowUps, EngineError> {
        let Some((boat, _)) = self.my_placed_boat("DrawBenefitCard") else {
            return Ok(FollowUps::none());
        };
        if !self.in_phase("DrawBenefitCard", &[TurnPhase::BeforeMove]) {
            return Ok(FollowUps::none());
        }
        let mut next = self.game.clone();
        let deck = &mut next.benefit_cards;
        let Some(card) = cards::draw(&mut deck.deck, &mut deck.discarded, &mut self.rng) else {
            log::warn!("benefit deck is empty");
            return Ok(FollowUps::none());
        };
        if let Some(b) = next.boat_mut(boat.boat_id) {
            b.state.benefit_cards_drawn.push(card);
        }
        log::debug!("{} drew {}", boat.name(), card);
        self.commit(next)?;
        Ok(FollowUps::command(GameCommand::EndTurnAndCycle))
    }

    fn play_benefit_card(&mut self, card: BenefitCard) -> Result<FollowUps, EngineError> {
        let Some(me) = self.my_boat_id else {
            log::warn!("ignoring PlayBenefitCard: no boat chosen");
            return Ok(FollowUps::none());
        };
        if !card.can_be_played(&self.game, me) {
            log::warn!("ignoring PlayBenefitCard {}: not playable now", card);
            return Ok(FollowUps::none());
        }
        let mut next = self.game.clone();
        let Some(boat) = next.boat_mut(me) else {
            return Ok(FollowUps::none());
        };
        let Some(i) = boat.state.benefit_cards_drawn.iter().position(|&c| c == card) else {
            log::warn!("ignoring PlayBenefitCard {}: not in hand", card);
            return Ok(FollowUps::none());
        };
        boat.state.benefit_cards_drawn.remove(i);
        boat.state.benefit_cards_active.push(card);
        log::debug!("played {}", card);
        self.commit(next)?;
        match card.play() {
            PlayEffect::Nothing => Ok(FollowUps::none()),
            PlayEffect::Raise(event) => Ok(FollowUps::event(event)),
            PlayEffect::UndoWeather => self.undo_weather(me),
        }
    }

    /// Reverts this turn's weather using the newest logged snapshot taken
    /// before the reveal.
    fn undo_weather(&mut self, me: BoatId) -> Result<FollowUps, EngineError> {
        let before_reveal = self.history(UNDO_HISTORY_DEPTH)?.into_iter().find(|g: &Game| {
            g.is_turn_of(me)
                && g.current_turn_phase == Some(TurnPhase::BeforeWeather)
                && g.current_weather.is_none()
        });
        let mut next = self.game.clone();
        match &before_reveal {
            Some(snapshot) => {
                next.wind_origin_dir = snapshot.wind_origin_dir;
                let old_pos = snapshot.boat(me).and_then(|b| b.state.pos);
                if let (Some(boat), Some(pos)) = (next.boat_mut(me), old_pos) {
                    boat.state.pos = Some(pos);
                }
            }
            None => log::warn!("no snapshot before this turn's weather; clearing it only"),
        }
        next.current_weather = None;
        self.commit(next)?;
        self.patch(ControlPatch {
            i_am_not_allowed_to_move_this_turn: Some(false),
            ..Default::default()
        });
        Ok(FollowUps::none())
    }

    fn move_one_downwind(&mut self) -> Result<FollowUps, EngineError> {
        let Some(me) = self.my_boat_id else {
            return Ok(FollowUps::none());
        };
        let (Some(boat), Some(wind)) = (self.game.boat(me), self.game.wind_origin_dir) else {
            return Ok(FollowUps::none());
        };
        let Some(from) = boat.state.pos else {
            return Ok(FollowUps::none());
        };
        let dir = wind.opposite();
        let to = from.step(dir);
        let free = to.in_bounds(self.options.board_size)
            && !self.game.is_buoy(to)
            && self.game.boat_at(to, Some(me)).is_none()
            && !crosses_start_early(&self.game, boat, from, dir);
        if !free {
            log::info!("{} cannot be blown downwind to {}", boat.name(), to);
            return Ok(FollowUps::none());
        }
        let mut next = self.game.clone();
        let course = next.course.clone();
        let size = self.options.board_size;
        if let Some(b) = next.boat_mut(me) {
            b.state.pos = Some(to);
            if let Some(course) = &course {
                course.track(&mut b.state.progress, from, to, size);
            }
        }
        log::debug!("blown downwind to {}", to);
        self.commit(next)?;
        Ok(FollowUps::none())
    }

    fn end_turn_and_cycle(&mut self) -> Result<FollowUps, EngineError> {
        let Some(me) = self.my_turn_id("EndTurnAndCycle") else {
            return Ok(FollowUps::none());
        };
        let mut next = self.game.clone();
        if let Some(b) = next.boat_mut(me) {
            b.state.turns_completed += 1;
            b.state.has_moved_this_turn = false;
            b.state.speed = 0;
        }
        next.current_weather = None;
        next.current_turn_phase = Some(TurnPhase::BeforeWeather);

        let over = race_is_over(&next);
        if over {
            next.finished_at = Some(Utc::now());
            next.id_of_boat_whose_turn_it_is = None;
            next.current_turn_phase = None;
            log::info!("race over: {} of {} boats finished", next.finished_count(), next.boats.len());
        } else {
            next.id_of_boat_whose_turn_it_is = next_turn_id(&next);
        }
        self.commit(next)?;
        self.patch(ControlPatch {
            my_turn: Some(false),
            i_am_not_allowed_to_move_this_turn: Some(false),
            ..Default::default()
        });
        if over {
            return Ok(FollowUps::none());
        }
        Ok(FollowUps::command(GameCommand::BeginTurnCycle))
    }
}
