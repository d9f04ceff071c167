//! Command and event resolution.
//!
//! Commands are imperative instructions from a player (or from the engine
//! itself); events announce a situation that needs a decision. Applying
//! either yields `FollowUps`, which the engine drains depth first: every
//! event, then every command, each fully resolved before the next.

pub mod command;
pub mod event;
pub mod remote;

use serde::{Deserialize, Serialize};

use crate::board::boat::BoatSettings;
use crate::board::course::Course;
use crate::board::position::{Direction, Position, WindDirection};
use crate::cards::BenefitCard;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "name", content = "payload")]
pub enum GameCommand {
    ChooseMyBoat(BoatSettings),
    ChooseCourse(Course),
    DecideInitWindOriginDir(WindDirection),
    StartGame,
    /// Raises the local "your turn" event when the turn holder is this client.
    BeginTurnCycle,
    ChooseBoatStartingPos(Position),
    BeginTurnByRevealingWeatherCard,
    ChooseMoveDirection(Direction),
    DrawBenefitCard,
    PlayBenefitCard(BenefitCard),
    MoveMe1SpaceDownwindForFree,
    ChangeWindOriginDir(WindDirection),
    EndTurnAndCycle,
}

impl GameCommand {
    pub fn name(&self) -> &'static str {
        match self {
            GameCommand::ChooseMyBoat(_) => "ChooseMyBoat",
            GameCommand::ChooseCourse(_) => "ChooseCourse",
            GameCommand::DecideInitWindOriginDir(_) => "DecideInitWindOriginDir",
            GameCommand::StartGame => "StartGame",
            GameCommand::BeginTurnCycle => "BeginTurnCycle",
            GameCommand::ChooseBoatStartingPos(_) => "ChooseBoatStartingPos",
            GameCommand::BeginTurnByRevealingWeatherCard => "BeginTurnByRevealingWeatherCard",
            GameCommand::ChooseMoveDirection(_) => "ChooseMoveDirection",
            GameCommand::DrawBenefitCard => "DrawBenefitCard",
            GameCommand::PlayBenefitCard(_) => "PlayBenefitCard",
            GameCommand::MoveMe1SpaceDownwindForFree => "MoveMe1SpaceDownwindForFree",
            GameCommand::ChangeWindOriginDir(_) => "ChangeWindOriginDir",
            GameCommand::EndTurnAndCycle => "EndTurnAndCycle",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "name")]
pub enum GameEvent {
    INeedToChooseMyBoat,
    INeedToChooseTheCourse,
    INeedToChooseWindOriginDir,
    MyTurnToChooseBoatStartingPos,
    MyTurnNow,
    IAmNotAllowedToMoveThisTurn,
}

impl GameEvent {
    pub fn name(self) -> &'static str {
        match self {
            GameEvent::INeedToChooseMyBoat => "INeedToChooseMyBoat",
            GameEvent::INeedToChooseTheCourse => "INeedToChooseTheCourse",
            GameEvent::INeedToChooseWindOriginDir => "INeedToChooseWindOriginDir",
            GameEvent::MyTurnToChooseBoatStartingPos => "MyTurnToChooseBoatStartingPos",
            GameEvent::MyTurnNow => "MyTurnNow",
            GameEvent::IAmNotAllowedToMoveThisTurn => "IAmNotAllowedToMoveThisTurn",
        }
    }
}

/// Messages produced by one transition, resolved events first.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FollowUps {
    pub events: Vec<GameEvent>,
    pub commands: Vec<GameCommand>,
}

impl FollowUps {
    pub fn none() -> Self {
        FollowUps::default()
    }

    pub fn command(command: GameCommand) -> Self {
        FollowUps {
            events: Vec::new(),
            commands: vec![command],
        }
    }

    pub fn event(event: GameEvent) -> Self {
        FollowUps {
            events: vec![event],
            commands: Vec::new(),
        }
    }

    pub fn push_event(&mut self, event: GameEvent) {
        self.events.push(event);
    }

    pub fn push_command(&mut self, command: GameCommand) {
        self.commands.push(command);
    }

    /// Appends `other` after the messages already queued.
    pub fn extend(&mut self, other: FollowUps) {
        self.events.extend(other.events);
        self.commands.extend(other.commands);
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty() && self.commands.is_empty()
    }
}
