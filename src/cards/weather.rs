//! Weather cards.
//!
//! One weather card is revealed at the start of every turn and takes effect
//! immediately. Its effect lasts until the turn ends or a benefit card
//! undoes it.

use std::fmt;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use super::Card;
use crate::board::position::WindDirection;
use crate::resolve::{FollowUps, GameCommand, GameEvent};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WeatherCard {
    NothingHappens,
    WindDirChanges(WindDirection),
    NoMoveAllowed,
    Add1Speed,
    GetBlownDownwind,
    TurnOver,
}

/// Every distinct weather card.
pub const WEATHER_CATALOG: [WeatherCard; 9] = [
    WeatherCard::NothingHappens,
    WeatherCard::WindDirChanges(WindDirection::NW),
    WeatherCard::WindDirChanges(WindDirection::NE),
    WeatherCard::WindDirChanges(WindDirection::SE),
    WeatherCard::WindDirChanges(WindDirection::SW),
    WeatherCard::NoMoveAllowed,
    WeatherCard::Add1Speed,
    WeatherCard::GetBlownDownwind,
    WeatherCard::TurnOver,
];

impl WeatherCard {
    /// Effect fired the moment the card is revealed.
    pub fn reveal(self) -> FollowUps {
        match self {
            WeatherCard::NothingHappens | WeatherCard::Add1Speed => FollowUps::none(),
            WeatherCard::WindDirChanges(dir) => {
                FollowUps::command(GameCommand::ChangeWindOriginDir(dir))
            }
            WeatherCard::NoMoveAllowed => FollowUps::event(GameEvent::IAmNotAllowedToMoveThisTurn),
            WeatherCard::GetBlownDownwind => {
                FollowUps::command(GameCommand::MoveMe1SpaceDownwindForFree)
            }
            WeatherCard::TurnOver => FollowUps::command(GameCommand::EndTurnAndCycle),
        }
    }

    /// Extra speed granted while the card is in effect.
    pub const fn speed_bonus(self) -> u32 {
        match self {
            WeatherCard::Add1Speed => 1,
            _ => 0,
        }
    }

    pub const fn forbids_moving(self) -> bool {
        matches!(self, WeatherCard::NoMoveAllowed)
    }
}

impl Card for WeatherCard {
    fn catalog() -> &'static [Self] {
        &WEATHER_CATALOG
    }

    fn name(self) -> &'static str {
        match self {
            WeatherCard::NothingHappens => "NOTHING_HAPPENS",
            WeatherCard::WindDirChanges(WindDirection::NW) => "WIND_DIR_CHANGES_NW",
            WeatherCard::WindDirChanges(WindDirection::NE) => "WIND_DIR_CHANGES_NE",
            WeatherCard::WindDirChanges(WindDirection::SE) => "WIND_DIR_CHANGES_SE",
            WeatherCard::WindDirChanges(WindDirection::SW) => "WIND_DIR_CHANGES_SW",
            WeatherCard::NoMoveAllowed => "NO_MOVE_ALLOWED",
            WeatherCard::Add1Speed => "ADD_1_SPEED",
            WeatherCard::GetBlownDownwind => "GET_BLOWN_DOWNWIND",
            WeatherCard::TurnOver => "TURN_OVER",
        }
    }

    fn copies_in_deck(self) -> usize {
        match self {
            WeatherCard::NothingHappens => 30,
            WeatherCard::WindDirChanges(_) => 1,
            WeatherCard::NoMoveAllowed => 5,
            WeatherCard::Add1Speed => 5,
            WeatherCard::GetBlownDownwind => 4,
            WeatherCard::TurnOver => 2,
        }
    }
}

impl fmt::Display for WeatherCard {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl Serialize for WeatherCard {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.name())
    }
}

impl<'de> Deserialize<'de> for WeatherCard {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let name = String::deserialize(deserializer)?;
        WeatherCard::from_name(&name)
            .ok_or_else(|| serde::de::Error::custom(format!("unknown weather card: {}", name)))
    }
}
