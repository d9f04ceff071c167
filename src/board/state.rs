//! Game state representation.
//!
//! `Game` is the root aggregate shared by every client. It is always
//! replaced wholesale: the engine clones it, applies a transition, and
//! writes the new value back through the store.

use chrono::{DateTime, Utc};
use rand::Rng;
use serde::{Deserialize, Serialize};

use super::boat::{Boat, BoatId};
use super::course::Course;
use super::position::{Direction, Position};
use crate::cards::{create_deck, BenefitCard, WeatherCard, BENEFIT_CATALOG, WEATHER_CATALOG};

/// Stage of the current boat's turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TurnPhase {
    BeforeWeather,
    BeforeMove,
    Moving,
}

/// Weather draw pile and the cards revealed from it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WeatherDeck {
    pub deck: Vec<WeatherCard>,
    pub revealed: Vec<WeatherCard>,
}

/// Benefit draw pile and the cards discarded after use.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BenefitDeck {
    pub deck: Vec<BenefitCard>,
    pub discarded: Vec<BenefitCard>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Game {
    pub game_id: String,
    pub boats: Vec<Boat>,
    #[serde(default)]
    pub course: Option<Course>,
    /// Set once the owner starts the race.
    #[serde(default)]
    pub started: bool,
    #[serde(default)]
    pub wind_origin_dir: Option<Direction>,
    #[serde(default)]
    pub id_of_boat_whose_turn_it_is: Option<BoatId>,
    /// Boat ids in turn order, appended as boats join.
    pub turn_order: Vec<BoatId>,
    #[serde(default)]
    pub current_turn_phase: Option<TurnPhase>,
    /// Weather in effect for the current turn.
    #[serde(default)]
    pub current_weather: Option<WeatherCard>,
    pub weather_cards: WeatherDeck,
    pub benefit_cards: BenefitDeck,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub finished_at: Option<DateTime<Utc>>,
}

impl Game {
    /// Creates an empty game with freshly shuffled decks.
    pub fn new<R: Rng + ?Sized>(game_id: impl Into<String>, rng: &mut R) -> Self {
        Game {
            game_id: game_id.into(),
            boats: Vec::new(),
            course: None,
            started: false,
            wind_origin_dir: None,
            id_of_boat_whose_turn_it_is: None,
            turn_order: Vec::new(),
            current_turn_phase: None,
            current_weather: None,
            weather_cards: WeatherDeck {
                deck: create_deck(&WEATHER_CATALOG, rng),
                revealed: Vec::new(),
            },
            benefit_cards: BenefitDeck {
                deck: create_deck(&BENEFIT_CATALOG, rng),
                discarded: Vec::new(),
            },
            created_at: Utc::now(),
            finished_at: None,
        }
    }

    pub fn boat(&self, id: BoatId) -> Option<&Boat> {
        self.boats.iter().find(|b| b.boat_id == id)
    }

    pub fn boat_mut(&mut self, id: BoatId) -> Option<&mut Boat> {
        self.boats.iter_mut().find(|b| b.boat_id == id)
    }

    /// The boat occupying `pos`, other than `except`.
    pub fn boat_at(&self, pos: Position, except: Option<BoatId>) -> Option<&Boat> {
        self.boats
            .iter()
            .find(|b| b.state.pos == Some(pos) && Some(b.boat_id) != except)
    }

    pub fn is_buoy(&self, pos: Position) -> bool {
        self.course.as_ref().map(|c| c.is_buoy(pos)).unwrap_or(false)
    }

    pub fn is_finished(&self) -> bool {
        self.finished_at.is_some()
    }

    pub fn is_turn_of(&self, id: BoatId) -> bool {
        self.id_of_boat_whose_turn_it_is == Some(id)
    }

    pub fn finished_count(&self) -> usize {
        self.boats.iter().filter(|b| b.has_finished()).count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::boat::{BoatColor, BoatSettings};
    use rand::rngs::SmallRng;
    use rand::SeedableRng;
    use uuid::Uuid;

    #[test]
    fn new_game_has_full_decks() {
        let game = Game::new("g1", &mut SmallRng::seed_from_u64(1));
        assert_eq!(game.weather_cards.deck.len(), 50);
        assert_eq!(game.benefit_cards.deck.len(), 25);
        assert!(game.boats.is_empty());
        assert!(!game.started);
        assert!(!game.is_finished());
    }

    #[test]
    fn boat_lookup_by_position() {
        let mut game = Game::new("g1", &mut SmallRng::seed_from_u64(1));
        let id = Uuid::from_u128(7);
        let mut boat = Boat::new(id, BoatSettings::new("Ann", BoatColor::Red));
        boat.state.pos = Some(Position::new(3, 4));
        game.boats.push(boat);
        assert_eq!(game.boat_at(Position::new(3, 4), None).map(|b| b.boat_id), Some(id));
        assert!(game.boat_at(Position::new(3, 4), Some(id)).is_none());
        assert!(game.boat_at(Position::new(4, 4), None).is_none());
    }

    #[test]
    fn phase_serializes_screaming() {
        let json = serde_json::to_string(&TurnPhase::BeforeWeather).unwrap();
        assert_eq!(json, "\"BEFORE_WEATHER\"");
    }

    #[test]
    fn buoys_need_a_course() {
        let mut game = Game::new("g1", &mut SmallRng::seed_from_u64(1));
        assert!(!game.is_buoy(Position::new(5, 5)));
        game.course = Some(Course::default());
        assert!(game.is_buoy(Position::new(5, 5)));
    }
}
