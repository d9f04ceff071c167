//! Benefit cards ("sailor's delight").
//!
//! Drawn instead of moving, held in hand, and played right before moving.
//! A played card sits in the boat's active pile, boosting speed, until its
//! expiry condition is met and it moves to the discard pile.

use std::fmt;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use super::Card;
use crate::board::boat::{Boat, BoatId};
use crate::board::position::{Direction, Position};
use crate::board::state::{Game, TurnPhase};
use crate::resolve::GameEvent;
use crate::rules::wind::boats_blocking_wind;
use crate::sailing::{point_of_sail_and_tack, PointOfSail};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BenefitCard {
    ChooseWindOriginDir,
    SpeedBoost,
    NoTackingPenalty,
    IgnoreWindBlockers,
    UndoWeather,
    Spinnaker,
}

/// Every distinct benefit card.
pub const BENEFIT_CATALOG: [BenefitCard; 6] = [
    BenefitCard::ChooseWindOriginDir,
    BenefitCard::SpeedBoost,
    BenefitCard::NoTackingPenalty,
    BenefitCard::IgnoreWindBlockers,
    BenefitCard::UndoWeather,
    BenefitCard::Spinnaker,
];

/// What playing a card does beyond moving it to the active pile.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlayEffect {
    Nothing,
    Raise(GameEvent),
    /// Revert the weather revealed this turn, using the game log.
    UndoWeather,
}

/// Inputs for a card's speed modifier on one candidate move.
pub struct BoostContext<'a> {
    pub game: &'a Game,
    pub boat: &'a Boat,
    pub from: Position,
    pub dir: Direction,
    pub point_of_sail: PointOfSail,
    /// Speed taken away by the tacking penalty, 0 or 1.
    pub tack_penalty: u32,
    /// Speed after the penalty and any earlier cards in hand order.
    pub speed_so_far: u32,
}

impl BenefitCard {
    /// All benefit cards share one rule: the holder's turn, before moving.
    pub fn can_be_played(self, game: &Game, boat_id: BoatId) -> bool {
        game.id_of_boat_whose_turn_it_is == Some(boat_id)
            && game.current_turn_phase == Some(TurnPhase::BeforeMove)
    }

    pub fn play(self) -> PlayEffect {
        match self {
            BenefitCard::ChooseWindOriginDir => PlayEffect::Raise(GameEvent::INeedToChooseWindOriginDir),
            BenefitCard::UndoWeather => PlayEffect::UndoWeather,
            _ => PlayEffect::Nothing,
        }
    }

    /// Additive speed modifier, applied before wind blocking.
    pub fn speed_boost(self, ctx: &BoostContext<'_>) -> u32 {
        match self {
            BenefitCard::SpeedBoost => 1,
            BenefitCard::NoTackingPenalty => ctx.tack_penalty,
            BenefitCard::IgnoreWindBlockers => (0..=ctx.speed_so_far)
                .filter(|&k| {
                    let cell = ctx.from.steps(ctx.dir, k as i32);
                    !boats_blocking_wind(ctx.game, cell, ctx.boat.boat_id).is_empty()
                })
                .count() as u32,
            BenefitCard::Spinnaker => u32::from(ctx.point_of_sail == PointOfSail::Run),
            BenefitCard::ChooseWindOriginDir | BenefitCard::UndoWeather => 0,
        }
    }

    /// Whether an active card expires between two snapshots of the game.
    pub fn active_until(self, boat_id: BoatId, before: &Game, after: &Game) -> bool {
        match self {
            BenefitCard::Spinnaker => {
                running(before, boat_id) && !running(after, boat_id)
            }
            _ => turn_has_ended(boat_id, before, after),
        }
    }
}

/// Moves every active card of `boat_id` whose expiry condition holds
/// between `before` and `after` onto `after`'s discard pile.
///
/// Returns the expired cards.
pub fn expire_active(boat_id: BoatId, before: &Game, after: &mut Game) -> Vec<BenefitCard> {
    let Some(active) = after.boat(boat_id).map(|b| b.state.benefit_cards_active.clone()) else {
        return Vec::new();
    };
    let (expired, kept): (Vec<BenefitCard>, Vec<BenefitCard>) = active
        .into_iter()
        .partition(|card| card.active_until(boat_id, before, after));
    if expired.is_empty() {
        return expired;
    }
    if let Some(boat) = after.boat_mut(boat_id) {
        boat.state.benefit_cards_active = kept;
    }
    after.benefit_cards.discarded.extend(expired.iter().copied());
    expired
}

/// The holder's turn was in progress and has since ended.
fn turn_has_ended(boat_id: BoatId, before: &Game, after: &Game) -> bool {
    if before.id_of_boat_whose_turn_it_is != Some(boat_id) {
        return false;
    }
    if after.id_of_boat_whose_turn_it_is != Some(boat_id) {
        return true;
    }
    // A lone boat keeps the turn, so look at its turn counter instead.
    let turns = |g: &Game| g.boat(boat_id).map(|b| b.state.turns_completed);
    turns(after) > turns(before)
}

/// Whether the boat's most recent move was a run.
fn running(game: &Game, boat_id: BoatId) -> bool {
    let (Some(boat), Some(wind)) = (game.boat(boat_id), game.wind_origin_dir) else {
        return false;
    };
    match boat.state.most_recent_move_dir {
        Some(dir) => point_of_sail_and_tack(dir, wind, boat.state.tack).0 == PointOfSail::Run,
        None => false,
    }
}

impl Card for BenefitCard {
    fn catalog() -> &'static [Self] {
        &BENEFIT_CATALOG
    }

    fn name(self) -> &'static str {
        match self {
            BenefitCard::ChooseWindOriginDir => "CHOOSE_WIND_ORIGIN_DIR",
            BenefitCard::SpeedBoost => "SPEED_BOOST",
            BenefitCard::NoTackingPenalty => "NO_TACKING_PENALTY",
            BenefitCard::IgnoreWindBlockers => "IGNORE_WIND_BLOCKERS",
            BenefitCard::UndoWeather => "UNDO_WEATHER",
            BenefitCard::Spinnaker => "SPINNAKER",
        }
    }

    fn copies_in_deck(self) -> usize {
        match self {
            BenefitCard::ChooseWindOriginDir => 6,
            BenefitCard::SpeedBoost => 4,
            BenefitCard::NoTackingPenalty => 4,
            BenefitCard::IgnoreWindBlockers => 4,
            BenefitCard::UndoWeather => 4,
            BenefitCard::Spinnaker => 3,
        }
    }
}

impl fmt::Display for BenefitCard {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl Serialize for BenefitCard {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.name())
    }
}

impl<'de> Deserialize<'de> for BenefitCard {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let name = String::deserialize(deserializer)?;
        BenefitCard::from_name(&name)
            .ok_or_else(|| serde::de::Error::custom(format!("unknown benefit card: {}", name)))
    }
}
