//! Game records: the plain JSON shape a game takes in storage.
//!
//! Cards are stored by catalog name. Loading a record with a card name that
//! is not in its catalog fails with `RecordError::UnknownCard` rather than
//! being dropped or defaulted.

use serde_json::Value;
use thiserror::Error;

use crate::board::state::Game;
use crate::cards::{BenefitCard, Card, WeatherCard};

#[derive(Debug, Error)]
pub enum RecordError {
    #[error("unknown {kind} card {name:?} at {path}")]
    UnknownCard {
        kind: &'static str,
        name: String,
        path: String,
    },
    #[error("malformed game record: {0}")]
    Malformed(#[from] serde_json::Error),
}

/// Marshals a game into its stored record.
pub fn game_to_record(game: &Game) -> Result<Value, RecordError> {
    Ok(serde_json::to_value(game)?)
}

/// Unmarshals a stored record, resolving every card name against its
/// catalog first.
pub fn record_to_game(record: &Value) -> Result<Game, RecordError> {
    check_cards::<WeatherCard>(record, "weather", &["weatherCards", "deck"])?;
    check_cards::<WeatherCard>(record, "weather", &["weatherCards", "revealed"])?;
    check_cards::<BenefitCard>(record, "benefit", &["benefitCards", "deck"])?;
    check_cards::<BenefitCard>(record, "benefit", &["benefitCards", "discarded"])?;
    if let Some(name) = record.get("currentWeather").and_then(Value::as_str) {
        check_name::<WeatherCard>(name, "weather", "currentWeather")?;
    }
    if let Some(boats) = record.get("boats").and_then(Value::as_array) {
        for (i, boat) in boats.iter().enumerate() {
            let state = &boat["state"];
            for hand in ["benefitCardsDrawn", "benefitCardsActive"] {
                let path = format!("boats[{}].state.{}", i, hand);
                check_list::<BenefitCard>(state.get(hand), "benefit", &path)?;
            }
        }
    }
    Ok(serde_json::from_value(record.clone())?)
}

fn check_cards<C: Card>(record: &Value, kind: &'static str, path: &[&str]) -> Result<(), RecordError> {
    let list = path.iter().try_fold(record, |v, key| v.get(*key));
    check_list::<C>(list, kind, &path.join("."))
}

fn check_list<C: Card>(list: Option<&Value>, kind: &'static str, path: &str) -> Result<(), RecordError> {
    let Some(items) = list.and_then(Value::as_array) else {
        return Ok(());
    };
    for (i, item) in items.iter().enumerate() {
        if let Some(name) = item.as_str() {
            check_name::<C>(name, kind, &format!("{}[{}]", path, i))?;
        }
    }
    Ok(())
}

fn check_name<C: Card>(name: &str, kind: &'static str, path: &str) -> Result<(), RecordError> {
    match C::from_name(name) {
        Some(_) => Ok(()),
        None => Err(RecordError::UnknownCard {
            kind,
            name: name.to_string(),
            path: path.to_string(),
        }),
    }
}
