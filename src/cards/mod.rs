//! Weather and benefit cards.
//!
//! Cards are plain enums. Each catalog entry has a stable name, used as its
//! key in stored game records, and a number of copies in a fresh deck.

pub mod benefit;
pub mod deck;
pub mod weather;

pub use benefit::{expire_active, BenefitCard, BoostContext, PlayEffect, BENEFIT_CATALOG};
pub use deck::{create_deck, draw};
pub use weather::{WeatherCard, WEATHER_CATALOG};

/// A card type with a fixed catalog.
pub trait Card: Copy + PartialEq + Sized + 'static {
    /// Every distinct card of this type.
    fn catalog() -> &'static [Self];

    /// Stable name used for marshalling.
    fn name(self) -> &'static str;

    /// How many copies a freshly built deck holds.
    fn copies_in_deck(self) -> usize;

    /// Looks a card up by its stable name.
    fn from_name(name: &str) -> Option<Self> {
        Self::catalog().iter().copied().find(|c| c.name() == name)
    }
}
