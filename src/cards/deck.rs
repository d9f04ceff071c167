//! Deck construction and drawing.
//!
//! The top of a deck is the end of the vector. Decks never run out: an
//! empty deck is rebuilt from the full catalog and reshuffled, and the
//! matching spent pile is cleared.

use rand::seq::SliceRandom;
use rand::Rng;

use super::Card;

/// Expands every catalog entry into its copies and shuffles the result.
pub fn create_deck<C: Card, R: Rng + ?Sized>(catalog: &[C], rng: &mut R) -> Vec<C> {
    let mut deck: Vec<C> = catalog
        .iter()
        .flat_map(|&card| std::iter::repeat(card).take(card.copies_in_deck()))
        .collect();
    deck.shuffle(rng);
    deck
}

/// Takes the top card, rebuilding the deck from `C::catalog()` when empty.
///
/// Returns `None` only for a catalog with no copies at all.
pub fn draw<C: Card, R: Rng + ?Sized>(deck: &mut Vec<C>, spent: &mut Vec<C>, rng: &mut R) -> Option<C> {
    if deck.is_empty() {
        *deck = create_deck(C::catalog(), rng);
        spent.clear();
        log::debug!("rebuilt a deck of {} cards", deck.len());
    }
    deck.pop()
}
