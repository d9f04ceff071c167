//! Ready About engine library.
//!
//! Exposes the board model, sailing rules, cards, the command/event
//! engine, storage seams, and protocol modules for use by integration
//! tests and the binary entry points.

pub mod board;
pub mod cards;
pub mod control;
pub mod engine;
pub mod logging;
pub mod protocol;
pub mod resolve;
pub mod rules;
pub mod sailing;
pub mod selfplay;
pub mod store;
