//! Protocol handling.
//!
//! Game records (the stored JSON shape of a game), the line protocol
//! parser, and the session state behind the `ready-about` binary.

pub mod parser;
pub mod record;
pub mod session;

pub use parser::{parse_command, Command};
pub use record::{game_to_record, record_to_game, RecordError};
pub use session::Session;
