//! Line protocol parser.
//!
//! Parses driver commands from raw text into `Command` variants that the
//! session loop dispatches on.

use crate::board::boat::{BoatColor, BoatSettings};
use crate::board::course::Course;
use crate::board::position::{Direction, Position, WindDirection};
use crate::cards::{BenefitCard, Card};

/// A parsed driver-to-engine command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Synchronization ping; engine must reply `readyok`.
    IsReady,

    /// Set an engine option: `setoption name <id> [value <x>]`.
    SetOption { name: String, value: Option<String> },

    /// Open or create a game: `newgame <id>`.
    NewGame { game_id: String },

    /// Join with a boat: `boat <name> <color>`.
    Boat(BoatSettings),

    /// Choose the course: `course` for the standard one, or
    /// `course <x1> <y1> <x2> <y2> <mx> <my> [<mx> <my>]`.
    Course(Course),

    /// Set the opening wind: `wind <NW|NE|SE|SW>`.
    Wind(WindDirection),

    /// Change the wind during play: `shift <NW|NE|SE|SW>`.
    Shift(WindDirection),

    Start,

    /// Place the boat: `pos <x> <y>`.
    Pos(Position),

    /// Reveal the weather card, for drivers running without auto turns.
    Reveal,

    /// Step one cell: `move <dir>`.
    Move(Direction),

    /// Query potential speed: `speed <dir>`, or `speed` for all eight.
    Speed(Option<Direction>),

    Draw,

    /// Play a benefit card by catalog name: `play <CARD>`.
    Play(BenefitCard),

    Downwind,

    EndTurn,

    /// Print the game record as one JSON line.
    State,

    /// Print the control panel as one JSON line.
    Controls,

    /// Print every logged snapshot, oldest first.
    Replay,

    /// List the current engine options.
    Options,

    /// Terminate the engine process.
    Quit,
}

/// Parses a single line of input into a `Command`.
///
/// Returns `None` for empty lines or unrecognized commands. Malformed
/// arguments for known commands also return `None` after logging to stderr.
pub fn parse_command(line: &str) -> Option<Command> {
    let trimmed = line.trim();
    if trimmed.is_empty() {
        return None;
    }

    let tokens: Vec<&str> = trimmed.split_whitespace().collect();

    match tokens[0] {
        "isready" => Some(Command::IsReady),
        "quit" => Some(Command::Quit),
        "start" => Some(Command::Start),
        "reveal" => Some(Command::Reveal),
        "draw" => Some(Command::Draw),
        "downwind" => Some(Command::Downwind),
        "endturn" => Some(Command::EndTurn),
        "state" => Some(Command::State),
        "controls" => Some(Command::Controls),
        "replay" => Some(Command::Replay),
        "options" => Some(Command::Options),

        "setoption" => parse_setoption(&tokens),
        "newgame" => parse_newgame(&tokens),
        "boat" => parse_boat(&tokens),
        "course" => parse_course(&tokens),
        "wind" => parse_wind(&tokens).map(Command::Wind),
        "shift" => parse_wind(&tokens).map(Command::Shift),
        "pos" => parse_pos(&tokens),
        "move" => parse_direction(&tokens).map(Command::Move),
        "speed" => parse_speed(&tokens),
        "play" => parse_play(&tokens),

        other => {
            eprintln!("unknown command: {}", other);
            None
        }
    }
}

/// Parses `setoption name <id> [value <x>]`.
fn parse_setoption(tokens: &[&str]) -> Option<Command> {
    if tokens.len() < 3 || tokens[1] != "name" {
        eprintln!("malformed setoption: expected 'setoption name <id> [value <x>]'");
        return None;
    }

    let value_idx = tokens.iter().position(|&t| t == "value");
    let (name, value) = match value_idx {
        Some(vi) => {
            let name_parts = &tokens[2..vi];
            if name_parts.is_empty() {
                eprintln!("malformed setoption: empty name");
                return None;
            }
            let value_parts = &tokens[vi + 1..];
            let value = (!value_parts.is_empty()).then(|| value_parts.join(" "));
            (name_parts.join(" "), value)
        }
        None => (tokens[2..].join(" "), None),
    };

    Some(Command::SetOption { name, value })
}

fn parse_newgame(tokens: &[&str]) -> Option<Command> {
    match tokens.get(1) {
        Some(id) => Some(Command::NewGame {
            game_id: id.to_string(),
        }),
        None => {
            eprintln!("malformed newgame: expected 'newgame <id>'");
            None
        }
    }
}

/// Parses `boat <name> <color>`. The name may contain spaces.
fn parse_boat(tokens: &[&str]) -> Option<Command> {
    if tokens.len() < 3 {
        eprintln!("malformed boat: expected 'boat <name> <color>'");
        return None;
    }
    let color_token = tokens[tokens.len() - 1];
    match color_token.parse::<BoatColor>() {
        Ok(color) => Some(Command::Boat(BoatSettings::new(
            tokens[1..tokens.len() - 1].join(" "),
            color,
        ))),
        Err(e) => {
            eprintln!("{}", e);
            None
        }
    }
}

fn parse_course(tokens: &[&str]) -> Option<Command> {
    if tokens.len() == 1 {
        return Some(Command::Course(Course::default()));
    }
    let mut coords = Vec::with_capacity(tokens.len() - 1);
    for t in &tokens[1..] {
        match t.parse::<i32>() {
            Ok(v) => coords.push(v),
            Err(_) => {
                eprintln!("invalid coordinate: '{}'", t);
                return None;
            }
        }
    }
    if coords.len() != 6 && coords.len() != 8 {
        eprintln!("malformed course: expected start line and 1 or 2 marks");
        return None;
    }
    let points: Vec<Position> = coords.chunks(2).map(|c| Position::new(c[0], c[1])).collect();
    match Course::new([points[0], points[1]], points[2..].to_vec()) {
        Ok(course) => Some(Command::Course(course)),
        Err(e) => {
            eprintln!("invalid course: {}", e);
            None
        }
    }
}

fn parse_wind(tokens: &[&str]) -> Option<WindDirection> {
    let Some(raw) = tokens.get(1) else {
        eprintln!("malformed {}: expected a diagonal direction", tokens[0]);
        return None;
    };
    match raw.parse::<WindDirection>() {
        Ok(dir) => Some(dir),
        Err(e) => {
            eprintln!("{}", e);
            None
        }
    }
}

fn parse_direction(tokens: &[&str]) -> Option<Direction> {
    let Some(raw) = tokens.get(1) else {
        eprintln!("malformed {}: expected a direction", tokens[0]);
        return None;
    };
    match raw.parse::<Direction>() {
        Ok(dir) => Some(dir),
        Err(e) => {
            eprintln!("{}", e);
            None
        }
    }
}

fn parse_pos(tokens: &[&str]) -> Option<Command> {
    if tokens.len() < 3 {
        eprintln!("malformed pos: expected 'pos <x> <y>'");
        return None;
    }
    match (tokens[1].parse::<i32>(), tokens[2].parse::<i32>()) {
        (Ok(x), Ok(y)) => Some(Command::Pos(Position::new(x, y))),
        _ => {
            eprintln!("invalid position: '{} {}'", tokens[1], tokens[2]);
            None
        }
    }
}

fn parse_speed(tokens: &[&str]) -> Option<Command> {
    if tokens.len() == 1 {
        return Some(Command::Speed(None));
    }
    parse_direction(tokens).map(|d| Command::Speed(Some(d)))
}

fn parse_play(tokens: &[&str]) -> Option<Command> {
    let Some(raw) = tokens.get(1) else {
        eprintln!("malformed play: expected 'play <CARD>'");
        return None;
    };
    match BenefitCard::from_name(&raw.to_ascii_uppercase()) {
        Some(card) => Some(Command::Play(card)),
        None => {
            eprintln!("unknown benefit card: '{}'", raw);
            None
        }
    }
}
