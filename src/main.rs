//! Ready About -- a sailing regatta rules engine on a line protocol.
//!
//! This binary reads commands from stdin and writes responses to stdout.
//! Diagnostics go to stderr; set `READY_ABOUT_LOG=debug` to trace every
//! command and event.

use std::io::{self, BufRead};

use ready_about::logging;
use ready_about::protocol::parser::{parse_command, Command};
use ready_about::protocol::Session;
use ready_about::resolve::GameCommand;

/// Runs the main protocol loop, reading commands from stdin and writing
/// responses to stdout.
fn main() {
    logging::init_from_env();

    let stdin = io::stdin();
    let stdout = io::stdout();
    let mut out = io::BufWriter::new(stdout.lock());
    let mut session = Session::default();

    for line in stdin.lock().lines() {
        let line = match line {
            Ok(l) => l,
            Err(_) => break,
        };

        let cmd = match parse_command(&line) {
            Some(c) => c,
            None => continue,
        };

        match cmd {
            Command::IsReady => session.handle_isready(&mut out),
            Command::SetOption { name, value } => session.set_option(&name, value.as_deref()),
            Command::NewGame { game_id } => session.handle_newgame(&game_id, &mut out),
            Command::Boat(settings) => session.handle_command(GameCommand::ChooseMyBoat(settings), &mut out),
            Command::Course(course) => session.handle_command(GameCommand::ChooseCourse(course), &mut out),
            Command::Wind(dir) => session.handle_command(GameCommand::DecideInitWindOriginDir(dir), &mut out),
            Command::Shift(dir) => session.handle_command(GameCommand::ChangeWindOriginDir(dir), &mut out),
            Command::Start => session.handle_command(GameCommand::StartGame, &mut out),
            Command::Pos(pos) => session.handle_command(GameCommand::ChooseBoatStartingPos(pos), &mut out),
            Command::Reveal => session.handle_command(GameCommand::BeginTurnByRevealingWeatherCard, &mut out),
            Command::Move(dir) => session.handle_command(GameCommand::ChooseMoveDirection(dir), &mut out),
            Command::Speed(dir) => session.handle_speed(dir, &mut out),
            Command::Draw => session.handle_command(GameCommand::DrawBenefitCard, &mut out),
            Command::Play(card) => session.handle_command(GameCommand::PlayBenefitCard(card), &mut out),
            Command::Downwind => session.handle_command(GameCommand::MoveMe1SpaceDownwindForFree, &mut out),
            Command::EndTurn => session.handle_command(GameCommand::EndTurnAndCycle, &mut out),
            Command::State => session.handle_state(&mut out),
            Command::Controls => session.handle_controls(&mut out),
            Command::Replay => session.handle_replay(&mut out),
            Command::Options => session.handle_options(&mut out),
            Command::Quit => break,
        }
    }
}
