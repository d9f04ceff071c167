//! Line-protocol session state.
//!
//! A `Session` owns at most one open engine plus the receiving end of its
//! observer channel. Every handler writes its reply to `out` and then
//! prints the events the engine raised while handling it.

use std::io::Write;
use std::sync::mpsc::{self, Receiver};

use crate::board::position::{Direction, ALL_DIRECTIONS};
use crate::control::{ChannelObserver, Notice};
use crate::engine::{Engine, EngineError, EngineOptions};
use crate::protocol::record::game_to_record;
use crate::resolve::GameCommand;
use crate::store::{MemoryIdentity, SharedStore};

type LocalEngine = Engine<SharedStore, MemoryIdentity>;

/// Driver state between protocol lines.
pub struct Session {
    store: SharedStore,
    options: EngineOptions,
    engine: Option<LocalEngine>,
    notices: Option<Receiver<Notice>>,
}

impl Default for Session {
    fn default() -> Self {
        Session::new(EngineOptions::default())
    }
}

impl Session {
    pub fn new(options: EngineOptions) -> Self {
        Session {
            store: SharedStore::new(),
            options,
            engine: None,
            notices: None,
        }
    }

    pub fn engine(&self) -> Option<&LocalEngine> {
        self.engine.as_ref()
    }

    /// Handles `isready`.
    pub fn handle_isready<W: Write>(&self, out: &mut W) {
        let _ = writeln!(out, "readyok");
        let _ = out.flush();
    }

    /// Handles `setoption`. Options set before `newgame` apply to the next
    /// game opened.
    pub fn set_option(&mut self, name: &str, value: Option<&str>) {
        let result = match self.engine.as_mut() {
            Some(engine) => engine.set_option(name, value),
            None => self.options.set(name, value),
        };
        match result {
            Ok(()) => {
                if let Some(engine) = &self.engine {
                    self.options = engine.options().clone();
                }
            }
            Err(e) => eprintln!("{}", e),
        }
    }

    /// Handles `options`: one `option name <id> value <x>` line each,
    /// then `optionsok`.
    pub fn handle_options<W: Write>(&self, out: &mut W) {
        for (name, value) in self.options.values() {
            let _ = writeln!(out, "option name {} value {}", name, value);
        }
        let _ = writeln!(out, "optionsok");
        let _ = out.flush();
    }

    /// Handles `newgame <id>`, opening the game as a fresh client.
    pub fn handle_newgame<W: Write>(&mut self, game_id: &str, out: &mut W) {
        let (tx, rx) = mpsc::channel();
        let opened = Engine::open_with_observer(
            game_id,
            self.store.clone(),
            MemoryIdentity::new(),
            self.options.clone(),
            Box::new(ChannelObserver::new(tx)),
        );
        match opened {
            Ok(engine) => {
                let _ = writeln!(out, "game {} boats {}", game_id, engine.game().boats.len());
                self.engine = Some(engine);
                self.notices = Some(rx);
                self.flush_events(out);
            }
            Err(e) => eprintln!("cannot open game {}: {}", game_id, e),
        }
    }

    /// Dispatches a game command and reports the events it raised.
    pub fn handle_command<W: Write>(&mut self, command: GameCommand, out: &mut W) {
        let Some(engine) = self.engine.as_mut() else {
            eprintln!("no game open; use 'newgame <id>'");
            return;
        };
        if let Err(e) = engine.dispatch_command(command) {
            report(&e);
        }
        self.flush_events(out);
    }

    /// Handles `speed [dir]`: one line per direction.
    pub fn handle_speed<W: Write>(&self, dir: Option<Direction>, out: &mut W) {
        let Some(engine) = self.engine.as_ref() else {
            eprintln!("no game open; use 'newgame <id>'");
            return;
        };
        let dirs = match dir {
            Some(d) => vec![d],
            None => ALL_DIRECTIONS.to_vec(),
        };
        for d in dirs {
            let potential = engine.potential_speed_and_tack(d);
            let tack = potential.tack.map(|t| t.as_str()).unwrap_or("-");
            if potential.reason.is_empty() {
                let _ = writeln!(out, "speed {} {} {}", d, potential.speed, tack);
            } else {
                let _ = writeln!(out, "speed {} {} {} reason {}", d, potential.speed, tack, potential.reason);
            }
        }
        let _ = out.flush();
    }

    /// Handles `state`: the current game record on one line.
    pub fn handle_state<W: Write>(&self, out: &mut W) {
        let Some(engine) = self.engine.as_ref() else {
            eprintln!("no game open; use 'newgame <id>'");
            return;
        };
        match game_to_record(engine.game()) {
            Ok(record) => {
                let _ = writeln!(out, "state {}", record);
            }
            Err(e) => eprintln!("{}", e),
        }
        let _ = out.flush();
    }

    /// Handles `controls`.
    pub fn handle_controls<W: Write>(&self, out: &mut W) {
        let Some(engine) = self.engine.as_ref() else {
            eprintln!("no game open; use 'newgame <id>'");
            return;
        };
        match serde_json::to_string(engine.controls()) {
            Ok(json) => {
                let _ = writeln!(out, "controls {}", json);
            }
            Err(e) => eprintln!("{}", e),
        }
        let _ = out.flush();
    }

    /// Handles `replay`: every logged snapshot as a one-line summary.
    pub fn handle_replay<W: Write>(&mut self, out: &mut W) {
        let Some(engine) = self.engine.as_mut() else {
            eprintln!("no game open; use 'newgame <id>'");
            return;
        };
        match engine.replay() {
            Ok(games) => {
                for (i, game) in games.iter().enumerate() {
                    let turn = game
                        .id_of_boat_whose_turn_it_is
                        .and_then(|id| game.boat(id))
                        .map(|b| b.name().to_string())
                        .unwrap_or_else(|| "-".to_string());
                    let wind = game.wind_origin_dir.map(|d| d.as_str()).unwrap_or("-");
                    let _ = writeln!(
                        out,
                        "snapshot {} boats {} wind {} turn {} finished {}",
                        i,
                        game.boats.len(),
                        wind,
                        turn,
                        game.finished_count()
                    );
                }
                let _ = writeln!(out, "replayok {}", games.len());
            }
            Err(e) => report(&e),
        }
        self.flush_events(out);
    }

    /// Prints `event <Name>` for every event raised since the last flush.
    fn flush_events<W: Write>(&self, out: &mut W) {
        if let Some(rx) = &self.notices {
            for notice in rx.try_iter() {
                if let Notice::Event(event) = notice {
                    let _ = writeln!(out, "event {}", event.name());
                }
            }
        }
        let _ = out.flush();
    }
}

fn report(e: &EngineError) {
    match e {
        EngineError::WritesHalted => log::error!("{}", e),
        _ => eprintln!("{}", e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::boat::{BoatColor, BoatSettings};

    fn seeded() -> Session {
        let mut session = Session::default();
        session.set_option("Seed", Some("7"));
        session
    }

    fn text(buf: Vec<u8>) -> String {
        String::from_utf8(buf).unwrap()
    }

    #[test]
    fn options_reflect_setoption() {
        let mut session = seeded();
        session.set_option("WriteLimit", Some("off"));
        let mut out = Vec::new();
        session.handle_options(&mut out);
        let out = text(out);
        assert!(out.contains("option name Seed value 7\n"));
        assert!(out.contains("option name WriteLimit value off\n"));
        assert!(out.ends_with("optionsok\n"));
    }

    #[test]
    fn newgame_asks_for_a_boat() {
        let mut session = seeded();
        let mut out = Vec::new();
        session.handle_newgame("g1", &mut out);
        let out = text(out);
        assert!(out.contains("game g1 boats 0"));
        assert!(out.contains("event INeedToChooseMyBoat"));
    }

    #[test]
    fn joining_as_owner_chooses_course_and_wind() {
        let mut session = seeded();
        session.handle_newgame("g1", &mut Vec::new());
        let mut out = Vec::new();
        session.handle_command(
            GameCommand::ChooseMyBoat(BoatSettings::new("Ann", BoatColor::Red)),
            &mut out,
        );
        let out = text(out);
        assert!(out.contains("event INeedToChooseTheCourse"));
        assert!(out.contains("event INeedToChooseWindOriginDir"));
        let game = session.engine().unwrap().game();
        assert!(game.course.is_some());
        assert!(game.wind_origin_dir.is_some());
    }

    #[test]
    fn commands_without_a_game_are_ignored() {
        let mut session = seeded();
        let mut out = Vec::new();
        session.handle_command(GameCommand::StartGame, &mut out);
        session.handle_state(&mut out);
        assert!(out.is_empty());
    }

    #[test]
    fn speed_before_joining_explains_why() {
        let mut session = seeded();
        session.handle_newgame("g1", &mut Vec::new());
        let mut out = Vec::new();
        session.handle_speed(Some(Direction::N), &mut out);
        assert_eq!(text(out), "speed N 0 - reason Your boat has not been chosen\n");
    }

    #[test]
    fn options_apply_to_the_next_game() {
        let mut session = seeded();
        session.set_option("BoardSize", Some("40"));
        session.handle_newgame("g1", &mut Vec::new());
        assert_eq!(session.engine().unwrap().options().board_size, 40);
    }
}
