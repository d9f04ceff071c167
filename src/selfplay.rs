//! Self-play regattas between bots.
//!
//! Every game runs one engine per boat against a shared in-memory store,
//! the way separate clients share one document. After every action the
//! harness feeds the latest record to each engine that has not seen it,
//! until all of them agree. Bots pick moves greedily toward the next
//! waypoint of the course, with a little randomness.

use std::io::Write;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Instant;

use rand::rngs::SmallRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use serde::Serialize;

use crate::board::boat::{Boat, BoatSettings, ALL_COLORS};
use crate::board::course::{Course, Fence};
use crate::board::position::{Direction, Position, ALL_DIRECTIONS, ALL_WIND_DIRECTIONS};
use crate::board::state::TurnPhase;
use crate::cards::BenefitCard;
use crate::engine::{Engine, EngineError, EngineOptions};
use crate::protocol::record::record_to_game;
use crate::resolve::GameCommand;
use crate::store::{GameStore, MemoryIdentity, SharedStore};

const BOAT_NAMES: [&str; 6] = ["Albatross", "Bluebird", "Cormorant", "Dunlin", "Egret", "Fulmar"];

/// Sync passes allowed after one action before giving up on quiescence.
const MAX_SYNC_ROUNDS: usize = 256;

type BotEngine = Engine<SharedStore, MemoryIdentity>;

/// Configuration for self-play game generation.
#[derive(Clone)]
pub struct SelfPlayConfig {
    /// Number of games to play.
    pub num_games: usize,
    /// Boats per game, 1 to 6.
    pub boats: usize,
    /// Stop a game once any boat has completed this many turns.
    pub max_turns: u32,
    /// Chance of picking a random legal heading instead of the best one.
    pub epsilon: f64,
    /// Chance of playing a held benefit card before moving.
    pub card_chance: f64,
    /// Number of parallel threads for concurrent games.
    pub threads: usize,
    /// Random seed (0 = use entropy).
    pub seed: u64,
    /// Suppress per-game progress output.
    pub quiet: bool,
}

impl Default for SelfPlayConfig {
    fn default() -> Self {
        SelfPlayConfig {
            num_games: 10,
            boats: 3,
            max_turns: 300,
            epsilon: 0.1,
            card_chance: 0.5,
            threads: 4,
            seed: 0,
            quiet: false,
        }
    }
}

/// How one boat fared.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BoatResult {
    pub name: String,
    pub color: String,
    pub turns_completed: u32,
    pub crossed_start: bool,
    pub marks_rounded: usize,
    pub finished: bool,
}

/// A completed self-play game.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GameResult {
    pub game_id: String,
    pub index: usize,
    /// Whether the race ended rather than hitting the turn limit.
    pub race_over: bool,
    /// Boat names in the order they crossed the finish.
    pub finish_order: Vec<String>,
    pub actions: usize,
    pub snapshots: usize,
    pub boats: Vec<BoatResult>,
}

impl GameResult {
    pub fn winner(&self) -> Option<&str> {
        self.finish_order.first().map(String::as_str)
    }
}

/// Plays one full regatta.
pub fn play_game(config: &SelfPlayConfig, index: usize, rng: &mut SmallRng) -> Result<GameResult, EngineError> {
    let game_id = format!("selfplay-{}", index);
    let store = SharedStore::new();
    let boats = config.boats.clamp(1, ALL_COLORS.len());

    let mut engines: Vec<BotEngine> = Vec::with_capacity(boats);
    for i in 0..boats {
        let options = EngineOptions {
            seed: Some(rng.gen()),
            write_limit: None,
            ..Default::default()
        };
        let mut engine = Engine::open(&game_id, store.clone(), MemoryIdentity::new(), options)?;
        engine.dispatch_command(GameCommand::ChooseMyBoat(BoatSettings::new(BOAT_NAMES[i], ALL_COLORS[i])))?;
        engines.push(engine);
        sync_all(&mut engines, &store, &game_id)?;
    }
    engines[0].dispatch_command(GameCommand::StartGame)?;
    sync_all(&mut engines, &store, &game_id)?;

    let action_cap = config.max_turns as usize * boats * 8;
    let mut finish_order: Vec<String> = Vec::new();
    let mut actions = 0;
    while actions < action_cap {
        let game = engines[0].game();
        if game.is_finished() || most_turns(&game.boats) >= config.max_turns {
            break;
        }
        let Some(seat) = game
            .id_of_boat_whose_turn_it_is
            .and_then(|id| engines.iter().position(|e| e.my_boat_id() == Some(id)))
        else {
            log::warn!("{}: no engine holds the turn", game_id);
            break;
        };

        let before = engines[seat].game().clone();
        let command = choose_action(&engines[seat], config, rng);
        engines[seat].dispatch_command(command)?;
        if *engines[seat].game() == before {
            engines[seat].dispatch_command(GameCommand::EndTurnAndCycle)?;
        }
        sync_all(&mut engines, &store, &game_id)?;
        actions += 1;

        for boat in &engines[0].game().boats {
            if boat.has_finished() && !finish_order.iter().any(|n| n == boat.name()) {
                finish_order.push(boat.name().to_string());
            }
        }
    }

    let game = engines[0].game();
    Ok(GameResult {
        game_id,
        index,
        race_over: game.is_finished(),
        finish_order,
        actions,
        snapshots: store.replay(&game.game_id)?.len(),
        boats: game
            .boats
            .iter()
            .map(|b| BoatResult {
                name: b.name().to_string(),
                color: b.settings.color.to_string(),
                turns_completed: b.state.turns_completed,
                crossed_start: b.state.progress.has_crossed_start,
                marks_rounded: b.state.progress.marks_rounded(),
                finished: b.has_finished(),
            })
            .collect(),
    })
}

fn most_turns(boats: &[Boat]) -> u32 {
    boats.iter().map(|b| b.state.turns_completed).max().unwrap_or(0)
}

/// Feeds the stored record to every engine that has not adopted it, one
/// at a time, until every engine holds the same game.
fn sync_all(engines: &mut [BotEngine], store: &SharedStore, game_id: &str) -> Result<(), EngineError> {
    for _ in 0..MAX_SYNC_ROUNDS {
        let Some(record) = store.load(game_id)? else {
            return Ok(());
        };
        let latest = record_to_game(&record)?;
        let Some(stale) = engines.iter_mut().find(|e| *e.game() != latest) else {
            return Ok(());
        };
        stale.resolve_db_change(&record)?;
    }
    log::warn!("{}: engines still disagree after {} sync rounds", game_id, MAX_SYNC_ROUNDS);
    Ok(())
}

/// Picks the bot's next command. Assumes it is the bot's turn.
fn choose_action(engine: &BotEngine, config: &SelfPlayConfig, rng: &mut SmallRng) -> GameCommand {
    let game = engine.game();
    let Some(boat) = engine.my_boat() else {
        return GameCommand::EndTurnAndCycle;
    };
    let Some(pos) = boat.state.pos else {
        return match pick_start(engine, rng) {
            Some(start) => GameCommand::ChooseBoatStartingPos(start),
            None => GameCommand::EndTurnAndCycle,
        };
    };

    match game.current_turn_phase {
        Some(TurnPhase::BeforeWeather) | None => GameCommand::BeginTurnByRevealingWeatherCard,
        Some(TurnPhase::Moving) => match boat.state.most_recent_move_dir {
            Some(dir) => GameCommand::ChooseMoveDirection(dir),
            None => GameCommand::EndTurnAndCycle,
        },
        Some(TurnPhase::BeforeMove) => {
            if engine.controls().i_need_to_choose_wind_origin_dir
                && boat.state.benefit_cards_active.contains(&BenefitCard::ChooseWindOriginDir)
            {
                let dir = *ALL_WIND_DIRECTIONS.choose(rng).unwrap_or(&ALL_WIND_DIRECTIONS[0]);
                return GameCommand::ChangeWindOriginDir(dir);
            }
            if let Some(card) = card_to_play(engine, config, rng) {
                return GameCommand::PlayBenefitCard(card);
            }
            if engine.controls().i_am_not_allowed_to_move_this_turn {
                return GameCommand::DrawBenefitCard;
            }
            let target = next_waypoint(boat, pos, game.course.as_ref());
            match pick_heading(engine, pos, target, config.epsilon, rng) {
                Some(dir) => GameCommand::ChooseMoveDirection(dir),
                None => GameCommand::DrawBenefitCard,
            }
        }
    }
}

fn card_to_play(engine: &BotEngine, config: &SelfPlayConfig, rng: &mut SmallRng) -> Option<BenefitCard> {
    let boat = engine.my_boat()?;
    let weather_hurts = engine.game().current_weather.is_some_and(|w| w.forbids_moving());
    let card = boat
        .state
        .benefit_cards_drawn
        .iter()
        .copied()
        .find(|&c| c != BenefitCard::UndoWeather || weather_hurts)?;
    let play = (weather_hurts && card == BenefitCard::UndoWeather) || rng.gen_bool(config.card_chance.clamp(0.0, 1.0));
    play.then_some(card)
}

/// A random free cell just behind the start line.
fn pick_start(engine: &BotEngine, rng: &mut SmallRng) -> Option<Position> {
    let course = engine.game().course.as_ref()?;
    let [a, b] = course.start_line;
    let (lo, hi) = (a.x.min(b.x), a.x.max(b.x));
    let base = a.y.min(b.y);
    for depth in 1..=base.max(1) {
        let candidates: Vec<Position> = (lo..=hi)
            .map(|x| Position::new(x, base - depth))
            .filter(|&p| engine.valid_starting_pos(p))
            .collect();
        if let Some(p) = candidates.choose(rng) {
            return Some(*p);
        }
    }
    None
}

/// Where the boat should head next: north of the start line, around each
/// mark clockwise, then back across the line.
fn next_waypoint(boat: &Boat, pos: Position, course: Option<&Course>) -> Position {
    let Some(course) = course else {
        return pos;
    };
    let [a, b] = course.start_line;
    let mid = Position::new((a.x + b.x) / 2, (a.y + b.y) / 2);
    let progress = &boat.state.progress;
    if !progress.has_crossed_start {
        return Position::new(mid.x, mid.y + 1);
    }
    let r = progress.marks_rounded();
    let Some(&mark) = course.marks.get(r) else {
        return Position::new(mid.x, mid.y - 2);
    };
    let fence = progress
        .marks
        .get(r)
        .and_then(|m| m.fences.last())
        .map(|f| f.next_clockwise())
        .unwrap_or(Fence::West);
    let target = corner_after(mark, fence);
    if chebyshev(pos, target) <= 1 {
        return corner_after(mark, fence.next_clockwise());
    }
    target
}

/// The corner a boat reaches just after crossing `fence` clockwise.
fn corner_after(mark: Position, fence: Fence) -> Position {
    let (dx, dy) = match fence {
        Fence::West => (-2, 2),
        Fence::North => (2, 2),
        Fence::East => (2, -2),
        Fence::South => (-2, -2),
    };
    Position::new(mark.x + dx, mark.y + dy)
}

fn chebyshev(a: Position, b: Position) -> i32 {
    (a.x - b.x).abs().max((a.y - b.y).abs())
}

fn distance_sq(a: Position, b: Position) -> i32 {
    (a.x - b.x).pow(2) + (a.y - b.y).pow(2)
}

/// The legal heading that gets closest to `target`, or sometimes a random
/// legal one.
fn pick_heading(
    engine: &BotEngine,
    pos: Position,
    target: Position,
    epsilon: f64,
    rng: &mut SmallRng,
) -> Option<Direction> {
    let legal: Vec<(Direction, u32)> = ALL_DIRECTIONS
        .iter()
        .map(|&d| (d, engine.potential_speed_and_tack(d).speed))
        .filter(|&(_, speed)| speed > 0)
        .collect();
    if legal.is_empty() {
        return None;
    }
    if rng.gen_bool(epsilon.clamp(0.0, 1.0)) {
        return legal.choose(rng).map(|&(d, _)| d);
    }
    legal
        .iter()
        .min_by_key(|&&(d, speed)| distance_sq(pos.steps(d, speed as i32), target))
        .map(|&(d, _)| d)
}

/// Runs self-play generation and collects every completed game.
pub fn run_self_play(config: &SelfPlayConfig) -> Vec<GameResult> {
    let mut games = Vec::with_capacity(config.num_games);
    run_self_play_with_callback(config, |game| {
        games.push(game);
    });
    games
}

/// Runs self-play generation, calling `on_game` with each completed game.
///
/// Games that fail with an engine error are logged and skipped.
pub fn run_self_play_with_callback<F>(config: &SelfPlayConfig, on_game: F)
where
    F: FnMut(GameResult) + Send,
{
    if config.threads > 1 {
        run_self_play_parallel(config, on_game);
    } else {
        run_self_play_sequential(config, on_game);
    }
}

fn game_rng(seed: u64, index: usize) -> SmallRng {
    if seed != 0 {
        SmallRng::seed_from_u64(seed.wrapping_add(index as u64))
    } else {
        SmallRng::from_entropy()
    }
}

fn report_game(config: &SelfPlayConfig, n: usize, game: &GameResult, secs: f64) {
    if config.quiet {
        return;
    }
    let outcome = match game.winner() {
        Some(w) => format!("{} wins", w),
        None => "unfinished".to_string(),
    };
    eprintln!(
        "Game {}/{}: {} after {} actions ({:.2}s)",
        n, config.num_games, outcome, game.actions, secs
    );
}

fn run_self_play_sequential<F>(config: &SelfPlayConfig, mut on_game: F)
where
    F: FnMut(GameResult),
{
    for i in 0..config.num_games {
        let game_start = Instant::now();
        let mut rng = game_rng(config.seed, i);
        match play_game(config, i, &mut rng) {
            Ok(game) => {
                report_game(config, i + 1, &game, game_start.elapsed().as_secs_f64());
                on_game(game);
            }
            Err(e) => log::error!("game {} failed: {}", i, e),
        }
    }
}

/// Plays games concurrently on a rayon pool, handing results back over a
/// channel.
fn run_self_play_parallel<F>(config: &SelfPlayConfig, mut on_game: F)
where
    F: FnMut(GameResult) + Send,
{
    use rayon::prelude::*;
    use std::sync::mpsc;

    let pool = match rayon::ThreadPoolBuilder::new().num_threads(config.threads).build() {
        Ok(pool) => pool,
        Err(e) => {
            log::error!("cannot build thread pool ({}), playing sequentially", e);
            return run_self_play_sequential(config, on_game);
        }
    };

    let completed = AtomicUsize::new(0);
    let (tx, rx) = mpsc::channel::<GameResult>();
    let config_clone = config.clone();
    let handle = std::thread::spawn(move || {
        pool.install(|| {
            (0..config_clone.num_games)
                .into_par_iter()
                .for_each_with(tx, |tx, i| {
                    let game_start = Instant::now();
                    let mut rng = game_rng(config_clone.seed, i);
                    match play_game(&config_clone, i, &mut rng) {
                        Ok(game) => {
                            let n = completed.fetch_add(1, Ordering::Relaxed) + 1;
                            report_game(&config_clone, n, &game, game_start.elapsed().as_secs_f64());
                            let _ = tx.send(game);
                        }
                        Err(e) => log::error!("game {} failed: {}", i, e),
                    }
                });
        });
    });

    for game in rx {
        on_game(game);
    }

    if handle.join().is_err() {
        log::error!("selfplay worker thread panicked");
    }
}

/// Writes game results as JSONL, one game per line.
pub fn write_jsonl<W: Write>(games: &[GameResult], out: &mut W) -> std::io::Result<()> {
    for game in games {
        serde_json::to_writer(&mut *out, game)?;
        writeln!(out)?;
    }
    out.flush()
}

/// Prints aggregate statistics to stderr.
pub fn print_summary(games: &[GameResult]) {
    let total = games.len();
    let finished = games.iter().filter(|g| g.race_over).count();
    let actions: usize = games.iter().map(|g| g.actions).sum();
    let mut wins_by_seat = [0usize; 6];
    for game in games {
        if let Some(w) = game.winner() {
            if let Some(seat) = BOAT_NAMES.iter().position(|&n| n == w) {
                wins_by_seat[seat] += 1;
            }
        }
    }

    eprintln!("=== Self-Play Summary ===");
    eprintln!("Games: {}", total);
    eprintln!("Races finished: {}", finished);
    eprintln!("Avg actions/game: {:.1}", actions as f64 / total.max(1) as f64);
    eprintln!("First across the line:");
    for (seat, name) in BOAT_NAMES.iter().enumerate() {
        if wins_by_seat[seat] > 0 {
            let pct = 100.0 * wins_by_seat[seat] as f64 / total.max(1) as f64;
            eprintln!("  {:>10}: {} ({:.1}%)", name, wins_by_seat[seat], pct);
        }
    }
}
