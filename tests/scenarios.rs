//! Engine scenarios driven through the public API.
//!
//! Most scenarios stage a game record directly in the store so the weather
//! deck and boat positions are known, then open an engine as one of the
//! boats and dispatch commands.

use rand::rngs::SmallRng;
use rand::SeedableRng;
use uuid::Uuid;

use ready_about::board::{
    Boat, BoatColor, BoatId, BoatSettings, Course, Direction, Game, Position, TurnPhase, WindDirection,
};
use ready_about::cards::{BenefitCard, WeatherCard};
use ready_about::engine::{Engine, EngineOptions};
use ready_about::protocol::record::{game_to_record, record_to_game};
use ready_about::resolve::GameCommand;
use ready_about::rules::speed::{PotentialMove, RACE_OVER};
use ready_about::sailing::Tack;
use ready_about::store::{GameStore, IdentityStore, LogEntry, MemoryIdentity, MemoryStore, SharedStore};

const GAME: &str = "race";

fn options(seed: u64) -> EngineOptions {
    EngineOptions {
        seed: Some(seed),
        write_limit: None,
        ..Default::default()
    }
}

/// A started game on the standard course with boats at known ids, the
/// first boat to move, and a deck of calm weather.
fn staged(boats: &[(&str, BoatColor, Position)], wind: Direction) -> (Game, Vec<BoatId>) {
    let mut game = Game::new(GAME, &mut SmallRng::seed_from_u64(3));
    game.course = Some(Course::default());
    game.wind_origin_dir = Some(wind);
    game.started = true;
    let mut ids = Vec::new();
    for (i, (name, color, pos)) in boats.iter().enumerate() {
        let id = Uuid::from_u128(i as u128 + 1);
        let mut boat = Boat::new(id, BoatSettings::new(*name, *color));
        boat.state.pos = Some(*pos);
        game.boats.push(boat);
        game.turn_order.push(id);
        ids.push(id);
    }
    game.id_of_boat_whose_turn_it_is = ids.first().copied();
    game.current_turn_phase = Some(TurnPhase::BeforeWeather);
    game.weather_cards.deck = vec![WeatherCard::NothingHappens; 10];
    (game, ids)
}

/// Stores `game` (document and one log snapshot) unless the store already
/// holds it, and opens an engine playing `me`.
fn open_as<S: GameStore>(mut store: S, game: &Game, me: BoatId) -> Engine<S, MemoryIdentity> {
    if store.load(GAME).unwrap().is_none() {
        let record = game_to_record(game).unwrap();
        store.save(GAME, &record).unwrap();
        store.append_log(LogEntry::now(GAME, record)).unwrap();
    }
    let mut identity = MemoryIdentity::new();
    identity.set_boat_id(GAME, me).unwrap();
    Engine::open(GAME, store, identity, options(me.as_u128() as u64)).unwrap()
}

fn latest(store: &SharedStore) -> serde_json::Value {
    store.load(GAME).unwrap().unwrap()
}

fn pos(x: i32, y: i32) -> Position {
    Position::new(x, y)
}

#[test]
fn fresh_game_setup_and_placement() {
    let store = SharedStore::new();
    let mut ann = Engine::open("g", store.clone(), MemoryIdentity::new(), options(1)).unwrap();
    ann.dispatch_command(GameCommand::ChooseMyBoat(BoatSettings::new("Ann", BoatColor::Red)))
        .unwrap();
    assert!(ann.game().course.is_some());
    assert!(ann.game().wind_origin_dir.is_some());

    let mut bo = Engine::open("g", store.clone(), MemoryIdentity::new(), options(2)).unwrap();
    assert!(bo.controls().i_need_to_choose_my_boat);
    bo.dispatch_command(GameCommand::ChooseMyBoat(BoatSettings::new("Bo", BoatColor::Blue)))
        .unwrap();
    assert!(!bo.i_am_owner());
    ann.resolve_db_change(&store.load("g").unwrap().unwrap()).unwrap();
    assert_eq!(ann.game().boats.len(), 2);

    bo.dispatch_command(GameCommand::StartGame).unwrap();
    assert!(!bo.game().started);

    ann.dispatch_command(GameCommand::StartGame).unwrap();
    assert!(ann.game().started);
    assert!(ann.my_turn());
    assert!(ann.controls().my_turn_to_choose_starting_pos);

    ann.dispatch_command(GameCommand::ChooseBoatStartingPos(pos(10, 4))).unwrap();
    assert!(!ann.my_turn());
    assert!(!ann.controls().my_turn);
    assert_eq!(ann.my_boat().unwrap().state.pos, Some(pos(10, 4)));

    bo.resolve_db_change(&store.load("g").unwrap().unwrap()).unwrap();
    assert!(bo.my_turn());
    assert!(bo.controls().my_turn_to_choose_starting_pos);

    // Taken, then north of the line.
    bo.dispatch_command(GameCommand::ChooseBoatStartingPos(pos(10, 4))).unwrap();
    bo.dispatch_command(GameCommand::ChooseBoatStartingPos(pos(11, 6))).unwrap();
    assert_eq!(bo.my_boat().unwrap().state.pos, None);
    bo.dispatch_command(GameCommand::ChooseBoatStartingPos(pos(11, 4))).unwrap();
    assert_eq!(bo.my_boat().unwrap().state.pos, Some(pos(11, 4)));
    assert!(!bo.controls().my_turn_to_choose_starting_pos);

    ann.resolve_db_change(&store.load("g").unwrap().unwrap()).unwrap();
    assert_eq!(ann.game().weather_cards.revealed.len(), 1);
    assert!(ann.my_boat().unwrap().state.turns_completed >= 1);
}

#[test]
fn end_to_end_broad_reach_north() {
    let (mut game, ids) = staged(
        &[
            ("Ann", BoatColor::Red, pos(10, 10)),
            ("Bo", BoatColor::Blue, pos(20, 20)),
        ],
        Direction::SE,
    );
    game.current_turn_phase = Some(TurnPhase::BeforeMove);
    let engine = open_as(MemoryStore::new(), &game, ids[0]);
    assert_eq!(
        engine.potential_speed_and_tack(Direction::N),
        PotentialMove {
            speed: 2,
            tack: Some(Tack::Starboard),
            reason: String::new(),
        }
    );
}

#[test]
fn solo_turn_loop() {
    let (game, ids) = staged(&[("Ann", BoatColor::Red, pos(10, 2))], Direction::SE);
    let mut engine = open_as(MemoryStore::new(), &game, ids[0]);

    engine.dispatch_command(GameCommand::BeginTurnCycle).unwrap();
    assert_eq!(engine.game().current_turn_phase, Some(TurnPhase::BeforeMove));
    assert_eq!(engine.game().current_weather, Some(WeatherCard::NothingHappens));
    assert!(engine.controls().my_turn);

    engine.dispatch_command(GameCommand::ChooseMoveDirection(Direction::N)).unwrap();
    let boat = engine.my_boat().unwrap();
    assert_eq!(boat.state.pos, Some(pos(10, 3)));
    assert_eq!(boat.state.speed, 1);
    assert_eq!(boat.state.tack, Some(Tack::Starboard));
    assert_eq!(engine.game().current_turn_phase, Some(TurnPhase::Moving));

    // Direction is locked mid-move.
    engine.dispatch_command(GameCommand::ChooseMoveDirection(Direction::E)).unwrap();
    assert_eq!(engine.my_boat().unwrap().state.pos, Some(pos(10, 3)));

    engine.dispatch_command(GameCommand::ChooseMoveDirection(Direction::N)).unwrap();
    let boat = engine.my_boat().unwrap();
    assert_eq!(boat.state.pos, Some(pos(10, 4)));
    assert_eq!(boat.state.turns_completed, 1);
    assert_eq!(boat.state.speed, 0);
    assert!(!boat.state.has_moved_this_turn);
    assert!(engine.my_turn());
    assert_eq!(engine.game().weather_cards.revealed.len(), 2);
    assert_eq!(engine.game().current_turn_phase, Some(TurnPhase::BeforeMove));
}

#[test]
fn early_start_is_refused() {
    let (mut game, ids) = staged(&[("Ann", BoatColor::Red, pos(10, 4))], Direction::SE);
    game.current_turn_phase = Some(TurnPhase::BeforeMove);
    let mut engine = open_as(MemoryStore::new(), &game, ids[0]);
    let potential = engine.potential_speed_and_tack(Direction::N);
    assert_eq!(potential.speed, 0);
    assert!(potential.reason.contains("starting line"));
    engine.dispatch_command(GameCommand::ChooseMoveDirection(Direction::N)).unwrap();
    assert_eq!(engine.my_boat().unwrap().state.pos, Some(pos(10, 4)));
}

#[test]
fn three_boat_race_ends_when_two_finish() {
    let (mut game, ids) = staged(
        &[
            ("Ann", BoatColor::Red, pos(10, 4)),
            ("Bo", BoatColor::Blue, pos(12, 4)),
            ("Cy", BoatColor::Green, pos(14, 4)),
        ],
        Direction::SE,
    );
    game.current_turn_phase = Some(TurnPhase::BeforeMove);
    for id in &ids[..2] {
        game.boat_mut(*id).unwrap().state.progress.has_crossed_finish = true;
    }
    let mut engine = open_as(MemoryStore::new(), &game, ids[0]);
    assert!(engine.game().finished_at.is_none());

    engine.dispatch_command(GameCommand::EndTurnAndCycle).unwrap();
    assert!(engine.game().finished_at.is_some());
    assert_eq!(engine.potential_speed_and_tack(Direction::E).reason, RACE_OVER);

    let before = engine.game().clone();
    engine.dispatch_command(GameCommand::ChooseMoveDirection(Direction::E)).unwrap();
    engine.dispatch_command(GameCommand::DrawBenefitCard).unwrap();
    assert_eq!(*engine.game(), before);
}

#[test]
fn one_finisher_does_not_end_a_three_boat_race() {
    let (mut game, ids) = staged(
        &[
            ("Ann", BoatColor::Red, pos(10, 4)),
            ("Bo", BoatColor::Blue, pos(12, 4)),
            ("Cy", BoatColor::Green, pos(14, 4)),
        ],
        Direction::SE,
    );
    game.current_turn_phase = Some(TurnPhase::BeforeMove);
    game.boat_mut(ids[0]).unwrap().state.progress.has_crossed_finish = true;
    let mut engine = open_as(MemoryStore::new(), &game, ids[0]);
    engine.dispatch_command(GameCommand::EndTurnAndCycle).unwrap();
    assert!(engine.game().finished_at.is_none());
    assert_eq!(engine.game().id_of_boat_whose_turn_it_is, Some(ids[1]));
}

#[test]
fn collision_bumps_the_loser_downwind() {
    let (mut game, ids) = staged(
        &[
            ("Ann", BoatColor::Red, pos(10, 10)),
            ("Bo", BoatColor::Blue, pos(11, 10)),
        ],
        Direction::N,
    );
    game.boat_mut(ids[0]).unwrap().state.tack = Some(Tack::Port);
    game.id_of_boat_whose_turn_it_is = Some(ids[1]);
    game.current_turn_phase = Some(TurnPhase::BeforeMove);

    let store = SharedStore::new();
    let mut bo = open_as(store.clone(), &game, ids[1]);
    let mut ann = open_as(store.clone(), &game, ids[0]);

    // Bo on starboard may sail into port-tack Ann's cell.
    let potential = bo.potential_speed_and_tack(Direction::W);
    assert_eq!(potential.speed, 2);
    assert_eq!(potential.tack, Some(Tack::Starboard));
    bo.dispatch_command(GameCommand::ChooseMoveDirection(Direction::W)).unwrap();
    assert_eq!(bo.my_boat().unwrap().state.pos, Some(pos(10, 10)));

    ann.resolve_db_change(&latest(&store)).unwrap();
    assert_eq!(ann.my_boat().unwrap().state.pos, Some(pos(10, 9)));
    assert_eq!(ann.game().id_of_boat_whose_turn_it_is, Some(ids[1]));

    bo.resolve_db_change(&latest(&store)).unwrap();
    assert_eq!(bo.game().boat(ids[0]).unwrap().state.pos, Some(pos(10, 9)));
}

/// Bo on starboard spends its last point of speed sailing into port-tack
/// Ann, which ends Bo's turn in the same cascade.
fn final_step_collision(boats: &[(&str, BoatColor, Position)]) {
    let (mut game, ids) = staged(boats, Direction::N);
    game.boat_mut(ids[0]).unwrap().state.tack = Some(Tack::Port);
    game.id_of_boat_whose_turn_it_is = Some(ids[1]);
    game.current_turn_phase = Some(TurnPhase::BeforeMove);

    let store = SharedStore::new();
    let mut bo = open_as(store.clone(), &game, ids[1]);
    let mut ann = open_as(store.clone(), &game, ids[0]);

    assert_eq!(bo.potential_speed_and_tack(Direction::W).speed, 2);
    bo.dispatch_command(GameCommand::ChooseMoveDirection(Direction::W)).unwrap();
    bo.dispatch_command(GameCommand::ChooseMoveDirection(Direction::W)).unwrap();
    let after_move = latest(&store);
    let shared = record_to_game(&after_move).unwrap();
    assert_eq!(shared.boat(ids[1]).unwrap().state.pos, Some(pos(10, 10)));
    assert_ne!(shared.id_of_boat_whose_turn_it_is, Some(ids[1]));

    ann.resolve_db_change(&after_move).unwrap();
    assert_eq!(ann.my_boat().unwrap().state.pos, Some(pos(10, 9)));
    assert_eq!(ann.game().boat(ids[1]).unwrap().state.pos, Some(pos(10, 10)));

    bo.resolve_db_change(&latest(&store)).unwrap();
    assert_eq!(bo.game().boat(ids[0]).unwrap().state.pos, Some(pos(10, 9)));
    assert_eq!(bo.my_boat().unwrap().state.pos, Some(pos(10, 10)));
}

#[test]
fn collision_on_the_last_step_bumps_the_next_boat_to_sail() {
    final_step_collision(&[
        ("Ann", BoatColor::Red, pos(10, 10)),
        ("Bo", BoatColor::Blue, pos(12, 10)),
    ]);
}

#[test]
fn collision_on_the_last_step_bumps_a_boat_waiting_its_turn() {
    final_step_collision(&[
        ("Ann", BoatColor::Red, pos(10, 10)),
        ("Bo", BoatColor::Blue, pos(12, 10)),
        ("Cy", BoatColor::Green, pos(20, 2)),
    ]);
}

#[test]
fn port_tack_mover_cannot_enter_a_starboard_boat() {
    let (mut game, ids) = staged(
        &[
            ("Ann", BoatColor::Red, pos(10, 10)),
            ("Bo", BoatColor::Blue, pos(9, 10)),
        ],
        Direction::N,
    );
    game.boat_mut(ids[0]).unwrap().state.tack = Some(Tack::Starboard);
    game.id_of_boat_whose_turn_it_is = Some(ids[1]);
    game.current_turn_phase = Some(TurnPhase::BeforeMove);
    let engine = open_as(MemoryStore::new(), &game, ids[1]);
    let potential = engine.potential_speed_and_tack(Direction::E);
    assert_eq!(potential.speed, 0);
    assert_eq!(potential.reason, "Ann has right of way (starboard tack)");
}

#[test]
fn mid_move_obstacle_forfeits_remaining_speed() {
    let (mut game, ids) = staged(
        &[
            ("Ann", BoatColor::Red, pos(10, 10)),
            ("Bo", BoatColor::Blue, pos(20, 2)),
        ],
        Direction::SE,
    );
    game.course = Some(Course::new([pos(5, 5), pos(15, 5)], vec![pos(10, 12)]).unwrap());
    game.current_turn_phase = Some(TurnPhase::BeforeMove);
    let mut engine = open_as(MemoryStore::new(), &game, ids[0]);
    assert_eq!(engine.potential_speed_and_tack(Direction::N).speed, 2);

    engine.dispatch_command(GameCommand::ChooseMoveDirection(Direction::N)).unwrap();
    assert_eq!(engine.my_boat().unwrap().state.speed, 1);
    engine.dispatch_command(GameCommand::ChooseMoveDirection(Direction::N)).unwrap();
    let boat = engine.my_boat().unwrap();
    assert_eq!(boat.state.pos, Some(pos(10, 11)));
    assert_eq!(boat.state.speed, 0);
    assert_eq!(engine.game().id_of_boat_whose_turn_it_is, Some(ids[1]));
}

#[test]
fn turn_over_weather_passes_the_turn() {
    let (mut game, ids) = staged(
        &[
            ("Ann", BoatColor::Red, pos(10, 4)),
            ("Bo", BoatColor::Blue, pos(12, 4)),
        ],
        Direction::SE,
    );
    game.weather_cards.deck = vec![WeatherCard::TurnOver];
    let mut engine = open_as(MemoryStore::new(), &game, ids[0]);
    engine.dispatch_command(GameCommand::BeginTurnCycle).unwrap();
    assert_eq!(engine.game().id_of_boat_whose_turn_it_is, Some(ids[1]));
    assert_eq!(engine.my_boat().unwrap().state.turns_completed, 1);
    assert_eq!(engine.game().current_weather, None);
}

#[test]
fn no_move_weather_leaves_drawing() {
    let (mut game, ids) = staged(
        &[
            ("Ann", BoatColor::Red, pos(10, 4)),
            ("Bo", BoatColor::Blue, pos(12, 4)),
        ],
        Direction::SE,
    );
    game.weather_cards.deck = vec![WeatherCard::NoMoveAllowed];
    let mut engine = open_as(MemoryStore::new(), &game, ids[0]);
    engine.dispatch_command(GameCommand::BeginTurnCycle).unwrap();
    assert!(engine.controls().i_am_not_allowed_to_move_this_turn);
    let potential = engine.potential_speed_and_tack(Direction::E);
    assert_eq!(potential.speed, 0);
    assert!(potential.reason.contains("NO_MOVE_ALLOWED"));

    engine.dispatch_command(GameCommand::ChooseMoveDirection(Direction::E)).unwrap();
    assert_eq!(engine.my_boat().unwrap().state.pos, Some(pos(10, 4)));

    engine.dispatch_command(GameCommand::DrawBenefitCard).unwrap();
    let boat = engine.my_boat().unwrap();
    assert_eq!(boat.state.benefit_cards_drawn.len(), 1);
    assert_eq!(boat.state.turns_completed, 1);
    assert_eq!(engine.game().id_of_boat_whose_turn_it_is, Some(ids[1]));
    assert!(!engine.controls().i_am_not_allowed_to_move_this_turn);
}

#[test]
fn blown_downwind_on_reveal() {
    let (mut game, ids) = staged(&[("Ann", BoatColor::Red, pos(10, 2))], Direction::SE);
    game.weather_cards.deck = vec![WeatherCard::GetBlownDownwind];
    let mut engine = open_as(MemoryStore::new(), &game, ids[0]);
    engine.dispatch_command(GameCommand::BeginTurnCycle).unwrap();
    assert_eq!(engine.my_boat().unwrap().state.pos, Some(pos(9, 3)));
}

#[test]
fn undo_weather_restores_position() {
    let (mut game, ids) = staged(&[("Ann", BoatColor::Red, pos(10, 2))], Direction::SE);
    game.weather_cards.deck = vec![WeatherCard::GetBlownDownwind];
    game.boat_mut(ids[0]).unwrap().state.benefit_cards_drawn = vec![BenefitCard::UndoWeather];
    let mut engine = open_as(MemoryStore::new(), &game, ids[0]);
    engine.dispatch_command(GameCommand::BeginTurnCycle).unwrap();
    assert_eq!(engine.my_boat().unwrap().state.pos, Some(pos(9, 3)));

    engine.dispatch_command(GameCommand::PlayBenefitCard(BenefitCard::UndoWeather)).unwrap();
    let boat = engine.my_boat().unwrap();
    assert_eq!(boat.state.pos, Some(pos(10, 2)));
    assert!(boat.state.benefit_cards_drawn.is_empty());
    assert_eq!(boat.state.benefit_cards_active, vec![BenefitCard::UndoWeather]);
    assert_eq!(engine.game().current_weather, None);
}

#[test]
fn undo_weather_restores_wind() {
    let (mut game, ids) = staged(&[("Ann", BoatColor::Red, pos(10, 2))], Direction::SE);
    game.weather_cards.deck = vec![WeatherCard::WindDirChanges(WindDirection::NW)];
    game.boat_mut(ids[0]).unwrap().state.benefit_cards_drawn = vec![BenefitCard::UndoWeather];
    let mut engine = open_as(MemoryStore::new(), &game, ids[0]);
    engine.dispatch_command(GameCommand::BeginTurnCycle).unwrap();
    assert_eq!(engine.game().wind_origin_dir, Some(Direction::NW));

    engine.dispatch_command(GameCommand::PlayBenefitCard(BenefitCard::UndoWeather)).unwrap();
    assert_eq!(engine.game().wind_origin_dir, Some(Direction::SE));
}

#[test]
fn speed_boost_then_expiry() {
    let (mut game, ids) = staged(
        &[
            ("Ann", BoatColor::Red, pos(10, 10)),
            ("Bo", BoatColor::Blue, pos(20, 2)),
        ],
        Direction::SE,
    );
    game.current_turn_phase = Some(TurnPhase::BeforeMove);
    game.boat_mut(ids[0]).unwrap().state.benefit_cards_drawn = vec![BenefitCard::SpeedBoost];
    let mut engine = open_as(MemoryStore::new(), &game, ids[0]);
    assert_eq!(engine.potential_speed_and_tack(Direction::N).speed, 2);

    // Not in hand, so nothing happens.
    engine.dispatch_command(GameCommand::PlayBenefitCard(BenefitCard::Spinnaker)).unwrap();
    assert!(engine.my_boat().unwrap().state.benefit_cards_active.is_empty());

    engine.dispatch_command(GameCommand::PlayBenefitCard(BenefitCard::SpeedBoost)).unwrap();
    assert_eq!(engine.potential_speed_and_tack(Direction::N).speed, 3);

    engine.dispatch_command(GameCommand::EndTurnAndCycle).unwrap();
    let boat = engine.my_boat().unwrap();
    assert!(boat.state.benefit_cards_active.is_empty());
    assert_eq!(engine.game().benefit_cards.discarded, vec![BenefitCard::SpeedBoost]);
}

#[test]
fn wind_choice_card_waits_for_the_player() {
    let (mut game, ids) = staged(
        &[
            ("Ann", BoatColor::Red, pos(10, 10)),
            ("Bo", BoatColor::Blue, pos(20, 2)),
        ],
        Direction::SE,
    );
    game.current_turn_phase = Some(TurnPhase::BeforeMove);
    game.boat_mut(ids[0]).unwrap().state.benefit_cards_drawn = vec![BenefitCard::ChooseWindOriginDir];
    let mut engine = open_as(MemoryStore::new(), &game, ids[0]);
    engine.dispatch_command(GameCommand::PlayBenefitCard(BenefitCard::ChooseWindOriginDir)).unwrap();
    assert!(engine.controls().i_need_to_choose_wind_origin_dir);
    assert_eq!(engine.game().wind_origin_dir, Some(Direction::SE));

    engine.dispatch_command(GameCommand::ChangeWindOriginDir(WindDirection::SW)).unwrap();
    assert!(!engine.controls().i_need_to_choose_wind_origin_dir);
    assert_eq!(engine.game().wind_origin_dir, Some(Direction::SW));
}

#[test]
fn wind_shifts_only_when_called_for() {
    let (mut game, ids) = staged(
        &[
            ("Ann", BoatColor::Red, pos(10, 10)),
            ("Bo", BoatColor::Blue, pos(20, 2)),
        ],
        Direction::SE,
    );
    game.current_turn_phase = Some(TurnPhase::BeforeMove);
    game.current_weather = Some(WeatherCard::NothingHappens);
    let store = SharedStore::new();
    let mut ann = open_as(store.clone(), &game, ids[0]);
    let mut bo = open_as(store.clone(), &game, ids[1]);

    // Not Bo's turn.
    bo.dispatch_command(GameCommand::ChangeWindOriginDir(WindDirection::NW)).unwrap();
    assert_eq!(bo.game().wind_origin_dir, Some(Direction::SE));

    // Ann's turn, but neither weather nor a card asks for a new wind.
    ann.dispatch_command(GameCommand::ChangeWindOriginDir(WindDirection::NW)).unwrap();
    assert_eq!(ann.game().wind_origin_dir, Some(Direction::SE));
    assert_eq!(record_to_game(&latest(&store)).unwrap().wind_origin_dir, Some(Direction::SE));
}

#[test]
fn wind_change_weather_shifts_the_wind() {
    let (mut game, ids) = staged(&[("Ann", BoatColor::Red, pos(10, 10))], Direction::SE);
    game.weather_cards.deck = vec![WeatherCard::WindDirChanges(WindDirection::SW)];
    let mut engine = open_as(MemoryStore::new(), &game, ids[0]);
    engine.dispatch_command(GameCommand::BeginTurnByRevealingWeatherCard).unwrap();
    assert_eq!(engine.game().wind_origin_dir, Some(Direction::SW));

    // The revealed card names one direction only.
    engine.dispatch_command(GameCommand::ChangeWindOriginDir(WindDirection::NE)).unwrap();
    assert_eq!(engine.game().wind_origin_dir, Some(Direction::SW));
}

#[test]
fn illegal_commands_are_ignored() {
    let (mut game, ids) = staged(
        &[
            ("Ann", BoatColor::Red, pos(10, 4)),
            ("Bo", BoatColor::Blue, pos(12, 4)),
        ],
        Direction::SE,
    );
    game.current_turn_phase = Some(TurnPhase::BeforeMove);
    let store = SharedStore::new();
    let mut bo = open_as(store.clone(), &game, ids[1]);
    let before = bo.game().clone();

    bo.dispatch_command(GameCommand::ChooseMoveDirection(Direction::E)).unwrap();
    bo.dispatch_command(GameCommand::DrawBenefitCard).unwrap();
    bo.dispatch_command(GameCommand::EndTurnAndCycle).unwrap();
    bo.dispatch_command(GameCommand::BeginTurnByRevealingWeatherCard).unwrap();
    bo.dispatch_command(GameCommand::ChooseMyBoat(BoatSettings::new("Bo2", BoatColor::Pink)))
        .unwrap();
    assert_eq!(*bo.game(), before);

    let mut late = Engine::open(GAME, store.clone(), MemoryIdentity::new(), options(9)).unwrap();
    late.dispatch_command(GameCommand::ChooseMyBoat(BoatSettings::new("Cy", BoatColor::Red)))
        .unwrap();
    assert_eq!(late.game().boats.len(), 2);
    assert!(late.my_boat_id().is_none());
    late.dispatch_command(GameCommand::ChooseMyBoat(BoatSettings::new("Cy", BoatColor::Green)))
        .unwrap();
    assert_eq!(late.game().boats.len(), 3);
    assert_eq!(late.game().turn_order.len(), 3);
}

#[test]
fn replay_walks_every_snapshot() {
    let (game, ids) = staged(&[("Ann", BoatColor::Red, pos(10, 2))], Direction::SE);
    let mut engine = open_as(MemoryStore::new(), &game, ids[0]);
    engine.dispatch_command(GameCommand::BeginTurnCycle).unwrap();
    let snapshots = engine.replay().unwrap();
    assert_eq!(snapshots.len(), 2);
    assert_eq!(snapshots[0].current_weather, None);
    assert_eq!(snapshots[1].current_weather, Some(WeatherCard::NothingHappens));
    let newest = engine.history(1).unwrap();
    assert_eq!(newest[0], snapshots[1]);
}
