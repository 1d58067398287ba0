use std::time::Duration;

use codewalk_core::{
    CapacityError, Direction, EnemyLayout, EnqueueError, LevelLayout, MoveCommands, PatrolPath,
    Position, ScheduledTransition, ScriptError, Snapshot, Tone, Transition,
};
use codewalk_session::{
    GameSession, RunOutcome, RunReport, RunStart, Rules, SessionError, TickObserver, TickReport,
    Timing,
};
use codewalk_system_economy::{EconomyRules, Variant};
use codewalk_system_levels::Catalog;

fn cell(x: u32, y: u32) -> Position {
    Position::from_xy(x, y).expect("cell in grid")
}

fn open_level(level: u32) -> LevelLayout {
    LevelLayout::new(level, cell(9, 9), cell(0, 0)).expect("layout")
}

fn walled_level(level: u32) -> LevelLayout {
    LevelLayout::new(level, cell(5, 6), cell(0, 0))
        .expect("layout")
        .with_walls([cell(5, 5)])
}

fn session(variant: Variant, levels: Vec<LevelLayout>) -> GameSession {
    let rules = Rules::for_variant(variant)
        .with_catalog(Catalog::Custom(levels))
        .with_timing(Timing::instant());
    GameSession::new(rules, 7).expect("session")
}

fn run_to_end(session: &mut GameSession) -> RunReport {
    loop {
        match session.tick() {
            TickReport::Continue { .. } => {}
            TickReport::Finished(report) => return report,
            TickReport::Idle => panic!("tick while idle"),
        }
    }
}

fn execute(
    session: &mut GameSession,
    mut script: impl FnMut(&mut dyn MoveCommands) -> Result<(), ScriptError>,
) -> RunReport {
    let started = session.run_code(&mut script).expect("script runs");
    assert_eq!(started, RunStart::Started);
    run_to_end(session)
}

#[test]
fn corner_to_corner_wins_and_unlocks_next() {
    let mut session = session(Variant::Lives, vec![open_level(1), open_level(2)]);

    let report = execute(&mut session, |commands| {
        commands.move_up(9)?;
        commands.move_left(9)?;
        Ok(())
    });

    assert_eq!(
        report.outcome,
        RunOutcome::Won {
            level: 1,
            next: 2,
            newly_unlocked: true,
        }
    );
    assert_eq!(
        report.transition,
        Some(ScheduledTransition {
            delay: Duration::ZERO,
            transition: Transition::AdvanceTo(2),
        })
    );
    assert_eq!(session.snapshot().player, cell(0, 0));
    assert_eq!(session.unlocked_levels(), &[1, 2]);
    assert_eq!(session.points(), 18);

    assert!(session.perform(report.transition.expect("advance")));
    assert_eq!(session.level(), 2);
    assert_eq!(session.snapshot().player, cell(9, 9));
}

#[test]
fn final_level_completion_schedules_nothing() {
    let mut session = session(Variant::Points, vec![open_level(1)]);
    let report = execute(&mut session, |commands| {
        commands.move_left(9)?;
        commands.move_up(9)?;
        Ok(())
    });

    assert_eq!(report.outcome, RunOutcome::AllLevelsComplete { level: 1 });
    assert_eq!(report.transition, None);
    assert_eq!(session.points(), 10 + 18 + 5);
    assert_eq!(session.unlocked_levels(), &[1]);
}

#[test]
fn wall_penalty_applies_once_and_blocks_the_cell() {
    let mut session = session(Variant::Points, vec![walled_level(1)]);
    let report = execute(&mut session, |commands| Ok(commands.move_up(1)?));

    assert_eq!(report.outcome, RunOutcome::NotArrived);
    assert_eq!(session.points(), 8);
    let snapshot = session.snapshot();
    assert_eq!(snapshot.player, cell(5, 6));
    assert_ne!(snapshot.player, cell(5, 5));
    assert!(!snapshot.running);
}

#[test]
fn points_wall_hits_stop_short_of_game_over() {
    let mut session = session(Variant::Points, vec![walled_level(1)]);

    let mut seen = Vec::new();
    assert_eq!(
        session.run_code(&mut |commands: &mut dyn MoveCommands| -> Result<(), ScriptError> {
            Ok(commands.move_up(3)?)
        }),
        Ok(RunStart::Started)
    );
    let final_report = loop {
        match session.tick() {
            TickReport::Continue { .. } => seen.push(session.points()),
            TickReport::Finished(report) => break report,
            TickReport::Idle => panic!("tick while idle"),
        }
    };

    assert_eq!(seen, vec![8, 6, 4]);
    assert_eq!(final_report.outcome, RunOutcome::NotArrived);
    assert_eq!(final_report.transition, None);
}

#[test]
fn points_exhaustion_resets_the_game() {
    let rules = Rules::points().with_catalog(Catalog::Custom(vec![walled_level(1)]));
    let mut session = GameSession::new(rules, 0).expect("session");
    let report = execute(&mut session, |commands| Ok(commands.move_up(5)?));

    assert_eq!(report.outcome, RunOutcome::GameOver);
    assert_eq!(
        report.transition,
        Some(ScheduledTransition {
            delay: Duration::from_millis(2500),
            transition: Transition::ResetGame,
        })
    );
    assert_eq!(session.points(), 0);
    assert_eq!(session.snapshot().queued, 0);

    assert!(session.perform(report.transition.expect("reset")));
    assert_eq!(session.points(), 10);
    assert_eq!(session.level(), 1);
}

#[test]
fn wall_pause_follows_survivable_strike() {
    let rules = Rules::points().with_catalog(Catalog::Custom(vec![walled_level(1)]));
    let mut session = GameSession::new(rules, 0).expect("session");
    session.commands().move_up(2).expect("enqueue");
    assert_eq!(session.start_run(), RunStart::Started);

    assert_eq!(
        session.tick(),
        TickReport::Continue {
            delay: Duration::from_millis(700)
        }
    );
    let message = session.message().expect("wall message");
    assert_eq!(message.tone, Tone::Failure);
}

#[test]
fn three_lives_lost_reset_progress() {
    let mut session = session(Variant::Lives, vec![open_level(1), walled_level(2)]);
    let won = execute(&mut session, |commands| {
        commands.move_up(9)?;
        commands.move_left(9)?;
        Ok(())
    });
    assert!(session.perform(won.transition.expect("advance")));
    assert_eq!(session.unlocked_levels(), &[1, 2]);

    for lives_left in [2, 1] {
        let report = execute(&mut session, |commands| Ok(commands.move_up(1)?));
        assert_eq!(report.outcome, RunOutcome::LifeLost { lives_left });
        assert_eq!(
            report.transition.map(|scheduled| scheduled.transition),
            Some(Transition::RestartLevel)
        );
        assert!(session.perform(report.transition.expect("restart")));
        assert_eq!(session.level(), 2);
    }

    let report = execute(&mut session, |commands| Ok(commands.move_up(1)?));
    assert_eq!(report.outcome, RunOutcome::GameOver);
    assert_eq!(session.lives(), Some(0));

    assert!(session.perform(report.transition.expect("reset")));
    assert_eq!(session.level(), 1);
    assert_eq!(session.unlocked_levels(), &[1]);
    assert_eq!(session.lives(), Some(3));
    assert_eq!(session.points(), 0);
}

#[test]
fn lost_life_skips_remaining_commands() {
    let mut session = session(Variant::Lives, vec![walled_level(1)]);
    let report = execute(&mut session, |commands| {
        commands.move_up(1)?;
        commands.move_left(4)?;
        Ok(())
    });

    assert_eq!(report.outcome, RunOutcome::LifeLost { lives_left: 2 });
    assert_eq!(session.snapshot().player, cell(5, 6));
    assert_eq!(session.snapshot().queued, 0);
}

#[test]
fn reaching_target_without_keys_does_not_unlock() {
    let keyed = open_level(1)
        .with_keys([cell(0, 5)])
        .with_keys_required(1);
    let mut session = session(Variant::Points, vec![keyed, open_level(2)]);

    let report = execute(&mut session, |commands| {
        commands.move_up(9)?;
        commands.move_left(9)?;
        Ok(())
    });
    assert_eq!(
        report.outcome,
        RunOutcome::KeysMissing {
            collected: 0,
            required: 1,
        }
    );
    assert_eq!(report.transition, None);
    assert_eq!(session.unlocked_levels(), &[1]);
    assert!(!session.set_level(2));
}

#[test]
fn collected_keys_reward_once_and_open_the_target() {
    let keyed = open_level(1)
        .with_keys([cell(9, 5)])
        .with_keys_required(1);
    let mut session = session(Variant::Points, vec![keyed, open_level(2)]);

    let report = execute(&mut session, |commands| {
        commands.move_up(4)?;
        commands.move_down(1)?;
        commands.move_up(6)?;
        commands.move_left(9)?;
        Ok(())
    });

    assert!(matches!(report.outcome, RunOutcome::Won { level: 1, .. }));
    // Three approach steps, one key, one revisit approach and 14 closing steps.
    assert_eq!(session.points(), 10 + 3 + 3 + 15 + 5);
}

#[test]
fn enemy_contact_returns_player_to_start() {
    let sentry = PatrolPath::new(vec![cell(5, 9)]).expect("path");
    let guarded = open_level(1).with_enemy(EnemyLayout::new(sentry, 1, 2).expect("enemy"));
    let mut session = session(Variant::Points, vec![guarded]);

    let report = execute(&mut session, |commands| Ok(commands.move_left(4)?));

    assert_eq!(report.outcome, RunOutcome::NotArrived);
    assert_eq!(session.points(), 10 + 4 - 2);
    assert_eq!(session.snapshot().player, cell(9, 9));
}

#[test]
fn edge_moves_consume_commands_without_moving() {
    let mut session = session(Variant::Points, vec![open_level(1)]);
    let report = execute(&mut session, |commands| Ok(commands.move_right(3)?));

    assert_eq!(report.outcome, RunOutcome::NotArrived);
    assert_eq!(session.snapshot().player, cell(9, 9));
    assert_eq!(session.points(), 10);
}

#[test]
fn script_failure_discards_partial_queue() {
    let mut session = session(Variant::Points, vec![open_level(1)]);

    let mut script = |commands: &mut dyn MoveCommands| -> Result<(), ScriptError> {
        commands.move_up(2)?;
        Err(ScriptError::Failed("boom".to_owned()))
    };
    let result = session.run_code(&mut script);
    assert_eq!(result, Err(ScriptError::Failed("boom".to_owned())));
    assert!(!session.is_running());
    assert_eq!(session.snapshot().queued, 0);
    assert_eq!(session.tick(), TickReport::Idle);
    assert_eq!(
        session.message().map(|message| message.tone),
        Some(Tone::Failure)
    );
}

#[test]
fn capacity_overflow_aborts_the_script() {
    let mut session = session(Variant::Points, vec![open_level(1)]);

    let mut script = |commands: &mut dyn MoveCommands| -> Result<(), ScriptError> {
        commands.move_up(200)?;
        commands.move_left(101)?;
        Ok(())
    };
    let result = session.run_code(&mut script);
    assert_eq!(
        result,
        Err(ScriptError::Enqueue(EnqueueError::Capacity(CapacityError {
            queued: 200,
            requested: 101,
            capacity: 300,
        })))
    );
    assert_eq!(session.snapshot().queued, 0);
    assert_eq!(session.snapshot().player, cell(9, 9));
}

#[test]
fn empty_script_starts_nothing() {
    let mut session = session(Variant::Lives, vec![open_level(1)]);
    let started = session
        .run_code(&mut |_: &mut dyn MoveCommands| -> Result<(), ScriptError> { Ok(()) })
        .expect("script runs");
    assert_eq!(started, RunStart::NothingQueued);
    assert!(!session.is_running());
}

#[test]
fn guards_hold_while_running() {
    let mut session = session(Variant::Points, vec![open_level(1), open_level(2)]);
    session.move_up(3).expect("enqueue");
    assert_eq!(session.start_run(), RunStart::Started);

    assert_eq!(
        session.run_code(&mut |commands: &mut dyn MoveCommands| -> Result<(), ScriptError> {
            Ok(commands.move_left(1)?)
        }),
        Ok(RunStart::AlreadyRunning)
    );
    assert!(!session.perform(ScheduledTransition {
        delay: Duration::ZERO,
        transition: Transition::ResetGame,
    }));
    assert!(!session.set_level(1));
    assert!(!session.force_restart());
    assert_eq!(session.snapshot().queued, 3);
}

#[test]
fn level_selection_respects_unlocks() {
    let mut session = session(Variant::Points, vec![open_level(1), open_level(2)]);
    assert!(!session.set_level(2));
    assert!(!session.set_level(9));
    assert!(session.set_level(1));
    assert_eq!(session.message(), None);
}

#[test]
fn level_selection_lifts_points_to_the_floor() {
    let rules = Rules {
        economy: EconomyRules {
            starting_points: -3,
            ..EconomyRules::points()
        },
        ..Rules::points()
    }
    .with_catalog(Catalog::Custom(vec![open_level(1)]))
    .with_timing(Timing::instant());
    let mut points = GameSession::new(rules, 7).expect("session");
    assert_eq!(points.points(), -3);

    assert!(points.set_level(1));
    assert_eq!(points.points(), 1);
    assert_eq!(points.snapshot().points, 1);

    let mut lives = session(Variant::Lives, vec![open_level(1)]);
    assert!(lives.set_level(1));
    assert_eq!(lives.points(), 0);
}

#[test]
fn forced_restart_is_points_only() {
    let mut lives = session(Variant::Lives, vec![open_level(1)]);
    assert!(!lives.force_restart());

    let mut points = session(Variant::Points, vec![walled_level(1)]);
    let _ = execute(&mut points, |commands| Ok(commands.move_up(2)?));
    assert_eq!(points.points(), 6);
    assert!(points.force_restart());
    assert_eq!(points.points(), 10);
    assert_eq!(
        points.message().map(|message| message.tone),
        Some(Tone::Success)
    );
}

#[test]
fn empty_catalog_is_rejected() {
    let rules = Rules::lives().with_catalog(Catalog::Custom(Vec::new()));
    assert!(GameSession::new(rules, 0).is_err());
}

#[test]
fn misnumbered_custom_catalogs_are_rejected() {
    let gap = Rules::lives().with_catalog(Catalog::Custom(vec![open_level(1), open_level(3)]));
    assert_eq!(
        GameSession::new(gap, 0).err(),
        Some(SessionError::MisnumberedCatalog {
            missing: 2,
            count: 2,
        })
    );

    let twice = vec![open_level(1), open_level(1)];
    let duplicate = Rules::lives().with_catalog(Catalog::Custom(twice));
    assert_eq!(
        GameSession::new(duplicate, 0).err(),
        Some(SessionError::MisnumberedCatalog {
            missing: 2,
            count: 2,
        })
    );

    let shuffled = session(Variant::Lives, vec![open_level(2), open_level(1)]);
    assert_eq!(shuffled.level(), 1);
    assert_eq!(shuffled.level_count(), 2);
}

#[derive(Default)]
struct Recorder {
    frames: Vec<Snapshot>,
    waited: Duration,
}

impl TickObserver for Recorder {
    fn observe(&mut self, snapshot: &Snapshot, delay: Duration) {
        self.frames.push(snapshot.clone());
        self.waited += delay;
    }
}

fn replay(seed: u64) -> (Option<RunReport>, Recorder) {
    let mut session = GameSession::new(Rules::points(), seed).expect("session");
    assert!(session.set_level(1));
    let mut recorder = Recorder::default();
    let mut script = |commands: &mut dyn MoveCommands| -> Result<(), ScriptError> {
        for direction in [Direction::Right, Direction::Up, Direction::Left] {
            commands.enqueue(direction, 3)?;
        }
        Ok(())
    };
    assert_eq!(session.run_code(&mut script), Ok(RunStart::Started));
    let report = session.run(&mut recorder);
    (report, recorder)
}

#[test]
fn identical_runs_replay_identically() {
    let (first_report, first) = replay(42);
    let (second_report, second) = replay(42);

    assert!(first_report.is_some());
    assert_eq!(first_report, second_report);
    assert_eq!(first.frames, second.frames);
    assert_eq!(first.waited, second.waited);
    assert!(first.frames.len() <= 9);
}
