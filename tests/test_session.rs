//! Integration tests for the shared session state machine.

use arcade_tracker::session::{NameEntry, SessionConfig};
use arcade_tracker::{
    CsvLeaderboard, GameSession, GameState, InputEvent, LeaderboardEntry, LeaderboardStore,
    Outcome, SessionSignal,
};
use std::time::Duration;

fn store_in(dir: &tempfile::TempDir) -> Box<dyn LeaderboardStore> {
    Box::new(CsvLeaderboard::for_game(dir.path(), "test"))
}

fn type_name(session: &mut GameSession, name: &str) -> anyhow::Result<()> {
    for c in name.chars() {
        session.handle_input(&InputEvent::Char(c))?;
    }
    Ok(())
}

#[test]
fn test_calibration_gates_play() {
    let mut session = GameSession::new(
        SessionConfig {
            calibrate: true,
            ..SessionConfig::default()
        },
        None,
    );
    assert_eq!(session.state(), GameState::Calibrate);

    session.advance(Duration::from_secs(5));
    session.add_score(10);
    assert_eq!(session.elapsed(), Duration::ZERO);
    assert_eq!(session.score(), 0);

    assert!(session.begin_play());
    assert_eq!(session.state(), GameState::Playing);
    assert!(!session.begin_play());
}

#[test]
fn test_time_limit_finishes_run() {
    let mut session = GameSession::new(
        SessionConfig {
            time_limit: Some(Duration::from_secs(2)),
            time_up: Outcome::Win,
            ..SessionConfig::default()
        },
        None,
    );

    session.advance(Duration::from_millis(1500));
    assert_eq!(session.state(), GameState::Playing);
    assert_eq!(session.time_left(), Some(Duration::from_millis(500)));

    session.advance(Duration::from_millis(600));
    assert_eq!(session.state(), GameState::Won);
    assert_eq!(session.outcome(), Some(Outcome::Win));
    assert_eq!(session.time_left(), Some(Duration::ZERO));
}

#[test]
fn test_health_reaching_zero_fails_run() {
    let mut session = GameSession::new(
        SessionConfig {
            starting_health: Some(3),
            ..SessionConfig::default()
        },
        None,
    );

    session.damage(2);
    assert_eq!(session.health(), Some(1));
    session.damage(5);

    assert_eq!(session.health(), Some(0));
    assert_eq!(session.state(), GameState::Failed);
    assert_eq!(session.outcome(), Some(Outcome::Fail));
}

#[test]
fn test_qualifying_score_enters_name() -> anyhow::Result<()> {
    let dir = tempfile::TempDir::new()?;
    let mut session = GameSession::new(SessionConfig::default(), Some(store_in(&dir)));
    session.add_score(750);
    session.finish(Outcome::Win);
    assert_eq!(session.state(), GameState::Won);

    session.conclude()?;
    assert_eq!(session.state(), GameState::InputName);

    // Punctuation is ignored, letters upper-cased, a fourth character refused
    type_name(&mut session, "a!bcd")?;
    assert_eq!(session.name().as_str(), "ABC");

    session.handle_input(&InputEvent::Backspace)?;
    session.handle_input(&InputEvent::Confirm)?;
    assert_eq!(session.state(), GameState::InputName);

    type_name(&mut session, "9")?;
    session.handle_input(&InputEvent::Confirm)?;

    assert_eq!(session.state(), GameState::ShowLeaderboard);
    assert_eq!(session.table(), &[LeaderboardEntry::new("AB9", 750)]);
    assert_eq!(store_in(&dir).read_top()?.len(), 1);
    Ok(())
}

#[test]
fn test_non_qualifying_score_skips_to_leaderboard() -> anyhow::Result<()> {
    let dir = tempfile::TempDir::new()?;
    let mut store = store_in(&dir);
    for i in 0..10 {
        store.commit("TOP", 1000 + i)?;
    }

    let mut session = GameSession::new(SessionConfig::default(), Some(store));
    session.add_score(10);
    session.finish(Outcome::Win);
    session.conclude()?;

    assert_eq!(session.state(), GameState::ShowLeaderboard);
    assert_eq!(session.table().len(), 10);
    assert_eq!(session.table()[0].score, 1009);
    Ok(())
}

#[test]
fn test_failures_can_be_kept_off_the_table() -> anyhow::Result<()> {
    let dir = tempfile::TempDir::new()?;
    let mut session = GameSession::new(
        SessionConfig {
            record_failures: false,
            ..SessionConfig::default()
        },
        Some(store_in(&dir)),
    );
    session.add_score(500);
    session.finish(Outcome::Fail);
    session.conclude()?;

    assert_eq!(session.state(), GameState::ShowLeaderboard);
    assert!(session.table().is_empty());
    Ok(())
}

#[test]
fn test_without_store_goes_straight_to_leaderboard() -> anyhow::Result<()> {
    let mut session = GameSession::new(SessionConfig::default(), None);
    session.finish(Outcome::Win);
    session.conclude()?;

    assert_eq!(session.state(), GameState::ShowLeaderboard);
    assert!(session.table().is_empty());
    Ok(())
}

#[test]
fn test_quit_and_restart_signals() -> anyhow::Result<()> {
    let mut session = GameSession::new(
        SessionConfig {
            calibrate: true,
            ..SessionConfig::default()
        },
        None,
    );
    assert_eq!(session.handle_input(&InputEvent::Quit)?, SessionSignal::Quit);
    assert_eq!(session.handle_input(&InputEvent::Restart)?, SessionSignal::Continue);

    session.begin_play();
    session.add_score(40);
    session.finish(Outcome::Win);
    session.conclude()?;
    assert_eq!(session.handle_input(&InputEvent::Confirm)?, SessionSignal::Restart);

    session.restart();
    assert_eq!(session.state(), GameState::Calibrate);
    assert_eq!(session.score(), 0);
    assert_eq!(session.outcome(), None);
    Ok(())
}

#[test]
fn test_name_entry() {
    let mut name = NameEntry::default();
    assert!(name.push('x'));
    assert!(!name.push(' '));
    assert!(name.push('7'));
    assert!(!name.is_complete());
    assert!(name.push('q'));
    assert!(!name.push('z'));

    assert!(name.is_complete());
    assert_eq!(name.as_str(), "X7Q");
}
