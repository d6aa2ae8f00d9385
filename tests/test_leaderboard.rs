//! Integration tests for the CSV leaderboard store.
//!
//! Tests cover:
//! - Ordering and capacity after any sequence of commits
//! - The qualification query
//! - Eviction of the lowest entry
//! - Skipping corrupt rows

use arcade_tracker::leaderboard::{qualifies_for, LEADERBOARD_CAPACITY};
use arcade_tracker::{CsvLeaderboard, LeaderboardEntry, LeaderboardStore};

fn full_table(store: &mut CsvLeaderboard) -> anyhow::Result<()> {
    // Ten entries, lowest 500
    for (i, score) in (500..1500).step_by(100).enumerate() {
        store.commit(&format!("P{:02}", i), score)?;
    }
    Ok(())
}

fn assert_sorted(table: &[LeaderboardEntry]) {
    assert!(table.windows(2).all(|w| w[0].score >= w[1].score));
}

#[test]
fn test_missing_file_reads_empty() -> anyhow::Result<()> {
    let dir = tempfile::TempDir::new()?;
    let store = CsvLeaderboard::for_game(dir.path(), "solder_trace");

    assert_eq!(store.path(), dir.path().join("solder_trace.csv"));
    assert!(store.read_top()?.is_empty());
    assert!(store.qualifies(0)?);
    Ok(())
}

#[test]
fn test_commits_stay_sorted_and_capped() -> anyhow::Result<()> {
    let dir = tempfile::TempDir::new()?;
    let mut store = CsvLeaderboard::for_game(dir.path(), "robo_factory");

    for (i, score) in [300, 100, 900, 50, 700, 700, 20, 1000, 450, 600, 800, 10]
        .into_iter()
        .enumerate()
    {
        store.commit(&format!("A{:02}", i), score)?;
        let table = store.read_top()?;
        assert_sorted(&table);
        assert!(table.len() <= LEADERBOARD_CAPACITY);
    }

    let table = store.read_top()?;
    assert_eq!(table.len(), 10);
    assert_eq!(table[0].score, 1000);
    assert_eq!(table[9].score, 50);
    Ok(())
}

#[test]
fn test_full_table_scenario() -> anyhow::Result<()> {
    let dir = tempfile::TempDir::new()?;
    let mut store = CsvLeaderboard::for_game(dir.path(), "solder_trace");
    full_table(&mut store)?;
    assert_eq!(store.read_top()?.len(), 10);

    assert!(!store.qualifies(450)?);
    assert!(!store.qualifies(500)?);
    assert!(store.qualifies(550)?);

    store.commit("AAA", 550)?;

    let table = store.read_top()?;
    assert_eq!(table.len(), 10);
    assert!(table[0].score >= 550);
    assert!(table.iter().all(|e| e.score != 500));
    assert!(table.contains(&LeaderboardEntry::new("AAA", 550)));
    Ok(())
}

#[test]
fn test_commit_rejects_malformed_names() -> anyhow::Result<()> {
    let dir = tempfile::TempDir::new()?;
    let mut store = CsvLeaderboard::for_game(dir.path(), "solder_trace");

    for name in ["A,B", "AB\n", "ABCD", "AB", ""] {
        assert!(store.commit(name, 100).is_err(), "{:?} was accepted", name);
    }
    assert!(!store.path().exists());

    store.commit("A1B", 100)?;
    assert_eq!(store.read_top()?, vec![LeaderboardEntry::new("A1B", 100)]);
    Ok(())
}

#[test]
fn test_table_persists_as_name_score_rows() -> anyhow::Result<()> {
    let dir = tempfile::TempDir::new()?;
    let mut store = CsvLeaderboard::for_game(dir.path(), "wire_connect");
    store.commit("BOB", 20)?;
    store.commit("ALI", 40)?;

    let contents = std::fs::read_to_string(store.path())?;
    assert_eq!(contents, "ALI,40\nBOB,20\n");

    let reopened = CsvLeaderboard::new(store.path());
    assert_eq!(
        reopened.read_top()?,
        vec![LeaderboardEntry::new("ALI", 40), LeaderboardEntry::new("BOB", 20)]
    );
    Ok(())
}

#[test]
fn test_corrupt_rows_are_skipped() -> anyhow::Result<()> {
    let dir = tempfile::TempDir::new()?;
    let path = dir.path().join("scores.csv");
    std::fs::write(&path, "AAA,100\nBBB,notanumber\n\nCCC,300\nbroken\nDDD,12.5\n")?;

    let table = CsvLeaderboard::new(&path).read_top()?;

    assert_eq!(
        table,
        vec![LeaderboardEntry::new("CCC", 300), LeaderboardEntry::new("AAA", 100)]
    );
    Ok(())
}

#[test]
fn test_unordered_file_is_sorted_on_read() -> anyhow::Result<()> {
    let dir = tempfile::TempDir::new()?;
    let path = dir.path().join("scores.csv");
    let rows: String = (1..=12).map(|i| format!("P{:02},{}\n", i, i * 10)).collect();
    std::fs::write(&path, rows)?;

    let table = CsvLeaderboard::new(&path).read_top()?;

    assert_eq!(table.len(), 10);
    assert_eq!(table[0].score, 120);
    assert_eq!(table[9].score, 30);
    Ok(())
}

#[test]
fn test_qualification_rule() {
    let short: Vec<LeaderboardEntry> = (0..9).map(|i| LeaderboardEntry::new("X", 1000 - i)).collect();
    assert!(qualifies_for(&short, -5));

    let full: Vec<LeaderboardEntry> = (0..10).map(|i| LeaderboardEntry::new("X", 1000 - i)).collect();
    assert!(!qualifies_for(&full, 991));
    assert!(qualifies_for(&full, 992));
}
