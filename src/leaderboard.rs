use anyhow::{ensure, Context, Result};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Number of entries kept per game
pub const LEADERBOARD_CAPACITY: usize = 10;
/// Length of a player's initials
pub const NAME_LENGTH: usize = 3;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LeaderboardEntry {
    pub name: String,
    pub score: i64,
}

impl LeaderboardEntry {
    pub fn new(name: impl Into<String>, score: i64) -> Self {
        Self {
            name: name.into(),
            score,
        }
    }
}

/// The per-game high score table the sessions talk to
pub trait LeaderboardStore {
    /// Would `score` enter the table right now?
    fn qualifies(&self, score: i64) -> Result<bool>;

    /// Insert, re-sort, truncate and persist
    fn commit(&mut self, name: &str, score: i64) -> Result<()>;

    /// Entries sorted by score, highest first
    fn read_top(&self) -> Result<Vec<LeaderboardEntry>>;
}

/// True iff the table has room or `score` beats the last ranked entry
pub fn qualifies_for(table: &[LeaderboardEntry], score: i64) -> bool {
    match table.get(LEADERBOARD_CAPACITY - 1) {
        Some(last) => score > last.score,
        None => true,
    }
}

/// Exactly `NAME_LENGTH` ASCII letters or digits
pub fn is_valid_name(name: &str) -> bool {
    name.chars().count() == NAME_LENGTH && name.chars().all(|c| c.is_ascii_alphanumeric())
}

/// Insert `entry` keeping descending order, capped at the table capacity
pub fn insert_ranked(table: &mut Vec<LeaderboardEntry>, entry: LeaderboardEntry) {
    table.push(entry);
    table.sort_by(|a, b| b.score.cmp(&a.score));
    table.truncate(LEADERBOARD_CAPACITY);
}

/// Parse `name,score` rows, skipping blank and corrupt ones
pub fn parse_rows(contents: &str) -> Vec<LeaderboardEntry> {
    let mut entries = Vec::new();
    for (line_no, line) in contents.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        let parsed = line
            .split_once(',')
            .and_then(|(name, score)| Some((name.trim(), score.trim().parse::<i64>().ok()?)));
        match parsed {
            Some((name, score)) => entries.push(LeaderboardEntry::new(name, score)),
            None => warn!(line = line_no + 1, row = line, "Skipping corrupt leaderboard row"),
        }
    }
    entries.sort_by(|a, b| b.score.cmp(&a.score));
    entries
}

/// Two-column CSV table stored as `<dir>/<namespace>.csv`
#[derive(Debug, Clone)]
pub struct CsvLeaderboard {
    path: PathBuf,
}

impl CsvLeaderboard {
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    /// The table for one game inside a shared scores directory
    pub fn for_game<P: AsRef<Path>>(dir: P, namespace: &str) -> Self {
        Self::new(dir.as_ref().join(format!("{}.csv", namespace)))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn write(&self, table: &[LeaderboardEntry]) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let contents: String = table
            .iter()
            .map(|e| format!("{},{}\n", e.name, e.score))
            .collect();
        std::fs::write(&self.path, contents)
            .with_context(|| format!("Failed to write leaderboard {}", self.path.display()))?;
        Ok(())
    }
}

impl LeaderboardStore for CsvLeaderboard {
    fn qualifies(&self, score: i64) -> Result<bool> {
        Ok(qualifies_for(&self.read_top()?, score))
    }

    fn commit(&mut self, name: &str, score: i64) -> Result<()> {
        ensure!(
            is_valid_name(name),
            "Leaderboard names are {} letters or digits, got {:?}",
            NAME_LENGTH,
            name
        );
        let mut table = self.read_top()?;
        insert_ranked(&mut table, LeaderboardEntry::new(name, score));
        self.write(&table)?;
        info!(name, score, path = %self.path.display(), "Leaderboard updated");
        Ok(())
    }

    fn read_top(&self) -> Result<Vec<LeaderboardEntry>> {
        if !self.path.exists() {
            return Ok(Vec::new());
        }
        let contents = std::fs::read_to_string(&self.path)
            .with_context(|| format!("Failed to read leaderboard {}", self.path.display()))?;
        let mut table = parse_rows(&contents);
        table.truncate(LEADERBOARD_CAPACITY);
        Ok(table)
    }
}
