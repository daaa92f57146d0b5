//! Config module.
//! Manages the scoreboard configuration (stat catalog, headings, fonts).
//! Uses serde for JSON serialization.
//! Falls back to the built-in defaults when no file is given.

use std::collections::HashSet;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::compose::CANVAS_HEIGHT;
use crate::error::{Result, ScoreError};

/// A configured stat label, e.g. "Gols" or "Faltas".
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StatName(String);

impl StatName {
    pub fn new(name: impl Into<String>) -> Self {
        StatName(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for StatName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for StatName {
    fn from(name: &str) -> Self {
        StatName::new(name)
    }
}

/// The two display partitions of the stat set.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StatGroup {
    /// Match events (goals, shots, corners)
    Group1,
    /// Discipline events (fouls, cards, offsides)
    Group2,
}

impl StatGroup {
    pub const ALL: [StatGroup; 2] = [StatGroup::Group1, StatGroup::Group2];

    /// Parses the `1`/`2` path segment used by the image routes.
    pub fn from_number(n: u8) -> Option<Self> {
        match n {
            1 => Some(StatGroup::Group1),
            2 => Some(StatGroup::Group2),
            _ => None,
        }
    }
}

impl fmt::Display for StatGroup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StatGroup::Group1 => write!(f, "group 1"),
            StatGroup::Group2 => write!(f, "group 2"),
        }
    }
}

/// Ordered stat set, split into the two display groups.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct StatCatalog {
    pub group1: Vec<StatName>,
    pub group2: Vec<StatName>,
    /// The stat whose counts go into the image title
    pub goals: StatName,
    /// Middle header cell of the live table
    pub table_heading: String,
    /// Middle header cell of the composed images
    pub image_heading: String,
}

impl Default for StatCatalog {
    fn default() -> Self {
        let names = |list: &[&str]| list.iter().map(|s| StatName::from(*s)).collect();
        Self {
            group1: names(&["Gols", "Finalizações", "Chutes no Gol", "Escanteios"]),
            group2: names(&["Faltas", "Cartões", "Impedimentos"]),
            goals: StatName::from("Gols"),
            table_heading: "Estatística".to_string(),
            image_heading: "ESTATÍSTICAS".to_string(),
        }
    }
}

impl StatCatalog {
    /// Builds a catalog with the given groups; the first stat of group 1 counts as goals.
    pub fn with_groups(group1: &[&str], group2: &[&str]) -> Result<Self> {
        let goals = group1
            .first()
            .map(|s| StatName::from(*s))
            .ok_or_else(|| ScoreError::Config("group 1 must not be empty".into()))?;
        let catalog = Self {
            group1: group1.iter().map(|s| StatName::from(*s)).collect(),
            group2: group2.iter().map(|s| StatName::from(*s)).collect(),
            goals,
            ..Self::default()
        };
        catalog.validate()?;
        Ok(catalog)
    }

    /// Checks the catalog invariants: non-empty groups, unique names, goals stat present.
    pub fn validate(&self) -> Result<()> {
        if self.group1.is_empty() || self.group2.is_empty() {
            return Err(ScoreError::Config("both stat groups need at least one stat".into()));
        }
        let mut seen = HashSet::new();
        for name in self.all() {
            if name.as_str().trim().is_empty() {
                return Err(ScoreError::Config("stat names must not be blank".into()));
            }
            if !seen.insert(name) {
                return Err(ScoreError::Config(format!("duplicate stat {:?}", name.as_str())));
            }
        }
        if !self.contains(self.goals.as_str()) {
            return Err(ScoreError::Config(format!(
                "goals stat {:?} is not in the catalog",
                self.goals.as_str()
            )));
        }
        Ok(())
    }

    pub fn group(&self, group: StatGroup) -> &[StatName] {
        match group {
            StatGroup::Group1 => &self.group1,
            StatGroup::Group2 => &self.group2,
        }
    }

    /// All stats, group 1 first, in display order.
    pub fn all(&self) -> impl Iterator<Item = &StatName> {
        self.group1.iter().chain(self.group2.iter())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.all().any(|s| s.as_str() == name)
    }
}

/// Font files and pixel sizes for the composed images.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FontConfig {
    /// Candidate paths for the bold title face, tried in order
    pub bold: Vec<PathBuf>,
    /// Candidate paths for the regular body face, tried in order
    pub regular: Vec<PathBuf>,
    pub title_size: f32,
    pub body_size: f32,
}

impl Default for FontConfig {
    fn default() -> Self {
        Self {
            bold: vec![
                PathBuf::from("arialbd.ttf"),
                PathBuf::from("/usr/share/fonts/truetype/dejavu/DejaVuSans-Bold.ttf"),
                PathBuf::from("/Library/Fonts/Arial Bold.ttf"),
            ],
            regular: vec![
                PathBuf::from("arial.ttf"),
                PathBuf::from("/usr/share/fonts/truetype/dejavu/DejaVuSans.ttf"),
                PathBuf::from("/Library/Fonts/Arial.ttf"),
            ],
            title_size: 56.0,
            body_size: 30.0,
        }
    }
}

impl FontConfig {
    /// No font files at all; always renders with the built-in face.
    pub fn builtin_only() -> Self {
        Self {
            bold: Vec::new(),
            regular: Vec::new(),
            ..Self::default()
        }
    }

    /// Sizes must be positive and no taller than the image canvas.
    pub fn validate(&self) -> Result<()> {
        let max = CANVAS_HEIGHT as f32;
        for (name, size) in [("title_size", self.title_size), ("body_size", self.body_size)] {
            if !(size > 0.0 && size <= max) {
                return Err(ScoreError::Config(format!("{} must be in (0, {}], got {}", name, max, size)));
            }
        }
        Ok(())
    }
}

/// Bounds on the live session registry.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionLimits {
    /// Sessions untouched for this long are dropped
    pub idle_timeout_secs: u64,
    /// Above this count the least recently used session is dropped
    pub max_sessions: usize,
}

impl Default for SessionLimits {
    fn default() -> Self {
        Self {
            idle_timeout_secs: 2 * 60 * 60,
            max_sessions: 1024,
        }
    }
}

impl SessionLimits {
    pub fn idle_timeout(&self) -> Duration {
        Duration::from_secs(self.idle_timeout_secs)
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoreboardConfig {
    pub catalog: StatCatalog,
    pub fonts: FontConfig,
    pub sessions: SessionLimits,
}

impl ScoreboardConfig {
    pub fn from_json(json: &str) -> Result<Self> {
        let config: ScoreboardConfig =
            serde_json::from_str(json).map_err(|e| ScoreError::Config(e.to_string()))?;
        config.catalog.validate()?;
        config.fonts.validate()?;
        if config.sessions.max_sessions == 0 {
            return Err(ScoreError::Config("max_sessions must be at least 1".into()));
        }
        Ok(config)
    }

    /// Reads a JSON config file, or returns the defaults when `path` is `None`.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let Some(path) = path else {
            return Ok(Self::default());
        };
        let json = fs::read_to_string(path)
            .map_err(|e| ScoreError::Config(format!("failed to read {}: {}", path.display(), e)))?;
        Self::from_json(&json)
    }
}
