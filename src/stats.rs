//! Stat store: per-team counters and labels for one scoreboard.
//! Counters exist for exactly the configured stats and only ever go up by one.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use serde::ser::SerializeMap;
use serde::{Deserialize, Serialize, Serializer};

use crate::config::{StatCatalog, StatName};
use crate::error::{Result, ScoreError};

/// Placeholder shown before a team name is typed in.
pub const BLANK_LABEL: &str = " ";

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Team {
    /// Left side
    A,
    /// Right side
    B,
}

impl fmt::Display for Team {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Team::A => write!(f, "team A"),
            Team::B => write!(f, "team B"),
        }
    }
}

/// Counter per configured stat, kept in catalog order.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TeamStats {
    counts: Vec<(StatName, u32)>,
}

impl TeamStats {
    /// All configured stats at zero.
    pub fn zeroed(catalog: &StatCatalog) -> Self {
        Self {
            counts: catalog.all().map(|s| (s.clone(), 0)).collect(),
        }
    }

    /// Builds counters from a name → count map. Missing stats are zero; unknown names fail.
    pub fn from_counts(catalog: &StatCatalog, counts: &HashMap<String, u32>) -> Result<Self> {
        if let Some(unknown) = counts.keys().find(|k| !catalog.contains(k)) {
            return Err(ScoreError::InvalidStat(unknown.clone()));
        }
        Ok(Self {
            counts: catalog
                .all()
                .map(|s| (s.clone(), counts.get(s.as_str()).copied().unwrap_or(0)))
                .collect(),
        })
    }

    /// Count for `stat`, `None` if it is not configured.
    pub fn get(&self, stat: &str) -> Option<u32> {
        self.counts
            .iter()
            .find(|(name, _)| name.as_str() == stat)
            .map(|(_, n)| *n)
    }

    /// Like `get`, reading unconfigured stats as zero.
    pub fn count(&self, stat: &StatName) -> u32 {
        self.get(stat.as_str()).unwrap_or(0)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&StatName, u32)> {
        self.counts.iter().map(|(name, n)| (name, *n))
    }

    fn bump(&mut self, stat: &str) -> Result<u32> {
        let slot = self
            .counts
            .iter_mut()
            .find(|(name, _)| name.as_str() == stat)
            .ok_or_else(|| ScoreError::InvalidStat(stat.to_string()))?;
        slot.1 = slot.1.saturating_add(1);
        Ok(slot.1)
    }

    fn clear(&mut self) {
        for (_, n) in &mut self.counts {
            *n = 0;
        }
    }
}

impl Serialize for TeamStats {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.counts.len()))?;
        for (name, n) in &self.counts {
            map.serialize_entry(name.as_str(), n)?;
        }
        map.end()
    }
}

/// Immutable point-in-time view of both teams.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct MatchSnapshot {
    pub team_a: TeamStats,
    pub team_b: TeamStats,
    pub label_a: String,
    pub label_b: String,
}

impl MatchSnapshot {
    pub fn team(&self, team: Team) -> &TeamStats {
        match team {
            Team::A => &self.team_a,
            Team::B => &self.team_b,
        }
    }

    pub fn label(&self, team: Team) -> &str {
        match team {
            Team::A => &self.label_a,
            Team::B => &self.label_b,
        }
    }
}

/// Single source of truth for one scoreboard's counters and team labels.
#[derive(Clone, Debug)]
pub struct StatStore {
    catalog: Arc<StatCatalog>,
    team_a: TeamStats,
    team_b: TeamStats,
    label_a: String,
    label_b: String,
}

impl StatStore {
    pub fn new(catalog: Arc<StatCatalog>) -> Self {
        Self {
            team_a: TeamStats::zeroed(&catalog),
            team_b: TeamStats::zeroed(&catalog),
            label_a: BLANK_LABEL.to_string(),
            label_b: BLANK_LABEL.to_string(),
            catalog,
        }
    }

    pub fn catalog(&self) -> &StatCatalog {
        &self.catalog
    }

    /// Adds one to `team`'s `stat` counter and returns the updated snapshot.
    ///
    /// Fails with `InvalidStat` (leaving every counter untouched) if `stat` is not configured.
    pub fn increment(&mut self, team: Team, stat: &str) -> Result<MatchSnapshot> {
        let stats = match team {
            Team::A => &mut self.team_a,
            Team::B => &mut self.team_b,
        };
        let value = stats.bump(stat)?;
        tracing::debug!(%team, stat, value, "stat incremented");
        Ok(self.snapshot())
    }

    /// Replaces the team's display name. Blank is allowed.
    pub fn set_label(&mut self, team: Team, text: impl Into<String>) {
        let text = text.into();
        match team {
            Team::A => self.label_a = text,
            Team::B => self.label_b = text,
        }
    }

    /// Zeroes every counter for both teams; labels are kept.
    pub fn reset(&mut self) {
        self.team_a.clear();
        self.team_b.clear();
    }

    pub fn snapshot(&self) -> MatchSnapshot {
        MatchSnapshot {
            team_a: self.team_a.clone(),
            team_b: self.team_b.clone(),
            label_a: self.label_a.clone(),
            label_b: self.label_b.clone(),
        }
    }
}
