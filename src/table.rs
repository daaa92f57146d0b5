//! Live scoreboard table built from a snapshot.

use std::fmt;

use serde::Serialize;

use crate::config::{StatCatalog, StatName};
use crate::stats::MatchSnapshot;

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ScoreRow {
    pub count_a: u32,
    pub stat: StatName,
    pub count_b: u32,
}

/// Header `[label A, heading, label B]` plus one row per stat, group 1 first.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ScoreTable {
    pub header: [String; 3],
    pub rows: Vec<ScoreRow>,
}

/// Lays out every configured stat in catalog order, zero or not.
pub fn render_table(catalog: &StatCatalog, snapshot: &MatchSnapshot) -> ScoreTable {
    let rows = catalog
        .all()
        .map(|stat| ScoreRow {
            count_a: snapshot.team_a.count(stat),
            stat: stat.clone(),
            count_b: snapshot.team_b.count(stat),
        })
        .collect();

    ScoreTable {
        header: [
            snapshot.label_a.clone(),
            catalog.table_heading.clone(),
            snapshot.label_b.clone(),
        ],
        rows,
    }
}

impl fmt::Display for ScoreTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let cells: Vec<[String; 3]> = self
            .rows
            .iter()
            .map(|r| [r.count_a.to_string(), r.stat.to_string(), r.count_b.to_string()])
            .collect();

        let mut widths = [0usize; 3];
        for row in std::iter::once(&self.header).chain(cells.iter()) {
            for (w, cell) in widths.iter_mut().zip(row) {
                *w = (*w).max(cell.chars().count());
            }
        }

        let line = |f: &mut fmt::Formatter<'_>, row: &[String; 3]| {
            writeln!(
                f,
                "{:>wa$} | {:^wm$} | {:<wb$}",
                row[0],
                row[1],
                row[2],
                wa = widths[0],
                wm = widths[1],
                wb = widths[2]
            )
        };

        line(f, &self.header)?;
        writeln!(f, "{}", "-".repeat(widths.iter().sum::<usize>() + 6))?;
        for row in &cells {
            line(f, row)?;
        }
        Ok(())
    }
}
