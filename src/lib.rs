//! Match scoreboard: per-team stat counters, a live table, and shareable
//! summary images, served over HTTP.
//!
//! ```
//! use std::sync::Arc;
//! use matchboard::{compose, render_table, StatCatalog, StatStore, Team};
//!
//! let catalog = Arc::new(StatCatalog::with_groups(&["Goals", "Shots"], &["Fouls"]).unwrap());
//! let mut store = StatStore::new(catalog.clone());
//! store.set_label(Team::A, "Home");
//! store.set_label(Team::B, "Away");
//! store.increment(Team::A, "Goals").unwrap();
//!
//! let snapshot = store.snapshot();
//! assert_eq!(render_table(&catalog, &snapshot).rows.len(), 3);
//! assert_eq!(compose::title_line(&catalog, &snapshot), "Home [1]  x  [0] Away");
//! ```

pub mod compose;
pub mod config;
pub mod error;
pub mod fonts;
pub mod server;
pub mod session;
pub mod stats;
pub mod table;

pub use config::{FontConfig, ScoreboardConfig, SessionLimits, StatCatalog, StatGroup, StatName};
pub use error::{Result, ScoreError};
pub use fonts::{try_load_font, FontFace, Fonts};
pub use session::{EventOutcome, ImageSlots, Session, SessionRegistry, UiEvent};
pub use stats::{MatchSnapshot, StatStore, Team, TeamStats};
pub use table::{render_table, ScoreRow, ScoreTable};
