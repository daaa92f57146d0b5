use std::sync::Arc;

use matchboard::compose::{compose_png, from_data_uri, title_line};
use matchboard::session::lock;
use matchboard::{
    render_table, FontConfig, Fonts, ScoreboardConfig, SessionRegistry, StatCatalog, StatGroup, Team, UiEvent,
};

fn increment(team: Team, stat: &str) -> UiEvent {
    UiEvent::Increment {
        team,
        stat: stat.to_string(),
    }
}

fn set_label(team: Team, text: &str) -> UiEvent {
    UiEvent::SetLabel {
        team,
        text: text.to_string(),
    }
}

#[test]
fn home_away_match_through_a_session() {
    let catalog = Arc::new(StatCatalog::with_groups(&["Goals", "Shots"], &["Fouls"]).unwrap());
    let fonts = Fonts::builtin(&FontConfig::default());
    let registry = SessionRegistry::new(catalog.clone());
    let (_, session) = registry.create();
    let mut session = lock(&session);

    for event in [
        set_label(Team::A, "Home"),
        set_label(Team::B, "Away"),
        increment(Team::A, "Goals"),
        increment(Team::A, "Goals"),
        increment(Team::B, "Goals"),
        increment(Team::A, "Fouls"),
    ] {
        assert!(session.apply(event, &fonts).warning.is_none());
    }

    let snap = session.store().snapshot();
    let counts = |t: Team| -> Vec<(String, u32)> {
        snap.team(t).iter().map(|(name, n)| (name.to_string(), n)).collect()
    };
    assert_eq!(
        counts(Team::A),
        [("Goals".to_string(), 2), ("Shots".to_string(), 0), ("Fouls".to_string(), 1)]
    );
    assert_eq!(
        counts(Team::B),
        [("Goals".to_string(), 1), ("Shots".to_string(), 0), ("Fouls".to_string(), 0)]
    );
    assert_eq!(title_line(&catalog, &snap), "Home [2]  x  [1] Away");

    let table = render_table(&catalog, &snap);
    assert_eq!(table.header, ["Home", "Estatística", "Away"]);

    let outcome = session.apply(UiEvent::GenerateImages, &fonts);
    let group1 = from_data_uri(outcome.images.group1.as_deref().unwrap()).unwrap();
    assert_eq!(group1, compose_png(&catalog, &fonts, &snap, StatGroup::Group1).unwrap());
}

#[test]
fn default_config_renders_both_groups_without_font_files() {
    let mut config = ScoreboardConfig::default();
    config.fonts.bold = vec!["missing/bold.ttf".into()];
    config.fonts.regular = vec!["missing/regular.ttf".into()];
    let fonts = Fonts::load(&config.fonts);

    let registry = SessionRegistry::new(Arc::new(config.catalog.clone()));
    let (_, session) = registry.create();
    let mut session = lock(&session);
    session.apply(increment(Team::B, "Cartões"), &fonts);
    let snap = session.store().snapshot();

    for group in StatGroup::ALL {
        let first = compose_png(&config.catalog, &fonts, &snap, group).unwrap();
        let second = compose_png(&config.catalog, &fonts, &snap, group).unwrap();
        assert!(!first.is_empty());
        assert_eq!(first, second);
    }
}
