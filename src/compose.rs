//! Image composer.
//! Draws one stat group of a snapshot onto a fixed 800x400 canvas: a centered
//! "A [goals] x [goals] B" title, a three-column header, and one row per stat.
//! Output is PNG bytes or a `data:image/png;base64,` URI for embedding in the page.
//! Every call redraws from scratch; identical inputs give identical bytes.

use std::io::Cursor;

use base64::{engine::general_purpose, Engine as _};
use image::{DynamicImage, ImageFormat, Rgb, RgbImage};

use crate::config::{StatCatalog, StatGroup};
use crate::error::Result;
use crate::fonts::{FontFace, Fonts};
use crate::stats::MatchSnapshot;

pub const CANVAS_WIDTH: u32 = 800;
pub const CANVAS_HEIGHT: u32 = 400;

const BACKGROUND: Rgb<u8> = Rgb([10, 15, 20]);
const TEXT: Rgb<u8> = Rgb([255, 255, 255]);

const TITLE_TOP: i32 = 24;
const HEADER_TOP: i32 = 110;
const FIRST_ROW_CENTER: i32 = 190;
const LINE_HEIGHT: i32 = 48;
/// Horizontal centers of the left, middle and right columns
const COLUMNS: [i32; 3] = [150, 400, 650];

const DATA_URI_PREFIX: &str = "data:image/png;base64,";

// *************** Public API ***************

/// `"{A} [{goals A}]  x  [{goals B}] {B}"`, with goals taken from the catalog's goals stat.
pub fn title_line(catalog: &StatCatalog, snapshot: &MatchSnapshot) -> String {
    format!(
        "{} [{}]  x  [{}] {}",
        snapshot.label_a,
        snapshot.team_a.count(&catalog.goals),
        snapshot.team_b.count(&catalog.goals),
        snapshot.label_b
    )
}

/// Draws the summary image for `group`.
pub fn compose(catalog: &StatCatalog, fonts: &Fonts, snapshot: &MatchSnapshot, group: StatGroup) -> RgbImage {
    let mut canvas = RgbImage::from_pixel(CANVAS_WIDTH, CANVAS_HEIGHT, BACKGROUND);

    let title = title_line(catalog, snapshot);
    let (title_w, _) = fonts.title.measure(fonts.title_size, &title);
    let title_x = (CANVAS_WIDTH as i32 / 2).saturating_sub(half(title_w));
    fonts.title.draw(&mut canvas, TEXT, title_x, TITLE_TOP, fonts.title_size, &title);

    let header = [
        snapshot.label_a.as_str(),
        catalog.image_heading.as_str(),
        snapshot.label_b.as_str(),
    ];
    for (text, x) in header.iter().zip(COLUMNS) {
        let (w, _) = fonts.body.measure(fonts.body_size, text);
        fonts.body.draw(&mut canvas, TEXT, x.saturating_sub(half(w)), HEADER_TOP, fonts.body_size, text);
    }

    let mut y = FIRST_ROW_CENTER;
    for stat in catalog.group(group) {
        let cells = [
            snapshot.team_a.count(stat).to_string(),
            stat.to_string(),
            snapshot.team_b.count(stat).to_string(),
        ];
        for (text, x) in cells.iter().zip(COLUMNS) {
            draw_centered(&mut canvas, &fonts.body, fonts.body_size, x, y, text);
        }
        y += LINE_HEIGHT;
    }

    canvas
}

/// PNG-encoded `compose` output.
pub fn compose_png(catalog: &StatCatalog, fonts: &Fonts, snapshot: &MatchSnapshot, group: StatGroup) -> Result<Vec<u8>> {
    let canvas = compose(catalog, fonts, snapshot, group);
    encode_png(canvas)
}

/// `compose_png` wrapped as a data URI for an `<img src>`.
pub fn compose_data_uri(catalog: &StatCatalog, fonts: &Fonts, snapshot: &MatchSnapshot, group: StatGroup) -> Result<String> {
    let png = compose_png(catalog, fonts, snapshot, group)?;
    Ok(to_data_uri(&png))
}

pub fn to_data_uri(png: &[u8]) -> String {
    format!("{}{}", DATA_URI_PREFIX, general_purpose::STANDARD.encode(png))
}

/// Reverses `to_data_uri`. `None` if the prefix or the base64 payload is wrong.
pub fn from_data_uri(uri: &str) -> Option<Vec<u8>> {
    let payload = uri.strip_prefix(DATA_URI_PREFIX)?;
    general_purpose::STANDARD.decode(payload).ok()
}

// *************** Internal Functions ***************

/// Draws `text` centered both ways on (`cx`, `cy`).
fn draw_centered(canvas: &mut RgbImage, face: &FontFace, scale: f32, cx: i32, cy: i32, text: &str) {
    let (w, h) = face.measure(scale, text);
    face.draw(canvas, TEXT, cx.saturating_sub(half(w)), cy.saturating_sub(half(h)), scale, text);
}

/// Half of a measured extent, as a drawing offset.
fn half(extent: u32) -> i32 {
    i32::try_from(extent / 2).unwrap_or(i32::MAX)
}

fn encode_png(canvas: RgbImage) -> Result<Vec<u8>> {
    let mut buf = Cursor::new(Vec::new());
    DynamicImage::ImageRgb8(canvas).write_to(&mut buf, ImageFormat::Png)?;
    Ok(buf.into_inner())
}

// *************** Tests ***************

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::FontConfig;
    use crate::stats::{StatStore, Team};
    use std::path::PathBuf;
    use std::sync::Arc;

    fn scenario() -> (Arc<StatCatalog>, MatchSnapshot) {
        let catalog = Arc::new(StatCatalog::with_groups(&["Goals", "Shots"], &["Fouls"]).unwrap());
        let mut store = StatStore::new(catalog.clone());
        store.set_label(Team::A, "Home");
        store.set_label(Team::B, "Away");
        store.increment(Team::A, "Goals").unwrap();
        store.increment(Team::A, "Goals").unwrap();
        store.increment(Team::B, "Goals").unwrap();
        store.increment(Team::A, "Fouls").unwrap();
        (catalog, store.snapshot())
    }

    fn missing_fonts() -> Fonts {
        Fonts::load(&FontConfig {
            bold: vec![PathBuf::from("no/such/bold.ttf")],
            regular: vec![PathBuf::from("no/such/regular.ttf")],
            ..FontConfig::default()
        })
    }

    #[test]
    fn test_title_line() {
        let (catalog, snap) = scenario();
        assert_eq!(title_line(&catalog, &snap), "Home [2]  x  [1] Away");
    }

    #[test]
    fn test_title_ignores_other_stats() {
        let (catalog, mut snap) = scenario();
        snap.label_a = String::new();
        assert_eq!(title_line(&catalog, &snap), " [2]  x  [1] Away");
    }

    #[test]
    fn test_compose_canvas_size_and_text_drawn() {
        let (catalog, snap) = scenario();
        let img = compose(&catalog, &missing_fonts(), &snap, StatGroup::Group1);
        assert_eq!(img.dimensions(), (CANVAS_WIDTH, CANVAS_HEIGHT));
        assert_eq!(*img.get_pixel(0, 0), BACKGROUND);
        assert!(img.pixels().any(|p| *p == TEXT));
    }

    #[test]
    fn test_groups_render_differently() {
        let (catalog, snap) = scenario();
        let fonts = missing_fonts();
        let g1 = compose(&catalog, &fonts, &snap, StatGroup::Group1);
        let g2 = compose(&catalog, &fonts, &snap, StatGroup::Group2);
        assert_ne!(g1, g2);
    }

    #[test]
    fn test_png_without_fonts_is_non_empty() {
        let (catalog, snap) = scenario();
        let fonts = missing_fonts();
        for group in StatGroup::ALL {
            let png = compose_png(&catalog, &fonts, &snap, group).unwrap();
            assert!(png.starts_with(&[0x89, b'P', b'N', b'G']));
            let decoded = image::load_from_memory(&png).unwrap();
            assert_eq!(decoded.width(), CANVAS_WIDTH);
            assert_eq!(decoded.height(), CANVAS_HEIGHT);
        }
    }

    #[test]
    fn test_compose_is_deterministic() {
        let (catalog, snap) = scenario();
        let fonts = Fonts::builtin(&FontConfig::default());
        let first = compose_png(&catalog, &fonts, &snap, StatGroup::Group1).unwrap();
        let second = compose_png(&catalog, &fonts, &snap, StatGroup::Group1).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_data_uri() {
        let (catalog, snap) = scenario();
        let fonts = Fonts::builtin(&FontConfig::default());
        let uri = compose_data_uri(&catalog, &fonts, &snap, StatGroup::Group2).unwrap();
        assert!(uri.starts_with("data:image/png;base64,"));
        let png = from_data_uri(&uri).unwrap();
        assert_eq!(png, compose_png(&catalog, &fonts, &snap, StatGroup::Group2).unwrap());
        assert!(from_data_uri("data:image/jpeg;base64,AAAA").is_none());
    }

    #[test]
    fn test_oversized_builtin_fonts_still_render() {
        let (catalog, snap) = scenario();
        let config = FontConfig {
            title_size: 1e9,
            body_size: 1e9,
            ..FontConfig::builtin_only()
        };
        let fonts = Fonts::load(&config);
        let png = compose_png(&catalog, &fonts, &snap, StatGroup::Group1).unwrap();
        assert!(!png.is_empty());
    }

    #[test]
    fn test_system_truetype_font_renders_deterministically() {
        let fonts = Fonts::load(&FontConfig::default());
        if fonts.title.is_builtin() || fonts.body.is_builtin() {
            eprintln!("no system TrueType font found, skipping");
            return;
        }
        let (catalog, snap) = scenario();
        let first = compose_png(&catalog, &fonts, &snap, StatGroup::Group1).unwrap();
        let second = compose_png(&catalog, &fonts, &snap, StatGroup::Group1).unwrap();
        assert!(!first.is_empty());
        assert_eq!(first, second);

        let builtin = compose_png(&catalog, &Fonts::builtin(&FontConfig::default()), &snap, StatGroup::Group1).unwrap();
        assert_ne!(first, builtin);
    }

    #[test]
    fn test_long_labels_do_not_panic() {
        let (catalog, mut snap) = scenario();
        snap.label_a = "A".repeat(200);
        snap.label_b = "Ç".repeat(200);
        let fonts = Fonts::builtin(&FontConfig::default());
        assert!(compose_png(&catalog, &fonts, &snap, StatGroup::Group1).is_ok());
    }
}
