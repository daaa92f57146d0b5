use std::collections::HashMap;
use std::env;
use std::fs;
use std::net::{IpAddr, SocketAddr};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{value_parser, Arg, ArgAction, ArgMatches, Command};
use serde::Deserialize;
use tracing::info;
use tracing_subscriber::{fmt, EnvFilter};

use matchboard::compose::{compose_png, title_line};
use matchboard::server::{router, AppState};
use matchboard::{render_table, Fonts, MatchSnapshot, ScoreboardConfig, StatGroup, TeamStats};

const DEFAULT_PORT: u16 = 8050;

/// Input of the `compose` subcommand.
#[derive(Deserialize)]
struct SnapshotFile {
    #[serde(default)]
    label_a: String,
    #[serde(default)]
    label_b: String,
    #[serde(default)]
    team_a: HashMap<String, u32>,
    #[serde(default)]
    team_b: HashMap<String, u32>,
}

fn cli() -> Command {
    Command::new("matchboard")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Match statistics scoreboard with shareable summary images")
        .arg(
            Arg::new("config")
                .long("config")
                .value_name("FILE")
                .help("JSON config with the stat catalog and font settings")
                .value_parser(value_parser!(PathBuf))
                .global(true),
        )
        .subcommand(
            Command::new("serve")
                .about("Serve the scoreboard page (default)")
                .arg(
                    Arg::new("host")
                        .long("host")
                        .value_name("ADDR")
                        .help("Bind address")
                        .default_value("0.0.0.0")
                        .value_parser(value_parser!(IpAddr)),
                )
                .arg(
                    Arg::new("port")
                        .long("port")
                        .value_name("PORT")
                        .help("Listen port (falls back to $PORT, then 8050)")
                        .value_parser(value_parser!(u16)),
                ),
        )
        .subcommand(
            Command::new("compose")
                .about("Render both summary images from a JSON snapshot")
                .arg(
                    Arg::new("snapshot")
                        .value_name("SNAPSHOT")
                        .help("JSON file with label_a, label_b, team_a and team_b counts")
                        .required(true)
                        .value_parser(value_parser!(PathBuf)),
                )
                .arg(
                    Arg::new("out-dir")
                        .long("out-dir")
                        .value_name("DIR")
                        .default_value(".")
                        .value_parser(value_parser!(PathBuf)),
                )
                .arg(
                    Arg::new("builtin-font")
                        .long("builtin-font")
                        .help("Skip font files and use the built-in bitmap face")
                        .action(ArgAction::SetTrue),
                ),
        )
}

#[tokio::main]
async fn main() -> Result<()> {
    fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let matches = cli().get_matches();
    let config = ScoreboardConfig::load(matches.get_one::<PathBuf>("config").map(PathBuf::as_path))
        .context("Failed to load scoreboard config")?;

    match matches.subcommand() {
        Some(("compose", sub)) => run_compose(&config, sub),
        Some(("serve", sub)) => serve(config, listen_addr(Some(sub))).await,
        _ => serve(config, listen_addr(None)).await,
    }
}

/// `--host`/`--port`, then `$PORT`, then 0.0.0.0:8050.
fn listen_addr(sub: Option<&ArgMatches>) -> SocketAddr {
    let host = sub
        .and_then(|m| m.get_one::<IpAddr>("host").copied())
        .unwrap_or(IpAddr::from([0, 0, 0, 0]));
    let port = sub
        .and_then(|m| m.get_one::<u16>("port").copied())
        .or_else(|| env::var("PORT").ok().and_then(|v| v.parse().ok()))
        .unwrap_or(DEFAULT_PORT);
    SocketAddr::new(host, port)
}

async fn serve(config: ScoreboardConfig, addr: SocketAddr) -> Result<()> {
    let fonts = Fonts::load(&config.fonts);
    let app = router(AppState::new(config.catalog, config.sessions, fonts));

    info!("listening on http://{addr}");
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    axum::serve(listener, app).await.context("HTTP server failed")?;

    Ok(())
}

fn run_compose(config: &ScoreboardConfig, sub: &ArgMatches) -> Result<()> {
    let snapshot_path = sub
        .get_one::<PathBuf>("snapshot")
        .context("SNAPSHOT argument missing")?;
    let out_dir = sub
        .get_one::<PathBuf>("out-dir")
        .context("--out-dir missing")?;

    let snapshot = read_snapshot(config, snapshot_path)?;
    let fonts = if sub.get_flag("builtin-font") {
        Fonts::builtin(&config.fonts)
    } else {
        Fonts::load(&config.fonts)
    };

    println!("{}", title_line(&config.catalog, &snapshot));
    print!("{}", render_table(&config.catalog, &snapshot));

    fs::create_dir_all(out_dir)
        .with_context(|| format!("Failed to create output directory {}", out_dir.display()))?;
    for (group, name) in StatGroup::ALL.into_iter().zip(["group1.png", "group2.png"]) {
        let png = compose_png(&config.catalog, &fonts, &snapshot, group)
            .with_context(|| format!("Failed to render {}", group))?;
        let path = out_dir.join(name);
        fs::write(&path, png).with_context(|| format!("Failed to write {}", path.display()))?;
        info!(path = %path.display(), "image written");
    }
    Ok(())
}

fn read_snapshot(config: &ScoreboardConfig, path: &Path) -> Result<MatchSnapshot> {
    let json = fs::read_to_string(path)
        .with_context(|| format!("Failed to read snapshot {}", path.display()))?;
    let file: SnapshotFile =
        serde_json::from_str(&json).with_context(|| format!("Invalid snapshot JSON in {}", path.display()))?;

    Ok(MatchSnapshot {
        team_a: TeamStats::from_counts(&config.catalog, &file.team_a).context("Invalid team_a counts")?,
        team_b: TeamStats::from_counts(&config.catalog, &file.team_b).context("Invalid team_b counts")?,
        label_a: file.label_a,
        label_b: file.label_b,
    })
}
