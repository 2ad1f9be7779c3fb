//! Jingle Player - headless soundboard for the terminal
//!
//! Every stored clip becomes a numbered tile. Commands typed on stdin click,
//! reset, color, move and delete tiles; a 25 ms pump drives crossfades,
//! volume restores and end-of-clip handling in between.
//!
//! ## Command line flags
//!
//! - `--config <path>`: config file (default `~/.config/jingle/config.yaml`)
//! - `--db <path>`: clip database, overriding the config

mod commands;
mod render;

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::time::MissedTickBehavior;

use commands::{Command, HELP};
use jingle_core::board::ClipFile;
use jingle_core::clip::VirtualClipFactory;
use jingle_core::config::{default_config_path, load_config, save_config, BoardConfig};
use jingle_core::store::open_or_ephemeral;
use jingle_core::timing::{SharedClock, SystemClock};
use jingle_core::{parse_fade_seconds, Board, BoardError, BoardEvent};
use render::{describe_event, render_grid, TileView};

/// How often timers and clip ends are processed
const PUMP_INTERVAL: Duration = Duration::from_millis(25);

struct App {
    board: Board,
    config: BoardConfig,
    config_path: PathBuf,
    events: crossbeam::channel::Receiver<BoardEvent>,
}

impl App {
    /// Handle one input line; returns false when the user quits
    fn handle_line(&mut self, line: &str) -> bool {
        match commands::parse(line) {
            Ok(None) => true,
            Ok(Some(command)) => match self.execute(command) {
                Ok(keep_running) => keep_running,
                Err(e) => {
                    eprintln!("error: {:#}", e);
                    true
                }
            },
            Err(message) => {
                eprintln!("{}", message);
                true
            }
        }
    }

    fn execute(&mut self, command: Command) -> Result<bool> {
        match command {
            Command::Add(paths) => {
                let files = paths
                    .iter()
                    .map(|p| read_clip_file(p))
                    .collect::<Result<Vec<_>>>()?;
                self.board.add_files(files)?;
                self.print_board();
            }
            Command::Click(id) => self.board.click(id)?,
            Command::Reset(id) => self.board.reset(id)?,
            Command::Color { id, color } => {
                self.board.set_color(id, &color)?;
            }
            Command::Delete { id, confirmed } => {
                let deleted = self.board.delete(id, |tile| {
                    if !confirmed {
                        println!("Delete '{}'? Repeat with --yes to confirm", tile.name());
                    }
                    confirmed
                })?;
                if deleted {
                    self.print_board();
                }
            }
            Command::Move { id, index } => {
                self.board.move_tile(id, index)?;
                self.print_board();
            }
            Command::Crossfade(enabled) => {
                self.board.set_crossfade_enabled(enabled);
                self.config.crossfade.enabled = enabled;
                self.persist_config();
                self.print_status();
            }
            Command::Fade(raw) => {
                let seconds = parse_fade_seconds(&raw);
                self.board.set_fade_seconds(seconds);
                self.config.crossfade.fade_seconds = seconds;
                self.persist_config();
                self.print_status();
            }
            Command::Size(size) => {
                self.config.display.tile_size = size;
                self.persist_config();
                self.print_board();
            }
            Command::Export(path) => {
                let json = self.board.export_settings().to_json()?;
                std::fs::write(&path, json)
                    .with_context(|| format!("Failed to write settings to {:?}", path))?;
                println!("settings written to {}", path.display());
            }
            Command::Import(path) => {
                let text = std::fs::read_to_string(&path)
                    .with_context(|| format!("Failed to read settings from {:?}", path))?;
                let report = self.board.import_settings(&text)?;
                self.config.crossfade.enabled = self.board.crossfade_enabled();
                self.config.crossfade.fade_seconds = self.board.fade_seconds();
                self.persist_config();
                println!(
                    "imported: {} tiles matched, {} skipped",
                    report.matched.len(),
                    report.unmatched.len() + report.malformed_entries
                );
                self.print_board();
            }
            Command::List => self.print_board(),
            Command::Clear { confirmed } => {
                if confirmed {
                    self.board.clear()?;
                } else {
                    println!("This deletes every tile. Repeat with --yes to confirm");
                }
            }
            Command::Help => println!("{}", HELP),
            Command::Quit => return Ok(false),
        }
        Ok(true)
    }

    fn persist_config(&self) {
        if let Err(e) = save_config(&self.config, &self.config_path) {
            log::warn!("Failed to save config: {:#}", e);
        }
    }

    fn print_status(&self) {
        let crossfade = if self.board.crossfade_enabled() {
            format!(
                "on ({}s, {})",
                self.board.fade_seconds(),
                self.board.fade_curve().as_str()
            )
        } else {
            "off".to_string()
        };
        let storage = if self.board.is_durable() {
            "saved"
        } else {
            "this session only"
        };
        println!("crossfade: {} | clips: {}", crossfade, storage);
    }

    fn print_board(&self) {
        let views: Vec<TileView> = self.board.tiles().map(TileView::from).collect();
        println!("{}", render_grid(&views, self.config.display.tile_size));
        self.print_status();
    }

    fn print_events(&self) {
        for event in self.events.try_iter() {
            if let Some(text) = describe_event(&event) {
                println!("{}", text);
            }
        }
    }
}

/// MIME type from a file extension
fn mime_for(path: &Path) -> &'static str {
    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase);
    match extension.as_deref() {
        Some("mp3") => "audio/mpeg",
        Some("wav") => "audio/wav",
        Some("flac") => "audio/flac",
        Some("ogg") | Some("oga") => "audio/ogg",
        Some("m4a") => "audio/mp4",
        Some("aac") => "audio/aac",
        _ => "application/octet-stream",
    }
}

fn read_clip_file(path: &Path) -> Result<ClipFile> {
    let bytes = std::fs::read(path).with_context(|| format!("Failed to read {:?}", path))?;
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string());
    Ok(ClipFile {
        name,
        bytes,
        mime_type: mime_for(path).to_string(),
    })
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    // Set RUST_LOG=debug for per-step crossfade logging
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format_timestamp_millis()
        .init();

    let args: Vec<String> = std::env::args().collect();
    let flag = |name: &str| {
        args.iter()
            .position(|a| a == name)
            .and_then(|i| args.get(i + 1))
            .map(PathBuf::from)
    };
    let config_path = flag("--config").unwrap_or_else(default_config_path);

    log::info!("jingle-player starting up");
    let mut config: BoardConfig = load_config(&config_path);
    if let Some(db) = flag("--db") {
        config.storage.database_path = Some(db);
    }

    let database_path = config.storage.database_path();
    let (store, storage_error) = open_or_ephemeral(&database_path);
    if let Some(e) = storage_error {
        eprintln!(
            "Warning: {}. Clips added now are lost on exit.",
            BoardError::StorageUnavailable(e.to_string())
        );
    }

    let clock: SharedClock = Arc::new(SystemClock::new());
    let mut board = Board::new(
        store,
        Box::new(VirtualClipFactory::new(clock.clone())),
        clock,
        &config.crossfade,
    );
    let events = board.subscribe();
    if let Err(e) = board.load() {
        log::error!("Failed to load clips: {}", e);
        eprintln!("Warning: could not load stored clips ({})", e);
    }
    // Tiles loaded at startup are shown by the grid, not as events
    events.try_iter().for_each(drop);

    let mut app = App {
        board,
        config,
        config_path,
        events,
    };
    println!("jingle-player - type 'help' for commands");
    app.print_board();

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut pump = tokio::time::interval(PUMP_INTERVAL);
    pump.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            line = lines.next_line() => {
                match line.context("Failed to read from stdin")? {
                    Some(line) => {
                        if !app.handle_line(&line) {
                            break;
                        }
                    }
                    None => break,
                }
            }
            _ = pump.tick() => app.board.pump(),
        }
        app.print_events();
    }

    log::info!("jingle-player shutting down");
    Ok(())
}
