//! Terminal command parsing

use std::path::PathBuf;

use jingle_core::{TileId, TileSize};

/// One line of user input
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    /// Store audio files as new tiles
    Add(Vec<PathBuf>),
    Click(TileId),
    Reset(TileId),
    Color { id: TileId, color: String },
    /// Delete a tile; `confirmed` is the `--yes` flag
    Delete { id: TileId, confirmed: bool },
    Move { id: TileId, index: usize },
    Crossfade(bool),
    /// Raw fade-duration input, parsed leniently by the board
    Fade(String),
    Size(TileSize),
    Export(PathBuf),
    Import(PathBuf),
    List,
    /// Remove every clip; needs `--yes`
    Clear { confirmed: bool },
    Help,
    Quit,
}

pub const HELP: &str = "\
commands:
  add <file>...            add audio files as tiles
  click <id>               play / pause (or crossfade) a tile
  reset <id>               rewind a tile
  color <id> <color>       primary|success|danger|warning|info|dark
  delete <id> --yes        delete a tile
  move <id> <position>     move a tile in the grid
  xfade on|off             toggle crossfade mode
  fade <seconds>           crossfade length
  size small|medium|large  grid density
  export <file>            write settings JSON
  import <file>            apply settings JSON
  list                     show the board
  clear --yes              delete every tile
  quit";

fn tile_id(arg: Option<&str>) -> Result<TileId, String> {
    let arg = arg.ok_or("missing tile id")?;
    arg.parse::<i64>()
        .map(TileId)
        .map_err(|_| format!("not a tile id: {}", arg))
}

fn path(arg: Option<&str>) -> Result<PathBuf, String> {
    arg.map(PathBuf::from).ok_or_else(|| "missing file path".to_string())
}

/// Parse a command line; empty input yields `Ok(None)`
pub fn parse(line: &str) -> Result<Option<Command>, String> {
    let mut words = line.split_whitespace();
    let Some(verb) = words.next() else {
        return Ok(None);
    };
    let rest: Vec<&str> = words.collect();
    let arg = |i: usize| rest.get(i).copied();
    let confirmed = rest.contains(&"--yes");

    let command = match verb.to_ascii_lowercase().as_str() {
        "add" => {
            if rest.is_empty() {
                return Err("add needs at least one file".to_string());
            }
            Command::Add(rest.iter().map(|p| PathBuf::from(*p)).collect())
        }
        "click" | "c" => Command::Click(tile_id(arg(0))?),
        "reset" | "r" => Command::Reset(tile_id(arg(0))?),
        "color" => Command::Color {
            id: tile_id(arg(0))?,
            color: arg(1).ok_or("missing color")?.to_string(),
        },
        "delete" | "rm" => Command::Delete {
            id: tile_id(arg(0))?,
            confirmed,
        },
        "move" => Command::Move {
            id: tile_id(arg(0))?,
            index: arg(1)
                .and_then(|i| i.parse().ok())
                .ok_or("missing or invalid position")?,
        },
        "xfade" => match arg(0) {
            Some("on") => Command::Crossfade(true),
            Some("off") => Command::Crossfade(false),
            _ => return Err("usage: xfade on|off".to_string()),
        },
        "fade" => Command::Fade(arg(0).unwrap_or_default().to_string()),
        "size" => Command::Size(arg(0).ok_or("missing size")?.parse()?),
        "export" => Command::Export(path(arg(0))?),
        "import" => Command::Import(path(arg(0))?),
        "list" | "ls" => Command::List,
        "clear" => Command::Clear { confirmed },
        "help" | "?" => Command::Help,
        "quit" | "exit" | "q" => Command::Quit,
        other => return Err(format!("unknown command: {} (try 'help')", other)),
    };
    Ok(Some(command))
}
