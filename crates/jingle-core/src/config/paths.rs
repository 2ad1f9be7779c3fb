//! Standard locations of the board's files

use std::path::PathBuf;

/// Directory holding the config file and the clip database
///
/// Returns: `~/.config/jingle` (platform config dir)
pub fn default_data_dir() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| dirs::home_dir().unwrap_or_else(|| PathBuf::from(".")))
        .join("jingle")
}

/// Returns: `~/.config/jingle/config.yaml`
pub fn default_config_path() -> PathBuf {
    default_data_dir().join("config.yaml")
}

/// Returns: `~/.config/jingle/board.db`
pub fn default_database_path() -> PathBuf {
    default_data_dir().join("board.db")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_paths_share_data_dir() {
        let dir = default_data_dir();
        assert!(dir.ends_with("jingle"));
        assert_eq!(default_config_path().parent(), Some(dir.as_path()));
        assert!(default_database_path().ends_with("board.db"));
    }
}
