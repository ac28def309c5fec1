//! Common path helpers for settings locations and folder comparisons

use dirs::config_dir;
use std::path::{Path, PathBuf};

/// File extension of StarCraft II replays, without the dot
pub const REPLAY_EXTENSION: &str = "SC2Replay";

const APP_DIR: &str = "replay-renamer";
const SETTINGS_FILE: &str = "settings.json";

/// Get the default configuration directory, e.g.:
/// - Linux: ~/.config/replay-renamer
/// - macOS: ~/Library/Application Support/replay-renamer
/// - Windows: %APPDATA%\replay-renamer
pub fn default_config_dir() -> Option<PathBuf> {
	config_dir().map(|mut p| {
		p.push(APP_DIR);
		p
	})
}

pub fn default_settings_path() -> Option<PathBuf> {
	default_config_dir().map(|p| p.join(SETTINGS_FILE))
}

/// Split a comma-separated settings field into trimmed, non-empty entries
pub fn split_list(raw: &str) -> Vec<String> {
	raw.split(',')
		.map(str::trim)
		.filter(|s| !s.is_empty())
		.map(str::to_string)
		.collect()
}

/// Whether two folder paths point at the same place.
///
/// Compares canonical forms when both resolve, and the literal paths otherwise,
/// so a missing folder still compares equal to itself.
pub fn same_location(a: &Path, b: &Path) -> bool {
	match (a.canonicalize(), b.canonicalize()) {
		(Ok(a), Ok(b)) => a == b,
		_ => a == b,
	}
}

/// Whether `path` carries the replay extension (case-insensitive)
pub fn is_replay(path: &Path) -> bool {
	path.extension()
		.and_then(|e| e.to_str())
		.is_some_and(|e| e.eq_ignore_ascii_case(REPLAY_EXTENSION))
}
