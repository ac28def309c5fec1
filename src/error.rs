//! Error types for the replay renaming engine

use std::path::PathBuf;
use thiserror::Error;

use crate::confirm::Override;

/// Top-level error covering every way a rename run can stop.
///
/// `RenameError` groups failures by when they happen relative to a batch:
///
/// ### Before a batch starts
/// Configuration and identity problems. Nothing has been touched on disk when
/// one of these is returned:
/// - Source or destination directory missing
/// - Template uses `$my*`/`$opp*` variables but no player id is configured
/// - The operator declined a risky template or a same-directory copy
///
/// ### During a batch
/// Emit failures abort the remaining records. Emits that already happened are
/// kept and the number of them is carried in `completed`:
/// - Move/copy I/O failure
/// - Destination collision under [`CollisionPolicy::Fail`](crate::batch::CollisionPolicy::Fail)
/// - Cancellation observed between two records
///
/// ## Handling
///
/// ```rust
/// use replay_renamer::{RenameError, ConfigError};
///
/// fn describe(err: &RenameError) -> String {
///     match err {
///         RenameError::Config(ConfigError::MissingPlayerId) => {
///             "run `detect` first or pass --player-id".to_string()
///         }
///         RenameError::Declined(what) => format!("stopped: {what}"),
///         RenameError::Emit { completed, .. } => format!("failed after {completed} replays"),
///         other => other.to_string(),
///     }
/// }
/// ```
#[derive(Debug, Error)]
pub enum RenameError {
	/// File system I/O errors outside of a per-record emit
	#[error("I/O error: {0}")]
	Io(#[from] std::io::Error),

	/// Invalid or incomplete configuration; the batch never started
	#[error("Configuration error: {0}")]
	Config(#[from] ConfigError),

	/// Identity resolution could not establish the operator's player id
	#[error("Identity error: {0}")]
	Identity(#[from] IdentityError),

	/// Replay discovery or parsing failed as a whole
	#[error("Ingest error: {0}")]
	Ingest(#[from] IngestError),

	/// The operator answered "no" to a required confirmation
	#[error("Declined: {0}")]
	Declined(Override),

	/// A move/copy failed; the batch stopped at this record
	#[error("Failed to emit {from} -> {to} after {completed} replays: {source}")]
	Emit {
		from: PathBuf,
		to: PathBuf,
		completed: usize,
		#[source]
		source: std::io::Error,
	},

	/// Destination already taken and the collision policy is `Fail`
	#[error("Destination already exists: {path} (after {completed} replays)")]
	Collision { path: PathBuf, completed: usize },

	/// A cancellation request was honored between two records
	#[error("Batch cancelled after {completed} replays")]
	Cancelled { completed: usize },

	/// Settings file could not be read or written as JSON
	#[error("Settings error: {0}")]
	Settings(#[from] serde_json::Error),
}

/// Blocking configuration problems found before a batch starts
#[derive(Debug, Error)]
pub enum ConfigError {
	#[error("template requires a player id but none is configured")]
	MissingPlayerId,

	#[error("invalid player id '{0}'")]
	InvalidPlayerId(String),

	#[error("replay folder does not exist: {0}")]
	SourceNotFound(PathBuf),

	#[error("destination folder does not exist: {0}")]
	DestinationNotFound(PathBuf),

	#[error("minimum players ({min}) is greater than maximum players ({max})")]
	InvalidPlayerRange { min: usize, max: usize },
}

/// Identity resolution failures
#[derive(Debug, Error)]
pub enum IdentityError {
	#[error("cannot resolve replay folder: {0}")]
	SourceNotFound(PathBuf),

	#[error("no human players found in the sampled replays")]
	NoCandidates,

	#[error("no candidate was accepted")]
	Exhausted,
}

/// Replay discovery and parsing errors
#[derive(Debug, Error)]
pub enum IngestError {
	#[error("replay folder does not exist: {0}")]
	SourceNotFound(PathBuf),

	#[error("cannot parse {path}: {reason}")]
	Parse { path: PathBuf, reason: String },

	#[error("I/O error: {0}")]
	Io(#[from] std::io::Error),

	#[error("JSON error: {0}")]
	Json(#[from] serde_json::Error),
}

/// Convenience alias used across the engine and batch runner.
pub type RenameResult<T> = Result<T, RenameError>;

/// Convenience type alias for identity resolution results.
pub type IdentityResult<T> = Result<T, IdentityError>;

/// Convenience type alias for ingestion results.
pub type IngestResult<T> = Result<T, IngestError>;

#[cfg(test)]
mod tests {
	use super::*;
	use std::path::PathBuf;

	#[test_log::test]
	fn test_rename_error_display() {
		let error = RenameError::Config(ConfigError::MissingPlayerId);
		assert_eq!(
			error.to_string(),
			"Configuration error: template requires a player id but none is configured"
		);

		let error = RenameError::Cancelled { completed: 4 };
		assert_eq!(error.to_string(), "Batch cancelled after 4 replays");

		let error = RenameError::Collision {
			path: PathBuf::from("/out/a.SC2Replay"),
			completed: 2,
		};
		assert_eq!(
			error.to_string(),
			"Destination already exists: /out/a.SC2Replay (after 2 replays)"
		);
	}

	#[test_log::test]
	fn test_config_error_display() {
		let error = ConfigError::InvalidPlayerRange { min: 4, max: 2 };
		assert_eq!(
			error.to_string(),
			"minimum players (4) is greater than maximum players (2)"
		);

		let error = ConfigError::SourceNotFound(PathBuf::from("/missing"));
		assert_eq!(error.to_string(), "replay folder does not exist: /missing");
	}

	#[test_log::test]
	fn test_identity_error_display() {
		assert_eq!(
			IdentityError::NoCandidates.to_string(),
			"no human players found in the sampled replays"
		);
		assert_eq!(IdentityError::Exhausted.to_string(), "no candidate was accepted");
	}

	#[test_log::test]
	fn test_error_conversion() {
		let io_error = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
		let error: RenameError = io_error.into();
		assert!(matches!(error, RenameError::Io(_)));

		let error: RenameError = IdentityError::NoCandidates.into();
		assert!(matches!(error, RenameError::Identity(IdentityError::NoCandidates)));

		let error: RenameError = IngestError::SourceNotFound(PathBuf::from("/x")).into();
		assert!(matches!(error, RenameError::Ingest(_)));
	}
}
