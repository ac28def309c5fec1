//! Replay discovery and the parser seam
//!
//! Turning a raw replay into a [`MatchRecord`] is delegated to a
//! [`ReplayParser`]. This module only finds replay files and streams them
//! through the parser lazily, one file per `next()`.

use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, trace, warn};
use walkdir::{DirEntry, WalkDir};

use crate::error::{IngestError, IngestResult};
use crate::paths::is_replay;
use crate::record::MatchRecord;

/// Turns one replay file into a match record
pub trait ReplayParser {
	fn parse(&self, path: &Path) -> IngestResult<MatchRecord>;

	/// Files that belong to `replay` and move with it, each paired with its
	/// new path once the replay is renamed to `renamed`
	fn companions(&self, _replay: &Path, _renamed: &Path) -> Vec<(PathBuf, PathBuf)> {
		Vec::new()
	}
}

impl<F> ReplayParser for F
where
	F: Fn(&Path) -> IngestResult<MatchRecord>,
{
	fn parse(&self, path: &Path) -> IngestResult<MatchRecord> {
		self(path)
	}
}

/// Reads records that an external replay parser exported next to each replay.
///
/// For `Game.SC2Replay` the record is read from `Game.SC2Replay.json`. The
/// record's `source_path` is always overwritten with the replay's own path.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonSidecarParser;

impl JsonSidecarParser {
	pub fn sidecar_path(replay: &Path) -> PathBuf {
		let mut name = replay.as_os_str().to_owned();
		name.push(".json");
		PathBuf::from(name)
	}
}

impl ReplayParser for JsonSidecarParser {
	fn parse(&self, path: &Path) -> IngestResult<MatchRecord> {
		let sidecar = Self::sidecar_path(path);
		let raw = fs::read(&sidecar).map_err(|e| IngestError::Parse {
			path: path.to_path_buf(),
			reason: format!("cannot read {}: {}", sidecar.display(), e),
		})?;
		let mut record: MatchRecord = serde_json::from_slice(&raw)?;
		if record.teams.is_empty() {
			return Err(IngestError::Parse {
				path: path.to_path_buf(),
				reason: "record has no teams".to_string(),
			});
		}
		record.source_path = path.to_path_buf();
		Ok(record)
	}

	/// The sidecar, when present, so a renamed replay stays readable
	fn companions(&self, replay: &Path, renamed: &Path) -> Vec<(PathBuf, PathBuf)> {
		let sidecar = Self::sidecar_path(replay);
		if sidecar.is_file() {
			vec![(sidecar, Self::sidecar_path(renamed))]
		} else {
			Vec::new()
		}
	}
}

/// A folder of replays and how to traverse it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReplayDirectory {
	/// Folder to scan
	pub root: PathBuf,
	/// Subfolder names to skip entirely
	pub exclude_dirs: Vec<String>,
	/// Folder levels to read; 1 reads only `root` itself, `None` is unlimited
	pub depth: Option<usize>,
	/// Whether to follow symbolic links
	pub follow_links: bool,
}

impl ReplayDirectory {
	pub fn new(root: impl Into<PathBuf>) -> Self {
		Self {
			root: root.into(),
			exclude_dirs: Vec::new(),
			depth: Some(1),
			follow_links: true,
		}
	}

	/// Set subfolder names to skip
	pub fn exclude_dirs(mut self, names: Vec<String>) -> Self {
		self.exclude_dirs = names;
		self
	}

	/// Set traversal depth (`None` for unlimited)
	pub fn depth(mut self, depth: Option<usize>) -> Self {
		self.depth = depth;
		self
	}

	/// Configure whether to follow symbolic links
	pub fn follow_links(mut self, follow: bool) -> Self {
		self.follow_links = follow;
		self
	}

	pub fn ensure_exists(&self) -> IngestResult<()> {
		if self.root.is_dir() {
			Ok(())
		} else {
			Err(IngestError::SourceNotFound(self.root.clone()))
		}
	}

	fn is_excluded(&self, entry: &DirEntry) -> bool {
		entry.depth() > 0
			&& entry.file_type().is_dir()
			&& entry
				.file_name()
				.to_str()
				.is_some_and(|name| self.exclude_dirs.iter().any(|x| x == name))
	}

	/// Every replay under the folder, in file-name order
	pub fn replay_paths(&self) -> IngestResult<Vec<PathBuf>> {
		self.ensure_exists()?;
		debug!("Ingest: scanning {}", self.root.display());

		let mut walker = WalkDir::new(&self.root)
			.follow_links(self.follow_links)
			.sort_by_file_name();
		if let Some(depth) = self.depth {
			walker = walker.max_depth(depth);
		}

		let mut paths = Vec::new();
		for entry in walker.into_iter().filter_entry(|e| !self.is_excluded(e)) {
			let entry = match entry {
				Ok(e) => e,
				Err(e) => {
					warn!("Ingest: walk error: {}", e);
					continue;
				}
			};
			if entry.file_type().is_dir() || !is_replay(entry.path()) {
				continue;
			}
			trace!("Ingest: found {}", entry.path().display());
			paths.push(entry.into_path());
		}
		debug!("Ingest: {} replays under {}", paths.len(), self.root.display());
		Ok(paths)
	}

	/// Number of replays directly inside the folder, ignoring subfolders
	pub fn top_level_count(&self) -> IngestResult<usize> {
		self.ensure_exists()?;
		let mut count = 0;
		for entry in fs::read_dir(&self.root)? {
			let path = entry?.path();
			if path.is_file() && is_replay(&path) {
				count += 1;
			}
		}
		Ok(count)
	}

	/// Lazily parse every replay under the folder
	pub fn records<'p, P: ReplayParser + ?Sized>(
		&self,
		parser: &'p P,
	) -> IngestResult<ReplayStream<'p, P>> {
		Ok(ReplayStream::new(self.replay_paths()?, parser))
	}

	/// Lazily parse at most the first `n` replays
	pub fn first_n<'p, P: ReplayParser + ?Sized>(
		&self,
		parser: &'p P,
		n: usize,
	) -> IngestResult<ReplayStream<'p, P>> {
		let mut paths = self.replay_paths()?;
		paths.truncate(n);
		Ok(ReplayStream::new(paths, parser))
	}
}

/// Finite, lazily parsed sequence of records
pub struct ReplayStream<'p, P: ReplayParser + ?Sized> {
	paths: std::vec::IntoIter<PathBuf>,
	parser: &'p P,
}

impl<'p, P: ReplayParser + ?Sized> ReplayStream<'p, P> {
	pub fn new(paths: Vec<PathBuf>, parser: &'p P) -> Self {
		Self {
			paths: paths.into_iter(),
			parser,
		}
	}
}

impl<P: ReplayParser + ?Sized> Iterator for ReplayStream<'_, P> {
	type Item = IngestResult<MatchRecord>;

	fn next(&mut self) -> Option<Self::Item> {
		let path = self.paths.next()?;
		Some(self.parser.parse(&path))
	}

	fn size_hint(&self) -> (usize, Option<usize>) {
		self.paths.size_hint()
	}
}
