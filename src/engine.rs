//! Background auto-renamer that polls the replay folder for new games

use std::collections::{HashMap, HashSet};
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::thread::JoinHandle;
use std::time::Duration;

use async_channel::{self as channel, TryRecvError};
use futures_lite::future;
use tracing::{debug, info, trace, warn};

use crate::batch::{self, BatchConfig, BatchContext, BatchReport, WithCompanions};
use crate::confirm::{Confirm, Decision};
use crate::emit::Emitter;
use crate::error::{RenameError, RenameResult};
use crate::ingest::ReplayParser;

/// Polls a replay may stay unreadable before it counts as unreadable
const MAX_PARSE_ATTEMPTS: usize = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineCommand {
	/// Begin or resume polling
	Start,
	Pause,
	Stop,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EngineEvent {
	Started,
	/// A poll found new replays and ran a batch over them
	Tick(BatchReport),
	Error(String),
	Stopped,
}

/// Renames replays as they appear, one batch per poll.
///
/// Runs a single loop on its own thread, so at most one batch is in flight.
/// The engine starts idle and begins polling on [`EngineCommand::Start`].
pub struct AutoRenamer {
	cmd_tx: channel::Sender<EngineCommand>,
	evt_rx: channel::Receiver<EngineEvent>,
	cancellation_token: Arc<AtomicBool>,
	handle: Option<JoinHandle<()>>,
}

impl AutoRenamer {
	/// Check `config`, ask whether existing replays should be renamed too,
	/// then spawn the polling loop.
	///
	/// Declining `RenameExisting` marks every replay already in the folder as
	/// seen, so only games recorded from now on are renamed.
	pub fn start<P, E, C>(
		config: BatchConfig,
		parser: P,
		emitter: E,
		confirm: &C,
		interval: Duration,
	) -> RenameResult<Self>
	where
		P: ReplayParser + Send + 'static,
		E: Emitter + Send + 'static,
		C: Confirm + ?Sized,
	{
		batch::preflight(&config, confirm)?;

		let existing = config.directory().replay_paths()?;
		let mut seen = HashSet::new();
		let rename_existing = existing.is_empty()
			|| confirm.confirm(&Decision::RenameExisting {
				count: existing.len(),
			});
		if !rename_existing {
			info!("Engine: leaving {} existing replays alone", existing.len());
			seen.extend(existing);
		}

		let (cmd_tx, cmd_rx) = channel::unbounded::<EngineCommand>();
		let (evt_tx, evt_rx) = channel::unbounded::<EngineEvent>();
		let cancellation_token = Arc::new(AtomicBool::new(false));
		let token = cancellation_token.clone();

		let handle = std::thread::spawn(move || {
			future::block_on(async move {
				info!("Engine: watching {}", config.source.display());
				let mut poller = Poller::new(config, parser, emitter, seen, token);
				let mut running = false;

				let _ = evt_tx.send(EngineEvent::Started).await;
				'outer: loop {
					// Pull any pending commands without blocking
					loop {
						match cmd_rx.try_recv() {
							Ok(EngineCommand::Start) => running = true,
							Ok(EngineCommand::Pause) => running = false,
							Ok(EngineCommand::Stop) | Err(TryRecvError::Closed) => break 'outer,
							Err(TryRecvError::Empty) => break,
						}
					}

					if running {
						match poller.poll() {
							Ok(Some(report)) => {
								let _ = evt_tx.send(EngineEvent::Tick(report)).await;
							}
							Ok(None) => {}
							Err(RenameError::Cancelled { completed }) => {
								debug!("Engine: batch cancelled after {}", completed);
								break 'outer;
							}
							Err(e) => {
								warn!("Engine: {}", e);
								let _ = evt_tx.send(EngineEvent::Error(e.to_string())).await;
							}
						}
					}
					smol::Timer::after(interval).await;
				}
				info!("Engine: stopped");
				let _ = evt_tx.send(EngineEvent::Stopped).await;
			});
		});

		Ok(Self {
			cmd_tx,
			evt_rx,
			cancellation_token,
			handle: Some(handle),
		})
	}

	pub fn send(&self, cmd: EngineCommand) {
		let _ = self.cmd_tx.send_blocking(cmd);
	}

	pub fn events(&self) -> channel::Receiver<EngineEvent> {
		self.evt_rx.clone()
	}

	/// Stop after the record in progress and wait for the loop to exit
	pub fn stop(mut self) {
		self.shutdown();
	}

	fn shutdown(&mut self) {
		self.cancellation_token.store(true, Ordering::Relaxed);
		let _ = self.cmd_tx.send_blocking(EngineCommand::Stop);
		if let Some(handle) = self.handle.take() {
			let _ = handle.join();
		}
	}
}

impl Drop for AutoRenamer {
	fn drop(&mut self) {
		self.shutdown();
	}
}

/// One engine's view of the folder between polls
struct Poller<P, E> {
	config: BatchConfig,
	parser: P,
	emitter: E,
	seen: HashSet<PathBuf>,
	/// Failed parses per replay not yet given up on
	attempts: HashMap<PathBuf, usize>,
	produced: Arc<Mutex<Vec<PathBuf>>>,
	ctx: BatchContext,
}

impl<P: ReplayParser, E: Emitter> Poller<P, E> {
	fn new(config: BatchConfig, parser: P, emitter: E, seen: HashSet<PathBuf>, token: Arc<AtomicBool>) -> Self {
		let produced = Arc::new(Mutex::new(Vec::new()));
		let sink = produced.clone();
		let ctx = BatchContext::default()
			.with_cancellation_token(token)
			.with_progress_callback(move |p| {
				if let Ok(mut out) = sink.lock() {
					out.push(p.current.clone());
				}
			});
		Self {
			config,
			parser,
			emitter,
			seen,
			attempts: HashMap::new(),
			produced,
			ctx,
		}
	}

	/// Run a batch over new replays that have become readable, if there are any
	fn poll(&mut self) -> RenameResult<Option<BatchReport>> {
		let fresh: Vec<PathBuf> = self
			.config
			.directory()
			.replay_paths()?
			.into_iter()
			.filter(|p| !self.seen.contains(p))
			.collect();

		// A new replay is often on disk before its record can be read
		let mut records = Vec::with_capacity(fresh.len());
		for path in fresh {
			match self.parser.parse(&path) {
				Ok(record) => {
					self.attempts.remove(&path);
					self.seen.insert(path);
					records.push(Ok(record));
				}
				Err(e) => {
					let tries = self.attempts.entry(path.clone()).or_insert(0);
					*tries += 1;
					if *tries < MAX_PARSE_ATTEMPTS {
						trace!("Engine: {} not readable yet: {}", path.display(), e);
						continue;
					}
					self.attempts.remove(&path);
					self.seen.insert(path);
					records.push(Err(e));
				}
			}
		}
		if records.is_empty() {
			return Ok(None);
		}
		debug!("Engine: {} new replays", records.len());

		let emitter = WithCompanions {
			parser: &self.parser,
			emitter: &self.emitter,
		};
		let result = batch::run_records(&self.config, records, &emitter, &self.ctx);
		// Renamed files land in the watched folder when moving in place
		if let Ok(mut out) = self.produced.lock() {
			self.seen.extend(out.drain(..));
		}
		result.map(Some)
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::confirm::AlwaysYes;
	use crate::emit::{FileOperation, FsEmitter};
	use crate::ingest::JsonSidecarParser;
	use crate::paths::is_replay;
	use crate::record::MatchRecord;
	use crate::record::fixtures::zvt;
	use crate::template::Template;
	use std::fs;
	use std::path::Path;
	use tempfile::TempDir;

	const INTERVAL: Duration = Duration::from_millis(10);

	fn add_replay(dir: &Path, name: &str, record: &MatchRecord) {
		let path = dir.join(name);
		// Sidecar first so a poll never sees a replay without its record
		fs::write(
			JsonSidecarParser::sidecar_path(&path),
			serde_json::to_vec(record).unwrap(),
		)
		.unwrap();
		fs::write(&path, b"MPQ").unwrap();
	}

	fn next_event(rx: &channel::Receiver<EngineEvent>) -> Option<EngineEvent> {
		future::block_on(future::or(async { rx.recv().await.ok() }, async {
			smol::Timer::after(Duration::from_secs(5)).await;
			None
		}))
	}

	fn next_tick(rx: &channel::Receiver<EngineEvent>) -> BatchReport {
		loop {
			match next_event(rx) {
				Some(EngineEvent::Tick(report)) => return report,
				Some(EngineEvent::Error(e)) => panic!("engine error: {e}"),
				Some(_) => continue,
				None => panic!("timed out waiting for a tick"),
			}
		}
	}

	fn copy_config(src: &Path, dst: &Path) -> BatchConfig {
		BatchConfig::new(src, dst, Template::parse("$team1 vs $team2 $uniqueID"))
			.with_operation(FileOperation::Copy)
	}

	fn replay_count(dst: &Path) -> usize {
		fs::read_dir(dst)
			.unwrap()
			.filter(|e| is_replay(&e.as_ref().unwrap().path()))
			.count()
	}

	#[test_log::test]
	fn test_renames_existing_then_new_replays() {
		let (src, dst) = (TempDir::new().unwrap(), TempDir::new().unwrap());
		add_replay(src.path(), "first.SC2Replay", &zvt());

		let engine = AutoRenamer::start(
			copy_config(src.path(), dst.path()),
			JsonSidecarParser,
			FsEmitter,
			&AlwaysYes,
			INTERVAL,
		)
		.unwrap();
		let events = engine.events();
		assert_eq!(next_event(&events), Some(EngineEvent::Started));
		engine.send(EngineCommand::Start);
		assert_eq!(next_tick(&events).emitted, 1);

		let mut later = zvt();
		later.unix_timestamp += 3600;
		add_replay(src.path(), "second.SC2Replay", &later);
		assert_eq!(next_tick(&events).emitted, 1);
		assert_eq!(replay_count(dst.path()), 2);

		engine.stop();
		let mut rest = Vec::new();
		while let Ok(e) = events.try_recv() {
			rest.push(e);
		}
		assert_eq!(rest.last(), Some(&EngineEvent::Stopped));
	}

	#[test_log::test]
	fn test_declining_existing_only_renames_new() {
		let (src, dst) = (TempDir::new().unwrap(), TempDir::new().unwrap());
		add_replay(src.path(), "old.SC2Replay", &zvt());

		let new_only = |d: &Decision| !matches!(d, Decision::RenameExisting { .. });
		let engine = AutoRenamer::start(
			copy_config(src.path(), dst.path()),
			JsonSidecarParser,
			FsEmitter,
			&new_only,
			INTERVAL,
		)
		.unwrap();
		let events = engine.events();
		engine.send(EngineCommand::Start);

		let mut later = zvt();
		later.unix_timestamp += 60;
		add_replay(src.path(), "new.SC2Replay", &later);
		let report = next_tick(&events);
		assert_eq!(report.emitted, 1);
		assert_eq!(replay_count(dst.path()), 1);
		engine.stop();
	}

	#[test_log::test]
	fn test_replay_waits_for_its_record() {
		let (src, dst) = (TempDir::new().unwrap(), TempDir::new().unwrap());
		let engine = AutoRenamer::start(
			copy_config(src.path(), dst.path()),
			JsonSidecarParser,
			FsEmitter,
			&AlwaysYes,
			INTERVAL,
		)
		.unwrap();
		let events = engine.events();
		engine.send(EngineCommand::Start);

		let replay = src.path().join("new.SC2Replay");
		fs::write(&replay, b"MPQ").unwrap();
		std::thread::sleep(INTERVAL * 3);
		fs::write(
			JsonSidecarParser::sidecar_path(&replay),
			serde_json::to_vec(&zvt()).unwrap(),
		)
		.unwrap();

		let report = next_tick(&events);
		assert_eq!(report.emitted, 1);
		assert_eq!(report.unreadable, 0);
		assert_eq!(replay_count(dst.path()), 1);
		engine.stop();
	}

	#[test_log::test]
	fn test_unreadable_replay_is_given_up_once() {
		let (src, dst) = (TempDir::new().unwrap(), TempDir::new().unwrap());
		let engine = AutoRenamer::start(
			copy_config(src.path(), dst.path()),
			JsonSidecarParser,
			FsEmitter,
			&AlwaysYes,
			INTERVAL,
		)
		.unwrap();
		let events = engine.events();
		engine.send(EngineCommand::Start);

		fs::write(src.path().join("broken.SC2Replay"), b"MPQ").unwrap();
		let report = next_tick(&events);
		assert_eq!(report.unreadable, 1);
		assert_eq!(report.emitted, 0);

		add_replay(src.path(), "good.SC2Replay", &zvt());
		let report = next_tick(&events);
		assert_eq!(report.unreadable, 0);
		assert_eq!(report.emitted, 1);
		engine.stop();
	}

	#[test_log::test]
	fn test_preflight_failure_prevents_start() {
		let src = TempDir::new().unwrap();
		let config = copy_config(src.path(), &src.path().join("missing"));
		let result = AutoRenamer::start(config, JsonSidecarParser, FsEmitter, &AlwaysYes, INTERVAL);
		assert!(matches!(result, Err(RenameError::Config(_))));
	}
}
