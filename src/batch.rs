//! Batch runner: preflight checks, then filter, render and emit per record

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};
use tracing::{debug, info, trace, warn};

use crate::collision::CollisionRisk;
use crate::confirm::{Confirm, Decision};
use crate::emit::{Emitter, FileOperation};
use crate::error::{ConfigError, IngestResult, RenameError, RenameResult};
use crate::filter::FilterCriteria;
use crate::ingest::{ReplayDirectory, ReplayParser};
use crate::paths::same_location;
use crate::record::{MatchRecord, StableId};
use crate::template::Template;

/// What to do when a rendered destination is already taken
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CollisionPolicy {
	/// Replace whatever is there
	Overwrite,
	/// Leave the source alone and report the destination
	#[default]
	Skip,
	/// Stop the batch
	Fail,
}

/// Everything one batch run needs, fixed for the duration of the run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchConfig {
	pub source: PathBuf,
	pub destination: PathBuf,
	pub template: Template,
	/// Operator's stable id, when known
	pub operator: Option<StableId>,
	pub operation: FileOperation,
	pub filter: FilterCriteria,
	pub exclude_dirs: Vec<String>,
	/// Folder levels to read; `None` is unlimited
	pub depth: Option<usize>,
	pub follow_links: bool,
	pub collision_policy: CollisionPolicy,
}

impl BatchConfig {
	pub fn new(source: impl Into<PathBuf>, destination: impl Into<PathBuf>, template: Template) -> Self {
		Self {
			source: source.into(),
			destination: destination.into(),
			template,
			operator: None,
			operation: FileOperation::default(),
			filter: FilterCriteria::default(),
			exclude_dirs: Vec::new(),
			depth: Some(1),
			follow_links: true,
			collision_policy: CollisionPolicy::default(),
		}
	}

	pub fn with_operator(mut self, id: StableId) -> Self {
		self.operator = Some(id);
		self
	}

	pub fn with_operation(mut self, op: FileOperation) -> Self {
		self.operation = op;
		self
	}

	pub fn with_filter(mut self, filter: FilterCriteria) -> Self {
		self.filter = filter;
		self
	}

	pub fn with_collision_policy(mut self, policy: CollisionPolicy) -> Self {
		self.collision_policy = policy;
		self
	}

	/// The source folder as the ingestion layer sees it
	pub fn directory(&self) -> ReplayDirectory {
		ReplayDirectory::new(&self.source)
			.exclude_dirs(self.exclude_dirs.clone())
			.depth(self.depth)
			.follow_links(self.follow_links)
	}
}

/// Progress snapshot sent after each emitted replay
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchProgress {
	/// Records looked at so far, filtered and unreadable ones included
	pub processed: usize,
	pub emitted: usize,
	/// Destination of the replay just emitted
	pub current: PathBuf,
}

/// Execution context for a batch run
pub struct BatchContext {
	pub cancellation_token: Arc<AtomicBool>,
	pub progress_callback: Option<Box<dyn Fn(&BatchProgress) + Send + Sync>>,
}

impl Default for BatchContext {
	fn default() -> Self {
		Self {
			cancellation_token: Arc::new(AtomicBool::new(false)),
			progress_callback: None,
		}
	}
}

impl BatchContext {
	/// Share a cancellation token with the caller
	pub fn with_cancellation_token(mut self, token: Arc<AtomicBool>) -> Self {
		self.cancellation_token = token;
		self
	}

	pub fn with_progress_callback<F>(mut self, callback: F) -> Self
	where
		F: Fn(&BatchProgress) + Send + Sync + 'static,
	{
		self.progress_callback = Some(Box::new(callback));
		self
	}

	pub fn is_cancelled(&self) -> bool {
		self.cancellation_token.load(Ordering::Relaxed)
	}

	pub fn report_progress(&self, progress: &BatchProgress) {
		if let Some(callback) = &self.progress_callback {
			callback(progress);
		}
	}
}

/// Outcome of a finished batch
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BatchReport {
	pub emitted: usize,
	/// Replays whose name was already the rendered one
	pub unchanged: usize,
	/// Rejected by the filter
	pub filtered: usize,
	/// Rejected by the parser
	pub unreadable: usize,
	/// Destinations skipped because they were taken
	pub collisions: Vec<PathBuf>,
	pub elapsed: Duration,
}

impl BatchReport {
	pub fn processed(&self) -> usize {
		self.emitted + self.unchanged + self.filtered + self.unreadable + self.collisions.len()
	}
}

fn ask<C: Confirm + ?Sized>(confirm: &C, decision: Decision) -> RenameResult<()> {
	if confirm.confirm(&decision) {
		return Ok(());
	}
	match decision.guards() {
		Some(what) => Err(RenameError::Declined(what)),
		None => Ok(()),
	}
}

/// Check a configuration before anything touches the disk.
///
/// Blocking problems are reported in a fixed order. Overridable ones are put
/// to `confirm`, and a "no" ends the run with [`RenameError::Declined`].
pub fn preflight<C: Confirm + ?Sized>(config: &BatchConfig, confirm: &C) -> RenameResult<()> {
	if config.template.requires_identity() && config.operator.is_none() {
		return Err(ConfigError::MissingPlayerId.into());
	}
	if !config.source.is_dir() {
		return Err(ConfigError::SourceNotFound(config.source.clone()).into());
	}
	if !config.destination.is_dir() {
		return Err(ConfigError::DestinationNotFound(config.destination.clone()).into());
	}

	if config.operation == FileOperation::Copy && same_location(&config.source, &config.destination) {
		ask(
			confirm,
			Decision::SameDirectoryCopy {
				folder: config.source.clone(),
			},
		)?;
	}
	if CollisionRisk::assess(&config.template).is_risky() {
		ask(
			confirm,
			Decision::RiskyTemplate {
				template: config.template.to_string(),
			},
		)?;
	}
	Ok(())
}

/// Preflight, then rename every replay in the source folder
pub fn run<P, E, C>(
	config: &BatchConfig,
	parser: &P,
	emitter: &E,
	confirm: &C,
	ctx: &BatchContext,
) -> RenameResult<BatchReport>
where
	P: ReplayParser + ?Sized,
	E: Emitter + ?Sized,
	C: Confirm + ?Sized,
{
	preflight(config, confirm)?;
	let records = config.directory().records(parser)?;
	run_records(config, records, &WithCompanions { parser, emitter }, ctx)
}

/// Emits a replay, then the files its parser says belong to it
pub(crate) struct WithCompanions<'a, P: ?Sized, E: ?Sized> {
	pub(crate) parser: &'a P,
	pub(crate) emitter: &'a E,
}

impl<P, E> Emitter for WithCompanions<'_, P, E>
where
	P: ReplayParser + ?Sized,
	E: Emitter + ?Sized,
{
	fn emit(&self, op: FileOperation, from: &Path, to: &Path) -> io::Result<()> {
		let companions = self.parser.companions(from, to);
		self.emitter.emit(op, from, to)?;
		for (extra_from, extra_to) in companions {
			trace!("Batch: {} follows {}", extra_from.display(), from.display());
			self.emitter.emit(op, &extra_from, &extra_to)?;
		}
		Ok(())
	}
}

/// Filter, render and emit each record in order.
///
/// No preflight happens here. Unreadable records are counted and skipped;
/// the first emit failure stops the batch and the emits before it stay.
pub fn run_records<I, E>(
	config: &BatchConfig,
	records: I,
	emitter: &E,
	ctx: &BatchContext,
) -> RenameResult<BatchReport>
where
	I: IntoIterator<Item = IngestResult<MatchRecord>>,
	E: Emitter + ?Sized,
{
	let start = Instant::now();
	let framing = config.template.framing(config.operator);
	let mut report = BatchReport::default();
	let mut produced: HashSet<PathBuf> = HashSet::new();
	let mut processed = 0;

	info!(
		"Batch: {} {} -> {} with '{}'",
		config.operation,
		config.source.display(),
		config.destination.display(),
		config.template
	);

	for item in records {
		if ctx.is_cancelled() {
			info!("Batch: cancelled after {} replays", report.emitted);
			return Err(RenameError::Cancelled {
				completed: report.emitted,
			});
		}
		processed += 1;

		let record = match item {
			Ok(r) => r,
			Err(e) => {
				warn!("Batch: skipping unreadable replay: {}", e);
				report.unreadable += 1;
				continue;
			}
		};

		if let Err(why) = config.filter.evaluate(&record, framing) {
			debug!("Batch: {} filtered: {}", record.source_path().display(), why);
			report.filtered += 1;
			continue;
		}

		let from = record.source_path();
		let to = config
			.destination
			.join(config.template.file_name(&record, config.operator));

		if same_location(from, &to) {
			debug!("Batch: {} already named", from.display());
			report.unchanged += 1;
			continue;
		}

		if produced.contains(&to) || to.exists() {
			match config.collision_policy {
				CollisionPolicy::Overwrite => {
					warn!("Batch: overwriting {}", to.display());
				}
				CollisionPolicy::Skip => {
					warn!("Batch: {} already exists, skipping {}", to.display(), from.display());
					report.collisions.push(to);
					continue;
				}
				CollisionPolicy::Fail => {
					return Err(RenameError::Collision {
						path: to,
						completed: report.emitted,
					});
				}
			}
		}

		emit_one(emitter, config.operation, from, &to, report.emitted)?;
		report.emitted += 1;
		ctx.report_progress(&BatchProgress {
			processed,
			emitted: report.emitted,
			current: to.clone(),
		});
		produced.insert(to);
	}

	report.elapsed = start.elapsed();
	info!(
		"Batch: renamed {} replays in {:.1}s ({} filtered, {} unchanged, {} unreadable, {} collisions)",
		report.emitted,
		report.elapsed.as_secs_f64(),
		report.filtered,
		report.unchanged,
		report.unreadable,
		report.collisions.len()
	);
	Ok(report)
}

fn emit_one<E: Emitter + ?Sized>(
	emitter: &E,
	op: FileOperation,
	from: &Path,
	to: &Path,
	completed: usize,
) -> RenameResult<()> {
	emitter.emit(op, from, to).map_err(|source| RenameError::Emit {
		from: from.to_path_buf(),
		to: to.to_path_buf(),
		completed,
		source,
	})
}
