//! Persisted user settings (JSON)

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use crate::batch::{BatchConfig, CollisionPolicy};
use crate::emit::FileOperation;
use crate::error::{ConfigError, RenameResult};
use crate::filter::FilterCriteria;
use crate::matchup::Matchup;
use crate::paths::split_list;
use crate::record::StableId;
use crate::template::Template;

pub const DEFAULT_TEMPLATE: &str = "$uniqueID $team1 ($t1races) vs $team2 ($t2races) $map";

/// Everything the operator can configure, in its on-disk layout.
///
/// List fields (`matchups`, `dirs`) hold comma-separated text exactly as typed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
	pub template: String,
	pub source_dir: PathBuf,
	pub target_dir: PathBuf,
	/// Decimal stable id; empty when unknown
	pub player_id: String,
	pub operation: FileOperation,
	pub excludes: Excludes,
	pub includes: Includes,
	/// Keep renaming new replays in the background
	pub tray: bool,
	pub collision_policy: CollisionPolicy,
	/// Folder levels to read; `null` is unlimited
	pub depth: Option<usize>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Excludes {
	pub ai: bool,
	pub custom: bool,
	pub matchups: String,
	pub dirs: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Includes {
	pub matchups: String,
	pub min_players: usize,
	pub max_players: usize,
	pub wol: bool,
	pub hots: bool,
	pub lotv: bool,
}

impl Default for Includes {
	fn default() -> Self {
		Self {
			matchups: String::new(),
			min_players: 1,
			max_players: 8,
			wol: true,
			hots: true,
			lotv: true,
		}
	}
}

impl Default for Settings {
	fn default() -> Self {
		Self {
			template: DEFAULT_TEMPLATE.to_string(),
			source_dir: PathBuf::new(),
			target_dir: PathBuf::new(),
			player_id: String::new(),
			operation: FileOperation::Move,
			excludes: Excludes::default(),
			includes: Includes::default(),
			tray: false,
			collision_policy: CollisionPolicy::Skip,
			depth: Some(1),
		}
	}
}

impl Settings {
	pub fn load(path: &Path) -> RenameResult<Self> {
		let raw = fs::read(path)?;
		let settings = serde_json::from_slice(&raw)?;
		debug!("Settings: loaded {}", path.display());
		Ok(settings)
	}

	/// Load `path`, or defaults when it does not exist yet
	pub fn load_or_default(path: &Path) -> RenameResult<Self> {
		if path.exists() {
			Self::load(path)
		} else {
			debug!("Settings: {} not found, using defaults", path.display());
			Ok(Self::default())
		}
	}

	/// Write pretty JSON through a temp file and rename it into place
	pub fn save(&self, path: &Path) -> RenameResult<()> {
		if let Some(parent) = path.parent() {
			fs::create_dir_all(parent)?;
		}
		let bytes = serde_json::to_vec_pretty(self)?;
		let tmp = path.with_extension("json.tmp");
		fs::write(&tmp, bytes)?;
		#[cfg(windows)]
		{
			if path.exists() {
				fs::remove_file(path)?;
			}
		}
		fs::rename(&tmp, path)?;
		info!("Settings: saved {}", path.display());
		Ok(())
	}

	/// The configured operator id, `None` when the field is blank
	pub fn operator(&self) -> Result<Option<StableId>, ConfigError> {
		let raw = self.player_id.trim();
		if raw.is_empty() {
			return Ok(None);
		}
		raw.parse()
			.map(Some)
			.map_err(|_| ConfigError::InvalidPlayerId(raw.to_string()))
	}

	pub fn set_operator(&mut self, id: StableId) {
		self.player_id = id.to_string();
	}

	pub fn filter(&self) -> Result<FilterCriteria, ConfigError> {
		let (min, max) = (self.includes.min_players, self.includes.max_players);
		if min > max {
			return Err(ConfigError::InvalidPlayerRange { min, max });
		}
		Ok(FilterCriteria {
			exclude_ai: self.excludes.ai,
			exclude_custom: self.excludes.custom,
			min_players: min,
			max_players: max,
			allow_wol: self.includes.wol,
			allow_hots: self.includes.hots,
			allow_lotv: self.includes.lotv,
			exclude_matchups: Matchup::parse_list(&self.excludes.matchups),
			include_matchups: Matchup::parse_list(&self.includes.matchups),
		})
	}

	/// Freeze the settings into a batch configuration
	pub fn to_batch_config(&self) -> Result<BatchConfig, ConfigError> {
		Ok(BatchConfig {
			source: self.source_dir.clone(),
			destination: self.target_dir.clone(),
			template: Template::parse(&self.template),
			operator: self.operator()?,
			operation: self.operation,
			filter: self.filter()?,
			exclude_dirs: split_list(&self.excludes.dirs),
			depth: self.depth,
			follow_links: true,
			collision_policy: self.collision_policy,
		})
	}
}
