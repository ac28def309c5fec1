//! Parsed match records handed to the engine by the ingestion layer

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Player identity that survives display-name changes (the toon id).
pub type StableId = u64;

/// Game expansion a replay was recorded with.
///
/// Serialized with the short names replay parsers report (`"WoL"`, `"HotS"`,
/// `"LotV"`), which is also what `$expansion` renders to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Expansion {
	#[serde(rename = "WoL")]
	WingsOfLiberty,
	#[serde(rename = "HotS")]
	HeartOfTheSwarm,
	#[serde(rename = "LotV")]
	LegacyOfTheVoid,
}

impl std::fmt::Display for Expansion {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		match self {
			Expansion::WingsOfLiberty => write!(f, "WoL"),
			Expansion::HeartOfTheSwarm => write!(f, "HotS"),
			Expansion::LegacyOfTheVoid => write!(f, "LotV"),
		}
	}
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Player {
	pub name: String,
	pub stable_id: StableId,
	#[serde(default = "default_human")]
	pub is_human: bool,
	/// Scaled ladder rating at game start. Absent or negative for unranked games.
	#[serde(default)]
	pub initial_rating: Option<i64>,
}

fn default_human() -> bool {
	true
}

impl Player {
	/// Rating used in filenames: absent ratings count as 0.
	pub fn rating(&self) -> i64 {
		self.initial_rating.unwrap_or(0)
	}
}

/// One side of a match.
///
/// `lineup` holds one race letter per player, in roster order (`"ZT"` for a
/// Zerg + Terran pair).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Team {
	pub players: Vec<Player>,
	pub lineup: String,
}

impl Team {
	pub fn contains(&self, id: StableId) -> bool {
		self.players.iter().any(|p| p.stable_id == id)
	}

	/// Player names joined with `+`
	pub fn roster(&self) -> String {
		self.players
			.iter()
			.map(|p| p.name.as_str())
			.collect::<Vec<_>>()
			.join("+")
	}

	/// The first listed player's rating, which stands in for the team's rating.
	pub fn lead_rating(&self) -> i64 {
		self.players.first().map(Player::rating).unwrap_or(0)
	}
}

/// A single parsed game result.
///
/// Records are immutable once ingested; reordering for the operator's point of
/// view happens through [`crate::canonical::CanonicalMatch`], never in place.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchRecord {
	/// Teams in parse order
	pub teams: Vec<Team>,
	pub is_ladder: bool,
	#[serde(default)]
	pub has_computer_players: bool,
	pub expansion: Expansion,
	pub game_type: String,
	pub map_name: String,
	pub duration_seconds: u64,
	pub unix_timestamp: i64,
	/// Filled in from the replay location by the ingestion layer
	#[serde(default)]
	pub source_path: PathBuf,
	/// Index into `teams`; `None` for ties or unknown results
	#[serde(default)]
	pub winning_team: Option<usize>,
}

impl MatchRecord {
	/// Every player across every team, computers included
	pub fn player_count(&self) -> usize {
		self.teams.iter().map(|t| t.players.len()).sum()
	}

	pub fn human_players(&self) -> impl Iterator<Item = &Player> {
		self.teams
			.iter()
			.flat_map(|t| t.players.iter())
			.filter(|p| p.is_human)
	}

	pub fn is_winner(&self, team_index: usize) -> bool {
		self.winning_team == Some(team_index)
	}

	/// Index of the first team whose roster contains `id`
	pub fn team_of(&self, id: StableId) -> Option<usize> {
		self.teams.iter().position(|t| t.contains(id))
	}

	pub fn source_path(&self) -> &Path {
		&self.source_path
	}
}

#[cfg(test)]
pub(crate) mod fixtures {
	use super::*;

	pub fn player(name: &str, id: StableId, rating: i64) -> Player {
		Player {
			name: name.to_string(),
			stable_id: id,
			is_human: true,
			initial_rating: Some(rating),
		}
	}

	pub fn computer(name: &str, id: StableId) -> Player {
		Player {
			name: name.to_string(),
			stable_id: id,
			is_human: false,
			initial_rating: None,
		}
	}

	pub fn team(players: Vec<Player>, lineup: &str) -> Team {
		Team {
			players,
			lineup: lineup.to_string(),
		}
	}

	pub fn record(teams: Vec<Team>) -> MatchRecord {
		MatchRecord {
			teams,
			is_ladder: true,
			has_computer_players: false,
			expansion: Expansion::LegacyOfTheVoid,
			game_type: "1v1".to_string(),
			map_name: "Ephemeron LE".to_string(),
			duration_seconds: 754,
			unix_timestamp: 1_577_934_245,
			source_path: PathBuf::from("/replays/Ephemeron LE (3).SC2Replay"),
			winning_team: Some(0),
		}
	}

	/// Zerg `Serral` (id 1) against Terran `Maru` (id 2), Serral winning
	pub fn zvt() -> MatchRecord {
		record(vec![
			team(vec![player("Serral", 1, 6800)], "Z"),
			team(vec![player("Maru", 2, 6500)], "T"),
		])
	}
}
