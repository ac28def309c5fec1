//! Inclusion/exclusion rules evaluated per match record

use std::fmt;

use crate::matchup::Matchup;
use crate::record::{Expansion, MatchRecord, StableId};

/// Selection criteria for one batch run.
///
/// All predicates must hold for a record to pass. Matchup lists are stored
/// already normalized; an empty `include_matchups` means "no restriction".
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilterCriteria {
	pub exclude_ai: bool,
	pub exclude_custom: bool,
	/// Inclusive bounds on the total player count (humans and computers)
	pub min_players: usize,
	pub max_players: usize,
	pub allow_wol: bool,
	pub allow_hots: bool,
	pub allow_lotv: bool,
	pub exclude_matchups: Vec<Matchup>,
	pub include_matchups: Vec<Matchup>,
}

impl Default for FilterCriteria {
	fn default() -> Self {
		Self {
			exclude_ai: false,
			exclude_custom: false,
			min_players: 1,
			max_players: 8,
			allow_wol: true,
			allow_hots: true,
			allow_lotv: true,
			exclude_matchups: Vec::new(),
			include_matchups: Vec::new(),
		}
	}
}

/// Why a record was filtered out
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Rejection {
	ComputerPlayers,
	NotLadder,
	PlayerCount(usize),
	Expansion(Expansion),
	ExcludedMatchup(String),
	NotIncluded(String),
}

impl fmt::Display for Rejection {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			Rejection::ComputerPlayers => write!(f, "has computer players"),
			Rejection::NotLadder => write!(f, "not a ladder game"),
			Rejection::PlayerCount(n) => write!(f, "{n} players out of range"),
			Rejection::Expansion(e) => write!(f, "{e} replays not allowed"),
			Rejection::ExcludedMatchup(m) => write!(f, "matchup {m} excluded"),
			Rejection::NotIncluded(m) => write!(f, "matchup {m} not included"),
		}
	}
}

impl FilterCriteria {
	fn allows(&self, expansion: Expansion) -> bool {
		match expansion {
			Expansion::WingsOfLiberty => self.allow_wol,
			Expansion::HeartOfTheSwarm => self.allow_hots,
			Expansion::LegacyOfTheVoid => self.allow_lotv,
		}
	}

	/// Run every predicate against `record`.
	///
	/// `framing` is the operator id to use for matchup comparison, or `None`
	/// to compare teams in parse order. Flag and count checks run before the
	/// matchup sequence is built.
	pub fn evaluate(&self, record: &MatchRecord, framing: Option<StableId>) -> Result<(), Rejection> {
		if self.exclude_ai && record.has_computer_players {
			return Err(Rejection::ComputerPlayers);
		}
		if self.exclude_custom && !record.is_ladder {
			return Err(Rejection::NotLadder);
		}
		let players = record.player_count();
		if !(self.min_players..=self.max_players).contains(&players) {
			return Err(Rejection::PlayerCount(players));
		}
		if !self.allows(record.expansion) {
			return Err(Rejection::Expansion(record.expansion));
		}

		if self.exclude_matchups.is_empty() && self.include_matchups.is_empty() {
			return Ok(());
		}
		let lineup = Matchup::of_record(record, framing);
		if lineup.matches_any(&self.exclude_matchups) {
			return Err(Rejection::ExcludedMatchup(lineup.to_string()));
		}
		if !self.include_matchups.is_empty() && !lineup.matches_any(&self.include_matchups) {
			return Err(Rejection::NotIncluded(lineup.to_string()));
		}
		Ok(())
	}

	pub fn passes(&self, record: &MatchRecord, framing: Option<StableId>) -> bool {
		self.evaluate(record, framing).is_ok()
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::record::fixtures::*;

	fn three_players() -> MatchRecord {
		record(vec![
			team(vec![player("a", 1, 0), player("b", 2, 0)], "ZT"),
			team(vec![player("c", 3, 0)], "P"),
		])
	}

	#[test_log::test]
	fn test_defaults_pass_plain_duel() {
		assert!(FilterCriteria::default().passes(&zvt(), None));
	}

	#[test_log::test]
	fn test_player_count_bounds_are_inclusive() {
		let rec = three_players();
		let exact_two = FilterCriteria {
			min_players: 2,
			max_players: 2,
			..Default::default()
		};
		assert_eq!(exact_two.evaluate(&rec, None), Err(Rejection::PlayerCount(3)));

		let wide = FilterCriteria {
			min_players: 1,
			max_players: 4,
			..Default::default()
		};
		assert!(wide.passes(&rec, None));

		let exact_three = FilterCriteria {
			min_players: 3,
			max_players: 3,
			..Default::default()
		};
		assert!(exact_three.passes(&rec, None));
	}

	#[test_log::test]
	fn test_ai_and_custom_exclusions() {
		let mut rec = zvt();
		rec.has_computer_players = true;
		rec.is_ladder = false;

		let criteria = FilterCriteria {
			exclude_ai: true,
			..Default::default()
		};
		assert_eq!(criteria.evaluate(&rec, None), Err(Rejection::ComputerPlayers));

		let criteria = FilterCriteria {
			exclude_custom: true,
			..Default::default()
		};
		assert_eq!(criteria.evaluate(&rec, None), Err(Rejection::NotLadder));

		assert!(FilterCriteria::default().passes(&rec, None));
	}

	#[test_log::test]
	fn test_expansion_flags() {
		let mut rec = zvt();
		rec.expansion = Expansion::HeartOfTheSwarm;
		let criteria = FilterCriteria {
			allow_hots: false,
			..Default::default()
		};
		assert_eq!(
			criteria.evaluate(&rec, None),
			Err(Rejection::Expansion(Expansion::HeartOfTheSwarm))
		);
		rec.expansion = Expansion::LegacyOfTheVoid;
		assert!(criteria.passes(&rec, None));
	}

	#[test_log::test]
	fn test_exclude_matchups() {
		let criteria = FilterCriteria {
			exclude_matchups: Matchup::parse_list("ZvT"),
			..Default::default()
		};
		assert_eq!(
			criteria.evaluate(&zvt(), Some(1)),
			Err(Rejection::ExcludedMatchup("zvt".to_string()))
		);
		// From Maru's side the same game is TvZ
		assert!(criteria.passes(&zvt(), Some(2)));
	}

	#[test_log::test]
	fn test_include_matchups_require_a_hit() {
		let criteria = FilterCriteria {
			include_matchups: Matchup::parse_list("TvZ, TvP"),
			..Default::default()
		};
		assert_eq!(
			criteria.evaluate(&zvt(), None),
			Err(Rejection::NotIncluded("zvt".to_string()))
		);
		assert!(criteria.passes(&zvt(), Some(2)));
	}

	#[test_log::test]
	fn test_exclusion_wins_over_inclusion() {
		let criteria = FilterCriteria {
			include_matchups: Matchup::parse_list("ZvT"),
			exclude_matchups: Matchup::parse_list("zvt"),
			..Default::default()
		};
		assert!(!criteria.passes(&zvt(), None));
	}

	#[test_log::test]
	fn test_matchups_never_hit_when_operator_did_not_play() {
		let include = FilterCriteria {
			include_matchups: Matchup::parse_list("ZvT"),
			..Default::default()
		};
		assert_eq!(
			include.evaluate(&zvt(), Some(99)),
			Err(Rejection::NotIncluded("vzvt".to_string()))
		);

		let exclude = FilterCriteria {
			exclude_matchups: Matchup::parse_list("ZvT, TvZ"),
			..Default::default()
		};
		assert!(exclude.passes(&zvt(), Some(99)));
	}
}
