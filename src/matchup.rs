//! Matchup strings (`ZvT`, `ZTvPP`) and lineup matching

use std::fmt;
use std::str::FromStr;

use crate::paths::split_list;
use crate::record::{MatchRecord, StableId};

/// Ordered, lowercased per-team race strings.
///
/// Parsed from user input by lowercasing and splitting on `v`, or derived from
/// a record. Two matchups are equal only when they have the same number of
/// teams and every team string matches in order.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Matchup(Vec<String>);

impl Matchup {
	pub fn parse(raw: &str) -> Self {
		Self(raw.trim().to_lowercase().split('v').map(str::to_string).collect())
	}

	/// Parse a comma-separated list, skipping empty entries
	pub fn parse_list(raw: &str) -> Vec<Self> {
		split_list(raw).iter().map(|s| Self::parse(s)).collect()
	}

	/// Lineup sequence of a record.
	///
	/// Without an operator id every team's lineup is listed in parse order.
	/// With one, the operator's lineup comes first and the opponents follow in
	/// parse order. When the operator played in none of the teams, their slot
	/// is an empty lineup, so such a game matches no user pattern.
	pub fn of_record(record: &MatchRecord, operator: Option<StableId>) -> Self {
		let lowered = |i: usize| record.teams[i].lineup.to_lowercase();
		let all = 0..record.teams.len();
		let Some(id) = operator else {
			return Self(all.map(lowered).collect());
		};
		let mine = record.team_of(id);
		let mut seq = Vec::with_capacity(record.teams.len() + 1);
		seq.push(mine.map(lowered).unwrap_or_default());
		seq.extend(all.filter(|&i| Some(i) != mine).map(lowered));
		Self(seq)
	}

	pub fn teams(&self) -> &[String] {
		&self.0
	}

	pub fn matches_any(&self, patterns: &[Matchup]) -> bool {
		patterns.iter().any(|p| p == self)
	}
}

impl FromStr for Matchup {
	type Err = std::convert::Infallible;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		Ok(Self::parse(s))
	}
}

impl fmt::Display for Matchup {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "{}", self.0.join("v"))
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::record::fixtures::*;

	#[test_log::test]
	fn test_parse_is_case_insensitive() {
		assert_eq!(Matchup::parse("ZvT"), Matchup::parse("zvt"));
		assert_eq!(Matchup::parse(" ZTvPP ").teams(), ["zt", "pp"]);
		assert_eq!(Matchup::parse("ZvT").to_string(), "zvt");
	}

	#[test_log::test]
	fn test_parse_list_trims_and_skips_blanks() {
		let list = Matchup::parse_list("ZvT, PvP,,  ");
		assert_eq!(list, vec![Matchup::parse("zvt"), Matchup::parse("pvp")]);
		assert!(Matchup::parse_list("").is_empty());
	}

	#[test_log::test]
	fn test_operator_on_zerg_matches_zvt() {
		let rec = zvt();
		let seq = Matchup::of_record(&rec, Some(1));
		assert!(seq.matches_any(&[Matchup::parse("ZvT")]));
		assert!(seq.matches_any(&[Matchup::parse("zvt")]));
		assert!(!seq.matches_any(&[Matchup::parse("TvZ")]));
	}

	#[test_log::test]
	fn test_unframed_sequence_is_order_sensitive() {
		let rec = record(vec![
			team(vec![player("Maru", 2, 0)], "T"),
			team(vec![player("Serral", 1, 0)], "Z"),
		]);
		let plain = Matchup::of_record(&rec, None);
		assert!(!plain.matches_any(&[Matchup::parse("ZvT")]));
		assert!(plain.matches_any(&[Matchup::parse("TvZ")]));

		let framed = Matchup::of_record(&rec, Some(1));
		assert!(framed.matches_any(&[Matchup::parse("ZvT")]));
	}

	#[test_log::test]
	fn test_team_game_never_matches_duel_pattern() {
		let rec = record(vec![
			team(vec![player("a", 1, 0), player("b", 2, 0)], "ZT"),
			team(vec![player("c", 3, 0), player("d", 4, 0)], "PP"),
		]);
		let seq = Matchup::of_record(&rec, None);
		assert!(!seq.matches_any(&[Matchup::parse("ZvP"), Matchup::parse("ZvT")]));
		assert!(seq.matches_any(&[Matchup::parse("ztvpp")]));
	}

	#[test_log::test]
	fn test_framing_keeps_opponent_parse_order() {
		let rec = record(vec![
			team(vec![player("a", 1, 0)], "Z"),
			team(vec![player("b", 2, 0)], "T"),
			team(vec![player("c", 3, 0)], "P"),
		]);
		assert_eq!(Matchup::of_record(&rec, Some(3)).teams(), ["p", "z", "t"]);
		assert_eq!(Matchup::of_record(&rec, None).teams(), ["z", "t", "p"]);
	}

	#[test_log::test]
	fn test_absent_operator_gets_an_empty_slot() {
		let rec = zvt();
		let seq = Matchup::of_record(&rec, Some(99));
		assert_eq!(seq.teams(), ["", "z", "t"]);
		assert_eq!(seq.to_string(), "vzvt");
		assert!(!seq.matches_any(&[Matchup::parse("ZvT"), Matchup::parse("TvZ")]));
	}
}
