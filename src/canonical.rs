//! Operator-first team ordering

use crate::record::{MatchRecord, StableId, Team};

/// A match seen from the operator's side.
///
/// Holds a permutation of team indices instead of a reordered copy, so the
/// record is never touched and the winner can still be looked up by its
/// original index.
#[derive(Debug, Clone)]
pub struct CanonicalMatch<'a> {
	record: &'a MatchRecord,
	order: Vec<usize>,
}

impl<'a> CanonicalMatch<'a> {
	/// Swap the operator's team into slot 0.
	///
	/// Only slots 0 and the operator's slot change places; all other teams
	/// keep their positions. Without an id, or when no team contains it, the
	/// parse order is kept.
	pub fn new(record: &'a MatchRecord, operator: Option<StableId>) -> Self {
		let mut order: Vec<usize> = (0..record.teams.len()).collect();
		if let Some(mine) = operator.and_then(|id| record.team_of(id))
			&& mine != 0
		{
			order.swap(0, mine);
		}
		Self { record, order }
	}

	pub fn record(&self) -> &'a MatchRecord {
		self.record
	}

	pub fn teams(&self) -> impl Iterator<Item = &'a Team> + '_ {
		self.order.iter().map(|&i| &self.record.teams[i])
	}

	/// Team in slot 0 (the operator's team when it was found)
	pub fn first(&self) -> Option<&'a Team> {
		self.order.first().map(|&i| &self.record.teams[i])
	}

	/// Every team after slot 0, in canonical order
	pub fn rest(&self) -> impl Iterator<Item = &'a Team> + '_ {
		self.order.iter().skip(1).map(|&i| &self.record.teams[i])
	}

	pub fn first_won(&self) -> bool {
		self.order
			.first()
			.is_some_and(|&i| self.record.is_winner(i))
	}

	pub fn order(&self) -> &[usize] {
		&self.order
	}
}
