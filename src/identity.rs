//! Majority-vote detection of the operator's player id
//!
//! Whoever owns a replay folder shows up in nearly every game in it, so the
//! most frequent `(name, id)` pair over a sample is the likeliest operator.
//! Candidates are offered in descending frequency until one is accepted.

use std::collections::HashMap;
use tracing::{debug, info, warn};

use crate::confirm::{Confirm, Decision};
use crate::error::{IdentityError, IdentityResult, IngestError};
use crate::ingest::{ReplayDirectory, ReplayParser};
use crate::record::{MatchRecord, StableId};

/// Upper bound on how many replays are read to detect the operator
pub const SAMPLE_LIMIT: usize = 150;

/// A distinct `(name, id)` pair and how often it was observed
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IdentityCandidate {
	pub name: String,
	pub stable_id: StableId,
	pub count: usize,
}

/// Finite sequence of candidates, most frequent first.
///
/// Ties keep the order in which each pair was first observed. Every pair is
/// yielded exactly once, and the sequence ends when all pairs are drained.
#[derive(Debug, Clone)]
pub struct IdentityCandidates {
	ranked: std::vec::IntoIter<IdentityCandidate>,
}

impl IdentityCandidates {
	pub fn from_observations<I>(observations: I) -> Self
	where
		I: IntoIterator<Item = (String, StableId)>,
	{
		// pair -> (count, first seen)
		let mut counts: HashMap<(String, StableId), (usize, usize)> = HashMap::new();
		for (seen, pair) in observations.into_iter().enumerate() {
			counts.entry(pair).or_insert((0, seen)).0 += 1;
		}

		let mut ranked: Vec<_> = counts.into_iter().collect();
		ranked.sort_by(|(_, (ca, fa)), (_, (cb, fb))| cb.cmp(ca).then(fa.cmp(fb)));

		let ranked: Vec<_> = ranked
			.into_iter()
			.map(|((name, stable_id), (count, _))| IdentityCandidate {
				name,
				stable_id,
				count,
			})
			.collect();
		Self {
			ranked: ranked.into_iter(),
		}
	}

	/// Every human player in every record is one observation
	pub fn from_records<'a, I>(records: I) -> Self
	where
		I: IntoIterator<Item = &'a MatchRecord>,
	{
		Self::from_observations(records.into_iter().flat_map(|r| {
			r.human_players()
				.map(|p| (p.name.clone(), p.stable_id))
				.collect::<Vec<_>>()
		}))
	}

	pub fn is_empty(&self) -> bool {
		self.ranked.len() == 0
	}
}

impl Iterator for IdentityCandidates {
	type Item = IdentityCandidate;

	fn next(&mut self) -> Option<Self::Item> {
		self.ranked.next()
	}

	fn size_hint(&self) -> (usize, Option<usize>) {
		self.ranked.size_hint()
	}
}

impl ExactSizeIterator for IdentityCandidates {}

/// Rank candidates over a sample of the folder's replays.
///
/// The sample is the first `min(150, n)` replays, where `n` counts only the
/// replays directly inside the folder. Replays the parser rejects are skipped.
pub fn sample<P: ReplayParser + ?Sized>(
	dir: &ReplayDirectory,
	parser: &P,
) -> IdentityResult<IdentityCandidates> {
	let not_found = |e: IngestError| {
		debug!("Identity: cannot read source: {}", e);
		IdentityError::SourceNotFound(dir.root.clone())
	};
	let size = dir.top_level_count().map_err(not_found)?.min(SAMPLE_LIMIT);
	info!("Identity: sampling {} replays from {}", size, dir.root.display());

	let mut records = Vec::with_capacity(size);
	for record in dir.first_n(parser, size).map_err(not_found)? {
		match record {
			Ok(r) => records.push(r),
			Err(e) => warn!("Identity: skipping replay: {}", e),
		}
	}

	let candidates = IdentityCandidates::from_records(&records);
	if candidates.is_empty() {
		return Err(IdentityError::NoCandidates);
	}
	debug!("Identity: {} distinct candidates", candidates.len());
	Ok(candidates)
}

/// Offer candidates in order until one is accepted
pub fn choose<C: Confirm + ?Sized>(
	candidates: IdentityCandidates,
	confirm: &C,
) -> IdentityResult<IdentityCandidate> {
	for candidate in candidates {
		let question = Decision::IdentityCandidate {
			name: candidate.name.clone(),
			id: candidate.stable_id,
		};
		if confirm.confirm(&question) {
			info!(
				"Identity: operator is {} ({}), seen {} times",
				candidate.name, candidate.stable_id, candidate.count
			);
			return Ok(candidate);
		}
		debug!("Identity: {} declined", candidate.name);
	}
	Err(IdentityError::Exhausted)
}

/// Sample the folder and confirm the operator interactively
pub fn resolve<P, C>(
	dir: &ReplayDirectory,
	parser: &P,
	confirm: &C,
) -> IdentityResult<IdentityCandidate>
where
	P: ReplayParser + ?Sized,
	C: Confirm + ?Sized,
{
	choose(sample(dir, parser)?, confirm)
}
