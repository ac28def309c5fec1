//! Static duplicate-name risk check for templates

use crate::template::{Template, Variable};

/// How likely two different replays are to render to the same file name.
///
/// This is a heuristic over which variables appear, not a proof: two games
/// started in the same second still collide on `$uniqueID`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CollisionRisk {
	/// Uses `$uniqueID` or `$currentname`
	Unique,
	/// Uses `$hour`, `$min` and `$sec` together
	TimeResolved,
	/// Distinct replays can easily produce the same name
	Risky,
}

impl CollisionRisk {
	pub fn assess(template: &Template) -> Self {
		if template.uses(Variable::UniqueId) || template.uses(Variable::CurrentName) {
			return CollisionRisk::Unique;
		}
		let clock = [Variable::Hour, Variable::Min, Variable::Sec];
		if clock.iter().all(|v| template.uses(*v)) {
			CollisionRisk::TimeResolved
		} else {
			CollisionRisk::Risky
		}
	}

	pub fn is_risky(self) -> bool {
		self == CollisionRisk::Risky
	}
}
