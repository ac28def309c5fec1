//! Operator confirmation seam
//!
//! The engine never prompts on its own. Every yes/no question it needs is
//! put to a [`Confirm`] implementation: the CLI reads stdin, tests and
//! unattended runs answer with a fixed [`AlwaysYes`] or [`AlwaysNo`].

use std::fmt;
use std::path::PathBuf;

use crate::record::StableId;

/// A safety check the operator may choose to override
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Override {
	/// Copying into the folder the replays already live in
	SameDirectoryCopy,
	/// Template that can give distinct replays the same name
	RiskyTemplate,
}

impl fmt::Display for Override {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			Override::SameDirectoryCopy => write!(f, "copy into the source folder"),
			Override::RiskyTemplate => write!(f, "template may produce duplicate names"),
		}
	}
}

/// A question put to the operator
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Decision {
	RiskyTemplate { template: String },
	SameDirectoryCopy { folder: PathBuf },
	/// "Is this you?" during player detection
	IdentityCandidate { name: String, id: StableId },
	/// Whether an auto-renamer should also rename replays that already exist
	RenameExisting { count: usize },
}

impl Decision {
	/// The override this question guards, if it is one
	pub fn guards(&self) -> Option<Override> {
		match self {
			Decision::RiskyTemplate { .. } => Some(Override::RiskyTemplate),
			Decision::SameDirectoryCopy { .. } => Some(Override::SameDirectoryCopy),
			_ => None,
		}
	}
}

impl fmt::Display for Decision {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			Decision::RiskyTemplate { template } => write!(
				f,
				"Template '{template}' uses neither $uniqueID, $currentname nor $hour/$min/$sec, \
				 so different replays may get the same name. Continue?"
			),
			Decision::SameDirectoryCopy { folder } => write!(
				f,
				"Source and destination are both {}. Copying will duplicate every replay there. Continue?",
				folder.display()
			),
			Decision::IdentityCandidate { name, id } => {
				write!(f, "Is {name} (id {id}) your account?")
			}
			Decision::RenameExisting { count } => {
				write!(f, "Rename the {count} replays already in the folder too?")
			}
		}
	}
}

/// Answers yes/no questions on behalf of the operator
pub trait Confirm {
	fn confirm(&self, decision: &Decision) -> bool;
}

impl<F> Confirm for F
where
	F: Fn(&Decision) -> bool,
{
	fn confirm(&self, decision: &Decision) -> bool {
		self(decision)
	}
}

/// Accepts everything (`--yes`)
#[derive(Debug, Clone, Copy, Default)]
pub struct AlwaysYes;

impl Confirm for AlwaysYes {
	fn confirm(&self, _: &Decision) -> bool {
		true
	}
}

/// Declines everything
#[derive(Debug, Clone, Copy, Default)]
pub struct AlwaysNo;

impl Confirm for AlwaysNo {
	fn confirm(&self, _: &Decision) -> bool {
		false
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test_log::test]
	fn test_fixed_answers() {
		let d = Decision::RenameExisting { count: 3 };
		assert!(AlwaysYes.confirm(&d));
		assert!(!AlwaysNo.confirm(&d));
	}

	#[test_log::test]
	fn test_closures_confirm() {
		let only_identity = |d: &Decision| matches!(d, Decision::IdentityCandidate { .. });
		assert!(only_identity.confirm(&Decision::IdentityCandidate {
			name: "Serral".into(),
			id: 1
		}));
		assert!(!only_identity.confirm(&Decision::RiskyTemplate {
			template: "$map".into()
		}));
	}

	#[test_log::test]
	fn test_guards() {
		assert_eq!(
			Decision::SameDirectoryCopy { folder: "/r".into() }.guards(),
			Some(Override::SameDirectoryCopy)
		);
		assert_eq!(Decision::RenameExisting { count: 0 }.guards(), None);
	}
}
