//! # StarCraft II Replay Renamer
//!
//! Selects replays by user-defined criteria, works out which side of each
//! game the operator played on, and renames the files from a template such as
//! `$uniqueID $team1 ($t1races) vs $team2 ($t2races) $map`.
//!
//! Parsing the replay format itself is left to a [`ReplayParser`]; this crate
//! ships [`JsonSidecarParser`] for records exported by an external parser.

pub mod batch;
pub mod canonical;
pub mod collision;
pub mod confirm;
pub mod context;
pub mod emit;
pub mod engine;
pub mod error;
pub mod filter;
pub mod identity;
pub mod ingest;
pub mod matchup;
pub mod paths;
pub mod record;
pub mod settings;
pub mod template;

// Re-export main API types
pub use batch::{BatchConfig, BatchContext, BatchProgress, BatchReport, CollisionPolicy};
pub use collision::CollisionRisk;
pub use confirm::{AlwaysNo, AlwaysYes, Confirm, Decision, Override};
pub use emit::{Emitter, FileOperation, FsEmitter};
pub use engine::{AutoRenamer, EngineCommand, EngineEvent};
pub use error::{ConfigError, IdentityError, IngestError, RenameError, RenameResult};
pub use filter::FilterCriteria;
pub use identity::{IdentityCandidate, IdentityCandidates};
pub use ingest::{JsonSidecarParser, ReplayDirectory, ReplayParser};
pub use matchup::Matchup;
pub use record::{Expansion, MatchRecord, Player, StableId, Team};
pub use settings::Settings;
pub use template::{Template, Variable};
