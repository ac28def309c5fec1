//! The file move/copy primitive

use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs;
use std::io;
use std::path::Path;
use tracing::{debug, trace};

/// What happens to the source replay
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FileOperation {
	#[default]
	Move,
	Copy,
}

impl fmt::Display for FileOperation {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			FileOperation::Move => write!(f, "move"),
			FileOperation::Copy => write!(f, "copy"),
		}
	}
}

/// Places a replay at its destination
pub trait Emitter {
	fn emit(&self, op: FileOperation, from: &Path, to: &Path) -> io::Result<()>;
}

/// Emits on the local file system
#[derive(Debug, Clone, Copy, Default)]
pub struct FsEmitter;

impl Emitter for FsEmitter {
	fn emit(&self, op: FileOperation, from: &Path, to: &Path) -> io::Result<()> {
		debug!("Emit: {} {} -> {}", op, from.display(), to.display());
		match op {
			FileOperation::Copy => fs::copy(from, to).map(|_| ()),
			FileOperation::Move => move_file(from, to),
		}
	}
}

/// Rename, falling back to copy + remove when the rename cannot cross devices
fn move_file(from: &Path, to: &Path) -> io::Result<()> {
	match fs::rename(from, to) {
		Ok(()) => Ok(()),
		Err(e) if e.kind() == io::ErrorKind::CrossesDevices => {
			trace!("Emit: {} is on another device, copying", to.display());
			fs::copy(from, to)?;
			fs::remove_file(from)
		}
		Err(e) => Err(e),
	}
}
