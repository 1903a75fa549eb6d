//! Error taxonomy for the core.
//!
//! `InputRejected` deliberately has no variant here: an unmatched key
//! sequence is `key_engine::ExecStatus::Unknown`, handled by the mode's
//! default handler, and never surfaces as a `VifmError`.
use std::path::PathBuf;

#[derive(thiserror::Error, Debug)]
pub enum VifmError {
	#[error("operation refused: {0}")]
	OperationRefused(String),

	#[error("confirmation required: {0}")]
	ConfirmationRequired(String),

	#[error("i/o error at {path}: {source}")]
	TransientIo {
		path: PathBuf,
		#[source]
		source: std::io::Error,
	},

	#[error("fatal: {0}")]
	FatalInit(String),
}

impl VifmError {
	pub fn transient_io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
		Self::TransientIo { path: path.into(), source }
	}
}

pub type VifmResult<T> = Result<T, VifmError>;

/// How much the main loop is allowed to disturb the status line after a
/// handler runs. Mirrors vifm's `save_msg` return convention.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub enum StatusPersistence {
	/// Status bar may be cleared on the next keystroke.
	Clearable,
	/// Status message must be preserved until explicitly replaced.
	Preserved,
	/// Multi-line message; must not be overwritten until the user acknowledges it.
	Blocking,
}

impl Default for StatusPersistence {
	fn default() -> Self {
		Self::Clearable
	}
}
