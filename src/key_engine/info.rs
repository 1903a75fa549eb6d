//! `KeyInfo` and `KeysInfo` — the parsed-prefix and execution-scratchpad
//! types threaded through a single `KeyEngine::execute` call.
//!
//! Grounded on original_source `src/keys.h` (`struct key_info`,
//! `struct keys_info`, `NO_COUNT_GIVEN`/`NO_REG_GIVEN`) and on the
//! teacher's count/register prefix parsing in `modes/normal.rs::try_parse`.

/// Sentinel meaning "no count was given" (vifm's `NO_COUNT_GIVEN`).
pub const NO_COUNT: usize = usize::MAX;
/// Sentinel meaning "no register was given" (vifm's `NO_REG_GIVEN`).
pub const NO_REG: char = '\0';

/// Parsed input prefix passed to a handler.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct KeyInfo {
	pub count: usize,
	pub reg: char,
	pub multi: Option<char>,
}

impl KeyInfo {
	pub fn empty() -> Self {
		Self { count: NO_COUNT, reg: NO_REG, multi: None }
	}

	pub fn has_count(&self) -> bool {
		self.count != NO_COUNT
	}

	pub fn has_reg(&self) -> bool {
		self.reg != NO_REG
	}

	/// The count to use when none was explicitly given.
	pub fn count_or(&self, default: usize) -> usize {
		if self.has_count() { self.count } else { default }
	}
}

impl Default for KeyInfo {
	fn default() -> Self {
		Self::empty()
	}
}

/// Execution scratchpad threaded through a recursive `execute` call, used
/// while resolving a selector (an operator's motion argument).
#[derive(Clone, Debug, Default)]
pub struct KeysInfo {
	/// True while a selector (operator-pending motion) is being resolved.
	pub selector: bool,
	/// Indices produced by the selector, owned by this scratchpad until
	/// the operator handler consumes them.
	pub indices: Vec<usize>,
	/// Set once a short-timeout wait collapsed to its shorter action.
	pub after_wait: bool,
	/// True when the input being processed came from a user macro
	/// expansion rather than literal user keystrokes; mapped input is
	/// not recorded into command history.
	pub mapped: bool,
}

impl KeysInfo {
	pub fn new() -> Self {
		Self::default()
	}
}
