//! Mode state machine.
//!
//! Grounded on the teacher's `ViMode` trait / `ModeReport` enum
//! (`src/modes/mod.rs`) and original_source `src/modes.c`, generalized
//! from a single-buffer text editor's modes to the file manager's modes
//! named in spec §3.
use bitflags::bitflags;

bitflags! {
	/// Which optional prefixes/suffixes a mode's key engine trie consumes.
	/// Mirrors vifm's `MF_USES_REGS`/`MF_USES_COUNT`/`MF_USES_INPUT`
	/// (original_source `src/keys.h`).
	#[derive(Clone, Copy, Debug, PartialEq, Eq)]
	pub struct ModeFlags: u8 {
		const USES_REGS  = 1 << 0;
		const USES_COUNT = 1 << 1;
		const USES_INPUT = 1 << 2;
	}
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum CmdLineKind {
	Ex,
	MenuEx,
	SearchFwd,
	SearchBwd,
	MenuSearchFwd,
	MenuSearchBwd,
	VisualSearchFwd,
	VisualSearchBwd,
	Prompt,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Mode {
	Normal,
	CommandLine(CmdLineKind),
	Visual,
	Menu,
	Sort,
	ChangeDialog,
	AttrDialog,
	FileInfo,
	View,
}

impl Mode {
	pub fn flags(self) -> ModeFlags {
		match self {
			Mode::Normal => ModeFlags::USES_REGS | ModeFlags::USES_COUNT | ModeFlags::USES_INPUT,
			Mode::Visual => ModeFlags::USES_REGS | ModeFlags::USES_COUNT | ModeFlags::USES_INPUT,
			Mode::CommandLine(_) => ModeFlags::USES_INPUT,
			Mode::Menu => ModeFlags::USES_COUNT | ModeFlags::USES_INPUT,
			Mode::Sort | Mode::ChangeDialog | Mode::AttrDialog | Mode::FileInfo | Mode::View => {
				ModeFlags::USES_INPUT
			}
		}
	}

	/// All modes the key engine needs trie tables for; used to drive
	/// `KeyEngine::register_mode` at startup.
	pub const ALL: &'static [Mode] = &[
		Mode::Normal,
		Mode::Visual,
		Mode::CommandLine(CmdLineKind::Ex),
		Mode::CommandLine(CmdLineKind::SearchFwd),
		Mode::CommandLine(CmdLineKind::SearchBwd),
		Mode::CommandLine(CmdLineKind::Prompt),
		Mode::Menu,
		Mode::Sort,
		Mode::ChangeDialog,
		Mode::AttrDialog,
		Mode::FileInfo,
		Mode::View,
	];
}

/// Tracks the active mode and a stack of suspended modes, so that e.g.
/// `:` entered from visual mode returns to visual mode once the
/// ex-command completes (spec §4.2).
#[derive(Debug, Default)]
pub struct ModeManager {
	current: Mode_,
	stack: Vec<Mode_>,
}

// `Mode` itself has no meaningful default; track it as an Option
// internally so `ModeManager` can still derive `Default`.
#[derive(Debug, Clone, Copy)]
struct Mode_(Mode);

impl Default for Mode_ {
	fn default() -> Self {
		Mode_(Mode::Normal)
	}
}

impl ModeManager {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn current(&self) -> Mode {
		self.current.0
	}

	pub fn set(&mut self, mode: Mode) {
		self.current = Mode_(mode);
	}

	/// Push the current mode and switch to a sub-mode (e.g. entering
	/// `:` from visual mode).
	pub fn enter_submode(&mut self, mode: Mode) {
		self.stack.push(self.current);
		self.current = Mode_(mode);
	}

	/// Pop back to the mode that was active before the most recent
	/// `enter_submode`, if any; otherwise fall back to Normal.
	pub fn leave_submode(&mut self) {
		self.current = self.stack.pop().unwrap_or_default();
	}

	pub fn stack_depth(&self) -> usize {
		self.stack.len()
	}
}
