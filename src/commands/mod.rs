//! Builtin key-bound operations.
//!
//! Per spec §9's "dynamic dispatch via function pointers" redesign note,
//! handlers are represented as a flat tagged enum (`BuiltinId`) instead
//! of function pointers stored in the trie; dispatch is a `match` in
//! `Context::dispatch_builtin` (`context.rs`). Grounded on
//! original_source `src/normal.c` / `src/visual.c` /
//! `src/keys_buildin_n.c` for the operation inventory and on the
//! teacher's `modes/normal.rs` / `modes/visual.rs` parse shape
//! (register → count → verb → motion).
pub mod motions;
pub mod operators;
pub mod visual;
pub mod window;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum BuiltinId {
	// Motions (spec §4.3 "Motions"); usable standalone or as a selector
	// after an operator.
	MotionLeft,
	MotionDown,
	MotionUp,
	MotionRight,
	MotionFirstLine,
	MotionLastLine,
	MotionPercent,
	MotionWindowTop,
	MotionWindowMiddle,
	MotionWindowBottom,
	MotionGroupPrev,
	MotionGroupNext,
	MotionFindCharFwd,
	MotionFindCharBwd,
	MotionRepeatFind,
	MotionRepeatFindRev,
	MotionGotoMark,
	MotionSearchNext,
	MotionSearchPrev,
	/// Doubled-operator shorthand (`dd`, `yy`, `guu`, `gUU`): operate on
	/// `[count]` whole lines from the cursor.
	MotionWholeLineCount,

	// Operators awaiting a selector (spec §4.3 "Operators").
	OperatorDelete,
	OperatorDeletePermanent,
	OperatorYank,
	OperatorToLower,
	OperatorToUpper,

	// Put / marks (spec §4.3 "Put", "Mark set").
	PutAfter,
	PutBefore,
	MarkSet,
	MarkGoto,

	// Visual mode (spec §4.3 "Visual mode").
	EnterVisualChar,
	EnterVisualLine,
	RestoreLastVisual,
	SwapVisualAnchor,

	// Scroll primitives (spec §4.3 "Scroll primitives").
	ScrollLineDown,
	ScrollLineUp,
	ScrollHalfDown,
	ScrollHalfUp,
	ScrollPageDown,
	ScrollPageUp,
	RepositionTop,
	RepositionMiddle,
	RepositionBottom,

	// Filter primitives (spec §4.3 "Filter primitives").
	FilterToggleDotVisibility,
	FilterAddSelection,
	FilterClearName,
	FilterHideDotsAndStash,
	FilterRestorePrevious,
	FilterResetAll,

	// Window management (spec §4.3 "Window management").
	WinFocusLeft,
	WinFocusDown,
	WinFocusUp,
	WinFocusRight,
	WinFocusOther,
	WinSplitHorizontal,
	WinSplitVertical,
	WinOnly,
	WinEqualize,
	WinGrow,
	WinShrink,
	WinWiden,
	WinNarrow,
	WinMaximize,

	// History navigation (spec §4.7).
	HistoryBack,
	HistoryForward,

	// Mode transitions.
	EnterExCommandLine,
	EnterSearchForward,
	EnterSearchBackward,
	CancelToNormal,
	RepeatLastChange,

	// Command-line default handler / editing (spec §4.4), dispatched
	// through the same enum so the key engine never holds a raw
	// function pointer.
	CmdLineInsertChar,
	CmdLineDeleteCharBack,
	CmdLineDeleteCharFwd,
	CmdLineDeleteToStart,
	CmdLineDeleteWordBack,
	CmdLineDeleteToEnd,
	CmdLineWordLeft,
	CmdLineWordRight,
	CmdLineDeleteWordFwd,
	CmdLineHome,
	CmdLineEnd,
	CmdLineHistPrev,
	CmdLineHistNext,
	CmdLineHistSearchPrev,
	CmdLineHistSearchNext,
	CmdLineCompleteNext,
	CmdLineCompletePrev,
	CmdLineRewindComplete,
	CmdLineSubmit,
	CmdLineCancel,
}

/// A parsed `f{char}`/`F{char}`/`m{mark}`/`'{mark}` argument threaded
/// through `KeyInfo::multi`; kept here rather than in `key_engine` since
/// it is purely a command-interpretation concern.
#[derive(Clone, Copy, Debug, Default)]
pub struct FindState {
	pub target: Option<char>,
	pub forward: bool,
}

/// Whether `id` is a motion usable as an operator's selector argument
/// (spec §4.3: operators are "awaiting a motion"). Drives
/// `Context::dispatch_builtin`'s pending-operator combination instead
/// of a separate selector-trie lookup at dispatch time (see DESIGN.md).
pub fn is_motion(id: BuiltinId) -> bool {
	matches!(
		id,
		BuiltinId::MotionLeft
			| BuiltinId::MotionDown
			| BuiltinId::MotionUp
			| BuiltinId::MotionRight
			| BuiltinId::MotionFirstLine
			| BuiltinId::MotionLastLine
			| BuiltinId::MotionPercent
			| BuiltinId::MotionWindowTop
			| BuiltinId::MotionWindowMiddle
			| BuiltinId::MotionWindowBottom
			| BuiltinId::MotionGroupPrev
			| BuiltinId::MotionGroupNext
			| BuiltinId::MotionFindCharFwd
			| BuiltinId::MotionFindCharBwd
			| BuiltinId::MotionRepeatFind
			| BuiltinId::MotionRepeatFindRev
			| BuiltinId::MotionGotoMark
			| BuiltinId::MotionSearchNext
			| BuiltinId::MotionSearchPrev
			| BuiltinId::MotionWholeLineCount
	)
}

pub fn is_operator(id: BuiltinId) -> bool {
	matches!(
		id,
		BuiltinId::OperatorDelete
			| BuiltinId::OperatorDeletePermanent
			| BuiltinId::OperatorYank
			| BuiltinId::OperatorToLower
			| BuiltinId::OperatorToUpper
	)
}
