//! The default key table.
//!
//! Grounded on original_source `src/keys_buildin_n.c`'s
//! `init_buildin_n_keys`/`init_extendet_keys` (sequential
//! `add_keys(...); curr->data.handler = ...;` registration order) for
//! Normal/Visual-mode motions and operators, and on `src/cmdline.c`'s
//! `builtin_cmds[]` for command-line editing keys. `Context::new` calls
//! `register_default_bindings` once so a freshly built engine already
//! knows every key spec §4.3/§4.4 names; user `:nnoremap`/`:cnoremap`
//! mappings layer on top of this via `KeyEngine::add_user_mapping`.
use crate::commands::BuiltinId as B;
use crate::key_engine::{FollowedBy, KeyEngine};
use crate::keys::{KeyCode, KeyEvent, ModKeys};
use crate::mode::{CmdLineKind, Mode};

fn plain(ch: &str) -> KeyEvent {
	KeyEvent::new(ch, ModKeys::NONE)
}

fn ctrl(ch: &str) -> KeyEvent {
	KeyEvent::new(ch, ModKeys::CTRL)
}

fn meta(ch: &str) -> [KeyEvent; 2] {
	[KeyEvent(KeyCode::Esc, ModKeys::NONE), plain(ch)]
}

fn code(c: KeyCode) -> KeyEvent {
	KeyEvent(c, ModKeys::NONE)
}

/// Populate `keys` with every default binding named in spec §4.3/§4.4.
pub fn register_default_bindings(keys: &mut KeyEngine) {
	register_normal(keys, Mode::Normal);
	register_normal(keys, Mode::Visual);
	register_visual_only(keys);
	register_cmdline(keys, Mode::CommandLine(CmdLineKind::Ex));
	register_cmdline(keys, Mode::CommandLine(CmdLineKind::SearchFwd));
	register_cmdline(keys, Mode::CommandLine(CmdLineKind::SearchBwd));
	register_cmdline(keys, Mode::CommandLine(CmdLineKind::Prompt));
}

/// Motions, operators, put, marks, scroll/filter/window primitives and
/// mode transitions shared by Normal and Visual mode (spec §4.3:
/// "operators executed in visual mode act on the selection").
fn register_normal(keys: &mut KeyEngine, mode: Mode) {
	let b = |keys: &mut KeyEngine, k: &str, id: B| keys.add_builtin(mode, &[plain(k)], id, FollowedBy::None);

	// Motions.
	b(keys, "h", B::MotionLeft);
	b(keys, "j", B::MotionDown);
	b(keys, "k", B::MotionUp);
	b(keys, "l", B::MotionRight);
	keys.add_builtin(mode, &[code(KeyCode::Left)], B::MotionLeft, FollowedBy::None);
	keys.add_builtin(mode, &[code(KeyCode::Down)], B::MotionDown, FollowedBy::None);
	keys.add_builtin(mode, &[code(KeyCode::Up)], B::MotionUp, FollowedBy::None);
	keys.add_builtin(mode, &[code(KeyCode::Right)], B::MotionRight, FollowedBy::None);
	keys.add_builtin(mode, &[plain("g"), plain("g")], B::MotionFirstLine, FollowedBy::None);
	b(keys, "G", B::MotionLastLine);
	b(keys, "H", B::MotionWindowTop);
	b(keys, "M", B::MotionWindowMiddle);
	b(keys, "L", B::MotionWindowBottom);
	b(keys, "%", B::MotionPercent);
	b(keys, "(", B::MotionGroupPrev);
	b(keys, ")", B::MotionGroupNext);
	keys.add_builtin(mode, &[plain("f")], B::MotionFindCharFwd, FollowedBy::MultiKey);
	keys.add_builtin(mode, &[plain("F")], B::MotionFindCharBwd, FollowedBy::MultiKey);
	b(keys, ",", B::MotionRepeatFindRev);
	b(keys, ";", B::MotionRepeatFind);
	keys.add_builtin(mode, &[plain("'")], B::MotionGotoMark, FollowedBy::MultiKey);
	b(keys, "n", B::MotionSearchNext);
	b(keys, "N", B::MotionSearchPrev);
	// `guu`/`gUU`: the doubled form repeats the trailing case-change
	// letter, not the whole operator (see DESIGN.md); bound bare so the
	// ordinary operator+motion combination in `Context::dispatch_builtin`
	// handles it with no special-casing.
	b(keys, "u", B::MotionWholeLineCount);
	b(keys, "U", B::MotionWholeLineCount);

	// Operators (bare; doubling is recognised at the dispatch layer, not
	// via a literal "dd"/"yy" trie path — see DESIGN.md).
	keys.add_builtin(mode, &[plain("d")], B::OperatorDelete, FollowedBy::Selector);
	b(keys, "D", B::OperatorDeletePermanent);
	keys.add_builtin(mode, &[plain("y")], B::OperatorYank, FollowedBy::Selector);
	keys.add_builtin(mode, &[plain("g"), plain("u")], B::OperatorToLower, FollowedBy::Selector);
	keys.add_builtin(mode, &[plain("g"), plain("U")], B::OperatorToUpper, FollowedBy::Selector);

	// Put / marks.
	b(keys, "p", B::PutAfter);
	b(keys, "P", B::PutBefore);
	keys.add_builtin(mode, &[plain("m")], B::MarkSet, FollowedBy::MultiKey);

	// Scroll primitives.
	b(keys, "\x05", B::ScrollLineDown); // Ctrl-E
	b(keys, "\x19", B::ScrollLineUp); // Ctrl-Y
	b(keys, "\x04", B::ScrollHalfDown); // Ctrl-D
	b(keys, "\x15", B::ScrollHalfUp); // Ctrl-U
	b(keys, "\x06", B::ScrollPageDown); // Ctrl-F
	b(keys, "\x02", B::ScrollPageUp); // Ctrl-B
	keys.add_builtin(mode, &[plain("z"), plain("t")], B::RepositionTop, FollowedBy::None);
	keys.add_builtin(mode, &[plain("z"), plain("z")], B::RepositionMiddle, FollowedBy::None);
	keys.add_builtin(mode, &[plain("z"), plain("b")], B::RepositionBottom, FollowedBy::None);

	// Filter primitives.
	keys.add_builtin(mode, &[plain("z"), plain("m")], B::FilterToggleDotVisibility, FollowedBy::None);
	keys.add_builtin(mode, &[plain("z"), plain("o")], B::FilterToggleDotVisibility, FollowedBy::None);
	keys.add_builtin(mode, &[plain("z"), plain("a")], B::FilterToggleDotVisibility, FollowedBy::None);
	keys.add_builtin(mode, &[plain("z"), plain("f")], B::FilterAddSelection, FollowedBy::None);
	keys.add_builtin(mode, &[plain("z"), plain("O")], B::FilterClearName, FollowedBy::None);
	keys.add_builtin(mode, &[plain("z"), plain("M")], B::FilterHideDotsAndStash, FollowedBy::None);
	keys.add_builtin(mode, &[plain("z"), plain("r")], B::FilterRestorePrevious, FollowedBy::None);
	keys.add_builtin(mode, &[plain("z"), plain("R")], B::FilterResetAll, FollowedBy::None);

	// Window management (Ctrl-W prefix).
	let w = |keys: &mut KeyEngine, k: &str, id: B| {
		keys.add_builtin(mode, &[ctrl("\x17"), plain(k)], id, FollowedBy::None);
	};
	w(keys, "h", B::WinFocusLeft);
	w(keys, "j", B::WinFocusDown);
	w(keys, "k", B::WinFocusUp);
	w(keys, "l", B::WinFocusRight);
	w(keys, "w", B::WinFocusOther);
	w(keys, "o", B::WinOnly);
	w(keys, "s", B::WinSplitHorizontal);
	w(keys, "v", B::WinSplitVertical);
	w(keys, "=", B::WinEqualize);
	w(keys, "<", B::WinNarrow);
	w(keys, ">", B::WinWiden);
	w(keys, "+", B::WinGrow);
	w(keys, "-", B::WinShrink);
	w(keys, "|", B::WinMaximize);
	w(keys, "_", B::WinMaximize);

	// History navigation (spec §4.7). Ctrl-I and Tab share one byte
	// (0x09) on any real terminal, so this is unambiguous.
	b(keys, "\x0f", B::HistoryBack); // Ctrl-O
	b(keys, "\x09", B::HistoryForward); // Ctrl-I

	// Mode transitions.
	b(keys, ":", B::EnterExCommandLine);
	b(keys, "/", B::EnterSearchForward);
	b(keys, "?", B::EnterSearchBackward);
	keys.add_builtin(mode, &[code(KeyCode::Esc)], B::CancelToNormal, FollowedBy::None);
	b(keys, ".", B::RepeatLastChange);

	// Visual mode entry (from Normal) / anchor restore.
	b(keys, "v", B::EnterVisualChar);
	b(keys, "V", B::EnterVisualLine);
	keys.add_builtin(mode, &[plain("g"), plain("v")], B::RestoreLastVisual, FollowedBy::None);
}

/// Bindings that only make sense once already inside Visual mode.
fn register_visual_only(keys: &mut KeyEngine) {
	keys.add_builtin(Mode::Visual, &[plain("O")], B::SwapVisualAnchor, FollowedBy::None);
}

/// Command-line sub-mode line editing (spec §4.4), shared by the Ex,
/// search and prompt sub-modes. `CmdLineInsertChar` is the default
/// handler rather than a trie entry, since any printable key not
/// matched below must insert literally.
fn register_cmdline(keys: &mut KeyEngine, mode: Mode) {
	keys.set_default_handler(mode, B::CmdLineInsertChar);

	let b = |keys: &mut KeyEngine, k: &str, id: B| keys.add_builtin(mode, &[ctrl(k)], id, FollowedBy::None);

	b(keys, "\x08", B::CmdLineDeleteCharBack); // Ctrl-H / Backspace (same KeyEvent)
	b(keys, "\x04", B::CmdLineDeleteCharFwd); // Ctrl-D
	keys.add_builtin(mode, &[code(KeyCode::Delete)], B::CmdLineDeleteCharFwd, FollowedBy::None);
	b(keys, "\x15", B::CmdLineDeleteToStart); // Ctrl-U
	b(keys, "\x17", B::CmdLineDeleteWordBack); // Ctrl-W
	b(keys, "\x0b", B::CmdLineDeleteToEnd); // Ctrl-K
	keys.add_builtin(mode, &meta("b"), B::CmdLineWordLeft, FollowedBy::None);
	keys.add_builtin(mode, &meta("f"), B::CmdLineWordRight, FollowedBy::None);
	keys.add_builtin(mode, &meta("d"), B::CmdLineDeleteWordFwd, FollowedBy::None);
	b(keys, "\x01", B::CmdLineHome); // Ctrl-A
	keys.add_builtin(mode, &[code(KeyCode::Home)], B::CmdLineHome, FollowedBy::None);
	b(keys, "\x05", B::CmdLineEnd); // Ctrl-E
	keys.add_builtin(mode, &[code(KeyCode::End)], B::CmdLineEnd, FollowedBy::None);

	keys.add_builtin(mode, &[code(KeyCode::Tab)], B::CmdLineCompleteNext, FollowedBy::None);
	keys.add_builtin(mode, &[code(KeyCode::BackTab)], B::CmdLineCompletePrev, FollowedBy::None);
	b(keys, "\x1f", B::CmdLineRewindComplete); // Ctrl-_

	b(keys, "\x10", B::CmdLineHistPrev); // Ctrl-P
	b(keys, "\x0e", B::CmdLineHistNext); // Ctrl-N
	keys.add_builtin(mode, &[code(KeyCode::Up)], B::CmdLineHistSearchPrev, FollowedBy::None);
	keys.add_builtin(mode, &[code(KeyCode::Down)], B::CmdLineHistSearchNext, FollowedBy::None);

	keys.add_builtin(mode, &[code(KeyCode::Enter)], B::CmdLineSubmit, FollowedBy::None);
	b(keys, "\x03", B::CmdLineCancel); // Ctrl-C
	keys.add_builtin(mode, &[code(KeyCode::Esc)], B::CmdLineCancel, FollowedBy::None);
}
