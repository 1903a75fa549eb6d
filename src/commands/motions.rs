//! Motion resolution: turn a `BuiltinId` + count into a target index in
//! the active pane, or (for text-under-cursor moves) an index range.
//!
//! Grounded on original_source `src/normal.c` (motion command bodies:
//! `cmd_j`, `cmd_k`, `cmd_gg`, `cmd_percent`, `find_goto`) and the
//! teacher's count-normalization idiom (`ViCmd::normalize_counts`).
use super::{BuiltinId, FindState};
use crate::pane::Pane;

/// Resolve a motion to a target `list_pos`. Returns `None` when the
/// motion cannot move (e.g. `j` at the last entry, or `f{char}` with no
/// match).
pub fn resolve(
	pane: &Pane,
	id: BuiltinId,
	count: usize,
	multi: Option<char>,
	find_state: &mut FindState,
	as_selector: bool,
) -> Option<usize> {
	let rows = pane.list_rows();
	if rows == 0 {
		return None;
	}
	let cur = pane.list_pos;
	let last = rows - 1;
	match id {
		BuiltinId::MotionUp => Some(cur.saturating_sub(count.max(1))),
		BuiltinId::MotionDown => Some((cur + count.max(1)).min(last)),
		BuiltinId::MotionLeft | BuiltinId::MotionRight => Some(cur),
		BuiltinId::MotionFirstLine => Some(0),
		BuiltinId::MotionLastLine => Some(last),
		BuiltinId::MotionPercent => {
			let pct = count.clamp(1, 100);
			Some(((pct * rows).div_ceil(100)).saturating_sub(1).min(last))
		}
		BuiltinId::MotionWindowTop => Some(pane.top_line.min(last)),
		BuiltinId::MotionWindowMiddle => {
			let visible = pane.window_rows.min(rows - pane.top_line);
			Some((pane.top_line + visible / 2).min(last))
		}
		BuiltinId::MotionWindowBottom => {
			let visible = pane.window_rows.min(rows - pane.top_line);
			Some((pane.top_line + visible.saturating_sub(1)).min(last))
		}
		BuiltinId::MotionGroupPrev => group_boundary(pane, cur, false),
		BuiltinId::MotionGroupNext => group_boundary(pane, cur, true),
		BuiltinId::MotionFindCharFwd | BuiltinId::MotionFindCharBwd => {
			let forward = matches!(id, BuiltinId::MotionFindCharFwd);
			let target = multi.or(find_state.target)?;
			find_state.target = Some(target);
			find_state.forward = forward;
			find_char(pane, cur, target, forward, as_selector)
		}
		BuiltinId::MotionRepeatFind => find_char(pane, cur, find_state.target?, find_state.forward, as_selector),
		BuiltinId::MotionRepeatFindRev => {
			find_char(pane, cur, find_state.target?, !find_state.forward, as_selector)
		}
		BuiltinId::MotionWholeLineCount => Some((cur + count.saturating_sub(1)).min(last)),
		_ => None,
	}
}

/// `(`/`)`: jump to the previous/next boundary between entries that
/// share the same value under the pane's primary sort key.
fn group_boundary(pane: &Pane, cur: usize, forward: bool) -> Option<usize> {
	let rows = pane.list_rows();
	let key_of = |i: usize| pane.entries[i].kind;
	if forward {
		let mut i = cur;
		while i + 1 < rows && key_of(i + 1) == key_of(cur) {
			i += 1;
		}
		if i + 1 < rows { Some(i + 1) } else { None }
	} else {
		let mut i = cur;
		while i > 0 && key_of(i - 1) == key_of(cur) {
			i -= 1;
		}
		if i > 0 { Some(i - 1) } else { None }
	}
}

/// Horizontal find-in-filename. Wraps around when used as a plain
/// normal-mode motion; does not wrap when resolving as a selector
/// (spec §4.3 "Motions").
fn find_char(pane: &Pane, cur: usize, target: char, forward: bool, as_selector: bool) -> Option<usize> {
	let rows = pane.list_rows();
	if forward {
		for offset in 1..rows {
			let i = (cur + offset) % rows;
			if i < cur && as_selector {
				break;
			}
			if pane.entries[i].name.starts_with(target) {
				return Some(i);
			}
		}
	} else {
		for offset in 1..rows {
			let i = (cur + rows - offset) % rows;
			if i > cur && as_selector {
				break;
			}
			if pane.entries[i].name.starts_with(target) {
				return Some(i);
			}
		}
	}
	None
}
