//! The root application state (spec §9 redesign note: "one root
//! `Context` struct owns both panes, the mode manager, the key engine,
//! and the collaborator handles, instead of the global `curr_view`/
//! `other_view` pointers the original swaps on pane focus").
//!
//! Grounded on the teacher's top-level `ViCut` struct in (removed)
//! `exec.rs`, which played the analogous "owns everything, dispatches
//! one key at a time" role for a single-buffer editor; generalized here
//! to two panes plus the file-manager command set.
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use log::{error, info, warn};

use crate::bindings::register_default_bindings;
use crate::bookmarks::Bookmarks;
use crate::cmdline::{CmdHistory, CmdLineState};
use crate::collaborators::{ChildProcesses, ExternalCommands, Filesystem, JobReaper, MountHelper, Renderer};
use crate::commands::visual::{apply_selection, VisualKind, VisualState};
use crate::commands::window::Layout;
use crate::commands::{motions, operators, BuiltinId, FindState};
use crate::config::Options;
use crate::error::{StatusPersistence, VifmError, VifmResult};
use crate::ex::UserCommandTable;
use crate::key_engine::{ActionOutcome, ExecStatus, KeyEngine, KeyInfo};
use crate::mode::{CmdLineKind, Mode, ModeManager};
use crate::pane::{Entry, Pane};
use crate::register::{RegisterName, Registers};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PaneSide {
	Left,
	Right,
}

impl PaneSide {
	pub fn other(self) -> Self {
		match self {
			PaneSide::Left => PaneSide::Right,
			PaneSide::Right => PaneSide::Left,
		}
	}
}

/// Trait-object bundle for everything outside this crate's scope (spec
/// §1/§6). Borrowed for the duration of a single dispatch rather than
/// stored on `Context`, so `Context` itself stays a plain, testable
/// value type.
pub struct Collaborators<'a> {
	pub renderer: &'a mut dyn Renderer,
	pub fs: &'a mut dyn Filesystem,
	pub jobs: &'a mut dyn ChildProcesses,
	pub mount: &'a mut dyn MountHelper,
	pub reaper: &'a mut dyn JobReaper,
	pub externals: &'a mut dyn ExternalCommands,
}

struct PendingOperator {
	id: BuiltinId,
	key_info: KeyInfo,
}

pub struct Context {
	pub left: Pane,
	pub right: Pane,
	pub active: PaneSide,
	pub mode: ModeManager,
	pub keys: KeyEngine,
	pub registers: Registers,
	pub bookmarks: Bookmarks,
	pub options: Options,
	pub layout: Layout,
	pub find_state: FindState,
	pub visual: Option<VisualState>,
	pub cmdline: Option<CmdLineState>,
	pub ex_history: CmdHistory,
	pub search_history: CmdHistory,
	pub prompt_history: CmdHistory,
	pub user_commands: UserCommandTable,
	pub last_search_pattern: Option<String>,
	pub trash_dir: PathBuf,
	pending_operator: Option<PendingOperator>,
	pub status_message: Option<(String, StatusPersistence)>,
	/// Set by `:quit`/`:q`; the core has no process lifetime of its own
	/// (spec §1 puts the event loop outside this crate's scope), so the
	/// binary target polls this flag to know when to stop.
	pub should_quit: bool,
}

impl Context {
	pub fn new(left_dir: PathBuf, right_dir: PathBuf, window_rows: usize, history_len: usize, trash_dir: PathBuf) -> Self {
		let mut left = Pane::new(left_dir, window_rows);
		let mut right = Pane::new(right_dir, window_rows);
		left.history = crate::history::PaneHistory::new(history_len);
		right.history = crate::history::PaneHistory::new(history_len);

		let mut keys = KeyEngine::new();
		for &mode in Mode::ALL {
			keys.register_mode(mode, mode.flags());
		}
		register_default_bindings(&mut keys);

		Self {
			left,
			right,
			active: PaneSide::Left,
			mode: ModeManager::new(),
			keys,
			registers: Registers::new(),
			bookmarks: Bookmarks::new(),
			options: Options::default(),
			layout: Layout::default(),
			find_state: FindState::default(),
			visual: None,
			cmdline: None,
			ex_history: CmdHistory::new(history_len),
			search_history: CmdHistory::new(history_len),
			prompt_history: CmdHistory::new(history_len),
			user_commands: UserCommandTable::new(),
			last_search_pattern: None,
			trash_dir,
			pending_operator: None,
			status_message: None,
			should_quit: false,
		}
	}

	pub fn active_pane(&self) -> &Pane {
		match self.active {
			PaneSide::Left => &self.left,
			PaneSide::Right => &self.right,
		}
	}

	pub fn active_pane_mut(&mut self) -> &mut Pane {
		match self.active {
			PaneSide::Left => &mut self.left,
			PaneSide::Right => &mut self.right,
		}
	}

	pub fn other_pane(&self) -> &Pane {
		match self.active {
			PaneSide::Left => &self.right,
			PaneSide::Right => &self.left,
		}
	}

	fn set_status(&mut self, msg: impl Into<String>, persistence: StatusPersistence) {
		self.status_message = Some((msg.into(), persistence));
	}

	/// Load (or reload) the active pane's directory listing using the
	/// `Filesystem` collaborator (spec §4.6 "Directory load").
	pub fn reload_active_pane(&mut self, fs: &dyn Filesystem, reload: bool) -> VifmResult<()> {
		let dir = self.active_pane().dir.clone();
		let accessible = |p: &Path| fs.list_dir(p).is_ok();
		let dir = crate::pane::nearest_accessible_ancestor(&dir, accessible)?;
		let raw = fs.list_dir(&dir).map_err(|e| VifmError::transient_io(dir.clone(), e))?;
		let mtime = fs.stat_mtime(&dir).unwrap_or(SystemTime::UNIX_EPOCH);
		let entries: Vec<Entry> = raw.into_iter().map(Entry::from).collect();
		let pane = self.active_pane_mut();
		pane.dir = dir.clone();
		pane.load_dir_list(entries, mtime, reload);
		crate::env::set_pwd(&dir);
		Ok(())
	}

	/// Process one completed `ExecStatus` from `KeyEngine::execute`,
	/// dispatching `Ok` outcomes and translating `Unknown`/`Wait` into
	/// no-ops for the caller's event loop (spec §4.1's three-way split
	/// kept explicit rather than collapsed here).
	pub fn handle_exec_status(&mut self, status: ExecStatus, collab: &mut Collaborators<'_>) -> VifmResult<()> {
		match status {
			ExecStatus::Ok(outcome) | ExecStatus::DefaultHandlerReturn(outcome) => self.handle_outcome(outcome, collab),
			ExecStatus::Unknown => {
				warn!("context: no binding for the given key sequence");
				Ok(())
			}
			ExecStatus::Wait | ExecStatus::WaitShort => Ok(()),
		}
	}

	fn handle_outcome(&mut self, outcome: ActionOutcome, collab: &mut Collaborators<'_>) -> VifmResult<()> {
		match outcome {
			ActionOutcome::Action { id, key_info, .. } => self.dispatch_builtin(id, key_info, collab),
			ActionOutcome::Macro(actions) => {
				for a in actions {
					self.handle_outcome(a, collab)?;
				}
				Ok(())
			}
			ActionOutcome::DefaultInsert(key) => {
				self.insert_default(key);
				Ok(())
			}
		}
	}

	fn insert_default(&mut self, key: crate::keys::KeyEvent) {
		use crate::keys::KeyCode;
		if let Some(cmdline) = self.cmdline.as_mut() {
			match key.0 {
				KeyCode::Char(c) => cmdline.insert_char(&c.to_string()),
				KeyCode::Grapheme(g) => cmdline.insert_char(&g),
				_ => {}
			}
		}
	}

	/// Central dispatch for every `BuiltinId` (spec §9 "dispatch is a
	/// `match` over `BuiltinId`").
	fn dispatch_builtin(&mut self, id: BuiltinId, key_info: KeyInfo, collab: &mut Collaborators<'_>) -> VifmResult<()> {
		if let Some(pending) = self.pending_operator.take() {
			if crate::commands::is_motion(id) {
				return self.finish_operator(pending, id, key_info, collab);
			}
			if id == pending.id && crate::commands::is_operator(id) {
				// Doubled operator shorthand (`dd`, `yy`): repeating the
				// operator key operates on `[count]` whole lines from the
				// cursor (spec §4.3 "Doubled operator").
				return self.finish_operator(pending, BuiltinId::MotionWholeLineCount, key_info, collab);
			}
			// Any other non-motion key cancels a pending operator, matching
			// vifm's behaviour of aborting `d`+unrelated-key.
			self.set_status("operator cancelled", StatusPersistence::Clearable);
		}

		if crate::commands::is_operator(id) {
			if self.mode.current() == Mode::Visual {
				return self.apply_operator_to_visual(id, key_info, collab);
			}
			self.pending_operator = Some(PendingOperator { id, key_info });
			return Ok(());
		}

		if crate::commands::is_motion(id) {
			return self.apply_motion(id, key_info, collab);
		}

		match id {
			BuiltinId::PutAfter | BuiltinId::PutBefore => self.do_put(id, key_info, collab),
			BuiltinId::MarkSet => self.do_mark_set(key_info),
			BuiltinId::MarkGoto => self.do_mark_goto(key_info, collab),
			BuiltinId::EnterVisualChar => self.enter_visual(VisualKind::Char),
			BuiltinId::EnterVisualLine => self.enter_visual(VisualKind::Line),
			BuiltinId::RestoreLastVisual => self.enter_visual(VisualKind::Char),
			BuiltinId::SwapVisualAnchor => {
				if let Some(v) = self.visual.as_mut() {
					v.swap_anchor(self.active_pane().list_pos);
				}
				Ok(())
			}
			BuiltinId::ScrollLineDown => self.scroll(1),
			BuiltinId::ScrollLineUp => self.scroll(-1),
			BuiltinId::ScrollHalfDown => self.scroll_by_window(1, 2),
			BuiltinId::ScrollHalfUp => self.scroll_by_window(-1, 2),
			BuiltinId::ScrollPageDown => self.scroll_by_window(1, 1),
			BuiltinId::ScrollPageUp => self.scroll_by_window(-1, 1),
			BuiltinId::RepositionTop => self.reposition(0),
			BuiltinId::RepositionMiddle => {
				let rows = self.active_pane().window_rows;
				self.reposition((rows / 2) as isize)
			}
			BuiltinId::RepositionBottom => {
				let rows = self.active_pane().window_rows;
				self.reposition(rows.saturating_sub(1) as isize)
			}
			BuiltinId::FilterToggleDotVisibility => {
				let pane = self.active_pane_mut();
				pane.filter.hide_dot = !pane.filter.hide_dot;
				Ok(())
			}
			BuiltinId::FilterAddSelection => {
				self.active_pane_mut().add_selection_to_filter();
				Ok(())
			}
			BuiltinId::FilterClearName => {
				self.active_pane_mut().clear_name_filter();
				Ok(())
			}
			BuiltinId::FilterHideDotsAndStash => {
				self.active_pane_mut().hide_dots_and_stash_filter();
				Ok(())
			}
			BuiltinId::FilterRestorePrevious => {
				let pane = self.active_pane_mut();
				if let Some(prev) = pane.filter.previous.take() {
					pane.filter = *prev;
				} else {
					pane.filter.hide_dot = false;
				}
				Ok(())
			}
			BuiltinId::FilterResetAll => {
				self.active_pane_mut().reset_filter();
				Ok(())
			}
			BuiltinId::WinFocusLeft | BuiltinId::WinFocusRight | BuiltinId::WinFocusUp | BuiltinId::WinFocusDown => {
				self.active = self.active.other();
				Ok(())
			}
			BuiltinId::WinFocusOther => {
				self.active = self.active.other();
				self.layout.focus_other();
				Ok(())
			}
			BuiltinId::WinSplitHorizontal => {
				self.layout.orientation = crate::commands::window::Orientation::Horizontal;
				Ok(())
			}
			BuiltinId::WinSplitVertical => {
				self.layout.orientation = crate::commands::window::Orientation::Vertical;
				Ok(())
			}
			BuiltinId::WinOnly => {
				self.layout.hide_other();
				Ok(())
			}
			BuiltinId::WinEqualize => {
				self.layout.equalize();
				Ok(())
			}
			BuiltinId::WinGrow => {
				self.layout.grow(key_info.count_or(1) as u8);
				Ok(())
			}
			BuiltinId::WinShrink => {
				self.layout.shrink(key_info.count_or(1) as u8);
				Ok(())
			}
			BuiltinId::WinWiden | BuiltinId::WinNarrow => Ok(()),
			BuiltinId::WinMaximize => {
				self.layout.maximize();
				Ok(())
			}
			BuiltinId::HistoryBack => self.history_step(false, collab),
			BuiltinId::HistoryForward => self.history_step(true, collab),
			BuiltinId::EnterExCommandLine => {
				self.enter_cmdline(CmdLineKind::Ex, ":");
				Ok(())
			}
			BuiltinId::EnterSearchForward => {
				self.enter_cmdline(CmdLineKind::SearchFwd, "/");
				Ok(())
			}
			BuiltinId::EnterSearchBackward => {
				self.enter_cmdline(CmdLineKind::SearchBwd, "?");
				Ok(())
			}
			BuiltinId::CancelToNormal => {
				self.visual = None;
				self.cmdline = None;
				self.mode.set(Mode::Normal);
				Ok(())
			}
			BuiltinId::RepeatLastChange => Ok(()),
			id if is_cmdline_edit(id) => self.dispatch_cmdline_edit(id, collab),
			other => {
				error!("context: unhandled builtin {other:?}");
				Ok(())
			}
		}
	}

	fn apply_motion(&mut self, id: BuiltinId, key_info: KeyInfo, collab: &mut Collaborators<'_>) -> VifmResult<()> {
		if id == BuiltinId::MotionGotoMark {
			return self.do_mark_goto(key_info, collab);
		}
		if matches!(id, BuiltinId::MotionSearchNext | BuiltinId::MotionSearchPrev) {
			let Some(pattern) = self.last_search_pattern.clone() else { return Ok(()) };
			let forward = id == BuiltinId::MotionSearchNext;
			return self.run_search(&pattern, forward);
		}
		if id == BuiltinId::MotionRight {
			return self.enter_selected_directory(collab);
		}
		if id == BuiltinId::MotionLeft {
			return self.ascend_to_parent(collab);
		}
		let pane = match self.active {
			PaneSide::Left => &self.left,
			PaneSide::Right => &self.right,
		};
		let count = key_info.count_or(1);
		let target = motions::resolve(pane, id, count, key_info.multi, &mut self.find_state, false);
		if let Some(pos) = target {
			self.move_cursor_and_sync_visual(pos);
		}
		Ok(())
	}

	/// `l`: descend into the entry under the cursor if it is a directory
	/// (spec §4.3 motion `l`, §4.6 fuse-mount note for mount-source
	/// files — that redirection is a `MountHelper` concern, not handled
	/// here). Non-directory entries are a no-op; opening them is
	/// filetype-database territory, out of scope for the core.
	fn enter_selected_directory(&mut self, collab: &mut Collaborators<'_>) -> VifmResult<()> {
		let pane = self.active_pane();
		let Some(entry) = pane.current_entry() else { return Ok(()) };
		if entry.is_parent_dir() {
			return self.ascend_to_parent(collab);
		}
		if entry.kind != crate::pane::EntryKind::Directory {
			return Ok(());
		}
		let target = pane.dir.join(&entry.name);
		self.chdir_active_pane(target, collab)
	}

	/// `h`: step up to the parent directory, leaving the cursor on the
	/// child just departed (spec §4.3 motion `h`).
	fn ascend_to_parent(&mut self, collab: &mut Collaborators<'_>) -> VifmResult<()> {
		let pane = self.active_pane();
		let Some(parent) = pane.dir.parent().map(Path::to_path_buf) else { return Ok(()) };
		let departed = pane.dir.file_name().map(|n| n.to_string_lossy().into_owned());
		self.chdir_active_pane(parent, collab)?;
		if let Some(name) = departed {
			if let Some(pos) = self.active_pane().entries.iter().position(|e| e.name == name) {
				self.active_pane_mut().move_to_list_pos(pos);
			}
		}
		Ok(())
	}

	/// Change the active pane's directory, recording the departed
	/// directory's cursor position into per-pane history before
	/// reloading (spec §4.7).
	fn chdir_active_pane(&mut self, target: PathBuf, collab: &mut Collaborators<'_>) -> VifmResult<()> {
		let pane = self.active_pane();
		let prior_file = pane.current_entry().map(|e| e.name.clone()).unwrap_or_default();
		let prior_rel_pos = pane.list_pos.saturating_sub(pane.top_line);
		let pane = self.active_pane_mut();
		pane.history.enter(target.clone(), prior_file, prior_rel_pos);
		pane.dir = target;
		self.reload_active_pane(collab.fs, false)
	}

	fn move_cursor_and_sync_visual(&mut self, pos: usize) {
		self.active_pane_mut().move_to_list_pos(pos);
		if let Some(visual) = self.visual.as_ref() {
			let range = visual.range(self.active_pane().list_pos);
			apply_selection(self.active_pane_mut(), range);
		}
	}

	fn finish_operator(&mut self, pending: PendingOperator, motion_id: BuiltinId, motion_key_info: KeyInfo, collab: &mut Collaborators<'_>) -> VifmResult<()> {
		let pane = match self.active {
			PaneSide::Left => &self.left,
			PaneSide::Right => &self.right,
		};
		let op_count = pending.key_info.count_or(1);
		let motion_count = motion_key_info.count_or(1);
		let combined_count = op_count.saturating_mul(motion_count);
		let cur = pane.list_pos;
		let target = motions::resolve(pane, motion_id, combined_count, motion_key_info.multi, &mut self.find_state, true);
		let Some(target) = target else {
			self.set_status("motion did not move", StatusPersistence::Clearable);
			return Ok(());
		};
		let reg_name = RegisterName::new(if pending.key_info.has_reg() { Some(pending.key_info.reg) } else { None });
		self.run_operator(pending.id, (cur, target), reg_name, collab)
	}

	fn apply_operator_to_visual(&mut self, id: BuiltinId, key_info: KeyInfo, collab: &mut Collaborators<'_>) -> VifmResult<()> {
		let Some(visual) = self.visual.take() else { return Ok(()) };
		let range = visual.range(self.active_pane().list_pos);
		let reg_name = RegisterName::new(if key_info.has_reg() { Some(key_info.reg) } else { None });
		self.mode.set(Mode::Normal);
		self.run_operator(id, range, reg_name, collab)
	}

	fn run_operator(&mut self, id: BuiltinId, range: (usize, usize), reg_name: RegisterName, collab: &mut Collaborators<'_>) -> VifmResult<()> {
		let confirm = self.options.confirm;
		let trash_dir = self.trash_dir.clone();
		let pane = match self.active {
			PaneSide::Left => &mut self.left,
			PaneSide::Right => &mut self.right,
		};
		let outcome = operators::apply(id, pane, range, reg_name, &mut self.registers, collab.fs, &trash_dir, confirm)?;
		match outcome {
			operators::OperatorOutcome::NeedsConfirmation(paths) => {
				self.set_status(format!("delete {} item(s) permanently? y/n", paths.len()), StatusPersistence::Preserved);
			}
			operators::OperatorOutcome::Trashed(_) | operators::OperatorOutcome::Yanked(_) | operators::OperatorOutcome::Renamed(_) => {
				info!("context: operator {id:?} completed on {range:?}");
			}
		}
		self.reload_active_pane(collab.fs, true)
	}

	fn do_put(&mut self, id: BuiltinId, key_info: KeyInfo, collab: &mut Collaborators<'_>) -> VifmResult<()> {
		let reg_name = RegisterName::new(if key_info.has_reg() { Some(key_info.reg) } else { None });
		let Some(reg) = self.registers.get(reg_name) else {
			self.set_status("register is empty", StatusPersistence::Clearable);
			return Ok(());
		};
		let sources = reg.paths().to_vec();
		if sources.is_empty() {
			self.set_status("register is empty", StatusPersistence::Clearable);
			return Ok(());
		}
		// Before/After only changes placement relative to the cursor entry
		// (handled by the caller's selection step below), not whether the
		// put is a copy or a move; that's decided by the register's
		// provenance — a delete's sources already live in the trash and
		// must be moved the rest of the way, while a yank's sources still
		// live at their original location and must be copied.
		let _ = id;
		let is_move = reg.provenance() == crate::register::Provenance::Delete;
		let dest_dir = self.active_pane().dir.clone();
		let placed = operators::put(&dest_dir, &sources, is_move, collab.fs)?;
		self.reload_active_pane(collab.fs, true)?;
		let pane = self.active_pane_mut();
		pane.clear_selection();
		for name in placed {
			pane.select_by_name(&name, true);
		}
		Ok(())
	}

	fn do_mark_set(&mut self, key_info: KeyInfo) -> VifmResult<()> {
		let Some(mark) = key_info.multi else { return Ok(()) };
		let pane = self.active_pane();
		let dir = pane.dir.clone();
		let file = pane.current_entry().map(|e| e.name.clone()).unwrap_or_default();
		self.bookmarks.set(mark, dir, file, SystemTime::now()).map_err(|e| VifmError::OperationRefused(e.to_string()))
	}

	fn do_mark_goto(&mut self, key_info: KeyInfo, collab: &mut Collaborators<'_>) -> VifmResult<()> {
		let Some(mark) = key_info.multi else { return Ok(()) };
		let Some(bookmark) = self.bookmarks.get(mark) else {
			self.set_status(format!("no such mark: {mark}"), StatusPersistence::Clearable);
			return Ok(());
		};
		let (dir, file) = (bookmark.dir.clone(), bookmark.file.clone());
		self.active_pane_mut().dir = dir;
		self.reload_active_pane(collab.fs, false)?;
		if let Some(pos) = self.active_pane().entries.iter().position(|e| e.name == file) {
			self.active_pane_mut().move_to_list_pos(pos);
		}
		Ok(())
	}

	fn enter_visual(&mut self, kind: VisualKind) -> VifmResult<()> {
		let anchor = self.active_pane().list_pos;
		self.visual = Some(VisualState::new(kind, anchor));
		self.mode.enter_submode(Mode::Visual);
		Ok(())
	}

	fn scroll(&mut self, delta: isize) -> VifmResult<()> {
		let pane = self.active_pane_mut();
		let pos = (pane.list_pos as isize + delta).clamp(0, pane.list_rows().saturating_sub(1) as isize);
		pane.move_to_list_pos(pos as usize);
		Ok(())
	}

	fn scroll_by_window(&mut self, direction: isize, divisor: isize) -> VifmResult<()> {
		let pane = self.active_pane();
		let step = (pane.window_rows as isize / divisor.max(1)).max(1);
		self.scroll(direction * step)
	}

	fn reposition(&mut self, row_in_window: isize) -> VifmResult<()> {
		let pane = self.active_pane_mut();
		let pos = (pane.top_line as isize + row_in_window).clamp(0, pane.list_rows().saturating_sub(1) as isize);
		pane.move_to_list_pos(pos as usize);
		Ok(())
	}

	/// `Ctrl-O`/`Ctrl-I`: walk the per-pane history ring without pushing a
	/// new entry (spec §4.7 "`goto_history_pos` ... suppressing further
	/// history recording").
	fn history_step(&mut self, forward: bool, collab: &mut Collaborators<'_>) -> VifmResult<()> {
		let pane = self.active_pane_mut();
		let entry = if forward { pane.history.forward() } else { pane.history.back() };
		let Some(entry) = entry.cloned() else { return Ok(()) };
		self.active_pane_mut().dir = entry.dir;
		self.reload_active_pane(collab.fs, false)?;
		let pane = self.active_pane_mut();
		let pos = pane.entries.iter().position(|e| e.name == entry.file_under_cursor).unwrap_or(0);
		pane.move_to_list_pos(pos);
		Ok(())
	}

	fn enter_cmdline(&mut self, kind: CmdLineKind, prompt: &str) {
		if self.mode.current() != Mode::Normal {
			self.mode.enter_submode(Mode::CommandLine(kind));
		} else {
			self.mode.set(Mode::CommandLine(kind));
		}
		let pane = self.active_pane();
		self.cmdline = Some(CmdLineState::new(kind, prompt, ""));
		if let Some(cl) = self.cmdline.as_mut() {
			cl.saved_top_line = Some(pane.top_line);
			cl.saved_list_pos = Some(pane.list_pos);
		}
	}

	fn dispatch_cmdline_edit(&mut self, id: BuiltinId, collab: &mut Collaborators<'_>) -> VifmResult<()> {
		let Some(cmdline) = self.cmdline.as_mut() else { return Ok(()) };
		let kind = cmdline.kind;
		match id {
			BuiltinId::CmdLineDeleteCharBack => {
				if !cmdline.delete_back() && cmdline.line().is_empty() {
					self.cmdline = None;
					self.mode.leave_submode();
				}
			}
			BuiltinId::CmdLineDeleteCharFwd => {
				cmdline.delete_fwd();
			}
			BuiltinId::CmdLineDeleteToStart => cmdline.delete_to_start(),
			BuiltinId::CmdLineDeleteToEnd => cmdline.delete_to_end(),
			BuiltinId::CmdLineDeleteWordBack => cmdline.delete_word_back(),
			BuiltinId::CmdLineDeleteWordFwd => cmdline.delete_word_fwd(),
			BuiltinId::CmdLineWordLeft => cmdline.buf.word_left(),
			BuiltinId::CmdLineWordRight => cmdline.buf.word_right(),
			BuiltinId::CmdLineHome => cmdline.buf.home(),
			BuiltinId::CmdLineEnd => cmdline.buf.end(),
			BuiltinId::CmdLineHistPrev => {
				let history = match kind {
					CmdLineKind::Ex | CmdLineKind::MenuEx => &self.ex_history,
					CmdLineKind::Prompt => &self.prompt_history,
					_ => &self.search_history,
				};
				cmdline.history_step(history, true);
			}
			BuiltinId::CmdLineHistNext => {
				let history = match kind {
					CmdLineKind::Ex | CmdLineKind::MenuEx => &self.ex_history,
					CmdLineKind::Prompt => &self.prompt_history,
					_ => &self.search_history,
				};
				cmdline.history_step(history, false);
			}
			BuiltinId::CmdLineHistSearchPrev => {
				let history = match kind {
					CmdLineKind::Ex | CmdLineKind::MenuEx => &self.ex_history,
					CmdLineKind::Prompt => &self.prompt_history,
					_ => &self.search_history,
				};
				cmdline.history_prefix_search(history, true);
			}
			BuiltinId::CmdLineHistSearchNext => {
				let history = match kind {
					CmdLineKind::Ex | CmdLineKind::MenuEx => &self.ex_history,
					CmdLineKind::Prompt => &self.prompt_history,
					_ => &self.search_history,
				};
				cmdline.history_prefix_search(history, false);
			}
			BuiltinId::CmdLineCompleteNext => {
				cmdline.complete(|_line, cursor| (cursor, Vec::new()), true);
			}
			BuiltinId::CmdLineCompletePrev => {
				cmdline.complete(|_line, cursor| (cursor, Vec::new()), false);
			}
			BuiltinId::CmdLineRewindComplete => cmdline.rewind_complete(),
			BuiltinId::CmdLineSubmit => return self.submit_cmdline(collab),
			BuiltinId::CmdLineCancel => return self.cancel_cmdline(),
			_ => {}
		}
		Ok(())
	}

	fn submit_cmdline(&mut self, collab: &mut Collaborators<'_>) -> VifmResult<()> {
		let Some(cmdline) = self.cmdline.take() else { return Ok(()) };
		let line = cmdline.line();
		self.mode.leave_submode();
		match cmdline.kind {
			CmdLineKind::Ex | CmdLineKind::MenuEx => {
				self.ex_history.push(line.clone());
				self.run_ex_command(&line, collab)
			}
			CmdLineKind::SearchFwd | CmdLineKind::SearchBwd | CmdLineKind::MenuSearchFwd | CmdLineKind::MenuSearchBwd | CmdLineKind::VisualSearchFwd | CmdLineKind::VisualSearchBwd => {
				self.search_history.push(line.clone());
				self.last_search_pattern = Some(line.clone());
				self.run_search(&line, cmdline.is_forward_search())
			}
			CmdLineKind::Prompt => {
				self.prompt_history.push(line);
				Ok(())
			}
		}
	}

	fn cancel_cmdline(&mut self) -> VifmResult<()> {
		if let Some(cmdline) = self.cmdline.take() {
			let (top, pos, _clear_hl) = cmdline.cancel(self.options.hl_search);
			if cmdline.is_search() {
				let pane = self.active_pane_mut();
				if let Some(top) = top {
					pane.top_line = top;
				}
				if let Some(pos) = pos {
					pane.move_to_list_pos(pos);
				}
			}
		}
		self.mode.leave_submode();
		Ok(())
	}

	fn run_search(&mut self, pattern: &str, forward: bool) -> VifmResult<()> {
		let re = match regex::RegexBuilder::new(pattern).case_insensitive(self.options.filter_ignore_case(pattern)).build() {
			Ok(re) => re,
			Err(e) => {
				self.set_status(format!("bad search pattern: {e}"), StatusPersistence::Preserved);
				return Ok(());
			}
		};
		let pane = self.active_pane_mut();
		let rows = pane.list_rows();
		if rows == 0 {
			return Ok(());
		}
		let cur = pane.list_pos;
		let mut found = None;
		for step in 1..=rows {
			let i = if forward { (cur + step) % rows } else { (cur + rows - step) % rows };
			if re.is_match(&pane.entries[i].name) {
				found = Some(i);
				break;
			}
		}
		for e in &mut pane.entries {
			e.search_match = re.is_match(&e.name);
		}
		if let Some(pos) = found {
			pane.move_to_list_pos(pos);
		} else {
			self.set_status(format!("pattern not found: {pattern}"), StatusPersistence::Clearable);
		}
		Ok(())
	}

	/// Run an ex-command line directly, bypassing the command-line
	/// sub-mode; used for `-c`/`+cmd` startup commands (spec §6 "CLI
	/// surface") where there is no interactive buffer to submit.
	pub fn run_ex_command(&mut self, line: &str, collab: &mut Collaborators<'_>) -> VifmResult<()> {
		let parsed = match crate::ex::parse(line) {
			Ok(p) => p,
			Err(_) => {
				self.set_status(format!("not an editor command: {line}"), StatusPersistence::Preserved);
				return Ok(());
			}
		};
		if parsed.name.is_empty() {
			if parsed.bang {
				return collab.externals.run_external_command(&parsed.raw_args, parsed.bang).map_err(|e| VifmError::transient_io(".", e));
			}
			if let Some(range) = parsed.range {
				let last = self.active_pane().list_rows().saturating_sub(1);
				let cur = self.active_pane().list_pos;
				if let Some((_, end)) = crate::ex::resolve_range(&range, cur, last, |m| self.bookmark_line(m)) {
					self.active_pane_mut().move_to_list_pos(end);
				}
			}
			return Ok(());
		}
		let Some(spec) = crate::ex::lookup(&parsed.name) else {
			self.set_status(format!("not an editor command: {}", parsed.name), StatusPersistence::Preserved);
			return Ok(());
		};
		if parsed.bang && !spec.allows_bang {
			self.set_status(format!(":{} does not accept !", spec.full), StatusPersistence::Preserved);
			return Ok(());
		}
		self.run_ex_builtin(spec.id, &parsed, collab)
	}

	fn bookmark_line(&self, mark: char) -> Option<usize> {
		let bookmark = self.bookmarks.get(mark)?;
		let pane = match self.active {
			PaneSide::Left => &self.left,
			PaneSide::Right => &self.right,
		};
		if bookmark.dir != pane.dir {
			return None;
		}
		pane.entries.iter().position(|e| e.name == bookmark.file)
	}

	fn run_ex_builtin(&mut self, id: crate::ex::ExCommandId, cmd: &crate::ex::ParsedCommand, collab: &mut Collaborators<'_>) -> VifmResult<()> {
		use crate::ex::ExCommandId as E;
		match id {
			E::Only => {
				self.layout.hide_other();
				Ok(())
			}
			E::Split => {
				self.layout.orientation = crate::commands::window::Orientation::Horizontal;
				Ok(())
			}
			E::VSplit => {
				self.layout.orientation = crate::commands::window::Orientation::Vertical;
				Ok(())
			}
			E::Delete => {
				let range = self.ex_range_or_cursor(cmd);
				let reg = RegisterName::unnamed();
				let op = if cmd.bang { BuiltinId::OperatorDeletePermanent } else { BuiltinId::OperatorDelete };
				self.run_operator(op, range, reg, collab)
			}
			E::Sort => Ok(()),
			E::Filter => {
				let pane = self.active_pane_mut();
				pane.filter.pattern = cmd.raw_args.clone();
				pane.filter.invert = cmd.bang;
				Ok(())
			}
			E::Command => {
				let mut parts = cmd.raw_args.splitn(2, ' ');
				let name = parts.next().unwrap_or_default().to_string();
				let body = parts.next().unwrap_or_default().to_string();
				self.user_commands.define(&name, &body, 0, crate::ex::NO_MAX);
				Ok(())
			}
			E::DelCommand => {
				self.user_commands.remove(cmd.raw_args.trim());
				Ok(())
			}
			E::Normal => {
				let keys: Vec<crate::keys::KeyEvent> =
					cmd.raw_args.chars().map(|c| crate::keys::KeyEvent::new(&c.to_string(), crate::keys::ModKeys::NONE)).collect();
				for key in keys {
					let status = self.keys.execute(self.mode.current(), key);
					self.handle_exec_status(status, collab)?;
				}
				Ok(())
			}
			E::Shell => collab.externals.run_external_command(&cmd.raw_args, cmd.bang).map_err(|e| VifmError::transient_io(".", e)),
			E::Quit => {
				self.should_quit = true;
				Ok(())
			}
			E::Nnoremap => self.define_user_mapping(&[Mode::Normal, Mode::Visual], cmd),
			E::Cnoremap => self.define_user_mapping(
				&[
					Mode::CommandLine(CmdLineKind::Ex),
					Mode::CommandLine(CmdLineKind::SearchFwd),
					Mode::CommandLine(CmdLineKind::SearchBwd),
					Mode::CommandLine(CmdLineKind::Prompt),
				],
				cmd,
			),
			E::Nunmap => {
				let lhs = parse_key_sequence(cmd.raw_args.trim());
				for &mode in &[Mode::Normal, Mode::Visual] {
					let _ = self.keys.remove_user_mapping(mode, &lhs);
				}
				Ok(())
			}
			E::Cunmap => {
				let lhs = parse_key_sequence(cmd.raw_args.trim());
				for &mode in &[
					Mode::CommandLine(CmdLineKind::Ex),
					Mode::CommandLine(CmdLineKind::SearchFwd),
					Mode::CommandLine(CmdLineKind::SearchBwd),
					Mode::CommandLine(CmdLineKind::Prompt),
				] {
					let _ = self.keys.remove_user_mapping(mode, &lhs);
				}
				Ok(())
			}
			E::Substitute => self.run_substitute(cmd, collab),
			E::Global => self.run_global(cmd, collab),
			E::Edit | E::Put | E::Mark | E::Marks | E::Registers | E::External => {
				info!("context: ex command {:?} acknowledged (collaborator/menu territory)", id);
				Ok(())
			}
		}
	}

	/// `:nnoremap {lhs} {rhs}` / `:cnoremap {lhs} {rhs}`: registers `lhs`
	/// as a non-recursive (`no_remap`) user mapping in every mode listed,
	/// the rhs taken verbatim as the macro text (spec §8 example 6).
	fn define_user_mapping(&mut self, modes: &[Mode], cmd: &crate::ex::ParsedCommand) -> VifmResult<()> {
		let mut parts = cmd.raw_args.splitn(2, char::is_whitespace);
		let lhs = parts.next().unwrap_or_default();
		let rhs = parts.next().unwrap_or_default().trim_start();
		if lhs.is_empty() || rhs.is_empty() {
			self.set_status("map: both {lhs} and {rhs} are required", StatusPersistence::Clearable);
			return Ok(());
		}
		let keys = parse_key_sequence(lhs);
		for &mode in modes {
			let _ = self.keys.add_user_mapping(mode, &keys, rhs, true);
		}
		Ok(())
	}

	/// `:[range]s/{pattern}/{replacement}/[g]`: renames every file whose
	/// name matches `{pattern}` within the range, in place, via the
	/// filesystem collaborator — not a text edit, a rename (spec §8
	/// example 4, "via external substitution rename").
	fn run_substitute(&mut self, cmd: &crate::ex::ParsedCommand, collab: &mut Collaborators<'_>) -> VifmResult<()> {
		let Some((pattern, replacement, global)) = crate::ex::parse_substitution(&cmd.raw_args) else {
			self.set_status("substitute: missing pattern", StatusPersistence::Clearable);
			return Ok(());
		};
		let re = match regex::Regex::new(&pattern) {
			Ok(re) => re,
			Err(e) => {
				self.set_status(format!("bad substitute pattern: {e}"), StatusPersistence::Preserved);
				return Ok(());
			}
		};
		let pane_len = self.active_pane().entries.len();
		if pane_len == 0 {
			return Ok(());
		}
		let last = pane_len - 1;
		let (start, end) = self.ex_range_or_cursor(cmd);
		let (start, end) = (start.min(last), end.min(last));
		let dir = self.active_pane().dir.clone();
		let names: Vec<String> = self.active_pane().entries[start..=end].iter().map(|e| e.name.clone()).collect();
		for name in names {
			if !re.is_match(&name) {
				continue;
			}
			let new_name = if global { re.replace_all(&name, replacement.as_str()).into_owned() } else { re.replace(&name, replacement.as_str()).into_owned() };
			if new_name == name {
				continue;
			}
			let from = dir.join(&name);
			let to = dir.join(&new_name);
			collab.fs.rename(&from, &to).map_err(|e| VifmError::transient_io(from.clone(), e))?;
		}
		self.reload_active_pane(collab.fs, true)
	}

	/// `:global`/`:g` (`:g!`/`:v` inverts the match): run `cmd` — an
	/// ex-command line, sans leading `:` — against every range entry
	/// whose name matches `pattern`, cursor parked on that entry for the
	/// duration (spec §8's range-driven batch-command pattern, the same
	/// shape as `run_substitute` but dispatching an arbitrary command
	/// instead of a single rename).
	fn run_global(&mut self, cmd: &crate::ex::ParsedCommand, collab: &mut Collaborators<'_>) -> VifmResult<()> {
		let Some((pattern, sub_cmd)) = crate::ex::parse_global(&cmd.raw_args) else {
			self.set_status("global: missing pattern", StatusPersistence::Clearable);
			return Ok(());
		};
		if sub_cmd.is_empty() {
			self.set_status("global: missing command", StatusPersistence::Clearable);
			return Ok(());
		}
		let re = match regex::Regex::new(&pattern) {
			Ok(re) => re,
			Err(e) => {
				self.set_status(format!("bad global pattern: {e}"), StatusPersistence::Preserved);
				return Ok(());
			}
		};
		let pane_len = self.active_pane().entries.len();
		if pane_len == 0 {
			return Ok(());
		}
		let last = pane_len - 1;
		let (start, end) = self.ex_range_or_cursor(cmd);
		let (start, end) = (start.min(last), end.min(last));
		let invert = cmd.bang;
		let names: Vec<String> = self.active_pane().entries[start..=end].iter().map(|e| e.name.clone()).collect();
		for name in names {
			if re.is_match(&name) == invert {
				continue;
			}
			// The entry may have moved or vanished (a prior iteration's
			// `cmd` could have renamed or trashed it); skip if so rather
			// than acting on the wrong entry.
			let Some(pos) = self.active_pane().entries.iter().position(|e| e.name == name) else { continue };
			self.active_pane_mut().move_to_list_pos(pos);
			self.run_ex_command(&sub_cmd, collab)?;
		}
		Ok(())
	}

	fn ex_range_or_cursor(&self, cmd: &crate::ex::ParsedCommand) -> (usize, usize) {
		let cur = self.active_pane().list_pos;
		match &cmd.range {
			Some(range) => {
				let last = self.active_pane().list_rows().saturating_sub(1);
				crate::ex::resolve_range(range, cur, last, |m| self.bookmark_line(m)).unwrap_or((cur, cur))
			}
			None => (cur, cur),
		}
	}
}

/// A mapping's `{lhs}`/unmap target, one `KeyEvent` per character; `<...>`
/// named-key notation is not implemented, matching this core's char-only
/// key model (spec §9 widened to graphemes, not vim's full keycode table).
fn parse_key_sequence(s: &str) -> Vec<crate::keys::KeyEvent> {
	s.chars().map(|c| crate::keys::KeyEvent::new(&c.to_string(), crate::keys::ModKeys::NONE)).collect()
}

fn is_cmdline_edit(id: BuiltinId) -> bool {
	matches!(
		id,
		BuiltinId::CmdLineInsertChar
			| BuiltinId::CmdLineDeleteCharBack
			| BuiltinId::CmdLineDeleteCharFwd
			| BuiltinId::CmdLineDeleteToStart
			| BuiltinId::CmdLineDeleteWordBack
			| BuiltinId::CmdLineDeleteToEnd
			| BuiltinId::CmdLineWordLeft
			| BuiltinId::CmdLineWordRight
			| BuiltinId::CmdLineDeleteWordFwd
			| BuiltinId::CmdLineHome
			| BuiltinId::CmdLineEnd
			| BuiltinId::CmdLineHistPrev
			| BuiltinId::CmdLineHistNext
			| BuiltinId::CmdLineHistSearchPrev
			| BuiltinId::CmdLineHistSearchNext
			| BuiltinId::CmdLineCompleteNext
			| BuiltinId::CmdLineCompletePrev
			| BuiltinId::CmdLineRewindComplete
			| BuiltinId::CmdLineSubmit
			| BuiltinId::CmdLineCancel
	)
}
