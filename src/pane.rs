//! The two-pane directory listing model (spec §4.6).
//!
//! Grounded on original_source `src/filelist.c` (load/sort/reload
//! algorithm, `src/ui.h` pane fields) and on the teacher's clamped-index
//! cursor idiom in `linebuf.rs` (`ClampedUsize`), generalized here to a
//! directory entry list instead of a line buffer.
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use regex::{Regex, RegexBuilder};

use crate::error::{VifmError, VifmResult};
use crate::history::PaneHistory;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EntryKind {
	Regular,
	Directory,
	Link,
	BrokenLink,
	Fifo,
	Socket,
	Device,
	Executable,
	Unknown,
}

#[derive(Clone, Debug)]
pub struct Entry {
	pub name: String,
	pub kind: EntryKind,
	pub size: u64,
	pub mtime: SystemTime,
	pub atime: SystemTime,
	pub ctime: SystemTime,
	pub uid: u32,
	pub gid: u32,
	pub mode: u32,
	pub selected: bool,
	/// Set by the last successful search; used for match-count reporting.
	pub search_match: bool,
}

impl Entry {
	pub fn is_parent_dir(&self) -> bool {
		self.name == ".."
	}
}

/// Sort criteria, signed for ascending (positive) / descending (negative),
/// mirroring vifm's per-pane sort key array (`src/ui.h`).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SortKey {
	Name,
	IName,
	Extension,
	Size,
	ATime,
	MTime,
	CTime,
	Mode,
	Group,
	Owner,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SortCriterion {
	pub key: SortKey,
	pub ascending: bool,
}

fn compare_entries(a: &Entry, b: &Entry, criterion: SortCriterion) -> std::cmp::Ordering {
	use std::cmp::Ordering;
	let ord = match criterion.key {
		SortKey::Name => a.name.cmp(&b.name),
		SortKey::IName => a.name.to_lowercase().cmp(&b.name.to_lowercase()),
		SortKey::Extension => {
			let ext = |n: &str| n.rsplit_once('.').map(|(_, e)| e.to_string()).unwrap_or_default();
			ext(&a.name).cmp(&ext(&b.name))
		}
		SortKey::Size => a.size.cmp(&b.size),
		SortKey::ATime => a.atime.cmp(&b.atime),
		SortKey::MTime => a.mtime.cmp(&b.mtime),
		SortKey::CTime => a.ctime.cmp(&b.ctime),
		SortKey::Mode => a.mode.cmp(&b.mode),
		SortKey::Group => a.gid.cmp(&b.gid),
		SortKey::Owner => a.uid.cmp(&b.uid),
	};
	let ord = if criterion.ascending { ord } else { ord.reverse() };
	if ord == Ordering::Equal { Ordering::Equal } else { ord }
}

/// Sort `entries` in place by the criterion chain, falling through ties
/// to the next criterion and finally to name (spec §4.6 step 4).
pub fn sort_entries(entries: &mut [Entry], criteria: &[SortCriterion]) {
	entries.sort_by(|a, b| {
		for c in criteria {
			let ord = compare_entries(a, b, *c);
			if ord != std::cmp::Ordering::Equal {
				return ord;
			}
		}
		a.name.cmp(&b.name)
	});
}

#[derive(Clone, Debug)]
pub struct NameFilter {
	pub pattern: String,
	pub invert: bool,
	pub hide_dot: bool,
	/// Set aside by `zM`, restored by `zr`.
	pub previous: Option<Box<NameFilter>>,
}

impl Default for NameFilter {
	fn default() -> Self {
		Self { pattern: String::new(), invert: false, hide_dot: false, previous: None }
	}
}

impl NameFilter {
	/// `ignorecase` unless the pattern contains an uppercase letter
	/// (`smartcase`), per spec §4.6 step 2.
	fn compiled(&self, ignorecase: bool, smartcase: bool) -> Option<Regex> {
		if self.pattern.is_empty() {
			return None;
		}
		let case_insensitive = ignorecase && !(smartcase && self.pattern.chars().any(|c| c.is_uppercase()));
		RegexBuilder::new(&self.pattern).case_insensitive(case_insensitive).build().ok()
	}

	/// Returns true if `name` should be dropped from the listing.
	fn filters_out(&self, name: &str, ignorecase: bool, smartcase: bool) -> bool {
		if self.hide_dot && name.starts_with('.') {
			return true;
		}
		match self.compiled(ignorecase, smartcase) {
			None => false,
			Some(re) => {
				let matched = re.is_match(name);
				matched == self.invert
			}
		}
	}
}

#[derive(Debug, Default, Clone, Copy)]
pub struct SelectionSnapshot;

pub struct Pane {
	pub dir: PathBuf,
	pub entries: Vec<Entry>,
	pub list_pos: usize,
	pub top_line: usize,
	pub window_rows: usize,
	pub scroll_off: usize,
	pub filter: NameFilter,
	pub filtered_count: usize,
	pub dir_mtime: Option<SystemTime>,
	pub sort: Vec<SortCriterion>,
	pub history: PaneHistory,
	/// Name-keyed selection snapshot restored by `gs`.
	pub saved_selection: Option<Vec<String>>,
	pub ignorecase: bool,
	pub smartcase: bool,
}

impl Pane {
	pub fn new(dir: impl Into<PathBuf>, window_rows: usize) -> Self {
		Self {
			dir: dir.into(),
			entries: Vec::new(),
			list_pos: 0,
			top_line: 0,
			window_rows,
			scroll_off: 0,
			filter: NameFilter::default(),
			filtered_count: 0,
			dir_mtime: None,
			sort: vec![SortCriterion { key: SortKey::Name, ascending: true }],
			history: PaneHistory::new(15),
			saved_selection: None,
			ignorecase: true,
			smartcase: true,
		}
	}

	pub fn list_rows(&self) -> usize {
		self.entries.len()
	}

	pub fn current_entry(&self) -> Option<&Entry> {
		self.entries.get(self.list_pos)
	}

	pub fn selected_count(&self) -> usize {
		self.entries.iter().filter(|e| e.selected).count()
	}

	/// Rebuilds the entry list from raw directory stats. Collaborators
	/// supply `raw_entries`; this function applies filtering, dot-hiding,
	/// classification and sorting (spec §4.6 steps 2-4) and, when
	/// `reload` is true, preserves selection/cursor by name (step 5).
	pub fn load_dir_list(&mut self, raw_entries: Vec<Entry>, dir_mtime: SystemTime, reload: bool) {
		let previously_selected: Vec<String> =
			if reload { self.entries.iter().filter(|e| e.selected).map(|e| e.name.clone()).collect() } else { Vec::new() };
		let cursor_name = if reload { self.current_entry().map(|e| e.name.clone()) } else { None };

		let at_root = self.dir.parent().is_none();
		let mut kept = Vec::with_capacity(raw_entries.len());
		let mut filtered = 0usize;
		for mut entry in raw_entries {
			if entry.name == "." {
				continue;
			}
			if entry.name == ".." && at_root {
				continue;
			}
			if entry.name != ".." && self.filter.filters_out(&entry.name, self.ignorecase, self.smartcase) {
				filtered += 1;
				continue;
			}
			if reload && previously_selected.iter().any(|n| n == &entry.name) {
				entry.selected = true;
			}
			kept.push(entry);
		}
		sort_entries(&mut kept, &self.sort);

		self.entries = kept;
		self.filtered_count = filtered;
		self.dir_mtime = Some(dir_mtime);

		let restored_pos = cursor_name.as_deref().and_then(|name| self.entries.iter().position(|e| e.name == name));
		let new_pos = restored_pos.unwrap_or_else(|| self.list_pos.min(self.entries.len().saturating_sub(1)));
		self.move_to_list_pos(new_pos);
	}

	/// Clamp `pos` into range and adjust `top_line` to satisfy the
	/// scroll-off margin (spec §4.6 "Cursor motion").
	pub fn move_to_list_pos(&mut self, pos: usize) {
		if self.entries.is_empty() {
			self.list_pos = 0;
			self.top_line = 0;
			return;
		}
		let pos = pos.min(self.entries.len() - 1);
		self.list_pos = pos;

		let off = self.scroll_off.min(self.window_rows / 2.max(1));
		if self.window_rows == 0 {
			return;
		}
		if pos < self.top_line + off && self.top_line > 0 {
			self.top_line = pos.saturating_sub(off);
		}
		if pos + off >= self.top_line + self.window_rows {
			self.top_line = (pos + off + 1).saturating_sub(self.window_rows);
		}
		let max_top = self.entries.len().saturating_sub(self.window_rows);
		self.top_line = self.top_line.min(max_top);
	}

	/// Whether `check_filelists_have_changed` (spec §4.6 step 6) should
	/// trigger a reload, given a freshly observed mtime.
	pub fn directory_changed(&self, observed_mtime: SystemTime) -> bool {
		self.dir_mtime != Some(observed_mtime)
	}

	pub fn select_by_name(&mut self, name: &str, selected: bool) {
		if let Some(entry) = self.entries.iter_mut().find(|e| e.name == name && !e.is_parent_dir()) {
			entry.selected = selected;
		}
	}

	pub fn clear_selection(&mut self) {
		for e in &mut self.entries {
			e.selected = false;
		}
	}

	pub fn selected_names(&self) -> Vec<String> {
		self.entries.iter().filter(|e| e.selected).map(|e| e.name.clone()).collect()
	}

	/// Snapshot the current selection for `gs` (spec §4.3).
	pub fn snapshot_selection(&mut self) {
		self.saved_selection = Some(self.selected_names());
	}

	pub fn restore_selection(&mut self) {
		if let Some(names) = self.saved_selection.clone() {
			self.clear_selection();
			for name in names {
				self.select_by_name(&name, true);
			}
		}
	}

	/// `zf`: fold the selected names into the pane's filter as a
	/// word-boundary alternation, inverted so selected names are hidden.
	pub fn add_selection_to_filter(&mut self) {
		let names = self.selected_names();
		if names.is_empty() {
			return;
		}
		let escaped: Vec<String> = names.iter().map(|n| regex::escape(n)).collect();
		let addition = format!(r"\b({})\b", escaped.join("|"));
		self.filter.pattern = if self.filter.pattern.is_empty() {
			addition
		} else {
			format!("{}|{}", self.filter.pattern, addition)
		};
		self.filter.invert = true;
	}

	/// `zO`: clear the name filter pattern but keep dot-visibility as is.
	pub fn clear_name_filter(&mut self) {
		self.filter.pattern.clear();
		self.filter.invert = false;
	}

	/// `zM`: stash the current filter and switch to hiding dot files.
	pub fn hide_dots_and_stash_filter(&mut self) {
		let previous = Some(Box::new(self.filter.clone()));
		self.filter = NameFilter { hide_dot: true, previous, ..NameFilter::default() };
	}

	/// `zR`: clear filter entirely and show dot files.
	pub fn reset_filter(&mut self) {
		self.filter = NameFilter::default();
	}

	pub fn validate_invariants(&self) -> bool {
		if !self.entries.is_empty() && self.list_pos >= self.entries.len() {
			return false;
		}
		if self.entries.iter().any(|e| e.is_parent_dir() && e.selected) {
			return false;
		}
		true
	}
}

/// Resolve `path`'s nearest accessible ancestor, per spec §4.6 step 1
/// ("fail fast if not accessible, step up to the nearest valid
/// ancestor").
pub fn nearest_accessible_ancestor(path: &Path, accessible: impl Fn(&Path) -> bool) -> VifmResult<PathBuf> {
	let mut cur = path.to_path_buf();
	loop {
		if accessible(&cur) {
			return Ok(cur);
		}
		match cur.parent() {
			Some(parent) => cur = parent.to_path_buf(),
			None => {
				return Err(VifmError::FatalInit(format!(
					"no accessible ancestor of {}",
					path.display()
				)))
			}
		}
	}
}
