//! Command-line sub-mode: line editing over a wide-character buffer,
//! history with prefix search, Tab completion, and incremental search
//! (spec §4.4).
//!
//! Grounded on original_source `src/cmdline.h` (`struct line_stats`:
//! `index`/`curs_pos`/`complete_continue`/`history_search`/
//! `hist_search_len`/`line_buf`) and the teacher's `modes/ex.rs`
//! (`pending_cmd` accumulation, `Esc`/`Enter` handling), generalized
//! from a single Ex accumulator string into the full editing ring the
//! spec describes.
use unicode_segmentation::UnicodeSegmentation;

use crate::mode::CmdLineKind;

/// Whether history navigation (arrow keys) is doing a prefix search or
/// has not been engaged yet this command line.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum HistorySearchMode {
	Off,
	Exact,
	Prefix,
}

/// The editable line itself: a grapheme buffer plus a cursor index
/// counted in graphemes, not bytes (so wide characters move the cursor
/// by one step, matching the teacher's `KeyEvent::new` grapheme
/// boundary).
#[derive(Clone, Debug, Default)]
pub struct LineBuffer {
	graphemes: Vec<String>,
	cursor: usize,
}

impl LineBuffer {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn from_str(s: &str) -> Self {
		let graphemes: Vec<String> = s.graphemes(true).map(str::to_string).collect();
		let cursor = graphemes.len();
		Self { graphemes, cursor }
	}

	pub fn as_string(&self) -> String {
		self.graphemes.concat()
	}

	pub fn is_empty(&self) -> bool {
		self.graphemes.is_empty()
	}

	pub fn len(&self) -> usize {
		self.graphemes.len()
	}

	pub fn cursor(&self) -> usize {
		self.cursor
	}

	pub fn insert(&mut self, g: &str) {
		self.graphemes.insert(self.cursor, g.to_string());
		self.cursor += 1;
	}

	/// `Ctrl-H`/`Backspace`.
	pub fn delete_back(&mut self) -> bool {
		if self.cursor == 0 {
			return false;
		}
		self.cursor -= 1;
		self.graphemes.remove(self.cursor);
		true
	}

	/// `Ctrl-D`/`Delete`.
	pub fn delete_fwd(&mut self) -> bool {
		if self.cursor >= self.graphemes.len() {
			return false;
		}
		self.graphemes.remove(self.cursor);
		true
	}

	/// `Ctrl-U`.
	pub fn delete_to_start(&mut self) {
		self.graphemes.drain(0..self.cursor);
		self.cursor = 0;
	}

	/// `Ctrl-K`.
	pub fn delete_to_end(&mut self) {
		self.graphemes.truncate(self.cursor);
	}

	/// `Ctrl-W`: delete the previous word, where a word is a run of
	/// alphanumerics or else a run of non-alphanumerics, skipping
	/// trailing whitespace first.
	pub fn delete_word_back(&mut self) {
		let start = self.word_left_pos();
		self.graphemes.drain(start..self.cursor);
		self.cursor = start;
	}

	/// `Meta-d`: delete the next word.
	pub fn delete_word_fwd(&mut self) {
		let end = self.word_right_pos();
		self.graphemes.drain(self.cursor..end);
	}

	/// `Meta-b`.
	pub fn word_left(&mut self) {
		self.cursor = self.word_left_pos();
	}

	/// `Meta-f`.
	pub fn word_right(&mut self) {
		self.cursor = self.word_right_pos();
	}

	pub fn home(&mut self) {
		self.cursor = 0;
	}

	pub fn end(&mut self) {
		self.cursor = self.graphemes.len();
	}

	fn is_word_char(g: &str) -> bool {
		g.chars().next().is_some_and(|c| c.is_alphanumeric() || c == '_')
	}

	fn word_left_pos(&self) -> usize {
		let mut i = self.cursor;
		while i > 0 && self.graphemes[i - 1].chars().all(char::is_whitespace) {
			i -= 1;
		}
		if i == 0 {
			return 0;
		}
		let word_class = Self::is_word_char(&self.graphemes[i - 1]);
		while i > 0 && Self::is_word_char(&self.graphemes[i - 1]) == word_class && !self.graphemes[i - 1].chars().all(char::is_whitespace) {
			i -= 1;
		}
		i
	}

	fn word_right_pos(&self) -> usize {
		let n = self.graphemes.len();
		let mut i = self.cursor;
		while i < n && self.graphemes[i].chars().all(char::is_whitespace) {
			i += 1;
		}
		if i >= n {
			return n;
		}
		let word_class = Self::is_word_char(&self.graphemes[i]);
		while i < n && Self::is_word_char(&self.graphemes[i]) == word_class {
			i += 1;
		}
		i
	}

	/// Replace `[start..cursor]` with `replacement` and move the cursor
	/// to the end of it, used by completion (spec §4.4 "Completion").
	pub fn replace_range(&mut self, start: usize, replacement: &str) {
		let end = self.cursor;
		let new_graphemes: Vec<String> = replacement.graphemes(true).map(str::to_string).collect();
		self.graphemes.splice(start..end, new_graphemes.iter().cloned());
		self.cursor = start + new_graphemes.len();
	}
}

/// A bounded, most-recent-first history ring shared by Ex/search/prompt
/// command lines (one instance per `CmdLineKind`), sized by
/// `Options::history_len`.
#[derive(Clone, Debug)]
pub struct CmdHistory {
	capacity: usize,
	entries: Vec<String>,
}

impl CmdHistory {
	pub fn new(capacity: usize) -> Self {
		Self { capacity: capacity.max(1), entries: Vec::new() }
	}

	/// Record a submitted line, de-duplicating consecutive repeats and
	/// evicting the oldest entry once at capacity.
	pub fn push(&mut self, line: String) {
		if line.is_empty() {
			return;
		}
		if self.entries.first().is_some_and(|top| top == &line) {
			return;
		}
		self.entries.insert(0, line);
		self.entries.truncate(self.capacity);
	}

	pub fn len(&self) -> usize {
		self.entries.len()
	}

	pub fn is_empty(&self) -> bool {
		self.entries.is_empty()
	}

	pub fn get(&self, idx: usize) -> Option<&str> {
		self.entries.get(idx).map(String::as_str)
	}

	/// Find the nearest entry strictly after `from` (or from the start,
	/// if `from` is `None`) whose prefix matches `prefix`, walking
	/// towards the oldest end.
	pub fn find_prefix_older(&self, prefix: &str, from: Option<usize>) -> Option<usize> {
		let start = from.map(|i| i + 1).unwrap_or(0);
		self.entries.iter().enumerate().skip(start).find(|(_, e)| e.starts_with(prefix)).map(|(i, _)| i)
	}

	/// Find the nearest entry strictly before `from` whose prefix
	/// matches `prefix`, walking towards the newest end.
	pub fn find_prefix_newer(&self, prefix: &str, from: usize) -> Option<usize> {
		self.entries[..from.min(self.entries.len())].iter().enumerate().rev().find(|(_, e)| e.starts_with(prefix)).map(|(i, _)| i)
	}
}

/// A completion candidate list produced by the mode-specific callback
/// (file-path completion, command-name completion, ...); the engine
/// only knows how to cycle through it.
#[derive(Clone, Debug)]
pub struct Completion {
	/// Index into the line where the replaced span starts.
	offset: usize,
	candidates: Vec<String>,
	/// `None` until the first `Tab`; afterwards indexes `candidates`.
	current: Option<usize>,
}

impl Completion {
	pub fn new(offset: usize, candidates: Vec<String>) -> Self {
		Self { offset, candidates, current: None }
	}

	pub fn is_empty(&self) -> bool {
		self.candidates.is_empty()
	}

	pub fn candidates(&self) -> &[String] {
		&self.candidates
	}

	pub fn current_index(&self) -> Option<usize> {
		self.current
	}

	/// `Tab`: advance to the next candidate, wrapping. A two-entry list
	/// `{partial_prefix, full_name}` is special-cased to select the
	/// second entry directly and stop cycling (spec §4.4).
	pub fn advance(&mut self) -> Option<&str> {
		if self.candidates.is_empty() {
			return None;
		}
		if self.candidates.len() == 2 && self.current.is_none() {
			self.current = Some(1);
			return self.candidates.get(1).map(String::as_str);
		}
		let next = match self.current {
			None => 0,
			Some(i) => (i + 1) % self.candidates.len(),
		};
		self.current = Some(next);
		self.candidates.get(next).map(String::as_str)
	}

	/// `Shift-Tab`.
	pub fn retreat(&mut self) -> Option<&str> {
		if self.candidates.is_empty() {
			return None;
		}
		let prev = match self.current {
			None => self.candidates.len() - 1,
			Some(0) => self.candidates.len() - 1,
			Some(i) => i - 1,
		};
		self.current = Some(prev);
		self.candidates.get(prev).map(String::as_str)
	}
}

/// The full command-line sub-mode state (spec §4.4). Built fresh each
/// time the mode is entered; the owning `Context` is responsible for
/// stashing it on the `ModeManager` stack across recursive entries
/// (e.g. `:` from visual mode).
#[derive(Debug)]
pub struct CmdLineState {
	pub kind: CmdLineKind,
	pub prompt: String,
	pub buf: LineBuffer,
	history_cursor: Option<usize>,
	history_search: HistorySearchMode,
	history_search_prefix: String,
	/// The line as it was before history navigation started, restored
	/// when navigation runs off either end.
	saved_line: Option<String>,
	pub completion: Option<Completion>,
	/// `true` once a `Tab` cycle is in progress and the next `Tab`
	/// should continue it rather than re-invoke the completion callback.
	pub complete_continue: bool,
	/// Saved pane position to restore on cancel during incremental
	/// search (spec §4.4 "Incremental search").
	pub saved_top_line: Option<usize>,
	pub saved_list_pos: Option<usize>,
}

impl CmdLineState {
	pub fn new(kind: CmdLineKind, prompt: impl Into<String>, initial: &str) -> Self {
		Self {
			kind,
			prompt: prompt.into(),
			buf: LineBuffer::from_str(initial),
			history_cursor: None,
			history_search: HistorySearchMode::Off,
			history_search_prefix: String::new(),
			saved_line: None,
			completion: None,
			complete_continue: false,
			saved_top_line: None,
			saved_list_pos: None,
		}
	}

	pub fn is_search(&self) -> bool {
		matches!(
			self.kind,
			CmdLineKind::SearchFwd
				| CmdLineKind::SearchBwd
				| CmdLineKind::MenuSearchFwd
				| CmdLineKind::MenuSearchBwd
				| CmdLineKind::VisualSearchFwd
				| CmdLineKind::VisualSearchBwd
		)
	}

	pub fn is_forward_search(&self) -> bool {
		matches!(self.kind, CmdLineKind::SearchFwd | CmdLineKind::MenuSearchFwd | CmdLineKind::VisualSearchFwd)
	}

	/// Any edit to the buffer invalidates a completion in progress and
	/// resets history-search state back to "not yet engaged" — matches
	/// original_source's `line_stats` reset on keystrokes other than
	/// history/completion keys.
	fn on_edit(&mut self) {
		self.completion = None;
		self.complete_continue = false;
		self.history_cursor = None;
		self.history_search = HistorySearchMode::Off;
	}

	pub fn insert_char(&mut self, g: &str) {
		self.buf.insert(g);
		self.on_edit();
	}

	pub fn delete_back(&mut self) -> bool {
		let r = self.buf.delete_back();
		self.on_edit();
		r
	}

	pub fn delete_fwd(&mut self) -> bool {
		let r = self.buf.delete_fwd();
		self.on_edit();
		r
	}

	pub fn delete_to_start(&mut self) {
		self.buf.delete_to_start();
		self.on_edit();
	}

	pub fn delete_to_end(&mut self) {
		self.buf.delete_to_end();
		self.on_edit();
	}

	pub fn delete_word_back(&mut self) {
		self.buf.delete_word_back();
		self.on_edit();
	}

	pub fn delete_word_fwd(&mut self) {
		self.buf.delete_word_fwd();
		self.on_edit();
	}

	/// `Ctrl-P`/`Ctrl-N`: step through history in recency order,
	/// regardless of buffer content.
	pub fn history_step(&mut self, history: &CmdHistory, older: bool) {
		if history.is_empty() {
			return;
		}
		if self.saved_line.is_none() {
			self.saved_line = Some(self.buf.as_string());
		}
		let next = match (self.history_cursor, older) {
			(None, true) => Some(0),
			(None, false) => None,
			(Some(i), true) => {
				if i + 1 < history.len() {
					Some(i + 1)
				} else {
					Some(i)
				}
			}
			(Some(0), false) => None,
			(Some(i), false) => Some(i - 1),
		};
		self.history_cursor = next;
		self.history_search = HistorySearchMode::Exact;
		let text = match next {
			Some(i) => history.get(i).unwrap_or("").to_string(),
			None => self.saved_line.clone().unwrap_or_default(),
		};
		self.buf = LineBuffer::from_str(&text);
	}

	/// Up/down arrows: prefix search. Per the resolved ambiguity in the
	/// original (the prefix length is captured once, at the first
	/// navigation key of this command line, and stays fixed for
	/// subsequent steps rather than being recomputed from the
	/// now-replaced buffer).
	pub fn history_prefix_search(&mut self, history: &CmdHistory, older: bool) {
		if history.is_empty() {
			return;
		}
		if self.history_search != HistorySearchMode::Prefix {
			self.history_search_prefix = self.buf.as_string();
			self.history_search = HistorySearchMode::Prefix;
			self.saved_line = Some(self.history_search_prefix.clone());
			self.history_cursor = None;
		}
		let found = if older {
			history.find_prefix_older(&self.history_search_prefix, self.history_cursor)
		} else {
			match self.history_cursor {
				Some(from) => history.find_prefix_newer(&self.history_search_prefix, from),
				None => None,
			}
		};
		match found {
			Some(i) => {
				self.history_cursor = Some(i);
				self.buf = LineBuffer::from_str(history.get(i).unwrap_or(""));
			}
			None if !older => {
				self.history_cursor = None;
				let restore = self.saved_line.clone().unwrap_or_default();
				self.buf = LineBuffer::from_str(&restore);
			}
			None => {}
		}
	}

	/// `Tab`/`Shift-Tab`: advance or retreat within an in-progress
	/// completion, installing `candidates` as a fresh list when none is
	/// active yet.
	pub fn complete(&mut self, make_candidates: impl FnOnce(&str, usize) -> (usize, Vec<String>), forward: bool) {
		if !self.complete_continue || self.completion.is_none() {
			let (offset, candidates) = make_candidates(&self.buf.as_string(), self.buf.cursor());
			self.completion = Some(Completion::new(offset, candidates));
		}
		let Some(completion) = self.completion.as_mut() else { return };
		let picked = if forward { completion.advance() } else { completion.retreat() };
		if let Some(picked) = picked {
			let offset = completion.offset;
			let picked = picked.to_string();
			self.buf.replace_range(offset, &picked);
		}
		self.complete_continue = true;
	}

	/// `Ctrl-_`: rewind a completion back to the original prefix.
	pub fn rewind_complete(&mut self) {
		if let Some(completion) = self.completion.take() {
			self.buf.replace_range(completion.offset, "");
		}
		self.complete_continue = false;
	}

	/// `Ctrl-C`/`Esc`: cancel, discarding changes. Returns the saved
	/// pane position to restore, clearing the incremental-search
	/// highlight only if `hl_search` is set (spec Open Question 2).
	pub fn cancel(&self, hl_search: bool) -> (Option<usize>, Option<usize>, bool) {
		(self.saved_top_line, self.saved_list_pos, hl_search)
	}

	pub fn line(&self) -> String {
		self.buf.as_string()
	}
}
