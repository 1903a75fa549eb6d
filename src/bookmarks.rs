//! Bookmarks: single-character marks bound to `(dir, file)` (spec §4.7).
//!
//! Grounded on original_source `src/bookmarks.h` (mark-char slot space:
//! letters, digits, specials `<`/`>`/`'`) and the teacher's `RegisterName`
//! pattern of mapping a restricted character alphabet onto a fixed table
//! (`src/register.rs`), here re-targeted at marks.
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

#[derive(Clone, Debug)]
pub struct Bookmark {
	pub mark: char,
	pub dir: PathBuf,
	pub file: String,
	pub timestamp: SystemTime,
}

impl Bookmark {
	/// A bookmark is valid iff its directory still exists (spec §3
	/// invariant).
	pub fn is_valid(&self, exists: impl Fn(&Path) -> bool) -> bool {
		exists(&self.dir)
	}
}

fn is_user_mark(ch: char) -> bool {
	ch.is_ascii_alphanumeric()
}

fn is_special_mark(ch: char) -> bool {
	matches!(ch, '<' | '>' | '\'')
}

pub fn is_valid_mark_name(ch: char) -> bool {
	is_user_mark(ch) || is_special_mark(ch)
}

#[derive(Debug, Default)]
pub struct Bookmarks {
	table: BTreeMap<char, Bookmark>,
}

impl Bookmarks {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn set(&mut self, mark: char, dir: PathBuf, file: String, now: SystemTime) -> Result<(), &'static str> {
		if !is_valid_mark_name(mark) {
			return Err("not a valid mark name");
		}
		self.table.insert(mark, Bookmark { mark, dir, file, timestamp: now });
		Ok(())
	}

	pub fn get(&self, mark: char) -> Option<&Bookmark> {
		self.table.get(&mark)
	}

	pub fn remove(&mut self, mark: char) -> Option<Bookmark> {
		self.table.remove(&mark)
	}

	/// Fill `indices` in sort order: user letters/digits by ascending
	/// timestamp, then specials, matching `init_active_bookmarks`'s
	/// documented ordering (spec §4.7).
	pub fn active_sorted(&self, pattern: impl Fn(&Bookmark) -> bool) -> Vec<char> {
		let mut letters: Vec<&Bookmark> = Vec::new();
		let mut digits: Vec<&Bookmark> = Vec::new();
		let mut specials: Vec<&Bookmark> = Vec::new();
		for b in self.table.values() {
			if !pattern(b) {
				continue;
			}
			if b.mark.is_ascii_digit() {
				digits.push(b);
			} else if is_special_mark(b.mark) {
				specials.push(b);
			} else {
				letters.push(b);
			}
		}
		letters.sort_by_key(|b| b.timestamp);
		digits.sort_by_key(|b| b.timestamp);
		specials.sort_by_key(|b| b.mark);
		letters.into_iter().chain(digits).chain(specials).map(|b| b.mark).collect()
	}
}
