//! The info-file persistence format: a line-oriented, discriminator-
//! character schema for options, bookmarks, history, registers, and
//! window/sort/pane state (spec §6 "Info file").
//!
//! Grounded on original_source's discriminator table (documented in
//! `spec.md` §6, reproduced as `Entry`'s variants below) and the
//! teacher's straightforward line-at-a-time parsing style in
//! `modes/ex.rs`'s ex-command reader (no external parsing crate, just
//! a `lines()` walk).
use std::path::PathBuf;

use log::warn;

/// One logical record from the info file. Unknown discriminators are
/// preserved as `Unknown` so that a round-trip through this crate
/// never silently drops state the original schema defines but this
/// core doesn't otherwise model (spec: "implementers must preserve it
/// for backward compatibility").
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Entry {
	Option { name: String, value: String },
	FiletypeProgram { ext: String, cmd: String },
	FiletypeViewer { ext: String, cmd: String },
	UserCommand { name: String, cmd: String },
	Bookmark { mark: char, dir: String, file: String },
	ActivePane { right: bool },
	QuickView(bool),
	WindowCount(u8),
	SplitOrientation { vertical: bool },
	SplitterPosition(i32),
	LeftSort(Vec<i32>),
	RightSort(Vec<i32>),
	HistoryEntry { right: bool, dir: String, file: String, rel_pos: i32 },
	CmdHistory(String),
	SearchHistory(String),
	PromptHistory(String),
	DirStackFrame { left_dir: String, left_file: String, right_dir: String, right_file: String },
	TrashEntry { name: String, path: String },
	Register { name: char, path: String },
	NameFilter { right: bool, pattern: String },
	FilterInvert { right: bool, inverted: bool },
	ColorScheme(String),
	Unknown { discriminator: char, raw: String },
}

/// Parse the whole info-file body. Malformed individual records are
/// logged and skipped rather than aborting the whole load, matching
/// the `TransientIOError` "degrade gracefully" policy (spec §7).
pub fn parse(contents: &str) -> Vec<Entry> {
	let mut entries = Vec::new();
	let mut lines = contents.lines().peekable();
	while let Some(line) = lines.next() {
		if line.is_empty() || line.starts_with('#') {
			continue;
		}
		let mut chars = line.chars();
		let Some(disc) = chars.next() else { continue };
		let rest = chars.as_str();
		let rest = rest.strip_prefix(' ').unwrap_or(rest);

		let entry = match disc {
			'=' => parse_option(rest),
			'.' => parse_filetype(rest, &mut lines, false),
			',' => parse_filetype(rest, &mut lines, true),
			'!' => parse_user_command(rest, &mut lines),
			'\'' => parse_bookmark(rest, &mut lines),
			'a' => Some(Entry::ActivePane { right: rest.trim() == "r" }),
			'q' => parse_bool(rest).map(Entry::QuickView),
			'v' => rest.trim().parse().ok().map(Entry::WindowCount),
			'o' => Some(Entry::SplitOrientation { vertical: rest.trim() == "v" }),
			'm' => rest.trim().parse().ok().map(Entry::SplitterPosition),
			'l' => Some(Entry::LeftSort(parse_csv_ints(rest))),
			'r' => Some(Entry::RightSort(parse_csv_ints(rest))),
			'd' => parse_history(rest, &mut lines, false),
			'D' => parse_history(rest, &mut lines, true),
			':' => Some(Entry::CmdHistory(rest.to_string())),
			'/' => Some(Entry::SearchHistory(rest.to_string())),
			'p' => Some(Entry::PromptHistory(rest.to_string())),
			'S' => parse_dir_stack(rest, &mut lines),
			't' => parse_trash(rest, &mut lines),
			'"' => parse_register(rest),
			'f' => Some(Entry::NameFilter { right: false, pattern: rest.to_string() }),
			'F' => Some(Entry::NameFilter { right: true, pattern: rest.to_string() }),
			'i' => parse_bool(rest).map(|v| Entry::FilterInvert { right: false, inverted: v }),
			'I' => parse_bool(rest).map(|v| Entry::FilterInvert { right: true, inverted: v }),
			'c' => Some(Entry::ColorScheme(rest.to_string())),
			_ => {
				warn!("infofile: unrecognised discriminator {disc:?}, preserving verbatim");
				Some(Entry::Unknown { discriminator: disc, raw: rest.to_string() })
			}
		};
		match entry {
			Some(e) => entries.push(e),
			None => warn!("infofile: malformed record on discriminator {disc:?}, skipping"),
		}
	}
	entries
}

fn next_tab_line(lines: &mut std::iter::Peekable<std::str::Lines<'_>>) -> Option<String> {
	let line = lines.peek()?;
	let stripped = line.strip_prefix('\t')?;
	let owned = stripped.to_string();
	lines.next();
	Some(owned)
}

fn parse_option(rest: &str) -> Option<Entry> {
	let (name, value) = rest.split_once(' ')?;
	Some(Entry::Option { name: name.to_string(), value: value.to_string() })
}

fn parse_filetype(rest: &str, lines: &mut std::iter::Peekable<std::str::Lines<'_>>, viewer: bool) -> Option<Entry> {
	let cmd = next_tab_line(lines)?;
	let ext = rest.to_string();
	Some(if viewer { Entry::FiletypeViewer { ext, cmd } } else { Entry::FiletypeProgram { ext, cmd } })
}

fn parse_user_command(rest: &str, lines: &mut std::iter::Peekable<std::str::Lines<'_>>) -> Option<Entry> {
	let cmd = next_tab_line(lines)?;
	Some(Entry::UserCommand { name: rest.to_string(), cmd })
}

fn parse_bookmark(rest: &str, lines: &mut std::iter::Peekable<std::str::Lines<'_>>) -> Option<Entry> {
	let mark = rest.trim().chars().next()?;
	let dir = next_tab_line(lines)?;
	let file = next_tab_line(lines)?;
	Some(Entry::Bookmark { mark, dir, file })
}

fn parse_history(rest: &str, lines: &mut std::iter::Peekable<std::str::Lines<'_>>, right: bool) -> Option<Entry> {
	let dir = rest.to_string();
	let file = next_tab_line(lines)?;
	let rel = lines.next()?;
	let rel_pos: i32 = rel.trim().parse().ok()?;
	Some(Entry::HistoryEntry { right, dir, file, rel_pos })
}

fn parse_dir_stack(rest: &str, lines: &mut std::iter::Peekable<std::str::Lines<'_>>) -> Option<Entry> {
	let left_dir = rest.to_string();
	let left_file = next_tab_line(lines)?;
	let right_dir = next_tab_line(lines)?;
	let right_file = next_tab_line(lines)?;
	Some(Entry::DirStackFrame { left_dir, left_file, right_dir, right_file })
}

fn parse_trash(rest: &str, lines: &mut std::iter::Peekable<std::str::Lines<'_>>) -> Option<Entry> {
	let path = next_tab_line(lines)?;
	Some(Entry::TrashEntry { name: rest.to_string(), path })
}

fn parse_register(rest: &str) -> Option<Entry> {
	let mut chars = rest.chars();
	let name = chars.next()?;
	Some(Entry::Register { name, path: chars.as_str().to_string() })
}

fn parse_bool(rest: &str) -> Option<bool> {
	match rest.trim() {
		"0" => Some(false),
		"1" => Some(true),
		_ => None,
	}
}

fn parse_csv_ints(rest: &str) -> Vec<i32> {
	rest.split(',').filter_map(|s| s.trim().parse().ok()).collect()
}

/// Serialize entries back to the info-file text form. Round-trips with
/// `parse` for every variant this core writes (`Unknown` entries are
/// re-emitted verbatim so records from collaborators this core doesn't
/// interpret survive a load-then-save cycle untouched).
pub fn serialize(entries: &[Entry]) -> String {
	let mut out = String::new();
	for entry in entries {
		match entry {
			Entry::Option { name, value } => out.push_str(&format!("= {name} {value}\n")),
			Entry::FiletypeProgram { ext, cmd } => out.push_str(&format!(". {ext}\n\t{cmd}\n")),
			Entry::FiletypeViewer { ext, cmd } => out.push_str(&format!(", {ext}\n\t{cmd}\n")),
			Entry::UserCommand { name, cmd } => out.push_str(&format!("! {name}\n\t{cmd}\n")),
			Entry::Bookmark { mark, dir, file } => out.push_str(&format!("' {mark}\n\t{dir}\n\t{file}\n")),
			Entry::ActivePane { right } => out.push_str(&format!("a {}\n", if *right { 'r' } else { 'l' })),
			Entry::QuickView(v) => out.push_str(&format!("q {}\n", *v as u8)),
			Entry::WindowCount(n) => out.push_str(&format!("v {n}\n")),
			Entry::SplitOrientation { vertical } => out.push_str(&format!("o {}\n", if *vertical { 'v' } else { 'h' })),
			Entry::SplitterPosition(pos) => out.push_str(&format!("m {pos}\n")),
			Entry::LeftSort(ids) => out.push_str(&format!("l {}\n", ids.iter().map(i32::to_string).collect::<Vec<_>>().join(","))),
			Entry::RightSort(ids) => out.push_str(&format!("r {}\n", ids.iter().map(i32::to_string).collect::<Vec<_>>().join(","))),
			Entry::HistoryEntry { right, dir, file, rel_pos } => {
				let disc = if *right { 'D' } else { 'd' };
				out.push_str(&format!("{disc} {dir}\n\t{file}\n{rel_pos}\n"));
			}
			Entry::CmdHistory(s) => out.push_str(&format!(": {s}\n")),
			Entry::SearchHistory(s) => out.push_str(&format!("/ {s}\n")),
			Entry::PromptHistory(s) => out.push_str(&format!("p {s}\n")),
			Entry::DirStackFrame { left_dir, left_file, right_dir, right_file } => {
				out.push_str(&format!("S {left_dir}\n\t{left_file}\n\t{right_dir}\n\t{right_file}\n"));
			}
			Entry::TrashEntry { name, path } => out.push_str(&format!("t {name}\n\t{path}\n")),
			Entry::Register { name, path } => out.push_str(&format!("\"{name}{path}\n")),
			Entry::NameFilter { right, pattern } => out.push_str(&format!("{} {pattern}\n", if *right { 'F' } else { 'f' })),
			Entry::FilterInvert { right, inverted } => {
				out.push_str(&format!("{} {}\n", if *right { 'I' } else { 'i' }, *inverted as u8));
			}
			Entry::ColorScheme(name) => out.push_str(&format!("c {name}\n")),
			Entry::Unknown { discriminator, raw } => out.push_str(&format!("{discriminator} {raw}\n")),
		}
	}
	out
}

/// Convenience accumulator the context builds up before a `:write`/exit
/// save; kept separate from `Entry` itself so callers can push strongly
/// typed state without hand-building discriminator lines.
#[derive(Debug, Default)]
pub struct InfoFile {
	pub entries: Vec<Entry>,
}

impl InfoFile {
	pub fn load(contents: &str) -> Self {
		Self { entries: parse(contents) }
	}

	pub fn render(&self) -> String {
		serialize(&self.entries)
	}

	pub fn push(&mut self, entry: Entry) {
		self.entries.push(entry);
	}

	pub fn registers(&self) -> impl Iterator<Item = (char, &str)> {
		self.entries.iter().filter_map(|e| match e {
			Entry::Register { name, path } => Some((*name, path.as_str())),
			_ => None,
		})
	}

	pub fn bookmarks(&self) -> impl Iterator<Item = (char, &str, &str)> {
		self.entries.iter().filter_map(|e| match e {
			Entry::Bookmark { mark, dir, file } => Some((*mark, dir.as_str(), file.as_str())),
			_ => None,
		})
	}
}

/// Where the info file lives by default, honouring `$VIFM` if set
/// (spec §6 "Environment").
pub fn default_path(home: &PathBuf, vifm_dir: Option<&str>) -> PathBuf {
	match vifm_dir {
		Some(dir) => PathBuf::from(dir).join("vifminfo"),
		None => home.join(".vifm").join("vifminfo"),
	}
}
