//! Runtime options (spec §3/§6 **[ADDED]** ambient config layer).
//!
//! Grounded on original_source `src/config.c`'s `cfg_init()` defaults
//! (`scroll_off=0`, `timeout_len=1000`, `history_len=15`,
//! `wild_menu=0`, `ignore_case=0`, `smart_case=0`, `hl_search=1`,
//! `confirm=1`, `inc_search=0`) and on the `=<option> <value>` /
//! `=no<option>` boolean-flag info-file encoding it serializes to
//! (spec §6 "Info file").
use crate::infofile::Entry;

#[derive(Clone, Debug)]
pub struct Options {
	/// Minimum number of lines kept visible above/below the cursor.
	pub scroll_off: u16,
	/// Milliseconds to wait before resolving a `WaitShort` ambiguity.
	pub timeout_len: u64,
	/// Capacity of each per-pane directory history ring and of the
	/// command/search/prompt history rings.
	pub history_len: usize,
	pub ignore_case: bool,
	pub smart_case: bool,
	pub hl_search: bool,
	pub inc_search: bool,
	pub wild_menu: bool,
	pub confirm: bool,
}

impl Default for Options {
	fn default() -> Self {
		Self {
			scroll_off: 0,
			timeout_len: 1000,
			history_len: 15,
			ignore_case: false,
			smart_case: false,
			hl_search: true,
			inc_search: false,
			wild_menu: false,
			confirm: true,
		}
	}
}

impl Options {
	/// Apply a single `:set` assignment (e.g. from `=scrolloff 4`,
	/// `=nowildmenu`, or the `:set` ex command). Unknown names are
	/// rejected rather than silently ignored, matching vifm's
	/// `OperationRefused` behaviour for bad option names.
	pub fn set(&mut self, name: &str, value: Option<&str>) -> Result<(), String> {
		let (negate, base) = match name.strip_prefix("no") {
			Some(rest) if is_known_bool(rest) => (true, rest),
			_ => (false, name),
		};
		match base {
			"scrolloff" => self.scroll_off = parse_value(value, name)?,
			"timeoutlen" => self.timeout_len = parse_value(value, name)?,
			"history" => self.history_len = parse_value(value, name)?,
			"ignorecase" => self.ignore_case = !negate,
			"smartcase" => self.smart_case = !negate,
			"hlsearch" => self.hl_search = !negate,
			"incsearch" => self.inc_search = !negate,
			"wildmenu" => self.wild_menu = !negate,
			"confirm" => self.confirm = !negate,
			_ => return Err(format!("unknown option: {name}")),
		}
		Ok(())
	}

	/// Effective case-sensitivity for a name-filter pattern, honouring
	/// `smartcase` (case-insensitive unless the pattern has uppercase).
	pub fn filter_ignore_case(&self, pattern: &str) -> bool {
		if self.smart_case && pattern.chars().any(char::is_uppercase) {
			false
		} else {
			self.ignore_case
		}
	}

	/// Serialize every option as `=<name> <value>` info-file records
	/// (spec §6).
	pub fn to_entries(&self) -> Vec<Entry> {
		vec![
			Entry::Option { name: "scrolloff".into(), value: self.scroll_off.to_string() },
			Entry::Option { name: "timeoutlen".into(), value: self.timeout_len.to_string() },
			Entry::Option { name: "history".into(), value: self.history_len.to_string() },
			Entry::Option { name: bool_name("ignorecase", self.ignore_case), value: String::new() },
			Entry::Option { name: bool_name("smartcase", self.smart_case), value: String::new() },
			Entry::Option { name: bool_name("hlsearch", self.hl_search), value: String::new() },
			Entry::Option { name: bool_name("incsearch", self.inc_search), value: String::new() },
			Entry::Option { name: bool_name("wildmenu", self.wild_menu), value: String::new() },
			Entry::Option { name: bool_name("confirm", self.confirm), value: String::new() },
		]
	}

	/// Apply option records loaded from the info file, logging and
	/// skipping any that no longer resolve to a known option.
	pub fn apply_entries(&mut self, entries: &[Entry]) {
		for entry in entries {
			if let Entry::Option { name, value } = entry {
				let value = if value.is_empty() { None } else { Some(value.as_str()) };
				if let Err(e) = self.set(name, value) {
					log::warn!("config: {e}");
				}
			}
		}
	}
}

fn is_known_bool(name: &str) -> bool {
	matches!(name, "ignorecase" | "smartcase" | "hlsearch" | "incsearch" | "wildmenu" | "confirm")
}

fn bool_name(name: &str, value: bool) -> String {
	if value { name.to_string() } else { format!("no{name}") }
}

fn parse_value<T: std::str::FromStr>(value: Option<&str>, name: &str) -> Result<T, String> {
	value.ok_or_else(|| format!("{name} requires a value"))?.parse().map_err(|_| format!("invalid value for {name}"))
}
