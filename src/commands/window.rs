//! Window/split management (spec §4.3 "Window management").
//!
//! Grounded on original_source `src/ui.h` (split orientation, splitter
//! position fields persisted via info-file discriminators `o`/`m`/`v`)
//! — the core models layout state without depending on curses, since
//! the actual rendering is an external collaborator (spec §1).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Orientation {
	Horizontal,
	Vertical,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Focus {
	Left,
	Right,
}

#[derive(Clone, Copy, Debug)]
pub struct Layout {
	pub orientation: Orientation,
	pub focus: Focus,
	pub only: bool,
	/// Splitter position as a percentage of the shared axis, `0..=100`.
	pub split_pct: u8,
}

impl Default for Layout {
	fn default() -> Self {
		Self { orientation: Orientation::Vertical, focus: Focus::Left, only: false, split_pct: 50 }
	}
}

impl Layout {
	pub fn focus_other(&mut self) {
		self.focus = match self.focus {
			Focus::Left => Focus::Right,
			Focus::Right => Focus::Left,
		};
	}

	pub fn equalize(&mut self) {
		self.split_pct = 50;
		self.only = false;
	}

	pub fn grow(&mut self, count: u8) {
		self.only = false;
		self.split_pct = self.split_pct.saturating_add(count).min(100);
	}

	pub fn shrink(&mut self, count: u8) {
		self.only = false;
		self.split_pct = self.split_pct.saturating_sub(count);
	}

	pub fn maximize(&mut self) {
		self.split_pct = 100;
	}

	pub fn hide_other(&mut self) {
		self.only = true;
	}
}
