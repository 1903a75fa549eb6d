//! The key engine: turns a stream of wide characters into completed
//! actions (spec §4.1).
//!
//! Grounded on original_source `src/keys.c`/`src/keys.h` for exact
//! algorithm semantics (prefix parsing order, ambiguity/wait rules,
//! `FOLLOWED_BY_*`) and on the teacher's `modes/normal.rs::try_parse`
//! incremental count/register prefix parsing, generalized per spec §9
//! into an arena trie walk instead of a hand-rolled re-parse.
pub mod info;
pub mod node;

use std::collections::HashMap;

use crate::commands::BuiltinId;
use crate::keys::KeyEvent;
use crate::mode::{Mode, ModeFlags};

pub use info::{KeyInfo, KeysInfo, NO_COUNT, NO_REG};
pub use node::{Action, FollowedBy, KeyNode, KeyTrie, NodeId};

/// The result of one `execute` call.
#[derive(Debug)]
pub enum ExecStatus {
	Ok(ActionOutcome),
	/// No matching builtin, user mapping, or default handler.
	Unknown,
	/// Waiting for more input with no timeout bound (a pure `WaitPoint`).
	Wait,
	/// Waiting for more input, but a shorter action exists; the caller
	/// should retry after `timeoutlen` via `execute_timed_out`.
	WaitShort,
	/// No trie match; the mode's default handler consumed one character.
	DefaultHandlerReturn(ActionOutcome),
}

/// The domain-level effect produced once a key sequence resolves,
/// independent of the consumed/wait/unknown plumbing in `ExecStatus`
/// (spec §9 "separate into two distinct result types").
#[derive(Debug, Clone)]
pub enum ActionOutcome {
	Action { id: BuiltinId, key_info: KeyInfo, selector: Option<Box<ActionOutcome>> },
	/// A user macro expanded into zero or more completed actions.
	Macro(Vec<ActionOutcome>),
	/// The default handler's argument, e.g. to insert literally in a
	/// command-line buffer.
	DefaultInsert(KeyEvent),
}

struct ModeTries {
	flags: ModeFlags,
	builtin: KeyTrie,
	user: KeyTrie,
	selector: KeyTrie,
	default_handler: Option<BuiltinId>,
}

impl ModeTries {
	fn new(flags: ModeFlags) -> Self {
		Self { flags, builtin: KeyTrie::new(), user: KeyTrie::new(), selector: KeyTrie::new(), default_handler: None }
	}
}

pub struct KeyEngine {
	modes: HashMap<Mode, ModeTries>,
	/// Input not yet resolved to a completed action, scoped to whichever
	/// mode most recently called `execute`.
	pending: Vec<KeyEvent>,
	pending_mode: Option<Mode>,
	key_counter: u64,
}

impl KeyEngine {
	pub fn new() -> Self {
		Self { modes: HashMap::new(), pending: Vec::new(), pending_mode: None, key_counter: 0 }
	}

	pub fn register_mode(&mut self, mode: Mode, flags: ModeFlags) {
		self.modes.entry(mode).or_insert_with(|| ModeTries::new(flags));
	}

	pub fn add_builtin(&mut self, mode: Mode, keys: &[KeyEvent], id: BuiltinId, followed_by: FollowedBy) {
		self.tries_mut(mode).builtin.add_handler(keys, id, followed_by);
	}

	pub fn add_selector(&mut self, mode: Mode, keys: &[KeyEvent], id: BuiltinId) {
		self.tries_mut(mode).selector.add_handler(keys, id, FollowedBy::None);
	}

	pub fn add_user_mapping(&mut self, mode: Mode, keys: &[KeyEvent], rhs: &str, no_remap: bool) -> Result<(), &'static str> {
		self.tries_mut(mode).user.add_user_mapping(keys, rhs, no_remap)
	}

	pub fn remove_user_mapping(&mut self, mode: Mode, keys: &[KeyEvent]) -> Result<(), &'static str> {
		self.tries_mut(mode).user.remove_user_mapping(keys)
	}

	pub fn has_user_mapping(&self, mode: Mode, keys: &[KeyEvent]) -> bool {
		self.modes.get(&mode).is_some_and(|t| t.user.has_user_mapping(keys))
	}

	pub fn set_default_handler(&mut self, mode: Mode, id: BuiltinId) {
		self.tries_mut(mode).default_handler = Some(id);
	}

	pub fn key_counter(&self) -> u64 {
		self.key_counter
	}

	fn tries_mut(&mut self, mode: Mode) -> &mut ModeTries {
		self.modes.entry(mode).or_insert_with(|| ModeTries::new(mode.flags()))
	}

	/// Feed `key` into the engine for `mode`. This is the primary entry
	/// point; it appends to any pending buffer left by a prior `Wait`/
	/// `WaitShort` and re-walks from the prefix-parse step.
	pub fn execute(&mut self, mode: Mode, key: KeyEvent) -> ExecStatus {
		self.key_counter += 1;
		if self.pending_mode != Some(mode) {
			self.pending.clear();
		}
		self.pending_mode = Some(mode);
		self.pending.push(key);
		let buf = std::mem::take(&mut self.pending);
		let status = self.run(mode, &buf, false);
		match &status {
			ExecStatus::Wait | ExecStatus::WaitShort => {
				self.pending = buf;
			}
			_ => {
				self.pending.clear();
				self.pending_mode = None;
			}
		}
		status
	}

	/// Called by the caller's event loop when `timeoutlen` elapses after
	/// a `WaitShort`. Collapses the ambiguity to the shorter action.
	pub fn execute_timed_out(&mut self, mode: Mode) -> ExecStatus {
		if self.pending_mode != Some(mode) || self.pending.is_empty() {
			return ExecStatus::Unknown;
		}
		let buf = std::mem::take(&mut self.pending);
		self.pending_mode = None;
		self.run(mode, &buf, true)
	}

	/// Core algorithm (spec §4.1 "Algorithm"). `after_wait` is true only
	/// when called from `execute_timed_out`.
	fn run(&self, mode: Mode, input: &[KeyEvent], after_wait: bool) -> ExecStatus {
		let flags = self.modes.get(&mode).map(|t| t.flags).unwrap_or(mode.flags());
		let mut rest = input;
		let mut key_info = KeyInfo::empty();

		// 1. Register prefix: "x
		if flags.contains(ModeFlags::USES_REGS) {
			if let Some(first) = rest.first() {
				if is_quote(first) {
					match rest.get(1) {
						None => return ExecStatus::Wait,
						Some(k) if is_cancel(k) => return ExecStatus::Ok(ActionOutcome::Macro(Vec::new())),
						Some(k) => {
							if let Some(ch) = as_plain_char(k) {
								key_info.reg = ch;
								rest = &rest[2..];
							}
						}
					}
				}
			}
		}

		// 1b. Count prefix: maximal run of digits not starting with '0'.
		if flags.contains(ModeFlags::USES_COUNT) {
			let mut n = 0usize;
			let mut count_str = String::new();
			while let Some(ch) = rest.get(n).and_then(as_plain_char) {
				if count_str.is_empty() && ch == '0' {
					break;
				}
				if !ch.is_ascii_digit() {
					break;
				}
				count_str.push(ch);
				n += 1;
			}
			if !count_str.is_empty() {
				key_info.count = count_str.parse().unwrap_or(NO_COUNT);
				rest = &rest[n..];
			}
		}

		if rest.is_empty() {
			// Input was entirely a register/count prefix; a command key
			// must still follow.
			return if input.is_empty() { ExecStatus::Unknown } else { ExecStatus::Wait };
		}

		self.resolve(mode, &self.tries(mode).user, rest, key_info, false, after_wait, true)
	}

	fn tries(&self, mode: Mode) -> &ModeTries {
		self.modes.get(&mode).expect("mode not registered")
	}

	/// Walk `trie` against `rest`; implements trie-walk + ambiguity +
	/// fallback (spec §4.1 steps 2-4).
	#[allow(clippy::too_many_arguments)]
	fn resolve(
		&self,
		mode: Mode,
		trie: &KeyTrie,
		rest: &[KeyEvent],
		key_info: KeyInfo,
		selector: bool,
		after_wait: bool,
		try_user_first: bool,
	) -> ExecStatus {
		let (node, consumed) = walk(trie, rest);
		let uses_input = self.tries(mode).flags.contains(ModeFlags::USES_INPUT);

		if consumed == rest.len() {
			let action = trie.node(node).action.clone();
			match action {
				None => {
					if rest.is_empty() {
						return ExecStatus::Unknown;
					}
					ExecStatus::Unknown
				}
				Some(Action::WaitPoint) => {
					if uses_input {
						ExecStatus::Wait
					} else {
						ExecStatus::Unknown
					}
				}
				Some(Action::Handler { id, followed_by }) => {
					if trie.node(node).is_ambiguous() && !after_wait {
						return ExecStatus::WaitShort;
					}
					// No more buffered input past this match, so a `MultiKey`
					// handler (`f`, `m`, `'`) must wait for its argument key.
					self.finish_handler(mode, id, followed_by, key_info, selector, None)
				}
				Some(Action::UserMacro(m)) => {
					if trie.node(node).is_ambiguous() && !after_wait {
						return ExecStatus::WaitShort;
					}
					self.expand_macro(mode, &m, key_info)
				}
			}
		} else {
			// Fallback: the node reached so far may itself carry an action.
			let reached_action = trie.node(node).action.clone();
			if let Some(Action::Handler { id, followed_by }) = reached_action {
				if matches!(followed_by, FollowedBy::MultiKey) {
					// `rest[consumed]` is the argument key (`f{char}`,
					// `m{char}`, `'{mark}`) — consume it into `key_info.multi`
					// rather than re-dispatching it as the next command.
					let outcome = self.finish_handler(mode, id, followed_by, key_info, selector, Some(&rest[consumed]));
					let leftover = &rest[consumed + 1..];
					return self.chain(mode, outcome, leftover, selector, after_wait);
				}
				let outcome = self.finish_handler(mode, id, followed_by, key_info, selector, None);
				let leftover = &rest[consumed..];
				return self.chain(mode, outcome, leftover, selector, after_wait);
			}
			if let Some(Action::UserMacro(m)) = reached_action {
				let outcome = self.expand_macro(mode, &m, key_info);
				let leftover = &rest[consumed..];
				return self.chain(mode, outcome, leftover, selector, after_wait);
			}
			if try_user_first {
				// The user trie didn't cover this input; defer to builtin.
				return self.resolve(mode, &self.tries(mode).builtin, rest, key_info, selector, after_wait, false);
			}
			if uses_input && self.tries(mode).default_handler.is_some() && !selector {
				let first = ExecStatus::Ok(ActionOutcome::DefaultInsert(rest[0].clone()));
				return self.chain(mode, first, &rest[1..], selector, after_wait);
			}
			ExecStatus::Unknown
		}
	}

	fn chain(&self, mode: Mode, first: ExecStatus, leftover: &[KeyEvent], selector: bool, after_wait: bool) -> ExecStatus {
		if leftover.is_empty() {
			return first;
		}
		let trie_kind = if selector { &self.tries(mode).selector } else { &self.tries(mode).user };
		let second = self.resolve(mode, trie_kind, leftover, KeyInfo::empty(), selector, after_wait, !selector);
		match (first, second) {
			(ExecStatus::Ok(a), ExecStatus::Ok(b)) => ExecStatus::Ok(ActionOutcome::Macro(vec![a, b])),
			(ExecStatus::Ok(a), ExecStatus::DefaultHandlerReturn(b)) => ExecStatus::Ok(ActionOutcome::Macro(vec![a, b])),
			(_, other) => other,
		}
	}

	fn finish_handler(
		&self,
		mode: Mode,
		id: BuiltinId,
		followed_by: FollowedBy,
		mut key_info: KeyInfo,
		selector: bool,
		next: Option<&KeyEvent>,
	) -> ExecStatus {
		let _ = mode;
		match followed_by {
			FollowedBy::None => ExecStatus::Ok(ActionOutcome::Action { id, key_info, selector: None }),
			FollowedBy::MultiKey => match next {
				// A key was available; use it verbatim as the argument even
				// when it isn't a plain char (`as_plain_char` yields `None`,
				// e.g. an arrow key), rather than waiting forever for a
				// plain char that may never come.
				Some(k) => {
					key_info.multi = as_plain_char(k);
					ExecStatus::Ok(ActionOutcome::Action { id, key_info, selector: None })
				}
				None => ExecStatus::Wait,
			},
			FollowedBy::Selector => {
				key_info.multi = None;
				// The selector itself is resolved by a subsequent `execute`
				// call against the selector trie; signal completion of the
				// operator shell so the caller can continue reading.
				let _ = selector;
				ExecStatus::Ok(ActionOutcome::Action { id, key_info, selector: None })
			}
		}
	}

	fn expand_macro(&self, mode: Mode, m: &node::UserMacro, key_info: KeyInfo) -> ExecStatus {
		if m.enters > 0 {
			return ExecStatus::Unknown;
		}
		let mut expansion = String::new();
		if key_info.has_reg() {
			expansion.push('"');
			expansion.push(key_info.reg);
		}
		if key_info.has_count() {
			expansion.push_str(&key_info.count.to_string());
		}
		expansion.push_str(&m.expansion);

		let keys: Vec<KeyEvent> = expansion.chars().map(|c| KeyEvent::new(&c.to_string(), crate::keys::ModKeys::NONE)).collect();
		let trie = if m.no_remap { &self.tries(mode).builtin } else { &self.tries(mode).user };
		let mut actions = Vec::new();
		let mut idx = 0;
		while idx < keys.len() {
			match self.resolve(mode, trie, &keys[idx..], KeyInfo::empty(), false, true, !m.no_remap) {
				ExecStatus::Ok(outcome) => {
					idx = keys.len();
					actions.push(outcome);
				}
				_ => break,
			}
		}
		ExecStatus::Ok(ActionOutcome::Macro(actions))
	}
}

impl Default for KeyEngine {
	fn default() -> Self {
		Self::new()
	}
}

/// Walk as far as possible into `trie` from the root, matching
/// consecutive edges against `keys`. Returns the node reached and how
/// many keys were consumed to reach it.
fn walk(trie: &KeyTrie, keys: &[KeyEvent]) -> (NodeId, usize) {
	let mut cur = KeyTrie::ROOT;
	for (i, key) in keys.iter().enumerate() {
		match trie.child(cur, key) {
			Some(next) => cur = next,
			None => return (cur, i),
		}
	}
	(cur, keys.len())
}

fn is_quote(k: &KeyEvent) -> bool {
	matches!(k.0, crate::keys::KeyCode::Char('"')) && k.1 == crate::keys::ModKeys::NONE
}

fn is_cancel(k: &KeyEvent) -> bool {
	use crate::keys::{KeyCode as K, ModKeys as M};
	matches!(k.0, K::Esc) || (matches!(k.0, K::Char('c')) && k.1 == M::CTRL)
}

fn as_plain_char(k: &KeyEvent) -> Option<char> {
	match (&k.0, k.1) {
		(crate::keys::KeyCode::Char(c), crate::keys::ModKeys::NONE) => Some(*c),
		_ => None,
	}
}
