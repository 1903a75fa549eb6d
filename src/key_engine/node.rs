//! Arena-backed key trie.
//!
//! Vifm's original `key_t` tree links nodes with raw parent pointers
//! (`src/keys.c`); per spec §9's redesign note this is rebuilt as a typed
//! arena so pruning can never leave a dangling back-reference and the
//! tree can be walked/serialized by plain index arithmetic.
use std::collections::BTreeMap;

use crate::commands::BuiltinId;
use crate::keys::KeyEvent;

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct NodeId(pub u32);

/// What a handler expects after it matches, mirroring vifm's
/// `FOLLOWED_BY_*` enum (`src/keys.h`).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FollowedBy {
	/// Invoke immediately; nothing more is read.
	None,
	/// Recursively resolve a motion/selector to yield `KeysInfo::indices`.
	Selector,
	/// Read exactly one more character into `KeyInfo::multi`.
	MultiKey,
}

/// A user-defined key-sequence expansion. `enters` guards against runaway
/// recursive self-expansion (spec invariant on `UserMacro` nodes).
#[derive(Clone, Debug)]
pub struct UserMacro {
	pub expansion: String,
	pub no_remap: bool,
	pub enters: u32,
}

/// The action a trie node resolves to once the key sequence is complete.
#[derive(Clone, Debug)]
pub enum Action {
	/// Reachable continuations exist but this node itself has no action.
	WaitPoint,
	/// A builtin operation. `followed_by` determines whether more input
	/// must be consumed before the handler can run.
	Handler { id: BuiltinId, followed_by: FollowedBy },
	/// A user-defined macro: re-feed `expansion` through `execute`.
	UserMacro(UserMacro),
}

pub struct KeyNode {
	/// The key consumed to reach this node from its parent. `None` only
	/// for the root.
	pub edge: Option<KeyEvent>,
	pub parent: Option<NodeId>,
	/// Children sorted by edge, per the trie-ordering invariant.
	pub children: BTreeMap<KeyEvent, NodeId>,
	/// Number of descendants (including self) that carry a terminal
	/// action; used to answer "is a longer key still possible?".
	pub terminal_count: u32,
	pub no_remap: bool,
	pub action: Option<Action>,
}

impl KeyNode {
	fn new(edge: Option<KeyEvent>, parent: Option<NodeId>) -> Self {
		Self {
			edge,
			parent,
			children: BTreeMap::new(),
			terminal_count: 0,
			no_remap: false,
			action: None,
		}
	}

	/// A node is ambiguous when it both has an action and reachable
	/// children — the only case where a `WaitShort` (rather than
	/// `Wait`) return is appropriate.
	pub fn is_ambiguous(&self) -> bool {
		self.action.is_some() && !self.children.is_empty()
	}

	pub fn is_terminal(&self) -> bool {
		matches!(self.action, Some(Action::Handler { .. }) | Some(Action::UserMacro(_)))
	}
}

/// One trie (builtin, user, or selector) for a single mode.
pub struct KeyTrie {
	arena: Vec<KeyNode>,
}

impl KeyTrie {
	pub fn new() -> Self {
		Self { arena: vec![KeyNode::new(None, None)] }
	}

	pub const ROOT: NodeId = NodeId(0);

	pub fn node(&self, id: NodeId) -> &KeyNode {
		&self.arena[id.0 as usize]
	}

	pub fn node_mut(&mut self, id: NodeId) -> &mut KeyNode {
		&mut self.arena[id.0 as usize]
	}

	pub fn child(&self, id: NodeId, key: &KeyEvent) -> Option<NodeId> {
		self.node(id).children.get(key).copied()
	}

	fn alloc(&mut self, edge: KeyEvent, parent: NodeId) -> NodeId {
		let id = NodeId(self.arena.len() as u32);
		self.arena.push(KeyNode::new(Some(edge), Some(parent)));
		id
	}

	fn child_or_insert(&mut self, id: NodeId, key: KeyEvent) -> NodeId {
		if let Some(existing) = self.child(id, &key) {
			return existing;
		}
		let new_id = self.alloc(key.clone(), id);
		self.node_mut(id).children.insert(key, new_id);
		new_id
	}

	/// Walk/create the path for `keys`, returning the terminal node.
	/// Intermediate nodes without their own action become `WaitPoint`s.
	fn insert_path(&mut self, keys: &[KeyEvent]) -> NodeId {
		let mut cur = Self::ROOT;
		for key in keys {
			let next = self.child_or_insert(cur, key.clone());
			if self.node(next).action.is_none() {
				self.node_mut(next).action = Some(Action::WaitPoint);
			}
			cur = next;
		}
		cur
	}

	fn bump_terminal_counts(&mut self, mut id: NodeId, delta: i32) {
		loop {
			let node = self.node_mut(id);
			if delta >= 0 {
				node.terminal_count += delta as u32;
			} else {
				node.terminal_count = node.terminal_count.saturating_sub((-delta) as u32);
			}
			match self.node(id).parent {
				Some(p) => id = p,
				None => break,
			}
		}
	}

	/// Insert a builtin/selector handler. Idempotent: inserting the same
	/// mapping twice leaves exactly one terminal (spec §8 property).
	pub fn add_handler(&mut self, keys: &[KeyEvent], id: BuiltinId, followed_by: FollowedBy) {
		let node = self.insert_path(keys);
		let was_terminal = self.node(node).is_terminal();
		self.node_mut(node).action = Some(Action::Handler { id, followed_by });
		if !was_terminal {
			self.bump_terminal_counts(node, 1);
		}
	}

	/// Insert or replace a user mapping. Returns an error if `keys` is
	/// empty.
	pub fn add_user_mapping(&mut self, keys: &[KeyEvent], rhs: &str, no_remap: bool) -> Result<(), &'static str> {
		if keys.is_empty() {
			return Err("empty key sequence");
		}
		let node = self.insert_path(keys);
		let was_terminal = self.node(node).is_terminal();
		self.node_mut(node).no_remap = no_remap;
		self.node_mut(node).action = Some(Action::UserMacro(UserMacro {
			expansion: rhs.to_string(),
			no_remap,
			enters: 0,
		}));
		if !was_terminal {
			self.bump_terminal_counts(node, 1);
		}
		Ok(())
	}

	pub fn has_user_mapping(&self, keys: &[KeyEvent]) -> bool {
		self.find(keys).is_some_and(|id| matches!(self.node(id).action, Some(Action::UserMacro(_))))
	}

	fn find(&self, keys: &[KeyEvent]) -> Option<NodeId> {
		let mut cur = Self::ROOT;
		for key in keys {
			cur = self.child(cur, key)?;
		}
		Some(cur)
	}

	/// Remove a user mapping, pruning the chain up to (but not including)
	/// the nearest ancestor that still has another terminal or child.
	/// No-op, reporting failure, if the path does not terminate in a
	/// `UserMacro`.
	pub fn remove_user_mapping(&mut self, keys: &[KeyEvent]) -> Result<(), &'static str> {
		let Some(node) = self.find(keys) else {
			return Err("no such mapping");
		};
		if !matches!(self.node(node).action, Some(Action::UserMacro(_))) {
			return Err("path does not terminate in a user macro");
		}
		self.bump_terminal_counts(node, -1);
		self.node_mut(node).action = None;
		self.prune_dead_chain(node);
		Ok(())
	}

	/// Walk upward removing nodes with no action and no children, per the
	/// invariant that "pruned when a user mapping is removed and the
	/// chain has no other terminals."
	fn prune_dead_chain(&mut self, start: NodeId) {
		let mut cur = start;
		loop {
			let node = self.node(cur);
			// A bare `WaitPoint` is just a pass-through marker, not a real
			// action — it must not anchor the chain the way a `Handler`/
			// `UserMacro` terminal does.
			if node.is_terminal() || !node.children.is_empty() {
				break;
			}
			let Some(parent) = node.parent else { break };
			let edge = node.edge.clone().unwrap();
			self.node_mut(parent).children.remove(&edge);
			cur = parent;
		}
	}
}

impl Default for KeyTrie {
	fn default() -> Self {
		Self::new()
	}
}
