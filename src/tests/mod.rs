//! End-to-end tests driving `Context` through `KeyEngine::execute`
//! exactly as the CLI binary does, over fake collaborators (spec §8
//! end-to-end scenarios).
use std::path::PathBuf;
use std::time::SystemTime;

use crate::collaborators::fakes::{FakeFilesystem, FakeJobs, FakeMountHelper, FakeRenderer};
use crate::collaborators::{Collaborators, DirEntryInfo};
use crate::commands::BuiltinId;
use crate::context::{Context, PaneSide};
use crate::key_engine::{ActionOutcome, ExecStatus, FollowedBy, KeyEngine, KeyTrie};
use crate::keys::{KeyEvent, ModKeys};
use crate::mode::Mode;
use crate::pane::EntryKind;
use crate::register::RegisterName;

fn k(c: char) -> KeyEvent {
	KeyEvent::new(&c.to_string(), ModKeys::NONE)
}

fn file(name: &str) -> DirEntryInfo {
	DirEntryInfo {
		name: name.to_string(),
		kind: EntryKind::Regular,
		size: 0,
		mtime: SystemTime::UNIX_EPOCH,
		atime: SystemTime::UNIX_EPOCH,
		ctime: SystemTime::UNIX_EPOCH,
		uid: 0,
		gid: 0,
		mode: 0o644,
	}
}

struct Harness {
	ctx: Context,
	fs: FakeFilesystem,
	renderer: FakeRenderer,
	jobs: FakeJobs,
	mount: FakeMountHelper,
	reaper: FakeJobs,
	externals: FakeJobs,
}

impl Harness {
	fn new() -> Self {
		let mut fs = FakeFilesystem::new();
		fs.put_dir(
			"/start",
			vec![file("a.txt"), file("b.txt"), file("c.txt"), file("d.txt"), file("e.txt")],
			SystemTime::UNIX_EPOCH,
		);
		let mut ctx = Context::new(PathBuf::from("/start"), PathBuf::from("/start"), 10, 15, PathBuf::from("/trash"));
		ctx.reload_active_pane(&fs, false).unwrap();
		ctx.active = PaneSide::Right;
		ctx.reload_active_pane(&fs, false).unwrap();
		ctx.active = PaneSide::Left;
		Self { ctx, fs, renderer: FakeRenderer::default(), jobs: FakeJobs, mount: FakeMountHelper, reaper: FakeJobs, externals: FakeJobs }
	}

	/// Feed `input` one character at a time through `KeyEngine::execute`,
	/// dispatching every resulting `ExecStatus` (spec §8 scenarios are
	/// all expressed as plain-character input strings).
	fn feed(&mut self, input: &str) {
		for ch in input.chars() {
			let mode = self.ctx.mode.current();
			let status = self.ctx.keys.execute(mode, KeyEvent::new(&ch.to_string(), ModKeys::NONE));
			let mut collab = Collaborators {
				renderer: &mut self.renderer,
				fs: &mut self.fs,
				jobs: &mut self.jobs,
				mount: &mut self.mount,
				reaper: &mut self.reaper,
				externals: &mut self.externals,
			};
			self.ctx.handle_exec_status(status, &mut collab).unwrap();
		}
	}

	fn run_ex(&mut self, line: &str) {
		let mut collab = Collaborators {
			renderer: &mut self.renderer,
			fs: &mut self.fs,
			jobs: &mut self.jobs,
			mount: &mut self.mount,
			reaper: &mut self.reaper,
			externals: &mut self.externals,
		};
		self.ctx.run_ex_command(line, &mut collab).unwrap();
	}
}

#[test]
fn count_motion_moves_cursor_down_by_count() {
	let mut h = Harness::new();
	h.feed("3j");
	assert_eq!(h.ctx.active_pane().list_pos, 3);
}

#[test]
fn count_motion_clamps_at_last_entry() {
	let mut h = Harness::new();
	h.feed("99j");
	assert_eq!(h.ctx.active_pane().list_pos, 4);
}

#[test]
fn visual_line_delete_trashes_the_selected_range() {
	let mut h = Harness::new();
	// V anchors at a.txt, jj extends the selection to c.txt, d deletes
	// the three-entry range and returns to Normal mode (spec §4.3
	// "Visual mode" / "Operators").
	h.feed("Vjjd");
	let unnamed = h.ctx.registers.get(RegisterName::unnamed()).unwrap();
	assert_eq!(unnamed.paths(), [PathBuf::from("/trash/a.txt"), PathBuf::from("/trash/b.txt"), PathBuf::from("/trash/c.txt")]);
	assert_eq!(h.ctx.mode.current(), crate::mode::Mode::Normal);
}

#[test]
fn register_targeted_doubled_yank_uses_the_first_keys_register() {
	let mut h = Harness::new();
	// `"ayy`: the register prefix precedes the first `y`; the second
	// `y` (doubled-operator shorthand) carries no register of its own,
	// so the write must still land in register `a`.
	h.feed("\"ayy");
	let a = h.ctx.registers.get(RegisterName::new(Some('a'))).unwrap();
	assert_eq!(a.paths(), [PathBuf::from("/start/a.txt")]);
}

#[test]
fn doubled_delete_trashes_one_whole_line_from_cursor() {
	let mut h = Harness::new();
	h.feed("jdd"); // cursor at b.txt, dd trashes just that line
	let unnamed = h.ctx.registers.get(RegisterName::unnamed()).unwrap();
	assert_eq!(unnamed.paths(), [PathBuf::from("/trash/b.txt")]);
}

#[test]
fn yank_marks_the_unnamed_register_as_copy_provenance() {
	let mut h = Harness::new();
	h.feed("yy");
	let unnamed = h.ctx.registers.get(RegisterName::unnamed()).unwrap();
	assert_eq!(unnamed.provenance(), crate::register::Provenance::Yank);
}

#[test]
fn delete_marks_the_unnamed_register_as_move_provenance() {
	let mut h = Harness::new();
	h.feed("dd");
	let unnamed = h.ctx.registers.get(RegisterName::unnamed()).unwrap();
	assert_eq!(unnamed.provenance(), crate::register::Provenance::Delete);
}

#[test]
fn put_after_a_delete_moves_rather_than_copies_the_trashed_entry() {
	let mut h = Harness::new();
	h.feed("dd"); // a.txt trashed into the unnamed register
	h.ctx.active_pane_mut().dir = PathBuf::from("/start");
	h.feed("p");
	// A move places the trashed file directly; no copy is left behind
	// in the trash for a second rename.
	assert_eq!(h.fs.renames.last(), Some(&(PathBuf::from("/trash/a.txt"), PathBuf::from("/start/a.txt"))));
}

#[test]
fn doubled_lowercase_operator_renames_through_the_ordinary_motion_path() {
	// `guu` doesn't repeat the whole `gu` operator key — its third key is
	// bare `u`, bound to `MotionWholeLineCount` directly, so it never
	// hits `Context::dispatch_builtin`'s "same operator twice" branch at
	// all (see DESIGN.md). Exercise it against a file whose case-change
	// is observable.
	let mut h = Harness::new();
	h.fs.put_dir("/upper", vec![file("UPPER.TXT")], SystemTime::UNIX_EPOCH);
	h.ctx.active_pane_mut().dir = PathBuf::from("/upper");
	h.ctx.reload_active_pane(&h.fs, false).unwrap();

	h.feed("guu");
	assert_eq!(h.fs.renames, [(PathBuf::from("/upper/UPPER.TXT"), PathBuf::from("/upper/upper.txt"))]);
}

#[test]
fn ctrl_o_and_ctrl_i_walk_pane_history() {
	let mut h = Harness::new();
	h.fs.put_dir("/dirA", vec![file("a.txt")], SystemTime::UNIX_EPOCH);
	h.fs.put_dir("/dirB", vec![file("b.txt")], SystemTime::UNIX_EPOCH);
	h.ctx.active_pane_mut().history.enter(PathBuf::from("/dirA"), String::new(), 0);
	h.ctx.active_pane_mut().history.enter(PathBuf::from("/dirB"), String::new(), 0);
	h.ctx.active_pane_mut().history.enter(PathBuf::from("/start"), String::new(), 0);

	h.feed("\x0f"); // Ctrl-O
	assert_eq!(h.ctx.active_pane().dir, PathBuf::from("/dirB"));
	h.feed("\x0f"); // Ctrl-O again
	assert_eq!(h.ctx.active_pane().dir, PathBuf::from("/dirA"));
	h.feed("\x09"); // Ctrl-I
	assert_eq!(h.ctx.active_pane().dir, PathBuf::from("/dirB"));
}

#[test]
fn nnoremap_binds_a_non_recursive_normal_mode_mapping() {
	let mut h = Harness::new();
	h.feed("3j");
	assert_eq!(h.ctx.active_pane().list_pos, 3);

	h.run_ex("nnoremap gh gg");
	h.feed("gh");
	assert_eq!(h.ctx.active_pane().list_pos, 0, "gh should dispatch through the builtin gg path");
}

#[test]
fn substitute_renames_matching_entries_across_the_whole_pane() {
	let mut h = Harness::new();
	h.fs.put_dir("/docs", vec![file("foo.txt"), file("bar.txt")], SystemTime::UNIX_EPOCH);
	h.ctx.active_pane_mut().dir = PathBuf::from("/docs");
	h.ctx.reload_active_pane(&h.fs, false).unwrap();

	h.run_ex(r"%s/\.txt/.md/");

	let mut renamed: Vec<(PathBuf, PathBuf)> = h.fs.renames.clone();
	renamed.sort();
	assert_eq!(
		renamed,
		vec![(PathBuf::from("/docs/bar.txt"), PathBuf::from("/docs/bar.md")), (PathBuf::from("/docs/foo.txt"), PathBuf::from("/docs/foo.md"))]
	);
	let names: Vec<&str> = h.ctx.active_pane().entries.iter().map(|e| e.name.as_str()).collect();
	assert_eq!(names, ["bar.md", "foo.md"]);
}

#[test]
fn z_m_stashes_the_filter_and_z_r_restores_it() {
	let mut h = Harness::new();
	h.ctx.active_pane_mut().filter.pattern = "a".to_string();
	h.feed("zM");
	assert!(h.ctx.active_pane().filter.hide_dot);
	assert_eq!(h.ctx.active_pane().filter.pattern, "");
	h.feed("zr");
	assert!(!h.ctx.active_pane().filter.hide_dot);
	assert_eq!(h.ctx.active_pane().filter.pattern, "a");
}

#[test]
fn global_trashes_every_entry_matching_the_pattern_in_range() {
	let mut h = Harness::new();
	h.fs.put_dir("/docs", vec![file("keep.txt"), file("drop.log"), file("also_drop.log")], SystemTime::UNIX_EPOCH);
	h.ctx.active_pane_mut().dir = PathBuf::from("/docs");
	h.ctx.reload_active_pane(&h.fs, false).unwrap();

	h.run_ex("%g/\\.log$/d");

	let names: Vec<&str> = h.ctx.active_pane().entries.iter().map(|e| e.name.as_str()).collect();
	assert_eq!(names, ["keep.txt"]);
	assert_eq!(
		h.fs.renames,
		[(PathBuf::from("/docs/also_drop.log"), PathBuf::from("/trash/also_drop.log")), (PathBuf::from("/docs/drop.log"), PathBuf::from("/trash/drop.log"))]
	);
}

#[test]
fn nunmap_removes_a_previously_defined_mapping() {
	let mut h = Harness::new();
	h.run_ex("nnoremap gh gg");
	assert!(h.ctx.keys.has_user_mapping(crate::mode::Mode::Normal, &[KeyEvent::new("g", ModKeys::NONE), KeyEvent::new("h", ModKeys::NONE)]));
	h.run_ex("nunmap gh");
	assert!(!h.ctx.keys.has_user_mapping(crate::mode::Mode::Normal, &[KeyEvent::new("g", ModKeys::NONE), KeyEvent::new("h", ModKeys::NONE)]));
}

#[test]
fn find_char_motion_consumes_its_argument_key() {
	let mut h = Harness::new();
	// `fc` must jump straight to c.txt; if `MultiKey` failed to fill
	// `key_info.multi` this would leave the cursor at 0 and re-dispatch
	// `c` as a fresh (unknown) command.
	h.feed("fc");
	assert_eq!(h.ctx.active_pane().list_pos, 2);
}

#[test]
fn find_char_backward_motion_consumes_its_argument_key() {
	let mut h = Harness::new();
	h.feed("4j"); // cursor at e.txt
	h.feed("Fa"); // find 'a' backward -> a.txt
	assert_eq!(h.ctx.active_pane().list_pos, 0);
}

#[test]
fn mark_set_and_goto_round_trip_through_a_single_argument_key() {
	let mut h = Harness::new();
	h.feed("j"); // cursor at b.txt
	h.feed("mx"); // set mark x here
	h.feed("gg"); // back to a.txt
	assert_eq!(h.ctx.active_pane().list_pos, 0);
	h.feed("'x"); // jump back to the mark
	assert_eq!(h.ctx.active_pane().list_pos, 1);
}

#[test]
fn adding_the_same_handler_twice_leaves_one_terminal() {
	let mut trie = KeyTrie::new();
	trie.add_handler(&[k('d'), k('d')], BuiltinId::OperatorDelete, FollowedBy::Selector);
	trie.add_handler(&[k('d'), k('d')], BuiltinId::OperatorDelete, FollowedBy::Selector);
	assert_eq!(trie.node(KeyTrie::ROOT).terminal_count, 1);
}

#[test]
fn removing_a_mapping_prunes_the_now_dead_chain() {
	let mut trie = KeyTrie::new();
	trie.add_user_mapping(&[k('x'), k('y'), k('z')], "foo", false).unwrap();
	trie.remove_user_mapping(&[k('x'), k('y'), k('z')]).unwrap();
	// "xy" was only ever a WaitPoint on the way to "xyz"; with "xyz" gone
	// and no sibling of "z", the whole chain collapses back to the root.
	assert!(trie.child(KeyTrie::ROOT, &k('x')).is_none());
}

#[test]
fn ambiguous_prefix_waits_short_then_collapses_on_timeout() {
	let mut keys = KeyEngine::new();
	keys.register_mode(Mode::Normal, Mode::Normal.flags());
	keys.add_builtin(Mode::Normal, &[k('a'), k('b')], BuiltinId::MotionDown, FollowedBy::None);
	keys.add_builtin(Mode::Normal, &[k('a'), k('b'), k('c')], BuiltinId::MotionUp, FollowedBy::None);

	assert!(matches!(keys.execute(Mode::Normal, k('a')), ExecStatus::Wait));
	assert!(matches!(keys.execute(Mode::Normal, k('b')), ExecStatus::WaitShort));
	match keys.execute_timed_out(Mode::Normal) {
		ExecStatus::Ok(ActionOutcome::Action { id: BuiltinId::MotionDown, .. }) => {}
		other => panic!("expected the shorter \"ab\" action, got {other:?}"),
	}
}

#[test]
fn no_remap_user_mapping_dispatches_through_the_builtin_trie_only() {
	let mut keys = KeyEngine::new();
	keys.register_mode(Mode::Normal, Mode::Normal.flags());
	keys.add_builtin(Mode::Normal, &[k('j')], BuiltinId::MotionDown, FollowedBy::None);
	keys.add_builtin(Mode::Normal, &[k('k')], BuiltinId::MotionUp, FollowedBy::None);
	// A recursive user mapping shadows builtin `j` with `k`'s action...
	keys.add_user_mapping(Mode::Normal, &[k('j')], "k", false).unwrap();
	// ...but `x`, mapped non-recursively to `j`, must still resolve to
	// `j`'s own builtin action rather than following that shadow.
	keys.add_user_mapping(Mode::Normal, &[k('x')], "j", true).unwrap();

	match keys.execute(Mode::Normal, k('x')) {
		ExecStatus::Ok(ActionOutcome::Macro(actions)) => match actions.as_slice() {
			[ActionOutcome::Action { id: BuiltinId::MotionDown, .. }] => {}
			other => panic!("expected [MotionDown] from the builtin trie, got {other:?}"),
		},
		other => panic!("expected an Ok macro expansion, got {other:?}"),
	}
}
