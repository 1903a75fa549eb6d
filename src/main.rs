//! CLI binary target: wires the modal input engine to a real terminal
//! and filesystem. Curses-style rendering, the filetype database, FUSE
//! mounting and background-job reaping are out of scope (spec §1) and
//! are wired here with minimal or no-op collaborators; every other
//! module in this crate is the actual engine under test.
use std::path::PathBuf;

use log::{error, info};

pub mod bindings;
pub mod bookmarks;
pub mod cli;
pub mod cmdline;
pub mod collaborators;
pub mod commands;
pub mod config;
pub mod context;
pub mod env;
pub mod error;
pub mod ex;
pub mod history;
pub mod infofile;
pub mod key_engine;
pub mod keys;
pub mod mode;
pub mod pane;
pub mod reader;
pub mod register;
#[cfg(test)]
pub mod tests;

use cli::USAGE;
use collaborators::fakes::FakeJobs;
use collaborators::{fakes::FakeMountHelper, Collaborators, RealChildProcesses, RealFilesystem, RealRenderer};
use context::{Context, PaneSide};
use env::Env;
use error::StatusPersistence;

fn main() {
	let argv: Vec<String> = std::env::args().skip(1).collect();
	let args = match cli::parse(argv) {
		Ok(a) => a,
		Err(e) => {
			eprintln!("vifm-core: {e}");
			eprintln!("{USAGE}");
			std::process::exit(1);
		}
	};

	if args.show_help {
		println!("{USAGE}");
		return;
	}
	if args.show_version {
		println!("vifm-core {}", env!("CARGO_PKG_VERSION"));
		return;
	}
	if args.logging {
		env_logger::init();
	}

	let env = Env::read();
	let cwd = std::env::current_dir().unwrap_or_else(|_| env.home_dir().unwrap_or_else(|| PathBuf::from(".")));
	let (left_dir, right_dir) = match args.paths.as_slice() {
		[a, b] => (a.clone(), b.clone()),
		[a] => (a.clone(), a.clone()),
		[] => (cwd.clone(), cwd),
	};

	let mut renderer = RealRenderer::new();
	let (rows, _cols) = renderer.size();
	let window_rows = rows.saturating_sub(2).max(1) as usize;

	let trash_dir = env.home_dir().unwrap_or_else(std::env::temp_dir).join(".vifm-core").join("Trash");

	let mut ctx = Context::new(left_dir, right_dir, window_rows, 15, trash_dir);

	let mut fs = RealFilesystem;
	let mut jobs = RealChildProcesses::new();
	let mut mount = FakeMountHelper;
	let mut reaper = FakeJobs;
	let mut externals = RealChildProcesses::new();

	for &side in &[PaneSide::Left, PaneSide::Right] {
		ctx.active = side;
		if let Err(e) = ctx.reload_active_pane(&fs, false) {
			error!("context: failed to load initial directory: {e}");
		}
	}
	ctx.active = PaneSide::Left;

	{
		let mut collab = Collaborators {
			renderer: &mut renderer,
			fs: &mut fs,
			jobs: &mut jobs,
			mount: &mut mount,
			reaper: &mut reaper,
			externals: &mut externals,
		};
		for cmd in args.startup_commands.clone() {
			if let Err(e) = ctx.run_ex_command(&cmd, &mut collab) {
				error!("context: startup command {cmd:?} failed: {e}");
			}
		}
	}

	info!("context: entering event loop over {:?}", ctx.active_pane().dir);

	while !ctx.should_quit {
		let timeout_ms = ctx.options.timeout_len as u64;
		let mode = ctx.mode.current();
		let mut collab = Collaborators {
			renderer: &mut renderer,
			fs: &mut fs,
			jobs: &mut jobs,
			mount: &mut mount,
			reaper: &mut reaper,
			externals: &mut externals,
		};
		let status = match collab.renderer.get_key_with_timeout(timeout_ms) {
			Some(key) => ctx.keys.execute(mode, key),
			None => ctx.keys.execute_timed_out(mode),
		};
		if let Err(e) = ctx.handle_exec_status(status, &mut collab) {
			ctx.status_message = Some((e.to_string(), StatusPersistence::Preserved));
		}
		for job in collab.reaper.poll_finished() {
			info!("context: job {job:?} finished");
		}
		if let Some((msg, _)) = &ctx.status_message {
			eprintln!("{msg}");
		}
	}
}
