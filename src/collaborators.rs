//! External-interface traits (spec §6).
//!
//! The core treats the curses rendering surface, the filesystem, child
//! process handling, FUSE mounting and background-job reaping as named
//! collaborators rather than owning their implementations — these are
//! explicitly out of scope per spec §1. Grounded on the teacher's
//! `reader.rs` (`KeyReader` trait plus `RawReader`/test-double split)
//! generalized to the rest of vifm's external surfaces.
use std::io;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use crate::pane::{Entry, EntryKind};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Rect {
	pub row: u16,
	pub col: u16,
	pub rows: u16,
	pub cols: u16,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub struct Attr(pub u16);

/// The curses-style rendering surface (spec §6 "Renderer surface"). The
/// core holds no textual layout knowledge beyond row/column arithmetic.
pub trait Renderer {
	fn size(&self) -> (u16, u16);
	fn clear_region(&mut self, rect: Rect);
	fn draw_text(&mut self, row: u16, col: u16, attr: Attr, text: &str);
	fn set_cursor(&mut self, visible: bool, row: u16, col: u16);
	fn refresh(&mut self);
	fn get_key_with_timeout(&mut self, ms: u64) -> Option<crate::keys::KeyEvent>;
}

#[derive(Clone, Debug)]
pub struct DirEntryInfo {
	pub name: String,
	pub kind: EntryKind,
	pub size: u64,
	pub mtime: SystemTime,
	pub atime: SystemTime,
	pub ctime: SystemTime,
	pub uid: u32,
	pub gid: u32,
	pub mode: u32,
}

impl From<DirEntryInfo> for Entry {
	fn from(info: DirEntryInfo) -> Self {
		Entry {
			name: info.name,
			kind: info.kind,
			size: info.size,
			mtime: info.mtime,
			atime: info.atime,
			ctime: info.ctime,
			uid: info.uid,
			gid: info.gid,
			mode: info.mode,
			selected: false,
			search_match: false,
		}
	}
}

/// Filesystem primitives (spec §6 "Filesystem"). Paths are UTF-8;
/// forward slashes internally, converted at the boundary on Windows.
pub trait Filesystem {
	fn list_dir(&self, path: &Path) -> io::Result<Vec<DirEntryInfo>>;
	fn stat_mtime(&self, path: &Path) -> io::Result<SystemTime>;
	fn realpath(&self, path: &Path) -> io::Result<PathBuf>;
	fn rmdir(&mut self, path: &Path) -> io::Result<()>;
	fn rename(&mut self, from: &Path, to: &Path) -> io::Result<()>;
	fn unlink(&mut self, path: &Path) -> io::Result<()>;
	fn mkdir(&mut self, path: &Path) -> io::Result<()>;
	fn readlink(&self, path: &Path) -> io::Result<PathBuf>;
	fn exists(&self, path: &Path) -> bool;
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct JobId(pub u64);

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct JobHandle(pub u64);

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ExitStatus {
	pub code: i32,
}

/// Child-process primitives (spec §6 "Child processes").
pub trait ChildProcesses {
	fn spawn_shell(
		&mut self,
		cmdline: &str,
		background: bool,
		capture_stdout: bool,
		capture_stderr: bool,
	) -> io::Result<JobHandle>;
	fn wait(&mut self, handle: JobHandle) -> io::Result<ExitStatus>;
	fn read_line(&mut self, handle: JobHandle) -> Option<String>;
	fn kill(&mut self, handle: JobHandle) -> io::Result<()>;
}

/// FUSE-mount awareness (spec §4.6 "Fuse-mount awareness").
pub trait MountHelper {
	fn mount(&mut self, source: &Path) -> io::Result<PathBuf>;
	fn unmount(&mut self, mountpoint: &Path) -> io::Result<()>;
	fn is_mount_source(&self, path: &Path) -> bool;
}

/// Background-job completion reaping. Per spec §5/§9, this replaces a
/// SIGCHLD handler with a self-pipe-style poll drained from
/// `ModeManager::pre`; no signal-handling code exists in this crate.
pub trait JobReaper {
	fn poll_finished(&mut self) -> Vec<JobId>;
}

/// Reads the small slice of external collaborator state this core
/// needs to finish an ex-command (`:!{cmd}` output, filetype handler
/// invocation) without owning the filetype-association database or
/// menu-content producers themselves (spec §1 out-of-scope list).
pub trait ExternalCommands {
	fn run_external_command(&mut self, cmdline: &str, background: bool) -> io::Result<()>;
}

/// `std::fs`-backed implementation of `Filesystem`, used by the CLI
/// binary target.
#[derive(Default)]
pub struct RealFilesystem;

impl Filesystem for RealFilesystem {
	fn list_dir(&self, path: &Path) -> io::Result<Vec<DirEntryInfo>> {
		let mut out = Vec::new();
		for entry in std::fs::read_dir(path)? {
			let entry = entry?;
			let meta = entry.metadata()?;
			let kind = classify(&meta, &entry.path());
			out.push(DirEntryInfo {
				name: entry.file_name().to_string_lossy().into_owned(),
				kind,
				size: meta.len(),
				mtime: meta.modified().unwrap_or(SystemTime::UNIX_EPOCH),
				atime: meta.accessed().unwrap_or(SystemTime::UNIX_EPOCH),
				ctime: meta.modified().unwrap_or(SystemTime::UNIX_EPOCH),
				uid: unix_uid(&meta),
				gid: unix_gid(&meta),
				mode: unix_mode(&meta),
			});
		}
		Ok(out)
	}

	fn stat_mtime(&self, path: &Path) -> io::Result<SystemTime> {
		std::fs::metadata(path)?.modified()
	}

	fn realpath(&self, path: &Path) -> io::Result<PathBuf> {
		std::fs::canonicalize(path)
	}

	fn rmdir(&mut self, path: &Path) -> io::Result<()> {
		std::fs::remove_dir(path)
	}

	fn rename(&mut self, from: &Path, to: &Path) -> io::Result<()> {
		std::fs::rename(from, to)
	}

	fn unlink(&mut self, path: &Path) -> io::Result<()> {
		std::fs::remove_file(path)
	}

	fn mkdir(&mut self, path: &Path) -> io::Result<()> {
		std::fs::create_dir(path)
	}

	fn readlink(&self, path: &Path) -> io::Result<PathBuf> {
		std::fs::read_link(path)
	}

	fn exists(&self, path: &Path) -> bool {
		path.exists()
	}
}

/// Terminal-backed `Renderer` for the CLI binary. Curses-style painting
/// is explicitly out of scope (spec §1), so every draw call is a no-op;
/// only key reading is real, reusing the teacher's `reader::RawReader`
/// byte/escape-sequence assembly.
pub struct RealRenderer {
	reader: crate::reader::RawReader,
}

impl RealRenderer {
	pub fn new() -> Self {
		Self { reader: crate::reader::RawReader::new() }
	}

	fn fill_from_stdin(&mut self) {
		use std::io::Read;
		let mut buf = [0u8; 64];
		if let Ok(n) = io::stdin().read(&mut buf) {
			if n > 0 {
				self.reader.load_bytes(&buf[..n]);
			}
		}
	}
}

impl Default for RealRenderer {
	fn default() -> Self {
		Self::new()
	}
}

impl Renderer for RealRenderer {
	fn size(&self) -> (u16, u16) {
		(24, 80)
	}
	fn clear_region(&mut self, _rect: Rect) {}
	fn draw_text(&mut self, _row: u16, _col: u16, _attr: Attr, _text: &str) {}
	fn set_cursor(&mut self, _visible: bool, _row: u16, _col: u16) {}
	fn refresh(&mut self) {}
	fn get_key_with_timeout(&mut self, _ms: u64) -> Option<crate::keys::KeyEvent> {
		if self.reader.bytes.is_empty() {
			self.fill_from_stdin();
		}
		crate::reader::KeyReader::read_key(&mut self.reader)
	}
}

/// `std::process::Command`-backed `ChildProcesses`/`ExternalCommands`,
/// used by the CLI binary target for `:!{cmd}` and background jobs.
#[derive(Default)]
pub struct RealChildProcesses {
	next_id: u64,
	children: std::collections::HashMap<u64, std::process::Child>,
	stdout: std::collections::HashMap<u64, io::BufReader<std::process::ChildStdout>>,
}

impl RealChildProcesses {
	pub fn new() -> Self {
		Self::default()
	}
}

impl ChildProcesses for RealChildProcesses {
	fn spawn_shell(
		&mut self,
		cmdline: &str,
		background: bool,
		capture_stdout: bool,
		capture_stderr: bool,
	) -> io::Result<JobHandle> {
		use std::process::Stdio;
		let shell = std::env::var("SHELL").unwrap_or_else(|_| "/bin/sh".to_string());
		let mut cmd = std::process::Command::new(shell);
		cmd.arg("-c").arg(cmdline);
		if capture_stdout {
			cmd.stdout(Stdio::piped());
		} else if background {
			cmd.stdout(Stdio::null());
		}
		if capture_stderr {
			cmd.stderr(Stdio::piped());
		} else if background {
			cmd.stderr(Stdio::null());
		}
		let mut child = cmd.spawn()?;
		let id = self.next_id;
		self.next_id += 1;
		if let Some(out) = child.stdout.take() {
			self.stdout.insert(id, io::BufReader::new(out));
		}
		self.children.insert(id, child);
		Ok(JobHandle(id))
	}

	fn wait(&mut self, handle: JobHandle) -> io::Result<ExitStatus> {
		let Some(mut child) = self.children.remove(&handle.0) else {
			return Err(io::Error::new(io::ErrorKind::NotFound, "no such job"));
		};
		let status = child.wait()?;
		Ok(ExitStatus { code: status.code().unwrap_or(-1) })
	}

	fn read_line(&mut self, handle: JobHandle) -> Option<String> {
		use io::BufRead;
		let reader = self.stdout.get_mut(&handle.0)?;
		let mut line = String::new();
		match reader.read_line(&mut line) {
			Ok(0) | Err(_) => None,
			Ok(_) => Some(line.trim_end_matches('\n').to_string()),
		}
	}

	fn kill(&mut self, handle: JobHandle) -> io::Result<()> {
		if let Some(mut child) = self.children.remove(&handle.0) {
			child.kill()?;
		}
		Ok(())
	}
}

impl ExternalCommands for RealChildProcesses {
	fn run_external_command(&mut self, cmdline: &str, background: bool) -> io::Result<()> {
		let handle = self.spawn_shell(cmdline, background, false, false)?;
		if !background {
			self.wait(handle)?;
		}
		Ok(())
	}
}

fn classify(meta: &std::fs::Metadata, path: &Path) -> EntryKind {
	if meta.is_dir() {
		EntryKind::Directory
	} else if meta.file_type().is_symlink() {
		if path.exists() { EntryKind::Link } else { EntryKind::BrokenLink }
	} else if meta.is_file() {
		#[cfg(unix)]
		{
			use std::os::unix::fs::PermissionsExt;
			if meta.permissions().mode() & 0o111 != 0 {
				return EntryKind::Executable;
			}
		}
		EntryKind::Regular
	} else {
		EntryKind::Unknown
	}
}

#[cfg(unix)]
fn unix_mode(meta: &std::fs::Metadata) -> u32 {
	use std::os::unix::fs::PermissionsExt;
	meta.permissions().mode()
}
#[cfg(not(unix))]
fn unix_mode(_meta: &std::fs::Metadata) -> u32 {
	0
}

#[cfg(unix)]
fn unix_uid(meta: &std::fs::Metadata) -> u32 {
	use std::os::unix::fs::MetadataExt;
	meta.uid()
}
#[cfg(not(unix))]
fn unix_uid(_meta: &std::fs::Metadata) -> u32 {
	0
}

#[cfg(unix)]
fn unix_gid(meta: &std::fs::Metadata) -> u32 {
	use std::os::unix::fs::MetadataExt;
	meta.gid()
}
#[cfg(not(unix))]
fn unix_gid(_meta: &std::fs::Metadata) -> u32 {
	0
}

/// No-op test doubles, grounded on the teacher's pattern of providing a
/// `TestReader`-equivalent alongside the real `RawReader` (`reader.rs`).
pub mod fakes {
	use super::*;
	use std::collections::VecDeque;

	#[derive(Default)]
	pub struct FakeRenderer {
		pub keys: VecDeque<crate::keys::KeyEvent>,
	}

	impl Renderer for FakeRenderer {
		fn size(&self) -> (u16, u16) {
			(24, 80)
		}
		fn clear_region(&mut self, _rect: Rect) {}
		fn draw_text(&mut self, _row: u16, _col: u16, _attr: Attr, _text: &str) {}
		fn set_cursor(&mut self, _visible: bool, _row: u16, _col: u16) {}
		fn refresh(&mut self) {}
		fn get_key_with_timeout(&mut self, _ms: u64) -> Option<crate::keys::KeyEvent> {
			self.keys.pop_front()
		}
	}

	#[derive(Default)]
	pub struct FakeJobs;

	impl ChildProcesses for FakeJobs {
		fn spawn_shell(&mut self, _: &str, _: bool, _: bool, _: bool) -> io::Result<JobHandle> {
			Ok(JobHandle(0))
		}
		fn wait(&mut self, _: JobHandle) -> io::Result<ExitStatus> {
			Ok(ExitStatus { code: 0 })
		}
		fn read_line(&mut self, _: JobHandle) -> Option<String> {
			None
		}
		fn kill(&mut self, _: JobHandle) -> io::Result<()> {
			Ok(())
		}
	}

	impl JobReaper for FakeJobs {
		fn poll_finished(&mut self) -> Vec<JobId> {
			Vec::new()
		}
	}

	impl ExternalCommands for FakeJobs {
		fn run_external_command(&mut self, _cmdline: &str, _background: bool) -> io::Result<()> {
			Ok(())
		}
	}

	/// In-memory filesystem for tests: a directory is a `PathBuf` key
	/// mapping to its children's `DirEntryInfo`s.
	#[derive(Default)]
	pub struct FakeFilesystem {
		pub dirs: std::collections::HashMap<PathBuf, Vec<DirEntryInfo>>,
		pub mtimes: std::collections::HashMap<PathBuf, SystemTime>,
		/// `(from, to)` pairs passed to `rename`, in call order; kept
		/// alongside the in-place `dirs` update below so tests can assert
		/// on either the call log or the resulting listing.
		pub renames: Vec<(PathBuf, PathBuf)>,
	}

	impl FakeFilesystem {
		pub fn new() -> Self {
			Self::default()
		}

		pub fn put_dir(&mut self, path: impl Into<PathBuf>, entries: Vec<DirEntryInfo>, mtime: SystemTime) {
			let path = path.into();
			self.mtimes.insert(path.clone(), mtime);
			self.dirs.insert(path, entries);
		}
	}

	impl Filesystem for FakeFilesystem {
		fn list_dir(&self, path: &Path) -> io::Result<Vec<DirEntryInfo>> {
			self.dirs
				.get(path)
				.cloned()
				.ok_or_else(|| io::Error::new(io::ErrorKind::NotFound, "no such directory"))
		}

		fn stat_mtime(&self, path: &Path) -> io::Result<SystemTime> {
			self.mtimes.get(path).copied().ok_or_else(|| io::Error::new(io::ErrorKind::NotFound, "no such path"))
		}

		fn realpath(&self, path: &Path) -> io::Result<PathBuf> {
			Ok(path.to_path_buf())
		}

		fn rmdir(&mut self, path: &Path) -> io::Result<()> {
			self.dirs.remove(path);
			Ok(())
		}

		fn rename(&mut self, from: &Path, to: &Path) -> io::Result<()> {
			self.renames.push((from.to_path_buf(), to.to_path_buf()));
			// `from` names a directory we're tracking directly: move its key.
			if let Some(entries) = self.dirs.remove(from) {
				self.dirs.insert(to.to_path_buf(), entries);
				return Ok(());
			}
			// Otherwise `from` names a file; update its entry in the parent
			// directory's listing in place, if we have one.
			if let (Some(parent), Some(from_name), Some(to_name)) = (from.parent(), from.file_name(), to.file_name()) {
				if let Some(entries) = self.dirs.get_mut(parent) {
					if let Some(entry) = entries.iter_mut().find(|e| e.name == from_name.to_string_lossy()) {
						entry.name = to_name.to_string_lossy().into_owned();
					}
				}
			}
			Ok(())
		}

		fn unlink(&mut self, _path: &Path) -> io::Result<()> {
			Ok(())
		}

		fn mkdir(&mut self, path: &Path) -> io::Result<()> {
			self.dirs.entry(path.to_path_buf()).or_default();
			Ok(())
		}

		fn readlink(&self, path: &Path) -> io::Result<PathBuf> {
			Ok(path.to_path_buf())
		}

		fn exists(&self, path: &Path) -> bool {
			self.dirs.contains_key(path)
		}
	}

	#[derive(Default)]
	pub struct FakeMountHelper;

	impl MountHelper for FakeMountHelper {
		fn mount(&mut self, source: &Path) -> io::Result<PathBuf> {
			Ok(source.to_path_buf())
		}
		fn unmount(&mut self, _mountpoint: &Path) -> io::Result<()> {
			Ok(())
		}
		fn is_mount_source(&self, _path: &Path) -> bool {
			false
		}
	}
}
