//! Environment variable reads and `PWD` maintenance (spec §6
//! "Environment").
//!
//! Grounded on the discriminator list in spec.md §6; these are plain
//! `std::env` reads, kept in one module so the rest of the crate never
//! calls `std::env::var` directly (mirrors the teacher's `get_path`
//! helper in `modes/ex.rs` centralizing `$HOME` lookups).
use std::path::PathBuf;

#[derive(Clone, Debug, Default)]
pub struct Env {
	pub home: Option<PathBuf>,
	pub userprofile: Option<PathBuf>,
	pub homedrive: Option<String>,
	pub homepath: Option<String>,
	pub appdata: Option<PathBuf>,
	pub vifm_dir: Option<String>,
	pub myvifmrc: Option<PathBuf>,
	pub shell: Option<String>,
	pub term: Option<String>,
	pub display: Option<String>,
	pub windowid: Option<String>,
}

impl Env {
	pub fn read() -> Self {
		Self {
			home: std::env::var_os("HOME").map(PathBuf::from),
			userprofile: std::env::var_os("USERPROFILE").map(PathBuf::from),
			homedrive: std::env::var("HOMEDRIVE").ok(),
			homepath: std::env::var("HOMEPATH").ok(),
			appdata: std::env::var_os("APPDATA").map(PathBuf::from),
			vifm_dir: std::env::var("VIFM").ok(),
			myvifmrc: std::env::var_os("MYVIFMRC").map(PathBuf::from),
			shell: std::env::var("SHELL").ok(),
			term: std::env::var("TERM").ok(),
			display: std::env::var("DISPLAY").ok(),
			windowid: std::env::var("WINDOWID").ok(),
		}
	}

	/// Resolve the home directory across platforms, falling back to
	/// `USERPROFILE` or a `HOMEDRIVE`+`HOMEPATH` join.
	pub fn home_dir(&self) -> Option<PathBuf> {
		self.home
			.clone()
			.or_else(|| self.userprofile.clone())
			.or_else(|| match (&self.homedrive, &self.homepath) {
				(Some(drive), Some(path)) => Some(PathBuf::from(format!("{drive}{path}"))),
				_ => None,
			})
	}

	pub fn shell_or_default(&self) -> &str {
		self.shell.as_deref().unwrap_or("/bin/sh")
	}
}

/// Record the current directory in `$PWD`, as vifm does on every
/// chdir so subshells spawned via `ChildProcesses::spawn_shell` see a
/// consistent view.
pub fn set_pwd(dir: &std::path::Path) {
	std::env::set_var("PWD", dir);
}
