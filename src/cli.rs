//! Command-line argument parsing (spec §6 "CLI surface").
//!
//! Grounded on the teacher's hand-rolled `std::env::args().skip(1).peekable()`
//! loop in `main.rs`, generalized to vifm's flag set.
use std::path::PathBuf;

#[derive(Clone, Debug, Default)]
pub struct Args {
	pub paths: Vec<PathBuf>,
	pub select: bool,
	pub remote: bool,
	/// `-c <cmd>`/`+<cmd>`: ex-commands to run once startup completes.
	pub startup_commands: Vec<String>,
	pub logging: bool,
	pub no_configs: bool,
	pub show_version: bool,
	pub show_help: bool,
}

#[derive(Debug, PartialEq, Eq)]
pub enum ArgsError {
	MissingValue(&'static str),
	TooManyPaths,
}

impl std::fmt::Display for ArgsError {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		match self {
			ArgsError::MissingValue(flag) => write!(f, "{flag} requires a value"),
			ArgsError::TooManyPaths => write!(f, "at most two paths may be given"),
		}
	}
}

/// Parse an argv slice (excluding argv[0]). Two positional paths may
/// be given, opening both panes; `--select` selects the path's file
/// after chdir to its parent (spec §6).
pub fn parse(argv: impl IntoIterator<Item = String>) -> Result<Args, ArgsError> {
	let mut args = Args::default();
	let mut iter = argv.into_iter().peekable();

	while let Some(arg) = iter.next() {
		match arg.as_str() {
			"--select" => args.select = true,
			"--remote" => args.remote = true,
			"--logging" => args.logging = true,
			"--no-configs" => args.no_configs = true,
			"-v" | "--version" => args.show_version = true,
			"-h" | "--help" => args.show_help = true,
			"-c" => {
				let cmd = iter.next().ok_or(ArgsError::MissingValue("-c"))?;
				args.startup_commands.push(cmd);
			}
			_ if arg.starts_with('+') && arg.len() > 1 => {
				args.startup_commands.push(arg[1..].to_string());
			}
			_ => {
				if args.paths.len() >= 2 {
					return Err(ArgsError::TooManyPaths);
				}
				args.paths.push(PathBuf::from(arg));
			}
		}
	}

	Ok(args)
}

pub const USAGE: &str = "\
Usage: vifm-core [--select] [<path>]... [--remote] [-c <cmd>|+<cmd>] [--logging] [--no-configs] [-v|--version] [-h|--help]";
