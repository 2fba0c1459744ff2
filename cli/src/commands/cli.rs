use std::path::PathBuf;

use clap::Parser;

#[derive(Parser, Debug)]
#[command(name = "lspcap")]
#[command(version, about = "Run a language server and record every byte of its stdio", long_about = None)]
pub struct Args {
    /// Directory for the four capture logs (defaults to the directory of this executable)
    #[arg(long, value_name = "DIR")]
    pub log_dir: Option<PathBuf>,

    /// Exit with the server's own exit code instead of 1 when it fails
    #[arg(long)]
    pub propagate_exit_code: bool,

    /// The server program followed by its arguments, passed through untouched
    #[arg(
        value_name = "PROGRAM",
        trailing_var_arg = true,
        allow_hyphen_values = true
    )]
    pub command: Vec<String>,
}

impl Args {
    /// Splits `command` into program and arguments.
    pub fn child(&self) -> Option<(&str, &[String])> {
        let (program, args) = self.command.split_first()?;
        Some((program.as_str(), args))
    }
}

pub const USAGE: &str = "Usage: lspcap [--log-dir DIR] [--propagate-exit-code] <cmd> [args...]";
