//! Argument parsing for the `fluid` binary (spec §6.1), grounded on the
//! `cli-sub-agent` crate's `Cli` derive (`cli.rs`): a `clap::Parser` struct
//! with a required positional plus a handful of `#[arg(...)]` flags.

use std::path::PathBuf;

use clap::Parser;

/// `fluid [OPTIONS] <TEMPLATE_FILE>` — lex, preprocess and parse a
/// template, writing the rendered output to stdout or `--outfile`.
#[derive(Parser, Debug)]
#[command(name = "fluid", version, about = "Render Liquid-style text templates")]
pub struct Cli {
    /// Template file to render.
    pub template_file: PathBuf,

    /// Write rendered output to PATH (default: stdout).
    #[arg(short, long, value_name = "PATH")]
    pub outfile: Option<PathBuf>,

    /// Increase verbosity; repeatable (`-v -v`, or stacked as `-vv`).
    /// 0 = warn, 1 = info, 2 = debug, 3+ = trace.
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,
}

impl Cli {
    /// The `tracing` level name this invocation's verbosity maps to,
    /// stacking `-v` one step per occurrence (spec §6.1/§6.4).
    pub fn tracing_filter(&self) -> &'static str {
        match self.verbose {
            0 => "warn",
            1 => "info",
            2 => "debug",
            _ => "trace",
        }
    }
}
