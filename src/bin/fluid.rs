//! The `fluid` CLI driver (spec §6.1): parses arguments, runs the
//! pipeline over the given template file, and writes the result to
//! stdout or `--outfile`. Structured after the `cli-sub-agent` teacher's
//! `main.rs` (tracing init, then dispatch, then a single error-to-exit-code
//! boundary).

use std::fs;
use std::io::Write;
use std::process::ExitCode;

use clap::Parser;
use fluid::cli::Cli;
use fluid::{error::FluidError, lexer, preprocessor, tree, FilesystemIncludeLoader};

fn main() -> ExitCode {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(cli.tracing_filter())),
        )
        .try_init()
        .ok();

    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("{}, fluid: {}", err.category(), err);
            ExitCode::FAILURE
        }
    }
}

/// Run the pipeline over `cli.template_file` and write its output.
/// Spec §1/§3 explicitly scope an evaluator for the parse tree out of
/// this crate, so "rendered output" is the lexed-and-preprocessed
/// template text: `comment`/`raw` spans resolved and `include` tags
/// expanded, but `{{ }}`/`{% %}` directives left as literal text since
/// nothing here binds them to values. The tree is still built so any
/// structural error (unclosed `if`, unmatched `endfor`, ...) is reported
/// exactly as it would be for a future evaluator-carrying caller.
fn run(cli: &Cli) -> Result<(), FluidError> {
    let source = fs::read_to_string(&cli.template_file).map_err(|_| FluidError::FileNotFound {
        path: cli.template_file.clone(),
    })?;

    let root = cli
        .template_file
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| std::path::Path::new("."));
    let loader = FilesystemIncludeLoader::new(root);

    tracing::info!(path = %cli.template_file.display(), "lexing template");
    let blocks = lexer::lex(&source)?;

    tracing::info!(blocks = blocks.len(), "preprocessing blocks");
    let blocks = preprocessor::preprocess(blocks, &loader)?;

    tracing::info!("building parse tree");
    let (parsed, roots) = tree::build(&blocks)?;

    if cli.verbose >= 2 {
        for &id in &roots {
            ptree::print_tree(&parsed.view(id)).ok();
        }
    }

    let rendered = blocks.reconstruct();
    write_output(cli, &rendered)
}

fn write_output(cli: &Cli, rendered: &str) -> Result<(), FluidError> {
    match &cli.outfile {
        Some(path) => {
            fs::write(path, rendered).map_err(|_| FluidError::FileNotFound { path: path.clone() })
        }
        None => {
            let mut stdout = std::io::stdout();
            stdout
                .write_all(rendered.as_bytes())
                .map_err(|_| FluidError::Unknown)
        }
    }
}
