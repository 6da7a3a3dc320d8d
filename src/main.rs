//! Crossword generator
//!
//! Reads a grid structure and a word list, fills the grid, and prints the result. If an output
//! path is given, the rendered grid is written there as well.

use std::fs;
use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, ValueEnum};
use env_logger::Env;
use instant::Duration;

use crossword_csp::{
    find_fill, render_grid, Error, FillOptions, GridConfig, Inference, Structure, WordList,
};

/// Fills a crossword grid with words from a word list.
#[derive(Parser)]
#[command(name = "crossword-csp")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Grid structure: one line per row, `_` for an open cell, anything else for a block.
    structure: PathBuf,

    /// Word list, one word per line.
    words: PathBuf,

    /// Where to write the rendered grid.
    output: Option<PathBuf>,

    /// Give up after this many milliseconds of searching.
    #[arg(long)]
    timeout_ms: Option<u64>,

    /// Pruning to apply after each tentative choice.
    #[arg(long, value_enum, default_value_t = InferenceArg::None)]
    inference: InferenceArg,

    /// Print search statistics to stderr.
    #[arg(long)]
    stats: bool,
}

#[derive(Clone, Copy, ValueEnum)]
enum InferenceArg {
    None,
    ArcConsistency,
}

impl From<InferenceArg> for Inference {
    fn from(arg: InferenceArg) -> Inference {
        match arg {
            InferenceArg::None => Inference::None,
            InferenceArg::ArcConsistency => Inference::ArcConsistency,
        }
    }
}

fn main() -> ExitCode {
    env_logger::Builder::from_env(Env::default().default_filter_or("warn")).init();

    let cli = Cli::parse();

    let (config, words) = match load_puzzle(&cli) {
        Ok(puzzle) => puzzle,
        Err(err) => {
            eprintln!("{}", err);
            return ExitCode::from(2);
        }
    };

    let options = FillOptions {
        inference: cli.inference.into(),
        timeout: cli.timeout_ms.map(Duration::from_millis),
    };

    let outcome = match find_fill(&config, &words, options) {
        Ok(outcome) => outcome,
        Err(err) => {
            eprintln!("{}", err);
            return ExitCode::from(2);
        }
    };

    if cli.stats {
        eprintln!("{:?}", outcome.statistics);
    }

    let Some(assignment) = outcome.assignment else {
        println!("No solution.");
        return ExitCode::from(1);
    };

    let display_grid = render_grid(&config, &words, &assignment);
    println!("{}", display_grid);

    if let Some(output) = &cli.output {
        if let Err(err) = fs::write(output, format!("{}\n", display_grid)) {
            eprintln!("failed to write {}: {}", output.display(), err);
            return ExitCode::from(2);
        }
        println!("written file to {}", output.display());
    }

    ExitCode::SUCCESS
}

fn load_puzzle(cli: &Cli) -> Result<(GridConfig, WordList), Error> {
    let config = GridConfig::from_structure(Structure::load(&cli.structure)?)?;
    let words = WordList::load(&cli.words)?;
    Ok((config, words))
}
