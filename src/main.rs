//! kasi - sitelen pona typesetter

use std::fs;
use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;

use kasi::{ConvertOptions, Lexicon, convert};

#[derive(Parser)]
#[command(name = "kasi")]
#[command(version, about = "Convert sitelen pona markdown to LaTeX", long_about = None)]
#[command(after_help = "EXAMPLES:
    kasi lipu.md              Write lipu.tex next to the input
    kasi lipu.md out.tex      Write to an explicit path
    kasi -n lipu.md           Normalize unknown variants and compounds")]
struct Cli {
    /// Input markdown file
    #[arg(value_name = "INPUT")]
    input: PathBuf,

    /// Output LaTeX file (defaults to the input with a .tex extension)
    #[arg(value_name = "OUTPUT")]
    output: Option<PathBuf>,

    /// Word table CSV (word,glyph per line) replacing the built-in one
    #[arg(short, long, value_name = "PATH")]
    lexicon: Option<PathBuf>,

    /// Rewrite unknown word variants and compounds to known forms
    #[arg(short, long)]
    normalize: bool,

    /// Suppress output messages
    #[arg(short, long)]
    quiet: bool,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: &Cli) -> kasi::Result<()> {
    let lexicon = match &cli.lexicon {
        Some(path) => Lexicon::from_csv(&fs::read_to_string(path)?)?,
        None => Lexicon::embedded(),
    };

    let output = cli
        .output
        .clone()
        .unwrap_or_else(|| cli.input.with_extension("tex"));

    let source = fs::read_to_string(&cli.input)?;
    let options = ConvertOptions {
        normalize: cli.normalize,
    };
    fs::write(&output, convert(&source, &lexicon, options))?;

    if !cli.quiet {
        println!("{} -> {}", cli.input.display(), output.display());
    }
    Ok(())
}
