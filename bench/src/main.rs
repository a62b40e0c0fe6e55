use std::error::Error;
use std::fs;
use std::path::PathBuf;

use bench::{select, titles, BenchRun};
use clap::Parser;
use log::{info, warn, LevelFilter};

/// Benchmark every brainfuck VM in the workspace and write the averages as
/// JSON, one file per program.
#[derive(Parser, Debug)]
#[command(version, long_about = None)]
struct Args {
    /// Runs per implementation and program
    #[arg(short, long, default_value_t = 10)]
    iterations: u32,

    /// Directory the JSON results are written to
    #[arg(short, long, default_value = "bench-data")]
    output_dir: PathBuf,

    /// File fed to the programs' stdin
    #[arg(long)]
    input: Option<PathBuf>,

    /// Only run these implementations (repeatable)
    #[arg(long)]
    only: Vec<String>,

    #[arg(short, long, default_value_t = LevelFilter::Info)]
    log_level: LevelFilter,

    /// brainfuck programs to benchmark
    #[arg(required = true)]
    programs: Vec<PathBuf>,
}

fn main() -> Result<(), Box<dyn Error>> {
    let args = Args::parse();
    util::init_logger(args.log_level);

    let implementations = select(&args.only)?;
    let input = match &args.input {
        Some(path) => fs::read(path)?,
        None => vec![],
    };
    if args.iterations == 0 {
        warn!("--iterations 0 runs each program once");
    }

    let program_titles = titles(&args.programs)?;

    for (program, title) in args.programs.iter().zip(&program_titles) {
        let source_code = fs::read_to_string(program)?;

        let run = BenchRun::measure(
            title,
            &source_code,
            &input,
            args.iterations,
            &implementations,
        )?;
        let path = run.write_json(&args.output_dir)?;
        info!("results for {} written to {}", program.display(), path.display());
    }

    Ok(())
}
