use std::fs;
use std::io::{self, Read, Write};
use std::path::PathBuf;
use std::time::Instant;

use clap::{CommandFactory, FromArgMatches, Parser};
use log::{debug, info, LevelFilter};
use simplelog::{ColorChoice, Config, TermLogger, TerminalMode};

use crate::error::BfResult;

pub trait RunFunction: Fn(&str, &mut dyn Read, &mut dyn Write) -> BfResult<()> {}
impl<T> RunFunction for T where T: Fn(&str, &mut dyn Read, &mut dyn Write) -> BfResult<()> {}

/// Run a brainfuck program, reading `,` from stdin and writing `.` to stdout.
#[derive(Parser, Debug)]
#[command(version, long_about = None)]
pub struct Args {
    /// brainfuck file path
    pub file: PathBuf,

    /// Log level written to stderr (off, error, warn, info, debug, trace).
    #[arg(short, long, default_value_t = LevelFilter::Warn)]
    pub log_level: LevelFilter,
}

/// Installs the stderr logger used by every binary in the workspace.
pub fn init_logger(level: LevelFilter) {
    // Fails only if a logger is already installed, which then keeps logging.
    if let Err(err) = TermLogger::init(
        level,
        Config::default(),
        TerminalMode::Stderr,
        ColorChoice::Auto,
    ) {
        debug!("logger already installed: {err}");
    }
}

pub fn run_main(name: &'static str, run_function: impl RunFunction) -> BfResult<()> {
    let matches = Args::command().name(name).get_matches();
    let args = Args::from_arg_matches(&matches).unwrap_or_else(|err| err.exit());

    init_logger(args.log_level);

    let source_code = fs::read_to_string(&args.file)?;
    info!("running {} with {name}", args.file.display());

    let start = Instant::now();
    let result = run_function(
        &source_code,
        &mut io::stdin().lock(),
        &mut io::stdout().lock(),
    );
    info!("{name} finished in {} ms", start.elapsed().as_millis());

    result
}
