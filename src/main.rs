use std::fs;
use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, ValueEnum};
use instant::Duration;

use crossfill::progress::{LogProgress, NoProgress, ProgressReporter};
use crossfill::{
    find_fill, generate_grid_config_from_template, FillError, FillOptions, Lexicon, OrderStrategy, SlotStrategy,
};

#[derive(Debug, Clone, Copy, ValueEnum)]
enum SlotArg {
    /// Fewest remaining candidates first
    Fewest,
    /// Clue order
    Input,
    /// Lowest lookahead score first
    Lookahead,
}

impl From<SlotArg> for SlotStrategy {
    fn from(arg: SlotArg) -> Self {
        match arg {
            SlotArg::Fewest => SlotStrategy::FewestCandidates,
            SlotArg::Input => SlotStrategy::InputOrder,
            SlotArg::Lookahead => SlotStrategy::Lookahead,
        }
    }
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum OrderArg {
    Alphabetical,
    Lookahead,
}

impl From<OrderArg> for OrderStrategy {
    fn from(arg: OrderArg) -> Self {
        match arg {
            OrderArg::Alphabetical => OrderStrategy::Alphabetical,
            OrderArg::Lookahead => OrderStrategy::Lookahead,
        }
    }
}

/// Crossword grid filler
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// The grid template: one row per line, `#` for blocks, `.` for blanks, letters for themselves
    grid: Option<String>,

    /// Read the grid template from a file instead
    #[arg(short = 'f', long, conflicts_with = "grid")]
    grid_file: Option<PathBuf>,

    /// Path to the dictionary file (word;score per line)
    #[arg(short, long)]
    dictionary: PathBuf,

    /// Minimum score filter
    #[arg(short = 'm', long, default_value_t = 0)]
    min_score: i32,

    /// Slot selection strategy
    #[arg(long, value_enum, default_value_t = SlotArg::Fewest)]
    slots: SlotArg,

    /// Candidate ordering strategy
    #[arg(long, value_enum, default_value_t = OrderArg::Alphabetical)]
    order: OrderArg,

    /// Give up after this many seconds
    #[arg(short, long)]
    timeout_secs: Option<f64>,

    /// Give up after this many backtracks
    #[arg(long)]
    max_backtracks: Option<usize>,

    /// Log a grid snapshot every N steps (needs --debug to be visible)
    #[arg(long)]
    progress: Option<u64>,

    /// Enable debug logging
    #[arg(long)]
    debug: bool,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let debug_enabled = cli.debug || std::env::var("CROSSFILL_DEBUG").is_ok();
    crossfill::log::init_logger(debug_enabled);

    if let Err(e) = try_main(cli) {
        if let Some(fill_err) = e.downcast_ref::<FillError>() {
            eprintln!("Error: {}", fill_err.display_detailed());
        } else {
            eprintln!("Error: {e}");
        }
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    }
}

/// Load the grid and dictionary, run the fill, and print the grid and its entries on stdout.
/// Statistics go to stderr.
fn try_main(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    let template = match (&cli.grid, &cli.grid_file) {
        (Some(grid), _) => grid.replace('/', "\n"),
        (None, Some(path)) => fs::read_to_string(path)?,
        (None, None) => return Err("a grid template or --grid-file is required".into()),
    };

    let lexicon = Lexicon::load_from_path(&cli.dictionary, cli.min_score)?;
    let config = generate_grid_config_from_template(&template, &lexicon)?;

    let options = FillOptions {
        slot_strategy: cli.slots.into(),
        order_strategy: cli.order.into(),
        timeout: cli.timeout_secs.map(Duration::try_from_secs_f64).transpose()?,
        max_backtracks: cli.max_backtracks,
        cancel: None,
        report_interval: cli.progress.unwrap_or(1),
    };

    let mut log_progress = LogProgress::default();
    let mut no_progress = NoProgress;
    let reporter: &mut dyn ProgressReporter = if cli.progress.is_some() { &mut log_progress } else { &mut no_progress };

    let success = find_fill(&config, &options, reporter)?;

    println!("{}", success.grid);
    println!();
    for (number, direction, word) in success.entries() {
        println!("{number} {direction}: {word}");
    }

    let statistics = &success.statistics;
    eprintln!(
        "Filled {} slots in {:.3}s ({} states, {} backtracks).",
        success.choices.len(),
        statistics.duration.as_secs_f64(),
        statistics.states,
        statistics.backtracks,
    );

    Ok(())
}
