use std::io::Write;
use std::process::ExitCode;
use std::time::Duration;

use clap::Parser;

use cvcwords::config::SearchConfig;
use cvcwords::inventory::{self, LetterSet};
use cvcwords::search::{self, SearchStatus};

/// CVC word-group search
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Maximum number of result groups to generate
    #[arg(short = 'n', long, default_value_t = 20)]
    max_results: usize,

    /// Number of lines per group
    #[arg(long, default_value_t = 15)]
    line_limit: usize,

    /// Number of words per line (at most 10)
    #[arg(long, default_value_t = 10)]
    per_line: usize,

    /// Frequency cutoff threshold; lower is more common, 0 disables
    #[arg(long, default_value_t = 25)]
    freq_cutoff: i32,

    /// Words per line that must be above the cutoff
    #[arg(long, default_value_t = 3)]
    freq_above: usize,

    /// Input word list (`WORD: freq` per line)
    #[arg(short, long, default_value = "words_list.txt")]
    words: String,

    /// Vowel alphabet file
    #[arg(long, default_value = "vowels.txt")]
    vowels: String,

    /// Consonant alphabet file
    #[arg(long, default_value = "consonants.txt")]
    consonants: String,

    /// Output file for generated results
    #[arg(short, long, default_value = "words_result.txt")]
    output: String,

    /// Wall-clock budget in seconds
    #[arg(short, long, default_value_t = 30)]
    time_budget: u64,

    /// Concurrency width (defaults to the CPU count)
    #[arg(long)]
    workers: Option<usize>,

    /// Route branches through a bounded worker pool instead of spawning
    /// one thread per branch
    #[arg(long)]
    use_pool: bool,

    /// Enable debug logging and verbose group dumps
    #[arg(short, long)]
    debug: bool,
}

/// Entry point of the CVC group search CLI.
///
/// Delegates to [`try_main`], catching any errors and printing them in a
/// user-friendly way before exiting with code 1.
fn main() -> ExitCode {
    let cli = Cli::parse();
    cvcwords::log::init_logger(cli.debug);

    if let Err(e) = try_main(&cli) {
        if let Some(search_err) = e.downcast_ref::<search::SearchError>() {
            eprintln!("Error: {}", search_err.display_detailed());
        } else {
            eprintln!("Error: {e}");
        }
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    }
}

/// Core application logic.
///
/// Steps:
/// 1. Load the vowel and consonant alphabets and the word list.
/// 2. Classify the records into the initial pool (fatal on malformed words).
/// 3. Run the search under the configured limits and budget.
/// 4. Print each completed group and write the numbered results to the
///    output file, followed by a final report on stderr.
fn try_main(cli: &Cli) -> Result<(), Box<dyn std::error::Error>> {
    let config = SearchConfig {
        line_limit: cli.line_limit,
        per_line_limit: cli.per_line,
        freq_cutoff: cli.freq_cutoff,
        freq_above: cli.freq_above,
        max_results: cli.max_results,
        time_budget: Duration::from_secs(cli.time_budget),
        worker_count: cli.workers.unwrap_or_else(num_cpus::get),
        use_pool: cli.use_pool,
        verbose: cli.debug,
    };

    log::info!(
        "looking for up to {} groups of {} lines ({} words per line), \
         cutoff {} with {} above per line, running for {}s",
        config.max_results,
        config.line_limit,
        config.per_line_limit,
        config.freq_cutoff,
        config.freq_above,
        cli.time_budget
    );

    let vowels = LetterSet::load_from_path(&cli.vowels)?;
    let consonants = LetterSet::load_from_path(&cli.consonants)?;
    log::info!("vowels ({}): {}", vowels.len(), vowels.ordered());
    log::info!("consonants ({}): {}", consonants.len(), consonants.ordered());

    let records = inventory::load_records(&cli.words)?;
    let pool = inventory::build_pool(&records, &vowels)
        .map_err(search::SearchError::Config)?;
    log::info!("pool of {} words:\n{}", pool.len(), pool);

    let result = search::run_search(pool, &config)?;

    // Numbered results to stdout and to the output file.
    let mut out = std::fs::File::create(&cli.output)?;
    for (i, group) in result.groups.iter().enumerate() {
        println!("{}{group}", i + 1);
        writeln!(out, "{}{group}", i + 1)?;
    }

    match &result.status {
        SearchStatus::FoundEnough => {
            eprintln!(
                "✓ Collected {}/{} requested groups",
                result.groups.len(),
                config.max_results
            );
        }
        SearchStatus::TimedOut { elapsed } => {
            eprintln!(
                "⚠️  Stopped after {:.1}s; {} groups found so far",
                elapsed.as_secs_f64(),
                result.groups.len()
            );
        }
        SearchStatus::PoolExhausted => {
            eprintln!(
                "✓ Search space exhausted; {} groups found",
                result.groups.len()
            );
        }
    }

    eprintln!(
        "Ran {} branches (peak {} live), max depth {}, {} faults, in {:.2}s; results in '{}'",
        result.stats.branches,
        result.stats.peak_live,
        result.stats.max_depth,
        result.stats.faults,
        result.stats.elapsed.as_secs_f64(),
        cli.output
    );

    Ok(())
}
