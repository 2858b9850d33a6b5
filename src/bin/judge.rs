//! `judge` — batch CLI driver for the incremental verification engine (spec §6).
//!
//! Loads a directory of `.hdr`/`.bdy` automaton pairs, splits them into plants and
//! specifications by name, builds the universal automaton for the declared alphabet,
//! and runs either the default criteria combination or the full criteria × permutation
//! sweep. Prints a table of per-criteria telemetry (inner-iteration count, peak
//! U-Structure size, peak intermediate-automaton size) and exits non-zero on
//! [`VerificationError`].

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use tabled::{Table, Tabled};

use decentralized_verifier::{
    loader, run_permutation_sweep, verify, CriteriaTuple, LogLevel, Telemetry, VerificationError,
    VerifierConfig,
};

/// Incremental verification of observability for decentralized discrete-event systems.
#[derive(Debug, Parser)]
#[command(name = "judge", version, about)]
struct Cli {
    /// Directory containing `.hdr`/`.bdy` automaton pairs.
    #[arg(long)]
    dir: PathBuf,

    /// File stems (without extension) to treat as specifications; every other
    /// automaton loaded from `--dir` is treated as a plant.
    #[arg(long = "specs", num_args = 1.., required = true)]
    spec_names: Vec<String>,

    /// Number of controllers observing/acting on the system.
    #[arg(long, default_value_t = 1)]
    controllers: usize,

    /// Run the full FirstCriteria x SecondCriteria x ThirdCriteria x FourthCriteria x
    /// permutation sweep instead of a single default combination.
    #[arg(long)]
    sweep: bool,

    /// Increase log verbosity (-v info, -vv debug, -vvv trace).
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

fn init_tracing(log_level: LogLevel) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(log_level.as_filter_str()));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

#[derive(Tabled)]
struct SummaryRow {
    #[tabled(rename = "criteria")]
    criteria: String,
    #[tabled(rename = "runs")]
    runs: usize,
    #[tabled(rename = "inner iters (min/avg/max)")]
    inner_iterations: String,
    #[tabled(rename = "U-Structure states (min/avg/max)")]
    u_structure_states: String,
    #[tabled(rename = "automaton states (min/avg/max)")]
    automaton_states: String,
}

fn min_avg_max_u64(values: &[u64]) -> String {
    let min = values.iter().min().copied().unwrap_or(0);
    let max = values.iter().max().copied().unwrap_or(0);
    let avg = values.iter().sum::<u64>() as f64 / values.len().max(1) as f64;
    format!("{min}/{avg:.1}/{max}")
}

fn min_avg_max_usize(values: &[usize]) -> String {
    let min = values.iter().min().copied().unwrap_or(0);
    let max = values.iter().max().copied().unwrap_or(0);
    let avg = values.iter().sum::<usize>() as f64 / values.len().max(1) as f64;
    format!("{min}/{avg:.1}/{max}")
}

fn summary_table(telemetry: &Telemetry, criteria_list: &[CriteriaTuple]) -> Table {
    let rows: Vec<SummaryRow> = criteria_list
        .iter()
        .map(|&criteria| {
            let entries = telemetry.entries_for(criteria);
            let inner: Vec<u64> = entries.iter().map(|(_, e)| e.inner_iteration_count).collect();
            let u_states: Vec<usize> = entries.iter().map(|(_, e)| e.peak_u_structure_states).collect();
            let a_states: Vec<usize> = entries.iter().map(|(_, e)| e.peak_automaton_states).collect();
            SummaryRow {
                criteria: format!("{criteria:?}"),
                runs: entries.len(),
                inner_iterations: min_avg_max_u64(&inner),
                u_structure_states: min_avg_max_usize(&u_states),
                automaton_states: min_avg_max_usize(&a_states),
            }
        })
        .collect();
    Table::new(rows)
}

fn run(cli: Cli) -> Result<bool, VerificationError> {
    let automata = loader::load_directory(&cli.dir)?;
    let (specs, plants): (Vec<_>, Vec<_>) = automata
        .into_iter()
        .partition(|a| cli.spec_names.iter().any(|name| name == a.label()));
    let alphabet = plants
        .first()
        .or(specs.first())
        .map(|a| a.alphabet_rc())
        .ok_or_else(|| VerificationError::MalformedAutomaton(format!("{} contains no automata", cli.dir.display())))?;
    let g_sigma_star = loader::universal_automaton(&alphabet);

    let config = if cli.sweep {
        VerifierConfig::full_sweep(cli.controllers)
    } else {
        VerifierConfig::default_single(cli.controllers)
    }
    .with_log_level(LogLevel::from_verbosity(cli.verbose));

    let mut telemetry = Telemetry::new();
    let verdict = if config.is_sweep() {
        run_permutation_sweep(&plants, &specs, &g_sigma_star, config.num_controllers, &config.criteria, &mut telemetry)?
    } else {
        verify(plants, specs, g_sigma_star, config.num_controllers, config.criteria[0], &mut telemetry, 0)?
    };

    println!("verdict: {verdict}");
    println!("{}", summary_table(&telemetry, &config.criteria));
    Ok(verdict)
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(LogLevel::from_verbosity(cli.verbose));
    match run(cli) {
        Ok(_) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {err}");
            ExitCode::FAILURE
        }
    }
}
