mod instance;
mod result;

use std::fs::File;
use std::io::Write;
use std::path::PathBuf;

use clap::Parser;
use flow_profile_core::convert_case::Case;
use flow_profile_core::profile::Explanation;
use flow_profile_core::profile::LimitViolation;
use flow_profile_core::profile::ProfileOptions;
use flow_profile_core::profile::TransactionId;
use flow_profile_core::profile::UpdateStrategy;
use flow_profile_core::statistics::StatisticOptions;
use flow_profile_core::ProfileBuilder;
use itertools::Itertools;
use log::error;
use log::info;
use log::LevelFilter;

use crate::instance::parse_instance;
use crate::instance::Instance;
use crate::result::CliError;
use crate::result::CliResult;

#[derive(Debug, Parser)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// The instance to bound: one `resource`, `produce`, `consume` or `precede` directive per
    /// line, with `%` starting a comment.
    instance_path: PathBuf,

    /// Enables logging of the construction and update of the flow graphs.
    #[arg(short = 'v', long = "verbose")]
    verbose: bool,

    /// Prints, for every instant, the transactions which occur in the extreme schedules and the
    /// ones which carry the minimum cut.
    #[arg(long = "explain")]
    explain: bool,

    /// Whether the flow graphs are kept between profile builds or rebuilt every time.
    #[arg(long = "strategy", value_enum, default_value_t)]
    strategy: UpdateStrategy,

    /// Prints the statistics of the builder and the flow solver after the profile.
    #[arg(short = 's', long = "log-statistics")]
    log_statistics: bool,
}

fn configure_logging(verbose: bool) {
    let level_filter = if verbose {
        LevelFilter::Debug
    } else {
        LevelFilter::Warn
    };

    env_logger::Builder::new()
        .format(move |buf, record| {
            write!(buf, "% ")?;

            writeln!(buf, "{}", record.args())
        })
        .filter_level(level_filter)
        .target(env_logger::Target::Stdout)
        .init();
    info!("Logging successfully configured");
}

fn main() {
    match run() {
        Ok(()) => {}
        Err(e) => {
            error!("Execution failed, error: {}", e);
            std::process::exit(1);
        }
    }
}

fn run() -> CliResult<()> {
    let args = Args::parse();
    configure_logging(args.verbose);

    let file = File::open(&args.instance_path).map_err(|err| {
        CliError::FileReadingError(err, args.instance_path.display().to_string())
    })?;
    let instance = parse_instance(file)?;
    info!(
        "Read {} transactions and {} precedences",
        instance.transactions.len(),
        instance.precedences.len()
    );

    let mut builder = ProfileBuilder::new(
        instance.limits,
        ProfileOptions::new(args.strategy, args.explain),
    );
    let bounds = builder.build_or_update_profile(&instance.transactions, &instance.precedences)?;

    for instant in bounds.instants() {
        println!("{instant}");
        if let Some(explanation) = &instant.explanation {
            print_explanation(&instance, explanation);
        }
    }

    if let Some(infeasible) = bounds.infeasibility(&instance.limits) {
        println!(
            "infeasible at {}: {} (bound {})",
            infeasible.time,
            describe(infeasible.violation),
            infeasible.bound
        );
    } else {
        let flaws = bounds.flaws(&instance.limits);
        println!("feasible, {} flaws", flaws.len());
        for flaw in flaws {
            println!("  flaw at {}: {}", flaw.time, describe(flaw.violation));
        }
    }

    if args.log_statistics {
        let mut options = StatisticOptions::new(
            "%% stat:",
            Some("%% stat-end".to_owned()),
            Some(Case::Camel),
            None,
        );
        builder.log_statistics(&mut options);
    }

    Ok(())
}

fn print_explanation(instance: &Instance, explanation: &Explanation) {
    let names = |ids: &[TransactionId]| ids.iter().map(|&id| instance.name(id)).join(" ");
    println!(
        "  lower: occurred [{}] cut [{}]",
        names(&explanation.lower_occurred),
        names(&explanation.lower_cut)
    );
    println!(
        "  upper: occurred [{}] cut [{}]",
        names(&explanation.upper_occurred),
        names(&explanation.upper_cut)
    );
}

fn describe(violation: LimitViolation) -> &'static str {
    match violation {
        LimitViolation::BelowLowerLimit => "below the lower limit",
        LimitViolation::AboveUpperLimit => "above the upper limit",
    }
}
