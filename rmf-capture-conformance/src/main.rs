//! Conformance runner for the RMF audio capture HAL.
//!
//! Runs the registered suites against the simulated reference device.
//!
//! **Usage:**
//! ```bash
//! rmf-capture-conformance [--profile <FILE>] [--level l1|l2|l3|all]... [--suite <NAME>] [--test <NAME>]
//!                         [--list] [--aux] [--positive-only] [--artifact-dir <DIR>] [--report <FILE>] [--verbose]
//! ```
//!
//! # Exit Codes
//!
//! - 0: every executed test passed
//! - 1: at least one test failed
//! - 2: profile or command-line error

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, ValueEnum};

use rmf_capture_conformance::harness::TestCase;
use rmf_capture_conformance::{suites, ConformanceError, DeviceProfile, Filter, Level, Runner, Suite};

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum LevelArg {
    L1,
    L2,
    L3,
    All,
}

#[derive(Parser, Debug)]
#[command(name = "rmf-capture-conformance")]
#[command(about = "L1/L2/L3 conformance suites for the RMF audio capture HAL")]
struct Args {
    /// Device profile (TOML)
    #[arg(long, value_name = "FILE", env = "RMF_CAPTURE_PROFILE")]
    profile: Option<PathBuf>,

    /// Levels to run; repeat for several
    #[arg(long, value_enum, default_value = "all")]
    level: Vec<LevelArg>,

    /// Only suites whose name contains this
    #[arg(long)]
    suite: Option<String>,

    /// Only tests whose name contains this
    #[arg(long)]
    test: Option<String>,

    /// List registered suites and tests without running them
    #[arg(long)]
    list: bool,

    /// Treat the device as having an auxiliary stream
    #[arg(long)]
    aux: bool,

    /// Also register the L1 positive-only suite
    #[arg(long)]
    positive_only: bool,

    /// Directory for WAV artifacts
    #[arg(long, value_name = "DIR")]
    artifact_dir: Option<PathBuf>,

    /// Write a JSON run summary
    #[arg(long, value_name = "FILE")]
    report: Option<PathBuf>,

    /// Log every control call
    #[arg(long, short)]
    verbose: bool,
}

fn resolve_profile(args: &Args) -> Result<DeviceProfile, ConformanceError> {
    let mut profile = match args.profile {
        Some(ref path) => DeviceProfile::load(path)?,
        None => DeviceProfile::default(),
    };
    profile.apply_env();
    if args.aux {
        profile.auxsupport = true;
    }
    if args.positive_only {
        profile.positive_only_suite = true;
    }
    if let Some(ref dir) = args.artifact_dir {
        profile.artifact_dir = dir.clone();
    }
    Ok(profile)
}

fn levels(args: &[LevelArg]) -> Vec<Level> {
    if args.is_empty() || args.contains(&LevelArg::All) {
        return Vec::new();
    }
    let mut levels: Vec<Level> = args
        .iter()
        .filter_map(|l| match l {
            LevelArg::L1 => Some(Level::L1),
            LevelArg::L2 => Some(Level::L2),
            LevelArg::L3 => Some(Level::L3),
            LevelArg::All => None,
        })
        .collect();
    levels.sort();
    levels.dedup();
    levels
}

fn print_listing(suites: &[Suite], filter: &Filter) {
    for suite in suites.iter().filter(|s| filter.admits_suite(s)) {
        println!("{} ({})", suite.name, suite.level);
        let tests: Vec<&TestCase> = suite.tests.iter().filter(|t| filter.admits_test(t)).collect();
        for test in tests {
            let kind = if test.positive { "positive" } else { "negative" };
            println!("  {} {:<36} {}", suite.tag(test), test.name, kind);
        }
    }
}

fn main() -> ExitCode {
    let args = Args::parse();

    let default_filter = if args.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter)).init();

    let profile = match resolve_profile(&args) {
        Ok(profile) => profile,
        Err(e) => {
            log::error!("{}", e);
            return ExitCode::from(2);
        }
    };
    log::debug!("Resolved profile: {:?}", profile);

    let filter = Filter {
        levels: levels(&args.level),
        suite: args.suite.clone(),
        test: args.test.clone(),
    };
    let suites = suites::register(&profile);

    if args.list {
        print_listing(&suites, &filter);
        return ExitCode::SUCCESS;
    }

    let hal = rmf_capture_sim::reference_registry(profile.registry_options());
    let report = Runner::new(&hal, &profile).run(&suites, &filter);
    println!("{}", report.summary_table());

    if let Some(ref path) = args.report {
        match report.export_json(path) {
            Ok(()) => log::info!("Run summary written to {}", path.display()),
            Err(e) => {
                log::error!("Failed to write {}: {}", path.display(), e);
                return ExitCode::from(2);
            }
        }
    }

    if report.all_passed() {
        ExitCode::SUCCESS
    } else {
        ExitCode::from(1)
    }
}
