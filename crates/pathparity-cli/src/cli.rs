//! Argument parsing and dispatch

use crate::commands::{corpus_listing, resolve_listing, App, CleanupSummary};
use crate::config::Settings;
use crate::logging::LogFormat;
use anyhow::Context;
use clap::{value_parser, Arg, ArgAction, ArgMatches, Command};
use pathparity_core::{BackendId, Corpus, Operation};
use pathparity_probe::ProbeRun;
use pathparity_report::render_summary;
use std::path::PathBuf;
use std::process::ExitCode;

/// Exit code for a run interrupted by Ctrl-C
const EXIT_INTERRUPTED: u8 = 130;

fn parse_operation(s: &str) -> Result<Operation, String> {
    s.parse()
}

fn parse_log_format(s: &str) -> Result<LogFormat, String> {
    s.parse()
}

fn only_arg() -> Arg {
    Arg::new("only")
        .long("only")
        .value_name("OPERATION")
        .action(ArgAction::Append)
        .value_parser(parse_operation)
        .help("Restrict to scenarios of this operation (write, partial-update, batch-update)")
}

/// The `pathparity` command tree
#[must_use]
pub fn command() -> Command {
    Command::new("pathparity")
        .version(pathparity_core::VERSION)
        .about("Differential verification of path resolution across two key-value store clients")
        .subcommand_required(true)
        .arg_required_else_help(true)
        .arg(
            Arg::new("config")
                .long("config")
                .short('c')
                .global(true)
                .value_parser(value_parser!(PathBuf))
                .help("TOML settings file"),
        )
        .arg(
            Arg::new("verbose")
                .long("verbose")
                .short('v')
                .global(true)
                .action(ArgAction::Count)
                .help("More logging (-v debug, -vv trace); RUST_LOG wins when set"),
        )
        .arg(
            Arg::new("log-format")
                .long("log-format")
                .global(true)
                .default_value("text")
                .value_parser(parse_log_format)
                .help("Log output format: text or json"),
        )
        .arg(
            Arg::new("results-dir")
                .long("results-dir")
                .global(true)
                .value_parser(value_parser!(PathBuf))
                .help("Directory for runs, analyses and reports"),
        )
        .arg(
            Arg::new("scenario-delay-ms")
                .long("scenario-delay-ms")
                .global(true)
                .value_parser(value_parser!(u64))
                .help("Pause between consecutive scenarios"),
        )
        .subcommand(
            Command::new("run-a")
                .about("Run the corpus against backend A and persist the records")
                .arg(only_arg()),
        )
        .subcommand(
            Command::new("run-b")
                .about("Run the corpus against backend B and persist the records")
                .arg(only_arg()),
        )
        .subcommand(
            Command::new("run-both")
                .about("Run both backends (concurrently unless they share a store), then analyze")
                .arg(only_arg()),
        )
        .subcommand(
            Command::new("analyze")
                .about("Analyze the latest persisted run of each backend")
                .arg(only_arg()),
        )
        .subcommand(Command::new("report").about("Render the latest analysis to Markdown"))
        .subcommand(Command::new("corpus").about("List the scenario corpus"))
        .subcommand(
            Command::new("resolve")
                .about("Print the candidate locations for a base path and update key")
                .arg(Arg::new("base").required(true).allow_hyphen_values(true))
                .arg(Arg::new("key").required(true).allow_hyphen_values(true)),
        )
        .subcommand(
            Command::new("setup")
                .about("Clear the corpus roots and write the fixture tree")
                .arg(backend_arg()),
        )
        .subcommand(
            Command::new("cleanup")
                .about("Delete the top-level segments the corpus writes to")
                .arg(backend_arg()),
        )
}

fn backend_arg() -> Arg {
    Arg::new("backend")
        .long("backend")
        .required(true)
        .value_parser(["a", "b"])
        .help("Backend to act on")
}

fn backend_of(args: &ArgMatches) -> BackendId {
    match args.get_one::<String>("backend").map(String::as_str) {
        Some("b") => BackendId::B,
        _ => BackendId::A,
    }
}

fn print_cleanup(backend: BackendId, summary: &CleanupSummary) {
    println!(
        "Backend {backend}: deleted {} paths, {} failed",
        summary.deleted.len(),
        summary.failed.len()
    );
    for (root, error) in &summary.failed {
        eprintln!("  /{root}: {error}");
    }
}

/// Verbosity and log format requested on the command line
#[must_use]
pub fn log_options(matches: &ArgMatches) -> (u8, LogFormat) {
    let verbosity = matches.get_count("verbose");
    let format = matches
        .get_one::<LogFormat>("log-format")
        .copied()
        .unwrap_or_default();
    (verbosity, format)
}

/// Settings from file and environment, then command-line flags
///
/// # Errors
/// Any configuration error.
pub fn settings_from(matches: &ArgMatches) -> anyhow::Result<Settings> {
    let config = matches.get_one::<PathBuf>("config");
    let mut settings = Settings::load(config.map(PathBuf::as_path))?;
    if let Some(dir) = matches.get_one::<PathBuf>("results-dir") {
        settings = settings.with_results_dir(dir.clone());
    }
    if let Some(millis) = matches.get_one::<u64>("scenario-delay-ms") {
        settings = settings.with_scenario_delay_ms(*millis);
    }
    Ok(settings)
}

fn only_operations(args: &ArgMatches) -> Vec<Operation> {
    args.try_get_many::<Operation>("only")
        .ok()
        .flatten()
        .map(|ops| ops.copied().collect())
        .unwrap_or_default()
}

fn corpus_for(args: &ArgMatches) -> anyhow::Result<Corpus> {
    let corpus = Corpus::standard().context("building the scenario corpus")?;
    let only = only_operations(args);
    if only.is_empty() {
        Ok(corpus)
    } else {
        Ok(corpus.retain_operations(&only))
    }
}

fn print_run(run: &ProbeRun) {
    println!(
        "Backend {} ({}): {} records, {} successful writes{}",
        run.backend,
        run.adapter,
        run.summary.total,
        run.summary.successful,
        if run.cancelled { ", interrupted" } else { "" }
    );
}

fn spawn_interrupt_handler(app: &App) {
    let cancel = app.cancel_handle();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("interrupt received, keeping completed records");
            cancel.cancel();
        }
    });
}

/// Execute the parsed command
///
/// # Errors
/// Anything the subcommand fails with; callers print it and exit non-zero.
pub async fn execute(matches: &ArgMatches) -> anyhow::Result<ExitCode> {
    let Some((name, args)) = matches.subcommand() else {
        anyhow::bail!("no subcommand given");
    };

    match name {
        "corpus" => {
            print!("{}", corpus_listing(&Corpus::standard()?));
            return Ok(ExitCode::SUCCESS);
        }
        "resolve" => {
            let base = args.get_one::<String>("base").map_or("", String::as_str);
            let key = args.get_one::<String>("key").map_or("", String::as_str);
            print!("{}", resolve_listing(base, key));
            return Ok(ExitCode::SUCCESS);
        }
        _ => {}
    }

    let app = App::new(settings_from(matches)?)?;

    match name {
        "run-a" | "run-b" => {
            let backend = if name == "run-a" { BackendId::A } else { BackendId::B };
            spawn_interrupt_handler(&app);
            let run = app.run_backend(backend, &corpus_for(args)?).await?;
            print_run(&run);
            Ok(if run.cancelled {
                ExitCode::from(EXIT_INTERRUPTED)
            } else {
                ExitCode::SUCCESS
            })
        }
        "run-both" => {
            spawn_interrupt_handler(&app);
            let analysis = app.run_both(&corpus_for(args)?).await?;
            print!("{}", render_summary(&analysis.report));
            Ok(if analysis.is_partial() {
                ExitCode::from(EXIT_INTERRUPTED)
            } else {
                ExitCode::SUCCESS
            })
        }
        "analyze" => {
            let corpus = Corpus::standard().context("building the scenario corpus")?;
            let analysis = app.analyze_latest(&corpus, &only_operations(args))?;
            print!("{}", render_summary(&analysis.report));
            Ok(ExitCode::SUCCESS)
        }
        "report" => {
            let output = app.report_latest()?;
            print!("{}", render_summary(&output.analysis.report));
            println!("Report written to {}", output.path.display());
            Ok(ExitCode::SUCCESS)
        }
        "setup" => {
            let backend = backend_of(args);
            let cleared = app.setup(backend, &Corpus::standard()?).await?;
            print_cleanup(backend, &cleared);
            println!("Fixture tree written to {}", pathparity_core::FIXTURE_PATH);
            Ok(ExitCode::SUCCESS)
        }
        "cleanup" => {
            let backend = backend_of(args);
            let summary = app.cleanup(backend, &Corpus::standard()?).await;
            print_cleanup(backend, &summary);
            Ok(if summary.failed.is_empty() {
                ExitCode::SUCCESS
            } else {
                ExitCode::FAILURE
            })
        }
        other => anyhow::bail!("unknown subcommand: {other}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn command_tree_is_consistent() {
        command().debug_assert();
    }

    #[test]
    fn only_flag_filters_operations() {
        let matches = command()
            .try_get_matches_from(["pathparity", "run-a", "--only", "write", "--only", "batch"])
            .unwrap();
        let (_, args) = matches.subcommand().unwrap();
        let corpus = corpus_for(args).unwrap();
        assert!(!corpus.is_empty());
        assert!(corpus
            .scenarios()
            .iter()
            .all(|s| s.operation() != Operation::PartialUpdate));
    }

    #[test]
    fn global_flags_reach_settings() {
        let matches = command()
            .try_get_matches_from([
                "pathparity",
                "analyze",
                "--results-dir",
                "/tmp/pp-out",
                "--scenario-delay-ms",
                "7",
                "-vv",
                "--log-format",
                "json",
            ])
            .unwrap();
        let settings = settings_from(&matches).unwrap();
        assert_eq!(settings.results_dir, PathBuf::from("/tmp/pp-out"));
        assert_eq!(settings.scenario_delay_ms, 7);
        assert_eq!(log_options(&matches), (2, LogFormat::Json));
    }

    #[test]
    fn unknown_operation_is_rejected() {
        let err = command()
            .try_get_matches_from(["pathparity", "run-both", "--only", "delete"])
            .unwrap_err();
        assert!(err.to_string().contains("unknown operation"));
    }

    #[test]
    fn setup_and_cleanup_take_a_backend() {
        let matches = command()
            .try_get_matches_from(["pathparity", "setup", "--backend", "b"])
            .unwrap();
        let (_, args) = matches.subcommand().unwrap();
        assert_eq!(backend_of(args), BackendId::B);

        assert!(command()
            .try_get_matches_from(["pathparity", "cleanup", "--backend", "c"])
            .is_err());
    }

    #[test]
    fn analyze_accepts_operation_filter() {
        let matches = command()
            .try_get_matches_from(["pathparity", "analyze", "--only", "write"])
            .unwrap();
        let (_, args) = matches.subcommand().unwrap();
        assert_eq!(only_operations(args), [Operation::Write]);
    }

    #[test]
    fn resolve_accepts_leading_slashes() {
        let matches = command()
            .try_get_matches_from(["pathparity", "resolve", "/", "/users/u1"])
            .unwrap();
        let (name, args) = matches.subcommand().unwrap();
        assert_eq!(name, "resolve");
        assert_eq!(args.get_one::<String>("key").unwrap(), "/users/u1");
    }
}
