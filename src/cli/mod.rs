use crate::{
    config::{load_env_file, ConfigOverrides, PlannerConfig},
    core::{prompt_line, run_interactive, SessionEnd},
    presenter::{self, OutputFormat},
    Planner,
};
use anyhow::Context;
use clap::{Arg, ArgAction, ArgMatches, Command};
use std::{
    io::{self, BufRead, Write},
    path::{Path, PathBuf},
};
use tracing::{info, warn, Level};

const DEFAULT_SAVE_PATH: &str = "itinerary.txt";

fn command() -> Command {
    Command::new("itinerary-agent")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Plan a trip by chatting with an LLM over OpenRouter")
        .arg(
            Arg::new("request")
                .help("Initial trip description, e.g. \"5 days in Lisbon for two\"")
                .index(1),
        )
        .arg(
            Arg::new("model")
                .short('m')
                .long("model")
                .value_name("MODEL")
                .help("The OpenRouter model to use (or set ITINERARY_MODEL)"),
        )
        .arg(
            Arg::new("api-key")
                .short('k')
                .long("api-key")
                .value_name("KEY")
                .help("OpenRouter API key (or set OPENROUTER_API_KEY in .env)"),
        )
        .arg(
            Arg::new("base-url")
                .short('u')
                .long("base-url")
                .value_name("URL")
                .help("API base URL (or set OPENROUTER_BASE_URL / OPENAI_BASE_URL)"),
        )
        .arg(
            Arg::new("timeout")
                .short('t')
                .long("timeout")
                .value_name("SECONDS")
                .value_parser(clap::value_parser!(u64))
                .help("Request timeout in seconds [default: 120]"),
        )
        .arg(
            Arg::new("max-turns")
                .short('i')
                .long("max-turns")
                .value_name("COUNT")
                .value_parser(clap::value_parser!(usize))
                .help("Maximum exchanges with the AI service [default: 10]"),
        )
        .arg(
            Arg::new("format")
                .short('f')
                .long("format")
                .value_name("FORMAT")
                .value_parser(clap::value_parser!(OutputFormat))
                .default_value("text")
                .help("Output format"),
        )
        .arg(
            Arg::new("output")
                .short('o')
                .long("output")
                .value_name("PATH")
                .value_parser(clap::value_parser!(PathBuf))
                .help("Save the itinerary to PATH without asking"),
        )
        .arg(
            Arg::new("env-file")
                .long("env-file")
                .value_name("PATH")
                .value_parser(clap::value_parser!(PathBuf))
                .help("Configuration file to load instead of ./.env"),
        )
        .arg(
            Arg::new("verbose")
                .short('v')
                .long("verbose")
                .action(ArgAction::SetTrue)
                .help("Log session progress to stderr"),
        )
}

/// Flags that replace environment settings when given.
fn overrides(matches: &ArgMatches) -> ConfigOverrides {
    ConfigOverrides {
        api_key: matches.get_one::<String>("api-key").cloned(),
        base_url: matches.get_one::<String>("base-url").cloned(),
        model: matches.get_one::<String>("model").cloned(),
        max_turns: matches.get_one::<usize>("max-turns").copied(),
        timeout_secs: matches.get_one::<u64>("timeout").copied(),
    }
}

fn init_tracing(verbose: bool) {
    let level = if verbose { Level::INFO } else { Level::WARN };
    let _ = tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(io::stderr)
        .try_init();
}

/// CLI entry point for the itinerary agent
pub async fn run() -> anyhow::Result<()> {
    let matches = command().get_matches();
    let verbose = matches.get_flag("verbose");
    init_tracing(verbose);

    load_env_file(matches.get_one::<PathBuf>("env-file").map(PathBuf::as_path))?;

    let config = PlannerConfig::resolve(&overrides(&matches), |key| std::env::var(key).ok())
        .context("could not load configuration")?;

    let planner = Planner::from_config(&config).context("invalid configuration")?;
    info!("Using model: {}", planner.model());
    info!("Base URL: {}", config.base_url);

    let format = matches
        .get_one::<OutputFormat>("format")
        .copied()
        .unwrap_or_default();
    let request = matches.get_one::<String>("request").map(String::as_str);

    let stdin = io::stdin();
    let mut input = stdin.lock();
    let mut output = io::stdout();

    writeln!(
        output,
        "🌍 Itinerary planner. Answer the questions, or type 'quit' to cancel.\n"
    )?;

    let mut session = planner.session();
    let outcome = match run_interactive(&mut session, request, &mut input, &mut output)
        .await
        .context("planning session failed")?
    {
        SessionEnd::Completed(outcome) => outcome,
        SessionEnd::Cancelled => return Ok(()),
    };

    if !outcome.schema_warnings.is_empty() {
        warn!(
            "itinerary did not fully match the expected schema ({} issue(s))",
            outcome.schema_warnings.len()
        );
    }
    if verbose {
        eprintln!("{}\n", outcome.replay());
    }

    let rendered = presenter::render(&outcome.itinerary, format)
        .context("failed to render itinerary")?;
    writeln!(output, "{}", rendered)?;

    let path = match matches.get_one::<PathBuf>("output") {
        Some(path) => Some(path.clone()),
        None => ask_save_path(&mut input, &mut output)?,
    };
    if let Some(path) = path {
        save_reporting(&path, &rendered, &mut output)?;
    }

    Ok(())
}

fn ask_save_path<R: BufRead, W: Write>(input: &mut R, output: &mut W) -> anyhow::Result<Option<PathBuf>> {
    let answer = prompt_line(input, output, "Save itinerary to a file? [y/N] ")?;
    if !matches!(answer.as_deref().map(str::to_lowercase).as_deref(), Some("y" | "yes")) {
        return Ok(None);
    }

    let filename = prompt_line(input, output, &format!("Filename [{}]: ", DEFAULT_SAVE_PATH))?
        .filter(|name| !name.is_empty())
        .unwrap_or_else(|| DEFAULT_SAVE_PATH.to_string());
    Ok(Some(PathBuf::from(filename)))
}

/// Save failures are reported but do not fail the run; the itinerary was
/// already printed.
fn save_reporting<W: Write>(path: &Path, rendered: &str, output: &mut W) -> io::Result<()> {
    match presenter::save(path, rendered) {
        Ok(()) => writeln!(output, "💾 Saved itinerary to {}", path.display()),
        Err(err) => {
            warn!("failed to save itinerary: {}", err);
            writeln!(output, "⚠️  Could not save to {}: {}", path.display(), err)
        }
    }
}
