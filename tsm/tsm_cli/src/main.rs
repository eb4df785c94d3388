use std::{
    env, fs,
    io::{self, Read},
    path::{Path, PathBuf},
    sync::Arc,
};

use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand};
use serde_json::json;
use tokio::runtime::Runtime;
use tsm_events::FileEventPublisher;
use tsm_logging::LogLevel;
use tsm_simplifier::{
    adapters::default_collaborators,
    align_importance,
    cefr::UnratedClassifier,
    oracle::LEGAL_SYSTEM_MESSAGE,
    split_sentences, CefrLevel, DifficultyClassifier, Simplifier, SimplifierConfig,
    SimplifierTelemetry, TextAnalyzer, ZipfDifficultyClassifier,
};

const API_KEY_VAR: &str = "OPENAI_API_KEY";

#[derive(Parser, Debug)]
#[command(name = "tsm", version, about = "Progressive simplification ladders for legal text")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Simplifies every paragraph and labels each word with importance and CEFR level.
    Analyze(AnalyzeArgs),
    /// Prints the simplification ladder of the input.
    Ladder(RunArgs),
    /// Aligns ladder levels given on the command line (no oracle calls).
    Align {
        /// Level 0 followed by up to four shorter levels.
        #[arg(required = true, num_args = 1..=5)]
        levels: Vec<String>,
    },
    /// Prints the sentences of the input, one per line.
    Split {
        #[arg(long, default_value = "-")]
        input: String,
    },
}

#[derive(Args, Debug)]
struct RunArgs {
    /// Input file, or `-` for stdin.
    #[arg(long, default_value = "-")]
    input: String,
    /// TOML configuration file.
    #[arg(long)]
    config: Option<PathBuf>,
    /// JSON-lines log file.
    #[arg(long)]
    log_file: Option<PathBuf>,
    /// JSON-lines event file.
    #[arg(long)]
    event_log: Option<PathBuf>,
    /// Include per-round debug records in the log.
    #[arg(long)]
    verbose: bool,
    /// Use the built-in legal system message.
    #[arg(long, conflicts_with = "system_message")]
    legal: bool,
    /// Custom system message for rewrite requests.
    #[arg(long)]
    system_message: Option<String>,
}

#[derive(Args, Debug)]
struct AnalyzeArgs {
    #[command(flatten)]
    run: RunArgs,
    /// Reader level (A1..C2); words above it are flagged as difficult.
    #[arg(long)]
    user_level: Option<String>,
    /// JSON word frequency table (`{"frequencies": {...}}`).
    #[arg(long)]
    frequencies: Option<PathBuf>,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    match cli.command {
        Commands::Analyze(args) => handle_analyze(args),
        Commands::Ladder(args) => handle_ladder(&args),
        Commands::Align { levels } => {
            let tokens = align_levels(&levels);
            println!("{}", serde_json::to_string_pretty(&tokens)?);
            Ok(())
        }
        Commands::Split { input } => {
            for sentence in split_sentences(&read_input(&input)?) {
                println!("{sentence}");
            }
            Ok(())
        }
    }
}

fn handle_analyze(args: AnalyzeArgs) -> Result<()> {
    let user_level = args
        .user_level
        .as_deref()
        .map(str::parse::<CefrLevel>)
        .transpose()?;
    let difficulty: Arc<dyn DifficultyClassifier> = match &args.frequencies {
        Some(path) => Arc::new(ZipfDifficultyClassifier::load(path)?),
        None => Arc::new(UnratedClassifier),
    };
    let text = read_input(&args.run.input)?;
    let api_key = api_key()?;
    let (simplifier, telemetry) = build_simplifier(&args.run)?;
    let mut analyzer = TextAnalyzer::new(simplifier, difficulty);
    if let Some(telemetry) = telemetry {
        analyzer = analyzer.with_telemetry(telemetry);
    }
    let system_message = system_message(&args.run);

    let runtime = Runtime::new()?;
    let report = runtime.block_on(analyzer.analyze(
        &text,
        user_level,
        &api_key,
        system_message.as_deref(),
    ))?;
    println!(
        "{}",
        serde_json::to_string_pretty(&json!({ "tokens": report.tokens }))?
    );
    Ok(())
}

fn handle_ladder(args: &RunArgs) -> Result<()> {
    let text = read_input(&args.input)?;
    let api_key = api_key()?;
    let (simplifier, _) = build_simplifier(args)?;
    let system_message = system_message(args);

    let runtime = Runtime::new()?;
    let ladder =
        runtime.block_on(simplifier.simplify(&text, &api_key, system_message.as_deref()))?;
    println!("{}", serde_json::to_string_pretty(&ladder.as_level_map())?);
    Ok(())
}

fn build_simplifier(args: &RunArgs) -> Result<(Simplifier, Option<SimplifierTelemetry>)> {
    let config = match &args.config {
        Some(path) => SimplifierConfig::load(path)?,
        None => SimplifierConfig::default(),
    };
    let collaborators =
        default_collaborators(&config.oracle).context("building the chat-completions client")?;

    let telemetry = if args.log_file.is_some() || args.event_log.is_some() {
        let mut builder = SimplifierTelemetry::builder("tsm").min_level(if args.verbose {
            LogLevel::Debug
        } else {
            LogLevel::Info
        });
        if let Some(path) = &args.log_file {
            builder = builder.log_path(path);
        }
        if let Some(path) = &args.event_log {
            builder = builder.event_publisher(Arc::new(FileEventPublisher::new(path)?));
        }
        Some(builder.build()?)
    } else {
        None
    };

    let mut builder = Simplifier::builder(collaborators).config(config);
    if let Some(telemetry) = &telemetry {
        builder = builder.telemetry(telemetry.clone());
    }
    Ok((builder.build()?, telemetry))
}

fn system_message(args: &RunArgs) -> Option<String> {
    if args.legal {
        Some(LEGAL_SYSTEM_MESSAGE.to_string())
    } else {
        args.system_message.clone()
    }
}

fn api_key() -> Result<String> {
    match env::var(API_KEY_VAR) {
        Ok(key) if !key.trim().is_empty() => Ok(key),
        _ => bail!("{API_KEY_VAR} is not set"),
    }
}

fn read_input(input: &str) -> Result<String> {
    if input == "-" {
        let mut buffer = String::new();
        io::stdin()
            .read_to_string(&mut buffer)
            .context("reading stdin")?;
        return Ok(buffer);
    }
    read_file(Path::new(input))
}

fn read_file(path: &Path) -> Result<String> {
    fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))
}

fn align_levels(levels: &[String]) -> Vec<tsm_simplifier::WordImportance> {
    let level = |index: usize| levels.get(index).map_or("", String::as_str);
    align_importance(level(0), [level(1), level(2), level(3), level(4)])
}
