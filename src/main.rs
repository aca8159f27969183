use std::io::Write;
use std::path::PathBuf;

use anyhow::{Context, Result};
use buddy_agent::WeatherAgent;
use buddy_core::{AppError, Config, ConfigError};
use buddy_eval::{builtin_cases, load_jsonl, write_csv, EvalMode, Evaluator};
use buddy_weather::{WeatherCache, WeatherProvider};
use clap::{ArgAction, Parser, Subcommand};
use tokio::io::{AsyncBufReadExt, BufReader};

const FAREWELL: &str = "Take care and have a lovely day! \u{1F31E}";

#[derive(Debug, Parser)]
#[command(name = "weather-buddy", version, about)]
struct Cli {
    /// Configuration file (default: the user config directory)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// More log output on stderr (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    /// Location used when a question names no place
    #[arg(long, global = true)]
    location: Option<String>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Chat about the weather (default)
    Chat,
    /// Ask a single question
    Ask {
        /// Also print the short summary
        #[arg(long)]
        summary: bool,
        #[arg(required = true)]
        question: Vec<String>,
    },
    /// Run evaluation prompts and write the results to CSV
    Eval {
        /// JSONL file with {"prompt": ..., "expected_location": ...} lines
        #[arg(long)]
        prompts: Option<PathBuf>,
        #[arg(long, default_value = "forecast_results.csv")]
        output: PathBuf,
        /// Only run intent extraction, without fetching forecasts
        #[arg(long)]
        offline: bool,
        /// Prefix the CSV with a UTF-8 byte order mark for Excel
        #[arg(long)]
        excel: bool,
    },
    /// Show the configuration
    Config {
        /// Print only the configuration file path
        #[arg(long)]
        path: bool,
        /// Check the configuration and report problems
        #[arg(long)]
        validate: bool,
    },
}

/// Tell the user what went wrong in plain words; the details go to the
/// returned error.
fn fatal(error: AppError) -> anyhow::Error {
    eprintln!("{}", error.user_message());
    error.into()
}

fn log_level(verbose: u8, config: &Config) -> &str {
    match verbose {
        0 => &config.logging.level,
        1 => "info",
        2 => "debug",
        _ => "trace",
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut config = Config::load_at(cli.config.as_deref()).map_err(|e| {
        match e.downcast::<ConfigError>() {
            Ok(config_error) => fatal(AppError::Config(config_error)),
            Err(other) => fatal(AppError::Other(other)),
        }
    })?;
    if let Some(location) = &cli.location {
        config.assistant.default_location = location.clone();
    }
    buddy_core::init(log_level(cli.verbose, &config))?;

    let command = cli.command.unwrap_or(Command::Chat);
    if let Command::Config { path, validate } = command {
        return show_config(&config, cli.config, path, validate);
    }

    let validation = config.validate();
    if !validation.is_valid() {
        return Err(fatal(ConfigError::Invalid(validation.error_summary()).into()));
    }
    for warning in &validation.warnings {
        tracing::warn!("Config warning: {}", warning);
    }

    let provider = WeatherProvider::new(&config.weather)
        .context("Failed to create weather provider")?
        .with_cache(WeatherCache::open(
            &config.cache_path(),
            u64::from(config.weather.cache_minutes),
        ));
    let mut agent = WeatherAgent::from_config(provider, &config);

    match command {
        Command::Ask { summary, question } => {
            let response = agent.handle(&question.join(" ")).await;
            println!("{}", response.reply);
            if summary {
                if let Some(text) = response.summary {
                    println!("\nSummary: {}", text);
                }
            }
        }
        Command::Eval {
            prompts,
            output,
            offline,
            excel,
        } => {
            let cases = match prompts {
                Some(path) => load_jsonl(&path)
                    .with_context(|| format!("Failed to load prompts from {}", path.display()))?,
                None => builtin_cases(),
            };
            let mode = if offline {
                EvalMode::Offline
            } else {
                EvalMode::Live
            };

            let report = Evaluator::new(agent).run(&cases, mode).await;
            write_csv(&output, &report.records, excel)
                .with_context(|| format!("Failed to write {}", output.display()))?;

            println!("{}", report.describe());
            println!("Results saved to {}", output.display());
        }
        Command::Chat | Command::Config { .. } => chat(&mut agent).await?,
    }

    Ok(())
}

async fn chat(agent: &mut WeatherAgent<WeatherProvider>) -> Result<()> {
    println!("\u{1F44B} Hello, dear! I\u{2019}m your Weather Buddy.");
    println!("You can ask me things like:");
    println!("  \u{2192} 'Will it rain in Toronto?'");
    println!("  \u{2192} 'Weather San Diego this evening'");
    println!("  \u{2192} 'I\u{2019}m going out in 6 hours in Paris, do I need an umbrella?'");
    println!("Type 'exit' anytime to quit.\n");

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        print!("You: ");
        std::io::stdout().flush()?;

        let Some(line) = lines.next_line().await? else {
            println!("\nBuddy: {}", FAREWELL);
            break;
        };
        let input = line.trim();
        if input.is_empty() {
            continue;
        }
        if input.eq_ignore_ascii_case("exit") || input.eq_ignore_ascii_case("quit") {
            println!("Buddy: {}", FAREWELL);
            break;
        }

        let response = agent.handle(input).await;
        println!("Buddy: {}\n", response.reply);
    }

    tracing::info!("Chat ended after {} turns", agent.conversation().len());
    Ok(())
}

fn show_config(
    config: &Config,
    explicit_path: Option<PathBuf>,
    path_only: bool,
    validate: bool,
) -> Result<()> {
    let path = match explicit_path {
        Some(path) => path,
        None => Config::config_path()?,
    };
    if path_only {
        println!("{}", path.display());
        return Ok(());
    }

    if validate {
        let validation = config.validate();
        for warning in &validation.warnings {
            println!("warning: {}", warning);
        }
        if !validation.is_valid() {
            anyhow::bail!("{}", validation.error_summary());
        }
        println!("{} is valid", path.display());
        return Ok(());
    }

    println!("# {}", path.display());
    print!("{}", config.to_toml()?);
    Ok(())
}
