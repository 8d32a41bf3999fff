use anyhow::{Context, Result};
use skysync::cli::{self, Args, Command};
use skysync::client::NotionClient;
use skysync::config::Config;
use skysync::context::{AppContext, StandardContext};
use skysync::extract::webdriver::WebDriverLauncher;
use skysync::extract::{CalendarExtractor, ExtractorSettings};
use skysync::model::{NormalizedEvent, normalize};
use skysync::pipeline::{NO_EVENTS_MESSAGE, Pipeline};
use skysync::progress::ConsoleProgress;
use skysync::sync::Synchronizer;
use skysync::logging;
use std::env;
use std::process::ExitCode;

#[tokio::main]
async fn main() -> ExitCode {
    let args = match cli::parse_args(env::args().skip(1)) {
        Ok(args) => args,
        Err(e) => {
            eprintln!("Error: {}", e);
            eprintln!("Run 'skysync --help' for usage.");
            return ExitCode::from(2);
        }
    };

    match args.command {
        Command::Help => {
            cli::print_help("skysync");
            return ExitCode::SUCCESS;
        }
        Command::Version => {
            println!("skysync {}", env!("CARGO_PKG_VERSION"));
            return ExitCode::SUCCESS;
        }
        _ => {}
    }

    let ctx = StandardContext::new(args.root.clone());
    if let Err(e) = logging::init(&ctx, args.verbose) {
        eprintln!("Warning: logging unavailable: {}", e);
    }

    match run(&ctx, &args).await {
        Ok(code) => code,
        Err(e) => {
            log::error!("{:#}", e);
            ExitCode::FAILURE
        }
    }
}

async fn run(ctx: &dyn AppContext, args: &Args) -> Result<ExitCode> {
    match args.command {
        Command::Init => {
            let path = Config::write_template(ctx)?;
            println!("Wrote template config to {}", path.display());
            Ok(ExitCode::SUCCESS)
        }
        Command::Check => {
            let config = Config::load(ctx)?;
            match config.validate() {
                Ok(()) => {
                    println!("Configuration OK ({})", Config::path_string(ctx)?);
                    Ok(ExitCode::SUCCESS)
                }
                Err(e) => {
                    println!("{}", e);
                    Ok(ExitCode::FAILURE)
                }
            }
        }
        Command::Extract => {
            let config = Config::load(ctx)?;
            config.validate_for_extraction()?;
            let extractor = CalendarExtractor::new(
                WebDriverLauncher::from_config(&config),
                ExtractorSettings::from_config(&config),
            );
            let extraction = extractor
                .extract()
                .await
                .context("Calendar extraction failed")?;
            let events: Vec<NormalizedEvent> = extraction.events.iter().map(normalize).collect();
            if events.is_empty() {
                println!("{}", NO_EVENTS_MESSAGE);
            } else {
                println!("{}", serde_json::to_string_pretty(&events)?);
            }
            Ok(ExitCode::SUCCESS)
        }
        Command::Sync => {
            let config = Config::load(ctx)?;
            config.validate()?;
            let extractor = CalendarExtractor::new(
                WebDriverLauncher::from_config(&config),
                ExtractorSettings::from_config(&config),
            );
            let store = NotionClient::from_config(&config)?;
            let pipeline = Pipeline::new(extractor, Synchronizer::new(store));

            let mut progress = ConsoleProgress::new();
            let report = pipeline
                .run(&mut progress)
                .await
                .context("Calendar extraction failed")?;
            println!("{}", report.summary());

            if report.has_failures() {
                Ok(ExitCode::FAILURE)
            } else {
                Ok(ExitCode::SUCCESS)
            }
        }
        Command::Help | Command::Version => Ok(ExitCode::SUCCESS),
    }
}
