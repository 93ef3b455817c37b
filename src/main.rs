//! Sift CLI binary entry point.

use std::sync::Arc;

use clap::Parser;
use tokio::io::AsyncBufReadExt;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use sift::agent::prompts::greeting;
use sift::agent::{AgentFactory, ChatSession};
use sift::cli::{describe_event, ChatArgs, Cli, Commands, FetchArgs, ReplInput, SearchArgs, REPL_HELP};
use sift::config::SiftConfig;
use sift::error::Result;
use sift::tools::search::DuckDuckGoLite;
use sift::tools::{PageFetcher, WebSearch};

#[tokio::main]
async fn main() {
    // Logs go to stderr so stdout carries only answers and JSON.
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "sift=warn".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();
    let config = match &cli.config {
        Some(path) => SiftConfig::load_from(path),
        None => SiftConfig::load(),
    };

    let result = match config {
        Ok(config) => match cli.command {
            Commands::Chat(args) => handle_chat(config, args).await,
            Commands::Search(args) => handle_search(config, args).await,
            Commands::Fetch(args) => handle_fetch(config, args).await,
        },
        Err(e) => Err(e),
    };

    if let Err(e) = result {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}

async fn handle_chat(mut config: SiftConfig, args: ChatArgs) -> Result<()> {
    let settings = config.settings_mut();
    if let Some(model) = args.model.clone() {
        settings.model = model;
    }
    if let Some(max) = args.max_iterations {
        settings.max_iterations = max;
    }
    if let Some(t) = args.temperature {
        settings.temperature = Some(t);
    }
    let locale = settings.locale;
    let memory_window = settings.memory_window;

    let factory = AgentFactory::from_config(&config)?;
    let mut executor = factory.build(args.mode());
    if !args.quiet {
        executor = executor.with_event_sink(Arc::new(|event| {
            if let Some(line) = describe_event(&event) {
                eprintln!("{line}");
            }
        }));
    }
    let mut session = ChatSession::new(executor, memory_window).with_greeting(greeting(locale));

    println!("{}", session.greeting());
    let reader = tokio::io::BufReader::new(tokio::io::stdin());
    let mut lines = reader.lines();
    loop {
        eprint!("> ");
        let Some(line) = lines.next_line().await? else {
            break;
        };
        match ReplInput::parse(&line) {
            ReplInput::Empty => continue,
            ReplInput::Quit => break,
            ReplInput::Help => eprintln!("{REPL_HELP}"),
            ReplInput::Clear => {
                session.clear();
                eprintln!("🧹 Conversation cleared.");
                println!("{}", session.greeting());
            }
            ReplInput::Unknown(cmd) => eprintln!("Unknown command: {cmd} (try /help)"),
            ReplInput::Message(text) => match session.send(&text).await {
                Ok(outcome) => println!("{}\n", outcome.output),
                Err(e) => eprintln!("❌ {e}"),
            },
        }
    }
    Ok(())
}

async fn handle_search(config: SiftConfig, args: SearchArgs) -> Result<()> {
    let search = WebSearch::from_settings(Arc::new(DuckDuckGoLite::default()), config.settings());
    let results = search.search(&args.query, args.n).await?;
    println!("{}", serde_json::to_string_pretty(&results)?);
    Ok(())
}

async fn handle_fetch(config: SiftConfig, args: FetchArgs) -> Result<()> {
    let fetcher = PageFetcher::from_settings(config.settings());
    let result = fetcher.fetch(&args.url, args.page).await;
    println!("{}", serde_json::to_string_pretty(&result)?);
    Ok(())
}
