use clap::{Parser, Subcommand};
use std::path::Path;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};

use jarvis::application::errors::BotError;
use jarvis::application::messaging::{ChannelRegistry, Dispatcher};
use jarvis::application::services::{ActionRegistry, Directory};
use jarvis::infrastructure::adapters::ConsoleChannel;
use jarvis::infrastructure::config::Config;
use jarvis::infrastructure::storage::{self, BrainWriter};
use jarvis::plugins::{CorePlugin, PluginManager};

#[derive(Parser)]
#[command(name = "jarvis")]
#[command(about = "A chat-bot command framework", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Config file path
    #[arg(short, long, default_value = "config.yaml")]
    config: String,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the bot on the console
    Run,
    /// Show version
    Version,
    /// Generate default config
    InitConfig,
    /// Print registered actions as JSON
    Actions,
}

fn main() {
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Run => load_config(&cli.config).and_then(run_bot),
        Commands::Version => {
            println!("jarvis v{}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
        Commands::InitConfig => init_config(),
        Commands::Actions => load_config(&cli.config).and_then(print_actions),
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn init_logging(level: &str) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(level));

    tracing_subscriber::fmt()
        .with_target(false)
        .with_env_filter(filter)
        .init();
}

fn load_config(path: &str) -> Result<Config, BotError> {
    let config = if Path::new(path).exists() {
        Config::load(path)?.with_env()?
    } else {
        Config::load_env()?
    };
    Ok(config)
}

fn plugin_manager(config: &Config, registry: Arc<ActionRegistry>) -> Result<PluginManager, BotError> {
    let manager = PluginManager::new(registry.clone(), config.modules.clone());
    manager.register(CorePlugin::new(registry, config.bot.name.as_str()))?;
    Ok(manager)
}

fn run_bot(config: Config) -> Result<(), BotError> {
    init_logging(&config.bot.log_level);
    tracing::info!("Starting {}", config.bot.name);

    let rt = tokio::runtime::Runtime::new().map_err(|e| BotError::Internal(e.to_string()))?;
    rt.block_on(serve(config))
}

async fn serve(config: Config) -> Result<(), BotError> {
    let brain = storage::open_brain(&config.brain).await?;

    let directory = Arc::new(Directory::new());
    let (writer, writer_task) = BrainWriter::spawn(brain.clone());
    directory.subscribe(writer)?;

    storage::load_directory(brain.as_ref(), &directory).await?;
    storage::seed_directory(&directory, &config.directory.users, &config.directory.groups)?;

    let registry = Arc::new(ActionRegistry::new());
    let manager = plugin_manager(&config, registry.clone())?;
    manager.load_all()?;

    let console = Arc::new(
        ConsoleChannel::new(config.console.channel.as_str(), config.console.identity.as_str())
            .with_prefix(config.bot.prefix.as_str()),
    );
    let channels = Arc::new(ChannelRegistry::new());
    channels.add(console.clone());

    let dispatcher = Arc::new(Dispatcher::new(registry, directory.clone(), channels));
    tracing::info!("Console ready, prefix commands with '{}'", config.bot.prefix);

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        console.prompt();
        let line = tokio::select! {
            line = lines.next_line() => line.map_err(|e| BotError::Channel(e.to_string()))?,
            _ = tokio::signal::ctrl_c() => None,
        };

        let Some(line) = line else {
            break;
        };
        if matches!(line.trim(), "quit" | "exit") {
            break;
        }

        if let Some(message) = console.parse_line(&line) {
            // Wait for the handler so its output lands before the next prompt
            match dispatcher.spawn(message).await {
                Ok(Ok(outcome)) => tracing::debug!("Dispatch: {:?}", outcome),
                Ok(Err(e)) => tracing::error!("Dispatch failed: {}", e),
                Err(e) => tracing::error!("Handler task failed: {}", e),
            }
        }
    }

    tracing::info!("Shutting down");
    manager.shutdown()?;
    drop(dispatcher);
    drop(directory);
    if let Err(e) = writer_task.await {
        tracing::error!("Brain writer failed: {}", e);
    }
    brain.sleep().await?;
    Ok(())
}

fn print_actions(config: Config) -> Result<(), BotError> {
    init_logging("warn");

    let registry = Arc::new(ActionRegistry::new());
    let manager = plugin_manager(&config, registry.clone())?;
    manager.load_all()?;

    let actions = registry.list_actions()?;
    let json = serde_json::to_string_pretty(&actions)
        .map_err(|e| BotError::Internal(e.to_string()))?;
    println!("{}", json);
    Ok(())
}

fn init_config() -> Result<(), BotError> {
    let yaml = Config::default().to_yaml()?;
    println!("{}", yaml);
    Ok(())
}
