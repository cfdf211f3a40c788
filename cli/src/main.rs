use anyhow::Result;
use archchat_core::agent::prompt::build_system_prompt;
use archchat_core::providers::{SUPPORTED_MODELS, resolve_model_id};
use archchat_core::{
    Config, DispatchLoop, Gateway, Session, UserInput, build_registry, config, create_gateway,
    create_retriever,
};
use clap::{Parser, Subcommand};
use rustyline::DefaultEditor;
use rustyline::error::ReadlineError;
use std::sync::Arc;
mod onboard;
mod output;

use output::Console;

const HISTORY_FILE: &str = "history.txt";

#[derive(Parser)]
#[command(name = "archchat")]
#[command(about = "archchat - Chat with your architecture diagrams on Amazon Bedrock", long_about = None)]
struct Cli {
    /// Log debug output to stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    Onboard,
    /// List the models known to support tool use
    Models,
    Chat {
        /// Diagram in the data directory to attach to the first query
        #[arg(short, long)]
        file: Option<String>,
        /// Run a single query and exit
        #[arg(short, long)]
        message: Option<String>,
        /// Model alias or Bedrock model id
        #[arg(long)]
        model: Option<String>,
        /// Chat about the diagram without tools
        #[arg(long)]
        no_tools: bool,
        #[arg(long)]
        max_recursions: Option<usize>,
    },
}

fn init_logging(verbose: bool) {
    let filter = if verbose { "debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(filter)),
        )
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn build_session(config: &Config, console: &Console) -> Result<Session> {
    let gateway = create_gateway(config)?;
    let retriever = if config.tools_enabled {
        create_retriever(config)?
    } else {
        None
    };
    if config.tools_enabled && retriever.is_none() {
        console.warn("No knowledge base configured; Best_Practices_Tool will report an error.");
    }

    let registry = build_registry(config, retriever);
    let specs = registry.specs();
    let system_prompt = build_system_prompt(&specs, config.system_prompt.as_deref());

    let tool_names: Vec<String> = specs.into_iter().map(|s| s.name).collect();
    console.header(gateway.model_id(), &tool_names);

    let dispatcher = DispatchLoop::new(gateway, Arc::new(registry), system_prompt)
        .with_max_recursions(config.max_recursions);
    Ok(Session::new(dispatcher, &config.data_dir))
}

/// Runs one query. Failures are reported and leave the session usable.
async fn run_query(session: &mut Session, console: &Console, query: &str) -> bool {
    match session.submit(query, &mut |event| console.event(event)).await {
        Ok(outcome) => {
            console.outcome(&outcome);
            true
        }
        Err(e) => {
            console.error(&e.to_string());
            false
        }
    }
}

async fn run_interactive(
    session: &mut Session,
    console: &Console,
    config: &Config,
) -> Result<()> {
    let mut rl = DefaultEditor::new()?;
    let history_path = config::get_archchat_dir().join(HISTORY_FILE);
    if history_path.exists() {
        let _ = rl.load_history(&history_path);
    }

    if !session.has_pending_attachment() {
        let prompt = format!(
            "Which file do you want to chat with? It must be in {} (x to exit): ",
            config.data_dir.display()
        );
        loop {
            match rl.readline(&prompt) {
                Ok(line) => match UserInput::parse(&line) {
                    UserInput::Exit => {
                        console.footer();
                        return Ok(());
                    }
                    UserInput::Empty => continue,
                    UserInput::Query(file) => {
                        session.attach(file);
                        break;
                    }
                },
                Err(ReadlineError::Interrupted | ReadlineError::Eof) => {
                    console.footer();
                    return Ok(());
                }
                Err(e) => return Err(e.into()),
            }
        }
    }

    loop {
        match rl.readline("Your query (x to exit): ") {
            Ok(line) => match UserInput::parse(&line) {
                UserInput::Exit => break,
                UserInput::Empty => continue,
                UserInput::Query(query) => {
                    let _ = rl.add_history_entry(&query);
                    run_query(session, console, &query).await;
                    console.separator();
                }
            },
            Err(ReadlineError::Interrupted | ReadlineError::Eof) => break,
            Err(e) => {
                console.error(&format!("Input error: {e}"));
                break;
            }
        }
    }

    if config::ensure_archchat_dir().is_ok() {
        let _ = rl.save_history(&history_path);
    }
    console.footer();
    Ok(())
}

fn list_models(config: &Config) {
    let current = resolve_model_id(&config.model_id);
    for model in SUPPORTED_MODELS {
        let marker = if model.id == current { "*" } else { " " };
        println!("{} {:<16} {:<20} {}", marker, model.alias, model.label, model.id);
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let _ = dotenvy::dotenv();
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let command = cli.command.unwrap_or_else(|| {
        if !config::config_exists() && std::env::var("AWS_REGION").is_err() {
            Commands::Onboard
        } else {
            Commands::Chat {
                file: None,
                message: None,
                model: None,
                no_tools: false,
                max_recursions: None,
            }
        }
    });

    match command {
        Commands::Onboard => {
            let onboard_config = onboard::run_onboard().map_err(|e| {
                eprintln!("❌ Onboarding failed: {}", e);
                anyhow::anyhow!("Onboarding failed: {}", e)
            })?;
            config::save_config(&onboard_config)?;
        }
        Commands::Models => {
            let config = Config::load_or_init()?;
            list_models(&config);
        }
        Commands::Chat {
            file,
            message,
            model,
            no_tools,
            max_recursions,
        } => {
            let mut config = Config::load_or_init()?;
            if let Some(model) = model {
                config.model_id = model;
            }
            if no_tools {
                config.tools_enabled = false;
            }
            if let Some(max) = max_recursions {
                config.max_recursions = max;
            }

            let console = Console::new();
            let mut session = build_session(&config, &console)?;
            if let Some(file) = file {
                session.attach(file);
            }

            if let Some(msg) = message {
                if !run_query(&mut session, &console, &msg).await {
                    anyhow::bail!("Query failed");
                }
            } else {
                run_interactive(&mut session, &console, &config).await?;
            }
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn chat_flags_parse() {
        let cli = Cli::parse_from([
            "archchat",
            "chat",
            "--file",
            "diagram.png",
            "--no-tools",
            "--max-recursions",
            "3",
            "-v",
        ]);
        assert!(cli.verbose);
        match cli.command {
            Some(Commands::Chat {
                file,
                no_tools,
                max_recursions,
                message,
                ..
            }) => {
                assert_eq!(file.as_deref(), Some("diagram.png"));
                assert!(no_tools);
                assert_eq!(max_recursions, Some(3));
                assert!(message.is_none());
            }
            _ => panic!("expected chat command"),
        }
    }
}
