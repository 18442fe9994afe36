//! Datalyst CLI entry point

use std::sync::Arc;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use datalyst::agent::{AgentLoop, Context, GeminiClient, Message};
use datalyst::config::Config;
use datalyst::server::{AppState, Launcher};
use datalyst::session::Session;
use datalyst::tools::oauth::{PrepareAuthCodeTool, UserInfoTool};
use datalyst::tools::{ToolContext, ToolRunner};
use datalyst::toolset::{BearerRelay, ToolsetClient};

#[derive(Parser)]
#[command(name = "datalyst")]
#[command(about = "Datalyst - data analyst AI agent")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize Datalyst configuration
    Onboard,

    /// Chat with the agent
    Agent {
        /// Message to send to the agent
        #[arg(short, long)]
        message: Option<String>,
    },

    /// Start the web launcher (WebUI + API)
    Serve {
        /// Override the configured port
        #[arg(short, long)]
        port: Option<u16>,
    },

    /// Show Datalyst status
    Status,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    // Double Ctrl+C to exit
    let exit_flag = std::sync::Arc::new(std::sync::atomic::AtomicBool::new(false));
    let r = exit_flag.clone();
    ctrlc::set_handler(move || {
        if r.load(std::sync::atomic::Ordering::SeqCst) {
            println!("\nBye!");
            std::process::exit(0);
        } else {
            println!("\nPress Ctrl+C again to exit");
            r.store(true, std::sync::atomic::Ordering::SeqCst);

            let r2 = r.clone();
            std::thread::spawn(move || {
                std::thread::sleep(std::time::Duration::from_secs(3));
                r2.store(false, std::sync::atomic::Ordering::SeqCst);
            });
        }
    })
    .ok();

    let cli = Cli::parse();

    match cli.command {
        Commands::Onboard => {
            datalyst::config::onboard()?;
            println!("✓ Config written to {:?}", datalyst::config::config_path());
            println!("\nNext steps:");
            println!("  1. Set GOOGLE_API_KEY (or 'gemini_api_key' in the config)");
            println!("  2. Chat: datalyst agent -m \"Hello!\"");
        }

        Commands::Agent { message } => {
            let config = datalyst::config::load()?;
            let (agent, tool_runner) = assemble(&config).await;
            let session = Session::new();
            let ctx = Context::new(
                &config,
                tool_runner,
                session.state.clone(),
                reqwest::Client::new(),
            );

            if let Some(msg) = message {
                let response = run_once(&agent, &session, &ctx, &msg).await?;
                println!("\n{}", response);
            } else {
                println!("Interactive mode (Ctrl+C or 'exit' to quit)\n");
                run_interactive(&agent, &session, &ctx).await?;
            }
        }

        Commands::Serve { port } => {
            let mut config = datalyst::config::load()?;
            if let Some(port) = port {
                config.server.port = port;
            }

            let (agent, tool_runner) = assemble(&config).await;
            let state = AppState::new(agent, config, tool_runner);
            let launcher = Launcher::new(state);

            println!("Starting web launcher...");
            launcher.run().await?;
        }

        Commands::Status => {
            let config = datalyst::config::load()?;
            println!("Datalyst Status\n");
            println!("Model: {}", config.model);
            println!(
                "Gemini API key: {}",
                if config.gemini_api_key.is_empty() {
                    "not set"
                } else {
                    "✓"
                }
            );
            println!(
                "Tool-set: {}",
                if config.toolset.enabled {
                    config.toolset.endpoint.as_str()
                } else {
                    "disabled"
                }
            );
        }
    }

    Ok(())
}

/// Assemble the agent: model client, local OAuth tools, and (when enabled)
/// the remote tool-set behind a bearer-relay transport.
///
/// Any construction failure here is fatal — there is no degraded mode.
async fn assemble(config: &Config) -> (AgentLoop, Arc<ToolRunner>) {
    let client = match GeminiClient::new(&config.gemini_api_key, &config.model) {
        Ok(client) => Arc::new(client),
        Err(e) => {
            tracing::error!("Failed to create model: {}", e);
            std::process::exit(1);
        }
    };

    let mut runner = ToolRunner::new();
    runner.register(PrepareAuthCodeTool);
    runner.register(UserInfoTool::new(config.userinfo_url.clone()));

    if config.toolset.enabled {
        let toolset = Arc::new(ToolsetClient::new(
            config.toolset.endpoint.clone(),
            Arc::new(BearerRelay::default()),
        ));

        // Discovery runs outside any conversation, so no bearer header yet.
        let ctx = ToolContext::detached(reqwest::Client::new());
        match toolset.discover(&ctx).await {
            Ok(tools) => {
                for tool in tools {
                    runner.register_arc(tool);
                }
            }
            Err(e) => {
                tracing::error!("Failed to create tool set: {}", e);
                std::process::exit(1);
            }
        }
    }

    let agent = AgentLoop::new(client, config.max_iterations);
    (agent, Arc::new(runner))
}

async fn run_once(
    agent: &AgentLoop,
    session: &Session,
    ctx: &Context,
    message: &str,
) -> Result<String> {
    let user_message = Message::user(message);
    let response = agent
        .run(&session.history(), user_message.clone(), ctx)
        .await?;
    session.record_exchange(user_message, Message::assistant(response.content.clone()));
    Ok(response.content)
}

async fn run_interactive(agent: &AgentLoop, session: &Session, ctx: &Context) -> Result<()> {
    use std::io::{self, Write};

    loop {
        print!("\x1b[1;34mYou\x1b[0m: ");
        io::stdout().flush()?;

        let mut input = String::new();
        if io::stdin().read_line(&mut input)? == 0 {
            break;
        }
        let input = input.trim();

        if input.eq_ignore_ascii_case("exit") || input.eq_ignore_ascii_case("quit") {
            println!("Bye!");
            break;
        }

        if input.is_empty() {
            continue;
        }

        match run_once(agent, session, ctx, input).await {
            Ok(response) => println!("\n\x1b[1;32mBot\x1b[0m: {}\n", response),
            Err(e) => println!("\n\x1b[1;31mError\x1b[0m: {}\n", e),
        }
    }

    Ok(())
}
