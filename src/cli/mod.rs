use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::process::ExitCode;

use crate::domain::ContentProvider;
use crate::infra::config::{Config, Mode, ProviderConfig};
use crate::sequencer::{driver, render_report, ChainParams, SequencerState, DEFAULT_RETRIES, DEFAULT_SUBJECT};

#[derive(Parser)]
#[command(name = "wiki-mcp-gateway")]
#[command(about = "Wikipedia MCP Gateway - server and admin CLI")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run the server in the mode selected by MODE (default)
    Serve,
    /// Health check the service
    Health {
        /// Service URL to check
        #[arg(short, long, default_value = "http://localhost:8080")]
        url: String,
    },
    /// Validate configuration
    Config {
        /// Validate config without starting service
        #[arg(long)]
        validate: bool,
    },
    /// Show service status and tools
    Status {
        /// Service URL to check
        #[arg(short, long, default_value = "http://localhost:8080")]
        url: String,
    },
    /// Search Wikipedia directly to test provider connectivity
    Lookup {
        /// Provider base URL (defaults to the configured one)
        #[arg(short, long)]
        url: Option<String>,
        /// Search query
        #[arg(short, long, default_value = DEFAULT_SUBJECT)]
        query: String,
    },
    /// Run the demo chain against a spawned server and print a report
    Demo {
        /// Page looked up by findPage, getPage and getImagesForPage
        #[arg(short, long, default_value = DEFAULT_SUBJECT)]
        subject: String,
        /// Re-issues allowed per failed step
        #[arg(short, long, default_value_t = DEFAULT_RETRIES)]
        retries: u32,
        /// Server binary (defaults to this executable)
        #[arg(long)]
        server: Option<PathBuf>,
    },
}

pub async fn run() -> ExitCode {
    let cli = Cli::parse();

    run_commands(cli.command.unwrap_or(Commands::Serve)).await
}

pub async fn run_commands(command: Commands) -> ExitCode {
    match command {
        Commands::Serve => match crate::infra::boot::run_server().await {
            Ok(()) => ExitCode::SUCCESS,
            Err(e) => {
                tracing::error!(error = %e, "server failed");
                eprintln!("❌ Server failed: {}", e);
                ExitCode::FAILURE
            }
        },
        Commands::Health { url } => match health_check(&url).await {
            Ok(_) => {
                println!("✅ Service is healthy");
                ExitCode::SUCCESS
            }
            Err(e) => {
                eprintln!("❌ Health check failed: {}", e);
                ExitCode::FAILURE
            }
        },
        Commands::Config { validate: _ } => match validate_config() {
            Ok(cfg) => {
                println!("✅ Configuration is valid");
                println!("  Provider: {} (lang {})", cfg.base_url(), cfg.language);
                ExitCode::SUCCESS
            }
            Err(e) => {
                eprintln!("❌ Configuration validation failed: {}", e);
                ExitCode::FAILURE
            }
        },
        Commands::Status { url } => match show_status(&url).await {
            Ok(_) => ExitCode::SUCCESS,
            Err(e) => {
                eprintln!("❌ Status check failed: {}", e);
                ExitCode::FAILURE
            }
        },
        Commands::Lookup { url, query } => match lookup(url, &query).await {
            Ok(_) => {
                println!("✅ Provider lookup passed");
                ExitCode::SUCCESS
            }
            Err(e) => {
                eprintln!("❌ Provider lookup failed: {}", e);
                ExitCode::FAILURE
            }
        },
        Commands::Demo { subject, retries, server } => {
            let params = ChainParams { retries, ..ChainParams::for_today(subject) };
            match driver::run_demo(params, server).await {
                Ok((session, state)) => {
                    print!("{}", render_report(&session, &state));
                    if state == SequencerState::Completed {
                        ExitCode::SUCCESS
                    } else {
                        ExitCode::FAILURE
                    }
                }
                Err(e) => {
                    eprintln!("❌ Demo failed: {}", e);
                    ExitCode::FAILURE
                }
            }
        }
    }
}

async fn health_check(url: &str) -> Result<(), Box<dyn std::error::Error>> {
    let client = reqwest::Client::new();
    let response = client
        .get(format!("{}/healthz", url))
        .timeout(std::time::Duration::from_millis(500))
        .send()
        .await?;

    if response.status().is_success() {
        Ok(())
    } else {
        Err(format!("HTTP {}", response.status()).into())
    }
}

fn validate_config() -> Result<ProviderConfig, Box<dyn std::error::Error>> {
    if let Ok(mode) = std::env::var("MODE") {
        mode.parse::<Mode>()?;
    }
    let config = Config::from_env();

    if config.mode == Mode::Server {
        if let Ok(port) = std::env::var("PORT") {
            if port.parse::<u16>() == Ok(0) {
                return Err("PORT cannot be 0".into());
            }
        }
    }

    let provider = ProviderConfig::from_env_and_toml()?;
    if provider.language.trim().is_empty() {
        return Err("language cannot be empty".into());
    }
    if provider.user_agent.trim().is_empty() {
        return Err("user_agent cannot be empty".into());
    }
    Ok(provider)
}

async fn show_status(url: &str) -> Result<(), Box<dyn std::error::Error>> {
    let client = reqwest::Client::new();

    // Health check
    let health_response = client
        .get(format!("{}/healthz", url))
        .timeout(std::time::Duration::from_secs(5))
        .send()
        .await?;

    println!(
        "🏥 Health Status: {}",
        if health_response.status().is_success() {
            "✅ Healthy"
        } else {
            "❌ Unhealthy"
        }
    );

    let tools_response = client
        .post(format!("{}/v1/rpc", url))
        .json(&crate::core::mcp::request(1, "tools/list", serde_json::json!({})))
        .timeout(std::time::Duration::from_millis(500))
        .send()
        .await;

    match tools_response {
        Ok(resp) if resp.status().is_success() => {
            let body: serde_json::Value = resp.json().await.unwrap_or_default();
            let names: Vec<&str> = body["result"]["tools"]
                .as_array()
                .into_iter()
                .flatten()
                .filter_map(|t| t["name"].as_str())
                .collect();
            println!("🔧 Tools: ✅ {}", names.join(", "));
        }
        Ok(resp) => {
            println!("🔧 Tools: ❌ HTTP {}", resp.status());
        }
        Err(_) => {
            println!("🔧 Tools: ❌ Unavailable");
        }
    }

    println!("\n📋 Configuration:");
    println!("  Mode: {}", Config::from_env().mode);
    println!(
        "  Log Level: {}",
        std::env::var("RUST_LOG").unwrap_or_else(|_| "info".into())
    );
    match ProviderConfig::from_env_and_toml() {
        Ok(cfg) => println!("  Provider: {}", cfg.base_url()),
        Err(e) => println!("  Provider: ❌ {}", e),
    }

    Ok(())
}

async fn lookup(url: Option<String>, query: &str) -> Result<(), Box<dyn std::error::Error>> {
    let mut cfg = ProviderConfig::from_env_and_toml()?;
    if url.is_some() {
        cfg.base_url = url;
    }
    let client = crate::clients::wikipedia::WikipediaRemote::from_config(&cfg)?;
    let results = client.search(query).await?;

    println!("🔎 Search on {} for: \"{}\"", client.base_url(), query);
    println!("📄 Found {} pages:", results.results.len());
    for (i, hit) in results.results.iter().enumerate() {
        println!("  {}. {}", i + 1, hit.title);
    }
    if let Some(s) = &results.suggestion {
        println!("💡 Did you mean: {}", s);
    }

    Ok(())
}
