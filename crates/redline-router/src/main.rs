//! Redline Router CLI
//!
//! Starts the HTTP server for contract comparisons.

use redline_router::{config::RouterConfig, start_server, RouterError};
use std::env;
use std::path::Path;
use std::process;

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        eprintln!("Error: {}", e);
        process::exit(1);
    }
}

async fn run() -> Result<(), RouterError> {
    // Parse command-line arguments
    let args: Vec<String> = env::args().collect();

    let config = if args.len() > 2 && args[1] == "--config" {
        RouterConfig::load(Some(Path::new(&args[2])))?
    } else if args.len() > 1 && args[1] == "--help" {
        print_help();
        process::exit(0);
    } else {
        RouterConfig::load(None)?
    };

    start_server(config).await?;

    Ok(())
}

fn print_help() {
    println!("Redline Router - Contract Comparison API");
    println!();
    println!("USAGE:");
    println!("    redline-router [--config <path-to-settings.toml>]");
    println!();
    println!("OPTIONS:");
    println!("    --config <file>    Load settings from TOML file");
    println!("    --help             Print this help message");
    println!();
    println!("ENVIRONMENT (overrides the file, .env is honoured):");
    println!("    OPENAI_API_KEY     Key for the chat-completion service");
    println!("    OPENAI_BASE_URL    Service base URL");
    println!("    MODEL_NAME         Model for every stage (default: gpt-5.2)");
    println!("    PARSER_TYPE        openai | mock (default: openai)");
    println!("    AGENT_TYPE         openai | stub (default: openai)");
    println!("    API_HOST           Bind address (default: 0.0.0.0)");
    println!("    API_PORT           Bind port (default: 8080)");
    println!("    TRACE_BACKEND      log | none (default: log)");
    println!("    STRICT_FALLBACKS   Report fallback placeholders as warnings");
    println!("    LLM_TIMEOUT_SECS   Per-call timeout (default: 120)");
    println!("    RUST_LOG           Log filter (default: info)");
    println!();
}
