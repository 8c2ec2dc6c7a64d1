//! CLI for icmp-traceroute.

mod output;
mod runner;

use clap::Parser;
use std::io::{BufRead, Write};
use std::process::ExitCode;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use traceroute_core::types::process_identifier;
use traceroute_core::{TracerouteConfig, TracerouteParams};

/// ICMP Traceroute - discover the routers between this host and a target.
#[derive(Parser, Debug)]
#[command(name = "icmp-traceroute")]
#[command(version)]
#[command(about = "ICMP Traceroute - discover the routers between this host and a target")]
pub struct Args {
    /// Target hostname or IPv4 address. Prompted for when omitted.
    pub target: Option<String>,

    /// Maximum TTL.
    #[arg(short = 'm', long = "max-hops", default_value = "30")]
    pub max_hops: u8,

    /// Timeout per attempt in milliseconds.
    #[arg(short = 'w', long, default_value = "2000")]
    pub timeout: u64,

    /// Attempts per TTL.
    #[arg(short = 'q', long, default_value = "2")]
    pub tries: u8,

    /// Overall time limit in seconds.
    #[arg(long = "max-runtime", default_value = "10")]
    pub max_runtime: u64,

    /// Print the result as JSON once the trace ends.
    #[arg(long)]
    pub json: bool,

    /// Enable verbose logging.
    #[arg(short, long)]
    pub verbose: bool,
}

impl Args {
    /// Convert CLI args to TracerouteConfig.
    fn to_config(&self, hostname: String) -> TracerouteConfig {
        TracerouteConfig {
            hostname,
            params: TracerouteParams {
                max_hops: self.max_hops,
                timeout: Duration::from_millis(self.timeout),
                tries: self.tries,
                max_runtime: Duration::from_secs(self.max_runtime),
                identifier: process_identifier(),
                ..Default::default()
            },
            json: self.json,
        }
    }
}

/// Asks for a target on stdin.
fn prompt_target() -> Result<String, String> {
    print!("Enter a hostname to trace route (e.g., google.com): ");
    std::io::stdout().flush().map_err(|e| e.to_string())?;

    let mut line = String::new();
    std::io::stdin()
        .lock()
        .read_line(&mut line)
        .map_err(|e| e.to_string())?;

    let target = line.trim();
    if target.is_empty() {
        return Err("no target given".to_string());
    }
    Ok(target.to_string())
}

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();

    // Logs go to stderr so stdout only carries hop lines.
    tracing_subscriber::fmt()
        .with_env_filter(if args.verbose { "debug" } else { "info" })
        .with_writer(std::io::stderr)
        .init();

    let hostname = match args.target.clone() {
        Some(t) => t,
        None => match prompt_target() {
            Ok(t) => t,
            Err(e) => {
                eprintln!("Error: {}", e);
                return ExitCode::FAILURE;
            }
        },
    };
    let config = args.to_config(hostname);

    let cancel = CancellationToken::new();
    let interrupt = tokio::spawn({
        let cancel = cancel.clone();
        async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                tracing::info!("Interrupted; stopping...");
                cancel.cancel();
            }
        }
    });

    let result = runner::run_traceroute(&config, cancel, |hop| {
        if !config.json {
            println!("{}", output::format_hop(hop));
        }
    })
    .await;
    interrupt.abort();

    match result {
        Ok(report) => {
            if config.json {
                match report.to_json() {
                    Ok(json) => println!("{}", json),
                    Err(e) => {
                        eprintln!("Failed to serialize results: {}", e);
                        return ExitCode::FAILURE;
                    }
                }
            } else if let Some(line) =
                output::format_termination(report.termination, &config.params)
            {
                println!("{}", line);
            }
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("Traceroute failed: {}", e);
            ExitCode::FAILURE
        }
    }
}
