//! Nowplaying CLI — print what an internet radio station is playing

use std::io;
use std::process::ExitCode;

use clap::Parser;
use tracing::debug;
use tracing_subscriber::EnvFilter;

use nowplaying::{FetchSource, StationResolver};

#[derive(Parser)]
#[command(
    name = "nowplaying",
    about = "Print the track currently playing on an internet radio stream",
    version
)]
struct Cli {
    /// Stream URL to look up
    url: String,

    /// Only ask one protocol: SHOUTCAST_V1, SHOUTCAST_V2, ICECAST or STREAM
    #[arg(short, long)]
    method: Option<FetchSource>,

    /// Print the full station info as JSON
    #[arg(long)]
    json: bool,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(io::stderr)
        .init();

    debug!(url = %cli.url, method = ?cli.method, "looking up station");

    let result = StationResolver::new().and_then(|resolver| resolver.resolve(&cli.url, cli.method));
    match result {
        Ok(Some(info)) => {
            if cli.json {
                match serde_json::to_string_pretty(&info) {
                    Ok(json) => println!("{json}"),
                    Err(e) => {
                        eprintln!("Error: {e}");
                        return ExitCode::from(2);
                    }
                }
            } else {
                println!("{}", info.title);
                println!("source: {}", info.fetchsource);
            }
            ExitCode::SUCCESS
        }
        Ok(None) => {
            eprintln!("No station information found for {}", cli.url);
            ExitCode::from(1)
        }
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::from(2)
        }
    }
}
