use clap::Parser;
use log::{error, info, warn};
use magic_characters_core::{
    ApiCall, CacheStore, CharacterFinder, DEFAULT_MIN_REFERENCES, ScryfallClient, format_report,
};
use std::fs::{File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

const LOG_FILE: &str = "character_search.log";

#[derive(Parser, Debug)]
#[command(name = "magic-characters-cli")]
#[command(about = "Rank recurring Magic: The Gathering characters by how many cards reference them")]
struct Cli {
    /// Directory for cached Scryfall responses (defaults to the platform cache directory)
    #[arg(long)]
    cache_dir: Option<PathBuf>,
    /// Minimum number of referencing cards for a character to be listed
    #[arg(long, default_value_t = DEFAULT_MIN_REFERENCES)]
    min_references: usize,
}

/// Sends every log line to stderr and to the log file
struct TeeWriter {
    file: File,
}

impl Write for TeeWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        io::stderr().write_all(buf)?;
        self.file.write_all(buf)?;
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        io::stderr().flush()?;
        self.file.flush()
    }
}

fn init_logging(log_file: &Path) -> io::Result<()> {
    let file = OpenOptions::new().create(true).append(true).open(log_file)?;

    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .target(env_logger::Target::Pipe(Box::new(TeeWriter { file })))
        .init();
    Ok(())
}

/// Requests from the recent history that did not succeed
fn failed_calls(history: &[ApiCall]) -> Vec<&ApiCall> {
    history.iter().filter(|call| !call.success).collect()
}

fn log_failed_calls(history: &[ApiCall]) {
    for call in failed_calls(history) {
        warn!(
            "Scryfall request failed with status {} at {}: {}",
            call.status_code, call.timestamp, call.url
        );
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    init_logging(Path::new(LOG_FILE))?;

    let cache_dir = match cli.cache_dir {
        Some(dir) => dir,
        None => CacheStore::default_cache_dir()?,
    };
    let store = CacheStore::new(cache_dir)?;
    info!("Using cache directory {}", store.cache_dir().display());

    let mut finder = CharacterFinder::new(ScryfallClient::new()?, store);

    match finder.find_character_references(cli.min_references).await {
        Ok(characters) => {
            println!("{}", format_report(&characters));
            info!(
                "Finished with {} characters after {} Scryfall requests",
                characters.len(),
                finder.source().network_call_count()
            );
            log_failed_calls(&finder.source().api_call_history());
        }
        Err(e) => {
            log_failed_calls(&finder.source().api_call_history());
            error!("Character search failed: {}", e);
            eprintln!("Character search failed: {}", e);
            std::process::exit(1);
        }
    }

    Ok(())
}
