//! Command-line host for the reader.
//!
//! Responsibilities here are intentionally minimal:
//! - Parse command-line arguments.
//! - Load configuration from `conf/config.toml` (or `--config`).
//! - Dispatch to the library listing, the interactive reader, a progress
//!   jump, or a raw settings-panel message.

use anyhow::{Context, Result, anyhow, bail};
use std::env;
use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};
use tracing::{error, info, warn};
use tracing_subscriber::{EnvFilter, fmt, prelude::*, reload};
use ttt_eye::config::{self, DEFAULT_CONFIG_PATH};
use ttt_eye::session::{Reader, ReadingSession, StartOutcome};
use ttt_eye::{library, settings};

type ReloadHandle = reload::Handle<EnvFilter, tracing_subscriber::Registry>;

const USAGE: &str = "Usage: ttt-eye [--config <path>] <list | read [book] | jump <book> <line> | message <json>>";

enum Command {
    List,
    Read(Option<PathBuf>),
    Jump { book: PathBuf, line: i64 },
    Message(String),
}

struct Args {
    config_path: PathBuf,
    command: Command,
}

fn main() {
    let reload_handle = init_tracing();
    if let Err(err) = run(&reload_handle) {
        error!("{err:?}");
        std::process::exit(1);
    }
}

fn run(reload_handle: &ReloadHandle) -> Result<()> {
    let args = parse_args(env::args().skip(1))?;
    let config = config::load_config(&args.config_path);
    set_log_level(reload_handle, config.log_level.as_filter_str());
    info!(
        config = %args.config_path.display(),
        library = ?config.library_dir,
        lines_per_page = config.lines_per_page,
        "Starting reader"
    );

    let mut reader = Reader::new(config);
    match args.command {
        Command::List => print_library(&reader),
        Command::Read(book) => read_interactive(&mut reader, book),
        Command::Jump { book, line } => {
            let record = reader
                .set_progress(&book, line)
                .with_context(|| format!("Failed to set progress for {}", book.display()))?;
            println!(
                "{} -> line {} ({}%)",
                book.display(),
                record.current_line,
                record.progress_percent
            );
            Ok(())
        }
        Command::Message(raw) => {
            let message = settings::parse_message(&raw)?;
            let reply = settings::handle_message(&mut reader, &args.config_path, message);
            println!("{}", serde_json::to_string_pretty(&reply)?);
            Ok(())
        }
    }
}

fn parse_args(mut args: impl Iterator<Item = String>) -> Result<Args> {
    let mut config_path = PathBuf::from(DEFAULT_CONFIG_PATH);
    let mut positional = Vec::new();
    while let Some(arg) = args.next() {
        if arg == "--config" {
            let value = args.next().ok_or_else(|| anyhow!("--config needs a path"))?;
            config_path = PathBuf::from(value);
        } else {
            positional.push(arg);
        }
    }

    let mut positional = positional.into_iter();
    let command = match positional.next().as_deref() {
        Some("list") => Command::List,
        Some("read") => Command::Read(positional.next().map(PathBuf::from)),
        Some("jump") => {
            let book = positional.next().ok_or_else(|| anyhow!(USAGE))?;
            let line = positional
                .next()
                .ok_or_else(|| anyhow!(USAGE))?
                .parse::<i64>()
                .context("Line must be an integer")?;
            Command::Jump {
                book: PathBuf::from(book),
                line,
            }
        }
        Some("message") => Command::Message(positional.next().ok_or_else(|| anyhow!(USAGE))?),
        _ => bail!(USAGE),
    };
    Ok(Args {
        config_path,
        command,
    })
}

fn print_library(reader: &Reader) -> Result<()> {
    let dir = reader
        .config()
        .library_dir()
        .ok_or_else(|| anyhow!("Library directory is not set"))?;
    for entry in library::list(Some(dir)) {
        match entry.progress.record() {
            Some(record) => println!(
                "{}  {}%  line {}/{}",
                entry.name, record.progress_percent, record.current_line, record.total_lines
            ),
            None => println!("{}  (not started)", entry.name),
        }
    }
    Ok(())
}

fn read_interactive(reader: &mut Reader, book: Option<PathBuf>) -> Result<()> {
    let stdin = io::stdin();
    let mut input = stdin.lock();

    match book {
        Some(book) => {
            reader.open_session(&book)?;
        }
        None => match reader.start_reading()? {
            StartOutcome::Opened(path) => info!(path = %path.display(), "Opened default book"),
            StartOutcome::Choose(entries) => {
                for (idx, entry) in entries.iter().enumerate() {
                    println!("{:>3}. {}", idx + 1, entry.name);
                }
                print!("Choose a book: ");
                io::stdout().flush()?;
                let choice = read_line(&mut input)?.unwrap_or_default();
                let picked = choice
                    .trim()
                    .parse::<usize>()
                    .ok()
                    .and_then(|n| n.checked_sub(1))
                    .and_then(|idx| entries.get(idx))
                    .ok_or_else(|| anyhow!("No book selected"))?;
                reader.open_session(&picked.path)?;
            }
        },
    }

    if let Some(session) = reader.session() {
        print_page(session);
    }
    while let Some(command) = read_line(&mut input)? {
        let turn = match command.trim() {
            "" | "n" => reader.next_page()?,
            "p" => reader.previous_page()?,
            "q" => break,
            other => {
                warn!(command = other, "Unknown command; use n, p or q");
                continue;
            }
        };
        if !turn.moved {
            println!("(no more pages in this direction)");
        }
        if let Some(session) = reader.session() {
            print_page(session);
        }
    }
    reader.stop();
    Ok(())
}

fn print_page(session: &ReadingSession) {
    for line in session.page_lines() {
        println!("{line}");
    }
    println!(
        "[{} | page {}/{} | line {}/{}]",
        file_label(session.book_path()),
        session.page_index() + 1,
        session.total_pages().max(1),
        session.current_line() + 1,
        session.total_lines()
    );
}

fn file_label(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().to_string())
        .unwrap_or_else(|| path.display().to_string())
}

fn read_line(input: &mut impl BufRead) -> Result<Option<String>> {
    let mut line = String::new();
    if input.read_line(&mut line)? == 0 {
        return Ok(None);
    }
    Ok(Some(line))
}

fn init_tracing() -> ReloadHandle {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("debug"));
    let (filter_layer, handle) = reload::Layer::new(env_filter);
    tracing_subscriber::registry()
        .with(
            fmt::layer()
                .with_writer(io::stderr)
                .with_target(true)
                .with_file(true)
                .with_line_number(true)
                .with_filter(filter_layer),
        )
        .init();
    handle
}

fn set_log_level(handle: &ReloadHandle, level: &str) {
    if env::var_os("RUST_LOG").is_some() {
        return;
    }
    let parsed = EnvFilter::builder()
        .parse(level)
        .unwrap_or_else(|_| EnvFilter::new("info"));
    if let Err(err) = handle.modify(|filter| *filter = parsed) {
        warn!(%level, "Failed to update log level from config: {err}");
    }
}
