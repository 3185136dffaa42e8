// Terminal front end for the image downsizer.
//
// All processing lives in the library; this file only collects the folder and
// budget, streams the run's events to the terminal and maps Ctrl-C to "stop".

use std::io::{self, BufRead, Write};
use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use tracing::{debug, info, warn};
use tracing_subscriber::EnvFilter;

use image_downsizer_lib::{
    start_downsizing, BatchEvent, DownsizerError, JobExecutor, LogLevel, ProcessingConfig,
    RunSummary, WorkerError,
};

/// Compresses every image in a folder down to a maximum file size.
#[derive(Parser, Debug)]
#[command(name = "image-downsizer", version, about)]
struct Args {
    /// Folder whose images should be downsized (prompted for when omitted)
    folder: Option<PathBuf>,

    /// Maximum size per image, in whole megabytes (prompted for when omitted)
    #[arg(short = 'm', long = "max-size", value_name = "MB", allow_negative_numbers = true)]
    max_size: Option<i64>,

    /// Print the final summary as JSON
    #[arg(long)]
    json: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_file(false)         // Remove file path
        .with_line_number(false)  // Remove line numbers
        .with_thread_ids(false)   // Remove thread IDs
        .with_thread_names(false) // Remove thread names
        .with_target(false)       // Remove module path
        .with_writer(io::stderr)
        .compact()
        .init();

    let args = Args::parse();
    debug!("=== Image Downsizer Starting ===");

    let folder = args
        .folder
        .or_else(|| prompt("Folder to process: ").map(PathBuf::from));
    let budget_mb = args.max_size.or_else(|| {
        prompt("Maximum image size in MB: ").and_then(|answer| answer.parse().ok())
    });

    let executor = JobExecutor::new(ProcessingConfig::default());
    let mut handle = match start_downsizing(&executor, folder, budget_mb) {
        Ok(handle) => handle,
        Err(WorkerError::DownsizerError(DownsizerError::InvalidInput(reason))) => {
            // A dismissed or invalid prompt quietly aborts the start action.
            warn!("Nothing started: {reason}");
            return Ok(());
        }
        Err(e) => return Err(e).context("Failed to start batch run"),
    };

    let stop = handle.cancellation_token();
    let mut stop_requested = false;
    let mut summary: Option<RunSummary> = None;

    loop {
        tokio::select! {
            event = handle.next_event() => match event {
                Some(BatchEvent::Completed(done)) => summary = Some(done),
                Some(event) => render(&event),
                None => break,
            },
            signal = tokio::signal::ctrl_c(), if !stop_requested => {
                signal.context("Failed to listen for Ctrl-C")?;
                info!("Stopping after the current image...");
                stop.cancel();
                stop_requested = true;
            }
        }
    }

    let summary = match summary {
        Some(summary) => summary,
        None => handle.join().await.context("Batch worker failed")?,
    };

    println!("{}", summary.message());
    if args.json {
        println!("{}", serde_json::to_string_pretty(&summary)?);
    }

    Ok(())
}

/// Prints one event to the terminal log view.
fn render(event: &BatchEvent) {
    match event {
        BatchEvent::Log { level: LogLevel::Info, message } => println!("{message}"),
        BatchEvent::Log { level: LogLevel::Warn, message } => println!("[warn] {message}"),
        BatchEvent::Log { level: LogLevel::Error, message } => eprintln!("[error] {message}"),
        BatchEvent::Progress(progress) => println!(
            "Progress: {}% ({}/{})",
            progress.percentage, progress.completed, progress.total
        ),
        BatchEvent::Started { .. } | BatchEvent::ItemFinished { .. } | BatchEvent::Completed(_) => {}
    }
}

/// Asks a question on stdin. `None` for an empty answer or a closed stdin.
fn prompt(question: &str) -> Option<String> {
    print!("{question}");
    io::stdout().flush().ok()?;

    let mut answer = String::new();
    io::stdin().lock().read_line(&mut answer).ok()?;

    let answer = answer.trim();
    (!answer.is_empty()).then(|| answer.to_string())
}
