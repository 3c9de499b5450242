//! `lawcanon` command line: batch runs over a document store, or one file.

use std::fs;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use lawcanon::{
    BatchOptions, BatchPhase, FsDocumentStore, PipelineConfig, RawDocumentRecord, process_record,
    run_batch,
};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

/// Canonicalize Swedish legal documents.
#[derive(Parser)]
#[command(name = "lawcanon", version, about, long_about = None)]
struct Cli {
    /// YAML pipeline configuration
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Emit logs as JSON lines on stderr
    #[arg(long, global = true)]
    log_json: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run the normalize and/or derive phase over a store directory
    Batch {
        /// Store directory holding one `{id}.json` per document
        #[arg(long)]
        store: PathBuf,
        #[arg(long, default_value = "all")]
        phase: BatchPhase,
        /// Compute everything, persist nothing
        #[arg(long)]
        dry_run: bool,
        #[arg(long)]
        content_type: Option<String>,
        #[arg(long)]
        limit: Option<usize>,
        /// Continue after the last checkpointed id
        #[arg(long)]
        resume: bool,
        #[arg(long)]
        checkpoint_dir: Option<PathBuf>,
        #[arg(long)]
        workers: Option<usize>,
    },

    /// Canonicalize a single markup file and print the result as JSON
    File {
        /// Official document number, e.g. "SFS 1977:1160"
        #[arg(long)]
        number: String,
        #[arg(long)]
        title: String,
        #[arg(long)]
        content_type: Option<String>,
        /// Print only the markdown rendering
        #[arg(long)]
        markdown: bool,
        file: PathBuf,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.log_json);

    let cfg = match &cli.config {
        Some(path) => match PipelineConfig::from_file(path) {
            Ok(cfg) => cfg,
            Err(err) => {
                error!(path = %path.display(), error = %err, "config_load_failed");
                return ExitCode::from(2);
            }
        },
        None => PipelineConfig::default(),
    };

    let result = match cli.command {
        Command::Batch {
            store,
            phase,
            dry_run,
            content_type,
            limit,
            resume,
            checkpoint_dir,
            workers,
        } => {
            let checkpoint_dir = checkpoint_dir
                .or_else(|| cfg.batch.checkpoint_dir.clone())
                .unwrap_or_else(|| store.join(".checkpoints"));
            let mut options = BatchOptions::from_config(&cfg, checkpoint_dir);
            options.phase = phase;
            options.dry_run = dry_run;
            options.content_type = content_type;
            options.limit = limit;
            options.resume = resume;
            if let Some(workers) = workers {
                options.workers = workers;
            }
            batch(&store, &cfg, &options)
        }
        Command::File {
            number,
            title,
            content_type,
            markdown,
            file,
        } => single_file(&file, number, title, content_type, markdown, &cfg),
    };

    match result {
        Ok(code) => code,
        Err(message) => {
            error!(error = %message, "lawcanon_failed");
            ExitCode::from(2)
        }
    }
}

fn init_tracing(json: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_names(true)
        .with_writer(std::io::stderr);
    if json {
        builder.json().init();
    } else {
        builder.init();
    }
}

fn batch(store: &Path, cfg: &PipelineConfig, options: &BatchOptions) -> Result<ExitCode, String> {
    let store = FsDocumentStore::open(store).map_err(|err| err.to_string())?;
    let report = run_batch(&store, cfg, options).map_err(|err| err.to_string())?;

    for phase in &report.phases {
        info!(
            phase = phase.phase.as_str(),
            processed = phase.processed,
            succeeded = phase.succeeded,
            needs_review = phase.needs_review,
            skipped = phase.skipped,
            failed = phase.failures.len(),
            last_id = phase.last_id.as_deref().unwrap_or(""),
            "batch_summary"
        );
    }
    let summary = serde_json::to_string_pretty(&report).map_err(|err| err.to_string())?;
    println!("{summary}");

    Ok(if report.has_failures() {
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    })
}

fn single_file(
    path: &Path,
    number: String,
    title: String,
    content_type: Option<String>,
    markdown: bool,
    cfg: &PipelineConfig,
) -> Result<ExitCode, String> {
    let markup =
        fs::read_to_string(path).map_err(|err| format!("{}: {err}", path.display()))?;
    let id = path
        .file_stem()
        .and_then(|stem| stem.to_str())
        .unwrap_or("document")
        .to_string();
    let raw = RawDocumentRecord {
        id,
        document_number: Some(number),
        title: Some(title),
        content_type,
        markup: Some(markup),
    };

    let output = match process_record(raw, cfg) {
        Ok(output) => output,
        Err(err) => {
            error!(path = %path.display(), error = %err, "file_failed");
            return Ok(ExitCode::FAILURE);
        }
    };
    if markdown {
        print!("{}", output.derived.markdown);
    } else {
        let json = serde_json::to_string_pretty(&output).map_err(|err| err.to_string())?;
        println!("{json}");
    }
    Ok(ExitCode::SUCCESS)
}
