//! Revealer CLI binary.
//!
//! Runs a job end to end against a filesystem demo of the storage/OCR/
//! validator ports. A thin `main` that initializes logging and delegates
//! to a subcommand.

use clap::{Parser, Subcommand};
use colored::Colorize;
use ggrevealer::domain::{JobStage, Screenshot, ScreenshotSource};
use ggrevealer::ports::{NullOcr, NullValidator};
use ggrevealer::pipeline::{InputFile, Pipeline};
use ggrevealer::storage::FileStorage;
use ggrevealer::{progress, PipelineConfig};
use std::path::PathBuf;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    #[command(about = "De-anonymize a directory of hand-history files against a directory of screenshots")]
    Run {
        #[arg(long, required = true)]
        hands: PathBuf,
        #[arg(long, required = true)]
        screenshots: PathBuf,
        #[arg(long, default_value = "./ggrevealer-output")]
        out: PathBuf,
        #[arg(long)]
        config: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let Command::Run { hands, screenshots, out, config } = cli.command;

    ggrevealer::init_logging(&out.join("logs"))?;

    let config = match config {
        Some(path) => PipelineConfig::load_from_file(&path)?.apply_env_overrides(),
        None => PipelineConfig::default().apply_env_overrides(),
    };

    let files = read_hand_files(&hands)?;
    let shots = read_screenshots(&screenshots)?;
    let bar = ggrevealer::progress_bar((files.len() + shots.len()) as usize);

    let pipeline = Pipeline::new(
        config,
        Arc::new(NullOcr),
        Arc::new(FileStorage::new(out.clone())),
        Arc::new(NullValidator),
    );
    let (tx, mut rx) = progress::channel();
    let reporter = progress::ProgressReporter::new("cli-job", Some(tx));
    let cancel = CancellationToken::new();

    let watcher = tokio::spawn(async move {
        while let Some(event) = rx.recv().await {
            bar.set_position(event.counts.succeeded as u64);
            bar.set_message(format!("{:?}", event.stage));
        }
        bar.finish_and_clear();
    });

    let job = pipeline.run("cli-job", files, shots, reporter, cancel).await;
    let _ = watcher.await;

    report(&job, &out);
    Ok(())
}

fn read_hand_files(dir: &std::path::Path) -> anyhow::Result<Vec<InputFile>> {
    let mut files = Vec::new();
    for entry in std::fs::read_dir(dir)? {
        let entry = entry?;
        let path = entry.path();
        if !path.is_file() {
            continue;
        }
        let content = std::fs::read_to_string(&path)?;
        let name = path.file_name().unwrap().to_string_lossy().to_string();
        files.push(InputFile { name, content });
    }
    Ok(files)
}

fn read_screenshots(dir: &std::path::Path) -> anyhow::Result<Vec<Screenshot>> {
    let mut shots = Vec::new();
    for entry in std::fs::read_dir(dir)? {
        let entry = entry?;
        let path = entry.path();
        if !path.is_file() {
            continue;
        }
        let meta = entry.metadata()?;
        let modified = meta.modified()?;
        let timestamp = chrono::DateTime::<chrono::Utc>::from(modified);
        let name = path.file_name().unwrap().to_string_lossy().to_string();
        let media_type = match path.extension().and_then(|e| e.to_str()) {
            Some("jpg") | Some("jpeg") => "image/jpeg",
            _ => "image/png",
        };
        shots.push(Screenshot::new(name, ScreenshotSource::Path(path.clone()), media_type, timestamp));
    }
    Ok(shots)
}

fn report(job: &ggrevealer::domain::Job, out: &std::path::Path) {
    match job.stage {
        JobStage::Completed => println!("{}", "job completed".green().bold()),
        JobStage::Failed => println!("{}", "job failed".red().bold()),
        JobStage::Cancelled => println!("{}", "job cancelled".yellow().bold()),
        other => println!("{}", format!("job ended in stage {other:?}").yellow()),
    }
    println!(
        "{} hands, {} matched, {} unmatched, {} rewritten files",
        job.hands.len(),
        job.matches.len(),
        job.unmatched.len(),
        job.rewritten.len()
    );
    for file in &job.rewritten {
        let label = match file.classification {
            ggrevealer::domain::Classification::Clean => "clean".green(),
            ggrevealer::domain::Classification::Residual => "residual".red(),
        };
        println!("  {label} {} ({} hands)", file.name, file.hand_ids.len());
    }
    for err in &job.errors {
        println!("  {} {err}", "-".dimmed());
    }
    println!("output written under {}", out.display());
}
