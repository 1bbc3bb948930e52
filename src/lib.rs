pub mod aggregator;
pub mod classifier;
pub mod config;
pub mod domain;
pub mod error;
pub mod mapping;
pub mod matcher;
pub mod ocr;
pub mod parser;
pub mod pipeline;
pub mod ports;
pub mod progress;
pub mod rewriter;
pub mod storage;

pub use config::PipelineConfig;
pub use error::{PipelineError, PipelineErrorKind};
pub use pipeline::Pipeline;

/// Initializes term + file logging for a single job run, mirroring the
/// dual `TermLogger`/`WriteLogger` split a long-running CLI process wants.
pub fn init_logging(log_dir: &std::path::Path) -> anyhow::Result<()> {
    std::fs::create_dir_all(log_dir)?;
    let config = simplelog::ConfigBuilder::new()
        .set_location_level(log::LevelFilter::Off)
        .set_target_level(log::LevelFilter::Off)
        .set_thread_level(log::LevelFilter::Off)
        .build();
    let time = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .expect("time moves forward")
        .as_secs();
    let file = simplelog::WriteLogger::new(
        log::LevelFilter::Debug,
        config.clone(),
        std::fs::File::create(log_dir.join(format!("{time}.log")))?,
    );
    let term = simplelog::TermLogger::new(
        log::LevelFilter::Info,
        config,
        simplelog::TerminalMode::Mixed,
        simplelog::ColorChoice::Auto,
    );
    simplelog::CombinedLogger::init(vec![term, file]).map_err(|e| anyhow::anyhow!(e))
}

/// A ticking progress bar for CLI-driven runs, kept deliberately plain:
/// one spinner style reused across every stage.
pub fn progress_bar(n: usize) -> indicatif::ProgressBar {
    let tick = std::time::Duration::from_millis(200);
    let style = "{spinner:.cyan} {elapsed} ~ {percent:>3}% {wide_bar:.cyan} {pos}/{len}";
    let style = indicatif::ProgressStyle::with_template(style).unwrap();
    let bar = indicatif::ProgressBar::new(n as u64);
    bar.set_style(style);
    bar.enable_steady_tick(tick);
    bar
}
