// src/main.rs
mod browser;
mod extractors;
mod pipeline;
mod storage;
mod utils;

use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;

use clap::Parser;

use browser::{provision, BrowserConfig, HtmlSnapshotDriver, WebDriverPage};
use extractors::{RowRecord, Vocabulary};
use pipeline::{ExtractionPipeline, PipelineConfig};
use storage::ResultSink;
use utils::AppError;

/// Collects pump (API 610 OH/BB) tender notices from the Petronect published-tenders listing
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Listing page to start from
    #[arg(long, env = "TENDER_LISTING_URL", default_value = pipeline::PETRONECT_PUBLIC_URL)]
    url: String,

    /// WebDriver server (chromedriver) endpoint
    #[arg(long, env = "TENDER_WEBDRIVER_URL", default_value = browser::DEFAULT_WEBDRIVER_URL)]
    webdriver_url: String,

    /// Driver binary to launch when no WebDriver server answers
    #[arg(long, env = "TENDER_CHROMEDRIVER")]
    chromedriver: Option<PathBuf>,

    /// Show the browser window instead of running headless
    #[arg(long)]
    headed: bool,

    /// Maximum number of listing pages read in one run
    #[arg(long, env = "TENDER_MAX_PAGES", default_value_t = pipeline::DEFAULT_MAX_PAGES)]
    max_pages: usize,

    /// Delay after clicking "next" before reading the new page (ms)
    #[arg(long, env = "TENDER_SETTLE_MS", default_value_t = pipeline::DEFAULT_SETTLE_MS)]
    settle_ms: u64,

    /// Output directory for exports
    #[arg(short, long, env = "TENDER_OUTPUT_DIR", default_value = storage::DEFAULT_OUTPUT_DIR)]
    output_dir: PathBuf,

    /// Replay saved page snapshots from this directory instead of driving a browser
    #[arg(long)]
    replay: Option<PathBuf>,

    /// Debug mode - save every page's source plus a keyword-annotated copy
    #[arg(short, long)]
    debug: bool,

    /// Print the newest export and exit without scraping
    #[arg(long)]
    show_latest: bool,
}

#[tokio::main]
async fn main() -> ExitCode {
    // 1. Parse CLI Arguments
    let args = Args::parse();

    // 2. Setup Logging (RUST_LOG wins over the --debug default)
    utils::logging::setup_logging(args.debug);

    match run(args).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{}", failure_message(&e));
            ExitCode::FAILURE
        }
    }
}

fn failure_message(error: &AppError) -> String {
    format!("Scrape failed: {}", error)
}

async fn run(args: Args) -> Result<(), AppError> {
    tracing::info!("Starting tender scrape with args: {:?}", args);

    if args.max_pages == 0 {
        return Err(AppError::Config("--max-pages must be at least 1".to_string()));
    }

    // 3. Initialize storage (created once, reused for every export)
    let sink = ResultSink::new(&args.output_dir, storage::DEFAULT_EXPORT_PREFIX)?;

    if args.show_latest {
        return show_latest(&sink);
    }

    // 4. Build the pipeline
    let started = chrono::Local::now();
    let debug_dir = args
        .debug
        .then(|| sink.base_dir().join("debug").join(sink.stem_for(&started)));
    let config = PipelineConfig {
        listing_url: args.url.clone(),
        max_pages: args.max_pages,
        settle: Duration::from_millis(args.settle_ms),
        debug_dir,
        ..PipelineConfig::default()
    };
    let pipeline = ExtractionPipeline::new(config, Vocabulary::default());

    // 5. Run one full pass
    let outcome = match &args.replay {
        Some(dir) => {
            let mut driver = HtmlSnapshotDriver::from_dir(dir)?;
            pipeline.run(&mut driver).await
        }
        None => {
            let browser_config = BrowserConfig {
                webdriver_url: args.webdriver_url.clone(),
                headless: !args.headed,
                chromedriver: args.chromedriver.clone(),
                ..BrowserConfig::default()
            };
            // Kept alive until the session ends
            let _engine = provision::ensure_engine(&browser_config).await;

            let mut driver = WebDriverPage::connect(&browser_config).await?;
            let outcome = pipeline.run(&mut driver).await;
            if let Err(e) = driver.quit().await {
                tracing::warn!("Failed to close browser session: {}", e);
            }
            outcome
        }
    };

    // Partial results are discarded on failure
    let report = outcome?;

    // 6. Hand the result set to the sink
    let paths = sink.save_run(&report, chrono::Local::now())?;
    print!("{}", render_summary(report.results.records(), Some(report.pages_read)));
    tracing::info!("Saved: {} | {}", paths.csv.display(), paths.json.display());

    Ok(())
}

/// Console summary of a result set, shared by a fresh run and `--show-latest`.
fn render_summary(records: &[RowRecord], pages_read: Option<usize>) -> String {
    let pages = pages_read.map(|n| format!(" ({} pages read)", n)).unwrap_or_default();
    if records.is_empty() {
        return format!("No rows matched the filters{}.\n", pages);
    }
    let mut out = format!("{} matching tenders{}:\n", records.len(), pages);
    for record in records {
        out.push_str(&record.line);
        out.push('\n');
    }
    out
}

fn show_latest(sink: &ResultSink) -> Result<(), AppError> {
    let Some((path, records)) = sink.read_latest()? else {
        tracing::warn!("No CSV export found in {}", sink.base_dir().display());
        return Ok(());
    };
    println!("{}", path.display());
    print!("{}", render_summary(&records, None));
    Ok(())
}
