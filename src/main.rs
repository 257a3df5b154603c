use std::sync::Arc;

use anyhow::{Context, Result};
use tokio::sync::Mutex;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use hiring_post_scraper::browser::{ChromiumDriver, ProfileDirSession};
use hiring_post_scraper::config::Config;
use hiring_post_scraper::runner::run_once;
use hiring_post_scraper::schedule::run_schedule;
use hiring_post_scraper::source::{JsonFileSource, PostSource};

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        error!("Fatal error: {e:#}");
        std::process::exit(1);
    }
}

async fn run() -> Result<()> {
    // Load .env file if present
    let _ = dotenvy::dotenv();

    init_tracing()?;

    info!("Starting hiring-post-scraper");

    let config = Config::from_env().context("Failed to load configuration")?;
    config.validate().context("Invalid configuration")?;
    let mode = config.schedule_mode()?;

    info!(
        keywords = config.keywords.len(),
        hashtags = config.hashtags.len(),
        days_limit = config.days_limit,
        headless = config.scraping.headless,
        max_posts_per_search = config.scraping.max_posts_per_search,
        schedule = ?mode,
        "Configuration loaded"
    );
    if config.keywords.is_empty() {
        warn!("No keywords configured - every post will score 0");
    }

    let source: Box<dyn PostSource> = match &config.raw_posts_file {
        Some(path) => {
            info!(path = %path.display(), "Reading raw posts from file instead of the browser");
            Box::new(JsonFileSource::new(path))
        }
        None => {
            let session = ProfileDirSession::from_config(config.scraping.profile_dir.as_deref())
                .with_cookies_file(config.scraping.cookies_file.as_deref());
            Box::new(ChromiumDriver::new(config.scraping.clone(), Box::new(session)))
        }
    };
    let source = Arc::new(Mutex::new(source));
    let config = Arc::new(config);

    let job = || {
        let source = Arc::clone(&source);
        let config = Arc::clone(&config);
        async move {
            let mut source = source.lock().await;
            let summary = run_once(&config, &mut **source).await?;
            println!("{summary}");
            Ok::<(), anyhow::Error>(())
        }
    };

    let result = tokio::select! {
        result = run_schedule(mode, job) => result,
        () = shutdown_signal() => {
            info!("Shutting down...");
            Ok(())
        }
    };

    source.lock().await.close().await;
    info!("Shutdown complete");

    result
}

fn init_tracing() -> Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,hiring_post_scraper=debug"));

    // Check if JSON logging is requested
    let use_json = std::env::var("LOG_FORMAT")
        .map(|v| matches!(v.to_lowercase().as_str(), "json" | "structured"))
        .unwrap_or(false);

    if use_json {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().json())
            .try_init()
            .map_err(|e| anyhow::anyhow!("Failed to initialize tracing: {e}"))?;
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer())
            .try_init()
            .map_err(|e| anyhow::anyhow!("Failed to initialize tracing: {e}"))?;
    }

    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!("Failed to listen for Ctrl+C: {e}");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                error!("Failed to install SIGTERM handler: {e}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }
}
