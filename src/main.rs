use std::path::Path;
use std::sync::Arc;

use eyre::{Result, WrapErr};
use log::{LevelFilter, debug, info, warn};

mod cli;

use cli::Cli;
use summtube::config::{Config, config_path};
use summtube::service::SummaryService;
use summtube::summarize::LlmClient;
use summtube::transcript::{HttpSubtitleFetcher, RetryPolicy, TranscriptChain};
use summtube::youtube::InnerTubeCaptions;
use summtube::ytdlp::YtDlp;

fn setup_logging(log_file: Option<&Path>, verbose: bool) -> Result<()> {
    let mut builder = env_logger::Builder::new();
    builder.filter_level(LevelFilter::Info);
    if verbose {
        builder.filter_module("summtube", LevelFilter::Debug);
    }
    builder.parse_default_env();

    if let Some(path) = log_file {
        if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
            std::fs::create_dir_all(dir)?;
        }
        let target = Box::new(std::fs::OpenOptions::new().create(true).append(true).open(path)?);
        builder.target(env_logger::Target::Pipe(target));
    }

    builder.init();

    match log_file {
        Some(path) => info!("Logging initialized: {}", path.display()),
        None => info!("Logging initialized: stderr"),
    }
    Ok(())
}

fn load_config(cli: &Cli) -> Result<Config> {
    let file_config = match &cli.config {
        Some(path) => Config::load_from(path)?,
        None => Config::load().unwrap_or_default(),
    };
    Ok(file_config
        .merge(cli.overrides())
        .with_provider_key_fallback(|var| std::env::var(var).ok()))
}

fn build_service(config: &Config) -> Result<SummaryService> {
    let client = reqwest::Client::builder()
        .build()
        .wrap_err("failed to build HTTP client")?;

    let chain = TranscriptChain::new(
        Arc::new(InnerTubeCaptions::new(client.clone(), config.caption_timeout())),
        Arc::new(YtDlp::new(config.yt_dlp(), config.extractor_timeout())),
        Arc::new(HttpSubtitleFetcher::new(client, config.caption_timeout())),
        RetryPolicy::default(),
    );

    let llm = LlmClient::new(config.api_key.clone(), config.model(), config.llm_timeout())
        .wrap_err("failed to build LLM client")?;
    info!("Using model {}", llm.model());

    Ok(SummaryService::new(chain, Arc::new(llm)))
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!("Failed to listen for Ctrl-C: {e}");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                warn!("Failed to listen for SIGTERM: {e}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
    info!("Shutdown signal received");
}

#[tokio::main]
async fn main() -> Result<()> {
    // .env is optional; real environment variables win
    dotenvy::dotenv().ok();

    let cli = <Cli as clap::Parser>::parse();
    let config = load_config(&cli)?;
    setup_logging(config.log_file.as_deref(), cli.verbose)?;

    if cli.verbose {
        if let Some(path) = cli.config.clone().or_else(config_path).filter(|p| p.exists()) {
            info!("Config: {}", path.display());
        }
        debug!("Effective config: {config:?}");
    }

    if !config.has_api_key() {
        warn!("No LLM API key configured; summarization requests will fail until one is set");
    }

    let service = build_service(&config)?;
    let app = summtube::server::router(service, &config.allowed_origins());

    let addr = format!("{}:{}", config.host(), config.port());
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .wrap_err_with(|| format!("failed to bind {addr}"))?;
    info!("Listening on http://{addr}");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .wrap_err("server error")?;

    Ok(())
}
