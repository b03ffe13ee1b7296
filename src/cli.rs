use clap::Parser;
use std::path::PathBuf;

use summtube::config::{Config, parse_origins};

#[derive(Parser)]
#[command(
    name = "summtube",
    about = "YouTube and text summarization service",
    version = env!("GIT_DESCRIBE"),
)]
pub struct Cli {
    /// Address to bind
    #[arg(long, env = "HOST")]
    pub host: Option<String>,

    /// Port to listen on
    #[arg(short, long, env = "PORT")]
    pub port: Option<u16>,

    /// LLM provider API key
    #[arg(long, env = "GOOGLE_API_KEY", hide_env_values = true)]
    pub api_key: Option<String>,

    /// LLM model used for summaries
    #[arg(short, long, env = "GEMINI_MODEL")]
    pub model: Option<String>,

    /// Comma-separated list of origins allowed by CORS
    #[arg(long, env = "ALLOWED_ORIGINS")]
    pub allowed_origins: Option<String>,

    /// Timeout for one LLM call, in seconds
    #[arg(long, env = "LLM_TIMEOUT_SECS")]
    pub llm_timeout: Option<u64>,

    /// Timeout for one yt-dlp run, in seconds
    #[arg(long, env = "EXTRACTOR_TIMEOUT_SECS")]
    pub extractor_timeout: Option<u64>,

    /// Path to the yt-dlp binary
    #[arg(long, env = "YT_DLP")]
    pub yt_dlp: Option<String>,

    /// Config file (defaults to <config dir>/summtube/config.toml)
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Write logs to this file instead of stderr
    #[arg(long)]
    pub log_file: Option<PathBuf>,

    /// Debug-level logging for this crate
    #[arg(short, long)]
    pub verbose: bool,
}

impl Cli {
    /// Values given on the command line or through the environment
    pub fn overrides(&self) -> Config {
        Config {
            api_key: self.api_key.clone(),
            model: self.model.clone(),
            allowed_origins: self.allowed_origins.as_deref().map(parse_origins),
            host: self.host.clone(),
            port: self.port,
            llm_timeout_secs: self.llm_timeout,
            caption_timeout_secs: None,
            extractor_timeout_secs: self.extractor_timeout,
            yt_dlp: self.yt_dlp.clone(),
            log_file: self.log_file.clone(),
        }
    }
}
