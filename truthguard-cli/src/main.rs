//! truthguard-cli: command-line client for a running TruthGuard server
//!
//! # Subcommands
//! - `news <text> [--json]`: check a news text
//! - `media --type <image|video|audio> <file> [--json]`: check a media file
//! - `status`: show server health

use std::path::{Path, PathBuf};

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use clap::{Parser, Subcommand, ValueEnum};
use serde::Deserialize;

const DEFAULT_SERVER: &str = "http://127.0.0.1:5000";

// ============================================================================
// CLI Definition
// ============================================================================

#[derive(Debug, Parser)]
#[command(
    name = "truthguard-cli",
    version,
    about = "Submit news text or media files to a TruthGuard server"
)]
struct Cli {
    /// TruthGuard server URL (overrides TRUTHGUARD_URL env var)
    #[arg(long, env = "TRUTHGUARD_URL", default_value = DEFAULT_SERVER)]
    server: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Check whether a news text looks fabricated
    News {
        /// Text to analyse
        text: String,

        /// Print the raw JSON response
        #[arg(long)]
        json: bool,
    },

    /// Check an image, video or audio file for manipulation
    Media {
        /// Kind of media in the file
        #[arg(long = "type", value_enum)]
        media_type: MediaType,

        /// File to upload
        file: PathBuf,

        /// Print the raw JSON response
        #[arg(long)]
        json: bool,
    },

    /// Show TruthGuard server status
    Status,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum MediaType {
    Image,
    Video,
    Audio,
}

impl MediaType {
    fn as_str(self) -> &'static str {
        match self {
            MediaType::Image => "image",
            MediaType::Video => "video",
            MediaType::Audio => "audio",
        }
    }
}

// ============================================================================
// API Response Types
// ============================================================================

/// Successful response from /api/fakenews or /api/deepfake
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VerdictResponse {
    pub is_authentic: bool,
    pub confidence: f64,
    pub message: String,
}

#[derive(Debug, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}

/// One-line human summary of a verdict.
pub fn format_verdict(v: &VerdictResponse) -> String {
    let label = if v.is_authentic { "AUTHENTIC" } else { "SUSPECT" };
    format!("{} ({:.1}% confidence): {}", label, v.confidence, v.message)
}

/// Read a file and encode it for the `mediaData` field.
pub fn encode_media_file(path: &Path) -> anyhow::Result<String> {
    let bytes = std::fs::read(path)?;
    if bytes.is_empty() {
        anyhow::bail!("{} is empty", path.display());
    }
    Ok(BASE64.encode(bytes))
}

// ============================================================================
// HTTP Client Calls
// ============================================================================

fn client() -> anyhow::Result<reqwest::blocking::Client> {
    Ok(reqwest::blocking::Client::builder()
        .timeout(std::time::Duration::from_secs(120))
        .build()?)
}

fn submit(url: &str, body: serde_json::Value, json_output: bool) -> anyhow::Result<()> {
    let resp = match client()?.post(url).json(&body).send() {
        Ok(r) => r,
        Err(e) => {
            eprintln!("truthguard-cli: connection failed to {}: {}", url, e);
            std::process::exit(1);
        }
    };

    let status = resp.status();
    let text = resp.text().unwrap_or_default();

    if !status.is_success() {
        let message = serde_json::from_str::<ErrorResponse>(&text)
            .map(|e| e.error)
            .unwrap_or(text);
        eprintln!("truthguard-cli: server returned {}: {}", status, message);
        std::process::exit(1);
    }

    if json_output {
        println!("{}", text);
        return Ok(());
    }

    let verdict: VerdictResponse = match serde_json::from_str(&text) {
        Ok(v) => v,
        Err(e) => {
            eprintln!("truthguard-cli: failed to parse response: {}", e);
            std::process::exit(1);
        }
    };
    println!("{}", format_verdict(&verdict));
    Ok(())
}

fn do_news(server: &str, text: &str, json_output: bool) -> anyhow::Result<()> {
    let url = format!("{}/api/fakenews", server);
    submit(&url, serde_json::json!({ "text": text }), json_output)
}

fn do_media(
    server: &str,
    media_type: MediaType,
    file: &Path,
    json_output: bool,
) -> anyhow::Result<()> {
    let media_data = match encode_media_file(file) {
        Ok(d) => d,
        Err(e) => {
            eprintln!("truthguard-cli: cannot read {}: {}", file.display(), e);
            std::process::exit(1);
        }
    };

    let url = format!("{}/api/deepfake", server);
    let body = serde_json::json!({
        "mediaType": media_type.as_str(),
        "mediaData": media_data,
    });
    submit(&url, body, json_output)
}

fn do_status(server: &str) -> anyhow::Result<()> {
    let url = format!("{}/health", server);

    let resp = match client()?.get(&url).send() {
        Ok(r) => r,
        Err(e) => {
            eprintln!("truthguard-cli: connection failed to {}: {}", url, e);
            std::process::exit(1);
        }
    };

    let status = resp.status();
    let body: serde_json::Value = resp.json().unwrap_or_default();

    if status.is_success() {
        println!("TruthGuard server: {}", server);
        println!("  status:  {}", body["status"].as_str().unwrap_or("unknown"));
        println!("  version: {}", body["version"].as_str().unwrap_or("unknown"));
        println!("  store:   {}", body["store"].as_str().unwrap_or("unknown"));
        println!("  gateway: {}", body["gateway"].as_str().unwrap_or("unknown"));
        Ok(())
    } else {
        eprintln!(
            "truthguard-cli: server unhealthy ({}): {}",
            status,
            body["error"].as_str().unwrap_or("no detail")
        );
        std::process::exit(1);
    }
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let server = cli.server.trim_end_matches('/');

    match cli.command {
        Commands::News { text, json } => do_news(server, &text, json),
        Commands::Media {
            media_type,
            file,
            json,
        } => do_media(server, media_type, &file, json),
        Commands::Status => do_status(server),
    }
}

// ============================================================================
// Tests
// ============================================================================
