//! Server configuration from command-line flags and environment

use clap::Parser;
use std::net::SocketAddr;
use std::path::PathBuf;

/// Command-line arguments for the pdfmark server
#[derive(Parser, Debug, Clone)]
#[command(name = "pdfmark-api")]
#[command(about = "Annotate PDFs over HTTP: ink, notes, search, merge and watermark")]
pub struct Config {
    /// Port to listen on
    #[arg(short, long, env = "PORT", default_value = "3001")]
    pub port: u16,

    /// Host address to bind to
    #[arg(long, env = "HOST", default_value = "0.0.0.0")]
    pub host: String,

    /// Maximum number of live sessions
    #[arg(long, env = "PDFMARK_MAX_SESSIONS", default_value = "256")]
    pub max_sessions: usize,

    /// Largest accepted request body, in bytes
    #[arg(long, env = "PDFMARK_MAX_UPLOAD_BYTES", default_value = "52428800")]
    pub max_upload_bytes: usize,

    /// Directory holding the Pdfium shared library (needs the `pdfium` feature)
    #[arg(long, env = "PDFIUM_LIBRARY_PATH")]
    pub pdfium_library: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long)]
    pub verbose: bool,
}

impl Config {
    pub fn bind_addr(&self) -> Result<SocketAddr, std::net::AddrParseError> {
        format!("{}:{}", self.host, self.port).parse()
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            port: 3001,
            host: "0.0.0.0".into(),
            max_sessions: 256,
            max_upload_bytes: 50 * 1024 * 1024,
            pdfium_library: None,
            verbose: false,
        }
    }
}
