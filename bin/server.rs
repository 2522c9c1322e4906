// LRA GST Registration Wizard - Web Server
// REST API over the same wizard session and application store as the TUI

use anyhow::{Context, Result};
use clap::Parser;
use lra_gst_wizard::api::{router, AppState};
use lra_gst_wizard::{logging, open_session};
use std::net::SocketAddr;
use std::path::PathBuf;
use tracing::info;

#[derive(Debug, Parser)]
#[command(name = "lra-gst-server", version, about = "LRA GST registration API server")]
struct Args {
    /// Local storage database file
    #[arg(long, env = "LRA_GST_DB", default_value = "lra_gst.db")]
    db: PathBuf,

    /// Address to listen on
    #[arg(long, env = "LRA_GST_ADDR", default_value = "0.0.0.0:3000")]
    addr: SocketAddr,

    /// Log filter, e.g. "info" or "lra_gst_wizard=debug"
    #[arg(long, env = "LRA_GST_LOG", default_value = "info")]
    log: String,

    #[arg(long, env = "LRA_GST_LOG_FILE")]
    log_file: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    logging::init(&args.log, args.log_file.as_deref())?;

    println!("🌐 LRA GST Registration - Web Server");
    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");

    let wizard = open_session(&args.db)
        .with_context(|| format!("Failed to open database: {:?}", args.db))?;
    println!("✓ Database opened: {:?}", args.db);

    let app = router(AppState::new(wizard));

    let listener = tokio::net::TcpListener::bind(args.addr)
        .await
        .with_context(|| format!("Failed to bind {}", args.addr))?;

    println!("✓ Server running on http://{}", args.addr);
    println!("\n📡 API Endpoints:");
    println!("   GET    /api/health");
    println!("   GET    /api/applications");
    println!("   GET    /api/applications/:reference");
    println!("   DELETE /api/applications/:reference");
    println!("   POST   /api/applications/:reference/receipt");
    println!("   GET    /api/applications/:reference/export");
    println!("   GET    /api/wizard");
    println!("   POST   /api/wizard/events");
    println!("\nPress Ctrl+C to stop");

    info!(addr = %args.addr, "listening");
    axum::serve(listener, app).await.context("Server error")?;

    Ok(())
}
