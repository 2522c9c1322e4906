// Only compile UI module when TUI feature is enabled
#[cfg(feature = "tui")]
mod ui;

use anyhow::{Context, Result};
use clap::Parser;
use lra_gst_wizard::config::{Cli, Command};
use lra_gst_wizard::store::DRAFT_KEY;
use lra_gst_wizard::{
    export_registration, logging, ApplicationStore, LocalStorage, LocalStorageStore, Step,
    UploadedDocument,
};
use std::path::Path;
use tracing::info;

fn main() -> Result<()> {
    let cli = Cli::parse();
    let log_file = cli.effective_log_file();
    logging::init(&cli.log, log_file.as_deref())?;

    match cli.command() {
        Command::Run => run_ui_mode(&cli.db)?,
        Command::List => run_list(&cli.db)?,
        Command::Show { reference } => {
            let store = open_store(&cli.db)?;
            let application = store
                .find(&reference)
                .with_context(|| format!("Application not found: {}", reference))?;
            println!("{}", serde_json::to_string_pretty(&application)?);
        }
        Command::Export { reference, out } => {
            let store = open_store(&cli.db)?;
            let application = store
                .find(&reference)
                .with_context(|| format!("Application not found: {}", reference))?;
            let path = export_registration(&application.registration, &out)?;
            println!("✓ Exported {} to {:?}", reference, path);
        }
        Command::Remove { reference } => {
            let mut store = open_store(&cli.db)?;
            let removed = store.remove(&reference)?;
            println!("✓ Removed {} ({})", removed.application_reference, removed.applicant_name);
        }
        Command::AttachReceipt { reference, file } => {
            let mut store = open_store(&cli.db)?;
            let receipt = UploadedDocument::from_file(Step::Review, "receipt", &file)?;
            let application = store.attach_receipt(&reference, receipt)?;
            println!("✓ Receipt attached; {} is now {}", reference, application.status.as_str());
        }
        Command::SetStatus { reference, status } => {
            let mut store = open_store(&cli.db)?;
            let application = store.set_status(&reference, status)?;
            println!("✓ {} is now {}", reference, application.status.as_str());
        }
        Command::Reset => {
            let storage = LocalStorage::open(&cli.db)
                .with_context(|| format!("Failed to open database: {:?}", cli.db))?;
            storage.remove_item(DRAFT_KEY)?;
            info!("registration draft discarded");
            println!("✓ In-progress registration discarded");
        }
    }

    Ok(())
}

fn open_store(db: &Path) -> Result<LocalStorageStore> {
    LocalStorageStore::open(db).with_context(|| format!("Failed to open database: {:?}", db))
}

fn run_list(db: &Path) -> Result<()> {
    let applications = open_store(db)?.list();

    println!("📋 {} application(s)", applications.len());
    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
    for app in &applications {
        println!(
            "{:<22} {:<16} {:<12} {}",
            app.application_reference,
            app.status.as_str(),
            app.submitted_at.format("%Y-%m-%d"),
            app.applicant_name
        );
    }

    Ok(())
}

#[cfg(feature = "tui")]
fn run_ui_mode(db: &Path) -> Result<()> {
    let wizard = lra_gst_wizard::open_session(db)
        .with_context(|| format!("Failed to open database: {:?}", db))?;

    let export_dir = std::env::current_dir().context("Failed to read current directory")?;
    let mut app = ui::App::new(wizard, export_dir);
    ui::run_ui(&mut app)?;

    println!("\n✅ Progress saved to {:?}", db);

    Ok(())
}

#[cfg(not(feature = "tui"))]
fn run_ui_mode(_db: &Path) -> Result<()> {
    eprintln!("❌ TUI mode not available!");
    eprintln!("   Rebuild with: cargo build --features tui");
    eprintln!("   Or use the API: cargo run --bin lra-gst-server --features server");
    std::process::exit(1);
}
