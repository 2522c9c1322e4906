// ⚙️ Command-line configuration
// Every option can also come from the environment.

use crate::registration::ApplicationStatus;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Debug, Parser)]
#[command(name = "lra-gst", version, about = "LRA GST registration wizard")]
pub struct Cli {
    /// Local storage database file
    #[arg(long, env = "LRA_GST_DB", default_value = "lra_gst.db", global = true)]
    pub db: PathBuf,

    /// Log filter, e.g. "info" or "lra_gst_wizard=debug"
    #[arg(long, env = "LRA_GST_LOG", default_value = "info", global = true)]
    pub log: String,

    /// Write logs to this file instead of stderr (the TUI always logs to a file)
    #[arg(long, env = "LRA_GST_LOG_FILE", global = true)]
    pub log_file: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Debug, Clone, Subcommand)]
pub enum Command {
    /// Run the interactive registration wizard (default)
    Run,
    /// List stored applications
    List,
    /// Show one application as JSON
    Show { reference: String },
    /// Export an application as GST_Application_<reference>.json
    Export {
        reference: String,
        /// Directory to write into
        #[arg(long, default_value = ".")]
        out: PathBuf,
    },
    /// Delete an application
    Remove { reference: String },
    /// Attach a bank receipt to an offline-payment application
    AttachReceipt { reference: String, file: PathBuf },
    /// Change an application's status
    SetStatus {
        reference: String,
        #[arg(value_parser = parse_status)]
        status: ApplicationStatus,
    },
    /// Discard the saved in-progress registration
    Reset,
}

impl Cli {
    pub fn command(&self) -> Command {
        self.command.clone().unwrap_or(Command::Run)
    }

    /// Log file for the current command: the TUI never logs to the terminal
    pub fn effective_log_file(&self) -> Option<PathBuf> {
        match (self.log_file.clone(), self.command()) {
            (Some(path), _) => Some(path),
            (None, Command::Run) => Some(self.db.with_extension("log")),
            (None, _) => None,
        }
    }
}

fn parse_status(value: &str) -> Result<ApplicationStatus, String> {
    value.parse()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_command_is_run() {
        let cli = Cli::try_parse_from(["lra-gst", "--db", "/tmp/x.db"]).unwrap();
        assert!(matches!(cli.command(), Command::Run));
        assert_eq!(cli.effective_log_file(), Some(PathBuf::from("/tmp/x.log")));
    }

    #[test]
    fn test_set_status_parses() {
        let cli = Cli::try_parse_from(["lra-gst", "set-status", "LRA/GST/2025/000001", "approved"]).unwrap();
        match cli.command() {
            Command::SetStatus { reference, status } => {
                assert_eq!(reference, "LRA/GST/2025/000001");
                assert_eq!(status, ApplicationStatus::Approved);
            }
            other => panic!("unexpected command {:?}", other),
        }
        assert_eq!(cli.effective_log_file(), None);
    }

    #[test]
    fn test_bad_status_rejected() {
        assert!(Cli::try_parse_from(["lra-gst", "set-status", "X", "lost"]).is_err());
    }
}
