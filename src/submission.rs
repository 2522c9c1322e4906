// 🧾 Submission - References, status, challans, export
// Everything that happens when the review step completes, plus the JSON
// download offered on the completion screen.

use crate::documents::UploadedDocument;
use crate::error::ExportError;
use crate::registration::{ApplicationStatus, PaymentMethod, RegistrationData};
use chrono::{DateTime, Datelike, Utc};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

// ============================================================================
// APPLICATION (post-submission record)
// ============================================================================

/// Frozen copy of a submitted registration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Application {
    pub application_reference: String,
    pub status: ApplicationStatus,
    pub submitted_at: DateTime<Utc>,
    pub applicant_name: String,
    pub registration: RegistrationData,
}

impl Application {
    /// Freeze a submitted registration. None if it has no reference yet.
    pub fn from_registration(data: &RegistrationData) -> Option<Application> {
        let reference = data.application_reference.clone()?;
        Some(Application {
            application_reference: reference,
            status: data.status.unwrap_or(ApplicationStatus::Submitted),
            submitted_at: data.submission_date.unwrap_or_else(Utc::now),
            applicant_name: data.display_name(),
            registration: data.clone(),
        })
    }

    /// Attach a bank receipt; the application moves to under-review
    pub fn attach_receipt(&mut self, mut receipt: UploadedDocument) {
        receipt.kind = "receipt".to_string();
        if let Some(payment) = self.registration.payment_data.as_mut() {
            payment.receipt = Some(receipt.clone());
        }
        self.registration.uploaded_documents.push(receipt);
        self.set_status(ApplicationStatus::UnderReview);
    }

    pub fn set_status(&mut self, status: ApplicationStatus) {
        self.status = status;
        self.registration.status = Some(status);
    }

    pub fn payment_method(&self) -> Option<PaymentMethod> {
        self.registration
            .payment_data
            .as_ref()
            .map(|payment| payment.payment_method)
    }
}

// ============================================================================
// REFERENCES & STATUS
// ============================================================================

pub fn application_reference(year: i32, sequence: u32) -> String {
    format!("LRA/GST/{}/{:06}", year, sequence)
}

/// Payment voucher number for offline (bank) payments
pub fn challan_number(year: i32, sequence: u32) -> String {
    format!("CHL/{}/{:06}", year, sequence)
}

/// Stored count + 1, skipping any sequence whose reference is already taken
/// (a deleted application would otherwise hand out a duplicate).
pub fn next_sequence(existing: &[Application], year: i32) -> u32 {
    let mut sequence = existing.len() as u32 + 1;
    while existing
        .iter()
        .any(|app| app.application_reference == application_reference(year, sequence))
    {
        sequence += 1;
    }
    sequence
}

/// Status right after submission: a pure function of method and receipt
pub fn derive_status(method: PaymentMethod, has_receipt: bool) -> ApplicationStatus {
    match (method.is_offline(), has_receipt) {
        (true, false) => ApplicationStatus::PendingReceipt,
        (true, true) => ApplicationStatus::UnderReview,
        (false, _) => ApplicationStatus::Submitted,
    }
}

/// Stamp reference, date, status (and challan for offline payments) onto a
/// registration whose review step just completed.
///
/// Returns the frozen application, or None if it was already submitted.
pub fn finalize_submission(
    data: &mut RegistrationData,
    now: DateTime<Utc>,
    sequence: u32,
) -> Option<Application> {
    if data.is_submitted() {
        return None;
    }

    let year = now.year();
    let method = data
        .payment_data
        .as_ref()
        .map(|payment| payment.payment_method)
        .unwrap_or(PaymentMethod::Offline);

    if let Some(payment) = data.payment_data.as_mut() {
        if payment.payment_method.is_offline() && payment.challan_number.is_none() {
            payment.challan_number = Some(challan_number(year, sequence));
        }
    }

    let status = derive_status(method, data.has_receipt());
    data.record_submission(application_reference(year, sequence), now, status);

    Application::from_registration(data)
}

// ============================================================================
// EXPORT
// ============================================================================

/// `GST_Application_LRA-GST-2026-000001.json`
pub fn export_file_name(reference: Option<&str>) -> String {
    let stem = reference
        .map(|r| r.replace('/', "-"))
        .unwrap_or_else(|| "draft".to_string());
    format!("GST_Application_{}.json", stem)
}

pub fn export_json(data: &RegistrationData) -> Result<String, serde_json::Error> {
    serde_json::to_string_pretty(data)
}

/// Write the registration into `dir`, returning the created file's path
pub fn export_registration<P: AsRef<Path>>(
    data: &RegistrationData,
    dir: P,
) -> Result<PathBuf, ExportError> {
    let path = dir
        .as_ref()
        .join(export_file_name(data.application_reference.as_deref()));
    fs::write(&path, export_json(data)?)?;
    tracing::info!(path = %path.display(), "exported registration");
    Ok(path)
}

// ============================================================================
// TESTS
// ============================================================================
