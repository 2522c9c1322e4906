// 💾 Local Storage & Application Store
//
// LocalStorage is a tiny key-value table in SQLite (WAL mode), the on-disk
// stand-in for browser local storage. Values are JSON strings.
//
// The application list lives under a single key. Reads never fail the caller:
// a missing or corrupt value falls back to the fixed seed list.

use crate::documents::UploadedDocument;
use crate::error::StoreError;
use crate::registration::{
    ApplicationStatus, BusinessData, EntryPoint, IndividualData, PaymentData, PaymentMethod,
    PropertyData, RegistrationData,
};
use crate::step::Step;
use crate::submission::Application;
use chrono::{DateTime, TimeZone, Utc};
use rusqlite::{params, Connection, OptionalExtension};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::path::Path;
use tracing::{debug, info, warn};

pub const APPLICATIONS_KEY: &str = "lra_gst_applications";
pub const DRAFT_KEY: &str = "lra_gst_registration_draft";

// ============================================================================
// LOCAL STORAGE
// ============================================================================

pub struct LocalStorage {
    conn: Connection,
}

impl LocalStorage {
    /// Open (or create) a storage file
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, StoreError> {
        let conn = Connection::open(path.as_ref())?;

        // Enable WAL mode so the TUI and the API server can share a file
        let mode: String =
            conn.pragma_update_and_check(None, "journal_mode", "WAL", |row| row.get(0))?;
        debug!(path = %path.as_ref().display(), journal_mode = %mode, "opened local storage");

        Self::setup(conn)
    }

    /// Storage that lives only as long as this value (tests, throwaway sessions)
    pub fn in_memory() -> Result<Self, StoreError> {
        Self::setup(Connection::open_in_memory()?)
    }

    fn setup(conn: Connection) -> Result<Self, StoreError> {
        conn.execute(
            "CREATE TABLE IF NOT EXISTS local_storage (
                key TEXT PRIMARY KEY,
                value TEXT NOT NULL,
                updated_at DATETIME DEFAULT CURRENT_TIMESTAMP
            )",
            [],
        )?;
        Ok(LocalStorage { conn })
    }

    pub fn get_item(&self, key: &str) -> Result<Option<String>, StoreError> {
        let value = self
            .conn
            .query_row(
                "SELECT value FROM local_storage WHERE key = ?1",
                params![key],
                |row| row.get(0),
            )
            .optional()?;
        Ok(value)
    }

    pub fn set_item(&self, key: &str, value: &str) -> Result<(), StoreError> {
        self.conn.execute(
            "INSERT INTO local_storage (key, value) VALUES (?1, ?2)
             ON CONFLICT(key) DO UPDATE SET value = excluded.value, updated_at = CURRENT_TIMESTAMP",
            params![key, value],
        )?;
        Ok(())
    }

    pub fn remove_item(&self, key: &str) -> Result<(), StoreError> {
        self.conn
            .execute("DELETE FROM local_storage WHERE key = ?1", params![key])?;
        Ok(())
    }

    /// Read and decode a JSON value. Corrupt JSON is logged and treated as absent.
    pub fn get_json<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>, StoreError> {
        let Some(raw) = self.get_item(key)? else {
            return Ok(None);
        };

        match serde_json::from_str(&raw) {
            Ok(value) => Ok(Some(value)),
            Err(e) => {
                warn!(key, error = %e, "corrupt value in local storage");
                Ok(None)
            }
        }
    }

    pub fn set_json<T: Serialize>(&self, key: &str, value: &T) -> Result<(), StoreError> {
        self.set_item(key, &serde_json::to_string(value)?)
    }
}

// ============================================================================
// APPLICATION STORE
// ============================================================================

/// Submitted applications, keyed by application reference
pub trait ApplicationStore {
    /// All stored applications. Never fails: storage problems fall back to
    /// the seed list.
    fn list(&self) -> Vec<Application>;

    fn append(&mut self, application: Application) -> Result<(), StoreError>;

    fn remove(&mut self, reference: &str) -> Result<Application, StoreError>;

    /// Attach a payment receipt; the application moves to under-review
    fn attach_receipt(
        &mut self,
        reference: &str,
        receipt: UploadedDocument,
    ) -> Result<Application, StoreError>;

    fn set_status(
        &mut self,
        reference: &str,
        status: ApplicationStatus,
    ) -> Result<Application, StoreError>;

    fn find(&self, reference: &str) -> Option<Application> {
        self.list()
            .into_iter()
            .find(|app| app.application_reference == reference)
    }
}

/// ApplicationStore backed by LocalStorage
pub struct LocalStorageStore {
    storage: LocalStorage,
}

impl LocalStorageStore {
    pub fn new(storage: LocalStorage) -> Self {
        LocalStorageStore { storage }
    }

    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, StoreError> {
        Ok(Self::new(LocalStorage::open(path)?))
    }

    pub fn in_memory() -> Result<Self, StoreError> {
        Ok(Self::new(LocalStorage::in_memory()?))
    }

    pub fn storage(&self) -> &LocalStorage {
        &self.storage
    }

    fn write(&self, applications: &[Application]) -> Result<(), StoreError> {
        self.storage.set_json(APPLICATIONS_KEY, &applications)
    }

    fn update<F>(&mut self, reference: &str, change: F) -> Result<Application, StoreError>
    where
        F: FnOnce(&mut Application),
    {
        let mut applications = self.list();
        let app = applications
            .iter_mut()
            .find(|app| app.application_reference == reference)
            .ok_or_else(|| StoreError::NotFound(reference.to_string()))?;

        change(app);
        let updated = app.clone();

        self.write(&applications)?;
        Ok(updated)
    }
}

impl ApplicationStore for LocalStorageStore {
    fn list(&self) -> Vec<Application> {
        match self.storage.get_json::<Vec<Application>>(APPLICATIONS_KEY) {
            Ok(Some(applications)) => applications,
            Ok(None) => {
                debug!("no stored applications, using seed list");
                seed_applications()
            }
            Err(e) => {
                warn!(error = %e, "failed to read applications, using seed list");
                seed_applications()
            }
        }
    }

    fn append(&mut self, application: Application) -> Result<(), StoreError> {
        let mut applications = self.list();
        if applications
            .iter()
            .any(|app| app.application_reference == application.application_reference)
        {
            return Err(StoreError::Duplicate(application.application_reference));
        }

        info!(
            reference = %application.application_reference,
            status = application.status.as_str(),
            "storing application"
        );
        applications.push(application);
        self.write(&applications)
    }

    fn remove(&mut self, reference: &str) -> Result<Application, StoreError> {
        let mut applications = self.list();
        let index = applications
            .iter()
            .position(|app| app.application_reference == reference)
            .ok_or_else(|| StoreError::NotFound(reference.to_string()))?;

        let removed = applications.remove(index);
        self.write(&applications)?;
        info!(reference, "removed application");
        Ok(removed)
    }

    fn attach_receipt(
        &mut self,
        reference: &str,
        receipt: UploadedDocument,
    ) -> Result<Application, StoreError> {
        let app = self.update(reference, |app| app.attach_receipt(receipt))?;
        info!(reference, "receipt attached");
        Ok(app)
    }

    fn set_status(
        &mut self,
        reference: &str,
        status: ApplicationStatus,
    ) -> Result<Application, StoreError> {
        let app = self.update(reference, |app| app.set_status(status))?;
        info!(reference, status = status.as_str(), "status changed");
        Ok(app)
    }
}

// ============================================================================
// SEED DATA
// ============================================================================

fn seed_date(year: i32, month: u32, day: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(year, month, day, 10, 0, 0)
        .earliest()
        .unwrap_or_else(Utc::now)
}

fn seed_application(
    reference: &str,
    submitted_at: DateTime<Utc>,
    mut registration: RegistrationData,
    status: ApplicationStatus,
) -> Application {
    registration.application_reference = Some(reference.to_string());
    registration.submission_date = Some(submitted_at);
    registration.status = Some(status);

    Application {
        application_reference: reference.to_string(),
        status,
        submitted_at,
        applicant_name: registration.display_name(),
        registration,
    }
}

/// Fixed list shown on first run and whenever stored data can't be read
pub fn seed_applications() -> Vec<Application> {
    let declaration = PropertyData {
        owns_residential_property: false,
        properties: Vec::new(),
        declaration_accepted: true,
    };

    let business = RegistrationData {
        entry_point: Some(EntryPoint::Business),
        business_type: Some("limited liability company".to_string()),
        business_data: Some(BusinessData {
            business_type: "limited liability company".to_string(),
            business_name: "Kollie Trading Inc.".to_string(),
            registration_number: "LBR-2025-00418".to_string(),
            tin: Some("500123456".to_string()),
            address: "12 Randall Street, Monrovia".to_string(),
            county: "Montserrado".to_string(),
            phone: "+231 770 123 456".to_string(),
            email: Some("accounts@kollietrading.lr".to_string()),
            has_branches: false,
        }),
        property_data: Some(declaration.clone()),
        payment_data: Some(PaymentData {
            payment_method: PaymentMethod::Card,
            challan_number: None,
            receipt: None,
            declaration_accepted: true,
        }),
        ..RegistrationData::default()
    };

    let individual = RegistrationData {
        entry_point: Some(EntryPoint::Individual),
        applicant_type: Some("individual".to_string()),
        individual_data: Some(IndividualData {
            applicant_type: "individual".to_string(),
            first_name: "Musu".to_string(),
            last_name: "Johnson".to_string(),
            national_id: "NIR-8841203".to_string(),
            date_of_birth: None,
            phone: "+231 886 555 010".to_string(),
            email: None,
            address: "Sinkor, Old Road".to_string(),
            county: "Montserrado".to_string(),
        }),
        property_data: Some(declaration.clone()),
        payment_data: Some(PaymentData {
            payment_method: PaymentMethod::Offline,
            challan_number: Some("CHL/2025/000002".to_string()),
            receipt: Some(UploadedDocument::new(Step::Review, "receipt", "bank-slip.jpg", 184_320)),
            declaration_accepted: true,
        }),
        ..RegistrationData::default()
    };

    let pending = RegistrationData {
        entry_point: Some(EntryPoint::Business),
        business_type: Some("partnership".to_string()),
        business_data: Some(BusinessData {
            business_type: "partnership".to_string(),
            business_name: "Bong Mines Supplies".to_string(),
            registration_number: "LBR-2025-01102".to_string(),
            tin: None,
            address: "Main Street, Gbarnga".to_string(),
            county: "Bong".to_string(),
            phone: "+231 777 900 321".to_string(),
            email: None,
            has_branches: false,
        }),
        property_data: Some(declaration),
        payment_data: Some(PaymentData {
            payment_method: PaymentMethod::Offline,
            challan_number: Some("CHL/2025/000003".to_string()),
            receipt: None,
            declaration_accepted: true,
        }),
        ..RegistrationData::default()
    };

    vec![
        seed_application("LRA/GST/2025/000001", seed_date(2025, 3, 14), business, ApplicationStatus::Approved),
        seed_application("LRA/GST/2025/000002", seed_date(2025, 6, 2), individual, ApplicationStatus::UnderReview),
        seed_application("LRA/GST/2025/000003", seed_date(2025, 9, 21), pending, ApplicationStatus::PendingReceipt),
    ]
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn application(reference: &str, status: ApplicationStatus) -> Application {
        seed_application(reference, Utc::now(), RegistrationData::default(), status)
    }

    #[test]
    fn test_local_storage_round_trip() {
        let storage = LocalStorage::in_memory().unwrap();

        assert_eq!(storage.get_item("missing").unwrap(), None);

        storage.set_item("k", "v1").unwrap();
        storage.set_item("k", "v2").unwrap();
        assert_eq!(storage.get_item("k").unwrap().as_deref(), Some("v2"));

        storage.remove_item("k").unwrap();
        assert_eq!(storage.get_item("k").unwrap(), None);
    }

    #[test]
    fn test_corrupt_json_reads_as_absent() {
        let storage = LocalStorage::in_memory().unwrap();
        storage.set_item("draft", "{not json").unwrap();

        let value: Option<Vec<String>> = storage.get_json("draft").unwrap();
        assert!(value.is_none());
    }

    #[test]
    fn test_empty_store_lists_seed() {
        let store = LocalStorageStore::in_memory().unwrap();
        let references: Vec<_> = store
            .list()
            .into_iter()
            .map(|app| app.application_reference)
            .collect();

        assert_eq!(
            references,
            vec!["LRA/GST/2025/000001", "LRA/GST/2025/000002", "LRA/GST/2025/000003"]
        );
    }

    #[test]
    fn test_corrupt_store_falls_back_to_seed() {
        let store = LocalStorageStore::in_memory().unwrap();
        store.storage().set_item(APPLICATIONS_KEY, "[{\"broken\": true}]").unwrap();

        let apps = store.list();
        assert_eq!(apps.len(), seed_applications().len());
        assert_eq!(apps[0].application_reference, "LRA/GST/2025/000001");
    }

    #[test]
    fn test_append_and_find() {
        let mut store = LocalStorageStore::in_memory().unwrap();
        store
            .append(application("LRA/GST/2026/000004", ApplicationStatus::Submitted))
            .unwrap();

        assert_eq!(store.list().len(), 4);
        let found = store.find("LRA/GST/2026/000004").unwrap();
        assert_eq!(found.status, ApplicationStatus::Submitted);
    }

    #[test]
    fn test_append_rejects_duplicate_reference() {
        let mut store = LocalStorageStore::in_memory().unwrap();
        let result = store.append(application("LRA/GST/2025/000001", ApplicationStatus::Submitted));
        assert!(matches!(result, Err(StoreError::Duplicate(_))));
    }

    #[test]
    fn test_remove() {
        let mut store = LocalStorageStore::in_memory().unwrap();

        let removed = store.remove("LRA/GST/2025/000002").unwrap();
        assert_eq!(removed.applicant_name, "Musu Johnson");
        assert_eq!(store.list().len(), 2);
        assert!(store.find("LRA/GST/2025/000002").is_none());

        assert!(matches!(store.remove("LRA/GST/2025/000002"), Err(StoreError::NotFound(_))));
    }

    #[test]
    fn test_attach_receipt_sets_under_review() {
        let mut store = LocalStorageStore::in_memory().unwrap();
        let receipt = UploadedDocument::new(Step::Review, "receipt", "slip.pdf", 2048);

        let app = store.attach_receipt("LRA/GST/2025/000003", receipt).unwrap();

        assert_eq!(app.status, ApplicationStatus::UnderReview);
        let stored = store.find("LRA/GST/2025/000003").unwrap();
        assert_eq!(stored.status, ApplicationStatus::UnderReview);
        assert!(stored.registration.has_receipt());
    }

    #[test]
    fn test_set_status_unknown_reference() {
        let mut store = LocalStorageStore::in_memory().unwrap();
        let result = store.set_status("LRA/GST/1999/000001", ApplicationStatus::Approved);
        assert!(matches!(result, Err(StoreError::NotFound(_))));
    }

    #[test]
    fn test_file_storage_persists_across_opens() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("lra_gst.db");

        {
            let mut store = LocalStorageStore::open(&path).unwrap();
            store.remove("LRA/GST/2025/000001").unwrap();
        }

        let store = LocalStorageStore::open(&path).unwrap();
        assert_eq!(store.list().len(), 2);
    }
}
