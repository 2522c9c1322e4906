// LRA GST Registration Wizard - Core Library
// Exposes the routing state machine, data model and storage for the CLI/TUI,
// the API server, and tests

pub mod step;
pub mod registration;
pub mod documents;
pub mod routing;       // Step sequencing: next / previous / progress
pub mod wizard;        // State container: dispatch, reducer, observers
pub mod submission;    // References, status, challans, export
pub mod store;         // Local storage + application store
pub mod forms;         // Step form collaborator
pub mod config;
pub mod logging;
pub mod error;

#[cfg(feature = "server")]
pub mod api;

// Re-export commonly used types
pub use step::{Step, InfoSection, View};
pub use registration::{
    RegistrationData, EntryPoint, StepPayload, StepSubmission,
    EntrySelection, IndividualData, BusinessData, SoleProprietorshipData,
    BranchData, Branch, PropertyData, ResidentialProperty, PaymentData,
    PaymentMethod, ApplicationStatus,
};
pub use documents::UploadedDocument;
pub use wizard::{
    RegistrationWizard, WizardState, WizardEvent, Outcome, RejectReason,
    StateObserver, DraftWriter, load_draft, open_session,
};
pub use submission::{
    Application, application_reference, derive_status,
    export_file_name, export_registration,
};
pub use store::{ApplicationStore, LocalStorage, LocalStorageStore};
pub use forms::{Form, Field, FieldKind, FieldError};
pub use error::{StoreError, DocumentError, ExportError};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
