// 🗂️ Registration Data - Accumulated wizard state
// Built incrementally: each step owns its own fields and only ever writes those.
//
// The step forms hand over one strongly-typed payload per step (StepPayload),
// so the merge below is an exhaustive match instead of a blind object spread.

use crate::documents::UploadedDocument;
use crate::step::Step;
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

// ============================================================================
// DISCRIMINATORS
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum EntryPoint {
    Individual,
    Business,
}

impl EntryPoint {
    pub fn as_str(&self) -> &'static str {
        match self {
            EntryPoint::Individual => "individual",
            EntryPoint::Business => "business",
        }
    }
}

/// How routing reads the free-form `applicant_type`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApplicantKind {
    Individual,
    /// Anything else, including unset
    Other,
}

/// How routing reads the free-form `business_type`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BusinessKind {
    SoleProprietorship,
    /// Anything else, including unset
    Other,
}

/// Lowercase, treat '-' and '_' as spaces, collapse whitespace.
/// "Sole-Proprietorship", "sole_proprietorship" and " sole  proprietorship" all agree.
fn normalize(value: &str) -> String {
    value
        .to_lowercase()
        .replace(|c: char| c == '-' || c == '_', " ")
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

pub fn classify_applicant(applicant_type: Option<&str>) -> ApplicantKind {
    match applicant_type.map(normalize).as_deref() {
        Some("individual") => ApplicantKind::Individual,
        _ => ApplicantKind::Other,
    }
}

pub fn classify_business(business_type: Option<&str>) -> BusinessKind {
    match business_type.map(normalize).as_deref() {
        Some("sole proprietorship") => BusinessKind::SoleProprietorship,
        _ => BusinessKind::Other,
    }
}

// ============================================================================
// STEP PAYLOADS
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EntrySelection {
    pub entry_point: EntryPoint,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IndividualData {
    /// e.g. "individual", "sole-proprietorship", "property-only"
    pub applicant_type: String,
    pub first_name: String,
    pub last_name: String,
    pub national_id: String,
    #[serde(default)]
    pub date_of_birth: Option<NaiveDate>,
    pub phone: String,
    #[serde(default)]
    pub email: Option<String>,
    pub address: String,
    pub county: String,
}

impl IndividualData {
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name).trim().to_string()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BusinessData {
    /// e.g. "sole proprietorship", "partnership", "limited liability company"
    pub business_type: String,
    pub business_name: String,
    pub registration_number: String,
    #[serde(default)]
    pub tin: Option<String>,
    pub address: String,
    pub county: String,
    pub phone: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub has_branches: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SoleProprietorshipData {
    pub owner_name: String,
    pub owner_id_number: String,
    pub trading_name: String,
    #[serde(default)]
    pub commencement_date: Option<NaiveDate>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Branch {
    pub name: String,
    pub address: String,
    pub county: String,
    #[serde(default)]
    pub manager: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BranchData {
    pub branches: Vec<Branch>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResidentialProperty {
    pub address: String,
    pub county: String,
    /// e.g. "house", "apartment", "land"
    pub property_type: String,
    #[serde(default)]
    pub owner_occupied: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PropertyData {
    pub owns_residential_property: bool,
    #[serde(default)]
    pub properties: Vec<ResidentialProperty>,
    pub declaration_accepted: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PaymentMethod {
    MobileMoney,
    Card,
    OnlineBankTransfer,
    /// Pay at the bank with a challan, then upload the receipt
    Offline,
}

impl PaymentMethod {
    pub const ALL: [PaymentMethod; 4] = [
        PaymentMethod::MobileMoney,
        PaymentMethod::Card,
        PaymentMethod::OnlineBankTransfer,
        PaymentMethod::Offline,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentMethod::MobileMoney => "mobile-money",
            PaymentMethod::Card => "card",
            PaymentMethod::OnlineBankTransfer => "online-bank-transfer",
            PaymentMethod::Offline => "offline",
        }
    }

    pub fn is_offline(&self) -> bool {
        matches!(self, PaymentMethod::Offline)
    }
}

impl std::str::FromStr for PaymentMethod {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        PaymentMethod::ALL
            .iter()
            .copied()
            .find(|method| method.as_str() == s)
            .ok_or_else(|| format!("unknown payment method: {}", s))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentData {
    pub payment_method: PaymentMethod,
    #[serde(default)]
    pub challan_number: Option<String>,
    #[serde(default)]
    pub receipt: Option<UploadedDocument>,
    pub declaration_accepted: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ApplicationStatus {
    Submitted,
    PendingReceipt,
    UnderReview,
    Approved,
    Rejected,
}

impl ApplicationStatus {
    pub const ALL: [ApplicationStatus; 5] = [
        ApplicationStatus::Submitted,
        ApplicationStatus::PendingReceipt,
        ApplicationStatus::UnderReview,
        ApplicationStatus::Approved,
        ApplicationStatus::Rejected,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ApplicationStatus::Submitted => "submitted",
            ApplicationStatus::PendingReceipt => "pending-receipt",
            ApplicationStatus::UnderReview => "under-review",
            ApplicationStatus::Approved => "approved",
            ApplicationStatus::Rejected => "rejected",
        }
    }
}

impl std::str::FromStr for ApplicationStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ApplicationStatus::ALL
            .iter()
            .copied()
            .find(|status| status.as_str() == s)
            .ok_or_else(|| format!("unknown status: {}", s))
    }
}

/// One completion payload per step, keyed by the step that produced it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "step", content = "data", rename_all = "kebab-case")]
pub enum StepPayload {
    Entry(EntrySelection),
    Individual(IndividualData),
    Business(BusinessData),
    SoleProprietorship(SoleProprietorshipData),
    Branch(BranchData),
    Property(PropertyData),
    Review(PaymentData),
}

impl StepPayload {
    pub fn step(&self) -> Step {
        match self {
            StepPayload::Entry(_) => Step::Entry,
            StepPayload::Individual(_) => Step::Individual,
            StepPayload::Business(_) => Step::Business,
            StepPayload::SoleProprietorship(_) => Step::SoleProprietorship,
            StepPayload::Branch(_) => Step::Branch,
            StepPayload::Property(_) => Step::Property,
            StepPayload::Review(_) => Step::Review,
        }
    }
}

/// What a step form hands back on completion
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StepSubmission {
    pub payload: StepPayload,
    #[serde(default)]
    pub documents: Vec<UploadedDocument>,
}

impl StepSubmission {
    pub fn new(payload: StepPayload) -> Self {
        StepSubmission {
            payload,
            documents: Vec::new(),
        }
    }

    pub fn with_document(mut self, document: UploadedDocument) -> Self {
        self.documents.push(document);
        self
    }

    pub fn step(&self) -> Step {
        self.payload.step()
    }
}

impl From<StepPayload> for StepSubmission {
    fn from(payload: StepPayload) -> Self {
        StepSubmission::new(payload)
    }
}

// ============================================================================
// REGISTRATION DATA
// ============================================================================

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegistrationData {
    #[serde(default)]
    pub entry_point: Option<EntryPoint>,
    #[serde(default)]
    pub applicant_type: Option<String>,
    #[serde(default)]
    pub business_type: Option<String>,
    #[serde(default)]
    pub has_branches: bool,

    #[serde(default)]
    pub individual_data: Option<IndividualData>,
    #[serde(default)]
    pub business_data: Option<BusinessData>,
    #[serde(default)]
    pub sole_proprietorship_data: Option<SoleProprietorshipData>,
    #[serde(default)]
    pub branch_data: Option<BranchData>,
    #[serde(default)]
    pub property_data: Option<PropertyData>,
    #[serde(default)]
    pub payment_data: Option<PaymentData>,

    #[serde(default)]
    pub uploaded_documents: Vec<UploadedDocument>,

    // Written once, by the review step
    #[serde(default)]
    pub submission_date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub application_reference: Option<String>,
    #[serde(default)]
    pub status: Option<ApplicationStatus>,
}

impl RegistrationData {
    pub fn new() -> Self {
        Self::default()
    }

    /// Merge a step's completion payload into the accumulated data.
    ///
    /// Only the fields owned by the submitting step are touched. A document
    /// kind re-uploaded by the step replaces the earlier upload; kinds it
    /// doesn't resend are kept, as are documents from other steps.
    ///
    /// The business step owns the "operates branches" answer, so answering
    /// "no" drops the branch list collected under a previous "yes".
    pub fn merge(&mut self, submission: StepSubmission) {
        let step = submission.step();

        match submission.payload {
            StepPayload::Entry(selection) => {
                self.entry_point = Some(selection.entry_point);
            }
            StepPayload::Individual(data) => {
                self.applicant_type = Some(data.applicant_type.clone());
                self.individual_data = Some(data);
            }
            StepPayload::Business(data) => {
                self.business_type = Some(data.business_type.clone());
                self.has_branches = data.has_branches;
                if !data.has_branches {
                    self.branch_data = None;
                    self.uploaded_documents.retain(|doc| doc.step != Step::Branch);
                }
                self.business_data = Some(data);
            }
            StepPayload::SoleProprietorship(data) => {
                self.sole_proprietorship_data = Some(data);
            }
            StepPayload::Branch(data) => {
                self.branch_data = Some(data);
            }
            StepPayload::Property(data) => {
                self.property_data = Some(data);
            }
            StepPayload::Review(data) => {
                self.payment_data = Some(data);
            }
        }

        let resent: Vec<&str> = submission.documents.iter().map(|doc| doc.kind.as_str()).collect();
        self.uploaded_documents
            .retain(|doc| doc.step != step || !resent.contains(&doc.kind.as_str()));
        self.uploaded_documents
            .extend(submission.documents.into_iter().map(|mut doc| {
                doc.step = step;
                doc
            }));
    }

    /// Record the one-time submission fields. Returns false (and changes
    /// nothing) if the registration was already submitted.
    pub fn record_submission(
        &mut self,
        reference: String,
        submitted_at: DateTime<Utc>,
        status: ApplicationStatus,
    ) -> bool {
        if self.is_submitted() {
            return false;
        }
        self.application_reference = Some(reference);
        self.submission_date = Some(submitted_at);
        self.status = Some(status);
        true
    }

    pub fn is_submitted(&self) -> bool {
        self.application_reference.is_some()
    }

    pub fn applicant_kind(&self) -> ApplicantKind {
        classify_applicant(self.applicant_type.as_deref())
    }

    pub fn business_kind(&self) -> BusinessKind {
        classify_business(self.business_type.as_deref())
    }

    /// Whether the branch step is part of this registration's path
    pub fn branches_inserted(&self) -> bool {
        self.has_branches || self.branch_data.is_some()
    }

    /// Whether a payment receipt has been attached anywhere
    pub fn has_receipt(&self) -> bool {
        self.payment_data
            .as_ref()
            .map_or(false, |payment| payment.receipt.is_some())
            || self.uploaded_documents.iter().any(|doc| doc.kind == "receipt")
    }

    /// Name shown in application lists
    pub fn display_name(&self) -> String {
        if let Some(business) = &self.business_data {
            if !business.business_name.trim().is_empty() {
                return business.business_name.clone();
            }
        }
        if let Some(sole) = &self.sole_proprietorship_data {
            if !sole.trading_name.trim().is_empty() {
                return sole.trading_name.clone();
            }
        }
        if let Some(individual) = &self.individual_data {
            let name = individual.full_name();
            if !name.is_empty() {
                return name;
            }
        }
        "Unnamed applicant".to_string()
    }

    pub fn documents_for(&self, step: Step) -> impl Iterator<Item = &UploadedDocument> {
        self.uploaded_documents.iter().filter(move |doc| doc.step == step)
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn individual(applicant_type: &str) -> IndividualData {
        IndividualData {
            applicant_type: applicant_type.to_string(),
            first_name: "Comfort".to_string(),
            last_name: "Kollie".to_string(),
            national_id: "LR-1234567".to_string(),
            date_of_birth: None,
            phone: "+231770000000".to_string(),
            email: None,
            address: "Broad Street".to_string(),
            county: "Montserrado".to_string(),
        }
    }

    fn business(business_type: &str, has_branches: bool) -> BusinessData {
        BusinessData {
            business_type: business_type.to_string(),
            business_name: "Kollie Trading".to_string(),
            registration_number: "BR-2024-001".to_string(),
            tin: None,
            address: "Randall Street".to_string(),
            county: "Montserrado".to_string(),
            phone: "+231880000000".to_string(),
            email: None,
            has_branches,
        }
    }

    #[test]
    fn test_classify_business_is_lenient() {
        assert_eq!(classify_business(Some("sole proprietorship")), BusinessKind::SoleProprietorship);
        assert_eq!(classify_business(Some("Sole-Proprietorship")), BusinessKind::SoleProprietorship);
        assert_eq!(classify_business(Some(" sole_proprietorship ")), BusinessKind::SoleProprietorship);
        assert_eq!(classify_business(Some("partnership")), BusinessKind::Other);
        assert_eq!(classify_business(None), BusinessKind::Other);
    }

    #[test]
    fn test_classify_applicant() {
        assert_eq!(classify_applicant(Some("Individual")), ApplicantKind::Individual);
        assert_eq!(classify_applicant(Some("property-only")), ApplicantKind::Other);
        assert_eq!(classify_applicant(None), ApplicantKind::Other);
    }

    #[test]
    fn test_merge_sets_discriminators() {
        let mut data = RegistrationData::new();
        data.merge(StepPayload::Entry(EntrySelection { entry_point: EntryPoint::Business }).into());
        data.merge(StepPayload::Business(business("sole proprietorship", true)).into());

        assert_eq!(data.entry_point, Some(EntryPoint::Business));
        assert_eq!(data.business_type.as_deref(), Some("sole proprietorship"));
        assert!(data.has_branches);
        assert!(data.branches_inserted());
        assert_eq!(data.business_kind(), BusinessKind::SoleProprietorship);
    }

    #[test]
    fn test_merge_never_clears_other_steps() {
        let mut data = RegistrationData::new();
        data.merge(StepPayload::Entry(EntrySelection { entry_point: EntryPoint::Individual }).into());
        data.merge(StepPayload::Individual(individual("sole-proprietorship")).into());
        data.merge(StepPayload::Business(business("partnership", false)).into());

        let before = data.clone();
        data.merge(
            StepPayload::Property(PropertyData {
                owns_residential_property: false,
                properties: vec![],
                declaration_accepted: true,
            })
            .into(),
        );

        assert_eq!(data.entry_point, before.entry_point);
        assert_eq!(data.individual_data, before.individual_data);
        assert_eq!(data.business_data, before.business_data);
        assert_eq!(data.applicant_type, before.applicant_type);
        assert!(data.property_data.is_some());
    }

    fn payloads(name: &str, has_branches: bool) -> Vec<StepPayload> {
        let mut person = individual("sole-proprietorship");
        person.first_name = name.to_string();
        let mut company = business("sole proprietorship", has_branches);
        company.business_name = format!("{} Trading", name);

        vec![
            StepPayload::Entry(EntrySelection {
                entry_point: if name == "Comfort" { EntryPoint::Individual } else { EntryPoint::Business },
            }),
            StepPayload::Individual(person),
            StepPayload::Business(company),
            StepPayload::SoleProprietorship(SoleProprietorshipData {
                owner_name: name.to_string(),
                owner_id_number: "LR-7654321".to_string(),
                trading_name: format!("{} Stores", name),
                commencement_date: None,
            }),
            StepPayload::Branch(BranchData {
                branches: vec![Branch {
                    name: format!("{} Gbarnga", name),
                    address: "Main Street".to_string(),
                    county: "Bong".to_string(),
                    manager: None,
                }],
            }),
            StepPayload::Property(PropertyData {
                owns_residential_property: name == "Comfort",
                properties: vec![],
                declaration_accepted: true,
            }),
            StepPayload::Review(PaymentData {
                payment_method: if name == "Comfort" { PaymentMethod::Card } else { PaymentMethod::Offline },
                challan_number: None,
                receipt: None,
                declaration_accepted: true,
            }),
        ]
    }

    /// Everything one step writes, documents included
    fn owned_by(data: &RegistrationData, step: Step) -> serde_json::Value {
        let fields = match step {
            Step::Entry => serde_json::json!(data.entry_point),
            Step::Individual => serde_json::json!([data.applicant_type, data.individual_data]),
            Step::Business => serde_json::json!([data.business_type, data.has_branches, data.business_data]),
            Step::SoleProprietorship => serde_json::json!(data.sole_proprietorship_data),
            Step::Branch => serde_json::json!(data.branch_data),
            Step::Property => serde_json::json!(data.property_data),
            Step::Review => serde_json::json!(data.payment_data),
            Step::Complete => serde_json::json!([data.application_reference, data.status]),
        };
        let documents: Vec<&UploadedDocument> = data.documents_for(step).collect();
        serde_json::json!({ "fields": fields, "documents": documents })
    }

    #[test]
    fn test_merge_of_every_step_leaves_other_steps_alone() {
        let mut populated = RegistrationData::new();
        for payload in payloads("Comfort", true) {
            let step = payload.step();
            populated.merge(
                StepSubmission::new(payload)
                    .with_document(UploadedDocument::new(step, "supporting", "scan.pdf", 42)),
            );
        }

        for payload in payloads("Garmai", true) {
            let step = payload.step();
            let mut data = populated.clone();
            data.merge(payload.into());

            assert_ne!(owned_by(&data, step), owned_by(&populated, step), "{} did not change", step);
            for other in Step::ALL.into_iter().filter(|s| *s != step) {
                assert_eq!(
                    owned_by(&data, other),
                    owned_by(&populated, other),
                    "merging {} changed {}",
                    step,
                    other
                );
            }
        }
    }

    #[test]
    fn test_business_without_branches_drops_branch_list() {
        let mut data = RegistrationData::new();
        data.merge(StepPayload::Entry(EntrySelection { entry_point: EntryPoint::Business }).into());
        data.merge(StepPayload::Business(business("partnership", true)).into());
        data.merge(
            StepSubmission::new(StepPayload::Branch(BranchData {
                branches: vec![Branch::default()],
            }))
            .with_document(UploadedDocument::new(Step::Branch, "lease", "lease.pdf", 5)),
        );
        assert!(data.branches_inserted());

        data.merge(StepPayload::Business(business("partnership", false)).into());

        assert!(!data.has_branches);
        assert!(data.branch_data.is_none());
        assert_eq!(data.documents_for(Step::Branch).count(), 0);
        assert!(!data.branches_inserted());
    }

    #[test]
    fn test_resubmission_without_file_keeps_earlier_upload() {
        let mut data = RegistrationData::new();
        data.merge(
            StepSubmission::new(StepPayload::Individual(individual("individual")))
                .with_document(UploadedDocument::new(Step::Individual, "national-id", "id-front.png", 10)),
        );

        data.merge(StepPayload::Individual(individual("individual")).into());

        let kept: Vec<_> = data.documents_for(Step::Individual).collect();
        assert_eq!(kept.len(), 1);
        assert_eq!(kept[0].file_name, "id-front.png");
    }

    #[test]
    fn test_resubmission_replaces_only_own_documents() {
        let mut data = RegistrationData::new();
        data.merge(
            StepSubmission::new(StepPayload::Individual(individual("individual")))
                .with_document(UploadedDocument::new(Step::Individual, "national-id", "id-front.png", 10)),
        );
        data.merge(
            StepSubmission::new(StepPayload::Property(PropertyData::default()))
                .with_document(UploadedDocument::new(Step::Property, "deed", "deed.pdf", 20)),
        );

        // Back to the individual step, new scan
        data.merge(
            StepSubmission::new(StepPayload::Individual(individual("individual")))
                .with_document(UploadedDocument::new(Step::Individual, "national-id", "id-rescan.png", 12)),
        );

        let individual_docs: Vec<_> = data.documents_for(Step::Individual).collect();
        assert_eq!(individual_docs.len(), 1);
        assert_eq!(individual_docs[0].file_name, "id-rescan.png");
        assert_eq!(data.documents_for(Step::Property).count(), 1);
    }

    #[test]
    fn test_documents_are_tagged_with_submitting_step() {
        let mut data = RegistrationData::new();
        // A form that mislabels its document still owns it
        data.merge(
            StepSubmission::new(StepPayload::Branch(BranchData::default()))
                .with_document(UploadedDocument::new(Step::Entry, "lease", "lease.pdf", 5)),
        );
        assert_eq!(data.uploaded_documents[0].step, Step::Branch);
    }

    #[test]
    fn test_record_submission_only_once() {
        let mut data = RegistrationData::new();
        let now = Utc::now();

        assert!(data.record_submission("LRA/GST/2026/000001".to_string(), now, ApplicationStatus::Submitted));
        assert!(!data.record_submission("LRA/GST/2026/000002".to_string(), now, ApplicationStatus::UnderReview));

        assert_eq!(data.application_reference.as_deref(), Some("LRA/GST/2026/000001"));
        assert_eq!(data.status, Some(ApplicationStatus::Submitted));
    }

    #[test]
    fn test_display_name_prefers_business() {
        let mut data = RegistrationData::new();
        data.merge(StepPayload::Individual(individual("sole-proprietorship")).into());
        assert_eq!(data.display_name(), "Comfort Kollie");

        data.merge(StepPayload::Business(business("partnership", false)).into());
        assert_eq!(data.display_name(), "Kollie Trading");
    }

    #[test]
    fn test_payload_serializes_tagged_by_step() {
        let payload = StepPayload::Entry(EntrySelection { entry_point: EntryPoint::Individual });
        let json = serde_json::to_value(&payload).unwrap();
        assert_eq!(json["step"], "entry");
        assert_eq!(json["data"]["entryPoint"], "individual");
    }
}
