// 📝 Step Forms - Field-level input for each wizard step
//
// A Form is built from the step and the data collected so far (initial data),
// edited field by field, and turned into a StepSubmission on submit.
// Validation here is deliberately shallow: required fields, dates, e-mail
// shape and the mandatory declarations.

use crate::documents::UploadedDocument;
use crate::registration::{
    Branch, BranchData, BusinessData, EntryPoint, EntrySelection, IndividualData, PaymentData,
    PaymentMethod, PropertyData, RegistrationData, ResidentialProperty, SoleProprietorshipData,
    StepPayload, StepSubmission,
};
use crate::step::Step;
use chrono::NaiveDate;

pub const COUNTIES: [&str; 15] = [
    "Bomi",
    "Bong",
    "Gbarpolu",
    "Grand Bassa",
    "Grand Cape Mount",
    "Grand Gedeh",
    "Grand Kru",
    "Lofa",
    "Margibi",
    "Maryland",
    "Montserrado",
    "Nimba",
    "River Cess",
    "River Gee",
    "Sinoe",
];

const ENTRY_POINTS: [&str; 2] = ["individual", "business"];
const APPLICANT_TYPES: [&str; 3] = ["individual", "sole-proprietorship", "property-only"];
const BUSINESS_TYPES: [&str; 5] = [
    "sole proprietorship",
    "partnership",
    "limited liability company",
    "corporation",
    "non-governmental organization",
];
const PROPERTY_TYPES: [&str; 4] = ["house", "apartment", "land", "mixed-use"];
const PAYMENT_METHODS: [&str; 4] = ["mobile-money", "card", "online-bank-transfer", "offline"];
const YES_NO: [&str; 2] = ["no", "yes"];

const BRANCH_FIELDS: [[&str; 3]; 3] = [
    ["branch1_name", "branch1_address", "branch1_county"],
    ["branch2_name", "branch2_address", "branch2_county"],
    ["branch3_name", "branch3_address", "branch3_county"],
];

const DATE_FORMAT: &str = "%Y-%m-%d";

// ============================================================================
// FIELDS
// ============================================================================

#[derive(Debug, Clone, PartialEq)]
pub enum FieldKind {
    Text,
    /// YYYY-MM-DD
    Date,
    Choice(&'static [&'static str]),
    /// Path to a file on disk
    File,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Field {
    pub key: &'static str,
    pub label: &'static str,
    pub kind: FieldKind,
    pub required: bool,
    pub value: String,
}

impl Field {
    fn new(key: &'static str, label: &'static str, kind: FieldKind) -> Self {
        let value = match kind {
            FieldKind::Choice(options) => options.first().copied().unwrap_or_default().to_string(),
            _ => String::new(),
        };
        Field {
            key,
            label,
            kind,
            required: true,
            value,
        }
    }

    fn text(key: &'static str, label: &'static str) -> Self {
        Self::new(key, label, FieldKind::Text)
    }

    fn date(key: &'static str, label: &'static str) -> Self {
        Self::new(key, label, FieldKind::Date)
    }

    fn choice(key: &'static str, label: &'static str, options: &'static [&'static str]) -> Self {
        Self::new(key, label, FieldKind::Choice(options))
    }

    fn toggle(key: &'static str, label: &'static str) -> Self {
        Self::new(key, label, FieldKind::Choice(&YES_NO))
    }

    fn file(key: &'static str, label: &'static str) -> Self {
        Self::new(key, label, FieldKind::File).optional()
    }

    fn optional(mut self) -> Self {
        self.required = false;
        self
    }

    fn with_value<S: Into<String>>(mut self, value: S) -> Self {
        let value = value.into();
        if !value.is_empty() {
            self.value = value;
        }
        self
    }

    pub fn is_blank(&self) -> bool {
        self.value.trim().is_empty()
    }

    /// Step a choice field to the next (or previous) option
    pub fn cycle(&mut self, forward: bool) {
        let FieldKind::Choice(options) = self.kind else {
            return;
        };
        if options.is_empty() {
            return;
        }
        let current = options.iter().position(|o| *o == self.value).unwrap_or(0);
        let next = if forward {
            (current + 1) % options.len()
        } else {
            (current + options.len() - 1) % options.len()
        };
        self.value = options[next].to_string();
    }

    pub fn push_char(&mut self, c: char) {
        if !matches!(self.kind, FieldKind::Choice(_)) {
            self.value.push(c);
        }
    }

    pub fn pop_char(&mut self) {
        if !matches!(self.kind, FieldKind::Choice(_)) {
            self.value.pop();
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldError {
    pub key: &'static str,
    pub message: String,
}

impl FieldError {
    fn new(key: &'static str, message: impl Into<String>) -> Self {
        FieldError {
            key,
            message: message.into(),
        }
    }
}

fn yes(flag: bool) -> &'static str {
    if flag {
        "yes"
    } else {
        "no"
    }
}

fn date_string(date: Option<NaiveDate>) -> String {
    date.map(|d| d.format(DATE_FORMAT).to_string())
        .unwrap_or_default()
}

// ============================================================================
// FORM
// ============================================================================

#[derive(Debug, Clone, PartialEq)]
pub struct Form {
    step: Step,
    fields: Vec<Field>,
}

impl Form {
    /// Build the form for `step`, pre-filled from what was collected before.
    /// The completion screen has no form.
    pub fn for_step(step: Step, initial: &RegistrationData) -> Option<Form> {
        let fields = match step {
            Step::Entry => entry_fields(initial),
            Step::Individual => individual_fields(initial),
            Step::Business => business_fields(initial),
            Step::SoleProprietorship => sole_proprietorship_fields(initial),
            Step::Branch => branch_fields(initial),
            Step::Property => property_fields(initial),
            Step::Review => review_fields(initial),
            Step::Complete => return None,
        };
        Some(Form { step, fields })
    }

    pub fn step(&self) -> Step {
        self.step
    }

    pub fn fields(&self) -> &[Field] {
        &self.fields
    }

    pub fn fields_mut(&mut self) -> &mut [Field] {
        &mut self.fields
    }

    pub fn value(&self, key: &str) -> &str {
        self.fields
            .iter()
            .find(|f| f.key == key)
            .map(|f| f.value.trim())
            .unwrap_or("")
    }

    /// Set a field by key. Returns false for unknown keys.
    pub fn set(&mut self, key: &str, value: &str) -> bool {
        match self.fields.iter_mut().find(|f| f.key == key) {
            Some(field) => {
                field.value = value.to_string();
                true
            }
            None => false,
        }
    }

    fn text(&self, key: &str) -> String {
        self.value(key).to_string()
    }

    fn opt(&self, key: &str) -> Option<String> {
        Some(self.value(key)).filter(|v| !v.is_empty()).map(str::to_string)
    }

    fn flag(&self, key: &str) -> bool {
        self.value(key) == "yes"
    }

    fn date(&self, key: &'static str, errors: &mut Vec<FieldError>) -> Option<NaiveDate> {
        let raw = self.value(key);
        if raw.is_empty() {
            return None;
        }
        match NaiveDate::parse_from_str(raw, DATE_FORMAT) {
            Ok(date) => Some(date),
            Err(_) => {
                errors.push(FieldError::new(key, "use the format YYYY-MM-DD"));
                None
            }
        }
    }

    fn document(
        &self,
        key: &'static str,
        kind: &str,
        errors: &mut Vec<FieldError>,
    ) -> Option<UploadedDocument> {
        let path = self.value(key);
        if path.is_empty() {
            return None;
        }
        match UploadedDocument::from_file(self.step, kind, path) {
            Ok(doc) => Some(doc),
            Err(e) => {
                errors.push(FieldError::new(key, e.to_string()));
                None
            }
        }
    }

    fn validate(&self) -> Vec<FieldError> {
        let mut errors: Vec<FieldError> = self
            .fields
            .iter()
            .filter(|f| f.required && f.is_blank())
            .map(|f| FieldError::new(f.key, format!("{} is required", f.label)))
            .collect();

        if let Some(email) = self.opt("email") {
            if !email.contains('@') {
                errors.push(FieldError::new("email", "enter a valid e-mail address"));
            }
        }

        match self.step {
            Step::Property => {
                if self.flag("owns_residential_property") && self.value("property_address").is_empty() {
                    errors.push(FieldError::new("property_address", "Property address is required"));
                }
                if !self.flag("declaration") {
                    errors.push(FieldError::new("declaration", "the declaration must be accepted"));
                }
            }
            Step::Review => {
                if !self.flag("declaration") {
                    errors.push(FieldError::new("declaration", "the declaration must be accepted"));
                }
            }
            _ => {}
        }

        errors
    }

    /// Validate and build the completion payload (the `onComplete` data)
    pub fn submit(&self) -> Result<StepSubmission, Vec<FieldError>> {
        let mut errors = self.validate();
        if !errors.is_empty() {
            return Err(errors);
        }

        let submission = match self.step {
            Step::Entry => {
                let entry_point = match self.value("entry_point") {
                    "individual" => EntryPoint::Individual,
                    _ => EntryPoint::Business,
                };
                StepSubmission::new(StepPayload::Entry(EntrySelection { entry_point }))
            }
            Step::Individual => {
                let date_of_birth = self.date("date_of_birth", &mut errors);
                let payload = StepPayload::Individual(IndividualData {
                    applicant_type: self.text("applicant_type"),
                    first_name: self.text("first_name"),
                    last_name: self.text("last_name"),
                    national_id: self.text("national_id"),
                    date_of_birth,
                    phone: self.text("phone"),
                    email: self.opt("email"),
                    address: self.text("address"),
                    county: self.text("county"),
                });
                with_documents(payload, [self.document("id_document", "national-id", &mut errors)])
            }
            Step::Business => {
                let payload = StepPayload::Business(BusinessData {
                    business_type: self.text("business_type"),
                    business_name: self.text("business_name"),
                    registration_number: self.text("registration_number"),
                    tin: self.opt("tin"),
                    address: self.text("address"),
                    county: self.text("county"),
                    phone: self.text("phone"),
                    email: self.opt("email"),
                    has_branches: self.flag("has_branches"),
                });
                with_documents(
                    payload,
                    [self.document("certificate", "business-certificate", &mut errors)],
                )
            }
            Step::SoleProprietorship => {
                let commencement_date = self.date("commencement_date", &mut errors);
                StepSubmission::new(StepPayload::SoleProprietorship(SoleProprietorshipData {
                    owner_name: self.text("owner_name"),
                    owner_id_number: self.text("owner_id_number"),
                    trading_name: self.text("trading_name"),
                    commencement_date,
                }))
            }
            Step::Branch => {
                let branches = BRANCH_FIELDS
                    .iter()
                    .filter(|[name, _, _]| !self.value(name).is_empty())
                    .map(|[name, address, county]| Branch {
                        name: self.text(name),
                        address: self.text(address),
                        county: self.text(county),
                        manager: None,
                    })
                    .collect();
                StepSubmission::new(StepPayload::Branch(BranchData { branches }))
            }
            Step::Property => {
                let owns = self.flag("owns_residential_property");
                let properties = if owns {
                    vec![ResidentialProperty {
                        address: self.text("property_address"),
                        county: self.text("property_county"),
                        property_type: self.text("property_type"),
                        owner_occupied: self.flag("owner_occupied"),
                    }]
                } else {
                    Vec::new()
                };
                let payload = StepPayload::Property(PropertyData {
                    owns_residential_property: owns,
                    properties,
                    declaration_accepted: self.flag("declaration"),
                });
                with_documents(payload, [self.document("deed", "title-deed", &mut errors)])
            }
            Step::Review => {
                let payment_method = self
                    .value("payment_method")
                    .parse::<PaymentMethod>()
                    .unwrap_or(PaymentMethod::Offline);
                let receipt = self.document("receipt", "receipt", &mut errors);
                StepSubmission::new(StepPayload::Review(PaymentData {
                    payment_method,
                    challan_number: self.opt("challan_number"),
                    receipt,
                    declaration_accepted: self.flag("declaration"),
                }))
            }
            Step::Complete => return Err(vec![FieldError::new("step", "nothing to submit")]),
        };

        if errors.is_empty() {
            Ok(submission)
        } else {
            Err(errors)
        }
    }
}

fn with_documents<const N: usize>(
    payload: StepPayload,
    documents: [Option<UploadedDocument>; N],
) -> StepSubmission {
    documents
        .into_iter()
        .flatten()
        .fold(StepSubmission::new(payload), StepSubmission::with_document)
}

// ============================================================================
// FIELD SETS (pre-filled from initial data)
// ============================================================================

fn entry_fields(initial: &RegistrationData) -> Vec<Field> {
    vec![Field::choice("entry_point", "Registering as", &ENTRY_POINTS)
        .with_value(initial.entry_point.map(|e| e.as_str()).unwrap_or_default())]
}

fn individual_fields(initial: &RegistrationData) -> Vec<Field> {
    let d = initial.individual_data.clone().unwrap_or_default();
    vec![
        Field::choice("applicant_type", "Applicant type", &APPLICANT_TYPES).with_value(d.applicant_type),
        Field::text("first_name", "First name").with_value(d.first_name),
        Field::text("last_name", "Last name").with_value(d.last_name),
        Field::text("national_id", "National ID number").with_value(d.national_id),
        Field::date("date_of_birth", "Date of birth").optional().with_value(date_string(d.date_of_birth)),
        Field::text("phone", "Phone").with_value(d.phone),
        Field::text("email", "E-mail").optional().with_value(d.email.unwrap_or_default()),
        Field::text("address", "Residential address").with_value(d.address),
        Field::choice("county", "County", &COUNTIES).with_value(d.county),
        Field::file("id_document", "ID document (file path)"),
    ]
}

fn business_fields(initial: &RegistrationData) -> Vec<Field> {
    let d = initial.business_data.clone().unwrap_or_default();
    vec![
        Field::choice("business_type", "Business type", &BUSINESS_TYPES).with_value(d.business_type),
        Field::text("business_name", "Business name").with_value(d.business_name),
        Field::text("registration_number", "Business registration number").with_value(d.registration_number),
        Field::text("tin", "TIN (if already issued)").optional().with_value(d.tin.unwrap_or_default()),
        Field::text("address", "Business address").with_value(d.address),
        Field::choice("county", "County", &COUNTIES).with_value(d.county),
        Field::text("phone", "Phone").with_value(d.phone),
        Field::text("email", "E-mail").optional().with_value(d.email.unwrap_or_default()),
        Field::toggle("has_branches", "Operates branches?").with_value(yes(d.has_branches)),
        Field::file("certificate", "Business registration certificate (file path)"),
    ]
}

fn sole_proprietorship_fields(initial: &RegistrationData) -> Vec<Field> {
    let d = initial.sole_proprietorship_data.clone().unwrap_or_default();
    // Individual applicants already gave their name once
    let owner = initial
        .individual_data
        .as_ref()
        .map(IndividualData::full_name)
        .unwrap_or_default();
    let owner_name = if d.owner_name.is_empty() { owner } else { d.owner_name };

    vec![
        Field::text("owner_name", "Owner full name").with_value(owner_name),
        Field::text("owner_id_number", "Owner ID number").with_value(d.owner_id_number),
        Field::text("trading_name", "Trading name").with_value(d.trading_name),
        Field::date("commencement_date", "Commencement date")
            .optional()
            .with_value(date_string(d.commencement_date)),
    ]
}

fn branch_fields(initial: &RegistrationData) -> Vec<Field> {
    let existing = initial
        .branch_data
        .as_ref()
        .map(|b| b.branches.clone())
        .unwrap_or_default();

    let labels = [
        ["Branch 1 name", "Branch 1 address", "Branch 1 county"],
        ["Branch 2 name", "Branch 2 address", "Branch 2 county"],
        ["Branch 3 name", "Branch 3 address", "Branch 3 county"],
    ];

    let mut fields = Vec::new();
    for (index, (keys, labels)) in BRANCH_FIELDS.into_iter().zip(labels).enumerate() {
        let [name, address, county] = keys;
        let [name_label, address_label, county_label] = labels;
        let branch = existing.get(index).cloned().unwrap_or_default();

        let group = [
            Field::text(name, name_label).with_value(branch.name),
            Field::text(address, address_label).with_value(branch.address),
            Field::choice(county, county_label, &COUNTIES).with_value(branch.county),
        ];
        // The first branch is mandatory, the rest are optional
        if index == 0 {
            fields.extend(group);
        } else {
            fields.extend(group.into_iter().map(Field::optional));
        }
    }
    fields
}

fn property_fields(initial: &RegistrationData) -> Vec<Field> {
    let d = initial.property_data.clone().unwrap_or_default();
    let first = d.properties.first().cloned().unwrap_or_default();
    vec![
        Field::toggle("owns_residential_property", "Do you own residential property in Liberia?")
            .with_value(yes(d.owns_residential_property)),
        Field::text("property_address", "Property address").optional().with_value(first.address),
        Field::choice("property_county", "Property county", &COUNTIES).with_value(first.county),
        Field::choice("property_type", "Property type", &PROPERTY_TYPES).with_value(first.property_type),
        Field::toggle("owner_occupied", "Occupied by owner?").with_value(yes(first.owner_occupied)),
        Field::file("deed", "Title deed (file path)"),
        Field::toggle("declaration", "I declare this information is true").with_value(yes(d.declaration_accepted)),
    ]
}

fn review_fields(initial: &RegistrationData) -> Vec<Field> {
    let d = initial.payment_data.clone();
    vec![
        Field::choice("payment_method", "Payment method", &PAYMENT_METHODS)
            .with_value(d.as_ref().map(|p| p.payment_method.as_str()).unwrap_or_default()),
        Field::text("challan_number", "Challan number (offline payments)")
            .optional()
            .with_value(d.as_ref().and_then(|p| p.challan_number.clone()).unwrap_or_default()),
        Field::file("receipt", "Bank receipt (file path)"),
        Field::toggle("declaration", "I confirm the application is complete")
            .with_value(yes(d.map_or(false, |p| p.declaration_accepted))),
    ]
}

// ============================================================================
// TESTS
// ============================================================================
