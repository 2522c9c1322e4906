// 🧭 Steps & Views - What the wizard can show
// A Step is one stage of the linear registration flow.
// An InfoSection is a side-menu page outside the flow.
// A View is whatever is on screen right now (including views we don't recognise).

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

// ============================================================================
// STEP
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Step {
    Entry,
    Individual,
    Business,
    SoleProprietorship,
    Branch,
    Property,
    Review,
    Complete,
}

impl Step {
    /// Every step, in canonical display order
    pub const ALL: [Step; 8] = [
        Step::Entry,
        Step::Individual,
        Step::Business,
        Step::SoleProprietorship,
        Step::Branch,
        Step::Property,
        Step::Review,
        Step::Complete,
    ];

    /// Stable identifier (also the persisted form)
    pub fn as_str(&self) -> &'static str {
        match self {
            Step::Entry => "entry",
            Step::Individual => "individual",
            Step::Business => "business",
            Step::SoleProprietorship => "sole-proprietorship",
            Step::Branch => "branch",
            Step::Property => "property",
            Step::Review => "review",
            Step::Complete => "complete",
        }
    }

    /// Human readable title for steppers and headers
    pub fn title(&self) -> &'static str {
        match self {
            Step::Entry => "Start Registration",
            Step::Individual => "Individual Details",
            Step::Business => "Business Details",
            Step::SoleProprietorship => "Sole Proprietorship",
            Step::Branch => "Branches",
            Step::Property => "Residential Property Declaration",
            Step::Review => "Review & Payment",
            Step::Complete => "Registration Complete",
        }
    }

    /// Steps that are backed by a form (everything except the completion screen)
    pub fn has_form(&self) -> bool {
        !matches!(self, Step::Complete)
    }
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Step {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Step::ALL
            .iter()
            .copied()
            .find(|step| step.as_str() == s)
            .ok_or_else(|| format!("unknown step: {}", s))
    }
}

// ============================================================================
// INFO SECTIONS (side menu, not part of the wizard)
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum InfoSection {
    Applications,
    Fees,
    Certificates,
    Help,
}

impl InfoSection {
    pub const ALL: [InfoSection; 4] = [
        InfoSection::Applications,
        InfoSection::Fees,
        InfoSection::Certificates,
        InfoSection::Help,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            InfoSection::Applications => "applications",
            InfoSection::Fees => "fees",
            InfoSection::Certificates => "certificates",
            InfoSection::Help => "help",
        }
    }

    pub fn title(&self) -> &'static str {
        match self {
            InfoSection::Applications => "My Applications",
            InfoSection::Fees => "Fees & Charges",
            InfoSection::Certificates => "Certificates",
            InfoSection::Help => "Help",
        }
    }
}

impl FromStr for InfoSection {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        InfoSection::ALL
            .iter()
            .copied()
            .find(|section| section.as_str() == s)
            .ok_or_else(|| format!("unknown section: {}", s))
    }
}

// ============================================================================
// VIEW
// ============================================================================

/// What is currently rendered.
///
/// Persisted as a plain string so a draft written by a newer build (or edited
/// by hand) still loads: anything unrecognised becomes `View::Unknown` and is
/// rendered as a placeholder instead of failing the whole restore.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum View {
    Step(Step),
    Section(InfoSection),
    Unknown(String),
}

impl View {
    pub fn as_step(&self) -> Option<Step> {
        match self {
            View::Step(step) => Some(*step),
            _ => None,
        }
    }

    pub fn title(&self) -> String {
        match self {
            View::Step(step) => step.title().to_string(),
            View::Section(section) => section.title().to_string(),
            View::Unknown(name) => format!("Unknown step ({})", name),
        }
    }
}

impl From<String> for View {
    fn from(value: String) -> Self {
        if let Ok(step) = value.parse::<Step>() {
            View::Step(step)
        } else if let Ok(section) = value.parse::<InfoSection>() {
            View::Section(section)
        } else {
            View::Unknown(value)
        }
    }
}

impl From<View> for String {
    fn from(view: View) -> Self {
        match view {
            View::Step(step) => step.as_str().to_string(),
            View::Section(section) => section.as_str().to_string(),
            View::Unknown(name) => name,
        }
    }
}

impl From<Step> for View {
    fn from(step: Step) -> Self {
        View::Step(step)
    }
}

// ============================================================================
// TESTS
// ============================================================================
