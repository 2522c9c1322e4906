// 🧙 Wizard Controller - One state container, one dispatch
//
//   event ──▶ reduce(state, event, ctx) ──▶ Transition { state, outcome, effects }
//                                              │
//                      commit (single assignment)
//                                              │
//                      effects (store append) ─┴─▶ observers (draft mirror)
//
// `reduce` is pure. The controller commits the whole new state at once, so
// no observer can see the new step paired with the old data.

use crate::registration::{RegistrationData, StepPayload, StepSubmission};
use crate::routing;
use crate::step::{InfoSection, Step, View};
use crate::error::StoreError;
use crate::store::{ApplicationStore, LocalStorage, LocalStorageStore, DRAFT_KEY};
use crate::submission::{finalize_submission, next_sequence, Application};
use chrono::{DateTime, Datelike, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::path::Path;
use thiserror::Error;
use tracing::{debug, error, info, warn};

// ============================================================================
// STATE
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WizardState {
    /// Wizard step the applicant is on (kept while a side-menu section is open)
    pub current_step: Step,

    /// What is rendered right now
    pub view: View,

    pub data: RegistrationData,

    /// Steps ever completed; only these can be revisited from the stepper
    #[serde(default)]
    pub completed_steps: BTreeSet<Step>,
}

impl Default for WizardState {
    fn default() -> Self {
        WizardState {
            current_step: Step::Entry,
            view: View::Step(Step::Entry),
            data: RegistrationData::default(),
            completed_steps: BTreeSet::new(),
        }
    }
}

impl WizardState {
    pub fn path(&self) -> Vec<Step> {
        routing::path(&self.data)
    }

    pub fn step_number(&self) -> Option<usize> {
        routing::step_number(self.current_step, &self.data)
    }

    pub fn total_steps(&self) -> usize {
        routing::total_steps(&self.data)
    }

    pub fn progress_percent(&self) -> u8 {
        routing::progress_percent(self.current_step, &self.data)
    }

    /// Stepper rule: completed steps and the current one are clickable
    pub fn can_visit(&self, step: Step) -> bool {
        step == self.current_step || self.completed_steps.contains(&step)
    }

    pub fn is_complete(&self) -> bool {
        self.current_step == Step::Complete
    }
}

// ============================================================================
// EVENTS & OUTCOMES
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload", rename_all = "kebab-case")]
pub enum WizardEvent {
    /// A step form finished (the `onComplete` callback)
    Complete(StepSubmission),
    /// The `onBack` callback
    Back,
    /// Stepper click
    GoTo(Step),
    /// Side-menu click
    OpenSection(InfoSection),
    /// Leave a side-menu section and return to the current step
    ResumeWizard,
    /// Throw away the current registration and start again
    Reset,
}

impl From<StepPayload> for WizardEvent {
    fn from(payload: StepPayload) -> Self {
        WizardEvent::Complete(StepSubmission::new(payload))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Error)]
#[serde(tag = "reason", rename_all = "kebab-case")]
pub enum RejectReason {
    #[error("expected data for step '{expected}', got '{got}'")]
    WrongStep { expected: Step, got: Step },

    #[error("the entry point is fixed once chosen; start a new application instead")]
    EntryPointLocked,

    #[error("step '{step}' has not been completed yet")]
    StepNotCompleted { step: Step },

    #[error("this application has already been submitted")]
    AlreadySubmitted,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "outcome", rename_all = "kebab-case")]
pub enum Outcome {
    Moved { from: View, to: View },
    Submitted { reference: String },
    Unchanged,
    Rejected(RejectReason),
}

/// Side effects requested by a transition, run after the commit
#[derive(Debug, Clone, PartialEq)]
pub enum Effect {
    StoreApplication(Application),
}

/// Inputs the review step needs from outside the state
#[derive(Debug, Clone, Copy)]
pub struct SubmissionContext {
    pub now: DateTime<Utc>,
    pub sequence: u32,
}

#[derive(Debug, Clone)]
pub struct Transition {
    pub state: WizardState,
    pub outcome: Outcome,
    pub effects: Vec<Effect>,
}

impl Transition {
    fn rejected(state: &WizardState, reason: RejectReason) -> Self {
        Transition {
            state: state.clone(),
            outcome: Outcome::Rejected(reason),
            effects: Vec::new(),
        }
    }

    fn moved(from: &WizardState, to: WizardState) -> Self {
        let outcome = if *from == to {
            Outcome::Unchanged
        } else {
            Outcome::Moved {
                from: from.view.clone(),
                to: to.view.clone(),
            }
        };
        Transition {
            state: to,
            outcome,
            effects: Vec::new(),
        }
    }
}

// ============================================================================
// REDUCER
// ============================================================================

/// Compute the next state. Pure: same inputs, same transition.
pub fn reduce(state: &WizardState, event: WizardEvent, ctx: &SubmissionContext) -> Transition {
    match event {
        WizardEvent::Complete(submission) => complete_step(state, submission, ctx),

        WizardEvent::Back => {
            let Some(step) = state.view.as_step() else {
                // From a section or an unknown view, "back" returns to the wizard
                return Transition::moved(state, show_step(state, state.current_step));
            };
            if state.data.is_submitted() {
                return Transition::rejected(state, RejectReason::AlreadySubmitted);
            }
            let previous = routing::previous(step, &state.data);
            Transition::moved(state, show_step(state, previous))
        }

        WizardEvent::GoTo(step) => {
            if state.data.is_submitted() && step != state.current_step {
                return Transition::rejected(state, RejectReason::AlreadySubmitted);
            }
            if !state.can_visit(step) {
                return Transition::rejected(state, RejectReason::StepNotCompleted { step });
            }
            Transition::moved(state, show_step(state, step))
        }

        WizardEvent::OpenSection(section) => {
            let mut next = state.clone();
            next.view = View::Section(section);
            Transition::moved(state, next)
        }

        WizardEvent::ResumeWizard => Transition::moved(state, show_step(state, state.current_step)),

        WizardEvent::Reset => Transition::moved(state, WizardState::default()),
    }
}

fn show_step(state: &WizardState, step: Step) -> WizardState {
    let mut next = state.clone();
    next.current_step = step;
    next.view = View::Step(step);
    next
}

fn complete_step(
    state: &WizardState,
    submission: StepSubmission,
    ctx: &SubmissionContext,
) -> Transition {
    let step = submission.step();

    if state.data.is_submitted() {
        return Transition::rejected(state, RejectReason::AlreadySubmitted);
    }
    if state.view != View::Step(step) {
        return Transition::rejected(
            state,
            RejectReason::WrongStep {
                expected: state.current_step,
                got: step,
            },
        );
    }
    if let (StepPayload::Entry(selection), Some(chosen)) = (&submission.payload, state.data.entry_point) {
        if selection.entry_point != chosen {
            return Transition::rejected(state, RejectReason::EntryPointLocked);
        }
    }

    let mut next = state.clone();
    next.data.merge(submission);
    next.completed_steps.insert(step);

    let mut effects = Vec::new();
    let mut submitted = None;
    if step == Step::Review {
        if let Some(application) = finalize_submission(&mut next.data, ctx.now, ctx.sequence) {
            submitted = Some(application.application_reference.clone());
            effects.push(Effect::StoreApplication(application));
        }
    }

    let to = routing::next(step, &next.data);
    next.current_step = to;
    next.view = View::Step(to);

    let mut transition = Transition::moved(state, next);
    transition.effects = effects;
    if let Some(reference) = submitted {
        transition.outcome = Outcome::Submitted { reference };
    }
    transition
}

// ============================================================================
// CONTROLLER
// ============================================================================

/// Notified after every committed transition
pub trait StateObserver {
    fn on_commit(&mut self, state: &WizardState);
}

pub struct RegistrationWizard<S: ApplicationStore> {
    state: WizardState,
    store: S,
    observers: Vec<Box<dyn StateObserver + Send>>,
}

impl<S: ApplicationStore> RegistrationWizard<S> {
    pub fn new(store: S) -> Self {
        Self::with_state(store, WizardState::default())
    }

    /// Resume from a previously saved state (e.g. a restored draft)
    pub fn with_state(store: S, state: WizardState) -> Self {
        RegistrationWizard {
            state,
            store,
            observers: Vec::new(),
        }
    }

    pub fn subscribe(&mut self, observer: Box<dyn StateObserver + Send>) {
        self.observers.push(observer);
    }

    pub fn state(&self) -> &WizardState {
        &self.state
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn store_mut(&mut self) -> &mut S {
        &mut self.store
    }

    /// The single entry point for every state change
    pub fn dispatch(&mut self, event: WizardEvent) -> Outcome {
        let ctx = self.submission_context(&event);
        debug!(event = ?event_name(&event), view = ?self.state.view, "dispatch");

        let Transition {
            state,
            outcome,
            effects,
        } = reduce(&self.state, event, &ctx);

        match &outcome {
            Outcome::Rejected(reason) => {
                warn!(reason = %reason, step = %self.state.current_step, "event rejected");
                return outcome;
            }
            Outcome::Unchanged => return outcome,
            Outcome::Moved { from, to } => {
                info!(from = %String::from(from.clone()), to = %String::from(to.clone()), "wizard moved");
            }
            Outcome::Submitted { reference } => {
                info!(reference = %reference, "application submitted");
            }
        }

        self.state = state;

        for effect in effects {
            self.apply(effect);
        }
        for observer in self.observers.iter_mut() {
            observer.on_commit(&self.state);
        }

        outcome
    }

    fn submission_context(&self, event: &WizardEvent) -> SubmissionContext {
        let now = Utc::now();
        let sequence = match event {
            WizardEvent::Complete(submission) if submission.step() == Step::Review => {
                next_sequence(&self.store.list(), now.year())
            }
            _ => 0,
        };
        SubmissionContext { now, sequence }
    }

    fn apply(&mut self, effect: Effect) {
        match effect {
            Effect::StoreApplication(application) => {
                let reference = application.application_reference.clone();
                if let Err(e) = self.store.append(application) {
                    error!(reference = %reference, error = %e, "failed to store submitted application");
                }
            }
        }
    }
}

fn event_name(event: &WizardEvent) -> &'static str {
    match event {
        WizardEvent::Complete(_) => "complete",
        WizardEvent::Back => "back",
        WizardEvent::GoTo(_) => "go-to",
        WizardEvent::OpenSection(_) => "open-section",
        WizardEvent::ResumeWizard => "resume-wizard",
        WizardEvent::Reset => "reset",
    }
}

// ============================================================================
// DRAFT MIRROR
// ============================================================================

/// Mirrors every committed state into local storage
pub struct DraftWriter {
    storage: LocalStorage,
}

impl DraftWriter {
    pub fn new(storage: LocalStorage) -> Self {
        DraftWriter { storage }
    }
}

impl StateObserver for DraftWriter {
    fn on_commit(&mut self, state: &WizardState) {
        if let Err(e) = self.storage.set_json(DRAFT_KEY, state) {
            warn!(error = %e, "failed to save registration draft");
        }
    }
}

/// Restore a saved draft; missing or unreadable drafts start fresh
pub fn load_draft(storage: &LocalStorage) -> Option<WizardState> {
    match storage.get_json::<WizardState>(DRAFT_KEY) {
        Ok(draft) => draft,
        Err(e) => {
            warn!(error = %e, "failed to read registration draft");
            None
        }
    }
}

/// Open a wizard session on a database file: restores the draft (if any)
/// and keeps mirroring it on every commit.
pub fn open_session<P: AsRef<Path>>(db: P) -> Result<RegistrationWizard<LocalStorageStore>, StoreError> {
    let db = db.as_ref();
    let store = LocalStorageStore::open(db)?;
    let drafts = LocalStorage::open(db)?;

    let state = load_draft(&drafts).unwrap_or_default();
    info!(db = %db.display(), step = %state.current_step, "session opened");

    let mut wizard = RegistrationWizard::with_state(store, state);
    wizard.subscribe(Box::new(DraftWriter::new(drafts)));
    Ok(wizard)
}

// ============================================================================
// TESTS
// ============================================================================
