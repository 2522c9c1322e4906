// 🔀 Step Routing - Which step comes next, which came before
//
// Canonical transition table (branch-step variant):
//
//   entry ──individual──▶ individual ──applicant=individual──▶ property
//     │                       │
//     └──business/unset──▶ business ◀──otherwise──┘
//                             │
//          ┌──sole prop───────┴──────otherwise──┐
//          ▼                                    │
//   sole-proprietorship ──branches?──▶ branch ◀─┘ (branches?)
//          │                            │
//          └─────────no branches────────┴──▶ property ──▶ review ──▶ complete
//
// "branches?" = has_branches || branch_data present.
// Step numbering and progress are derived from `next`, never from a second table.

use crate::registration::{ApplicantKind, BusinessKind, EntryPoint, RegistrationData};
use crate::step::Step;

// ============================================================================
// FORWARD
// ============================================================================

/// Step that follows `current` given the accumulated data.
///
/// Never fails: unset or unrecognised discriminators take the
/// "other business" branch.
pub fn next(current: Step, data: &RegistrationData) -> Step {
    match current {
        Step::Entry => match data.entry_point {
            Some(EntryPoint::Individual) => Step::Individual,
            Some(EntryPoint::Business) | None => Step::Business,
        },
        Step::Individual => match data.applicant_kind() {
            ApplicantKind::Individual => Step::Property,
            ApplicantKind::Other => Step::Business,
        },
        Step::Business => match data.business_kind() {
            BusinessKind::SoleProprietorship => Step::SoleProprietorship,
            BusinessKind::Other => after_business_details(data),
        },
        Step::SoleProprietorship => after_business_details(data),
        Step::Branch => Step::Property,
        Step::Property => Step::Review,
        Step::Review | Step::Complete => Step::Complete,
    }
}

fn after_business_details(data: &RegistrationData) -> Step {
    if data.branches_inserted() {
        Step::Branch
    } else {
        Step::Property
    }
}

// ============================================================================
// BACKWARD
// ============================================================================

/// Step that "back" returns to from `current`.
///
/// Recomputed from the accumulated data rather than a navigation stack,
/// because stepper clicks can move `current` arbitrarily. Missing upstream
/// data falls back to `Step::Entry`.
pub fn previous(current: Step, data: &RegistrationData) -> Step {
    match current {
        Step::Entry => Step::Entry,
        Step::Individual => Step::Entry,
        Step::Business => {
            if came_through_individual(data) {
                Step::Individual
            } else {
                Step::Entry
            }
        }
        Step::SoleProprietorship => Step::Business,
        Step::Branch => match data.business_kind() {
            BusinessKind::SoleProprietorship => Step::SoleProprietorship,
            BusinessKind::Other => Step::Business,
        },
        Step::Property => before_property(data),
        Step::Review => Step::Property,
        Step::Complete => Step::Review,
    }
}

/// Innermost present payload wins:
/// branch > sole proprietorship > business > individual > entry
///
/// Payloads left behind by an earlier answer (a business form filled in
/// before the applicant type changed) are skipped when their step is no
/// longer on the path. With nothing on the path, the plain order applies.
fn before_property(data: &RegistrationData) -> Step {
    let present: Vec<Step> = [
        (Step::Branch, data.branch_data.is_some()),
        (
            Step::SoleProprietorship,
            data.business_kind() == BusinessKind::SoleProprietorship,
        ),
        (
            Step::Business,
            data.business_data.is_some() || data.entry_point == Some(EntryPoint::Business),
        ),
        (Step::Individual, data.individual_data.is_some()),
    ]
    .into_iter()
    .filter_map(|(step, present)| present.then_some(step))
    .collect();

    let on_path = path(data);
    present
        .iter()
        .copied()
        .find(|step| on_path.contains(step))
        .or_else(|| present.first().copied())
        .unwrap_or(Step::Entry)
}

fn came_through_individual(data: &RegistrationData) -> bool {
    data.entry_point == Some(EntryPoint::Individual) || data.individual_data.is_some()
}

// ============================================================================
// PATH, STEP NUMBERS, PROGRESS
// ============================================================================

/// Full path implied by `data`, from entry through complete.
pub fn path(data: &RegistrationData) -> Vec<Step> {
    let mut steps = vec![Step::Entry];
    let mut current = Step::Entry;

    // The graph is acyclic; the bound only guards against a future edit
    // that introduces a loop.
    while current != Step::Complete && steps.len() <= Step::ALL.len() {
        current = next(current, data);
        steps.push(current);
    }

    steps
}

/// Number of numbered steps (the completion screen is not counted)
pub fn total_steps(data: &RegistrationData) -> usize {
    path(data)
        .iter()
        .filter(|step| **step != Step::Complete)
        .count()
}

/// 1-based position of `step` on the path implied by `data`.
///
/// `Complete` reports `total_steps`. Steps off the path return None.
pub fn step_number(step: Step, data: &RegistrationData) -> Option<usize> {
    if step == Step::Complete {
        return Some(total_steps(data));
    }
    path(data).iter().position(|s| *s == step).map(|index| index + 1)
}

/// Progress through the wizard as a whole percentage in [0, 100]
pub fn progress_percent(step: Step, data: &RegistrationData) -> u8 {
    let total = total_steps(data);
    if total == 0 {
        return 0;
    }
    let number = step_number(step, data).unwrap_or(0);
    ((100 * number / total).min(100)) as u8
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registration::{BranchData, BusinessData, IndividualData};

    fn data(
        entry_point: Option<EntryPoint>,
        applicant_type: Option<&str>,
        business_type: Option<&str>,
        has_branches: bool,
    ) -> RegistrationData {
        RegistrationData {
            entry_point,
            applicant_type: applicant_type.map(str::to_string),
            business_type: business_type.map(str::to_string),
            has_branches,
            ..RegistrationData::default()
        }
    }

    fn all_combinations() -> Vec<RegistrationData> {
        let entries = [None, Some(EntryPoint::Individual), Some(EntryPoint::Business)];
        let applicants = [None, Some("individual"), Some("sole-proprietorship"), Some("property-only"), Some("???")];
        let businesses = [None, Some("sole proprietorship"), Some("partnership"), Some("limited liability company")];

        let mut combos = Vec::new();
        for entry in entries {
            for applicant in applicants {
                for business in businesses {
                    for branches in [false, true] {
                        combos.push(data(entry, applicant, business, branches));
                    }
                }
            }
        }
        combos
    }

    #[test]
    fn test_individual_path_example() {
        let d = data(Some(EntryPoint::Individual), Some("individual"), None, false);

        assert_eq!(
            path(&d),
            vec![Step::Entry, Step::Individual, Step::Property, Step::Review, Step::Complete]
        );
        assert_eq!(total_steps(&d), 4);
        assert_eq!(progress_percent(Step::Individual, &d), 50);
    }

    #[test]
    fn test_sole_proprietorship_with_branches_example() {
        let mut d = data(Some(EntryPoint::Business), None, Some("sole proprietorship"), true);

        assert_eq!(
            path(&d),
            vec![
                Step::Entry,
                Step::Business,
                Step::SoleProprietorship,
                Step::Branch,
                Step::Property,
                Step::Review,
                Step::Complete,
            ]
        );

        d.branch_data = Some(BranchData::default());
        assert_eq!(previous(Step::Property, &d), Step::Branch);
    }

    #[test]
    fn test_other_business_without_branches() {
        let d = data(Some(EntryPoint::Business), None, Some("partnership"), false);
        assert_eq!(
            path(&d),
            vec![Step::Entry, Step::Business, Step::Property, Step::Review, Step::Complete]
        );
    }

    #[test]
    fn test_non_individual_applicant_goes_to_business() {
        let d = data(Some(EntryPoint::Individual), Some("sole-proprietorship"), Some("sole proprietorship"), false);
        assert_eq!(
            path(&d),
            vec![
                Step::Entry,
                Step::Individual,
                Step::Business,
                Step::SoleProprietorship,
                Step::Property,
                Step::Review,
                Step::Complete,
            ]
        );
    }

    #[test]
    fn test_unset_discriminators_take_other_business_branch() {
        let d = RegistrationData::default();
        assert_eq!(next(Step::Entry, &d), Step::Business);
        assert_eq!(next(Step::Business, &d), Step::Property);
        assert_eq!(next(Step::Individual, &d), Step::Business);
    }

    #[test]
    fn test_branch_data_alone_inserts_branch_step() {
        let mut d = data(Some(EntryPoint::Business), None, Some("partnership"), false);
        d.branch_data = Some(BranchData::default());
        assert_eq!(next(Step::Business, &d), Step::Branch);
    }

    #[test]
    fn test_every_path_has_property_once_right_before_review() {
        for d in all_combinations() {
            let p = path(&d);

            assert_eq!(p.first(), Some(&Step::Entry), "{:?}", d);
            assert_eq!(p.last(), Some(&Step::Complete), "{:?}", d);
            assert_eq!(p.iter().filter(|s| **s == Step::Property).count(), 1, "{:?}", p);

            let review_at = p.iter().position(|s| *s == Step::Review).unwrap();
            assert_eq!(p[review_at - 1], Step::Property, "{:?}", p);
            assert_eq!(p[review_at + 1], Step::Complete, "{:?}", p);

            // No step visited twice
            let mut seen = p.clone();
            seen.sort();
            seen.dedup();
            assert_eq!(seen.len(), p.len(), "{:?}", p);
        }
    }

    #[test]
    fn test_step_numbers_within_total() {
        for d in all_combinations() {
            let total = total_steps(&d);
            for step in path(&d) {
                let number = step_number(step, &d).unwrap();
                assert!(number >= 1 && number <= total, "{:?} -> {}/{}", step, number, total);
                assert!(progress_percent(step, &d) <= 100);
            }
        }
    }

    #[test]
    fn test_step_off_path_has_no_number() {
        let d = data(Some(EntryPoint::Individual), Some("individual"), None, false);
        assert_eq!(step_number(Step::Business, &d), None);
        assert_eq!(progress_percent(Step::Business, &d), 0);
        assert_eq!(progress_percent(Step::Complete, &d), 100);
    }

    #[test]
    fn test_previous_property_precedence() {
        // Nothing at all
        let mut d = RegistrationData::default();
        assert_eq!(previous(Step::Property, &d), Step::Entry);

        d.individual_data = Some(IndividualData::default());
        assert_eq!(previous(Step::Property, &d), Step::Individual);

        d.entry_point = Some(EntryPoint::Business);
        assert_eq!(previous(Step::Property, &d), Step::Business);

        d.entry_point = None;
        d.business_data = Some(BusinessData::default());
        assert_eq!(previous(Step::Property, &d), Step::Business);

        d.business_type = Some("sole proprietorship".to_string());
        assert_eq!(previous(Step::Property, &d), Step::SoleProprietorship);

        d.branch_data = Some(BranchData::default());
        assert_eq!(previous(Step::Property, &d), Step::Branch);
    }

    #[test]
    fn test_previous_property_skips_stale_payloads() {
        // Applicant first said sole proprietorship, filled in the business
        // form, then went back and switched to individual
        let d = RegistrationData {
            entry_point: Some(EntryPoint::Individual),
            applicant_type: Some("individual".to_string()),
            business_type: Some("sole proprietorship".to_string()),
            individual_data: Some(IndividualData::default()),
            business_data: Some(BusinessData::default()),
            ..RegistrationData::default()
        };

        assert_eq!(path(&d), vec![Step::Entry, Step::Individual, Step::Property, Step::Review, Step::Complete]);
        let back = previous(Step::Property, &d);
        assert_eq!(back, Step::Individual);
        assert_eq!(step_number(back, &d), Some(2));
    }

    #[test]
    fn test_previous_inverts_next_on_completed_paths() {
        for mut d in all_combinations() {
            // Discriminators only exist if the step that writes them was visited
            let visited = path(&d);
            if !visited.contains(&Step::Individual) {
                d.applicant_type = None;
            }
            if !visited.contains(&Step::Business) {
                d.business_type = None;
                d.has_branches = false;
            }

            // Populate the payloads the path would have produced
            for step in path(&d) {
                match step {
                    Step::Individual => d.individual_data = Some(IndividualData::default()),
                    Step::Business => d.business_data = Some(BusinessData::default()),
                    Step::Branch => d.branch_data = Some(BranchData::default()),
                    _ => {}
                }
            }

            let p = path(&d);
            for pair in p.windows(2) {
                assert_eq!(previous(pair[1], &d), pair[0], "path {:?}", p);
            }
        }
    }

    #[test]
    fn test_previous_from_review_and_entry() {
        let d = RegistrationData::default();
        assert_eq!(previous(Step::Review, &d), Step::Property);
        assert_eq!(previous(Step::Entry, &d), Step::Entry);
        assert_eq!(previous(Step::Complete, &d), Step::Review);
    }
}
