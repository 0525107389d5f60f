use crate::{JobSnapshot, JobStatus, PhaseCatalog, PhaseId, TrackedJob};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PhaseState {
    Done,
    Current,
    Pending,
}

/// One line of the phase checklist.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PhaseRow {
    pub phase: PhaseId,
    pub label: String,
    pub state: PhaseState,
}

/// Returns the phases of `phases` that are already finished.
///
/// A completed job has finished every phase. Otherwise every phase strictly
/// before the current one is finished; an unknown or missing phase finishes
/// nothing.
pub fn completed_phases<'a>(
    phases: &'a [PhaseId],
    status: JobStatus,
    phase: Option<&str>,
) -> &'a [PhaseId] {
    if status == JobStatus::Completed {
        return phases;
    }
    let Some(current) = phase else {
        return &[];
    };
    match phases.iter().position(|p| p == current) {
        Some(index) => &phases[..index],
        None => &[],
    }
}

/// Builds the full checklist for `job` from the latest snapshot.
pub fn phase_rows(
    catalog: &PhaseCatalog,
    job: &TrackedJob,
    snapshot: Option<&JobSnapshot>,
) -> Vec<PhaseRow> {
    let phases = catalog.phases(job.kind);
    let (status, phase) = match snapshot {
        Some(snapshot) => (snapshot.status, snapshot.phase.as_deref()),
        None => (JobStatus::Pending, None),
    };
    let done = completed_phases(phases, status, phase).len();
    let current = match status {
        JobStatus::Processing => phase,
        _ => None,
    };

    phases
        .iter()
        .enumerate()
        .map(|(index, id)| {
            let state = if index < done {
                PhaseState::Done
            } else if current == Some(id.as_str()) {
                PhaseState::Current
            } else {
                PhaseState::Pending
            };
            PhaseRow {
                phase: id.clone(),
                label: catalog.label(id).to_string(),
                state,
            }
        })
        .collect()
}
