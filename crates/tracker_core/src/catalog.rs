use std::collections::BTreeMap;

use crate::{JobKind, PhaseId};

/// Caller-supplied configuration: the ordered phase list per job kind, the
/// display label of each phase, and the filler messages shown while a phase
/// is running.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct PhaseCatalog {
    phases: BTreeMap<JobKind, Vec<PhaseId>>,
    labels: BTreeMap<PhaseId, String>,
    ticker: BTreeMap<PhaseId, Vec<String>>,
}

impl PhaseCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_phases<I, S>(mut self, kind: JobKind, phases: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<PhaseId>,
    {
        self.phases
            .insert(kind, phases.into_iter().map(Into::into).collect());
        self
    }

    pub fn with_label(mut self, phase: impl Into<PhaseId>, label: impl Into<String>) -> Self {
        self.labels.insert(phase.into(), label.into());
        self
    }

    pub fn with_ticker_messages<I, S>(mut self, phase: impl Into<PhaseId>, messages: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.ticker
            .insert(phase.into(), messages.into_iter().map(Into::into).collect());
        self
    }

    /// Ordered phases for `kind`; empty when the kind is not configured.
    pub fn phases(&self, kind: JobKind) -> &[PhaseId] {
        self.phases.get(&kind).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Display label for `phase`, falling back to the raw phase id.
    pub fn label<'a>(&'a self, phase: &'a str) -> &'a str {
        self.labels.get(phase).map(String::as_str).unwrap_or(phase)
    }

    /// Filler messages for `phase`; empty when none are configured.
    pub fn ticker_messages(&self, phase: &str) -> &[String] {
        self.ticker.get(phase).map(Vec::as_slice).unwrap_or(&[])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_entries_fall_back_gracefully() {
        let catalog = PhaseCatalog::new()
            .with_phases(JobKind::Resume, ["parsing"])
            .with_label("parsing", "Reading your resume");

        assert_eq!(catalog.phases(JobKind::Story), &[] as &[PhaseId]);
        assert_eq!(catalog.label("parsing"), "Reading your resume");
        assert_eq!(catalog.label("mystery"), "mystery");
        assert!(catalog.ticker_messages("parsing").is_empty());
    }
}
