use shared_config::AppConfig;

use crate::models::ScheduleEntry;

/// Decides which existing entries take part in the overlap check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OverlapPolicy {
    /// Entries flagged `is_available = false` still block when true.
    pub include_unavailable: bool,
}

impl Default for OverlapPolicy {
    fn default() -> Self {
        Self { include_unavailable: true }
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct OverlapChecker {
    policy: OverlapPolicy,
}

impl OverlapChecker {
    pub fn new(policy: OverlapPolicy) -> Self {
        Self { policy }
    }

    pub fn from_config(config: &AppConfig) -> Self {
        Self::new(OverlapPolicy {
            include_unavailable: config.overlap_includes_unavailable,
        })
    }

    /// First entry in `existing` the candidate would clash with.
    ///
    /// `existing` must already be scoped to the candidate's doctor. An entry
    /// sharing the candidate's `id` is the candidate itself and is skipped.
    pub fn find_conflict<'a>(
        &self,
        candidate: &ScheduleEntry,
        existing: &'a [ScheduleEntry],
    ) -> Option<&'a ScheduleEntry> {
        if !self.participates(candidate) {
            return None;
        }

        existing
            .iter()
            .filter(|other| !is_same_entry(candidate, other))
            .filter(|other| self.participates(other))
            .filter(|other| candidate.window.overlaps(&other.window))
            .find(|other| candidate.kind.shares_day_with(&other.kind))
    }

    pub fn has_conflict(&self, candidate: &ScheduleEntry, existing: &[ScheduleEntry]) -> bool {
        self.find_conflict(candidate, existing).is_some()
    }

    fn participates(&self, entry: &ScheduleEntry) -> bool {
        self.policy.include_unavailable || entry.metadata.is_available
    }
}

fn is_same_entry(candidate: &ScheduleEntry, other: &ScheduleEntry) -> bool {
    candidate.id.is_some() && candidate.id == other.id
}

/// Overlap check under the default policy, where unavailable entries still block.
pub fn check_overlap(candidate: &ScheduleEntry, existing: &[ScheduleEntry]) -> bool {
    OverlapChecker::default().has_conflict(candidate, existing)
}
