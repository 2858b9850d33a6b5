//! Resource-usage bookkeeping for a verification run (spec §4.6/§6, promoted to its own
//! module per SPEC_FULL.md §4.8).
//!
//! Keyed by [`CriteriaTuple`] rather than the source's multi-dimensional rectangular
//! array indexed by criterion ordinal (spec §9 REDESIGN FLAGS): a `HashMap` has no
//! unreachable cells for criteria combinations that were never run, and adding a new
//! criterion variant never needs the array's other dimensions resized.

use std::collections::HashMap;

use crate::criteria::CriteriaTuple;

/// Resource counters for a single `(criteria, permutation)` run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TelemetryEntry {
    pub inner_iteration_count: u64,
    pub peak_u_structure_states: usize,
    pub peak_automaton_states: usize,
}

impl TelemetryEntry {
    /// Folds `other` into `self`: iteration counts accumulate, peaks take the max of
    /// either side. Used both within a single `verify` call (one entry per run) and
    /// across a permutation sweep's repeated runs under the same criteria tuple.
    pub fn merge_max(&mut self, other: &Self) {
        self.inner_iteration_count += other.inner_iteration_count;
        self.peak_u_structure_states = self.peak_u_structure_states.max(other.peak_u_structure_states);
        self.peak_automaton_states = self.peak_automaton_states.max(other.peak_automaton_states);
    }

    pub fn note_u_structure_states(&mut self, states: usize) {
        self.peak_u_structure_states = self.peak_u_structure_states.max(states);
    }

    pub fn note_automaton_states(&mut self, states: usize) {
        self.peak_automaton_states = self.peak_automaton_states.max(states);
    }
}

/// Every `(criteria tuple, permutation index)` run's [`TelemetryEntry`], accumulated
/// across a verification session.
#[derive(Debug, Clone, Default)]
pub struct Telemetry {
    entries: HashMap<(CriteriaTuple, usize), TelemetryEntry>,
}

impl Telemetry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Merges `entry` into the slot for `(criteria, permutation)`, creating it on first
    /// use. Called once per completed `verify` invocation.
    pub fn record(&mut self, criteria: CriteriaTuple, permutation: usize, entry: TelemetryEntry) {
        self.entries
            .entry((criteria, permutation))
            .or_default()
            .merge_max(&entry);
    }

    pub fn get(&self, criteria: CriteriaTuple, permutation: usize) -> Option<&TelemetryEntry> {
        self.entries.get(&(criteria, permutation))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// All entries recorded under `criteria`, across every permutation index run so
    /// far — what the CLI's summary table groups by.
    pub fn entries_for(&self, criteria: CriteriaTuple) -> Vec<(usize, TelemetryEntry)> {
        let mut out: Vec<(usize, TelemetryEntry)> = self
            .entries
            .iter()
            .filter(|((c, _), _)| *c == criteria)
            .map(|((_, perm), entry)| (*perm, *entry))
            .collect();
        out.sort_by_key(|(perm, _)| *perm);
        out
    }
}
