//! Run configuration: which criteria to exercise and how verbosely to log
//! (SPEC_FULL.md §4 ambient-stack table, "Config").
//!
//! spec.md never specifies a persisted configuration format — the source's only
//! configuration surface is the set of CLI flags its batch driver hard-codes (spec §6).
//! This crate keeps that shape but gives it a name: [`VerifierConfig`] is the single
//! struct both [`judge`](../bin/judge.rs) and any future embedding caller build before
//! calling [`crate::verifier::verify`] or [`crate::verifier::run_permutation_sweep`].
//! There is no on-disk representation to (de)serialize, so this carries no `serde`
//! dependency — it exists purely to keep "which criteria, sweep or not, how verbose" in
//! one constructible place instead of scattered through `main`.

use crate::criteria::CriteriaTuple;

/// How verbose `tracing` output should be, independent of `RUST_LOG`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub enum LogLevel {
    Warn,
    Info,
    Debug,
    Trace,
    #[default]
    Quiet,
}

impl LogLevel {
    /// The `-v`/`-vv`/`-vvv` CLI convention: zero flags is `Quiet` (nothing above
    /// `tracing`'s default), more flags step through `Warn` → `Trace`.
    pub fn from_verbosity(count: u8) -> Self {
        match count {
            0 => Self::Warn,
            1 => Self::Info,
            2 => Self::Debug,
            _ => Self::Trace,
        }
    }

    pub fn as_filter_str(&self) -> &'static str {
        match self {
            Self::Warn => "warn",
            Self::Info => "info",
            Self::Debug => "debug",
            Self::Trace => "trace",
            Self::Quiet => "error",
        }
    }
}

/// Which criteria a run exercises, and how. Constructed from CLI flags in
/// `src/bin/judge.rs`, or directly by a caller embedding this crate.
#[derive(Debug, Clone)]
pub struct VerifierConfig {
    /// Number of controllers observing/acting on the system (spec §3 "k controllers").
    pub num_controllers: usize,
    /// The criteria tuples to run. A non-sweep invocation has exactly one element
    /// (spec §6 "one batch driver... runs the full Cartesian sweep" vs. a single
    /// default combination — both are expressed as a `Vec` here rather than a bool plus
    /// a branch, so callers that want a custom subset of the sweep can just build one).
    pub criteria: Vec<CriteriaTuple>,
    pub log_level: LogLevel,
}

impl VerifierConfig {
    /// The single default-criteria, non-sweep configuration the CLI runs without
    /// `--sweep` (spec §6's "default combination").
    pub fn default_single(num_controllers: usize) -> Self {
        Self {
            num_controllers,
            criteria: vec![CriteriaTuple::default_tuple()],
            log_level: LogLevel::default(),
        }
    }

    /// The full Cartesian sweep of every criteria combination (spec §6 "runs the full
    /// Cartesian sweep of criteria and permutations").
    pub fn full_sweep(num_controllers: usize) -> Self {
        Self {
            num_controllers,
            criteria: CriteriaTuple::all(),
            log_level: LogLevel::default(),
        }
    }

    pub fn with_log_level(mut self, log_level: LogLevel) -> Self {
        self.log_level = log_level;
        self
    }

    /// True iff more than one criteria tuple is configured — the CLI uses this to pick
    /// between `verify` (one run) and `run_permutation_sweep` (the full sweep).
    pub fn is_sweep(&self) -> bool {
        self.criteria.len() > 1
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_single_carries_exactly_the_default_tuple() {
        let config = VerifierConfig::default_single(1);
        assert_eq!(config.criteria, vec![CriteriaTuple::default_tuple()]);
        assert!(!config.is_sweep());
    }

    #[test]
    fn full_sweep_carries_every_combination() {
        let config = VerifierConfig::full_sweep(2);
        assert_eq!(config.criteria.len(), CriteriaTuple::all().len());
        assert!(config.is_sweep());
    }

    #[test]
    fn log_level_steps_through_verbosity_counts() {
        assert_eq!(LogLevel::from_verbosity(0), LogLevel::Warn);
        assert_eq!(LogLevel::from_verbosity(1), LogLevel::Info);
        assert_eq!(LogLevel::from_verbosity(2), LogLevel::Debug);
        assert_eq!(LogLevel::from_verbosity(3), LogLevel::Trace);
    }
}
