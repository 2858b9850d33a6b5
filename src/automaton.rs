//! In-memory labelled transition system.
//!
//! This is the core data structure the rest of the crate builds on: a non-deterministic
//! automaton over the shared alphabet Σ, with dense state ids, an explicit marked set,
//! and a transition relation stored as an ordered adjacency so that BFS exploration
//! order is reproducible (needed for the lexicographic tie-break in
//! [`UStructure::find_counter_example`](crate::u_structure::UStructure::find_counter_example)).
//!
//! Automata are read once by [`loader`](crate::loader), self-loop-completed once via
//! [`Automaton::with_self_loops`], and never mutated again. Every subsequent operation
//! ([`duplicate`](Automaton::duplicate), [`product`](crate::product::product),
//! [`TwinPlant::build`](crate::twin_plant::TwinPlant::build)) returns a fresh automaton.

use std::collections::{BTreeMap, BTreeSet};
use std::rc::Rc;
use std::sync::atomic::{AtomicU64, Ordering};

use fixedbitset::FixedBitSet;

use crate::event::{Alphabet, Event, EventId};
use crate::u_structure::EventVector;

/// Stable identity for an automaton, assigned once at construction.
///
/// Replaces the source tool's filename-based identity (spec §9 REDESIGN FLAGS):
/// membership in L′/K′ and the Memoizer's canonical key are both expressed in terms of
/// this handle rather than a header file's base name, so two automata loaded from
/// different files can never collide and the same automaton object is never counted
/// twice.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct AutomatonHandle(u64);

static NEXT_HANDLE: AtomicU64 = AtomicU64::new(0);

impl AutomatonHandle {
    fn fresh() -> Self {
        Self(NEXT_HANDLE.fetch_add(1, Ordering::Relaxed))
    }
}

/// Dense identifier for a state within its owning automaton.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct StateId(pub usize);

#[derive(Debug, Clone)]
struct State {
    label: String,
    marked: bool,
}

/// A non-deterministic labelled transition system over a shared alphabet Σ.
#[derive(Debug, Clone)]
pub struct Automaton {
    handle: AutomatonHandle,
    label: String,
    alphabet: Alphabet,
    states: Vec<State>,
    initial_state: StateId,
    transitions: BTreeMap<(StateId, EventId), BTreeSet<StateId>>,
    active_events: BTreeSet<EventId>,
}

impl Automaton {
    /// Creates an automaton with a single initial state and no transitions.
    pub fn new(label: impl Into<String>, alphabet: Alphabet) -> Self {
        Self {
            handle: AutomatonHandle::fresh(),
            label: label.into(),
            alphabet,
            states: vec![State {
                label: "q0".to_string(),
                marked: false,
            }],
            initial_state: StateId(0),
            transitions: BTreeMap::new(),
            active_events: BTreeSet::new(),
        }
    }

    pub fn handle(&self) -> AutomatonHandle {
        self.handle
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn alphabet(&self) -> &[Event] {
        &self.alphabet
    }

    pub fn alphabet_rc(&self) -> Alphabet {
        Rc::clone(&self.alphabet)
    }

    pub fn initial_state(&self) -> StateId {
        self.initial_state
    }

    pub fn is_marked(&self, state: StateId) -> bool {
        self.states[state.0].marked
    }

    pub fn state_label(&self, state: StateId) -> &str {
        &self.states[state.0].label
    }

    pub fn num_states(&self) -> usize {
        self.states.len()
    }

    pub fn num_transitions(&self) -> usize {
        self.transitions.values().map(|targets| targets.len()).sum()
    }

    pub fn active_events(&self) -> impl Iterator<Item = EventId> + '_ {
        self.active_events.iter().copied()
    }

    pub fn is_active(&self, event: EventId) -> bool {
        self.active_events.contains(&event)
    }

    /// Adds a fresh state, returning its id. `marked` follows spec's marked set M.
    pub fn add_state(&mut self, label: impl Into<String>, marked: bool) -> StateId {
        self.states.push(State {
            label: label.into(),
            marked,
        });
        StateId(self.states.len() - 1)
    }

    pub fn set_initial_state(&mut self, state: StateId) {
        self.initial_state = state;
    }

    /// Flips a state's marking. Used only while a fresh automaton is still under
    /// construction (e.g. by [`product`](crate::product::product)); automata are never
    /// mutated again once handed to a caller.
    pub fn set_marked(&mut self, state: StateId, marked: bool) {
        self.states[state.0].marked = marked;
    }

    /// Adds a transition `(source, event, target)`. Multi-edges with distinct targets
    /// on the same event are permitted (spec §3: determinism is not assumed).
    pub fn add_transition(&mut self, source: StateId, event: EventId, target: StateId) {
        self.transitions
            .entry((source, event))
            .or_default()
            .insert(target);
        self.active_events.insert(event);
    }

    /// The set of states reachable from `source` on `event`, in ascending order.
    pub fn successors(&self, source: StateId, event: EventId) -> impl Iterator<Item = StateId> + '_ {
        self.transitions
            .get(&(source, event))
            .into_iter()
            .flat_map(|targets| targets.iter().copied())
    }

    /// All `(event, target)` pairs leaving `source`, in the deterministic order the
    /// `BTreeMap` backing store guarantees — this is the order BFS consumers rely on
    /// for the lexicographic tie-break.
    pub fn outgoing(&self, source: StateId) -> impl Iterator<Item = (EventId, StateId)> + '_ {
        self.transitions
            .range((source, EventId(0))..)
            .take_while(move |((s, _), _)| *s == source)
            .flat_map(|(&(_, e), targets)| targets.iter().map(move |&t| (e, t)))
    }

    /// Deep copy with a fresh handle, preserving the initial state and marked set
    /// (spec §4.1 `duplicate`).
    pub fn duplicate(&self) -> Self {
        Self {
            handle: AutomatonHandle::fresh(),
            label: format!("{}'", self.label),
            alphabet: Rc::clone(&self.alphabet),
            states: self.states.clone(),
            initial_state: self.initial_state,
            transitions: self.transitions.clone(),
            active_events: self.active_events.clone(),
        }
    }

    /// Returns a fresh automaton identical to `self` but with `(q, e, q)` added for
    /// every state `q` and every event `e` on which `self` has no transition anywhere
    /// (spec §4.1 `addSelfLoopsForInactiveEvents`, made pure per §9 REDESIGN FLAGS:
    /// the source mutated automata in place, this returns a new one and leaves `self`
    /// untouched so the one-shot completion at load time can be expressed as
    /// `automaton = automaton.with_self_loops()` without aliasing surprises).
    ///
    /// Idempotent: an automaton with no inactive events returns an identical copy.
    pub fn with_self_loops(&self) -> Self {
        let mut out = self.duplicate();
        let inactive: Vec<EventId> = out
            .alphabet
            .iter()
            .map(|e| e.id())
            .filter(|id| !out.active_events.contains(id))
            .collect();
        if inactive.is_empty() {
            tracing::trace!(automaton = %out.label, "no inactive events, self-loop completion is a no-op");
            return out;
        }
        let state_ids: Vec<StateId> = (0..out.states.len()).map(StateId).collect();
        for event in &inactive {
            for &state in &state_ids {
                out.add_transition(state, *event, state);
            }
        }
        tracing::debug!(
            automaton = %out.label,
            added = inactive.len(),
            "completed self-loops for inactive events"
        );
        out
    }

    /// Set-simulation acceptance: consumes `trace`'s real events one at a time,
    /// tracking the set of states reachable so far. Returns the number of events
    /// consumed before the reachable set became empty, or `None` if the whole trace
    /// was consumed without exhausting it (spec §4.1 `acceptsCounterExample`, with the
    /// sentinel `-1` replaced by `None` — see DESIGN.md).
    pub fn accepts_counter_example(&self, trace: &[EventVector]) -> Option<usize> {
        let mut current = FixedBitSet::with_capacity(self.states.len());
        current.insert(self.initial_state.0);
        for (consumed, vector) in trace.iter().enumerate() {
            let mut next = FixedBitSet::with_capacity(self.states.len());
            for state in current.ones() {
                for successor in self.successors(StateId(state), vector.event()) {
                    next.insert(successor.0);
                }
            }
            if next.count_ones(..) == 0 {
                return Some(consumed);
            }
            current = next;
        }
        None
    }
}
