//! The shared event alphabet Σ.
//!
//! Σ is fixed for the lifetime of one verification run (spec §3): every automaton
//! participating in a run is built against the same [`Alphabet`], and an automaton's
//! *silence* on an event is made explicit by [`Automaton::with_self_loops`]
//! (crate::automaton) rather than left implicit.
//!
//! An [`Event`] carries observability and controllability **per controller**. The
//! distilled spec gives an event only two scalar booleans, but §4.4's "event-vectors
//! capturing each controller's view" only make sense if different controllers can see
//! the same event differently — a single global bit collapses every controller's view
//! to the same projection and the U-Structure degenerates to the centralized case. This
//! crate therefore indexes both attributes by [`ControllerId`]; see DESIGN.md.

use std::rc::Rc;

/// Dense identifier for an event within the shared alphabet Σ.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct EventId(pub usize);

/// Identifier for one of the `k` controllers observing/acting on the system.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ControllerId(pub usize);

/// A single event in Σ: a stable id, a display label, and per-controller attributes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Event {
    id: EventId,
    label: String,
    /// `observable[i]` is true iff controller `i` can see this event occur.
    observable: Vec<bool>,
    /// `controllable[i]` is true iff controller `i` can disable this event.
    controllable: Vec<bool>,
}

impl Event {
    pub fn new(id: EventId, label: impl Into<String>, num_controllers: usize) -> Self {
        Self {
            id,
            label: label.into(),
            observable: vec![true; num_controllers],
            controllable: vec![true; num_controllers],
        }
    }

    pub fn id(&self) -> EventId {
        self.id
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn set_observable(&mut self, controller: ControllerId, value: bool) {
        self.observable[controller.0] = value;
    }

    pub fn set_controllable(&mut self, controller: ControllerId, value: bool) {
        self.controllable[controller.0] = value;
    }

    pub fn is_observable_to(&self, controller: ControllerId) -> bool {
        self.observable[controller.0]
    }

    pub fn is_controllable_to(&self, controller: ControllerId) -> bool {
        self.controllable[controller.0]
    }

    /// Scalar reading used by spec.md's "observable" field: true iff *any* controller
    /// observes the event. Coincides with the single-controller case exactly.
    pub fn is_observable_to_any(&self) -> bool {
        self.observable.iter().any(|&o| o)
    }

    /// Scalar reading used by spec.md's "controllable" field: true iff *any* controller
    /// can disable the event.
    pub fn is_controllable_to_any(&self) -> bool {
        self.controllable.iter().any(|&c| c)
    }
}

/// The shared alphabet Σ for one verification run, shared by `Rc` across every
/// automaton so that permutations can alias rather than copy (spec §5).
pub type Alphabet = Rc<[Event]>;

/// Builds an [`Alphabet`] from labels, defaulting every event to fully observable and
/// fully controllable by all `num_controllers` controllers. Callers restrict
/// observability/controllability afterwards with [`Event::set_observable`] /
/// [`Event::set_controllable`] on a mutable `Vec<Event>` before wrapping it in `Rc`.
pub fn alphabet_from_labels<I, S>(labels: I, num_controllers: usize) -> Vec<Event>
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    labels
        .into_iter()
        .enumerate()
        .map(|(i, label)| Event::new(EventId(i), label, num_controllers))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_alphabet_is_fully_observable_and_controllable() {
        let events = alphabet_from_labels(["a", "b"], 2);
        for e in &events {
            assert!(e.is_observable_to(ControllerId(0)));
            assert!(e.is_observable_to(ControllerId(1)));
            assert!(e.is_observable_to_any());
            assert!(e.is_controllable_to_any());
        }
    }

    #[test]
    fn per_controller_observability_is_independent() {
        let mut events = alphabet_from_labels(["a"], 2);
        events[0].set_observable(ControllerId(1), false);
        assert!(events[0].is_observable_to(ControllerId(0)));
        assert!(!events[0].is_observable_to(ControllerId(1)));
        assert!(events[0].is_observable_to_any());
    }
}
