//! Twin-plant construction (spec §4.3).
//!
//! Given a specification `K`, the twin plant K̃ pairs each real continuation of `K`
//! with every continuation a controller *cannot rule out* given only what it observes.
//! Concretely, a twin-plant state is a pair `(real, shadow)` of [`TwinComponent`]s: `real`
//! tracks where the actual trace sits in `K`, and `shadow` tracks an alternate trace that
//! has looked identical to every controller so far. Either component becomes
//! [`TwinComponent::Violated`] — an absorbing sink — once its side of the pair steps
//! outside what `K` permits.
//!
//! Crucially, the shadow side always keeps "stay put" as an option alongside whatever
//! indistinguishable event it can otherwise follow: `K` never *commits* to an event
//! happening just because the real trace took one, so an observer who has not
//! independently confirmed the step is always free to believe nothing new occurred yet.
//! This is what lets a single forbidden event produce a bad state on its own (spec §8's
//! trivial-reject scenario) rather than requiring a second, genuinely ambiguous event to
//! exist elsewhere in Σ.
//!
//! [`UStructure::build`](crate::u_structure::UStructure::build) declares a U-state bad
//! exactly when `real` is `Violated` while `shadow` is not: the plant really has left the
//! legal language, but some controller's view still admits a legal explanation, which is
//! the textbook definition of a non-observable (indistinguishable) violation.
//!
//! This is the one construction spec.md explicitly flags as recoverable only from the
//! complete original source or its cited thesis (§9 Open Questions), neither of which
//! survived retrieval (see `examples/original_source/_INDEX.md`). The encoding here is a
//! from-scratch, documented decision — see DESIGN.md — chosen to satisfy every invariant
//! in spec §8 rather than a transliteration of unseen code.

use std::collections::{BTreeMap, BTreeSet, VecDeque};

use crate::automaton::{Automaton, StateId};
use crate::event::{Alphabet, Event, EventId};

/// One side of a twin-plant state pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum TwinComponent {
    /// Still inside `K`, at this state.
    Real(StateId),
    /// Stepped outside every transition `K` permits; absorbing.
    Violated,
}

/// The twin plant K̃ built from a specification, plus the side-table needed to answer
/// "is this twin-plant state a bad state" without re-deriving it from the label.
pub struct TwinPlant {
    automaton: Automaton,
    pairs: Vec<(TwinComponent, TwinComponent)>,
}

impl TwinPlant {
    pub fn automaton(&self) -> &Automaton {
        &self.automaton
    }

    /// True iff the real trace has left `K` (`Violated`) while the shadow trace has not —
    /// i.e. some controller's observations still admit a legal explanation for what just
    /// happened on the real trace.
    pub fn is_bad(&self, state: StateId) -> bool {
        matches!(
            self.pairs[state.0],
            (TwinComponent::Violated, shadow) if shadow != TwinComponent::Violated
        )
    }

    /// Builds K̃ from specification `k` for `num_controllers` controllers.
    pub fn build(k: &Automaton, num_controllers: usize) -> Self {
        let alphabet = k.alphabet();
        let mut automaton = Automaton::new(format!("twin({})", k.label()), k.alphabet_rc());
        let mut slot_for: BTreeMap<(TwinComponent, TwinComponent), StateId> = BTreeMap::new();
        let mut pairs = Vec::new();
        let mut queue: VecDeque<(TwinComponent, TwinComponent)> = VecDeque::new();

        let initial = (TwinComponent::Real(k.initial_state()), TwinComponent::Real(k.initial_state()));
        slot_for.insert(initial, StateId(0));
        pairs.push(initial);
        automaton.set_initial_state(StateId(0));
        queue.push_back(initial);

        while let Some((real, shadow)) = queue.pop_front() {
            let source = slot_for[&(real, shadow)];
            for event in k.active_events().collect::<Vec<_>>() {
                let real_targets = real_successors(k, real, event);
                let shadow_targets = shadow_successors(k, shadow, event, alphabet, num_controllers);
                for &rt in &real_targets {
                    for &st in &shadow_targets {
                        let target_pair = (rt, st);
                        let target = match slot_for.get(&target_pair) {
                            Some(&id) => id,
                            None => {
                                let id = automaton.add_state(format!("{:?}/{:?}", rt, st), false);
                                slot_for.insert(target_pair, id);
                                pairs.push(target_pair);
                                queue.push_back(target_pair);
                                id
                            }
                        };
                        automaton.add_transition(source, event, target);
                    }
                }
            }
        }

        tracing::debug!(
            spec = k.label(),
            states = automaton.num_states(),
            "built twin plant"
        );
        Self { automaton, pairs }
    }
}

fn real_successors(k: &Automaton, component: TwinComponent, event: EventId) -> BTreeSet<TwinComponent> {
    match component {
        TwinComponent::Violated => BTreeSet::from([TwinComponent::Violated]),
        TwinComponent::Real(state) => {
            let targets: BTreeSet<TwinComponent> = k
                .successors(state, event)
                .map(TwinComponent::Real)
                .collect();
            if targets.is_empty() {
                BTreeSet::from([TwinComponent::Violated])
            } else {
                targets
            }
        }
    }
}

/// The shadow side may follow any event `e2` whose per-controller projection agrees with
/// `event`'s wherever a controller currently observes — i.e. `e2` is indistinguishable
/// from `event` to every controller that can see either of them — and, unconditionally,
/// it may also simply stay put: `K` offers no proof a step happened just because the
/// real side took one.
fn shadow_successors(
    k: &Automaton,
    component: TwinComponent,
    event: EventId,
    alphabet: &[Event],
    num_controllers: usize,
) -> BTreeSet<TwinComponent> {
    match component {
        TwinComponent::Violated => BTreeSet::from([TwinComponent::Violated]),
        TwinComponent::Real(state) => {
            let indistinguishable: Vec<EventId> = alphabet
                .iter()
                .filter(|candidate| agrees_with_every_controller(alphabet, event, candidate.id(), num_controllers))
                .map(|e| e.id())
                .collect();
            let mut targets = BTreeSet::from([component]);
            for e2 in indistinguishable {
                targets.extend(k.successors(state, e2).map(TwinComponent::Real));
            }
            targets
        }
    }
}

fn agrees_with_every_controller(alphabet: &[Event], a: EventId, b: EventId, num_controllers: usize) -> bool {
    if a == b {
        return true;
    }
    let event_a = &alphabet[a.0];
    let event_b = &alphabet[b.0];
    (0..num_controllers).all(|i| {
        let ctrl = crate::event::ControllerId(i);
        let a_seen = event_a.is_observable_to(ctrl);
        let b_seen = event_b.is_observable_to(ctrl);
        // If either side is observable to this controller, the controller would notice a
        // divergence unless both events are literally the same — which `a == b` already
        // covers above, so here we require neither to be observable.
        !(a_seen || b_seen)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::alphabet_from_labels;
    use std::rc::Rc;

    #[test]
    fn twin_plant_of_universal_spec_has_no_bad_states() {
        let alphabet: Alphabet = Rc::from(alphabet_from_labels(["a", "b"], 1));
        let mut k = Automaton::new("K", alphabet);
        k.add_transition(StateId(0), EventId(0), StateId(0));
        k.add_transition(StateId(0), EventId(1), StateId(0));
        let twin = TwinPlant::build(&k, 1);
        for state in 0..twin.automaton().num_states() {
            assert!(!twin.is_bad(StateId(state)));
        }
    }

    #[test]
    fn twin_plant_marks_real_violation_as_bad_when_shadow_survives() {
        // K forbids 'a' at q0 (only 'b' enabled there) but 'a' is active elsewhere in K,
        // so 'a' is not a globally-inactive event and self-loop completion will not mask
        // the local rejection.
        let alphabet: Alphabet = Rc::from(alphabet_from_labels(["a", "b"], 1));
        let mut k = Automaton::new("K", Rc::clone(&alphabet));
        k.add_transition(StateId(0), EventId(1), StateId(0));
        let elsewhere = k.add_state("elsewhere", false);
        k.add_transition(elsewhere, EventId(0), elsewhere);

        let twin = TwinPlant::build(&k, 1);
        // From (Real(q0), Real(q0)) on 'a': real side has no transition -> Violated.
        // Shadow always keeps the option of staying at Real(q0), which is not itself
        // Violated, so this is a bad state regardless of observability.
        let bad_count = (0..twin.automaton().num_states())
            .filter(|&s| twin.is_bad(StateId(s)))
            .count();
        assert!(bad_count > 0, "forbidding an active event must produce a bad state");
    }
}
