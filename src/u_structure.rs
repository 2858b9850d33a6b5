//! Synchronized composition of a plant and a twin plant, and counter-example search
//! (spec §4.4).
//!
//! A [`UStructure`] is built as `union(L′, twin(K′)).synchronizedComposition()`: both
//! operands are self-loop completed against the shared Σ (the "union" step, so that
//! either side's silent events pass through unconstrained) and then synchronised on the
//! real event underlying each transition. Its states are the reachable pairs
//! `(plant state, twin-plant state)`; a state is a *bad state* iff the twin-plant
//! component is bad in the sense of [`TwinPlant::is_bad`](crate::twin_plant::TwinPlant::is_bad)
//! — the real trace has left the legal language while an indistinguishable shadow trace
//! has not. A counter-example is any path from the initial U-state to a bad state.

use std::collections::{BTreeMap, BTreeSet, VecDeque};

use crate::automaton::{Automaton, StateId};
use crate::error::VerificationError;
use crate::event::{ControllerId, Event, EventId};
use crate::twin_plant::TwinPlant;

/// One step of a counter-example: the real event that occurred, and what each
/// controller perceives of it (`None` when the event is unobservable to that
/// controller).
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct EventVector {
    event: EventId,
    views: Vec<Option<EventId>>,
}

impl EventVector {
    pub fn event(&self) -> EventId {
        self.event
    }

    pub fn view(&self, controller: ControllerId) -> Option<EventId> {
        self.views[controller.0]
    }

    /// Derives the event-vector for `event` under `num_controllers` controllers, reading
    /// each controller's observability straight off the event.
    pub fn project(event: &Event, num_controllers: usize) -> Self {
        let views = (0..num_controllers)
            .map(|i| {
                if event.is_observable_to(ControllerId(i)) {
                    Some(event.id())
                } else {
                    None
                }
            })
            .collect();
        Self {
            event: event.id(),
            views,
        }
    }

    /// A vector with every controller's view suppressed, for tests that exercise
    /// [`Automaton::accepts_counter_example`](crate::automaton::Automaton::accepts_counter_example)
    /// against a bare event sequence without an `Event` record at hand.
    pub fn unobserved(event: EventId, num_controllers: usize) -> Self {
        Self {
            event,
            views: vec![None; num_controllers],
        }
    }
}

/// The synchronized composition of a plant and a twin plant, with its bad states
/// precomputed at build time.
pub struct UStructure {
    automaton: Automaton,
    bad_states: BTreeSet<StateId>,
    num_controllers: usize,
}

impl UStructure {
    pub fn automaton(&self) -> &Automaton {
        &self.automaton
    }

    pub fn is_bad(&self, state: StateId) -> bool {
        self.bad_states.contains(&state)
    }

    /// Builds the U-Structure for `plant` against `twin` (the twin plant of the
    /// specification currently being checked).
    pub fn build(plant: &Automaton, twin: &TwinPlant, num_controllers: usize) -> Result<Self, VerificationError> {
        let p = plant.with_self_loops();
        let t = twin.automaton().with_self_loops();

        let p_ids: Vec<EventId> = p.alphabet().iter().map(|e| e.id()).collect();
        let t_ids: Vec<EventId> = t.alphabet().iter().map(|e| e.id()).collect();
        if p_ids != t_ids {
            return Err(VerificationError::incompatible(p.handle(), t.handle()));
        }

        let mut automaton = Automaton::new(format!("U({}, {})", plant.label(), twin.automaton().label()), p.alphabet_rc());
        let mut slot_for: BTreeMap<(StateId, StateId), StateId> = BTreeMap::new();
        let mut bad_states = BTreeSet::new();
        let mut queue: VecDeque<(StateId, StateId)> = VecDeque::new();

        let initial_pair = (p.initial_state(), t.initial_state());
        slot_for.insert(initial_pair, StateId(0));
        automaton.set_initial_state(StateId(0));
        if twin.is_bad(initial_pair.1) {
            bad_states.insert(StateId(0));
        }
        queue.push_back(initial_pair);

        while let Some((pp, pt)) = queue.pop_front() {
            let source = slot_for[&(pp, pt)];
            for event in p_ids.iter().copied() {
                for tp in p.successors(pp, event) {
                    for tt in t.successors(pt, event) {
                        let target_pair = (tp, tt);
                        let target = match slot_for.get(&target_pair) {
                            Some(&id) => id,
                            None => {
                                let id = automaton.add_state(
                                    format!("({},{})", p.state_label(tp), t.state_label(tt)),
                                    false,
                                );
                                slot_for.insert(target_pair, id);
                                if twin.is_bad(tt) {
                                    bad_states.insert(id);
                                }
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
            states = automaton.num_states(),
            bad_states = bad_states.len(),
            "built U-Structure"
        );
        Ok(Self {
            automaton,
            bad_states,
            num_controllers,
        })
    }

    /// BFS from the initial U-state. `shortest = true` returns the lexicographically
    /// first minimal-length path to a bad state; `shortest = false` returns the *last*
    /// minimal-length path BFS would dequeue at that depth ("longest among the
    /// shortest" — spec §4.4's adopted reading of the ambiguous
    /// `LONGEST_COUNTER_EXAMPLE` criterion). Returns `None` iff no bad state is
    /// reachable.
    pub fn find_counter_example(&self, shortest: bool) -> Option<Vec<EventVector>> {
        let start = self.automaton.initial_state();
        let mut dist: BTreeMap<StateId, usize> = BTreeMap::new();
        let mut parent: BTreeMap<StateId, (StateId, EventId)> = BTreeMap::new();
        let mut discovery_order: Vec<StateId> = Vec::new();
        let mut queue: VecDeque<StateId> = VecDeque::new();

        dist.insert(start, 0);
        discovery_order.push(start);
        queue.push_back(start);

        while let Some(state) = queue.pop_front() {
            let depth = dist[&state];
            for (event, target) in self.automaton.outgoing(state) {
                if !dist.contains_key(&target) {
                    dist.insert(target, depth + 1);
                    parent.insert(target, (state, event));
                    discovery_order.push(target);
                    queue.push_back(target);
                }
            }
        }

        let target_state = if shortest {
            discovery_order.iter().copied().find(|s| self.is_bad(*s))?
        } else {
            let shortest_depth = self
                .bad_states
                .iter()
                .filter_map(|s| dist.get(s))
                .min()
                .copied()?;
            discovery_order
                .iter()
                .rev()
                .copied()
                .find(|s| self.is_bad(*s) && dist.get(s) == Some(&shortest_depth))?
        };

        Some(self.reconstruct(target_state, &parent))
    }

    fn reconstruct(
        &self,
        mut state: StateId,
        parent: &BTreeMap<StateId, (StateId, EventId)>,
    ) -> Vec<EventVector> {
        let mut events = Vec::new();
        while let Some(&(prev, event)) = parent.get(&state) {
            events.push(event);
            state = prev;
        }
        events.reverse();
        events
            .into_iter()
            .map(|event| EventVector::project(&self.automaton.alphabet()[event.0], self.num_controllers))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::automaton::Automaton;
    use crate::event::alphabet_from_labels;
    use std::rc::Rc;

    #[test]
    fn no_bad_states_when_plant_and_spec_agree() {
        let alphabet: crate::event::Alphabet = Rc::from(alphabet_from_labels(["a"], 1));
        let mut plant = Automaton::new("L", Rc::clone(&alphabet));
        plant.add_transition(StateId(0), EventId(0), StateId(0));
        let mut spec = Automaton::new("K", alphabet);
        spec.add_transition(StateId(0), EventId(0), StateId(0));

        let twin = TwinPlant::build(&spec, 1);
        let u = UStructure::build(&plant, &twin, 1).unwrap();
        assert_eq!(u.find_counter_example(true), None);
        assert_eq!(u.find_counter_example(false), None);
    }

    #[test]
    fn counter_example_found_when_plant_does_what_spec_forbids() {
        let alphabet: crate::event::Alphabet = Rc::from(alphabet_from_labels(["a", "b"], 1));
        let mut plant = Automaton::new("L", Rc::clone(&alphabet));
        plant.add_transition(StateId(0), EventId(0), StateId(0));

        let mut spec = Automaton::new("K", Rc::clone(&alphabet));
        spec.add_transition(StateId(0), EventId(1), StateId(0));
        let elsewhere = spec.add_state("elsewhere", false);
        spec.add_transition(elsewhere, EventId(0), elsewhere);

        let twin = TwinPlant::build(&spec, 1);
        let u = UStructure::build(&plant, &twin, 1).unwrap();
        let ce = u.find_counter_example(true).expect("counter-example expected");
        assert_eq!(ce.len(), 1);
        assert_eq!(ce[0].event(), EventId(0));
    }

    #[test]
    fn shortest_and_longest_shortest_agree_on_length() {
        let alphabet: crate::event::Alphabet = Rc::from(alphabet_from_labels(["a", "b"], 1));
        let mut plant = Automaton::new("L", Rc::clone(&alphabet));
        plant.add_transition(StateId(0), EventId(0), StateId(0));
        plant.add_transition(StateId(0), EventId(1), StateId(0));

        let mut spec = Automaton::new("K", Rc::clone(&alphabet));
        // both events forbidden from q0, each witnessed elsewhere so neither is globally
        // inactive in the spec.
        let elsewhere = spec.add_state("elsewhere", false);
        spec.add_transition(elsewhere, EventId(0), elsewhere);
        spec.add_transition(elsewhere, EventId(1), elsewhere);

        let twin = TwinPlant::build(&spec, 1);
        let u = UStructure::build(&plant, &twin, 1).unwrap();
        let shortest = u.find_counter_example(true).unwrap();
        let longest_shortest = u.find_counter_example(false).unwrap();
        assert_eq!(shortest.len(), longest_shortest.len());
    }
}
