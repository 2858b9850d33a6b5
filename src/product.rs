//! Binary synchronous intersection of two automata over a shared Σ (spec §4.2).
//!
//! The product's states are the reachable subset of `Q_a × Q_b`, explored breadth-first
//! from `(q0_a, q0_b)`; a transition `((p,q), e, (p',q'))` exists iff both operands have
//! `(p,e,p')` and `(q,e,q')` respectively, and a state is marked iff both components are
//! marked. Inactive-event self-loop completion (§4.1) is what makes a genuinely silent
//! component transparent to the other side's events here — `product` itself performs no
//! completion, so callers that need that alignment call
//! [`Automaton::with_self_loops`](crate::automaton::Automaton::with_self_loops) first, as
//! [`UStructure::build`](crate::u_structure::UStructure::build) does.

use std::collections::{BTreeMap, VecDeque};

use crate::automaton::{Automaton, StateId};
use crate::error::VerificationError;
use crate::event::EventId;

/// Computes the synchronous intersection of `a` and `b`.
///
/// # Errors
///
/// Returns [`VerificationError::IncompatibleAutomata`] if `a` and `b` declare different
/// sets of event ids — the product is only meaningful over a shared Σ (spec §4.2).
pub fn product(a: &Automaton, b: &Automaton) -> Result<Automaton, VerificationError> {
    let a_ids: Vec<EventId> = a.alphabet().iter().map(|e| e.id()).collect();
    let b_ids: Vec<EventId> = b.alphabet().iter().map(|e| e.id()).collect();
    if a_ids != b_ids {
        return Err(VerificationError::incompatible(a.handle(), b.handle()));
    }

    let mut out = Automaton::new(format!("({} x {})", a.label(), b.label()), a.alphabet_rc());
    // Replace the single default state `out` starts with by the reachable-pair states we
    // discover below; `slot_for` lazily allocates a dense id the first time a pair is seen.
    let mut slot_for: BTreeMap<(StateId, StateId), StateId> = BTreeMap::new();
    let mut queue: VecDeque<(StateId, StateId)> = VecDeque::new();

    let initial_pair = (a.initial_state(), b.initial_state());
    let initial_marked = a.is_marked(initial_pair.0) && b.is_marked(initial_pair.1);
    slot_for.insert(initial_pair, StateId(0));
    out.set_initial_state(StateId(0));
    out.set_marked(StateId(0), initial_marked);
    queue.push_back(initial_pair);

    while let Some((pa, pb)) = queue.pop_front() {
        let source = slot_for[&(pa, pb)];
        for event in a_ids.iter().copied() {
            for ta in a.successors(pa, event) {
                for tb in b.successors(pb, event) {
                    let target_pair = (ta, tb);
                    let target = *slot_for.entry(target_pair).or_insert_with(|| {
                        let marked = a.is_marked(ta) && b.is_marked(tb);
                        let id = out.add_state(
                            format!("({},{})", a.state_label(ta), b.state_label(tb)),
                            marked,
                        );
                        queue.push_back(target_pair);
                        id
                    });
                    out.add_transition(source, event, target);
                }
            }
        }
    }

    tracing::debug!(
        left = a.label(),
        right = b.label(),
        states = out.num_states(),
        transitions = out.num_transitions(),
        "built synchronous product"
    );
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::alphabet_from_labels;
    use std::rc::Rc;

    fn two_state_loop(alphabet: &crate::event::Alphabet, event: EventId, label: &str) -> Automaton {
        let mut a = Automaton::new(label, Rc::clone(alphabet));
        a.add_transition(StateId(0), event, StateId(0));
        a
    }

    #[test]
    fn product_of_identical_automata_is_isomorphic_to_either_operand() {
        let alphabet: crate::event::Alphabet = Rc::from(alphabet_from_labels(["a"], 1));
        let a = two_state_loop(&alphabet, EventId(0), "A");
        let b = two_state_loop(&alphabet, EventId(0), "B");
        let p = product(&a, &b).unwrap();
        assert_eq!(p.num_states(), 1);
        assert_eq!(p.num_transitions(), 1);
    }

    #[test]
    fn product_rejects_mismatched_alphabets() {
        let a_alpha: crate::event::Alphabet = Rc::from(alphabet_from_labels(["a"], 1));
        let b_alpha: crate::event::Alphabet = Rc::from(alphabet_from_labels(["a", "b"], 1));
        let a = Automaton::new("A", a_alpha);
        let b = Automaton::new("B", b_alpha);
        assert!(matches!(
            product(&a, &b),
            Err(VerificationError::IncompatibleAutomata { .. })
        ));
    }

    #[test]
    fn product_is_commutative_up_to_state_and_transition_count() {
        // Full graph isomorphism is overkill here; state/transition counts plus marked
        // count are a faithful proxy for "isomorphic" given both products are built by
        // the same deterministic reachable-pair BFS (spec §8 invariant 3).
        let alphabet: crate::event::Alphabet = Rc::from(alphabet_from_labels(["a", "b"], 1));
        let mut a = Automaton::new("A", Rc::clone(&alphabet));
        let a1 = a.add_state("a1", true);
        a.add_transition(StateId(0), EventId(0), a1);
        a.add_transition(a1, EventId(1), StateId(0));

        let mut b = Automaton::new("B", alphabet);
        let b1 = b.add_state("b1", false);
        b.add_transition(StateId(0), EventId(0), b1);
        b.add_transition(b1, EventId(1), StateId(0));
        b.add_transition(b1, EventId(0), b1);

        let ab = product(&a, &b).unwrap();
        let ba = product(&b, &a).unwrap();
        assert_eq!(ab.num_states(), ba.num_states());
        assert_eq!(ab.num_transitions(), ba.num_transitions());
    }

    #[test]
    fn product_is_associative_up_to_state_and_transition_count() {
        // Each operand self-loops on every event everywhere (via with_self_loops), so
        // every product below is fully connected and associativity has something real
        // to check rather than two trivially-equal empty automata.
        let alphabet: crate::event::Alphabet = Rc::from(alphabet_from_labels(["a", "b", "c"], 1));
        let a = two_state_loop(&alphabet, EventId(0), "A").with_self_loops();
        let b = two_state_loop(&alphabet, EventId(1), "B").with_self_loops();
        let c = two_state_loop(&alphabet, EventId(2), "C").with_self_loops();

        let ab_c = product(&product(&a, &b).unwrap(), &c).unwrap();
        let a_bc = product(&a, &product(&b, &c).unwrap()).unwrap();
        assert_eq!(ab_c.num_states(), a_bc.num_states());
        assert_eq!(ab_c.num_transitions(), a_bc.num_transitions());
    }

    #[test]
    fn product_marks_only_pairs_where_both_sides_are_marked() {
        let alphabet: crate::event::Alphabet = Rc::from(alphabet_from_labels(["a"], 1));
        let mut a = Automaton::new("A", Rc::clone(&alphabet));
        let a1 = a.add_state("a1", true);
        a.add_transition(StateId(0), EventId(0), a1);
        let mut b = Automaton::new("B", alphabet);
        let b1 = b.add_state("b1", false);
        b.add_transition(StateId(0), EventId(0), b1);

        let p = product(&a, &b).unwrap();
        assert!(!p.is_marked(p.initial_state()));
        let next = p.successors(p.initial_state(), EventId(0)).next().unwrap();
        assert!(!p.is_marked(next), "a is marked but b is not, so the pair must not be marked");
    }
}
