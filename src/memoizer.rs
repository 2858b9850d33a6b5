//! Caches U-Structures by the subset pair that produced them (spec §4.5).
//!
//! Building a [`UStructure`](crate::u_structure::UStructure) is the single most expensive
//! step in a verification run, and the incremental search in
//! [`IncrementalVerifier`](crate::verifier::IncrementalVerifier) revisits the same
//! `(L′, K′)` subset pair repeatedly as it backtracks across candidates. The
//! [`Memoizer`] makes that revisiting free: a cache hit returns the exact same `Rc`
//! previously handed out, never a fresh rebuild (spec §8 invariant 4).

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use crate::automaton::AutomatonHandle;
use crate::error::VerificationError;
use crate::u_structure::UStructure;

/// A subset pair's identity, independent of the order its members were selected in.
///
/// Built from the combined handles of `L′ ∪ K′` rather than from file names (spec §9
/// REDESIGN FLAGS): two selections that name the same automata, regardless of the order
/// candidates were appended in, hash and compare equal.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CanonicalKey(Vec<AutomatonHandle>);

impl CanonicalKey {
    /// Builds the canonical key for the union of two selections, sorting handles so
    /// that selection order never affects identity.
    pub fn new(plants: &[AutomatonHandle], specs: &[AutomatonHandle]) -> Self {
        let mut handles: Vec<AutomatonHandle> = plants.iter().chain(specs.iter()).copied().collect();
        handles.sort();
        Self(handles)
    }
}

/// Caches [`UStructure`]s by [`CanonicalKey`]. Holds no eviction policy — a single
/// verification run never needs to forget an entry, since the number of distinct
/// subset pairs it will ever construct is bounded by the permutation sweep itself.
#[derive(Default)]
pub struct Memoizer {
    cache: RefCell<HashMap<CanonicalKey, Rc<UStructure>>>,
}

impl Memoizer {
    pub fn new() -> Self {
        Self {
            cache: RefCell::new(HashMap::new()),
        }
    }

    /// Returns the cached U-Structure for `key`, calling `build` to construct and cache
    /// one on a miss. `build` runs at most once per distinct key for the lifetime of
    /// this `Memoizer`.
    pub fn get_or_build(
        &self,
        key: CanonicalKey,
        build: impl FnOnce() -> Result<UStructure, VerificationError>,
    ) -> Result<Rc<UStructure>, VerificationError> {
        if let Some(hit) = self.cache.borrow().get(&key) {
            tracing::trace!(subsets = key.0.len(), "memoizer hit");
            return Ok(Rc::clone(hit));
        }
        let fresh = Rc::new(build()?);
        tracing::debug!(subsets = key.0.len(), "memoizer miss, built fresh U-Structure");
        self.cache.borrow_mut().insert(key, Rc::clone(&fresh));
        Ok(fresh)
    }

    pub fn len(&self) -> usize {
        self.cache.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.cache.borrow().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::automaton::{Automaton, StateId};
    use crate::event::{alphabet_from_labels, EventId};
    use crate::twin_plant::TwinPlant;
    use std::cell::Cell;

    fn trivial_automaton(label: &str) -> Automaton {
        let alphabet = Rc::from(alphabet_from_labels(["a"], 1));
        let mut a = Automaton::new(label, alphabet);
        a.add_transition(StateId(0), EventId(0), StateId(0));
        a
    }

    #[test]
    fn cache_hit_returns_the_same_rc_instance() {
        let plant = trivial_automaton("L");
        let spec = trivial_automaton("K");
        let key = CanonicalKey::new(&[plant.handle()], &[spec.handle()]);

        let memo = Memoizer::new();
        let builds = Cell::new(0);
        let build = || {
            builds.set(builds.get() + 1);
            let twin = TwinPlant::build(&spec, 1);
            UStructure::build(&plant, &twin, 1)
        };

        let first = memo.get_or_build(key.clone(), build).unwrap();
        let second = memo.get_or_build(key, build).unwrap();
        assert!(Rc::ptr_eq(&first, &second));
        assert_eq!(builds.get(), 1, "build closure must run at most once per key");
    }

    #[test]
    fn distinct_keys_are_cached_independently() {
        let plant = trivial_automaton("L");
        let spec_a = trivial_automaton("K1");
        let spec_b = trivial_automaton("K2");

        let memo = Memoizer::new();
        let key_a = CanonicalKey::new(&[plant.handle()], &[spec_a.handle()]);
        let key_b = CanonicalKey::new(&[plant.handle()], &[spec_b.handle()]);
        assert_ne!(key_a, key_b);

        memo.get_or_build(key_a, || {
            let twin = TwinPlant::build(&spec_a, 1);
            UStructure::build(&plant, &twin, 1)
        })
        .unwrap();
        memo.get_or_build(key_b, || {
            let twin = TwinPlant::build(&spec_b, 1);
            UStructure::build(&plant, &twin, 1)
        })
        .unwrap();
        assert_eq!(memo.len(), 2);
    }

    #[test]
    fn canonical_key_is_independent_of_selection_order() {
        let plant = trivial_automaton("L");
        let spec = trivial_automaton("K");
        let a = CanonicalKey::new(&[plant.handle()], &[spec.handle()]);
        let b = CanonicalKey::new(&[spec.handle()], &[plant.handle()]);
        assert_eq!(a, b);
    }
}
