//! Incremental verification of observability for decentralized discrete-event systems.
//!
//! Given a family of plant automata `L = {L₁, …, Lₘ}` and a family of specification
//! automata `K = {K₁, …, Kₙ}` over a shared event alphabet Σ, this crate decides whether
//! the composed specification is *observable* under the plant: whether the U-Structure
//! of the (plant, spec) pair has a counter-example, a pair of indistinguishable traces
//! where one is permitted by the plant and the other forbidden by the spec.
//!
//! Rather than build the full synchronous product of every plant and every spec up
//! front — exponential in the number of components — [`verify`] grows partial products
//! `L′ ⊆ L` and `K′ ⊆ K` on demand, folding in only the components that eliminate a
//! specific discovered counter-example. See [`verifier`] for the outer/inner refinement
//! loop and [`criteria`] for its four pluggable selection criteria.
//!
//! # Module map
//!
//! - [`event`] / [`automaton`]: the shared alphabet and the labelled transition system
//!   built over it.
//! - [`product`]: binary synchronous intersection.
//! - [`twin_plant`]: the twin-plant construction that pairs a specification's real
//!   trace with what each controller's observation mask cannot rule out.
//! - [`u_structure`]: synchronized composition of a plant and a twin plant, plus
//!   counter-example search.
//! - [`memoizer`]: caches U-Structures by the subset pair that produced them.
//! - [`verifier`]: the incremental outer/inner loop and its [`verify`] entry point.
//! - [`criteria`] / [`telemetry`]: the pluggable selection criteria and the resource
//!   counters a run records against them.
//! - [`loader`]: the minimal on-disk automaton format this crate reads.
//! - [`error`]: the two error kinds the engine can raise.
//! - [`config`]: bundles which criteria a run exercises and how verbosely it logs.

pub mod automaton;
pub mod config;
pub mod criteria;
pub mod error;
pub mod event;
pub mod loader;
pub mod memoizer;
pub mod product;
pub mod telemetry;
pub mod twin_plant;
pub mod u_structure;
pub mod verifier;

pub use automaton::{Automaton, AutomatonHandle, StateId};
pub use config::{LogLevel, VerifierConfig};
pub use criteria::{CriteriaTuple, FirstCriteria, FourthCriteria, SecondCriteria, ThirdCriteria};
pub use error::VerificationError;
pub use event::{alphabet_from_labels, Alphabet, ControllerId, Event, EventId};
pub use memoizer::{CanonicalKey, Memoizer};
pub use telemetry::{Telemetry, TelemetryEntry};
pub use twin_plant::TwinPlant;
pub use u_structure::{EventVector, UStructure};
pub use verifier::{run_permutation_sweep, verify, IncrementalVerifier};
