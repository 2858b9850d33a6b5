//! Error types surfaced by the verification engine.
//!
//! The engine recognises exactly two error kinds (spec §7): an
//! [`IncompatibleAutomata`](VerificationError::IncompatibleAutomata) failure when two
//! operands of [`product`](crate::product::product) or
//! [`union`](crate::u_structure::UStructure::build) disagree on their event alphabet, and a
//! [`MalformedAutomaton`](VerificationError::MalformedAutomaton) failure raised by
//! [`loader`](crate::loader) before verification begins. Every other outcome — an empty
//! candidate set in the inner loop, an empty `specs` list at the start of the outer loop —
//! is a normal `Ok` result, never an error.

use crate::automaton::AutomatonHandle;

/// The two error kinds the core engine can raise.
///
/// A verification run is atomic: it produces exactly one [`bool`] verdict or one
/// `VerificationError`, never a partial result.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum VerificationError {
    /// Two automata were asked to synchronise but declare different event alphabets.
    #[error("automata {left:?} and {right:?} declare incompatible event alphabets")]
    IncompatibleAutomata {
        left: AutomatonHandle,
        right: AutomatonHandle,
    },

    /// The on-disk header/body representation of an automaton was malformed.
    #[error("malformed automaton: {0}")]
    MalformedAutomaton(String),
}

impl VerificationError {
    pub(crate) fn incompatible(left: AutomatonHandle, right: AutomatonHandle) -> Self {
        let err = Self::IncompatibleAutomata { left, right };
        tracing::error!(?left, ?right, "incompatible event alphabets");
        err
    }

    pub(crate) fn malformed(message: impl Into<String>) -> Self {
        let message = message.into();
        tracing::error!(%message, "malformed automaton");
        Self::MalformedAutomaton(message)
    }
}
