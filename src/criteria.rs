//! The pluggable decision points the incremental search consults at each step
//! (spec §4.6, promoted to its own module per SPEC_FULL.md §4.7).
//!
//! Each enum is implemented uniformly — every variant does something real. Spec §9's
//! REDESIGN FLAGS calls out that the source left two of `FirstCriteria`'s three variants
//! as reserved-but-unused; here all three drive actual behaviour in
//! [`IncrementalVerifier`](crate::verifier::IncrementalVerifier).

/// Which side the outer loop widens first when both could be grown.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FirstCriteria {
    /// Always grow the plant selection before the spec selection.
    PlantOverSpec,
    /// Always grow the spec selection before the plant selection.
    SpecOverPlant,
    /// Alternate sides on successive inner iterations.
    Alternating,
}

/// Which of the (possibly several) minimal-length counter-examples is returned.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SecondCriteria {
    ShortestCounterExample,
    LongestCounterExample,
}

/// Where a newly-promoted automaton is inserted into the outer loop's remaining queue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ThirdCriteria {
    InsertSpecsAtStart,
    InsertSpecsAtEnd,
}

/// How step 3b scores the candidates that reject the current counter-example, when more
/// than one does.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FourthCriteria {
    /// Accept the first rejecting candidate found, in list order.
    FirstMatch,
    /// Prefer the candidate with fewest transitions.
    MinTransitions,
    /// Prefer the candidate with fewest states.
    MinStates,
    /// Prefer the candidate that rejects the counter-example earliest.
    ShortestRejection,
    /// Prefer the candidate that rejects the counter-example latest.
    LongestRejection,
}

/// One full choice of criteria, bundled for telemetry keying and the CLI's sweep.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CriteriaTuple {
    pub first: FirstCriteria,
    pub second: SecondCriteria,
    pub third: ThirdCriteria,
    pub fourth: FourthCriteria,
}

impl CriteriaTuple {
    pub const fn new(
        first: FirstCriteria,
        second: SecondCriteria,
        third: ThirdCriteria,
        fourth: FourthCriteria,
    ) -> Self {
        Self {
            first,
            second,
            third,
            fourth,
        }
    }

    /// `PlantOverSpec` / `ShortestCounterExample` / `InsertSpecsAtEnd` / `FirstMatch` —
    /// the combination the CLI runs when `--sweep` is not requested.
    pub const fn default_tuple() -> Self {
        Self::new(
            FirstCriteria::PlantOverSpec,
            SecondCriteria::ShortestCounterExample,
            ThirdCriteria::InsertSpecsAtEnd,
            FourthCriteria::FirstMatch,
        )
    }

    /// Every combination of the four criteria, in a fixed deterministic order, for
    /// `--sweep` and for the permutation-robustness test.
    pub fn all() -> Vec<Self> {
        let firsts = [
            FirstCriteria::PlantOverSpec,
            FirstCriteria::SpecOverPlant,
            FirstCriteria::Alternating,
        ];
        let seconds = [
            SecondCriteria::ShortestCounterExample,
            SecondCriteria::LongestCounterExample,
        ];
        let thirds = [ThirdCriteria::InsertSpecsAtStart, ThirdCriteria::InsertSpecsAtEnd];
        let fourths = [
            FourthCriteria::FirstMatch,
            FourthCriteria::MinTransitions,
            FourthCriteria::MinStates,
            FourthCriteria::ShortestRejection,
            FourthCriteria::LongestRejection,
        ];

        let mut out = Vec::with_capacity(firsts.len() * seconds.len() * thirds.len() * fourths.len());
        for &first in &firsts {
            for &second in &seconds {
                for &third in &thirds {
                    for &fourth in &fourths {
                        out.push(Self::new(first, second, third, fourth));
                    }
                }
            }
        }
        out
    }
}
