use std::collections::BTreeMap;

use isaac_types::{Context, Hash, VoteValue};

use crate::threshold::ThresholdPolicy;

/// What a single source claimed when it voted at a given ballot state.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct VoteRecord {
    pub vote: VoteValue,
    pub ballot_hash: Hash,
}

/// The outcome of `can_decide`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Decision {
    NotYet,
    Finished(VoteValue),
}

/// Returned by [`RoundVote::record`].
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum RecordOutcome {
    /// First vote from this source at this state.
    New,
    /// Same source, same state, same vote: silently ignored by the caller.
    Duplicate,
    /// Same source, same state, a different vote: Byzantine equivocation.
    /// The first vote is kept; the source is treated as NO from here on.
    Equivocation,
}

/// Accumulates ballots from voters for a single `(basis, proposer)` pair,
/// keyed by `(state, source)`. `voters_by_state[state].len()` is bounded by
/// `|validators|`, and each source appears at most once per state
/// (invariant 2): a second, conflicting vote is recorded as equivocation but
/// never overwrites the first.
#[derive(Clone, Debug)]
pub struct RoundVote<Ctx: Context> {
    voters_by_state: BTreeMap<isaac_types::BallotState, BTreeMap<Ctx::Address, VoteRecord>>,
    equivocators_by_state: BTreeMap<isaac_types::BallotState, std::collections::BTreeSet<Ctx::Address>>,
}

impl<Ctx: Context> Default for RoundVote<Ctx> {
    fn default() -> Self {
        Self::new()
    }
}

impl<Ctx: Context> RoundVote<Ctx> {
    pub fn new() -> Self {
        Self {
            voters_by_state: BTreeMap::new(),
            equivocators_by_state: BTreeMap::new(),
        }
    }

    /// Records a ballot's vote. Returns whether this was a new vote, a
    /// silent duplicate, or a detected equivocation.
    pub fn record(
        &mut self,
        source: Ctx::Address,
        state: isaac_types::BallotState,
        vote: VoteValue,
        ballot_hash: Hash,
    ) -> RecordOutcome {
        let by_source = self.voters_by_state.entry(state).or_default();

        match by_source.get(&source) {
            None => {
                by_source.insert(source, VoteRecord { vote, ballot_hash });
                RecordOutcome::New
            }
            Some(existing) if existing.vote == vote => RecordOutcome::Duplicate,
            Some(_) => {
                self.equivocators_by_state.entry(state).or_default().insert(source);
                RecordOutcome::Equivocation
            }
        }
    }

    pub fn is_voted(&self, source: &Ctx::Address, state: isaac_types::BallotState) -> bool {
        self.voters_by_state
            .get(&state)
            .is_some_and(|m| m.contains_key(source))
    }

    /// Count of voters for `value` at `state`, treating every detected
    /// equivocator as a NO vote regardless of which value it originally cast
    /// (per the failure-semantics table: equivocation counts as NO).
    fn count(&self, state: isaac_types::BallotState, value: VoteValue) -> u64 {
        let empty_map = BTreeMap::new();
        let by_source = self.voters_by_state.get(&state).unwrap_or(&empty_map);
        let empty_set = std::collections::BTreeSet::new();
        let equivocators = self.equivocators_by_state.get(&state).unwrap_or(&empty_set);

        by_source
            .iter()
            .filter(|(source, record)| {
                if equivocators.contains(*source) {
                    value == VoteValue::No
                } else {
                    record.vote == value
                }
            })
            .count() as u64
    }

    /// Implements §4.2: majority wins; if the remaining, as-yet-unvoted
    /// weight can no longer swing any value to the threshold, the round is
    /// decided NO rather than left hanging forever.
    pub fn can_decide(
        &self,
        state: isaac_types::BallotState,
        policy: ThresholdPolicy,
        validator_count: usize,
    ) -> Decision {
        let threshold = policy.threshold(validator_count);

        let n_yes = self.count(state, VoteValue::Yes);
        let n_no = self.count(state, VoteValue::No);
        let n_exp = self.count(state, VoteValue::Exp);

        if n_yes >= threshold {
            return Decision::Finished(VoteValue::Yes);
        }
        if n_no >= threshold {
            return Decision::Finished(VoteValue::No);
        }
        if n_exp >= threshold {
            return Decision::Finished(VoteValue::Exp);
        }

        let total_cast = n_yes + n_no + n_exp;
        let remaining = validator_count as u64 - total_cast;

        if total_cast >= threshold {
            let yes_can_still_win = n_yes + remaining >= threshold;
            let no_can_still_win = n_no + remaining >= threshold;
            let exp_can_still_win = n_exp + remaining >= threshold;

            if !yes_can_still_win && !no_can_still_win && !exp_can_still_win {
                return Decision::Finished(VoteValue::No);
            }
        }

        Decision::NotYet
    }
}
