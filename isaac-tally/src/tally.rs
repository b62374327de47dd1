use std::collections::{BTreeMap, BTreeSet};

use isaac_types::{BallotState, Context, Height, RoundNumber};

/// Errors returned by [`VotingTally::get_sync_info`].
#[derive(Copy, Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum SyncError {
    #[error("fewer than T distinct sources have reported any claim")]
    NotEnoughSources,
    #[error("this claim's own source set has not itself reached T")]
    ClaimBelowThreshold,
}

/// Tracks, per source, the most recent `(height, round)` it has claimed to
/// be at via an ACCEPT-state ballot, and the reverse index used to answer
/// "how many sources are at height/round X or later" (the sync trigger).
///
/// Only ACCEPT-state ballots are fed here (§4.4); the tally is otherwise
/// agnostic to the ballot's vote value and to whether the local state
/// machine agrees the basis is valid — that is the point of it, since a
/// node can be arbitrarily behind the claims it is observing.
#[derive(Clone, Debug)]
pub struct VotingTally<Ctx: Context> {
    /// Every tracked source's most recent (height, round) claim.
    latest_by_source: BTreeMap<Ctx::Address, (Height, RoundNumber)>,
    /// Inverted index: for each (height, round) ever claimed, the set of
    /// sources whose most recent claim is exactly that entry.
    sources_by_entry: BTreeMap<(Height, RoundNumber), BTreeSet<Ctx::Address>>,
}

impl<Ctx: Context> Default for VotingTally<Ctx> {
    fn default() -> Self {
        Self::new()
    }
}

impl<Ctx: Context> VotingTally<Ctx> {
    pub fn new() -> Self {
        Self {
            latest_by_source: BTreeMap::new(),
            sources_by_entry: BTreeMap::new(),
        }
    }

    /// Records an ACCEPT-state ballot's claim, evicting the source's prior
    /// entry if the new one is strictly later under `(height, round)` order
    /// (invariant 4). Ballots not in ACCEPT state or not strictly later than
    /// the source's current claim are ignored.
    pub fn record(&mut self, source: Ctx::Address, state: BallotState, height: Height, round: RoundNumber) {
        if state != BallotState::Accept {
            return;
        }

        let entry = (height, round);

        if let Some(&previous) = self.latest_by_source.get(&source) {
            if entry <= previous {
                return;
            }
            if let Some(set) = self.sources_by_entry.get_mut(&previous) {
                set.remove(&source);
                if set.is_empty() {
                    self.sources_by_entry.remove(&previous);
                }
            }
        }

        self.latest_by_source.insert(source.clone(), entry);
        self.sources_by_entry.entry(entry).or_default().insert(source);
    }

    fn tracked_source_count(&self) -> usize {
        self.latest_by_source.len()
    }

    /// Implements §4.4's `get_sync_info`: after recording `ballot`'s claim,
    /// scans every tracked entry in ascending `(height, round)` order and
    /// returns the *smallest* one whose source set has reached `threshold`.
    /// Smallest-first is essential so a node syncs forward one agreed height
    /// at a time instead of jumping ahead and rolling back.
    pub fn get_sync_info(
        &mut self,
        source: Ctx::Address,
        height: Height,
        round: RoundNumber,
        threshold: u64,
    ) -> Result<(Height, Vec<Ctx::Address>), SyncError> {
        self.record(source.clone(), BallotState::Accept, height, round);

        if (self.tracked_source_count() as u64) < threshold {
            return Err(SyncError::NotEnoughSources);
        }

        let this_entry_size = self
            .sources_by_entry
            .get(&(height, round))
            .map(|set| set.len())
            .unwrap_or(0) as u64;

        if this_entry_size < threshold {
            return Err(SyncError::ClaimBelowThreshold);
        }

        for (&(entry_height, _entry_round), sources) in self.sources_by_entry.iter() {
            if sources.len() as u64 >= threshold {
                return Ok((entry_height, sources.iter().cloned().collect()));
            }
        }

        // Unreachable: `this_entry` itself satisfies the scan's condition,
        // so the loop above always returns before exhausting the map.
        unreachable!("this_entry passed the threshold check but no entry met it during scan")
    }

    /// Drops every tracked claim below `height`, used after a sync completes
    /// up to `height` so stale low claims don't keep re-triggering it.
    pub fn prune_below(&mut self, height: Height) {
        let stale: Vec<_> = self
            .latest_by_source
            .iter()
            .filter(|(_, (h, _))| *h < height)
            .map(|(source, _)| source.clone())
            .collect();

        for source in stale {
            if let Some(entry) = self.latest_by_source.remove(&source) {
                if let Some(set) = self.sources_by_entry.get_mut(&entry) {
                    set.remove(&source);
                    if set.is_empty() {
                        self.sources_by_entry.remove(&entry);
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn h(n: u64) -> Height {
        Height::new(n)
    }
    fn r(n: u64) -> RoundNumber {
        RoundNumber::new(n)
    }

    #[test]
    fn smallest_height_sync_pick() {
        let mut tally: VotingTally<crate::test_support::StubContext> = VotingTally::new();

        tally.record(crate::test_support::addr('b' as u8), BallotState::Accept, h(33), r(0));
        tally.record(crate::test_support::addr('c' as u8), BallotState::Accept, h(33), r(0));
        tally.record(crate::test_support::addr('d' as u8), BallotState::Accept, h(34), r(0));
        tally.record(crate::test_support::addr('b' as u8), BallotState::Accept, h(36), r(1));
        tally.record(crate::test_support::addr('c' as u8), BallotState::Accept, h(36), r(1));
        tally.record(crate::test_support::addr('d' as u8), BallotState::Accept, h(36), r(1));
        tally.record(crate::test_support::addr('e' as u8), BallotState::Accept, h(36), r(1));
        tally.record(crate::test_support::addr('a' as u8), BallotState::Accept, h(32), r(0));

        let (height, sources) = tally
            .get_sync_info(crate::test_support::addr('a' as u8), h(36), r(1), 4)
            .unwrap();

        assert_eq!(height, h(36));
        assert_eq!(sources.len(), 5);
    }

    #[test]
    fn not_enough_sources_before_threshold_distinct_sources_seen() {
        let mut tally: VotingTally<crate::test_support::StubContext> = VotingTally::new();
        tally.record(crate::test_support::addr(1), BallotState::Accept, h(1), r(0));
        tally.record(crate::test_support::addr(2), BallotState::Accept, h(1), r(0));

        let err = tally
            .get_sync_info(crate::test_support::addr(3), h(1), r(0), 4)
            .unwrap_err();
        assert_eq!(err, SyncError::NotEnoughSources);
    }
}
