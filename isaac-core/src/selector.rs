use isaac_types::{Context, Height, RoundNumber, ValidatorSet};

/// Defines how to pick a proposer amongst a validator set for a given
/// `(height, round)`. Must be deterministic: for a given height, round and
/// validator set, every honest node must compute the same address.
///
/// Grounded on `driver::ProposerSelector`, generalized from `Round` alone to
/// `(height, round)` since the spec's proposer function is `(height, round)
/// → validator_address` rather than round-only.
pub trait ProposerSelector<Ctx: Context>: Send + Sync {
    fn select_proposer(
        &self,
        height: Height,
        round: RoundNumber,
        validators: &ValidatorSet<Ctx>,
    ) -> Ctx::Address;
}

/// `sorted_addresses[(height + round) mod |validators|]`, per §4.5.
#[derive(Copy, Clone, Debug, Default)]
pub struct DeterministicSelector;

impl<Ctx: Context> ProposerSelector<Ctx> for DeterministicSelector {
    fn select_proposer(
        &self,
        height: Height,
        round: RoundNumber,
        validators: &ValidatorSet<Ctx>,
    ) -> Ctx::Address {
        let sorted: Vec<_> = validators.sorted_addresses().collect();
        assert!(!sorted.is_empty(), "cannot select a proposer from an empty validator set");

        let index = (height.as_u64().wrapping_add(round.as_u64())) as usize % sorted.len();
        sorted[index].clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wraps_around_the_sorted_validator_set() {
        let validators = isaac_test::validator_set(3);
        let addrs: Vec<_> = validators.sorted_addresses().cloned().collect();

        let selector = DeterministicSelector;
        let p0 = selector.select_proposer(Height::new(1), RoundNumber::new(0), &validators);
        let p1 = selector.select_proposer(Height::new(1), RoundNumber::new(1), &validators);
        let p3 = selector.select_proposer(Height::new(1), RoundNumber::new(3), &validators);

        assert_eq!(p0, addrs[1 % 3]);
        assert_eq!(p1, addrs[2 % 3]);
        assert_eq!(p3, p0);
    }
}
