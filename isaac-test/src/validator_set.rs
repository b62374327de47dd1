//! Deterministic validator-set fixtures, grounded on `test::validator_set`'s
//! `make_validators` helper but seeded so that repeated calls in different
//! tests produce the exact same keys and addresses.

use rand::rngs::StdRng;
use rand::SeedableRng;

use isaac_types::{Validator, ValidatorSet};

use crate::signing::{PrivateKey, TestContext};

/// Generates `n` validators of equal voting power 1, deterministically keyed
/// off a fixed seed, along with the private key needed to sign on each
/// validator's behalf.
pub fn make_validators(n: usize) -> Vec<(Validator<TestContext>, PrivateKey)> {
    let mut rng = StdRng::seed_from_u64(0x1_5AAC);

    (0..n)
        .map(|_| {
            let sk = PrivateKey::generate(&mut rng);
            let validator = Validator::new(sk.public_key(), 1);
            (validator, sk)
        })
        .collect()
}

/// Just the validator set, for callers that don't need the private keys.
pub fn validator_set(n: usize) -> ValidatorSet<TestContext> {
    ValidatorSet::new(make_validators(n).into_iter().map(|(v, _)| v))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn same_seed_is_reproducible_across_calls() {
        let a = validator_set(5);
        let b = validator_set(5);
        assert_eq!(a.len(), 5);
        assert_eq!(a.sorted_addresses().collect::<Vec<_>>(), b.sorted_addresses().collect::<Vec<_>>());
    }
}
