use core::fmt;

use crate::Context;

/// Voting power held by a validator.
pub type VotingPower = u64;

/// A validator: an address, its public key, and the voting power it holds.
#[derive(Clone, PartialEq, Eq)]
pub struct Validator<Ctx: Context> {
    pub address: Ctx::Address,
    pub public_key: Ctx::PublicKey,
    pub voting_power: VotingPower,
}

impl<Ctx: Context> Validator<Ctx> {
    pub fn new(public_key: Ctx::PublicKey, voting_power: VotingPower) -> Self {
        Self {
            address: Ctx::derive_address(&public_key),
            public_key,
            voting_power,
        }
    }
}

impl<Ctx: Context> fmt::Debug for Validator<Ctx> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Validator")
            .field("address", &self.address)
            .field("voting_power", &self.voting_power)
            .finish()
    }
}

/// A validator set, sorted by address so that proposer selection is
/// deterministic and reproducible across nodes.
#[derive(Clone, PartialEq, Eq)]
pub struct ValidatorSet<Ctx: Context> {
    validators: Vec<Validator<Ctx>>,
}

impl<Ctx: Context> ValidatorSet<Ctx> {
    pub fn new(validators: impl IntoIterator<Item = Validator<Ctx>>) -> Self {
        let mut validators: Vec<_> = validators.into_iter().collect();
        validators.sort_unstable_by(|a, b| a.address.cmp(&b.address));
        validators.dedup_by(|a, b| a.address == b.address);

        Self { validators }
    }

    pub fn len(&self) -> usize {
        self.validators.len()
    }

    pub fn is_empty(&self) -> bool {
        self.validators.is_empty()
    }

    /// Validators in stable, address-sorted order.
    pub fn sorted_addresses(&self) -> impl Iterator<Item = &Ctx::Address> {
        self.validators.iter().map(|v| &v.address)
    }

    pub fn total_voting_power(&self) -> VotingPower {
        self.validators.iter().map(|v| v.voting_power).sum()
    }

    pub fn get_by_address(&self, address: &Ctx::Address) -> Option<&Validator<Ctx>> {
        self.validators.iter().find(|v| &v.address == address)
    }

    pub fn contains(&self, address: &Ctx::Address) -> bool {
        self.get_by_address(address).is_some()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Validator<Ctx>> {
        self.validators.iter()
    }
}

impl<Ctx: Context> fmt::Debug for ValidatorSet<Ctx> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ValidatorSet")
            .field("validators", &self.validators)
            .finish()
    }
}
