//! Minimal, non-cryptographic `Context` used only by this crate's own unit
//! tests. `isaac-test` provides the real Ed25519-backed implementation used
//! by integration tests and other crates.
#![cfg(test)]

use isaac_types::{Address, Context, PublicKey, Signature};
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct StubAddress(pub u8);
impl Address for StubAddress {}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StubPublicKey(pub u8);
impl PublicKey for StubPublicKey {}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct StubSignature(pub u8);
impl Signature for StubSignature {}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StubContext;

impl Context for StubContext {
    type Address = StubAddress;
    type PublicKey = StubPublicKey;
    type PrivateKey = u8;
    type Signature = StubSignature;

    fn sign(private_key: &u8, _message: &[u8]) -> StubSignature {
        StubSignature(*private_key)
    }

    fn verify(public_key: &StubPublicKey, _message: &[u8], signature: &StubSignature) -> bool {
        signature.0 == public_key.0
    }

    fn derive_address(public_key: &StubPublicKey) -> StubAddress {
        StubAddress(public_key.0)
    }
}

pub fn addr(n: u8) -> StubAddress {
    StubAddress(n)
}
