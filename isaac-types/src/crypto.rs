//! Abstraction over the signing scheme used by the consensus engine.
//!
//! Cryptographic primitives are deliberately out of scope for this crate
//! (they are a black-box "signer/verifier" collaborator per the spec);
//! `isaac-test` supplies a concrete Ed25519-backed implementation.

use core::fmt::Debug;

use serde::de::DeserializeOwned;
use serde::Serialize;

/// Defines the requirements for an address, typically derived from a public key.
///
/// `Serialize`/`DeserializeOwned` are required because the canonical ballot
/// encoding (a key-sorted JSON-like object) carries addresses as strings.
pub trait Address: Clone + Debug + PartialEq + Eq + Ord + core::hash::Hash + Serialize + DeserializeOwned {}

/// Defines the requirements for a public key type.
pub trait PublicKey: Clone + Debug + PartialEq + Eq {}

/// Defines the requirements for a signature type. Signatures are carried
/// base-58-encoded in the canonical ballot header.
pub trait Signature: Clone + Debug + PartialEq + Eq + Serialize + DeserializeOwned {}

/// Abstracts over the address/key/signature types and the sign/verify
/// operations used throughout the engine, so that the ballot and round
/// types are not hard-wired to one cryptographic scheme.
pub trait Context: Clone + Debug + PartialEq + Eq
where
    Self: Sized,
{
    type Address: Address;
    type PublicKey: PublicKey;
    type PrivateKey: Clone;
    type Signature: Signature;

    /// Sign `message` with `private_key`.
    fn sign(private_key: &Self::PrivateKey, message: &[u8]) -> Self::Signature;

    /// Verify that `signature` over `message` was produced by `public_key`.
    fn verify(public_key: &Self::PublicKey, message: &[u8], signature: &Self::Signature) -> bool;

    /// Derive the address that identifies a given public key on the network.
    fn derive_address(public_key: &Self::PublicKey) -> Self::Address;
}
