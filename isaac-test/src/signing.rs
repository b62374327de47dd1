//! Real Ed25519 signing for `TestContext`, grounded on `signing-ed25519` but
//! trimmed to what the consensus engine actually needs: no `SigningScheme`
//! registry, no CometBFT-shaped wire encoding, just `sign`/`verify`.

use serde::{Deserialize, Serialize};
use signature::{Signer, Verifier};

/// A 20-byte address derived from the SHA-256 of the public key, base-58
/// displayed to match `isaac_types::Hash`'s encoding.
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Address([u8; 20]);

impl Address {
    fn from_public_key(public_key: &PublicKey) -> Self {
        let digest = public_key.hash();
        let mut bytes = [0u8; 20];
        bytes.copy_from_slice(&digest[..20]);
        Self(bytes)
    }
}

impl core::fmt::Debug for Address {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{}", bs58::encode(&self.0).into_string())
    }
}

impl isaac_types::Address for Address {}

#[derive(Clone, Debug)]
pub struct PrivateKey(ed25519_consensus::SigningKey);

impl PrivateKey {
    pub fn generate<R: rand::CryptoRng + rand::RngCore>(rng: R) -> Self {
        Self(ed25519_consensus::SigningKey::new(rng))
    }

    pub fn public_key(&self) -> PublicKey {
        PublicKey(self.0.verification_key())
    }
}

impl Signer<Signature> for PrivateKey {
    fn try_sign(&self, msg: &[u8]) -> Result<Signature, signature::Error> {
        Ok(Signature(self.0.sign(msg)))
    }
}

#[derive(Copy, Clone, PartialEq, Eq)]
pub struct PublicKey(ed25519_consensus::VerificationKey);

impl PublicKey {
    fn hash(&self) -> [u8; 32] {
        use sha2::{Digest, Sha256};
        let mut hasher = Sha256::new();
        hasher.update(self.0.as_bytes());
        hasher.finalize().into()
    }
}

impl core::fmt::Debug for PublicKey {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "PublicKey({})", bs58::encode(self.0.as_bytes()).into_string())
    }
}

impl Verifier<Signature> for PublicKey {
    fn verify(&self, msg: &[u8], signature: &Signature) -> Result<(), signature::Error> {
        self.0.verify(&signature.0, msg).map_err(|_| signature::Error::new())
    }
}

impl isaac_types::PublicKey for PublicKey {}

#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub struct Signature(ed25519_consensus::Signature);

impl core::fmt::Debug for Signature {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "Signature({})", bs58::encode(self.0.to_bytes()).into_string())
    }
}

impl From<Signature> for String {
    fn from(sig: Signature) -> Self {
        bs58::encode(sig.0.to_bytes()).into_string()
    }
}

impl TryFrom<String> for Signature {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        let bytes = bs58::decode(&value).into_vec().map_err(|e| e.to_string())?;
        let array: [u8; 64] = bytes.try_into().map_err(|_| "wrong signature length".to_string())?;
        Ok(Self(ed25519_consensus::Signature::from(array)))
    }
}

impl isaac_types::Signature for Signature {}

/// The `isaac_types::Context` implementation backed by real Ed25519 keys,
/// used by this crate's own fixtures and by every other crate's integration
/// tests.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TestContext;

impl isaac_types::Context for TestContext {
    type Address = Address;
    type PublicKey = PublicKey;
    type PrivateKey = PrivateKey;
    type Signature = Signature;

    fn sign(private_key: &PrivateKey, message: &[u8]) -> Signature {
        private_key.try_sign(message).expect("ed25519 signing is infallible")
    }

    fn verify(public_key: &PublicKey, message: &[u8], signature: &Signature) -> bool {
        public_key.verify(message, signature).is_ok()
    }

    fn derive_address(public_key: &PublicKey) -> Address {
        Address::from_public_key(public_key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn sign_and_verify_round_trips() {
        let sk = PrivateKey::generate(StdRng::seed_from_u64(1));
        let pk = sk.public_key();

        let sig = <TestContext as isaac_types::Context>::sign(&sk, b"hello");
        assert!(<TestContext as isaac_types::Context>::verify(&pk, b"hello", &sig));
        assert!(!<TestContext as isaac_types::Context>::verify(&pk, b"world", &sig));
    }

    #[test]
    fn signature_round_trips_through_serde() {
        let sk = PrivateKey::generate(StdRng::seed_from_u64(2));
        let sig = <TestContext as isaac_types::Context>::sign(&sk, b"payload");

        let json = serde_json::to_string(&sig).expect("serialize");
        let back: Signature = serde_json::from_str(&json).expect("deserialize");
        assert_eq!(sig, back);
    }
}
