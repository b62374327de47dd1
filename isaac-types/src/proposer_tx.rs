use serde::{Deserialize, Serialize};

/// An opaque proposer transaction: fee-collection and inflation issuance are
/// delegated entirely to the host application. The core only ever hashes and
/// forwards this payload.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProposerTransaction(Vec<u8>);

impl ProposerTransaction {
    pub fn new(payload: Vec<u8>) -> Self {
        Self(payload)
    }

    pub fn empty() -> Self {
        Self(Vec::new())
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}
