//! Signed transaction and its wire form
//!
//! Wire layout sent to the network boundary:
//!
//! ```text
//! signature count      u16 LE
//! per signature:       locator 32 | signature 64
//! message              canonical UnsignedMessage bytes
//! ```

use super::message::UnsignedMessage;
use crate::errors::{PipelineError, PipelineResult};
use crate::types::{AccountLocator, CorrelationId, Signature, LOCATOR_BYTES, SIGNATURE_BYTES};
use crate::wallet::verify_signature;

const SIGNATURE_ENTRY_BYTES: usize = LOCATOR_BYTES + SIGNATURE_BYTES;

/// Message plus one signature per signer over its canonical bytes
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignedTransaction {
    message: UnsignedMessage,
    message_bytes: Vec<u8>,
    signatures: Vec<(AccountLocator, Signature)>,
}

impl SignedTransaction {
    pub(crate) fn new(
        message: UnsignedMessage,
        message_bytes: Vec<u8>,
        signatures: Vec<(AccountLocator, Signature)>,
    ) -> Self {
        Self {
            message,
            message_bytes,
            signatures,
        }
    }

    pub fn message(&self) -> &UnsignedMessage {
        &self.message
    }

    /// The canonical bytes the signatures cover
    pub fn message_bytes(&self) -> &[u8] {
        &self.message_bytes
    }

    pub fn signatures(&self) -> &[(AccountLocator, Signature)] {
        &self.signatures
    }

    pub fn signature_for(&self, locator: &AccountLocator) -> Option<&Signature> {
        self.signatures
            .iter()
            .find(|(l, _)| l == locator)
            .map(|(_, sig)| sig)
    }

    /// The fee payer's signature names the transaction on the network
    ///
    /// Falls back to the first signature when the fee payer did not sign.
    pub fn correlation_id(&self) -> Option<CorrelationId> {
        self.signature_for(self.message.fee_payer())
            .or_else(|| self.signatures.first().map(|(_, sig)| sig))
            .map(Signature::to_correlation_id)
    }

    /// Check every attached signature against the message bytes
    pub fn verify(&self) -> bool {
        self.signatures
            .iter()
            .all(|(locator, sig)| verify_signature(locator, &self.message_bytes, sig))
    }

    pub fn to_wire_bytes(&self) -> PipelineResult<Vec<u8>> {
        let count = u16::try_from(self.signatures.len()).map_err(|_| {
            PipelineError::Serialization(format!("{} signatures", self.signatures.len()))
        })?;

        let mut out = Vec::with_capacity(
            2 + self.signatures.len() * SIGNATURE_ENTRY_BYTES + self.message_bytes.len(),
        );
        out.extend_from_slice(&count.to_le_bytes());
        for (locator, sig) in &self.signatures {
            out.extend_from_slice(locator.as_bytes());
            out.extend_from_slice(sig.as_bytes());
        }
        out.extend_from_slice(&self.message_bytes);
        Ok(out)
    }

    pub fn from_wire_bytes(bytes: &[u8]) -> PipelineResult<Self> {
        let truncated = || PipelineError::Serialization("truncated transaction".to_string());

        let header = bytes.get(..2).ok_or_else(truncated)?;
        let count = u16::from_le_bytes([header[0], header[1]]) as usize;
        let sigs_end = 2 + count * SIGNATURE_ENTRY_BYTES;
        let sig_bytes = bytes.get(2..sigs_end).ok_or_else(truncated)?;

        let mut signatures = Vec::with_capacity(count);
        for entry in sig_bytes.chunks_exact(SIGNATURE_ENTRY_BYTES) {
            let mut locator = [0u8; LOCATOR_BYTES];
            locator.copy_from_slice(&entry[..LOCATOR_BYTES]);
            let mut sig = [0u8; SIGNATURE_BYTES];
            sig.copy_from_slice(&entry[LOCATOR_BYTES..]);
            signatures.push((AccountLocator(locator), Signature(sig)));
        }

        let message_bytes = bytes[sigs_end..].to_vec();
        let message = UnsignedMessage::deserialize(&message_bytes)?;
        Ok(Self {
            message,
            message_bytes,
            signatures,
        })
    }
}
