//! The payment transaction and its content hash.

use dualnet_crypto::{verify_signature, CanonicalEncoder, Signer};
use dualnet_types::{Amount, PublicKey, Signature, Timestamp, TxHash};
use serde::{Deserialize, Serialize};

use crate::error::TransactionError;
use crate::extensions::{ComplianceProof, ContractRef, EscrowCondition, PrivacyProof};
use crate::metadata::PaymentMetadata;

const TX_DOMAIN: &[u8] = b"dualnet.tx.v1";

/// Bytes a signature adds to the encoded size: presence tag, algorithm tag, 64 bytes.
const SIGNATURE_ENCODED_LEN: usize = 1 + 1 + 64;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transaction {
    pub hash: TxHash,
    pub sender: PublicKey,
    pub receiver: PublicKey,
    pub amount: Amount,
    pub nonce: u64,
    pub gas_price: u64,
    pub gas_limit: u64,
    pub timestamp: Timestamp,
    pub privacy: Option<PrivacyProof>,
    pub compliance_proof: Option<ComplianceProof>,
    pub contract: Option<ContractRef>,
    pub escrow: Option<EscrowCondition>,
    pub metadata: Option<PaymentMetadata>,
    /// Sender's signature over `hash`. Not part of the hashed content.
    pub signature: Option<Signature>,
}

impl Transaction {
    /// Hash of every field except `hash` and `signature`.
    pub fn compute_hash(&self) -> TxHash {
        TxHash::new(self.encode_content().digest())
    }

    /// Recompute and store the content hash.
    pub fn seal(mut self) -> Self {
        self.hash = self.compute_hash();
        self
    }

    /// True if the stored hash matches the content.
    pub fn has_valid_hash(&self) -> bool {
        self.hash == self.compute_hash()
    }

    /// Seal and sign with the sender's key.
    pub fn sign(&mut self, signer: &dyn Signer) -> Result<(), TransactionError> {
        self.hash = self.compute_hash();
        let signature = signer.sign(self.hash.as_bytes())?;
        self.signature = Some(signature);
        Ok(())
    }

    /// True only if a signature is present, the content hash is intact and
    /// the signature verifies under the sender key.
    pub fn verify_signature(&self) -> bool {
        let Some(signature) = &self.signature else {
            return false;
        };
        self.has_valid_hash() && verify_signature(self.hash.as_bytes(), signature, &self.sender)
    }

    /// Fee proxy used for mempool ordering.
    pub fn priority(&self) -> u128 {
        u128::from(self.gas_price) * u128::from(self.gas_limit)
    }

    /// Serialized size estimate used by block assembly.
    pub fn encoded_len(&self) -> usize {
        let sig = if self.signature.is_some() {
            SIGNATURE_ENCODED_LEN
        } else {
            1
        };
        32 + self.encode_content().len() + sig
    }

    pub fn is_private(&self) -> bool {
        self.privacy.is_some()
    }

    fn encode_content(&self) -> CanonicalEncoder {
        let mut enc = CanonicalEncoder::new(TX_DOMAIN);
        enc.public_key(&self.sender)
            .public_key(&self.receiver)
            .u128(self.amount.raw())
            .u64(self.nonce)
            .u64(self.gas_price)
            .u64(self.gas_limit)
            .u64(self.timestamp.as_secs());
        enc.option(self.privacy.as_ref(), |e, p| {
            e.fixed(&p.proof_ref);
        });
        enc.option(self.compliance_proof.as_ref(), |e, p| {
            e.public_key(&p.subject)
                .u8(p.kyc_level)
                .public_key(&p.issuer)
                .u64(p.issued_at.as_secs())
                .u64(p.expires_at.as_secs());
        });
        enc.option(self.contract.as_ref(), |e, c| {
            e.str(&c.script);
        });
        enc.option(self.escrow.as_ref(), |e, c| {
            e.u64(c.release_after.as_secs());
            e.option(c.arbiter.as_ref(), |e, k| {
                e.public_key(k);
            });
        });
        enc.option(self.metadata.as_ref(), |e, m| {
            for field in [&m.purpose_code, &m.debtor_bic, &m.creditor_bic, &m.remittance_info] {
                e.option(field.as_ref(), |e, s| {
                    e.str(s);
                });
            }
        });
        enc
    }
}
