//! Fluent construction of transactions.

use dualnet_crypto::Signer;
use dualnet_types::{Amount, PublicKey, Timestamp, TxHash};

use crate::error::TransactionError;
use crate::extensions::{ComplianceProof, ContractRef, EscrowCondition, PrivacyProof};
use crate::metadata::PaymentMetadata;
use crate::transaction::Transaction;

pub struct TransactionBuilder {
    tx: Transaction,
}

impl TransactionBuilder {
    pub fn new(sender: PublicKey, receiver: PublicKey, amount: Amount) -> Self {
        Self {
            tx: Transaction {
                hash: TxHash::ZERO,
                sender,
                receiver,
                amount,
                nonce: 0,
                gas_price: 1,
                gas_limit: 1,
                timestamp: Timestamp::EPOCH,
                privacy: None,
                compliance_proof: None,
                contract: None,
                escrow: None,
                metadata: None,
                signature: None,
            },
        }
    }

    pub fn nonce(mut self, nonce: u64) -> Self {
        self.tx.nonce = nonce;
        self
    }

    pub fn gas(mut self, price: u64, limit: u64) -> Self {
        self.tx.gas_price = price;
        self.tx.gas_limit = limit;
        self
    }

    pub fn timestamp(mut self, timestamp: Timestamp) -> Self {
        self.tx.timestamp = timestamp;
        self
    }

    pub fn private(mut self, proof_ref: [u8; 32]) -> Self {
        self.tx.privacy = Some(PrivacyProof { proof_ref });
        self
    }

    pub fn compliance_proof(mut self, proof: ComplianceProof) -> Self {
        self.tx.compliance_proof = Some(proof);
        self
    }

    pub fn contract(mut self, script: impl Into<String>) -> Self {
        self.tx.contract = Some(ContractRef::new(script));
        self
    }

    pub fn escrow(mut self, condition: EscrowCondition) -> Self {
        self.tx.escrow = Some(condition);
        self
    }

    pub fn metadata(mut self, metadata: PaymentMetadata) -> Self {
        self.tx.metadata = Some(metadata);
        self
    }

    /// Sealed but unsigned.
    pub fn build(self) -> Transaction {
        self.tx.seal()
    }

    /// Sealed and signed.
    pub fn sign(self, signer: &dyn Signer) -> Result<Transaction, TransactionError> {
        let mut tx = self.tx;
        tx.sign(signer)?;
        Ok(tx)
    }
}
