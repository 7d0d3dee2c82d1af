//! Stateless transaction validation.
//!
//! Stateful checks (compliance screening, nonce ordering, balances) happen in
//! the ledger when the transaction is included.

use dualnet_types::Timestamp;

use crate::error::TransactionError;
use crate::Transaction;

/// Check structure, hash, signature, timestamp window and metadata.
pub fn validate_transaction(
    tx: &Transaction,
    now: Timestamp,
    time_tolerance_secs: u64,
) -> Result<(), TransactionError> {
    let computed = tx.compute_hash();
    if tx.hash != computed {
        return Err(TransactionError::HashMismatch {
            stored: tx.hash.to_string(),
            computed: computed.to_string(),
        });
    }

    if tx.signature.is_none() {
        return Err(TransactionError::Unsigned {
            tx_hash: tx.hash.to_string(),
        });
    }
    if !tx.verify_signature() {
        return Err(TransactionError::InvalidSignature {
            tx_hash: tx.hash.to_string(),
        });
    }

    let tx_secs = tx.timestamp.as_secs();
    let now_secs = now.as_secs();
    let time_diff = tx_secs.abs_diff(now_secs);
    if time_diff > time_tolerance_secs {
        return Err(TransactionError::InvalidTimestamp {
            reason: format!(
                "timestamp {} is {} seconds away from now {}, tolerance is {}",
                tx.timestamp, time_diff, now, time_tolerance_secs
            ),
        });
    }

    if tx.amount.is_zero() {
        return Err(TransactionError::ZeroAmount);
    }
    if tx.sender == tx.receiver {
        return Err(TransactionError::SelfTransfer);
    }
    if tx.gas_limit == 0 {
        return Err(TransactionError::ZeroGas);
    }

    if let Some(metadata) = &tx.metadata {
        metadata.validate()?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{PaymentMetadata, TransactionBuilder};
    use dualnet_crypto::{LocalSigner, Signer};
    use dualnet_types::{Amount, SignatureAlgorithm};

    const NOW: u64 = 1_700_000_000;

    fn signer(seed: u8) -> LocalSigner {
        LocalSigner::from_seed(SignatureAlgorithm::Ed25519ph, &[seed; 32])
    }

    fn builder(amount: u128) -> TransactionBuilder {
        TransactionBuilder::new(signer(1).public_key(), signer(2).public_key(), Amount::new(amount))
            .timestamp(Timestamp::new(NOW))
    }

    #[test]
    fn accepts_well_formed() {
        let tx = builder(10).sign(&signer(1)).unwrap();
        assert!(validate_transaction(&tx, Timestamp::new(NOW + 5), 60).is_ok());
    }

    #[test]
    fn rejects_unsigned() {
        let tx = builder(10).build();
        assert!(matches!(
            validate_transaction(&tx, Timestamp::new(NOW), 60),
            Err(TransactionError::Unsigned { .. })
        ));
    }

    #[test]
    fn rejects_zero_amount() {
        let tx = builder(0).sign(&signer(1)).unwrap();
        assert!(matches!(
            validate_transaction(&tx, Timestamp::new(NOW), 60),
            Err(TransactionError::ZeroAmount)
        ));
    }

    #[test]
    fn rejects_stale_timestamp() {
        let tx = builder(10).sign(&signer(1)).unwrap();
        assert!(matches!(
            validate_transaction(&tx, Timestamp::new(NOW + 3600), 60),
            Err(TransactionError::InvalidTimestamp { .. })
        ));
    }

    #[test]
    fn rejects_tampered_hash() {
        let mut tx = builder(10).sign(&signer(1)).unwrap();
        tx.nonce += 1;
        assert!(matches!(
            validate_transaction(&tx, Timestamp::new(NOW), 60),
            Err(TransactionError::HashMismatch { .. })
        ));
    }

    #[test]
    fn rejects_bad_metadata() {
        let meta = PaymentMetadata {
            debtor_bic: Some("NOPE".into()),
            ..PaymentMetadata::default()
        };
        let tx = builder(10).metadata(meta).sign(&signer(1)).unwrap();
        assert!(matches!(
            validate_transaction(&tx, Timestamp::new(NOW), 60),
            Err(TransactionError::Metadata(_))
        ));
    }
}
